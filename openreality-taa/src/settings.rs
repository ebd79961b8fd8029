//! Per-camera TAA settings.

use serde::{Deserialize, Serialize};

use crate::error::{TaaError, TaaResult};

/// Resolve quality. The ordinal doubles as the resolve shader pass index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaaQuality {
    VeryLow = 0,
    Low = 1,
    Medium = 2,
    #[default]
    High = 3,
    VeryHigh = 4,
}

impl TaaQuality {
    pub const COUNT: usize = 5;

    pub fn pass_index(self) -> usize {
        self as usize
    }

    /// Only the top tier resolves with per-frame filter weights.
    pub fn uses_filter_weights(self) -> bool {
        self == TaaQuality::VeryHigh
    }
}

/// History reset modes for [`TaaSettings::reset_history_frames`].
pub mod reset {
    pub const NONE: i32 = 0;
    /// Reset for one frame.
    pub const NORMAL: i32 = 1;
    /// Reset for two frames, one per XR eye.
    pub const XR: i32 = 2;
    /// Keep resetting until set back to [`NONE`].
    pub const UNTIL_CLEARED: i32 = -1;
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaaSettings {
    pub quality: TaaQuality,
    /// Weight of the current frame in the blend (0 = history only).
    pub frame_influence: f32,
    pub jitter_scale: f32,
    pub mip_bias: f32,
    pub variance_clamp_scale: f32,
    /// Contrast adaptive sharpening amount, 0 disables.
    pub contrast_adaptive_sharpening: f32,

    /// 0: no reset, >0: frames left to reset, <0: reset until cleared.
    #[serde(skip)]
    pub reset_history_frames: i32,
    /// Added to the frame count to form the jitter frame index.
    #[serde(skip)]
    pub jitter_frame_count_offset: i32,
}

impl Default for TaaSettings {
    fn default() -> Self {
        Self {
            quality: TaaQuality::High,
            frame_influence: 0.1,
            jitter_scale: 1.0,
            mip_bias: 0.0,
            variance_clamp_scale: 0.9,
            contrast_adaptive_sharpening: 0.0,
            reset_history_frames: reset::NONE,
            jitter_frame_count_offset: 0,
        }
    }
}

impl TaaSettings {
    pub fn from_json(json: &str) -> TaaResult<Self> {
        let settings: TaaSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> TaaResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject non-finite or out-of-range values.
    pub fn validate(&self) -> TaaResult<()> {
        let fields = [
            ("frame_influence", self.frame_influence),
            ("jitter_scale", self.jitter_scale),
            ("mip_bias", self.mip_bias),
            ("variance_clamp_scale", self.variance_clamp_scale),
            ("contrast_adaptive_sharpening", self.contrast_adaptive_sharpening),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(TaaError::config(format!("{name} is not finite")));
        }
        if !(0.0..=1.0).contains(&self.frame_influence) {
            return Err(TaaError::config(format!(
                "frame_influence {} outside [0, 1]",
                self.frame_influence
            )));
        }
        if self.jitter_scale < 0.0 {
            return Err(TaaError::config(format!(
                "jitter_scale {} is negative",
                self.jitter_scale
            )));
        }
        Ok(())
    }

    /// Frame index fed to the jitter sequence for `frame_count`.
    pub fn jitter_frame_index(&self, frame_count: i32) -> i32 {
        frame_count.wrapping_add(self.jitter_frame_count_offset)
    }

    pub fn is_resetting_history(&self) -> bool {
        self.reset_history_frames != reset::NONE
    }

    /// Blend weight of the current frame; full replacement while resetting.
    pub fn effective_frame_influence(&self) -> f32 {
        if self.is_resetting_history() {
            1.0
        } else {
            self.frame_influence
        }
    }

    /// Request a history reset lasting `frames` frames (see [`reset`]).
    pub fn request_reset(&mut self, frames: i32) {
        self.reset_history_frames = frames;
    }

    /// Consume one frame of a finite reset. Open-ended resets are kept.
    pub fn advance_reset_countdown(&mut self) {
        if self.reset_history_frames > 0 {
            self.reset_history_frames -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = TaaSettings::default();
        assert_eq!(s.quality, TaaQuality::High);
        assert_eq!(s.frame_influence, 0.1);
        assert_eq!(s.jitter_scale, 1.0);
        assert_eq!(s.variance_clamp_scale, 0.9);
        assert_eq!(s.contrast_adaptive_sharpening, 0.0);
        assert!(!s.is_resetting_history());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let s = TaaSettings::from_json(r#"{ "quality": "VeryHigh", "jitter_scale": 0.5 }"#).unwrap();
        assert_eq!(s.quality, TaaQuality::VeryHigh);
        assert_eq!(s.jitter_scale, 0.5);
        assert_eq!(s.frame_influence, 0.1);
    }

    #[test]
    fn test_ephemeral_fields_not_persisted() {
        let mut s = TaaSettings::default();
        s.reset_history_frames = reset::UNTIL_CLEARED;
        s.jitter_frame_count_offset = 42;
        let json = s.to_json().unwrap();
        assert!(!json.contains("reset_history_frames"));
        assert!(!json.contains("jitter_frame_count_offset"));

        let back = TaaSettings::from_json(&json).unwrap();
        assert_eq!(back.reset_history_frames, 0);
        assert_eq!(back.jitter_frame_count_offset, 0);
        assert_eq!(back.quality, s.quality);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            TaaSettings::from_json(r#"{ "frame_influence": 1.5 }"#),
            Err(TaaError::Config(_))
        ));
        assert!(matches!(
            TaaSettings::from_json(r#"{ "jitter_scale": -1.0 }"#),
            Err(TaaError::Config(_))
        ));
        assert!(matches!(
            TaaSettings::from_json(r#"{ "quality": "Ultra" }"#),
            Err(TaaError::Serde(_))
        ));
    }

    #[test]
    fn test_reset_countdown() {
        let mut s = TaaSettings::default();
        s.request_reset(reset::XR);
        assert_eq!(s.effective_frame_influence(), 1.0);
        s.advance_reset_countdown();
        assert!(s.is_resetting_history());
        s.advance_reset_countdown();
        assert!(!s.is_resetting_history());
        assert_eq!(s.effective_frame_influence(), 0.1);
        s.advance_reset_countdown();
        assert_eq!(s.reset_history_frames, 0);
    }

    #[test]
    fn test_open_ended_reset_persists() {
        let mut s = TaaSettings::default();
        s.request_reset(reset::UNTIL_CLEARED);
        for _ in 0..10 {
            s.advance_reset_countdown();
        }
        assert_eq!(s.reset_history_frames, reset::UNTIL_CLEARED);
        s.request_reset(reset::NONE);
        assert!(!s.is_resetting_history());
    }

    #[test]
    fn test_jitter_frame_index_offset() {
        let s = TaaSettings {
            jitter_frame_count_offset: 3,
            ..TaaSettings::default()
        };
        assert_eq!(s.jitter_frame_index(10), 13);
    }

    #[test]
    fn test_quality_pass_index() {
        assert_eq!(TaaQuality::VeryLow.pass_index(), 0);
        assert_eq!(TaaQuality::VeryHigh.pass_index(), 4);
        assert!(TaaQuality::VeryHigh.uses_filter_weights());
        assert!(!TaaQuality::High.uses_filter_weights());
    }
}

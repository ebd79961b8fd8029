//! Per-frame resolve orchestration: new-frame detection, resolve request
//! assembly and history write-back.

use crate::history::{Eye, HistoryStore};
use crate::host::{ImageHandle, ResolveExecutor};
use crate::jitter::{FilterWeights, FILTER_TAPS};
use crate::settings::{TaaQuality, TaaSettings};

/// Shader pass that copies the resolved frame into history; the last pass
/// after one resolve pass per quality tier.
pub const HISTORY_COPY_PASS: usize = TaaQuality::COUNT;

/// Motion input bound for the resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionInput {
    /// The frame's motion vectors.
    Vectors,
    /// A zero motion field. Used when a frame is rendered again: history was
    /// already advanced to this frame, so reprojecting by its motion would
    /// blur the result.
    Zero,
}

/// Everything the resolve pass needs, captured by value so it can be handed
/// to a deferred pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolveRequest {
    pub eye: Eye,
    pub accumulation: ImageHandle,
    pub motion: MotionInput,
    pub frame_influence: f32,
    pub variance_clamp_scale: f32,
    pub mip_bias: f32,
    pub sharpening: f32,
    /// Present only for [`TaaQuality::VeryHigh`].
    pub filter_weights: Option<[f32; FILTER_TAPS]>,
    pub low_precision_source: bool,
    pub pass_index: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// No history image for this eye yet; nothing was recorded.
    NotReady,
    Resolved {
        is_new_frame: bool,
        history_copied: bool,
    },
}

/// True if `eye`'s history has not yet received `frame_count`.
pub fn is_new_frame(store: &HistoryStore, eye: Eye, frame_count: i32) -> bool {
    store.last_updated_frame(eye) != frame_count
}

/// One eye of one camera frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaaFrame {
    pub frame_count: i32,
    pub eye: Eye,
}

impl TaaFrame {
    pub fn new(frame_count: i32, eye: Eye) -> Self {
        Self { frame_count, eye }
    }

    /// Build the resolve request for this frame, or `None` when the eye has no
    /// history image. Computes filter weights into `weights` for the top
    /// quality tier.
    pub fn resolve_request(
        &self,
        store: &HistoryStore,
        settings: &TaaSettings,
        weights: &mut FilterWeights,
    ) -> Option<ResolveRequest> {
        let accumulation = store.accumulation_image(self.eye)?;
        let motion = if is_new_frame(store, self.eye, self.frame_count) {
            MotionInput::Vectors
        } else {
            MotionInput::Zero
        };

        let filter_weights = if settings.quality.uses_filter_weights() {
            let jitter_frame = settings.jitter_frame_index(self.frame_count);
            weights.compute(jitter_frame, settings.jitter_scale);
            Some(weights.snapshot())
        } else {
            None
        };

        Some(ResolveRequest {
            eye: self.eye,
            accumulation,
            motion,
            frame_influence: settings.effective_frame_influence(),
            variance_clamp_scale: settings.variance_clamp_scale,
            mip_bias: settings.mip_bias,
            sharpening: settings.contrast_adaptive_sharpening,
            filter_weights,
            low_precision_source: store.is_low_precision(),
            pass_index: settings.quality.pass_index(),
        })
    }

    /// Resolve this frame and, if it is new, write it back into history.
    pub fn execute(
        &self,
        store: &mut HistoryStore,
        settings: &TaaSettings,
        weights: &mut FilterWeights,
        executor: &mut impl ResolveExecutor,
    ) -> FrameOutcome {
        let Some(request) = self.resolve_request(store, settings, weights) else {
            log::debug!("TAA skipped for {:?}: history not allocated", self.eye);
            return FrameOutcome::NotReady;
        };

        executor.resolve(&request);

        let is_new_frame = request.motion == MotionInput::Vectors;
        if is_new_frame {
            executor.copy_to_history(request.accumulation, HISTORY_COPY_PASS);
            store.set_last_updated_frame(self.eye, self.frame_count);
        } else {
            log::debug!(
                "TAA frame {} re-rendered for {:?}, history kept",
                self.frame_count,
                self.eye
            );
        }

        FrameOutcome::Resolved {
            is_new_frame,
            history_copied: is_new_frame,
        }
    }
}

//! Per-camera TAA state tying the history store, settings and jitter together.

use glam::Mat4;

use crate::descriptor::ImageDescriptor;
use crate::frame::{FrameOutcome, TaaFrame};
use crate::history::{Eye, HistoryStore};
use crate::host::{ImageAllocator, ResolveExecutor};
use crate::jitter::{apply_jitter, jitter_matrix, FilterWeights, Jitter};
use crate::settings::TaaSettings;

/// Result of [`TaaCamera::prepare_frame`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PreparedFrame {
    /// History images were (re)allocated this frame.
    pub reallocated: bool,
    pub jitter: Mat4,
    /// Camera projection with `jitter` applied.
    pub projection: Mat4,
}

/// Everything TAA keeps for one camera between frames.
#[derive(Debug, Default)]
pub struct TaaCamera {
    pub history: HistoryStore,
    pub settings: TaaSettings,
    weights: FilterWeights,
}

impl TaaCamera {
    pub fn new(settings: TaaSettings) -> Self {
        Self {
            history: HistoryStore::new(),
            settings,
            weights: FilterWeights::new(),
        }
    }

    /// Start of frame: refresh history storage, then build the jittered
    /// projection. History must be current before jitter and filter weights
    /// are consumed, since reallocation can change the history format.
    #[allow(clippy::too_many_arguments)]
    pub fn prepare_frame<F>(
        &mut self,
        host: &mut impl ImageAllocator,
        camera_desc: &ImageDescriptor,
        stereo: bool,
        frame_count: i32,
        projection: Mat4,
        taa_enabled: bool,
        jitter_fn: F,
    ) -> PreparedFrame
    where
        F: Fn(i32) -> Jitter,
    {
        let reallocated = taa_enabled && self.history.update(host, camera_desc, stereo);

        let jitter = jitter_matrix(
            self.settings.jitter_frame_index(frame_count),
            camera_desc.width.max(1) as u32,
            camera_desc.height.max(1) as u32,
            self.settings.jitter_scale,
            taa_enabled,
            jitter_fn,
        );

        PreparedFrame {
            reallocated,
            jitter,
            projection: apply_jitter(projection, jitter),
        }
    }

    /// Resolve one eye. A finite history reset counts down once per eye that
    /// receives a new frame.
    pub fn resolve(
        &mut self,
        frame_count: i32,
        eye: Eye,
        executor: &mut impl ResolveExecutor,
    ) -> FrameOutcome {
        let outcome = TaaFrame::new(frame_count, eye).execute(
            &mut self.history,
            &self.settings,
            &mut self.weights,
            executor,
        );
        if let FrameOutcome::Resolved {
            is_new_frame: true, ..
        } = outcome
        {
            self.settings.advance_reset_countdown();
        }
        outcome
    }

    /// Filter weights for the jitter of `frame_count`, as used by the top
    /// quality resolve.
    pub fn filter_weights(&mut self, frame_count: i32) -> &[f32] {
        let frame = self.settings.jitter_frame_index(frame_count);
        self.weights.compute(frame, self.settings.jitter_scale)
    }

    /// Release history images; call before dropping the camera.
    pub fn release(&mut self, host: &mut impl ImageAllocator) {
        self.history.release(host);
    }
}

//! Camera compatibility checks that switch TAA off for a frame.

/// Warnings are logged at most once per this many frames.
pub const WARNING_THROTTLE_FRAMES: i32 = 60;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CameraRenderType {
    #[default]
    Base,
    Overlay,
}

/// The parts of a camera's per-frame state that TAA depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CameraState {
    pub has_persistent_data: bool,
    pub msaa_samples: u32,
    pub xr_enabled: bool,
    pub render_type: CameraRenderType,
    /// Number of overlay cameras stacked on this one.
    pub stack_len: usize,
    pub allow_dynamic_resolution: bool,
    pub post_process_enabled: bool,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            has_persistent_data: true,
            msaa_samples: 1,
            xr_enabled: false,
            render_type: CameraRenderType::Base,
            stack_len: 0,
            allow_dynamic_resolution: false,
            post_process_enabled: true,
        }
    }
}

/// Return why TAA cannot run for this camera, or `None` if it can.
///
/// The caller disables TAA for the camera this frame when a warning is
/// returned. Only the first failing check is reported.
pub fn validate(camera: &CameraState, frame_count: i32) -> Option<&'static str> {
    let warning = check(camera);
    if let Some(msg) = warning {
        if frame_count % WARNING_THROTTLE_FRAMES == 0 {
            log::warn!("{msg}");
        }
    }
    warning
}

fn check(camera: &CameraState) -> Option<&'static str> {
    if !camera.has_persistent_data {
        return Some("Disabling TAA due to invalid persistent data.");
    }

    if camera.msaa_samples != 1 {
        return Some(if camera.xr_enabled {
            "Disabling TAA because MSAA is on. MSAA must be disabled globally for all cameras in XR mode."
        } else {
            "Disabling TAA because MSAA is on."
        });
    }

    if camera.render_type == CameraRenderType::Overlay || camera.stack_len > 0 {
        return Some("Disabling TAA because camera is stacked.");
    }

    if camera.allow_dynamic_resolution {
        return Some(
            "Disabling TAA because camera has dynamic resolution enabled. You can use a constant render scale instead.",
        );
    }

    if !camera.post_process_enabled {
        return Some("Disabling TAA because camera has post-processing disabled.");
    }

    None
}

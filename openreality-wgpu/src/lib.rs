//! OpenReality WebGPU TAA backend and C FFI entry points.
//!
//! The Rust side ([`backend`], [`resolve`]) plugs wgpu into the history
//! store. The `or_taa_*` functions expose per-camera TAA state to the
//! engine's scripting host via ccall; history images are allocated through
//! the callbacks in [`ffi_host`]. All use `extern "C"` ABI with
//! `#[no_mangle]`.

pub mod backend;
pub mod ffi_host;
pub mod handle;
pub mod passes;
pub mod pipeline;
pub mod render_targets;
pub mod resolve;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

use ffi_host::{FfiHost, OrTaaHostCallbacks, OrTaaImageDesc};
use handle::HandleStore;
use openreality_taa::{
    halton_jitter, is_new_frame, jitter_matrix, validate, CameraRenderType, CameraState, Eye,
    TaaCamera, TaaSettings, FILTER_TAPS, NEVER_UPDATED,
};

// Global store of per-camera TAA state.
static CAMERAS: LazyLock<Mutex<HandleStore<TaaCamera>>> =
    LazyLock::new(|| Mutex::new(HandleStore::new()));

// Global store of engine allocator callbacks. Lock after `CAMERAS`.
static HOSTS: LazyLock<Mutex<HandleStore<FfiHost>>> =
    LazyLock::new(|| Mutex::new(HandleStore::new()));

// Last validation warning, kept alive for `or_taa_last_warning`.
static LAST_WARNING: LazyLock<Mutex<Option<CString>>> = LazyLock::new(|| Mutex::new(None));

fn cameras() -> MutexGuard<'static, HandleStore<TaaCamera>> {
    CAMERAS.lock().unwrap_or_else(PoisonError::into_inner)
}

fn hosts() -> MutexGuard<'static, HandleStore<FfiHost>> {
    HOSTS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Parse settings JSON; the error is the message to log.
fn settings_from_c(json: &CStr) -> Result<TaaSettings, String> {
    let json = json
        .to_str()
        .map_err(|e| format!("TAA settings are not UTF-8: {e}"))?;
    TaaSettings::from_json(json).map_err(|e| e.to_string())
}

fn eye_from_ffi(eye: i32) -> Option<Eye> {
    usize::try_from(eye).ok().and_then(Eye::from_index)
}

/// Create TAA state for one camera. `settings_json` may be null for
/// defaults. Returns 0 on failure.
///
/// # Safety
/// `settings_json` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn or_taa_create(settings_json: *const c_char) -> u64 {
    let _ = env_logger::try_init();

    let settings = if settings_json.is_null() {
        TaaSettings::default()
    } else {
        match settings_from_c(unsafe { CStr::from_ptr(settings_json) }) {
            Ok(s) => s,
            Err(msg) => {
                log::error!("{msg}");
                return 0;
            }
        }
    };

    let handle = cameras().insert(TaaCamera::new(settings));
    log::info!("TAA camera {handle} created ({:?})", settings.quality);
    handle
}

#[no_mangle]
pub extern "C" fn or_taa_destroy(camera: u64) -> i32 {
    match cameras().remove(camera) {
        Some(_) => 0,
        None => -1,
    }
}

/// Register the engine's image callbacks. Returns 0 if a callback is missing.
///
/// # Safety
/// `callbacks` must be null or point to a valid [`OrTaaHostCallbacks`].
#[no_mangle]
pub unsafe extern "C" fn or_taa_host_create(callbacks: *const OrTaaHostCallbacks) -> u64 {
    let Some(callbacks) = (unsafe { callbacks.as_ref() }) else {
        return 0;
    };
    match FfiHost::new(callbacks) {
        Some(host) => hosts().insert(host),
        None => {
            log::error!("TAA host callbacks incomplete");
            0
        }
    }
}

/// Cameras must release their history through this host first.
#[no_mangle]
pub extern "C" fn or_taa_host_destroy(host: u64) -> i32 {
    match hosts().remove(host) {
        Some(_) => 0,
        None => -1,
    }
}

/// Bring a camera's history in line with its target. Returns 1 if images
/// were (re)allocated, 0 if nothing changed or the target is not ready, -1
/// on a bad handle or descriptor.
///
/// # Safety
/// `target` must be null or point to a valid [`OrTaaImageDesc`].
#[no_mangle]
pub unsafe extern "C" fn or_taa_update(
    camera: u64,
    host: u64,
    target: *const OrTaaImageDesc,
    stereo: i32,
) -> i32 {
    let Some(desc) = (unsafe { target.as_ref() }).and_then(OrTaaImageDesc::to_descriptor) else {
        return -1;
    };
    let mut cameras = cameras();
    let mut hosts = hosts();
    let (Some(cam), Some(host)) = (cameras.get_mut(camera), hosts.get_mut(host)) else {
        return -1;
    };
    cam.history.update(host, &desc, stereo != 0) as i32
}

/// Host image holding `eye`'s history, or 0 if none.
#[no_mangle]
pub extern "C" fn or_taa_accumulation_image(camera: u64, eye: i32) -> u64 {
    let cameras = cameras();
    match (cameras.get(camera), eye_from_ffi(eye)) {
        (Some(cam), Some(eye)) => cam.history.accumulation_image(eye).map_or(0, |h| h.0),
        _ => 0,
    }
}

/// 1 if `eye`'s history has not yet received `frame_count`, 0 if it has,
/// -1 on a bad handle or eye.
#[no_mangle]
pub extern "C" fn or_taa_is_new_frame(camera: u64, eye: i32, frame_count: i32) -> i32 {
    let cameras = cameras();
    match (cameras.get(camera), eye_from_ffi(eye)) {
        (Some(cam), Some(eye)) => is_new_frame(&cam.history, eye, frame_count) as i32,
        _ => -1,
    }
}

/// Release a camera's history images through `host`.
#[no_mangle]
pub extern "C" fn or_taa_release(camera: u64, host: u64) -> i32 {
    let mut cameras = cameras();
    let mut hosts = hosts();
    let (Some(cam), Some(host)) = (cameras.get_mut(camera), hosts.get_mut(host)) else {
        return -1;
    };
    cam.release(host);
    0
}

/// Write the column-major jitter matrix for `frame_count` into `out`
/// (16 floats). Identity when `enabled` is 0.
///
/// # Safety
/// `out` must point to 16 writable floats.
#[no_mangle]
pub unsafe extern "C" fn or_taa_jitter_matrix(
    camera: u64,
    frame_count: i32,
    width: i32,
    height: i32,
    enabled: i32,
    out: *mut f32,
) -> i32 {
    if out.is_null() || width <= 0 || height <= 0 {
        return -1;
    }
    let cameras = cameras();
    let Some(cam) = cameras.get(camera) else {
        return -1;
    };
    let m = jitter_matrix(
        cam.settings.jitter_frame_index(frame_count),
        width as u32,
        height as u32,
        cam.settings.jitter_scale,
        enabled != 0,
        halton_jitter,
    );
    let cols = m.to_cols_array();
    unsafe { std::ptr::copy_nonoverlapping(cols.as_ptr(), out, cols.len()) };
    0
}

/// Write the 9 resolve filter weights for `frame_count` into `out`.
///
/// # Safety
/// `out` must point to `len` writable floats.
#[no_mangle]
pub unsafe extern "C" fn or_taa_filter_weights(
    camera: u64,
    frame_count: i32,
    out: *mut f32,
    len: i32,
) -> i32 {
    if out.is_null() || len < FILTER_TAPS as i32 {
        return -1;
    }
    let mut cameras = cameras();
    let Some(cam) = cameras.get_mut(camera) else {
        return -1;
    };
    let weights = cam.filter_weights(frame_count);
    unsafe { std::ptr::copy_nonoverlapping(weights.as_ptr(), out, FILTER_TAPS) };
    0
}

/// Frame last written into `eye`'s history, or -1 if never (or on a bad
/// handle or eye).
#[no_mangle]
pub extern "C" fn or_taa_last_updated_frame(camera: u64, eye: i32) -> i32 {
    let cameras = cameras();
    match (cameras.get(camera), eye_from_ffi(eye)) {
        (Some(cam), Some(eye)) => cam.history.last_updated_frame(eye),
        _ => NEVER_UPDATED,
    }
}

#[no_mangle]
pub extern "C" fn or_taa_set_last_updated_frame(camera: u64, eye: i32, frame: i32) -> i32 {
    let mut cameras = cameras();
    match (cameras.get_mut(camera), eye_from_ffi(eye)) {
        (Some(cam), Some(eye)) => {
            cam.history.set_last_updated_frame(eye, frame);
            0
        }
        _ => -1,
    }
}

/// Request a history reset: 1 normal, 2 XR, -1 until cleared, 0 clears.
#[no_mangle]
pub extern "C" fn or_taa_request_reset(camera: u64, frames: i32) -> i32 {
    let mut cameras = cameras();
    let Some(cam) = cameras.get_mut(camera) else {
        return -1;
    };
    cam.settings.request_reset(frames);
    0
}

/// Check whether TAA can run for a camera this frame. Returns 0 if it can,
/// -1 if TAA must be disabled; the reason is then available from
/// [`or_taa_last_warning`].
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub extern "C" fn or_taa_validate(
    has_persistent_data: i32,
    msaa_samples: i32,
    xr_enabled: i32,
    is_overlay: i32,
    stack_len: i32,
    allow_dynamic_resolution: i32,
    post_process_enabled: i32,
    frame_count: i32,
) -> i32 {
    let state = CameraState {
        has_persistent_data: has_persistent_data != 0,
        msaa_samples: msaa_samples.max(0) as u32,
        xr_enabled: xr_enabled != 0,
        render_type: if is_overlay != 0 {
            CameraRenderType::Overlay
        } else {
            CameraRenderType::Base
        },
        stack_len: stack_len.max(0) as usize,
        allow_dynamic_resolution: allow_dynamic_resolution != 0,
        post_process_enabled: post_process_enabled != 0,
    };

    let warning = validate(&state, frame_count);
    let mut last = LAST_WARNING.lock().unwrap_or_else(PoisonError::into_inner);
    *last = warning.and_then(|msg| CString::new(msg).ok());
    if warning.is_some() {
        -1
    } else {
        0
    }
}

/// Reason from the last failed [`or_taa_validate`], or null. Valid until the
/// next validate call.
#[no_mangle]
pub extern "C" fn or_taa_last_warning() -> *const c_char {
    let last = LAST_WARNING.lock().unwrap_or_else(PoisonError::into_inner);
    match last.as_ref() {
        Some(msg) => msg.as_ptr(),
        None => std::ptr::null(),
    }
}

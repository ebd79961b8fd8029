//! Temporal anti-aliasing history management and jitter for OpenReality.
//!
//! Backend-agnostic: the GPU side is reached only through the traits in
//! [`host`]. Per frame, a camera calls [`camera::TaaCamera::prepare_frame`]
//! (history refresh, then jittered projection) before rendering and
//! [`camera::TaaCamera::resolve`] once per eye after it.

pub mod camera;
pub mod descriptor;
pub mod error;
pub mod format;
pub mod frame;
pub mod history;
pub mod host;
pub mod jitter;
pub mod settings;
pub mod validate;

pub use camera::{PreparedFrame, TaaCamera};
pub use descriptor::{accumulation_descriptor, DescriptorFingerprint, ImageDescriptor, TextureDimension, VrUsage};
pub use error::{TaaError, TaaResult};
pub use format::{select_accumulation_format, PixelFormat, ACCUMULATION_FORMATS};
pub use frame::{is_new_frame, FrameOutcome, MotionInput, ResolveRequest, TaaFrame, HISTORY_COPY_PASS};
pub use history::{Eye, HistorySlot, HistoryStore, NEVER_UPDATED};
pub use host::{FormatSupport, ImageAllocator, ImageHandle, ResolveExecutor};
pub use jitter::{apply_jitter, halton, halton_jitter, jitter_matrix, FilterWeights, Jitter, FILTER_TAPS};
pub use settings::{TaaQuality, TaaSettings};
pub use validate::{validate, CameraRenderType, CameraState};

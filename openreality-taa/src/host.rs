//! Interfaces the TAA core consumes from the rendering backend.

use crate::descriptor::ImageDescriptor;
use crate::error::TaaResult;
use crate::format::PixelFormat;
use crate::frame::ResolveRequest;

/// Opaque identifier of a backend-owned image. The backend decides what it
/// refers to; the core only stores and hands it back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageHandle(pub u64);

/// Device capability query.
pub trait FormatSupport {
    /// True if `format` can be used as a render attachment on this device.
    fn is_render_format_supported(&self, format: PixelFormat) -> bool;
}

/// Allocation of persistent accumulation images.
pub trait ImageAllocator: FormatSupport {
    /// Create an image matching `desc`. `name` is a debug label.
    fn allocate(&mut self, desc: &ImageDescriptor, name: &str) -> TaaResult<ImageHandle>;

    /// Destroy an image previously returned by [`ImageAllocator::allocate`].
    fn release(&mut self, handle: ImageHandle);
}

/// Records the resolve and history-copy work for one camera eye.
///
/// Work is queued, never waited on.
pub trait ResolveExecutor {
    /// Blend the current color with history into the frame's destination.
    fn resolve(&mut self, request: &ResolveRequest);

    /// Copy the resolved destination back into `accumulation` using the
    /// shader pass `pass_index`.
    fn copy_to_history(&mut self, accumulation: ImageHandle, pass_index: usize);
}

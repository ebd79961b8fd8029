//! Persistent per-camera accumulation history.

use crate::descriptor::{accumulation_descriptor, DescriptorFingerprint, ImageDescriptor};
use crate::host::{ImageAllocator, ImageHandle};

/// `last_updated_frame` of a slot that has never received a resolved frame.
pub const NEVER_UPDATED: i32 = -1;

const SLOT_NAMES: [&str; 2] = ["TaaAccumulationTex0", "TaaAccumulationTex1"];

/// Stereo eye / XR multipass index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Eye {
    #[default]
    Left = 0,
    Right = 1,
}

impl Eye {
    pub const ALL: [Eye; 2] = [Eye::Left, Eye::Right];

    pub fn from_index(index: usize) -> Option<Eye> {
        match index {
            0 => Some(Eye::Left),
            1 => Some(Eye::Right),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// One accumulation image and the frame it last received.
#[derive(Debug)]
pub struct HistorySlot {
    image: Option<ImageHandle>,
    last_updated_frame: i32,
    name: &'static str,
}

impl HistorySlot {
    fn new(eye: Eye) -> Self {
        Self {
            image: None,
            last_updated_frame: NEVER_UPDATED,
            name: SLOT_NAMES[eye.index()],
        }
    }

    pub fn image(&self) -> Option<ImageHandle> {
        self.image
    }

    pub fn last_updated_frame(&self) -> i32 {
        self.last_updated_frame
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn release(&mut self, host: &mut impl ImageAllocator) {
        if let Some(handle) = self.image.take() {
            host.release(handle);
        }
        self.last_updated_frame = NEVER_UPDATED;
    }
}

/// Double-buffered (stereo-capable) TAA history owned by one camera.
///
/// Images are allocated lazily on the first ready descriptor and invalidated
/// as a whole whenever the canonical descriptor changes. The owner must call
/// [`HistoryStore::release`] before dropping the store.
#[derive(Debug)]
pub struct HistoryStore {
    slots: [HistorySlot; 2],
    descriptor: Option<ImageDescriptor>,
    fingerprint: Option<DescriptorFingerprint>,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore {
    pub fn new() -> Self {
        Self {
            slots: [HistorySlot::new(Eye::Left), HistorySlot::new(Eye::Right)],
            descriptor: None,
            fingerprint: None,
        }
    }

    /// Bring the history in line with this frame's camera target.
    ///
    /// Returns true if images were allocated by this call. A camera target
    /// without size or format, or one for which no accumulation format is
    /// renderable, leaves the store untouched and returns false.
    pub fn update(
        &mut self,
        host: &mut impl ImageAllocator,
        camera_desc: &ImageDescriptor,
        stereo: bool,
    ) -> bool {
        if !camera_desc.is_ready() {
            return false;
        }

        let desc = accumulation_descriptor(camera_desc, &*host);
        if desc.format.is_none() {
            return false;
        }

        let fingerprint = desc.fingerprint();
        if self.fingerprint != Some(fingerprint) {
            self.reset(host);
        }

        if self.slots[Eye::Left.index()].image.is_some() {
            return false;
        }

        match self.alloc(host, &desc, stereo) {
            Ok(()) => {
                self.descriptor = Some(desc);
                self.fingerprint = Some(fingerprint);
                log::info!(
                    "TAA history allocated ({}x{} {:?}, stereo: {stereo})",
                    desc.width,
                    desc.height,
                    desc.format
                );
                true
            }
            Err(e) => {
                log::warn!("TAA history allocation failed, retrying next frame: {e}");
                self.reset(host);
                false
            }
        }
    }

    fn alloc(
        &mut self,
        host: &mut impl ImageAllocator,
        desc: &ImageDescriptor,
        stereo: bool,
    ) -> crate::error::TaaResult<()> {
        let eyes: &[Eye] = if stereo { &Eye::ALL } else { &[Eye::Left] };
        for &eye in eyes {
            let slot = &mut self.slots[eye.index()];
            slot.image = Some(host.allocate(desc, slot.name)?);
        }
        Ok(())
    }

    /// Release every image and forget the descriptor. Safe to call repeatedly.
    pub fn reset(&mut self, host: &mut impl ImageAllocator) {
        if self.descriptor.is_some() {
            log::debug!("TAA history invalidated");
        }
        for slot in &mut self.slots {
            slot.release(host);
        }
        self.descriptor = None;
        self.fingerprint = None;
    }

    /// Teardown; identical to [`HistoryStore::reset`].
    pub fn release(&mut self, host: &mut impl ImageAllocator) {
        self.reset(host);
    }

    pub fn slot(&self, eye: Eye) -> &HistorySlot {
        &self.slots[eye.index()]
    }

    pub fn accumulation_image(&self, eye: Eye) -> Option<ImageHandle> {
        self.slots[eye.index()].image
    }

    pub fn last_updated_frame(&self, eye: Eye) -> i32 {
        self.slots[eye.index()].last_updated_frame
    }

    pub fn set_last_updated_frame(&mut self, eye: Eye, frame_index: i32) {
        self.slots[eye.index()].last_updated_frame = frame_index;
    }

    /// Canonical descriptor of the allocated images.
    pub fn descriptor(&self) -> Option<&ImageDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn fingerprint(&self) -> Option<DescriptorFingerprint> {
        self.fingerprint
    }

    /// Whether the allocated history format needs the low-precision resolve.
    pub fn is_low_precision(&self) -> bool {
        self.descriptor
            .map(|d| d.format.is_low_precision())
            .unwrap_or(false)
    }
}

impl Drop for HistoryStore {
    fn drop(&mut self) {
        let leaked = self.slots.iter().filter(|s| s.image.is_some()).count();
        if leaked > 0 {
            log::warn!("TAA history dropped while still owning {leaked} image(s)");
        }
    }
}

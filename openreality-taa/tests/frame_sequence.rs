//! Multi-frame TAA scenarios against in-memory host collaborators.

use std::collections::HashMap;

use glam::Mat4;
use openreality_taa::{
    halton_jitter, validate, CameraState, Eye, FormatSupport, FrameOutcome, ImageAllocator,
    ImageDescriptor, ImageHandle, MotionInput, PixelFormat, ResolveExecutor, ResolveRequest,
    TaaCamera, TaaQuality, TaaResult, TaaSettings, HISTORY_COPY_PASS, NEVER_UPDATED,
};

#[derive(Default)]
struct MemoryHost {
    next: u64,
    images: HashMap<ImageHandle, ImageDescriptor>,
    supported: Option<Vec<PixelFormat>>,
}

impl FormatSupport for MemoryHost {
    fn is_render_format_supported(&self, format: PixelFormat) -> bool {
        match &self.supported {
            Some(list) => list.contains(&format),
            None => !format.is_none(),
        }
    }
}

impl ImageAllocator for MemoryHost {
    fn allocate(&mut self, desc: &ImageDescriptor, _name: &str) -> TaaResult<ImageHandle> {
        self.next += 1;
        let handle = ImageHandle(self.next);
        self.images.insert(handle, *desc);
        Ok(handle)
    }

    fn release(&mut self, handle: ImageHandle) {
        self.images.remove(&handle);
    }
}

#[derive(Default)]
struct Recorder {
    resolves: Vec<ResolveRequest>,
    copies: Vec<(ImageHandle, usize)>,
}

impl ResolveExecutor for Recorder {
    fn resolve(&mut self, request: &ResolveRequest) {
        self.resolves.push(*request);
    }

    fn copy_to_history(&mut self, accumulation: ImageHandle, pass_index: usize) {
        self.copies.push((accumulation, pass_index));
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn run_frame(
    camera: &mut TaaCamera,
    host: &mut MemoryHost,
    rec: &mut Recorder,
    target: &ImageDescriptor,
    frame: i32,
) -> FrameOutcome {
    camera.prepare_frame(host, target, false, frame, Mat4::IDENTITY, true, halton_jitter);
    camera.resolve(frame, Eye::Left, rec)
}

#[test]
fn test_sequential_frames_then_rerender() {
    init_logging();
    let mut host = MemoryHost::default();
    let mut rec = Recorder::default();
    let mut camera = TaaCamera::default();
    let target = ImageDescriptor::color_2d(1920, 1080, PixelFormat::Rgba16Float);

    for frame in 1..=3 {
        let outcome = run_frame(&mut camera, &mut host, &mut rec, &target, frame);
        assert_eq!(
            outcome,
            FrameOutcome::Resolved {
                is_new_frame: true,
                history_copied: true
            }
        );
        assert_eq!(camera.history.last_updated_frame(Eye::Left), frame);
    }
    assert_eq!(rec.copies.len(), 3);
    assert!(rec.copies.iter().all(|&(_, pass)| pass == HISTORY_COPY_PASS));
    assert!(rec.resolves.iter().all(|r| r.motion == MotionInput::Vectors));

    // Paused: frame 3 is rendered again.
    let outcome = run_frame(&mut camera, &mut host, &mut rec, &target, 3);
    assert_eq!(
        outcome,
        FrameOutcome::Resolved {
            is_new_frame: false,
            history_copied: false
        }
    );
    assert_eq!(rec.resolves.last().unwrap().motion, MotionInput::Zero);
    assert_eq!(rec.copies.len(), 3);
    assert_eq!(camera.history.last_updated_frame(Eye::Left), 3);

    camera.release(&mut host);
    assert!(host.images.is_empty());
}

#[test]
fn test_resize_invalidates_history_mid_sequence() {
    init_logging();
    let mut host = MemoryHost::default();
    let mut rec = Recorder::default();
    let mut camera = TaaCamera::default();
    let small = ImageDescriptor::color_2d(1280, 720, PixelFormat::Rgba16Float);
    let large = ImageDescriptor::color_2d(1920, 1080, PixelFormat::Rgba16Float);

    run_frame(&mut camera, &mut host, &mut rec, &small, 1);
    let before = camera.history.accumulation_image(Eye::Left).unwrap();

    let prepared = camera.prepare_frame(&mut host, &large, false, 2, Mat4::IDENTITY, true, halton_jitter);
    assert!(prepared.reallocated);
    assert_eq!(camera.history.last_updated_frame(Eye::Left), NEVER_UPDATED);
    let after = camera.history.accumulation_image(Eye::Left).unwrap();
    assert_ne!(before, after);
    assert_eq!(host.images.len(), 1);
    assert_eq!(host.images[&after].width, 1920);

    camera.resolve(2, Eye::Left, &mut rec);
    assert_eq!(rec.resolves.last().unwrap().accumulation, after);

    camera.release(&mut host);
}

#[test]
fn test_low_precision_fallback_reaches_resolve() {
    init_logging();
    let mut host = MemoryHost {
        supported: Some(vec![PixelFormat::Rgba8Unorm, PixelFormat::Bgra8Unorm]),
        ..MemoryHost::default()
    };
    let mut rec = Recorder::default();
    let mut camera = TaaCamera::new(TaaSettings {
        quality: TaaQuality::VeryHigh,
        ..TaaSettings::default()
    });
    let target = ImageDescriptor::color_2d(640, 480, PixelFormat::Rgba32Float);

    run_frame(&mut camera, &mut host, &mut rec, &target, 10);
    let allocated = host.images.values().next().unwrap();
    assert_eq!(allocated.format, PixelFormat::Rgba8Unorm);

    let req = rec.resolves[0];
    assert!(req.low_precision_source);
    assert_eq!(req.pass_index, TaaQuality::VeryHigh.pass_index());
    let sum: f32 = req.filter_weights.unwrap().iter().sum();
    assert!((sum - 1.0).abs() < 1e-5);

    camera.release(&mut host);
}

#[test]
fn test_incompatible_camera_skips_taa() {
    init_logging();
    let camera_state = CameraState {
        msaa_samples: 8,
        ..CameraState::default()
    };
    assert!(validate(&camera_state, 120).is_some());

    let mut host = MemoryHost::default();
    let mut camera = TaaCamera::default();
    let target = ImageDescriptor::color_2d(320, 240, PixelFormat::Rgba16Float);
    let enabled = validate(&camera_state, 120).is_none();
    let prepared = camera.prepare_frame(&mut host, &target, false, 120, Mat4::IDENTITY, enabled, halton_jitter);
    assert!(!prepared.reallocated);
    assert_eq!(prepared.jitter, Mat4::IDENTITY);
    assert!(host.images.is_empty());
}

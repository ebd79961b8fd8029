//! Sub-pixel camera jitter and the matching resolve filter weights.
//!
//! Jitter comes from the Halton (2, 3) sequence. Frame indices are masked to
//! 1024 entries and shifted by one so that sequence index 0, which would give
//! a constant (-0.5, -0.5) offset, is never used.

use glam::{Mat4, Vec2, Vec3};

/// Number of taps in the resolve filter (3x3 neighborhood).
pub const FILTER_TAPS: usize = 9;

/// 3x3 tap offsets in the order the resolve shader samples them: center,
/// the four axis-aligned neighbors, then the four diagonals.
pub const FILTER_OFFSETS: [Vec2; FILTER_TAPS] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(-1.0, 0.0),
    Vec2::new(0.0, -1.0),
    Vec2::new(-1.0, 1.0),
    Vec2::new(1.0, -1.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(-1.0, -1.0),
];

/// Gaussian fit of the Blackman-Harris window used by the resolve.
const FILTER_FALLOFF: f32 = -0.5 / 0.22;

const SEQUENCE_MASK: i32 = 1023;

/// Jitter for one frame, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Jitter {
    pub offset: Vec2,
    /// Whether the per-camera jitter scale may be applied to `offset`.
    pub allow_scaling: bool,
}

/// Radical inverse of `index` in `base`. `base` must be at least 2.
pub fn halton(mut index: u32, base: u32) -> f32 {
    debug_assert!(base >= 2, "halton base must be at least 2, got {base}");
    let mut result = 0.0f32;
    let mut fraction = 1.0 / base as f32;
    while index > 0 {
        result += (index % base) as f32 * fraction;
        index /= base;
        fraction /= base as f32;
    }
    result
}

/// Default jitter provider: Halton (2, 3) centered on the pixel, in
/// [-0.5, 0.5).
pub fn halton_jitter(frame_index: i32) -> Jitter {
    let index = ((frame_index & SEQUENCE_MASK) + 1) as u32;
    Jitter {
        offset: Vec2::new(halton(index, 2) - 0.5, halton(index, 3) - 0.5),
        allow_scaling: true,
    }
}

/// Projection offset for `frame_index`, to be pre-multiplied onto the camera
/// projection. Identity when jitter is disabled.
///
/// `jitter_fn` supplies the per-frame pixel offset; pass [`halton_jitter`]
/// unless a custom pattern is needed.
pub fn jitter_matrix<F>(
    frame_index: i32,
    target_width: u32,
    target_height: u32,
    jitter_scale: f32,
    enabled: bool,
    jitter_fn: F,
) -> Mat4
where
    F: Fn(i32) -> Jitter,
{
    if !enabled {
        return Mat4::IDENTITY;
    }

    let Jitter {
        mut offset,
        allow_scaling,
    } = jitter_fn(frame_index);
    if allow_scaling {
        offset *= jitter_scale;
    }

    let x = offset.x * (2.0 / target_width as f32);
    let y = offset.y * (2.0 / target_height as f32);
    Mat4::from_translation(Vec3::new(x, y, 0.0))
}

/// Compose a jitter matrix onto a projection matrix.
pub fn apply_jitter(projection: Mat4, jitter: Mat4) -> Mat4 {
    jitter * projection
}

/// Reusable scratch for the 3x3 resolve filter weights.
///
/// Only the highest quality resolve needs these; lower tiers use a fixed
/// kernel in the shader.
#[derive(Clone, Debug, Default)]
pub struct FilterWeights {
    weights: [f32; FILTER_TAPS + 1],
}

impl FilterWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the weights for the jitter of `frame_index`.
    ///
    /// The rendered pixel grid is already jittered, so each integer tap is
    /// weighted by its distance to the un-jittered pixel center at
    /// `-jitter * jitter_scale`. The built-in Halton jitter is always used.
    pub fn compute(&mut self, frame_index: i32, jitter_scale: f32) -> &[f32] {
        let jitter = halton_jitter(frame_index).offset * jitter_scale;

        let mut total = 0.0;
        for (w, tap) in self.weights.iter_mut().zip(FILTER_OFFSETS) {
            let d = tap - jitter;
            *w = (FILTER_FALLOFF * d.length_squared()).exp();
            total += *w;
        }

        for w in &mut self.weights[..FILTER_TAPS] {
            *w /= total;
        }
        self.weights[FILTER_TAPS] = 0.0;

        self.as_slice()
    }

    /// The 9 active weights from the last [`FilterWeights::compute`].
    pub fn as_slice(&self) -> &[f32] {
        &self.weights[..FILTER_TAPS]
    }

    /// Owned copy of the active weights, for deferred passes.
    pub fn snapshot(&self) -> [f32; FILTER_TAPS] {
        let mut out = [0.0; FILTER_TAPS];
        out.copy_from_slice(self.as_slice());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn radical_inverse(mut n: u32, base: u32) -> f64 {
        let mut inv = 1.0 / base as f64;
        let mut out = 0.0;
        while n > 0 {
            out += (n % base) as f64 * inv;
            n /= base;
            inv /= base as f64;
        }
        out
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "halton base must be at least 2")]
    fn test_halton_rejects_degenerate_base() {
        halton(3, 0);
    }

    #[test]
    fn test_halton_known_values() {
        assert_eq!(halton(1, 2), 0.5);
        assert_eq!(halton(2, 2), 0.25);
        assert_eq!(halton(3, 2), 0.75);
        assert_relative_eq!(halton(1, 3), 1.0 / 3.0);
        assert_relative_eq!(halton(2, 3), 2.0 / 3.0);
        assert_relative_eq!(halton(4, 3), 4.0 / 9.0);
    }

    #[test]
    fn test_halton_jitter_matches_independent_sequence() {
        for frame in [0, 1, 2, 17, 511, 1023, 4096 + 3] {
            let index = ((frame & 1023) + 1) as u32;
            let j = halton_jitter(frame);
            assert_relative_eq!(j.offset.x as f64, radical_inverse(index, 2) - 0.5, epsilon = 1e-6);
            assert_relative_eq!(j.offset.y as f64, radical_inverse(index, 3) - 0.5, epsilon = 1e-6);
            assert!(j.allow_scaling);
        }
    }

    #[test]
    fn test_halton_jitter_is_deterministic() {
        for frame in 0..2048 {
            assert_eq!(halton_jitter(frame), halton_jitter(frame));
        }
    }

    #[test]
    fn test_sequence_wraps_every_1024_frames() {
        assert_eq!(halton_jitter(0), halton_jitter(1024));
        assert_eq!(halton_jitter(5), halton_jitter(5 + 1024 * 3));
        assert_ne!(halton_jitter(0), halton_jitter(1023));
        // Index 0 of the sequence would be (-0.5, -0.5).
        assert_eq!(halton_jitter(0).offset, Vec2::new(0.0, 1.0 / 3.0 - 0.5));
        assert_ne!(halton_jitter(1023).offset, Vec2::new(-0.5, -0.5));
    }

    #[test]
    fn test_jitter_in_range() {
        for frame in 0..1024 {
            let o = halton_jitter(frame).offset;
            assert!(o.x >= -0.5 && o.x < 0.5);
            assert!(o.y >= -0.5 && o.y < 0.5);
        }
    }

    #[test]
    fn test_jitter_matrix_disabled_is_identity() {
        let m = jitter_matrix(12, 1920, 1080, 1.0, false, halton_jitter);
        assert_eq!(m, Mat4::IDENTITY);
    }

    #[test]
    fn test_jitter_matrix_translation() {
        let frame = 6;
        let m = jitter_matrix(frame, 1920, 1080, 0.5, true, halton_jitter);
        let j = halton_jitter(frame).offset * 0.5;
        assert_relative_eq!(m.w_axis.x, j.x * (2.0 / 1920.0));
        assert_relative_eq!(m.w_axis.y, j.y * (2.0 / 1080.0));
        assert_eq!(m.w_axis.z, 0.0);
        assert_eq!(m.x_axis, Mat4::IDENTITY.x_axis);
    }

    #[test]
    fn test_jitter_matrix_respects_allow_scaling() {
        let fixed = |_: i32| Jitter {
            offset: Vec2::new(0.25, -0.25),
            allow_scaling: false,
        };
        let m = jitter_matrix(0, 100, 200, 10.0, true, fixed);
        assert_relative_eq!(m.w_axis.x, 0.25 * (2.0 / 100.0));
        assert_relative_eq!(m.w_axis.y, -0.25 * (2.0 / 200.0));
    }

    #[test]
    fn test_apply_jitter_offsets_clip_space() {
        let proj = Mat4::perspective_rh(45.0_f32.to_radians(), 16.0 / 9.0, 0.1, 100.0);
        let jitter = Mat4::from_translation(Vec3::new(0.01, -0.02, 0.0));
        let jittered = apply_jitter(proj, jitter);
        let p = glam::Vec4::new(1.0, 2.0, -5.0, 1.0);
        let a = proj * p;
        let b = jittered * p;
        assert_relative_eq!(b.x, a.x + 0.01 * a.w, epsilon = 1e-5);
        assert_relative_eq!(b.y, a.y - 0.02 * a.w, epsilon = 1e-5);
    }

    #[test]
    fn test_filter_weights_normalized() {
        let mut weights = FilterWeights::new();
        for scale in [0.0, 0.5, 1.0, 2.0] {
            for frame in [0, 1, 9, 1000] {
                let sum: f32 = weights.compute(frame, scale).iter().sum();
                assert_relative_eq!(sum, 1.0, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_filter_weights_without_jitter_are_symmetric() {
        let mut weights = FilterWeights::new();
        let w = weights.snapshot_after(0, 0.0);
        // Axis neighbors share one weight, diagonals another.
        for i in 2..5 {
            assert_relative_eq!(w[i], w[1]);
        }
        for i in 6..9 {
            assert_relative_eq!(w[i], w[5]);
        }
        assert!(w[0] > w[1] && w[1] > w[5]);
    }

    #[test]
    fn test_filter_weights_follow_jitter() {
        let mut weights = FilterWeights::new();
        let frame = 0;
        let w = weights.snapshot_after(frame, 1.0);
        let expected: Vec<f32> = {
            let j = halton_jitter(frame).offset;
            let raw: Vec<f32> = FILTER_OFFSETS
                .iter()
                .map(|&t| (FILTER_FALLOFF * (t - j).length_squared()).exp())
                .collect();
            let total: f32 = raw.iter().sum();
            raw.iter().map(|w| w / total).collect()
        };
        for (a, b) in w.iter().zip(expected) {
            assert_relative_eq!(*a, b, epsilon = 1e-6);
        }
    }

    impl FilterWeights {
        fn snapshot_after(&mut self, frame: i32, scale: f32) -> [f32; FILTER_TAPS] {
            self.compute(frame, scale);
            self.snapshot()
        }
    }
}

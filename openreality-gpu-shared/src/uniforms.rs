use bytemuck::{Pod, Zeroable};

/// TAA resolve parameters. Matches the resolve pass bind group 0, binding 0.
///
/// The 9 filter weights are packed into three `vec4<f32>` rows (the last 3
/// lanes are unused) to satisfy uniform array stride rules.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct TaaResolveUniforms {
    pub filter_weights: [[f32; 4]; 3],
    pub frame_influence: f32,
    pub variance_clamp_scale: f32,
    pub mip_bias: f32,
    pub sharpening: f32,
    /// Non-zero when history is stored in a low-precision format.
    pub low_precision_source: i32,
    /// Non-zero when `filter_weights` is valid (top quality only).
    pub has_filter_weights: i32,
    pub screen_width: f32,
    pub screen_height: f32,
}

impl TaaResolveUniforms {
    /// Pack up to 9 weights row-major into `filter_weights`.
    pub fn pack_filter_weights(weights: &[f32]) -> [[f32; 4]; 3] {
        let mut rows = [[0.0f32; 4]; 3];
        for (i, w) in weights.iter().take(9).enumerate() {
            rows[i / 4][i % 4] = *w;
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_uniforms_size_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<TaaResolveUniforms>(), 80);
        assert_eq!(std::mem::size_of::<TaaResolveUniforms>() % 16, 0);
    }

    #[test]
    fn test_pack_filter_weights() {
        let weights: Vec<f32> = (1..=9).map(|i| i as f32).collect();
        let rows = TaaResolveUniforms::pack_filter_weights(&weights);
        assert_eq!(rows[0], [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(rows[1], [5.0, 6.0, 7.0, 8.0]);
        assert_eq!(rows[2], [9.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_zeroed_is_valid() {
        let u = TaaResolveUniforms::zeroed();
        assert_eq!(bytemuck::bytes_of(&u).len(), 80);
        assert_eq!(u.has_filter_weights, 0);
    }
}

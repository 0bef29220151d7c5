use common::manifest::ShaderKind;

use super::{sampler::CpuSampler, texture::CpuTexture};
use crate::{
    bindings::TintUniform,
    shaders::{Discard, ShaderOptions},
    vertex::{GlyphVertex, QuadVertex},
};

/// What a vertex invocation hands to the rasterizer.
/// Both programs share this shape: a clip position and one UV varying.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageOutput {
    pub clip_position: [f32; 4],
    pub tex_coords: [f32; 2],
}

/// Bind group 0 as seen by the fragment stage
#[derive(Debug, Clone, Copy)]
pub struct Resources<'a> {
    pub texture: &'a CpuTexture,
    pub sampler: CpuSampler,
    /// Only the quad program declares this binding
    pub tint: TintUniform,
}

impl<'a> Resources<'a> {
    pub fn new(texture: &'a CpuTexture, sampler: CpuSampler) -> Self {
        Self {
            texture,
            sampler,
            tint: TintUniform::default(),
        }
    }

    pub fn with_tint(mut self, tint: TintUniform) -> Self {
        self.tint = tint;
        self
    }

    fn sample(&self, uv: [f32; 2]) -> [f32; 4] {
        self.sampler.sample(self.texture, uv)
    }
}

/// A vertex/fragment pair evaluated on the CPU
pub trait ShaderProgram {
    type Vertex: bytemuck::Pod;

    const KIND: ShaderKind;

    fn vertex(&self, vertex: &Self::Vertex) -> StageOutput;

    /// `None` when the fragment is discarded
    fn fragment(&self, input: &StageOutput, resources: &Resources) -> Option<[f32; 4]>;
}

/// `glyph.wgsl`: red channel becomes the alpha of opaque white
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlyphProgram {
    pub discard: Discard,
}

impl GlyphProgram {
    pub fn new(options: &ShaderOptions) -> Self {
        Self {
            discard: options.discard,
        }
    }
}

impl ShaderProgram for GlyphProgram {
    type Vertex = GlyphVertex;

    const KIND: ShaderKind = ShaderKind::GlyphAlpha;

    fn vertex(&self, vertex: &GlyphVertex) -> StageOutput {
        let [x, y, z] = vertex.position;
        StageOutput {
            clip_position: [x, y, z, 1.0],
            tex_coords: vertex.tex_coords,
        }
    }

    fn fragment(&self, input: &StageOutput, resources: &Resources) -> Option<[f32; 4]> {
        let alpha = resources.sample(input.tex_coords)[0];
        if self.discard.enabled && alpha < self.discard.threshold {
            return None;
        }
        Some([1.0, 1.0, 1.0, alpha])
    }
}

/// `quad.wgsl`: sampled color, multiplied by the tint only when enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuadProgram {
    pub tint_enabled: bool,
}

impl QuadProgram {
    pub fn new(options: &ShaderOptions) -> Self {
        Self {
            tint_enabled: options.tint_enabled,
        }
    }
}

impl ShaderProgram for QuadProgram {
    type Vertex = QuadVertex;

    const KIND: ShaderKind = ShaderKind::TexturedQuad;

    fn vertex(&self, vertex: &QuadVertex) -> StageOutput {
        let [x, y] = vertex.position;
        StageOutput {
            clip_position: [x, y, 0.0, 1.0],
            tex_coords: vertex.tex_coord,
        }
    }

    fn fragment(&self, input: &StageOutput, resources: &Resources) -> Option<[f32; 4]> {
        let color = resources.sample(input.tex_coords);
        if !self.tint_enabled {
            return Some(color);
        }
        let tint = resources.tint.color;
        Some(std::array::from_fn(|i| color[i] * tint[i]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(color: [f32; 4]) -> CpuTexture {
        CpuTexture::solid(color)
    }

    fn at(uv: [f32; 2]) -> StageOutput {
        StageOutput {
            clip_position: [0.0, 0.0, 0.0, 1.0],
            tex_coords: uv,
        }
    }

    #[test]
    fn test_glyph_alpha_from_red() {
        let texture = solid([0.3, 0.9, 0.1, 1.0]);
        let resources = Resources::new(&texture, CpuSampler::default());
        let color = GlyphProgram::default().fragment(&at([0.5, 0.5]), &resources);
        assert_eq!(color, Some([1.0, 1.0, 1.0, 0.3]));
    }

    #[test]
    fn test_glyph_ignores_other_channels() {
        for red in [0.0, 0.25, 1.0] {
            let texture = solid([red, 0.7, 0.2, 0.0]);
            let resources = Resources::new(&texture, CpuSampler::default());
            let color = GlyphProgram::default().fragment(&at([0.1, 0.9]), &resources);
            assert_eq!(color, Some([1.0, 1.0, 1.0, red]));
        }
    }

    #[test]
    fn test_glyph_vertex_w_is_one() {
        let program = GlyphProgram::default();
        for position in [[0.0, 0.0, 0.0], [-3.5, 12.0, 0.75], [1e6, -1e6, -2.0]] {
            let output = program.vertex(&GlyphVertex {
                position,
                tex_coords: [0.25, 0.75],
            });
            assert_eq!(output.clip_position[3], 1.0);
            assert_eq!(&output.clip_position[..3], &position);
            assert_eq!(output.tex_coords, [0.25, 0.75]);
        }
    }

    #[test]
    fn test_glyph_discard_toggle() {
        let texture = solid([0.05, 0.0, 0.0, 1.0]);
        let resources = Resources::new(&texture, CpuSampler::default());

        // stock behavior keeps fully transparent fragments
        let keep = GlyphProgram::default();
        assert_eq!(
            keep.fragment(&at([0.5, 0.5]), &resources),
            Some([1.0, 1.0, 1.0, 0.05])
        );

        let discard = GlyphProgram {
            discard: Discard {
                enabled: true,
                threshold: 0.1,
            },
        };
        assert_eq!(discard.fragment(&at([0.5, 0.5]), &resources), None);

        // the comparison is strict
        let edge = solid([0.1, 0.0, 0.0, 1.0]);
        let resources = Resources::new(&edge, CpuSampler::default());
        assert!(discard.fragment(&at([0.5, 0.5]), &resources).is_some());
    }

    #[test]
    fn test_quad_passthrough_ignores_tint() {
        let color = [0.2, 0.4, 0.6, 0.8];
        let texture = solid(color);
        let program = QuadProgram::default();

        for tint in [[1.0; 4], [0.0; 4], [0.5, 2.0, 0.1, 0.3]] {
            let resources =
                Resources::new(&texture, CpuSampler::default()).with_tint(TintUniform::new(tint));
            assert_eq!(program.fragment(&at([0.3, 0.3]), &resources), Some(color));
        }
    }

    #[test]
    fn test_quad_tint_toggle() {
        let texture = solid([0.5, 1.0, 0.25, 1.0]);
        let resources = Resources::new(&texture, CpuSampler::default())
            .with_tint(TintUniform::new([1.0, 0.5, 0.0, 0.5]));
        let program = QuadProgram { tint_enabled: true };
        assert_eq!(
            program.fragment(&at([0.5, 0.5]), &resources),
            Some([0.5, 0.5, 0.0, 0.5])
        );
    }

    #[test]
    fn test_quad_vertex_z_is_zero() {
        let output = QuadProgram::default().vertex(&QuadVertex {
            position: [0.75, -0.5],
            tex_coord: [1.0, 0.0],
        });
        assert_eq!(output.clip_position, [0.75, -0.5, 0.0, 1.0]);
        assert_eq!(output.tex_coords, [1.0, 0.0]);
    }

    #[test]
    fn test_programs_from_options() {
        let options = ShaderOptions {
            discard: Discard {
                enabled: true,
                threshold: 0.3,
            },
            tint_enabled: true,
        };
        assert_eq!(GlyphProgram::new(&options).discard.threshold, 0.3);
        assert!(QuadProgram::new(&options).tint_enabled);
        assert_eq!(GlyphProgram::KIND, ShaderKind::GlyphAlpha);
    }
}

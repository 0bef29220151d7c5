//! CPU reference implementation of both shader programs.
//!
//! Mirrors what the GPU does for a draw: run the vertex stage per vertex,
//! rasterize triangles at pixel centres, interpolate outputs, run the
//! fragment stage and blend into the target.

use common::manifest::{ShaderKind, ShaderManifest};
use thiserror::Error;

use crate::{
    bindings::TintUniform,
    quad::{glyph_quad, textured_quad, NdcRect, UvRect, QUAD_INDICES},
    shaders::ShaderOptions,
};

pub mod program;
pub mod raster;
pub mod sampler;
pub mod texture;

pub use program::{GlyphProgram, QuadProgram, Resources, ShaderProgram, StageOutput};
pub use raster::{blend, interpolate, Framebuffer, Rasterizer};
pub use sampler::CpuSampler;
pub use texture::CpuTexture;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Texture or framebuffer has zero size")]
    ZeroSized,

    #[error("Expected {expected} texels, got {actual}")]
    TexelCount { expected: usize, actual: usize },

    #[error("Index {index} out of bounds for {len} vertices")]
    IndexOutOfBounds { index: u32, len: usize },

    #[error("Index count {0} is not a multiple of 3")]
    InvalidTopology(usize),
}

/// Draw `texture` over the whole target with the program and state a manifest selects
pub fn render_fullscreen(
    manifest: &ShaderManifest,
    texture: &CpuTexture,
    target: &mut Framebuffer,
) -> Result<usize, RenderError> {
    let options = ShaderOptions::from_manifest(manifest);
    let resources = Resources::new(texture, CpuSampler::from(manifest.sampler))
        .with_tint(TintUniform::new(manifest.tint.color));

    log::info!(
        "Rendering {:?} at {}x{} with {:?} blending",
        manifest.shader,
        target.width(),
        target.height(),
        manifest.blend
    );

    match manifest.shader {
        ShaderKind::GlyphAlpha => {
            let program = GlyphProgram::new(&options);
            let vertices = glyph_quad(NdcRect::FULL, UvRect::FULL, 0.0);
            Rasterizer::new(&program, resources, manifest.blend).draw_indexed(
                target,
                &vertices,
                &QUAD_INDICES,
            )
        }
        ShaderKind::TexturedQuad => {
            let program = QuadProgram::new(&options);
            let vertices = textured_quad(NdcRect::FULL, UvRect::FULL);
            Rasterizer::new(&program, resources, manifest.blend).draw_indexed(
                target,
                &vertices,
                &QUAD_INDICES,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::manifest::{BlendMode, FilterMode};
    use image::{DynamicImage, Rgba, RgbaImage};
    use tempfile::tempdir;

    #[test]
    fn test_render_glyph_manifest() {
        let mut manifest = ShaderManifest::new("glyphs", ShaderKind::GlyphAlpha);
        manifest.blend = BlendMode::Replace;
        let texture = CpuTexture::from_r8(1, 1, &[51]).unwrap();
        let mut target = Framebuffer::new(3, 2, [0.0; 4]).unwrap();

        let written = render_fullscreen(&manifest, &texture, &mut target).unwrap();
        assert_eq!(written, 6);
        assert_eq!(target.pixel(2, 1), [1.0, 1.0, 1.0, 51.0 / 255.0]);
    }

    #[test]
    fn test_render_tinted_manifest() {
        let mut manifest = ShaderManifest::new("quad", ShaderKind::TexturedQuad);
        manifest.blend = BlendMode::Replace;
        manifest.tint.color = [0.5, 0.5, 0.5, 1.0];
        let texture = CpuTexture::solid([1.0, 0.5, 0.0, 1.0]);

        let mut untinted = Framebuffer::new(2, 2, [0.0; 4]).unwrap();
        render_fullscreen(&manifest, &texture, &mut untinted).unwrap();
        assert_eq!(untinted.pixel(0, 0), [1.0, 0.5, 0.0, 1.0]);

        manifest.tint.enabled = true;
        let mut tinted = Framebuffer::new(2, 2, [0.0; 4]).unwrap();
        render_fullscreen(&manifest, &texture, &mut tinted).unwrap();
        assert_eq!(tinted.pixel(1, 1), [0.5, 0.25, 0.0, 1.0]);
    }

    #[test]
    fn test_quad_reproduces_texture_through_png() {
        let mut source = RgbaImage::new(2, 2);
        source.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        source.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
        source.put_pixel(0, 1, Rgba([0, 0, 255, 255]));
        source.put_pixel(1, 1, Rgba([40, 80, 120, 255]));

        let mut manifest = ShaderManifest::new("copy", ShaderKind::TexturedQuad);
        manifest.blend = BlendMode::Replace;
        manifest.sampler.filter = FilterMode::Nearest;

        let texture = CpuTexture::from_image(&DynamicImage::ImageRgba8(source.clone())).unwrap();
        let mut target = Framebuffer::new(2, 2, [0.0; 4]).unwrap();
        render_fullscreen(&manifest, &texture, &mut target).unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("copy.png");
        target.to_image().save(&path).unwrap();

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded, source);
    }
}

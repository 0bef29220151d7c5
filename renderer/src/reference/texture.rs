use image::DynamicImage;

use super::RenderError;

/// Texture contents as the sampler sees them: normalized RGBA floats, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuTexture {
    width: u32,
    height: u32,
    texels: Vec<[f32; 4]>,
}

impl CpuTexture {
    pub fn from_texels(width: u32, height: u32, texels: Vec<[f32; 4]>) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::ZeroSized);
        }
        let expected = width as usize * height as usize;
        if texels.len() != expected {
            return Err(RenderError::TexelCount {
                expected,
                actual: texels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            texels,
        })
    }

    /// A 1x1 texture; every sample returns `color` regardless of filtering
    pub fn solid(color: [f32; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            texels: vec![color],
        }
    }

    /// Decode an image as `Rgba8Unorm` would be sampled
    pub fn from_image(image: &DynamicImage) -> Result<Self, RenderError> {
        let rgba = image.to_rgba32f();
        let (width, height) = rgba.dimensions();
        let texels = rgba.pixels().map(|pixel| pixel.0).collect();
        Self::from_texels(width, height, texels)
    }

    /// Single-channel coverage bitmap (e.g. a rasterized glyph) as `R8Unorm`,
    /// which samples as `(r, 0, 0, 1)`
    pub fn from_r8(width: u32, height: u32, coverage: &[u8]) -> Result<Self, RenderError> {
        let texels = coverage
            .iter()
            .map(|&c| [c as f32 / 255.0, 0.0, 0.0, 1.0])
            .collect();
        Self::from_texels(width, height, texels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Texel at integer coordinates; callers resolve addressing first
    pub fn texel(&self, x: u32, y: u32) -> [f32; 4] {
        self.texels[(y * self.width + x) as usize]
    }
}

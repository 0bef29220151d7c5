use common::manifest::BlendMode;
use image::{Rgba, RgbaImage};

use super::{
    program::{Resources, ShaderProgram, StageOutput},
    RenderError,
};

/// Color attachment of the reference pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 4]>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32, clear: [f32; 4]) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::ZeroSized);
        }
        Ok(Self {
            width,
            height,
            pixels: vec![clear; width as usize * height as usize],
        })
    }

    pub fn clear(&mut self, color: [f32; 4]) {
        self.pixels.fill(color);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> [f32; 4] {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.pixels
    }

    /// Quantize to an 8-bit image, as a `Rgba8Unorm` target would store it
    pub fn to_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            Rgba(self.pixel(x, y).map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
        })
    }

    fn write(&mut self, x: u32, y: u32, color: [f32; 4], mode: BlendMode) {
        let index = (y * self.width + x) as usize;
        self.pixels[index] = blend(mode, color, self.pixels[index]);
    }
}

/// Combine a fragment with the color already in the target
pub fn blend(mode: BlendMode, src: [f32; 4], dst: [f32; 4]) -> [f32; 4] {
    let inv = 1.0 - src[3];
    match mode {
        BlendMode::Replace => src,
        BlendMode::Alpha => [
            src[0] * src[3] + dst[0] * inv,
            src[1] * src[3] + dst[1] * inv,
            src[2] * src[3] + dst[2] * inv,
            src[3] + dst[3] * inv,
        ],
        BlendMode::Premultiplied => std::array::from_fn(|i| src[i] + dst[i] * inv),
    }
}

/// Perspective-correct interpolation of vertex outputs.
/// With `w == 1` on every vertex, as both programs emit, this is plain linear
/// interpolation and returns a vertex's own values at its barycentric corner.
pub fn interpolate(outputs: [&StageOutput; 3], barycentric: [f32; 3]) -> StageOutput {
    let weights: [f32; 3] =
        std::array::from_fn(|i| barycentric[i] / outputs[i].clip_position[3]);
    let total: f32 = weights.iter().sum();

    let tex_coords: [f32; 2] = std::array::from_fn(|c| {
        weights
            .iter()
            .zip(outputs)
            .map(|(weight, output)| weight * output.tex_coords[c])
            .sum::<f32>()
            / total
    });
    let clip_position: [f32; 4] = std::array::from_fn(|c| {
        barycentric
            .iter()
            .zip(outputs)
            .map(|(b, output)| b * output.clip_position[c])
            .sum::<f32>()
    });

    StageOutput {
        clip_position,
        tex_coords,
    }
}

/// Draws indexed triangle lists through a program
pub struct Rasterizer<'a, P: ShaderProgram> {
    program: &'a P,
    resources: Resources<'a>,
    blend: BlendMode,
}

impl<'a, P: ShaderProgram> Rasterizer<'a, P> {
    pub fn new(program: &'a P, resources: Resources<'a>, blend: BlendMode) -> Self {
        Self {
            program,
            resources,
            blend,
        }
    }

    /// Returns the number of fragments written (discarded ones excluded)
    pub fn draw_indexed(
        &self,
        target: &mut Framebuffer,
        vertices: &[P::Vertex],
        indices: &[u16],
    ) -> Result<usize, RenderError> {
        if indices.len() % 3 != 0 {
            return Err(RenderError::InvalidTopology(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(RenderError::IndexOutOfBounds {
                index: index as u32,
                len: vertices.len(),
            });
        }

        let outputs: Vec<StageOutput> = vertices.iter().map(|v| self.program.vertex(v)).collect();

        let mut written = 0;
        for triangle in indices.chunks_exact(3) {
            written += self.rasterize_triangle(
                target,
                [
                    &outputs[triangle[0] as usize],
                    &outputs[triangle[1] as usize],
                    &outputs[triangle[2] as usize],
                ],
            );
        }
        log::debug!(
            "Drew {} triangles, {written} fragments",
            indices.len() / 3
        );
        Ok(written)
    }

    fn rasterize_triangle(&self, target: &mut Framebuffer, mut tri: [&StageOutput; 3]) -> usize {
        // No clipping against w; triangles reaching behind the eye are dropped
        if tri.iter().any(|o| o.clip_position[3] <= 0.0) {
            return 0;
        }

        let (width, height) = (target.width() as f32, target.height() as f32);
        let to_screen = |o: &StageOutput| {
            let [x, y, _, w] = o.clip_position;
            [(x / w + 1.0) * 0.5 * width, (1.0 - y / w) * 0.5 * height]
        };
        let mut screen = tri.map(to_screen);

        let mut area = edge_function(screen[0], screen[1], screen[2]);
        if area == 0.0 || !area.is_finite() {
            return 0;
        }
        // No culling: bring either winding to a positive area
        if area < 0.0 {
            tri.swap(1, 2);
            screen.swap(1, 2);
            area = -area;
        }

        let min_x = screen.iter().map(|p| p[0]).fold(f32::INFINITY, f32::min);
        let max_x = screen.iter().map(|p| p[0]).fold(f32::NEG_INFINITY, f32::max);
        let min_y = screen.iter().map(|p| p[1]).fold(f32::INFINITY, f32::min);
        let max_y = screen.iter().map(|p| p[1]).fold(f32::NEG_INFINITY, f32::max);

        let x_start = min_x.floor().max(0.0) as u32;
        let x_end = max_x.ceil().min(width) as u32;
        let y_start = min_y.floor().max(0.0) as u32;
        let y_end = max_y.ceil().min(height) as u32;

        let edges = [
            (screen[1], screen[2]),
            (screen[2], screen[0]),
            (screen[0], screen[1]),
        ];

        let mut written = 0;
        for y in y_start..y_end {
            for x in x_start..x_end {
                let p = [x as f32 + 0.5, y as f32 + 0.5];
                let w = edges.map(|(a, b)| edge_function(a, b, p));
                let covered = w
                    .iter()
                    .zip(&edges)
                    .all(|(&w, &(a, b))| w > 0.0 || (w == 0.0 && owns_edge(a, b)));
                if !covered {
                    continue;
                }

                let input = interpolate(tri, w.map(|w| w / area));

                // Depth clipping to [0, 1]
                let z = input.clip_position[2] / input.clip_position[3];
                if !(0.0..=1.0).contains(&z) {
                    continue;
                }

                if let Some(color) = self.program.fragment(&input, &self.resources) {
                    target.write(x, y, color, self.blend);
                    written += 1;
                }
            }
        }
        written
    }
}

/// Edge function for triangle rasterization.
/// Positive when `p` lies on the interior side of `a -> b` for a positive-area triangle.
#[inline]
fn edge_function(a: [f32; 2], b: [f32; 2], p: [f32; 2]) -> f32 {
    (p[0] - a[0]) * (b[1] - a[1]) - (p[1] - a[1]) * (b[0] - a[0])
}

/// Fill rule for pixel centres exactly on an edge. Neighbouring triangles walk a
/// shared edge in opposite directions, so exactly one of them owns it.
#[inline]
fn owns_edge(a: [f32; 2], b: [f32; 2]) -> bool {
    let (dx, dy) = (b[0] - a[0], b[1] - a[1]);
    dy > 0.0 || (dy == 0.0 && dx < 0.0)
}

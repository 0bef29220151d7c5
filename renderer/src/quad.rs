//! Quad geometry feeding the two programs.
//!
//! Vertices are ordered top-left, bottom-left, bottom-right, top-right so that
//! [`QUAD_INDICES`] produces two counter-clockwise triangles in NDC.
//!
//! ```text
//! 0----3
//! | \  |
//! |  \ |
//! 1----2
//! ```

use crate::vertex::{GlyphVertex, QuadVertex};

pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Rectangle in normalized device coordinates (y up)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NdcRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl NdcRect {
    pub const FULL: NdcRect = NdcRect {
        left: -1.0,
        top: 1.0,
        right: 1.0,
        bottom: -1.0,
    };

    /// Convert a pixel rectangle with a top-left origin
    pub fn from_pixels(
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        screen_width: f32,
        screen_height: f32,
    ) -> Self {
        let to_x = |px: f32| px / screen_width * 2.0 - 1.0;
        let to_y = |py: f32| 1.0 - py / screen_height * 2.0;
        Self {
            left: to_x(x),
            top: to_y(y),
            right: to_x(x + width),
            bottom: to_y(y + height),
        }
    }
}

/// Rectangle in texture space (v down)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl UvRect {
    pub const FULL: UvRect = UvRect {
        left: 0.0,
        top: 0.0,
        right: 1.0,
        bottom: 1.0,
    };

    /// Sub-rectangle of a square atlas, in texels
    pub fn from_atlas(x: u32, y: u32, width: u32, height: u32, atlas_size: u32) -> Self {
        let size = atlas_size as f32;
        let (x, y) = (x as f32, y as f32);
        Self {
            left: x / size,
            top: y / size,
            right: (x + width as f32) / size,
            bottom: (y + height as f32) / size,
        }
    }
}

pub fn glyph_quad(rect: NdcRect, uv: UvRect, z: f32) -> [GlyphVertex; 4] {
    corners(rect, uv).map(|(position, tex_coords)| GlyphVertex {
        position: [position[0], position[1], z],
        tex_coords,
    })
}

pub fn textured_quad(rect: NdcRect, uv: UvRect) -> [QuadVertex; 4] {
    corners(rect, uv).map(|(position, tex_coord)| QuadVertex {
        position,
        tex_coord,
    })
}

fn corners(rect: NdcRect, uv: UvRect) -> [([f32; 2], [f32; 2]); 4] {
    [
        ([rect.left, rect.top], [uv.left, uv.top]),
        ([rect.left, rect.bottom], [uv.left, uv.bottom]),
        ([rect.right, rect.bottom], [uv.right, uv.bottom]),
        ([rect.right, rect.top], [uv.right, uv.top]),
    ]
}

/// Fixed-size character cells laid over the screen, row 0 at the top
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellGrid {
    pub cell_width: u32,
    pub cell_height: u32,
    pub screen_width: u32,
    pub screen_height: u32,
}

impl CellGrid {
    /// Square cells of `font_size` pixels
    pub fn new(screen_width: u32, screen_height: u32, font_size: u32) -> Self {
        Self {
            cell_width: font_size.max(1),
            cell_height: font_size.max(1),
            screen_width,
            screen_height,
        }
    }

    pub fn rows(&self) -> usize {
        self.screen_height.checked_div(self.cell_height).unwrap_or(0) as usize
    }

    pub fn cols(&self) -> usize {
        self.screen_width.checked_div(self.cell_width).unwrap_or(0) as usize
    }

    pub fn cell_rect(&self, row: usize, col: usize) -> NdcRect {
        NdcRect::from_pixels(
            col as f32 * self.cell_width as f32,
            row as f32 * self.cell_height as f32,
            self.cell_width as f32,
            self.cell_height as f32,
            self.screen_width as f32,
            self.screen_height as f32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pixels() {
        assert_eq!(NdcRect::from_pixels(0.0, 0.0, 800.0, 600.0, 800.0, 600.0), NdcRect::FULL);

        let quarter = NdcRect::from_pixels(400.0, 300.0, 400.0, 300.0, 800.0, 600.0);
        assert_eq!(
            quarter,
            NdcRect {
                left: 0.0,
                top: 0.0,
                right: 1.0,
                bottom: -1.0,
            }
        );
    }

    #[test]
    fn test_atlas_uv() {
        let uv = UvRect::from_atlas(256, 512, 128, 256, 1024);
        assert_eq!(
            uv,
            UvRect {
                left: 0.25,
                top: 0.5,
                right: 0.375,
                bottom: 0.75,
            }
        );
    }

    #[test]
    fn test_glyph_quad_corners() {
        let quad = glyph_quad(NdcRect::FULL, UvRect::FULL, 0.25);
        assert_eq!(quad[0].position, [-1.0, 1.0, 0.25]);
        assert_eq!(quad[0].tex_coords, [0.0, 0.0]);
        assert_eq!(quad[2].position, [1.0, -1.0, 0.25]);
        assert_eq!(quad[2].tex_coords, [1.0, 1.0]);
    }

    #[test]
    fn test_quad_triangles_are_counter_clockwise() {
        let quad = textured_quad(NdcRect::FULL, UvRect::FULL);
        for triangle in QUAD_INDICES.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|i| quad[triangle[i] as usize].position);
            let cross = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
            assert!(cross > 0.0);
        }
    }

    #[test]
    fn test_cell_grid() {
        let grid = CellGrid::new(800, 600, 16);
        assert_eq!(grid.rows(), 37);
        assert_eq!(grid.cols(), 50);

        let first = grid.cell_rect(0, 0);
        assert_eq!(first.left, -1.0);
        assert_eq!(first.top, 1.0);
        assert_eq!(first.right, 16.0 / 800.0 * 2.0 - 1.0);

        let second_row = grid.cell_rect(1, 0);
        assert_eq!(second_row.top, first.bottom);
    }

    #[test]
    fn test_large_inputs_stay_finite() {
        let uv = UvRect::from_atlas(u32::MAX, u32::MAX, u32::MAX, 1, 1024);
        assert!(uv.right > uv.left);
        assert!(uv.bottom.is_finite());

        let grid = CellGrid::new(800, 600, 16);
        let far = grid.cell_rect(usize::MAX, usize::MAX);
        assert!(far.left > 1.0);
        assert!(far.top < -1.0);

        let empty = CellGrid {
            cell_width: 0,
            cell_height: 0,
            ..grid
        };
        assert_eq!(empty.rows(), 0);
        assert_eq!(empty.cols(), 0);
    }
}

use common::manifest::{AddressMode, FilterMode, SamplerConfig};

use super::texture::CpuTexture;

const BORDER: [f32; 4] = [0.0, 0.0, 0.0, 0.0];

/// Past 2^24 an f32 texel coordinate has no fractional part left
const COORD_LIMIT: f32 = 16_777_216.0;

/// Software `textureSample` for a single mip level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuSampler {
    pub address_mode: AddressMode,
    pub filter: FilterMode,
}

impl From<SamplerConfig> for CpuSampler {
    fn from(config: SamplerConfig) -> Self {
        Self {
            address_mode: config.address_mode,
            filter: config.filter,
        }
    }
}

impl CpuSampler {
    pub fn new(address_mode: AddressMode, filter: FilterMode) -> Self {
        Self {
            address_mode,
            filter,
        }
    }

    pub fn sample(&self, texture: &CpuTexture, uv: [f32; 2]) -> [f32; 4] {
        let (width, height) = (texture.width(), texture.height());
        match self.filter {
            FilterMode::Nearest => {
                let x = texel_coord(uv[0] * width as f32).floor() as i64;
                let y = texel_coord(uv[1] * height as f32).floor() as i64;
                self.fetch(texture, x, y)
            }
            FilterMode::Linear => {
                // texel centres sit at half-integer coordinates
                let x = texel_coord(uv[0] * width as f32 - 0.5);
                let y = texel_coord(uv[1] * height as f32 - 0.5);
                let (x0, y0) = (x.floor(), y.floor());
                let (tx, ty) = (x - x0, y - y0);
                let (x0, y0) = (x0 as i64, y0 as i64);

                let top = lerp(
                    self.fetch(texture, x0, y0),
                    self.fetch(texture, x0 + 1, y0),
                    tx,
                );
                let bottom = lerp(
                    self.fetch(texture, x0, y0 + 1),
                    self.fetch(texture, x0 + 1, y0 + 1),
                    tx,
                );
                lerp(top, bottom, ty)
            }
        }
    }

    fn fetch(&self, texture: &CpuTexture, x: i64, y: i64) -> [f32; 4] {
        match (
            self.address(x, texture.width()),
            self.address(y, texture.height()),
        ) {
            (Some(x), Some(y)) => texture.texel(x, y),
            _ => BORDER,
        }
    }

    /// Resolve an integer texel coordinate; `None` means the border color
    fn address(&self, i: i64, size: u32) -> Option<u32> {
        let n = size as i64;
        let resolved = match self.address_mode {
            AddressMode::ClampToEdge => i.clamp(0, n - 1),
            AddressMode::Repeat => i.rem_euclid(n),
            AddressMode::MirrorRepeat => {
                let m = i.rem_euclid(2 * n);
                if m >= n {
                    2 * n - 1 - m
                } else {
                    m
                }
            }
            AddressMode::ClampToBorder => {
                if !(0..n).contains(&i) {
                    return None;
                }
                i
            }
        };
        Some(resolved as u32)
    }
}

/// Keep coordinates in a range where the integer neighbours can't overflow.
/// NaN lands on the lower bound since `max` ignores it.
fn texel_coord(coord: f32) -> f32 {
    coord.max(-COORD_LIMIT).min(COORD_LIMIT)
}

fn lerp(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    std::array::from_fn(|i| a[i] + (b[i] - a[i]) * t)
}

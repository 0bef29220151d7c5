//! Resource bindings shared by the host and the shaders.
//!
//! Everything here is plain descriptor data; nothing touches a device.

use common::manifest::{AddressMode, BlendMode, FilterMode, SamplerConfig, ShaderKind};

const TEXTURE_ENTRY: wgpu::BindGroupLayoutEntry = wgpu::BindGroupLayoutEntry {
    binding: 0,
    visibility: wgpu::ShaderStages::FRAGMENT,
    ty: wgpu::BindingType::Texture {
        multisampled: false,
        view_dimension: wgpu::TextureViewDimension::D2,
        sample_type: wgpu::TextureSampleType::Float { filterable: true },
    },
    count: None,
};

const SAMPLER_ENTRY: wgpu::BindGroupLayoutEntry = wgpu::BindGroupLayoutEntry {
    binding: 1,
    visibility: wgpu::ShaderStages::FRAGMENT,
    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
    count: None,
};

const TINT_ENTRY: wgpu::BindGroupLayoutEntry = wgpu::BindGroupLayoutEntry {
    binding: 2,
    visibility: wgpu::ShaderStages::FRAGMENT,
    ty: wgpu::BindingType::Buffer {
        ty: wgpu::BufferBindingType::Uniform,
        has_dynamic_offset: false,
        min_binding_size: wgpu::BufferSize::new(TintUniform::SIZE),
    },
    count: None,
};

const GLYPH_ENTRIES: [wgpu::BindGroupLayoutEntry; 2] = [TEXTURE_ENTRY, SAMPLER_ENTRY];
const QUAD_ENTRIES: [wgpu::BindGroupLayoutEntry; 3] = [TEXTURE_ENTRY, SAMPLER_ENTRY, TINT_ENTRY];

/// Group 0 layout of the glyph shader: texture, sampler
pub fn glyph_layout_entries() -> &'static [wgpu::BindGroupLayoutEntry] {
    &GLYPH_ENTRIES
}

/// Group 0 layout of the quad shader: texture, sampler, tint uniform
pub fn quad_layout_entries() -> &'static [wgpu::BindGroupLayoutEntry] {
    &QUAD_ENTRIES
}

pub fn layout_entries(kind: ShaderKind) -> &'static [wgpu::BindGroupLayoutEntry] {
    match kind {
        ShaderKind::GlyphAlpha => glyph_layout_entries(),
        ShaderKind::TexturedQuad => quad_layout_entries(),
    }
}

pub fn layout_descriptor(kind: ShaderKind) -> wgpu::BindGroupLayoutDescriptor<'static> {
    let label = match kind {
        ShaderKind::GlyphAlpha => "glyph_bind_group_layout",
        ShaderKind::TexturedQuad => "quad_bind_group_layout",
    };
    wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: layout_entries(kind),
    }
}

// Uniform structure matching the quad shader's `Tint`
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TintUniform {
    pub color: [f32; 4],
}

impl TintUniform {
    pub const SIZE: u64 = std::mem::size_of::<TintUniform>() as u64;

    pub fn new(color: [f32; 4]) -> Self {
        Self { color }
    }
}

impl Default for TintUniform {
    fn default() -> Self {
        Self::new([1.0, 1.0, 1.0, 1.0])
    }
}

pub fn address_mode(mode: AddressMode) -> wgpu::AddressMode {
    match mode {
        AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        AddressMode::Repeat => wgpu::AddressMode::Repeat,
        AddressMode::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
        AddressMode::ClampToBorder => wgpu::AddressMode::ClampToBorder,
    }
}

pub fn filter_mode(mode: FilterMode) -> wgpu::FilterMode {
    match mode {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

/// Sampler descriptor for a manifest's sampler section.
/// `ClampToBorder` needs `Features::ADDRESS_MODE_CLAMP_TO_BORDER` on the device.
pub fn sampler_descriptor(config: &SamplerConfig) -> wgpu::SamplerDescriptor<'static> {
    let address = address_mode(config.address_mode);
    let filter = filter_mode(config.filter);
    wgpu::SamplerDescriptor {
        label: Some("shader_sampler"),
        address_mode_u: address,
        address_mode_v: address,
        address_mode_w: address,
        mag_filter: filter,
        min_filter: filter,
        mipmap_filter: wgpu::FilterMode::Nearest,
        border_color: (config.address_mode == AddressMode::ClampToBorder)
            .then_some(wgpu::SamplerBorderColor::TransparentBlack),
        ..Default::default()
    }
}

/// Color target blending; `None` overwrites the target
pub fn blend_state(mode: BlendMode) -> Option<wgpu::BlendState> {
    match mode {
        BlendMode::Replace => None,
        BlendMode::Alpha => Some(wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
        }),
        BlendMode::Premultiplied => Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
    }
}

pub fn color_target(format: wgpu::TextureFormat, mode: BlendMode) -> wgpu::ColorTargetState {
    wgpu::ColorTargetState {
        format,
        blend: blend_state(mode),
        write_mask: wgpu::ColorWrites::ALL,
    }
}

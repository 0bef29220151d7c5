//! Shader module containing the WGSL programs as constants
//! and the pipeline-overridable constants each of them accepts.

use std::collections::HashMap;

use common::manifest::{ShaderKind, ShaderManifest};

pub const GLYPH_SHADER: wgpu::ShaderModuleDescriptor<'static> =
    wgpu::include_wgsl!("./glyph.wgsl");
pub const QUAD_SHADER: wgpu::ShaderModuleDescriptor<'static> = wgpu::include_wgsl!("./quad.wgsl");

pub const GLYPH_SOURCE: &str = include_str!("./glyph.wgsl");
pub const QUAD_SOURCE: &str = include_str!("./quad.wgsl");

pub const VERTEX_ENTRY_POINT: &str = "vs_main";
pub const FRAGMENT_ENTRY_POINT: &str = "fs_main";

pub const DISCARD_ENABLED: &str = "DISCARD_ENABLED";
pub const DISCARD_THRESHOLD: &str = "DISCARD_THRESHOLD";
pub const TINT_ENABLED: &str = "TINT_ENABLED";

/// WGSL source for a shader kind
pub fn source(kind: ShaderKind) -> &'static str {
    match kind {
        ShaderKind::GlyphAlpha => GLYPH_SOURCE,
        ShaderKind::TexturedQuad => QUAD_SOURCE,
    }
}

/// Module descriptor for a shader kind
pub fn descriptor(kind: ShaderKind) -> wgpu::ShaderModuleDescriptor<'static> {
    match kind {
        ShaderKind::GlyphAlpha => GLYPH_SHADER,
        ShaderKind::TexturedQuad => QUAD_SHADER,
    }
}

/// Discard branch of the glyph fragment stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Discard {
    pub enabled: bool,
    pub threshold: f32,
}

impl Default for Discard {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: 0.1,
        }
    }
}

/// Values for the overridable constants of both programs.
///
/// The defaults equal the defaults declared in WGSL, so a pipeline built
/// without any constants behaves exactly like `ShaderOptions::default()`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShaderOptions {
    pub discard: Discard,
    pub tint_enabled: bool,
}

impl ShaderOptions {
    pub fn from_manifest(manifest: &ShaderManifest) -> Self {
        Self {
            discard: Discard {
                enabled: manifest.discard.enabled,
                threshold: manifest.discard.threshold,
            },
            tint_enabled: manifest.tint.enabled,
        }
    }

    /// Constants for `wgpu::PipelineCompilationOptions::constants`.
    /// Only overrides declared by `kind` are emitted; wgpu rejects unknown names.
    pub fn constants(&self, kind: ShaderKind) -> HashMap<String, f64> {
        let flag = |enabled: bool| if enabled { 1.0 } else { 0.0 };
        let mut constants = HashMap::new();
        match kind {
            ShaderKind::GlyphAlpha => {
                constants.insert(DISCARD_ENABLED.to_string(), flag(self.discard.enabled));
                constants.insert(
                    DISCARD_THRESHOLD.to_string(),
                    self.discard.threshold as f64,
                );
            }
            ShaderKind::TexturedQuad => {
                constants.insert(TINT_ENABLED.to_string(), flag(self.tint_enabled));
            }
        }
        constants
    }
}

use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};
use thiserror::Error;

use crate::color::parse_hex_color;

/// Errors that can occur when working with shader manifests
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read manifest file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse manifest file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid manifest: {0}")]
    ValidationError(String),
}

/// Which of the two shader programs a manifest drives
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShaderKind {
    /// Red channel as alpha over opaque white (glyph atlas rendering)
    #[default]
    GlyphAlpha,
    /// Sampled color passed through, optional tint multiply
    TexturedQuad,
}

/// How fragment output is combined with the render target
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Overwrite the target
    Replace,
    /// Straight alpha: color SrcAlpha/OneMinusSrcAlpha, alpha One/OneMinusSrcAlpha
    #[default]
    Alpha,
    /// Source color is already multiplied by its alpha
    Premultiplied,
}

/// Texture addressing outside of [0, 1]
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AddressMode {
    #[default]
    ClampToEdge,
    Repeat,
    MirrorRepeat,
    /// Transparent black outside the texture
    ClampToBorder,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

/// Sampler state bound next to the texture
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct SamplerConfig {
    #[serde(default)]
    pub address_mode: AddressMode,

    #[serde(default)]
    pub filter: FilterMode,
}

/// Optional discard of low-coverage glyph fragments
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct DiscardConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Fragments with coverage strictly below this are dropped
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

impl Default for DiscardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: default_threshold(),
        }
    }
}

/// Optional multiply of the sampled quad color
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct TintConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Accepts "#RRGGBB", "#RRGGBBAA" or an [r, g, b, a] array
    #[serde(default = "default_tint", deserialize_with = "deserialize_color")]
    pub color: [f32; 4],
}

impl Default for TintConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            color: default_tint(),
        }
    }
}

/// The root structure for a shader manifest
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ShaderManifest {
    /// Name of the configuration
    pub name: String,

    #[serde(default)]
    pub shader: ShaderKind,

    #[serde(default)]
    pub blend: BlendMode,

    #[serde(default)]
    pub sampler: SamplerConfig,

    #[serde(default)]
    pub discard: DiscardConfig,

    #[serde(default)]
    pub tint: TintConfig,
}

/// Function to deserialize a color from either a hex string or an array
fn deserialize_color<'de, D>(deserializer: D) -> Result<[f32; 4], D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{Error, SeqAccess, Unexpected, Visitor};
    use std::fmt;

    struct ColorVisitor;

    impl<'de> Visitor<'de> for ColorVisitor {
        type Value = [f32; 4];

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a hex color string or an array of 3 or 4 floats")
        }

        fn visit_str<E>(self, value: &str) -> Result<[f32; 4], E>
        where
            E: Error,
        {
            parse_hex_color(value).map_err(|_| {
                Error::invalid_value(Unexpected::Str(value), &"a color like #RRGGBB or #RRGGBBAA")
            })
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<[f32; 4], A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut rgba = [0.0, 0.0, 0.0, 1.0];
            let mut len = 0;
            while let Some(value) = seq.next_element::<f32>()? {
                if len == 4 {
                    return Err(Error::invalid_length(5, &self));
                }
                rgba[len] = value;
                len += 1;
            }
            if len < 3 {
                return Err(Error::invalid_length(len, &self));
            }
            Ok(rgba)
        }
    }

    deserializer.deserialize_any(ColorVisitor)
}

/// Default functions for serde defaults
fn default_threshold() -> f32 {
    0.1
}

fn default_tint() -> [f32; 4] {
    [1.0, 1.0, 1.0, 1.0]
}

impl ShaderManifest {
    /// Create a manifest with every option at its default
    pub fn new(name: impl Into<String>, shader: ShaderKind) -> Self {
        Self {
            name: name.into(),
            shader,
            blend: BlendMode::default(),
            sampler: SamplerConfig::default(),
            discard: DiscardConfig::default(),
            tint: TintConfig::default(),
        }
    }

    /// Load a manifest from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        log::debug!("Loading shader manifest from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a manifest from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ManifestError> {
        let manifest: ShaderManifest = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Save the manifest to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ManifestError> {
        let content =
            toml::to_string(self).map_err(|e| ManifestError::ValidationError(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Check option combinations the shaders cannot honour
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.name.is_empty() {
            return Err(ManifestError::ValidationError(
                "Manifest name cannot be empty".to_string(),
            ));
        }

        let threshold = self.discard.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ManifestError::ValidationError(format!(
                "Discard threshold must be within [0, 1], got {threshold}"
            )));
        }

        if self.discard.enabled && self.shader != ShaderKind::GlyphAlpha {
            return Err(ManifestError::ValidationError(
                "Discard is only available for the glyph_alpha shader".to_string(),
            ));
        }

        if self.tint.enabled && self.shader != ShaderKind::TexturedQuad {
            return Err(ManifestError::ValidationError(
                "Tint is only available for the textured_quad shader".to_string(),
            ));
        }

        if self.tint.color.iter().any(|c| !c.is_finite()) {
            return Err(ManifestError::ValidationError(
                "Tint color components must be finite".to_string(),
            ));
        }

        Ok(())
    }
}

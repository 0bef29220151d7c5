//! WGSL validation and interface reflection.
//!
//! A shader is parsed and validated with naga, then its entry points and
//! globals are flattened into a [`ShaderInterface`] that can be compared
//! against the layout the host builds its pipelines with.

use std::fmt;

use common::manifest::ShaderKind;
use naga::{Binding, BuiltIn, ImageClass, ImageDimension, ScalarKind, TypeInner};
use thiserror::Error;

use crate::{
    bindings::TintUniform,
    shaders::{self, FRAGMENT_ENTRY_POINT, VERTEX_ENTRY_POINT},
};

/// Errors that can occur while checking a shader
#[derive(Error, Debug)]
pub enum ShaderError {
    #[error("Failed to parse WGSL:\n{0}")]
    Parse(String),

    #[error("Shader validation failed:\n{0}")]
    Validation(String),

    #[error("Missing {stage} entry point `{name}`")]
    MissingEntryPoint {
        stage: &'static str,
        name: &'static str,
    },

    #[error("Unsupported type at location {location} of `{entry}`")]
    UnsupportedType { entry: String, location: u32 },

    #[error("Interface mismatch:\n{}", format_mismatches(.0))]
    Mismatch(Vec<Mismatch>),
}

fn format_mismatches(mismatches: &[Mismatch]) -> String {
    mismatches
        .iter()
        .map(|mismatch| format!("  {mismatch}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A user-defined input or output at a `@location`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Attribute {
    pub location: u32,
    pub components: u32,
}

impl Attribute {
    pub const fn new(location: u32, components: u32) -> Self {
        Self {
            location,
            components,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@location({}) f32x{}", self.location, self.components)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    /// `texture_2d<f32>`
    Texture2d,
    /// Filtering (non-comparison) sampler
    Sampler,
    /// `var<uniform>` of the given byte size
    Uniform { size: u32 },
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Resource {
    pub group: u32,
    pub binding: u32,
    pub kind: ResourceKind,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@group({}) @binding({}) {:?}",
            self.group, self.binding, self.kind
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    VertexInput,
    Varying,
    FragmentOutput,
    Resource,
    Override,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::VertexInput => "vertex input",
            Section::Varying => "varying",
            Section::FragmentOutput => "fragment output",
            Section::Resource => "resource",
            Section::Override => "override",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    Missing { section: Section, item: String },
    Unexpected { section: Section, item: String },
    /// The vertex stage never outputs `@builtin(position)`
    Position,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Missing { section, item } => write!(f, "missing {section} {item}"),
            Mismatch::Unexpected { section, item } => write!(f, "unexpected {section} {item}"),
            Mismatch::Position => f.write_str("vertex stage does not write @builtin(position)"),
        }
    }
}

/// Flattened interface of a `vs_main`/`fs_main` shader pair
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShaderInterface {
    pub vertex_inputs: Vec<Attribute>,
    /// Vertex outputs that the fragment stage receives interpolated
    pub varyings: Vec<Attribute>,
    pub writes_position: bool,
    pub fragment_outputs: Vec<Attribute>,
    pub resources: Vec<Resource>,
    /// Names of pipeline-overridable constants
    pub overrides: Vec<String>,
}

impl ShaderInterface {
    /// Parse, validate and reflect a WGSL source
    pub fn from_wgsl(source: &str) -> Result<Self, ShaderError> {
        let module = naga::front::wgsl::parse_str(source)
            .map_err(|e| ShaderError::Parse(e.emit_to_string(source)))?;

        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        )
        .validate(&module)
        .map_err(|e| ShaderError::Validation(e.emit_to_string(source)))?;

        Self::from_module(&module)
    }

    /// Reflect an already validated module
    pub fn from_module(module: &naga::Module) -> Result<Self, ShaderError> {
        let vertex = find_entry_point(module, naga::ShaderStage::Vertex, VERTEX_ENTRY_POINT)?;
        let fragment =
            find_entry_point(module, naga::ShaderStage::Fragment, FRAGMENT_ENTRY_POINT)?;

        let mut interface = ShaderInterface::default();
        let mut ignored_position = false;

        for argument in &vertex.function.arguments {
            collect(
                module,
                &vertex.name,
                argument.ty,
                argument.binding.as_ref(),
                &mut interface.vertex_inputs,
                &mut ignored_position,
            )?;
        }
        if let Some(result) = &vertex.function.result {
            collect(
                module,
                &vertex.name,
                result.ty,
                result.binding.as_ref(),
                &mut interface.varyings,
                &mut interface.writes_position,
            )?;
        }
        if let Some(result) = &fragment.function.result {
            collect(
                module,
                &fragment.name,
                result.ty,
                result.binding.as_ref(),
                &mut interface.fragment_outputs,
                &mut ignored_position,
            )?;
        }

        for (_, global) in module.global_variables.iter() {
            let Some(binding) = &global.binding else {
                continue;
            };
            let kind = match module.types[global.ty].inner {
                TypeInner::Image {
                    dim: ImageDimension::D2,
                    arrayed: false,
                    class:
                        ImageClass::Sampled {
                            kind: ScalarKind::Float,
                            multi: false,
                        },
                } => ResourceKind::Texture2d,
                TypeInner::Sampler { comparison: false } => ResourceKind::Sampler,
                ref inner if global.space == naga::AddressSpace::Uniform => {
                    ResourceKind::Uniform {
                        size: inner.size(module.to_ctx()),
                    }
                }
                _ => ResourceKind::Other,
            };
            interface.resources.push(Resource {
                group: binding.group,
                binding: binding.binding,
                kind,
            });
        }

        interface.overrides = module
            .overrides
            .iter()
            .filter_map(|(_, o)| o.name.clone())
            .collect();

        interface.vertex_inputs.sort();
        interface.varyings.sort();
        interface.fragment_outputs.sort();
        interface.resources.sort();
        interface.overrides.sort();

        log::debug!(
            "Reflected {} vertex inputs, {} resources, {} overrides",
            interface.vertex_inputs.len(),
            interface.resources.len(),
            interface.overrides.len()
        );

        Ok(interface)
    }

    /// Every difference between this interface and `expected`
    pub fn mismatches(&self, expected: &ShaderInterface) -> Vec<Mismatch> {
        let mut mismatches = Vec::new();
        if expected.writes_position && !self.writes_position {
            mismatches.push(Mismatch::Position);
        }
        diff(
            Section::VertexInput,
            &expected.vertex_inputs,
            &self.vertex_inputs,
            &mut mismatches,
        );
        diff(
            Section::Varying,
            &expected.varyings,
            &self.varyings,
            &mut mismatches,
        );
        diff(
            Section::FragmentOutput,
            &expected.fragment_outputs,
            &self.fragment_outputs,
            &mut mismatches,
        );
        diff(
            Section::Resource,
            &expected.resources,
            &self.resources,
            &mut mismatches,
        );
        diff(
            Section::Override,
            &expected.overrides,
            &self.overrides,
            &mut mismatches,
        );
        mismatches
    }

    pub fn check(&self, expected: &ShaderInterface) -> Result<(), ShaderError> {
        let mismatches = self.mismatches(expected);
        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(ShaderError::Mismatch(mismatches))
        }
    }
}

fn find_entry_point<'a>(
    module: &'a naga::Module,
    stage: naga::ShaderStage,
    name: &'static str,
) -> Result<&'a naga::EntryPoint, ShaderError> {
    module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage && ep.name == name)
        .ok_or(ShaderError::MissingEntryPoint {
            stage: if stage == naga::ShaderStage::Vertex {
                "vertex"
            } else {
                "fragment"
            },
            name,
        })
}

/// Walk an argument or result, descending into structs whose members carry the bindings
fn collect(
    module: &naga::Module,
    entry: &str,
    ty: naga::Handle<naga::Type>,
    binding: Option<&Binding>,
    attributes: &mut Vec<Attribute>,
    position: &mut bool,
) -> Result<(), ShaderError> {
    let inner = &module.types[ty].inner;
    match binding {
        Some(Binding::BuiltIn(BuiltIn::Position { .. })) => *position = true,
        Some(Binding::BuiltIn(_)) => {}
        Some(Binding::Location { location, .. }) => {
            let components = float_components(inner).ok_or_else(|| ShaderError::UnsupportedType {
                entry: entry.to_string(),
                location: *location,
            })?;
            attributes.push(Attribute::new(*location, components));
        }
        None => {
            if let TypeInner::Struct { members, .. } = inner {
                for member in members {
                    collect(
                        module,
                        entry,
                        member.ty,
                        member.binding.as_ref(),
                        attributes,
                        position,
                    )?;
                }
            }
        }
    }
    Ok(())
}

fn float_components(inner: &TypeInner) -> Option<u32> {
    match *inner {
        TypeInner::Scalar(scalar) if scalar == naga::Scalar::F32 => Some(1),
        TypeInner::Vector { size, scalar } if scalar == naga::Scalar::F32 => Some(size as u32),
        _ => None,
    }
}

fn diff<T: PartialEq + fmt::Display>(
    section: Section,
    expected: &[T],
    found: &[T],
    mismatches: &mut Vec<Mismatch>,
) {
    for item in expected.iter().filter(|item| !found.contains(item)) {
        mismatches.push(Mismatch::Missing {
            section,
            item: item.to_string(),
        });
    }
    for item in found.iter().filter(|item| !expected.contains(item)) {
        mismatches.push(Mismatch::Unexpected {
            section,
            item: item.to_string(),
        });
    }
}

/// Contract of the glyph shader as the host binds it
pub fn expected_glyph_interface() -> ShaderInterface {
    ShaderInterface {
        vertex_inputs: vec![Attribute::new(0, 3), Attribute::new(1, 2)],
        varyings: vec![Attribute::new(0, 2)],
        writes_position: true,
        fragment_outputs: vec![Attribute::new(0, 4)],
        resources: vec![
            Resource {
                group: 0,
                binding: 0,
                kind: ResourceKind::Texture2d,
            },
            Resource {
                group: 0,
                binding: 1,
                kind: ResourceKind::Sampler,
            },
        ],
        overrides: vec![
            shaders::DISCARD_ENABLED.to_string(),
            shaders::DISCARD_THRESHOLD.to_string(),
        ],
    }
}

/// Contract of the textured quad shader as the host binds it
pub fn expected_quad_interface() -> ShaderInterface {
    ShaderInterface {
        vertex_inputs: vec![Attribute::new(0, 2), Attribute::new(1, 2)],
        varyings: vec![Attribute::new(0, 2)],
        writes_position: true,
        fragment_outputs: vec![Attribute::new(0, 4)],
        resources: vec![
            Resource {
                group: 0,
                binding: 0,
                kind: ResourceKind::Texture2d,
            },
            Resource {
                group: 0,
                binding: 1,
                kind: ResourceKind::Sampler,
            },
            Resource {
                group: 0,
                binding: 2,
                kind: ResourceKind::Uniform {
                    size: TintUniform::SIZE as u32,
                },
            },
        ],
        overrides: vec![shaders::TINT_ENABLED.to_string()],
    }
}

pub fn expected_interface(kind: ShaderKind) -> ShaderInterface {
    match kind {
        ShaderKind::GlyphAlpha => expected_glyph_interface(),
        ShaderKind::TexturedQuad => expected_quad_interface(),
    }
}

/// Reflect the built-in shader of `kind` and check it against its contract
pub fn validate(kind: ShaderKind) -> Result<ShaderInterface, ShaderError> {
    let interface = ShaderInterface::from_wgsl(shaders::source(kind))?;
    interface.check(&expected_interface(kind))?;
    Ok(interface)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_shader_matches_contract() {
        let interface = validate(ShaderKind::GlyphAlpha).unwrap();
        assert_eq!(interface, expected_glyph_interface());
    }

    #[test]
    fn test_quad_shader_matches_contract() {
        let interface = validate(ShaderKind::TexturedQuad).unwrap();
        assert_eq!(interface.resources.len(), 3);
        assert_eq!(
            interface.resources[2].kind,
            ResourceKind::Uniform { size: 16 }
        );
    }

    #[test]
    fn test_shaders_are_not_interchangeable() {
        let glyph = ShaderInterface::from_wgsl(shaders::GLYPH_SOURCE).unwrap();
        let mismatches = glyph.mismatches(&expected_quad_interface());

        assert!(mismatches.contains(&Mismatch::Missing {
            section: Section::VertexInput,
            item: "@location(0) f32x2".to_string(),
        }));
        assert!(mismatches.contains(&Mismatch::Unexpected {
            section: Section::VertexInput,
            item: "@location(0) f32x3".to_string(),
        }));
        assert!(mismatches
            .iter()
            .any(|m| matches!(m, Mismatch::Missing { section: Section::Resource, .. })));
        assert!(matches!(
            glyph.check(&expected_quad_interface()),
            Err(ShaderError::Mismatch(_))
        ));
    }

    #[test]
    fn test_missing_entry_point() {
        let source = r#"
            @vertex
            fn vs_main() -> @builtin(position) vec4<f32> {
                return vec4<f32>(0.0, 0.0, 0.0, 1.0);
            }
        "#;
        assert!(matches!(
            ShaderInterface::from_wgsl(source),
            Err(ShaderError::MissingEntryPoint {
                stage: "fragment",
                name: "fs_main"
            })
        ));
    }

    #[test]
    fn test_position_not_written() {
        let source = r#"
            struct Out {
                @location(0) uv: vec2<f32>,
                @builtin(position) pos: vec4<f32>,
            }

            @vertex
            fn vs_main(@location(0) uv: vec2<f32>) -> Out {
                return Out(uv, vec4<f32>(uv, 0.0, 1.0));
            }

            @fragment
            fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
                return vec4<f32>(uv, 0.0, 1.0);
            }
        "#;
        let interface = ShaderInterface::from_wgsl(source).unwrap();
        assert!(interface.writes_position);
        assert_eq!(interface.vertex_inputs, vec![Attribute::new(0, 2)]);

        let mut without_position = interface.clone();
        without_position.writes_position = false;
        assert_eq!(
            without_position.mismatches(&interface),
            vec![Mismatch::Position]
        );
    }

    #[test]
    fn test_parse_error() {
        let err = ShaderInterface::from_wgsl("fn broken( {").unwrap_err();
        assert!(matches!(err, ShaderError::Parse(_)));
    }
}

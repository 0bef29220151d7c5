use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use common::manifest::ShaderKind;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate both shaders against their binding contract
    Check(CheckArgs),
    /// Print the reflected interface of a shader
    Interface(ShaderArgs),
    /// Print the WGSL source of a shader
    Dump(ShaderArgs),
    /// Render a texture through the CPU reference pipeline
    Render(RenderArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderName {
    /// Red channel as alpha over white
    Glyph,
    /// Textured quad with optional tint
    Quad,
}

impl From<ShaderName> for ShaderKind {
    fn from(name: ShaderName) -> Self {
        match name {
            ShaderName::Glyph => ShaderKind::GlyphAlpha,
            ShaderName::Quad => ShaderKind::TexturedQuad,
        }
    }
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Also validate a shader manifest and print its pipeline constants
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ShaderArgs {
    #[arg(value_enum)]
    pub shader: ShaderName,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Path to the shader manifest
    #[arg(short, long, required = true)]
    pub manifest: PathBuf,

    /// Image bound as the texture
    #[arg(short, long, required = true)]
    pub texture: PathBuf,

    /// Where to write the PNG
    #[arg(short, long, required = true)]
    pub output: PathBuf,

    /// Target width (defaults to the texture width)
    #[arg(long)]
    pub width: Option<u32>,

    /// Target height (defaults to the texture height)
    #[arg(long)]
    pub height: Option<u32>,

    /// Clear color of the target
    #[arg(long, default_value = "#00000000")]
    pub clear: String,
}

mod cli;

use std::process::ExitCode;

use clap::Parser;
use common::{
    color::{parse_hex_color, ColorError},
    manifest::{ManifestError, ShaderKind, ShaderManifest},
};
use renderer::{
    reference::{render_fullscreen, CpuTexture, Framebuffer, RenderError},
    reflect::{self, ShaderError, ShaderInterface},
    shaders::{self, ShaderOptions},
};
use thiserror::Error;

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Color(#[from] ColorError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = cli::Cli::parse();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: cli::Commands) -> Result<(), CliError> {
    match command {
        cli::Commands::Check(args) => {
            for kind in [ShaderKind::GlyphAlpha, ShaderKind::TexturedQuad] {
                reflect::validate(kind)?;
                println!("{kind:?}: ok");
            }

            if let Some(path) = args.manifest {
                let manifest = ShaderManifest::from_file(&path)?;
                let constants = ShaderOptions::from_manifest(&manifest).constants(manifest.shader);
                println!("Manifest '{}' ({:?}): ok", manifest.name, manifest.shader);
                let mut constants: Vec<_> = constants.into_iter().collect();
                constants.sort_by(|a, b| a.0.cmp(&b.0));
                for (name, value) in constants {
                    println!("  {name} = {value}");
                }
            }
            Ok(())
        }
        cli::Commands::Interface(args) => {
            let kind = ShaderKind::from(args.shader);
            let interface = ShaderInterface::from_wgsl(shaders::source(kind))?;
            print_interface(&interface);
            interface.check(&reflect::expected_interface(kind))?;
            Ok(())
        }
        cli::Commands::Dump(args) => {
            print!("{}", shaders::source(args.shader.into()));
            Ok(())
        }
        cli::Commands::Render(args) => {
            let manifest = ShaderManifest::from_file(&args.manifest)?;
            let image = image::open(&args.texture)?;
            let texture = CpuTexture::from_image(&image)?;

            let width = args.width.unwrap_or(texture.width());
            let height = args.height.unwrap_or(texture.height());
            let clear = parse_hex_color(&args.clear)?;

            let mut target = Framebuffer::new(width, height, clear)?;
            let written = render_fullscreen(&manifest, &texture, &mut target)?;
            log::info!("{written} fragments written");

            target.to_image().save(&args.output)?;
            println!("Wrote {}", args.output.display());
            Ok(())
        }
    }
}

fn print_interface(interface: &ShaderInterface) {
    println!("vertex inputs:");
    for attribute in &interface.vertex_inputs {
        println!("  {attribute}");
    }
    println!(
        "varyings (position written: {}):",
        interface.writes_position
    );
    for attribute in &interface.varyings {
        println!("  {attribute}");
    }
    println!("fragment outputs:");
    for attribute in &interface.fragment_outputs {
        println!("  {attribute}");
    }
    println!("resources:");
    for resource in &interface.resources {
        println!("  {resource}");
    }
    println!("overrides:");
    for name in &interface.overrides {
        println!("  {name}");
    }
}

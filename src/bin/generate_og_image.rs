use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use site_tools::og_image;

/// Generate Open Graph card images with a macOS-style window mockup.
#[derive(Parser, Debug)]
#[command(about = "Generate Open Graph card images with macOS-style windows")]
struct Args {
    /// Text to display (use \n for line breaks)
    #[arg(short = 't', long, default_value = "Ethan\nGutierrez")]
    text: String,

    /// Output path (default: og-image.png in the project root)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Image width (OG recommended: 1200)
    #[arg(short = 'w', long, default_value_t = 1200)]
    width: u32,

    /// Image height (OG recommended: 630)
    #[arg(short = 'H', long, default_value_t = 630)]
    height: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let text = og_image::unescape_newlines(&args.text);
    let path = og_image::generate(&text, args.output.as_deref(), args.width, args.height)?;
    println!("Generated: {}", path.display());
    Ok(())
}

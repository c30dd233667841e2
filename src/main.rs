mod builder;
mod color;
mod error;
mod export;
mod form;
mod preview;
mod request;
mod session;

use std::fs::File;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "qrgen",
    version,
    about = "Build QR code images and export them as PNG, JPEG or SVG"
)]
struct Cli {}

// The terminal belongs to the form, so logs go to a file in the temp dir.
fn init_logging() -> anyhow::Result<()> {
    let path = std::env::temp_dir().join("qrgen.log");
    let file = File::create(&path)
        .with_context(|| format!("Could not create log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let _cli = Cli::parse();

    init_logging().context("Could not set up logging")?;
    tracing::info!("starting qrgen");

    form::run().context("Could not run qrgen")
}

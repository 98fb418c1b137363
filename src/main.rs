mod app;
mod data;
mod force;
mod util;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Graph document to load ({"nodes": [...], "links": [...]}); a small
    /// built-in demo graph is used when omitted.
    #[arg(long)]
    graph: Option<PathBuf>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "forcelab",
        options,
        Box::new(move |cc| Ok(Box::new(app::ForceLabApp::new(cc, args.graph.clone())))),
    )
}

mod app;
mod capture;
mod commands;
mod config;
mod logging;
mod render;
mod setup;
mod spectrum;
mod ui;

use std::process;

#[tokio::main]
async fn main() {
    if let Err(e) = app::run().await {
        tracing::error!("Fatal error: {e:#}");
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

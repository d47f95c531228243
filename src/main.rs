use std::path::PathBuf;

use clap::Parser;
use domcheck::server::{default_port, AssetServer};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on (defaults to the PORT env var, then 3000)
    #[arg(short, long)]
    port: Option<u16>,

    /// Document root to serve
    #[arg(short, long, default_value = "pages")]
    root: PathBuf,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();
    let port = args.port.unwrap_or_else(default_port);

    log::info!(
        "Starting asset server for {} on port {}",
        args.root.display(),
        port
    );

    match AssetServer::start(args.root.clone(), port).await {
        Ok(server) => {
            println!("Serving {} at {}", args.root.display(), server.url());
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to wait for shutdown signal: {}", e);
            }
            server.stop().await;
        }
        Err(e) => {
            log::error!("Failed to bind to port {}: {}", port, e);
            eprintln!("Error: Port {} is already in use or unavailable.", port);
            std::process::exit(1);
        }
    }
}

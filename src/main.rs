//! WARN Dashboard - layoff notice aggregation server
//!
//! Serves the WARN report summary at `/` (HTML) and `/data` (JSON).

use anyhow::{Context, Result};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use warn_dashboard::data::DataLoader;
use warn_dashboard::web::Server;

/// Workbook read on every request, relative to the working directory.
const WORKBOOK_PATH: &str = "warn_report.xlsx";

#[derive(Parser, Debug)]
#[command(version, about = "Serve the WARN report dashboard")]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to bind
    #[arg(long, default_value_t = 5000)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = Args::parse();
    let addr = SocketAddr::new(args.host, args.port);

    let loader = DataLoader::new(WORKBOOK_PATH);
    info!(workbook = %loader.file_path().display(), "startup");

    Server::new(loader)
        .run(addr)
        .await
        .with_context(|| format!("server on {addr} failed"))
}

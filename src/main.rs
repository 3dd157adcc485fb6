use std::future::Future;
use std::io;
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use wallet_serve::advertiser::{self, SystemInterfaces};
use wallet_serve::{LocalServer, LocalServerConfig, ServerError};

/// Serve the mobile wallet page to phones on the local network
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Directory holding settings.yaml (defaults to the working directory)
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Port to listen on (0 lets the OS choose)
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    bind: Option<IpAddr>,

    /// Directory to serve files from
    #[arg(long)]
    root: Option<PathBuf>,

    /// Page shown in the printed access URLs
    #[arg(long)]
    page: Option<String>,
}

impl Cli {
    fn into_config(self) -> LocalServerConfig {
        let config_dir = self.config_dir.unwrap_or_else(|| PathBuf::from("."));
        let mut config = LocalServerConfig::load(&config_dir);

        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(bind) = self.bind {
            config.bind_address = bind;
        }
        if let Some(root) = self.root {
            config.root = root;
        }
        if let Some(page) = self.page {
            config.landing_page = page;
        }
        config
    }
}

fn build_logger() {
    // Defaults to "info" if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Serve until `shutdown` resolves, then close the listener
async fn run<F>(cli: Cli, hostname: &str, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = io::Result<()>>,
{
    let server = LocalServer::new(cli.into_config());
    tracing::debug!("Configuration: {:?}", server.config());

    let (handle, urls) = server.launch(hostname, &SystemInterfaces).await?;

    println!("{}", urls.render_banner());

    shutdown.await?;

    handle.shutdown().await;
    println!("\n🛑 Server stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    build_logger();
    tracing::info!("wallet-serve version: {}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let result = match advertiser::local_hostname() {
        Ok(hostname) => run(cli, &hostname, tokio::signal::ctrl_c()).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

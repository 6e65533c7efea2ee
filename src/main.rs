use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use trassir_doors::audit::AuditLog;
use trassir_doors::cli::{self, Command};
use trassir_doors::config::TrassirConfig;
use trassir_doors::service::DoorService;
use trassir_doors::transport::HttpTransport;

#[derive(Parser)]
#[command(
    name = "trassir-doors",
    about = "Trassir door access from the command line",
    version
)]
pub struct Args {
    #[arg(long, value_name = "PATH", help = "Audit log path (JSONL, appended)")]
    pub audit_log: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = TrassirConfig::from_env();
    if let Some(path) = args.audit_log {
        config.audit_log = path;
    }

    let transport = HttpTransport::new(config.accept_invalid_certs)?;
    let audit = AuditLog::new(&config.audit_log)?;
    let mut service = DoorService::new(config, Box::new(transport), Box::new(audit));

    cli::run(&args.command, &mut service)
}

//! The couleuvre binary: stdio language server for Vyper.

use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use couleuvre::scheduler::SchedulerConfig;
use couleuvre::server::Server;
use couleuvre::transport::{self, MessageWriter};
use couleuvre_compiler::SubprocessGateway;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Language server for Vyper smart contracts, speaking JSON-RPC over
/// stdio.
#[derive(Debug, Parser)]
#[command(name = "couleuvre", version, about)]
struct Cli {
    /// Log filter (overridden by COULEUVRE_LOG when set).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Append logs to a file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_env("COULEUVRE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false);

    // Stdout carries the protocol; logs go to stderr or a file.
    match &cli.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .expect("log file is writable");
            builder.with_writer(Arc::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
}

fn main() -> std::io::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);
    info!(version = env!("CARGO_PKG_VERSION"), "couleuvre starting");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");

    let writer = MessageWriter::new(Box::new(std::io::stdout()));
    let gateway = Arc::new(SubprocessGateway::new());
    let server = Server::new(
        gateway,
        Arc::new(writer.clone()),
        SchedulerConfig::default(),
        runtime.handle().clone(),
    );

    let mut reader = BufReader::new(std::io::stdin());
    let result = transport::run(&server, &mut reader, &writer);
    info!("couleuvre exiting");
    result
}

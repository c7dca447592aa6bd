//! sqnet command-line tool.
//!
//! - `sqnet listen` - Echo server accepting path-aware QUIC connections
//! - `sqnet dial` - Pipe stdin/stdout through a connection to a remote

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sqnet::cli::{DialArgs, ListenArgs, run_dial, run_listen};

#[derive(Parser)]
#[command(
    name = "sqnet",
    version,
    about = "QUIC connections over path-aware SCION networking",
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an echo server.
    #[command(name = "listen", alias = "serve")]
    Listen(Box<ListenArgs>),

    /// Connect to a remote and relay stdin/stdout.
    #[command(name = "dial")]
    Dial(Box<DialArgs>),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Listen(args) => run_listen(*args).await,
        Commands::Dial(args) => run_dial(*args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

use std::time::Duration;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use etcdv2_client::{ClientConfig, EtcdClient, DEFAULT_ENDPOINT};

mod commands;

use commands::{Command, CommandResult};

/// etcdv2 - Talk to an etcd v2 server from the shell
#[derive(Parser, Debug)]
#[command(name = "etcdv2")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of the etcd server
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Per-request timeout in seconds (watch is never timed out by this)
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::new(args.endpoint)
        .with_request_timeout(Some(Duration::from_secs(args.timeout)));

    let client = match EtcdClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    debug!(endpoint = %client.base_url(), command = ?args.command, "running command");

    let code = match commands::execute(&client, args.command) {
        Ok(CommandResult::Output(text)) => {
            if !text.is_empty() {
                println!("{}", text);
            }
            0
        }
        Ok(CommandResult::Missing) => 1,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    client.shutdown(Duration::from_secs(1));
    std::process::exit(code);
}

//! CLI command definitions and execution.
//!
//! Commands:
//! - `get <key>` - Print a key's result
//! - `set <key> <value> [--ttl N]` - Write a key
//! - `rm <key>` - Delete a key
//! - `mkdir <key>` / `rmdir <key>` - Create or remove a directory
//! - `ls <key>` - Print a directory's children
//! - `cas <key> <prev> <value>` - Compare-and-swap
//! - `watch <key> [--index N] [--recursive] [--wait-secs N]` - Wait for a change
//! - `version` - Print the server version

use std::time::Duration;

use clap::Subcommand;
use serde::Serialize;

use etcdv2_client::{EtcdClient, Watch, WatchOptions};

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Read a key
    Get { key: String },

    /// Write a key
    Set {
        key: String,
        value: String,
        /// Expire the key after this many seconds
        #[arg(long)]
        ttl: Option<u64>,
    },

    /// Delete a key
    Rm { key: String },

    /// Create a directory
    Mkdir { key: String },

    /// Remove an empty directory
    Rmdir { key: String },

    /// List a directory's children
    Ls { key: String },

    /// Set a key only if it currently holds PREV
    Cas {
        key: String,
        prev: String,
        value: String,
    },

    /// Wait for the next change to a key
    Watch {
        key: String,
        /// Report the first change at or after this index
        #[arg(long)]
        index: Option<u64>,
        /// Include changes below the key
        #[arg(long)]
        recursive: bool,
        /// Give up after this many seconds
        #[arg(long)]
        wait_secs: Option<u64>,
    },

    /// Print the server version
    Version,
}

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Etcd(#[from] etcdv2_client::Error),

    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Failed to start timer runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("No change within {0} seconds")]
    TimedOut(u64),
}

/// Result of executing a command
#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    /// Text to print on stdout
    Output(String),
    /// The key does not exist, or a watch ended without an event; nothing
    /// is printed
    Missing,
}

impl CommandResult {
    fn json<T: Serialize>(value: &T) -> Result<Self, CliError> {
        Ok(CommandResult::Output(serde_json::to_string_pretty(value)?))
    }
}

pub fn execute(client: &EtcdClient, command: Command) -> Result<CommandResult, CliError> {
    match command {
        Command::Get { key } => match client.get(&key)? {
            Some(result) => CommandResult::json(&result),
            None => Ok(CommandResult::Missing),
        },
        Command::Set { key, value, ttl } => {
            CommandResult::json(&client.set_with_ttl(&key, &value, ttl)?)
        }
        Command::Rm { key } => match client.delete(&key)? {
            Some(result) => CommandResult::json(&result),
            None => Ok(CommandResult::Output(String::new())),
        },
        Command::Mkdir { key } => CommandResult::json(&client.create_directory(&key)?),
        Command::Rmdir { key } => match client.delete_directory(&key)? {
            Some(result) => CommandResult::json(&result),
            None => Ok(CommandResult::Output(String::new())),
        },
        Command::Ls { key } => match client.list_directory(&key)? {
            Some(nodes) => CommandResult::json(&nodes),
            None => CommandResult::json(&Vec::<()>::new()),
        },
        Command::Cas { key, prev, value } => CommandResult::json(&client.cas(&key, &prev, &value)?),
        Command::Watch {
            key,
            index,
            recursive,
            wait_secs,
        } => {
            let mut options = WatchOptions::new();
            if let Some(index) = index {
                options = options.from_index(index);
            }
            if recursive {
                options = options.recursive();
            }

            let watch = client.watch_with(&key, options);
            let event = match wait_secs {
                Some(secs) => wait_at_most(watch, secs)?,
                None => watch.wait()?,
            };
            match event {
                Some(event) => CommandResult::json(&event),
                None => Ok(CommandResult::Missing),
            }
        }
        Command::Version => Ok(CommandResult::Output(client.get_version()?)),
    }
}

fn wait_at_most(
    watch: Watch,
    secs: u64,
) -> Result<Option<etcdv2_client::EtcdResult>, CliError> {
    let timer = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    // Timing out drops the watch, which closes the long-poll.
    match timer.block_on(tokio::time::timeout(Duration::from_secs(secs), watch)) {
        Ok(event) => Ok(event?),
        Err(_) => Err(CliError::TimedOut(secs)),
    }
}

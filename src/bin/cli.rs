//! DuraKV CLI Client
//!
//! Command-line interface for interacting with DuraKV.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use durakv::network::Client;
use durakv::wal::Recovery;
use durakv::Result;

/// DuraKV CLI
#[derive(Parser, Debug)]
#[command(name = "durakv-cli")]
#[command(about = "CLI for the DuraKV key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:50051")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Print every value whose key starts with a prefix
    Prefix {
        /// The key prefix
        prefix: String,
    },

    /// Look up several keys over one stream
    Mget {
        /// Keys to look up, in order
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Ping the server
    Ping,

    /// Scan a log file offline and report what recovery would do
    Verify {
        /// Path to the log file
        log_path: PathBuf,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Commands::Verify { log_path } => {
            let report = Recovery::verify(&log_path)?;
            println!("entries:           {}", report.entries_replayed);
            println!("distinct keys:     {}", report.distinct_keys);
            println!("file length:       {}", report.file_len);
            println!("consistent offset: {}", report.consistent_offset);
            println!("torn tail:         {}", report.torn_tail);
            println!("would discard:     {} bytes", report.bytes_discarded);
            Ok(())
        }
        command => {
            let mut client = Client::connect(args.server.as_str())?;
            run_remote(&mut client, command)
        }
    }
}

fn run_remote(client: &mut Client, command: Commands) -> Result<()> {
    match command {
        Commands::Get { key } => match client.get(key)? {
            Some(value) => println!("{}", String::from_utf8_lossy(&value)),
            None => println!("(not found)"),
        },
        Commands::Set { key, value } => {
            client.set(key, value)?;
            println!("OK");
        }
        Commands::Prefix { prefix } => {
            for value in client.get_prefix(prefix)? {
                println!("{}", String::from_utf8_lossy(&value));
            }
        }
        Commands::Mget { keys } => {
            let values = client.get_values(keys.clone())?;
            for (key, value) in keys.iter().zip(values) {
                match value {
                    Some(value) => println!("{}: {}", key, String::from_utf8_lossy(&value)),
                    None => println!("{}: (not found)", key),
                }
            }
        }
        Commands::Ping => {
            client.ping()?;
            println!("PONG");
        }
        Commands::Verify { .. } => {}
    }

    Ok(())
}

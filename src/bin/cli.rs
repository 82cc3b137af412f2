//! kvfile CLI
//!
//! Command-line access to a kvfile database.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use kvfile::{BatchMutation, Config, KeyValue, KvError, Store};
use tracing_subscriber::{fmt, EnvFilter};

/// kvfile CLI
#[derive(Parser, Debug)]
#[command(name = "kvfile-cli")]
#[command(about = "Inspect and edit a kvfile database")]
#[command(version)]
struct Args {
    /// Database file
    #[arg(short, long, default_value = "./kvfile.db")]
    file: String,

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

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// List keys in [start, end)
    Scan {
        /// First key to include
        #[arg(long, default_value = "")]
        start: String,

        /// First key to exclude; empty for no bound
        #[arg(long, default_value = "")]
        end: String,
    },

    /// Apply several writes atomically
    Batch {
        /// `set:key=value` or `del:key`
        #[arg(required = true)]
        ops: Vec<String>,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kvfile=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::debug!("kvfile-cli v{}", kvfile::VERSION);
    tracing::debug!("Data file: {}", args.file);

    let config = Config::builder().file(&args.file).build();
    let store = match Store::open(&config) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open {}: {}", args.file, e);
            return ExitCode::FAILURE;
        }
    };

    let outcome = run(&store, args.command);
    let closed = store.close();

    match (outcome, closed) {
        (Ok(code), Ok(())) => code,
        (Err(e), _) | (Ok(_), Err(e)) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(store: &Store, command: Commands) -> kvfile::Result<ExitCode> {
    match command {
        Commands::Get { key } => match store.get(key.as_bytes())? {
            Some(value) => println!("{}", String::from_utf8_lossy(&value)),
            None => return Ok(ExitCode::FAILURE),
        },
        Commands::Set { key, value } => store.set(key.as_bytes(), value.as_bytes())?,
        Commands::Del { key } => store.delete(key.as_bytes())?,
        Commands::Scan { start, end } => {
            let mut it = store.find(start.as_bytes(), end.as_bytes());
            while it.next() {
                println!("{}\t{}", it.key(), it.value());
            }
            it.close()?;
        }
        Commands::Batch { ops } => {
            let mut batch = store.begin_batch();
            for op in &ops {
                add_op(batch.as_mut(), op)?;
            }
            store.commit_batch(batch)?;
            tracing::info!("Applied {} operations", ops.len());
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Parse one `set:key=value` / `del:key` argument into `batch`
fn add_op(batch: &mut dyn BatchMutation, op: &str) -> kvfile::Result<()> {
    if let Some(rest) = op.strip_prefix("set:") {
        let (key, value) = rest
            .split_once('=')
            .ok_or_else(|| KvError::Config(format!("expected set:key=value, got '{}'", op)))?;
        batch.set(key.as_bytes(), value.as_bytes());
    } else if let Some(key) = op.strip_prefix("del:") {
        batch.delete(key.as_bytes());
    } else {
        return Err(KvError::Config(format!("unknown batch operation '{}'", op)));
    }
    Ok(())
}

//! tripstore - inspect a TripStore database from the command line

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Context, Result};
use log::debug;

use tripstore::Store;

#[derive(Parser)]
#[command(name = "tripstore", about = "Inspect a TripStore database", version)]
struct Cli {
    /// Store directory or .db file
    #[arg(short, long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List collections and record counts
    Collections,

    /// List every record in a collection
    List {
        collection: String,

        /// Print full JSON instead of one line per record
        #[arg(long)]
        json: bool,
    },

    /// Show one record as JSON
    Get { collection: String, id: i64 },
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tripmind")
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let db = cli.db.unwrap_or_else(default_db_path);
    debug!("main: opening {}", db.display());
    let store = Store::open(&db).context(format!("Failed to open store at {}", db.display()))?;

    match cli.command {
        Command::Collections => {
            let collections = store.collections()?;
            if collections.is_empty() {
                println!("{}", "Store is empty".dimmed());
            }
            for (name, count) in collections {
                println!("{:20} {}", name.cyan(), count);
            }
        }
        Command::List { collection, json } => {
            let records = store.list_raw(&collection)?;
            if json {
                let values: Vec<_> = records.into_iter().map(|(_, v)| v).collect();
                println!("{}", serde_json::to_string_pretty(&values)?);
            } else {
                for (id, value) in records {
                    println!("{:>6}  {}", id.to_string().yellow(), value);
                }
            }
        }
        Command::Get { collection, id } => match store.get_raw(&collection, id)? {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => {
                eprintln!("{} {}/{} not found", "error:".red(), collection, id);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

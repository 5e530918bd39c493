use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "inventory-sync", version)]
#[command(about = "Bulk host and group management for the monitoring platform RPC API", long_about = None)]
pub struct Cli {
    /// Account (company) name; the API host is derived from it
    #[arg(short = 'c', long, global = true)]
    pub company: Option<String>,

    /// API user
    #[arg(short = 'u', long, global = true)]
    pub user: Option<String>,

    /// API password
    #[arg(short = 'p', long, global = true)]
    pub password: Option<String>,

    /// Configuration file
    #[arg(long, global = true, env = "INVENTORY_SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Add hosts from a CSV file, creating their groups as needed
    Import {
        /// Input CSV (hostname,collector_id,display_name,description,properties,group_list,link)
        #[arg(short = 'f', long)]
        file: PathBuf,
    },
    /// Update existing hosts from a CSV file
    Update {
        /// Input CSV, same columns as for import
        #[arg(short = 'f', long)]
        file: PathBuf,
    },
    /// Export all hosts to CSV
    Export {
        /// Output CSV; written to stdout when omitted
        #[arg(short = 'f', long)]
        file: Option<PathBuf>,
    },
    /// Create static and dynamic groups from a CSV file
    ImportGroups {
        /// Input CSV (groupname,grouppath,appliesTo,description,properties)
        #[arg(short = 'f', long)]
        file: PathBuf,
    },
}

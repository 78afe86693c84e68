//! CLI type definitions
//!
//! Clap command structures that define the roost interface.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "roost")]
#[command(about = "Roost - normalized property listing cache", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file; defaults to .roost/config.yaml merged with ROOST_* variables
    #[arg(short, long, global = true, env = "ROOST_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List properties matching a filter
    List(ListArgs),

    /// Show one property in detail and make it the selection
    Show {
        /// Property ID
        id: String,
    },

    /// Aggregate statistics over every listed property
    Stats {
        /// Refetch even if the cached listing is still valid
        #[arg(long)]
        refresh: bool,
    },

    /// Create a property in the fixture source
    Create(DraftArgs),

    /// Replace the attributes of an existing property
    Update {
        /// Property ID
        id: String,

        #[command(flatten)]
        draft: DraftArgs,
    },

    /// Delete a property
    Delete {
        /// Property ID
        id: String,
    },

    /// Normalize a file of raw records and report what would be rejected
    Validate {
        /// JSON file holding an array of raw records
        path: PathBuf,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Case-insensitive text search over name, description and location
    #[arg(short, long)]
    pub search: Option<String>,

    /// Minimum price (inclusive)
    #[arg(long)]
    pub min_price: Option<f64>,

    /// Maximum price (inclusive)
    #[arg(long)]
    pub max_price: Option<f64>,

    /// Category (apartment, house, commercial, land)
    #[arg(long)]
    pub category: Option<String>,

    /// Basic filter (all, available, expensive)
    #[arg(short, long, default_value = "all")]
    pub filter: String,

    /// Page number, starting at 1
    #[arg(short, long, default_value = "1")]
    pub page: u64,

    /// Page size; defaults to pagination.default_limit
    #[arg(short, long)]
    pub limit: Option<u64>,

    /// Refetch even if the cached listing is still valid
    #[arg(long)]
    pub refresh: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DraftArgs {
    /// Display name
    #[arg(short, long)]
    pub name: String,

    /// Asking price
    #[arg(short, long)]
    pub price: f64,

    /// Free-text location
    #[arg(long)]
    pub location: Option<String>,

    /// Category (apartment, house, commercial, land)
    #[arg(long, default_value = "house")]
    pub category: String,

    /// Status (available, sold, rented)
    #[arg(long, default_value = "available")]
    pub status: String,

    /// Description text
    #[arg(short, long)]
    pub description: Option<String>,
}

pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "df-compliance")]
#[command(about = "Restricted admin and root admin compliance tooling")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "List admins and promote one to root admin")]
    RootAdmin {
        #[arg(long, help = "Admin to promote; required unless exactly one admin exists")]
        admin_id: Option<i64>,
    },

    #[command(about = "Show the tab catalogue and the service access each tab grants")]
    Tabs {
        #[arg(help = "Only show this tab")]
        tab: Option<String>,
    },

    #[command(about = "Serve the compliance routes")]
    Serve {
        #[arg(long, help = "Bind address, overrides API_BIND_ADDRESS")]
        bind: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::RootAdmin { admin_id } => commands::root_admin::handle(admin_id, output_format).await,
        Commands::Tabs { tab } => commands::tabs::handle(tab, output_format),
        Commands::Serve { bind } => commands::serve::handle(bind).await,
    }
}

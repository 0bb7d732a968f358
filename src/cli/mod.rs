pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "agency-portal")]
#[command(about = "Agency portal API server and access-policy tools")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on, overriding configuration")]
        port: Option<u16>,
    },

    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Classify a path and show the access decision for a session")]
    CheckAccess {
        #[arg(help = "Request path, e.g. /projects/42")]
        path: String,

        #[arg(long, value_enum, default_value_t = commands::check_access::SessionArg::None)]
        role: commands::check_access::SessionArg,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
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

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => commands::serve::handle(port).await,
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::CheckAccess { path, role } => commands::check_access::handle(&path, role, output_format),
    }
}

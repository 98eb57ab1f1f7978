use std::path::PathBuf;

use clap::{Parser, Subcommand};
use passage_core::MemberId;

mod commands;
mod util;

use commands::catalog::CatalogCommands;
use commands::mapping::MappingCommands;
use commands::record::RecordCommands;
use commands::ticket::TicketCommands;

#[derive(Parser)]
#[command(
    name = "passage",
    version,
    about = "Passage CLI — inspect the dungeon catalog, assignee mapping and ticket records offline"
)]
struct Cli {
    /// Path to the activity → assignee mapping
    #[arg(long, env = "PASSEURS_JSON_PATH", default_value = "passeurs.json")]
    map: PathBuf,

    /// Guild owner; fallback assignee and always allowed to validate
    #[arg(long, env = "PASSAGE_OWNER_ID", default_value_t = 342021125800198144)]
    owner_id: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Catalog of zones, activities and achievement options
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },
    /// Assignee mapping (passeurs.json)
    Mapping {
        #[command(subcommand)]
        command: MappingCommands,
    },
    /// Ticket records recovered from channel history
    Record {
        #[command(subcommand)]
        command: RecordCommands,
    },
    /// Ticket channel helpers
    Ticket {
        #[command(subcommand)]
        command: TicketCommands,
    },
}

fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let owner = MemberId(cli.owner_id);

    let code = match cli.command {
        Commands::Catalog { command } => commands::catalog::run(command),
        Commands::Mapping { command } => commands::mapping::run(&cli.map, owner, command),
        Commands::Record { command } => commands::record::run(owner, command),
        Commands::Ticket { command } => commands::ticket::run(command),
    };

    std::process::exit(code);
}

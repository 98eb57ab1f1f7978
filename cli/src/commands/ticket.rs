use clap::Subcommand;
use passage_core::channel::{DEFAULT_TICKET_PREFIX, next_ticket_name};
use serde_json::json;

use crate::util::print_json;

#[derive(Subcommand)]
pub enum TicketCommands {
    /// Compute the next ticket channel name
    Name {
        /// Existing channel names in the ticket category (repeatable)
        #[arg(long)]
        existing: Vec<String>,
        /// Channel name prefix
        #[arg(long, env = "PASSAGE_TICKET_PREFIX", default_value = DEFAULT_TICKET_PREFIX)]
        prefix: String,
    },
}

pub fn run(command: TicketCommands) -> i32 {
    match command {
        TicketCommands::Name { existing, prefix } => {
            let name = next_ticket_name(existing.iter().map(String::as_str), &prefix);
            print_json(&json!({ "name": name }))
        }
    }
}

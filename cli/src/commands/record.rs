use clap::Subcommand;
use passage_core::MemberId;
use passage_core::message::PostedMessage;
use passage_core::record::{DEFAULT_SCAN_WINDOW, RecordDecoder};
use passage_core::validation::FulfillmentAuthorization;
use serde_json::json;

use crate::util::{exit_error, print_json, read_json_from_file};

/// Exit code when no record could be recovered from the history.
const NOT_FOUND_EXIT: i32 = 2;

#[derive(Subcommand)]
pub enum RecordCommands {
    /// Recover the ticket record from an exported channel history
    Decode {
        /// JSON array of messages (use '-' for stdin)
        #[arg(long)]
        file: String,
        /// Number of messages to scan, counted from the start of the channel
        #[arg(long, env = "PASSAGE_HISTORY_WINDOW", default_value_t = DEFAULT_SCAN_WINDOW)]
        window: usize,
        /// Only accept structured sidecars, never the human-readable recap
        #[arg(long)]
        no_recap: bool,
        /// Only trust messages authored by this identity
        #[arg(long)]
        bot_id: Option<u64>,
    },
    /// Check whether an identity may validate the ticket in a history export
    Authorize {
        /// JSON array of messages (use '-' for stdin)
        #[arg(long)]
        file: String,
        /// Identity clicking the validation control
        #[arg(long)]
        actor: u64,
        #[arg(long)]
        bot_id: Option<u64>,
    },
}

pub fn run(owner: MemberId, command: RecordCommands) -> i32 {
    match command {
        RecordCommands::Decode {
            file,
            window,
            no_recap,
            bot_id,
        } => decode(&file, decoder(window, !no_recap, bot_id)),
        RecordCommands::Authorize {
            file,
            actor,
            bot_id,
        } => authorize(
            &file,
            decoder(DEFAULT_SCAN_WINDOW, true, bot_id),
            owner,
            MemberId(actor),
        ),
    }
}

fn decoder(window: usize, recap: bool, bot_id: Option<u64>) -> RecordDecoder {
    let decoder = RecordDecoder::new(window).with_recap_fallback(recap);
    match bot_id {
        Some(id) => decoder.trusting(MemberId(id)),
        None => decoder,
    }
}

fn load_history(file: &str) -> Vec<PostedMessage> {
    match read_json_from_file(file) {
        Ok(history) => history,
        Err(e) => exit_error(
            &e,
            Some("Provide a JSON array of messages with id, author, content and embeds."),
        ),
    }
}

fn decode(file: &str, decoder: RecordDecoder) -> i32 {
    let history = load_history(file);
    match decoder.decode(&history) {
        Some(decoded) => print_json(&decoded),
        None => {
            print_json(&json!({ "found": false, "scanned": history.len().min(decoder.window()) }));
            NOT_FOUND_EXIT
        }
    }
}

fn authorize(file: &str, decoder: RecordDecoder, owner: MemberId, actor: MemberId) -> i32 {
    let history = load_history(file);
    let Some(decoded) = decoder.decode(&history) else {
        print_json(&json!({ "found": false }));
        return NOT_FOUND_EXIT;
    };
    let permitted = FulfillmentAuthorization::for_record(&decoded.record, owner).permits(actor);
    print_json(&json!({
        "found": true,
        "actor": actor,
        "assignee": decoded.record.assignee,
        "owner": owner,
        "permitted": permitted,
    }))
}

#[cfg(test)]
mod tests {
    use passage_core::record::{TicketRecord, encode};

    use super::*;

    fn history_file(bot: MemberId) -> String {
        let record = TicketRecord {
            requester: MemberId(10),
            assignee: MemberId(20),
            zone: "Pandala".into(),
            activity: "Tanu".into(),
            option_labels: "Aucun".into(),
            availability_text: "Passage dès que possible".into(),
        };
        let rendered = encode(&record);
        let embeds: Vec<_> = rendered.embed.into_iter().collect();
        let history = json!([{
            "id": 1,
            "author": bot,
            "author_is_bot": true,
            "content": rendered.content,
            "embeds": embeds,
        }]);
        let dir = std::env::temp_dir().join(format!("passage-history-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("history.json");
        std::fs::write(&path, history.to_string()).unwrap();
        path.display().to_string()
    }

    #[test]
    fn decode_finds_bot_authored_record() {
        let file = history_file(MemberId(2));
        assert_eq!(decode(&file, decoder(DEFAULT_SCAN_WINDOW, false, Some(2))), 0);
        assert_eq!(
            decode(&file, decoder(DEFAULT_SCAN_WINDOW, true, Some(3))),
            NOT_FOUND_EXIT
        );
        let _ = std::fs::remove_file(file);
    }

    #[test]
    fn parallel_exports_do_not_share_a_path() {
        let first = history_file(MemberId(2));
        let second = history_file(MemberId(3));
        assert_ne!(first, second);
        assert_eq!(decode(&first, decoder(DEFAULT_SCAN_WINDOW, false, Some(2))), 0);
        assert_eq!(decode(&second, decoder(DEFAULT_SCAN_WINDOW, false, Some(3))), 0);
        let _ = std::fs::remove_file(first);
        let _ = std::fs::remove_file(second);
    }
}

//! Durable ticket record.
//!
//! The record is posted once into the ticket channel and is the only state the
//! validation step relies on. It carries two renderings of the same facts:
//! a tagged JSON sidecar line (primary) and the human recap embed, which can
//! be parsed back as a compatibility mode for tickets that predate the sidecar.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::flow::TicketDraft;
use crate::identity::{MemberId, MessageRef};
use crate::message::{PostedMessage, RenderedEmbed, RenderedMessage, sidecar_payload};

pub const RECORD_TITLE: &str = "Récapitulatif de la réservation";
pub const RECORD_COLOUR: u32 = 0x2F3136;
pub const RECORD_FOOTER: &str =
    "Vérifie les informations puis clique sur « Valider la demande ».";
pub const RECORD_TAG: &str = "ticket-meta:";
pub const RECORD_SCHEMA_VERSION: u32 = 1;

/// Default number of messages, counted from the start of the channel, scanned
/// when recovering a record.
pub const DEFAULT_SCAN_WINDOW: usize = 50;

/// Recap embed field names.
pub mod fields {
    pub const CLIENT: &str = "Client";
    pub const ZONE: &str = "Zone";
    pub const ACTIVITY: &str = "Donjon";
    pub const OPTIONS: &str = "Succès demandés";
    pub const AVAILABILITY: &str = "Disponibilité";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRecord {
    pub requester: MemberId,
    pub assignee: MemberId,
    pub zone: String,
    pub activity: String,
    /// Comma-joined display labels. Lossy: labels do not map back to codes.
    pub option_labels: String,
    pub availability_text: String,
}

impl TicketRecord {
    pub fn from_draft(draft: &TicketDraft, assignee: MemberId) -> Self {
        Self {
            requester: draft.requester,
            assignee,
            zone: draft.zone.clone(),
            activity: draft.activity.clone(),
            option_labels: draft.option_labels.clone(),
            availability_text: draft.availability.text().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Sidecar {
    v: u32,
    #[serde(flatten)]
    record: TicketRecord,
}

/// Render the record message: mentions, sidecar line and recap embed.
pub fn encode(record: &TicketRecord) -> RenderedMessage {
    let sidecar = json!({
        "v": RECORD_SCHEMA_VERSION,
        "requester": record.requester,
        "assignee": record.assignee,
        "zone": record.zone,
        "activity": record.activity,
        "option_labels": record.option_labels,
        "availability_text": record.availability_text,
    });
    let content = format!(
        "{} • {}\n-# {RECORD_TAG} {sidecar}",
        record.requester.mention(),
        record.assignee.mention(),
    );
    let embed = RenderedEmbed::titled(RECORD_TITLE, RECORD_COLOUR)
        .with_field(fields::CLIENT, record.requester.mention())
        .with_field(fields::ZONE, &record.zone)
        .with_field(fields::ACTIVITY, &record.activity)
        .with_field(fields::OPTIONS, &record.option_labels)
        .with_field(fields::AVAILABILITY, &record.availability_text)
        .with_footer(RECORD_FOOTER);
    RenderedMessage {
        content: Some(content),
        embed: Some(embed),
    }
}

/// Prompt posted under the record, carrying the validation control.
pub fn validation_prompt(record: &TicketRecord) -> String {
    format!(
        "{} — Cliquez pour valider le passage :",
        record.assignee.mention()
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    Sidecar,
    Recap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedRecord {
    pub record: TicketRecord,
    pub message: MessageRef,
    pub source: RecordSource,
}

/// Recovers a [`TicketRecord`] from a window of channel history.
#[derive(Debug, Clone)]
pub struct RecordDecoder {
    window: usize,
    recap_fallback: bool,
    trusted_author: Option<MemberId>,
}

impl Default for RecordDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_SCAN_WINDOW)
    }
}

impl RecordDecoder {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            recap_fallback: true,
            trusted_author: None,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn with_recap_fallback(mut self, enabled: bool) -> Self {
        self.recap_fallback = enabled;
        self
    }

    /// Only consider messages written by `author` (the bot itself).
    pub fn trusting(mut self, author: MemberId) -> Self {
        self.trusted_author = Some(author);
        self
    }

    /// Scan the oldest `window` messages in order and return the first record
    /// found. Sidecars win over recaps anywhere in the window.
    pub fn decode(&self, history: &[PostedMessage]) -> Option<DecodedRecord> {
        let mut candidates: Vec<&PostedMessage> = history
            .iter()
            .filter(|m| self.trusted_author.is_none_or(|author| m.author == author))
            .collect();
        candidates.sort_by_key(|m| m.id);
        candidates.truncate(self.window);

        let from_sidecar = candidates.iter().find_map(|m| {
            decode_sidecar(&m.content).map(|record| DecodedRecord {
                record,
                message: m.id,
                source: RecordSource::Sidecar,
            })
        });
        if from_sidecar.is_some() || !self.recap_fallback {
            return from_sidecar;
        }

        candidates.iter().find_map(|m| {
            decode_recap(m).map(|record| DecodedRecord {
                record,
                message: m.id,
                source: RecordSource::Recap,
            })
        })
    }
}

fn decode_sidecar(content: &str) -> Option<TicketRecord> {
    let payload = sidecar_payload(content, RECORD_TAG)?;
    let sidecar: Sidecar = serde_json::from_str(payload).ok()?;
    (sidecar.v == RECORD_SCHEMA_VERSION).then_some(sidecar.record)
}

/// Compatibility mode: rebuild the record from the recap embed fields and the
/// `<@requester> • <@assignee>` header line.
fn decode_recap(message: &PostedMessage) -> Option<TicketRecord> {
    let embed = message
        .embeds
        .iter()
        .find(|e| e.title.as_deref() == Some(RECORD_TITLE))?;
    let requester = MemberId::parse_mention(embed.field(fields::CLIENT)?)?;
    let header = message.content.lines().next().unwrap_or_default();
    let assignee = *MemberId::mentions_in(header).get(1)?;
    let text = |name: &str| {
        embed
            .field(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    Some(TicketRecord {
        requester,
        assignee,
        zone: text(fields::ZONE)?,
        activity: text(fields::ACTIVITY)?,
        option_labels: text(fields::OPTIONS)?,
        availability_text: text(fields::AVAILABILITY)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT: MemberId = MemberId(900);

    fn record() -> TicketRecord {
        TicketRecord {
            requester: MemberId(11),
            assignee: MemberId(22),
            zone: "Frigost 2".into(),
            activity: "Tengu".into(),
            option_labels: "Premier, Duo".into(),
            availability_text: "Passage à planifier".into(),
        }
    }

    /// What the platform hands back for a message the bot posted.
    fn posted(id: u64, author: MemberId, rendered: RenderedMessage) -> PostedMessage {
        PostedMessage {
            id: MessageRef(id),
            author,
            author_is_bot: author == BOT,
            content: rendered.content.unwrap_or_default(),
            embeds: rendered.embed.into_iter().collect(),
            attachments: vec![],
            reply_to: None,
        }
    }

    fn chatter(id: u64, author: MemberId, text: &str) -> PostedMessage {
        posted(
            id,
            author,
            RenderedMessage {
                content: Some(text.into()),
                embed: None,
            },
        )
    }

    #[test]
    fn encoded_record_decodes_from_sidecar() {
        let history = vec![posted(5, BOT, encode(&record()))];
        let decoded = RecordDecoder::default().trusting(BOT).decode(&history).unwrap();
        assert_eq!(decoded.record, record());
        assert_eq!(decoded.source, RecordSource::Sidecar);
        assert_eq!(decoded.message, MessageRef(5));
    }

    #[test]
    fn recap_fallback_recovers_legacy_tickets() {
        let mut legacy = posted(5, BOT, encode(&record()));
        legacy.content = "<@11> • <@22>".into();
        let decoded = RecordDecoder::default().decode(&[legacy.clone()]).unwrap();
        assert_eq!(decoded.source, RecordSource::Recap);
        assert_eq!(decoded.record, record());

        let strict = RecordDecoder::default().with_recap_fallback(false);
        assert!(strict.decode(&[legacy]).is_none());
    }

    #[test]
    fn missing_record_is_not_found() {
        let history = vec![chatter(1, MemberId(11), "salut"), chatter(2, BOT, "hello")];
        assert!(RecordDecoder::default().decode(&history).is_none());
        assert!(RecordDecoder::default().decode(&[]).is_none());
    }

    #[test]
    fn forged_sidecar_from_a_member_is_ignored() {
        let mut forged = record();
        forged.assignee = MemberId(11);
        let history = vec![posted(3, MemberId(11), encode(&forged))];
        assert!(RecordDecoder::default().trusting(BOT).decode(&history).is_none());
    }

    #[test]
    fn scan_is_oldest_first_within_window() {
        let mut second = record();
        second.activity = "Kimbo".into();
        let history = vec![
            chatter(30, BOT, "later chatter"),
            posted(20, BOT, encode(&second)),
            posted(10, BOT, encode(&record())),
        ];
        for window in [1, 2, 3] {
            let decoded = RecordDecoder::new(window).decode(&history).unwrap();
            assert_eq!(decoded.record.activity, "Tengu");
            assert_eq!(decoded.message, MessageRef(10));
        }

        let late = vec![chatter(1, BOT, "bienvenue"), posted(2, BOT, encode(&record()))];
        assert!(RecordDecoder::new(1).decode(&late).is_none());
    }

    #[test]
    fn record_stays_reachable_behind_long_conversations() {
        let mut history = vec![posted(1, BOT, encode(&record()))];
        history.extend((2..=201).map(|id| chatter(id, BOT, "on se retrouve à 21h")));
        let decoded = RecordDecoder::default().trusting(BOT).decode(&history).unwrap();
        assert_eq!(decoded.message, MessageRef(1));
    }

    #[test]
    fn corrupt_sidecar_is_skipped() {
        let mut broken = posted(1, BOT, encode(&record()));
        broken.content = format!("<@11> • <@22>\n-# {RECORD_TAG} {{not json");
        broken.embeds.clear();
        let good = posted(2, BOT, encode(&record()));
        let decoded = RecordDecoder::default().decode(&[broken, good]).unwrap();
        assert_eq!(decoded.message, MessageRef(2));
    }

    #[test]
    fn recap_uses_display_fields() {
        let rendered = encode(&record());
        let embed = rendered.embed.unwrap();
        assert_eq!(embed.title.as_deref(), Some(RECORD_TITLE));
        let names: Vec<&str> = embed.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                fields::CLIENT,
                fields::ZONE,
                fields::ACTIVITY,
                fields::OPTIONS,
                fields::AVAILABILITY
            ]
        );
        assert_eq!(embed.field(fields::CLIENT), Some("<@11>"));
    }
}

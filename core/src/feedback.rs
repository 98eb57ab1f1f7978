//! Fulfillment notices and their comment/screenshot thread.
//!
//! Each notice embeds a `fulfillment-meta:` sidecar naming requester, assignee
//! and fulfiller, so replies and screenshots can be routed after a restart.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::identity::{MemberId, MessageRef};
use crate::message::{PostedMessage, RenderedEmbed, RenderedMessage, sidecar_payload};
use crate::record::{TicketRecord, fields};

pub const NOTICE_TITLE: &str = "Passage effectué !";
pub const NOTICE_COLOUR: u32 = 0x2ECC71;
pub const NOTICE_TAG: &str = "fulfillment-meta:";
pub const COMMENTS_FIELD: &str = "💬 Commentaires";
pub const NO_COMMENTS: &str = "*(Aucun commentaire pour le moment)*";
/// Only the most recent comment lines are kept on the notice.
pub const COMMENT_HISTORY_LIMIT: usize = 8;

pub mod notice_fields {
    pub const FULFILLED_BY: &str = "Par";
    pub const FOR: &str = "Pour";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentMeta {
    pub requester: MemberId,
    pub assignee: MemberId,
    pub fulfilled_by: MemberId,
}

pub fn fulfillment_notice(record: &TicketRecord, actor: MemberId) -> RenderedMessage {
    let meta = json!({
        "requester": record.requester,
        "assignee": record.assignee,
        "fulfilled_by": actor,
    });
    let embed = RenderedEmbed::titled(NOTICE_TITLE, NOTICE_COLOUR)
        .with_field(notice_fields::FULFILLED_BY, actor.mention())
        .with_field(notice_fields::FOR, record.requester.mention())
        .with_field(fields::ACTIVITY, &record.activity)
        .with_field(fields::OPTIONS, &record.option_labels)
        .with_field(fields::AVAILABILITY, &record.availability_text)
        .with_field(COMMENTS_FIELD, NO_COMMENTS);
    RenderedMessage {
        content: Some(format!("-# {NOTICE_TAG} {meta}")),
        embed: Some(embed),
    }
}

/// Meta of a notice message, if `message` is one.
pub fn notice_meta(message: &PostedMessage) -> Option<FulfillmentMeta> {
    let payload = sidecar_payload(&message.content, NOTICE_TAG)?;
    serde_json::from_str(payload).ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentRole {
    Owner,
    Provider,
    Client,
}

impl CommentRole {
    pub fn resolve(author: MemberId, owner: MemberId, meta: Option<&FulfillmentMeta>) -> Self {
        if author == owner {
            Self::Owner
        } else if meta.is_some_and(|m| m.assignee == author) {
            Self::Provider
        } else {
            Self::Client
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Owner => "🔴 Immo",
            Self::Provider => "👑 Passeur",
            Self::Client => "👤 Client",
        }
    }
}

/// Append `<label>: <text>` to the comment block, keeping the newest lines.
/// Blank text leaves the block unchanged.
pub fn append_comment(existing: &str, role: CommentRole, text: &str) -> String {
    let text = text.trim();
    let mut lines: Vec<String> = existing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != NO_COMMENTS)
        .map(str::to_string)
        .collect();
    if !text.is_empty() {
        lines.push(format!("{}: {text}", role.label()));
    }
    let skip = lines.len().saturating_sub(COMMENT_HISTORY_LIMIT);
    lines.drain(..skip);
    lines.join("\n")
}

/// Apply a reply to a notice embed. Returns true when the embed changed.
pub fn apply_reply(
    embed: &mut RenderedEmbed,
    role: CommentRole,
    text: &str,
    image_url: Option<&str>,
) -> bool {
    let mut changed = false;
    if !text.trim().is_empty() {
        let existing = embed.field(COMMENTS_FIELD).unwrap_or_default().to_string();
        let updated = append_comment(&existing, role, text);
        embed.set_field(
            COMMENTS_FIELD,
            if updated.is_empty() {
                NO_COMMENTS.to_string()
            } else {
                updated
            },
        );
        changed = true;
    }
    if let Some(url) = image_url {
        embed.image_url = Some(url.to_string());
        changed = true;
    }
    changed
}

/// The notice a screenshot from `author` belongs to: the newest notice for the
/// owner, otherwise the newest notice naming `author` as assignee.
pub fn screenshot_target(
    history: &[PostedMessage],
    author: MemberId,
    owner: MemberId,
    bot: MemberId,
) -> Option<MessageRef> {
    let mut notices: Vec<(&PostedMessage, FulfillmentMeta)> = history
        .iter()
        .filter(|m| m.author == bot)
        .filter_map(|m| notice_meta(m).map(|meta| (m, meta)))
        .collect();
    notices.sort_by_key(|(m, _)| std::cmp::Reverse(m.id));
    notices
        .into_iter()
        .find(|(_, meta)| author == owner || meta.assignee == author)
        .map(|(m, _)| m.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: MemberId = MemberId(1);
    const BOT: MemberId = MemberId(2);

    fn record(assignee: u64) -> TicketRecord {
        TicketRecord {
            requester: MemberId(10),
            assignee: MemberId(assignee),
            zone: "Pandala".into(),
            activity: "Tanu".into(),
            option_labels: "Aucun".into(),
            availability_text: "Passage dès que possible".into(),
        }
    }

    fn as_posted(id: u64, notice: RenderedMessage) -> PostedMessage {
        PostedMessage {
            id: MessageRef(id),
            author: BOT,
            author_is_bot: true,
            content: notice.content.unwrap_or_default(),
            embeds: notice.embed.into_iter().collect(),
            attachments: vec![],
            reply_to: None,
        }
    }

    #[test]
    fn notice_carries_meta_and_placeholder() {
        let posted = as_posted(1, fulfillment_notice(&record(20), OWNER));
        assert_eq!(
            notice_meta(&posted),
            Some(FulfillmentMeta {
                requester: MemberId(10),
                assignee: MemberId(20),
                fulfilled_by: OWNER,
            })
        );
        let embed = posted.first_embed().unwrap();
        assert_eq!(embed.field(COMMENTS_FIELD), Some(NO_COMMENTS));
        assert_eq!(embed.field(notice_fields::FULFILLED_BY), Some("<@1>"));
        assert_eq!(embed.field(notice_fields::FOR), Some("<@10>"));
    }

    #[test]
    fn roles_follow_owner_then_assignee() {
        let meta = FulfillmentMeta {
            requester: MemberId(10),
            assignee: MemberId(20),
            fulfilled_by: MemberId(20),
        };
        assert_eq!(CommentRole::resolve(OWNER, OWNER, Some(&meta)), CommentRole::Owner);
        assert_eq!(
            CommentRole::resolve(MemberId(20), OWNER, Some(&meta)),
            CommentRole::Provider
        );
        assert_eq!(
            CommentRole::resolve(MemberId(10), OWNER, Some(&meta)),
            CommentRole::Client
        );
        assert_eq!(CommentRole::resolve(MemberId(20), OWNER, None), CommentRole::Client);
    }

    #[test]
    fn comments_keep_latest_lines() {
        let mut block = NO_COMMENTS.to_string();
        for i in 0..10 {
            block = append_comment(&block, CommentRole::Client, &format!("msg {i}"));
        }
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines.len(), COMMENT_HISTORY_LIMIT);
        assert_eq!(lines[0], "👤 Client: msg 2");
        assert_eq!(lines[7], "👤 Client: msg 9");
        assert_eq!(append_comment(&block, CommentRole::Owner, "   "), block);
    }

    #[test]
    fn reply_updates_comments_and_image() {
        let mut embed = fulfillment_notice(&record(20), OWNER).embed.unwrap();
        assert!(apply_reply(&mut embed, CommentRole::Provider, "merci !", Some("https://cdn/a.png")));
        assert_eq!(embed.field(COMMENTS_FIELD), Some("👑 Passeur: merci !"));
        assert_eq!(embed.image_url.as_deref(), Some("https://cdn/a.png"));
        assert!(!apply_reply(&mut embed, CommentRole::Client, "", None));
    }

    #[test]
    fn screenshots_route_to_newest_relevant_notice() {
        let history = vec![
            as_posted(1, fulfillment_notice(&record(20), MemberId(20))),
            as_posted(2, fulfillment_notice(&record(30), MemberId(30))),
            as_posted(3, fulfillment_notice(&record(20), OWNER)),
            as_posted(4, fulfillment_notice(&record(30), OWNER)),
        ];
        assert_eq!(screenshot_target(&history, MemberId(20), OWNER, BOT), Some(MessageRef(3)));
        assert_eq!(screenshot_target(&history, OWNER, OWNER, BOT), Some(MessageRef(4)));
        assert_eq!(screenshot_target(&history, MemberId(99), OWNER, BOT), None);
    }
}

use std::sync::LazyLock;

use regex::Regex;

use crate::identity::{ChannelRef, MemberId};
use crate::record::TicketRecord;

pub const DEFAULT_TICKET_PREFIX: &str = "ticket-passage-donjon";

/// Next free `<prefix>-NNN` name, one past the highest existing number.
pub fn next_ticket_name<'a, I>(existing: I, prefix: &str) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    static NUMBERED: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^(.+)-(\d{3})$").expect("ticket name regex must compile"));
    let highest = existing
        .into_iter()
        .filter_map(|name| {
            let caps = NUMBERED.captures(name)?;
            if &caps[1] != prefix {
                return None;
            }
            caps[2].parse::<u32>().ok()
        })
        .max()
        .unwrap_or(0);
    format!("{prefix}-{:03}", highest + 1)
}

/// Identities granted access to a ticket channel, de-duplicated and in a
/// stable order: bot, requester, assignee, owner. Everyone else is denied.
pub fn ticket_access(
    bot: MemberId,
    requester: MemberId,
    assignee: MemberId,
    owner: MemberId,
) -> Vec<MemberId> {
    let mut granted = Vec::with_capacity(4);
    for id in [bot, requester, assignee, owner] {
        if !granted.contains(&id) {
            granted.push(id);
        }
    }
    granted
}

/// Announcement for the demands channel.
pub fn demand_notice(record: &TicketRecord, channel: ChannelRef) -> String {
    format!(
        "Nouveau ticket créé : {} — {} (Donjon **{}**)",
        channel.mention(),
        record.requester.mention(),
        record.activity
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_ticket_starts_at_one() {
        assert_eq!(next_ticket_name([], "ticket-passage-donjon"), "ticket-passage-donjon-001");
    }

    #[test]
    fn next_ticket_follows_highest_number() {
        let existing = [
            "ticket-passage-donjon-001",
            "ticket-passage-donjon-007",
            "ticket-passage-donjon-12",
            "other-prefix-050",
            "general",
        ];
        assert_eq!(
            next_ticket_name(existing, "ticket-passage-donjon"),
            "ticket-passage-donjon-008"
        );
    }

    #[test]
    fn access_is_deduplicated() {
        let granted = ticket_access(MemberId(1), MemberId(2), MemberId(3), MemberId(3));
        assert_eq!(granted, vec![MemberId(1), MemberId(2), MemberId(3)]);
    }
}

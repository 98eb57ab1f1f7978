use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@!?(\d+)>").expect("mention regex must compile"));

/// A platform user identity (snowflake).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub u64);

impl MemberId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// Mention token as rendered by the platform, e.g. `<@42>`.
    pub fn mention(self) -> String {
        format!("<@{}>", self.0)
    }

    /// Parse a single mention token. Surrounding whitespace is allowed, any
    /// other text is not.
    pub fn parse_mention(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let caps = MENTION_RE.captures(trimmed)?;
        let whole = caps.get(0)?;
        if whole.start() != 0 || whole.end() != trimmed.len() {
            return None;
        }
        caps[1].parse().ok().map(Self)
    }

    /// Every mention found in `text`, in order of appearance.
    pub fn mentions_in(text: &str) -> Vec<Self> {
        MENTION_RE
            .captures_iter(text)
            .filter_map(|caps| caps[1].parse().ok().map(Self))
            .collect()
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelRef(pub u64);

impl ChannelRef {
    pub fn mention(self) -> String {
        format!("<#{}>", self.0)
    }
}

/// Message identifiers are snowflakes, so ordering them orders by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageRef(pub u64);

#[cfg(test)]
mod tests {
    use super::MemberId;

    #[test]
    fn parse_mention_accepts_both_forms() {
        assert_eq!(MemberId::parse_mention("<@42>"), Some(MemberId(42)));
        assert_eq!(MemberId::parse_mention(" <@!42> "), Some(MemberId(42)));
    }

    #[test]
    fn parse_mention_rejects_surrounding_text() {
        assert_eq!(MemberId::parse_mention("hi <@42>"), None);
        assert_eq!(MemberId::parse_mention("<@abc>"), None);
        assert_eq!(MemberId::parse_mention(""), None);
    }

    #[test]
    fn mentions_in_keeps_order() {
        let found = MemberId::mentions_in("<@1> • <@!2> and <@3>");
        assert_eq!(found, vec![MemberId(1), MemberId(2), MemberId(3)]);
    }
}

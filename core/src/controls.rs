use std::fmt;

use crate::catalog::Catalog;
use crate::flow::{Availability, FlowEvent};
use crate::session::SessionId;

/// Fixed identifier of the validation button. It must never change: prompts
/// posted by earlier process instances still carry it.
pub const VALIDATE_CONTROL_ID: &str = "ticket:validate";

/// Platform limit on component identifier length.
pub const MAX_CONTROL_ID_LEN: usize = 100;

/// Every interactive component the bot renders, in typed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlId {
    /// Dashboard "launch" button.
    Launch,
    /// Zone picker button, by zone slug.
    Zone(String),
    /// Activity select menu for a zone, by zone slug.
    ActivityMenu(String),
    Flow { session: SessionId, event: FlowEvent },
    Validate,
}

impl ControlId {
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == VALIDATE_CONTROL_ID {
            return Some(Self::Validate);
        }
        if raw == "dash:launch" {
            return Some(Self::Launch);
        }
        let (kind, rest) = raw.split_once(':')?;
        match kind {
            "zone" if !rest.is_empty() => Some(Self::Zone(rest.to_string())),
            "activity" if !rest.is_empty() => Some(Self::ActivityMenu(rest.to_string())),
            "flow" => {
                let (session, action) = rest.split_once(':')?;
                Some(Self::Flow {
                    session: SessionId::parse(session)?,
                    event: parse_flow_event(action)?,
                })
            }
            _ => None,
        }
    }
}

fn parse_flow_event(action: &str) -> Option<FlowEvent> {
    let event = match action {
        "yes" => FlowEvent::AnswerAchievements { wanted: true },
        "no" => FlowEvent::AnswerAchievements { wanted: false },
        "next" => FlowEvent::Advance,
        "now" => FlowEvent::ChooseAvailability(Availability::AsSoonAsPossible),
        "later" => FlowEvent::ChooseAvailability(Availability::ScheduledLater),
        "unset" => FlowEvent::ChooseAvailability(Availability::Unset),
        "confirm" => FlowEvent::Confirm,
        other => {
            let code = other.strip_prefix("toggle:")?;
            if code.is_empty() {
                return None;
            }
            FlowEvent::Toggle {
                code: code.to_string(),
            }
        }
    };
    Some(event)
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Launch => f.write_str("dash:launch"),
            Self::Zone(slug) => write!(f, "zone:{slug}"),
            Self::ActivityMenu(slug) => write!(f, "activity:{slug}"),
            Self::Validate => f.write_str(VALIDATE_CONTROL_ID),
            Self::Flow { session, event } => {
                write!(f, "flow:{session}:")?;
                match event {
                    FlowEvent::AnswerAchievements { wanted: true } => f.write_str("yes"),
                    FlowEvent::AnswerAchievements { wanted: false } => f.write_str("no"),
                    FlowEvent::Toggle { code } => write!(f, "toggle:{code}"),
                    FlowEvent::Advance => f.write_str("next"),
                    FlowEvent::ChooseAvailability(Availability::AsSoonAsPossible) => {
                        f.write_str("now")
                    }
                    FlowEvent::ChooseAvailability(Availability::ScheduledLater) => {
                        f.write_str("later")
                    }
                    FlowEvent::ChooseAvailability(Availability::Unset) => f.write_str("unset"),
                    FlowEvent::Confirm => f.write_str("confirm"),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

/// A rendered button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub id: String,
    pub label: String,
    pub style: ControlStyle,
    pub disabled: bool,
}

impl Control {
    pub fn new(id: &ControlId, label: impl Into<String>, style: ControlStyle) -> Self {
        Self {
            id: id.to_string(),
            label: label.into(),
            style,
            disabled: false,
        }
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// A full message worth of controls: an embed header plus button rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowView {
    pub title: String,
    pub description: String,
    pub rows: Vec<Vec<Control>>,
}

/// One button per zone, in catalog order.
pub fn zone_picker(catalog: &Catalog) -> Vec<Control> {
    catalog
        .zones()
        .iter()
        .map(|zone| {
            Control::new(
                &ControlId::Zone(zone.slug.to_string()),
                zone.name,
                ControlStyle::Primary,
            )
        })
        .collect()
}

pub fn launch_control() -> Control {
    Control::new(&ControlId::Launch, "🚀 Lancer le bot", ControlStyle::Primary)
}

pub fn validate_control() -> Control {
    Control::new(
        &ControlId::Validate,
        "Valider passage / Envoyer feedback",
        ControlStyle::Danger,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(id: ControlId) {
        let raw = id.to_string();
        assert!(raw.len() <= MAX_CONTROL_ID_LEN, "{raw} too long");
        assert_eq!(ControlId::parse(&raw), Some(id));
    }

    #[test]
    fn fixed_identifiers_are_stable() {
        assert_eq!(ControlId::Validate.to_string(), "ticket:validate");
        assert_eq!(ControlId::parse("ticket:validate"), Some(ControlId::Validate));
        assert_eq!(ControlId::parse("dash:launch"), Some(ControlId::Launch));
    }

    #[test]
    fn flow_identifiers_roundtrip() {
        let session = SessionId::generate();
        roundtrip(ControlId::Flow {
            session,
            event: FlowEvent::Toggle {
                code: "korriandre_mystique".into(),
            },
        });
        roundtrip(ControlId::Flow {
            session,
            event: FlowEvent::ChooseAvailability(Availability::ScheduledLater),
        });
        roundtrip(ControlId::Flow {
            session,
            event: FlowEvent::Confirm,
        });
        roundtrip(ControlId::Zone("pandala".into()));
    }

    #[test]
    fn malformed_identifiers_are_rejected() {
        for raw in [
            "",
            "y",
            "next",
            "zone:",
            "flow:nothex:yes",
            "flow:0192f0c4d1e87c3a9b2a4d5e6f708192:dance",
            "flow:0192f0c4d1e87c3a9b2a4d5e6f708192:toggle:",
        ] {
            assert_eq!(ControlId::parse(raw), None, "{raw} should not parse");
        }
    }

    #[test]
    fn zone_picker_lists_every_zone() {
        let labels: Vec<String> = zone_picker(&Catalog::builtin())
            .into_iter()
            .map(|c| c.label)
            .collect();
        assert_eq!(labels, vec!["Frigost 2", "Pandala", "Otomaii"]);
    }
}

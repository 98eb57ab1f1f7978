//! Multi-stage selection flow.
//!
//! The flow is a pure function of `(session, event)`. Platform glue turns
//! component clicks into [`FlowEvent`]s through [`ControlId`], applies them via
//! the session store, and re-renders from the returned session.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::controls::{Control, ControlId, ControlStyle, FlowView};
use crate::error::FlowError;
use crate::identity::MemberId;
use crate::session::SessionId;

pub const ASAP_TEXT: &str = "Passage dès que possible";
pub const LATER_TEXT: &str = "Passage à planifier";
pub const UNSET_TEXT: &str = "Non précisé";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    AskingAchievements,
    SelectingAchievements,
    SelectingAvailability,
    Confirmed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    #[default]
    Unset,
    AsSoonAsPossible,
    ScheduledLater,
}

impl Availability {
    pub fn text(self) -> &'static str {
        match self {
            Self::Unset => UNSET_TEXT,
            Self::AsSoonAsPossible => ASAP_TEXT,
            Self::ScheduledLater => LATER_TEXT,
        }
    }

    pub fn is_set(self) -> bool {
        self != Self::Unset
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FlowEvent {
    AnswerAchievements { wanted: bool },
    Toggle { code: String },
    Advance,
    ChooseAvailability(Availability),
    Confirm,
}

/// What changed, for the renderer. An empty effect list means the event was
/// swallowed and nothing changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEffect {
    ShowStage(Stage),
    ToggleRendered { code: String, selected: bool },
    AvailabilityRendered {
        availability: Availability,
        confirm_enabled: bool,
    },
    Finalize(TicketDraft),
}

/// Everything the ticket needs, captured at confirm time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDraft {
    pub requester: MemberId,
    pub zone: String,
    pub activity: String,
    /// Chosen codes in catalog order.
    pub option_codes: Vec<String>,
    pub option_labels: String,
    pub availability: Availability,
}

/// Transient per-requester progress through the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSession {
    id: SessionId,
    requester: MemberId,
    zone: String,
    activity: String,
    chosen: BTreeSet<String>,
    availability: Availability,
    stage: Stage,
}

impl SelectionSession {
    pub fn start(
        requester: MemberId,
        zone: &str,
        activity: &str,
        catalog: &Catalog,
    ) -> Result<Self, FlowError> {
        Self::start_with_id(SessionId::generate(), requester, zone, activity, catalog)
    }

    pub fn start_with_id(
        id: SessionId,
        requester: MemberId,
        zone: &str,
        activity: &str,
        catalog: &Catalog,
    ) -> Result<Self, FlowError> {
        if !catalog.contains(activity) {
            return Err(FlowError::UnknownActivity(activity.to_string()));
        }
        Ok(Self {
            id,
            requester,
            zone: zone.to_string(),
            activity: activity.to_string(),
            chosen: BTreeSet::new(),
            availability: Availability::Unset,
            stage: Stage::AskingAchievements,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn requester(&self) -> MemberId {
        self.requester
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }

    pub fn activity(&self) -> &str {
        &self.activity
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn availability(&self) -> Availability {
        self.availability
    }

    pub fn chosen_codes(&self) -> impl Iterator<Item = &str> {
        self.chosen.iter().map(String::as_str)
    }

    pub fn is_chosen(&self, code: &str) -> bool {
        self.chosen.contains(code)
    }

    /// Confirm stays enabled once an availability has been picked.
    pub fn confirm_enabled(&self) -> bool {
        self.stage == Stage::SelectingAvailability && self.availability.is_set()
    }

    fn draft(&self, catalog: &Catalog) -> TicketDraft {
        let option_codes: Vec<String> = catalog
            .options_for(&self.activity)
            .iter()
            .filter(|o| self.chosen.contains(o.code))
            .map(|o| o.code.to_string())
            .collect();
        TicketDraft {
            requester: self.requester,
            zone: self.zone.clone(),
            activity: self.activity.clone(),
            option_labels: catalog
                .labels_for(&self.activity, option_codes.iter().map(String::as_str)),
            option_codes,
            availability: self.availability,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub session: SelectionSession,
    pub effects: Vec<FlowEffect>,
}

impl Transition {
    fn ignored(session: SelectionSession) -> Self {
        Self {
            session,
            effects: Vec::new(),
        }
    }

    pub fn is_ignored(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn draft(&self) -> Option<&TicketDraft> {
        self.effects.iter().find_map(|effect| match effect {
            FlowEffect::Finalize(draft) => Some(draft),
            _ => None,
        })
    }
}

/// Apply one event. Events that are not valid for the current stage leave the
/// session untouched and produce no effects.
pub fn transition(mut session: SelectionSession, event: &FlowEvent, catalog: &Catalog) -> Transition {
    let effect = match (session.stage, event) {
        (Stage::AskingAchievements, FlowEvent::AnswerAchievements { wanted: true }) => {
            session.stage = Stage::SelectingAchievements;
            FlowEffect::ShowStage(session.stage)
        }
        (Stage::AskingAchievements, FlowEvent::AnswerAchievements { wanted: false }) => {
            session.chosen.clear();
            session.stage = Stage::SelectingAvailability;
            FlowEffect::ShowStage(session.stage)
        }
        (Stage::SelectingAchievements, FlowEvent::Toggle { code })
            if catalog.is_selectable(&session.activity, code) =>
        {
            let selected = if session.chosen.remove(code) {
                false
            } else {
                session.chosen.insert(code.clone());
                true
            };
            FlowEffect::ToggleRendered {
                code: code.clone(),
                selected,
            }
        }
        (Stage::SelectingAchievements, FlowEvent::Advance) => {
            session.stage = Stage::SelectingAvailability;
            FlowEffect::ShowStage(session.stage)
        }
        (Stage::SelectingAvailability, FlowEvent::ChooseAvailability(choice)) if choice.is_set() => {
            session.availability = *choice;
            FlowEffect::AvailabilityRendered {
                availability: *choice,
                confirm_enabled: session.confirm_enabled(),
            }
        }
        (Stage::SelectingAvailability, FlowEvent::Confirm) if session.availability.is_set() => {
            let draft = session.draft(catalog);
            session.stage = Stage::Confirmed;
            FlowEffect::Finalize(draft)
        }
        _ => return Transition::ignored(session),
    };
    Transition {
        session,
        effects: vec![effect],
    }
}

/// Render the controls for the session's current stage.
pub fn render_view(session: &SelectionSession, catalog: &Catalog) -> FlowView {
    let flow_id = |event: FlowEvent| ControlId::Flow {
        session: session.id,
        event,
    };
    let title = format!("{} — {}", session.zone, session.activity);

    match session.stage {
        Stage::AskingAchievements => FlowView {
            title,
            description: "Commencez par choisir si vous voulez faire les succès.".to_string(),
            rows: vec![vec![
                Control::new(
                    &flow_id(FlowEvent::AnswerAchievements { wanted: true }),
                    "Succès : Oui",
                    ControlStyle::Secondary,
                ),
                Control::new(
                    &flow_id(FlowEvent::AnswerAchievements { wanted: false }),
                    "Succès : Non",
                    ControlStyle::Secondary,
                ),
            ]],
        },
        Stage::SelectingAchievements => {
            let options = catalog
                .options_for(&session.activity)
                .iter()
                .map(|option| {
                    let id = flow_id(FlowEvent::Toggle {
                        code: option.code.to_string(),
                    });
                    if catalog.is_disabled(&session.activity, option.code) {
                        Control::new(&id, option.label, ControlStyle::Danger).disabled(true)
                    } else if session.is_chosen(option.code) {
                        Control::new(&id, option.label, ControlStyle::Success)
                    } else {
                        Control::new(&id, option.label, ControlStyle::Secondary)
                    }
                })
                .collect();
            FlowView {
                title,
                description: "Sélectionnez les succès souhaités puis cliquez sur « Suivant »."
                    .to_string(),
                rows: vec![
                    options,
                    vec![Control::new(
                        &flow_id(FlowEvent::Advance),
                        "Suivant ➜",
                        ControlStyle::Danger,
                    )],
                ],
            }
        }
        Stage::Confirmed => FlowView {
            title,
            description: "Demande envoyée, un ticket va être ouvert.".to_string(),
            rows: vec![],
        },
        Stage::SelectingAvailability => {
            let slot = |availability: Availability, label: &str| {
                let style = if session.availability == availability {
                    ControlStyle::Success
                } else {
                    ControlStyle::Secondary
                };
                Control::new(&flow_id(FlowEvent::ChooseAvailability(availability)), label, style)
            };
            FlowView {
                title,
                description: "Choisissez votre disponibilité puis validez la demande.".to_string(),
                rows: vec![
                    vec![
                        slot(Availability::AsSoonAsPossible, "✅ Dès que possible"),
                        slot(Availability::ScheduledLater, "📅 À planifier"),
                    ],
                    vec![
                        Control::new(
                            &flow_id(FlowEvent::Confirm),
                            "Valider la demande",
                            ControlStyle::Danger,
                        )
                        .disabled(!session.confirm_enabled()),
                    ],
                ],
            }
        }
    }
}

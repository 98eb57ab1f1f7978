//! Fulfillment of a ticket, recovered purely from channel history.
//!
//! Nothing here depends on the process that created the ticket: the record,
//! the assignee and the authorization set are re-derived on every attempt.

use std::future::Future;

use crate::error::{SurfaceError, ValidationError};
use crate::feedback::fulfillment_notice;
use crate::identity::{ChannelRef, MemberId, MessageRef};
use crate::message::{PostedMessage, RenderedMessage};
use crate::record::{DecodedRecord, RecordDecoder, TicketRecord};

/// Chat platform operations the validation step needs.
pub trait TicketSurface: Sync {
    /// The oldest `window` messages of `channel`, in any order.
    fn fetch_history(
        &self,
        channel: ChannelRef,
        window: usize,
    ) -> impl Future<Output = Result<Vec<PostedMessage>, SurfaceError>> + Send;

    /// Post onto the feedback surface, outside the ticket channel.
    fn post_notice(
        &self,
        notice: &RenderedMessage,
    ) -> impl Future<Output = Result<MessageRef, SurfaceError>> + Send;

    /// Remove the validation control. Removal is atomic on the platform: when
    /// two clicks race, exactly one gets `Ok` and the other `NotFound`.
    fn retire_control(
        &self,
        channel: ChannelRef,
        message: MessageRef,
    ) -> impl Future<Output = Result<(), SurfaceError>> + Send;

    /// Post a fresh validation prompt for `record` into `channel`.
    fn restore_control(
        &self,
        channel: ChannelRef,
        record: &TicketRecord,
    ) -> impl Future<Output = Result<MessageRef, SurfaceError>> + Send;
}

/// The only identities allowed to fulfill a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FulfillmentAuthorization {
    pub assignee: MemberId,
    pub owner: MemberId,
}

impl FulfillmentAuthorization {
    pub fn for_record(record: &TicketRecord, owner: MemberId) -> Self {
        Self {
            assignee: record.assignee,
            owner,
        }
    }

    pub fn permits(&self, actor: MemberId) -> bool {
        actor == self.assignee || actor == self.owner
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRequest {
    pub channel: ChannelRef,
    pub actor: MemberId,
    /// Message carrying the validation control that was clicked.
    pub control_message: MessageRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    FulfillmentPosted {
        record: TicketRecord,
        notice: MessageRef,
        /// False when the platform refused to remove the control; the notice
        /// is still posted.
        control_retired: bool,
    },
    Unauthorized {
        record: TicketRecord,
    },
    /// The control was already gone: another click fulfilled this ticket.
    AlreadyFulfilled {
        record: TicketRecord,
    },
    RecordNotFound,
}

#[derive(Debug, Clone)]
pub struct Validator {
    owner: MemberId,
    decoder: RecordDecoder,
}

impl Validator {
    pub fn new(owner: MemberId, decoder: RecordDecoder) -> Self {
        Self { owner, decoder }
    }

    /// Recover the record without side effects.
    pub async fn recover<S: TicketSurface>(
        &self,
        surface: &S,
        channel: ChannelRef,
    ) -> Result<Option<DecodedRecord>, ValidationError> {
        let history = surface
            .fetch_history(channel, self.decoder.window())
            .await
            .map_err(ValidationError::History)?;
        Ok(self.decoder.decode(&history))
    }

    pub async fn validate<S: TicketSurface>(
        &self,
        surface: &S,
        request: ValidationRequest,
    ) -> Result<ValidationOutcome, ValidationError> {
        let Some(decoded) = self.recover(surface, request.channel).await? else {
            return Ok(ValidationOutcome::RecordNotFound);
        };
        let record = decoded.record;

        if !FulfillmentAuthorization::for_record(&record, self.owner).permits(request.actor) {
            return Ok(ValidationOutcome::Unauthorized { record });
        }

        // The control goes first: whoever removes it owns the fulfillment.
        let control_retired = match surface
            .retire_control(request.channel, request.control_message)
            .await
        {
            Ok(()) => true,
            Err(SurfaceError::NotFound) => {
                return Ok(ValidationOutcome::AlreadyFulfilled { record });
            }
            Err(SurfaceError::Platform(_)) => false,
        };

        let notice = fulfillment_notice(&record, request.actor);
        let notice = match surface.post_notice(&notice).await {
            Ok(notice) => notice,
            Err(err) => {
                if control_retired {
                    // Best effort; the ticket must keep a prompt.
                    let _ = surface.restore_control(request.channel, &record).await;
                }
                return Err(ValidationError::Notice(err));
            }
        };

        Ok(ValidationOutcome::FulfillmentPosted {
            record,
            notice,
            control_retired,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::catalog::Catalog;
    use crate::flow::{Availability, FlowEvent, SelectionSession, transition};
    use crate::record::encode;

    const OWNER: MemberId = MemberId(1);
    const BOT: MemberId = MemberId(2);
    const REQUESTER: MemberId = MemberId(10);
    const ASSIGNEE: MemberId = MemberId(20);
    const TICKET: ChannelRef = ChannelRef(500);
    const PROMPT: MessageRef = MessageRef(99);

    /// In-memory platform: one ticket channel plus the feedback surface.
    /// Every call yields once so concurrent validations interleave.
    #[derive(Default)]
    struct FakeSurface {
        history: Mutex<Vec<PostedMessage>>,
        notices: Mutex<Vec<RenderedMessage>>,
        controls: Mutex<Vec<MessageRef>>,
        retired: Mutex<Vec<MessageRef>>,
        restored: Mutex<Vec<TicketRecord>>,
        fail_history: bool,
        fail_retire: bool,
        fail_notice: bool,
    }

    impl FakeSurface {
        fn post(&self, message: RenderedMessage, author: MemberId) {
            let mut history = self.history.lock().unwrap();
            let id = MessageRef(history.len() as u64 + 1);
            history.push(PostedMessage {
                id,
                author,
                author_is_bot: author == BOT,
                content: message.content.unwrap_or_default(),
                embeds: message.embed.into_iter().collect(),
                attachments: vec![],
                reply_to: None,
            });
        }

        fn chatter(&self, count: usize) {
            for n in 0..count {
                self.post(
                    RenderedMessage {
                        content: Some(format!("message {n}")),
                        embed: None,
                    },
                    REQUESTER,
                );
            }
        }

        fn notices(&self) -> usize {
            self.notices.lock().unwrap().len()
        }
    }

    impl TicketSurface for FakeSurface {
        async fn fetch_history(
            &self,
            _channel: ChannelRef,
            window: usize,
        ) -> Result<Vec<PostedMessage>, SurfaceError> {
            tokio::task::yield_now().await;
            if self.fail_history {
                return Err(SurfaceError::Platform("timeout".into()));
            }
            let history = self.history.lock().unwrap();
            Ok(history.iter().take(window).cloned().collect())
        }

        async fn post_notice(&self, notice: &RenderedMessage) -> Result<MessageRef, SurfaceError> {
            tokio::task::yield_now().await;
            if self.fail_notice {
                return Err(SurfaceError::Platform("missing access".into()));
            }
            let mut notices = self.notices.lock().unwrap();
            notices.push(notice.clone());
            Ok(MessageRef(1000 + notices.len() as u64))
        }

        async fn retire_control(
            &self,
            _channel: ChannelRef,
            message: MessageRef,
        ) -> Result<(), SurfaceError> {
            tokio::task::yield_now().await;
            if self.fail_retire {
                return Err(SurfaceError::Platform("rate limited".into()));
            }
            let mut controls = self.controls.lock().unwrap();
            let Some(position) = controls.iter().position(|id| *id == message) else {
                return Err(SurfaceError::NotFound);
            };
            controls.remove(position);
            self.retired.lock().unwrap().push(message);
            Ok(())
        }

        async fn restore_control(
            &self,
            _channel: ChannelRef,
            record: &TicketRecord,
        ) -> Result<MessageRef, SurfaceError> {
            tokio::task::yield_now().await;
            let mut controls = self.controls.lock().unwrap();
            let id = MessageRef(2000 + controls.len() as u64);
            controls.push(id);
            self.restored.lock().unwrap().push(record.clone());
            Ok(id)
        }
    }

    fn confirmed_record() -> TicketRecord {
        let catalog = Catalog::builtin();
        let mut session =
            SelectionSession::start(REQUESTER, "Frigost 2", "Tengu", &catalog).unwrap();
        let mut draft = None;
        for event in [
            FlowEvent::AnswerAchievements { wanted: true },
            FlowEvent::Toggle {
                code: "tengu_premier".into(),
            },
            FlowEvent::Advance,
            FlowEvent::ChooseAvailability(Availability::AsSoonAsPossible),
            FlowEvent::Confirm,
        ] {
            let step = transition(session, &event, &catalog);
            draft = step.draft().cloned().or(draft);
            session = step.session;
        }
        TicketRecord::from_draft(&draft.unwrap(), ASSIGNEE)
    }

    fn validator() -> Validator {
        Validator::new(OWNER, RecordDecoder::default().trusting(BOT))
    }

    fn request(actor: MemberId) -> ValidationRequest {
        ValidationRequest {
            channel: TICKET,
            actor,
            control_message: PROMPT,
        }
    }

    fn ticket_channel() -> FakeSurface {
        let surface = FakeSurface::default();
        surface.post(encode(&confirmed_record()), BOT);
        surface.controls.lock().unwrap().push(PROMPT);
        surface
    }

    #[tokio::test]
    async fn assignee_can_fulfill() {
        let surface = ticket_channel();
        let outcome = validator().validate(&surface, request(ASSIGNEE)).await.unwrap();
        match outcome {
            ValidationOutcome::FulfillmentPosted {
                record,
                control_retired,
                ..
            } => {
                assert_eq!(record.option_labels, "Premier");
                assert_eq!(record.availability_text, "Passage dès que possible");
                assert!(control_retired);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(surface.notices(), 1);
        assert_eq!(*surface.retired.lock().unwrap(), vec![PROMPT]);
    }

    #[tokio::test]
    async fn owner_can_fulfill() {
        let surface = ticket_channel();
        let outcome = validator().validate(&surface, request(OWNER)).await.unwrap();
        assert!(matches!(outcome, ValidationOutcome::FulfillmentPosted { .. }));
    }

    #[tokio::test]
    async fn outsiders_are_rejected_without_side_effects() {
        let surface = ticket_channel();
        for actor in [REQUESTER, BOT, MemberId(12345)] {
            let outcome = validator().validate(&surface, request(actor)).await.unwrap();
            assert!(matches!(outcome, ValidationOutcome::Unauthorized { .. }));
        }
        assert_eq!(surface.notices(), 0);
        assert!(surface.retired.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_record_is_reported() {
        let surface = FakeSurface::default();
        surface.post(
            RenderedMessage {
                content: Some("bonjour".into()),
                embed: None,
            },
            REQUESTER,
        );
        let outcome = validator().validate(&surface, request(OWNER)).await.unwrap();
        assert_eq!(outcome, ValidationOutcome::RecordNotFound);
        assert_eq!(surface.notices(), 0);
    }

    #[tokio::test]
    async fn history_failure_is_an_error() {
        let surface = FakeSurface {
            fail_history: true,
            ..FakeSurface::default()
        };
        let err = validator().validate(&surface, request(OWNER)).await.unwrap_err();
        assert!(matches!(err, ValidationError::History(_)));
    }

    #[tokio::test]
    async fn retire_failure_does_not_undo_fulfillment() {
        let surface = FakeSurface {
            fail_retire: true,
            ..ticket_channel()
        };
        let outcome = validator().validate(&surface, request(ASSIGNEE)).await.unwrap();
        assert!(matches!(
            outcome,
            ValidationOutcome::FulfillmentPosted {
                control_retired: false,
                ..
            }
        ));
        assert_eq!(surface.notices(), 1);
    }

    #[tokio::test]
    async fn concurrent_clicks_post_a_single_notice() {
        let surface = ticket_channel();
        let validator = validator();
        let (first, second) = tokio::join!(
            validator.validate(&surface, request(ASSIGNEE)),
            validator.validate(&surface, request(OWNER)),
        );
        let outcomes = [first.unwrap(), second.unwrap()];

        assert_eq!(surface.notices(), 1);
        assert_eq!(
            outcomes
                .iter()
                .filter(|o| matches!(o, ValidationOutcome::FulfillmentPosted { .. }))
                .count(),
            1
        );
        assert_eq!(
            outcomes
                .iter()
                .filter(|o| matches!(o, ValidationOutcome::AlreadyFulfilled { .. }))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn second_click_after_fulfillment_is_already_fulfilled() {
        let surface = ticket_channel();
        validator().validate(&surface, request(ASSIGNEE)).await.unwrap();
        let outcome = validator().validate(&surface, request(ASSIGNEE)).await.unwrap();
        assert!(matches!(outcome, ValidationOutcome::AlreadyFulfilled { .. }));
        assert_eq!(surface.notices(), 1);
    }

    #[tokio::test]
    async fn notice_failure_restores_the_control() {
        let surface = FakeSurface {
            fail_notice: true,
            ..ticket_channel()
        };
        let err = validator().validate(&surface, request(ASSIGNEE)).await.unwrap_err();
        assert!(matches!(err, ValidationError::Notice(_)));
        assert_eq!(*surface.restored.lock().unwrap(), vec![confirmed_record()]);
        assert_eq!(surface.controls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn record_survives_a_long_conversation() {
        let surface = ticket_channel();
        surface.chatter(200);
        let outcome = validator().validate(&surface, request(ASSIGNEE)).await.unwrap();
        assert!(matches!(outcome, ValidationOutcome::FulfillmentPosted { .. }));
    }

    #[tokio::test]
    async fn fresh_instance_validates_from_history_alone() {
        let surface = ticket_channel();
        surface.post(
            RenderedMessage {
                content: Some("on fait ça ce soir ?".into()),
                embed: None,
            },
            REQUESTER,
        );

        // A second validator shares nothing with whoever posted the record.
        let restarted = Validator::new(OWNER, RecordDecoder::default().trusting(BOT));
        let outcome = restarted.validate(&surface, request(ASSIGNEE)).await.unwrap();
        let ValidationOutcome::FulfillmentPosted { record, .. } = outcome else {
            panic!("restarted instance must recover the ticket");
        };
        assert_eq!(record, confirmed_record());
    }
}

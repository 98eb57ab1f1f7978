use passage_core::MemberId;
use passage_core::error::FlowError;
use passage_core::flow::{FlowEvent, render_view};
use passage_core::session::{SessionId, SessionKey};
use serenity::all::{ComponentInteraction, Context, EditInteractionResponse};
use tracing::{debug, info};

use super::{acknowledge, replace_with_text, ticket};
use crate::error::AppError;
use crate::render;
use crate::state::AppState;

/// Apply one click to the caller's selection session and re-render it.
///
/// The session lane is held until the re-render is sent, so a second click
/// on the same session waits for this one to finish.
pub async fn handle(
    ctx: &Context,
    state: &AppState,
    component: &ComponentInteraction,
    session: SessionId,
    event: FlowEvent,
) -> Result<(), AppError> {
    acknowledge(ctx, component).await?;

    // Keyed by the clicking member: a control forwarded to someone else never
    // reaches the requester's session.
    let key = SessionKey {
        requester: MemberId(component.user.id.get()),
        session,
    };
    let lane = state.sessions.lane(key).await;
    let _turn = lane.lock().await;

    let step = match state.sessions.apply(&key, &event, &state.catalog).await {
        Ok(step) => step,
        Err(err @ (FlowError::SessionExpired | FlowError::SessionNotFound)) => {
            debug!(session = %session, code = err.code(), "flow event for a closed session");
            let message = AppError::from(err).user_message();
            component
                .edit_response(&ctx.http, replace_with_text(message))
                .await?;
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    if step.is_ignored() {
        debug!(session = %session, ?event, stage = ?step.session.stage(), "ignored flow event");
        return Ok(());
    }

    if let Some(draft) = step.draft() {
        info!(
            session = %session,
            requester = %draft.requester,
            activity = %draft.activity,
            options = draft.option_codes.len(),
            "selection confirmed"
        );
        let channel = ticket::provision(ctx, state, draft).await?;
        component
            .edit_response(
                &ctx.http,
                replace_with_text(format!("✅ Ticket créé : <#{}>", channel.get())),
            )
            .await?;
        return Ok(());
    }

    let view = render_view(&step.session, &state.catalog);
    component
        .edit_response(
            &ctx.http,
            EditInteractionResponse::new()
                .embed(render::flow_embed(&view))
                .components(render::action_rows(&view.rows)),
        )
        .await?;
    Ok(())
}

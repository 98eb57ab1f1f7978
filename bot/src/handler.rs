use passage_core::MemberId;
use serenity::all::{
    Context, CreateInteractionResponse, CreateInteractionResponseFollowup, CreateMessage,
    EventHandler, Interaction, Message, Ready,
};
use serenity::async_trait;
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::handlers::{self, dashboard, ephemeral};
use crate::state::AppState;

pub struct Handler {
    state: AppState,
}

impl Handler {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Log a handler failure and forward it to the alert channel when one is set.
    async fn report(&self, ctx: &Context, event: &'static str, err: &AppError) {
        error!(event, code = err.code(), error = %err, "handler failed");
        let Some(channel) = self.state.config.alert_channel() else {
            return;
        };
        let alert = format!("⚠️ `{event}` a échoué (`{}`) : {err}", err.code());
        if let Err(send_err) = channel
            .send_message(&ctx.http, CreateMessage::new().content(alert))
            .await
        {
            warn!(error = %send_err, "could not post alert");
        }
    }
}

/// Tell the member something went wrong, whether or not the interaction was
/// already answered.
macro_rules! reply_error {
    ($ctx:expr, $interaction:expr, $err:expr) => {{
        let message = $err.user_message();
        let response = CreateInteractionResponse::Message(ephemeral(message));
        if $interaction.create_response(&$ctx.http, response).await.is_err() {
            let followup = CreateInteractionResponseFollowup::new()
                .content(message)
                .ephemeral(true);
            if let Err(err) = $interaction.create_followup(&$ctx.http, followup).await {
                warn!(error = %err, "could not report failure to member");
            }
        }
    }};
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        self.state.set_bot_id(MemberId(ready.user.id.get()));
        info!(user = %ready.user.name, guild = self.state.config.guild_id, "connected");

        if let Err(err) = dashboard::register_commands(&ctx, &self.state).await {
            self.report(&ctx, "register_commands", &err).await;
        }
        let granted = dashboard::grant_screen_access(&ctx, &self.state).await;
        info!(granted, "screenshot channel access synced");
        if let Err(err) = dashboard::publish(&ctx, &self.state).await {
            self.report(&ctx, "dashboard", &err).await;
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => {
                if let Err(err) = handlers::command(&ctx, &self.state, &command).await {
                    self.report(&ctx, "command", &err).await;
                    reply_error!(ctx, command, err);
                }
            }
            Interaction::Component(component) => {
                if let Err(err) = handlers::component(&ctx, &self.state, &component).await {
                    self.report(&ctx, "component", &err).await;
                    reply_error!(ctx, component, err);
                }
            }
            _ => {}
        }
    }

    async fn message(&self, ctx: Context, message: Message) {
        if let Err(err) = handlers::feedback::on_message(&ctx, &self.state, &message).await {
            self.report(&ctx, "message", &err).await;
        }
    }
}

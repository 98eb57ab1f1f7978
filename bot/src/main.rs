mod config;
mod error;
mod handler;
mod handlers;
mod render;
mod sessions;
mod state;
mod surface;

use serenity::Client;
use serenity::all::GatewayIntents;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::BotConfig;
use crate::handler::Handler;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    // Load .env if present (dev), ignore if missing (production)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "passage_bot=info,passage_core=info,serenity=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            std::process::exit(1);
        }
    };
    tracing::info!(
        guild = config.guild_id,
        passeurs = %config.passeurs_path.display(),
        session_timeout_secs = config.session_timeout_secs,
        history_window = config.history_window,
        alerts = config.alert_channel_id.is_some(),
        "starting passage bot"
    );

    let state = AppState::new(config);
    if let Err(err) = state.resolver.load_mapping() {
        tracing::warn!(
            code = err.code(),
            error = %err,
            "assignee mapping unusable; every ticket goes to the owner until it is fixed"
        );
    }
    tokio::spawn(sessions::sweep_forever(state.sessions.clone()));

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;
    let mut client = match Client::builder(&state.config.token, intents)
        .event_handler(Handler::new(state.clone()))
        .await
    {
        Ok(client) => client,
        Err(err) => {
            tracing::error!(error = %err, "could not build discord client");
            std::process::exit(1);
        }
    };

    if let Err(err) = client.start().await {
        tracing::error!(error = %err, "gateway connection ended");
        std::process::exit(1);
    }
}

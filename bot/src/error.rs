use passage_core::error::{FlowError, SurfaceError, ValidationError, codes};
use thiserror::Error;

/// Failure of a gateway event handler. Converted into an ephemeral reply
/// for the member who triggered it and, when configured, an alert.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("discord request failed: {0}")]
    Discord(#[from] serenity::Error),
    #[error("discord request failed: {0}")]
    Surface(#[from] SurfaceError),
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("unknown zone '{0}'")]
    UnknownZone(String),
    #[error("select menu submitted without a value")]
    EmptySelection,
    #[error("bot identity not known yet; ready event not received")]
    NotReady,
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Discord(_) | AppError::Surface(_) | AppError::NotReady => {
                codes::PLATFORM_ERROR
            }
            AppError::Flow(err) => err.code(),
            AppError::Validation(err) => err.code(),
            AppError::UnknownZone(_) | AppError::EmptySelection => codes::UNKNOWN_ACTIVITY,
        }
    }

    /// Text shown to the member, in the server's language.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Flow(FlowError::SessionExpired | FlowError::SessionNotFound) => {
                "⌛ Cette demande a expiré. Relancez `/reservations` pour recommencer."
            }
            AppError::Flow(FlowError::UnknownActivity(_))
            | AppError::UnknownZone(_)
            | AppError::EmptySelection => "❌ Donjon inconnu, veuillez réessayer.",
            AppError::Validation(_) => {
                "❌ Impossible de valider le passage pour le moment, réessayez plus tard."
            }
            AppError::Discord(_) | AppError::Surface(_) | AppError::NotReady => {
                "❌ Une erreur est survenue, veuillez réessayer."
            }
        }
    }
}

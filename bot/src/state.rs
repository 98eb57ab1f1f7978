use std::sync::{Arc, OnceLock};

use passage_core::MemberId;
use passage_core::assignment::AssignmentResolver;
use passage_core::catalog::Catalog;
use passage_core::record::RecordDecoder;
use passage_core::validation::Validator;

use crate::config::BotConfig;
use crate::error::AppError;
use crate::sessions::SessionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BotConfig>,
    pub catalog: Catalog,
    pub resolver: AssignmentResolver,
    pub sessions: Arc<SessionRegistry>,
    bot_id: Arc<OnceLock<MemberId>>,
}

impl AppState {
    pub fn new(config: BotConfig) -> Self {
        let resolver = AssignmentResolver::new(config.passeurs_path.clone(), config.owner_id);
        let sessions = Arc::new(SessionRegistry::new(config.session_timeout_secs));
        Self {
            config: Arc::new(config),
            catalog: Catalog::builtin(),
            resolver,
            sessions,
            bot_id: Arc::new(OnceLock::new()),
        }
    }

    /// Record the bot's own identity from the ready event. Later calls are no-ops.
    pub fn set_bot_id(&self, id: MemberId) {
        let _ = self.bot_id.set(id);
    }

    pub fn bot_id(&self) -> Result<MemberId, AppError> {
        self.bot_id.get().copied().ok_or(AppError::NotReady)
    }

    /// Decoder that only trusts messages the bot itself authored.
    pub fn decoder(&self) -> Result<RecordDecoder, AppError> {
        Ok(RecordDecoder::new(self.config.history_window)
            .with_recap_fallback(self.config.recap_fallback)
            .trusting(self.bot_id()?))
    }

    pub fn validator(&self) -> Result<Validator, AppError> {
        Ok(Validator::new(self.config.owner_id, self.decoder()?))
    }
}

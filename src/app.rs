//! Shared state handed to every update handler.
use crate::admin::Sessions;
use crate::config::Config;
use crate::db::Pool;
use crate::delivery;
use crate::scheduler::Scheduler;
use crate::telegram::ChatApi;
use std::sync::Arc;
use std::time::Duration;

pub struct App {
    pub cfg: Config,
    pub pool: Pool,
    pub api: Arc<dyn ChatApi>,
    pub scheduler: Scheduler,
    pub sessions: Sessions,
}

impl App {
    pub fn delivery_options(&self) -> delivery::Options {
        delivery::Options {
            episode_pacing: Duration::from_millis(self.cfg.app.episode_pacing_ms),
            thank_you_sticker: self.cfg.app.thank_you_sticker.clone(),
        }
    }
}

use std::sync::Arc;

use fairshare_chat::ThreadOrchestrator;
use fairshare_persist::{ContactStore, MongoStore, PostStore};

use crate::config::Config;
use crate::mailer::Mailer;

/// Shared application state passed to all handlers
///
/// Stores are trait objects so the router can run against MongoDB in
/// production and the in-memory store in tests.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub chat: Arc<ThreadOrchestrator>,
    pub posts: Arc<dyn PostStore>,
    pub contacts: Arc<dyn ContactStore>,
    pub mailer: Arc<dyn Mailer>,
    /// Present when backed by MongoDB; used by the health check
    pub database: Option<MongoStore>,
}

impl AppState {
    pub fn new(
        config: Config,
        chat: ThreadOrchestrator,
        posts: Arc<dyn PostStore>,
        contacts: Arc<dyn ContactStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            chat: Arc::new(chat),
            posts,
            contacts,
            mailer,
            database: None,
        }
    }

    pub fn with_database(mut self, database: MongoStore) -> Self {
        self.database = Some(database);
        self
    }
}

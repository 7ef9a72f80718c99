use mongodb::Database;
use std::sync::Arc;

use crate::db::memory_store::MemoryStore;
use crate::db::mongo_store::MongoStore;
use crate::db::store::{PollStore, UserStore};
use crate::repositories::poll_repository::PollRepository;
use crate::repositories::user_repository::UserRepository;
use crate::utils::error::AppResult;

/// Both repositories wired to one store.
#[derive(Clone)]
pub struct AppState {
    pub polls: PollRepository,
    pub users: UserRepository,
}

impl AppState {
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: PollStore + UserStore + 'static,
    {
        let users = UserRepository::new(store.clone());
        let polls = PollRepository::new(store, users.clone());
        Self { polls, users }
    }

    /// Connects the repositories to MongoDB and makes sure the user index exists.
    pub async fn mongo(db: &Database) -> AppResult<Self> {
        let store = MongoStore::new(db);
        store.ensure_indexes().await?;
        Ok(Self::new(Arc::new(store)))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }
}

use std::sync::Arc;

use tracing::{debug, info};

use crate::db::store::UserStore;
use crate::models::user_models::{PollingList, User};
use crate::utils::error::{AppError, AppResult};

/// Owns `user` records and their two polling reference sets.
///
/// Every operation is idempotent: repeated adds leave the sets unchanged and
/// removing an absent id does nothing.
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn UserStore>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Registers the user with empty reference sets. Returns `false` if it already existed.
    pub async fn add_user(&self, user_id: &str) -> AppResult<bool> {
        let created = self.store.insert_user_if_absent(user_id).await?;
        if created {
            info!(user_id, "user registered");
        }
        Ok(created)
    }

    pub async fn get_or_create(&self, user_id: &str) -> AppResult<User> {
        self.add_user(user_id).await?;
        self.get_user(user_id).await
    }

    pub async fn get_user(&self, user_id: &str) -> AppResult<User> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {} does not exist", user_id)))
    }

    pub async fn user_exists(&self, user_id: &str) -> AppResult<bool> {
        self.store.user_exists(user_id).await
    }

    pub async fn add_created_pollings_to_user(
        &self,
        poll_ids: &[String],
        user_id: &str,
    ) -> AppResult<bool> {
        self.add_pollings(poll_ids, user_id, PollingList::Created).await
    }

    pub async fn add_shared_pollings_to_user(
        &self,
        poll_ids: &[String],
        user_id: &str,
    ) -> AppResult<bool> {
        self.add_pollings(poll_ids, user_id, PollingList::Shared).await
    }

    pub async fn delete_created_pollings_to_user(
        &self,
        poll_ids: &[String],
        user_id: &str,
    ) -> AppResult<bool> {
        self.delete_pollings(poll_ids, user_id, PollingList::Created).await
    }

    pub async fn delete_shared_pollings_to_user(
        &self,
        poll_ids: &[String],
        user_id: &str,
    ) -> AppResult<bool> {
        self.delete_pollings(poll_ids, user_id, PollingList::Shared).await
    }

    /// Drops `poll_id` from every user's shared set. Returns the number of users changed.
    pub async fn remove_shared_polling_everywhere(&self, poll_id: &str) -> AppResult<u64> {
        let changed = self
            .store
            .pull_pollings_from_all(PollingList::Shared, &[poll_id.to_string()])
            .await?;
        debug!(poll_id, changed, "shared references removed");
        Ok(changed)
    }

    async fn add_pollings(
        &self,
        poll_ids: &[String],
        user_id: &str,
        list: PollingList,
    ) -> AppResult<bool> {
        self.add_user(user_id).await?;
        let changed = self.store.add_pollings(user_id, list, poll_ids).await?;
        debug!(user_id, list = list.field(), count = poll_ids.len(), changed, "pollings added");
        Ok(changed)
    }

    async fn delete_pollings(
        &self,
        poll_ids: &[String],
        user_id: &str,
        list: PollingList,
    ) -> AppResult<bool> {
        let changed = self.store.pull_pollings(user_id, list, poll_ids).await?;
        debug!(user_id, list = list.field(), count = poll_ids.len(), changed, "pollings removed");
        Ok(changed)
    }
}

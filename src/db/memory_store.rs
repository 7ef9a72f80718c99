use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use crate::db::store::{PollStore, UserStore};
use crate::models::poll_models::{Poll, PollId, PollOption, RelatedUserInfo};
use crate::models::user_models::{PollingList, User};
use crate::utils::error::AppResult;

/// In-process store with the same per-document semantics as [`MongoStore`].
///
/// Each method takes the write lock once, so every call is atomic for the
/// document it touches, matching what the database guarantees.
///
/// [`MongoStore`]: crate::db::mongo_store::MongoStore
#[derive(Debug, Default)]
pub struct MemoryStore {
    pollings: RwLock<HashMap<PollId, Poll>>,
    users: RwLock<HashMap<String, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn polling_count(&self) -> usize {
        self.pollings.read().await.len()
    }
}

#[async_trait]
impl PollStore for MemoryStore {
    async fn insert_poll(&self, poll: &Poll) -> AppResult<()> {
        self.pollings.write().await.insert(poll.id, poll.clone());
        Ok(())
    }

    async fn find_poll(&self, poll_id: &PollId) -> AppResult<Option<Poll>> {
        Ok(self.pollings.read().await.get(poll_id).cloned())
    }

    async fn poll_exists(&self, poll_id: &PollId) -> AppResult<bool> {
        Ok(self.pollings.read().await.contains_key(poll_id))
    }

    async fn delete_poll(&self, poll_id: &PollId) -> AppResult<bool> {
        Ok(self.pollings.write().await.remove(poll_id).is_some())
    }

    async fn push_option(&self, poll_id: &PollId, option: &PollOption) -> AppResult<bool> {
        let mut pollings = self.pollings.write().await;
        let Some(poll) = pollings.get_mut(poll_id) else {
            return Ok(false);
        };
        if poll.option(&option.content).is_some() {
            return Ok(false);
        }
        poll.options.push(option.clone());
        Ok(true)
    }

    async fn rename_option(&self, poll_id: &PollId, old: &str, new: &str) -> AppResult<bool> {
        let mut pollings = self.pollings.write().await;
        let Some(poll) = pollings.get_mut(poll_id) else {
            return Ok(false);
        };
        if poll.option(new).is_some() {
            return Ok(false);
        }
        match poll.options.iter_mut().find(|opt| opt.content == old) {
            Some(option) => {
                option.content = new.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn pull_options(&self, poll_id: &PollId, contents: &[String]) -> AppResult<bool> {
        let mut pollings = self.pollings.write().await;
        let Some(poll) = pollings.get_mut(poll_id) else {
            return Ok(false);
        };
        let before = poll.options.len();
        poll.options.retain(|opt| !contents.contains(&opt.content));
        Ok(poll.options.len() != before)
    }

    async fn add_voter(&self, poll_id: &PollId, content: &str, user_id: &str) -> AppResult<bool> {
        let mut pollings = self.pollings.write().await;
        let option = pollings
            .get_mut(poll_id)
            .and_then(|poll| poll.options.iter_mut().find(|opt| opt.content == content));
        let Some(option) = option else {
            return Ok(false);
        };
        if !option.voted_user.iter().any(|voter| voter == user_id) {
            option.voted_user.push(user_id.to_string());
        }
        Ok(true)
    }

    async fn push_user_info(&self, poll_id: &PollId, info: &RelatedUserInfo) -> AppResult<bool> {
        let mut pollings = self.pollings.write().await;
        let Some(poll) = pollings.get_mut(poll_id) else {
            return Ok(false);
        };
        if poll.user_info(&info.user_id).is_some() {
            return Ok(false);
        }
        poll.related_users_info.push(info.clone());
        Ok(true)
    }

    async fn set_available_time(
        &self,
        poll_id: &PollId,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut pollings = self.pollings.write().await;
        let entry = pollings
            .get_mut(poll_id)
            .and_then(|poll| {
                poll.related_users_info
                    .iter_mut()
                    .find(|info| info.user_id == user_id)
            });
        Ok(match entry {
            Some(info) => {
                info.available_time_from = from;
                info.available_time_to = to;
                true
            }
            None => false,
        })
    }

    async fn set_start_point(
        &self,
        poll_id: &PollId,
        user_id: &str,
        point: &str,
    ) -> AppResult<bool> {
        let mut pollings = self.pollings.write().await;
        let entry = pollings
            .get_mut(poll_id)
            .and_then(|poll| {
                poll.related_users_info
                    .iter_mut()
                    .find(|info| info.user_id == user_id)
            });
        Ok(match entry {
            Some(info) => {
                info.start_point = point.to_string();
                true
            }
            None => false,
        })
    }

    async fn pull_users_info(&self, poll_id: &PollId, user_ids: &[String]) -> AppResult<bool> {
        let mut pollings = self.pollings.write().await;
        let Some(poll) = pollings.get_mut(poll_id) else {
            return Ok(false);
        };
        let before = poll.related_users_info.len();
        poll.related_users_info.retain(|info| !user_ids.contains(&info.user_id));
        Ok(poll.related_users_info.len() != before)
    }

    async fn find_polls_by_creator(&self, creator: &str) -> AppResult<Vec<Poll>> {
        let pollings = self.pollings.read().await;
        Ok(pollings
            .values()
            .filter(|poll| poll.creator == creator)
            .cloned()
            .collect())
    }
}

fn pull_ids(list: &mut Vec<String>, poll_ids: &[String]) -> bool {
    let before = list.len();
    list.retain(|id| !poll_ids.contains(id));
    list.len() != before
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, user_id: &str) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn user_exists(&self, user_id: &str) -> AppResult<bool> {
        Ok(self.users.read().await.contains_key(user_id))
    }

    async fn insert_user_if_absent(&self, user_id: &str) -> AppResult<bool> {
        let mut users = self.users.write().await;
        if users.contains_key(user_id) {
            return Ok(false);
        }
        let mut user = User::new(user_id);
        user.id = Some(ObjectId::new());
        users.insert(user_id.to_string(), user);
        Ok(true)
    }

    async fn add_pollings(
        &self,
        user_id: &str,
        list: PollingList,
        poll_ids: &[String],
    ) -> AppResult<bool> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(user_id) else {
            return Ok(false);
        };
        let ids = user.pollings_mut(list);
        let mut changed = false;
        for poll_id in poll_ids {
            if !ids.contains(poll_id) {
                ids.push(poll_id.clone());
                changed = true;
            }
        }
        Ok(changed)
    }

    async fn pull_pollings(
        &self,
        user_id: &str,
        list: PollingList,
        poll_ids: &[String],
    ) -> AppResult<bool> {
        let mut users = self.users.write().await;
        Ok(match users.get_mut(user_id) {
            Some(user) => pull_ids(user.pollings_mut(list), poll_ids),
            None => false,
        })
    }

    async fn pull_pollings_from_all(
        &self,
        list: PollingList,
        poll_ids: &[String],
    ) -> AppResult<u64> {
        let mut users = self.users.write().await;
        let mut changed = 0;
        for user in users.values_mut() {
            if pull_ids(user.pollings_mut(list), poll_ids) {
                changed += 1;
            }
        }
        Ok(changed)
    }
}

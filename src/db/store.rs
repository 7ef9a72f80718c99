//! Store ports used by the repositories.
//!
//! Each method maps to a single request against one document, so every call is
//! atomic at document scope and nothing spans documents. Mutations return
//! whether their filter matched, which the repositories turn into applied or
//! skipped items.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::poll_models::{Poll, PollId, PollOption, RelatedUserInfo};
use crate::models::user_models::{PollingList, User};
use crate::utils::error::AppResult;

pub const POLLING_COLLECTION: &str = "polling";
pub const USER_COLLECTION: &str = "user";

#[async_trait]
pub trait PollStore: Send + Sync {
    async fn insert_poll(&self, poll: &Poll) -> AppResult<()>;

    async fn find_poll(&self, poll_id: &PollId) -> AppResult<Option<Poll>>;

    async fn poll_exists(&self, poll_id: &PollId) -> AppResult<bool>;

    async fn delete_poll(&self, poll_id: &PollId) -> AppResult<bool>;

    /// Appends `option` unless an option with the same content exists.
    async fn push_option(&self, poll_id: &PollId, option: &PollOption) -> AppResult<bool>;

    /// Renames `old` to `new` unless `old` is missing or `new` is taken.
    async fn rename_option(&self, poll_id: &PollId, old: &str, new: &str) -> AppResult<bool>;

    /// Removes every option whose content is listed. True when something was removed.
    async fn pull_options(&self, poll_id: &PollId, contents: &[String]) -> AppResult<bool>;

    /// Adds `user_id` to the voter set of the option. True when the option exists.
    async fn add_voter(&self, poll_id: &PollId, content: &str, user_id: &str) -> AppResult<bool>;

    /// Appends `info` unless an entry for the same user exists.
    async fn push_user_info(&self, poll_id: &PollId, info: &RelatedUserInfo) -> AppResult<bool>;

    async fn set_available_time(
        &self,
        poll_id: &PollId,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<bool>;

    async fn set_start_point(
        &self,
        poll_id: &PollId,
        user_id: &str,
        point: &str,
    ) -> AppResult<bool>;

    async fn pull_users_info(&self, poll_id: &PollId, user_ids: &[String]) -> AppResult<bool>;

    async fn find_polls_by_creator(&self, creator: &str) -> AppResult<Vec<Poll>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, user_id: &str) -> AppResult<Option<User>>;

    async fn user_exists(&self, user_id: &str) -> AppResult<bool>;

    /// Creates the user with empty reference sets. True when a record was created.
    async fn insert_user_if_absent(&self, user_id: &str) -> AppResult<bool>;

    /// Set union into `list`. True when at least one id was new.
    async fn add_pollings(
        &self,
        user_id: &str,
        list: PollingList,
        poll_ids: &[String],
    ) -> AppResult<bool>;

    /// Removes the ids from `list`; never creates the user. True when something was removed.
    async fn pull_pollings(
        &self,
        user_id: &str,
        list: PollingList,
        poll_ids: &[String],
    ) -> AppResult<bool>;

    /// Removes the ids from `list` on every user; returns the number of users changed.
    async fn pull_pollings_from_all(
        &self,
        list: PollingList,
        poll_ids: &[String],
    ) -> AppResult<u64>;
}

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::db::store::PollStore;
use crate::models::poll_models::{
    BatchOutcome, NewPolling, Poll, PollId, PollOption, RelatedUserInfo,
};
use crate::repositories::user_repository::UserRepository;
use crate::utils::error::{AppError, AppResult};

/// Owns `polling` documents and keeps the creator's references in step.
///
/// Multi-item operations apply their items one at a time, in order, and stop
/// at the first store failure; items applied before it stay applied. Key
/// conflicts are not failures and show up in the returned [`BatchOutcome`].
#[derive(Clone)]
pub struct PollRepository {
    store: Arc<dyn PollStore>,
    users: UserRepository,
}

impl PollRepository {
    pub fn new(store: Arc<dyn PollStore>, users: UserRepository) -> Self {
        Self { store, users }
    }

    /// Stores a new polling and credits it to the creator's `createdPollings`.
    ///
    /// If crediting fails the polling is removed again, so no id escapes for a
    /// polling its creator does not reference.
    pub async fn start_polling(&self, user_id: &str, new_polling: NewPolling) -> AppResult<PollId> {
        ensure_unique(
            new_polling.options.iter().map(|opt| opt.content.as_str()),
            "option content",
        )?;
        ensure_unique(
            new_polling.related_users_info.iter().map(|info| info.user_id.as_str()),
            "related user",
        )?;

        let mut poll = new_polling.into_poll(user_id);
        poll.options.iter_mut().for_each(PollOption::dedup_voters);

        self.store.insert_poll(&poll).await?;

        if let Err(err) = self
            .users
            .add_created_pollings_to_user(&[poll.id.to_hex()], user_id)
            .await
        {
            warn!(
                poll_id = %poll.id,
                user_id,
                error = %err,
                "crediting creator failed, removing polling"
            );
            if let Err(cleanup) = self.store.delete_poll(&poll.id).await {
                error!(poll_id = %poll.id, error = %cleanup, "orphaned polling left behind");
            }
            return Err(err);
        }

        info!(poll_id = %poll.id, user_id, subject = %poll.subject, "polling started");
        Ok(poll.id)
    }

    pub async fn get_polling(&self, poll_id: &PollId) -> AppResult<Poll> {
        self.store
            .find_poll(poll_id)
            .await?
            .ok_or_else(|| not_found(poll_id))
    }

    pub async fn list_created_pollings(&self, user_id: &str) -> AppResult<Vec<Poll>> {
        self.store.find_polls_by_creator(user_id).await
    }

    /// Deletes a polling on behalf of its creator.
    ///
    /// References are dropped before the document itself: shared sets first,
    /// then the creator's set. Each step is idempotent, so if the process dies
    /// part way the polling is still there and the creator can simply retry.
    pub async fn delete_polling(&self, user_id: &str, poll_id: &PollId) -> AppResult<()> {
        let poll = self.get_polling(poll_id).await?;

        if poll.creator != user_id {
            warn!(%poll_id, user_id, creator = %poll.creator, "delete refused for non-creator");
            return Err(AppError::Unauthorized(format!(
                "only the creator may delete polling {}",
                poll_id
            )));
        }

        let hex = poll_id.to_hex();
        let shared = self.users.remove_shared_polling_everywhere(&hex).await?;
        self.users
            .delete_created_pollings_to_user(&[hex], &poll.creator)
            .await?;
        self.store.delete_poll(poll_id).await?;

        info!(%poll_id, user_id, shared_users = shared, "polling deleted");
        Ok(())
    }

    /// Credits the polling to each user's `sharedPollings`, creating users as needed.
    pub async fn share_polling(
        &self,
        poll_id: &PollId,
        user_ids: &[String],
    ) -> AppResult<BatchOutcome> {
        self.ensure_polling(poll_id).await?;

        let hex = poll_id.to_hex();
        let mut outcome = BatchOutcome::default();
        for user_id in user_ids {
            let applied = self
                .users
                .add_shared_pollings_to_user(std::slice::from_ref(&hex), user_id)
                .await?;
            outcome.record(user_id, applied);
        }

        debug!(%poll_id, ?outcome, "polling shared");
        Ok(outcome)
    }

    pub async fn add_options(
        &self,
        poll_id: &PollId,
        options: &[PollOption],
    ) -> AppResult<BatchOutcome> {
        self.ensure_polling(poll_id).await?;

        let mut outcome = BatchOutcome::default();
        for option in options {
            let mut option = option.clone();
            option.dedup_voters();
            let applied = self.store.push_option(poll_id, &option).await?;
            outcome.record(option.content, applied);
        }

        debug!(%poll_id, ?outcome, "options added");
        Ok(outcome)
    }

    /// Renames `old_contents[i]` to `new_contents[i]`, skipping pairs whose target already exists.
    pub async fn update_options(
        &self,
        poll_id: &PollId,
        old_contents: &[String],
        new_contents: &[String],
    ) -> AppResult<BatchOutcome> {
        ensure_paired("update_options", &[old_contents.len(), new_contents.len()])?;
        self.ensure_polling(poll_id).await?;

        let mut outcome = BatchOutcome::default();
        for (old, new) in old_contents.iter().zip(new_contents) {
            let applied = self.store.rename_option(poll_id, old, new).await?;
            outcome.record(old, applied);
        }

        debug!(%poll_id, ?outcome, "options renamed");
        Ok(outcome)
    }

    pub async fn delete_options(
        &self,
        poll_id: &PollId,
        contents: &[String],
    ) -> AppResult<BatchOutcome> {
        let poll = self.get_polling(poll_id).await?;

        let mut outcome = BatchOutcome::default();
        for content in contents {
            outcome.record(content, poll.option(content).is_some());
        }
        if !outcome.applied.is_empty() {
            self.store.pull_options(poll_id, contents).await?;
        }

        debug!(%poll_id, ?outcome, "options deleted");
        Ok(outcome)
    }

    /// Adds `user_id` to the voters of each named option. Voting twice changes nothing.
    pub async fn vote_options(
        &self,
        user_id: &str,
        poll_id: &PollId,
        contents: &[String],
    ) -> AppResult<BatchOutcome> {
        self.ensure_polling(poll_id).await?;

        let mut outcome = BatchOutcome::default();
        for content in contents {
            let applied = self.store.add_voter(poll_id, content, user_id).await?;
            outcome.record(content, applied);
        }

        debug!(%poll_id, user_id, ?outcome, "votes recorded");
        Ok(outcome)
    }

    pub async fn add_users_info(
        &self,
        poll_id: &PollId,
        infos: &[RelatedUserInfo],
    ) -> AppResult<BatchOutcome> {
        self.ensure_polling(poll_id).await?;

        let mut outcome = BatchOutcome::default();
        for info in infos {
            let applied = self.store.push_user_info(poll_id, info).await?;
            outcome.record(&info.user_id, applied);
        }

        debug!(%poll_id, ?outcome, "related users added");
        Ok(outcome)
    }

    pub async fn change_available_times(
        &self,
        poll_id: &PollId,
        user_ids: &[String],
        froms: &[DateTime<Utc>],
        tos: &[DateTime<Utc>],
    ) -> AppResult<BatchOutcome> {
        ensure_paired("change_available_times", &[user_ids.len(), froms.len(), tos.len()])?;
        self.ensure_polling(poll_id).await?;

        let mut outcome = BatchOutcome::default();
        for ((user_id, from), to) in user_ids.iter().zip(froms).zip(tos) {
            let applied = self.store.set_available_time(poll_id, user_id, *from, *to).await?;
            outcome.record(user_id, applied);
        }

        debug!(%poll_id, ?outcome, "available times changed");
        Ok(outcome)
    }

    pub async fn change_start_points(
        &self,
        poll_id: &PollId,
        user_ids: &[String],
        points: &[String],
    ) -> AppResult<BatchOutcome> {
        ensure_paired("change_start_points", &[user_ids.len(), points.len()])?;
        self.ensure_polling(poll_id).await?;

        let mut outcome = BatchOutcome::default();
        for (user_id, point) in user_ids.iter().zip(points) {
            let applied = self.store.set_start_point(poll_id, user_id, point).await?;
            outcome.record(user_id, applied);
        }

        debug!(%poll_id, ?outcome, "start points changed");
        Ok(outcome)
    }

    pub async fn delete_users_info(
        &self,
        poll_id: &PollId,
        user_ids: &[String],
    ) -> AppResult<BatchOutcome> {
        let poll = self.get_polling(poll_id).await?;

        let mut outcome = BatchOutcome::default();
        for user_id in user_ids {
            outcome.record(user_id, poll.user_info(user_id).is_some());
        }
        if !outcome.applied.is_empty() {
            self.store.pull_users_info(poll_id, user_ids).await?;
        }

        debug!(%poll_id, ?outcome, "related users removed");
        Ok(outcome)
    }

    async fn ensure_polling(&self, poll_id: &PollId) -> AppResult<()> {
        if self.store.poll_exists(poll_id).await? {
            Ok(())
        } else {
            Err(not_found(poll_id))
        }
    }
}

fn not_found(poll_id: &PollId) -> AppError {
    AppError::NotFound(format!("polling {} does not exist", poll_id))
}

fn ensure_paired(operation: &str, lengths: &[usize]) -> AppResult<()> {
    match lengths.split_first() {
        Some((first, rest)) if rest.iter().any(|len| len != first) => {
            Err(AppError::ValidationError(format!(
                "{} expects argument lists of equal length, got {:?}",
                operation, lengths
            )))
        }
        _ => Ok(()),
    }
}

fn ensure_unique<'a>(keys: impl IntoIterator<Item = &'a str>, what: &str) -> AppResult<()> {
    let mut seen = HashSet::new();
    for key in keys {
        if !seen.insert(key) {
            return Err(AppError::ValidationError(format!("duplicate {}: {}", what, key)));
        }
    }
    Ok(())
}

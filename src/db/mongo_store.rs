use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson, Bson, DateTime as BsonDateTime, Document},
    options::IndexOptions,
    Collection, Database, IndexModel,
};
use tracing::info;

use crate::db::store::{PollStore, UserStore, POLLING_COLLECTION, USER_COLLECTION};
use crate::models::poll_models::{Poll, PollId, PollOption, RelatedUserInfo};
use crate::models::user_models::{PollingList, User};
use crate::utils::error::AppResult;

/// MongoDB adapter for both collections.
#[derive(Clone, Debug)]
pub struct MongoStore {
    pollings: Collection<Poll>,
    users: Collection<User>,
}

impl MongoStore {
    pub fn new(db: &Database) -> Self {
        Self {
            pollings: db.collection::<Poll>(POLLING_COLLECTION),
            users: db.collection::<User>(USER_COLLECTION),
        }
    }

    /// Creates the unique index on `user.userId`, which keeps concurrent upserts
    /// from producing two records for one user.
    pub async fn ensure_indexes(&self) -> AppResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "userId": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        let created = self.users.create_index(index).await?;
        info!(index = %created.index_name, "user index ensured");
        Ok(())
    }
}

fn by_id(poll_id: &PollId) -> Document {
    doc! { "_id": *poll_id }
}

/// Matches the polling only while no element of `array` has `key` equal to `value`.
fn key_absent_filter(poll_id: &PollId, array: &str, key: &str, value: &str) -> Document {
    let mut filter = by_id(poll_id);
    filter.insert(format!("{}.{}", array, key), doc! { "$ne": value });
    filter
}

/// Matches the polling with an element of `array` whose `key` equals `value`,
/// so the positional `$` operator addresses that element.
fn element_filter(poll_id: &PollId, array: &str, key: &str, value: &str) -> Document {
    let mut filter = by_id(poll_id);
    filter.insert(format!("{}.{}", array, key), value);
    filter
}

fn push_update(array: &str, value: Bson) -> Document {
    let mut fields = Document::new();
    fields.insert(array, value);
    doc! { "$push": fields }
}

fn pull_in_update(array: &str, key: &str, values: &[String]) -> Document {
    let mut condition = Document::new();
    condition.insert(key, doc! { "$in": values.to_vec() });
    let mut fields = Document::new();
    fields.insert(array, condition);
    doc! { "$pull": fields }
}

/// Requires `old` present and `new` absent in one filter, so the check and the
/// rename cannot be separated by another writer.
fn rename_option_filter(poll_id: &PollId, old: &str, new: &str) -> Document {
    doc! {
        "_id": *poll_id,
        "$and": [
            { "options.content": old },
            { "options.content": { "$ne": new } }
        ]
    }
}

fn rename_option_update(new: &str) -> Document {
    doc! { "$set": { "options.$[opt].content": new } }
}

fn rename_array_filters(old: &str) -> Vec<Document> {
    vec![doc! { "opt.content": old }]
}

fn available_time_update(from: DateTime<Utc>, to: DateTime<Utc>) -> Document {
    doc! {
        "$set": {
            "relatedUsersInfo.$.availableTimeFrom": BsonDateTime::from_chrono(from),
            "relatedUsersInfo.$.availableTimeTo": BsonDateTime::from_chrono(to)
        }
    }
}

fn new_user_update() -> Document {
    doc! { "$setOnInsert": { "createdPollings": [], "sharedPollings": [] } }
}

fn list_update(operator: &str, list: PollingList, value: Document) -> Document {
    let mut fields = Document::new();
    fields.insert(list.field(), value);
    let mut update = Document::new();
    update.insert(operator, fields);
    update
}

fn add_to_list_update(list: PollingList, poll_ids: &[String]) -> Document {
    list_update("$addToSet", list, doc! { "$each": poll_ids.to_vec() })
}

fn pull_from_list_update(list: PollingList, poll_ids: &[String]) -> Document {
    list_update("$pull", list, doc! { "$in": poll_ids.to_vec() })
}

/// Users whose `list` holds any of the ids.
fn list_holds_any_filter(list: PollingList, poll_ids: &[String]) -> Document {
    let mut filter = Document::new();
    filter.insert(list.field(), doc! { "$in": poll_ids.to_vec() });
    filter
}

#[async_trait]
impl PollStore for MongoStore {
    async fn insert_poll(&self, poll: &Poll) -> AppResult<()> {
        self.pollings.insert_one(poll).await?;
        Ok(())
    }

    async fn find_poll(&self, poll_id: &PollId) -> AppResult<Option<Poll>> {
        Ok(self.pollings.find_one(by_id(poll_id)).await?)
    }

    async fn poll_exists(&self, poll_id: &PollId) -> AppResult<bool> {
        let count = self.pollings.count_documents(by_id(poll_id)).limit(1).await?;
        Ok(count > 0)
    }

    async fn delete_poll(&self, poll_id: &PollId) -> AppResult<bool> {
        let result = self.pollings.delete_one(by_id(poll_id)).await?;
        Ok(result.deleted_count > 0)
    }

    async fn push_option(&self, poll_id: &PollId, option: &PollOption) -> AppResult<bool> {
        let result = self
            .pollings
            .update_one(
                key_absent_filter(poll_id, "options", "content", &option.content),
                push_update("options", to_bson(option)?),
            )
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn rename_option(&self, poll_id: &PollId, old: &str, new: &str) -> AppResult<bool> {
        let result = self
            .pollings
            .update_one(rename_option_filter(poll_id, old, new), rename_option_update(new))
            .array_filters(rename_array_filters(old))
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn pull_options(&self, poll_id: &PollId, contents: &[String]) -> AppResult<bool> {
        let result = self
            .pollings
            .update_one(by_id(poll_id), pull_in_update("options", "content", contents))
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn add_voter(&self, poll_id: &PollId, content: &str, user_id: &str) -> AppResult<bool> {
        let result = self
            .pollings
            .update_one(
                element_filter(poll_id, "options", "content", content),
                doc! { "$addToSet": { "options.$.votedUser": user_id } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn push_user_info(&self, poll_id: &PollId, info: &RelatedUserInfo) -> AppResult<bool> {
        let result = self
            .pollings
            .update_one(
                key_absent_filter(poll_id, "relatedUsersInfo", "userId", &info.user_id),
                push_update("relatedUsersInfo", to_bson(info)?),
            )
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn set_available_time(
        &self,
        poll_id: &PollId,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = self
            .pollings
            .update_one(
                element_filter(poll_id, "relatedUsersInfo", "userId", user_id),
                available_time_update(from, to),
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn set_start_point(
        &self,
        poll_id: &PollId,
        user_id: &str,
        point: &str,
    ) -> AppResult<bool> {
        let result = self
            .pollings
            .update_one(
                element_filter(poll_id, "relatedUsersInfo", "userId", user_id),
                doc! { "$set": { "relatedUsersInfo.$.startPoint": point } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn pull_users_info(&self, poll_id: &PollId, user_ids: &[String]) -> AppResult<bool> {
        let result = self
            .pollings
            .update_one(by_id(poll_id), pull_in_update("relatedUsersInfo", "userId", user_ids))
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn find_polls_by_creator(&self, creator: &str) -> AppResult<Vec<Poll>> {
        let cursor = self.pollings.find(doc! { "creator": creator }).await?;
        let polls: Vec<Poll> = cursor.try_collect().await?;
        Ok(polls)
    }
}

#[async_trait]
impl UserStore for MongoStore {
    async fn find_user(&self, user_id: &str) -> AppResult<Option<User>> {
        Ok(self.users.find_one(doc! { "userId": user_id }).await?)
    }

    async fn user_exists(&self, user_id: &str) -> AppResult<bool> {
        let count = self
            .users
            .count_documents(doc! { "userId": user_id })
            .limit(1)
            .await?;
        Ok(count > 0)
    }

    async fn insert_user_if_absent(&self, user_id: &str) -> AppResult<bool> {
        let result = self
            .users
            .update_one(doc! { "userId": user_id }, new_user_update())
            .upsert(true)
            .await?;
        Ok(result.upserted_id.is_some())
    }

    async fn add_pollings(
        &self,
        user_id: &str,
        list: PollingList,
        poll_ids: &[String],
    ) -> AppResult<bool> {
        let result = self
            .users
            .update_one(doc! { "userId": user_id }, add_to_list_update(list, poll_ids))
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn pull_pollings(
        &self,
        user_id: &str,
        list: PollingList,
        poll_ids: &[String],
    ) -> AppResult<bool> {
        let result = self
            .users
            .update_one(doc! { "userId": user_id }, pull_from_list_update(list, poll_ids))
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn pull_pollings_from_all(
        &self,
        list: PollingList,
        poll_ids: &[String],
    ) -> AppResult<u64> {
        let result = self
            .users
            .update_many(
                list_holds_any_filter(list, poll_ids),
                pull_from_list_update(list, poll_ids),
            )
            .await?;
        Ok(result.modified_count)
    }
}

use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, serde_helpers::chrono_datetime_as_bson_datetime};
use serde::{Deserialize, Serialize};

/// Generated identifier of a polling document.
pub type PollId = ObjectId;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    #[serde(rename = "_id")]
    pub id: PollId,
    pub creator: String,
    pub subject: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub polling_end_time: DateTime<Utc>,
    #[serde(default)]
    pub place_mode: bool,
    #[serde(default)]
    pub multichoice: bool,
    #[serde(default)]
    pub options: Vec<PollOption>,
    #[serde(default)]
    pub related_users_info: Vec<RelatedUserInfo>,
}

impl Poll {
    pub fn option(&self, content: &str) -> Option<&PollOption> {
        self.options.iter().find(|opt| opt.content == content)
    }

    pub fn user_info(&self, user_id: &str) -> Option<&RelatedUserInfo> {
        self.related_users_info.iter().find(|info| info.user_id == user_id)
    }
}

/// A choice within a polling. `content` is unique among the options of one polling.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PollOption {
    pub content: String,
    pub creator: String,
    #[serde(default)]
    pub voted_user: Vec<String>,
}

impl PollOption {
    pub fn new(content: impl Into<String>, creator: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            creator: creator.into(),
            voted_user: Vec::new(),
        }
    }

    /// Drops repeated voters, keeping first occurrences in order.
    pub fn dedup_voters(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.voted_user.retain(|voter| seen.insert(voter.clone()));
    }
}

/// Scheduling metadata of one participant. `user_id` is unique within a polling.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RelatedUserInfo {
    pub user_id: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub available_time_from: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub available_time_to: DateTime<Utc>,
    pub start_point: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewPolling {
    pub subject: String,
    pub polling_end_time: DateTime<Utc>,
    #[serde(default)]
    pub place_mode: bool,
    #[serde(default)]
    pub multichoice: bool,
    #[serde(default)]
    pub options: Vec<PollOption>,
    #[serde(default)]
    pub related_users_info: Vec<RelatedUserInfo>,
}

impl NewPolling {
    pub fn into_poll(self, creator: &str) -> Poll {
        Poll {
            id: ObjectId::new(),
            creator: creator.to_string(),
            subject: self.subject,
            polling_end_time: self.polling_end_time,
            place_mode: self.place_mode,
            multichoice: self.multichoice,
            options: self.options,
            related_users_info: self.related_users_info,
        }
    }
}

/// Keys applied and keys skipped by a multi-item polling mutation.
///
/// Skips cover key conflicts (an option or user entry that already exists)
/// and targets that are absent from the polling.
#[derive(Debug, Serialize, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
}

impl BatchOutcome {
    pub fn record(&mut self, key: impl Into<String>, applied: bool) {
        if applied {
            self.applied.push(key.into());
        } else {
            self.skipped.push(key.into());
        }
    }

    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

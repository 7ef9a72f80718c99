use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    #[serde(default)]
    pub created_pollings: Vec<String>,
    #[serde(default)]
    pub shared_pollings: Vec<String>,
}

impl User {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            id: None,
            user_id: user_id.into(),
            created_pollings: Vec::new(),
            shared_pollings: Vec::new(),
        }
    }

    pub fn pollings_mut(&mut self, list: PollingList) -> &mut Vec<String> {
        match list {
            PollingList::Created => &mut self.created_pollings,
            PollingList::Shared => &mut self.shared_pollings,
        }
    }
}

/// One of the two polling reference sets kept on a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollingList {
    Created,
    Shared,
}

impl PollingList {
    pub fn field(self) -> &'static str {
        match self {
            PollingList::Created => "createdPollings",
            PollingList::Shared => "sharedPollings",
        }
    }
}

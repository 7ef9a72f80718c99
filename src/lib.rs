//! Data access for a group-polling application.
//!
//! [`PollRepository`](repositories::poll_repository::PollRepository) manages
//! `polling` documents: options, votes and per-user scheduling details.
//! [`UserRepository`](repositories::user_repository::UserRepository) manages
//! `user` documents and the sets of pollings each user created or was shared
//! into. Creating and deleting a polling keep those sets in step.

pub mod db;
pub mod models;
pub mod repositories;
pub mod state;
pub mod utils;

pub use models::poll_models::{BatchOutcome, NewPolling, Poll, PollId, PollOption, RelatedUserInfo};
pub use models::user_models::{PollingList, User};
pub use state::AppState;
pub use utils::error::{AppError, AppResult};

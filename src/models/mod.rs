pub mod poll_models;
pub mod user_models;

pub mod poll_repository;
pub mod user_repository;

pub mod notification_repository;
pub mod token_verifier;
pub mod user_repository;

pub mod auth;
pub mod http;
pub mod observability;
pub mod persistence;
pub mod realtime;

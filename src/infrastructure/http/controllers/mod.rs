pub mod notification_socket;
pub mod notifications;

pub mod connection;
pub mod hub;
pub mod registry;

pub use connection::*;
pub use hub::*;
pub use registry::*;

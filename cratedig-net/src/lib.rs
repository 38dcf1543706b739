pub mod catalog;
pub mod channel;
pub mod error;

pub use catalog::{CatalogClient, CatalogSource};
pub use channel::{ConnectionStatus, NetworkChannel};
pub use error::NetError;

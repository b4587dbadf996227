//! Transport adapter + glue (Component K, §6).

pub mod gateway;
pub mod http;
pub mod transport;

pub use transport::{Transport, TransportError};

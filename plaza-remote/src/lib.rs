pub mod client;
pub mod http;
pub mod ids;
#[cfg(feature = "memory")]
pub mod memory;
pub mod platform;
pub(crate) mod record;

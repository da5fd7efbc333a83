pub mod components;
pub mod config;
pub mod error;
#[cfg(feature = "web-interface")]
pub mod handlers;
pub mod utils;

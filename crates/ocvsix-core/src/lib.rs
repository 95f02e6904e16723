pub mod config;
pub mod logging;

pub mod controller;
pub mod dom;
pub mod error;
pub mod http;
pub mod identifier;
pub mod marketplace;
pub mod notify;
pub mod page;
pub mod pipeline;
pub mod retriever;
pub mod watcher;

pub use error::{Error, Result};

pub mod client;
pub mod core;

pub use crate::client::{ChatClient, ErrorRecord};
pub use crate::core::{config::ChatConfig, errors::ChatError, types::*};

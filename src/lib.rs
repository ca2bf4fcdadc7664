//! Fuzzy search and an input-bound autocomplete controller.

#[macro_use]
mod utils;
pub mod autocomplete;
pub mod cli;
pub mod dom;
pub mod error;
pub mod fuzzy;
pub mod prompt;
pub mod request;
pub mod runtime;
pub mod script;

pub use utils::{LogStatus, ResultExt};

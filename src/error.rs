use thisctx::WithContext;
use thiserror::Error;

use crate::script::ScriptDiagnostic;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, WithContext)]
#[thisctx(pub, suffix(false))]
pub enum Error {
    #[error("IO failed at '{1}'")]
    Io(#[source] std::io::Error, String),
    #[error("Invalid script")]
    Script(#[source] Box<ScriptDiagnostic>),
    #[error("Failed when prompting")]
    Prompt(#[source] inquire::InquireError),
    #[error("Failed when writing output")]
    Output(#[source] std::io::Error),
    #[error("Invalid input")]
    InvalidInput,
    #[error("Operation was interrupted by the user")]
    Interrupted,
}

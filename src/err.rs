use thiserror::Error;

#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum CapsErr {
    /// The capability grammar did not account for the whole input.
    /// Covers both a grammar mismatch and unconsumed trailing text; the
    /// two are reported identically and both leave the capability set
    /// empty.
    #[error("parse failed, stopped at '{stopped}' of '{input}'")]
    Parse { stopped: String, input: String },
}

impl CapsErr {
    pub fn parse<S, I>(stopped: S, input: I) -> Self
    where
        S: ToString,
        I: ToString,
    {
        Self::Parse {
            stopped: stopped.to_string(),
            input: input.to_string(),
        }
    }
}

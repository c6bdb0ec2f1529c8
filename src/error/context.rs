//! Error context and chaining utilities
//!
//! Statement failures travel through several layers (provider, coordinator,
//! adapter). These helpers attach the statement being processed to an error
//! and walk the chain back to the driver-level cause.

use super::Error;
use std::fmt;

/// Trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to the error
    fn context<C>(self, context: C) -> Result<T, Error>
    where
        C: Into<String>;

    /// Add context with lazy evaluation
    fn with_context<C, F>(self, f: F) -> Result<T, Error>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T> ErrorContext<T> for Result<T, Error> {
    fn context<C>(self, context: C) -> Result<T, Error>
    where
        C: Into<String>,
    {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, Error>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

/// Flattened view of a nested error
pub struct ErrorChain<'a> {
    error: &'a Error,
    chain: Vec<String>,
}

impl<'a> ErrorChain<'a> {
    pub fn new(error: &'a Error) -> Self {
        let mut chain = Vec::new();
        let mut current = error;
        loop {
            match current {
                Error::WithContext { message, source } => {
                    chain.push(message.clone());
                    current = source.as_ref();
                }
                Error::NotExecutable(source) => {
                    chain.push("Request not executable".to_string());
                    current = source.as_ref();
                }
                other => {
                    chain.push(other.to_string());
                    break;
                }
            }
        }
        Self { error, chain }
    }

    pub fn chain(&self) -> &[String] {
        &self.chain
    }

    /// The innermost error, past any context or fatal wrapper
    pub fn root_cause(&self) -> &Error {
        let mut current = self.error;
        loop {
            match current {
                Error::WithContext { source, .. } | Error::NotExecutable(source) => {
                    current = source.as_ref()
                }
                other => return other,
            }
        }
    }

    pub fn format_for_log(&self) -> String {
        self.chain.join(" -> ")
    }
}

impl fmt::Display for ErrorChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_for_log())
    }
}

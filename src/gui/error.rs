//! Errors that can end a dashboard run.

use std::{error::Error, fmt::Display};

use crate::{config::ConfigError, transport::TransportError};

/// Everything that can make the terminal front end give up.
#[derive(Debug)]
pub enum DashGuiError {
    /// The terminal could not be set up, drawn to or read from.
    IOError(std::io::Error),
    /// No link could be opened.
    Transport(TransportError),
    /// The settings were unusable.
    Config(ConfigError),
}

impl Display for DashGuiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DashGuiError::IOError(e) => write!(f, "terminal error: {}", e),
            DashGuiError::Transport(e) => write!(f, "{}", e),
            DashGuiError::Config(e) => write!(f, "{}", e),
        }
    }
}

impl Error for DashGuiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DashGuiError::IOError(e) => Some(e),
            DashGuiError::Transport(e) => Some(e),
            DashGuiError::Config(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for DashGuiError {
    fn from(value: std::io::Error) -> Self {
        Self::IOError(value)
    }
}

impl From<TransportError> for DashGuiError {
    fn from(value: TransportError) -> Self {
        Self::Transport(value)
    }
}

impl From<ConfigError> for DashGuiError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

//! Error types for flow element operations.

use hn_core::error::HnError;
use thiserror::Error;

/// Errors that can occur when building or evaluating flow elements.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    #[error("Non-physical value: {what}")]
    NonPhysical { what: &'static str },

    #[error("Not supported: {what}")]
    NotSupported { what: &'static str },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}

pub type ComponentResult<T> = Result<T, ComponentError>;

impl From<ComponentError> for HnError {
    fn from(e: ComponentError) -> Self {
        match e {
            ComponentError::NonPhysical { what } => HnError::InvalidArg { what },
            ComponentError::NotSupported { what } => HnError::InvalidArg { what },
            ComponentError::InvalidArg { what } => HnError::InvalidArg { what },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ComponentError::NonPhysical { what: "resistance" };
        assert!(err.to_string().contains("resistance"));
    }

    #[test]
    fn error_conversion() {
        let comp_err = ComponentError::InvalidArg { what: "test" };
        let hn_err: HnError = comp_err.into();
        assert!(matches!(hn_err, HnError::InvalidArg { .. }));
    }
}

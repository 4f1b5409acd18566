/// Errors reported by the service registry.
///
/// Registration conflicts and resolution misses are configuration errors:
/// bootstrap code is expected to surface them immediately rather than retry.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A registration already exists under the derived key.
    #[error("a service is already registered under '{key}'")]
    DuplicateRegistration { key: String },

    /// Neither the identifier nor the requested type matched a registration.
    #[error("no service registered for {type_name}{}", identifier_suffix(.identifier))]
    NotFound {
        type_name: &'static str,
        identifier: Option<String>,
    },

    /// Raised by factory constructors when the parameter bundle is missing
    /// or does not carry what the factory needs.
    #[error("insufficient parameters: {reason}")]
    InsufficientParameters { reason: String },

    /// An identifier matched, but the registered value cannot be produced
    /// as the requested type.
    #[error("service '{key}' cannot be resolved as {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
    },

    /// A type-only lookup matched more than one capability provider.
    #[error("{type_name} is provided by several registrations: {}", .candidates.join(", "))]
    AmbiguousResolution {
        type_name: &'static str,
        candidates: Vec<String>,
    },

    /// A factory constructor failed for a reason of its own.
    #[error("failed to construct '{key}': {message}")]
    Construction { key: String, message: String },
}

fn identifier_suffix(identifier: &Option<String>) -> String {
    match identifier {
        Some(id) => format!(" (identifier '{}')", id),
        None => String::new(),
    }
}

impl RegistryError {
    /// Wraps a domain error raised inside a factory constructor.
    pub fn construction(key: impl Into<String>, err: impl std::fmt::Display) -> Self {
        RegistryError::Construction {
            key: key.into(),
            message: err.to_string(),
        }
    }
}

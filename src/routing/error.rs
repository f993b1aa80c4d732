//! Route registration errors.
//!
//! These are startup-time authoring mistakes; they never occur while serving.

use thiserror::Error;

/// Why a route or handler could not be registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// Template segment is not a literal or a well-formed `{name}`.
    #[error("invalid route template {template:?}: {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// Two templates name the same wildcard position differently.
    #[error("route {template:?} names parameter `{requested}` where `{existing}` is already registered")]
    WildcardConflict {
        template: String,
        existing: String,
        requested: String,
    },

    /// Two handler parameters share a name.
    #[error("parameter `{0}` declared more than once")]
    DuplicateParameter(String),

    /// More than one body-model slot.
    #[error("handler declares more than one body model (`{first}`, `{second}`)")]
    MultipleBodyModels { first: String, second: String },

    /// More than one headers slot.
    #[error("handler declares more than one headers slot (`{first}`, `{second}`)")]
    MultipleHeaderSlots { first: String, second: String },

    /// A path parameter the template does not capture.
    #[error("path parameter `{param}` does not appear in route {template:?}")]
    UnknownPathParameter { template: String, param: String },
}

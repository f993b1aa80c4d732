//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Registration (at startup):
//!     Router::get/post/put(template, params, handler)
//!     → handler.rs (validate parameter schema)
//!     → trie.rs (insert; wildcard names checked)
//!     → Router::into_dispatcher() freezes the table
//!
//! Per request:
//!     dispatcher.rs (method check)
//!     → trie.rs (search: literal first, then wildcard)
//!     → model.rs (body-model validation) + headers + path params
//!     → Handler call → Response
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same input always matches same route
//! - Explicit not-found rather than silent default

pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod model;
pub mod router;
pub mod trie;

pub use dispatcher::Dispatcher;
pub use error::RegistrationError;
pub use handler::{Argument, Arguments, Handler, HandlerRef, Param, ParamKind, ParamSchema};
pub use model::{BodyModel, BodySchema, FieldKind, FieldSpec, ModelError};
pub use router::Router;
pub use trie::{RouteMatch, RouteTrie};

//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (lifecycle tracking, bounded request read)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Bounded accept prevents resource exhaustion
//! - Each connection tracked for graceful shutdown
//! - One request per connection; the connection closes after the response

pub mod connection;
pub mod listener;

pub use connection::{read_request, ConnectionId, ConnectionTracker};
pub use listener::{Listener, ListenerError};

//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! server / net / routing produce:
//!     → logging.rs (structured log events, request spans)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Every connection runs inside a span with connection and request IDs
//! - Metrics are cheap and disabled unless configured

pub mod logging;
pub mod metrics;

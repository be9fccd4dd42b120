//! WITH agent library: the service-facing half of the escalation workflow.
//!
//! - `transport`: JSON-over-HTTP exchange (`Transport` trait, reqwest impl)
//! - `classifier` / `responder`: typed wrappers for `/classify` and `/respond`
//! - `session`: async driver running the escalation machine's effects
//! - `config`: endpoint configuration (TOML file + env overrides)

pub mod classifier;
pub mod config;
pub mod health;
pub mod responder;
pub mod session;
pub mod transport;

pub use classifier::ClassifierClient;
pub use config::ServiceConfig;
pub use health::check_health;
pub use responder::ResponderClient;
pub use session::{submit_shared, EscalationSession, SessionError, SharedSession};
pub use transport::{HttpTransport, Transport, TransportError};

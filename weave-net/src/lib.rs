//! Per-peer TCP sessions (spec §4.6): the state machine and I/O primitives
//! for one connection ([`session`]), the per-peer request/response driver
//! task ([`driver`]), the table of currently-driven peers ([`registry`]),
//! and the accept-side server answering `sync_request`/`push`
//! ([`server`]). `weave-discovery` decides *who* to talk to; this crate
//! is entirely about *how* to talk to them once decided.

mod driver;
mod error;
mod registry;
mod server;
mod session;

pub use driver::{spawn_session_driver, DriverConfig, SessionHandle, SharedCrdtState};
pub use error::SessionError;
pub use registry::SessionRegistry;
pub use server::run_session_server;
pub use session::{PeerSession, SessionState};

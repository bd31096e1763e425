//! Command-line configuration for one replica process. Field shape and
//! `clap::Parser` usage mirror `privstack-relay`'s `Args`, generalized
//! from a relay's port/identity-file pair to the grid dimensions and
//! rendezvous ports this replica needs (spec §6), with every §4.5/§4.6
//! interval exposed as an override point (and an `env` fallback, as
//! `weave-types`' other CLI-adjacent fields don't need but this one's
//! tuning knobs benefit from when run under a process supervisor).

use std::time::Duration;

use clap::Parser;
use weave_types::DEFAULT_BASE_PORT;

#[derive(Parser, Debug, Clone)]
#[command(name = "weave-node")]
#[command(about = "Peer-to-peer crossword and chat replica")]
pub struct ReplicaConfig {
    /// Display name announced to other peers on the LAN.
    #[arg(short, long, env = "WEAVE_DISPLAY_NAME", default_value = "anonymous")]
    pub display_name: String,

    /// Free-form tag identifying this device in logs (e.g. "laptop",
    /// "desk"), purely cosmetic — never sent on the wire.
    #[arg(long, env = "WEAVE_DEVICE_TAG", default_value = "")]
    pub device_tag: String,

    /// Base port; discovery and identification ports are derived from it
    /// (spec §6). The sync service itself listens on this port directly.
    #[arg(short, long, env = "WEAVE_BASE_PORT", default_value_t = DEFAULT_BASE_PORT)]
    pub base_port: u16,

    /// Grid row count.
    #[arg(long, default_value_t = 15)]
    pub rows: usize,

    /// Grid column count.
    #[arg(long, default_value_t = 15)]
    pub cols: usize,

    /// Seconds between UDP discovery broadcasts (spec §4.5).
    #[arg(long, env = "WEAVE_BROADCAST_INTERVAL_SECS", default_value_t = 10)]
    pub broadcast_interval_secs: u64,

    /// Seconds between TCP /24 sweep passes (spec §4.5).
    #[arg(long, env = "WEAVE_SWEEP_INTERVAL_SECS", default_value_t = 30)]
    pub sweep_interval_secs: u64,

    /// Seconds before an unresponsive peer is reaped (spec §4.5).
    #[arg(long, env = "WEAVE_LIVENESS_TIMEOUT_SECS", default_value_t = 30)]
    pub liveness_timeout_secs: u64,

    /// Seconds between peer-session sync ticks (spec §4.6).
    #[arg(long, env = "WEAVE_SYNC_PERIOD_SECS", default_value_t = 3)]
    pub sync_period_secs: u64,

    /// Seconds allowed for a single TCP connect attempt (spec §4.5/§4.6).
    #[arg(long, env = "WEAVE_CONNECT_TIMEOUT_SECS", default_value_t = 2)]
    pub connect_timeout_secs: u64,

    /// Seconds allowed for one full sweep pass before it's cut short
    /// (spec §4.5, §9 redesign note on bounded fan-out).
    #[arg(long, env = "WEAVE_SWEEP_BUDGET_SECS", default_value_t = 10)]
    pub sweep_budget_secs: u64,

    /// Enable verbose debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl ReplicaConfig {
    #[must_use]
    pub fn service_addr(&self) -> std::net::SocketAddr {
        std::net::SocketAddr::from(([0, 0, 0, 0], self.base_port))
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub fn sync_period(&self) -> Duration {
        Duration::from_secs(self.sync_period_secs)
    }
}

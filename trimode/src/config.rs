//! Configuration for the mode pipeline and the 2.4G link
//!
//! Defaults come from `constants.rs`, which `build.rs` generates from `trimode.toml`
//! (or built-in values when no file is present). Each runtime config type implements
//! [`ModeConfig`] so boards that override fields can check them before use.

use embassy_time::Duration;

use crate::state::TransportKind;

mod constants {
    include!(concat!(env!("OUT_DIR"), "/constants.rs"));
}

pub use constants::{LINK_EVENT_QUEUE_SIZE, MODE_EVENT_QUEUE_SIZE};
use constants::*;

/// Common trait for runtime configurations
///
/// # Example
///
/// ```no_run
/// use trimode::config::{ModeConfig, LinkConfig};
///
/// let config = LinkConfig::default();
/// assert!(config.validate());
/// ```
pub trait ModeConfig {
    /// Returns `true` if all parameters are within valid ranges.
    fn validate(&self) -> bool;

    /// Get a human-readable description of the configuration
    fn description(&self) -> &'static str {
        "Mode configuration"
    }
}

/// Confirmation threshold and wait budget for one transition direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineThresholds {
    /// Consecutive agreeing samples needed to confirm the transition
    pub confirm_samples: u8,

    /// Ticks after which an unconfirmed attempt is abandoned
    pub max_ticks: u8,
}

/// Debounce parameters for the wired-present line
///
/// With the defaults an insertion is confirmed after 5 samples (250 ms) and a removal
/// after 6 samples (300 ms); attempts are abandoned after 2 s and 3 s respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceConfig {
    /// Sampling period
    pub tick: Duration,

    /// Line moving to its active level
    pub insert: LineThresholds,

    /// Line moving to its inactive level
    pub remove: LineThresholds,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(DEBOUNCE_TICK_MS),
            insert: LineThresholds {
                confirm_samples: INSERT_CONFIRM_SAMPLES,
                max_ticks: INSERT_MAX_TICKS,
            },
            remove: LineThresholds {
                confirm_samples: REMOVE_CONFIRM_SAMPLES,
                max_ticks: REMOVE_MAX_TICKS,
            },
        }
    }
}

impl ModeConfig for DebounceConfig {
    fn validate(&self) -> bool {
        self.tick.as_ticks() > 0
            && self.insert.confirm_samples > 0
            && self.insert.confirm_samples <= self.insert.max_ticks
            && self.remove.confirm_samples > 0
            && self.remove.confirm_samples <= self.remove.max_ticks
    }

    fn description(&self) -> &'static str {
        "Wired-present line debounce"
    }
}

/// Parameters of the proprietary 2.4G link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
    /// Connection interval in microseconds
    pub connect_interval_us: u32,

    /// Heartbeat interval in microseconds
    pub heartbeat_interval_us: u32,

    /// Transmit power in dBm
    ///
    /// Range: -20..=8
    pub tx_power_dbm: i8,

    /// Send queue quota per message type, in [`MsgKind::index`](crate::link::MsgKind::index) order
    pub msg_quota: [u8; 4],

    /// Pairing retries before falling back to idle
    pub pair_attempts_max: u8,

    /// Reconnect attempts before falling back to idle
    pub reconnect_attempts_max: u8,

    /// How long a freshly reconnected link may stay silent before it's dropped
    pub no_activity_timeout: Duration,

    /// The no-activity timer is only armed when the link came up within this many
    /// reconnect attempts. Tunable heuristic for catching stray wake-ups.
    pub no_activity_reconnect_threshold: u8,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            connect_interval_us: CONNECT_INTERVAL_US,
            heartbeat_interval_us: HEARTBEAT_INTERVAL_US,
            tx_power_dbm: TX_POWER_DBM,
            msg_quota: [0, 2, 2, 2],
            pair_attempts_max: PAIR_ATTEMPTS_MAX,
            reconnect_attempts_max: RECONNECT_ATTEMPTS_MAX,
            no_activity_timeout: Duration::from_millis(NO_ACTIVITY_TIMEOUT_MS),
            no_activity_reconnect_threshold: NO_ACTIVITY_RECONNECT_THRESHOLD,
        }
    }
}

impl ModeConfig for LinkConfig {
    fn validate(&self) -> bool {
        self.connect_interval_us > 0
            && self.heartbeat_interval_us >= self.connect_interval_us
            && (-20..=8).contains(&self.tx_power_dbm)
            && self.pair_attempts_max > 0
            && self.reconnect_attempts_max > 0
            && self.no_activity_timeout.as_ticks() > 0
    }

    fn description(&self) -> &'static str {
        "Proprietary 2.4G link"
    }
}

/// Number of selectable report rate levels
pub const REPORT_RATE_LEVELS: usize = 3;

/// Report intervals per transport, in microseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRateTable {
    pub usb_us: [u32; REPORT_RATE_LEVELS],
    pub ppt_us: [u32; REPORT_RATE_LEVELS],
}

impl Default for ReportRateTable {
    fn default() -> Self {
        Self {
            usb_us: [2000, 4000, 8000],
            ppt_us: [1000, 2000, 4000],
        }
    }
}

impl ReportRateTable {
    /// Report interval for `transport` at `level`.
    ///
    /// BLE report timing is owned by the BLE stack, so it has no entry.
    pub fn interval_us(&self, transport: TransportKind, level: usize) -> Option<u32> {
        match transport {
            TransportKind::Wired => self.usb_us.get(level).copied(),
            TransportKind::Proprietary => self.ppt_us.get(level).copied(),
            TransportKind::ShortRange => None,
        }
    }
}

impl ModeConfig for ReportRateTable {
    fn validate(&self) -> bool {
        self.usb_us.iter().chain(self.ppt_us.iter()).all(|us| *us > 0)
    }

    fn description(&self) -> &'static str {
        "Report rate levels"
    }
}

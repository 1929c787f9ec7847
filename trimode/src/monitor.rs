//! Mode selector and host-OS lines
//!
//! The BLE and 2.4G selector lines come from a slide switch and are level triggered:
//! every level change flips the watched level and yields one [`ModeEvent`]. The OS line
//! works the same way but publishes a [`HostOs`] instead.

use embassy_time::{Duration, Timer};
use embedded_hal::digital::{Error as _, PinState};
use embedded_hal_async::digital::Wait;

use crate::event::{ModeBus, ModeEvent};
use crate::state::{HostOs, TransportKind};

/// Back-off after a failed pin wait
const PIN_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Level-triggered transport selector line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SwitchLine {
    kind: TransportKind,
    active_level: PinState,
    active: bool,
}

impl SwitchLine {
    /// Create a selector line that currently reads `initial_level`
    pub fn new(kind: TransportKind, active_level: PinState, initial_level: PinState) -> Self {
        Self {
            kind,
            active_level,
            active: initial_level == active_level,
        }
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The level the line is watched for next
    pub fn watched_level(&self) -> PinState {
        if self.active { !self.active_level } else { self.active_level }
    }

    /// Handle the line reaching `level`. Returns an event only when the selection changes.
    pub fn on_level(&mut self, level: PinState) -> Option<ModeEvent> {
        let active = level == self.active_level;
        if active == self.active {
            return None;
        }
        self.active = active;
        debug!("{:?} selector {}", self.kind, if active { "on" } else { "off" });
        Some(ModeEvent::new(self.kind, active))
    }

    /// Watch `pin` forever, pushing selection changes onto `bus`
    pub async fn run<P: Wait>(&mut self, pin: &mut P, bus: &ModeBus) -> ! {
        loop {
            let level = self.watched_level();
            let waited = match level {
                PinState::High => pin.wait_for_high().await,
                PinState::Low => pin.wait_for_low().await,
            };
            match waited {
                Ok(()) => {
                    if let Some(event) = self.on_level(level) {
                        bus.push_mode_event(event);
                    }
                }
                Err(e) => {
                    error!("Failed to wait for {:?} selector: {:?}", self.kind, e.kind());
                    Timer::after(PIN_ERROR_BACKOFF).await;
                }
            }
        }
    }
}

/// Host OS selector line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HostOsLine {
    windows_level: PinState,
    current: HostOs,
}

impl HostOsLine {
    pub fn new(windows_level: PinState, initial_level: PinState) -> Self {
        Self {
            windows_level,
            current: HostOs::from_level(initial_level, windows_level),
        }
    }

    pub fn current(&self) -> HostOs {
        self.current
    }

    /// Handle the line reaching `level`. Returns the new OS only when it changes.
    pub fn on_level(&mut self, level: PinState) -> Option<HostOs> {
        let os = HostOs::from_level(level, self.windows_level);
        if os == self.current {
            return None;
        }
        self.current = os;
        Some(os)
    }

    /// Watch `pin` forever, publishing OS changes onto `bus`
    pub async fn run<P: Wait>(&mut self, pin: &mut P, bus: &ModeBus) -> ! {
        loop {
            let level = match self.current {
                HostOs::Windows => !self.windows_level,
                HostOs::Mac => self.windows_level,
            };
            let waited = match level {
                PinState::High => pin.wait_for_high().await,
                PinState::Low => pin.wait_for_low().await,
            };
            match waited {
                Ok(()) => {
                    if let Some(os) = self.on_level(level) {
                        bus.publish_host_os(os);
                    }
                }
                Err(e) => {
                    error!("Failed to wait for OS selector: {:?}", e.kind());
                    Timer::after(PIN_ERROR_BACKOFF).await;
                }
            }
        }
    }
}

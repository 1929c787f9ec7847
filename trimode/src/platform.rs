//! Collaborator interfaces the mode arbiter calls into
//!
//! The USB and BLE stacks, the LEDs and the reset path live outside this crate. Boards
//! provide one value implementing [`TransportControl`], [`SystemReset`] and
//! [`Indicator`]; the blanket [`Platform`] impl ties them together.

use core::fmt;

use crate::state::{HostOs, TransportKind};

/// Errors reported by transport stacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// The stack failed to come up
    InitFailed,

    /// The stack failed to shut down
    DeinitFailed,

    /// The underlying peripheral is not ready
    NotReady,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitFailed => write!(f, "Transport init failed"),
            Self::DeinitFailed => write!(f, "Transport deinit failed"),
            Self::NotReady => write!(f, "Transport not ready"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TransportError {}

/// Lifecycle of the wired and short-range transports
///
/// Failures are logged by the caller and never retried.
pub trait TransportControl {
    fn init_wired(&mut self) -> Result<(), TransportError>;

    fn deinit_wired(&mut self) -> Result<(), TransportError>;

    fn init_short_range(&mut self) -> Result<(), TransportError>;

    fn deinit_short_range(&mut self) -> Result<(), TransportError>;
}

/// Why the device is resetting itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ResetReason {
    /// The wired transport was removed while no radio was selected
    WiredLost = 0x01,

    /// The short-range radio was deselected while wired was not enumerated
    ShortRangeLost = 0x02,
}

impl ResetReason {
    /// Reason code handed to the reset collaborator
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// Full system reset
pub trait SystemReset {
    /// Reset the whole device.
    ///
    /// Hardware implementations never return. Test doubles may return, and the arbiter
    /// stops processing once it has requested a reset.
    fn system_reset(&mut self, reason: ResetReason);
}

/// Fire-and-forget notifications for LEDs and the OS keymap layer
pub trait Indicator {
    fn transport_changed(&mut self, _kind: TransportKind, _active: bool) {}

    fn host_os_changed(&mut self, _os: HostOs) {}
}

/// Everything the arbiter needs from the board
pub trait Platform: TransportControl + SystemReset + Indicator {}

impl<T: TransportControl + SystemReset + Indicator> Platform for T {}

/// Reset through the Cortex-M system control block
#[cfg(all(target_arch = "arm", target_os = "none"))]
pub struct CortexMReset;

#[cfg(all(target_arch = "arm", target_os = "none"))]
impl SystemReset for CortexMReset {
    fn system_reset(&mut self, reason: ResetReason) {
        error!("System reset, reason {} ({})", reason.name(), reason.code());
        cortex_m::peripheral::SCB::sys_reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_reason_code() {
        assert_eq!(ResetReason::WiredLost.code(), 1);
        assert_eq!(ResetReason::ShortRangeLost.code(), 2);
        assert_eq!(ResetReason::WiredLost.name(), "WiredLost");
    }
}

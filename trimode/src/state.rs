//! Mode state, global flags and the transport vocabulary shared by every stage of the
//! pipeline.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use bitfield_struct::bitfield;
use embedded_hal::digital::PinState;

/// The three mutually arbitrated transports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportKind {
    /// USB
    Wired,
    /// BLE, paired with the host directly
    ShortRange,
    /// Proprietary 2.4G link to a dongle
    Proprietary,
}

/// Host operating system, selected by the OS switch line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostOs {
    Windows,
    Mac,
}

impl HostOs {
    /// Map a sampled OS line level, `windows_level` being the level that selects Windows.
    pub fn from_level(level: PinState, windows_level: PinState) -> Self {
        if level == windows_level { HostOs::Windows } else { HostOs::Mac }
    }
}

/// Transport flags and host OS, as seen by the mode arbiter.
///
/// Packed into one byte so that the snapshot handed to startup sequencing is a plain
/// `u8` (`into_bits`/`from_bits`).
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct ModeState {
    pub wired_active: bool,
    pub short_range_active: bool,
    pub proprietary_active: bool,
    pub host_is_windows: bool,
    pub host_is_mac: bool,
    #[bits(3)]
    __: u8,
}

impl ModeState {
    /// Whether either radio transport is selected
    pub fn radio_active(&self) -> bool {
        self.short_range_active() || self.proprietary_active()
    }

    /// Whether no transport at all is selected
    pub fn no_transport(&self) -> bool {
        !self.wired_active() && !self.radio_active()
    }

    /// Whether `kind` is currently flagged active
    pub fn is_active(&self, kind: TransportKind) -> bool {
        match kind {
            TransportKind::Wired => self.wired_active(),
            TransportKind::ShortRange => self.short_range_active(),
            TransportKind::Proprietary => self.proprietary_active(),
        }
    }

    pub(crate) fn set_active(&mut self, kind: TransportKind, active: bool) {
        match kind {
            TransportKind::Wired => self.set_wired_active(active),
            TransportKind::ShortRange => self.set_short_range_active(active),
            TransportKind::Proprietary => self.set_proprietary_active(active),
        }
    }

    /// The host OS, if one has been selected
    pub fn host_os(&self) -> Option<HostOs> {
        if self.host_is_windows() {
            Some(HostOs::Windows)
        } else if self.host_is_mac() {
            Some(HostOs::Mac)
        } else {
            None
        }
    }

    /// Select the host OS. The two host flags never hold at the same time.
    pub(crate) fn set_host_os(&mut self, os: HostOs) {
        self.set_host_is_windows(os == HostOs::Windows);
        self.set_host_is_mac(os == HostOs::Mac);
    }
}

/// Cross-cutting flags shared between timer context and the consumer task.
pub struct GlobalFlags {
    dlps_enabled: AtomicBool,
    wired_pending: AtomicBool,
    wired_enumerated: AtomicBool,
    debounce_attempts: AtomicU8,
}

impl GlobalFlags {
    pub const fn new() -> Self {
        Self {
            dlps_enabled: AtomicBool::new(true),
            wired_pending: AtomicBool::new(false),
            wired_enumerated: AtomicBool::new(false),
            debounce_attempts: AtomicU8::new(0),
        }
    }

    /// Whether the device may enter DLPS, its deepest idle state.
    ///
    /// Power management should poll this before entering DLPS.
    pub fn dlps_enabled(&self) -> bool {
        self.dlps_enabled.load(Ordering::Acquire)
    }

    pub(crate) fn set_dlps_enabled(&self, enabled: bool) {
        self.dlps_enabled.store(enabled, Ordering::Release);
    }

    /// Whether a wired insert/remove debounce is in flight
    pub fn wired_pending(&self) -> bool {
        self.wired_pending.load(Ordering::Acquire)
    }

    pub(crate) fn set_wired_pending(&self, pending: bool) {
        self.wired_pending.store(pending, Ordering::Release);
    }

    /// Whether any line has a debounce attempt outstanding
    pub fn debounce_in_flight(&self) -> bool {
        self.debounce_attempts.load(Ordering::Acquire) > 0
    }

    /// A line armed a debounce attempt. DLPS stays off until every attempt has resolved.
    pub(crate) fn begin_debounce(&self) {
        critical_section::with(|_| {
            let attempts = self.debounce_attempts.load(Ordering::Relaxed);
            self.debounce_attempts.store(attempts.saturating_add(1), Ordering::Release);
            self.set_dlps_enabled(false);
        });
    }

    /// A line resolved its debounce attempt
    pub(crate) fn end_debounce(&self) {
        critical_section::with(|_| {
            let attempts = self.debounce_attempts.load(Ordering::Relaxed).saturating_sub(1);
            self.debounce_attempts.store(attempts, Ordering::Release);
            if attempts == 0 {
                self.set_dlps_enabled(true);
            }
        });
    }

    /// Clear the wired gate and restore DLPS once a wired event has been applied.
    ///
    /// Does nothing while another attempt is being sampled, since that attempt owns both
    /// flags until it resolves. Returns whether the flags were restored.
    pub(crate) fn settle_wired(&self) -> bool {
        critical_section::with(|_| {
            if self.debounce_attempts.load(Ordering::Acquire) > 0 {
                return false;
            }
            self.set_wired_pending(false);
            self.set_dlps_enabled(true);
            true
        })
    }

    /// Whether the USB host finished enumerating the device
    pub fn wired_enumerated(&self) -> bool {
        self.wired_enumerated.load(Ordering::Acquire)
    }

    /// Called by the USB stack once the host has configured the device.
    pub fn set_wired_enumerated(&self, enumerated: bool) {
        self.wired_enumerated.store(enumerated, Ordering::Release);
    }
}

impl Default for GlobalFlags {
    fn default() -> Self {
        Self::new()
    }
}

/// Where HID reports are routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Endpoint {
    Usb,
    Ble { profile_index: u8 },
    Ppt,
}

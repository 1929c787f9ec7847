//! The mode arbiter
//!
//! [`ModeArbiter`] is the single consumer of the [`ModeBus`] and the only writer of
//! [`ModeState`]. Each pass drains the mode event queue in arrival order, then the link
//! event queue, applying the transition rules:
//!
//! | Event | Action |
//! |---|---|
//! | Wired on | init wired; clear the wired-pending flag and restore DLPS unless the line is debouncing again |
//! | Wired off | deinit wired; reset unless a radio is selected |
//! | Short-range on | init short-range, unless wired is up and enumerated |
//! | Short-range off | deinit short-range; reset unless wired is up and enumerated |
//! | Proprietary on | start the 2.4G link |
//! | Proprietary off | nothing |
//!
//! Once a reset has been requested the arbiter stops processing.

use embassy_futures::select::select;
use embassy_time::{Instant, Timer};

use crate::config::LinkConfig;
use crate::event::{ModeBus, ModeEvent};
use crate::link::{LinkService, LinkStateMachine};
use crate::platform::{Platform, ResetReason};
use crate::state::{Endpoint, GlobalFlags, HostOs, ModeState, TransportKind};

pub struct ModeArbiter<'a, P: Platform, L: LinkService> {
    state: ModeState,
    flags: &'a GlobalFlags,
    bus: &'a ModeBus,
    platform: P,
    link: LinkStateMachine<'a, L>,
    ble_profile: u8,
    reset_issued: bool,
}

impl<'a, P: Platform, L: LinkService> ModeArbiter<'a, P, L> {
    pub fn new(platform: P, service: L, link_config: LinkConfig, flags: &'a GlobalFlags, bus: &'a ModeBus) -> Self {
        Self {
            state: ModeState::new(),
            flags,
            bus,
            platform,
            link: LinkStateMachine::new(service, link_config, bus),
            ble_profile: 0,
            reset_issued: false,
        }
    }

    /// Read-only copy of the current mode state
    pub fn state(&self) -> ModeState {
        self.state
    }

    pub fn flags(&self) -> &GlobalFlags {
        self.flags
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn link(&self) -> &LinkStateMachine<'a, L> {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut LinkStateMachine<'a, L> {
        &mut self.link
    }

    /// Whether a system reset has been requested
    pub fn reset_issued(&self) -> bool {
        self.reset_issued
    }

    /// Select the BLE profile reports are routed to
    pub fn set_ble_profile(&mut self, profile_index: u8) {
        self.ble_profile = profile_index;
    }

    /// Where reports should go right now. Wired wins over both radios.
    pub fn endpoint(&self) -> Option<Endpoint> {
        if self.state.wired_active() {
            Some(Endpoint::Usb)
        } else if self.state.proprietary_active() {
            Some(Endpoint::Ppt)
        } else if self.state.short_range_active() {
            Some(Endpoint::Ble {
                profile_index: self.ble_profile,
            })
        } else {
            None
        }
    }

    /// Seed the mode state from lines sampled at startup and bring up the selected radio.
    ///
    /// A radio is only brought up when wired is absent.
    pub fn boot(&mut self, snapshot: ModeState) {
        info!("Booting with mode state {}", snapshot.into_bits());
        self.state = snapshot;
        if let Some(os) = snapshot.host_os() {
            self.platform.host_os_changed(os);
        }
        if snapshot.wired_active() {
            return;
        }
        if snapshot.short_range_active() {
            if let Err(e) = self.platform.init_short_range() {
                error!("Short-range init failed: {:?}", e);
            }
        }
        if snapshot.proprietary_active() {
            if let Err(e) = self.link.start() {
                error!("2.4G start failed: {:?}", e);
            }
        }
    }

    /// Run one drain pass over everything the producers have queued
    pub fn process(&mut self, now: Instant) {
        if self.reset_issued {
            return;
        }
        // Pushes from here on schedule another pass
        self.bus.clear_wake();

        if let Some(os) = self.bus.take_host_os() {
            self.apply_host_os(os);
        }

        while let Some(event) = self.bus.pop_mode_event() {
            self.apply(event);
            if self.reset_issued {
                return;
            }
        }

        while let Some(event) = self.bus.pop_link_event() {
            self.link.handle_event(event, now);
        }
        self.link.poll(now);
    }

    /// When the next timer-driven pass is due
    pub fn next_deadline(&self) -> Option<Instant> {
        self.link.next_deadline()
    }

    fn apply_host_os(&mut self, os: HostOs) {
        if self.state.host_os() == Some(os) {
            return;
        }
        debug!("Host OS changed to {:?}", os);
        self.state.set_host_os(os);
        self.platform.host_os_changed(os);
    }

    fn wired_enumerated(&self) -> bool {
        self.state.wired_active() && self.flags.wired_enumerated()
    }

    fn reset(&mut self, reason: ResetReason) {
        error!("No transport left, resetting: {}", reason.name());
        self.reset_issued = true;
        self.platform.system_reset(reason);
    }

    /// Apply a single mode event
    pub fn apply(&mut self, event: ModeEvent) {
        if self.reset_issued {
            return;
        }
        info!("Mode event: {:?}", event);
        let ModeEvent { kind, activated } = event;
        self.state.set_active(kind, activated);

        match (kind, activated) {
            (TransportKind::Wired, true) => {
                if self.state.radio_active() {
                    debug!("Wired inserted while a radio is selected");
                }
                if let Err(e) = self.platform.init_wired() {
                    error!("Wired init failed: {:?}", e);
                }
                if !self.flags.settle_wired() {
                    debug!("Wired line is debouncing again, leaving DLPS gated");
                }
            }
            (TransportKind::Wired, false) => {
                if let Err(e) = self.platform.deinit_wired() {
                    error!("Wired deinit failed: {:?}", e);
                }
                self.flags.settle_wired();
                self.flags.set_wired_enumerated(false);
                if !self.state.radio_active() {
                    self.reset(ResetReason::WiredLost);
                    return;
                }
            }
            (TransportKind::ShortRange, true) => {
                if self.wired_enumerated() {
                    debug!("Wired is enumerated, short-range stays down");
                } else if let Err(e) = self.platform.init_short_range() {
                    error!("Short-range init failed: {:?}", e);
                }
            }
            (TransportKind::ShortRange, false) => {
                if let Err(e) = self.platform.deinit_short_range() {
                    error!("Short-range deinit failed: {:?}", e);
                }
                if !self.wired_enumerated() {
                    self.reset(ResetReason::ShortRangeLost);
                    return;
                }
            }
            (TransportKind::Proprietary, true) => {
                if let Err(e) = self.link.start() {
                    error!("2.4G start failed: {:?}", e);
                }
            }
            (TransportKind::Proprietary, false) => {}
        }

        self.platform.transport_changed(kind, activated);
    }

    /// Drain the bus whenever it's woken or the link timer is due
    pub async fn run(&mut self) -> ! {
        loop {
            self.process(Instant::now());
            match self.next_deadline() {
                Some(deadline) => {
                    select(self.bus.wait_wake(), Timer::at(deadline)).await;
                }
                None => self.bus.wait_wake().await,
            }
        }
    }
}

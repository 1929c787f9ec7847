//! Interrupt-to-task hand-off
//!
//! Edge handlers, the debounce ticker and link-layer callbacks are producers; the task
//! running [`ModeArbiter`](crate::arbiter::ModeArbiter) is the only consumer. Every push
//! is non-blocking and wakes the consumer. Wakes collapse: however many pushes happen
//! before the consumer runs, it does one drain pass that empties both queues.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use crate::config::{LINK_EVENT_QUEUE_SIZE, MODE_EVENT_QUEUE_SIZE};
use crate::link::{LinkEvent, LinkStatus};
use crate::state::{HostOs, TransportKind};

/// A confirmed transport transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModeEvent {
    pub kind: TransportKind,
    pub activated: bool,
}

impl ModeEvent {
    pub fn new(kind: TransportKind, activated: bool) -> Self {
        Self { kind, activated }
    }

    pub fn activated(kind: TransportKind) -> Self {
        Self::new(kind, true)
    }

    pub fn deactivated(kind: TransportKind) -> Self {
        Self::new(kind, false)
    }
}

/// Queues and signals shared between producers and the consumer task
///
/// All constructors are `const`, so a board usually keeps the bus in a `static`:
///
/// ```ignore
/// static MODE_BUS: ModeBus = ModeBus::new();
/// ```
pub struct ModeBus {
    events: Channel<CriticalSectionRawMutex, ModeEvent, MODE_EVENT_QUEUE_SIZE>,
    link_events: Channel<CriticalSectionRawMutex, LinkEvent, LINK_EVENT_QUEUE_SIZE>,
    wake: Signal<CriticalSectionRawMutex, ()>,
    host_os: Signal<CriticalSectionRawMutex, HostOs>,
    link_status: Signal<CriticalSectionRawMutex, LinkStatus>,
}

impl ModeBus {
    pub const fn new() -> Self {
        Self {
            events: Channel::new(),
            link_events: Channel::new(),
            wake: Signal::new(),
            host_os: Signal::new(),
            link_status: Signal::new(),
        }
    }

    /// Queue a mode event and wake the consumer.
    ///
    /// Returns `false` when the queue was full and the event was dropped. Dropping is
    /// safe: the line levels are sampled again on the next edge.
    pub fn push_mode_event(&self, event: ModeEvent) -> bool {
        let accepted = match self.events.try_send(event) {
            Ok(()) => true,
            Err(_) => {
                warn!("Mode event queue full, dropping {:?}", event);
                false
            }
        };
        self.wake();
        accepted
    }

    /// Queue a link-layer callback event and wake the consumer.
    ///
    /// Returns `false` when the queue was full and the event was dropped.
    pub fn push_link_event(&self, event: LinkEvent) -> bool {
        let accepted = match self.link_events.try_send(event) {
            Ok(()) => true,
            Err(_) => {
                warn!("Link event queue full, dropping {:?}", event);
                false
            }
        };
        self.wake();
        accepted
    }

    /// Publish a host OS change. Only the latest value is kept.
    pub fn publish_host_os(&self, os: HostOs) {
        self.host_os.signal(os);
        self.wake();
    }

    /// Schedule a drain pass of the consumer
    pub fn wake(&self) {
        self.wake.signal(());
    }

    /// Whether a drain pass is scheduled but hasn't run yet
    pub fn wake_pending(&self) -> bool {
        self.wake.signaled()
    }

    /// Wait until the consumer is woken
    pub async fn wait_wake(&self) {
        self.wake.wait().await
    }

    pub(crate) fn clear_wake(&self) {
        self.wake.reset();
    }

    /// Pop the oldest mode event, if any
    pub fn pop_mode_event(&self) -> Option<ModeEvent> {
        self.events.try_receive().ok()
    }

    /// Pop the oldest link event, if any
    pub fn pop_link_event(&self) -> Option<LinkEvent> {
        self.link_events.try_receive().ok()
    }

    pub(crate) fn take_host_os(&self) -> Option<HostOs> {
        self.host_os.try_take()
    }

    /// Number of queued mode events
    pub fn mode_events_len(&self) -> usize {
        self.events.len()
    }

    pub(crate) fn notify_link_status(&self, status: LinkStatus) {
        self.link_status.signal(status);
    }

    /// Wait for the next link status notification.
    ///
    /// Notifications collapse, so a slow observer sees the latest status.
    pub async fn link_status_changed(&self) -> LinkStatus {
        self.link_status.wait().await
    }

    /// Take a pending link status notification without waiting
    pub fn try_link_status(&self) -> Option<LinkStatus> {
        self.link_status.try_take()
    }
}

impl Default for ModeBus {
    fn default() -> Self {
        Self::new()
    }
}

//! Connection lifecycle of the 2.4G link
//!
//! ```text
//!            pair()              Paired
//!   Idle ─────────────> Pairing ────────> Paired
//!    ^  \                  │ PairTimeout     │ Connected
//!    │   \ reconnect()     v (retry/idle)    v
//!    │    └──────────> Connecting ──────> Connected <──> LowPower
//!    │                     │ ConnectTimeout   │ ConnectionLost
//!    └─────────────────────┴──────────────────┘ (retry/idle)
//! ```
//!
//! Retries are bounded by [`RetryBudget`]. Once a budget is spent the machine stays in
//! `Idle` until it's started again or re-paired by the user.

use embassy_time::Instant;

use super::report::{self, Opcode};
use super::service::{LinkError, LinkEvent, LinkService, MsgKind, Result};
use crate::config::LinkConfig;
use crate::event::ModeBus;

/// State of the 2.4G link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    Idle,
    Pairing,
    Paired,
    Connecting,
    Connected,
    LowPower,
}

/// Link state collapsed for observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkStatus {
    Connected,
    Disconnected,
}

impl From<LinkState> for LinkStatus {
    fn from(state: LinkState) -> Self {
        match state {
            LinkState::Paired | LinkState::Connected | LinkState::LowPower => LinkStatus::Connected,
            LinkState::Idle | LinkState::Pairing | LinkState::Connecting => LinkStatus::Disconnected,
        }
    }
}

/// Timeout-driven retries spent so far
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RetryBudget {
    pub pair_attempts: u8,
    pub reconnect_attempts: u8,
}

impl RetryBudget {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// The 2.4G link state machine
///
/// Runs in the consumer task only. All timer handling is deadline based: the task asks
/// for [`next_deadline`](Self::next_deadline) and calls [`poll`](Self::poll) when it
/// passes.
pub struct LinkStateMachine<'a, L: LinkService> {
    service: L,
    config: LinkConfig,
    bus: &'a ModeBus,
    state: LinkState,
    budget: RetryBudget,
    bonded: bool,
    no_activity_deadline: Option<Instant>,
    finite_retrans: Option<u8>,
}

impl<'a, L: LinkService> LinkStateMachine<'a, L> {
    pub fn new(service: L, config: LinkConfig, bus: &'a ModeBus) -> Self {
        Self {
            service,
            config,
            bus,
            state: LinkState::Idle,
            budget: RetryBudget::default(),
            bonded: false,
            no_activity_deadline: None,
            finite_retrans: None,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn status(&self) -> LinkStatus {
        self.state.into()
    }

    /// Whether reports can be sent
    pub fn is_ready(&self) -> bool {
        self.status() == LinkStatus::Connected
    }

    pub fn budget(&self) -> RetryBudget {
        self.budget
    }

    pub fn is_bonded(&self) -> bool {
        self.bonded
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn service(&self) -> &L {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut L {
        &mut self.service
    }

    /// When the no-activity timer fires, if it's armed
    pub fn next_deadline(&self) -> Option<Instant> {
        self.no_activity_deadline
    }

    fn set_state(&mut self, state: LinkState) {
        if self.state == state {
            return;
        }
        debug!("2.4G link {:?} -> {:?}", self.state, state);
        self.state = state;
        self.bus.notify_link_status(state.into());
    }

    fn read_bond(&mut self) -> bool {
        match self.service.bond_record() {
            Ok(bond) => bond.is_valid(),
            Err(e) => {
                debug!("No 2.4G bond record: {:?}", e);
                false
            }
        }
    }

    /// Initialize and enable the link, then reconnect to the bonded dongle or start
    /// pairing when there's none.
    pub fn start(&mut self) -> Result<()> {
        info!("Starting 2.4G link");
        self.service.init(&self.config).inspect_err(|e| error!("2.4G init failed: {:?}", e))?;
        self.set_state(LinkState::Idle);
        self.finite_retrans = None;
        self.bonded = self.read_bond();
        debug!("2.4G bonded: {}", self.bonded);

        self.budget.reset();
        self.service.enable().inspect_err(|e| error!("2.4G enable failed: {:?}", e))?;
        if self.bonded {
            // The first reconnect counts against the budget
            self.budget.reconnect_attempts = 1;
            self.reconnect()
        } else {
            self.pair()
        }
    }

    /// Ask the link layer to pair
    pub fn pair(&mut self) -> Result<()> {
        match self.service.pair() {
            Ok(()) => {
                self.set_state(LinkState::Pairing);
                Ok(())
            }
            Err(e) => {
                warn!("2.4G pair request failed: {:?}", e);
                Err(e)
            }
        }
    }

    /// Ask the link layer to reconnect with the stored bond record
    pub fn reconnect(&mut self) -> Result<()> {
        let bond = self
            .service
            .bond_record()
            .inspect_err(|e| warn!("2.4G reconnect: reading bond failed: {:?}", e))?;
        if !bond.is_valid() {
            warn!("2.4G reconnect: not bonded");
            return Err(LinkError::NotBonded);
        }
        match self.service.connect(&bond) {
            Ok(()) => {
                self.set_state(LinkState::Connecting);
                Ok(())
            }
            Err(e) => {
                warn!("2.4G reconnect request failed: {:?}", e);
                Err(e)
            }
        }
    }

    /// Tear the link down. The no-activity timer is cancelled before this returns.
    pub fn stop(&mut self) {
        info!("Stopping 2.4G link");
        self.service.stop();
        self.no_activity_deadline = None;
        self.set_state(LinkState::Idle);
    }

    /// Forget the dongle and pair again. This is the user action that revives a link
    /// whose retries are exhausted.
    pub fn repair(&mut self) -> Result<()> {
        self.stop();
        self.service
            .clear_bond_record()
            .inspect_err(|e| error!("Clearing 2.4G bond failed: {:?}", e))?;
        self.bonded = false;
        self.budget.reset();
        self.pair()
    }

    /// Enter low power while connected
    pub fn suspend(&mut self) {
        if self.state == LinkState::Connected {
            self.set_state(LinkState::LowPower);
        }
    }

    /// Leave low power
    pub fn resume(&mut self) {
        if self.state == LinkState::LowPower {
            self.set_state(LinkState::Connected);
        }
    }

    fn retry_pair(&mut self) {
        if self.budget.pair_attempts < self.config.pair_attempts_max {
            self.budget.pair_attempts += 1;
            debug!("2.4G pair retry {}", self.budget.pair_attempts);
            let _ = self.pair();
        } else {
            warn!("2.4G pairing gave up after {} attempts", self.budget.pair_attempts);
            self.budget.pair_attempts = 0;
        }
    }

    fn retry_reconnect(&mut self) {
        if self.budget.reconnect_attempts < self.config.reconnect_attempts_max {
            self.budget.reconnect_attempts += 1;
            debug!("2.4G reconnect retry {}", self.budget.reconnect_attempts);
            let _ = self.reconnect();
        } else {
            warn!("2.4G reconnect gave up after {} attempts", self.budget.reconnect_attempts);
        }
    }

    /// Apply a link-layer callback event
    pub fn handle_event(&mut self, event: LinkEvent, now: Instant) {
        trace!("2.4G event {:?} in {:?}", event, self.state);
        match event {
            LinkEvent::Paired if self.state == LinkState::Pairing => {
                self.bonded = true;
                self.budget.pair_attempts = 0;
                self.set_state(LinkState::Paired);
            }
            LinkEvent::PairTimeout if self.state == LinkState::Pairing => {
                self.set_state(LinkState::Idle);
                self.retry_pair();
            }
            LinkEvent::Connected if matches!(self.state, LinkState::Connecting | LinkState::Paired) => {
                self.set_state(LinkState::Connected);
                if self.budget.reconnect_attempts <= self.config.no_activity_reconnect_threshold {
                    self.no_activity_deadline = Some(now + self.config.no_activity_timeout);
                }
                self.budget.reconnect_attempts = 0;
            }
            LinkEvent::ConnectTimeout if self.state == LinkState::Connecting => {
                self.set_state(LinkState::Idle);
                self.retry_reconnect();
            }
            LinkEvent::ConnectionLost
                if matches!(
                    self.state,
                    LinkState::Paired | LinkState::Connected | LinkState::Connecting | LinkState::LowPower
                ) =>
            {
                self.no_activity_deadline = None;
                self.set_state(LinkState::Idle);
                // The bond store is authoritative: a pairing the link layer never persisted
                // falls back to pairing again
                self.bonded = self.read_bond();
                if self.bonded {
                    self.retry_reconnect();
                } else {
                    self.retry_pair();
                }
            }
            LinkEvent::SendComplete { delivered } => {
                if !delivered {
                    warn!("2.4G message not delivered");
                }
            }
            LinkEvent::Received { len } => {
                trace!("2.4G received {} bytes", len);
            }
            _ => {
                debug!("Ignoring 2.4G event {:?} in {:?}", event, self.state);
            }
        }
    }

    /// Fire the no-activity timer if its deadline has passed
    pub fn poll(&mut self, now: Instant) {
        match self.no_activity_deadline {
            Some(deadline) if deadline <= now => {
                self.no_activity_deadline = None;
                if self.state == LinkState::Connected {
                    info!("No activity on fresh 2.4G link, disconnecting");
                    self.stop();
                }
            }
            _ => {}
        }
    }

    /// Frame and send a report. A successful send counts as activity.
    pub fn send(&mut self, opcode: Opcode, payload: &[u8], kind: MsgKind) -> Result<()> {
        if !self.is_ready() {
            return Err(LinkError::NotReady);
        }
        let frame = report::encode(opcode, payload)?;
        if frame.len() > self.service.max_frame_size() {
            return Err(LinkError::FrameTooLarge);
        }
        if let MsgKind::FiniteRetrans(count) = kind {
            if self.finite_retrans != Some(count) {
                self.service.set_finite_retrans(count);
                self.finite_retrans = Some(count);
            }
        }
        self.service
            .send(kind, &frame)
            .inspect_err(|e| warn!("2.4G send failed: {:?}", e))?;
        self.no_activity_deadline = None;
        Ok(())
    }
}

//! Wired-present line debouncer
//!
//! A raw edge arms a debounce attempt and stops edge watching on the line. From then on
//! the line is sampled once per tick. Consecutive samples at the expected level count
//! towards the confirmation threshold; a single sample at the other level restarts the
//! count from zero. The attempt ends either with a confirmed [`ModeEvent`] (and the
//! watched level flipped) or, once the wait budget runs out, with nothing (and the
//! watched level unchanged). DLPS is held off for the whole attempt.

use embassy_time::{Duration, Ticker, Timer};
use embedded_hal::digital::{Error as _, InputPin, PinState};
use embedded_hal_async::digital::Wait;

use crate::config::{DebounceConfig, LineThresholds};
use crate::event::{ModeBus, ModeEvent};
use crate::state::{GlobalFlags, TransportKind};

/// Per-line debounce progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DebounceCounter {
    /// Consecutive samples at `trigger_level`
    pub confirming_samples: u8,

    /// The level the line is being watched for
    pub trigger_level: PinState,

    /// Whether an attempt is outstanding
    pub active: bool,
}

/// Result of one sampling tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DebounceOutcome {
    /// No attempt is outstanding
    Idle,
    /// Still sampling
    Pending,
    /// The transition held for the whole threshold
    Confirmed(ModeEvent),
    /// The wait budget ran out
    Abandoned,
}

/// Debounce state machine for one line
pub struct Debouncer<'a> {
    kind: TransportKind,
    active_level: PinState,
    config: DebounceConfig,
    counter: DebounceCounter,
    ticks: u8,
    edge_enabled: bool,
    flags: &'a GlobalFlags,
}

impl<'a> Debouncer<'a> {
    /// Create a debouncer for a line that currently reads `initial_level`.
    ///
    /// The line is first watched for the opposite level. `active_level` is the level at
    /// which the transport is present.
    pub fn new(
        kind: TransportKind,
        active_level: PinState,
        initial_level: PinState,
        config: DebounceConfig,
        flags: &'a GlobalFlags,
    ) -> Self {
        Self {
            kind,
            active_level,
            config,
            counter: DebounceCounter {
                confirming_samples: 0,
                trigger_level: !initial_level,
                active: false,
            },
            ticks: 0,
            edge_enabled: true,
            flags,
        }
    }

    pub fn counter(&self) -> &DebounceCounter {
        &self.counter
    }

    /// Whether edge detection is armed on the line
    pub fn edge_enabled(&self) -> bool {
        self.edge_enabled
    }

    pub fn tick_period(&self) -> Duration {
        self.config.tick
    }

    /// Thresholds for the current attempt's direction
    fn thresholds(&self) -> LineThresholds {
        if self.counter.trigger_level == self.active_level {
            self.config.insert
        } else {
            self.config.remove
        }
    }

    /// Handle a raw edge towards the trigger level.
    ///
    /// Edges arriving while edge detection is off are ignored.
    pub fn on_edge(&mut self) {
        if !self.edge_enabled || self.counter.active {
            return;
        }
        self.edge_enabled = false;
        self.counter.active = true;
        self.counter.confirming_samples = 0;
        self.ticks = 0;
        self.flags.begin_debounce();
        if self.kind == TransportKind::Wired {
            self.flags.set_wired_pending(true);
        }
        trace!("Debounce armed on {:?} line", self.kind);
    }

    /// Process one sample of the raw line
    pub fn on_tick(&mut self, level: PinState) -> DebounceOutcome {
        if !self.counter.active {
            return DebounceOutcome::Idle;
        }
        self.ticks = self.ticks.saturating_add(1);

        if level == self.counter.trigger_level {
            self.counter.confirming_samples = self.counter.confirming_samples.saturating_add(1);
        } else {
            self.counter.confirming_samples = 0;
        }

        let thresholds = self.thresholds();
        if self.counter.confirming_samples >= thresholds.confirm_samples {
            let event = ModeEvent::new(self.kind, self.counter.trigger_level == self.active_level);
            self.counter.trigger_level = !self.counter.trigger_level;
            self.retire();
            debug!("Debounce confirmed {:?} after {} ticks", event, self.ticks);
            DebounceOutcome::Confirmed(event)
        } else if self.ticks >= thresholds.max_ticks {
            self.retire();
            if self.kind == TransportKind::Wired {
                self.flags.set_wired_pending(false);
            }
            debug!("Debounce abandoned on {:?} line", self.kind);
            DebounceOutcome::Abandoned
        } else {
            DebounceOutcome::Pending
        }
    }

    fn retire(&mut self) {
        self.counter.active = false;
        self.counter.confirming_samples = 0;
        self.ticks = 0;
        self.edge_enabled = true;
        self.flags.end_debounce();
    }
}

/// A debounced input pin feeding the mode bus
///
/// `wait_for_high`/`wait_for_low` stand in for the edge interrupt, an [`embassy_time::Ticker`]
/// for the sampling timer.
pub struct DebouncedLine<'a, P: InputPin + Wait> {
    pin: P,
    debouncer: Debouncer<'a>,
}

impl<'a, P: InputPin + Wait> DebouncedLine<'a, P> {
    pub fn new(pin: P, debouncer: Debouncer<'a>) -> Self {
        Self { pin, debouncer }
    }

    pub fn debouncer(&self) -> &Debouncer<'a> {
        &self.debouncer
    }

    fn sample(&mut self) -> PinState {
        match self.pin.is_high() {
            Ok(high) => PinState::from(high),
            Err(e) => {
                // Count a failed read as disconfirming
                error!("Failed to sample line: {:?}", e.kind());
                !self.debouncer.counter().trigger_level
            }
        }
    }

    /// Run one debounce attempt to completion, starting with the edge wait.
    pub async fn run_once(&mut self, bus: &ModeBus) -> DebounceOutcome {
        let waited = match self.debouncer.counter().trigger_level {
            PinState::High => self.pin.wait_for_high().await,
            PinState::Low => self.pin.wait_for_low().await,
        };
        if let Err(e) = waited {
            error!("Failed to wait for line edge: {:?}", e.kind());
            Timer::after(self.debouncer.tick_period()).await;
            return DebounceOutcome::Idle;
        }

        self.debouncer.on_edge();
        let mut ticker = Ticker::every(self.debouncer.tick_period());
        loop {
            ticker.next().await;
            let level = self.sample();
            match self.debouncer.on_tick(level) {
                DebounceOutcome::Pending => continue,
                DebounceOutcome::Confirmed(event) => {
                    bus.push_mode_event(event);
                    return DebounceOutcome::Confirmed(event);
                }
                outcome => return outcome,
            }
        }
    }

    /// Debounce the line forever
    pub async fn run(&mut self, bus: &ModeBus) -> ! {
        loop {
            self.run_once(bus).await;
        }
    }
}

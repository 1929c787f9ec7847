//! Transport arbitration for tri-mode (USB, BLE, 2.4G) keyboards.
//!
//! Hardware lines (cable detect, mode selector, OS selector) feed a [`ModeBus`]
//! through [`DebouncedLine`], [`SwitchLine`] and [`HostOsLine`]. A single task runs the
//! [`ModeArbiter`], which applies each transition, brings transports up and down through
//! the board's [`Platform`] and drives the 2.4G [`LinkStateMachine`].
//!
//! ## Feature flags
#![doc = document_features::document_features!()]
#![cfg_attr(not(feature = "std"), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod arbiter;
pub mod config;
pub mod debounce;
pub mod event;
pub mod link;
pub mod monitor;
pub mod platform;
pub mod state;

#[cfg(test)]
mod mock;

pub use arbiter::ModeArbiter;
pub use config::{DebounceConfig, LineThresholds, LinkConfig, ModeConfig, ReportRateTable};
pub use debounce::{DebounceCounter, DebounceOutcome, DebouncedLine, Debouncer};
pub use event::{ModeBus, ModeEvent};
pub use link::{LinkError, LinkEvent, LinkService, LinkState, LinkStateMachine, LinkStatus, MsgKind, Opcode};
pub use monitor::{HostOsLine, SwitchLine};
pub use platform::{Indicator, Platform, ResetReason, SystemReset, TransportControl, TransportError};
pub use state::{Endpoint, GlobalFlags, HostOs, ModeState, TransportKind};

//! Proprietary 2.4G link management
//!
//! The radio link layer itself is opaque and sits behind [`LinkService`]. This module
//! decides when to pair and reconnect, how many attempts to spend on each, and frames the
//! reports sent to the dongle.
//!
//! # Example
//!
//! ```ignore
//! static MODE_BUS: ModeBus = ModeBus::new();
//!
//! let mut link = LinkStateMachine::new(service, LinkConfig::default(), &MODE_BUS);
//! link.start()?;
//!
//! // Later, from the consumer task
//! while let Some(event) = MODE_BUS.pop_link_event() {
//!     link.handle_event(event, Instant::now());
//! }
//! if link.is_ready() {
//!     link.send(Opcode::Keyboard, &report, MsgKind::DynamicRetrans)?;
//! }
//! ```

pub mod machine;
pub mod report;
pub mod service;

pub use machine::{LinkState, LinkStateMachine, LinkStatus, RetryBudget};
pub use report::{Frame, MAX_FRAME_SIZE, Opcode};
pub use service::{BondRecord, LinkError, LinkEvent, LinkService, MsgKind, Result};

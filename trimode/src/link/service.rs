//! Radio link service trait and common types

use core::fmt;

use super::report::MAX_FRAME_SIZE;
use crate::config::LinkConfig;

/// Errors reported by the radio link service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// The link layer refused the request
    Rejected,

    /// No bond record is stored
    NotBonded,

    /// The link is not connected
    NotReady,

    /// Frame too large for the link
    FrameTooLarge,

    /// Reading or writing the bond store failed
    StoreFailed,

    /// Hardware error
    Hardware,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected => write!(f, "Request rejected by link layer"),
            Self::NotBonded => write!(f, "No bond record"),
            Self::NotReady => write!(f, "Link not ready"),
            Self::FrameTooLarge => write!(f, "Frame too large"),
            Self::StoreFailed => write!(f, "Bond store failure"),
            Self::Hardware => write!(f, "Hardware error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LinkError {}

/// Result type for link operations
pub type Result<T> = core::result::Result<T, LinkError>;

/// Persisted identity of the paired dongle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BondRecord {
    /// Peer access address, zero when nothing is bonded
    pub peer_addr: u32,
}

impl BondRecord {
    pub fn new(peer_addr: u32) -> Self {
        Self { peer_addr }
    }

    /// A zeroed record is what an erased bond store reads back as
    pub fn is_valid(&self) -> bool {
        self.peer_addr != 0
    }
}

/// Retransmission policy of an outgoing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MsgKind {
    /// Retransmitted until superseded by newer data
    DynamicRetrans,

    /// Retransmitted until acknowledged
    InfiniteRetrans,

    /// Retransmitted at most the given number of times
    FiniteRetrans(u8),
}

impl MsgKind {
    /// Slot of this kind in [`LinkConfig::msg_quota`]
    pub fn index(&self) -> usize {
        match self {
            MsgKind::DynamicRetrans => 1,
            MsgKind::InfiniteRetrans => 2,
            MsgKind::FiniteRetrans(_) => 3,
        }
    }
}

/// Callback events raised by the link layer
///
/// Link services push these through [`ModeBus::push_link_event`](crate::event::ModeBus::push_link_event)
/// so they're handled in the consumer task, never inside the link layer's own callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    Paired,
    PairTimeout,
    Connected,
    ConnectTimeout,
    ConnectionLost,
    /// A queued message left the send queue
    SendComplete { delivered: bool },
    /// A message arrived from the dongle
    Received { len: u16 },
}

/// Trait for the opaque 2.4G link layer
///
/// Requests return as soon as the link layer has accepted them; the outcome arrives later
/// as a [`LinkEvent`]. Implementations hold on to the [`ModeBus`](crate::event::ModeBus)
/// they were built with and report link-state, send and receive callbacks through it.
pub trait LinkService {
    /// Bring up the link layer with the given parameters
    fn init(&mut self, config: &LinkConfig) -> Result<()>;

    /// Start the radio after `init`
    fn enable(&mut self) -> Result<()>;

    /// Start pairing with a dongle
    fn pair(&mut self) -> Result<()>;

    /// Reconnect to a bonded dongle
    fn connect(&mut self, bond: &BondRecord) -> Result<()>;

    /// Tear the link down and return the link layer to idle
    fn stop(&mut self);

    /// Read the stored bond record
    fn bond_record(&mut self) -> Result<BondRecord>;

    /// Erase the stored bond record
    fn clear_bond_record(&mut self) -> Result<()>;

    /// Set the retransmission count used by [`MsgKind::FiniteRetrans`] messages
    fn set_finite_retrans(&mut self, count: u8);

    /// Queue a frame for sending
    fn send(&mut self, kind: MsgKind, frame: &[u8]) -> Result<()>;

    /// Maximum frame size accepted by `send`
    fn max_frame_size(&self) -> usize {
        MAX_FRAME_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bond_record_valid() {
        assert!(BondRecord::new(0x1234_5678).is_valid());
        assert!(!BondRecord::default().is_valid());
    }

    #[test]
    fn test_msg_kind_quota_index() {
        let quota = LinkConfig::default().msg_quota;
        assert_eq!(quota[MsgKind::DynamicRetrans.index()], 2);
        assert_eq!(quota[MsgKind::FiniteRetrans(3).index()], 2);
    }
}

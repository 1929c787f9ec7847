//! Recording test doubles for the platform and the 2.4G link layer

use heapless::Vec;

use crate::config::LinkConfig;
use crate::link::{BondRecord, Frame, LinkError, LinkService, MsgKind, Result};
use crate::platform::{Indicator, ResetReason, SystemReset, TransportControl, TransportError};
use crate::state::{HostOs, TransportKind};

/// A call made on [`MockLinkService`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceCall {
    Init,
    Enable,
    Pair,
    Connect,
    Stop,
    ClearBond,
    SetFiniteRetrans(u8),
    Send(MsgKind),
}

/// Link layer double that records every call.
///
/// With `reject_requests` set, pair, connect and send requests are refused.
pub struct MockLinkService {
    pub calls: Vec<ServiceCall, 128>,
    pub sent: Vec<Frame, 16>,
    pub bond: BondRecord,
    pub fail_init: bool,
    pub reject_requests: bool,
}

impl MockLinkService {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            sent: Vec::new(),
            bond: BondRecord::default(),
            fail_init: false,
            reject_requests: false,
        }
    }

    /// Store a bond record as if a dongle had been paired earlier
    pub fn bond(&mut self, peer_addr: u32) {
        self.bond = BondRecord::new(peer_addr);
    }

    /// How many times `call` was made
    pub fn count(&self, call: ServiceCall) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }

    fn record(&mut self, call: ServiceCall) {
        // Keep the oldest calls if a test overruns the log
        let _ = self.calls.push(call);
    }

    fn request(&mut self, call: ServiceCall) -> Result<()> {
        self.record(call);
        if self.reject_requests {
            Err(LinkError::Rejected)
        } else {
            Ok(())
        }
    }
}

impl Default for MockLinkService {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkService for MockLinkService {
    fn init(&mut self, _config: &LinkConfig) -> Result<()> {
        self.record(ServiceCall::Init);
        if self.fail_init { Err(LinkError::Hardware) } else { Ok(()) }
    }

    fn enable(&mut self) -> Result<()> {
        self.record(ServiceCall::Enable);
        Ok(())
    }

    fn pair(&mut self) -> Result<()> {
        self.request(ServiceCall::Pair)
    }

    fn connect(&mut self, _bond: &BondRecord) -> Result<()> {
        self.request(ServiceCall::Connect)
    }

    fn stop(&mut self) {
        self.record(ServiceCall::Stop);
    }

    fn bond_record(&mut self) -> Result<BondRecord> {
        Ok(self.bond)
    }

    fn clear_bond_record(&mut self) -> Result<()> {
        self.record(ServiceCall::ClearBond);
        self.bond = BondRecord::default();
        Ok(())
    }

    fn set_finite_retrans(&mut self, count: u8) {
        self.record(ServiceCall::SetFiniteRetrans(count));
    }

    fn send(&mut self, kind: MsgKind, frame: &[u8]) -> Result<()> {
        self.request(ServiceCall::Send(kind))?;
        let frame = Frame::from_slice(frame).map_err(|_| LinkError::FrameTooLarge)?;
        self.sent.push(frame).map_err(|_| LinkError::Rejected)
    }
}

/// A call made on [`MockPlatform`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformCall {
    InitWired,
    DeinitWired,
    InitShortRange,
    DeinitShortRange,
    Reset(ResetReason),
    TransportChanged(TransportKind, bool),
    HostOsChanged(HostOs),
}

/// Board double recording transport lifecycle calls, resets and indications
pub struct MockPlatform {
    pub calls: Vec<PlatformCall, 64>,
    pub fail_init: bool,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            fail_init: false,
        }
    }

    pub fn count(&self, call: PlatformCall) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }

    /// Number of resets requested, whatever the reason
    pub fn resets(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, PlatformCall::Reset(_)))
            .count()
    }

    fn record(&mut self, call: PlatformCall) {
        let _ = self.calls.push(call);
    }

    fn init(&mut self, call: PlatformCall) -> core::result::Result<(), TransportError> {
        self.record(call);
        if self.fail_init {
            Err(TransportError::InitFailed)
        } else {
            Ok(())
        }
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportControl for MockPlatform {
    fn init_wired(&mut self) -> core::result::Result<(), TransportError> {
        self.init(PlatformCall::InitWired)
    }

    fn deinit_wired(&mut self) -> core::result::Result<(), TransportError> {
        self.record(PlatformCall::DeinitWired);
        Ok(())
    }

    fn init_short_range(&mut self) -> core::result::Result<(), TransportError> {
        self.init(PlatformCall::InitShortRange)
    }

    fn deinit_short_range(&mut self) -> core::result::Result<(), TransportError> {
        self.record(PlatformCall::DeinitShortRange);
        Ok(())
    }
}

impl SystemReset for MockPlatform {
    fn system_reset(&mut self, reason: ResetReason) {
        self.record(PlatformCall::Reset(reason));
    }
}

impl Indicator for MockPlatform {
    fn transport_changed(&mut self, kind: TransportKind, active: bool) {
        self.record(PlatformCall::TransportChanged(kind, active));
    }

    fn host_os_changed(&mut self, os: HostOs) {
        self.record(PlatformCall::HostOsChanged(os));
    }
}

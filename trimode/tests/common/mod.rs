#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use trimode::config::LinkConfig;
use trimode::link::{BondRecord, LinkError, LinkService, MsgKind};
use trimode::{HostOs, Indicator, ResetReason, SystemReset, TransportControl, TransportError, TransportKind};

// Init logger for tests
#[ctor::ctor]
fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardCall {
    InitWired,
    DeinitWired,
    InitShortRange,
    DeinitShortRange,
    Reset(ResetReason),
    Transport(TransportKind, bool),
    Os(HostOs),
}

/// Board double. Clones share one call log so a test can keep a handle after handing the
/// board to the arbiter.
#[derive(Clone, Default)]
pub struct TestBoard {
    calls: Rc<RefCell<Vec<BoardCall>>>,
}

impl TestBoard {
    pub fn calls(&self) -> Vec<BoardCall> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, call: BoardCall) -> usize {
        self.calls.borrow().iter().filter(|c| **c == call).count()
    }

    pub fn resets(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, BoardCall::Reset(_)))
            .count()
    }

    fn push(&self, call: BoardCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl TransportControl for TestBoard {
    fn init_wired(&mut self) -> Result<(), TransportError> {
        self.push(BoardCall::InitWired);
        Ok(())
    }

    fn deinit_wired(&mut self) -> Result<(), TransportError> {
        self.push(BoardCall::DeinitWired);
        Ok(())
    }

    fn init_short_range(&mut self) -> Result<(), TransportError> {
        self.push(BoardCall::InitShortRange);
        Ok(())
    }

    fn deinit_short_range(&mut self) -> Result<(), TransportError> {
        self.push(BoardCall::DeinitShortRange);
        Ok(())
    }
}

impl SystemReset for TestBoard {
    fn system_reset(&mut self, reason: ResetReason) {
        self.push(BoardCall::Reset(reason));
    }
}

impl Indicator for TestBoard {
    fn transport_changed(&mut self, kind: TransportKind, active: bool) {
        self.push(BoardCall::Transport(kind, active));
    }

    fn host_os_changed(&mut self, os: HostOs) {
        self.push(BoardCall::Os(os));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioCall {
    Init(u32),
    Enable,
    Pair,
    Connect(u32),
    Stop,
    ClearBond,
    FiniteRetrans(u8),
    Send(MsgKind, Vec<u8>),
}

/// 2.4G link layer double with a shared call log
#[derive(Clone, Default)]
pub struct TestRadio {
    calls: Rc<RefCell<Vec<RadioCall>>>,
    bond: Rc<RefCell<BondRecord>>,
}

impl TestRadio {
    pub fn bonded(peer_addr: u32) -> Self {
        let radio = Self::default();
        *radio.bond.borrow_mut() = BondRecord::new(peer_addr);
        radio
    }

    pub fn calls(&self) -> Vec<RadioCall> {
        self.calls.borrow().clone()
    }

    pub fn connects(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, RadioCall::Connect(_)))
            .count()
    }

    pub fn pairs(&self) -> usize {
        self.calls.borrow().iter().filter(|c| **c == RadioCall::Pair).count()
    }

    fn push(&self, call: RadioCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl LinkService for TestRadio {
    fn init(&mut self, config: &LinkConfig) -> Result<(), LinkError> {
        self.push(RadioCall::Init(config.connect_interval_us));
        Ok(())
    }

    fn enable(&mut self) -> Result<(), LinkError> {
        self.push(RadioCall::Enable);
        Ok(())
    }

    fn pair(&mut self) -> Result<(), LinkError> {
        self.push(RadioCall::Pair);
        Ok(())
    }

    fn connect(&mut self, bond: &BondRecord) -> Result<(), LinkError> {
        self.push(RadioCall::Connect(bond.peer_addr));
        Ok(())
    }

    fn stop(&mut self) {
        self.push(RadioCall::Stop);
    }

    fn bond_record(&mut self) -> Result<BondRecord, LinkError> {
        Ok(*self.bond.borrow())
    }

    fn clear_bond_record(&mut self) -> Result<(), LinkError> {
        self.push(RadioCall::ClearBond);
        *self.bond.borrow_mut() = BondRecord::default();
        Ok(())
    }

    fn set_finite_retrans(&mut self, count: u8) {
        self.push(RadioCall::FiniteRetrans(count));
    }

    fn send(&mut self, kind: MsgKind, frame: &[u8]) -> Result<(), LinkError> {
        self.push(RadioCall::Send(kind, frame.to_vec()));
        Ok(())
    }
}

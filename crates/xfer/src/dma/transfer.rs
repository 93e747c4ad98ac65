//! Typestate channel handle.
//!
//! ```text
//! GpDma::channel(n) --> [Reset] --configure()--> [Configured] --enable()--> [Enabled]
//!                          ^                         |                          |
//!                          +-------- reset() --------+---- reset() / disable() -+
//! ```
//!
//! Descriptor registers may only be written while the channel is disabled;
//! `configure` exists only on `Reset` and `Configured`, so writing CTR1 on
//! a running channel does not compile. Every path out of `Enabled`, and
//! `GpDma::channel` on a channel left running by the index API, suspends
//! and waits for IDLEF before CCR.RESET is written. The handle mutably
//! borrows its [`GpDma`], so at most one handle is live per controller.

use core::marker::PhantomData;

use super::channel::{ChannelStatus, GpDma};
use super::descriptor::ChannelDescriptor;
use super::regs::{ChannelFlags, CBR1, CBR1_BNDT, CCR, CCR_SUSP, CFCR, CSR};
use crate::error::XferError;
use crate::regs::RegisterFile;

// ── State types (zero-sized) ────────────────────────────────────────────────

/// Freshly reset: EN clear, descriptor registers zeroed.
pub struct Reset;

/// Descriptor written, channel still disabled.
pub struct Configured;

/// EN set: the channel runs on its next request.
pub struct Enabled;

// ── Handle ──────────────────────────────────────────────────────────────────

/// Where a running channel stands, decoded from CSR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// No completion or error flag yet.
    Running,
    /// TCF set.
    Completed,
    /// SUSPF set after [`Channel::suspend`].
    Suspended,
    /// At least one error flag set; carries the error flags.
    Error(ChannelFlags),
}

impl Outcome {
    /// Classify a set of CSR flags. Errors win over completion.
    pub fn from_flags(flags: ChannelFlags) -> Self {
        let errors = flags & ChannelFlags::ERRORS;
        if !errors.is_empty() {
            Self::Error(errors)
        } else if flags.contains(ChannelFlags::TRANSFER_COMPLETE) {
            Self::Completed
        } else if flags.contains(ChannelFlags::SUSPENDED) {
            Self::Suspended
        } else {
            Self::Running
        }
    }
}

/// One channel of a [`GpDma`], with its lifecycle state in the type.
pub struct Channel<'d, R, S> {
    dma: &'d mut GpDma<R>,
    index: u8,
    _state: PhantomData<S>,
}

impl<R: RegisterFile> GpDma<R> {
    /// Reset channel `index` and take a typestate handle to it.
    ///
    /// A channel that is still enabled is suspended and drained first, as
    /// in [`GpDma::reset`]; if it does not go idle within the wait budget
    /// the call fails with [`XferError::Timeout`].
    pub fn channel(&mut self, index: u8) -> Result<Channel<'_, R, Reset>, XferError> {
        self.check(index)?;
        self.reset_unchecked(index)?;
        Ok(Channel {
            dma: self,
            index,
            _state: PhantomData,
        })
    }
}

impl<'d, R: RegisterFile, S> Channel<'d, R, S> {
    /// Channel number.
    pub fn index(&self) -> u8 {
        self.index
    }

    fn into_state<T>(self) -> Channel<'d, R, T> {
        Channel {
            dma: self.dma,
            index: self.index,
            _state: PhantomData,
        }
    }

    fn csr(&mut self) -> u32 {
        let addr = self.dma.addr(self.index, CSR);
        self.dma.regs_mut().read32(addr)
    }
}

impl<'d, R: RegisterFile> Channel<'d, R, Reset> {
    /// Write the descriptor.
    pub fn configure(
        self,
        desc: &ChannelDescriptor,
    ) -> Result<Channel<'d, R, Configured>, XferError> {
        self.dma.configure_unchecked(self.index, desc)?;
        Ok(self.into_state())
    }
}

impl<'d, R: RegisterFile> Channel<'d, R, Configured> {
    /// Overwrite the descriptor with a new one.
    pub fn configure(self, desc: &ChannelDescriptor) -> Result<Self, XferError> {
        self.dma.configure_unchecked(self.index, desc)?;
        Ok(self)
    }

    /// Clear stale flags, then enable interrupts for `flags`.
    #[must_use]
    pub fn listen(self, flags: ChannelFlags) -> Self {
        let cfcr = self.dma.addr(self.index, CFCR);
        let ccr = self.dma.addr(self.index, CCR);
        self.dma.regs_mut().write32(cfcr, flags.bits());
        self.dma.regs_mut().set_bits32(ccr, flags.bits());
        self
    }

    /// Set EN.
    #[must_use]
    pub fn enable(self) -> Channel<'d, R, Enabled> {
        self.dma.enable_unchecked(self.index);
        self.into_state()
    }

    /// Drop the descriptor.
    #[must_use]
    pub fn reset(self) -> Channel<'d, R, Reset> {
        self.dma.clear_unchecked(self.index);
        self.into_state()
    }
}

impl<'d, R: RegisterFile> Channel<'d, R, Enabled> {
    /// Read CSR.
    pub fn status(&mut self) -> ChannelStatus {
        ChannelStatus::from_bits(self.csr())
    }

    /// Decode CSR into an [`Outcome`].
    pub fn outcome(&mut self) -> Outcome {
        Outcome::from_flags(self.status().flags)
    }

    /// Bytes left in the current block.
    #[allow(clippy::cast_possible_truncation)] // Safety: BNDT is 16 bits
    pub fn remaining(&mut self) -> u16 {
        let addr = self.dma.addr(self.index, CBR1);
        CBR1_BNDT.unpack(self.dma.regs_mut().read32(addr)) as u16
    }

    /// Clear flags through CFCR.
    pub fn clear_flags(&mut self, flags: ChannelFlags) {
        let addr = self.dma.addr(self.index, CFCR);
        self.dma.regs_mut().write32(addr, flags.bits());
    }

    /// Request suspension; completion shows up as [`Outcome::Suspended`].
    pub fn suspend(&mut self) {
        let addr = self.dma.addr(self.index, CCR);
        self.dma.regs_mut().set_bits32(addr, CCR_SUSP.mask());
    }

    /// Clear SUSP and the SUSPF flag.
    pub fn resume(&mut self) {
        self.clear_flags(ChannelFlags::SUSPENDED);
        let addr = self.dma.addr(self.index, CCR);
        self.dma.regs_mut().clear_bits32(addr, CCR_SUSP.mask());
    }

    /// Poll until the transfer completes or fails, within the controller's
    /// wait budget.
    pub fn wait(&mut self) -> Result<Outcome, XferError> {
        let addr = self.dma.addr(self.index, CSR);
        let done = ChannelFlags::TRANSFER_COMPLETE | ChannelFlags::ERRORS;
        let budget = self.dma.wait_budget();
        let regs = self.dma.regs_mut();
        budget.poll(|| ChannelFlags::from_bits_truncate(regs.read32(addr)).intersects(done))?;
        Ok(self.outcome())
    }

    /// Suspend, wait for idle, and reset.
    ///
    /// On [`XferError::Timeout`] the handle is consumed with the channel
    /// still suspended; the index API on [`GpDma`] can finish the job.
    pub fn disable(self) -> Result<Channel<'d, R, Reset>, XferError> {
        self.dma.disable_unchecked(self.index)?;
        Ok(self.into_state())
    }

    /// Suspend, wait for idle, reset, and drop the descriptor.
    ///
    /// Fails like [`Channel::disable`]; descriptor registers are zeroed
    /// only once the channel is idle.
    pub fn reset(self) -> Result<Channel<'d, R, Reset>, XferError> {
        self.dma.disable_unchecked(self.index)?;
        self.dma.clear_unchecked(self.index);
        Ok(self.into_state())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use crate::dma::descriptor::DataWidth;
    use crate::dma::regs::{
        channel_register, CCR_EN, CCR_RESET, CSAR, CSR_IDLEF, CTR1, CTR2, GPDMA1_BASE,
        GPDMA1_CHANNELS,
    };
    use crate::regs::{Access, AccessKind, SimRegisters};
    use crate::wait::WaitBudget;

    fn reg(ch: u8, offset: usize) -> usize {
        channel_register(GPDMA1_BASE, ch, offset)
    }

    /// Register file where CCR.RESET drops EN, SUSP and itself.
    fn sim() -> SimRegisters {
        let mut regs = SimRegisters::new();
        for ch in [0, 1, 2, 3, 7] {
            regs.self_clearing(reg(ch, CCR), CCR_RESET.mask(), 0b111);
        }
        regs
    }

    fn copy() -> ChannelDescriptor {
        ChannelDescriptor::memory_to_memory(0x2000_0000, 0x2000_4000, 512, DataWidth::Word)
    }

    #[test]
    fn test_channel_out_of_range() {
        let mut dma = GpDma::lpdma1(SimRegisters::new());
        assert!(matches!(dma.channel(4), Err(XferError::InvalidChannel(4))));
        let mut dma = GpDma::gpdma1(SimRegisters::new());
        assert!(dma.channel(GPDMA1_CHANNELS).is_err());
    }

    #[test]
    fn test_lifecycle_writes_en_last() {
        let mut dma = GpDma::gpdma1(sim());
        let ch = dma.channel(2).unwrap().configure(&copy()).unwrap().enable();
        assert_eq!(ch.index(), 2);

        let regs = dma.regs();
        assert_eq!(CCR_EN.unpack(regs.get(reg(2, CCR))), 1);
        // every descriptor register precedes the EN write
        let en = regs.last_write(reg(2, CCR)).unwrap();
        for off in [CTR1, CTR2, CBR1] {
            assert!(regs.last_write(reg(2, off)).unwrap() < en);
        }
    }

    #[test]
    fn test_outcome_precedence() {
        let tc = ChannelFlags::TRANSFER_COMPLETE;
        let dte = ChannelFlags::DATA_TRANSFER_ERROR;
        assert_eq!(Outcome::from_flags(ChannelFlags::empty()), Outcome::Running);
        assert_eq!(Outcome::from_flags(tc), Outcome::Completed);
        assert_eq!(Outcome::from_flags(tc | dte), Outcome::Error(dte));
        assert_eq!(Outcome::from_flags(ChannelFlags::SUSPENDED), Outcome::Suspended);
        assert_eq!(Outcome::from_flags(ChannelFlags::HALF_TRANSFER), Outcome::Running);
    }

    #[test]
    fn test_wait_returns_completion() {
        let mut regs = sim();
        let csr = reg(0, CSR);
        regs.queue_read(csr, 0);
        regs.queue_read(csr, ChannelFlags::HALF_TRANSFER.bits());
        regs.set(csr, ChannelFlags::TRANSFER_COMPLETE.bits() | CSR_IDLEF.mask());
        let mut dma = GpDma::gpdma1(regs);
        let mut ch = dma.channel(0).unwrap().configure(&copy()).unwrap().enable();
        assert_eq!(ch.wait(), Ok(Outcome::Completed));
        ch.clear_flags(ChannelFlags::TRANSFER_COMPLETE);
        let ch = ch.disable().unwrap();
        assert_eq!(ch.index(), 0);
        assert_eq!(dma.regs().get(reg(0, CFCR)), ChannelFlags::TRANSFER_COMPLETE.bits());
    }

    #[test]
    fn test_wait_times_out() {
        let mut dma = GpDma::gpdma1(sim()).with_wait_budget(WaitBudget::Polls(5));
        let mut ch = dma.channel(1).unwrap().configure(&copy()).unwrap().enable();
        assert_eq!(ch.wait(), Err(XferError::Timeout));
        assert_eq!(ch.outcome(), Outcome::Running);
    }

    #[test]
    fn test_suspend_resume_and_remaining() {
        let mut regs = sim();
        regs.set(reg(7, CSR), CSR_IDLEF.mask());
        let mut dma = GpDma::gpdma1(regs);
        let mut ch = dma.channel(7).unwrap().configure(&copy()).unwrap().enable();
        assert_eq!(ch.remaining(), 512);
        ch.suspend();
        ch.resume();
        let ch = ch.reset().unwrap();
        assert_eq!(ch.index(), 7);

        let regs = dma.regs();
        let ccr: Vec<u32> = regs.writes_to(reg(7, CCR)).map(|a| a.value).collect();
        // reset, PRIO update, EN, SUSP, clear SUSP, then SUSP, SUSP|RESET, reset
        assert_eq!(ccr[2..], [0b001, 0b101, 0b001, 0b101, 0b111, 0b010]);
        assert_eq!(regs.get(reg(7, CBR1)), 0);
    }

    /// Trace positions of the SUSP write, the first IDLEF poll after it, the
    /// first RESET write after that, and the first CSAR write after that.
    fn teardown_order(regs: &SimRegisters, ch: u8, from: usize) -> [Option<usize>; 4] {
        let trace = regs.trace().get(from..).unwrap_or_default();
        let susp = trace.iter().position(|a| {
            a.kind == AccessKind::Write
                && a.addr == reg(ch, CCR)
                && CCR_SUSP.unpack(a.value) != 0
        });
        let after = |start: Option<usize>, f: &dyn Fn(&Access) -> bool| {
            let start = start?;
            trace.get(start..)?.iter().position(f).map(|p| p + start)
        };
        let idle = after(susp, &|a| a.kind == AccessKind::Read && a.addr == reg(ch, CSR));
        let reset = after(idle, &|a| {
            a.kind == AccessKind::Write
                && a.addr == reg(ch, CCR)
                && CCR_RESET.unpack(a.value) != 0
        });
        let csar = after(reset, &|a| a.kind == AccessKind::Write && a.addr == reg(ch, CSAR));
        [susp, idle, reset, csar]
    }

    #[test]
    fn test_enabled_reset_drains_before_reset() {
        let mut regs = sim();
        regs.set(reg(0, CSR), CSR_IDLEF.mask());
        let mut dma = GpDma::gpdma1(regs);
        let ch = dma.channel(0).unwrap().configure(&copy()).unwrap().enable();
        let _ch = ch.reset().unwrap();

        let regs = dma.regs();
        let en = regs
            .trace()
            .iter()
            .position(|a| a.kind == AccessKind::Write && a.addr == reg(0, CCR) && a.value == 1)
            .unwrap();
        let [susp, idle, reset, csar] = teardown_order(regs, 0, en);
        assert!(susp.is_some() && idle.is_some() && reset.is_some() && csar.is_some());
        // nothing but CCR and CSR is touched until RESET has been written
        let before_reset = &regs.trace()[en..en + reset.unwrap()];
        assert!(before_reset.iter().all(|a| a.addr == reg(0, CCR) || a.addr == reg(0, CSR)));
        assert_eq!(regs.get(reg(0, CSAR)), 0);
    }

    #[test]
    fn test_enabled_reset_timeout_keeps_descriptor() {
        let mut dma = GpDma::gpdma1(sim()).with_wait_budget(WaitBudget::Polls(3));
        let ch = dma.channel(1).unwrap().configure(&copy()).unwrap().enable();
        assert!(matches!(ch.reset(), Err(XferError::Timeout)));

        let regs = dma.regs();
        assert_eq!(CCR_SUSP.unpack(regs.get(reg(1, CCR))), 1);
        assert_eq!(CCR_EN.unpack(regs.get(reg(1, CCR))), 1);
        assert_eq!(regs.get(reg(1, CSAR)), 0x2000_0000);
        assert_eq!(regs.get(reg(1, CBR1)), 512);
    }

    #[test]
    fn test_claiming_running_channel_drains_it() {
        let mut regs = sim();
        regs.set(reg(2, CSR), CSR_IDLEF.mask());
        let mut dma = GpDma::gpdma1(regs);
        dma.configure(2, &copy()).unwrap();
        dma.enable(2).unwrap();
        let started = dma.regs().trace().len();

        let ch = dma.channel(2).unwrap();
        assert_eq!(ch.index(), 2);
        let regs = dma.regs();
        let [susp, idle, reset, csar] = teardown_order(regs, 2, started);
        assert!(susp < idle && idle < reset && reset < csar);
        assert!(susp.is_some());
        assert_eq!(CCR_EN.unpack(regs.get(reg(2, CCR))), 0);
    }

    #[test]
    fn test_claiming_idle_channel_skips_drain() {
        let mut dma = GpDma::gpdma1(sim());
        let _ch = dma.channel(3).unwrap();
        let regs = dma.regs();
        assert_eq!(regs.count(AccessKind::Read, reg(3, CSR)), 0);
        assert_eq!(regs.writes_to(reg(3, CCR)).count(), 1);
    }

    #[test]
    fn test_claiming_stuck_channel_times_out() {
        let mut dma = GpDma::gpdma1(sim()).with_wait_budget(WaitBudget::Polls(2));
        dma.configure(1, &copy()).unwrap();
        dma.enable(1).unwrap();
        assert!(matches!(dma.channel(1), Err(XferError::Timeout)));
        assert_eq!(dma.regs().count(AccessKind::Read, reg(1, CSR)), 3);
        assert_eq!(dma.regs().get(reg(1, CSAR)), 0x2000_0000);
    }

    #[test]
    fn test_listen_enables_interrupts() {
        let mut dma = GpDma::gpdma1(sim());
        let irq = ChannelFlags::TRANSFER_COMPLETE | ChannelFlags::ERRORS;
        let _ch = dma.channel(3).unwrap().configure(&copy()).unwrap().listen(irq).enable();
        assert_eq!(dma.regs().get(reg(3, CCR)), irq.bits() | CCR_EN.mask());
    }
}

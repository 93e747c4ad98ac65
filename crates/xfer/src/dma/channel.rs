//! GPDMA / LPDMA controller, channel-index API.
//!
//! One method per channel operation; every method validates the channel
//! number before touching a register. [`GpDma::channel`] hands out the
//! typestate [`Channel`](super::Channel) handle for code that wants the
//! Reset → Configured → Enabled ordering checked at compile time.

use super::descriptor::{
    ChannelDescriptor, DataWidth, DestinationSwap, Priority, Request, TransferCompleteMode,
};
use super::regs::{
    channel_register, ChannelFlags, LinkUpdate, CBR1, CBR1_BNDT, CCR, CCR_EN, CCR_PRIO, CCR_RESET,
    CCR_SUSP, CDAR, CFCR, CLBAR, CLBAR_MASK, CLLR, CLLR_LA_MASK, CSAR, CSR, CSR_FIFOL, CSR_IDLEF,
    CTR1, CTR1_DAP, CTR1_DBL_1, CTR1_DDW, CTR1_DEST_SWAP, CTR1_DINC, CTR1_DSEC, CTR1_SAP,
    CTR1_SBL_1, CTR1_SBX, CTR1_SDW, CTR1_SINC, CTR1_SSEC, CTR2, CTR2_BREQ, CTR2_DREQ, CTR2_REQSEL,
    CTR2_SWREQ, CTR2_TCEM, CTR2_TRIGSEL, CTR3, CTR3_DAO, CTR3_SAO, GPDMA1_BASE, GPDMA1_CHANNELS,
    LPDMA1_BASE, LPDMA1_CHANNELS,
};
use crate::error::XferError;
use crate::regs::{Field, RegisterFile};
use crate::wait::WaitBudget;

/// Snapshot of one channel's CSR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelStatus {
    /// IDLEF: channel is not transferring
    pub idle: bool,
    /// FIFOL: beats held in the channel FIFO
    pub fifo_level: u8,
    /// Event flags
    pub flags: ChannelFlags,
}

impl ChannelStatus {
    /// Decode a raw CSR value.
    #[allow(clippy::cast_possible_truncation)] // Safety: FIFOL is 8 bits
    pub fn from_bits(csr: u32) -> Self {
        Self {
            idle: CSR_IDLEF.unpack(csr) != 0,
            fifo_level: CSR_FIFOL.unpack(csr) as u8,
            flags: ChannelFlags::from_bits_truncate(csr),
        }
    }
}

/// Validate a burst length and return the CTR1 field value (beats − 1).
pub(crate) fn burst_field(beats: u8) -> Result<u32, XferError> {
    match beats {
        1..=64 => Ok(u32::from(beats.saturating_sub(1))),
        _ => Err(XferError::BurstOutOfRange(beats)),
    }
}

fn port_field(port: u8) -> Result<u32, XferError> {
    match port {
        0 | 1 => Ok(u32::from(port)),
        _ => Err(XferError::InvalidPort(port)),
    }
}

/// GPDMA or LPDMA controller bound to a register file.
pub struct GpDma<R> {
    regs: R,
    base: usize,
    channels: u8,
    budget: WaitBudget,
}

impl<R: RegisterFile> GpDma<R> {
    /// Bind a controller at `base` with `channels` channels.
    pub fn new(regs: R, base: usize, channels: u8) -> Self {
        Self {
            regs,
            base,
            channels,
            budget: WaitBudget::Infinite,
        }
    }

    /// GPDMA1 (16 channels).
    pub fn gpdma1(regs: R) -> Self {
        Self::new(regs, GPDMA1_BASE, GPDMA1_CHANNELS)
    }

    /// LPDMA1 (4 channels).
    pub fn lpdma1(regs: R) -> Self {
        Self::new(regs, LPDMA1_BASE, LPDMA1_CHANNELS)
    }

    /// Replace the wait budget used by [`GpDma::disable`] and
    /// [`Channel::wait`](super::Channel::wait).
    #[must_use]
    pub fn with_wait_budget(mut self, budget: WaitBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Current wait budget.
    pub fn wait_budget(&self) -> WaitBudget {
        self.budget
    }

    /// Controller base address.
    pub fn base(&self) -> usize {
        self.base
    }

    /// Number of channels.
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Borrow the register file.
    pub fn regs(&self) -> &R {
        &self.regs
    }

    /// Mutably borrow the register file.
    pub fn regs_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    /// Give the register file back.
    pub fn release(self) -> R {
        self.regs
    }

    // ── addressing ──────────────────────────────────────────────────────────

    pub(super) fn check(&self, channel: u8) -> Result<(), XferError> {
        if channel < self.channels {
            Ok(())
        } else {
            Err(XferError::InvalidChannel(channel))
        }
    }

    /// Address of a channel register. `channel` must already be checked.
    pub(super) fn addr(&self, channel: u8, offset: usize) -> usize {
        channel_register(self.base, channel, offset)
    }

    fn reg(&self, channel: u8, offset: usize) -> Result<usize, XferError> {
        self.check(channel)?;
        Ok(self.addr(channel, offset))
    }

    fn write_field(
        &mut self,
        channel: u8,
        offset: usize,
        field: Field,
        value: u32,
    ) -> Result<(), XferError> {
        let addr = self.reg(channel, offset)?;
        self.regs.write_field(addr, field, value);
        Ok(())
    }

    // ── composite operations ────────────────────────────────────────────────

    /// Put the channel back into its reset state.
    ///
    /// A channel with CCR.EN set is first taken down the same way as
    /// [`GpDma::disable`]: suspend, wait for IDLEF, reset. Then CCR.RESET is
    /// written (hardware drops EN and SUSP and flushes the FIFO) and CTR1,
    /// CTR2, CTR3, CBR1, CSAR, CDAR, CLLR and CLBAR are zeroed so no stale
    /// configuration survives.
    ///
    /// On [`XferError::Timeout`] the running channel is left suspended and
    /// none of its descriptor registers has been touched.
    pub fn reset(&mut self, channel: u8) -> Result<(), XferError> {
        self.check(channel)?;
        self.reset_unchecked(channel)
    }

    pub(super) fn reset_unchecked(&mut self, channel: u8) -> Result<(), XferError> {
        let ccr = self.addr(channel, CCR);
        if CCR_EN.unpack(self.regs.read32(ccr)) != 0 {
            self.disable_unchecked(channel)?;
        }
        self.clear_unchecked(channel);
        Ok(())
    }

    /// Reset and zero a channel that is known to be disabled.
    pub(super) fn clear_unchecked(&mut self, channel: u8) {
        debug!("gpdma ch{}: reset", channel);
        let ccr = self.addr(channel, CCR);
        self.regs.write32(ccr, CCR_RESET.mask());
        for offset in [CTR1, CTR2, CTR3, CBR1, CSAR, CDAR, CLLR, CLBAR] {
            let addr = self.addr(channel, offset);
            self.regs.write32(addr, 0);
        }
    }

    /// Program every descriptor field into a disabled channel.
    ///
    /// Burst lengths and ports are validated first; on error no register
    /// is written. Interrupt enables in CCR are preserved.
    pub fn configure(&mut self, channel: u8, desc: &ChannelDescriptor) -> Result<(), XferError> {
        self.check(channel)?;
        self.configure_unchecked(channel, desc)
    }

    pub(super) fn configure_unchecked(
        &mut self,
        channel: u8,
        desc: &ChannelDescriptor,
    ) -> Result<(), XferError> {
        let src = &desc.source;
        let dst = &desc.destination;
        let sbl = burst_field(src.burst)
            .inspect_err(|_| warn!("gpdma ch{}: source burst {} rejected", channel, src.burst))?;
        let dbl = burst_field(dst.burst).inspect_err(|_| {
            warn!("gpdma ch{}: destination burst {} rejected", channel, dst.burst);
        })?;
        let sap = port_field(src.port)?;
        let dap = port_field(dst.port)?;

        let ctr1 = CTR1_SDW.pack(src.width.bits())
            | CTR1_SINC.pack(u32::from(src.increment))
            | CTR1_SBL_1.pack(sbl)
            | CTR1_SAP.pack(sap)
            | CTR1_DDW.pack(dst.width.bits())
            | CTR1_DINC.pack(u32::from(dst.increment))
            | CTR1_DBL_1.pack(dbl)
            | CTR1_DEST_SWAP.pack(desc.destination_swap.bits())
            | CTR1_DAP.pack(dap);

        let request = match desc.request {
            Request::Software => CTR2_SWREQ.mask(),
            Request::Hardware(line) => CTR2_REQSEL.pack(u32::from(line)),
        };
        let ctr2 = request
            | desc.trigger.map_or(0, |t| CTR2_TRIGSEL.pack(u32::from(t)))
            | CTR2_DREQ.pack(u32::from(desc.destination_flow_control))
            | CTR2_BREQ.pack(u32::from(desc.block_request))
            | CTR2_TCEM.pack(desc.complete_mode.bits());

        let ctr3 = CTR3_SAO.pack(u32::from(src.stride)) | CTR3_DAO.pack(u32::from(dst.stride));

        for (offset, value) in [
            (CTR1, ctr1),
            (CTR2, ctr2),
            (CTR3, ctr3),
            (CBR1, CBR1_BNDT.pack(u32::from(desc.block_size))),
            (CSAR, src.address),
            (CDAR, dst.address),
        ] {
            let addr = self.addr(channel, offset);
            self.regs.write32(addr, value);
        }

        match desc.linked_list {
            Some((pointer, update)) => self.set_linked_list_unchecked(channel, pointer, update),
            None => {
                let cllr = self.addr(channel, CLLR);
                self.regs.write32(cllr, 0);
            }
        }

        let ccr = self.addr(channel, CCR);
        self.regs.write_field(ccr, CCR_PRIO, desc.priority.bits());

        debug!(
            "gpdma ch{}: configured {} bytes {} -> {}",
            channel, desc.block_size, src.address, dst.address
        );
        Ok(())
    }

    /// Set CCR.EN. The channel starts on its first request (or at once for
    /// software requests).
    pub fn enable(&mut self, channel: u8) -> Result<(), XferError> {
        self.check(channel)?;
        self.enable_unchecked(channel);
        Ok(())
    }

    pub(super) fn enable_unchecked(&mut self, channel: u8) {
        debug!("gpdma ch{}: enable", channel);
        let ccr = self.addr(channel, CCR);
        self.regs.set_bits32(ccr, CCR_EN.mask());
    }

    /// Suspend, wait for IDLEF, then reset the channel.
    ///
    /// The IDLEF wait is bounded by the controller's [`WaitBudget`]; on
    /// [`XferError::Timeout`] the channel is left suspended.
    pub fn disable(&mut self, channel: u8) -> Result<(), XferError> {
        self.check(channel)?;
        self.disable_unchecked(channel)
    }

    pub(super) fn disable_unchecked(&mut self, channel: u8) -> Result<(), XferError> {
        debug!("gpdma ch{}: disable", channel);
        let ccr = self.addr(channel, CCR);
        self.regs.set_bits32(ccr, CCR_SUSP.mask());
        self.wait_idle(channel)?;
        self.regs.set_bits32(ccr, CCR_RESET.mask());
        Ok(())
    }

    pub(super) fn wait_idle(&mut self, channel: u8) -> Result<(), XferError> {
        let csr = self.addr(channel, CSR);
        let budget = self.budget;
        let regs = &mut self.regs;
        budget.poll(|| CSR_IDLEF.unpack(regs.read32(csr)) != 0)
    }

    /// Point the channel at its first linked-list item.
    ///
    /// CLBAR takes the upper half-word of `pointer`; CLLR takes the lower
    /// half-word with bits 1:0 dropped, ORed with `update`. Unaligned
    /// pointers are truncated, not rejected.
    pub fn set_linked_list(
        &mut self,
        channel: u8,
        pointer: u32,
        update: LinkUpdate,
    ) -> Result<(), XferError> {
        self.check(channel)?;
        self.set_linked_list_unchecked(channel, pointer, update);
        Ok(())
    }

    fn set_linked_list_unchecked(&mut self, channel: u8, pointer: u32, update: LinkUpdate) {
        let clbar = self.addr(channel, CLBAR);
        let cllr = self.addr(channel, CLLR);
        self.regs.write32(clbar, pointer & CLBAR_MASK);
        self.regs.write32(cllr, (pointer & CLLR_LA_MASK) | update.bits());
    }

    // ── CSR / CFCR / CCR ────────────────────────────────────────────────────

    /// Clear event flags (write-one-to-clear through CFCR).
    pub fn clear_flags(&mut self, channel: u8, flags: ChannelFlags) -> Result<(), XferError> {
        let addr = self.reg(channel, CFCR)?;
        self.regs.write32(addr, flags.bits());
        Ok(())
    }

    /// Whether any of `flags` is set in CSR.
    pub fn flag(&mut self, channel: u8, flags: ChannelFlags) -> Result<bool, XferError> {
        Ok(self.status(channel)?.flags.intersects(flags))
    }

    /// Read CSR.
    pub fn status(&mut self, channel: u8) -> Result<ChannelStatus, XferError> {
        let addr = self.reg(channel, CSR)?;
        Ok(ChannelStatus::from_bits(self.regs.read32(addr)))
    }

    /// Clear any stale `flags`, then enable their interrupts in CCR.
    pub fn enable_interrupts(&mut self, channel: u8, flags: ChannelFlags) -> Result<(), XferError> {
        self.clear_flags(channel, flags)?;
        let addr = self.reg(channel, CCR)?;
        self.regs.set_bits32(addr, flags.bits());
        Ok(())
    }

    /// Disable the interrupts for `flags`.
    pub fn disable_interrupts(
        &mut self,
        channel: u8,
        flags: ChannelFlags,
    ) -> Result<(), XferError> {
        let addr = self.reg(channel, CCR)?;
        self.regs.clear_bits32(addr, flags.bits());
        Ok(())
    }

    /// Set CCR.PRIO.
    pub fn set_priority(&mut self, channel: u8, priority: Priority) -> Result<(), XferError> {
        self.write_field(channel, CCR, CCR_PRIO, priority.bits())
    }

    // ── CTR1 ────────────────────────────────────────────────────────────────

    /// Set the source beat size.
    pub fn set_source_width(&mut self, channel: u8, width: DataWidth) -> Result<(), XferError> {
        self.write_field(channel, CTR1, CTR1_SDW, width.bits())
    }

    /// Set the destination beat size.
    pub fn set_destination_width(
        &mut self,
        channel: u8,
        width: DataWidth,
    ) -> Result<(), XferError> {
        self.write_field(channel, CTR1, CTR1_DDW, width.bits())
    }

    /// Enable or disable source address increment.
    pub fn set_source_increment(&mut self, channel: u8, on: bool) -> Result<(), XferError> {
        self.write_field(channel, CTR1, CTR1_SINC, u32::from(on))
    }

    /// Enable or disable destination address increment.
    pub fn set_destination_increment(&mut self, channel: u8, on: bool) -> Result<(), XferError> {
        self.write_field(channel, CTR1, CTR1_DINC, u32::from(on))
    }

    /// Set the source burst length in beats (1–64).
    ///
    /// Out-of-range values return [`XferError::BurstOutOfRange`] and write
    /// nothing.
    pub fn set_source_burst(&mut self, channel: u8, beats: u8) -> Result<(), XferError> {
        self.check(channel)?;
        let value = burst_field(beats)
            .inspect_err(|_| warn!("gpdma ch{}: source burst {} rejected", channel, beats))?;
        self.write_field(channel, CTR1, CTR1_SBL_1, value)
    }

    /// Set the destination burst length in beats (1–64).
    ///
    /// Out-of-range values return [`XferError::BurstOutOfRange`] and write
    /// nothing.
    pub fn set_destination_burst(&mut self, channel: u8, beats: u8) -> Result<(), XferError> {
        self.check(channel)?;
        let value = burst_field(beats).inspect_err(|_| {
            warn!("gpdma ch{}: destination burst {} rejected", channel, beats);
        })?;
        self.write_field(channel, CTR1, CTR1_DBL_1, value)
    }

    /// Mark the source as secure or non-secure.
    pub fn set_source_secure(&mut self, channel: u8, secure: bool) -> Result<(), XferError> {
        self.write_field(channel, CTR1, CTR1_SSEC, u32::from(secure))
    }

    /// Mark the destination as secure or non-secure.
    pub fn set_destination_secure(&mut self, channel: u8, secure: bool) -> Result<(), XferError> {
        self.write_field(channel, CTR1, CTR1_DSEC, u32::from(secure))
    }

    /// Swap bytes within source half-words.
    pub fn set_source_byte_exchange(&mut self, channel: u8, on: bool) -> Result<(), XferError> {
        self.write_field(channel, CTR1, CTR1_SBX, u32::from(on))
    }

    /// Reorder destination data.
    pub fn set_destination_swapping(
        &mut self,
        channel: u8,
        swap: DestinationSwap,
    ) -> Result<(), XferError> {
        self.write_field(channel, CTR1, CTR1_DEST_SWAP, swap.bits())
    }

    /// Allocate the source to AHB port 0 or 1.
    pub fn set_source_port(&mut self, channel: u8, port: u8) -> Result<(), XferError> {
        let value = port_field(port)?;
        self.write_field(channel, CTR1, CTR1_SAP, value)
    }

    /// Allocate the destination to AHB port 0 or 1.
    pub fn set_destination_port(&mut self, channel: u8, port: u8) -> Result<(), XferError> {
        let value = port_field(port)?;
        self.write_field(channel, CTR1, CTR1_DAP, value)
    }

    // ── CTR2 ────────────────────────────────────────────────────────────────

    /// Select the hardware request line.
    pub fn request_select(&mut self, channel: u8, request: u8) -> Result<(), XferError> {
        self.write_field(channel, CTR2, CTR2_REQSEL, u32::from(request))
    }

    /// Select the trigger input.
    pub fn trigger_select(&mut self, channel: u8, trigger: u8) -> Result<(), XferError> {
        self.write_field(channel, CTR2, CTR2_TRIGSEL, u32::from(trigger))
    }

    /// Choose when TCF is raised.
    pub fn set_transfer_complete_mode(
        &mut self,
        channel: u8,
        mode: TransferCompleteMode,
    ) -> Result<(), XferError> {
        self.write_field(channel, CTR2, CTR2_TCEM, mode.bits())
    }

    /// Each request moves a whole block.
    pub fn set_block_flow_control(&mut self, channel: u8) -> Result<(), XferError> {
        self.write_field(channel, CTR2, CTR2_BREQ, 1)
    }

    /// Each request moves one burst.
    pub fn set_burst_flow_control(&mut self, channel: u8) -> Result<(), XferError> {
        self.write_field(channel, CTR2, CTR2_BREQ, 0)
    }

    /// The source peripheral paces the transfer.
    pub fn set_source_flow_control(&mut self, channel: u8) -> Result<(), XferError> {
        self.write_field(channel, CTR2, CTR2_DREQ, 0)
    }

    /// The destination peripheral paces the transfer.
    pub fn set_destination_flow_control(&mut self, channel: u8) -> Result<(), XferError> {
        self.write_field(channel, CTR2, CTR2_DREQ, 1)
    }

    /// Software request: the transfer starts when the channel is enabled.
    pub fn set_software_request(&mut self, channel: u8) -> Result<(), XferError> {
        self.write_field(channel, CTR2, CTR2_SWREQ, 1)
    }

    /// Hardware request: the transfer waits for the selected request line.
    pub fn set_hardware_request(&mut self, channel: u8) -> Result<(), XferError> {
        self.write_field(channel, CTR2, CTR2_SWREQ, 0)
    }

    // ── CTR3 / CBR1 / CSAR / CDAR ───────────────────────────────────────────

    /// Source address offset between bursts (13 bits).
    pub fn set_source_stride(&mut self, channel: u8, stride: u16) -> Result<(), XferError> {
        self.write_field(channel, CTR3, CTR3_SAO, u32::from(stride))
    }

    /// Destination address offset between bursts (13 bits).
    pub fn set_destination_stride(&mut self, channel: u8, stride: u16) -> Result<(), XferError> {
        self.write_field(channel, CTR3, CTR3_DAO, u32::from(stride))
    }

    /// Write CSAR.
    pub fn set_source_address(&mut self, channel: u8, address: u32) -> Result<(), XferError> {
        let addr = self.reg(channel, CSAR)?;
        self.regs.write32(addr, address);
        Ok(())
    }

    /// Write CDAR.
    pub fn set_destination_address(&mut self, channel: u8, address: u32) -> Result<(), XferError> {
        let addr = self.reg(channel, CDAR)?;
        self.regs.write32(addr, address);
        Ok(())
    }

    /// Bytes left in the current block (CBR1.BNDT).
    #[allow(clippy::cast_possible_truncation)] // Safety: BNDT is 16 bits
    pub fn number_of_data(&mut self, channel: u8) -> Result<u16, XferError> {
        let addr = self.reg(channel, CBR1)?;
        Ok(CBR1_BNDT.unpack(self.regs.read32(addr)) as u16)
    }

    /// Write CBR1.BNDT (block size in bytes).
    pub fn set_number_of_data(&mut self, channel: u8, bytes: u16) -> Result<(), XferError> {
        let addr = self.reg(channel, CBR1)?;
        self.regs.write32(addr, u32::from(bytes));
        Ok(())
    }
}

//! GPDMA channel programming against the simulated register file.

#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::indexing_slicing)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use xfer::dma::regs::{
    CBR1, CCR, CCR_EN, CCR_RESET, CDAR, CLBAR, CLLR, CSAR, CSR, CSR_IDLEF, CTR1, CTR1_DBL_1,
    CTR1_SBL_1, CTR2, CTR3,
};
use xfer::dma::{
    channel_register, ChannelDescriptor, ChannelFlags, DataWidth, GpDma, LinkUpdate, Outcome,
    Priority, GPDMA1_BASE, GPDMA1_CHANNELS,
};
use xfer::{AccessKind, SimRegisters, XferError};

fn reg(ch: u8, offset: usize) -> usize {
    channel_register(GPDMA1_BASE, ch, offset)
}

// ── Burst bounds ───────────────────────────────────────────────────────────

proptest! {
    /// Lengths 1..=64 are stored as length − 1.
    #[test]
    fn burst_in_range_stores_minus_one(ch in 0u8..16, beats in 1u8..=64) {
        let mut dma = GpDma::gpdma1(SimRegisters::new());
        dma.set_source_burst(ch, beats).unwrap();
        dma.set_destination_burst(ch, beats).unwrap();
        let ctr1 = dma.regs().get(reg(ch, CTR1));
        prop_assert_eq!(CTR1_SBL_1.unpack(ctr1), u32::from(beats) - 1);
        prop_assert_eq!(CTR1_DBL_1.unpack(ctr1), u32::from(beats) - 1);
    }

    /// Anything else is rejected without a single register access.
    #[test]
    fn burst_out_of_range_touches_nothing(
        ch in 0u8..16,
        beats in prop_oneof![Just(0u8), 65u8..=255],
    ) {
        let mut dma = GpDma::gpdma1(SimRegisters::new());
        let rejected = Err(XferError::BurstOutOfRange(beats));
        prop_assert_eq!(dma.set_source_burst(ch, beats), rejected);
        prop_assert_eq!(dma.set_destination_burst(ch, beats), rejected);
        prop_assert!(dma.regs().trace().is_empty());
    }

    /// Linked-list pointers are split and masked, never rejected.
    #[test]
    fn linked_list_pointer_masking(ptr in any::<u32>()) {
        let mut dma = GpDma::gpdma1(SimRegisters::new());
        dma.set_linked_list(0, ptr, LinkUpdate::LINK).unwrap();
        let regs = dma.regs();
        prop_assert_eq!(regs.get(reg(0, CLBAR)), ptr & 0xFFFF_0000);
        prop_assert_eq!(regs.get(reg(0, CLLR)) & 0xFFFF, ptr & 0xFFFC);
        prop_assert_eq!(regs.get(reg(0, CLLR)) & 0b11, 0);
    }
}

// ── Linked-list alignment ──────────────────────────────────────────────────

#[test]
fn unaligned_linked_list_pointer_is_truncated() {
    let mut dma = GpDma::gpdma1(SimRegisters::new());
    let update = LinkUpdate::TRANSFER_1 | LinkUpdate::BLOCK | LinkUpdate::LINK;
    dma.set_linked_list(4, 0x2000_1003, update).unwrap();

    let regs = dma.regs();
    assert_eq!(regs.get(reg(4, CLBAR)), 0x2000_0000);
    assert_eq!(regs.get(reg(4, CLLR)) & 0xFFFF, 0x1000);
    assert_eq!(regs.get(reg(4, CLLR)) & !0xFFFF, update.bits());
}

// ── Reset ──────────────────────────────────────────────────────────────────

#[test]
fn reset_clears_enable_address_and_count() {
    let mut regs = SimRegisters::new();
    regs.self_clearing(reg(6, CCR), CCR_RESET.mask(), 0b111);
    regs.set(reg(6, CSR), CSR_IDLEF.mask());
    let mut dma = GpDma::gpdma1(regs);

    let desc =
        ChannelDescriptor::memory_to_memory(0x2000_0000, 0x3000_0000, 1024, DataWidth::Word)
        .priority(Priority::VeryHigh)
        .linked_list(0x2000_8000, LinkUpdate::LINK);
    dma.configure(6, &desc).unwrap();
    dma.enable(6).unwrap();
    assert_eq!(CCR_EN.unpack(dma.regs().get(reg(6, CCR))), 1);

    dma.reset(6).unwrap();
    let regs = dma.regs();
    assert_eq!(CCR_EN.unpack(regs.get(reg(6, CCR))), 0);
    for offset in [CTR1, CTR2, CTR3, CBR1, CSAR, CDAR, CLLR, CLBAR] {
        assert_eq!(regs.get(reg(6, offset)), 0, "offset {offset:#x}");
    }
}

#[test]
fn reset_touches_only_its_channel() {
    let mut dma = GpDma::gpdma1(SimRegisters::new());
    dma.reset(9).unwrap();
    let lo = reg(9, 0);
    let hi = reg(10, 0);
    assert!(dma.regs().trace().iter().all(|a| (lo..hi).contains(&a.addr)));
}

#[test]
fn every_channel_keeps_its_own_descriptor() {
    let mut dma = GpDma::gpdma1(SimRegisters::new());
    for ch in 0..GPDMA1_CHANNELS {
        let src = 0x2000_0000 + u32::from(ch);
        let desc = ChannelDescriptor::memory_to_memory(src, 0x2400_0000, 64, DataWidth::Byte);
        dma.configure(ch, &desc).unwrap();
    }

    let regs = dma.regs();
    assert_eq!(regs.overflowed(), 0);
    for ch in 0..GPDMA1_CHANNELS {
        assert_eq!(regs.get(reg(ch, CSAR)), 0x2000_0000 + u32::from(ch), "channel {ch}");
        assert_eq!(regs.get(reg(ch, CBR1)), 64);
    }
}

// ── Memory-to-memory copy, end to end ──────────────────────────────────────

#[test]
fn memory_copy_lifecycle() {
    let mut regs = SimRegisters::new();
    regs.self_clearing(reg(0, CCR), CCR_RESET.mask(), 0b111);
    // two polls running, then complete
    regs.queue_read(reg(0, CSR), 0);
    regs.queue_read(reg(0, CSR), ChannelFlags::HALF_TRANSFER.bits());
    regs.set(reg(0, CSR), ChannelFlags::TRANSFER_COMPLETE.bits() | CSR_IDLEF.mask());
    let mut dma = GpDma::gpdma1(regs);

    let desc =
        ChannelDescriptor::memory_to_memory(0x2000_0000, 0x2400_0000, 4096, DataWidth::Word);
    let mut ch = dma.channel(0).unwrap().configure(&desc).unwrap().enable();
    assert_eq!(ch.wait(), Ok(Outcome::Completed));
    ch.clear_flags(ChannelFlags::TRANSFER_COMPLETE);
    ch.disable().unwrap();

    let regs = dma.regs();
    assert_eq!(regs.get(reg(0, CSAR)), 0x2000_0000);
    assert_eq!(regs.get(reg(0, CDAR)), 0x2400_0000);
    assert_eq!(regs.get(reg(0, CBR1)), 4096);
    // three polls, one outcome read, one idle check
    assert_eq!(regs.count(AccessKind::Read, reg(0, CSR)), 5);
    // disable ends with a reset write
    let last = regs.writes_to(reg(0, CCR)).last().unwrap();
    assert_eq!(last.value & CCR_RESET.mask(), CCR_RESET.mask());
}

#[test]
fn error_flags_surface_as_outcome() {
    let mut regs = SimRegisters::new();
    let flags = ChannelFlags::TRANSFER_COMPLETE | ChannelFlags::USER_SETTING_ERROR;
    regs.set(reg(2, CSR), flags.bits());
    let mut dma = GpDma::gpdma1(regs);

    let desc =
        ChannelDescriptor::memory_to_memory(0x2000_0000, 0x2000_0100, 16, DataWidth::Byte);
    let mut ch = dma.channel(2).unwrap().configure(&desc).unwrap().enable();
    assert_eq!(ch.wait(), Ok(Outcome::Error(ChannelFlags::USER_SETTING_ERROR)));
    assert!(ch.status().flags.contains(ChannelFlags::TRANSFER_COMPLETE));
}

//! Legacy seven-channel DMA: every operation stays inside its own channel.

#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::unwrap_used)]

use xfer::dma::legacy::{CCR1, CMAR1, CNDTR1, CPAR1, IFCR, LEGACY_STRIDE};
use xfer::dma::{DataWidth, LegacyDma, LegacyFlags, Priority, DMA1_BASE};
use xfer::{AccessKind, SimRegisters, XferError};

fn channel_block(channel: u8) -> core::ops::Range<usize> {
    let start = DMA1_BASE + CCR1 + LEGACY_STRIDE * usize::from(channel - 1);
    start..start + LEGACY_STRIDE
}

/// Program a peripheral-to-memory receive on `channel`, the way a UART RX
/// driver would.
fn program_rx(dma: &mut LegacyDma<SimRegisters>, channel: u8) -> Result<(), XferError> {
    dma.channel_reset(channel)?;
    dma.set_peripheral_address(channel, 0x4001_3804)?;
    dma.set_memory_address(channel, 0x2000_0400)?;
    dma.set_number_of_data(channel, 64)?;
    dma.set_priority(channel, Priority::High)?;
    dma.set_peripheral_size(channel, DataWidth::Byte)?;
    dma.set_memory_size(channel, DataWidth::Byte)?;
    dma.set_memory_increment(channel, true)?;
    dma.set_read_from_peripheral(channel)?;
    dma.enable_circular_mode(channel)?;
    dma.set_transfer_complete_interrupt(channel, true)?;
    dma.enable_channel(channel)
}

#[test]
fn each_channel_is_isolated() {
    for channel in 1..=7 {
        let mut dma = LegacyDma::dma1(SimRegisters::new());
        program_rx(&mut dma, channel).unwrap();

        let block = channel_block(channel);
        for access in dma.regs().trace() {
            assert!(
                block.contains(&access.addr) || access.addr == DMA1_BASE + IFCR,
                "channel {channel} touched {:#x}",
                access.addr
            );
        }
    }
}

#[test]
fn programming_channel_five_leaves_six_and_seven_alone() {
    let mut dma = LegacyDma::dma1(SimRegisters::new());
    program_rx(&mut dma, 5).unwrap();

    let regs = dma.regs();
    for other in [6u8, 7] {
        let block = channel_block(other);
        assert_eq!(
            regs.trace().iter().filter(|a| block.contains(&a.addr)).count(),
            0
        );
    }
    let ccr5 = channel_block(5).start;
    assert_eq!(regs.get(ccr5) & 1, 1);
    assert_eq!(regs.get(ccr5 + CNDTR1 - CCR1), 64);
    assert_eq!(regs.get(ccr5 + CPAR1 - CCR1), 0x4001_3804);
    assert_eq!(regs.get(ccr5 + CMAR1 - CCR1), 0x2000_0400);
}

#[test]
fn reset_clears_only_own_flags() {
    let mut dma = LegacyDma::dma1(SimRegisters::new());
    dma.channel_reset(3).unwrap();
    let regs = dma.regs();
    assert_eq!(regs.count(AccessKind::Write, DMA1_BASE + IFCR), 1);
    assert_eq!(regs.get(DMA1_BASE + IFCR), 0xF << 8);
}

#[test]
fn out_of_range_channels_rejected() {
    let mut dma = LegacyDma::dma1(SimRegisters::new());
    for channel in [0u8, 8, 255] {
        assert_eq!(dma.channel_reset(channel), Err(XferError::InvalidChannel(channel)));
        assert_eq!(
            dma.clear_interrupt_flags(channel, LegacyFlags::all()),
            Err(XferError::InvalidChannel(channel))
        );
    }
    assert!(dma.regs().trace().is_empty());
}

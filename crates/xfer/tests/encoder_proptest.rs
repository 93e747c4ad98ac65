//! Property-based tests for the QUADSPI command encoder.
//! Verifies invariants hold for ALL commands, not just the flash presets.

#![allow(clippy::arithmetic_side_effects)]

use proptest::prelude::*;
use xfer::quadspi::regs::{
    CCR_ABMODE, CCR_ABSIZE, CCR_ADMODE, CCR_ADSIZE, CCR_DCYC, CCR_DMODE, CCR_FMODE, CCR_IMODE,
    CCR_INSTRUCTION,
};
use xfer::quadspi::{encode, LineMode, PhaseSize, TransferCommand};

fn line_mode() -> impl Strategy<Value = LineMode> {
    (0u32..4).prop_map(LineMode::from_bits)
}

fn phase_size() -> impl Strategy<Value = PhaseSize> {
    (0u32..4).prop_map(PhaseSize::from_bits)
}

prop_compose! {
    fn command()(
        imode in line_mode(),
        opcode in any::<u8>(),
        admode in line_mode(),
        adsize in phase_size(),
        address in any::<u32>(),
        abmode in line_mode(),
        absize in phase_size(),
        alternate in any::<u32>(),
        dummy in 0u8..32,
        dmode in line_mode(),
        flags in 0u8..8,
    ) -> TransferCommand {
        let mut cmd = TransferCommand::new()
            .instruction(imode, opcode)
            .address(admode, adsize, address)
            .alternate_bytes(abmode, absize, alternate)
            .dummy_cycles(dummy)
            .data(dmode);
        cmd.double_data_rate = flags & 0b001 != 0;
        cmd.ddr_hold = flags & 0b010 != 0;
        cmd.send_instruction_once = flags & 0b100 != 0;
        cmd
    }
}

proptest! {
    /// Encoding is a pure function of the command.
    #[test]
    fn encode_is_deterministic(cmd in command()) {
        prop_assert_eq!(encode(&cmd), encode(&cmd));
        let copy = cmd;
        prop_assert_eq!(encode(&copy), encode(&cmd));
    }

    /// FMODE is the engine's business, never the encoder's.
    #[test]
    fn encode_leaves_fmode_clear(cmd in command()) {
        prop_assert_eq!(CCR_FMODE.unpack(encode(&cmd)), 0);
    }

    /// Every field decodes back to what the command asked for, and skipped
    /// phases contribute nothing.
    #[test]
    fn encode_fields_decode(cmd in command()) {
        let ccr = encode(&cmd);

        if cmd.instruction.mode.is_present() {
            prop_assert_eq!(CCR_IMODE.unpack(ccr), cmd.instruction.mode.bits());
            prop_assert_eq!(CCR_INSTRUCTION.unpack(ccr), u32::from(cmd.instruction.opcode));
        } else {
            prop_assert_eq!(ccr & (CCR_IMODE.mask() | CCR_INSTRUCTION.mask()), 0);
        }

        if cmd.address.mode.is_present() {
            prop_assert_eq!(CCR_ADMODE.unpack(ccr), cmd.address.mode.bits());
            prop_assert_eq!(CCR_ADSIZE.unpack(ccr), cmd.address.size.bits());
        } else {
            prop_assert_eq!(ccr & (CCR_ADMODE.mask() | CCR_ADSIZE.mask()), 0);
        }

        if cmd.alternate_bytes.mode.is_present() {
            prop_assert_eq!(CCR_ABMODE.unpack(ccr), cmd.alternate_bytes.mode.bits());
            prop_assert_eq!(CCR_ABSIZE.unpack(ccr), cmd.alternate_bytes.size.bits());
        } else {
            prop_assert_eq!(ccr & (CCR_ABMODE.mask() | CCR_ABSIZE.mask()), 0);
        }

        prop_assert_eq!(CCR_DCYC.unpack(ccr), u32::from(cmd.dummy_cycles));
        prop_assert_eq!(CCR_DMODE.unpack(ccr), cmd.data_mode.bits());
        prop_assert_eq!(ccr >> 31 == 1, cmd.double_data_rate);
        prop_assert_eq!((ccr >> 30) & 1 == 1, cmd.ddr_hold);
        prop_assert_eq!((ccr >> 28) & 1 == 1, cmd.send_instruction_once);
    }

    /// Address and alternate values never reach CCR.
    #[test]
    fn encode_ignores_phase_values(
        cmd in command(),
        address in any::<u32>(),
        alternate in any::<u32>(),
    ) {
        let mut other = cmd;
        other.address.value = address;
        other.alternate_bytes.value = alternate;
        prop_assert_eq!(encode(&other), encode(&cmd));
    }
}

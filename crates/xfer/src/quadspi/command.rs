//! QuadSPI transaction descriptor and its CCR encoding.

use super::regs::{
    CCR_ABMODE, CCR_ABSIZE, CCR_ADMODE, CCR_ADSIZE, CCR_DCYC, CCR_DDRM, CCR_DHHC, CCR_DMODE,
    CCR_IMODE, CCR_INSTRUCTION, CCR_SIOO,
};

/// Number of lines a phase is driven on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineMode {
    /// Phase skipped
    #[default]
    None,
    /// 1 line (classic SPI)
    Single,
    /// 2 lines
    Dual,
    /// 4 lines
    Quad,
}

impl LineMode {
    /// Field value for IMODE / ADMODE / ABMODE / DMODE.
    pub const fn bits(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Single => 1,
            Self::Dual => 2,
            Self::Quad => 3,
        }
    }

    /// Inverse of [`LineMode::bits`]; only the low two bits are used.
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => Self::None,
            1 => Self::Single,
            2 => Self::Dual,
            _ => Self::Quad,
        }
    }

    /// `false` for [`LineMode::None`].
    pub const fn is_present(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Width of the address or alternate-bytes phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhaseSize {
    /// 8-bit
    #[default]
    Bits8,
    /// 16-bit
    Bits16,
    /// 24-bit
    Bits24,
    /// 32-bit
    Bits32,
}

impl PhaseSize {
    /// Field value for ADSIZE / ABSIZE.
    pub const fn bits(self) -> u32 {
        match self {
            Self::Bits8 => 0,
            Self::Bits16 => 1,
            Self::Bits24 => 2,
            Self::Bits32 => 3,
        }
    }

    /// Inverse of [`PhaseSize::bits`]; only the low two bits are used.
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => Self::Bits8,
            1 => Self::Bits16,
            2 => Self::Bits24,
            _ => Self::Bits32,
        }
    }
}

/// Instruction phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Instruction {
    /// Line mode
    pub mode: LineMode,
    /// Opcode byte
    pub opcode: u8,
}

/// Address phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Address {
    /// Line mode; [`LineMode::None`] skips the phase whatever `value` holds
    pub mode: LineMode,
    /// Address width
    pub size: PhaseSize,
    /// Address value written to AR
    pub value: u32,
}

/// Alternate-bytes phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlternateBytes {
    /// Line mode; [`LineMode::None`] skips the phase whatever `value` holds
    pub mode: LineMode,
    /// Alternate-bytes width
    pub size: PhaseSize,
    /// Value written to ABR
    pub value: u32,
}

/// Everything needed to drive one QuadSPI bus transaction.
///
/// Built per transaction and never mutated by the engine. The builder
/// methods consume and return `self`, so presets can be tweaked inline:
///
/// ```
/// use xfer::quadspi::{LineMode, PhaseSize, TransferCommand};
///
/// let cmd = TransferCommand::new()
///     .instruction(LineMode::Single, 0x0B)
///     .address(LineMode::Single, PhaseSize::Bits24, 0x0001_0000)
///     .dummy_cycles(8)
///     .data(LineMode::Single);
/// assert!(cmd.has_data());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferCommand {
    /// Instruction phase
    pub instruction: Instruction,
    /// Address phase
    pub address: Address,
    /// Alternate-bytes phase
    pub alternate_bytes: AlternateBytes,
    /// Dummy cycles between address/alternate and data (0–31)
    pub dummy_cycles: u8,
    /// Data phase line mode
    pub data_mode: LineMode,
    /// Double data rate for address, alternate and data phases
    pub double_data_rate: bool,
    /// Delay data output by a quarter cycle in DDR mode
    pub ddr_hold: bool,
    /// Send the instruction only for the first command
    pub send_instruction_once: bool,
}

impl TransferCommand {
    /// A command with every phase skipped.
    pub const fn new() -> Self {
        Self {
            instruction: Instruction {
                mode: LineMode::None,
                opcode: 0,
            },
            address: Address {
                mode: LineMode::None,
                size: PhaseSize::Bits8,
                value: 0,
            },
            alternate_bytes: AlternateBytes {
                mode: LineMode::None,
                size: PhaseSize::Bits8,
                value: 0,
            },
            dummy_cycles: 0,
            data_mode: LineMode::None,
            double_data_rate: false,
            ddr_hold: false,
            send_instruction_once: false,
        }
    }

    /// Set the instruction phase.
    #[must_use]
    pub const fn instruction(mut self, mode: LineMode, opcode: u8) -> Self {
        self.instruction = Instruction { mode, opcode };
        self
    }

    /// Set the address phase.
    #[must_use]
    pub const fn address(mut self, mode: LineMode, size: PhaseSize, value: u32) -> Self {
        self.address = Address { mode, size, value };
        self
    }

    /// Set the alternate-bytes phase.
    #[must_use]
    pub const fn alternate_bytes(mut self, mode: LineMode, size: PhaseSize, value: u32) -> Self {
        self.alternate_bytes = AlternateBytes { mode, size, value };
        self
    }

    /// Set the dummy cycle count.
    #[must_use]
    pub const fn dummy_cycles(mut self, cycles: u8) -> Self {
        self.dummy_cycles = cycles;
        self
    }

    /// Set the data phase line mode.
    #[must_use]
    pub const fn data(mut self, mode: LineMode) -> Self {
        self.data_mode = mode;
        self
    }

    /// Enable double data rate (and optionally DDR hold).
    #[must_use]
    pub const fn ddr(mut self, hold: bool) -> Self {
        self.double_data_rate = true;
        self.ddr_hold = hold;
        self
    }

    /// Send the instruction only once.
    #[must_use]
    pub const fn instruction_once(mut self) -> Self {
        self.send_instruction_once = true;
        self
    }

    /// Whether the command has a data phase.
    pub const fn has_data(&self) -> bool {
        self.data_mode.is_present()
    }

    /// Whether the command has an address phase.
    pub const fn has_address(&self) -> bool {
        self.address.mode.is_present()
    }

    /// Whether the command has an alternate-bytes phase.
    pub const fn has_alternate_bytes(&self) -> bool {
        self.alternate_bytes.mode.is_present()
    }
}

/// Functional mode (CCR.FMODE), added by the engine for the chosen direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FunctionMode {
    /// Indirect write
    IndirectWrite,
    /// Indirect read
    IndirectRead,
    /// Automatic status polling
    AutoPolling,
    /// Memory-mapped
    MemoryMapped,
}

impl FunctionMode {
    /// Field value for CCR.FMODE.
    pub const fn bits(self) -> u32 {
        match self {
            Self::IndirectWrite => 0,
            Self::IndirectRead => 1,
            Self::AutoPolling => 2,
            Self::MemoryMapped => 3,
        }
    }
}

/// Pack a [`TransferCommand`] into a CCR image.
///
/// Each phase whose mode is not [`LineMode::None`] ORs its mode and
/// size/opcode into a zero accumulator; skipped phases contribute no bits.
/// FMODE is left at zero. No cross-field validation is done: the hardware
/// does none either.
#[allow(clippy::cast_lossless)] // u32::from is not const
pub const fn encode(cmd: &TransferCommand) -> u32 {
    let mut ccr = 0;

    if cmd.instruction.mode.is_present() {
        ccr |= CCR_IMODE.pack(cmd.instruction.mode.bits());
        ccr |= CCR_INSTRUCTION.pack(cmd.instruction.opcode as u32);
    }

    if cmd.address.mode.is_present() {
        ccr |= CCR_ADMODE.pack(cmd.address.mode.bits());
        ccr |= CCR_ADSIZE.pack(cmd.address.size.bits());
    }

    if cmd.alternate_bytes.mode.is_present() {
        ccr |= CCR_ABMODE.pack(cmd.alternate_bytes.mode.bits());
        ccr |= CCR_ABSIZE.pack(cmd.alternate_bytes.size.bits());
    }

    ccr |= CCR_DCYC.pack(cmd.dummy_cycles as u32);

    if cmd.data_mode.is_present() {
        ccr |= CCR_DMODE.pack(cmd.data_mode.bits());
    }

    if cmd.send_instruction_once {
        ccr |= CCR_SIOO.mask();
    }
    if cmd.ddr_hold {
        ccr |= CCR_DHHC.mask();
    }
    if cmd.double_data_rate {
        ccr |= CCR_DDRM.mask();
    }

    ccr
}

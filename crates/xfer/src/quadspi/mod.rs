//! QUADSPI command encoder and polled indirect-mode engine
//!
//! A [`TransferCommand`] describes one bus transaction (instruction,
//! address, alternate bytes, dummy cycles, data). [`encode`] packs it into
//! a CCR image; [`QuadSpi::execute`] drives it to completion.

pub mod command;
pub mod config;
mod engine;
pub mod regs;

pub use command::{
    encode, Address, AlternateBytes, FunctionMode, Instruction, LineMode, PhaseSize,
    TransferCommand,
};
pub use engine::{ClockMode, Data, FlashSelect, QuadSpi};
pub use regs::{ClearFlags, Interrupts, Status};

/// QUADSPI register block on STM32H7 (AHB3).
pub const QUADSPI_BASE: usize = 0x5200_5000;

/// QUADSPI register block on STM32F7 (AHB3).
pub const QUADSPI_BASE_F7: usize = 0xA000_1000;

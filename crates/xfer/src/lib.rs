//! Register-level transfer engines for STM32-class microcontrollers
//!
//! This crate sequences the register writes behind two bus-master style
//! peripherals: the QUADSPI controller (indirect mode, polled FIFO) and the
//! GPDMA/LPDMA channel controller, plus the older one-register-per-channel
//! DMA block found on F0/F1/F3/L1 parts.
//!
//! # Architecture Layers
//!
//! ```text
//! Driver code (flash drivers, audio, display)
//!         ↓
//! Transfer engines (this crate)
//!   quadspi::encode  →  QuadSpi::execute
//!   dma::GpDma       →  dma::Channel<Reset | Configured | Enabled>
//!   dma::LegacyDma
//!         ↓
//! RegisterFile (Mmio on target, SimRegisters in tests)
//! ```
//!
//! Every register access goes through [`RegisterFile`], so the same driver
//! code runs against real memory-mapped I/O and against an in-memory
//! register file that records an access trace.
//!
//! # Preconditions
//!
//! The peripheral clock must be enabled, pins routed to their alternate
//! function and (for interrupt-driven completion) the IRQ unmasked before
//! any of these engines are used. None of that is done here.
//!
//! # Features
//!
//! - `defmt`: Enable defmt logging and `defmt::Format` derives (target builds)
//! - `tracing`: Enable tracing logging (host builds)
//!
//! # Example
//!
//! ```
//! use xfer::quadspi::{config, QuadSpi, QUADSPI_BASE};
//! use xfer::SimRegisters;
//!
//! let mut regs = SimRegisters::new();
//! regs.set(QUADSPI_BASE + xfer::quadspi::regs::SR, 0x0000_0006);
//! for byte in [0xEF_u8, 0x40, 0x18] {
//!     regs.queue_read(QUADSPI_BASE + xfer::quadspi::regs::DR, u32::from(byte));
//! }
//!
//! let mut qspi = QuadSpi::new(regs, QUADSPI_BASE);
//! let mut id = [0u8; 3];
//! let n = qspi.read(&config::read_jedec_id(), &mut id).unwrap();
//! assert_eq!(n, 3);
//! assert_eq!(id, [0xEF, 0x40, 0x18]);
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this register-level crate:
#![allow(clippy::doc_markdown)] // register and field names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors, callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

#[macro_use]
mod log;

pub mod dma;
pub mod error;
pub mod quadspi;
pub mod regs;
pub mod wait;

pub use error::XferError;
pub use regs::{Access, AccessKind, AccessWidth, Field, Mmio, RegisterFile, SimRegisters};
pub use wait::WaitBudget;

// Re-export engine entry points
pub use dma::{ChannelDescriptor, GpDma, LegacyDma};
pub use quadspi::{encode, QuadSpi, TransferCommand};

//! DMA controllers.
//!
//! - [`GpDma`]: STM32U5 GPDMA/LPDMA, channel-index API plus the
//!   [`Channel`] typestate handle.
//! - [`LegacyDma`]: the seven-channel controller of the F0/F1/L1 families.

mod channel;
pub mod descriptor;
pub mod legacy;
pub mod regs;
mod transfer;

pub use channel::{ChannelStatus, GpDma};
pub use descriptor::{
    ChannelDescriptor, DataWidth, DestinationSwap, Endpoint, Priority, Request,
    TransferCompleteMode,
};
pub use legacy::{LegacyDma, LegacyFlags, DMA1_BASE, DMA2_BASE, DMA2_CHANNELS};
pub use regs::{
    channel_register, ChannelFlags, LinkUpdate, GPDMA1_BASE, GPDMA1_CHANNELS, LPDMA1_BASE,
    LPDMA1_CHANNELS,
};
pub use transfer::{Channel, Configured, Enabled, Outcome, Reset};

//! Channel descriptor for the GPDMA/LPDMA controller.

use super::regs::LinkUpdate;

/// Beat size on one side of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataWidth {
    /// 8-bit
    #[default]
    Byte,
    /// 16-bit
    HalfWord,
    /// 32-bit
    Word,
}

impl DataWidth {
    /// Field value for CTR1.SDW_LOG2 / CTR1.DDW_LOG2.
    pub const fn bits(self) -> u32 {
        match self {
            Self::Byte => 0,
            Self::HalfWord => 1,
            Self::Word => 2,
        }
    }

    /// Width in bytes.
    pub const fn bytes(self) -> u32 {
        match self {
            Self::Byte => 1,
            Self::HalfWord => 2,
            Self::Word => 4,
        }
    }
}

/// Channel arbitration priority (CCR.PRIO).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Priority {
    /// Low priority, low weight
    #[default]
    Low,
    /// Low priority, mid weight
    Medium,
    /// Low priority, high weight
    High,
    /// High priority
    VeryHigh,
}

impl Priority {
    /// Field value for CCR.PRIO.
    pub const fn bits(self) -> u32 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
            Self::VeryHigh => 3,
        }
    }
}

/// When TCF is raised (CTR2.TCEM).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferCompleteMode {
    /// End of each block
    #[default]
    Block,
    /// End of each 2D/repeated block
    Block2d,
    /// End of each linked-list item
    LinkedListItem,
    /// End of the last linked-list item
    Channel,
}

impl TransferCompleteMode {
    /// Field value for CTR2.TCEM.
    pub const fn bits(self) -> u32 {
        match self {
            Self::Block => 0,
            Self::Block2d => 1,
            Self::LinkedListItem => 2,
            Self::Channel => 3,
        }
    }
}

/// Destination data reordering (CTR1.DHX / CTR1.DBX).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DestinationSwap {
    /// No reordering
    #[default]
    None,
    /// Swap bytes within each half-word (DBX)
    BytesInHalfWords,
    /// Swap half-words within each word (DHX)
    HalfWords,
    /// Both (DHX | DBX)
    All,
}

impl DestinationSwap {
    /// Field value for the two-bit DBX/DHX pair.
    pub const fn bits(self) -> u32 {
        match self {
            Self::None => 0,
            Self::BytesInHalfWords => 1,
            Self::HalfWords => 2,
            Self::All => 3,
        }
    }
}

/// What paces the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    /// Software request: starts as soon as the channel is enabled
    /// (memory-to-memory).
    Software,
    /// Hardware request line (CTR2.REQSEL).
    Hardware(u8),
}

/// One side (source or destination) of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Endpoint {
    /// Bus address
    pub address: u32,
    /// Beat size
    pub width: DataWidth,
    /// Increment the address after each beat
    pub increment: bool,
    /// Burst length in beats (1–64)
    pub burst: u8,
    /// AHB port (0 or 1)
    pub port: u8,
    /// Address offset applied between bursts (0–8191 bytes)
    pub stride: u16,
}

impl Endpoint {
    /// A fixed-address endpoint with single-beat bursts on port 0.
    pub const fn new(address: u32, width: DataWidth) -> Self {
        Self {
            address,
            width,
            increment: false,
            burst: 1,
            port: 0,
            stride: 0,
        }
    }

    /// Increment the address after each beat (memory buffers).
    #[must_use]
    pub const fn incrementing(mut self) -> Self {
        self.increment = true;
        self
    }

    /// Set the burst length in beats.
    #[must_use]
    pub const fn burst(mut self, beats: u8) -> Self {
        self.burst = beats;
        self
    }

    /// Select the AHB port.
    #[must_use]
    pub const fn port(mut self, port: u8) -> Self {
        self.port = port;
        self
    }

    /// Set the stride.
    #[must_use]
    pub const fn stride(mut self, stride: u16) -> Self {
        self.stride = stride;
        self
    }
}

/// Full configuration for one GPDMA channel.
///
/// Applied with [`GpDma::configure`](super::GpDma::configure) or the
/// typestate [`Channel::configure`](super::Channel::configure). The channel
/// must be disabled while any of these fields are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelDescriptor {
    /// Source side
    pub source: Endpoint,
    /// Destination side
    pub destination: Endpoint,
    /// Arbitration priority
    pub priority: Priority,
    /// Block size in bytes (CBR1.BNDT)
    pub block_size: u16,
    /// Software or hardware request
    pub request: Request,
    /// Trigger selector (CTR2.TRIGSEL), if triggered
    pub trigger: Option<u8>,
    /// Block-level requests instead of burst-level (CTR2.BREQ)
    pub block_request: bool,
    /// Destination is the flow controller (CTR2.DREQ)
    pub destination_flow_control: bool,
    /// When TCF is raised
    pub complete_mode: TransferCompleteMode,
    /// Destination data reordering
    pub destination_swap: DestinationSwap,
    /// First linked-list item and the registers it reloads
    pub linked_list: Option<(u32, LinkUpdate)>,
}

impl ChannelDescriptor {
    /// Generic descriptor: software request, low priority, no linked list.
    pub const fn new(source: Endpoint, destination: Endpoint, block_size: u16) -> Self {
        Self {
            source,
            destination,
            priority: Priority::Low,
            block_size,
            request: Request::Software,
            trigger: None,
            block_request: false,
            destination_flow_control: false,
            complete_mode: TransferCompleteMode::Block,
            destination_swap: DestinationSwap::None,
            linked_list: None,
        }
    }

    /// Copy `len` bytes between two incrementing memory buffers.
    pub const fn memory_to_memory(
        source: u32,
        destination: u32,
        len: u16,
        width: DataWidth,
    ) -> Self {
        Self::new(
            Endpoint::new(source, width).incrementing(),
            Endpoint::new(destination, width).incrementing(),
            len,
        )
    }

    /// Peripheral data register → incrementing memory buffer, paced by `request`.
    pub const fn peripheral_to_memory(
        peripheral: u32,
        memory: u32,
        len: u16,
        width: DataWidth,
        request: u8,
    ) -> Self {
        let mut desc = Self::new(
            Endpoint::new(peripheral, width),
            Endpoint::new(memory, width).incrementing(),
            len,
        );
        desc.request = Request::Hardware(request);
        desc
    }

    /// Incrementing memory buffer → peripheral data register, paced by `request`.
    pub const fn memory_to_peripheral(
        memory: u32,
        peripheral: u32,
        len: u16,
        width: DataWidth,
        request: u8,
    ) -> Self {
        let mut desc = Self::new(
            Endpoint::new(memory, width).incrementing(),
            Endpoint::new(peripheral, width),
            len,
        );
        desc.request = Request::Hardware(request);
        desc.destination_flow_control = true;
        desc
    }

    /// Set the priority.
    #[must_use]
    pub const fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Chain to a linked-list item.
    #[must_use]
    pub const fn linked_list(mut self, pointer: u32, update: LinkUpdate) -> Self {
        self.linked_list = Some((pointer, update));
        self
    }

    /// Set the transfer complete event mode.
    #[must_use]
    pub const fn complete_mode(mut self, mode: TransferCompleteMode) -> Self {
        self.complete_mode = mode;
        self
    }

    /// Select a trigger input.
    #[must_use]
    pub const fn trigger(mut self, trigger: u8) -> Self {
        self.trigger = Some(trigger);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_to_memory_defaults() {
        let d = ChannelDescriptor::memory_to_memory(0x2000_0000, 0x2000_1000, 64, DataWidth::Word);
        assert_eq!(d.request, Request::Software);
        assert!(d.source.increment && d.destination.increment);
        assert_eq!(d.source.burst, 1);
        assert_eq!(d.linked_list, None);
    }

    #[test]
    fn test_peripheral_directions() {
        let rx = ChannelDescriptor::peripheral_to_memory(
            0x4001_3024,
            0x2000_0000,
            16,
            DataWidth::Byte,
            24,
        );
        assert!(!rx.source.increment);
        assert!(rx.destination.increment);
        assert_eq!(rx.request, Request::Hardware(24));
        assert!(!rx.destination_flow_control);

        let tx = ChannelDescriptor::memory_to_peripheral(
            0x2000_0000,
            0x4001_3028,
            16,
            DataWidth::Byte,
            25,
        );
        assert!(tx.source.increment);
        assert!(!tx.destination.increment);
        assert!(tx.destination_flow_control);
    }

    #[test]
    fn test_width_encodings() {
        assert_eq!(DataWidth::Byte.bits(), 0);
        assert_eq!(DataWidth::HalfWord.bits(), 1);
        assert_eq!(DataWidth::Word.bits(), 2);
        assert_eq!(DataWidth::Word.bytes(), 4);
    }
}

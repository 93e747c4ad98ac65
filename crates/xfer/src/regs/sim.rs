//! Simulated register file
//!
//! An in-memory [`RegisterFile`] for unit tests, integration tests and the
//! `xtask trace` command. It stores one value per address, records every
//! access in order and can be primed with:
//!
//! - fixed register values ([`SimRegisters::set`]),
//! - per-address read queues for FIFO-style data registers
//!   ([`SimRegisters::queue_read`]),
//! - write-one-to-clear links from a clear register to a status register
//!   ([`SimRegisters::link_clear`]),
//! - self-clearing control bits ([`SimRegisters::self_clearing`]).
//!
//! Storage is fixed-capacity (`heapless`), so it works in `no_std` builds.
//! When the trace is full further accesses are still applied but no longer
//! recorded; [`SimRegisters::dropped`] counts them. Register values and
//! rules that do not fit are counted by [`SimRegisters::overflowed`]
//! instead, and [`SimRegisters::try_set`] reports the failure directly.

use super::RegisterFile;

/// Distinct register addresses a [`SimRegisters`] can hold: all sixteen
/// GPDMA channels (11 registers each) plus room for a QUADSPI block and a
/// legacy controller.
pub const SIM_REGISTERS: usize = 256;
/// Accesses recorded before the trace saturates.
pub const SIM_TRACE: usize = 512;
/// Queued read values across all addresses.
pub const SIM_READ_QUEUE: usize = 64;

const SIM_RULES: usize = 8;

/// Direction of a recorded access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccessKind {
    /// Load from the register.
    Read,
    /// Store to the register.
    Write,
}

/// Bus width of a recorded access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccessWidth {
    /// 8-bit
    Byte,
    /// 16-bit
    HalfWord,
    /// 32-bit
    Word,
}

/// One recorded register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Access {
    /// Read or write
    pub kind: AccessKind,
    /// Access width
    pub width: AccessWidth,
    /// Register address
    pub addr: usize,
    /// Value read or written (zero-extended)
    pub value: u32,
}

#[derive(Debug, Clone, Copy)]
struct SelfClearing {
    addr: usize,
    trigger: u32,
    clears: u32,
}

/// In-memory register file with an access trace.
#[derive(Debug, Default)]
pub struct SimRegisters {
    values: heapless::Vec<(usize, u32), SIM_REGISTERS>,
    queued: heapless::Vec<(usize, u32), SIM_READ_QUEUE>,
    trace: heapless::Vec<Access, SIM_TRACE>,
    clear_links: heapless::Vec<(usize, usize), SIM_RULES>,
    self_clearing: heapless::Vec<SelfClearing, SIM_RULES>,
    dropped: usize,
    overflowed: usize,
}

/// A [`SimRegisters`] table is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SimFull {
    /// Address that could not be stored.
    pub addr: usize,
}

impl SimRegisters {
    /// Create an empty register file; every register reads as 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a register value without recording an access.
    ///
    /// Once [`SIM_REGISTERS`] distinct addresses are in use, values for new
    /// addresses are discarded and counted in [`SimRegisters::overflowed`].
    pub fn set(&mut self, addr: usize, value: u32) {
        if self.try_set(addr, value).is_err() {
            self.overflowed = self.overflowed.saturating_add(1);
        }
    }

    /// Set a register value, failing if `addr` is new and the table is full.
    pub fn try_set(&mut self, addr: usize, value: u32) -> Result<(), SimFull> {
        if let Some(slot) = self.values.iter_mut().find(|(a, _)| *a == addr) {
            slot.1 = value;
            return Ok(());
        }
        self.values.push((addr, value)).map_err(|_| SimFull { addr })
    }

    /// Current register value without recording an access.
    pub fn get(&self, addr: usize) -> u32 {
        self.values
            .iter()
            .find(|(a, _)| *a == addr)
            .map_or(0, |(_, v)| *v)
    }

    /// Queue a value to be returned by the next read of `addr`.
    ///
    /// Queued values are returned oldest first and take precedence over the
    /// stored register value. Models a receive FIFO behind a data register.
    pub fn queue_read(&mut self, addr: usize, value: u32) {
        if self.queued.push((addr, value)).is_err() {
            self.dropped = self.dropped.saturating_add(1);
        }
    }

    /// Number of queued reads still pending for `addr`.
    pub fn pending_reads(&self, addr: usize) -> usize {
        self.queued.iter().filter(|(a, _)| *a == addr).count()
    }

    /// Make a 32-bit write to `clear_addr` clear the written bits in
    /// `status_addr` (write-one-to-clear flag registers).
    pub fn link_clear(&mut self, clear_addr: usize, status_addr: usize) {
        if self.clear_links.push((clear_addr, status_addr)).is_err() {
            self.overflowed = self.overflowed.saturating_add(1);
        }
    }

    /// Make a 32-bit write to `addr` with any `trigger` bit set clear the
    /// `clears` bits afterwards, the way hardware drops reset/abort bits.
    pub fn self_clearing(&mut self, addr: usize, trigger: u32, clears: u32) {
        let rule = SelfClearing {
            addr,
            trigger,
            clears,
        };
        if self.self_clearing.push(rule).is_err() {
            self.overflowed = self.overflowed.saturating_add(1);
        }
    }

    /// All recorded accesses, oldest first.
    pub fn trace(&self) -> &[Access] {
        &self.trace
    }

    /// Forget recorded accesses (register values are kept).
    pub fn clear_trace(&mut self) {
        self.trace.clear();
        self.dropped = 0;
    }

    /// Accesses that could not be recorded or queued because storage was full.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Register values and rules that were discarded because their table
    /// was full. Not reset by [`SimRegisters::clear_trace`]: a lost value
    /// stays lost.
    pub fn overflowed(&self) -> usize {
        self.overflowed
    }

    /// Recorded writes to `addr`, oldest first.
    pub fn writes_to(&self, addr: usize) -> impl Iterator<Item = &Access> + '_ {
        self.trace
            .iter()
            .filter(move |a| a.kind == AccessKind::Write && a.addr == addr)
    }

    /// Number of recorded accesses of `kind` to `addr`.
    pub fn count(&self, kind: AccessKind, addr: usize) -> usize {
        self.trace
            .iter()
            .filter(|a| a.kind == kind && a.addr == addr)
            .count()
    }

    /// Trace index of the first write to `addr`.
    pub fn first_write(&self, addr: usize) -> Option<usize> {
        self.trace
            .iter()
            .position(|a| a.kind == AccessKind::Write && a.addr == addr)
    }

    /// Trace index of the last write to `addr`.
    pub fn last_write(&self, addr: usize) -> Option<usize> {
        self.trace
            .iter()
            .rposition(|a| a.kind == AccessKind::Write && a.addr == addr)
    }

    fn record(&mut self, kind: AccessKind, width: AccessWidth, addr: usize, value: u32) {
        if self
            .trace
            .push(Access {
                kind,
                width,
                addr,
                value,
            })
            .is_err()
        {
            self.dropped = self.dropped.saturating_add(1);
        }
    }

    fn load(&mut self, addr: usize) -> u32 {
        match self.queued.iter().position(|(a, _)| *a == addr) {
            Some(index) => self.queued.remove(index).1,
            None => self.get(addr),
        }
    }

    fn store(&mut self, addr: usize, value: u32) {
        let mut stored = value;
        for rule in &self.self_clearing {
            if rule.addr == addr && value & rule.trigger != 0 {
                stored &= !rule.clears;
            }
        }
        self.set(addr, stored);

        let links: heapless::Vec<usize, SIM_RULES> = self
            .clear_links
            .iter()
            .filter(|(clear, _)| *clear == addr)
            .map(|(_, status)| *status)
            .collect();
        for status in links {
            let current = self.get(status);
            self.set(status, current & !value);
        }
    }
}

impl RegisterFile for SimRegisters {
    fn read32(&mut self, addr: usize) -> u32 {
        let value = self.load(addr);
        self.record(AccessKind::Read, AccessWidth::Word, addr, value);
        value
    }

    fn write32(&mut self, addr: usize, value: u32) {
        self.record(AccessKind::Write, AccessWidth::Word, addr, value);
        self.store(addr, value);
    }

    #[allow(clippy::cast_possible_truncation)] // Safety: low half-word lane by design
    fn read16(&mut self, addr: usize) -> u16 {
        let value = self.load(addr) as u16;
        self.record(AccessKind::Read, AccessWidth::HalfWord, addr, u32::from(value));
        value
    }

    fn write16(&mut self, addr: usize, value: u16) {
        self.record(AccessKind::Write, AccessWidth::HalfWord, addr, u32::from(value));
        let merged = (self.get(addr) & 0xFFFF_0000) | u32::from(value);
        self.set(addr, merged);
    }

    #[allow(clippy::cast_possible_truncation)] // Safety: low byte lane by design
    fn read8(&mut self, addr: usize) -> u8 {
        let value = self.load(addr) as u8;
        self.record(AccessKind::Read, AccessWidth::Byte, addr, u32::from(value));
        value
    }

    fn write8(&mut self, addr: usize, value: u8) {
        self.record(AccessKind::Write, AccessWidth::Byte, addr, u32::from(value));
        let merged = (self.get(addr) & 0xFFFF_FF00) | u32::from(value);
        self.set(addr, merged);
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_register_reads_zero() {
        let mut regs = SimRegisters::new();
        assert_eq!(regs.read32(0x4000_0000), 0);
        assert_eq!(regs.trace().len(), 1);
        assert_eq!(regs.trace()[0].kind, AccessKind::Read);
    }

    #[test]
    fn test_queued_reads_come_first_then_fall_back() {
        let mut regs = SimRegisters::new();
        regs.set(0x20, 0x55);
        regs.queue_read(0x20, 0x01);
        regs.queue_read(0x20, 0x02);
        assert_eq!(regs.pending_reads(0x20), 2);
        assert_eq!(regs.read8(0x20), 0x01);
        assert_eq!(regs.read8(0x20), 0x02);
        assert_eq!(regs.read8(0x20), 0x55);
    }

    #[test]
    fn test_queues_are_per_address() {
        let mut regs = SimRegisters::new();
        regs.queue_read(0x10, 1);
        regs.queue_read(0x20, 2);
        assert_eq!(regs.read32(0x20), 2);
        assert_eq!(regs.read32(0x10), 1);
    }

    #[test]
    fn test_write_one_to_clear_link() {
        let mut regs = SimRegisters::new();
        regs.link_clear(0x0C, 0x08);
        regs.set(0x08, 0b1111);
        regs.write32(0x0C, 0b0101);
        assert_eq!(regs.get(0x08), 0b1010);
    }

    #[test]
    fn test_self_clearing_bits() {
        let mut regs = SimRegisters::new();
        // Writing RESET (bit 1) drops EN, RESET and SUSP
        regs.self_clearing(0x14, 0b010, 0b111);
        regs.write32(0x14, 0b011 | 0x00C0_0000);
        assert_eq!(regs.get(0x14), 0x00C0_0000);
    }

    #[test]
    fn test_byte_write_merges_low_lane() {
        let mut regs = SimRegisters::new();
        regs.set(0x20, 0xAABB_CCDD);
        regs.write8(0x20, 0x11);
        assert_eq!(regs.get(0x20), 0xAABB_CC11);
        assert_eq!(regs.trace()[0].width, AccessWidth::Byte);
    }

    #[test]
    fn test_trace_helpers() {
        let mut regs = SimRegisters::new();
        regs.write32(0x14, 1);
        regs.write32(0x18, 2);
        regs.write32(0x14, 3);
        assert_eq!(regs.first_write(0x14), Some(0));
        assert_eq!(regs.last_write(0x14), Some(2));
        assert_eq!(regs.first_write(0x1C), None);
        assert_eq!(regs.count(AccessKind::Write, 0x14), 2);
        assert_eq!(regs.writes_to(0x18).count(), 1);
    }

    #[test]
    fn test_trace_saturates_without_losing_state() {
        let mut regs = SimRegisters::new();
        for i in 0..(SIM_TRACE + 3) {
            #[allow(clippy::cast_possible_truncation)]
            regs.write32(0x100, i as u32);
        }
        assert_eq!(regs.trace().len(), SIM_TRACE);
        assert_eq!(regs.dropped(), 3);
        #[allow(clippy::cast_possible_truncation)]
        let last = (SIM_TRACE + 2) as u32;
        assert_eq!(regs.get(0x100), last);
    }

    #[test]
    fn test_every_gpdma_register_fits() {
        let mut regs = SimRegisters::new();
        let mut addr = 0x4002_0050;
        for _ in 0..(16 * 11) {
            regs.write32(addr, 1);
            addr += 4;
        }
        assert_eq!(regs.overflowed(), 0);
        assert_eq!(regs.get(addr - 4), 1);
    }

    #[test]
    fn test_full_table_is_reported() {
        let mut regs = SimRegisters::new();
        for i in 0..SIM_REGISTERS {
            regs.set(i * 4, 1);
        }
        assert_eq!(regs.overflowed(), 0);
        assert_eq!(regs.try_set(0, 7), Ok(()));
        let past = SIM_REGISTERS * 4;
        assert_eq!(regs.try_set(past, 7), Err(SimFull { addr: past }));

        regs.write32(past, 9);
        assert_eq!(regs.get(past), 0);
        assert_eq!(regs.overflowed(), 1);
        regs.clear_trace();
        assert_eq!(regs.overflowed(), 1);
    }

    #[test]
    fn test_rule_overflow_is_counted() {
        let mut regs = SimRegisters::new();
        for i in 0..(SIM_RULES + 2) {
            regs.self_clearing(i * 4, 1, 1);
            regs.link_clear(i * 4, 0x1000);
        }
        assert_eq!(regs.overflowed(), 4);
    }
}

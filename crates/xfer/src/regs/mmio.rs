//! Volatile memory-mapped I/O binding.

use super::RegisterFile;

/// [`RegisterFile`] over real peripheral memory.
///
/// Zero-sized; every access is a single volatile load or store of the
/// requested width, so read-modify-write sequences are exactly as atomic
/// as the hardware makes them (not at all, with respect to interrupts).
#[derive(Debug)]
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// Create the MMIO binding.
    ///
    /// # Safety
    ///
    /// Every address later passed through this binding must be a valid,
    /// naturally aligned peripheral register on the running chip, and the
    /// caller must be the only owner of the peripherals it drives.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RegisterFile for Mmio {
    #[inline]
    fn read32(&mut self, addr: usize) -> u32 {
        // SAFETY: `Mmio::new` contract, addr is an aligned device register.
        unsafe { core::ptr::read_volatile(addr as *const u32) }
    }

    #[inline]
    fn write32(&mut self, addr: usize, value: u32) {
        // SAFETY: `Mmio::new` contract, addr is an aligned device register.
        unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
    }

    #[inline]
    fn read16(&mut self, addr: usize) -> u16 {
        // SAFETY: `Mmio::new` contract, addr is an aligned device register.
        unsafe { core::ptr::read_volatile(addr as *const u16) }
    }

    #[inline]
    fn write16(&mut self, addr: usize, value: u16) {
        // SAFETY: `Mmio::new` contract, addr is an aligned device register.
        unsafe { core::ptr::write_volatile(addr as *mut u16, value) }
    }

    #[inline]
    fn read8(&mut self, addr: usize) -> u8 {
        // SAFETY: `Mmio::new` contract, addr is a device register.
        unsafe { core::ptr::read_volatile(addr as *const u8) }
    }

    #[inline]
    fn write8(&mut self, addr: usize, value: u8) {
        // SAFETY: `Mmio::new` contract, addr is a device register.
        unsafe { core::ptr::write_volatile(addr as *mut u8, value) }
    }
}

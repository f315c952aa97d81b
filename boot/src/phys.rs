/// Raw physical memory reads.
///
/// This is the only place in the crate that dereferences a physical address.
/// Everything above it goes through the `PhysMemory` trait, so the loader can
/// be driven by a RAM-backed image in host tests and by `DirectMap` at boot.
use core::fmt;

/// A physical address. Transparent wrapper for clarity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct PhysAddr(pub u64);

impl PhysAddr {
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Address `bytes` past this one. Wraps rather than panicking; callers
    /// that care about overflow compare against a saturated bound.
    pub const fn offset(self, bytes: u64) -> Self {
        Self(self.0.wrapping_add(bytes))
    }
}

impl fmt::Debug for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysAddr({:#x})", self.0)
    }
}

impl fmt::Display for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Read access to physical memory, 32 bits at a time.
///
/// There is no error channel: a read of unmapped memory is a fault, not a
/// recoverable condition.
pub trait PhysMemory {
    /// Native-endian 32-bit value stored at `addr`.
    fn read_u32(&self, addr: PhysAddr) -> u32;
}

/// Physical memory reached through a linear mapping: virt = phys + offset.
///
/// Before the kernel touches the page tables the bootloader leaves low memory
/// identity mapped, so `identity()` is what the early boot path uses.
#[derive(Debug, Clone, Copy)]
pub struct DirectMap {
    offset: u64,
}

impl DirectMap {
    /// # Safety
    /// Every physical address later passed to `read_u32` must be mapped and
    /// readable at `phys + offset` for as long as this value is used.
    pub const unsafe fn new(offset: u64) -> Self {
        Self { offset }
    }

    /// # Safety
    /// Same contract as `new`, with physical addresses mapped 1:1.
    pub const unsafe fn identity() -> Self {
        Self { offset: 0 }
    }

    pub const fn offset(&self) -> u64 {
        self.offset
    }
}

impl PhysMemory for DirectMap {
    #[inline]
    fn read_u32(&self, addr: PhysAddr) -> u32 {
        let ptr = addr.as_u64().wrapping_add(self.offset) as usize as *const u32;
        // Bootloader structures carry no alignment guarantee.
        unsafe { core::ptr::read_unaligned(ptr) }
    }
}

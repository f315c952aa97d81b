/// RAM-backed physical memory for testing.
///
/// `RamImage` stands in for physical memory in host-target tests, and
/// `BootInfoBuilder` lays out a Multiboot information block plus memory map
/// inside one. Reads outside the image panic, so a test that passes also
/// proves the loader never strayed past the bytes it was given.
use alloc::vec;
use alloc::vec::Vec;

use crate::multiboot::{info_offset, InfoFlags, MIN_RECORD_SIZE, SIZE_FIELD_LEN};
use crate::phys::{PhysAddr, PhysMemory};

/// A contiguous chunk of fake physical memory starting at `base`.
pub struct RamImage {
    base: u64,
    data: Vec<u8>,
}

impl RamImage {
    /// Zero-filled image of `len` bytes at physical address `base`.
    pub fn new(base: u64, len: usize) -> Self {
        Self {
            base,
            data: vec![0u8; len],
        }
    }

    pub fn from_bytes(base: u64, data: Vec<u8>) -> Self {
        Self { base, data }
    }

    pub fn base(&self) -> PhysAddr {
        PhysAddr::new(self.base)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Store a little-endian u32 at `addr`.
    pub fn write_u32(&mut self, addr: PhysAddr, value: u32) {
        let start = self.index(addr, 4);
        self.data[start..start + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn index(&self, addr: PhysAddr, len: usize) -> usize {
        let start = addr
            .as_u64()
            .checked_sub(self.base)
            .filter(|&off| off as usize + len <= self.data.len())
            .unwrap_or_else(|| {
                panic!(
                    "access of {} bytes at {} outside image [{:#x}, {:#x})",
                    len,
                    addr,
                    self.base,
                    self.base + self.data.len() as u64
                )
            });
        start as usize
    }
}

impl PhysMemory for RamImage {
    fn read_u32(&self, addr: PhysAddr) -> u32 {
        let start = self.index(addr, 4);
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.data[start..start + 4]);
        u32::from_le_bytes(word)
    }
}

/// Room reserved for the information block ahead of the memory map.
const INFO_BLOCK_LEN: usize = 0x100;

/// Filler for header bytes the builder does not set.
const FILL_BYTE: u8 = 0xA5;

/// Builds a boot information block and memory map in a `RamImage`.
///
/// By default the memory-map flag is set and the map follows the block
/// directly; the declared map length is the number of bytes written.
pub struct BootInfoBuilder {
    info_addr: u64,
    flags: u32,
    mem_lower: u32,
    mem_upper: u32,
    map: Vec<u8>,
    map_length: Option<u32>,
    map_addr: Option<u32>,
}

impl BootInfoBuilder {
    pub fn new() -> Self {
        Self {
            info_addr: 0x9000,
            flags: InfoFlags::MEMORY_MAP.bits(),
            mem_lower: 0,
            mem_upper: 0,
            map: Vec::new(),
            map_length: None,
            map_addr: None,
        }
    }

    /// Physical address of the information block.
    pub fn at(mut self, info_addr: u64) -> Self {
        self.info_addr = info_addr;
        self
    }

    /// Replace the whole flags word.
    pub fn flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// Set `mem_lower`/`mem_upper` and their flag bit.
    pub fn basic_memory(mut self, lower_kib: u32, upper_kib: u32) -> Self {
        self.flags |= InfoFlags::MEMORY.bits();
        self.mem_lower = lower_kib;
        self.mem_upper = upper_kib;
        self
    }

    /// Append a standard 20-byte record.
    pub fn record(self, base: u64, length: u64, typ: u32) -> Self {
        self.record_with_size(MIN_RECORD_SIZE, base, length, typ)
    }

    /// Append a record whose `size` field is `size`, zero-padding after the
    /// type field so the next record starts `size + 4` bytes later.
    pub fn record_with_size(mut self, size: u32, base: u64, length: u64, typ: u32) -> Self {
        assert!(size >= MIN_RECORD_SIZE, "record size {} leaves no room for fields", size);
        let start = self.map.len();
        for word in [
            size,
            base as u32,
            (base >> 32) as u32,
            length as u32,
            (length >> 32) as u32,
            typ,
        ] {
            self.map.extend_from_slice(&word.to_le_bytes());
        }
        self.map.resize(start + size as usize + SIZE_FIELD_LEN as usize, 0);
        self
    }

    /// Append raw bytes to the map area.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.map.extend_from_slice(bytes);
        self
    }

    /// Declare a map length other than the bytes written.
    pub fn map_length(mut self, length: u32) -> Self {
        self.map_length = Some(length);
        self
    }

    /// Declare a map address other than where the map was placed.
    pub fn map_addr(mut self, addr: u32) -> Self {
        self.map_addr = Some(addr);
        self
    }

    /// Where the map bytes land in the built image.
    pub fn placed_map_addr(&self) -> u64 {
        self.info_addr + INFO_BLOCK_LEN as u64
    }

    /// Lay everything out. Returns the image and the info block address.
    pub fn build(self) -> (RamImage, PhysAddr) {
        let placed = self.placed_map_addr();
        let mut data = vec![FILL_BYTE; INFO_BLOCK_LEN];
        data.extend_from_slice(&self.map);

        let mut image = RamImage::from_bytes(self.info_addr, data);
        let info = PhysAddr::new(self.info_addr);
        let map_length = self.map_length.unwrap_or(self.map.len() as u32);
        let map_addr = self.map_addr.unwrap_or(placed as u32);

        image.write_u32(info.offset(info_offset::FLAGS), self.flags);
        image.write_u32(info.offset(info_offset::MEM_LOWER), self.mem_lower);
        image.write_u32(info.offset(info_offset::MEM_UPPER), self.mem_upper);
        image.write_u32(info.offset(info_offset::MMAP_LENGTH), map_length);
        image.write_u32(info.offset(info_offset::MMAP_ADDR), map_addr);

        (image, info)
    }
}

impl Default for BootInfoBuilder {
    fn default() -> Self {
        Self::new()
    }
}

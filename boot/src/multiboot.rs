/// Multiboot (v1) boot information and memory map loader.
///
/// Layout of the parts we read, all little-endian u32:
///   info +0:   flags (bit 0 = mem_lower/mem_upper valid, bit 6 = mmap valid)
///   info +4:   mem_lower (KiB below 1 MiB)
///   info +8:   mem_upper (KiB above 1 MiB)
///   info +44:  mmap_length (bytes)
///   info +48:  mmap_addr (physical)
///
/// Each memory map record:
///   +0 size, +4 base_lo, +8 base_hi, +12 len_lo, +16 len_hi, +20 type
///
/// `size` does not count itself, so the next record starts at `size + 4`.
use core::fmt;

use crate::phys::{PhysAddr, PhysMemory};
use crate::region::{RegionRecord, RegionTable};

/// Value left in EAX by a Multiboot compliant bootloader.
pub const BOOTLOADER_MAGIC: u32 = 0x2BAD_B002;

/// Byte offsets into the boot information block.
pub mod info_offset {
    pub const FLAGS: u64 = 0;
    pub const MEM_LOWER: u64 = 4;
    pub const MEM_UPPER: u64 = 8;
    pub const MMAP_LENGTH: u64 = 44;
    pub const MMAP_ADDR: u64 = 48;
}

/// Byte offsets into one memory map record.
pub mod record_offset {
    pub const SIZE: u64 = 0;
    pub const BASE_LO: u64 = 4;
    pub const BASE_HI: u64 = 8;
    pub const LEN_LO: u64 = 12;
    pub const LEN_HI: u64 = 16;
    pub const TYPE: u64 = 20;
}

/// Bytes the loader reads per record.
pub const RECORD_FIELDS_LEN: u64 = 24;

/// Width of the `size` field, which `size` itself excludes.
pub const SIZE_FIELD_LEN: u64 = 4;

/// Smallest `size` a well-formed record reports (the five fields after it).
pub const MIN_RECORD_SIZE: u32 = 20;

static_assertions::const_assert_eq!(record_offset::TYPE + 4, RECORD_FIELDS_LEN);
static_assertions::const_assert_eq!(MIN_RECORD_SIZE as u64 + SIZE_FIELD_LEN, RECORD_FIELDS_LEN);
static_assertions::const_assert!(info_offset::MMAP_ADDR > info_offset::MMAP_LENGTH);

bitflags::bitflags! {
    /// The `flags` word at the start of the boot information block.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InfoFlags: u32 {
        const MEMORY = 1 << 0;
        const BOOT_DEVICE = 1 << 1;
        const CMDLINE = 1 << 2;
        const MODULES = 1 << 3;
        const AOUT_SYMS = 1 << 4;
        const ELF_SHDR = 1 << 5;
        const MEMORY_MAP = 1 << 6;
        const DRIVES = 1 << 7;
        const CONFIG_TABLE = 1 << 8;
        const BOOTLOADER_NAME = 1 << 9;
        const APM_TABLE = 1 << 10;
        const VBE = 1 << 11;
        const FRAMEBUFFER = 1 << 12;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    /// Flag bit 6 is clear: the bootloader supplied no memory map.
    MemoryMapAbsent { flags: InfoFlags },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::MemoryMapAbsent { flags } => {
                write!(f, "no memory map in boot info (flags {:#x})", flags.bits())
            }
        }
    }
}

/// What a successful load found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub records: usize,
    pub truncated: bool,
    pub map_addr: PhysAddr,
    pub map_length: u32,
}

/// Conventional memory sizes from `mem_lower`/`mem_upper`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicMemory {
    pub lower_kib: u32,
    pub upper_kib: u32,
}

impl BasicMemory {
    /// Bytes of memory above 1 MiB.
    pub const fn upper_bytes(&self) -> u64 {
        self.upper_kib as u64 * 1024
    }
}

/// Snapshot of the fixed header fields the kernel cares about.
///
/// Fields are read unconditionally; only trust the ones whose flag is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootInfo {
    pub flags: InfoFlags,
    pub mem_lower: u32,
    pub mem_upper: u32,
    pub mmap_length: u32,
    pub mmap_addr: u32,
}

impl BootInfo {
    pub fn read<M: PhysMemory + ?Sized>(mem: &M, info: PhysAddr) -> Self {
        Self {
            flags: InfoFlags::from_bits_retain(mem.read_u32(info.offset(info_offset::FLAGS))),
            mem_lower: mem.read_u32(info.offset(info_offset::MEM_LOWER)),
            mem_upper: mem.read_u32(info.offset(info_offset::MEM_UPPER)),
            mmap_length: mem.read_u32(info.offset(info_offset::MMAP_LENGTH)),
            mmap_addr: mem.read_u32(info.offset(info_offset::MMAP_ADDR)),
        }
    }

    pub fn basic_memory(&self) -> Option<BasicMemory> {
        self.flags.contains(InfoFlags::MEMORY).then_some(BasicMemory {
            lower_kib: self.mem_lower,
            upper_kib: self.mem_upper,
        })
    }

    /// Start and byte length of the memory map, if the bootloader gave one.
    pub fn memory_map(&self) -> Option<(PhysAddr, u32)> {
        self.flags
            .contains(InfoFlags::MEMORY_MAP)
            .then_some((PhysAddr::new(self.mmap_addr as u64), self.mmap_length))
    }
}

impl RegionTable {
    /// Replace the table's contents with the memory map found via the boot
    /// information block at `info`.
    ///
    /// Returns false, leaving the table empty, if the block does not carry a
    /// memory map. Returns true otherwise, including when the map holds no
    /// records.
    pub fn load<M: PhysMemory + ?Sized>(&mut self, mem: &M, info: PhysAddr) -> bool {
        self.try_load(mem, info).is_ok()
    }

    /// `load` with the details kept.
    pub fn try_load<M: PhysMemory + ?Sized>(
        &mut self,
        mem: &M,
        info: PhysAddr,
    ) -> Result<LoadSummary, LoadError> {
        self.reset();

        let flags = InfoFlags::from_bits_retain(mem.read_u32(info.offset(info_offset::FLAGS)));
        if !flags.contains(InfoFlags::MEMORY_MAP) {
            return Err(LoadError::MemoryMapAbsent { flags });
        }

        let map_length = mem.read_u32(info.offset(info_offset::MMAP_LENGTH));
        let map_addr = PhysAddr::new(mem.read_u32(info.offset(info_offset::MMAP_ADDR)) as u64);
        let end = map_addr.as_u64().saturating_add(map_length as u64);

        let mut cursor = map_addr.as_u64();
        while cursor < end {
            // Never read past the declared map: a record that does not fit
            // ends the list.
            if end - cursor < RECORD_FIELDS_LEN {
                break;
            }
            if self.is_full() {
                self.mark_truncated();
                break;
            }

            let (size, record) = read_record(mem, PhysAddr::new(cursor));
            self.push(record);

            cursor = cursor.saturating_add(size as u64 + SIZE_FIELD_LEN);
        }

        Ok(LoadSummary {
            records: self.count(),
            truncated: self.is_truncated(),
            map_addr,
            map_length,
        })
    }
}

/// Read the record at `at`. Returns its `size` field and the copied entry.
fn read_record<M: PhysMemory + ?Sized>(mem: &M, at: PhysAddr) -> (u32, RegionRecord) {
    let size = mem.read_u32(at.offset(record_offset::SIZE));
    let record = RegionRecord {
        base_lo: mem.read_u32(at.offset(record_offset::BASE_LO)),
        base_hi: mem.read_u32(at.offset(record_offset::BASE_HI)),
        len_lo: mem.read_u32(at.offset(record_offset::LEN_LO)),
        len_hi: mem.read_u32(at.offset(record_offset::LEN_HI)),
        typ: mem.read_u32(at.offset(record_offset::TYPE)),
    };
    (size, record)
}

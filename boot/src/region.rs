/// Region table: a bounded copy of the bootloader's memory map.
///
/// Records are kept in discovery order, exactly as the bootloader listed
/// them. The table is filled by `RegionTable::load` (see `multiboot`) and has
/// no other mutation API.
use core::fmt;

/// Maximum number of regions kept from the memory map. Anything past this
/// is dropped.
pub const REGION_TABLE_CAPACITY: usize = 64;

static_assertions::const_assert!(REGION_TABLE_CAPACITY > 0);

/// Memory type code as reported by the bootloader.
///
/// Opaque: the table never acts on it. The named constants exist so the
/// kernel can print something readable.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct RegionType(pub u32);

impl RegionType {
    pub const AVAILABLE: Self = Self(1);
    pub const RESERVED: Self = Self(2);
    pub const ACPI_RECLAIMABLE: Self = Self(3);
    pub const ACPI_NVS: Self = Self(4);
    pub const BAD_MEMORY: Self = Self(5);

    pub const fn as_u32(self) -> u32 {
        self.0
    }

    pub const fn name(self) -> &'static str {
        match self.0 {
            1 => "available",
            2 => "reserved",
            3 => "ACPI reclaimable",
            4 => "ACPI NVS",
            5 => "bad memory",
            _ => "unknown",
        }
    }
}

impl fmt::Debug for RegionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegionType({}: {})", self.0, self.name())
    }
}

impl fmt::Display for RegionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One memory map entry, copied verbatim from the bootloader.
///
/// Base and length stay split in 32-bit halves the way the protocol
/// transmits them; `base()` and `length()` put them back together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegionRecord {
    pub base_lo: u32,
    pub base_hi: u32,
    pub len_lo: u32,
    pub len_hi: u32,
    pub typ: u32,
}

impl RegionRecord {
    /// Returned for out-of-range lookups.
    pub const ZERO: Self = Self {
        base_lo: 0,
        base_hi: 0,
        len_lo: 0,
        len_hi: 0,
        typ: 0,
    };

    pub const fn new(base: u64, length: u64, typ: u32) -> Self {
        Self {
            base_lo: base as u32,
            base_hi: (base >> 32) as u32,
            len_lo: length as u32,
            len_hi: (length >> 32) as u32,
            typ,
        }
    }

    pub const fn base(&self) -> u64 {
        ((self.base_hi as u64) << 32) | self.base_lo as u64
    }

    pub const fn length(&self) -> u64 {
        ((self.len_hi as u64) << 32) | self.len_lo as u64
    }

    /// First address past the region, or `None` if base + length overflows.
    pub const fn end(&self) -> Option<u64> {
        self.base().checked_add(self.length())
    }

    pub const fn region_type(&self) -> RegionType {
        RegionType(self.typ)
    }

    pub const fn is_zero(&self) -> bool {
        self.base_lo == 0
            && self.base_hi == 0
            && self.len_lo == 0
            && self.len_hi == 0
            && self.typ == 0
    }

    /// The five raw words in protocol order: base lo/hi, length lo/hi, type.
    pub const fn fields(&self) -> (u32, u32, u32, u32, u32) {
        (self.base_lo, self.base_hi, self.len_lo, self.len_hi, self.typ)
    }
}

/// Fixed-capacity, insertion-ordered table of regions.
///
/// Only the first `count()` slots are ever handed out. Slots past that keep
/// whatever an earlier load left there.
pub struct RegionTable {
    entries: [RegionRecord; REGION_TABLE_CAPACITY],
    count: usize,
    truncated: bool,
}

impl RegionTable {
    /// An empty table. `const` so it can live in a static.
    pub const fn new() -> Self {
        Self {
            entries: [RegionRecord::ZERO; REGION_TABLE_CAPACITY],
            count: 0,
            truncated: false,
        }
    }

    pub const fn capacity(&self) -> usize {
        REGION_TABLE_CAPACITY
    }

    /// Number of valid entries.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// True if the last load stopped at capacity with records left unread.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Entry at `index`, or the all-zero record if `index >= count()`.
    pub fn entry_at(&self, index: usize) -> RegionRecord {
        self.get(index).copied().unwrap_or(RegionRecord::ZERO)
    }

    /// Entry at `index`, or `None` if it is out of range.
    pub fn get(&self, index: usize) -> Option<&RegionRecord> {
        self.as_slice().get(index)
    }

    /// The valid prefix of the table.
    pub fn as_slice(&self) -> &[RegionRecord] {
        &self.entries[..self.count]
    }

    pub fn iter(&self) -> core::slice::Iter<'_, RegionRecord> {
        self.as_slice().iter()
    }

    // ---- Mutation, reserved for the loader ----

    pub(crate) fn reset(&mut self) {
        self.count = 0;
        self.truncated = false;
    }

    pub(crate) fn is_full(&self) -> bool {
        self.count == REGION_TABLE_CAPACITY
    }

    /// Append a record. Returns false (and stores nothing) when full.
    pub(crate) fn push(&mut self, record: RegionRecord) -> bool {
        if self.is_full() {
            return false;
        }
        self.entries[self.count] = record;
        self.count += 1;
        true
    }

    pub(crate) fn mark_truncated(&mut self) {
        self.truncated = true;
    }
}

impl Default for RegionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RegionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionTable")
            .field("count", &self.count)
            .field("truncated", &self.truncated)
            .field("entries", &self.as_slice())
            .finish()
    }
}

impl<'a> IntoIterator for &'a RegionTable {
    type Item = &'a RegionRecord;
    type IntoIter = core::slice::Iter<'a, RegionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

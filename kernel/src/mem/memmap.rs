/// Boot-time physical memory map.
///
/// Holds the single RegionTable for the running kernel. It is filled once
/// from the Multiboot information block during early boot and only read
/// afterwards, so it lives in a `spin::Once` rather than behind a lock.
use core::fmt;
use spin::Once;

use cinder_boot::{LoadError, PhysAddr, PhysMemory, RegionTable, RegionType};

/// The kernel's memory map. Empty (but initialized) if the bootloader
/// supplied none.
pub static MEMORY_MAP: Once<RegionTable> = Once::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemMapError {
    /// The boot information block carries no memory map.
    Load(LoadError),
    /// `init` already ran this boot.
    AlreadyInitialized,
}

impl fmt::Display for MemMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemMapError::Load(e) => write!(f, "{}", e),
            MemMapError::AlreadyInitialized => write!(f, "memory map already initialized"),
        }
    }
}

impl From<LoadError> for MemMapError {
    fn from(e: LoadError) -> Self {
        MemMapError::Load(e)
    }
}

/// Load the memory map from the boot information block at `info`.
///
/// Must be called once, before anything reads `regions()`. The table is
/// published even when loading fails, so readers see an empty map instead
/// of none at all.
pub fn init<M: PhysMemory + ?Sized>(
    mem: &M,
    info: PhysAddr,
) -> Result<&'static RegionTable, MemMapError> {
    init_in(&MEMORY_MAP, mem, info)
}

/// The loaded memory map, or `None` before `init`.
pub fn regions() -> Option<&'static RegionTable> {
    MEMORY_MAP.get()
}

pub(crate) fn init_in<'a, M: PhysMemory + ?Sized>(
    slot: &'a Once<RegionTable>,
    mem: &M,
    info: PhysAddr,
) -> Result<&'a RegionTable, MemMapError> {
    let mut outcome = Err(MemMapError::AlreadyInitialized);
    let table = slot.call_once(|| {
        let mut table = RegionTable::new();
        outcome = table.try_load(mem, info).map(|_| ()).map_err(MemMapError::from);
        table
    });
    outcome.map(|()| table)
}

/// Total bytes the map reports for regions of type `typ`. Saturates rather
/// than overflowing on bogus lengths.
pub fn bytes_of_type(table: &RegionTable, typ: RegionType) -> u64 {
    table
        .iter()
        .filter(|r| r.region_type() == typ)
        .fold(0u64, |acc, r| acc.saturating_add(r.length()))
}

/// Types summarized in the boot log, in print order.
const LOGGED_TYPES: [RegionType; 5] = [
    RegionType::AVAILABLE,
    RegionType::RESERVED,
    RegionType::ACPI_RECLAIMABLE,
    RegionType::ACPI_NVS,
    RegionType::BAD_MEMORY,
];

/// Print the table to the boot log.
pub fn log_regions(table: &RegionTable) {
    crate::serial_println!(
        "[mem] Memory map: {} regions{}",
        table.count(),
        if table.is_truncated() { " (truncated, table full)" } else { "" }
    );

    if cfg!(feature = "log-regions") {
        for (i, r) in table.iter().enumerate() {
            match r.end() {
                Some(end) => crate::serial_println!(
                    "[mem]   {:2}: {:#018x} - {:#018x} {}",
                    i, r.base(), end, r.region_type()
                ),
                None => crate::serial_println!(
                    "[mem]   {:2}: {:#018x} + {:#x} (overflows) {}",
                    i, r.base(), r.length(), r.region_type()
                ),
            }
        }
    }

    for typ in LOGGED_TYPES {
        let bytes = bytes_of_type(table, typ);
        if bytes != 0 {
            crate::serial_println!("[mem] {:>16}: {} KiB", typ.name(), bytes / 1024);
        }
    }
}

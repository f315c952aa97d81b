/// Unit tests for the kernel memory map holder.
///
/// Each test uses its own `Once` slot; the process-wide MEMORY_MAP is only
/// touched by `global_map_is_written_once`.
/// Run with: cargo test --target x86_64-unknown-linux-gnu -p cinder-kernel --lib
extern crate alloc;

use alloc::string::ToString;
use spin::Once;

use cinder_boot::mock::BootInfoBuilder;
use cinder_boot::{InfoFlags, LoadError, RegionTable, RegionType};

use super::memmap::{self, bytes_of_type, init_in, log_regions};
use super::*;

fn sample_map() -> BootInfoBuilder {
    BootInfoBuilder::new()
        .record(0, 0x9FC00, 1)
        .record(0x9FC00, 0x400, 2)
        .record(0x100000, 0x7EE0000, 1)
        .record(0x7FE0000, 0x20000, 3)
}

#[test]
fn init_publishes_table() {
    let slot = Once::new();
    let (image, info) = sample_map().build();

    let table = init_in(&slot, &image, info).unwrap();
    assert_eq!(table.count(), 4);
    assert_eq!(slot.get().map(RegionTable::count), Some(4));
}

#[test]
fn second_init_is_rejected() {
    let slot = Once::new();
    let (image, info) = sample_map().build();
    init_in(&slot, &image, info).unwrap();

    let (other, other_info) = BootInfoBuilder::new().record(0, 0x1000, 1).build();
    let err = init_in(&slot, &other, other_info).unwrap_err();
    assert_eq!(err, MemMapError::AlreadyInitialized);
    // First load stays in place.
    assert_eq!(slot.get().map(RegionTable::count), Some(4));
}

#[test]
fn missing_map_publishes_empty_table() {
    let slot = Once::new();
    let (image, info) = sample_map().flags(InfoFlags::MEMORY.bits()).build();

    let err = init_in(&slot, &image, info).unwrap_err();
    assert_eq!(
        err,
        MemMapError::Load(LoadError::MemoryMapAbsent { flags: InfoFlags::MEMORY })
    );
    assert!(slot.get().is_some_and(RegionTable::is_empty));
}

#[test]
fn totals_by_type() {
    let slot = Once::new();
    let (image, info) = sample_map().build();
    let table = init_in(&slot, &image, info).unwrap();

    assert_eq!(bytes_of_type(table, RegionType::AVAILABLE), 0x9FC00 + 0x7EE0000);
    assert_eq!(bytes_of_type(table, RegionType::RESERVED), 0x400);
    assert_eq!(bytes_of_type(table, RegionType::ACPI_RECLAIMABLE), 0x20000);
    assert_eq!(bytes_of_type(table, RegionType::BAD_MEMORY), 0);
}

#[test]
fn totals_saturate() {
    let slot = Once::new();
    let (image, info) = BootInfoBuilder::new()
        .record(0, u64::MAX, 1)
        .record(0, u64::MAX, 1)
        .build();
    let table = init_in(&slot, &image, info).unwrap();

    assert_eq!(bytes_of_type(table, RegionType::AVAILABLE), u64::MAX);
    // Overflowing regions must not trip up the log path either.
    log_regions(table);
}

#[test]
fn error_messages() {
    let err = MemMapError::from(LoadError::MemoryMapAbsent { flags: InfoFlags::empty() });
    assert_eq!(err.to_string(), "no memory map in boot info (flags 0x0)");
    assert_eq!(
        MemMapError::AlreadyInitialized.to_string(),
        "memory map already initialized"
    );
}

#[test]
fn global_map_is_written_once() {
    let (image, info) = sample_map().build();
    let first = memmap::init(&image, info);
    let second = memmap::init(&image, info);

    assert!(first.is_ok());
    assert_eq!(second.unwrap_err(), MemMapError::AlreadyInitialized);
    assert_eq!(memmap::regions().map(RegionTable::count), Some(4));
}

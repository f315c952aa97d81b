#![no_std]
// Cinder boot handoff: Multiboot memory map ingestion.
//
// Runs before any allocator exists. The kernel hands us the physical address
// of the Multiboot information block; we copy its memory map into a fixed
// RegionTable that the frame allocator reads afterwards.

#[cfg(any(test, feature = "mock-memory"))]
extern crate alloc;

pub mod phys;
pub mod multiboot;
pub mod region;

#[cfg(any(test, feature = "mock-memory"))]
pub mod mock;

pub use phys::{PhysAddr, PhysMemory, DirectMap};
pub use multiboot::{BootInfo, BasicMemory, InfoFlags, LoadError, LoadSummary};
pub use region::{RegionRecord, RegionTable, RegionType, REGION_TABLE_CAPACITY};

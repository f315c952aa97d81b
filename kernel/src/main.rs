//! Cinder kernel entry point.
//!
//! Entered from the Multiboot boot stub in long mode, with the bootloader's
//! EAX (magic) and EBX (boot information address) passed through as
//! arguments. Low physical memory is still identity mapped at this point.
//!
//! Host builds get an empty `main` so the workspace builds and tests on the
//! host target.
#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
use core::panic::PanicInfo;

#[cfg(target_os = "none")]
use cinder_boot::multiboot::BOOTLOADER_MAGIC;
#[cfg(target_os = "none")]
use cinder_boot::{BootInfo, DirectMap, PhysAddr};

#[cfg(target_os = "none")]
use cinder_kernel::arch::x86_64::{self, serial};
#[cfg(target_os = "none")]
use cinder_kernel::mem::{memmap, MemMapError};
#[cfg(target_os = "none")]
use cinder_kernel::serial_println;

/// Kernel entry point, called by the boot stub with the Multiboot handoff
/// registers.
#[cfg(target_os = "none")]
#[no_mangle]
pub extern "C" fn kmain(magic: u32, info_addr: u32) -> ! {
    // 1. Serial console first, so everything after it can be logged
    serial::SERIAL.lock().init();
    serial_println!("Cinder v0.1.0 booting...");

    // 2. Verify we were loaded by a Multiboot bootloader
    if magic != BOOTLOADER_MAGIC {
        serial_println!("[boot] Bad bootloader magic {:#x} (expected {:#x})",
            magic, BOOTLOADER_MAGIC);
        x86_64::halt_forever();
    }

    // 3. Read the boot information header through the identity map
    let info = PhysAddr::new(info_addr as u64);
    // SAFETY: the bootloader leaves low memory, including the information
    // block and memory map it points to, identity mapped and readable.
    let phys = unsafe { DirectMap::identity() };
    let header = BootInfo::read(&phys, info);
    serial_println!("[boot] Boot info at {}, flags {:#x}", info, header.flags.bits());

    // 4. Load the memory map; fall back to mem_lower/mem_upper without one
    match memmap::init(&phys, info) {
        Ok(table) => memmap::log_regions(table),
        Err(MemMapError::Load(e)) => {
            serial_println!("[mem] {}", e);
            match header.basic_memory() {
                Some(basic) => serial_println!(
                    "[mem] Fallback: {} KiB lower, {} KiB upper memory",
                    basic.lower_kib, basic.upper_kib
                ),
                None => serial_println!("[mem] No memory information from bootloader"),
            }
        }
        Err(e) => serial_println!("[mem] {}", e),
    }

    serial_println!("Cinder boot complete.");
    x86_64::halt_forever();
}

#[cfg(target_os = "none")]
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    serial_println!("!!! KERNEL PANIC !!!");
    serial_println!("{}", info);
    x86_64::halt_forever();
}

#[cfg(not(target_os = "none"))]
fn main() {}

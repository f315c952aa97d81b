pub mod memmap;

pub use memmap::{MemMapError, MEMORY_MAP};

#[cfg(test)]
mod tests;

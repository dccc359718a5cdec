//! Session token persistence.

pub mod file_store;
pub mod memory_store;

pub use file_store::FileSessionStore;
pub use memory_store::MemorySessionStore;

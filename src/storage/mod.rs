pub mod memory;
pub mod sqlite;
pub mod trait_def;

pub use memory::MemoryBenchmarkStore;
pub use sqlite::SqliteBenchmarkStore;
pub use trait_def::{BenchmarkStore, StoreError, StoreResult};

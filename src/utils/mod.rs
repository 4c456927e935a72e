mod concurrent_map;
pub use concurrent_map::*;

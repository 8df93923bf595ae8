pub mod response_cache;

pub use response_cache::{CacheStats, CachedAnswer, ResponseCache};

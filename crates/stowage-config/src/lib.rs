pub mod config;
pub mod error;
pub mod utils;

#[cfg(test)]
pub mod test_utils;

pub use config::{CacheConfig, Config, DialectKind, StoreConfig};

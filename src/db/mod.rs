#[cfg(test)]
mod memory;
mod repository;
mod schema;

#[cfg(test)]
pub use memory::MemoryKv;
pub use repository::Repository;

use crate::error::Result;

/// String key/value storage the routine store snapshots into.
#[allow(async_fn_in_trait)]
pub trait KvBackend {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

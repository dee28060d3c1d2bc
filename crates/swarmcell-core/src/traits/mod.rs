mod embedder;
mod storage_adapter;

pub use embedder::Embedder;
pub use storage_adapter::{StorageAdapter, WalStats};

mod azure;
mod memory;
mod store;

pub use azure::{AzureBlobConfig, AzureBlobStore};
pub use memory::InMemoryBlobStore;
#[cfg(test)]
pub use store::MockBlobStore;
pub use store::{BlobStore, StoredBlob};

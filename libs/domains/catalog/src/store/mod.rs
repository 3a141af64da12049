mod memory;
mod mongodb;

pub use self::memory::InMemoryCatalogRepository;
pub use self::mongodb::{MongoCatalogOptions, MongoCatalogRepository};

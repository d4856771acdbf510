pub mod store;

pub use store::blob::FsBlobStore;

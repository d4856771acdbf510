pub mod catalog;
pub mod error;
pub mod model;

pub use catalog::StaticImageCatalog;

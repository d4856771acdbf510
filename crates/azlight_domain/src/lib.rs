pub mod stemcell;

pub use azlight_common::Result;

pub mod derive;
pub mod export;
pub mod normalize;

pub use derive::{DerivedRecord, Metric};

#[doc(hidden)]
pub mod full;
#[allow(clippy::module_inception)]
mod replicator;

pub use replicator::{replicate, Replicator};

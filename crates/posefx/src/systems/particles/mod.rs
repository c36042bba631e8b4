//! Pooled spark particles rendered through one instanced mesh.

pub mod rng;
pub mod spark;

pub use rng::Rng;
pub use spark::{Spark, SparkConfig, SparkField};

pub mod geometry;
pub mod material;
pub mod node;

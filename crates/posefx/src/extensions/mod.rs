// extensions/mod.rs
//
// Helpers shared by effects but independent of the scene model.

pub mod easing;

pub use easing::{ease, lerp, Easing};

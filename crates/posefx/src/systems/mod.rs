pub mod commentary;
pub mod detection;
pub mod factory;
pub mod particles;
pub mod render;
pub mod stage;

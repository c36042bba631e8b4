pub mod landmark;
pub mod resources;
pub mod scene;
pub mod time;

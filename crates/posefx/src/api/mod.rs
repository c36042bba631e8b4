pub mod config;
pub mod context;
pub mod effect;
pub mod types;

pub mod error;
pub mod manifest;
pub mod registry;
pub mod vector;

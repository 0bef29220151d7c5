pub mod color;
pub mod manifest;

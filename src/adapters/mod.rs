// Adapters layer: concrete implementations of the domain ports.
// File-backed and S3-backed stores live next to their configuration in src/config.

pub mod http;
pub mod memory;

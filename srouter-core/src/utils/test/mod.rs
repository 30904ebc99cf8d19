
/// Builders for well-formed frames to feed the router
pub mod packet_generators;

/// A ready-made three interface router for end to end tests
pub mod harness;

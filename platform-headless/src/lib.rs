//! The mandatory headless `Platform` backend: a frame-counted test
//! harness with a deterministic clock, no real input, and PBM dump/compare
//! for pixel-exact display assertions.

pub mod pbm;
pub mod platform;

pub use pbm::{dump, matches_reference, pack};
pub use platform::HeadlessPlatform;

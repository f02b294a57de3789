//! # H.265/HEVC IRAP Detection
//!
//! HEVC payloads are only checked for intra random access point NAL units
//! (types 16 to 23). Slice types of other pictures are not decoded.

/// Start code scan for IRAP NAL units
pub mod parser;

/// NAL unit type definitions
pub mod types;

#[doc(inline)]
pub use parser::classify;
pub use types::NALUnitType;

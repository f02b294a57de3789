//! # H.264/AVC Slice Classification
//!
//! Finds the first slice NAL unit in an Annex-B payload and reports its
//! picture type. IDR slices short-circuit; other slices decode
//! `first_mb_in_slice` and `slice_type` from the slice header.
//!
//! ```rust
//! use vdk_mpegts::codec::{h264, PictureType};
//!
//! // Non-IDR slice, first_mb_in_slice = 0, slice_type = 1 (B).
//! let payload = [0x00, 0x00, 0x01, 0x41, 0b1010_0000];
//! let found = h264::classify(&payload, true).unwrap();
//! assert_eq!(found.picture_type, PictureType::B);
//! assert!(!found.key_frame);
//! ```

/// Start code scan and slice header decoding
pub mod parser;
/// NAL unit and slice type definitions
pub mod types;

#[doc(inline)]
pub use parser::classify;
pub use types::{NALUnitType, SliceType};

//! # Elementary Stream Classifiers
//!
//! Each codec module scans a TS payload for the first unit start code and reads
//! just enough header bits to tell what kind of picture begins there. Nothing
//! beyond the slice/picture header is decoded.
//!
//! ```rust
//! use vdk_mpegts::codec::{h264, PictureType};
//!
//! // Access unit delimiter followed by an IDR slice.
//! let payload = [0x00, 0x00, 0x00, 0x01, 0x09, 0xF0, 0x00, 0x00, 0x01, 0x65, 0x88, 0x84];
//! let found = h264::classify(&payload, true).unwrap();
//! assert_eq!(found.picture_type, PictureType::I);
//! assert!(found.key_frame);
//! ```

/// Annex-B start code scanning shared by H.264 and H.265
pub mod annexb;
/// H.264/AVC slice classification
pub mod h264;
/// H.265/HEVC IRAP detection
pub mod h265;
/// MPEG-1/2 picture header classification
pub mod mpeg2;

/// Coded picture type, numbered like the `AVPictureType` values used by
/// most tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum PictureType {
    /// Undefined
    #[default]
    None = 0,
    /// Intra
    I = 1,
    /// Predicted
    P = 2,
    /// Bi-dir predicted
    B = 3,
    /// S(GMC)-VOP MPEG-4
    S = 4,
    /// Switching Intra
    SI = 5,
    /// Switching Predicted
    SP = 6,
    /// BI type
    BI = 7,
}

impl From<u8> for PictureType {
    fn from(value: u8) -> Self {
        match value {
            1 => PictureType::I,
            2 => PictureType::P,
            3 => PictureType::B,
            4 => PictureType::S,
            5 => PictureType::SI,
            6 => PictureType::SP,
            7 => PictureType::BI,
            _ => PictureType::None,
        }
    }
}

/// What a classifier learned about the unit found in a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    pub picture_type: PictureType,
    /// Self-contained random access point (IDR/IRAP/MPEG-2 I picture).
    pub key_frame: bool,
    /// The payload starts a new picture even if the TS header did not say so.
    pub unit_start: bool,
}

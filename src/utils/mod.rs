//! # Utility Functions and Types
//!
//! Building blocks shared by the demuxer and the muxer:
//!
//! - Bit-level reading with Exp-Golomb decoding and emulation prevention removal
//! - MPEG-2 CRC32 calculation for PSI sections
//! - A staging buffer that turns arbitrary-sized input into contiguous packet windows
//!
//! ## Bit Operations
//!
//! ```rust
//! use vdk_mpegts::utils::BitReader;
//!
//! let data = vec![0b10110011u8];
//! let mut reader = BitReader::new(&data);
//!
//! // Read specific number of bits
//! let value = reader.read(3); // Reads first 3 bits (101)
//! assert_eq!(value, 0b101);
//! ```
//!
//! ## CRC Calculation
//!
//! ```rust
//! use vdk_mpegts::utils::Crc32Mpeg2;
//!
//! let data = b"Hello, world!";
//! let crc = Crc32Mpeg2::calculate(data);
//! println!("CRC32: {:08x}", crc);
//! ```

/// Bit manipulation and bitstream reading utilities
pub mod bits;

/// Growable read/write staging buffer
pub mod buffer;

/// CRC calculation implementations
pub mod crc;

// Re-export commonly used types
pub use bits::BitReader;
pub use buffer::StagingBuffer;
pub use crc::{crc32, Crc32Mpeg2};

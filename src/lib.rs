#![doc(html_root_url = "https://docs.rs/vdk-mpegts/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::missing_crate_level_docs)]

//! # vdk-mpegts - MPEG Transport Stream toolkit
//!
//! `vdk-mpegts` demultiplexes and multiplexes MPEG Transport Streams: fixed
//! 188-byte packets carrying audio/video elementary streams behind a
//! Program Association Table (PAT) and Program Map Table (PMT).
//!
//! ## Features
//!
//! ### Demuxing
//! - PAT/PMT acquisition with optional CRC_32 verification
//! - PES header PTS/DTS and adaptation field PCR extraction
//! - Key frame and picture type detection for H.264, H.265 and MPEG-1/2 video
//! - Continuity counter tracking
//! - Byte-level resynchronization on corrupt input
//!
//! ### Muxing
//! - Single-program PAT/PMT generation
//! - PCR insertion from DTS or a nominal bitrate
//! - PES headers for key units, adaptation field stuffing
//!
//! ## Quick Start
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! vdk-mpegts = "0.1.0"
//! ```
//!
//! ### Counting key frames in a file
//!
//! ```rust,no_run
//! use vdk_mpegts::format::ts::TSReader;
//! use tokio;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let file = tokio::fs::File::open("input.ts").await?;
//!     let mut reader = TSReader::new(file);
//!
//!     while let Some(packet) = reader.next_packet().await? {
//!         if packet.info.is_video && packet.info.start {
//!             println!("unit start, pts {:?}", packet.info.pts);
//!         }
//!     }
//!
//!     println!(
//!         "keyframe count: {}, frame count {}",
//!         reader.keyframes(),
//!         reader.unit_starts()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ### Parsing packets from memory
//!
//! ```rust
//! use vdk_mpegts::format::ts::{TSDemuxer, TS_PACKET_SIZE};
//! use vdk_mpegts::utils::StagingBuffer;
//!
//! # fn main() -> vdk_mpegts::Result<()> {
//! let mut demuxer = TSDemuxer::new();
//! let mut buffer = StagingBuffer::new();
//!
//! // A null packet preceded by a stray byte.
//! let mut input = vec![0xAA, 0x47, 0x1F, 0xFF, 0x10];
//! input.resize(TS_PACKET_SIZE + 1, 0xFF);
//! buffer.extend_from_slice(&input)?;
//!
//! while buffer.size() >= TS_PACKET_SIZE {
//!     match demuxer.parse_packet(buffer.data()) {
//!         Ok(info) => {
//!             assert_eq!(info.pid, 0x1FFF);
//!             buffer.consume(TS_PACKET_SIZE)?;
//!         }
//!         Err(_) => buffer.consume(1)?,
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - `codec`: Elementary stream classifiers
//!   - H.264 slice type decoding
//!   - H.265 IRAP detection
//!   - MPEG-1/2 picture coding type
//!
//! - `format`: Container implementations
//!   - TS demuxer, muxer and async reader
//!   - PSI and PES field codec
//!
//! - `config`: Process-wide defaults from the environment and config files
//!
//! - `error`: Error handling types and utilities
//!
//! - `utils`: Common utilities and helper functions
//!   - Bitstream reading with Exp-Golomb codes
//!   - CRC calculations
//!   - Staging buffer management
//!
/// Elementary stream classifiers for video formats
pub mod codec;

/// Error types and utilities
pub mod error;

/// Container format implementations
pub mod format;

/// Common utilities and helper functions
pub mod utils;

/// Configuration module
pub mod config;

pub use error::{Result, VdkError};

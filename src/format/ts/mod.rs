//! # MPEG Transport Stream (TS) Implementation
//!
//! This module provides demultiplexing and multiplexing of single-program
//! MPEG Transport Streams, including support for:
//!
//! - TS packet header and adaptation field parsing and generation
//! - Program Specific Information (PAT/PMT) sections with CRC_32
//! - PES optional headers carrying PTS/DTS
//! - Key frame detection for H.264, H.265 and MPEG-1/2 video
//!
//! ## Core Features
//!
//! - **Demuxing**: [`TSDemuxer`] parses one 188-byte packet at a time and
//!   reports what it carries in a [`PacketInfo`]
//! - **Muxing**: [`TSMuxer`] packetizes encoded access units behind a PAT
//!   and PMT
//! - **Reading**: [`TSReader`] drives the demuxer from any tokio
//!   `AsyncRead`, resynchronizing on corrupt input
//! - **PCR Management**: PCR extraction and generation in 27 MHz ticks
//!
//! ## Example Usage
//!
//! ### Muxing and demuxing an access unit
//!
//! ```rust
//! use vdk_mpegts::codec::PictureType;
//! use vdk_mpegts::format::ts::{
//!     AccessUnit, MuxStreamInfo, PacketKind, TSDemuxer, TSMuxer, STREAM_TYPE_H264,
//!     TS_PACKET_SIZE,
//! };
//!
//! # fn main() -> vdk_mpegts::Result<()> {
//! let mut muxer = TSMuxer::new();
//! muxer.init_streams(&[MuxStreamInfo::video(256, STREAM_TYPE_H264)])?;
//!
//! let idr = [0x00, 0x00, 0x00, 0x01, 0x65, 0x88, 0x84];
//! let unit = AccessUnit::new(256, &idr)
//!     .with_picture_type(PictureType::I)
//!     .with_pts(3600)
//!     .with_dts(3600);
//! muxer.mux_stream(&unit)?;
//!
//! let output = muxer.take_output()?;
//! assert_eq!(output.len() % TS_PACKET_SIZE, 0);
//!
//! let mut demuxer = TSDemuxer::new();
//! let mut keyframes = 0;
//! for packet in output.chunks(TS_PACKET_SIZE) {
//!     let info = demuxer.parse_packet(packet)?;
//!     if info.kind == PacketKind::Idr {
//!         keyframes += 1;
//!         assert_eq!(info.pts, Some(3600));
//!     }
//! }
//! assert_eq!(keyframes, 1);
//! # Ok(())
//! # }
//! ```

/// Stateful packet demuxer
pub mod demuxer;

/// Access unit packetizer
pub mod muxer;

/// Low-level TS packet and PSI section field codec
pub mod parser;

/// PES header handling
pub mod pes;

/// Async packet reader with resynchronization
pub mod reader;

/// Core TS types and constants
pub mod types;

// Re-export commonly used types and constants
pub use demuxer::{DemuxerConfig, TSDemuxer};
pub use muxer::{MuxerConfig, TSMuxer};
pub use pes::PESHeader;
pub use reader::TSReader;
pub use types::*;

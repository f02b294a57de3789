//! Container formats.

pub mod ts;

pub use self::ts::{TSDemuxer, TSMuxer, TSReader};

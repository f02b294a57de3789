use super::demuxer::TSDemuxer;
use super::types::*;
use crate::error::Result;
use crate::utils::StagingBuffer;
use tokio::io::{AsyncRead, AsyncReadExt};

const READ_CHUNK: usize = TS_PACKET_SIZE * 7;

/// Async packet reader over any [`AsyncRead`] source.
///
/// Keeps at least one packet worth of input staged, hands it to a
/// [`TSDemuxer`] and resynchronizes on failure by dropping a single byte.
/// Successfully parsed packets advance the input by 188 bytes.
///
/// ```no_run
/// use vdk_mpegts::format::ts::TSReader;
///
/// # async fn scan() -> vdk_mpegts::Result<()> {
/// let file = tokio::fs::File::open("input.ts").await?;
/// let mut reader = TSReader::new(file);
/// while let Some(packet) = reader.next_packet().await? {
///     if packet.info.is_video && packet.info.is_key_frame() {
///         println!("keyframe at pts {:?}", packet.info.pts);
///     }
/// }
/// println!("{} keyframes, {} frames", reader.keyframes(), reader.unit_starts());
/// # Ok(())
/// # }
/// ```
pub struct TSReader<R: AsyncRead + Unpin> {
    reader: R,
    demuxer: TSDemuxer,
    buffer: StagingBuffer,
    eof: bool,
    offset: u64,
    keyframes: u64,
    unit_starts: u64,
    skipped_bytes: u64,
}

impl<R: AsyncRead + Unpin> TSReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_demuxer(reader, TSDemuxer::new())
    }

    pub fn with_demuxer(reader: R, demuxer: TSDemuxer) -> Self {
        Self {
            reader,
            demuxer,
            buffer: StagingBuffer::new(),
            eof: false,
            offset: 0,
            keyframes: 0,
            unit_starts: 0,
            skipped_bytes: 0,
        }
    }

    /// Reads until a full packet is staged or the source is exhausted.
    async fn fill(&mut self) -> Result<bool> {
        while self.buffer.size() < TS_PACKET_SIZE && !self.eof {
            let window = self.buffer.prepare(READ_CHUNK)?;
            let n = self.reader.read(window).await?;
            self.buffer.commit(n)?;
            if n == 0 {
                self.eof = true;
            }
        }
        Ok(self.buffer.size() >= TS_PACKET_SIZE)
    }

    /// Returns the next parsed packet, or `None` once fewer than 188 bytes
    /// remain in the source.
    pub async fn next_packet(&mut self) -> Result<Option<OwnedPacketInfo>> {
        loop {
            if !self.fill().await? {
                if !self.buffer.is_empty() {
                    log::debug!("dropping {} trailing bytes", self.buffer.size());
                }
                return Ok(None);
            }

            let packet = match self.demuxer.parse_packet(self.buffer.data()) {
                Ok(info) => info.to_owned_info(),
                Err(e) if e.is_resync() => {
                    log::trace!("offset {}: {}", self.offset, e);
                    self.buffer.consume(1)?;
                    self.offset += 1;
                    self.skipped_bytes += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };
            self.buffer.consume(TS_PACKET_SIZE)?;

            if packet.info.is_video {
                if packet.info.is_key_frame() {
                    self.keyframes += 1;
                }
                if packet.info.start {
                    self.unit_starts += 1;
                    log::debug!("pos={}", self.offset);
                }
            }
            self.offset += TS_PACKET_SIZE as u64;
            return Ok(Some(packet));
        }
    }

    pub fn demuxer(&self) -> &TSDemuxer {
        &self.demuxer
    }

    /// Input position of the next packet.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Video packets classified as key frames.
    pub fn keyframes(&self) -> u64 {
        self.keyframes
    }

    /// Video packets starting a unit.
    pub fn unit_starts(&self) -> u64 {
        self.unit_starts
    }

    /// Bytes dropped while searching for sync.
    pub fn skipped_bytes(&self) -> u64 {
        self.skipped_bytes
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

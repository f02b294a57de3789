use super::types::*;
use crate::error::{Result, VdkError};
use bytes::{BufMut, BytesMut};

pub const STREAM_ID_VIDEO: u8 = 0xe0;
pub const STREAM_ID_AUDIO: u8 = 0xc0;
pub const STREAM_ID_EXTENDED: u8 = 0xfd;
pub const STREAM_ID_METADATA: u8 = 0xfc;

const PTS_ONLY: u8 = 0x20;
const PTS_WITH_DTS: u8 = 0x30;
const DTS: u8 = 0x10;

/// PES stream_id the muxer uses for a stream.
///
/// Video is 0xE0 except Dirac (0xFD). MPEG audio and AAC/LATM are 0xC0,
/// AC-3 is 0xFD and any other audio 0xFC.
pub fn stream_id_for(kind: MediaKind, stream_type: u8) -> u8 {
    match kind {
        MediaKind::Video if stream_type == STREAM_TYPE_DIRAC => STREAM_ID_EXTENDED,
        MediaKind::Video => STREAM_ID_VIDEO,
        _ => match stream_type {
            STREAM_TYPE_MPEG1_AUDIO
            | STREAM_TYPE_MPEG2_AUDIO
            | STREAM_TYPE_AAC
            | STREAM_TYPE_AAC_LATM => STREAM_ID_AUDIO,
            STREAM_TYPE_AC3 => STREAM_ID_EXTENDED,
            _ => STREAM_ID_METADATA,
        },
    }
}

/// Packetized Elementary Stream (PES) header, up to and including the
/// optional PTS/DTS fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PESHeader {
    /// Stream identifier indicating content type (video/audio/etc.)
    pub stream_id: u8,
    /// PES_packet_length; 0 means unbounded (video).
    pub packet_length: u16,
    pub scrambling_control: u8,
    pub priority: bool,
    pub data_alignment: bool,
    pub copyright: bool,
    pub original: bool,
    /// PES_header_data_length. Raised to fit the timestamps on write.
    pub header_data_length: u8,
    /// Presentation Time Stamp (33 bits, 90 kHz)
    pub pts: Option<u64>,
    /// Decoding Time Stamp (33 bits, 90 kHz)
    pub dts: Option<u64>,
}

impl PESHeader {
    pub fn new(stream_id: u8) -> Self {
        Self {
            stream_id,
            ..Default::default()
        }
    }

    pub fn with_pts(mut self, pts: u64) -> Self {
        self.pts = Some(pts);
        self
    }

    pub fn with_dts(mut self, dts: u64) -> Self {
        self.dts = Some(dts);
        self
    }

    fn timestamps_len(&self) -> usize {
        match (self.pts, self.dts) {
            (_, Some(_)) => 2 * PES_TIMESTAMP_SIZE,
            (Some(_), None) => PES_TIMESTAMP_SIZE,
            (None, None) => 0,
        }
    }

    fn data_length(&self) -> usize {
        (self.header_data_length as usize).max(self.timestamps_len())
    }

    /// Encoded header size: fixed part, optional part and header data.
    pub fn encoded_len(&self) -> usize {
        PES_HEADER_SIZE + PES_OPTIONAL_HEADER_SIZE + self.data_length()
    }

    /// Writes the header. A DTS without PTS is written as PTS == DTS.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.put_slice(&[0x00, 0x00, 0x01]);
        buf.put_u8(self.stream_id);
        buf.put_u16(self.packet_length);

        // '10' marker bits
        let mut flags = 0x80u8;
        flags |= (self.scrambling_control & 0x03) << 4;
        if self.priority {
            flags |= 0x08;
        }
        if self.data_alignment {
            flags |= 0x04;
        }
        if self.copyright {
            flags |= 0x02;
        }
        if self.original {
            flags |= 0x01;
        }
        buf.put_u8(flags);

        let pts = self.pts.or(self.dts);
        buf.put_u8(match (pts, self.dts) {
            (_, Some(_)) => 0xC0,
            (Some(_), None) => 0x80,
            (None, None) => 0x00,
        });

        let data_length = self.data_length();
        buf.put_u8(data_length as u8);

        let start = buf.len();
        match (pts, self.dts) {
            (Some(pts), Some(dts)) => {
                write_timestamp(buf, PTS_WITH_DTS, pts);
                write_timestamp(buf, DTS, dts);
            }
            (Some(pts), None) => write_timestamp(buf, PTS_ONLY, pts),
            _ => {}
        }
        let written = buf.len() - start;
        if written < data_length {
            buf.put_bytes(0xFF, data_length - written);
        }
    }

    /// Parses a PES header at the start of `data`.
    ///
    /// Fails when the start code prefix is missing or the header data runs
    /// past `data`.
    pub fn parse(data: &[u8]) -> Result<PESHeader> {
        let fixed = PES_HEADER_SIZE + PES_OPTIONAL_HEADER_SIZE;
        if data.len() < fixed {
            return Err(VdkError::InvalidData("PES header too short".into()));
        }
        if data[..3] != [0x00, 0x00, 0x01] {
            return Err(VdkError::InvalidData("missing PES start code".into()));
        }

        let header_data_length = data[8];
        if fixed + header_data_length as usize > data.len() {
            return Err(VdkError::InvalidData(format!(
                "PES header data length {} overruns payload",
                header_data_length
            )));
        }

        let flags = data[6];
        let mut header = PESHeader {
            stream_id: data[3],
            packet_length: ((data[4] as u16) << 8) | data[5] as u16,
            scrambling_control: (flags >> 4) & 0x03,
            priority: flags & 0x08 != 0,
            data_alignment: flags & 0x04 != 0,
            copyright: flags & 0x02 != 0,
            original: flags & 0x01 != 0,
            header_data_length,
            pts: None,
            dts: None,
        };

        let has_pts = data[7] & 0x80 != 0;
        let has_dts = data[7] & 0xC0 == 0xC0;
        if has_pts {
            if (header_data_length as usize) < PES_TIMESTAMP_SIZE {
                return Err(VdkError::InvalidData("PES header too short for PTS".into()));
            }
            header.pts = Some(read_timestamp(&data[fixed..]));
        }
        if has_dts {
            if (header_data_length as usize) < 2 * PES_TIMESTAMP_SIZE {
                return Err(VdkError::InvalidData("PES header too short for DTS".into()));
            }
            header.dts = Some(read_timestamp(&data[fixed + PES_TIMESTAMP_SIZE..]));
        }

        Ok(header)
    }
}

/// Writes a 33-bit timestamp as the 5-byte marker-interleaved field with
/// the 4-bit `prefix` in the top nibble.
pub fn write_timestamp(buf: &mut BytesMut, prefix: u8, ts: u64) {
    let ts = ts & 0x1_FFFF_FFFF;

    // prefix, 3 MSB of timestamp, marker
    buf.put_u8(prefix | ((ts >> 29) & 0x0E) as u8 | 0x01);

    // Middle 15 bits and marker
    buf.put_u16((((ts >> 14) & 0xFFFE) | 0x01) as u16);

    // Final 15 bits and marker
    buf.put_u16((((ts << 1) & 0xFFFE) | 0x01) as u16);
}

/// Reads a 5-byte timestamp field, ignoring prefix and marker bits.
pub fn read_timestamp(data: &[u8]) -> u64 {
    (((data[0] as u64) & 0x0E) << 29)
        | ((data[1] as u64) << 22)
        | (((data[2] as u64) & 0xFE) << 14)
        | ((data[3] as u64) << 7)
        | (((data[4] as u64) & 0xFE) >> 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_timestamp_layout() {
        let mut buf = BytesMut::new();
        write_timestamp(&mut buf, PTS_ONLY, 0x1_2345_6789);
        assert_eq!(&buf[..], &[0x29, 0x8D, 0x15, 0xCF, 0x13]);
        assert_eq!(read_timestamp(&buf), 0x1_2345_6789);

        let mut buf = BytesMut::new();
        write_timestamp(&mut buf, DTS, 0);
        assert_eq!(&buf[..], &[0x11, 0x00, 0x01, 0x00, 0x01]);
    }

    #[test]
    fn test_pes_header_pts_only() {
        let header = PESHeader::new(STREAM_ID_VIDEO).with_pts(90_000);
        let mut buf = BytesMut::new();
        header.write_to(&mut buf);

        assert_eq!(buf.len(), 14);
        assert_eq!(header.encoded_len(), 14);
        assert_eq!(&buf[0..3], &[0x00, 0x00, 0x01]);
        assert_eq!(buf[3], 0xe0);
        assert_eq!(&buf[6..9], &[0x80, 0x80, 0x05]);
        assert_eq!(buf[9] & 0xF0, 0x20);

        let parsed = PESHeader::parse(&buf).unwrap();
        assert_eq!(parsed.pts, Some(90_000));
        assert_eq!(parsed.dts, None);
        assert_eq!(parsed.encoded_len(), 14);
    }

    #[test]
    fn test_pes_header_pts_and_dts() {
        let header = PESHeader::new(STREAM_ID_VIDEO).with_pts(3003).with_dts(0);
        let mut buf = BytesMut::new();
        header.write_to(&mut buf);

        assert_eq!(buf.len(), 19);
        assert_eq!(&buf[6..9], &[0x80, 0xC0, 0x0A]);
        assert_eq!(buf[9] & 0xF0, 0x30);
        assert_eq!(buf[14], 0x11);

        let parsed = PESHeader::parse(&buf).unwrap();
        assert_eq!(parsed, PESHeader {
            header_data_length: 10,
            ..header
        });
    }

    #[test]
    fn test_pes_header_dts_only_becomes_pts() {
        let header = PESHeader::new(STREAM_ID_AUDIO).with_dts(1234);
        let mut buf = BytesMut::new();
        header.write_to(&mut buf);

        let parsed = PESHeader::parse(&buf).unwrap();
        assert_eq!(parsed.pts, Some(1234));
        assert_eq!(parsed.dts, Some(1234));
    }

    #[test]
    fn test_pes_parse_errors() {
        assert!(PESHeader::parse(&[0x00, 0x00, 0x01, 0xe0]).is_err());
        assert!(PESHeader::parse(&[0x00, 0x00, 0x02, 0xe0, 0, 0, 0x80, 0x00, 0x00]).is_err());
        // Header data length runs past the payload.
        assert!(PESHeader::parse(&[0x00, 0x00, 0x01, 0xe0, 0, 0, 0x80, 0x80, 0x05, 0x21]).is_err());
        // PTS flagged but header data too short to hold it.
        assert!(PESHeader::parse(&[0x00, 0x00, 0x01, 0xe0, 0, 0, 0x80, 0x80, 0x01, 0xFF]).is_err());
    }

    #[test]
    fn test_stream_ids() {
        assert_eq!(stream_id_for(MediaKind::Video, STREAM_TYPE_H264), 0xe0);
        assert_eq!(stream_id_for(MediaKind::Video, STREAM_TYPE_DIRAC), 0xfd);
        assert_eq!(stream_id_for(MediaKind::Audio, STREAM_TYPE_AAC), 0xc0);
        assert_eq!(stream_id_for(MediaKind::Audio, STREAM_TYPE_MPEG1_AUDIO), 0xc0);
        assert_eq!(stream_id_for(MediaKind::Audio, STREAM_TYPE_AC3), 0xfd);
        assert_eq!(stream_id_for(MediaKind::Audio, 0x82), 0xfc);
    }
}

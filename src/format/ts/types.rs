use crate::codec::PictureType;
use bytes::{BufMut, Bytes, BytesMut};
use std::time::Duration;

// Packet geometry
pub const TS_PACKET_SIZE: usize = 188;
pub const TS_HEADER_SIZE: usize = 4;
pub const TS_PAYLOAD_SIZE: usize = TS_PACKET_SIZE - TS_HEADER_SIZE;
pub const SYNC_BYTE: u8 = 0x47;

// PIDs
pub const PID_PAT: u16 = 0x0000;
pub const PID_NULL: u16 = 0x1FFF;
pub const PID_MAX: u16 = 0x1FFF;
pub const PID_COUNT: usize = 0x2000;
pub const DEFAULT_PMT_PID: u16 = 0x0FFF;

// Table IDs
pub const TABLE_ID_PAT: u8 = 0x00;
pub const TABLE_ID_PMT: u8 = 0x02;

// PSI layout
pub const PSI_HEADER_SIZE: usize = 3;
pub const PSI_SYNTAX_HEADER_SIZE: usize = 8;
pub const PSI_CRC_SIZE: usize = 4;
pub const PAT_PROGRAM_SIZE: usize = 4;
pub const PMT_HEADER_SIZE: usize = PSI_SYNTAX_HEADER_SIZE + 4;
pub const PMT_ES_SIZE: usize = 5;

// PES layout
pub const PES_HEADER_SIZE: usize = 6;
pub const PES_OPTIONAL_HEADER_SIZE: usize = 3;
pub const PES_TIMESTAMP_SIZE: usize = 5;

/// Raw PAT packet followed by raw PMT packet, as last seen by the demuxer.
pub const METADATA_SIZE: usize = TS_PACKET_SIZE * 2;

// Clocks
pub const PTS_HZ: u64 = 90_000;
pub const PCR_HZ: u64 = 27_000_000;

// Elementary Stream Types
pub const STREAM_TYPE_MPEG1_VIDEO: u8 = 0x01;
pub const STREAM_TYPE_MPEG2_VIDEO: u8 = 0x02;
pub const STREAM_TYPE_MPEG1_AUDIO: u8 = 0x03;
pub const STREAM_TYPE_MPEG2_AUDIO: u8 = 0x04;
pub const STREAM_TYPE_AAC: u8 = 0x0f;
pub const STREAM_TYPE_MPEG4_VIDEO: u8 = 0x10;
pub const STREAM_TYPE_AAC_LATM: u8 = 0x11;
pub const STREAM_TYPE_H264: u8 = 0x1b;
pub const STREAM_TYPE_H264_SVC: u8 = 0x20;
pub const STREAM_TYPE_H265: u8 = 0x24;
pub const STREAM_TYPE_CAVS: u8 = 0x42;
pub const STREAM_TYPE_DIRAC: u8 = 0xd1;
pub const STREAM_TYPE_VC1: u8 = 0xea;
pub const STREAM_TYPE_AC3: u8 = 0x81;

/// Stream types a PMT may declare, with the names reported by
/// [`stream_type_name`]. A PMT listing any other type is rejected.
const STREAM_TYPES: &[(u8, &str)] = &[
    (0x01, "MPEG2VIDEO|ISO/IEC 11172-2 Video"),
    (0x02, "MPEG2VIDEO|ISO/IEC 13818-2 Video"),
    (0x03, "MP3|ISO/IEC 11172-3 Audio"),
    (0x04, "MP3|ISO/IEC 13818-3 Audio"),
    (0x05, "ISO/IEC 13818-1 PRIVATE SECTION"),
    (0x06, "ISO/IEC 13818-1 PES"),
    (0x07, "ISO/IEC 13522 MHEG"),
    (0x08, "ISO/IEC 13818-1 Annex A DSM-CC"),
    (0x09, "ITU-T Rec.H.222.1"),
    (0x0a, "ISO/IEC 13818-6 type A"),
    (0x0b, "ISO/IEC 13818-6 type B"),
    (0x0c, "ISO/IEC 13818-6 type C"),
    (0x0d, "ISO/IEC 13818-6 type D"),
    (0x0e, "ISO/IEC 13818-1 AUXILIARY"),
    (0x0f, "AAC"),
    (0x10, "MPEG4|ISO/IEC 14496-2 Visual"),
    (0x11, "LATM|ISO/IEC 14496-3 Audio with the LATM transport syntax as defined in ISO/IEC 14496-3 / AMD 1"),
    (0x12, "ISO/IEC 14496-1 SL-packetized stream or FlexMux stream carried in PES packets"),
    (0x13, "ISO/IEC 14496-1 SL-packetized stream or FlexMux stream carried in ISO/IEC14496_sections"),
    (0x14, "ISO/IEC 13818-6 Synchronized Download Protocol"),
    (0x1b, "H264"),
    (0x20, "H264"),
    (0x24, "HEVC"),
    (0x42, "CAVS"),
    (0x80, "PCM_BLURAY"),
    (0x81, "AC3|DOLBY_AC3_AUDIO"),
    (0x82, "DTS"),
    (0x83, "TRUEHD"),
    (0x84, "EAC3"),
    (0x85, "DTS"),
    (0x86, "DTS"),
    (0x8a, "DTS"),
    (0x90, "HDMV_PGS_SUBTITLE"),
    (0xa1, "EAC3"),
    (0xa2, "DTS"),
    (0xd1, "DIRAC"),
    (0xea, "VC1"),
];

/// Display name of a PMT stream type, `None` for unknown codes.
pub fn stream_type_name(stream_type: u8) -> Option<&'static str> {
    STREAM_TYPES
        .iter()
        .find(|(code, _)| *code == stream_type)
        .map(|(_, name)| *name)
}

/// Reverse lookup of [`stream_type_name`]; the lowest code wins for names
/// shared by several types.
pub fn stream_type_by_name(name: &str) -> Option<u8> {
    STREAM_TYPES
        .iter()
        .find(|(_, n)| *n == name)
        .map(|(code, _)| *code)
}

pub fn is_known_stream_type(stream_type: u8) -> bool {
    stream_type_name(stream_type).is_some()
}

/// Collapses H.264 variants onto [`STREAM_TYPE_H264`]; other codes pass
/// through unchanged.
pub fn normalize_stream_type(stream_type: u8) -> u8 {
    match stream_type {
        STREAM_TYPE_H264 | STREAM_TYPE_H264_SVC => STREAM_TYPE_H264,
        other => other,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Audio,
    Data,
}

pub fn media_kind(stream_type: u8) -> MediaKind {
    match stream_type {
        0x01 | 0x02 | 0x10 | 0x1b | 0x20 | 0x24 | 0x42 | 0xd1 | 0xea => MediaKind::Video,
        0x03 | 0x04 | 0x0f | 0x11 | 0x80..=0x86 | 0x8a | 0x90 | 0xa1 | 0xa2 => MediaKind::Audio,
        _ => MediaKind::Data,
    }
}

/// PIDs that never carry media: the PSI/SI tables other than PAT, and null
/// packets.
pub fn is_reserved_pid(pid: u16) -> bool {
    matches!(pid, 0x0001 | 0x0002 | 0x0010..=0x0014 | 0x001E | 0x001F | PID_NULL)
}

/// What a single TS packet turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PacketKind {
    Pat,
    Pmt,
    #[default]
    Reserved,
    /// Video packet in which a key picture was detected.
    Idr,
    Data,
    Null,
}

/// Parse result for one TS packet.
///
/// `payload` borrows from the packet handed to the demuxer; use
/// [`PacketInfo::to_owned_info`] to keep it past the next buffer mutation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PacketInfo<'a> {
    pub pid: u16,
    /// payload_unit_start_indicator, or a picture start found by the MPEG-2
    /// classifier.
    pub start: bool,
    pub cc: u8,
    /// CRC_32 of a PAT/PMT section when CRC checking is enabled.
    pub crc: Option<u32>,
    pub picture_type: PictureType,
    pub kind: PacketKind,
    /// Program clock reference in milliseconds.
    pub pcr: Option<i64>,
    /// Program clock reference in 27 MHz ticks.
    pub pcr_27mhz: Option<u64>,
    /// 90 kHz presentation timestamp.
    pub pts: Option<i64>,
    /// 90 kHz decoding timestamp, equal to `pts` when the PES header has none.
    pub dts: Option<i64>,
    pub is_video: bool,
    pub is_audio: bool,
    pub stream_type: u8,
    pub payload: &'a [u8],
}

impl PacketInfo<'_> {
    pub fn is_key_frame(&self) -> bool {
        self.kind == PacketKind::Idr
    }

    pub fn to_owned_info(&self) -> OwnedPacketInfo {
        OwnedPacketInfo {
            info: PacketInfo {
                pid: self.pid,
                start: self.start,
                cc: self.cc,
                crc: self.crc,
                picture_type: self.picture_type,
                kind: self.kind,
                pcr: self.pcr,
                pcr_27mhz: self.pcr_27mhz,
                pts: self.pts,
                dts: self.dts,
                is_video: self.is_video,
                is_audio: self.is_audio,
                stream_type: self.stream_type,
                payload: &[],
            },
            payload: Bytes::copy_from_slice(self.payload),
        }
    }
}

/// [`PacketInfo`] with its payload copied out of the input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedPacketInfo {
    /// Packet fields; `info.payload` is always empty.
    pub info: PacketInfo<'static>,
    pub payload: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PATEntry {
    pub program_number: u16,
    /// Network PID for program 0, PMT PID otherwise.
    pub pid: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgramAssociation {
    pub transport_stream_id: u16,
    pub version: u8,
    pub entries: Vec<PATEntry>,
}

impl ProgramAssociation {
    /// PMT PIDs of all non-zero programs.
    pub fn pmt_pids(&self) -> impl Iterator<Item = u16> + '_ {
        self.entries
            .iter()
            .filter(|e| e.program_number != 0)
            .map(|e| e.pid)
    }

    /// Length of the program loop in bytes.
    pub fn body_len(&self) -> usize {
        self.entries.len() * PAT_PROGRAM_SIZE
    }

    /// Length of the complete section, header and CRC_32 included.
    pub fn section_len(&self) -> usize {
        PSI_SYNTAX_HEADER_SIZE + self.body_len() + PSI_CRC_SIZE
    }

    /// Writes the program loop (the section body after the syntax header).
    pub fn write_to(&self, buf: &mut BytesMut) {
        for entry in &self.entries {
            buf.put_u16(entry.program_number);
            buf.put_u16(entry.pid & 0x1fff | 7 << 13);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub tag: u8,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementaryStreamInfo {
    pub stream_type: u8,
    pub elementary_pid: u16,
    pub descriptors: Vec<Descriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgramMap {
    pub program_number: u16,
    pub version: u8,
    pub pcr_pid: u16,
    pub program_descriptors: Vec<Descriptor>,
    pub streams: Vec<ElementaryStreamInfo>,
}

fn descriptors_len(descriptors: &[Descriptor]) -> usize {
    descriptors.iter().map(|d| 2 + d.data.len()).sum()
}

fn write_descriptors(buf: &mut BytesMut, descriptors: &[Descriptor]) {
    buf.put_u16((descriptors_len(descriptors) as u16) & 0x3ff | 0xf << 12);
    for desc in descriptors {
        buf.put_u8(desc.tag);
        buf.put_u8(desc.data.len() as u8);
        buf.put_slice(&desc.data);
    }
}

impl ProgramMap {
    /// Length of the section body (PCR PID onwards, CRC excluded).
    pub fn body_len(&self) -> usize {
        let mut n = 4 + descriptors_len(&self.program_descriptors);
        for info in &self.streams {
            n += PMT_ES_SIZE + descriptors_len(&info.descriptors);
        }
        n
    }

    /// Length of the complete section, header and CRC_32 included.
    pub fn section_len(&self) -> usize {
        PSI_SYNTAX_HEADER_SIZE + self.body_len() + PSI_CRC_SIZE
    }

    /// Writes the section body following the syntax header.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.put_u16(self.pcr_pid & 0x1fff | 7 << 13);
        write_descriptors(buf, &self.program_descriptors);

        for info in &self.streams {
            buf.put_u8(info.stream_type);
            buf.put_u16(info.elementary_pid & 0x1fff | 7 << 13);
            write_descriptors(buf, &info.descriptors);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdaptationField {
    /// adaptation_field_length; 0 means the field is a single stuffing byte.
    pub length: usize,
    pub discontinuity: bool,
    pub random_access: bool,
    pub es_priority: bool,
    /// 27 MHz ticks.
    pub pcr: Option<u64>,
    pub opcr: Option<u64>,
    pub splice_countdown: Option<i8>,
    pub private_data: Option<Vec<u8>>,
}

impl AdaptationField {
    /// Smallest adaptation_field_length able to hold the flagged fields.
    pub fn min_length(&self) -> usize {
        let mut n = 1;
        if self.pcr.is_some() {
            n += 6;
        }
        if self.opcr.is_some() {
            n += 6;
        }
        if self.splice_countdown.is_some() {
            n += 1;
        }
        if let Some(data) = &self.private_data {
            n += 1 + data.len();
        }
        n
    }

    /// Bytes occupied in the packet, length byte included.
    pub fn encoded_len(&self) -> usize {
        1 + self.length
    }

    /// Writes the field; bytes between the flagged fields and `length` are
    /// filled with 0xFF stuffing.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.put_u8(self.length as u8);
        if self.length == 0 {
            return;
        }

        let start = buf.len();
        let mut flags = 0u8;
        if self.discontinuity {
            flags |= 0x80;
        }
        if self.random_access {
            flags |= 0x40;
        }
        if self.es_priority {
            flags |= 0x20;
        }
        if self.pcr.is_some() {
            flags |= 0x10;
        }
        if self.opcr.is_some() {
            flags |= 0x08;
        }
        if self.splice_countdown.is_some() {
            flags |= 0x04;
        }
        if self.private_data.is_some() {
            flags |= 0x02;
        }
        buf.put_u8(flags);

        if let Some(pcr) = self.pcr {
            write_pcr(buf, pcr);
        }
        if let Some(opcr) = self.opcr {
            write_pcr(buf, opcr);
        }
        if let Some(countdown) = self.splice_countdown {
            buf.put_i8(countdown);
        }
        if let Some(data) = &self.private_data {
            buf.put_u8(data.len() as u8);
            buf.put_slice(data);
        }

        let written = buf.len() - start;
        if written < self.length {
            buf.put_bytes(0xFF, self.length - written);
        }
    }
}

/// Writes a 27 MHz clock value as the 6-byte PCR field: 33-bit base, 6
/// reserved bits, 9-bit extension.
pub fn write_pcr(buf: &mut BytesMut, pcr: u64) {
    let base = (pcr / 300) & 0x1_FFFF_FFFF;
    let ext = pcr % 300;
    buf.put_u32((base >> 1) as u32);
    buf.put_u8(((base << 7) & 0x80) as u8 | 0x7E | ((ext >> 8) & 0x01) as u8);
    buf.put_u8(ext as u8);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TSHeader {
    pub sync_byte: u8,
    pub transport_error: bool,
    pub payload_unit_start: bool,
    pub transport_priority: bool,
    pub pid: u16,
    pub scrambling_control: u8,
    pub adaptation_field_exists: bool,
    pub contains_payload: bool,
    pub continuity_counter: u8,
}

impl Default for TSHeader {
    fn default() -> Self {
        Self {
            sync_byte: SYNC_BYTE,
            transport_error: false,
            payload_unit_start: false,
            transport_priority: false,
            pid: 0,
            scrambling_control: 0,
            adaptation_field_exists: false,
            contains_payload: true,
            continuity_counter: 0,
        }
    }
}

impl TSHeader {
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.put_u8(self.sync_byte);

        let mut b1 = 0u8;
        if self.transport_error {
            b1 |= 0x80;
        }
        if self.payload_unit_start {
            b1 |= 0x40;
        }
        if self.transport_priority {
            b1 |= 0x20;
        }
        b1 |= ((self.pid >> 8) & 0x1f) as u8;
        buf.put_u8(b1);

        buf.put_u8((self.pid & 0xff) as u8);

        let mut b3 = (self.scrambling_control & 0x03) << 6;
        if self.adaptation_field_exists {
            b3 |= 0x20;
        }
        if self.contains_payload {
            b3 |= 0x10;
        }
        b3 |= self.continuity_counter & 0x0f;
        buf.put_u8(b3);
    }
}

/// Elementary stream declared to the muxer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuxStreamInfo {
    pub pid: u16,
    pub kind: MediaKind,
    pub stream_type: u8,
}

impl MuxStreamInfo {
    pub fn video(pid: u16, stream_type: u8) -> Self {
        Self {
            pid,
            kind: MediaKind::Video,
            stream_type,
        }
    }

    pub fn audio(pid: u16, stream_type: u8) -> Self {
        Self {
            pid,
            kind: MediaKind::Audio,
            stream_type,
        }
    }
}

/// One encoded access unit handed to the muxer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessUnit<'a> {
    pub pid: u16,
    pub picture_type: PictureType,
    /// 90 kHz
    pub pts: Option<i64>,
    /// 90 kHz
    pub dts: Option<i64>,
    pub payload: &'a [u8],
}

impl<'a> AccessUnit<'a> {
    pub fn new(pid: u16, payload: &'a [u8]) -> Self {
        Self {
            pid,
            picture_type: PictureType::None,
            pts: None,
            dts: None,
            payload,
        }
    }

    pub fn with_picture_type(mut self, picture_type: PictureType) -> Self {
        self.picture_type = picture_type;
        self
    }

    pub fn with_pts(mut self, pts: i64) -> Self {
        self.pts = Some(pts);
        self
    }

    pub fn with_dts(mut self, dts: i64) -> Self {
        self.dts = Some(dts);
        self
    }
}

// Time conversion utilities
pub fn pcr_to_time(pcr: u64) -> Duration {
    Duration::from_nanos(((pcr as u128 * 1_000_000_000) / PCR_HZ as u128) as u64)
}

pub fn time_to_pcr(time: Duration) -> u64 {
    (time.as_nanos() * PCR_HZ as u128 / 1_000_000_000) as u64
}

pub fn pts_to_time(pts: u64) -> Duration {
    Duration::from_nanos(((pts as u128 * 1_000_000_000) / PTS_HZ as u128) as u64)
}

pub fn time_to_pts(time: Duration) -> u64 {
    (time.as_nanos() * PTS_HZ as u128 / 1_000_000_000) as u64
}

use super::parser;
use super::pes::PESHeader;
use super::types::*;
use crate::codec::{h264, h265, mpeg2, PictureType};
use crate::error::{Result, VdkError};
use bitvec::prelude::*;

type PidSet = BitArr!(for PID_COUNT);

/// Runtime switches for [`TSDemuxer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemuxerConfig {
    /// Verify PAT/PMT CRC_32 and report it in [`PacketInfo::crc`].
    pub check_crc: bool,
    /// Track continuity counters of audio/video PIDs.
    pub continuity_check: bool,
    /// Decode `slice_type` of non-IDR H.264 slices.
    pub parse_picture_type: bool,
}

impl Default for DemuxerConfig {
    fn default() -> Self {
        Self {
            check_crc: false,
            continuity_check: true,
            parse_picture_type: true,
        }
    }
}

/// MPEG Transport Stream demuxer.
///
/// Parses one 188-byte packet per call and keeps the PSI state needed to
/// interpret the next one:
/// - PAT/PMT acquisition and the PID to stream type map
/// - video/audio PID classification
/// - per-PID "picture type known" flags, cleared on every unit start
/// - continuity counters
///
/// A failed parse leaves all state untouched. Callers resynchronize by
/// skipping one byte and retrying (see [`super::reader::TSReader`]).
pub struct TSDemuxer {
    config: DemuxerConfig,
    has_pat: bool,
    pmt_pids: PidSet,
    video_pids: PidSet,
    audio_pids: PidSet,
    type_known: PidSet,
    /// PID -> normalized stream type, 0 when unknown
    streams: Vec<u8>,
    /// PID -> last continuity counter, -1 when unset
    cc: Vec<i8>,
    pcr_pid: Option<u16>,
    metadata: [u8; METADATA_SIZE],
    program_map: Option<ProgramMap>,
    continuity_errors: u64,
    packets_parsed: u64,
}

impl Default for TSDemuxer {
    fn default() -> Self {
        Self::new()
    }
}

impl TSDemuxer {
    /// Creates a new TS demuxer.
    pub fn new() -> Self {
        Self::with_config(DemuxerConfig::default())
    }

    pub fn with_config(config: DemuxerConfig) -> Self {
        Self {
            config,
            has_pat: false,
            pmt_pids: PidSet::ZERO,
            video_pids: PidSet::ZERO,
            audio_pids: PidSet::ZERO,
            type_known: PidSet::ZERO,
            streams: vec![0; PID_COUNT],
            cc: vec![-1; PID_COUNT],
            pcr_pid: None,
            metadata: [0; METADATA_SIZE],
            program_map: None,
            continuity_errors: 0,
            packets_parsed: 0,
        }
    }

    pub fn config(&self) -> &DemuxerConfig {
        &self.config
    }

    /// Parses the TS packet at the start of `packet`.
    ///
    /// Only the first [`TS_PACKET_SIZE`] bytes are read; the returned
    /// payload borrows from them.
    pub fn parse_packet<'a>(&mut self, packet: &'a [u8]) -> Result<PacketInfo<'a>> {
        let info = self.parse_inner(packet)?;
        self.packets_parsed += 1;
        Ok(info)
    }

    fn parse_inner<'a>(&mut self, packet: &'a [u8]) -> Result<PacketInfo<'a>> {
        if packet.len() < TS_PACKET_SIZE {
            return Err(VdkError::InvalidData(format!(
                "need {} bytes, got {}",
                TS_PACKET_SIZE,
                packet.len()
            )));
        }
        let packet = &packet[..TS_PACKET_SIZE];

        let sync = parser::sync_byte(packet);
        if sync != SYNC_BYTE {
            return Err(VdkError::Sync { found: sync });
        }

        let pid = parser::pid(packet);
        let mut info = PacketInfo {
            pid,
            start: parser::unit_start(packet),
            cc: parser::continuity_counter(packet),
            stream_type: self.streams[pid as usize],
            ..Default::default()
        };

        if is_reserved_pid(pid) {
            info.kind = if pid == PID_NULL {
                PacketKind::Null
            } else {
                PacketKind::Reserved
            };
            return Ok(info);
        }

        if pid == PID_PAT {
            self.parse_pat(packet, &mut info)?;
            return Ok(info);
        }

        if self.has_pat && self.pmt_pids[pid as usize] {
            self.parse_pmt(packet, pid, &mut info)?;
            return Ok(info);
        }

        let mut payload: &'a [u8] = &[];
        if parser::has_payload(packet) {
            info.kind = PacketKind::Data;
            let mut offset = parser::payload_offset(packet)?;

            if info.start && packet[offset..].starts_with(&[0x00, 0x00, 0x01]) {
                match PESHeader::parse(&packet[offset..]) {
                    Ok(pes) => {
                        info.pts = pes.pts.map(|v| v as i64);
                        info.dts = pes.dts.map(|v| v as i64).or(info.pts);
                        offset += pes.encoded_len();
                    }
                    Err(e) => {
                        log::warn!("pid {}: {}, dropping payload", pid, e);
                        offset = TS_PACKET_SIZE;
                    }
                }
            }
            payload = &packet[offset..];
        }

        if self.pcr_pid == Some(pid) {
            if let Some(pcr) = parser::read_pcr(packet) {
                info.pcr_27mhz = Some(pcr);
                info.pcr = Some((pcr / 27_000) as i64);
            }
        }

        info.is_video = self.video_pids[pid as usize];
        info.is_audio = self.audio_pids[pid as usize];
        info.payload = payload;
        if !info.is_video && !info.is_audio {
            return Ok(info);
        }

        if info.start {
            self.type_known.set(pid as usize, false);
        }

        if info.is_video && !payload.is_empty() {
            self.classify(pid, payload, &mut info);
        }

        // Adaptation-only packets repeat the previous counter.
        if self.config.continuity_check && parser::has_payload(packet) {
            self.check_continuity(pid, info.cc);
        }

        Ok(info)
    }

    fn parse_pat(&mut self, packet: &[u8], info: &mut PacketInfo<'_>) -> Result<()> {
        let section = &packet[parser::section_offset(packet)?..];
        let pat = parser::parse_pat(section).map_err(|e| {
            log::warn!("PAT: {}", e);
            e
        })?;
        if self.config.check_crc {
            info.crc = Some(check_section_crc("PAT", section)?);
        }

        for pmt_pid in pat.pmt_pids() {
            log::debug!("PAT: program map on pid {}", pmt_pid);
            self.pmt_pids.set(pmt_pid as usize, true);
            self.has_pat = true;
        }

        self.metadata[..TS_PACKET_SIZE].copy_from_slice(packet);
        info.kind = PacketKind::Pat;
        Ok(())
    }

    fn parse_pmt(&mut self, packet: &[u8], pid: u16, info: &mut PacketInfo<'_>) -> Result<()> {
        let section = &packet[parser::section_offset(packet)?..];
        let pmt = parser::parse_pmt(section).map_err(|e| {
            log::warn!("PMT on pid {}: {}", pid, e);
            e
        })?;
        if self.config.check_crc {
            info.crc = Some(check_section_crc("PMT", section)?);
        }

        self.pcr_pid = Some(pmt.pcr_pid);
        for es in &pmt.streams {
            let es_pid = es.elementary_pid as usize;
            self.streams[es_pid] = normalize_stream_type(es.stream_type);
            match media_kind(es.stream_type) {
                MediaKind::Video => self.video_pids.set(es_pid, true),
                MediaKind::Audio => self.audio_pids.set(es_pid, true),
                MediaKind::Data => log::warn!(
                    "PMT: unexpected stream type {:#04x} on pid {}",
                    es.stream_type,
                    es_pid
                ),
            }
        }

        self.metadata[TS_PACKET_SIZE..].copy_from_slice(packet);
        self.program_map = Some(pmt);
        info.kind = PacketKind::Pmt;
        Ok(())
    }

    fn classify(&mut self, pid: u16, payload: &[u8], info: &mut PacketInfo<'_>) {
        let known = self.type_known[pid as usize];
        let found = match info.stream_type {
            STREAM_TYPE_H264 if !known => h264::classify(payload, self.config.parse_picture_type),
            STREAM_TYPE_H265 if !known => h265::classify(payload),
            // Picture headers are cheap to find, so MPEG-2 is rescanned on every packet.
            STREAM_TYPE_MPEG1_VIDEO | STREAM_TYPE_MPEG2_VIDEO => mpeg2::classify(payload),
            _ => None,
        };
        let Some(found) = found else {
            return;
        };

        if matches!(info.stream_type, STREAM_TYPE_H264 | STREAM_TYPE_H265)
            && found.picture_type != PictureType::None
        {
            self.type_known.set(pid as usize, true);
        }
        info.picture_type = found.picture_type;
        if found.key_frame {
            info.kind = PacketKind::Idr;
        }
        if found.unit_start {
            info.start = true;
        }
    }

    fn check_continuity(&mut self, pid: u16, cc: u8) {
        let last = self.cc[pid as usize];
        if last >= 0 {
            let expected = (last as u8 + 1) & 0x0F;
            if cc != expected {
                self.continuity_errors += 1;
                log::warn!(
                    "Continuity check failed for pid {} expected {}, got {}",
                    pid,
                    expected,
                    cc
                );
            }
        }
        self.cc[pid as usize] = cc as i8;
    }

    /// Raw PAT packet (first 188 bytes) and PMT packet (last 188 bytes) as
    /// last parsed; zeroed until seen.
    pub fn metadata(&self) -> &[u8] {
        &self.metadata
    }

    pub fn has_pat(&self) -> bool {
        self.has_pat
    }

    pub fn pcr_pid(&self) -> Option<u16> {
        self.pcr_pid
    }

    /// Normalized stream type of `pid`, 0 when not declared by a PMT.
    pub fn stream_type(&self, pid: u16) -> u8 {
        self.streams.get(pid as usize).copied().unwrap_or(0)
    }

    pub fn stream_name(&self, pid: u16) -> Option<&'static str> {
        stream_type_name(self.stream_type(pid))
    }

    pub fn is_pmt_pid(&self, pid: u16) -> bool {
        self.pmt_pids.get(pid as usize).map(|b| *b).unwrap_or(false)
    }

    pub fn is_video_pid(&self, pid: u16) -> bool {
        self.video_pids.get(pid as usize).map(|b| *b).unwrap_or(false)
    }

    pub fn is_audio_pid(&self, pid: u16) -> bool {
        self.audio_pids.get(pid as usize).map(|b| *b).unwrap_or(false)
    }

    /// True once the picture type of the current access unit on `pid` has
    /// been determined.
    pub fn is_type_known(&self, pid: u16) -> bool {
        self.type_known.get(pid as usize).map(|b| *b).unwrap_or(false)
    }

    /// Last successfully parsed PMT.
    pub fn program_map(&self) -> Option<&ProgramMap> {
        self.program_map.as_ref()
    }

    pub fn continuity_errors(&self) -> u64 {
        self.continuity_errors
    }

    pub fn packets_parsed(&self) -> u64 {
        self.packets_parsed
    }
}

/// Returns the stored CRC_32, logging a mismatch.
fn check_section_crc(table: &str, section: &[u8]) -> Result<u32> {
    let (stored, computed) = parser::section_crc(section)?;
    if stored != computed {
        log::warn!(
            "parse {} section crc32 error, crc = {:#010x}, crc in data = {:#010x}",
            table,
            computed,
            stored
        );
    }
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::super::parser::test_utils::*;
    use super::*;
    use bytes::{BufMut, BytesMut};
    use pretty_assertions::assert_eq;

    const PMT_PID: u16 = DEFAULT_PMT_PID;
    const VIDEO_PID: u16 = 40;
    const AUDIO_PID: u16 = 50;

    fn media_packet(pid: u16, cc: u8, start: bool, pts: Option<u64>, es: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(TS_PACKET_SIZE);
        TSHeader {
            payload_unit_start: start,
            pid,
            continuity_counter: cc,
            ..Default::default()
        }
        .write_to(&mut buf);
        if start {
            let mut pes = PESHeader::new(0xe0);
            pes.pts = pts;
            pes.write_to(&mut buf);
        }
        buf.put_slice(es);
        buf.resize(TS_PACKET_SIZE, 0xFF);
        buf.to_vec()
    }

    fn pcr_packet(pid: u16, cc: u8, pcr: u64) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(TS_PACKET_SIZE);
        TSHeader {
            pid,
            continuity_counter: cc,
            adaptation_field_exists: true,
            ..Default::default()
        }
        .write_to(&mut buf);
        AdaptationField {
            length: 7,
            pcr: Some(pcr),
            ..Default::default()
        }
        .write_to(&mut buf);
        buf.resize(TS_PACKET_SIZE, 0xFF);
        buf.to_vec()
    }

    /// Packet made of a header and a 183-byte adaptation field.
    fn adaptation_only_packet(pid: u16, cc: u8) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(TS_PACKET_SIZE);
        TSHeader {
            pid,
            continuity_counter: cc,
            adaptation_field_exists: true,
            contains_payload: false,
            ..Default::default()
        }
        .write_to(&mut buf);
        AdaptationField {
            length: TS_PACKET_SIZE - TS_HEADER_SIZE - 1,
            ..Default::default()
        }
        .write_to(&mut buf);
        buf.to_vec()
    }

    fn with_program(config: DemuxerConfig, pcr_pid: u16, streams: &[(u8, u16)]) -> TSDemuxer {
        let mut demuxer = TSDemuxer::with_config(config);
        let pat = psi_packet(PID_PAT, 0, &pat_section(PMT_PID));
        demuxer.parse_packet(&pat).unwrap();
        let pmt = psi_packet(PMT_PID, 0, &pmt_section(pcr_pid, streams));
        demuxer.parse_packet(&pmt).unwrap();
        demuxer
    }

    fn acquired() -> TSDemuxer {
        with_program(
            DemuxerConfig::default(),
            VIDEO_PID,
            &[(0x1b, VIDEO_PID), (0x0f, AUDIO_PID)],
        )
    }

    // AUD, IDR slice
    const IDR: &[u8] = &[0x00, 0x00, 0x00, 0x01, 0x09, 0xF0, 0x00, 0x00, 0x01, 0x65, 0x88, 0x84];
    // Non-IDR slice, first_mb_in_slice 0, slice_type 0 (P)
    const P_SLICE: &[u8] = &[0x00, 0x00, 0x01, 0x41, 0b1100_0000, 0x00];

    #[test]
    fn test_pat_registers_pmt_pid() {
        let mut demuxer = TSDemuxer::new();
        let packet = psi_packet(PID_PAT, 0, &pat_section(PMT_PID));
        let info = demuxer.parse_packet(&packet).unwrap();

        assert_eq!(info.kind, PacketKind::Pat);
        assert_eq!(info.pid, PID_PAT);
        assert!(demuxer.has_pat());
        assert!(demuxer.is_pmt_pid(PMT_PID));
        assert_eq!(&demuxer.metadata()[..TS_PACKET_SIZE], &packet[..]);
        assert_eq!(demuxer.packets_parsed(), 1);
    }

    #[test]
    fn test_pmt_before_pat_is_plain_data() {
        let mut demuxer = TSDemuxer::new();
        let packet = psi_packet(PMT_PID, 0, &pmt_section(VIDEO_PID, &[(0x1b, VIDEO_PID)]));
        let info = demuxer.parse_packet(&packet).unwrap();

        assert_eq!(info.kind, PacketKind::Data);
        assert!(!info.is_video);
        assert_eq!(demuxer.stream_type(VIDEO_PID), 0);
        assert_eq!(demuxer.pcr_pid(), None);
    }

    #[test]
    fn test_pmt_populates_streams() {
        let demuxer = acquired();

        assert_eq!(demuxer.pcr_pid(), Some(VIDEO_PID));
        assert!(demuxer.is_video_pid(VIDEO_PID));
        assert!(demuxer.is_audio_pid(AUDIO_PID));
        assert!(!demuxer.is_video_pid(AUDIO_PID));
        assert_eq!(demuxer.stream_type(VIDEO_PID), STREAM_TYPE_H264);
        assert_eq!(demuxer.stream_name(VIDEO_PID), Some("H264"));
        assert_eq!(demuxer.stream_name(AUDIO_PID), Some("AAC"));
        assert_eq!(demuxer.stream_name(60), None);
        assert_eq!(demuxer.program_map().unwrap().streams.len(), 2);
        assert_eq!(demuxer.metadata()[TS_PACKET_SIZE], SYNC_BYTE);
    }

    #[test]
    fn test_h264_variant_is_normalized() {
        let demuxer = with_program(DemuxerConfig::default(), VIDEO_PID, &[(0x20, VIDEO_PID)]);
        assert_eq!(demuxer.stream_type(VIDEO_PID), STREAM_TYPE_H264);
    }

    #[test]
    fn test_unknown_stream_type_keeps_state() {
        let mut demuxer = TSDemuxer::new();
        let pat = psi_packet(PID_PAT, 0, &pat_section(PMT_PID));
        demuxer.parse_packet(&pat).unwrap();

        let packet = psi_packet(
            PMT_PID,
            0,
            &pmt_section(VIDEO_PID, &[(0x1b, VIDEO_PID), (0x99, AUDIO_PID)]),
        );
        assert!(matches!(demuxer.parse_packet(&packet), Err(VdkError::Parser(_))));
        assert_eq!(demuxer.pcr_pid(), None);
        assert!(!demuxer.is_video_pid(VIDEO_PID));
        assert_eq!(demuxer.stream_type(VIDEO_PID), 0);
        assert!(demuxer.program_map().is_none());
        assert_eq!(demuxer.packets_parsed(), 1);
    }

    #[test]
    fn test_oversized_section_is_rejected() {
        let mut demuxer = TSDemuxer::new();
        let mut packet = psi_packet(PID_PAT, 0, &pat_section(PMT_PID));
        packet[6] = 0xB0;
        packet[7] = 184;
        assert!(matches!(
            demuxer.parse_packet(&packet),
            Err(VdkError::InvalidData(_))
        ));
        assert!(!demuxer.has_pat());
    }

    #[test]
    fn test_sync_and_length_errors() {
        let mut demuxer = TSDemuxer::new();
        let mut packet = psi_packet(PID_PAT, 0, &pat_section(PMT_PID));
        packet[0] = 0x00;
        assert!(matches!(
            demuxer.parse_packet(&packet),
            Err(VdkError::Sync { found: 0x00 })
        ));
        assert!(demuxer.parse_packet(&[0x47; 100]).is_err());
        assert_eq!(demuxer.packets_parsed(), 0);
    }

    #[test]
    fn test_reserved_and_null_packets() {
        let mut demuxer = TSDemuxer::new();
        let null = media_packet(PID_NULL, 0, false, None, &[]);
        let info = demuxer.parse_packet(&null).unwrap();
        assert_eq!(info.kind, PacketKind::Null);

        let reserved = media_packet(0x0011, 0, true, None, &[]);
        let info = demuxer.parse_packet(&reserved).unwrap();
        assert_eq!(info.kind, PacketKind::Reserved);
        assert!(info.payload.is_empty());
    }

    #[test]
    fn test_idr_access_unit_across_packets() {
        let mut demuxer = acquired();

        let first = media_packet(VIDEO_PID, 0, true, Some(90_000), IDR);
        let info = demuxer.parse_packet(&first).unwrap();
        assert_eq!(info.kind, PacketKind::Idr);
        assert_eq!(info.picture_type, PictureType::I);
        assert!(info.start);
        assert!(info.is_video);
        assert_eq!(info.pts, Some(90_000));
        assert_eq!(info.dts, Some(90_000));
        assert_eq!(info.stream_type, STREAM_TYPE_H264);
        assert_eq!(&info.payload[..IDR.len()], IDR);
        assert_eq!(info.payload.len(), TS_PACKET_SIZE - 4 - 14);
        assert!(demuxer.is_type_known(VIDEO_PID));

        // Continuations of the same unit are not rescanned.
        for cc in 1..3 {
            let packet = media_packet(VIDEO_PID, cc, false, None, P_SLICE);
            let info = demuxer.parse_packet(&packet).unwrap();
            assert_eq!(info.kind, PacketKind::Data);
            assert_eq!(info.picture_type, PictureType::None);
            assert_eq!(info.pts, None);
            assert_eq!(info.payload.len(), TS_PAYLOAD_SIZE);
        }

        // The next unit start clears the known flag.
        let next = media_packet(VIDEO_PID, 3, true, Some(93_003), P_SLICE);
        let info = demuxer.parse_packet(&next).unwrap();
        assert_eq!(info.kind, PacketKind::Data);
        assert_eq!(info.picture_type, PictureType::P);
        assert_eq!(demuxer.continuity_errors(), 0);
    }

    #[test]
    fn test_slice_header_split_across_packets() {
        let mut demuxer = acquired();

        // The unit start packet ends right after the slice NAL header.
        let mut first = BytesMut::with_capacity(TS_PACKET_SIZE);
        TSHeader {
            payload_unit_start: true,
            pid: VIDEO_PID,
            ..Default::default()
        }
        .write_to(&mut first);
        PESHeader::new(0xe0).with_pts(3600).write_to(&mut first);
        let fill = TS_PACKET_SIZE - first.len() - 4;
        first.put_bytes(0x5A, fill);
        first.put_slice(&[0x00, 0x00, 0x01, 0x41]);
        assert_eq!(first.len(), TS_PACKET_SIZE);

        let info = demuxer.parse_packet(&first).unwrap();
        assert_eq!(info.picture_type, PictureType::None);
        assert!(!demuxer.is_type_known(VIDEO_PID));

        // The rest of that slice header carries no start code of its own.
        let second = media_packet(VIDEO_PID, 1, false, None, &[0b1010_0000]);
        let info = demuxer.parse_packet(&second).unwrap();
        assert_eq!(info.picture_type, PictureType::None);

        // A continuation carrying a complete slice is still scanned.
        let third = media_packet(VIDEO_PID, 2, false, None, P_SLICE);
        let info = demuxer.parse_packet(&third).unwrap();
        assert_eq!(info.picture_type, PictureType::P);
        assert!(demuxer.is_type_known(VIDEO_PID));
    }

    #[test]
    fn test_picture_type_decoding_can_be_disabled() {
        let config = DemuxerConfig {
            parse_picture_type: false,
            ..Default::default()
        };
        let mut demuxer = with_program(config, VIDEO_PID, &[(0x1b, VIDEO_PID)]);

        let p_unit = media_packet(VIDEO_PID, 0, true, None, P_SLICE);
        let info = demuxer.parse_packet(&p_unit).unwrap();
        assert_eq!(info.picture_type, PictureType::None);
        assert!(!demuxer.is_type_known(VIDEO_PID));

        let idr_unit = media_packet(VIDEO_PID, 1, true, None, IDR);
        let info = demuxer.parse_packet(&idr_unit).unwrap();
        assert_eq!(info.kind, PacketKind::Idr);
        assert!(demuxer.is_type_known(VIDEO_PID));
    }

    #[test]
    fn test_audio_is_not_classified() {
        let mut demuxer = acquired();
        let packet = media_packet(AUDIO_PID, 0, true, Some(1800), IDR);
        let info = demuxer.parse_packet(&packet).unwrap();
        assert!(info.is_audio);
        assert_eq!(info.kind, PacketKind::Data);
        assert_eq!(info.picture_type, PictureType::None);
        assert_eq!(info.pts, Some(1800));
    }

    #[test]
    fn test_hevc_and_mpeg2_streams() {
        let mut demuxer = with_program(
            DemuxerConfig::default(),
            0x100,
            &[(0x24, 0x100), (0x02, 0x101)],
        );

        let hevc_idr = media_packet(0x100, 0, true, None, &[0x00, 0x00, 0x01, 0x26, 0x01, 0xAF]);
        let info = demuxer.parse_packet(&hevc_idr).unwrap();
        assert_eq!(info.kind, PacketKind::Idr);

        // An MPEG-2 picture header found mid-unit marks a start.
        let picture = [0x00, 0x00, 0x01, 0x00, 0x00, 0x10, 0xFF, 0xF8];
        let packet = media_packet(0x101, 0, false, None, &picture);
        let info = demuxer.parse_packet(&packet).unwrap();
        assert!(info.start);
        assert_eq!(info.picture_type, PictureType::P);
        assert_eq!(info.kind, PacketKind::Data);
    }

    #[test]
    fn test_pcr_on_pcr_pid() {
        let mut demuxer = acquired();
        let packet = pcr_packet(VIDEO_PID, 0, 27_000 * 1500 + 7);
        let info = demuxer.parse_packet(&packet).unwrap();
        assert_eq!(info.pcr, Some(1500));
        assert_eq!(info.pcr_27mhz, Some(27_000 * 1500 + 7));

        let packet = pcr_packet(AUDIO_PID, 0, 27_000);
        let info = demuxer.parse_packet(&packet).unwrap();
        assert_eq!(info.pcr, None);
    }

    #[test]
    fn test_continuity_errors_are_counted() {
        let mut demuxer = acquired();
        for cc in [14u8, 15, 0, 1, 3, 4] {
            let packet = media_packet(AUDIO_PID, cc, false, None, &[]);
            let info = demuxer.parse_packet(&packet).unwrap();
            assert_eq!(info.cc, cc);
        }
        assert_eq!(demuxer.continuity_errors(), 1);
    }

    #[test]
    fn test_adaptation_only_packets_keep_counter() {
        let mut demuxer = acquired();
        let packets = [
            media_packet(VIDEO_PID, 6, false, None, &[]),
            adaptation_only_packet(VIDEO_PID, 6),
            adaptation_only_packet(VIDEO_PID, 6),
            media_packet(VIDEO_PID, 7, false, None, &[]),
        ];
        for packet in &packets {
            let info = demuxer.parse_packet(packet).unwrap();
            assert!(info.is_video);
        }
        assert_eq!(demuxer.continuity_errors(), 0);

        let info = demuxer.parse_packet(&packets[1]).unwrap();
        assert!(info.payload.is_empty());
        assert_eq!(info.pcr, None);
    }

    #[test]
    fn test_continuity_check_disabled() {
        let config = DemuxerConfig {
            continuity_check: false,
            ..Default::default()
        };
        let mut demuxer = with_program(config, AUDIO_PID, &[(0x0f, AUDIO_PID)]);
        for cc in [0u8, 5, 9] {
            let packet = media_packet(AUDIO_PID, cc, false, None, &[]);
            demuxer.parse_packet(&packet).unwrap();
        }
        assert_eq!(demuxer.continuity_errors(), 0);
    }

    #[test]
    fn test_crc_mismatch_is_not_fatal() {
        let mut demuxer = TSDemuxer::with_config(DemuxerConfig {
            check_crc: true,
            ..Default::default()
        });
        let section = pat_section(PMT_PID);
        let stored = u32::from_be_bytes([section[12], section[13], section[14], section[15]]);

        let packet = psi_packet(PID_PAT, 0, &section);
        let info = demuxer.parse_packet(&packet).unwrap();
        assert_eq!(info.crc, Some(stored));

        let mut packet = psi_packet(PID_PAT, 1, &section);
        packet[5 + 15] ^= 0xFF;
        let info = demuxer.parse_packet(&packet).unwrap();
        assert_eq!(info.kind, PacketKind::Pat);
        assert_eq!(info.crc, Some(stored ^ 0xFF));
    }

    #[test]
    fn test_bad_pes_header_drops_payload() {
        let mut demuxer = acquired();
        let mut packet = media_packet(VIDEO_PID, 0, true, Some(90_000), IDR);
        packet[4 + 8] = 0xF0; // header data length past the packet
        let info = demuxer.parse_packet(&packet).unwrap();
        assert!(info.payload.is_empty());
        assert_eq!(info.pts, None);
    }
}

use super::parser::{self, write_pat, write_pmt};
use super::pes::{stream_id_for, PESHeader};
use super::types::*;
use crate::codec::PictureType;
use crate::error::{Result, VdkError};
use crate::utils::StagingBuffer;
use bytes::{BufMut, Bytes, BytesMut};
use std::collections::BTreeMap;

/// Bitrate assumed when a PCR has to be extrapolated from output size.
pub const DEFAULT_NOMINAL_BITRATE: u64 = 4_000_000;

/// Offset of the last PCR base byte within a packet carrying a PCR.
const PCR_BYTE_OFFSET: u64 = 11;

const PROGRAM_NUMBER: u16 = 1;
const TABLE_VERSION: u8 = 1;

/// Runtime switches for [`TSMuxer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuxerConfig {
    pub pmt_pid: u16,
    /// Bits per second used to extrapolate PCR values for units without DTS.
    pub nominal_bitrate: u64,
    /// Set transport_priority on every emitted packet.
    pub transport_priority: bool,
    /// Write a PES header at the start of every unit, not only I pictures.
    pub pes_every_unit: bool,
}

impl Default for MuxerConfig {
    fn default() -> Self {
        Self {
            pmt_pid: DEFAULT_PMT_PID,
            nominal_bitrate: DEFAULT_NOMINAL_BITRATE,
            transport_priority: true,
            pes_every_unit: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MuxStreamState {
    pid: u16,
    kind: MediaKind,
    stream_type: u8,
    cc: u8,
}

/// Stream types the muxer can declare in its PMT.
pub fn is_muxable_stream_type(stream_type: u8) -> bool {
    matches!(
        stream_type,
        0x01..=0x14
            | STREAM_TYPE_H264
            | STREAM_TYPE_H264_SVC
            | STREAM_TYPE_H265
            | STREAM_TYPE_CAVS
            | STREAM_TYPE_DIRAC
            | STREAM_TYPE_VC1
    )
}

/// Single-program MPEG-TS muxer.
///
/// Access units are packetized into 188-byte packets accumulated in an
/// internal [`StagingBuffer`]; drain it with [`TSMuxer::fetch`] or
/// [`TSMuxer::take_output`]. PAT and PMT are written once, ahead of the
/// first unit.
pub struct TSMuxer {
    config: MuxerConfig,
    streams: BTreeMap<u16, MuxStreamState>,
    pat_count: u8,
    pmt_count: u8,
    started: bool,
    packets_written: u64,
    total_bytes: u64,
    first_pcr: Option<u64>,
    output: StagingBuffer,
}

impl Default for TSMuxer {
    fn default() -> Self {
        Self::new()
    }
}

impl TSMuxer {
    pub fn new() -> Self {
        Self::with_config(MuxerConfig::default())
    }

    pub fn with_config(config: MuxerConfig) -> Self {
        Self {
            config,
            streams: BTreeMap::new(),
            pat_count: 0,
            pmt_count: 0,
            started: false,
            packets_written: 0,
            total_bytes: 0,
            first_pcr: None,
            output: StagingBuffer::new(),
        }
    }

    pub fn config(&self) -> &MuxerConfig {
        &self.config
    }

    /// Registers the program's elementary streams.
    ///
    /// Every entry is validated before any is registered, so a rejected
    /// call leaves the muxer unchanged. The resulting PMT must fit in a
    /// single packet.
    pub fn init_streams(&mut self, streams: &[MuxStreamInfo]) -> Result<()> {
        for info in streams {
            self.validate_stream(info)?;
        }

        let mut registered = self.streams.clone();
        for info in streams {
            registered.insert(
                info.pid,
                MuxStreamState {
                    pid: info.pid,
                    kind: info.kind,
                    stream_type: info.stream_type,
                    cc: 0,
                },
            );
        }
        let section_len = program_map_for(&registered).section_len();
        if !section_fits(section_len) {
            return Err(VdkError::Config(format!(
                "{} streams need a PMT section of {} bytes, more than one packet holds",
                registered.len(),
                section_len
            )));
        }

        for info in streams {
            log::debug!(
                "mux: pid {} {:?} stream type {:#04x}",
                info.pid,
                info.kind,
                info.stream_type
            );
        }
        self.streams = registered;
        Ok(())
    }

    fn validate_stream(&self, info: &MuxStreamInfo) -> Result<()> {
        if info.pid == PID_PAT || info.pid > PID_MAX {
            return Err(VdkError::Config(format!("invalid stream pid {}", info.pid)));
        }
        if info.pid == self.config.pmt_pid {
            return Err(VdkError::Config(format!(
                "stream pid {} collides with the PMT",
                info.pid
            )));
        }
        if is_reserved_pid(info.pid) {
            return Err(VdkError::Config(format!("pid {} is reserved", info.pid)));
        }
        if info.kind == MediaKind::Data {
            return Err(VdkError::Config(format!(
                "pid {} is neither audio nor video",
                info.pid
            )));
        }
        if !is_muxable_stream_type(info.stream_type) {
            return Err(VdkError::Config(format!(
                "unsupported stream type {:#04x} on pid {}",
                info.stream_type, info.pid
            )));
        }
        Ok(())
    }

    /// Packetizes one access unit.
    ///
    /// Returns `Ok(false)` when `unit.pid` was not registered with
    /// [`TSMuxer::init_streams`].
    pub fn mux_stream(&mut self, unit: &AccessUnit<'_>) -> Result<bool> {
        let Some(stream) = self.streams.get(&unit.pid).copied() else {
            log::debug!("mux: pid {} not registered", unit.pid);
            return Ok(false);
        };

        let mut write_pcr = true;
        if !self.started {
            self.write_tables()?;
            self.started = true;
        }
        if stream.kind == MediaKind::Audio && self.streams.len() > 1 {
            write_pcr = false;
        }

        let mut cc = stream.cc;
        let mut remaining = unit.payload;
        let mut unit_start = true;
        let mut buf = BytesMut::with_capacity(TS_PACKET_SIZE);

        while !remaining.is_empty() {
            let mut adaptation = None;
            if write_pcr {
                write_pcr = false;
                adaptation = Some(AdaptationField {
                    length: 7,
                    discontinuity: true,
                    random_access: true,
                    es_priority: true,
                    pcr: Some(self.next_pcr(unit.dts)),
                    ..Default::default()
                });
            }

            let pes = if unit_start
                && (unit.picture_type == PictureType::I || self.config.pes_every_unit)
            {
                Some(pes_header(&stream, unit))
            } else {
                None
            };

            let header_len = TS_HEADER_SIZE
                + adaptation.as_ref().map_or(0, AdaptationField::encoded_len)
                + pes.as_ref().map_or(0, PESHeader::encoded_len);
            let len = (TS_PACKET_SIZE - header_len).min(remaining.len());
            let stuffing = TS_PACKET_SIZE - header_len - len;
            if stuffing > 0 {
                match adaptation.as_mut() {
                    Some(field) => field.length += stuffing,
                    None => {
                        adaptation = Some(AdaptationField {
                            length: stuffing - 1,
                            ..Default::default()
                        })
                    }
                }
            }

            buf.clear();
            TSHeader {
                payload_unit_start: unit_start,
                transport_priority: self.config.transport_priority,
                pid: stream.pid,
                adaptation_field_exists: adaptation.is_some(),
                continuity_counter: cc,
                ..Default::default()
            }
            .write_to(&mut buf);
            if let Some(field) = &adaptation {
                field.write_to(&mut buf);
            }
            if let Some(pes) = &pes {
                pes.write_to(&mut buf);
            }
            buf.put_slice(&remaining[..len]);
            debug_assert_eq!(buf.len(), TS_PACKET_SIZE);

            self.emit(&buf)?;
            cc = (cc + 1) & 0x0F;
            remaining = &remaining[len..];
            unit_start = false;
        }

        if let Some(state) = self.streams.get_mut(&unit.pid) {
            state.cc = cc;
        }
        Ok(true)
    }

    fn next_pcr(&mut self, dts: Option<i64>) -> u64 {
        match dts.filter(|dts| *dts >= 0) {
            Some(dts) => {
                let pcr = dts as u64 * 300;
                self.first_pcr.get_or_insert(pcr);
                pcr
            }
            None => {
                let bitrate = self.config.nominal_bitrate.max(1) as u128;
                let elapsed = (self.total_bytes + PCR_BYTE_OFFSET) as u128 * 8 * PCR_HZ as u128
                    / bitrate;
                elapsed as u64 + self.first_pcr.unwrap_or(0)
            }
        }
    }

    /// Writes PAT and PMT. Both packets are built before either is
    /// emitted, so a failure leaves the output and counters untouched.
    fn write_tables(&mut self) -> Result<()> {
        let pat = ProgramAssociation {
            transport_stream_id: PROGRAM_NUMBER,
            version: TABLE_VERSION,
            entries: vec![PATEntry {
                program_number: PROGRAM_NUMBER,
                pid: self.config.pmt_pid,
            }],
        };
        let mut section = BytesMut::new();
        write_pat(&mut section, &pat);
        let pat_packet = self.section_packet(PID_PAT, self.pat_count, &section)?;

        section.clear();
        write_pmt(&mut section, &self.program_map());
        let pmt_packet = self.section_packet(self.config.pmt_pid, self.pmt_count, &section)?;

        self.emit(&pat_packet)?;
        self.pat_count = self.pat_count.wrapping_add(1);
        self.emit(&pmt_packet)?;
        self.pmt_count = self.pmt_count.wrapping_add(1);
        Ok(())
    }

    /// The PMT this muxer announces.
    pub fn program_map(&self) -> ProgramMap {
        program_map_for(&self.streams)
    }

    /// PID carrying the PCR: the last video stream in PID order, else the
    /// first stream.
    pub fn pcr_pid(&self) -> Option<u16> {
        pcr_pid_for(&self.streams)
    }

    fn section_packet(&self, pid: u16, cc: u8, section: &[u8]) -> Result<BytesMut> {
        if !section_fits(section.len()) {
            return Err(VdkError::Config(format!(
                "section of {} bytes does not fit a packet",
                section.len()
            )));
        }
        let mut buf = BytesMut::with_capacity(TS_PACKET_SIZE);
        TSHeader {
            payload_unit_start: true,
            transport_priority: self.config.transport_priority,
            pid,
            continuity_counter: cc,
            ..Default::default()
        }
        .write_to(&mut buf);
        buf.put_u8(0); // pointer_field
        buf.put_slice(section);
        buf.resize(TS_PACKET_SIZE, 0xFF);
        Ok(buf)
    }

    fn emit(&mut self, packet: &[u8]) -> Result<()> {
        self.output.extend_from_slice(packet)?;
        self.total_bytes += packet.len() as u64;
        self.packets_written += 1;
        log::trace!("mux: packet {} pid {}", self.packets_written, parser::pid(packet));
        Ok(())
    }

    /// Bytes of muxed output waiting to be fetched.
    pub fn output_len(&self) -> usize {
        self.output.size()
    }

    pub fn output(&self) -> &[u8] {
        self.output.data()
    }

    /// Copies `out.len()` bytes of pending output into `out` and consumes
    /// them.
    pub fn fetch(&mut self, out: &mut [u8]) -> Result<()> {
        let available = self.output.size();
        if out.len() > available {
            return Err(VdkError::ConsumeTooLong {
                requested: out.len(),
                available,
            });
        }
        out.copy_from_slice(&self.output.data()[..out.len()]);
        self.output.consume(out.len())
    }

    /// Takes all pending output.
    pub fn take_output(&mut self) -> Result<Bytes> {
        let len = self.output.size();
        self.output.split_to_bytes(len)
    }

    /// Packets emitted so far, PAT and PMT included.
    pub fn packets_written(&self) -> u64 {
        self.packets_written
    }
}

/// Header, pointer_field and section in one packet.
fn section_fits(section_len: usize) -> bool {
    TS_HEADER_SIZE + 1 + section_len <= TS_PACKET_SIZE
}

fn program_map_for(streams: &BTreeMap<u16, MuxStreamState>) -> ProgramMap {
    ProgramMap {
        program_number: PROGRAM_NUMBER,
        version: TABLE_VERSION,
        pcr_pid: pcr_pid_for(streams).unwrap_or(PID_NULL),
        program_descriptors: Vec::new(),
        streams: streams
            .values()
            .map(|s| ElementaryStreamInfo {
                stream_type: s.stream_type,
                elementary_pid: s.pid,
                descriptors: Vec::new(),
            })
            .collect(),
    }
}

fn pcr_pid_for(streams: &BTreeMap<u16, MuxStreamState>) -> Option<u16> {
    streams
        .values()
        .rev()
        .find(|s| s.kind == MediaKind::Video)
        .or_else(|| streams.values().next())
        .map(|s| s.pid)
}

fn pes_header(stream: &MuxStreamState, unit: &AccessUnit<'_>) -> PESHeader {
    PESHeader {
        pts: unit.pts.filter(|v| *v >= 0).map(|v| v as u64),
        dts: unit.dts.filter(|v| *v >= 0).map(|v| v as u64),
        ..PESHeader::new(stream_id_for(stream.kind, stream.stream_type))
    }
}

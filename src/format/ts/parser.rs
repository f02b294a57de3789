//! Stateless TS/PSI field accessors.
//!
//! Read helpers take a whole 188-byte packet (or a PSI section slice that
//! runs to the end of its packet) and check every computed offset against the
//! slice length. Write helpers append to a `BytesMut` or patch a packet in
//! place.

use super::types::*;
use crate::error::{Result, VdkError};
use crate::utils::crc::Crc32Mpeg2;
use bytes::{BufMut, BytesMut};

pub fn sync_byte(packet: &[u8]) -> u8 {
    packet[0]
}

pub fn pid(packet: &[u8]) -> u16 {
    (((packet[1] & 0x1F) as u16) << 8) | packet[2] as u16
}

pub fn continuity_counter(packet: &[u8]) -> u8 {
    packet[3] & 0x0F
}

pub fn unit_start(packet: &[u8]) -> bool {
    packet[1] & 0x40 != 0
}

pub fn has_payload(packet: &[u8]) -> bool {
    packet[3] & 0x10 != 0
}

pub fn has_adaptation(packet: &[u8]) -> bool {
    packet[3] & 0x20 != 0
}

pub fn adaptation_length(packet: &[u8]) -> usize {
    packet[4] as usize
}

pub fn parse_header(data: &[u8]) -> Result<TSHeader> {
    if data.len() < TS_HEADER_SIZE {
        return Err(VdkError::InvalidData("TS packet too short".into()));
    }

    if data[0] != SYNC_BYTE {
        return Err(VdkError::Sync { found: data[0] });
    }

    Ok(TSHeader {
        sync_byte: data[0],
        transport_error: (data[1] & 0x80) != 0,
        payload_unit_start: unit_start(data),
        transport_priority: (data[1] & 0x20) != 0,
        pid: pid(data),
        scrambling_control: (data[3] >> 6) & 0x03,
        adaptation_field_exists: has_adaptation(data),
        contains_payload: has_payload(data),
        continuity_counter: continuity_counter(data),
    })
}

/// Offset of the first payload byte, past the adaptation field if any.
pub fn payload_offset(packet: &[u8]) -> Result<usize> {
    if !has_adaptation(packet) {
        return Ok(TS_HEADER_SIZE);
    }

    let offset = TS_HEADER_SIZE + 1 + adaptation_length(packet);
    if offset > packet.len() {
        return Err(VdkError::InvalidData(format!(
            "adaptation field length {} overruns packet",
            adaptation_length(packet)
        )));
    }
    Ok(offset)
}

/// Offset of the PSI section, skipping the pointer_field on unit starts.
pub fn section_offset(packet: &[u8]) -> Result<usize> {
    let mut offset = payload_offset(packet)?;
    if unit_start(packet) {
        let pointer_field = *packet
            .get(offset)
            .ok_or_else(|| VdkError::InvalidData("missing pointer_field".into()))?;
        offset += 1 + pointer_field as usize;
    }

    // table_id and section_length must be present.
    if offset + PSI_HEADER_SIZE > packet.len() {
        return Err(VdkError::InvalidData(format!(
            "section offset {} overruns packet",
            offset
        )));
    }
    Ok(offset)
}

fn read_clock(data: &[u8]) -> u64 {
    let base = ((data[0] as u64) << 25)
        | ((data[1] as u64) << 17)
        | ((data[2] as u64) << 9)
        | ((data[3] as u64) << 1)
        | ((data[4] & 0x80) as u64 >> 7);
    let ext = (((data[4] & 0x01) as u64) << 8) | (data[5] as u64);
    base * 300 + ext
}

pub fn parse_adaptation_field(packet: &[u8]) -> Result<Option<AdaptationField>> {
    if !has_adaptation(packet) || packet.len() <= TS_HEADER_SIZE {
        return Ok(None);
    }

    let offset = TS_HEADER_SIZE;
    let length = adaptation_length(packet);
    let mut field = AdaptationField {
        length,
        ..Default::default()
    };
    if length == 0 {
        return Ok(Some(field));
    }

    let end = offset + 1 + length;
    if packet.len() < end {
        return Err(VdkError::InvalidData("Adaptation field too short".into()));
    }

    let flags = packet[offset + 1];
    field.discontinuity = (flags & 0x80) != 0;
    field.random_access = (flags & 0x40) != 0;
    field.es_priority = (flags & 0x20) != 0;

    let mut pos = offset + 2;

    if flags & 0x10 != 0 {
        if end < pos + 6 {
            return Err(VdkError::InvalidData("PCR data too short".into()));
        }
        field.pcr = Some(read_clock(&packet[pos..]));
        pos += 6;
    }

    if flags & 0x08 != 0 {
        if end < pos + 6 {
            return Err(VdkError::InvalidData("OPCR data too short".into()));
        }
        field.opcr = Some(read_clock(&packet[pos..]));
        pos += 6;
    }

    if flags & 0x04 != 0 {
        if end < pos + 1 {
            return Err(VdkError::InvalidData("Splice countdown too short".into()));
        }
        field.splice_countdown = Some(packet[pos] as i8);
        pos += 1;
    }

    if flags & 0x02 != 0 {
        if end < pos + 1 {
            return Err(VdkError::InvalidData(
                "Private data length byte missing".into(),
            ));
        }
        let private_data_length = packet[pos] as usize;
        pos += 1;
        if end < pos + private_data_length {
            return Err(VdkError::InvalidData("Private data too short".into()));
        }
        field.private_data = Some(packet[pos..pos + private_data_length].to_vec());
    }

    Ok(Some(field))
}

/// PCR in 27 MHz ticks, present only when the adaptation field is at least
/// 7 bytes long and flags a PCR.
pub fn read_pcr(packet: &[u8]) -> Option<u64> {
    if packet.len() < TS_HEADER_SIZE + 8
        || !has_adaptation(packet)
        || adaptation_length(packet) < 7
        || packet[5] & 0x10 == 0
    {
        return None;
    }
    Some(read_clock(&packet[6..]))
}

pub fn psi_table_id(section: &[u8]) -> u8 {
    section[0]
}

pub fn psi_section_length(section: &[u8]) -> usize {
    (((section[1] & 0x0F) as usize) << 8) | section[2] as usize
}

/// transport_stream_id for a PAT, program_number for a PMT.
pub fn psi_table_id_extension(section: &[u8]) -> u16 {
    ((section[3] as u16) << 8) | section[4] as u16
}

pub fn psi_version(section: &[u8]) -> u8 {
    (section[5] >> 1) & 0x1F
}

pub fn psi_current_next(section: &[u8]) -> bool {
    section[5] & 0x01 != 0
}

pub fn psi_section_number(section: &[u8]) -> u8 {
    section[6]
}

pub fn psi_last_section_number(section: &[u8]) -> u8 {
    section[7]
}

/// Validates the declared section length against the bytes available and
/// the `min` body size of the table.
fn checked_section_length(section: &[u8], min: usize) -> Result<usize> {
    if section.len() < PSI_SYNTAX_HEADER_SIZE {
        return Err(VdkError::InvalidData("PSI section header truncated".into()));
    }
    let length = psi_section_length(section);
    if length >= TS_PAYLOAD_SIZE {
        return Err(VdkError::InvalidData(format!(
            "section_length {} too large",
            length
        )));
    }
    if length < min {
        return Err(VdkError::InvalidData(format!(
            "section_length {} too small",
            length
        )));
    }
    if PSI_HEADER_SIZE + length > section.len() {
        return Err(VdkError::InvalidData(format!(
            "section_length {} overruns packet",
            length
        )));
    }
    Ok(length)
}

/// Returns `(stored, computed)` CRC_32 of a section.
pub fn section_crc(section: &[u8]) -> Result<(u32, u32)> {
    let length = checked_section_length(section, PSI_SYNTAX_HEADER_SIZE - PSI_HEADER_SIZE + PSI_CRC_SIZE)?;
    let end = PSI_HEADER_SIZE + length - PSI_CRC_SIZE;
    let stored = u32::from_be_bytes([
        section[end],
        section[end + 1],
        section[end + 2],
        section[end + 3],
    ]);
    Ok((stored, Crc32Mpeg2::calculate(&section[..end])))
}

/// Parses a PAT section. The program loop stops at an entry pointing back at
/// PID 0.
pub fn parse_pat(section: &[u8]) -> Result<ProgramAssociation> {
    // transport_stream_id .. last_section_number, plus CRC.
    const FIXED: usize = 5 + PSI_CRC_SIZE;

    if section.first() != Some(&TABLE_ID_PAT) {
        return Err(VdkError::Parser("PAT table_id mismatch".into()));
    }
    let length = checked_section_length(section, FIXED)?;

    let mut pat = ProgramAssociation {
        transport_stream_id: psi_table_id_extension(section),
        version: psi_version(section),
        entries: Vec::new(),
    };

    let mut pos = PSI_SYNTAX_HEADER_SIZE;
    let end = pos + (length - FIXED);
    while pos + PAT_PROGRAM_SIZE <= end {
        let program_number = ((section[pos] as u16) << 8) | section[pos + 1] as u16;
        let pid = (((section[pos + 2] & 0x1F) as u16) << 8) | section[pos + 3] as u16;
        if pid == PID_PAT {
            break;
        }
        pat.entries.push(PATEntry {
            program_number,
            pid,
        });
        pos += PAT_PROGRAM_SIZE;
    }

    Ok(pat)
}

/// Parses a PMT section.
///
/// A stream type missing from the stream type table aborts the parse with
/// `VdkError::Parser`.
pub fn parse_pmt(section: &[u8]) -> Result<ProgramMap> {
    // Syntax header after section_length, PCR PID, program_info_length, CRC.
    const FIXED: usize = PMT_HEADER_SIZE - PSI_HEADER_SIZE + PSI_CRC_SIZE;

    if section.first() != Some(&TABLE_ID_PMT) {
        return Err(VdkError::Parser("PMT table_id mismatch".into()));
    }
    let length = checked_section_length(section, FIXED)?;
    if section.len() < PMT_HEADER_SIZE {
        return Err(VdkError::InvalidData("PMT header truncated".into()));
    }

    let mut pmt = ProgramMap {
        program_number: psi_table_id_extension(section),
        version: psi_version(section),
        pcr_pid: (((section[8] & 0x1F) as u16) << 8) | section[9] as u16,
        ..Default::default()
    };

    let program_info_length = (((section[10] & 0x0F) as usize) << 8) | section[11] as usize;
    if program_info_length > length - FIXED {
        return Err(VdkError::InvalidData(format!(
            "program_info_length {} overruns section",
            program_info_length
        )));
    }

    let mut pos = PMT_HEADER_SIZE;
    pmt.program_descriptors = parse_descriptors(&section[pos..pos + program_info_length])?;
    pos += program_info_length;

    let end = PSI_HEADER_SIZE + length - PSI_CRC_SIZE;
    while pos < end {
        if pos + PMT_ES_SIZE > end {
            return Err(VdkError::InvalidData("ES entry truncated".into()));
        }

        let stream_type = section[pos];
        if !is_known_stream_type(stream_type) {
            return Err(VdkError::Parser(format!(
                "unknown stream type {:#04x}",
                stream_type
            )));
        }

        let elementary_pid = (((section[pos + 1] & 0x1F) as u16) << 8) | section[pos + 2] as u16;
        let es_info_length = (((section[pos + 3] & 0x0F) as usize) << 8) | section[pos + 4] as usize;
        pos += PMT_ES_SIZE;

        if pos + es_info_length > end {
            return Err(VdkError::InvalidData("ES info data too short".into()));
        }

        let descriptors = parse_descriptors(&section[pos..pos + es_info_length])?;
        pos += es_info_length;

        pmt.streams.push(ElementaryStreamInfo {
            stream_type,
            elementary_pid,
            descriptors,
        });
    }

    Ok(pmt)
}

fn parse_descriptors(data: &[u8]) -> Result<Vec<Descriptor>> {
    let mut descriptors = Vec::new();
    let mut pos = 0;

    while pos + 2 <= data.len() {
        let tag = data[pos];
        let length = data[pos + 1] as usize;
        pos += 2;

        if pos + length > data.len() {
            return Err(VdkError::InvalidData("Descriptor data too short".into()));
        }

        descriptors.push(Descriptor {
            tag,
            data: data[pos..pos + length].to_vec(),
        });
        pos += length;
    }

    Ok(descriptors)
}

pub fn set_continuity_counter(packet: &mut [u8], cc: u8) {
    packet[3] = (packet[3] & 0xF0) | (cc & 0x0F);
}

pub fn set_unit_start(packet: &mut [u8], start: bool) {
    if start {
        packet[1] |= 0x40;
    } else {
        packet[1] &= !0x40;
    }
}

/// Writes a complete long-form PSI section: header, `body`, CRC_32.
pub fn write_psi_section(
    buf: &mut BytesMut,
    table_id: u8,
    table_id_extension: u16,
    version: u8,
    body: &[u8],
) {
    let start = buf.len();
    let section_length = (PSI_SYNTAX_HEADER_SIZE - PSI_HEADER_SIZE) + body.len() + PSI_CRC_SIZE;

    buf.put_u8(table_id);
    // section_syntax_indicator, '0', reserved
    buf.put_u16(0xB000 | (section_length as u16 & 0x0FFF));
    buf.put_u16(table_id_extension);
    // reserved, version_number, current_next_indicator
    buf.put_u8(0xC0 | ((version & 0x1F) << 1) | 0x01);
    buf.put_u8(0); // section_number
    buf.put_u8(0); // last_section_number
    buf.put_slice(body);

    let crc = Crc32Mpeg2::calculate(&buf[start..]);
    buf.put_u32(crc);
}

pub fn write_pat(buf: &mut BytesMut, pat: &ProgramAssociation) {
    let mut body = BytesMut::with_capacity(pat.body_len());
    pat.write_to(&mut body);
    write_psi_section(buf, TABLE_ID_PAT, pat.transport_stream_id, pat.version, &body);
}

pub fn write_pmt(buf: &mut BytesMut, pmt: &ProgramMap) {
    let mut body = BytesMut::with_capacity(pmt.body_len());
    pmt.write_to(&mut body);
    write_psi_section(buf, TABLE_ID_PMT, pmt.program_number, pmt.version, &body);
}

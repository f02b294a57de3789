use super::types::NALUnitType;
use crate::codec::annexb::{find_start_code, is_start_code};
use crate::codec::{Classification, PictureType};

/// Scans an HEVC Annex-B payload for an IRAP NAL unit.
///
/// Returns a key I classification for the first NAL unit whose type lies in
/// 16..=23, and `None` otherwise.
pub fn classify(payload: &[u8]) -> Option<Classification> {
    let mut state = u32::MAX;
    let mut pos = 0;

    while pos < payload.len() {
        pos = find_start_code(payload, pos, &mut state);
        // The second NAL header byte must be present too.
        if !is_start_code(state) || pos >= payload.len() {
            break;
        }

        let nal_type = NALUnitType::from_header(payload[pos - 1]);
        if nal_type.is_irap() {
            return Some(Classification {
                picture_type: PictureType::I,
                key_frame: true,
                unit_start: false,
            });
        }
        log::trace!("hevc: skipping {:?}", nal_type);
    }

    None
}

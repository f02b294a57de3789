//! # MPEG-1/2 Picture Header Classification
//!
//! MPEG-2 video has no emulation prevention, so start codes are found with a
//! plain byte search instead of the Annex-B state machine.

use super::{Classification, PictureType};

const PICTURE_START_CODE: u8 = 0x00;

/// Scans for the first picture start code carrying an I, P or B
/// `picture_coding_type`.
///
/// Every I/P/B picture marks a unit start; only I pictures are key frames.
/// Picture headers with other coding types are skipped.
pub fn classify(payload: &[u8]) -> Option<Classification> {
    let mut pos = 0;

    while let Some(offset) = find_prefix(&payload[pos..]) {
        let start = pos + offset;
        pos = start + 3;

        if payload.get(start + 3) != Some(&PICTURE_START_CODE) {
            continue;
        }
        let Some(&coding) = payload.get(start + 5) else {
            break;
        };

        let picture_type = PictureType::from((coding & 0x38) >> 3);
        match picture_type {
            PictureType::I | PictureType::P | PictureType::B => {
                return Some(Classification {
                    picture_type,
                    key_frame: picture_type == PictureType::I,
                    unit_start: true,
                });
            }
            _ => log::trace!("mpeg2: picture_coding_type {:?} ignored", picture_type),
        }
    }

    None
}

fn find_prefix(data: &[u8]) -> Option<usize> {
    data.windows(3).position(|w| w == [0x00, 0x00, 0x01])
}

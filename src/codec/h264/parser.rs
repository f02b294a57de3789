use super::types::{NALUnitType, SliceType};
use crate::codec::annexb::{find_start_code, is_start_code};
use crate::codec::{Classification, PictureType};
use crate::utils::BitReader;

/// Scans an H.264 Annex-B payload for the first slice NAL unit.
///
/// An IDR slice is classified as a key I picture without further decoding.
/// For other slices `first_mb_in_slice` and `slice_type` are read from the
/// slice header when `decode_slice_type` is set; otherwise, or when the
/// payload ends inside those fields, the picture type is left as
/// [`PictureType::None`].
///
/// Returns `None` when no slice starts inside `payload`.
pub fn classify(payload: &[u8], decode_slice_type: bool) -> Option<Classification> {
    let mut state = u32::MAX;
    let mut pos = 0;

    while pos < payload.len() {
        pos = find_start_code(payload, pos, &mut state);
        if !is_start_code(state) {
            break;
        }

        let nal_type = NALUnitType::from(state as u8);
        if !nal_type.is_slice() {
            log::trace!("h264: skipping {:?}", nal_type);
            continue;
        }

        if nal_type == NALUnitType::CodedSliceIDR {
            return Some(Classification {
                picture_type: PictureType::I,
                key_frame: true,
                unit_start: false,
            });
        }

        let mut picture_type = PictureType::None;
        if decode_slice_type {
            let mut reader = BitReader::new(&payload[pos..]);
            // first_mb_in_slice, then slice_type
            match reader.try_read_ue().and_then(|_| reader.try_read_ue()) {
                Some(slice_type) => {
                    picture_type = SliceType::from_golomb(slice_type).picture_type()
                }
                None => log::trace!("h264: slice header cut off by the packet end"),
            }
        }

        return Some(Classification {
            picture_type,
            key_frame: false,
            unit_start: false,
        });
    }

    None
}

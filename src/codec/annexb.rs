/// Finds the next `00 00 01` start code in `data[pos..]`.
///
/// `state` carries the last four bytes seen across calls and must start as
/// `0xFFFFFFFF`. On return, if `state & 0xFFFFFF00 == 0x100` a start code was
/// found and the low byte of `state` is the byte that follows it; the returned
/// index points just past that byte. Otherwise the data was exhausted and
/// `data.len()` is returned.
///
/// A leading fourth zero byte (`00 00 00 01`) is tolerated.
pub fn find_start_code(data: &[u8], pos: usize, state: &mut u32) -> usize {
    let end = data.len();
    let mut p = pos;
    if p >= end {
        return end;
    }

    for _ in 0..3 {
        let tmp = *state << 8;
        *state = tmp | data[p] as u32;
        p += 1;
        if tmp == 0x100 || p == end {
            return p;
        }
    }

    // Skip ahead using the last three bytes: a start code can only end at
    // p - 1 when p[-1] == 1 and p[-2] == p[-3] == 0.
    while p < end {
        if data[p - 1] > 1 {
            p += 3;
        } else if data[p - 2] != 0 {
            p += 2;
        } else if (data[p - 3] | data[p - 1].wrapping_sub(1)) != 0 {
            p += 1;
        } else {
            p += 1;
            break;
        }
    }

    let p = p.min(end) - 4;
    *state = u32::from_be_bytes([data[p], data[p + 1], data[p + 2], data[p + 3]]);
    p + 4
}

/// True when `state` (as left by [`find_start_code`]) ends in a start code
/// plus one byte.
pub fn is_start_code(state: u32) -> bool {
    state & 0xFFFF_FF00 == 0x100
}

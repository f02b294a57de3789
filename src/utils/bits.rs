/// A bit-level reader for H.264/H.265 slice headers.
///
/// Bits are pulled through a 64-bit cache refilled one byte at a time. While
/// refilling, Annex-B emulation prevention bytes (a `0x03` following two zero
/// bytes) are dropped from the bitstream, so callers can point the reader
/// straight at a NAL unit payload inside a TS packet.
///
/// The reader never fails: once the input is exhausted, reads return only the
/// bits that were still cached (possibly none).
///
/// Example:
/// ```
/// use vdk_mpegts::utils::BitReader;
///
/// let data = [0b10110011];
/// let mut reader = BitReader::new(&data);
///
/// assert_eq!(reader.read_bit(), true);  // 1
/// assert_eq!(reader.read(3), 0b011);    // 011
/// ```
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    head: u32,
    cache: u64,
}

impl<'a> BitReader<'a> {
    /// Creates a new BitReader from a byte slice
    pub fn new(data: &'a [u8]) -> Self {
        BitReader {
            data,
            pos: 0,
            head: 0,
            // Non-zero seed so a leading 0x03 is never mistaken for emulation prevention.
            cache: 0xFFFF_FFFF,
        }
    }

    /// Reads `n` bits (at most 32) and returns them as a big-endian number.
    pub fn read(&mut self, n: u32) -> u32 {
        debug_assert!(n <= 32, "BitReader::read supports at most 32 bits");
        let mut n = n.min(32);
        if n == 0 {
            return 0;
        }
        if !self.fill(n) {
            // Can't produce more than head number of bits.
            n = self.head;
        }
        self.take(n)
    }

    /// Like [`read`](BitReader::read), but returns `None` instead of a
    /// short read when fewer than `n` bits remain.
    pub fn try_read(&mut self, n: u32) -> Option<u32> {
        let n = n.min(32);
        if n == 0 {
            return Some(0);
        }
        if !self.fill(n) {
            self.head = 0;
            return None;
        }
        Some(self.take(n))
    }

    /// Pulls bytes into the cache until it holds `n` bits. Returns false
    /// when the input ran out first.
    fn fill(&mut self, n: u32) -> bool {
        while self.head < n {
            let mut check_three_byte = true;
            loop {
                if self.pos >= self.data.len() {
                    return false;
                }
                let byte = self.data[self.pos];
                self.pos += 1;
                if check_three_byte && byte == 0x03 && (self.cache & 0xFFFF) == 0 {
                    // The byte after an emulation prevention byte is always data.
                    check_three_byte = false;
                    continue;
                }
                self.cache = (self.cache << 8) | byte as u64;
                self.head += 8;
                break;
            }
        }
        true
    }

    fn take(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        let shift = self.head - n;
        let mut res = (self.cache >> shift) as u32;
        if n < 32 {
            res &= (1u32 << n) - 1;
        }
        self.head = shift;
        res
    }

    /// Reads a single bit. Returns false once the input is exhausted.
    pub fn read_bit(&mut self) -> bool {
        self.read(1) == 1
    }

    /// Skips `n` bits.
    pub fn skip(&mut self, mut n: u32) {
        while n > 0 {
            let step = n.min(32);
            self.read(step);
            n -= step;
        }
    }

    /// True when the input is exhausted and no cached bits remain.
    pub fn eos(&self) -> bool {
        self.pos >= self.data.len() && self.head == 0
    }

    /// Upper bound on the bits still available (emulation prevention bytes
    /// not yet seen are counted as data).
    pub fn bits_left(&self) -> usize {
        (self.data.len() - self.pos) * 8 + self.head as usize
    }

    /// Reads an unsigned exponential Golomb code (ue(v)).
    ///
    /// Counts up to 32 leading zero bits `k`, then reads `k` info bits:
    /// value = 2^k - 1 + info.
    ///
    /// Example: "00110" (k=2, info=10) gives 4 - 1 + 2 = 5.
    pub fn read_ue(&mut self) -> u32 {
        let mut leading_zeros = 0u32;
        while self.read(1) == 0 && !self.eos() && leading_zeros < 32 {
            leading_zeros += 1;
        }
        let info = self.read(leading_zeros) as u64;
        (((1u64 << leading_zeros) - 1) + info) as u32
    }

    /// Reads an unsigned exponential Golomb code, or `None` when the input
    /// ends before the code is complete.
    pub fn try_read_ue(&mut self) -> Option<u32> {
        let mut leading_zeros = 0u32;
        while self.try_read(1)? == 0 {
            leading_zeros += 1;
            if leading_zeros > 31 {
                return None;
            }
        }
        let info = self.try_read(leading_zeros)? as u64;
        Some((((1u64 << leading_zeros) - 1) + info) as u32)
    }

    /// Reads a signed exponential Golomb code (se(v)).
    ///
    /// Maps the unsigned code k to `(-1)^(k+1) * ceil(k / 2)`:
    /// 0, 1, 2, 3, 4 become 0, 1, -1, 2, -2.
    pub fn read_se(&mut self) -> i32 {
        let k = self.read_ue() as i64;
        let magnitude = (k + 1) / 2;
        let value = if k & 1 == 1 { magnitude } else { -magnitude };
        value as i32
    }
}


#[cfg(test)]
mod tests {
    use super::test_utils::*;
    use super::*;
    use pretty_assertions::assert_eq;
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_read_bits() {
        // Simple pattern within a byte
        let data = [0b10110011];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read(3), 0b101);
        assert_eq!(reader.read(5), 0b10011);
        assert!(reader.eos());

        // Cross-byte boundary
        let data = [0b10110011, 0b01011010];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read(3), 0b101);
        assert_eq!(reader.read(8), 0b10011010);

        // Reading zero bits
        let data = [0b10101010];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read(0), 0);

        // Full 32-bit word
        let data = [0xDE, 0xAD, 0xBE, 0xEF];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read(32), 0xDEADBEEF);

        // Cross multiple byte boundaries
        let data = [0b10110011, 0b11001100, 0b10101010];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read(20), 0b10110011110011001010);
    }

    #[test]
    fn test_short_read_at_end() {
        let data = [0b10110011];
        let mut reader = BitReader::new(&data);
        reader.read(6);
        // Only two bits remain, so only two bits come back.
        assert_eq!(reader.read(8), 0b11);
        assert!(reader.eos());
        assert_eq!(reader.read(4), 0);
    }

    #[test]
    fn test_emulation_prevention_removed() {
        let data = [0x00, 0x00, 0x03, 0x01];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read(24), 0x000001);
        assert!(reader.eos());

        // The byte after an emulation prevention byte is kept even if it is 0x03.
        let data = [0x00, 0x00, 0x03, 0x03, 0x7F];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read(32), 0x0000037F);

        // A leading 0x03 is data.
        let data = [0x03, 0x00];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read(16), 0x0300);
    }

    #[test]
    fn test_read_ue() {
        let test_cases = [
            ([0b10000000], 0, "1"),
            ([0b01000000], 1, "010"),
            ([0b01100000], 2, "011"),
            ([0b00100000], 3, "00100"),
            ([0b00101000], 4, "00101"),
            ([0b00110000], 5, "00110"),
            ([0b00111000], 6, "00111"),
            ([0b00010000], 7, "0001000"),
            ([0b00010010], 8, "0001001"),
        ];

        for (input, expected, pattern) in test_cases.iter() {
            let mut reader = BitReader::new(input);
            assert_eq!(reader.read_ue(), *expected, "Failed for pattern {}", pattern);
            assert_eq!(&encode_golomb(&[*expected])[..], &input[..]);
        }
    }

    #[test]
    fn test_read_se() {
        let data = encode_golomb(&[0, 1, 2, 3, 4]);
        let mut reader = BitReader::new(&data);
        let decoded: Vec<i32> = (0..5).map(|_| reader.read_se()).collect();
        assert_eq!(decoded, vec![0, 1, -1, 2, -2]);
    }

    #[test]
    fn test_read_ue_bounded_on_zeros() {
        // Forty zero bits: leading-zero count stops at the end of input.
        let data = vec![0u8; 5];
        let mut reader = BitReader::new(&data);
        reader.read_ue();
        assert!(reader.eos());
    }

    #[test]
    fn test_try_read_ue_detects_truncation() {
        let data = encode_golomb(&[0, 5]);
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.try_read_ue(), Some(0));
        assert_eq!(reader.try_read_ue(), Some(5));

        // "1" then seven zeros with no terminating one bit.
        let mut reader = BitReader::new(&[0x80]);
        assert_eq!(reader.try_read_ue(), Some(0));
        assert_eq!(reader.try_read_ue(), None);
        assert!(reader.eos());

        // Prefix "01" complete, its info bit cut off.
        let mut reader = BitReader::new(&[0b0000_0001]);
        reader.skip(6);
        assert_eq!(reader.try_read_ue(), None);

        assert_eq!(BitReader::new(&[]).try_read_ue(), None);
        assert_eq!(BitReader::new(&[0xAB]).try_read(9), None);
        assert_eq!(BitReader::new(&[0xAB]).try_read(8), Some(0xAB));
    }

    #[test]
    fn test_skip() {
        let data = [0b10110011, 0b01011010];
        let mut reader = BitReader::new(&data);
        reader.skip(3);
        assert_eq!(reader.read(5), 0b10011);
        assert_eq!(reader.bits_left(), 8);
    }

    #[quickcheck]
    fn prop_read_bits_matches_manual(data: Vec<u8>, n: u8) -> bool {
        // Keep zero runs short so no emulation prevention pattern can appear.
        let data: Vec<u8> = data.into_iter().map(|b| b | 0x80).collect();
        let n = (n % 33) as usize;
        let mut reader = BitReader::new(&data);
        let result = reader.read(n as u32);

        let available = n.min(data.len() * 8);
        let mut expected = 0u64;
        for i in 0..available {
            let bit = (data[i / 8] >> (7 - (i % 8))) & 1;
            expected = (expected << 1) | bit as u64;
        }
        result as u64 == expected
    }

    #[quickcheck]
    fn prop_golomb_round_trip(values: Vec<u8>) -> bool {
        let values: Vec<u32> = values.into_iter().map(|v| (v % 64) as u32).collect();
        let encoded = encode_golomb(&values);
        let mut reader = BitReader::new(&encoded);
        values.iter().all(|&expected| reader.read_ue() == expected)
    }
}

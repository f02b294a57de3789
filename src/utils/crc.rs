/// CRC32 implementation specifically for MPEG-2 TS PSI tables
/// Based on ITU-T H.222.0 / ISO/IEC 13818-1
/// Polynomial: x32 + x26 + x23 + x22 + x16 + x12 + x11 + x10 + x8 + x7 + x5 + x4 + x2 + x + 1
/// Initial value: 0xFFFFFFFF, no reflection, no final XOR

const CRC32_MPEG2: u32 = 0x04C11DB7;

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u32) << 24;
        let mut bit = 0;
        while bit < 8 {
            crc = if (crc & 0x80000000) != 0 {
                (crc << 1) ^ CRC32_MPEG2
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

static CRC_TABLE: [u32; 256] = build_table();

/// MPEG-2 CRC32 calculator used for Transport Stream PSI table validation
///
/// Implements the CRC32 algorithm specified in ITU-T H.222.0 / ISO/IEC 13818-1
/// for validating Program Specific Information (PSI) tables in MPEG-2 Transport Streams.
/// The lookup table is computed at compile time and shared by every instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32Mpeg2;

impl Crc32Mpeg2 {
    /// Creates a new CRC32 calculator
    pub fn new() -> Self {
        Self
    }

    /// Calculates the CRC32 checksum for the given data using the MPEG-2 algorithm
    ///
    /// # Examples
    ///
    /// ```
    /// use vdk_mpegts::utils::Crc32Mpeg2;
    ///
    /// assert_eq!(Crc32Mpeg2::calculate(&[]), 0xFFFFFFFF);
    /// assert_eq!(Crc32Mpeg2::calculate(&[0x01, 0x01]), 0xD66FB816);
    /// ```
    pub fn calculate(data: &[u8]) -> u32 {
        Self::update(0xFFFFFFFF, data)
    }

    /// Continues a running checksum over more data.
    pub fn update(mut crc: u32, data: &[u8]) -> u32 {
        for &byte in data {
            let index = ((crc >> 24) ^ (byte as u32)) & 0xFF;
            crc = (crc << 8) ^ CRC_TABLE[index as usize];
        }
        crc
    }

    /// Returns true when `section` (including its 4-byte CRC trailer) checks clean.
    pub fn verify(section: &[u8]) -> bool {
        section.len() >= 4 && Self::calculate(section) == 0
    }
}

/// Shorthand for [`Crc32Mpeg2::calculate`].
pub fn crc32(data: &[u8]) -> u32 {
    Crc32Mpeg2::calculate(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_crc32_mpeg2() {
        assert_eq!(crc32(&[]), 0xFFFFFFFF);

        // Test vector from STMicroelectronics community forum post
        assert_eq!(
            crc32(&[0x01, 0x01]),
            0xD66FB816,
            "CRC32 MPEG-2 calculation failed for test vector [0x01, 0x01]"
        );

        // CRC-32/MPEG-2 check value
        assert_eq!(crc32(b"123456789"), 0x0376E6E7);
    }

    #[test]
    fn test_table_matches_reference() {
        assert_eq!(CRC_TABLE[0], 0x00000000);
        assert_eq!(CRC_TABLE[1], 0x04c11db7);
        assert_eq!(CRC_TABLE[2], 0x09823b6e);
        assert_eq!(CRC_TABLE[255], 0xb1f740b4);
    }

    #[test]
    fn test_verify_section_with_trailer() {
        // PAT section: program 1 -> PMT PID 0x1000
        let mut section = vec![
            0x00, 0xB0, 0x0D, 0x00, 0x01, 0xC1, 0x00, 0x00, 0x00, 0x01, 0xF0, 0x00,
        ];
        let crc = crc32(&section);
        section.extend_from_slice(&crc.to_be_bytes());
        assert!(Crc32Mpeg2::verify(&section));

        section[9] ^= 0x01;
        assert!(!Crc32Mpeg2::verify(&section));
    }

    #[quickcheck]
    fn prop_update_is_incremental(a: Vec<u8>, b: Vec<u8>) -> bool {
        let mut whole = a.clone();
        whole.extend_from_slice(&b);
        Crc32Mpeg2::update(crc32(&a), &b) == crc32(&whole)
    }
}

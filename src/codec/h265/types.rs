// vdk-mpegts/src/codec/h265/types.rs

/// HEVC `nal_unit_type` (ITU-T H.265 table 7-1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NALUnitType {
    TrailN,
    TrailR,
    TsaN,
    TsaR,
    StsaN,
    StsaR,
    RadlN,
    RadlR,
    RaslN,
    RaslR,
    BlaWLp,
    BlaWRadl,
    BlaNLp,
    IdrWRadl,
    IdrNLp,
    CraNut,
    ReservedIrap(u8),
    Vps,
    Sps,
    Pps,
    Aud,
    Eos,
    Eob,
    Fd,
    PrefixSei,
    SuffixSei,
    Reserved(u8),
    Unspecified(u8),
}

impl NALUnitType {
    /// Type from the first byte of the two-byte NAL unit header.
    pub fn from_header(byte: u8) -> Self {
        Self::from((byte >> 1) & 0x3F)
    }

    pub fn is_irap(&self) -> bool {
        matches!(
            self,
            NALUnitType::BlaWLp
                | NALUnitType::BlaWRadl
                | NALUnitType::BlaNLp
                | NALUnitType::IdrWRadl
                | NALUnitType::IdrNLp
                | NALUnitType::CraNut
                | NALUnitType::ReservedIrap(_)
        )
    }

    pub fn is_idr(&self) -> bool {
        matches!(self, NALUnitType::IdrWRadl | NALUnitType::IdrNLp)
    }
}

impl From<u8> for NALUnitType {
    fn from(value: u8) -> Self {
        match value {
            0 => NALUnitType::TrailN,
            1 => NALUnitType::TrailR,
            2 => NALUnitType::TsaN,
            3 => NALUnitType::TsaR,
            4 => NALUnitType::StsaN,
            5 => NALUnitType::StsaR,
            6 => NALUnitType::RadlN,
            7 => NALUnitType::RadlR,
            8 => NALUnitType::RaslN,
            9 => NALUnitType::RaslR,
            16 => NALUnitType::BlaWLp,
            17 => NALUnitType::BlaWRadl,
            18 => NALUnitType::BlaNLp,
            19 => NALUnitType::IdrWRadl,
            20 => NALUnitType::IdrNLp,
            21 => NALUnitType::CraNut,
            22 | 23 => NALUnitType::ReservedIrap(value),
            32 => NALUnitType::Vps,
            33 => NALUnitType::Sps,
            34 => NALUnitType::Pps,
            35 => NALUnitType::Aud,
            36 => NALUnitType::Eos,
            37 => NALUnitType::Eob,
            38 => NALUnitType::Fd,
            39 => NALUnitType::PrefixSei,
            40 => NALUnitType::SuffixSei,
            10..=15 | 24..=31 | 41..=47 => NALUnitType::Reserved(value),
            _ => NALUnitType::Unspecified(value),
        }
    }
}

use crate::codec::PictureType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NALUnitType {
    Unspecified = 0,
    CodedSliceNonIDR = 1,
    CodedSliceDataPartitionA = 2,
    CodedSliceDataPartitionB = 3,
    CodedSliceDataPartitionC = 4,
    CodedSliceIDR = 5,
    SEI = 6,
    SPS = 7,
    PPS = 8,
    AccessUnitDelimiter = 9,
    EndOfSequence = 10,
    EndOfStream = 11,
    FillerData = 12,
}

impl NALUnitType {
    /// Slice NAL units that carry a `slice_type` in their header.
    pub fn is_slice(&self) -> bool {
        matches!(
            self,
            NALUnitType::CodedSliceNonIDR
                | NALUnitType::CodedSliceDataPartitionA
                | NALUnitType::CodedSliceDataPartitionB
                | NALUnitType::CodedSliceDataPartitionC
                | NALUnitType::CodedSliceIDR
        )
    }
}

impl From<u8> for NALUnitType {
    fn from(value: u8) -> Self {
        match value & 0x1F {
            1 => NALUnitType::CodedSliceNonIDR,
            2 => NALUnitType::CodedSliceDataPartitionA,
            3 => NALUnitType::CodedSliceDataPartitionB,
            4 => NALUnitType::CodedSliceDataPartitionC,
            5 => NALUnitType::CodedSliceIDR,
            6 => NALUnitType::SEI,
            7 => NALUnitType::SPS,
            8 => NALUnitType::PPS,
            9 => NALUnitType::AccessUnitDelimiter,
            10 => NALUnitType::EndOfSequence,
            11 => NALUnitType::EndOfStream,
            12 => NALUnitType::FillerData,
            _ => NALUnitType::Unspecified,
        }
    }
}

/// `slice_type` values modulo 5 (values 5..9 mean "all slices of the picture
/// have this type").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceType {
    P = 0,
    B = 1,
    I = 2,
    SP = 3,
    SI = 4,
}

impl SliceType {
    pub fn from_golomb(slice_type: u32) -> Self {
        match slice_type % 5 {
            0 => SliceType::P,
            1 => SliceType::B,
            2 => SliceType::I,
            3 => SliceType::SP,
            _ => SliceType::SI,
        }
    }

    pub fn picture_type(&self) -> PictureType {
        match self {
            SliceType::P => PictureType::P,
            SliceType::B => PictureType::B,
            SliceType::I => PictureType::I,
            SliceType::SP => PictureType::SP,
            SliceType::SI => PictureType::SI,
        }
    }
}

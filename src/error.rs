use thiserror::Error;

#[derive(Error, Debug)]
pub enum VdkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parser error: {0}")]
    Parser(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("lost sync: expected 0x47, found {found:#04x}")]
    Sync { found: u8 },

    #[error("staging buffer commit too long: {requested} bytes, {prepared} prepared")]
    CommitTooLong { requested: usize, prepared: usize },

    #[error("staging buffer consume too long: {requested} bytes, {available} readable")]
    ConsumeTooLong { requested: usize, available: usize },

    #[error("staging buffer too long: {requested} bytes exceeds limit of {limit}")]
    BufferTooLong { requested: usize, limit: usize },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl VdkError {
    /// Returns true for per-packet errors a reader recovers from by advancing
    /// to the next byte.
    pub fn is_resync(&self) -> bool {
        matches!(
            self,
            VdkError::Sync { .. } | VdkError::Parser(_) | VdkError::InvalidData(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, VdkError>;

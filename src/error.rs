use std::fmt;

/// Every failure in the compile is fatal: the pipeline either produces a
/// complete blob or nothing at all, so there is no recovery path to model.
#[derive(Debug)]
pub enum CompileError {
    /// The input image violates the fixed-grid contract (dimensions not
    /// multiples of 8, more than 256 cells, wrong color type or bit depth).
    MalformedAtlas(String),
    /// No atlas cell exists for the space character.
    MissingSpaceGlyph,
    /// A table or index selector would not fit in the 8-bit packed field.
    BitWidthOverflow(String),
    /// The input could not be opened or read.
    Io(std::io::Error),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedAtlas(msg) => write!(f, "malformed atlas: {msg}"),
            Self::MissingSpaceGlyph => write!(f, "space character has no glyph"),
            Self::BitWidthOverflow(msg) => write!(f, "selector bit-width overflow: {msg}"),
            Self::Io(e) => write!(f, "input error: {e}"),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CompileError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<image::ImageError> for CompileError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::IoError(io) => Self::Io(io),
            other => Self::MalformedAtlas(other.to_string()),
        }
    }
}

//! Demuxer error types.
//!
//! Every variant is terminal for the stream being parsed: the demuxer has
//! no notion of resuming past a structurally invalid stream. Running out of
//! buffered data is *not* an error; it is signalled as `Ok(None)` by the
//! incremental readers and simply means "feed more bytes".

use thiserror::Error;

/// Errors raised while demuxing a WebM stream.
#[derive(Error, Debug)]
pub enum DemuxError {
    /// The stream does not begin with the EBML header element.
    #[error("Stream does not begin with the EBML header element")]
    MissingEbmlHeader,

    /// Invalid VINT marker byte (no length bit set).
    #[error("Invalid VINT marker byte at stream offset {offset}")]
    InvalidVint {
        /// Absolute stream offset of the offending byte.
        offset: u64,
    },

    /// Element ID encoded on more than 4 bytes.
    #[error("Invalid element ID at stream offset {offset}")]
    InvalidElementId {
        /// Absolute stream offset of the offending ID.
        offset: u64,
    },

    /// CodecPrivate data does not carry the Opus identification header.
    #[error("Unsupported codec: CodecPrivate does not begin with 'OpusHead'")]
    UnsupportedCodec,

    /// A SimpleBlock was encountered before any audio track was declared.
    #[error("No audio track found in this WebM stream")]
    NoAudioTrack,
}

impl DemuxError {
    /// Rebase a buffer-relative offset to an absolute stream offset.
    ///
    /// The VINT readers in [`crate::ebml`] only know offsets within the
    /// working buffer they were handed; the demuxer adds the stream
    /// position of that buffer's first byte.
    pub(crate) fn at_stream_position(self, base: u64) -> Self {
        match self {
            DemuxError::InvalidVint { offset } => DemuxError::InvalidVint {
                offset: base + offset,
            },
            DemuxError::InvalidElementId { offset } => DemuxError::InvalidElementId {
                offset: base + offset,
            },
            other => other,
        }
    }
}

/// Result type for demuxing operations.
pub type Result<T> = std::result::Result<T, DemuxError>;

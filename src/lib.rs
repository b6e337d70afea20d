//! # webm-opus-demux
//!
//! Incremental WebM demuxer that extracts the raw Opus frames of the first
//! audio track from an arbitrarily-chunked byte stream.
//!
//! The demuxer understands just enough of the EBML element tree to find an
//! audio track, validate its `OpusHead` codec signature, and strip the
//! container framing from its SimpleBlocks. Everything else (video tracks,
//! metadata, seeking indexes) is opaque and skipped without being buffered.
//!
//! ## Features
//!
//! - Push-based parsing: chunk boundaries may split element IDs, size
//!   fields, or payloads at any byte position
//! - Bounded memory: one pending tail plus one fully-buffered leaf payload
//! - Large uninteresting elements are fast-forwarded over, not buffered
//! - Variable-length integer (VINT) encoding/decoding
//!
//! ## Example: extracting Opus frames from a chunked stream
//!
//! ```no_run
//! use webm_opus_demux::WebmOpusDemuxer;
//!
//! # fn receive_chunk() -> Option<Vec<u8>> { None }
//! # fn main() -> webm_opus_demux::Result<()> {
//! let mut demuxer = WebmOpusDemuxer::new();
//!
//! while let Some(chunk) = receive_chunk() {
//!     demuxer.push(&chunk)?;
//!
//!     while let Some(frame) = demuxer.read_frame() {
//!         // Hand the raw Opus frame to a decoder or player.
//!         println!("frame: {} bytes", frame.len());
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Element structure
//!
//! Of the WebM element tree, only the marked path is interpreted:
//!
//! ```text
//! EBML Header        (must come first)
//! Segment
//! ├── SeekHead       (skipped)
//! ├── Info           (skipped)
//! ├── Tracks
//! │   └── TrackEntry
//! │       ├── TrackNumber
//! │       ├── TrackType      (must be audio)
//! │       └── CodecPrivate   (must begin with "OpusHead")
//! └── Cluster
//!     └── SimpleBlock        (payload emitted, 4-byte header stripped)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod demuxer;
pub mod ebml;
pub mod elements;
pub mod error;

// Re-export main types
pub use demuxer::{AudioTrack, OpusHead, WebmOpusDemuxer};
pub use ebml::Vint;
pub use error::{DemuxError, Result};

/// Check if a buffer appears to begin a WebM/Matroska stream.
///
/// This performs a quick check by looking for the EBML header signature.
pub fn is_webm_signature(data: &[u8]) -> bool {
    data.len() >= 4 && data[0..4] == [0x1A, 0x45, 0xDF, 0xA3]
}

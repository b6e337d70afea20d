//! Incremental WebM demuxer.
//!
//! The demuxer is push-based: the transport feeds it byte chunks of
//! arbitrary size via [`WebmOpusDemuxer::push`] and drains extracted Opus
//! frames via [`WebmOpusDemuxer::read_frame`]. A chunk boundary may fall
//! anywhere, including inside an element ID, a size field, or payload data;
//! the demuxer carries the undecodable tail over to the next chunk.
//!
//! Memory stays bounded: at most one pending tail plus one fully-buffered
//! leaf payload is ever held, and large uninteresting elements are
//! discarded via an absolute skip target instead of being buffered.

use crate::ebml;
use crate::elements::{self, ElementKind, LeafRole};
use crate::error::{DemuxError, Result};

use std::collections::VecDeque;

use tracing::{debug, trace};

/// The discovered audio track. At most one exists per stream; immutable
/// once set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioTrack {
    /// Track number referenced by the stream's blocks.
    pub number: u8,
}

/// Parsed fields of an Opus identification header (`OpusHead`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpusHead {
    /// Header version (1 for the current encapsulation).
    pub version: u8,
    /// Output channel count.
    pub channels: u8,
    /// Samples (at 48 kHz) to discard from the decoder output when starting
    /// playback.
    pub pre_skip: u16,
    /// Sample rate of the original input, in Hz.
    pub input_sample_rate: u32,
    /// Output gain in Q7.8 dB.
    pub output_gain: i16,
    /// Channel mapping family.
    pub channel_mapping_family: u8,
}

impl OpusHead {
    /// Size of a complete identification header for mapping family 0.
    const SIZE: usize = 19;

    /// Parse an identification header from CodecPrivate data.
    ///
    /// Returns `None` when the data is too short to carry all fixed fields;
    /// signature validation happens separately and a short head is not
    /// fatal.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE || &data[..8] != elements::OPUS_HEAD_MAGIC {
            return None;
        }
        Some(Self {
            version: data[8],
            channels: data[9],
            pre_skip: u16::from_le_bytes([data[10], data[11]]),
            input_sample_rate: u32::from_le_bytes([data[12], data[13], data[14], data[15]]),
            output_gain: i16::from_le_bytes([data[16], data[17]]),
            channel_mapping_family: data[18],
        })
    }
}

/// Track fields accumulated while walking a TrackEntry, before an audio
/// track has been identified.
#[derive(Debug, Clone, Copy, Default)]
struct IncompleteTrack {
    number: Option<u8>,
    track_type: Option<u8>,
}

/// Outcome of one attempted element read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Continue walking at this offset within the working buffer.
    Advance(usize),
    /// The buffer ends mid-element; retry at the same offset once more
    /// data arrives.
    NeedMoreData,
    /// Discard everything up to this absolute stream position without
    /// interpretation.
    SkipTo(u64),
}

/// Incremental WebM demuxer extracting the raw Opus frames of the first
/// audio track.
#[derive(Debug, Default)]
pub struct WebmOpusDemuxer {
    /// Unconsumed suffix of the previous working buffer.
    pending: Vec<u8>,
    /// Total bytes received across all chunks.
    total: u64,
    /// Total bytes consumed (parsed or skipped); stream offset of
    /// `pending[0]`.
    consumed: u64,
    /// Absolute stream position up to which bytes are discarded unparsed.
    skip_until: Option<u64>,
    /// Whether the EBML header element has been seen yet.
    header_seen: bool,
    /// Accumulator for the TrackEntry currently being walked.
    incomplete_track: IncompleteTrack,
    /// The discovered audio track, if any.
    track: Option<AudioTrack>,
    /// Parsed Opus identification header, once seen.
    opus_head: Option<OpusHead>,
    /// Extracted frames not yet read by the caller.
    frames: VecDeque<Vec<u8>>,
}

impl WebmOpusDemuxer {
    /// Create a new demuxer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next chunk of the stream.
    ///
    /// Chunks must be fed in arrival order. Any frames completed by this
    /// chunk become available through [`read_frame`](Self::read_frame).
    /// A fatal error leaves the demuxer in an unspecified state; the
    /// stream cannot be resumed past it.
    pub fn push(&mut self, chunk: &[u8]) -> Result<()> {
        self.total += chunk.len() as u64;

        let assembled;
        let buf: &[u8] = if self.pending.is_empty() {
            chunk
        } else {
            let mut tail = std::mem::take(&mut self.pending);
            tail.extend_from_slice(chunk);
            assembled = tail;
            &assembled
        };

        let mut offset = 0usize;

        if let Some(target) = self.skip_until {
            if self.total > target {
                // The skip target falls inside this working buffer.
                offset = (target - self.consumed) as usize;
                self.skip_until = None;
            } else {
                // The whole buffer lies inside the skip range.
                self.consumed += buf.len() as u64;
                return Ok(());
            }
        }

        loop {
            match self.read_element(buf, offset)? {
                Step::Advance(next) => offset = next,
                Step::NeedMoreData => break,
                Step::SkipTo(target) => {
                    self.skip_until = Some(target);
                    offset = buf.len();
                    break;
                }
            }
        }

        self.consumed += offset as u64;
        if offset < buf.len() {
            self.pending = buf[offset..].to_vec();
        }
        Ok(())
    }

    /// Pop the next extracted Opus frame, in stream order.
    pub fn read_frame(&mut self) -> Option<Vec<u8>> {
        self.frames.pop_front()
    }

    /// The discovered audio track, once track discovery has completed.
    pub fn track(&self) -> Option<&AudioTrack> {
        self.track.as_ref()
    }

    /// The parsed Opus identification header, once CodecPrivate has been
    /// walked.
    pub fn opus_head(&self) -> Option<&OpusHead> {
        self.opus_head.as_ref()
    }

    /// Total bytes received so far.
    pub fn bytes_received(&self) -> u64 {
        self.total
    }

    /// Total bytes fully consumed (parsed or skipped) so far.
    pub fn bytes_consumed(&self) -> u64 {
        self.consumed
    }

    /// Attempt to read one element at `offset` within the working buffer.
    fn read_element(&mut self, buf: &[u8], mut offset: usize) -> Result<Step> {
        // Stream offset of buf[0], for error reporting and skip targets.
        let base = self.consumed;

        let Some((id, id_len)) =
            ebml::read_element_id(buf, offset).map_err(|e| e.at_stream_position(base))?
        else {
            return Ok(Step::NeedMoreData);
        };

        // The very first element of the stream must be the EBML header.
        if !self.header_seen {
            if id != elements::EBML {
                return Err(DemuxError::MissingEbmlHeader);
            }
            self.header_seen = true;
        }
        offset += id_len;

        let Some(size) = ebml::read_vint(buf, offset).map_err(|e| e.at_stream_position(base))? else {
            return Ok(Step::NeedMoreData);
        };
        offset += size.length;

        // End of this element's payload, relative to the working buffer.
        // Kept as u64: declared sizes of skipped elements may exceed any
        // buffer we will ever hold.
        let end = offset as u64 + size.value;

        let Some(kind) = elements::classify(id) else {
            trace!(id, size = size.value, "skipping unknown element");
            return if end <= buf.len() as u64 {
                Ok(Step::Advance(end as usize))
            } else {
                Ok(Step::SkipTo(base + end))
            };
        };

        trace!(
            element = elements::element_name(id),
            size = size.value,
            "walking element"
        );

        match kind {
            ElementKind::Container => {
                // Descend: children start right after the header. A fresh
                // TrackEntry restarts field accumulation until a track has
                // been promoted.
                if id == elements::TRACK_ENTRY && self.track.is_none() {
                    self.incomplete_track = IncompleteTrack::default();
                }
                Ok(Step::Advance(offset))
            }
            ElementKind::Leaf(role) => {
                if end > buf.len() as u64 {
                    // Leaf payloads are buffered whole, never skipped.
                    return Ok(Step::NeedMoreData);
                }
                let data = &buf[offset..end as usize];
                self.dispatch_leaf(role, data)?;
                Ok(Step::Advance(end as usize))
            }
        }
    }

    /// Handle a fully-buffered recognized leaf payload.
    fn dispatch_leaf(&mut self, role: LeafRole, data: &[u8]) -> Result<()> {
        match role {
            LeafRole::TrackNumber => {
                if self.track.is_none() {
                    self.incomplete_track.number = data.first().copied();
                    self.try_promote_track();
                }
            }
            LeafRole::TrackType => {
                if self.track.is_none() {
                    self.incomplete_track.track_type = data.first().copied();
                    self.try_promote_track();
                }
            }
            LeafRole::CodecPrivate => {
                if data.len() < elements::OPUS_HEAD_MAGIC.len()
                    || &data[..elements::OPUS_HEAD_MAGIC.len()] != elements::OPUS_HEAD_MAGIC
                {
                    return Err(DemuxError::UnsupportedCodec);
                }
                self.opus_head = OpusHead::parse(data);
                debug!(head = ?self.opus_head, "validated Opus codec private data");
            }
            LeafRole::SimpleBlock => {
                let track = self.track.ok_or(DemuxError::NoAudioTrack)?;
                match data.first() {
                    Some(&first)
                        if first & 0x0F == track.number
                            && data.len() >= elements::BLOCK_HEADER_SIZE =>
                    {
                        self.frames
                            .push_back(data[elements::BLOCK_HEADER_SIZE..].to_vec());
                    }
                    _ => {
                        trace!(size = data.len(), "dropping block for another track");
                    }
                }
            }
        }
        Ok(())
    }

    /// Promote the accumulator to a [`AudioTrack`] once the number is known
    /// and the type identifies audio. First audio track wins.
    fn try_promote_track(&mut self) {
        if let IncompleteTrack {
            number: Some(number),
            track_type: Some(elements::TRACK_TYPE_AUDIO),
        } = self.incomplete_track
        {
            debug!(track = number, "audio track discovered");
            self.track = Some(AudioTrack { number });
        }
    }
}

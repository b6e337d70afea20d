//! Property-based tests for the incremental demuxer.
//!
//! Uses proptest to verify that arbitrary chunkings of a well-formed
//! stream are equivalent to parsing it in one piece, and that VINT
//! encoding round-trips.

use proptest::prelude::*;

use webm_opus_demux::ebml::{encode_vint, read_vint, vint_length};
use webm_opus_demux::elements::{
    CLUSTER, CODEC_PRIVATE, EBML, SEGMENT, SIMPLE_BLOCK, TRACKS, TRACK_ENTRY, TRACK_NUMBER,
    TRACK_TYPE,
};
use webm_opus_demux::WebmOpusDemuxer;

fn element(id: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let id_bytes = id.to_be_bytes();
    let start = id_bytes.iter().position(|&b| b != 0).unwrap_or(3);
    out.extend_from_slice(&id_bytes[start..]);
    let (size, size_len) = encode_vint(payload.len() as u64).unwrap();
    out.extend_from_slice(&size[..size_len]);
    out.extend_from_slice(payload);
    out
}

fn opus_head() -> Vec<u8> {
    let mut head = Vec::new();
    head.extend_from_slice(b"OpusHead");
    head.push(1);
    head.push(2);
    head.extend_from_slice(&0u16.to_le_bytes());
    head.extend_from_slice(&48_000u32.to_le_bytes());
    head.extend_from_slice(&0i16.to_le_bytes());
    head.push(0);
    head
}

/// Build a well-formed stream carrying the given frames on track 1, plus
/// one foreign-track block and one unrecognized element to exercise the
/// skip paths.
fn build_stream(frames: &[Vec<u8>]) -> Vec<u8> {
    let mut track_entry = Vec::new();
    track_entry.extend_from_slice(&element(TRACK_NUMBER, &[1]));
    track_entry.extend_from_slice(&element(TRACK_TYPE, &[2]));
    track_entry.extend_from_slice(&element(CODEC_PRIVATE, &opus_head()));
    let tracks = element(TRACKS, &element(TRACK_ENTRY, &track_entry));

    let mut cluster_children = Vec::new();
    for frame in frames {
        let mut payload = vec![0x81, 0x00, 0x00, 0x00];
        payload.extend_from_slice(frame);
        cluster_children.extend_from_slice(&element(SIMPLE_BLOCK, &payload));
    }
    // A block referencing track 2: must never be emitted.
    cluster_children.extend_from_slice(&element(SIMPLE_BLOCK, &[0x82, 0, 0, 0, 0xEE]));

    let mut segment_payload = tracks;
    // SeekHead, unrecognized by the demuxer: must be skipped wholesale.
    segment_payload.extend_from_slice(&element(0x114D9B74, &[0x5A; 37]));
    let cluster = element(CLUSTER, &cluster_children);
    segment_payload.extend_from_slice(&cluster);

    let mut stream = element(EBML, &[]);
    stream.extend_from_slice(&element(SEGMENT, &segment_payload));
    stream
}

fn parse_whole(stream: &[u8]) -> Vec<Vec<u8>> {
    let mut demuxer = WebmOpusDemuxer::new();
    demuxer.push(stream).expect("well-formed stream");
    let mut out = Vec::new();
    while let Some(frame) = demuxer.read_frame() {
        out.push(frame);
    }
    out
}

proptest! {
    /// Any partition of the stream into chunks yields the same frames as
    /// parsing it in one piece.
    #[test]
    fn chunked_parse_matches_whole_parse(
        frames in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 1..8),
        sizes in prop::collection::vec(1usize..48, 1..64),
    ) {
        let stream = build_stream(&frames);
        let expected = parse_whole(&stream);
        prop_assert_eq!(&expected, &frames);

        let mut demuxer = WebmOpusDemuxer::new();
        let mut offset = 0;
        let mut size_iter = sizes.iter().cycle();
        while offset < stream.len() {
            let take = (*size_iter.next().unwrap()).min(stream.len() - offset);
            demuxer.push(&stream[offset..offset + take]).unwrap();
            offset += take;
        }

        let mut got = Vec::new();
        while let Some(frame) = demuxer.read_frame() {
            got.push(frame);
        }
        prop_assert_eq!(got, expected);
    }

    /// Encoding an integer as a VINT and decoding it yields the integer,
    /// for all values representable in 1..8 encoded bytes.
    #[test]
    fn vint_roundtrip(value in 0u64..(1 << 56)) {
        let (encoded, len) = encode_vint(value).unwrap();
        prop_assert_eq!(len, vint_length(value));

        let vint = read_vint(&encoded[..len], 0).unwrap().unwrap();
        prop_assert_eq!(vint.value, value);
        prop_assert_eq!(vint.length, len);
    }

    /// A VINT truncated anywhere before its full length reads as
    /// "insufficient", never as a value or an error.
    #[test]
    fn truncated_vint_is_insufficient(value in 1u64..(1 << 56)) {
        let (encoded, len) = encode_vint(value).unwrap();
        for cut in 0..len {
            prop_assert_eq!(read_vint(&encoded[..cut], 0).unwrap(), None);
        }
    }
}

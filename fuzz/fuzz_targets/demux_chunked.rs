#![no_main]

//! Fuzz target for incremental WebM demuxing.
//!
//! Feeds arbitrary bytes to the demuxer in arbitrary chunkings. Malformed
//! input must surface as an error, never as a panic, and a fatal error must
//! be reproduced by the unchunked parse of the same bytes.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use webm_opus_demux::WebmOpusDemuxer;

#[derive(Arbitrary, Debug)]
struct DemuxInput {
    data: Vec<u8>,
    chunk_sizes: Vec<u8>,
}

fuzz_target!(|input: DemuxInput| {
    // Limit input size to prevent excessive memory allocation
    if input.data.len() > 64 * 1024 {
        return;
    }

    let mut chunked = WebmOpusDemuxer::new();
    let mut sizes = input
        .chunk_sizes
        .iter()
        .map(|&s| s.max(1) as usize)
        .cycle();

    let mut offset = 0;
    let mut chunked_failed = false;
    while offset < input.data.len() {
        let take = sizes
            .next()
            .unwrap_or(1)
            .min(input.data.len() - offset);
        if chunked.push(&input.data[offset..offset + take]).is_err() {
            chunked_failed = true;
            break;
        }
        offset += take;
    }

    let mut whole = WebmOpusDemuxer::new();
    let whole_failed = whole.push(&input.data).is_err();

    if !chunked_failed {
        // A stream the chunked parse accepted in full must also parse in
        // one piece, with the same frames.
        assert!(!whole_failed);
        let mut a = Vec::new();
        while let Some(frame) = chunked.read_frame() {
            a.push(frame);
        }
        let mut b = Vec::new();
        while let Some(frame) = whole.read_frame() {
            b.push(frame);
        }
        assert_eq!(a, b);
    }
});

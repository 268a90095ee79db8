#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_mjpeg::{DecoderState, MjpegDecoder};

#[derive(Arbitrary, Debug)]
struct FuzzDecoder {
    chunks: Vec<Vec<u8>>,
    finish: bool,
}

fuzz_target!(|input: FuzzDecoder| {
    let mut decoder = MjpegDecoder::new();
    let mut emitted = 0;
    let mut dropped = 0;

    for chunk in input.chunks.iter().take(64) {
        let outcome = decoder.feed(chunk);
        emitted += outcome.emitted;
        dropped += outcome.dropped.len();

        // 書き込み済みバイト数は宣言された長さを超えない
        if let DecoderState::Assembling { declared, written } = decoder.state() {
            assert!(written <= declared);
        }
    }

    if input.finish && decoder.finish().is_some() {
        dropped += 1;
        assert_eq!(decoder.state(), DecoderState::Idle);
    }

    assert_eq!(decoder.pending_frames(), emitted);
    assert_eq!(decoder.stats().frames_emitted, emitted as u64);
    assert_eq!(decoder.stats().frames_dropped, dropped as u64);

    let mut sequence = 0;
    while let Some(frame) = decoder.next_frame() {
        assert_eq!(frame.sequence(), sequence);
        sequence += 1;
    }
});

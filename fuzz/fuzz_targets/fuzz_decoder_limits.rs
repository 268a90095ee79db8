#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_mjpeg::{DecoderLimits, DropReason, MjpegDecoder};

#[derive(Arbitrary, Debug)]
struct FuzzLimits {
    max_frame_size: u16,
    max_carry_size: u8,
    max_rescans_per_chunk: u8,
    chunks: Vec<Vec<u8>>,
}

fn build_limits(input: &FuzzLimits) -> DecoderLimits {
    DecoderLimits {
        max_frame_size: input.max_frame_size as usize,
        max_carry_size: input.max_carry_size as usize,
        max_rescans_per_chunk: input.max_rescans_per_chunk as usize,
    }
}

fuzz_target!(|input: FuzzLimits| {
    let limits = build_limits(&input);
    let mut decoder = MjpegDecoder::with_limits(limits.clone());

    for chunk in input.chunks.iter().take(64) {
        let outcome = decoder.feed(chunk);
        for reason in &outcome.dropped {
            if let DropReason::FrameTooLarge { declared, limit } = reason {
                assert!(*declared > *limit);
                assert_eq!(*limit, limits.max_frame_size);
            }
        }
    }

    while let Some(frame) = decoder.next_frame() {
        assert!(frame.len() <= limits.max_frame_size);
    }
});

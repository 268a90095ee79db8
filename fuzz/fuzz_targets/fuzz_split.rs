#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_mjpeg::{DecoderLimits, MjpegDecoder, MjpegEncoder};

#[derive(Arbitrary, Debug)]
struct FuzzSplit {
    payloads: Vec<Vec<u8>>,
    split_hint: u8,
}

/// 0xFF を含まない JPEG 画像を作る
fn build_image(payload: &[u8]) -> Vec<u8> {
    let mut image = vec![0xFF, 0xD8];
    image.extend(payload.iter().take(4096).map(|&b| b.min(0xFE)));
    image.extend_from_slice(&[0xFF, 0xD9]);
    image
}

fn decode(stream: &[u8], split_size: usize) -> Vec<Vec<u8>> {
    let mut decoder = MjpegDecoder::with_limits(DecoderLimits::unlimited());
    let mut frames = Vec::new();
    for chunk in stream.chunks(split_size) {
        let outcome = decoder.feed(chunk);
        assert!(outcome.dropped.is_empty());
        while let Some(frame) = decoder.next_frame() {
            frames.push(frame.into_data());
        }
    }
    frames
}

fuzz_target!(|input: FuzzSplit| {
    let encoder = MjpegEncoder::with_boundary("frame");
    let images: Vec<Vec<u8>> = input
        .payloads
        .iter()
        .take(16)
        .map(|payload| build_image(payload))
        .collect();

    let mut stream = Vec::new();
    for image in &images {
        stream.extend_from_slice(&encoder.encode_frame(image));
    }
    if stream.is_empty() {
        return;
    }

    // どこで分割しても同じフレーム列になる
    let split_size = (input.split_hint as usize).max(1);
    assert_eq!(decode(&stream, stream.len()), images);
    assert_eq!(decode(&stream, split_size), images);
});

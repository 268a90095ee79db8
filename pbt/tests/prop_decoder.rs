//! MjpegDecoder のプロパティテスト

use pbt::{boundary, chunk_sizes, jpeg_image, jpeg_image_with_markers, split_by_sizes};
use proptest::prelude::*;
use shiguredo_mjpeg::{DecoderLimits, DecoderState, MjpegDecoder, MjpegEncoder};

fn encode_stream(boundary: &str, images: &[Vec<u8>]) -> Vec<u8> {
    let encoder = MjpegEncoder::with_boundary(boundary);
    let mut stream = Vec::new();
    for image in images {
        stream.extend_from_slice(&encoder.encode_frame(image));
    }
    stream
}

fn decode_chunks(decoder: &mut MjpegDecoder, chunks: &[&[u8]]) -> Vec<Vec<u8>> {
    let mut frames = Vec::new();
    for chunk in chunks {
        let outcome = decoder.feed(chunk);
        assert!(outcome.dropped.is_empty(), "dropped: {:?}", outcome.dropped);
        while let Some(frame) = decoder.next_frame() {
            frames.push(frame.into_data());
        }
    }
    frames
}

// ========================================
// チャンク境界に依存しないこと
// ========================================

// 0xFF を含む画像でも、任意のチャンク分割で元の画像列がそのまま得られる
proptest! {
    #[test]
    fn decode_arbitrary_chunking(
        boundary in boundary(),
        images in proptest::collection::vec(jpeg_image_with_markers(), 1..8),
        sizes in chunk_sizes(512)
    ) {
        let stream = encode_stream(&boundary, &images);
        let chunks = split_by_sizes(&stream, &sizes);

        let mut decoder = MjpegDecoder::with_limits(DecoderLimits::unlimited());
        let frames = decode_chunks(&mut decoder, &chunks);

        prop_assert_eq!(frames, images);
        prop_assert_eq!(decoder.state(), DecoderState::Idle);
    }
}

// 1 バイトずつでも 1 チャンクでも同じ結果になる
proptest! {
    #[test]
    fn decode_one_byte_and_single_chunk_agree(
        images in proptest::collection::vec(jpeg_image_with_markers(), 1..5)
    ) {
        let stream = encode_stream("frame", &images);

        let mut single = MjpegDecoder::with_limits(DecoderLimits::unlimited());
        let from_single = decode_chunks(&mut single, &[&stream[..]]);

        let mut bytewise = MjpegDecoder::with_limits(DecoderLimits::unlimited());
        let chunks: Vec<&[u8]> = stream.chunks(1).collect();
        let from_bytewise = decode_chunks(&mut bytewise, &chunks);

        prop_assert_eq!(&from_single, &images);
        prop_assert_eq!(&from_bytewise, &images);
    }
}

// パートより小さいチャンクならデフォルトの制限でも取りこぼさない
proptest! {
    #[test]
    fn decode_small_chunks_with_default_limits(
        images in proptest::collection::vec(jpeg_image(), 1..8),
        sizes in chunk_sizes(48)
    ) {
        let stream = encode_stream("frame", &images);
        let chunks = split_by_sizes(&stream, &sizes);

        let mut decoder = MjpegDecoder::new();
        let frames = decode_chunks(&mut decoder, &chunks);

        prop_assert_eq!(frames, images);
    }
}

// 出力されたフレームの通し番号は 0 から連続する
proptest! {
    #[test]
    fn frame_sequence_is_contiguous(
        images in proptest::collection::vec(jpeg_image(), 1..8),
        size in 1usize..64
    ) {
        let stream = encode_stream("frame", &images);

        let mut decoder = MjpegDecoder::new();
        let mut sequences = Vec::new();
        for chunk in stream.chunks(size) {
            decoder.feed(chunk);
            while let Some(frame) = decoder.next_frame() {
                sequences.push(frame.sequence());
            }
        }

        let expected: Vec<u64> = (0..images.len() as u64).collect();
        prop_assert_eq!(sequences, expected);
        prop_assert_eq!(decoder.stats().frames_emitted, images.len() as u64);
        prop_assert_eq!(decoder.stats().bytes, stream.len() as u64);
    }
}

// ========================================
// 破損からの回復
// ========================================

// EOI のないブロックは 1 フレームも出力せず、後続のフレームは取り出せる
proptest! {
    #[test]
    fn missing_eoi_block_is_dropped(
        before in proptest::collection::vec(jpeg_image(), 0..3),
        broken_payload in proptest::collection::vec(0u8..0xFF, 8..128),
        after in proptest::collection::vec(jpeg_image(), 1..3)
    ) {
        let encoder = MjpegEncoder::with_boundary("frame");

        let mut broken = vec![0xFF, 0xD8];
        broken.extend_from_slice(&broken_payload);
        let broken_part = encoder.encode_frame(&broken);

        let mut decoder = MjpegDecoder::new();
        let mut frames = Vec::new();
        let mut dropped = 0;

        // パートごとに 1 チャンクとして渡し、壊れたパートだけは 2 つに分ける
        let mut chunks: Vec<Vec<u8>> = before.iter().map(|image| encoder.encode_frame(image)).collect();
        let split = broken_part.len() - broken_payload.len() / 2;
        chunks.push(broken_part[..split].to_vec());
        chunks.push(broken_part[split..].to_vec());
        chunks.extend(after.iter().map(|image| encoder.encode_frame(image)));

        for chunk in &chunks {
            dropped += decoder.feed(chunk).dropped.len();
            while let Some(frame) = decoder.next_frame() {
                frames.push(frame.into_data());
            }
        }

        let mut expected = before.clone();
        expected.extend(after.iter().cloned());

        prop_assert_eq!(dropped, 1);
        prop_assert_eq!(frames, expected);
        prop_assert_eq!(decoder.state(), DecoderState::Idle);
    }
}

// 任意のバイト列を与えてもパニックせず、出力は宣言された長さちょうど
proptest! {
    #[test]
    fn arbitrary_input_never_panics(
        data in proptest::collection::vec(any::<u8>(), 0..2048),
        sizes in chunk_sizes(128)
    ) {
        let mut decoder = MjpegDecoder::new();
        for chunk in split_by_sizes(&data, &sizes) {
            decoder.feed(chunk);
            if let DecoderState::Assembling { declared, written } = decoder.state() {
                prop_assert!(written <= declared);
            }
        }
        decoder.finish();
        prop_assert_eq!(decoder.state(), DecoderState::Idle);
    }
}

// ストリーム終端で組み立て途中のフレームは出力されない
proptest! {
    #[test]
    fn truncated_stream_emits_no_partial_frame(
        image in jpeg_image(),
        cut in 1usize..64
    ) {
        let stream = encode_stream("frame", std::slice::from_ref(&image));
        let cut = cut.min(image.len());
        let truncated = &stream[..stream.len() - 2 - cut];

        let mut decoder = MjpegDecoder::new();
        decoder.feed(truncated);
        prop_assert!(decoder.next_frame().is_none());

        let reason = decoder.finish();
        prop_assert!(reason.is_some());
        prop_assert!(decoder.next_frame().is_none());
    }
}

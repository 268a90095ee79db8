//! PBT テスト共通ユーティリティ

use proptest::prelude::*;

// ========================================
// JPEG / ストリーム生成
// ========================================

/// JPEG ペイロード (SOI と EOI の間のバイト列)
///
/// 実際の JPEG と同様に 0xFF を含まない (エントロピー符号化データ中の 0xFF はスタッフィングされる)。
pub fn jpeg_payload() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(0u8..0xFF, 0..256)
}

/// SOI / EOI 付きの JPEG 画像
pub fn jpeg_image() -> impl Strategy<Value = Vec<u8>> {
    jpeg_payload().prop_map(|payload| {
        let mut out = vec![0xFF, 0xD8];
        out.extend_from_slice(&payload);
        out.extend_from_slice(&[0xFF, 0xD9]);
        out
    })
}

/// 0xFF で始まるマーカーやスタッフィングを含む JPEG ペイロード
///
/// `FF 00` / `FF E0` / `FF DB` の 2 バイト組を混ぜる。単独の 0xFF は含まないので
/// `FF D8` や `FF D9` は現れない。
pub fn jpeg_payload_with_markers() -> impl Strategy<Value = Vec<u8>> {
    let piece = prop_oneof![
        3 => (0u8..0xFF).prop_map(|byte| vec![byte]),
        1 => prop::sample::select(vec![[0xFF, 0x00], [0xFF, 0xE0], [0xFF, 0xDB]])
            .prop_map(|pair| pair.to_vec()),
    ];
    proptest::collection::vec(piece, 0..192).prop_map(|pieces| pieces.concat())
}

/// SOI / EOI 付きで、途中に 0xFF の 2 バイト組を含む JPEG 画像
pub fn jpeg_image_with_markers() -> impl Strategy<Value = Vec<u8>> {
    jpeg_payload_with_markers().prop_map(|payload| {
        let mut out = vec![0xFF, 0xD8];
        out.extend_from_slice(&payload);
        out.extend_from_slice(&[0xFF, 0xD9]);
        out
    })
}

/// 境界文字列
pub fn boundary() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{1,32}"
}

/// チャンクサイズの列 (各要素 1 以上)
pub fn chunk_sizes(max: usize) -> impl Strategy<Value = Vec<usize>> {
    proptest::collection::vec(1..=max, 1..64)
}

/// `sizes` を繰り返し使ってデータをチャンクに分割する
pub fn split_by_sizes<'a>(data: &'a [u8], sizes: &[usize]) -> Vec<&'a [u8]> {
    let mut chunks = Vec::new();
    let mut pos = 0;
    let mut i = 0;
    while pos < data.len() {
        let size = sizes[i % sizes.len()].max(1);
        let end = (pos + size).min(data.len());
        chunks.push(&data[pos..end]);
        pos = end;
        i += 1;
    }
    chunks
}

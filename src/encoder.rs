//! MJPEG ストリームのエンコード
//!
//! `multipart/x-mixed-replace` のパートとして JPEG 画像を 1 枚ずつ書き出す。
//! デコーダーが頼りにする `Content-Length` マーカーを必ず付与する。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_mjpeg::MjpegEncoder;
//!
//! let encoder = MjpegEncoder::with_boundary("frame");
//! assert_eq!(
//!     encoder.content_type(),
//!     "multipart/x-mixed-replace; boundary=frame"
//! );
//!
//! let part = encoder.encode_frame(b"\xFF\xD8\xFF\xD9");
//! assert!(part.starts_with(b"--frame\r\n"));
//! ```

/// MJPEG エンコーダー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MjpegEncoder {
    /// 境界文字列
    boundary: String,
}

impl MjpegEncoder {
    /// 乱数値を受け取って境界を生成する
    ///
    /// Sans I/O の原則に従い、乱数生成は呼び出し側の責任となる。
    pub fn new(random_value: u64) -> Self {
        Self {
            boundary: format!("mjpeg-boundary-{:016x}", random_value),
        }
    }

    /// 境界を指定して作成
    pub fn with_boundary(boundary: &str) -> Self {
        Self {
            boundary: boundary.to_string(),
        }
    }

    /// 境界文字列を取得
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Content-Type ヘッダー値を取得
    pub fn content_type(&self) -> String {
        format!("multipart/x-mixed-replace; boundary={}", self.boundary)
    }

    /// JPEG 画像を 1 パートとしてエンコード
    pub fn encode_frame(&self, jpeg: &[u8]) -> Vec<u8> {
        encode_frame(&self.boundary, jpeg)
    }
}

/// JPEG 画像を 1 パートとしてエンコード
///
/// `--{boundary}\r\nContent-Type: image/jpeg\r\nContent-Length: {len}\r\n\r\n{jpeg}\r\n`
pub fn encode_frame(boundary: &str, jpeg: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(boundary.len() + jpeg.len() + 64);

    // 境界
    result.extend_from_slice(b"--");
    result.extend_from_slice(boundary.as_bytes());
    result.extend_from_slice(b"\r\n");

    result.extend_from_slice(b"Content-Type: image/jpeg\r\n");
    result.extend_from_slice(b"Content-Length: ");
    result.extend_from_slice(jpeg.len().to_string().as_bytes());
    result.extend_from_slice(b"\r\n\r\n");

    result.extend_from_slice(jpeg);
    result.extend_from_slice(b"\r\n");

    result
}

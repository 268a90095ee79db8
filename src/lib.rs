//! # shiguredo_mjpeg
//!
//! 依存なしの MJPEG (multipart/x-mixed-replace) フレーム抽出ライブラリ (Sans I/O)
//!
//! ## 特徴
//!
//! - **依存なし**: 標準ライブラリのみ使用
//! - **Sans I/O**: I/O を完全に分離した設計
//! - **チャンク境界に依存しない**: どこで区切られたチャンクを渡しても同じフレーム列が得られる
//! - **壊れたストリームに強い**: 不完全なフレームは破棄して次のフレームから再開する
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_mjpeg::{MjpegDecoder, MjpegEncoder};
//!
//! // MJPEG ストリームを作成
//! let encoder = MjpegEncoder::with_boundary("frame");
//! let mut stream = encoder.encode_frame(b"\xFF\xD8first\xFF\xD9");
//! stream.extend_from_slice(&encoder.encode_frame(b"\xFF\xD8second\xFF\xD9"));
//!
//! // 任意の大きさのチャンクで feed する
//! let mut decoder = MjpegDecoder::new();
//! for chunk in stream.chunks(7) {
//!     let outcome = decoder.feed(chunk);
//!     assert!(outcome.dropped.is_empty());
//! }
//!
//! let first = decoder.next_frame().unwrap();
//! assert_eq!(first.data(), b"\xFF\xD8first\xFF\xD9");
//! let second = decoder.next_frame().unwrap();
//! assert_eq!(second.data(), b"\xFF\xD8second\xFF\xD9");
//! ```

mod assembler;
mod decoder;
mod encoder;
mod error;
mod frame;
mod limits;
pub mod scanner;

pub use decoder::{DecoderState, DecoderStats, FeedOutcome, MjpegDecoder};
pub use encoder::{MjpegEncoder, encode_frame};
pub use error::DropReason;
pub use frame::Frame;
pub use limits::DecoderLimits;

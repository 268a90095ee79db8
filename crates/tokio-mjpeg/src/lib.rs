//! tokio_mjpeg - Tokio integration for shiguredo_mjpeg
//!
//! `AsyncRead` から MJPEG ストリームを読み込み、JPEG フレームを 1 枚ずつ取り出す。
//!
//! ## 特徴
//!
//! - **shiguredo_mjpeg ベース**: Sans I/O ライブラリをベースにした設計
//! - **非同期 I/O**: tokio による完全非同期対応
//! - **読み込みタイムアウト**: 一定時間データが届かなければ `Error::Timeout` を返す
//!
//! ## 使い方
//!
//! ```ignore
//! use tokio::net::TcpStream;
//! use tokio_mjpeg::FrameReader;
//!
//! let stream = TcpStream::connect("127.0.0.1:8080").await?;
//! let mut reader = FrameReader::new(stream).read_timeout(Duration::from_secs(10));
//!
//! while let Some(frame) = reader.next_frame().await? {
//!     println!("frame {}: {} bytes", frame.sequence(), frame.len());
//! }
//! ```

pub mod error;
pub mod reader;

pub use error::{Error, Result};
pub use reader::FrameReader;

// shiguredo_mjpeg の型を re-export
pub use shiguredo_mjpeg::{DecoderLimits, DropReason, Frame, MjpegDecoder};

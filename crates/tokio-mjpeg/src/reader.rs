//! 非同期フレームリーダー

use std::time::Duration;

use shiguredo_mjpeg::{Frame, MjpegDecoder};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, warn};

use crate::error::Result;

/// `AsyncRead` から JPEG フレームを読み出す
#[derive(Debug)]
pub struct FrameReader<R> {
    reader: R,
    decoder: MjpegDecoder,
    buf: Vec<u8>,
    read_timeout: Duration,
    eof: bool,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// デフォルトの制限でリーダーを作成
    pub fn new(reader: R) -> Self {
        Self::with_decoder(reader, MjpegDecoder::new())
    }

    /// デコーダーを指定してリーダーを作成
    pub fn with_decoder(reader: R, decoder: MjpegDecoder) -> Self {
        Self {
            reader,
            decoder,
            buf: vec![0u8; 8192],
            read_timeout: Duration::from_secs(60),
            eof: false,
        }
    }

    /// 読み込みタイムアウトを設定 (デフォルト: 60 秒)
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// 1 回の read で読み込む最大バイト数を設定 (デフォルト: 8192)
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.buf = vec![0u8; size.max(1)];
        self
    }

    /// デコーダーを取得
    pub fn decoder(&self) -> &MjpegDecoder {
        &self.decoder
    }

    /// 内部のリーダーを取り出す
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// 次のフレームを読み込む
    ///
    /// ストリームが終端に達した場合は `Ok(None)` を返す。
    /// 終端で組み立て途中だったフレームは破棄される。
    pub async fn next_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            if let Some(frame) = self.decoder.next_frame() {
                debug!(
                    sequence = frame.sequence(),
                    len = frame.len(),
                    "frame decoded"
                );
                return Ok(Some(frame));
            }

            if self.eof {
                return Ok(None);
            }

            let n = tokio::time::timeout(self.read_timeout, self.reader.read(&mut self.buf)).await??;
            if n == 0 {
                self.eof = true;
                if let Some(reason) = self.decoder.finish() {
                    warn!(%reason, "frame dropped at end of stream");
                }
                return Ok(None);
            }

            let outcome = self.decoder.feed(&self.buf[..n]);
            for reason in &outcome.dropped {
                warn!(%reason, "frame dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use shiguredo_mjpeg::{DecoderLimits, MjpegEncoder};
    use tokio::io::AsyncWriteExt;

    fn stream_of(images: &[&[u8]]) -> Vec<u8> {
        let encoder = MjpegEncoder::with_boundary("frame");
        let mut stream = Vec::new();
        for image in images {
            stream.extend_from_slice(&encoder.encode_frame(image));
        }
        stream
    }

    #[tokio::test]
    async fn test_read_frames() {
        let stream = stream_of(&[b"\xFF\xD8first\xFF\xD9", b"\xFF\xD8second\xFF\xD9"]);
        let mut reader = FrameReader::new(&stream[..]).read_buffer_size(16);

        let first = reader.next_frame().await.unwrap().unwrap();
        assert_eq!(first.data(), b"\xFF\xD8first\xFF\xD9");
        assert_eq!(first.sequence(), 0);

        let second = reader.next_frame().await.unwrap().unwrap();
        assert_eq!(second.data(), b"\xFF\xD8second\xFF\xD9");
        assert_eq!(second.sequence(), 1);

        assert!(reader.next_frame().await.unwrap().is_none());
        assert!(reader.next_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_one_byte_reads() {
        let stream = stream_of(&[b"\xFF\xD8abc\xFF\xD9", b"\xFF\xD8defg\xFF\xD9"]);
        let mut reader = FrameReader::new(&stream[..]).read_buffer_size(1);

        let mut frames = Vec::new();
        while let Some(frame) = reader.next_frame().await.unwrap() {
            frames.push(frame.into_data());
        }
        assert_eq!(
            frames,
            vec![b"\xFF\xD8abc\xFF\xD9".to_vec(), b"\xFF\xD8defg\xFF\xD9".to_vec()]
        );
        assert_eq!(reader.decoder().stats().bytes, stream.len() as u64);
    }

    #[tokio::test]
    async fn test_truncated_stream_drops_partial_frame() {
        let stream = stream_of(&[b"\xFF\xD8abc\xFF\xD9", b"\xFF\xD8defg\xFF\xD9"]);
        let truncated = &stream[..stream.len() - 5];
        let mut reader = FrameReader::new(truncated);

        assert!(reader.next_frame().await.unwrap().is_some());
        assert!(reader.next_frame().await.unwrap().is_none());
        assert_eq!(reader.decoder().stats().frames_dropped, 1);
    }

    #[tokio::test]
    async fn test_with_decoder() {
        // 1 チャンクに 3 フレームあっても制限なしならすべて取り出せる
        let stream = stream_of(&[
            b"\xFF\xD8a\xFF\xD9",
            b"\xFF\xD8b\xFF\xD9",
            b"\xFF\xD8c\xFF\xD9",
        ]);
        let decoder = MjpegDecoder::with_limits(DecoderLimits::unlimited());
        let mut reader = FrameReader::with_decoder(&stream[..], decoder);

        let mut count = 0;
        while reader.next_frame().await.unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_duplex_stream() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let stream = stream_of(&[b"\xFF\xD8hello\xFF\xD9"]);

        let handle = tokio::spawn(async move {
            for chunk in stream.chunks(5) {
                writer.write_all(chunk).await.unwrap();
            }
        });

        let mut reader = FrameReader::new(reader);
        let frame = reader.next_frame().await.unwrap().unwrap();
        assert_eq!(frame.data(), b"\xFF\xD8hello\xFF\xD9");

        handle.await.unwrap();
        assert!(reader.next_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_timeout() {
        let (_writer, reader) = tokio::io::duplex(64);
        let mut reader = FrameReader::new(reader).read_timeout(Duration::from_millis(10));

        let result = reader.next_frame().await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn test_into_inner() {
        let stream = stream_of(&[b"\xFF\xD8\xFF\xD9"]);
        let mut reader = FrameReader::new(&stream[..]);
        assert!(reader.next_frame().await.unwrap().is_some());

        let rest = reader.into_inner();
        assert!(rest.is_empty());
    }
}

//! 抽出済みフレーム

/// ストリームから取り出した 1 枚の JPEG 画像
///
/// 中身はデコードせず、宣言された長さちょうどのバイト列として扱う。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// 出力順の通し番号 (0 始まり)
    sequence: u64,
    /// SOI から EOI までのバイト列
    data: Vec<u8>,
}

impl Frame {
    pub(crate) fn new(sequence: u64, data: Vec<u8>) -> Self {
        Self { sequence, data }
    }

    /// 通し番号を取得
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// バイト列を取得
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// バイト数を取得
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 空かどうか (Content-Length: 0 の場合のみ)
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// バイト列を取り出す
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl From<Frame> for Vec<u8> {
    fn from(frame: Frame) -> Self {
        frame.data
    }
}

/// デコーダーの制限設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderLimits {
    /// 最大フレームサイズ (デフォルト: 16MB)
    ///
    /// これを超える Content-Length が宣言されたフレームは組み立てずに破棄する。
    pub max_frame_size: usize,
    /// チャンク間で持ち越す長さマーカーの最大サイズ (デフォルト: 1KB)
    pub max_carry_size: usize,
    /// フレーム完了後に同じチャンクを再走査する最大回数 (デフォルト: 1)
    ///
    /// 1 の場合、1 チャンクに詰め込まれた 3 つ目以降のフレームは開始しない。
    pub max_rescans_per_chunk: usize,
}

impl Default for DecoderLimits {
    fn default() -> Self {
        Self {
            max_frame_size: 16 * 1024 * 1024, // 16MB
            max_carry_size: 1024,             // 1KB
            max_rescans_per_chunk: 1,
        }
    }
}

impl DecoderLimits {
    /// 制限なしの設定を作成
    pub fn unlimited() -> Self {
        Self {
            max_frame_size: usize::MAX,
            max_carry_size: usize::MAX,
            max_rescans_per_chunk: usize::MAX,
        }
    }
}

use std::fmt;

/// フレームを破棄した理由
///
/// デコーダーはこれらを致命的なエラーとして扱わず、破棄したうえで次のフレームの検出を続ける。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// 完了するはずのチャンクに EOI がなかった
    MissingEoi { declared: usize, written: usize },
    /// 宣言された長さが上限を超えている
    FrameTooLarge { declared: usize, limit: usize },
    /// フレームバッファを確保できなかった
    AllocationFailed { declared: usize },
    /// 1 チャンク内の再走査回数の上限に達したため開始しなかった
    RescanLimit { declared: usize },
    /// ストリームの終端で組み立て途中だった
    StreamEnded { declared: usize, written: usize },
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::MissingEoi { declared, written } => {
                write!(f, "missing EOI: {} of {} bytes", written, declared)
            }
            DropReason::FrameTooLarge { declared, limit } => {
                write!(f, "frame too large: {} > {}", declared, limit)
            }
            DropReason::AllocationFailed { declared } => {
                write!(f, "allocation failed: {} bytes", declared)
            }
            DropReason::RescanLimit { declared } => {
                write!(f, "rescan limit reached: {} bytes frame skipped", declared)
            }
            DropReason::StreamEnded { declared, written } => {
                write!(f, "stream ended: {} of {} bytes", written, declared)
            }
        }
    }
}

impl std::error::Error for DropReason {}

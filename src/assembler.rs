//! フレーム組み立て (内部用)
//!
//! 組み立て中のフレームバッファを所有し、開始・追記・送出を行う。
//! どのチャンクのどこから読むかは呼び出し側 (MjpegDecoder) が決める。

use std::collections::VecDeque;

use crate::error::DropReason;
use crate::frame::Frame;

/// 組み立て状態
#[derive(Debug)]
enum AssemblyState {
    /// 組み立て中のフレームなし
    Idle,
    /// バッファが存在し、続きのバイトを待っている
    Assembling(InProgressFrame),
}

#[derive(Debug)]
struct InProgressFrame {
    /// 宣言された長さちょうどの容量を確保したバッファ
    buffer: Vec<u8>,
    declared: usize,
    /// SOI を読んだかどうか
    ///
    /// 長さマーカーより後のチャンクで SOI が届く場合は false のまま組み立てを開始する。
    soi_seen: bool,
}

/// 組み立て中フレームの状態 (読み取り専用)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InProgress {
    pub declared: usize,
    pub written: usize,
    pub soi_seen: bool,
    /// バッファ末尾が 0xFF (チャンク境界で EOI が分割されている可能性)
    pub ends_with_ff: bool,
}

/// begin_frame / append_to_frame の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Progress {
    /// 続きのチャンクが必要
    Assembling,
    /// フレームを送出した
    ///
    /// `end` は渡されたチャンク内でフレームが終わった位置。
    Completed { end: usize },
}

#[derive(Debug)]
pub(crate) struct FrameAssembler {
    state: AssemblyState,
    ready: VecDeque<Frame>,
    next_sequence: u64,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self {
            state: AssemblyState::Idle,
            ready: VecDeque::new(),
            next_sequence: 0,
        }
    }

    pub fn is_assembling(&self) -> bool {
        matches!(self.state, AssemblyState::Assembling(_))
    }

    pub fn in_progress(&self) -> Option<InProgress> {
        match &self.state {
            AssemblyState::Idle => None,
            AssemblyState::Assembling(frame) => Some(InProgress {
                declared: frame.declared,
                written: frame.buffer.len(),
                soi_seen: frame.soi_seen,
                ends_with_ff: frame.buffer.last() == Some(&0xFF),
            }),
        }
    }

    /// 新しいフレームを開始
    ///
    /// `soi` があればそこからチャンク末尾 (または `eoi_end`) までをコピーする。
    /// SOI と EOI が両方このチャンクにあれば、その場で送出して Idle に戻る。
    /// SOI がなければ空のバッファで組み立てを開始する。
    pub fn begin_frame(
        &mut self,
        declared: usize,
        chunk: &[u8],
        soi: Option<usize>,
        eoi_end: Option<usize>,
    ) -> Result<Progress, DropReason> {
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(declared)
            .map_err(|_| DropReason::AllocationFailed { declared })?;

        let Some(start) = soi else {
            self.state = AssemblyState::Assembling(InProgressFrame {
                buffer,
                declared,
                soi_seen: false,
            });
            return Ok(Progress::Assembling);
        };

        let end = match eoi_end {
            Some(eoi_end) if eoi_end > start => Some(eoi_end),
            _ => None,
        };
        copy_clamped(&mut buffer, declared, &chunk[start..end.unwrap_or(chunk.len())]);

        if let Some(end) = end {
            self.emit(buffer, declared);
            return Ok(Progress::Completed { end });
        }

        self.state = AssemblyState::Assembling(InProgressFrame {
            buffer,
            declared,
            soi_seen: true,
        });
        Ok(Progress::Assembling)
    }

    /// 組み立て中のフレームに追記
    ///
    /// `chunk[start..]` を `eoi_end` (あればそこまで) または末尾までコピーする。
    /// EOI を読んだか、宣言された長さに達したら送出して Idle に戻る。
    ///
    /// 組み立て中でなければ何もしない (デバッグビルドではパニックする)。
    pub fn append_to_frame(&mut self, chunk: &[u8], start: usize, eoi_end: Option<usize>) -> Progress {
        let AssemblyState::Assembling(frame) = &mut self.state else {
            debug_assert!(false, "append_to_frame called while idle");
            return Progress::Assembling;
        };

        let end = eoi_end.unwrap_or(chunk.len()).max(start);
        let copied = copy_clamped(&mut frame.buffer, frame.declared, &chunk[start..end]);
        frame.soi_seen = true;

        let complete = eoi_end.is_some() || frame.buffer.len() == frame.declared;
        if !complete {
            return Progress::Assembling;
        }

        let consumed = match eoi_end {
            Some(eoi_end) => eoi_end,
            None => start + copied,
        };
        if let AssemblyState::Assembling(frame) =
            std::mem::replace(&mut self.state, AssemblyState::Idle)
        {
            self.emit(frame.buffer, frame.declared);
        }
        Progress::Completed { end: consumed }
    }

    /// 組み立て中のフレームを送出せずに捨てる
    ///
    /// 捨てたフレームの (宣言された長さ, 書き込み済みバイト数) を返す。
    pub fn discard(&mut self) -> Option<(usize, usize)> {
        match std::mem::replace(&mut self.state, AssemblyState::Idle) {
            AssemblyState::Idle => None,
            AssemblyState::Assembling(frame) => Some((frame.declared, frame.buffer.len())),
        }
    }

    /// 完成したバッファを送出キューへ渡す
    ///
    /// EOI が宣言より早く来た場合は 0 で埋めて宣言された長さに揃える。
    fn emit(&mut self, mut buffer: Vec<u8>, declared: usize) {
        buffer.resize(declared, 0);
        let frame = Frame::new(self.next_sequence, buffer);
        self.next_sequence += 1;
        self.ready.push_back(frame);
    }

    pub fn next_frame(&mut self) -> Option<Frame> {
        self.ready.pop_front()
    }

    pub fn pending_frames(&self) -> usize {
        self.ready.len()
    }
}

/// 宣言された長さを超えない範囲でコピーし、コピーしたバイト数を返す
fn copy_clamped(buffer: &mut Vec<u8>, declared: usize, bytes: &[u8]) -> usize {
    let room = declared.saturating_sub(buffer.len());
    let len = bytes.len().min(room);
    buffer.extend_from_slice(&bytes[..len]);
    len
}

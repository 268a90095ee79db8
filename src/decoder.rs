//! MJPEG フレームデコーダー (Sans I/O)
//!
//! 任意の位置で区切られたチャンクを順番に受け取り、
//! `Content-Length` マーカーと SOI / EOI を手がかりに JPEG フレームを 1 枚ずつ取り出す。

use crate::assembler::{FrameAssembler, Progress};
use crate::error::DropReason;
use crate::frame::Frame;
use crate::limits::DecoderLimits;
use crate::scanner::{EOI, LengthMarker, SOI, find_eoi, find_soi, scan_length_marker};

/// デコーダーの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// 組み立て中のフレームなし
    Idle,
    /// フレームを組み立て中
    Assembling { declared: usize, written: usize },
}

/// 1 チャンク分の処理結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedOutcome {
    /// このチャンクで完成したフレーム数
    pub emitted: usize,
    /// このチャンクで破棄したフレーム
    pub dropped: Vec<DropReason>,
}

/// デコーダーの累計統計
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// 受け取ったチャンク数
    pub chunks: u64,
    /// 受け取ったバイト数
    pub bytes: u64,
    /// 完成したフレーム数
    pub frames_emitted: u64,
    /// 破棄したフレーム数
    pub frames_dropped: u64,
}

/// 組み立て中フレームの再開結果
enum Resume {
    /// フレームはまだ完成していない
    Pending,
    /// フレームが `end` で完成した
    Completed { end: usize },
    /// EOI がなかったので破棄した
    Dropped,
}

/// MJPEG フレームデコーダー
///
/// ## 使い方
///
/// ```rust
/// use shiguredo_mjpeg::MjpegDecoder;
///
/// let mut decoder = MjpegDecoder::new();
/// decoder.feed(b"Content-Length: 4\r\n\r\n\xFF\xD8");
/// decoder.feed(b"\xFF\xD9");
///
/// let frame = decoder.next_frame().unwrap();
/// assert_eq!(frame.data(), b"\xFF\xD8\xFF\xD9");
/// ```
#[derive(Debug)]
pub struct MjpegDecoder {
    assembler: FrameAssembler,
    /// 次のチャンクの先頭に連結する未解釈のバイト列
    ///
    /// チャンク境界で分割された長さマーカー、または SOI の先頭 1 バイト。
    carry: Vec<u8>,
    limits: DecoderLimits,
    stats: DecoderStats,
}

impl Default for MjpegDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MjpegDecoder {
    /// 新しいデコーダーを作成
    pub fn new() -> Self {
        Self::with_limits(DecoderLimits::default())
    }

    /// 制限付きでデコーダーを作成
    pub fn with_limits(limits: DecoderLimits) -> Self {
        Self {
            assembler: FrameAssembler::new(),
            carry: Vec::new(),
            limits,
            stats: DecoderStats::default(),
        }
    }

    /// 制限設定を取得
    pub fn limits(&self) -> &DecoderLimits {
        &self.limits
    }

    /// 累計統計を取得
    pub fn stats(&self) -> &DecoderStats {
        &self.stats
    }

    /// 現在の状態を取得
    pub fn state(&self) -> DecoderState {
        match self.assembler.in_progress() {
            None => DecoderState::Idle,
            Some(frame) => DecoderState::Assembling {
                declared: frame.declared,
                written: frame.written,
            },
        }
    }

    /// フレームを組み立て中かどうか
    pub fn is_assembling(&self) -> bool {
        self.assembler.is_assembling()
    }

    /// 取り出し待ちのフレーム数
    pub fn pending_frames(&self) -> usize {
        self.assembler.pending_frames()
    }

    /// 完成したフレームを到着順に取り出す
    pub fn next_frame(&mut self) -> Option<Frame> {
        self.assembler.next_frame()
    }

    /// チャンクを 1 つ処理する
    ///
    /// 破損したフレームはエラーにせず破棄し、次のフレームの検出を続ける。
    /// 破棄したフレームは戻り値の `dropped` で確認できる。
    pub fn feed(&mut self, chunk: &[u8]) -> FeedOutcome {
        self.stats.chunks += 1;
        self.stats.bytes += chunk.len() as u64;

        let pending_before = self.assembler.pending_frames();
        let mut outcome = FeedOutcome::default();

        let joined;
        let window: &[u8] = if self.carry.is_empty() {
            chunk
        } else {
            let mut buf = std::mem::take(&mut self.carry);
            buf.extend_from_slice(chunk);
            joined = buf;
            &joined
        };

        let mut pos = 0;
        let mut after_completion = false;
        let mut scan = true;

        if self.assembler.is_assembling() {
            match self.resume_frame(window, &mut outcome) {
                Resume::Pending => scan = false,
                Resume::Completed { end } => {
                    pos = end;
                    after_completion = true;
                }
                Resume::Dropped => {}
            }
        }

        if scan {
            self.scan_frames(window, pos, after_completion, &mut outcome);
        }

        outcome.emitted = self.assembler.pending_frames() - pending_before;
        self.stats.frames_emitted += outcome.emitted as u64;
        self.stats.frames_dropped += outcome.dropped.len() as u64;
        outcome
    }

    /// ストリームの終端を通知する
    ///
    /// 組み立て途中のフレームは送出せずに破棄する。
    pub fn finish(&mut self) -> Option<DropReason> {
        self.carry.clear();
        let (declared, written) = self.assembler.discard()?;
        self.stats.frames_dropped += 1;
        Some(DropReason::StreamEnded { declared, written })
    }

    /// デコーダーをリセット
    ///
    /// 組み立て中のフレームと取り出し待ちのフレームはすべて破棄する。
    pub fn reset(&mut self) {
        self.assembler = FrameAssembler::new();
        self.carry.clear();
        self.stats = DecoderStats::default();
    }

    /// 組み立て中のフレームにチャンクを渡す
    fn resume_frame(&mut self, window: &[u8], outcome: &mut FeedOutcome) -> Resume {
        let Some(frame) = self.assembler.in_progress() else {
            return Resume::Dropped;
        };

        // SOI より前のバイトは読み飛ばす
        let start = if frame.soi_seen {
            0
        } else {
            let soi = find_soi(window);
            // SOI より先に次のフレームの長さマーカーが来た
            if next_marker_precedes(window, soi) {
                self.drop_in_progress(outcome);
                return Resume::Dropped;
            }
            match soi {
                Some(soi) => soi,
                None => {
                    self.carry_awaiting_soi(window);
                    return Resume::Pending;
                }
            }
        };

        let available = window.len() - start;
        let expected = frame.written.saturating_add(available) >= frame.declared;

        let eoi_end = if !expected {
            None
        } else if frame.soi_seen && frame.ends_with_ff && window.first() == Some(&EOI[1]) {
            // チャンク境界で分割された EOI
            Some(1)
        } else {
            let from = if frame.soi_seen { 0 } else { start + SOI.len() };
            find_eoi(&window[from..]).map(|eoi| from + eoi + EOI.len())
        };

        if expected && eoi_end.is_none() {
            self.drop_in_progress(outcome);
            return Resume::Dropped;
        }

        match self.assembler.append_to_frame(window, start, eoi_end) {
            Progress::Completed { end } => Resume::Completed { end },
            Progress::Assembling => Resume::Pending,
        }
    }

    /// `window[pos..]` から新しいフレームを探して開始する
    ///
    /// フレームが完成した後の再走査は `max_rescans_per_chunk` 回までに制限する。
    fn scan_frames(
        &mut self,
        window: &[u8],
        mut pos: usize,
        mut after_completion: bool,
        outcome: &mut FeedOutcome,
    ) {
        let mut rescans = 0;

        loop {
            let rest = &window[pos..];
            let (declared, end) = match scan_length_marker(rest) {
                LengthMarker::Absent => return,
                LengthMarker::Partial { start } => {
                    self.carry_partial(&rest[start..]);
                    return;
                }
                LengthMarker::Found { value: None, .. } => return,
                LengthMarker::Found {
                    value: Some(declared),
                    end,
                    ..
                } => (declared, end),
            };

            if after_completion {
                if rescans >= self.limits.max_rescans_per_chunk {
                    outcome.dropped.push(DropReason::RescanLimit { declared });
                    return;
                }
                rescans += 1;
            }

            if declared > self.limits.max_frame_size {
                outcome.dropped.push(DropReason::FrameTooLarge {
                    declared,
                    limit: self.limits.max_frame_size,
                });
                return;
            }

            let body = &rest[end..];
            let soi = find_soi(body);

            // SOI より先に次の長さマーカーがあるならこのフレームは始まらない
            if next_marker_precedes(body, soi) {
                outcome.dropped.push(DropReason::MissingEoi {
                    declared,
                    written: 0,
                });
                pos += end;
                continue;
            }

            let eoi_end = soi.and_then(|soi| {
                let from = soi + SOI.len();
                find_eoi(&body[from..]).map(|eoi| from + eoi + EOI.len())
            });

            match self.assembler.begin_frame(declared, body, soi, eoi_end) {
                Ok(Progress::Completed { end: frame_end }) => {
                    pos += end + frame_end;
                    after_completion = true;
                }
                Ok(Progress::Assembling) => {
                    if soi.is_none() {
                        self.carry_awaiting_soi(body);
                    }
                    return;
                }
                Err(reason) => {
                    outcome.dropped.push(reason);
                    return;
                }
            }
        }
    }

    /// 組み立て中のフレームを EOI なしとして破棄する
    fn drop_in_progress(&mut self, outcome: &mut FeedOutcome) {
        if let Some((declared, written)) = self.assembler.discard() {
            outcome
                .dropped
                .push(DropReason::MissingEoi { declared, written });
        }
    }

    /// チャンク末尾で途切れた長さマーカーを持ち越す
    fn carry_partial(&mut self, partial: &[u8]) {
        if partial.len() <= self.limits.max_carry_size {
            self.carry.extend_from_slice(partial);
        }
    }

    /// SOI 待ちのチャンク末尾を持ち越す
    ///
    /// 途切れた長さマーカー、または SOI の前半の 0xFF。
    fn carry_awaiting_soi(&mut self, bytes: &[u8]) {
        if let LengthMarker::Partial { start } = scan_length_marker(bytes) {
            self.carry_partial(&bytes[start..]);
        } else if bytes.last() == Some(&SOI[0]) {
            self.carry.push(SOI[0]);
        }
    }
}

/// `bytes` の中で SOI より前に完全な長さマーカーがあるか
fn next_marker_precedes(bytes: &[u8], soi: Option<usize>) -> bool {
    match scan_length_marker(bytes) {
        LengthMarker::Found { start, .. } => soi.is_none_or(|soi| start < soi),
        LengthMarker::Partial { .. } | LengthMarker::Absent => false,
    }
}

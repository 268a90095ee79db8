//! マーカー検出
//!
//! チャンク中の SOI / EOI バイト列と `Content-Length: <digits>` マーカーを探す。
//! すべて状態を持たない純粋な関数で、同じチャンクに対して何度呼び出してもよい。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_mjpeg::scanner::{find_content_length, find_eoi, find_soi};
//!
//! let chunk = b"Content-Length: 4\r\n\r\n\xFF\xD8\xFF\xD9";
//! assert_eq!(find_content_length(chunk), Some(4));
//! assert_eq!(find_soi(chunk), Some(21));
//! assert_eq!(find_eoi(chunk), Some(23));
//! ```

/// Start Of Image
pub const SOI: [u8; 2] = [0xFF, 0xD8];

/// End Of Image
pub const EOI: [u8; 2] = [0xFF, 0xD9];

/// 長さマーカーの名前部分 (小文字で比較する)
const LENGTH_MARKER_NAME: &[u8] = b"content-length:";

/// SOI の位置を探す
pub fn find_soi(chunk: &[u8]) -> Option<usize> {
    find_marker(chunk, &SOI)
}

/// EOI の位置を探す
pub fn find_eoi(chunk: &[u8]) -> Option<usize> {
    find_marker(chunk, &EOI)
}

/// 最初の `Content-Length:` マーカーの値を取得
///
/// 大文字小文字は区別しない。コロンの後の空白は省略可能で、1 桁以上の ASCII 数字が必要。
/// 数字がない出現はスキップして次の出現を探す。
/// 値が usize に収まらない場合やマーカーがない場合は `None` を返す。
pub fn find_content_length(chunk: &[u8]) -> Option<usize> {
    let mut from = 0;
    while let Some(start) = find_name(&chunk[from..]).map(|i| from + i) {
        match match_marker_at(chunk, start) {
            MarkerMatch::Digits { value, .. } => return value,
            MarkerMatch::NoDigits | MarkerMatch::Truncated => {
                from = start + LENGTH_MARKER_NAME.len();
            }
        }
    }
    None
}

/// 長さマーカーの走査結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthMarker {
    /// 数字の後に区切りのバイトがある完全なマーカー
    ///
    /// `value` は値が usize に収まらない場合 `None`。
    /// `start` はマーカー先頭、`end` は数字の直後の位置。
    Found {
        value: Option<usize>,
        start: usize,
        end: usize,
    },
    /// ウィンドウ末尾で途切れているマーカー (またはその接頭辞)
    ///
    /// 次のチャンクと連結すれば完全なマーカーになる可能性がある。
    Partial { start: usize },
    /// マーカーなし
    Absent,
}

/// チャンク境界をまたぐ可能性を考慮して長さマーカーを走査する
///
/// `find_content_length` と同じく最初のマーカーだけを扱うが、
/// 数字がウィンドウ末尾まで続いている場合は値が確定しないため `Partial` を返す。
pub fn scan_length_marker(window: &[u8]) -> LengthMarker {
    let mut from = 0;
    while let Some(start) = find_name(&window[from..]).map(|i| from + i) {
        match match_marker_at(window, start) {
            MarkerMatch::Digits {
                value,
                end,
                terminated: true,
            } => return LengthMarker::Found { value, start, end },
            MarkerMatch::Digits {
                terminated: false, ..
            }
            | MarkerMatch::Truncated => return LengthMarker::Partial { start },
            MarkerMatch::NoDigits => {
                from = start + LENGTH_MARKER_NAME.len();
            }
        }
    }

    // 末尾がマーカー名の途中で切れているか
    let longest = (LENGTH_MARKER_NAME.len() - 1).min(window.len());
    for len in (1..=longest).rev() {
        let suffix = &window[window.len() - len..];
        if suffix.eq_ignore_ascii_case(&LENGTH_MARKER_NAME[..len]) {
            return LengthMarker::Partial {
                start: window.len() - len,
            };
        }
    }

    LengthMarker::Absent
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerMatch {
    Digits {
        value: Option<usize>,
        end: usize,
        terminated: bool,
    },
    /// 空白の後に数字以外が続いた
    NoDigits,
    /// 空白の途中でウィンドウが終わった
    Truncated,
}

/// `start` にあるマーカー名の後ろを読む
fn match_marker_at(window: &[u8], start: usize) -> MarkerMatch {
    let mut pos = start + LENGTH_MARKER_NAME.len();
    while pos < window.len() && is_whitespace(window[pos]) {
        pos += 1;
    }
    if pos == window.len() {
        return MarkerMatch::Truncated;
    }

    let digits_start = pos;
    let mut value: Option<usize> = Some(0);
    while pos < window.len() && window[pos].is_ascii_digit() {
        let digit = (window[pos] - b'0') as usize;
        value = value
            .and_then(|v| v.checked_mul(10))
            .and_then(|v| v.checked_add(digit));
        pos += 1;
    }
    if pos == digits_start {
        return MarkerMatch::NoDigits;
    }

    MarkerMatch::Digits {
        value,
        end: pos,
        terminated: pos < window.len(),
    }
}

/// マーカー名を大文字小文字を区別せずに探す
fn find_name(haystack: &[u8]) -> Option<usize> {
    if LENGTH_MARKER_NAME.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(LENGTH_MARKER_NAME.len())
        .position(|window| window.eq_ignore_ascii_case(LENGTH_MARKER_NAME))
}

fn find_marker(haystack: &[u8], marker: &[u8; 2]) -> Option<usize> {
    haystack.windows(2).position(|window| window == marker)
}

/// `\s` 相当の ASCII 空白
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_soi_eoi() {
        let chunk = [0x00, 0xFF, 0xD8, 0x01, 0xFF, 0xD9];
        assert_eq!(find_soi(&chunk), Some(1));
        assert_eq!(find_eoi(&chunk), Some(4));
        assert_eq!(find_soi(&[0xFF]), None);
        assert_eq!(find_eoi(&[]), None);
    }

    #[test]
    fn test_find_content_length() {
        assert_eq!(find_content_length(b"Content-Length: 1234\r\n"), Some(1234));
        assert_eq!(find_content_length(b"content-length:42"), Some(42));
        assert_eq!(find_content_length(b"CONTENT-LENGTH:\t\r\n 7"), Some(7));
        assert_eq!(find_content_length(b"Content-Type: image/jpeg"), None);
        assert_eq!(find_content_length(b""), None);
    }

    #[test]
    fn test_find_content_length_skips_malformed_occurrence() {
        let chunk = b"Content-Length: abc\r\nContent-Length: 10\r\n";
        assert_eq!(find_content_length(chunk), Some(10));
    }

    #[test]
    fn test_find_content_length_overflow() {
        let chunk = b"Content-Length: 99999999999999999999999999\r\n";
        assert_eq!(find_content_length(chunk), None);
    }

    #[test]
    fn test_find_content_length_first_match_only() {
        let chunk = b"Content-Length: 1\r\nContent-Length: 2\r\n";
        assert_eq!(find_content_length(chunk), Some(1));
    }

    #[test]
    fn test_scan_found() {
        let window = b"--b\r\nContent-Length: 12\r\n\r\n";
        assert_eq!(
            scan_length_marker(window),
            LengthMarker::Found {
                value: Some(12),
                start: 5,
                end: 23,
            }
        );
    }

    #[test]
    fn test_scan_partial_digits() {
        // 数字の続きが次のチャンクにあるかもしれない
        assert_eq!(
            scan_length_marker(b"xxContent-Length: 12"),
            LengthMarker::Partial { start: 2 }
        );
        assert_eq!(
            scan_length_marker(b"Content-Length:  "),
            LengthMarker::Partial { start: 0 }
        );
    }

    #[test]
    fn test_scan_partial_name() {
        assert_eq!(
            scan_length_marker(b"\r\nConten"),
            LengthMarker::Partial { start: 2 }
        );
        assert_eq!(
            scan_length_marker(b"abc\r\nc"),
            LengthMarker::Partial { start: 5 }
        );
    }

    #[test]
    fn test_scan_absent() {
        assert_eq!(scan_length_marker(b""), LengthMarker::Absent);
        assert_eq!(scan_length_marker(b"\xFF\xD8\x00\x01"), LengthMarker::Absent);
        assert_eq!(
            scan_length_marker(b"Content-Length: x"),
            LengthMarker::Absent
        );
    }
}

#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_mjpeg::scanner::{
    EOI, LengthMarker, SOI, find_content_length, find_eoi, find_soi, scan_length_marker,
};

fuzz_target!(|data: &[u8]| {
    if let Some(pos) = find_soi(data) {
        assert_eq!(&data[pos..pos + 2], &SOI[..]);
    }
    if let Some(pos) = find_eoi(data) {
        assert_eq!(&data[pos..pos + 2], &EOI[..]);
    }

    let _ = find_content_length(data);

    match scan_length_marker(data) {
        LengthMarker::Found { value, start, end } => {
            assert!(start < end);
            assert!(end < data.len());
            // 区切りまで揃っていれば find_content_length と同じ値になる
            if value.is_some() {
                assert_eq!(find_content_length(data), value);
            }
        }
        LengthMarker::Partial { start } => assert!(start < data.len()),
        LengthMarker::Absent => {}
    }
});

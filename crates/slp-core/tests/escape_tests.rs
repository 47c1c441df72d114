//! Escaping codec tests

use slp_core::{escape, unescape, ErrorKind};

fn samples() -> Vec<String> {
    let mut samples: Vec<String> = vec![
        String::new(),
        ",tag-example,".to_string(),
        "plain".to_string(),
        "(a=b),(c=d)".to_string(),
        "back\\slash".to_string(),
        "  padded tag  ".to_string(),
        "under_score*star".to_string(),
        "~<>=!".to_string(),
        "caf\u{e9} \u{1F5A8}".to_string(),
        "\\2C already escaped".to_string(),
    ];
    // Every single ASCII character, control characters included
    samples.extend((0u8..=0x7F).map(|b| (b as char).to_string()));
    samples.push((0u8..=0x7F).map(|b| b as char).collect());
    samples
}

#[test]
fn test_round_trip_values_and_tags() {
    for s in samples() {
        for is_tag in [false, true] {
            let escaped = escape(&s, is_tag);
            let back = unescape(&escaped, is_tag).unwrap();
            assert_eq!(back, s, "round trip failed for {:?} (is_tag={})", s, is_tag);
        }
    }
}

#[test]
fn test_escaped_output_has_no_reserved_bytes() {
    let all: String = (0u8..=0x7F).map(|b| b as char).collect();
    let escaped = escape(&all, true);

    // Only the escape character itself may remain, always followed by two hex digits
    let bytes = escaped.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' {
            assert!(bytes[i + 1].is_ascii_hexdigit());
            assert!(bytes[i + 2].is_ascii_hexdigit());
            i += 3;
            continue;
        }
        assert!(!b",()!<=>~*_ ".contains(&b), "unescaped reserved byte {:?}", b as char);
        assert!(!b.is_ascii_control());
        i += 1;
    }
}

#[test]
fn test_known_vectors() {
    assert_eq!(escape(",tag-example,", true), "\\2Ctag-example\\2C");
    assert_eq!(unescape("\\2Ctag-example\\2C", true).unwrap(), ",tag-example,");
    assert_eq!(escape("a=b", false), "a\\3Db");
    assert_eq!(escape("\\", false), "\\5C");
}

#[test]
fn test_unescape_ignores_tag_flag() {
    let escaped = "\\2A\\5F\\20";
    assert_eq!(unescape(escaped, true).unwrap(), "*_ ");
    assert_eq!(unescape(escaped, false).unwrap(), "*_ ");
}

#[test]
fn test_unescape_errors_are_parse_errors() {
    for bad in ["\\", "\\4", "\\G0", "x\\0", "\\-1"] {
        let err = unescape(bad, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError, "input {:?}", bad);
        assert_eq!(err.operation(), "unescape");
    }
}

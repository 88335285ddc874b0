//! Tests for response decoding.

use std::io::{self, Read, Write};

use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
use flate2::Compression;
use pretty_assertions::assert_eq;
use strider_core::{RawResponse, Response};

const PAGE: &str = "<html><body><h1>Compressed</h1></body></html>";

fn raw(status: u16, headers: &[(&str, &str)], body: Option<Vec<u8>>) -> RawResponse {
    RawResponse {
        status,
        headers: headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        body: body.map(|b| Box::new(io::Cursor::new(b)) as Box<dyn Read + Send>),
    }
}

struct BrokenStream;

impl Read for BrokenStream {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
    }
}

#[test]
fn test_status_base() {
    for (status, base) in [(101, 100), (200, 200), (204, 200), (302, 300), (404, 400), (503, 500)] {
        let response = Response::from_raw(raw(status, &[], None));
        assert_eq!(response.status_base(), base, "status {status}");
    }
    assert!(Response::from_raw(raw(307, &[], None)).is_redirect());
    assert!(!Response::from_raw(raw(200, &[], None)).is_redirect());
}

#[test]
fn test_metadata_headers() {
    let response = Response::from_raw(raw(
        301,
        &[
            ("location", "/moved"),
            ("ETag", "\"abc\""),
            ("Last-Modified", "Wed, 02 Sep 2026 08:00:00 GMT"),
        ],
        Some(Vec::new()),
    ));
    assert_eq!(response.location.as_deref(), Some("/moved"));
    assert_eq!(response.etag.as_deref(), Some("\"abc\""));
    assert_eq!(
        response.last_modified.as_deref(),
        Some("Wed, 02 Sep 2026 08:00:00 GMT")
    );
    assert_eq!(response.header("LOCATION"), Some("/moved"));
}

#[test]
fn test_location_falls_back_to_content_location() {
    let response = Response::from_raw(raw(200, &[("Content-Location", "/canonical")], None));
    assert_eq!(response.location.as_deref(), Some("/canonical"));
}

#[test]
fn test_gzip_body_is_decompressed() {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(PAGE.as_bytes()).unwrap();
    let body = encoder.finish().unwrap();

    let response = Response::from_raw(raw(200, &[("Content-Encoding", "gzip")], Some(body)));
    assert_eq!(response.body(), PAGE);
}

#[test]
fn test_deflate_body_is_decompressed_zlib_or_raw() {
    let mut zlib = ZlibEncoder::new(Vec::new(), Compression::default());
    zlib.write_all(PAGE.as_bytes()).unwrap();
    let response = Response::from_raw(raw(
        200,
        &[("Content-Encoding", "deflate")],
        Some(zlib.finish().unwrap()),
    ));
    assert_eq!(response.body(), PAGE);

    let mut deflate = DeflateEncoder::new(Vec::new(), Compression::default());
    deflate.write_all(PAGE.as_bytes()).unwrap();
    let response = Response::from_raw(raw(
        200,
        &[("Content-Encoding", "deflate")],
        Some(deflate.finish().unwrap()),
    ));
    assert_eq!(response.body(), PAGE);
}

#[test]
fn test_missing_body_is_absent() {
    let response = Response::from_raw(raw(204, &[], None));
    assert_eq!(response.body, None);
    assert_eq!(response.body(), "");
}

#[test]
fn test_unreadable_body_is_absent() {
    let response = Response::from_raw(RawResponse {
        status: 200,
        headers: Vec::new(),
        body: Some(Box::new(BrokenStream)),
    });
    assert_eq!(response.status, 200);
    assert_eq!(response.body, None);
}

#[test]
fn test_charset_decoding() {
    let latin1 = Response::from_raw(raw(
        200,
        &[("Content-Type", "text/html; charset=ISO-8859-1")],
        Some(vec![b'c', b'a', b'f', 0xE9]),
    ));
    assert_eq!(latin1.charset, "windows-1252");
    assert_eq!(latin1.body(), "café");

    let utf8 = Response::from_raw(raw(
        200,
        &[("Content-Type", "text/html; charset=\"utf-8\"")],
        Some("café".as_bytes().to_vec()),
    ));
    assert_eq!(utf8.charset, "UTF-8");
    assert_eq!(utf8.body(), "café");
}

#[test]
fn test_windows_1252_uses_its_own_upper_range() {
    let response = Response::from_raw(raw(
        200,
        &[("Content-Type", "text/html; charset=windows-1252")],
        Some(vec![0x80, b'5']),
    ));
    assert_eq!(response.body.as_deref(), Some("€5"));
}

#[test]
fn test_multibyte_charset_decoding() {
    let response = Response::from_raw(raw(
        200,
        &[("Content-Type", "text/html; charset=Shift_JIS")],
        Some(vec![0x93, 0xFA, 0x96, 0x7B]),
    ));
    assert_eq!(response.charset, "Shift_JIS");
    assert_eq!(response.body(), "日本");
}

#[test]
fn test_unknown_or_missing_charset_falls_back_to_utf8() {
    for content_type in ["text/html; charset=x-made-up", "text/html"] {
        let response = Response::from_raw(raw(
            200,
            &[("Content-Type", content_type)],
            Some("naïve".as_bytes().to_vec()),
        ));
        assert_eq!(response.charset, "UTF-8", "{content_type}");
        assert_eq!(response.body(), "naïve");
    }
}

#[test]
fn test_repeated_headers_are_kept() {
    let response = Response::from_raw(raw(
        200,
        &[("Set-Cookie", "a=1"), ("Set-Cookie", "b=2")],
        None,
    ));
    assert_eq!(
        response.header_values("set-cookie").collect::<Vec<_>>(),
        vec!["a=1", "b=2"]
    );
}

#[test]
fn test_response_renders_as_raw_http() {
    let response = Response::from_raw(raw(
        200,
        &[("Content-Type", "text/plain")],
        Some(b"hello".to_vec()),
    ));
    assert_eq!(
        response.to_string(),
        "HTTP/1.1 200\nContent-Type: text/plain\n\nhello"
    );
}

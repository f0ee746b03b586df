// HTTP message helpers for scripted requests and raw response inspection
mod request;
mod response;
pub use request::HttpRequest;
pub use response::HttpResponse;

pub fn find_hdr_end(d: &[u8]) -> Option<usize> {
    find_bytes(d, b"\r\n\r\n")
}

pub fn get_hdr<'a>(h: &'a [(String, String)], n: &str) -> Option<&'a str> {
    for (k, v) in h {
        if k.eq_ignore_ascii_case(n) { return Some(v.as_str()); }
    }
    None
}

/// Position of the first occurrence of `needle` in `hay`.
pub fn find_bytes(hay: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() { return Some(0); }
    if hay.len() < needle.len() { return None; }
    hay.windows(needle.len()).position(|w| w == needle)
}

pub fn contains_bytes(hay: &[u8], needle: &[u8]) -> bool {
    find_bytes(hay, needle).is_some()
}

/// Case-insensitive (ASCII) substring test over raw bytes.
pub fn contains_ignore_case(hay: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() { return true; }
    if hay.len() < needle.len() { return false; }
    hay.windows(needle.len()).any(|w| w.eq_ignore_ascii_case(needle))
}

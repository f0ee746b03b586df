// Response parsing for the reference fetch
use super::{find_hdr_end, get_hdr};

#[derive(Clone)]
pub struct HttpResponse {
    pub version: String,
    pub status_code: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn parse(r: &[u8]) -> Option<Self> {
        let e = find_hdr_end(r)?;
        let t = std::str::from_utf8(&r[..e]).ok()?;
        let mut l = t.lines();
        let sl = l.next()?;
        let (v, rest) = sl.split_once(' ')?;
        let (cs, txt) = rest.split_once(' ').unwrap_or((rest, ""));
        let c: u16 = cs.parse().ok()?;
        let mut h = Vec::new();
        for ln in l {
            if ln.is_empty() { break; }
            if let Some((k, val)) = ln.split_once(':') {
                h.push((k.trim().to_string(), val.trim().to_string()));
            }
        }
        let s = e + 4;
        let b = if s < r.len() { r[s..].to_vec() } else { Vec::new() };
        Some(HttpResponse { version: v.to_string(), status_code: c, status_text: txt.to_string(), headers: h, body: b })
    }

    pub fn get_header(&self, n: &str) -> Option<&str> {
        get_hdr(&self.headers, n)
    }

    /// Body trimmed to `Content-Length` when the header is present and sane.
    pub fn declared_body(&self) -> &[u8] {
        match self.get_header("Content-Length").and_then(|v| v.parse::<usize>().ok()) {
            Some(n) if n <= self.body.len() => &self.body[..n],
            _ => &self.body,
        }
    }
}

// Scripted request construction

/// A request line plus headers, serialized verbatim. Nothing is validated:
/// scenarios deliberately build malformed requests (bad versions, unknown
/// methods) with this type.
#[derive(Clone)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub version: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn new(method: &str, path: &str, version: &str, host: &str) -> Self {
        HttpRequest {
            method: method.to_string(),
            path: path.to_string(),
            version: version.to_string(),
            headers: vec![("Host".to_string(), host.to_string())],
        }
    }

    pub fn get(path: &str, host: &str) -> Self {
        Self::new("GET", path, "HTTP/1.1", host)
    }

    pub fn header(mut self, n: &str, val: &str) -> Self {
        self.set_header(n, val);
        self
    }

    pub fn close(self) -> Self {
        self.header("Connection", "close")
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut o = format!("{} {} {}\r\n", self.method, self.path, self.version);
        for (k, v) in &self.headers {
            o.push_str(k);
            o.push_str(": ");
            o.push_str(v);
            o.push_str("\r\n");
        }
        o.push_str("\r\n");
        o.into_bytes()
    }

    /// Serialized form cut at the given byte offsets. Offsets past the end
    /// or out of order are ignored.
    pub fn split_at(&self, cuts: &[usize]) -> Vec<Vec<u8>> {
        let b = self.to_bytes();
        let mut parts = Vec::new();
        let mut start = 0;
        for &c in cuts {
            if c <= start || c >= b.len() { continue; }
            parts.push(b[start..c].to_vec());
            start = c;
        }
        parts.push(b[start..].to_vec());
        parts
    }

    /// Cut after every space and every line ending, keeping the final blank
    /// line attached to the last header: `GET `, `/ `, `HTTP/1.1\r\n`, ...
    pub fn fragments(&self) -> Vec<Vec<u8>> {
        let b = self.to_bytes();
        let end = b.len().saturating_sub(2);
        let cuts: Vec<usize> = b.iter()
            .enumerate()
            .filter(|&(i, &c)| (c == b' ' || c == b'\n') && i + 1 < end)
            .map(|(i, _)| i + 1)
            .collect();
        self.split_at(&cuts)
    }

    pub fn set_header(&mut self, n: &str, val: &str) {
        for (k, v) in self.headers.iter_mut() {
            if k.eq_ignore_ascii_case(n) {
                *v = val.to_string();
                return;
            }
        }
        self.headers.push((n.to_string(), val.to_string()));
    }
}

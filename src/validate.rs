// Response validation against the canonical error page and required headers
use http::StatusCode;

use crate::error::{Failure, Outcome};
use crate::http::{contains_ignore_case, find_hdr_end};

pub const SERVER_HEADER: &str = "Server: webserver/1.0\r\n";

/// Canonical error page for one status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPage {
    pub code: StatusCode,
    pub phrase: &'static str,
    pub description: &'static str,
}

/// How the page's three line breaks are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Crlf,
    Lf,
    None,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Crlf => "\r\n",
            LineEnding::Lf => "\n",
            LineEnding::None => "",
        }
    }
}

/// One accepted way of writing the page: a line-ending style and whether a
/// line terminator follows the closing tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encoding {
    pub line_ending: LineEnding,
    pub trailing_terminator: bool,
}

/// Every encoding a conforming server may use. A trailing terminator only
/// exists when there are line endings to begin with.
pub const ACCEPTED_ENCODINGS: [Encoding; 5] = [
    Encoding { line_ending: LineEnding::Crlf, trailing_terminator: true },
    Encoding { line_ending: LineEnding::Lf, trailing_terminator: true },
    Encoding { line_ending: LineEnding::Crlf, trailing_terminator: false },
    Encoding { line_ending: LineEnding::Lf, trailing_terminator: false },
    Encoding { line_ending: LineEnding::None, trailing_terminator: false },
];

impl ErrorPage {
    pub fn for_code(code: StatusCode) -> Option<Self> {
        let (phrase, description) = match code.as_u16() {
            400 => ("Bad Request", "Bad Request."),
            403 => ("Forbidden", "Access denied."),
            404 => ("Not Found", "File not found."),
            500 => ("Internal Server Error", "Some server side error."),
            501 => ("Not supported", "Method is not supported."),
            _ => return None,
        };
        Some(ErrorPage { code, phrase, description })
    }

    /// `404 Not Found`
    pub fn status(&self) -> String {
        format!("{} {}", self.code.as_u16(), self.phrase)
    }

    pub fn status_line(&self) -> String {
        format!("HTTP/1.1 {}\r\n", self.status())
    }

    pub fn body(&self, enc: Encoding) -> String {
        let nl = enc.line_ending.as_str();
        let tail = if enc.trailing_terminator { nl } else { "" };
        let st = self.status();
        format!(
            "<HTML><HEAD><TITLE>{st}</TITLE></HEAD>{nl}<BODY><H4>{st}</H4>{nl}{}{nl}</BODY></HTML>{tail}",
            self.description
        )
    }

    pub fn variants(&self) -> Vec<(Encoding, String)> {
        ACCEPTED_ENCODINGS.iter().map(|&e| (e, self.body(e))).collect()
    }
}

pub fn validate_success(response: &[u8]) -> Outcome {
    if contains_ignore_case(response, b"200 OK") {
        Ok(())
    } else {
        Err(Failure::mismatch(format!("no 200 OK in response: {}", preview(response))))
    }
}

/// Status line token such as `403 Forbidden`, anywhere in the response.
pub fn has_status(response: &[u8], code: StatusCode) -> Outcome {
    let page = ErrorPage::for_code(code)
        .ok_or_else(|| Failure::mismatch(format!("no canonical page for {code}")))?;
    if contains_ignore_case(response, page.status().as_bytes()) {
        Ok(())
    } else {
        Err(Failure::mismatch(format!("expected '{}': {}", page.status(), preview(response))))
    }
}

pub fn validate_error(response: &[u8], code: StatusCode) -> Outcome {
    let page = ErrorPage::for_code(code)
        .ok_or_else(|| Failure::mismatch(format!("no canonical page for {code}")))?;

    let status_line = page.status_line();
    let required = [
        status_line.as_str(),
        SERVER_HEADER,
        "Date: ",
        "Content-Type: text/html\r\n",
        "Connection: close\r\n",
    ];
    for r in required {
        if !contains_ignore_case(response, r.as_bytes()) {
            return Err(Failure::mismatch(format!("missing {:?} in {}", r.trim_end(), preview(response))));
        }
    }

    match matching_encoding(response, &page) {
        Some(enc) => {
            crate::log::debug(&format!("{} body matched {:?}", page.status(), enc));
            Ok(())
        }
        None => Err(Failure::mismatch(format!(
            "{} body or Content-Length does not match any accepted encoding",
            page.status()
        ))),
    }
}

/// The accepted encoding that equals the response body and whose exact byte
/// length is the one announced in `Content-Length`.
pub fn matching_encoding(response: &[u8], page: &ErrorPage) -> Option<Encoding> {
    let body = &response[find_hdr_end(response)? + 4..];
    page.variants().into_iter().find_map(|(enc, variant)| {
        let cl = format!("Content-Length: {}\r\n", variant.len());
        let ok = contains_ignore_case(response, cl.as_bytes())
            && body.eq_ignore_ascii_case(variant.as_bytes());
        ok.then_some(enc)
    })
}

fn preview(response: &[u8]) -> String {
    let s = String::from_utf8_lossy(&response[..response.len().min(120)]);
    let s = s.replace("\r\n", "\\r\\n").replace('\n', "\\n");
    if response.is_empty() { "<empty>".to_string() } else { s }
}

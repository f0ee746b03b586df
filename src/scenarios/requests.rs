// Scripted requests. Hosts and paths are fixed: the expected outcome of each
// one depends on the target's filter file and on the host's current status.
use crate::http::HttpRequest;

pub fn bad_request() -> HttpRequest {
    HttpRequest::new("GET", "/", "HTTP/5.6", "example.com")
}

pub fn not_supported() -> HttpRequest {
    HttpRequest::new("UPDATE", "/", "HTTP/1.1", "example.com")
}

pub fn not_found() -> HttpRequest {
    HttpRequest::get("/index", "myunknownhost.com")
}

pub fn forbidden() -> HttpRequest {
    HttpRequest::get("/", "http.badssl.com")
}

pub fn fragmented() -> HttpRequest {
    HttpRequest::get("/", "example.com").close()
}

pub fn keep_alive() -> HttpRequest {
    HttpRequest::get("/", "example.com").header("Connection", "keep-alive")
}

pub const BINARY_HOST: &str = "webaward.org";
pub const BINARY_PATH: &str = "/images2015/wa_banner_excellence1024-plain.jpg";

pub fn binary() -> HttpRequest {
    HttpRequest::get(BINARY_PATH, BINARY_HOST).close()
}

/// Direct fetch of the binary resource, bypassing the target. HTTP/1.0 keeps
/// the origin from answering with a chunked body.
pub fn binary_reference() -> HttpRequest {
    HttpRequest::new("GET", BINARY_PATH, "HTTP/1.0", BINARY_HOST).close()
}

/// Ten requests for the deadlock probe. The first six are served (200), the
/// last four are rejected with 400, 501, 404 and 403 in that order.
pub fn deadlock_probe() -> [HttpRequest; 10] {
    [
        HttpRequest::get("/", "example.com").close(),
        HttpRequest::get("/", "pdf995.com").close(),
        HttpRequest::get("/", "clearshinyshininglight.neverssl.com").close(),
        HttpRequest::get("/", "octopress.org").close(),
        HttpRequest::get("/", "info.cern.ch").close(),
        HttpRequest::get("/samples/widgets.pdf", "pdf995.com").close(),
        bad_request(),
        not_supported(),
        not_found(),
        forbidden(),
    ]
}

/// Two requests issued together under instrumentation: one served, one blocked.
pub fn instrumented_pair() -> (HttpRequest, HttpRequest) {
    (HttpRequest::get("/", "octopress.org").close(), forbidden())
}

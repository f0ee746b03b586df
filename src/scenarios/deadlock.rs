// Worker-pool saturation: more requests in flight than workers
use bytes::Bytes;
use http::StatusCode;
use std::time::Duration;

use super::{requests, Ctx, Session};
use crate::error::{Failure, Outcome};
use crate::http::{contains_ignore_case, HttpRequest};
use crate::validate::has_status;

const POOL_SIZE: usize = 4;
const CONCURRENT: usize = 5;
pub const EXPECTED_OK: usize = 6;

/// Positions 6..10 of the probe and the rejection each must carry.
pub const REJECTIONS: [(usize, StatusCode); 4] = [
    (6, StatusCode::BAD_REQUEST),
    (7, StatusCode::NOT_IMPLEMENTED),
    (8, StatusCode::NOT_FOUND),
    (9, StatusCode::FORBIDDEN),
];

pub async fn run(cx: &Ctx<'_>) -> Outcome {
    let reqs = requests::deadlock_probe();
    let t = &cx.cfg.timing;
    let mut s = Session::start(cx, POOL_SIZE, reqs.len()).await?;
    let r = probe(&mut s, &reqs, t.deadlock()).await;
    let responses = s.guard(r).await?;
    cx.save("stdout", &responses.join(&b"\n"[..]));
    s.finish(t.reap()).await?;
    judge_probe(&responses)
}

async fn probe(s: &mut Session<'_>, reqs: &[HttpRequest], timeout: Duration) -> Outcome<Vec<Bytes>> {
    let mut res = Vec::with_capacity(reqs.len());

    // All sends go out before the first read, so the target holds more
    // requests than it has workers.
    let mut open = Vec::with_capacity(CONCURRENT);
    for _ in 0..CONCURRENT {
        open.push(s.connect(timeout).await?);
    }
    for (&i, req) in open.iter().zip(reqs) {
        s.client(i).send(&req.to_bytes()).await?;
    }
    for &i in &open {
        res.push(s.client(i).receive_all().await?);
    }

    for req in &reqs[CONCURRENT..] {
        let i = s.connect(timeout).await?;
        let c = s.client(i);
        c.send(&req.to_bytes()).await?;
        res.push(c.receive_all().await?);
    }
    Ok(res)
}

/// Exactly six responses carry 200 OK and the rejections sit at their
/// scripted positions.
pub fn judge_probe(responses: &[Bytes]) -> Outcome {
    if responses.len() != EXPECTED_OK + REJECTIONS.len() {
        return Err(Failure::mismatch(format!("expected 10 responses, got {}", responses.len())));
    }
    let ok = responses.iter().filter(|r| contains_ignore_case(r, b"200 OK")).count();
    if ok != EXPECTED_OK {
        return Err(Failure::mismatch(format!("{ok} responses with 200 OK, expected {EXPECTED_OK}")));
    }
    for (pos, code) in REJECTIONS {
        has_status(&responses[pos], code)
            .map_err(|f| Failure::mismatch(format!("response {}: {}", pos + 1, f.detail)))?;
    }
    Ok(())
}

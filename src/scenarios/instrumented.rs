// Concurrent requests under the memory instrumentation tool
use bytes::Bytes;
use http::StatusCode;
use std::path::Path;
use std::time::Duration;

use super::{requests, Ctx, Session};
use crate::error::Outcome;
use crate::http::HttpRequest;
use crate::instrument;
use crate::validate::{has_status, validate_success};

const POOL_SIZE: usize = 3;
const MAX_REQUESTS: usize = 2;

pub async fn run(cx: &Ctx<'_>) -> Outcome {
    let cfg = cx.cfg;
    let log_path = cfg.artifact_path(&cfg.instrumentation.log_file);
    // Never judge a log left over from an earlier run.
    let _ = std::fs::remove_file(&log_path);

    let (program, args) = instrument::wrap_command(
        &cfg.instrumentation,
        &log_path,
        &cfg.executable_path(),
        &cx.target_args(POOL_SIZE, MAX_REQUESTS),
    );
    let (served, blocked) = requests::instrumented_pair();

    let mut s = Session::start_with(cx, program, args).await?;
    let r = pair(&mut s, &served, &blocked, cfg.timing.socket()).await;
    let (res1, res2) = s.guard(r).await?;
    cx.save("stdout", &[&res1[..], &b"\n"[..], &res2[..]].concat());
    s.finish(cfg.timing.instrumented_reap()).await?;

    judge_instrumented(&log_path, &res1, &res2)
}

async fn pair(s: &mut Session<'_>, a: &HttpRequest, b: &HttpRequest, timeout: Duration) -> Outcome<(Bytes, Bytes)> {
    let c1 = s.connect(timeout).await?;
    let c2 = s.connect(timeout).await?;
    s.client(c1).send(&a.to_bytes()).await?;
    s.client(c2).send(&b.to_bytes()).await?;
    let r1 = s.client(c1).receive_all().await?;
    let r2 = s.client(c2).receive_all().await?;
    Ok((r1, r2))
}

/// Leak-free, zero-error log; first request served, second blocked.
pub fn judge_instrumented(log_path: &Path, res1: &[u8], res2: &[u8]) -> Outcome {
    instrument::judge(log_path)?;
    validate_success(res1)?;
    has_status(res2, StatusCode::FORBIDDEN)
}

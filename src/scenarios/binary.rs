// Binary payloads must pass through the target byte for byte
use bytes::Bytes;
use std::time::Duration;

use super::{requests, single_exchange, Ctx, Delivery};
use crate::client::TestClient;
use crate::error::{Failure, Outcome};
use crate::http::{contains_bytes, HttpResponse};

const ORIGIN_PORT: u16 = 80;

pub async fn run(cx: &Ctx<'_>) -> Outcome {
    let t = &cx.cfg.timing;
    let proxied = single_exchange(cx, Delivery::whole(&requests::binary()), t.reap()).await?;
    let reference = fetch_reference(&cx.cfg.target.binary_origin, t.socket()).await?;
    cx.save("reference", &reference);
    compare(&proxied, &reference)
}

/// Split `host[:port]`; the port defaults to 80.
pub fn origin_addr(origin: &str) -> Outcome<(&str, u16)> {
    match origin.rsplit_once(':') {
        Some((host, port)) => port
            .parse()
            .map(|p| (host, p))
            .map_err(|_| Failure::connection(format!("bad origin port in '{origin}'"))),
        None => Ok((origin, ORIGIN_PORT)),
    }
}

/// Fetch the resource straight from `origin`, bypassing the target, and
/// return the body.
pub async fn fetch_reference(origin: &str, timeout: Duration) -> Outcome<Bytes> {
    let (host, port) = origin_addr(origin)?;
    let mut c = TestClient::connect_addr(host, port, timeout).await?;
    let r = async {
        c.send(&requests::binary_reference().to_bytes()).await?;
        c.receive_all().await
    }
    .await;
    c.close().await;
    reference_body(&r?)
}

/// The reference must be a plain HTTP/1.x 200; its body is cut to the
/// declared length.
pub fn reference_body(raw: &[u8]) -> Outcome<Bytes> {
    let resp = HttpResponse::parse(raw)
        .ok_or_else(|| Failure::mismatch("reference fetch returned no parsable response"))?;
    if !resp.version.starts_with("HTTP/1.") {
        return Err(Failure::mismatch(format!("reference fetch answered with {}", resp.version)));
    }
    if resp.status_code != 200 {
        return Err(Failure::mismatch(format!(
            "reference fetch returned {} {}",
            resp.status_code, resp.status_text
        )));
    }
    Ok(Bytes::copy_from_slice(resp.declared_body()))
}

/// The proxied response must carry the reference bytes unaltered.
pub fn compare(proxied: &[u8], reference: &[u8]) -> Outcome {
    if reference.is_empty() {
        return Err(Failure::mismatch("reference body is empty"));
    }
    if contains_bytes(proxied, reference) {
        Ok(())
    } else {
        Err(Failure::mismatch(format!(
            "proxied response ({} bytes) does not contain the {}-byte reference body",
            proxied.len(),
            reference.len()
        )))
    }
}

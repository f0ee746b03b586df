// Malformed, unsupported, unknown-host and blocked requests
use http::StatusCode;

use super::{single_exchange, Ctx, Delivery};
use crate::error::Outcome;
use crate::http::HttpRequest;
use crate::validate::validate_error;

pub async fn run(cx: &Ctx<'_>, req: HttpRequest, code: StatusCode) -> Outcome {
    let resp = single_exchange(cx, Delivery::whole(&req), cx.cfg.timing.reap()).await?;
    validate_error(&resp, code)
}

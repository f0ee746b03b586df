// Keep-alive request against a single-request budget
use super::{requests, single_exchange, Ctx, Delivery};
use crate::error::Outcome;
use crate::validate::validate_success;

pub async fn run(cx: &Ctx<'_>) -> Outcome {
    let delivery = Delivery::whole(&requests::keep_alive());
    let resp = single_exchange(cx, delivery, cx.cfg.timing.keep_alive_reap()).await?;
    validate_success(&resp)
}

// A valid request delivered across several writes must still be served
use super::{requests, single_exchange, Ctx, Delivery};
use crate::error::Outcome;
use crate::validate::validate_success;

pub async fn run(cx: &Ctx<'_>) -> Outcome {
    let t = &cx.cfg.timing;
    let delivery = Delivery::fragmented(&requests::fragmented(), t.fragment_delay());
    let resp = single_exchange(cx, delivery, t.reap()).await?;
    validate_success(&resp)
}

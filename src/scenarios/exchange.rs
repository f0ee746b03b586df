// One request/response exchange on a fresh connection
use bytes::Bytes;
use std::time::Duration;

use super::Session;
use crate::error::Outcome;
use crate::http::HttpRequest;

/// How request bytes reach the target.
pub enum Delivery {
    /// A single write.
    Whole(Vec<u8>),
    /// Several writes, each preceded by the given pause.
    Fragments(Vec<Vec<u8>>, Duration),
}

impl Delivery {
    pub fn whole(req: &HttpRequest) -> Self {
        Delivery::Whole(req.to_bytes())
    }

    pub fn fragmented(req: &HttpRequest, delay: Duration) -> Self {
        Delivery::Fragments(req.fragments(), delay)
    }
}

pub async fn talk(s: &mut Session<'_>, delivery: &Delivery, timeout: Duration) -> Outcome<Bytes> {
    let i = s.connect(timeout).await?;
    let c = s.client(i);
    match delivery {
        Delivery::Whole(b) => c.send(b).await?,
        Delivery::Fragments(parts, delay) => {
            let parts: Vec<&[u8]> = parts.iter().map(|p| p.as_slice()).collect();
            c.send_fragments(&parts, *delay).await?
        }
    }
    c.receive_all().await
}

// Missing or malformed arguments must print only the usage line
use super::Ctx;
use crate::error::{Failure, Outcome};
use crate::process::run_to_completion;

pub const USAGE: &str = "Usage: proxyServer <port> <pool-size> <max-number-of-request> <filter>";

pub async fn run(cx: &Ctx<'_>, args: &[String]) -> Outcome {
    let out = cx.artifact("stdout_test");
    let raw = run_to_completion(&cx.cfg.executable_path(), args, cx.cfg.timing.usage(), &out).await?;
    let text = String::from_utf8(raw).map_err(|e| Failure::mismatch(format!("usage output is not UTF-8: {e}")))?;
    if usage_matches(&text) {
        Ok(())
    } else {
        Err(Failure::mismatch(format!("unexpected usage output {:?}", text.trim_end())))
    }
}

/// Case-insensitive, trailing whitespace ignored, optional leading `./`.
pub fn usage_matches(output: &str) -> bool {
    let got = output.trim_end().to_lowercase();
    let want = USAGE.to_lowercase();
    got == want || got.strip_prefix("./") == Some(want.as_str())
}

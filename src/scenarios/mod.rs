// Behavioral scenarios: launch, exchange, validate, tear down
pub mod binary;
pub mod deadlock;
mod error_codes;
mod exchange;
mod fragmented;
pub mod instrumented;
mod keep_alive;
pub mod requests;
pub mod usage;

pub use exchange::Delivery;

use bytes::Bytes;
use http::StatusCode;
use std::path::PathBuf;
use std::time::Duration;

use crate::client::{close_all, TestClient};
use crate::config::Config;
use crate::error::{Failure, Outcome};
use crate::process::{classify_exit, TargetProcess};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    UsageNoArgs,
    UsageMalformed,
    BadRequest,
    NotFound,
    NotSupported,
    Forbidden,
    Fragmented,
    BinaryIntegrity,
    KeepAlive,
    Deadlock,
    Instrumented,
}

impl Scenario {
    /// Execution order. Port numbers are assigned in this order.
    pub const ALL: [Scenario; 11] = [
        Scenario::UsageNoArgs,
        Scenario::UsageMalformed,
        Scenario::BadRequest,
        Scenario::NotFound,
        Scenario::NotSupported,
        Scenario::Forbidden,
        Scenario::Fragmented,
        Scenario::BinaryIntegrity,
        Scenario::KeepAlive,
        Scenario::Deadlock,
        Scenario::Instrumented,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::UsageNoArgs => "Usage (no arguments)",
            Scenario::UsageMalformed => "Usage (malformed arguments)",
            Scenario::BadRequest => "Bad Request",
            Scenario::NotFound => "Not Found",
            Scenario::NotSupported => "Not Supported",
            Scenario::Forbidden => "Forbidden",
            Scenario::Fragmented => "Fragmented Request",
            Scenario::BinaryIntegrity => "Binary Integrity",
            Scenario::KeepAlive => "Keep Alive",
            Scenario::Deadlock => "Deadlock",
            Scenario::Instrumented => "Instrumented Run",
        }
    }

    /// Short identifier used on the command line and in artifact file names.
    pub fn key(&self) -> &'static str {
        match self {
            Scenario::UsageNoArgs => "usage_1",
            Scenario::UsageMalformed => "usage_2",
            Scenario::BadRequest => "bad_request",
            Scenario::NotFound => "not_found",
            Scenario::NotSupported => "not_supported",
            Scenario::Forbidden => "forbidden",
            Scenario::Fragmented => "fragmented",
            Scenario::BinaryIntegrity => "binary_integrity",
            Scenario::KeepAlive => "keep_alive",
            Scenario::Deadlock => "deadlock",
            Scenario::Instrumented => "instrumented",
        }
    }

    pub fn from_key(k: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.key().eq_ignore_ascii_case(k))
    }

    pub async fn run(&self, cfg: &Config, port: u16) -> Outcome {
        let cx = Ctx { cfg, port, key: self.key() };
        match self {
            Scenario::UsageNoArgs => usage::run(&cx, &[]).await,
            Scenario::UsageMalformed => {
                usage::run(&cx, &[port.to_string(), "1".to_string(), "3".to_string()]).await
            }
            Scenario::BadRequest => error_codes::run(&cx, requests::bad_request(), StatusCode::BAD_REQUEST).await,
            Scenario::NotFound => error_codes::run(&cx, requests::not_found(), StatusCode::NOT_FOUND).await,
            Scenario::NotSupported => error_codes::run(&cx, requests::not_supported(), StatusCode::NOT_IMPLEMENTED).await,
            Scenario::Forbidden => error_codes::run(&cx, requests::forbidden(), StatusCode::FORBIDDEN).await,
            Scenario::Fragmented => fragmented::run(&cx).await,
            Scenario::BinaryIntegrity => binary::run(&cx).await,
            Scenario::KeepAlive => keep_alive::run(&cx).await,
            Scenario::Deadlock => deadlock::run(&cx).await,
            Scenario::Instrumented => instrumented::run(&cx).await,
        }
    }
}

/// Everything a scenario knows about its slot in the run.
pub struct Ctx<'a> {
    pub cfg: &'a Config,
    pub port: u16,
    pub key: &'static str,
}

impl Ctx<'_> {
    pub fn target_args(&self, pool: usize, max_requests: usize) -> Vec<String> {
        vec![
            self.port.to_string(),
            pool.to_string(),
            max_requests.to_string(),
            self.cfg.target.filter_file.clone(),
        ]
    }

    pub fn artifact(&self, prefix: &str) -> PathBuf {
        self.cfg.artifact_path(&format!("{prefix}_{}.txt", self.key))
    }

    /// Remove an artifact left behind by an earlier run.
    pub fn clear(&self, prefix: &str) {
        let p = self.artifact(prefix);
        match std::fs::remove_file(&p) {
            Ok(()) => crate::log::debug(&format!("removed stale {}", p.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => crate::log::warn(&format!("cannot remove {}: {e}", p.display())),
        }
    }

    /// Keep raw bytes for post-mortem inspection. Losing an artifact is not a
    /// reason to fail the scenario.
    pub fn save(&self, prefix: &str, data: &[u8]) {
        let p = self.artifact(prefix);
        if let Err(e) = std::fs::write(&p, data) {
            crate::log::warn(&format!("cannot write {}: {e}", p.display()));
        }
    }
}

/// One launched target plus the clients talking to it. Every exit path goes
/// through `guard` or `finish`, which close the clients and reap the target.
pub struct Session<'a> {
    cx: &'a Ctx<'a>,
    target: TargetProcess,
    clients: Vec<TestClient>,
}

impl<'a> Session<'a> {
    pub async fn start(cx: &'a Ctx<'a>, pool: usize, max_requests: usize) -> Outcome<Session<'a>> {
        let program = cx.cfg.executable_path();
        let args = cx.target_args(pool, max_requests);
        Self::start_with(cx, program, args).await
    }

    pub async fn start_with(cx: &'a Ctx<'a>, program: PathBuf, args: Vec<String>) -> Outcome<Session<'a>> {
        cx.clear("stdout");
        cx.clear("stderr");
        let target = TargetProcess::launch(&program, &args)?;
        target.warm_up(cx.cfg.timing.warm_up()).await;
        Ok(Session { cx, target, clients: Vec::new() })
    }

    /// Open a new connection and return its index.
    pub async fn connect(&mut self, timeout: Duration) -> Outcome<usize> {
        let c = TestClient::connect(self.cx.port, timeout).await?;
        self.clients.push(c);
        Ok(self.clients.len() - 1)
    }

    pub fn client(&mut self, i: usize) -> &mut TestClient {
        &mut self.clients[i]
    }

    /// Pass `r` through; on failure tear everything down first.
    pub async fn guard<T>(&mut self, r: Outcome<T>) -> Outcome<T> {
        match r {
            Ok(v) => Ok(v),
            Err(f) => Err(self.abort(f).await),
        }
    }

    async fn abort(&mut self, f: Failure) -> Failure {
        self.keep_received();
        close_all(&mut self.clients).await;
        let reap = self.cx.cfg.timing.reap();
        let f = self.target.diagnose_refusal(f, self.cx.port, reap).await;
        self.target.terminate().await;
        self.keep_stderr().await;
        f
    }

    /// Whatever the clients read before the failure, possibly nothing.
    fn keep_received(&self) {
        let parts: Vec<&[u8]> = self.clients.iter().map(|c| c.received()).collect();
        self.cx.save("stdout", &parts.join(&b"\n"[..]));
    }

    async fn keep_stderr(&mut self) {
        let err = self.target.stderr(Duration::from_secs(1)).await;
        if !err.is_empty() {
            self.cx.save("stderr", err);
        }
    }

    /// Close the clients and wait for the target to exit on its own. A
    /// target that outlives `reap` is killed and reported; one that died from
    /// a signal is a crash.
    pub async fn finish(mut self, reap: Duration) -> Outcome {
        close_all(&mut self.clients).await;
        let waited = self.target.wait_for(reap).await;
        if waited.is_err() {
            crate::log::debug(&format!("target {:?} did not exit, killing", self.target.args()));
            self.target.terminate().await;
        }
        self.keep_stderr().await;
        classify_exit(waited?)?;
        Ok(())
    }
}

/// Launch with a single-request budget, perform one exchange, reap.
pub async fn single_exchange(cx: &Ctx<'_>, delivery: Delivery, reap: Duration) -> Outcome<Bytes> {
    let mut s = Session::start(cx, 1, 1).await?;
    let r = exchange::talk(&mut s, &delivery, cx.cfg.timing.socket()).await;
    let resp = s.guard(r).await?;
    cx.save("stdout", &resp);
    s.finish(reap).await?;
    Ok(resp)
}

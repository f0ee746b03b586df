// Target process lifecycle: launch, warm-up, bounded reap, exit classification
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::error::{Failure, Outcome};

/// Exit values above this were produced by a signal, not by `exit()`.
pub const SIGNAL_EXIT_THRESHOLD: i32 = 127;

/// How long a target gets to exit after SIGTERM before it is killed.
pub const TERM_GRACE: Duration = Duration::from_secs(2);
const KILL_REAP: Duration = Duration::from_secs(5);

pub struct TargetProcess {
    child: Child,
    args: Vec<String>,
    started: Instant,
    stderr: Option<JoinHandle<Vec<u8>>>,
    captured: Vec<u8>,
    exit: Option<i32>,
}

impl TargetProcess {
    /// Spawn `program args...` with stderr captured. Does not wait for the
    /// target to become ready.
    pub fn launch(program: &Path, args: &[String]) -> Outcome<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Failure::connection(format!("launch {}: {e}", program.display())))?;

        // Drain continuously so a chatty target never blocks on a full pipe.
        let stderr = child.stderr.take().map(|mut pipe| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf).await;
                buf
            })
        });

        crate::log::debug(&format!(
            "launched {} {} (pid {})",
            program.display(),
            args.join(" "),
            child.id().map(|p| p.to_string()).unwrap_or_else(|| "?".into())
        ));
        Ok(TargetProcess { child, args: args.to_vec(), started: Instant::now(), stderr, captured: Vec::new(), exit: None })
    }

    /// Coarse readiness heuristic: give the target time to bind its socket.
    pub async fn warm_up(&self, interval: Duration) {
        let elapsed = self.started.elapsed();
        if elapsed < interval {
            tokio::time::sleep(interval - elapsed).await;
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Wait for the target to exit on its own. Returns the normalized exit
    /// value, or `NonTerminating` if it is still running after `timeout`.
    pub async fn wait_for(&mut self, timeout: Duration) -> Outcome<i32> {
        if let Some(code) = self.exit {
            return Ok(code);
        }
        match tokio::time::timeout(timeout, self.child.wait()).await {
            Ok(Ok(status)) => {
                let code = exit_value(status);
                self.exit = Some(code);
                Ok(code)
            }
            Ok(Err(e)) => Err(Failure::connection(format!("wait for target: {e}"))),
            Err(_) => Err(Failure::non_terminating(format!(
                "target still running {timeout:?} after the last exchange"
            ))),
        }
    }

    /// Stop the target if it is still running and reap it: SIGTERM first so
    /// the memory tool can still write its log, SIGKILL after `TERM_GRACE`.
    /// Idempotent.
    pub async fn terminate(&mut self) {
        if self.exit.is_some() {
            return;
        }
        if let Ok(Some(status)) = self.child.try_wait() {
            self.exit = Some(exit_value(status));
            return;
        }
        if self.signal_term() {
            if let Ok(Ok(status)) = tokio::time::timeout(TERM_GRACE, self.child.wait()).await {
                self.exit = Some(exit_value(status));
                crate::log::debug("target stopped on SIGTERM");
                return;
            }
            crate::log::debug(&format!("target ignored SIGTERM for {TERM_GRACE:?}, killing"));
        }
        let _ = self.child.start_kill();
        if let Ok(Ok(status)) = tokio::time::timeout(KILL_REAP, self.child.wait()).await {
            self.exit = Some(exit_value(status));
        }
        crate::log::debug("target killed");
    }

    #[cfg(unix)]
    fn signal_term(&self) -> bool {
        match self.child.id() {
            // SAFETY: the pid belongs to a child we have not reaped yet.
            Some(pid) => unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) == 0 },
            None => false,
        }
    }

    #[cfg(not(unix))]
    fn signal_term(&self) -> bool {
        false
    }

    /// Everything the target wrote to stderr. Only complete once the process
    /// has exited; waits at most `timeout` for the pipe to close, then keeps
    /// the result for later calls.
    pub async fn stderr(&mut self, timeout: Duration) -> &[u8] {
        if let Some(h) = self.stderr.take() {
            if let Ok(Ok(buf)) = tokio::time::timeout(timeout, h).await {
                self.captured = buf;
            }
        }
        &self.captured
    }

    /// A refused connection after warm-up is either a target defect or the
    /// port still being held by someone else. Tell the two apart from what
    /// the target printed.
    pub async fn diagnose_refusal(&mut self, failure: Failure, port: u16, timeout: Duration) -> Failure {
        if !failure.refused {
            return failure;
        }
        if self.wait_for(timeout).await.is_err() {
            self.terminate().await;
        }
        if mentions_port_in_use(self.stderr(timeout).await) {
            crate::log::warn(&format!("port {port} is already in use, not a target defect"));
            return Failure::port_in_use(port);
        }
        failure
    }
}

pub fn mentions_port_in_use(stderr: &[u8]) -> bool {
    String::from_utf8_lossy(stderr).to_lowercase().contains("in use")
}

/// Normalize an exit status to a shell-style integer: the exit code, or
/// 128 + signal number when the process was killed by a signal.
pub fn exit_value(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return 128 + sig;
        }
    }
    -1
}

/// A value above 127 means the target died from a signal.
pub fn classify_exit(code: i32) -> Outcome<i32> {
    if code > SIGNAL_EXIT_THRESHOLD {
        Err(Failure::crash(code))
    } else {
        Ok(code)
    }
}

/// Run a short-lived invocation with stdout and stderr captured together,
/// writing the combined output to `output`.
pub async fn run_to_completion(program: &Path, args: &[String], timeout: Duration, output: &Path) -> Outcome<Vec<u8>> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Failure::connection(format!("launch {}: {e}", program.display())))?;

    let mut out = child.stdout.take();
    let mut err = child.stderr.take();
    let collect = async {
        let mut o = Vec::new();
        let mut e = Vec::new();
        let read_out = async {
            if let Some(p) = out.as_mut() {
                let _ = p.read_to_end(&mut o).await;
            }
        };
        let read_err = async {
            if let Some(p) = err.as_mut() {
                let _ = p.read_to_end(&mut e).await;
            }
        };
        tokio::join!(read_out, read_err);
        let status = child.wait().await;
        (o, e, status)
    };

    let (mut combined, e, status) = match tokio::time::timeout(timeout, collect).await {
        Ok(r) => r,
        Err(_) => {
            return Err(Failure::non_terminating(format!(
                "{} did not exit within {timeout:?}",
                program.display()
            )));
        }
    };
    combined.extend_from_slice(&e);
    if let Ok(s) = status {
        crate::log::debug(&format!("{} exited with {}", program.display(), exit_value(s)));
    }
    std::fs::write(output, &combined).map_err(|e| Failure::artifact(&output.display().to_string(), e))?;
    Ok(combined)
}

// Memory instrumentation: command wrapping and log analysis
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Instrumentation;
use crate::error::{Failure, FailureKind, Outcome};

pub const ERROR_SUMMARY: &str = "ERROR SUMMARY: ";
pub const LEAK_FREE: &str = "no leaks are possible";

/// Error count after the `ERROR SUMMARY:` marker; nonzero means errors.
pub fn has_errors(log: &str) -> Outcome<bool> {
    let idx = log
        .find(ERROR_SUMMARY)
        .ok_or_else(|| Failure::malformed_log(format!("no '{}' marker", ERROR_SUMMARY.trim_end())))?;
    let rest = &log[idx + ERROR_SUMMARY.len()..];
    let token = rest.split_whitespace().next().unwrap_or("");
    let n: u64 = token
        .parse()
        .map_err(|_| Failure::malformed_log(format!("unparsable error count '{token}'")))?;
    Ok(n != 0)
}

/// Absence of the leak-free phrase counts as a leak.
pub fn has_leaks(log: &str) -> bool {
    !log.lines().any(|l| l.contains(LEAK_FREE))
}

pub fn judge_log(log: &str) -> Outcome {
    if has_leaks(log) {
        return Err(Failure::new(FailureKind::LeakDetected, "memory tool did not report a leak-free heap"));
    }
    if has_errors(log)? {
        return Err(Failure::new(FailureKind::NonzeroErrorCount, "memory tool reported errors"));
    }
    Ok(())
}

pub fn judge(path: &Path) -> Outcome {
    let log = fs::read(path)
        .map_err(|e| Failure::malformed_log(format!("cannot read {}: {e}", path.display())))?;
    judge_log(&String::from_utf8_lossy(&log))
}

/// Program and arguments that run `target args...` under the tool, logging
/// to `log_path`.
pub fn wrap_command(cfg: &Instrumentation, log_path: &Path, target: &Path, args: &[String]) -> (PathBuf, Vec<String>) {
    let mut a = cfg.args.clone();
    a.push(format!("--log-file={}", log_path.display()));
    a.push(target.display().to_string());
    a.extend(args.iter().cloned());
    (PathBuf::from(&cfg.tool), a)
}

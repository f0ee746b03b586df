// Building the target from source before any scenario runs
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use crate::config::Config;
use crate::error::{Failure, Outcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    Compiled,
    Warnings,
    Error,
}

/// Classify compiler diagnostics. Errors win over warnings.
pub fn classify(diagnostics: &str) -> BuildStatus {
    if diagnostics.contains("error: ") {
        BuildStatus::Error
    } else if diagnostics.contains("warning: ") {
        BuildStatus::Warnings
    } else {
        BuildStatus::Compiled
    }
}

/// C sources and headers in `dir`, sorted for a stable command line.
pub fn collect_sources(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() { continue; }
            match path.extension().and_then(|e| e.to_str()) {
                Some("c") | Some("h") => files.push(path),
                _ => {}
            }
        }
    }
    files.sort();
    files
}

pub fn compiler_args(cfg: &Config, sources: &[PathBuf]) -> Vec<String> {
    let mut a = cfg.target.compiler_flags.clone();
    a.extend(sources.iter().map(|p| p.display().to_string()));
    a.push("-o".to_string());
    a.push(cfg.target.executable.clone());
    a.extend(cfg.target.link_libs.iter().cloned());
    a
}

/// Compile the target. Diagnostics are kept in `stdout_compilation.txt`.
/// Anything with an `error:` marker is a `BuildFailure`.
pub async fn build(cfg: &Config) -> Outcome<BuildStatus> {
    let exe = Path::new(&cfg.target.executable);
    if exe.is_file() {
        fs::remove_file(exe).map_err(|e| Failure::build(format!("cannot remove stale {}: {e}", exe.display())))?;
    }

    let sources = collect_sources(Path::new(&cfg.target.source_dir));
    if sources.is_empty() {
        return Err(Failure::build(format!("no .c/.h files in {}", cfg.target.source_dir)));
    }
    let args = compiler_args(cfg, &sources);
    crate::log::debug(&format!("{} {}", cfg.target.compiler, args.join(" ")));

    let out = tokio::process::Command::new(&cfg.target.compiler)
        .args(&args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| Failure::build(format!("cannot run {}: {e}", cfg.target.compiler)))?;

    let mut diag = out.stdout;
    diag.extend_from_slice(&out.stderr);
    let log_path = cfg.artifact_path("stdout_compilation.txt");
    fs::write(&log_path, &diag).map_err(|e| Failure::artifact(&log_path.display().to_string(), e))?;

    let text = String::from_utf8_lossy(&diag);
    match classify(&text) {
        BuildStatus::Error => Err(Failure::build(format!(
            "compilation failed, see {}",
            log_path.display()
        ))),
        BuildStatus::Compiled if !out.status.success() => Err(Failure::build(format!(
            "{} exited with {} and no diagnostics",
            cfg.target.compiler, out.status
        ))),
        BuildStatus::Warnings => {
            crate::log::warn("Warnings during compilation");
            Ok(BuildStatus::Warnings)
        }
        BuildStatus::Compiled => {
            crate::log::info("Target compiled successfully");
            Ok(BuildStatus::Compiled)
        }
    }
}

// Centralized harness logging with timestamps and log levels
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::SystemTime;

use crate::colors::*;

static ENABLED: AtomicBool = AtomicBool::new(true);
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LEVEL_INFO);

const LEVEL_DEBUG: u8 = 0;
const LEVEL_INFO: u8 = 1;
const LEVEL_WARN: u8 = 2;
const LEVEL_ERROR: u8 = 3;

pub fn init(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn set_level(level: &str) {
    LOG_LEVEL.store(parse_level(level), Ordering::Relaxed);
}

fn parse_level(level: &str) -> u8 {
    match level.to_lowercase().as_str() {
        "debug" => LEVEL_DEBUG,
        "info" => LEVEL_INFO,
        "warn" | "warning" => LEVEL_WARN,
        "error" => LEVEL_ERROR,
        _ => LEVEL_INFO,
    }
}

pub fn is_known_level(level: &str) -> bool {
    matches!(level.to_lowercase().as_str(), "debug" | "info" | "warn" | "warning" | "error")
}

fn active() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

fn above_level(level: u8) -> bool {
    level >= LOG_LEVEL.load(Ordering::Relaxed)
}

fn timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = now.as_secs();
    let millis = now.subsec_millis();
    let time_secs = secs % 86400;
    let h = time_secs / 3600;
    let m = (time_secs % 3600) / 60;
    let s = time_secs % 60;
    format!("{h:02}:{m:02}:{s:02}.{millis:03}")
}

pub fn debug(msg: &str) {
    if !active() || !above_level(LEVEL_DEBUG) { return; }
    let ts = timestamp();
    let _ = writeln!(io::stdout(), "{DIM}{ts}{RESET} {DIM}DBG{RESET} {msg}");
    let _ = io::stdout().flush();
}

pub fn info(msg: &str) {
    if !active() || !above_level(LEVEL_INFO) { return; }
    let ts = timestamp();
    let _ = writeln!(io::stdout(), "{DIM}{ts}{RESET} {BOLD}{CYAN}{msg}{RESET}");
    let _ = io::stdout().flush();
}

pub fn warn(msg: &str) {
    if !active() || !above_level(LEVEL_WARN) { return; }
    let ts = timestamp();
    let _ = writeln!(io::stderr(), "{DIM}{ts}{RESET} {YELLOW}⚠ {msg}{RESET}");
    let _ = io::stderr().flush();
}

pub fn error(msg: &str) {
    if !active() { return; }
    let ts = timestamp();
    let _ = writeln!(io::stderr(), "{DIM}{ts}{RESET} {RED}✗ {msg}{RESET}");
    let _ = io::stderr().flush();
}

/// Banner printed when a scenario starts, e.g. `[!] Deadlock (port 3009)`.
pub fn scenario(name: &str, port: u16) {
    if !active() || !above_level(LEVEL_INFO) { return; }
    let ts = timestamp();
    let _ = writeln!(io::stdout(), "{DIM}{ts}{RESET} {YELLOW}[!]{RESET} {BOLD}{name}{RESET} {DIM}(port {port}){RESET}");
    let _ = io::stdout().flush();
}

pub fn verdict(name: &str, passed: bool, ms: u128) {
    if !active() || !above_level(LEVEL_INFO) { return; }
    let ts = timestamp();
    let col = verdict_color(passed);
    let mark = if passed { "✓" } else { "✗" };
    let _ = writeln!(io::stdout(), "{DIM}{ts}{RESET} {col}{mark}{RESET} {name} {DIM}({ms}ms){RESET}");
    let _ = io::stdout().flush();
}

pub fn separator() {
    if !active() { return; }
    let _ = writeln!(io::stdout(), "{SEPARATOR}");
    let _ = io::stdout().flush();
}

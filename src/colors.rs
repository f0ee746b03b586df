// ANSI color codes for terminal output
pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

pub fn verdict_color(passed: bool) -> &'static str {
    if passed { GREEN } else { RED }
}

pub const SEPARATOR: &str = "\x1b[90m──────────────────────────────────────────\x1b[0m";

//! ANSI styling for terminal output.
//!
//! Styling is disabled when `NO_COLOR` is set or stdout is not a terminal.

use std::io::IsTerminal;
use std::sync::LazyLock;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

static ENABLED: LazyLock<bool> = LazyLock::new(|| {
    enabled(
        std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()),
        std::io::stdout().is_terminal(),
    )
});

fn enabled(no_color: bool, terminal: bool) -> bool {
    !no_color && terminal
}

fn code(code: &'static str) -> &'static str {
    if *ENABLED { code } else { "" }
}

pub fn reset() -> &'static str {
    code(RESET)
}

pub fn bold() -> &'static str {
    code(BOLD)
}

pub fn dim() -> &'static str {
    code(DIM)
}

pub fn red() -> &'static str {
    code(RED)
}

pub fn green() -> &'static str {
    code(GREEN)
}

pub fn yellow() -> &'static str {
    code(YELLOW)
}

pub fn cyan() -> &'static str {
    code(CYAN)
}

//! Terminal output utilities: ANSI colour when the terminal supports it.

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

/// Wrap `text` in `style` if colour is enabled.
pub fn paint(style: &str, text: &str) -> String {
    if supports_color() {
        format!("{style}{text}{RESET}")
    } else {
        text.to_string()
    }
}

pub fn ok(text: &str) -> String {
    paint(GREEN, text)
}

pub fn warn(text: &str) -> String {
    paint(YELLOW, text)
}

pub fn fail(text: &str) -> String {
    paint(RED, text)
}

pub fn heading(text: &str) -> String {
    paint(BOLD, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_keeps_the_text() {
        assert!(paint(BOLD, "ready").contains("ready"));
        assert!(fail("failed").contains("failed"));
    }
}

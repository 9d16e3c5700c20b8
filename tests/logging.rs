use procpump::logging::{ansi_enabled, parse_level_str};
use tracing::Level;

#[test]
fn colours_only_on_a_terminal_without_no_color() {
    assert!(ansi_enabled(true, false));
    assert!(!ansi_enabled(false, false));
    assert!(!ansi_enabled(true, true));
    assert!(!ansi_enabled(false, true));
}

#[test]
fn level_strings_are_case_insensitive() {
    assert_eq!(parse_level_str("debug"), Some(Level::DEBUG));
    assert_eq!(parse_level_str(" WARNING "), Some(Level::WARN));
    assert_eq!(parse_level_str("Trace"), Some(Level::TRACE));
    assert_eq!(parse_level_str("loud"), None);
}

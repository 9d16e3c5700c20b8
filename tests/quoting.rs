use procpump::args::{quote, quote_with, render, try_render, QuoteOptions};
use procpump::errors::ArgsError;

#[test]
fn plain_argument_is_unchanged() {
    assert_eq!(quote("hello").unwrap(), "hello");
}

#[test]
fn argument_with_space_gets_double_quotes() {
    assert_eq!(quote("hello world").unwrap(), r#""hello world""#);
}

#[test]
fn argument_with_double_quote_gets_single_quotes() {
    assert_eq!(quote(r#"say "hi""#).unwrap(), r#"'say "hi"'"#);
}

#[test]
fn argument_with_single_quote_gets_double_quotes() {
    assert_eq!(quote("it's").unwrap(), r#""it's""#);
}

#[test]
fn both_quote_kinds_are_ambiguous() {
    match quote(r#"it's "quoted""#) {
        Err(ArgsError::AmbiguousQuoting { argument }) => assert_eq!(argument, r#"it's "quoted""#),
        other => panic!("expected AmbiguousQuoting, got {other:?}"),
    }
}

#[test]
fn escaping_replaces_wrapping() {
    let opts = QuoteOptions {
        escape_single_quotes: true,
        escape_double_quotes: true,
        ..QuoteOptions::default()
    };
    assert_eq!(quote_with(r#"say "hi""#, &opts).unwrap(), r#"\'say "hi"\'"#);
    assert_eq!(quote_with("it's", &opts).unwrap(), r#"\"it's\""#);
    assert_eq!(quote_with("a b", &opts).unwrap(), r#"\"a b\""#);
}

#[test]
fn existing_quotes_pass_through_without_wrap() {
    let opts = QuoteOptions {
        wrap_existing_quotes: false,
        ..QuoteOptions::default()
    };
    assert_eq!(quote_with("it's", &opts).unwrap(), "it's");
    assert_eq!(quote_with(r#"say "hi""#, &opts).unwrap(), r#"say "hi""#);
    // Spaces are still quoted.
    assert_eq!(quote_with("a b", &opts).unwrap(), r#""a b""#);
}

#[test]
fn force_wraps_everything() {
    let opts = QuoteOptions {
        force: true,
        ..QuoteOptions::default()
    };
    assert_eq!(quote_with("hello", &opts).unwrap(), r#""hello""#);
    assert_eq!(quote_with(r#"x"y"#, &opts).unwrap(), r#"'x"y'"#);
}

#[test]
fn render_joins_quoted_arguments() {
    assert_eq!(render(&["ls", "-la", "my dir"]), r#"ls -la "my dir""#);
}

#[test]
fn render_of_empty_vector_is_empty() {
    assert_eq!(render::<&str>(&[]), "");
}

#[test]
fn render_passes_unquotable_argument_through() {
    let line = render(&["echo", r#"it's "x""#, "after"]);
    assert_eq!(line, r#"echo it's "x" after"#);
}

#[test]
fn try_render_collects_every_failure() {
    match try_render(&["ok", r#"a'"b"#, "fine", r#"c"'d"#]) {
        Err(ArgsError::Unquotable { failures }) => {
            assert_eq!(failures.len(), 2);
            assert!(failures
                .iter()
                .all(|f| matches!(f, ArgsError::AmbiguousQuoting { .. })));
        }
        other => panic!("expected Unquotable, got {other:?}"),
    }

    assert_eq!(try_render(&["a", "b c"]).unwrap(), r#"a "b c""#);
}

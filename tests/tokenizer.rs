use procpump::args::tokenize;
use procpump::errors::ArgsError;

#[test]
fn empty_input_yields_empty_vector() {
    assert_eq!(tokenize("").unwrap(), Vec::<String>::new());
    assert_eq!(tokenize("   ").unwrap(), Vec::<String>::new());
}

#[test]
fn double_quotes_group_words() {
    assert_eq!(tokenize(r#"a "b c" d"#).unwrap(), vec!["a", "b c", "d"]);
}

#[test]
fn single_quotes_group_words() {
    assert_eq!(tokenize("echo 'hello world'").unwrap(), vec!["echo", "hello world"]);
}

#[test]
fn repeated_spaces_do_not_produce_empty_arguments() {
    assert_eq!(tokenize("  ls   -la  ").unwrap(), vec!["ls", "-la"]);
}

#[test]
fn other_quote_is_literal_inside_quotes() {
    assert_eq!(tokenize(r#"echo "it's""#).unwrap(), vec!["echo", "it's"]);
    assert_eq!(tokenize(r#"echo 'say "hi"'"#).unwrap(), vec!["echo", r#"say "hi""#]);
}

#[test]
fn quotes_join_adjacent_text() {
    assert_eq!(tokenize(r#"--name="a b"c"#).unwrap(), vec!["--name=a bc"]);
}

#[test]
fn empty_quotes_are_dropped() {
    assert_eq!(tokenize(r#"a "" b"#).unwrap(), vec!["a", "b"]);
}

#[test]
fn tabs_are_not_separators() {
    assert_eq!(tokenize("a\tb c").unwrap(), vec!["a\tb", "c"]);
}

#[test]
fn unbalanced_double_quote_is_malformed() {
    match tokenize(r#"a "b"#) {
        Err(ArgsError::MalformedInput { input }) => assert_eq!(input, r#"a "b"#),
        other => panic!("expected MalformedInput, got {other:?}"),
    }
}

#[test]
fn unbalanced_single_quote_is_malformed() {
    assert!(matches!(
        tokenize("echo 'oops"),
        Err(ArgsError::MalformedInput { .. })
    ));
}

// src/args/tokenizer.rs

use crate::errors::ArgsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    InSingleQuote,
    InDoubleQuote,
}

/// Split a command-line string into its arguments.
///
/// Spaces separate arguments outside quotes. Single and double quotes group
/// text (including spaces and the other quote character) into one argument
/// and are themselves dropped. There is no escape character: a quote cannot
/// appear inside quotes of its own kind.
///
/// Empty input yields an empty vector. Input that ends inside a quote fails
/// with [`ArgsError::MalformedInput`].
pub fn tokenize(input: &str) -> Result<Vec<String>, ArgsError> {
    let mut state = State::Normal;
    let mut args = Vec::new();
    let mut current = String::new();

    for ch in input.chars() {
        match (state, ch) {
            (State::InSingleQuote, '\'') | (State::InDoubleQuote, '"') => {
                state = State::Normal;
            }
            (State::InSingleQuote | State::InDoubleQuote, c) => current.push(c),
            (State::Normal, '\'') => state = State::InSingleQuote,
            (State::Normal, '"') => state = State::InDoubleQuote,
            (State::Normal, ' ') => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            (State::Normal, c) => current.push(c),
        }
    }

    if state != State::Normal {
        return Err(ArgsError::MalformedInput {
            input: input.to_string(),
        });
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

// src/args/quote.rs

use serde::Deserialize;
use tracing::warn;

use crate::errors::ArgsError;

/// Knobs for [`quote_with`], also read from the `[quote]` config section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QuoteOptions {
    /// Surround arguments containing `"` with `\'` instead of `'`.
    pub escape_single_quotes: bool,

    /// Surround arguments containing `'` or a space with `\"` instead of `"`.
    pub escape_double_quotes: bool,

    /// Wrap arguments that already contain a quote character. When false
    /// such arguments pass through unchanged.
    pub wrap_existing_quotes: bool,

    /// Wrap every argument, even ones that need no quoting.
    pub force: bool,
}

impl Default for QuoteOptions {
    fn default() -> Self {
        Self {
            escape_single_quotes: false,
            escape_double_quotes: false,
            wrap_existing_quotes: true,
            force: false,
        }
    }
}

/// Quote a single argument with the default options.
///
/// - `hello` -> `hello`
/// - `hello world` -> `"hello world"`
/// - `say "hi"` -> `'say "hi"'`
/// - `it's` -> `"it's"`
pub fn quote(argument: &str) -> Result<String, ArgsError> {
    quote_with(argument, &QuoteOptions::default())
}

/// Quote a single argument.
///
/// Fails with [`ArgsError::AmbiguousQuoting`] when the argument contains both
/// quote characters, since neither wrapping makes it safe.
pub fn quote_with(argument: &str, options: &QuoteOptions) -> Result<String, ArgsError> {
    let has_double = argument.contains('"');
    let has_single = argument.contains('\'');

    if has_double && has_single {
        return Err(ArgsError::AmbiguousQuoting {
            argument: argument.to_string(),
        });
    }

    let wrap_existing = options.wrap_existing_quotes || options.force;

    let quoted = if has_double {
        if options.escape_single_quotes {
            format!("\\'{argument}\\'")
        } else if wrap_existing {
            format!("'{argument}'")
        } else {
            argument.to_string()
        }
    } else if has_single {
        if options.escape_double_quotes {
            format!("\\\"{argument}\\\"")
        } else if wrap_existing {
            format!("\"{argument}\"")
        } else {
            argument.to_string()
        }
    } else if argument.contains(' ') || options.force {
        if options.escape_double_quotes {
            format!("\\\"{argument}\\\"")
        } else {
            format!("\"{argument}\"")
        }
    } else {
        argument.to_string()
    };

    Ok(quoted)
}

/// Render a whole argument vector as one command-line string.
///
/// Each argument is quoted independently and joined with single spaces. An
/// argument that cannot be quoted is logged and written through as-is, so the
/// result stays usable for diagnostics. Use [`try_render`] to get the
/// failures instead.
pub fn render<S: AsRef<str>>(args: &[S]) -> String {
    let mut line = String::new();

    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            line.push(' ');
        }
        let arg = arg.as_ref();
        match quote(arg) {
            Ok(quoted) => line.push_str(&quoted),
            Err(e) => {
                warn!(argument = %arg, error = %e, "error quoting argument; passing it through unquoted");
                line.push_str(arg);
            }
        }
    }

    line
}

/// Like [`render`], but fails with [`ArgsError::Unquotable`] listing every
/// argument that could not be quoted.
pub fn try_render<S: AsRef<str>>(args: &[S]) -> Result<String, ArgsError> {
    let mut quoted = Vec::with_capacity(args.len());
    let mut failures = Vec::new();

    for arg in args {
        match quote(arg.as_ref()) {
            Ok(q) => quoted.push(q),
            Err(e) => failures.push(e),
        }
    }

    if failures.is_empty() {
        Ok(quoted.join(" "))
    } else {
        Err(ArgsError::Unquotable { failures })
    }
}

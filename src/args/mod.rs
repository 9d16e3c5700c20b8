// src/args/mod.rs

//! Command-line string handling.
//!
//! - [`tokenizer`] splits one string into an argument vector.
//! - [`quote`] goes the other way: quotes single arguments and renders a
//!   vector back into a string that [`tokenize`] reads back unchanged (as long
//!   as no argument holds both quote characters).

pub mod quote;
pub mod tokenizer;

pub use quote::{quote, quote_with, render, try_render, QuoteOptions};
pub use tokenizer::tokenize;

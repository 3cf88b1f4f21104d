//! Table-driven command-line option dispatcher.
//!
//! The caller declares an [`OptionTable`] of descriptors, each with a
//! spelling, an [`Arity`] and a handler. The dispatch engine walks the
//! argument vector, resolves option values and calls the matching handler:
//! - long options `--name`, `--name=value`, `--name = value`
//! - short option clusters `-abc`, `-ivalue`, `-l=value`
//! - negative numbers (`-7`) end option scanning like any positional
//! - handlers answer with a tri-state [`Outcome`]
//!
//! Scanning stops at the first non-option token and returns its index, so a
//! caller can resume with [`parse_at`] and interleave options and positional
//! arguments.
//!
//! ```
//! # #[cfg(all(feature = "arity-none", feature = "arity-required"))]
//! # fn main() {
//! use clop::{Arity, OptionDescriptor, OptionTable, Outcome, ParseContext};
//!
//! #[derive(Default)]
//! struct Settings {
//!     verbose: bool,
//!     level: Option<String>,
//! }
//!
//! let table = OptionTable::builder()
//!     .option(
//!         OptionDescriptor::new(Arity::None, |ctx: &mut ParseContext<Settings>| {
//!             ctx.user_mut().verbose = true;
//!             Outcome::Ok
//!         })
//!         .short('v')
//!         .long("verbose"),
//!     )
//!     .option(
//!         OptionDescriptor::new(Arity::Required, |ctx: &mut ParseContext<Settings>| {
//!             let level = ctx.value().map(str::to_string);
//!             ctx.user_mut().level = level;
//!             Outcome::Ok
//!         })
//!         .long("level"),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let argv: Vec<String> = ["prog", "-v", "--level=3", "input"]
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//! let mut settings = Settings::default();
//! let next = clop::parse(&argv, &table, &mut settings).unwrap();
//! assert_eq!(next, 3);
//! assert!(settings.verbose);
//! assert_eq!(settings.level.as_deref(), Some("3"));
//! # }
//! # #[cfg(not(all(feature = "arity-none", feature = "arity-required")))]
//! # fn main() {}
//! ```

#[cfg(not(any(
    feature = "arity-none",
    feature = "arity-required",
    feature = "arity-optional"
)))]
compile_error!("at least one of the arity-none, arity-required or arity-optional features must be enabled");

pub mod context;
pub mod error;
pub mod help;
pub mod outcome;
pub mod parser;
pub mod table;

pub use context::ParseContext;
pub use error::{ParseError, Result, TableError};
pub use help::HelpRenderer;
pub use outcome::Outcome;
pub use parser::Parser;
pub use table::{Arity, Handler, OptionDescriptor, OptionTable, TableBuilder};

// ============================================================================
// Entry points writing diagnostics to stderr
// ============================================================================

/// Scan `argv` from index 1, the classical "options first" layout.
pub fn parse<U>(argv: &[String], table: &OptionTable<'_, U>, user: &mut U) -> Result<usize> {
    Parser::new(table).parse(argv, user)
}

/// Scan `argv` starting at `offset`.
///
/// Returns the index of the first token that is not an option. The index
/// equals `argv.len()` when every token was consumed.
pub fn parse_at<U>(
    offset: usize,
    argv: &[String],
    table: &OptionTable<'_, U>,
    user: &mut U,
) -> Result<usize> {
    Parser::new(table).parse_at(offset, argv, user)
}

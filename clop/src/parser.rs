//! The dispatch engine.
//!
//! A scan walks the argument vector from an offset, classifies every token,
//! resolves option values and hands each recognized option to its handler.
//! It stops at the first token that is not an option and returns its index.

use std::fmt;
use std::io::{self, Write};

use tracing::debug;

use crate::context::ParseContext;
use crate::error::{ParseError, Result};
use crate::outcome::Outcome;
use crate::table::{Arity, OptionDescriptor, OptionTable};

// ============================================================================
// Parser
// ============================================================================

/// Runs scans over one option table, writing diagnostics to `W`.
///
/// Diagnostics are one line each, prefixed with `argv[0]`, e.g.
/// `prog: unrecognized option -z`.
pub struct Parser<'t, 'a, U, W = io::Stderr> {
    table: &'t OptionTable<'a, U>,
    diagnostics: W,
}

impl<'t, 'a, U> Parser<'t, 'a, U> {
    pub fn new(table: &'t OptionTable<'a, U>) -> Self {
        Parser {
            table,
            diagnostics: io::stderr(),
        }
    }
}

impl<'t, 'a, U, W: Write> Parser<'t, 'a, U, W> {
    pub fn with_diagnostics(table: &'t OptionTable<'a, U>, diagnostics: W) -> Self {
        Parser { table, diagnostics }
    }

    /// Scan from index 1, skipping the program name.
    pub fn parse(&mut self, argv: &[String], user: &mut U) -> Result<usize> {
        self.parse_at(1, argv, user)
    }

    /// Scan from `offset`.
    ///
    /// `Ok(n)` is the index of the first non-option token, `argv.len()` when
    /// the options ran to the end. Unrecognized options and soft handler
    /// failures let the scan go on and turn the result into
    /// [`ParseError::Failed`] at the end; malformed tokens and aborting
    /// handlers stop it immediately.
    pub fn parse_at(&mut self, offset: usize, argv: &[String], user: &mut U) -> Result<usize> {
        let mut scan = Scan {
            argv,
            table: self.table,
            diagnostics: &mut self.diagnostics,
            user,
            index: offset,
            errors: 0,
        };
        scan.run()
    }

    pub fn table(&self) -> &'t OptionTable<'a, U> {
        self.table
    }

    pub fn diagnostics(&self) -> &W {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> W {
        self.diagnostics
    }
}

// ============================================================================
// Scan: state of one parse_at call
// ============================================================================

struct Scan<'p, 'a, U, W> {
    argv: &'p [String],
    table: &'p OptionTable<'a, U>,
    diagnostics: &'p mut W,
    user: &'p mut U,
    index: usize,
    errors: usize,
}

impl<'p, 'a, U, W: Write + 'p> Scan<'p, 'a, U, W> {
    fn run(&mut self) -> Result<usize> {
        let argv = self.argv;
        while let Some(token) = argv.get(self.index) {
            let Some(body) = token.strip_prefix('-') else {
                break;
            };
            if body.is_empty() {
                return Err(self.fatal(ParseError::MissingOption { index: self.index }));
            }

            #[cfg(feature = "negative-numbers")]
            if body.starts_with(|c: char| c.is_ascii_digit()) {
                tracing::trace!(index = self.index, token = %token, "negative number ends option scan");
                break;
            }

            match body.strip_prefix('-') {
                Some(long) => self.long_option(long)?,
                None => self.short_cluster(body)?,
            }
            self.index += 1;
        }

        if self.errors > 0 {
            debug!(errors = self.errors, index = self.index, "option scan failed");
            return Err(ParseError::Failed {
                errors: self.errors,
            });
        }
        Ok(self.index)
    }

    /// `text` is the token without its leading `--`.
    fn long_option(&mut self, text: &'p str) -> Result<()> {
        if text.is_empty() {
            return Err(self.fatal(ParseError::MissingLongOption { index: self.index }));
        }

        let (name, attached) = match text.find('=') {
            Some(pos) => (&text[..pos], Some(&text[pos + 1..])),
            None => (text, None),
        };

        let table = self.table;
        let Some(descriptor) = table.find_long(name) else {
            self.errors += 1;
            self.report(format_args!("unrecognized long option --{}", text));
            return Ok(());
        };

        let value = match descriptor.arity() {
            #[cfg(feature = "arity-none")]
            Arity::None => {
                if let Some(extra) = attached {
                    debug!(option = name, value = extra, "value of option without argument ignored");
                }
                None
            }
            #[cfg(feature = "arity-required")]
            Arity::Required => match attached {
                Some(v) if !v.is_empty() => Some(v),
                _ => match self.take_next() {
                    Some(v) => Some(v),
                    None => {
                        return Err(self.fatal(ParseError::MissingLongArgument {
                            name: name.to_string(),
                        }))
                    }
                },
            },
            #[cfg(feature = "arity-optional")]
            Arity::Optional => match attached {
                // --name=value
                Some(v) if !v.is_empty() => Some(v),
                // --name= value
                Some(_) => match self.take_next() {
                    Some(v) => Some(v),
                    None => {
                        return Err(self.fatal(ParseError::MissingLongValueAfterEquals {
                            name: name.to_string(),
                        }))
                    }
                },
                // --name =value, --name = value, or no value at all
                None => self.detached_value(|| ParseError::MissingLongValueAfterEquals {
                    name: name.to_string(),
                })?,
            },
        };

        self.dispatch(descriptor, value)
    }

    /// `cluster` is the token without its leading `-`.
    #[cfg_attr(
        not(any(feature = "arity-required", feature = "arity-optional")),
        allow(unused_variables)
    )]
    fn short_cluster(&mut self, cluster: &'p str) -> Result<()> {
        let table = self.table;
        for (pos, c) in cluster.char_indices() {
            let Some(descriptor) = table.find_short(c) else {
                self.errors += 1;
                self.report(format_args!("unrecognized option -{}", c));
                continue;
            };

            #[cfg(any(feature = "arity-required", feature = "arity-optional"))]
            let rest = &cluster[pos + c.len_utf8()..];

            match descriptor.arity() {
                #[cfg(feature = "arity-none")]
                Arity::None => self.dispatch(descriptor, None)?,
                #[cfg(feature = "arity-required")]
                Arity::Required => {
                    // The rest of the token is the value verbatim, a leading '=' included.
                    let value = if !rest.is_empty() {
                        rest
                    } else {
                        match self.take_next() {
                            Some(v) => v,
                            None => {
                                return Err(
                                    self.fatal(ParseError::MissingShortArgument { short: c })
                                )
                            }
                        }
                    };
                    return self.dispatch(descriptor, Some(value));
                }
                #[cfg(feature = "arity-optional")]
                Arity::Optional => {
                    let value = match rest.strip_prefix('=') {
                        Some(v) if !v.is_empty() => Some(v),
                        Some(_) => match self.take_next() {
                            Some(v) => Some(v),
                            None => {
                                return Err(self.fatal(
                                    ParseError::MissingShortValueAfterEquals { short: c },
                                ))
                            }
                        },
                        None if rest.is_empty() => self.detached_value(|| {
                            ParseError::MissingShortValueAfterEquals { short: c }
                        })?,
                        None => None,
                    };
                    self.dispatch(descriptor, value)?;
                    if value.is_some() {
                        return Ok(());
                    }
                }
            }
        }
        Ok(())
    }

    /// Consume the following token as a value.
    #[cfg(any(feature = "arity-required", feature = "arity-optional"))]
    fn take_next(&mut self) -> Option<&'p str> {
        let argv = self.argv;
        let next = argv.get(self.index + 1)?;
        self.index += 1;
        Some(next.as_str())
    }

    /// Value written after a detached `=`: `=value` as one token, or `=`
    /// followed by the value. Any other following token is left alone.
    #[cfg(feature = "arity-optional")]
    fn detached_value(
        &mut self,
        missing: impl FnOnce() -> ParseError,
    ) -> Result<Option<&'p str>> {
        let argv = self.argv;
        let Some(rest) = argv
            .get(self.index + 1)
            .and_then(|token| token.strip_prefix('='))
        else {
            return Ok(None);
        };
        self.index += 1;
        if !rest.is_empty() {
            return Ok(Some(rest));
        }
        match self.take_next() {
            Some(v) => Ok(Some(v)),
            None => Err(self.fatal(missing())),
        }
    }

    fn dispatch(
        &mut self,
        descriptor: &'p OptionDescriptor<'a, U>,
        value: Option<&'p str>,
    ) -> Result<()> {
        debug!(option = %descriptor, index = self.index, value = ?value, "dispatching option");
        let mut ctx = ParseContext {
            argv: self.argv,
            table: self.table,
            descriptor,
            index: self.index,
            value,
            user: &mut *self.user,
            diagnostics: &mut *self.diagnostics,
        };
        match descriptor.call(&mut ctx) {
            Outcome::Ok => Ok(()),
            Outcome::Fail => {
                self.errors += 1;
                Ok(())
            }
            Outcome::Abort(code) => {
                let code = code.min(-1);
                debug!(code, option = %descriptor, "handler aborted option scan");
                Err(ParseError::Aborted { code })
            }
        }
    }

    fn report(&mut self, message: fmt::Arguments<'_>) {
        let program = self.argv.first().map(String::as_str).unwrap_or("");
        write_diagnostic(&mut *self.diagnostics, program, message);
    }

    fn fatal(&mut self, err: ParseError) -> ParseError {
        self.report(format_args!("{}", err));
        debug!(index = self.index, error = %err, "option scan aborted");
        err
    }
}

/// Write one `program: message` line. A failing sink does not stop the scan.
pub(crate) fn write_diagnostic<W: Write + ?Sized>(out: &mut W, program: &str, message: fmt::Arguments<'_>) {
    if let Err(err) = writeln!(out, "{}: {}", program, message) {
        debug!(error = %err, "diagnostic sink rejected write");
    }
}

#[cfg(all(
    test,
    feature = "arity-none",
    feature = "arity-required",
    feature = "arity-optional",
    feature = "negative-numbers"
))]
mod tests {
    use super::*;
    use std::cell::Cell;

    type Calls = Vec<(i32, Option<String>)>;

    fn record(ctx: &mut ParseContext<'_, '_, Calls>) -> Outcome {
        let call = (ctx.id(), ctx.value().map(str::to_string));
        ctx.user_mut().push(call);
        Outcome::Ok
    }

    fn soft_fail(ctx: &mut ParseContext<'_, '_, Calls>) -> Outcome {
        record(ctx);
        Outcome::Fail
    }

    fn abort(ctx: &mut ParseContext<'_, '_, Calls>) -> Outcome {
        record(ctx);
        Outcome::Abort(-7)
    }

    fn table() -> OptionTable<'static, Calls> {
        OptionTable::builder()
            .option(OptionDescriptor::flag(record).short('a').set_id(1))
            .option(OptionDescriptor::flag(record).short('b').set_id(2))
            .option(OptionDescriptor::flag(record).short('c').set_id(3))
            .option(
                OptionDescriptor::required(record)
                    .short('i')
                    .long("integer")
                    .set_id(4),
            )
            .option(
                OptionDescriptor::optional(record)
                    .short('l')
                    .long("logfile")
                    .set_id(5),
            )
            .option(OptionDescriptor::flag(record).short('h').long("help").set_id(6))
            .option(OptionDescriptor::flag(soft_fail).long("fail").set_id(7))
            .option(OptionDescriptor::flag(abort).long("abort").set_id(8))
            .build()
            .unwrap()
    }

    fn argv(tokens: &[&str]) -> Vec<String> {
        std::iter::once("prog")
            .chain(tokens.iter().copied())
            .map(String::from)
            .collect()
    }

    fn run(tokens: &[&str]) -> (Result<usize>, Calls, String) {
        let table = table();
        let argv = argv(tokens);
        let mut calls = Calls::new();
        let mut parser = Parser::with_diagnostics(&table, Vec::new());
        let result = parser.parse(&argv, &mut calls);
        let diagnostics = String::from_utf8(parser.into_diagnostics()).unwrap();
        (result, calls, diagnostics)
    }

    fn call(id: i32, value: Option<&str>) -> (i32, Option<String>) {
        (id, value.map(str::to_string))
    }

    // -- classification --

    #[test]
    fn empty_vector_consumes_nothing() {
        let (result, calls, diag) = run(&[]);
        assert_eq!(result, Ok(1));
        assert!(calls.is_empty());
        assert!(diag.is_empty());
    }

    #[test]
    fn stops_at_first_positional() {
        let (result, calls, _) = run(&["-a", "file", "-b"]);
        assert_eq!(result, Ok(2));
        assert_eq!(calls, vec![call(1, None)]);
    }

    #[test]
    fn all_options_consumed_returns_len() {
        let (result, calls, _) = run(&["-a", "-b"]);
        assert_eq!(result, Ok(3));
        assert_eq!(calls, vec![call(1, None), call(2, None)]);
    }

    #[test]
    fn negative_number_ends_scan() {
        let (result, calls, diag) = run(&["-a", "-7", "-b"]);
        assert_eq!(result, Ok(2));
        assert_eq!(calls, vec![call(1, None)]);
        assert!(diag.is_empty());
    }

    #[test]
    fn negative_number_wins_over_digit_option() {
        let table: OptionTable<'static, Calls> = OptionTable::builder()
            .option(OptionDescriptor::flag(record).short('7'))
            .build()
            .unwrap();
        let argv = argv(&["-7"]);
        let mut calls = Calls::new();
        let mut parser = Parser::with_diagnostics(&table, Vec::new());
        assert_eq!(parser.parse(&argv, &mut calls), Ok(1));
        assert!(calls.is_empty());
    }

    #[test]
    fn lone_dash_is_fatal() {
        let (result, calls, diag) = run(&["-a", "-", "-b"]);
        assert_eq!(result, Err(ParseError::MissingOption { index: 2 }));
        assert_eq!(calls, vec![call(1, None)]);
        assert_eq!(diag, "prog: missing option -?\n");
    }

    #[test]
    fn lone_double_dash_is_fatal() {
        let (result, calls, diag) = run(&["--", "-a"]);
        assert_eq!(result, Err(ParseError::MissingLongOption { index: 1 }));
        assert!(calls.is_empty());
        assert_eq!(diag, "prog: missing long option --???\n");
    }

    // -- short clusters --

    #[test]
    fn cluster_order_does_not_matter() {
        for token in ["-abc", "-bca", "-cab", "-acb"] {
            let (result, calls, _) = run(&[token]);
            assert_eq!(result, Ok(2), "{}", token);
            let mut ids: Vec<i32> = calls.iter().map(|(id, _)| *id).collect();
            ids.sort();
            assert_eq!(ids, vec![1, 2, 3], "{}", token);
        }
    }

    #[test]
    fn unknown_short_in_cluster_is_soft() {
        let (result, calls, diag) = run(&["-azb", "-c"]);
        assert_eq!(result, Err(ParseError::Failed { errors: 1 }));
        assert_eq!(calls, vec![call(1, None), call(2, None), call(3, None)]);
        assert_eq!(diag, "prog: unrecognized option -z\n");
    }

    #[test]
    fn non_ascii_short_option() {
        let table: OptionTable<'static, Calls> = OptionTable::builder()
            .option(OptionDescriptor::flag(record).short('é').set_id(1))
            .option(OptionDescriptor::required(record).short('ß').set_id(2))
            .build()
            .unwrap();
        let argv = argv(&["-éßwert"]);
        let mut calls = Calls::new();
        let mut parser = Parser::with_diagnostics(&table, Vec::new());
        assert_eq!(parser.parse(&argv, &mut calls), Ok(2));
        assert_eq!(calls, vec![call(1, None), call(2, Some("wert"))]);
    }

    // -- required values --

    #[test]
    fn required_short_and_long_separate_token() {
        let (result, calls, _) = run(&["-i", "42", "rest"]);
        assert_eq!(result, Ok(3));
        assert_eq!(calls, vec![call(4, Some("42"))]);

        let (result, calls, _) = run(&["--integer", "42"]);
        assert_eq!(result, Ok(3));
        assert_eq!(calls, vec![call(4, Some("42"))]);
    }

    #[test]
    fn required_attached_values() {
        let (_, calls, _) = run(&["-i42"]);
        assert_eq!(calls, vec![call(4, Some("42"))]);

        let (_, calls, _) = run(&["--integer=42"]);
        assert_eq!(calls, vec![call(4, Some("42"))]);
    }

    #[test]
    fn required_short_keeps_equals_sign() {
        let (result, calls, _) = run(&["-i=42"]);
        assert_eq!(result, Ok(2));
        assert_eq!(calls, vec![call(4, Some("=42"))]);
    }

    #[test]
    fn required_short_claims_rest_of_cluster() {
        let (_, calls, _) = run(&["-aib"]);
        assert_eq!(calls, vec![call(1, None), call(4, Some("b"))]);

        let (result, calls, _) = run(&["-ai", "-b"]);
        assert_eq!(result, Ok(3));
        assert_eq!(calls, vec![call(1, None), call(4, Some("-b"))]);
    }

    #[test]
    fn required_long_with_empty_attachment_takes_next() {
        let (result, calls, _) = run(&["--integer=", "7"]);
        assert_eq!(result, Ok(3));
        assert_eq!(calls, vec![call(4, Some("7"))]);
    }

    #[test]
    fn required_missing_at_end_is_fatal() {
        let (result, calls, diag) = run(&["-a", "-i"]);
        assert_eq!(result, Err(ParseError::MissingShortArgument { short: 'i' }));
        assert_eq!(calls, vec![call(1, None)]);
        assert_eq!(diag, "prog: missing argument for option 'i'\n");

        let (result, _, diag) = run(&["--integer"]);
        assert_eq!(
            result,
            Err(ParseError::MissingLongArgument {
                name: "integer".to_string()
            })
        );
        assert_eq!(diag, "prog: missing argument of long option --integer\n");
    }

    // -- optional values, long form --

    #[test]
    fn optional_long_without_equals_has_no_value() {
        let (result, calls, _) = run(&["--logfile"]);
        assert_eq!(result, Ok(2));
        assert_eq!(calls, vec![call(5, None)]);

        let (result, calls, _) = run(&["--logfile", "/tmp/x"]);
        assert_eq!(result, Ok(2));
        assert_eq!(calls, vec![call(5, None)]);
    }

    #[test]
    fn optional_long_equals_forms() {
        let (result, calls, _) = run(&["--logfile=/tmp/x"]);
        assert_eq!(result, Ok(2));
        assert_eq!(calls, vec![call(5, Some("/tmp/x"))]);

        let (result, calls, _) = run(&["--logfile=", "/tmp/x"]);
        assert_eq!(result, Ok(3));
        assert_eq!(calls, vec![call(5, Some("/tmp/x"))]);

        let (result, calls, _) = run(&["--logfile", "=", "/tmp/x"]);
        assert_eq!(result, Ok(4));
        assert_eq!(calls, vec![call(5, Some("/tmp/x"))]);

        let (result, calls, _) = run(&["--logfile", "=/tmp/x", "arg"]);
        assert_eq!(result, Ok(3));
        assert_eq!(calls, vec![call(5, Some("/tmp/x"))]);
    }

    #[test]
    fn optional_long_dangling_equals_is_fatal() {
        let expected = Err(ParseError::MissingLongValueAfterEquals {
            name: "logfile".to_string(),
        });
        let (result, calls, diag) = run(&["--logfile="]);
        assert_eq!(result, expected);
        assert!(calls.is_empty());
        assert_eq!(diag, "prog: missing argument after '=' of long option --logfile\n");

        let (result, _, _) = run(&["--logfile", "="]);
        assert_eq!(result, expected);
    }

    // -- optional values, short form --

    #[test]
    fn optional_short_forms() {
        let (result, calls, _) = run(&["-l"]);
        assert_eq!(result, Ok(2));
        assert_eq!(calls, vec![call(5, None)]);

        let (_, calls, _) = run(&["-l=/x"]);
        assert_eq!(calls, vec![call(5, Some("/x"))]);

        let (result, calls, _) = run(&["-l=", "/x"]);
        assert_eq!(result, Ok(3));
        assert_eq!(calls, vec![call(5, Some("/x"))]);

        let (result, calls, _) = run(&["-l", "=", "/x"]);
        assert_eq!(result, Ok(4));
        assert_eq!(calls, vec![call(5, Some("/x"))]);

        let (result, calls, _) = run(&["-l", "=/x"]);
        assert_eq!(result, Ok(3));
        assert_eq!(calls, vec![call(5, Some("/x"))]);

        let (result, calls, _) = run(&["-l", "/x"]);
        assert_eq!(result, Ok(2));
        assert_eq!(calls, vec![call(5, None)]);
    }

    #[test]
    fn optional_short_inside_cluster() {
        let (_, calls, _) = run(&["-lab"]);
        assert_eq!(calls, vec![call(5, None), call(1, None), call(2, None)]);

        let (_, calls, _) = run(&["-al=xb"]);
        assert_eq!(calls, vec![call(1, None), call(5, Some("xb"))]);

        // Only the last option of a token looks at the next token.
        let (result, calls, _) = run(&["-la", "=x"]);
        assert_eq!(result, Ok(2));
        assert_eq!(calls, vec![call(5, None), call(1, None)]);
    }

    #[test]
    fn optional_short_dangling_equals_is_fatal() {
        let expected = Err(ParseError::MissingShortValueAfterEquals { short: 'l' });
        let (result, _, diag) = run(&["-l="]);
        assert_eq!(result, expected);
        assert_eq!(diag, "prog: missing argument after '=' of short option -l\n");

        let (result, _, _) = run(&["-l", "="]);
        assert_eq!(result, expected);
    }

    // -- no-argument long options --

    #[test]
    fn flag_ignores_attached_value() {
        let (result, calls, diag) = run(&["--help=yes"]);
        assert_eq!(result, Ok(2));
        assert_eq!(calls, vec![call(6, None)]);
        assert!(diag.is_empty());
    }

    // -- error aggregation --

    #[test]
    fn unknown_long_option_fails_at_end() {
        let (result, calls, diag) = run(&["--bogus"]);
        assert_eq!(result, Err(ParseError::Failed { errors: 1 }));
        assert_eq!(result.unwrap_err().code(), -1);
        assert!(calls.is_empty());
        assert_eq!(diag, "prog: unrecognized long option --bogus\n");
    }

    #[test]
    fn unknown_long_option_reports_whole_token() {
        let (_, _, diag) = run(&["--bogus=1", "--nope"]);
        assert_eq!(
            diag,
            "prog: unrecognized long option --bogus=1\nprog: unrecognized long option --nope\n"
        );
    }

    #[test]
    fn soft_failure_keeps_scanning() {
        let (result, calls, _) = run(&["--fail", "-a", "--fail"]);
        assert_eq!(result, Err(ParseError::Failed { errors: 2 }));
        assert_eq!(calls, vec![call(7, None), call(1, None), call(7, None)]);
    }

    #[test]
    fn abort_stops_immediately_with_handler_code() {
        let (result, calls, _) = run(&["--abort", "-a"]);
        assert_eq!(result, Err(ParseError::Aborted { code: -7 }));
        assert_eq!(result.unwrap_err().code(), -7);
        assert_eq!(calls, vec![call(8, None)]);
    }

    #[test]
    fn fatal_token_wins_over_earlier_soft_errors() {
        let (result, _, diag) = run(&["--bogus", "-"]);
        assert_eq!(result, Err(ParseError::MissingOption { index: 2 }));
        assert_eq!(
            diag,
            "prog: unrecognized long option --bogus\nprog: missing option -?\n"
        );
    }

    #[test]
    fn soft_errors_reported_even_when_stopping_at_positional() {
        let (result, _, _) = run(&["-z", "file"]);
        assert_eq!(result, Err(ParseError::Failed { errors: 1 }));
    }

    #[test]
    fn abort_code_is_never_positive() {
        let table: OptionTable<'static, ()> = OptionTable::builder()
            .option(OptionDescriptor::flag(|_: &mut ParseContext<()>| Outcome::Abort(3)).short('x'))
            .build()
            .unwrap();
        let argv = argv(&["-x"]);
        let mut parser = Parser::with_diagnostics(&table, Vec::new());
        assert_eq!(
            parser.parse(&argv, &mut ()),
            Err(ParseError::Aborted { code: -1 })
        );
    }

    // -- handler context --

    #[test]
    fn handler_sees_index_of_consumed_value() {
        let seen = Cell::new(0usize);
        let remaining = Cell::new(0usize);
        let table = OptionTable::builder()
            .option(
                OptionDescriptor::required(|ctx: &mut ParseContext<()>| {
                    seen.set(ctx.index());
                    remaining.set(ctx.remaining().len());
                    Outcome::Ok
                })
                .short('i'),
            )
            .build()
            .unwrap();
        let argv = argv(&["-i", "42", "a", "b"]);
        let mut parser = Parser::with_diagnostics(&table, Vec::new());
        assert_eq!(parser.parse(&argv, &mut ()), Ok(3));
        assert_eq!(seen.get(), 2);
        assert_eq!(remaining.get(), 2);
    }

    #[test]
    fn handler_can_read_table_and_program() {
        let listing = std::cell::RefCell::new(String::new());
        let table = OptionTable::builder()
            .option(
                OptionDescriptor::flag(|ctx: &mut ParseContext<()>| {
                    let names: Vec<String> = ctx.table().iter().map(|d| d.to_string()).collect();
                    *listing.borrow_mut() = format!("{}: {}", ctx.program(), names.join(" | "));
                    Outcome::Ok
                })
                .short('h')
                .long("help"),
            )
            .option(OptionDescriptor::required(|_: &mut ParseContext<()>| Outcome::Ok).long("out"))
            .build()
            .unwrap();
        let argv = argv(&["--help"]);
        let mut parser = Parser::with_diagnostics(&table, Vec::new());
        assert_eq!(parser.parse(&argv, &mut ()), Ok(2));
        assert_eq!(*listing.borrow(), "prog: -h, --help | --out PARAM");
    }

    #[test]
    fn handler_reports_go_to_parser_sink() {
        let table = OptionTable::builder()
            .option(
                OptionDescriptor::required(|ctx: &mut ParseContext<()>| {
                    let message = format!("option {} rejects {:?}", ctx.descriptor(), ctx.value());
                    ctx.report(message);
                    Outcome::Fail
                })
                .short('n'),
            )
            .build()
            .unwrap();
        let argv = argv(&["-n", "x", "-z"]);
        let mut parser = Parser::with_diagnostics(&table, Vec::new());
        assert_eq!(
            parser.parse(&argv, &mut ()),
            Err(ParseError::Failed { errors: 2 })
        );
        let diagnostics = String::from_utf8(parser.into_diagnostics()).unwrap();
        assert_eq!(
            diagnostics,
            "prog: option -n PARAM rejects Some(\"x\")\nprog: unrecognized option -z\n"
        );
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failing_sink_does_not_change_result() {
        let table = table();
        let argv = argv(&["--bogus", "-a", "file"]);
        let mut calls = Calls::new();
        let mut parser = Parser::with_diagnostics(&table, BrokenSink);
        assert_eq!(
            parser.parse(&argv, &mut calls),
            Err(ParseError::Failed { errors: 1 })
        );
        assert_eq!(calls, vec![call(1, None)]);

        let argv = self::argv(&["-i"]);
        assert_eq!(
            parser.parse(&argv, &mut calls),
            Err(ParseError::MissingShortArgument { short: 'i' })
        );
    }

    // -- resumable scans --

    #[test]
    fn resuming_at_returned_index_is_idempotent() {
        let table = table();
        let argv = argv(&["-a", "-i", "5", "pos", "-b"]);
        let mut calls = Calls::new();
        let mut parser = Parser::with_diagnostics(&table, Vec::new());
        let next = parser.parse(&argv, &mut calls).unwrap();
        assert_eq!(next, 4);
        let before = calls.clone();
        assert_eq!(parser.parse_at(next, &argv, &mut calls), Ok(4));
        assert_eq!(calls, before);
    }

    #[test]
    fn interleaved_scan_matches_continuous_scan() {
        let table = table();
        let interleaved = argv(&["-a", "x", "-i", "9", "y", "-l=z"]);
        let continuous = argv(&["-a", "-i", "9", "-l=z"]);
        let mut parser = Parser::with_diagnostics(&table, Vec::new());

        let mut calls = Calls::new();
        let mut positionals = Vec::new();
        let mut i = 1;
        while i < interleaved.len() {
            i = parser.parse_at(i, &interleaved, &mut calls).unwrap();
            if i < interleaved.len() {
                positionals.push(interleaved[i].clone());
                i += 1;
            }
        }

        let mut expected = Calls::new();
        assert_eq!(parser.parse(&continuous, &mut expected), Ok(continuous.len()));
        assert_eq!(calls, expected);
        assert_eq!(positionals, vec!["x", "y"]);
    }

    #[test]
    fn segments_can_use_different_tables() {
        let first = table();
        let second: OptionTable<'static, Calls> = OptionTable::builder()
            .option(OptionDescriptor::flag(record).short('a').set_id(100))
            .build()
            .unwrap();
        let argv = argv(&["-a", "sub", "-a"]);
        let mut calls = Calls::new();

        let next = Parser::with_diagnostics(&first, Vec::new())
            .parse(&argv, &mut calls)
            .unwrap();
        assert_eq!(next, 2);
        let end = Parser::with_diagnostics(&second, Vec::new())
            .parse_at(next + 1, &argv, &mut calls)
            .unwrap();
        assert_eq!(end, 4);
        assert_eq!(calls, vec![call(1, None), call(100, None)]);
    }

    #[test]
    fn offset_past_end_returns_offset() {
        let table = table();
        let argv = argv(&["-a"]);
        let mut calls = Calls::new();
        let mut parser = Parser::with_diagnostics(&table, Vec::new());
        assert_eq!(parser.parse_at(2, &argv, &mut calls), Ok(2));
        assert!(calls.is_empty());
    }
}

#[cfg(all(test, feature = "arity-none", not(feature = "negative-numbers")))]
mod digit_option_tests {
    use super::*;

    fn count(ctx: &mut ParseContext<'_, '_, u32>) -> Outcome {
        *ctx.user_mut() += 1;
        Outcome::Ok
    }

    fn argv(tokens: &[&str]) -> Vec<String> {
        std::iter::once("prog")
            .chain(tokens.iter().copied())
            .map(String::from)
            .collect()
    }

    fn table() -> OptionTable<'static, u32> {
        OptionTable::builder()
            .option(OptionDescriptor::flag(count).short('7'))
            .build()
            .unwrap()
    }

    #[test]
    fn digits_are_plain_short_options() {
        let table = table();
        let argv = argv(&["-7", "-5"]);
        let mut hits = 0u32;
        let mut parser = Parser::with_diagnostics(&table, Vec::new());
        assert_eq!(
            parser.parse(&argv, &mut hits),
            Err(ParseError::Failed { errors: 1 })
        );
        assert_eq!(hits, 1);
        assert_eq!(
            String::from_utf8(parser.into_diagnostics()).unwrap(),
            "prog: unrecognized option -5\n"
        );
    }

    #[test]
    fn digit_cluster_dispatches_each_digit() {
        let table = table();
        let argv = argv(&["-77", "rest"]);
        let mut hits = 0u32;
        let mut parser = Parser::with_diagnostics(&table, Vec::new());
        assert_eq!(parser.parse(&argv, &mut hits), Ok(2));
        assert_eq!(hits, 2);
    }
}

#[cfg(all(
    test,
    feature = "arity-required",
    not(feature = "arity-none"),
    not(feature = "arity-optional")
))]
mod required_only_tests {
    use super::*;

    type Seen = Vec<Option<String>>;

    fn record(ctx: &mut ParseContext<'_, '_, Seen>) -> Outcome {
        let value = ctx.value().map(str::to_string);
        ctx.user_mut().push(value);
        Outcome::Ok
    }

    fn argv(tokens: &[&str]) -> Vec<String> {
        std::iter::once("prog")
            .chain(tokens.iter().copied())
            .map(String::from)
            .collect()
    }

    fn table() -> OptionTable<'static, Seen> {
        OptionTable::builder()
            .option(OptionDescriptor::required(record).short('o').long("output"))
            .option(OptionDescriptor::new(Arity::Required, record).short('D'))
            .build()
            .unwrap()
    }

    #[test]
    fn every_required_form() {
        let table = table();
        let argv = argv(&[
            "-ofile",
            "-o",
            "f2",
            "--output=f3",
            "--output",
            "f4",
            "-D=x",
            "pos",
        ]);
        let mut seen = Seen::new();
        let mut parser = Parser::with_diagnostics(&table, Vec::new());
        assert_eq!(parser.parse(&argv, &mut seen), Ok(8));
        let values: Vec<&str> = seen.iter().flatten().map(String::as_str).collect();
        assert_eq!(values, vec!["file", "f2", "f3", "f4", "=x"]);
        assert!(parser.diagnostics().is_empty());
    }

    #[test]
    fn value_may_look_like_an_option() {
        let table = table();
        let argv = argv(&["-o", "-7", "--output", "--output"]);
        let mut seen = Seen::new();
        let mut parser = Parser::with_diagnostics(&table, Vec::new());
        assert_eq!(parser.parse(&argv, &mut seen), Ok(5));
        assert_eq!(
            seen,
            vec![Some("-7".to_string()), Some("--output".to_string())]
        );
    }

    #[test]
    fn missing_value_is_fatal() {
        let table = table();
        let argv = argv(&["-D"]);
        let mut seen = Seen::new();
        let mut parser = Parser::with_diagnostics(&table, Vec::new());
        assert_eq!(
            parser.parse(&argv, &mut seen),
            Err(ParseError::MissingShortArgument { short: 'D' })
        );
        assert_eq!(
            String::from_utf8(parser.into_diagnostics()).unwrap(),
            "prog: missing argument for option 'D'\n"
        );
    }
}

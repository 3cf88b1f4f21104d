use std::io::{self, Write};

use clop::{help, OptionDescriptor, OptionTable, Outcome, ParseContext};

use crate::error::{IntegerError, Result};

pub const DEFAULT_LOGFILE: &str = "/var/log/myDefaultLogfile";

pub const HELP_HELP: &str = "Print this help and exit";
pub const LOGFILE_HELP: &str =
    "Logfile. If set logging is enabled.\nYou can name an explicit logfile in PARAM";
pub const INTEGER_HELP: &str = "Read an integer number in PARAM";

/// Names of the flags set by `-a`, `-b` and `-c`, indexed by option id.
pub const FLAG_NAMES: [char; 3] = ['a', 'b', 'c'];

/// Program state filled in by the option handlers.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Settings {
    pub logfile: Option<String>,
    pub flags: u32,
    pub integer: i32,
}

impl Settings {
    pub fn flag(&self, id: usize) -> bool {
        id < 32 && self.flags & (1 << id) != 0
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// `-h`, `--help`: print usage and the option list, then exit.
pub fn print_help(ctx: &mut ParseContext<'_, '_, Settings>) -> Outcome {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let _ = write_usage(&mut out, ctx.program(), ctx.table());
    let _ = out.flush();
    std::process::exit(0);
}

/// `-l`, `--logfile[=PARAM]`
pub fn set_logfile(ctx: &mut ParseContext<'_, '_, Settings>) -> Outcome {
    let logfile = ctx.value().unwrap_or(DEFAULT_LOGFILE).to_string();
    ctx.user_mut().logfile = Some(logfile);
    Outcome::Ok
}

/// `-a`, `-b`, `-c`: one handler, the option id picks the bit.
pub fn set_flag(ctx: &mut ParseContext<'_, '_, Settings>) -> Outcome {
    match u32::try_from(ctx.id()).ok().filter(|&bit| bit < u32::BITS) {
        Some(bit) => {
            ctx.user_mut().flags |= 1 << bit;
            Outcome::Ok
        }
        None => {
            tracing::error!(id = ctx.id(), option = %ctx.descriptor(), "flag id out of range");
            Outcome::abort()
        }
    }
}

/// `-i`, `--integer PARAM`
pub fn read_integer(ctx: &mut ParseContext<'_, '_, Settings>) -> Outcome {
    let value = ctx.value().unwrap_or("");
    match parse_decimal(value) {
        Ok(n) => {
            ctx.user_mut().integer = n;
            Outcome::Ok
        }
        Err(err) => {
            let message = format!(
                "argument {}: option \"{}\" {} \"{}\"",
                ctx.index(),
                ctx.descriptor(),
                err,
                value
            );
            ctx.report(message);
            Outcome::abort()
        }
    }
}

/// Optional sign followed by decimal digits.
pub fn parse_decimal(text: &str) -> std::result::Result<i32, IntegerError> {
    let digits = text.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(text);
    if !digits.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(IntegerError::NotANumber);
    }
    text.parse::<i32>().map_err(|_| IntegerError::Malformed)
}

// ============================================================================
// Table
// ============================================================================

/// The `-a`/`-b`/`-c` flag options, ids 0 to 2.
pub fn flag_options<'a>() -> impl Iterator<Item = OptionDescriptor<'a, Settings>> {
    FLAG_NAMES.into_iter().enumerate().map(|(id, name)| {
        OptionDescriptor::flag(set_flag)
            .short(name)
            .set_id(id as i32)
            .help(&format!("Set flag '{}'", name))
    })
}

pub fn build_table() -> Result<OptionTable<'static, Settings>> {
    let mut builder = OptionTable::builder()
        .option(
            OptionDescriptor::flag(print_help)
                .short('h')
                .long("help")
                .help(HELP_HELP),
        )
        .option(
            OptionDescriptor::optional(set_logfile)
                .short('l')
                .long("logfile")
                .help(LOGFILE_HELP),
        );
    for flag in flag_options() {
        builder = builder.option(flag);
    }
    let table = builder
        .option(
            OptionDescriptor::required(read_integer)
                .short('i')
                .long("integer")
                .help(INTEGER_HELP),
        )
        .build()?;
    Ok(table)
}

/// Parse the options in front of the positional arguments.
///
/// Returns the settings and the index of the first positional argument.
pub fn parse_args(argv: &[String]) -> Result<(Settings, usize)> {
    let table = build_table()?;
    let mut settings = Settings::default();
    let next = clop::parse(argv, &table, &mut settings)?;
    tracing::debug!(next, ?settings, "options parsed");
    Ok((settings, next))
}

// ============================================================================
// Output
// ============================================================================

pub fn write_usage<W: Write, U>(out: &mut W, program: &str, table: &OptionTable<'_, U>) -> io::Result<()> {
    write!(out, "Usage: {} [options] [arguments]\nOptions:\n", program)?;
    help::write_option_list(out, table)
}

pub fn write_summary<W: Write>(out: &mut W, settings: &Settings) -> io::Result<()> {
    match settings.logfile {
        Some(ref logfile) => writeln!(out, "Logfile: {}", logfile)?,
        None => writeln!(out, "No logfile")?,
    }
    writeln!(out, "Flags:")?;
    for (id, name) in FLAG_NAMES.iter().enumerate() {
        let state = if settings.flag(id) { "set" } else { "not set" };
        writeln!(out, "Flag {} is {}", name, state)?;
    }
    write!(out, "Integer value = {}\n\n", settings.integer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DemoError;
    use clop::ParseError;

    fn argv(tokens: &[&str]) -> Vec<String> {
        std::iter::once("clop-demo")
            .chain(tokens.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn defaults_without_options() {
        let (settings, next) = parse_args(&argv(&["file"])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(next, 1);
    }

    #[test]
    fn flags_by_shared_handler() {
        let (settings, next) = parse_args(&argv(&["-ca", "rest"])).unwrap();
        assert_eq!(next, 2);
        assert!(settings.flag(0));
        assert!(!settings.flag(1));
        assert!(settings.flag(2));
        assert_eq!(settings.flags, 0b101);
    }

    #[test]
    fn logfile_default_and_explicit() {
        let (settings, _) = parse_args(&argv(&["-l"])).unwrap();
        assert_eq!(settings.logfile.as_deref(), Some(DEFAULT_LOGFILE));

        let (settings, next) = parse_args(&argv(&["--logfile", "=", "/tmp/x", "arg"])).unwrap();
        assert_eq!(settings.logfile.as_deref(), Some("/tmp/x"));
        assert_eq!(next, 4);

        let (settings, next) = parse_args(&argv(&["--logfile", "/tmp/x"])).unwrap();
        assert_eq!(settings.logfile.as_deref(), Some(DEFAULT_LOGFILE));
        assert_eq!(next, 2);
    }

    #[test]
    fn integer_forms() {
        for tokens in [&["-i", "42"][..], &["-i42"], &["--integer=42"], &["--integer", "42"]] {
            let (settings, _) = parse_args(&argv(tokens)).unwrap();
            assert_eq!(settings.integer, 42, "{:?}", tokens);
        }
        let (settings, _) = parse_args(&argv(&["-i", "-17"])).unwrap();
        assert_eq!(settings.integer, -17);
    }

    #[test]
    fn integer_with_equals_is_rejected() {
        // -i=42 hands "=42" to the handler, which is not a number.
        let err = parse_args(&argv(&["-i=42"])).unwrap_err();
        assert!(matches!(err, DemoError::Parse(ParseError::Aborted { code: -1 })));
        assert!(!err.needs_report());
    }

    #[test]
    fn unknown_option_fails() {
        let err = parse_args(&argv(&["-a", "--bogus"])).unwrap_err();
        assert!(matches!(err, DemoError::Parse(ParseError::Failed { errors: 1 })));
    }

    #[test]
    fn integer_error_goes_to_parser_sink() {
        let table = build_table().unwrap();
        let argv = argv(&["-a", "--integer", "abc"]);
        let mut settings = Settings::default();
        let mut parser = clop::Parser::with_diagnostics(&table, Vec::new());
        assert_eq!(
            parser.parse(&argv, &mut settings),
            Err(ParseError::Aborted { code: -1 })
        );
        assert_eq!(
            String::from_utf8(parser.into_diagnostics()).unwrap(),
            "clop-demo: argument 3: option \"-i, --integer PARAM\" expects a decimal number and not \"abc\"\n"
        );
        assert!(settings.flag(0));
    }

    #[test]
    fn decimal_validation() {
        assert_eq!(parse_decimal("12"), Ok(12));
        assert_eq!(parse_decimal("+12"), Ok(12));
        assert_eq!(parse_decimal("-12"), Ok(-12));
        assert_eq!(parse_decimal("abc"), Err(IntegerError::NotANumber));
        assert_eq!(parse_decimal("-"), Err(IntegerError::NotANumber));
        assert_eq!(parse_decimal(""), Err(IntegerError::NotANumber));
        assert_eq!(parse_decimal("=42"), Err(IntegerError::NotANumber));
        assert_eq!(parse_decimal("12x"), Err(IntegerError::Malformed));
        assert_eq!(parse_decimal("99999999999"), Err(IntegerError::Malformed));
    }

    #[test]
    fn usage_lists_every_option() {
        let table = build_table().unwrap();
        let mut out = Vec::new();
        write_usage(&mut out, "clop-demo", &table).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Usage: clop-demo [options] [arguments]\nOptions:\n  -h, --help\n"));
        assert!(text.contains("  -l, --logfile [=PARAM]\n\tLogfile. If set logging is enabled.\n\tYou can name"));
        assert!(text.contains("  -b\n\tSet flag 'b'\n\n"));
        assert!(text.ends_with("  -i, --integer PARAM\n\tRead an integer number in PARAM\n\n"));
    }

    #[test]
    fn summary_output() {
        let settings = Settings {
            logfile: Some("/tmp/x".to_string()),
            flags: 0b010,
            integer: 7,
        };
        let mut out = Vec::new();
        write_summary(&mut out, &settings).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Logfile: /tmp/x\nFlags:\nFlag a is not set\nFlag b is set\nFlag c is not set\nInteger value = 7\n\n"
        );
    }
}

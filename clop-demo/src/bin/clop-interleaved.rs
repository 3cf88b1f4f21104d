//! Options and positional arguments in any order.
//!
//! The scan is resumed right after every positional argument, so
//! `clop-interleaved a -b c -l` sees both `-b` and `-l`.

use std::io::{self, Write};

use clop::{OptionDescriptor, OptionTable, Outcome, ParseContext, Parser};
use clop_demo::arguments::{
    flag_options, read_integer, write_summary, write_usage, Settings, DEFAULT_LOGFILE, HELP_HELP,
    INTEGER_HELP, LOGFILE_HELP,
};
use clop_demo::error::Result;

fn run(argv: &[String]) -> Result<()> {
    let mut builder = OptionTable::builder()
        .option(
            OptionDescriptor::flag(|ctx: &mut ParseContext<Settings>| {
                let stdout = io::stdout();
                let mut out = stdout.lock();
                let _ = write_usage(&mut out, ctx.program(), ctx.table());
                let _ = out.flush();
                std::process::exit(0)
            })
            .short('h')
            .long("help")
            .help(HELP_HELP),
        )
        .option(
            OptionDescriptor::optional(|ctx: &mut ParseContext<Settings>| {
                let logfile = ctx.value().unwrap_or(DEFAULT_LOGFILE).to_string();
                ctx.user_mut().logfile = Some(logfile);
                Outcome::Ok
            })
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

    let mut settings = Settings::default();
    let mut parser = Parser::new(&table);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out)?;

    let mut i = 1;
    while i < argv.len() {
        i = parser.parse_at(i, argv, &mut settings)?;
        if i < argv.len() {
            writeln!(out, "Non-option argument in argv[{}]: \"{}\"", i, argv[i])?;
            i += 1;
        }
    }

    write_summary(&mut out, &settings)?;
    out.flush()?;
    Ok(())
}

fn main() {
    clop_demo::init_tracing();
    let argv: Vec<String> = std::env::args().collect();
    if let Err(e) = run(&argv) {
        tracing::debug!(error = %e, "clop-interleaved failed");
        if e.needs_report() {
            eprintln!("{}: {}", argv.first().map(String::as_str).unwrap_or("clop-interleaved"), e);
        }
        std::process::exit(1);
    }
}

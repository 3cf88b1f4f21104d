use std::io::{self, Write};

use clop_demo::arguments::{parse_args, write_summary};
use clop_demo::error::Result;

fn run(argv: &[String]) -> Result<()> {
    let (settings, next) = parse_args(argv)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out)?;
    for (n, (index, arg)) in argv.iter().enumerate().skip(next).enumerate() {
        writeln!(out, "Non-option argument {} in argv[{}]: \"{}\"", n + 1, index, arg)?;
    }
    write_summary(&mut out, &settings)?;
    out.flush()?;
    Ok(())
}

fn main() {
    clop_demo::init_tracing();
    let argv: Vec<String> = std::env::args().collect();
    if let Err(e) = run(&argv) {
        tracing::debug!(error = %e, "clop-demo failed");
        if e.needs_report() {
            eprintln!("{}: {}", argv.first().map(String::as_str).unwrap_or("clop-demo"), e);
        }
        std::process::exit(1);
    }
}

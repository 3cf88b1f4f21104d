//! Help listings generated from an option table.
//!
//! The default layout puts each spelling on its own line, two spaces in,
//! followed by the help text lines, each starting with a tab (`\t`), and a
//! blank line.

use std::io::{self, Write};

use crate::table::{OptionDescriptor, OptionTable};

/// Write the spelling of one option, e.g. `-l, --logfile [=PARAM]`.
pub fn write_option<W: Write, U>(out: &mut W, descriptor: &OptionDescriptor<'_, U>) -> io::Result<()> {
    write!(out, "{}", descriptor)
}

/// Write every option of `table` in declaration order, using the default
/// [`HelpRenderer`].
pub fn write_option_list<W: Write, U>(out: &mut W, table: &OptionTable<'_, U>) -> io::Result<()> {
    HelpRenderer::new().render(out, table)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpRenderer {
    indent: String,
    width: Option<usize>,
}

impl Default for HelpRenderer {
    fn default() -> Self {
        HelpRenderer {
            indent: "\t".to_string(),
            width: None,
        }
    }
}

impl HelpRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix of every help text line. Defaults to a tab.
    pub fn indent(mut self, indent: &str) -> Self {
        self.indent = indent.to_string();
        self
    }

    /// Break help text lines longer than `width` characters at spaces.
    /// Words longer than `width` are never split.
    pub fn wrap(mut self, width: usize) -> Self {
        self.width = Some(width.max(1));
        self
    }

    pub fn render<W: Write, U>(&self, out: &mut W, table: &OptionTable<'_, U>) -> io::Result<()> {
        for descriptor in table {
            write!(out, "  ")?;
            write_option(out, descriptor)?;
            writeln!(out)?;
            for line in descriptor.help_text().unwrap_or("").split('\n') {
                write!(out, "{}", self.indent)?;
                match self.width {
                    Some(width) => self.write_wrapped(out, line, width)?,
                    None => writeln!(out, "{}", line)?,
                }
            }
            writeln!(out)?;
        }
        Ok(())
    }

    /// Render into a string, mostly for tests and `format!`-style callers.
    pub fn render_to_string<U>(&self, table: &OptionTable<'_, U>) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.render(&mut buf, table);
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn write_wrapped<W: Write>(&self, out: &mut W, text: &str, width: usize) -> io::Result<()> {
        let mut rest = text;
        while rest.chars().count() > width {
            let limit = rest
                .char_indices()
                .nth(width)
                .map_or(rest.len(), |(i, _)| i);
            let split = if rest[limit..].starts_with(' ') {
                Some(limit)
            } else {
                rest[..limit].rfind(' ').filter(|&pos| pos > 0)
            };
            let Some(pos) = split else {
                break;
            };
            writeln!(out, "{}", &rest[..pos])?;
            write!(out, "{}", self.indent)?;
            rest = rest[pos..].trim_start_matches(' ');
        }
        writeln!(out, "{}", rest)
    }
}

#[cfg(all(
    test,
    feature = "arity-none",
    feature = "arity-required",
    feature = "arity-optional"
))]
mod tests {
    use super::*;
    use crate::{Outcome, ParseContext};

    fn noop(_: &mut ParseContext<'_, '_, ()>) -> Outcome {
        Outcome::Ok
    }

    fn table() -> OptionTable<'static, ()> {
        OptionTable::builder()
            .option(
                OptionDescriptor::flag(noop)
                    .short('h')
                    .long("help")
                    .help("print this help"),
            )
            .option(
                OptionDescriptor::optional(noop)
                    .short('l')
                    .long("logfile")
                    .help("write a log\ndefault: /var/log/demo"),
            )
            .option(OptionDescriptor::required(noop).short('i'))
            .build()
            .unwrap()
    }

    #[test]
    fn write_option_spelling() {
        let table = table();
        let mut out = Vec::new();
        write_option(&mut out, table.find_long("logfile").unwrap()).unwrap();
        assert_eq!(out, b"-l, --logfile [=PARAM]");
    }

    #[test]
    fn option_list_layout() {
        let mut out = Vec::new();
        write_option_list(&mut out, &table()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "  -h, --help\n\tprint this help\n\n\
             \x20 -l, --logfile [=PARAM]\n\twrite a log\n\tdefault: /var/log/demo\n\n\
             \x20 -i PARAM\n\t\n\n"
        );
    }

    #[test]
    fn custom_indent() {
        let table = OptionTable::builder()
            .option(OptionDescriptor::flag(noop).long("quiet").help("say less"))
            .build()
            .unwrap();
        let text = HelpRenderer::new().indent("      ").render_to_string(&table);
        assert_eq!(text, "  --quiet\n      say less\n\n");
    }

    #[test]
    fn wraps_at_last_space() {
        let table = OptionTable::builder()
            .option(
                OptionDescriptor::flag(noop)
                    .short('v')
                    .help("alpha beta gamma delta"),
            )
            .build()
            .unwrap();
        let text = HelpRenderer::new().wrap(10).render_to_string(&table);
        assert_eq!(text, "  -v\n\talpha beta\n\tgamma\n\tdelta\n\n");
    }

    #[test]
    fn long_words_are_not_split() {
        let table = OptionTable::builder()
            .option(
                OptionDescriptor::flag(noop)
                    .short('v')
                    .help("/a/very/long/path ok"),
            )
            .build()
            .unwrap();
        let text = HelpRenderer::new().wrap(5).render_to_string(&table);
        assert_eq!(text, "  -v\n\t/a/very/long/path ok\n\n");
    }

    #[test]
    fn empty_table_renders_nothing() {
        let table: OptionTable<'static, ()> = OptionTable::builder().build().unwrap();
        assert!(HelpRenderer::new().render_to_string(&table).is_empty());
    }
}

#[cfg(all(test, feature = "arity-required"))]
mod required_tests {
    use super::*;
    use crate::{Outcome, ParseContext};

    #[test]
    fn required_option_listing() {
        let table = OptionTable::builder()
            .option(
                OptionDescriptor::required(|_: &mut ParseContext<()>| Outcome::Ok)
                    .short('o')
                    .long("output")
                    .help("write to PARAM"),
            )
            .build()
            .unwrap();
        let mut out = Vec::new();
        write_option_list(&mut out, &table).unwrap();
        assert_eq!(out, b"  -o, --output PARAM\n\twrite to PARAM\n\n");
    }
}

use std::fmt;
use std::io::Write;

use crate::parser::write_diagnostic;
use crate::table::{OptionDescriptor, OptionTable};

/// What a handler sees while one option is being dispatched.
///
/// The context borrows the argument vector, the table and the caller's
/// user data for the length of a single handler call.
pub struct ParseContext<'p, 'a, U> {
    pub(crate) argv: &'p [String],
    pub(crate) table: &'p OptionTable<'a, U>,
    pub(crate) descriptor: &'p OptionDescriptor<'a, U>,
    pub(crate) index: usize,
    pub(crate) value: Option<&'p str>,
    pub(crate) user: &'p mut U,
    pub(crate) diagnostics: &'p mut dyn Write,
}

impl<'p, 'a, U> ParseContext<'p, 'a, U> {
    /// `argv[0]`, or an empty string for an empty vector.
    pub fn program(&self) -> &'p str {
        self.argv.first().map(String::as_str).unwrap_or("")
    }

    pub fn argv(&self) -> &'p [String] {
        self.argv
    }

    pub fn argc(&self) -> usize {
        self.argv.len()
    }

    /// Index of the last token consumed for this option.
    ///
    /// When the value came from a following token this points at the value,
    /// otherwise at the token holding the option itself.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The option's value, `None` when it has none.
    pub fn value(&self) -> Option<&'p str> {
        self.value
    }

    /// Descriptor of the option being dispatched.
    pub fn descriptor(&self) -> &'p OptionDescriptor<'a, U> {
        self.descriptor
    }

    /// Shortcut for `descriptor().id()`.
    pub fn id(&self) -> i32 {
        self.descriptor.id()
    }

    /// The whole table, e.g. for printing a help listing.
    pub fn table(&self) -> &'p OptionTable<'a, U> {
        self.table
    }

    /// Tokens after the current index, not yet looked at by the scanner.
    pub fn remaining(&self) -> &'p [String] {
        self.argv.get(self.index + 1..).unwrap_or(&[])
    }

    pub fn user(&self) -> &U {
        &*self.user
    }

    pub fn user_mut(&mut self) -> &mut U {
        &mut *self.user
    }

    /// Write `program: message` to the parser's diagnostic sink, the same
    /// place engine errors go.
    pub fn report(&mut self, message: impl fmt::Display) {
        let program = self.program();
        write_diagnostic(&mut *self.diagnostics, program, format_args!("{}", message));
    }
}

#[cfg(all(test, feature = "arity-required"))]
mod tests {
    use super::*;
    use crate::Outcome;

    fn noop(_: &mut ParseContext<'_, '_, u32>) -> Outcome {
        Outcome::Ok
    }

    #[test]
    fn accessors() {
        let table = OptionTable::builder()
            .option(OptionDescriptor::required(noop).short('n').set_id(4))
            .build()
            .unwrap();
        let argv: Vec<String> = ["prog", "-n", "5", "rest"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut counter = 0u32;
        let mut sink: Vec<u8> = Vec::new();
        let mut ctx = ParseContext {
            argv: &argv,
            table: &table,
            descriptor: table.find_short('n').unwrap(),
            index: 2,
            value: Some(argv[2].as_str()),
            user: &mut counter,
            diagnostics: &mut sink,
        };
        assert_eq!(ctx.program(), "prog");
        assert_eq!(ctx.argc(), 4);
        assert_eq!(ctx.index(), 2);
        assert_eq!(ctx.value(), Some("5"));
        assert_eq!(ctx.id(), 4);
        assert_eq!(ctx.remaining(), &argv[3..]);
        assert_eq!(ctx.table().len(), 1);
        *ctx.user_mut() += 1;
        assert_eq!(*ctx.user(), 1);
        ctx.report("bad value 5");
        assert_eq!(sink, b"prog: bad value 5\n");
    }

    #[test]
    fn remaining_past_end_is_empty() {
        let table = OptionTable::builder()
            .option(OptionDescriptor::required(noop).short('n'))
            .build()
            .unwrap();
        let argv = vec!["prog".to_string(), "-n".to_string()];
        let mut counter = 0u32;
        let mut sink: Vec<u8> = Vec::new();
        let ctx = ParseContext {
            argv: &argv,
            table: &table,
            descriptor: table.find_short('n').unwrap(),
            index: 1,
            value: None,
            user: &mut counter,
            diagnostics: &mut sink,
        };
        assert!(ctx.remaining().is_empty());
    }
}

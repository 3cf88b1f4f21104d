//! Option declarations.
//!
//! An [`OptionTable`] is an ordered list of [`OptionDescriptor`]s. Lookups
//! scan it in declaration order and the first matching spelling wins.

use std::collections::HashSet;
use std::fmt;

use crate::context::ParseContext;
use crate::error::TableError;
use crate::outcome::Outcome;

/// Callback invoked for every occurrence of an option.
pub type Handler<'a, U> = Box<dyn Fn(&mut ParseContext<'_, 'a, U>) -> Outcome + 'a>;

// ============================================================================
// Arity
// ============================================================================

/// How many values an option takes and how they are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    /// `-v`, `--verbose`
    #[cfg(feature = "arity-none")]
    None,
    /// `-i 42`, `-i42`, `--integer 42`, `--integer=42`
    ///
    /// A short option takes the rest of its token verbatim, so `-i=42`
    /// yields `=42`.
    #[cfg(feature = "arity-required")]
    Required,
    /// `-l`, `-l=FILE`, `--logfile`, `--logfile=FILE`, `--logfile = FILE`
    ///
    /// A value is only taken when an `=` appears, either attached or as a
    /// token of its own.
    #[cfg(feature = "arity-optional")]
    Optional,
}

impl Arity {
    /// Placeholder appended to the spelling in help listings.
    pub fn param_suffix(self) -> &'static str {
        match self {
            #[cfg(feature = "arity-none")]
            Arity::None => "",
            #[cfg(feature = "arity-required")]
            Arity::Required => " PARAM",
            #[cfg(feature = "arity-optional")]
            Arity::Optional => " [=PARAM]",
        }
    }
}

// ============================================================================
// OptionDescriptor
// ============================================================================

pub struct OptionDescriptor<'a, U> {
    handler: Handler<'a, U>,
    arity: Arity,
    id: i32,
    short: Option<char>,
    long: Option<String>,
    help: Option<String>,
}

impl<'a, U> OptionDescriptor<'a, U> {
    pub fn new<F>(arity: Arity, handler: F) -> Self
    where
        F: Fn(&mut ParseContext<'_, 'a, U>) -> Outcome + 'a,
    {
        OptionDescriptor {
            handler: Box::new(handler),
            arity,
            id: 0,
            short: None,
            long: None,
            help: None,
        }
    }

    /// Option without a value.
    #[cfg(feature = "arity-none")]
    pub fn flag<F>(handler: F) -> Self
    where
        F: Fn(&mut ParseContext<'_, 'a, U>) -> Outcome + 'a,
    {
        Self::new(Arity::None, handler)
    }

    /// Option with a mandatory value.
    #[cfg(feature = "arity-required")]
    pub fn required<F>(handler: F) -> Self
    where
        F: Fn(&mut ParseContext<'_, 'a, U>) -> Outcome + 'a,
    {
        Self::new(Arity::Required, handler)
    }

    /// Option whose value must be introduced by `=`.
    #[cfg(feature = "arity-optional")]
    pub fn optional<F>(handler: F) -> Self
    where
        F: Fn(&mut ParseContext<'_, 'a, U>) -> Outcome + 'a,
    {
        Self::new(Arity::Optional, handler)
    }

    pub fn short(mut self, c: char) -> Self {
        self.short = Some(c);
        self
    }

    pub fn long(mut self, name: &str) -> Self {
        self.long = Some(name.to_string());
        self
    }

    pub fn help(mut self, text: &str) -> Self {
        self.help = Some(text.to_string());
        self
    }

    /// Tag used to tell apart descriptors sharing one handler.
    pub fn set_id(mut self, id: i32) -> Self {
        self.id = id;
        self
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn short_name(&self) -> Option<char> {
        self.short
    }

    pub fn long_name(&self) -> Option<&str> {
        self.long.as_deref()
    }

    pub fn help_text(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub(crate) fn call(&self, ctx: &mut ParseContext<'_, 'a, U>) -> Outcome {
        (self.handler)(ctx)
    }

    fn validate(&self, position: usize) -> Result<(), TableError> {
        if self.short.is_none() && self.long.is_none() {
            return Err(TableError::NoSpelling { position });
        }
        if let Some(c) = self.short {
            if c == '-' || c == '=' {
                return Err(TableError::ReservedShort { short: c });
            }
        }
        if let Some(ref name) = self.long {
            if name.is_empty() {
                return Err(TableError::EmptyLong { position });
            }
            if name.contains('=') {
                return Err(TableError::LongContainsEquals { name: name.clone() });
            }
        }
        Ok(())
    }
}

/// Renders the spelling as shown in help listings, e.g. `-i, --integer PARAM`.
impl<U> fmt::Display for OptionDescriptor<'_, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(c) = self.short {
            write!(f, "-{}", c)?;
            if self.long.is_some() {
                write!(f, ", ")?;
            }
        }
        if let Some(ref name) = self.long {
            write!(f, "--{}", name)?;
        }
        write!(f, "{}", self.arity.param_suffix())
    }
}

impl<U> fmt::Debug for OptionDescriptor<'_, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionDescriptor")
            .field("arity", &self.arity)
            .field("id", &self.id)
            .field("short", &self.short)
            .field("long", &self.long)
            .field("help", &self.help)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// OptionTable
// ============================================================================

pub struct OptionTable<'a, U> {
    entries: Vec<OptionDescriptor<'a, U>>,
}

impl<U> fmt::Debug for OptionTable<'_, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.entries).finish()
    }
}

impl<'a, U> OptionTable<'a, U> {
    pub fn builder() -> TableBuilder<'a, U> {
        TableBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OptionDescriptor<'a, U>> {
        self.entries.iter()
    }

    /// First descriptor spelled `--name`.
    pub fn find_long(&self, name: &str) -> Option<&OptionDescriptor<'a, U>> {
        self.entries
            .iter()
            .find(|d| d.long.as_deref() == Some(name))
    }

    /// First descriptor spelled `-c`.
    pub fn find_short(&self, c: char) -> Option<&OptionDescriptor<'a, U>> {
        self.entries.iter().find(|d| d.short == Some(c))
    }
}

impl<'t, 'a, U> IntoIterator for &'t OptionTable<'a, U> {
    type Item = &'t OptionDescriptor<'a, U>;
    type IntoIter = std::slice::Iter<'t, OptionDescriptor<'a, U>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ============================================================================
// TableBuilder
// ============================================================================

pub struct TableBuilder<'a, U> {
    entries: Vec<OptionDescriptor<'a, U>>,
}

impl<'a, U> TableBuilder<'a, U> {
    pub fn new() -> Self {
        TableBuilder {
            entries: Vec::new(),
        }
    }

    pub fn option(mut self, descriptor: OptionDescriptor<'a, U>) -> Self {
        self.entries.push(descriptor);
        self
    }

    /// Check every declaration and freeze the table.
    ///
    /// Duplicate spellings are accepted (the first declaration wins) but
    /// logged, since the later ones can never match.
    pub fn build(self) -> Result<OptionTable<'a, U>, TableError> {
        let mut shorts = HashSet::new();
        let mut longs = HashSet::new();
        for (position, d) in self.entries.iter().enumerate() {
            d.validate(position)?;
            if let Some(c) = d.short {
                if !shorts.insert(c) {
                    tracing::warn!(position, "short option -{} declared twice", c);
                }
            }
            if let Some(ref name) = d.long {
                if !longs.insert(name.as_str()) {
                    tracing::warn!(position, "long option --{} declared twice", name);
                }
            }
        }
        tracing::debug!(options = self.entries.len(), "option table built");
        Ok(OptionTable {
            entries: self.entries,
        })
    }
}

impl<U> Default for TableBuilder<'_, U> {
    fn default() -> Self {
        Self::new()
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

    fn noop(_: &mut ParseContext<'_, '_, ()>) -> Outcome {
        Outcome::Ok
    }

    #[test]
    fn display_short_and_long() {
        let d = OptionDescriptor::required(noop).short('i').long("integer");
        assert_eq!(d.to_string(), "-i, --integer PARAM");
    }

    #[test]
    fn display_single_spelling() {
        let d = OptionDescriptor::optional(noop).long("logfile");
        assert_eq!(d.to_string(), "--logfile [=PARAM]");
        let d = OptionDescriptor::flag(noop).short('a');
        assert_eq!(d.to_string(), "-a");
    }

    #[test]
    fn defaults() {
        let d = OptionDescriptor::flag(noop).long("help");
        assert_eq!(d.id(), 0);
        assert_eq!(d.arity(), Arity::None);
        assert_eq!(d.short_name(), None);
        assert_eq!(d.long_name(), Some("help"));
        assert_eq!(d.help_text(), None);
    }

    #[test]
    fn first_match_wins() {
        let table = OptionTable::builder()
            .option(OptionDescriptor::flag(noop).short('x').set_id(1))
            .option(OptionDescriptor::flag(noop).short('x').long("xx").set_id(2))
            .option(OptionDescriptor::flag(noop).long("xx").set_id(3))
            .build()
            .unwrap();
        assert_eq!(table.find_short('x').map(|d| d.id()), Some(1));
        assert_eq!(table.find_long("xx").map(|d| d.id()), Some(2));
        assert!(table.find_long("x").is_none());
        assert!(table.find_short('y').is_none());
    }

    #[test]
    fn long_match_is_exact() {
        let table = OptionTable::builder()
            .option(OptionDescriptor::flag(noop).long("log"))
            .build()
            .unwrap();
        assert!(table.find_long("lo").is_none());
        assert!(table.find_long("logfile").is_none());
        assert!(table.find_long("log").is_some());
    }

    #[test]
    fn missing_spelling_is_rejected() {
        let err = OptionTable::builder()
            .option(OptionDescriptor::flag(noop).short('a'))
            .option(OptionDescriptor::flag(noop).help("nameless"))
            .build()
            .unwrap_err();
        assert_eq!(err, TableError::NoSpelling { position: 1 });
    }

    #[test]
    fn malformed_spellings_are_rejected() {
        let err = OptionTable::builder()
            .option(OptionDescriptor::flag(noop).long(""))
            .build()
            .unwrap_err();
        assert_eq!(err, TableError::EmptyLong { position: 0 });

        let err = OptionTable::builder()
            .option(OptionDescriptor::flag(noop).long("a=b"))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            TableError::LongContainsEquals {
                name: "a=b".to_string()
            }
        );

        let err = OptionTable::builder()
            .option(OptionDescriptor::flag(noop).short('='))
            .build()
            .unwrap_err();
        assert_eq!(err, TableError::ReservedShort { short: '=' });
    }

    #[test]
    fn iterates_in_declaration_order() {
        let table = OptionTable::builder()
            .option(OptionDescriptor::flag(noop).short('b'))
            .option(OptionDescriptor::flag(noop).short('a'))
            .build()
            .unwrap();
        let shorts: Vec<_> = table.iter().filter_map(|d| d.short_name()).collect();
        assert_eq!(shorts, vec!['b', 'a']);
        assert_eq!(table.len(), 2);
        assert!(!table.is_empty());
    }
}

#[cfg(all(test, feature = "arity-required"))]
mod required_tests {
    use super::*;

    fn noop(_: &mut ParseContext<'_, '_, ()>) -> Outcome {
        Outcome::Ok
    }

    #[test]
    fn required_spelling() {
        let d = OptionDescriptor::required(noop).short('o').long("output");
        assert_eq!(d.arity(), Arity::Required);
        assert_eq!(d.to_string(), "-o, --output PARAM");
    }

    #[test]
    fn validation_does_not_depend_on_arity() {
        let err = OptionTable::builder()
            .option(OptionDescriptor::required(noop).short('-'))
            .build()
            .unwrap_err();
        assert_eq!(err, TableError::ReservedShort { short: '-' });

        let err = OptionTable::builder()
            .option(OptionDescriptor::required(noop))
            .build()
            .unwrap_err();
        assert_eq!(err, TableError::NoSpelling { position: 0 });
    }
}

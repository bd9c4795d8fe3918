//! Wire grammar for Esky position reports.
//!
//! The layout itself lives in `esky.pest` and is compiled by `pest_derive`. Alongside it,
//! [`FIELDS`] lists every captured field in wire order with the lexical kind the extractor
//! converts it as. Matching produces [`Captures`]: the captured text of each field, tagged
//! with its descriptor, in exactly the order of [`FIELDS`].

use crate::extract::FieldCursor;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser as PestParser;

#[derive(PestParser)]
#[grammar = "esky.pest"]
struct EskyParser;

/// Lexical class of a captured field, which fixes how it is converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Decimal digits, converted to an integer.
    Int,
    /// Decimal digits kept as text (identity key, never arithmetic).
    Identifier,
    /// Optionally signed number with a fractional part.
    Decimal,
    /// Digits following a `0x` prefix, converted as hexadecimal.
    HexInt,
    /// `yymmdd`.
    Date,
    /// `hhmmss`.
    Time,
}

/// Descriptor of one captured field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Member of the all-or-nothing extension group.
    pub optional: bool,
    rule: Rule,
}

impl FieldSpec {
    const fn required(name: &'static str, rule: Rule, kind: FieldKind) -> Self {
        FieldSpec { name, kind, optional: false, rule }
    }

    const fn optional(name: &'static str, rule: Rule, kind: FieldKind) -> Self {
        FieldSpec { name, kind, optional: true, rule }
    }
}

/// Captured fields in wire order.
pub const FIELDS: &[FieldSpec] = &[
    FieldSpec::required("index", Rule::index, FieldKind::Int),
    FieldSpec::required("device_id", Rule::device_id, FieldKind::Identifier),
    FieldSpec::required("satellites", Rule::satellites, FieldKind::Int),
    FieldSpec::required("date", Rule::date, FieldKind::Date),
    FieldSpec::required("time", Rule::time, FieldKind::Time),
    FieldSpec::required("latitude", Rule::latitude, FieldKind::Decimal),
    FieldSpec::required("longitude", Rule::longitude, FieldKind::Decimal),
    FieldSpec::required("speed", Rule::speed, FieldKind::Decimal),
    FieldSpec::required("course", Rule::course, FieldKind::Int),
    FieldSpec::optional("inputs", Rule::inputs, FieldKind::HexInt),
    FieldSpec::optional("event", Rule::event, FieldKind::Int),
    FieldSpec::optional("odometer", Rule::odometer, FieldKind::Int),
    FieldSpec::required("battery", Rule::battery, FieldKind::Int),
];

fn spec_for(rule: Rule) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.rule == rule)
}

/// One captured field: its descriptor and the matched text.
#[derive(Debug, Clone, Copy)]
pub struct Capture<'a> {
    pub spec: &'static FieldSpec,
    pub text: &'a str,
}

impl Capture<'_> {
    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    pub fn kind(&self) -> FieldKind {
        self.spec.kind
    }
}

/// Result of a successful match.
#[derive(Debug, Clone)]
pub struct Captures<'a> {
    fields: Vec<Capture<'a>>,
    extension: bool,
}

impl<'a> Captures<'a> {
    /// Whether the optional group took part in the match.
    pub fn has_extension(&self) -> bool {
        self.extension
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Capture<'a>> {
        self.fields.iter()
    }

    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.fields.iter().find(|c| c.name() == name).map(|c| c.text)
    }

    /// Field names in capture order.
    pub fn layout(&self) -> Vec<&'static str> {
        self.fields.iter().map(Capture::name).collect()
    }

    /// Names [`FIELDS`] prescribes for a match with or without the extension group.
    pub fn expected_layout(extension: bool) -> Vec<&'static str> {
        FIELDS
            .iter()
            .filter(|f| extension || !f.optional)
            .map(|f| f.name)
            .collect()
    }

    pub fn into_cursor(self) -> FieldCursor<'a> {
        FieldCursor::new(self.fields, self.extension)
    }
}

/// Compiled matcher for the message layout. Immutable; share freely across threads.
#[derive(Debug)]
pub struct MessageGrammar {
    fields: &'static [FieldSpec],
}

static SHARED: MessageGrammar = MessageGrammar { fields: FIELDS };

impl MessageGrammar {
    /// Process-wide instance.
    pub fn shared() -> &'static MessageGrammar {
        &SHARED
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    /// Match a whole message. Leading content must conform; trailing content is ignored.
    pub fn matches<'a>(&self, input: &'a str) -> Option<Captures<'a>> {
        let mut pairs = EskyParser::parse(Rule::message, input).ok()?;
        let message = pairs.next()?;
        let mut captures = Captures {
            fields: Vec::with_capacity(self.fields.len()),
            extension: false,
        };
        collect(message, &mut captures);
        Some(captures)
    }
}

fn collect<'a>(pair: Pair<'a, Rule>, out: &mut Captures<'a>) {
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::extension => {
                out.extension = true;
                collect(inner, out);
            }
            rule => {
                if let Some(spec) = spec_for(rule) {
                    out.fields.push(Capture {
                        spec,
                        text: inner.as_str(),
                    });
                }
            }
        }
    }
}

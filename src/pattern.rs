// PSPP - a program for statistical analysis.
// Copyright (C) 2025 Free Software Foundation, Inc.
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <http://www.gnu.org/licenses/>.

//! The closed set of argument value patterns.
//!
//! [`Pattern::match_one`] implements the deterministic, non-variadic match
//! protocol directly; [`Pattern::Multi`] and [`Pattern::Object`] need the
//! tokeniser and are handled instead by the matching functions in
//! [`crate::handler`].

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use indexmap::IndexMap;
use regex::Regex;

use crate::atom::Atom;
use crate::error::ConstructError;
use crate::slot::SlotList;
use crate::value::Value;

/// How a [`RegexPattern`] turns a successful regex match into a [`Value`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenClass {
    /// Exact literal comparison against `source`; no regex involved.
    Raw,
    /// The matched text is recorded verbatim.
    RegexMatch,
    /// The matched text is run through [`RegexPattern::transform`] before
    /// being recorded.
    RegexTransform,
}

/// Converts matched text into a typed [`Value`]; returns `None` to reject
/// the atom (e.g. a numeric literal that overflows its target type).
pub type Transform = Arc<dyn Fn(&str) -> Option<Value> + Send + Sync>;

/// A literal regex pattern with an optional typed transform. Matches only
/// text atoms (§3.1).
#[derive(Clone)]
pub struct RegexPattern {
    pub source: String,
    regex: Option<Regex>,
    pub token_class: TokenClass,
    pub transform: Option<Transform>,
    pub type_mark: String,
    pub alias: Option<String>,
}

impl Debug for RegexPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegexPattern")
            .field("source", &self.source)
            .field("token_class", &self.token_class)
            .field("type_mark", &self.type_mark)
            .field("alias", &self.alias)
            .finish()
    }
}

impl RegexPattern {
    pub fn new(
        source: impl Into<String>,
        token_class: TokenClass,
        type_mark: impl Into<String>,
    ) -> Result<Self, ConstructError> {
        let source = source.into();
        let regex = match token_class {
            TokenClass::Raw => None,
            TokenClass::RegexMatch | TokenClass::RegexTransform => Some(
                Regex::new(&source)
                    .map_err(|e| ConstructError::InvalidRegex(source.clone(), e.to_string()))?,
            ),
        };
        Ok(Self {
            source,
            regex,
            token_class,
            transform: None,
            type_mark: type_mark.into(),
            alias: None,
        })
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// A pattern that matches only its own literal text (used for
    /// boolean-flag-shaped arguments). Always yields [`Value::Omitted`].
    pub fn literal(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            source: text,
            regex: None,
            token_class: TokenClass::Raw,
            transform: None,
            type_mark: "literal".to_string(),
            alias: None,
        }
    }

    pub fn str_pattern() -> Self {
        Self::new(r".+", TokenClass::RegexMatch, "str").expect("built-in regex always compiles")
    }

    pub fn int_pattern() -> Self {
        Self::new(r"^-?\d+$", TokenClass::RegexTransform, "int")
            .expect("built-in regex always compiles")
            .with_transform(Arc::new(|s: &str| s.parse::<i64>().ok().map(Value::Int)))
    }

    pub fn float_pattern() -> Self {
        Self::new(r"^-?\d+\.\d+$", TokenClass::RegexTransform, "float")
            .expect("built-in regex always compiles")
            .with_transform(Arc::new(|s: &str| s.parse::<f64>().ok().map(Value::Float)))
    }

    pub fn bool_pattern() -> Self {
        Self::new(r"^(?i:true|false)$", TokenClass::RegexTransform, "bool")
            .expect("built-in regex always compiles")
            .with_transform(Arc::new(|s: &str| match s.to_ascii_lowercase().as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            }))
    }

    fn match_atom(&self, atom: &Atom) -> MatchOutcome {
        let Atom::Text(text) = atom else {
            return MatchOutcome::Reject;
        };
        match self.token_class {
            TokenClass::Raw => {
                if text == &self.source {
                    MatchOutcome::Found(Value::Omitted)
                } else {
                    MatchOutcome::Reject
                }
            }
            TokenClass::RegexMatch | TokenClass::RegexTransform => {
                let regex = self.regex.as_ref().expect("compiled at construction");
                if !regex.is_match(text) {
                    return MatchOutcome::Reject;
                }
                if text == &self.source {
                    return MatchOutcome::Found(Value::Omitted);
                }
                if self.token_class == TokenClass::RegexTransform {
                    return match &self.transform {
                        Some(transform) => match transform(text) {
                            Some(value) => MatchOutcome::Found(value),
                            None => MatchOutcome::Reject,
                        },
                        None => MatchOutcome::Found(Value::Text(text.clone())),
                    };
                }
                MatchOutcome::Found(Value::Text(text.clone()))
            }
        }
    }
}

/// The closed set of argument value patterns (§3.1).
#[derive(Clone)]
pub enum Pattern {
    Regex(RegexPattern),
    /// Matches exactly one atom of any kind.
    AnyOne,
    /// Matches all remaining atoms as a list; terminal, only sensible as a
    /// slot list's final slot.
    All,
    /// Matches one non-text atom whose kind equals the given name.
    ElementClass(String),
    /// Matches a variable-length run of atoms the inner pattern accepts,
    /// bounded by the slot-list arity protocol (§4.2).
    Multi(Box<Pattern>),
    /// Matches exactly one atom the inner pattern *rejects*.
    Anti(Box<Pattern>),
    /// Matches if any inner pattern matches; `anti` inverts the whole set.
    Union { patterns: Vec<Pattern>, anti: bool },
    /// A text atom parsed as a `[a, b, c]`-shaped list literal, each element
    /// checked against the inner pattern.
    Sequence(Box<Pattern>),
    /// A text atom parsed as a `{k=v, k2=v2}`-shaped map literal, each value
    /// checked against the inner pattern.
    Mapping(Box<Pattern>),
    /// A named aggregate matching a sequence of sub-patterns into a record.
    Object(SlotList),
}

impl Debug for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Regex(r) => write!(f, "Regex({r:?})"),
            Pattern::AnyOne => write!(f, "AnyOne"),
            Pattern::All => write!(f, "All"),
            Pattern::ElementClass(kind) => write!(f, "ElementClass({kind:?})"),
            Pattern::Multi(inner) => write!(f, "Multi({inner:?})"),
            Pattern::Anti(inner) => write!(f, "Anti({inner:?})"),
            Pattern::Union { patterns, anti } => write!(f, "Union({patterns:?}, anti={anti})"),
            Pattern::Sequence(inner) => write!(f, "Sequence({inner:?})"),
            Pattern::Mapping(inner) => write!(f, "Mapping({inner:?})"),
            Pattern::Object(slots) => write!(f, "Object({} slots)", slots.len()),
        }
    }
}

/// The result of attempting to match one atom against one pattern.
#[derive(Debug)]
pub enum MatchOutcome {
    Found(Value),
    Reject,
}

fn atom_to_value(atom: &Atom) -> Value {
    match atom {
        Atom::Text(s) => Value::Text(s.clone()),
        Atom::Element(e) => Value::Element(e.clone()),
    }
}

fn parse_sequence_literal(text: &str, inner: &Pattern) -> MatchOutcome {
    let Some(body) = text.trim().strip_prefix('[').and_then(|s| s.strip_suffix(']')) else {
        return MatchOutcome::Reject;
    };
    if body.trim().is_empty() {
        return MatchOutcome::Found(Value::List(Vec::new()));
    }
    let mut values = Vec::new();
    for item in body.split(',') {
        match inner.match_one(&Atom::Text(item.trim().to_string())) {
            MatchOutcome::Found(value) => values.push(value),
            MatchOutcome::Reject => return MatchOutcome::Reject,
        }
    }
    MatchOutcome::Found(Value::List(values))
}

fn parse_mapping_literal(text: &str, inner: &Pattern) -> MatchOutcome {
    let Some(body) = text.trim().strip_prefix('{').and_then(|s| s.strip_suffix('}')) else {
        return MatchOutcome::Reject;
    };
    let mut map = IndexMap::new();
    if body.trim().is_empty() {
        return MatchOutcome::Found(Value::Map(map));
    }
    for entry in body.split(',') {
        let Some((key, value)) = entry.split_once('=') else {
            return MatchOutcome::Reject;
        };
        match inner.match_one(&Atom::Text(value.trim().to_string())) {
            MatchOutcome::Found(value) => {
                map.insert(key.trim().to_string(), value);
            }
            MatchOutcome::Reject => return MatchOutcome::Reject,
        }
    }
    MatchOutcome::Found(Value::Map(map))
}

/// Discriminates a [`Pattern`]'s variant for [`crate::handler::HandlerRegistry`]
/// lookup, independent of the data each variant carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PatternKind {
    Regex,
    AnyOne,
    All,
    ElementClass,
    Multi,
    Anti,
    Union,
    Sequence,
    Mapping,
    Object,
}

impl Pattern {
    pub fn kind(&self) -> PatternKind {
        match self {
            Pattern::Regex(_) => PatternKind::Regex,
            Pattern::AnyOne => PatternKind::AnyOne,
            Pattern::All => PatternKind::All,
            Pattern::ElementClass(_) => PatternKind::ElementClass,
            Pattern::Multi(_) => PatternKind::Multi,
            Pattern::Anti(_) => PatternKind::Anti,
            Pattern::Union { .. } => PatternKind::Union,
            Pattern::Sequence(_) => PatternKind::Sequence,
            Pattern::Mapping(_) => PatternKind::Mapping,
            Pattern::Object(_) => PatternKind::Object,
        }
    }

    /// Matches `atom` as a single value. [`Pattern::Multi`] and
    /// [`Pattern::Object`] panic here — they require tokeniser access and
    /// are matched through [`crate::handler`] instead.
    pub fn match_one(&self, atom: &Atom) -> MatchOutcome {
        match self {
            Pattern::Regex(r) => r.match_atom(atom),
            Pattern::AnyOne => MatchOutcome::Found(atom_to_value(atom)),
            Pattern::All => MatchOutcome::Found(atom_to_value(atom)),
            Pattern::ElementClass(kind) => match atom {
                Atom::Element(e) if &e.kind == kind => MatchOutcome::Found(Value::Element(e.clone())),
                _ => MatchOutcome::Reject,
            },
            Pattern::Multi(_) => {
                panic!("Multi must be matched through handler::multi_handler, not match_one")
            }
            Pattern::Anti(inner) => match inner.match_one(atom) {
                MatchOutcome::Found(_) => MatchOutcome::Reject,
                MatchOutcome::Reject => MatchOutcome::Found(atom_to_value(atom)),
            },
            Pattern::Union { patterns, anti } => {
                let hit = patterns.iter().find_map(|p| match p.match_one(atom) {
                    MatchOutcome::Found(v) => Some(v),
                    MatchOutcome::Reject => None,
                });
                match (hit, *anti) {
                    (Some(v), false) => MatchOutcome::Found(v),
                    (Some(_), true) => MatchOutcome::Reject,
                    (None, false) => MatchOutcome::Reject,
                    (None, true) => MatchOutcome::Found(atom_to_value(atom)),
                }
            }
            Pattern::Sequence(inner) => match atom {
                Atom::Text(s) => parse_sequence_literal(s, inner),
                Atom::Element(_) => MatchOutcome::Reject,
            },
            Pattern::Mapping(inner) => match atom {
                Atom::Text(s) => parse_mapping_literal(s, inner),
                Atom::Element(_) => MatchOutcome::Reject,
            },
            Pattern::Object(_) => {
                panic!("Object must be matched through handler::object_handler, not match_one")
            }
        }
    }

    /// Whether this pattern is a terminal wildcard consuming every
    /// remaining atom.
    pub fn is_all(&self) -> bool {
        matches!(self, Pattern::All)
    }
}

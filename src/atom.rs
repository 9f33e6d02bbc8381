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

//! Input units (as handed to the tokeniser) and atoms (as produced by it).

use serde::{Deserialize, Serialize};

/// An opaque non-text element carried through a message unchanged. `kind` is
/// compared against [`crate::pattern::Pattern::ElementClass`] and header
/// prefix declarations; `payload` is caller data the grammar never inspects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl Element {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: None,
        }
    }

    pub fn with_payload(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            payload: Some(payload),
        }
    }
}

/// One member of the heterogeneous sequence a caller hands to the tokeniser:
/// either raw text (subject to splitting) or an opaque element.
#[derive(Clone, Debug, PartialEq)]
pub enum Unit {
    Text(String),
    Element(Element),
}

impl From<&str> for Unit {
    fn from(value: &str) -> Self {
        Unit::Text(value.to_string())
    }
}

impl From<String> for Unit {
    fn from(value: String) -> Self {
        Unit::Text(value)
    }
}

impl From<Element> for Unit {
    fn from(value: Element) -> Self {
        Unit::Element(value)
    }
}

/// One indivisible input token, as produced by the tokeniser: a split-out
/// string, or a non-text element preserved whole.
#[derive(Clone, Debug, PartialEq)]
pub enum Atom {
    Text(String),
    Element(Element),
}

impl Atom {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Atom::Text(s) => Some(s),
            Atom::Element(_) => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Atom::Text(_))
    }
}

impl std::fmt::Display for Atom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Atom::Text(s) => write!(f, "{s}"),
            Atom::Element(e) => write!(f, "<{}>", e.kind),
        }
    }
}

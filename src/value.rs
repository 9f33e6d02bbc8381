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

//! Matched values and the three sentinels a slot's default may hold.

use indexmap::IndexMap;

use crate::atom::Element;

/// The value recorded for a slot once its pattern has matched.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Element(Element),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),

    /// The atom matched a pattern whose literal text equalled the atom
    /// itself: "matched, but carries no new information" (§7 of the design
    /// notes this crate was built from). Callers should treat it as truthy;
    /// see [`Value::is_truthy`].
    Omitted,
}

impl Value {
    /// The OMITTED sentinel is recorded when a regex pattern's literal
    /// source equals the matched atom (the canonical case being a
    /// boolean-flag-shaped argument like `--verbose`, where the pattern *is*
    /// the flag name). Callers that branch on presence should treat it the
    /// same as `Bool(true)`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Omitted => true,
            Value::Bool(b) => *b,
            Value::Text(s) => !s.is_empty(),
            Value::Int(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::List(v) => !v.is_empty(),
            Value::Map(m) => !m.is_empty(),
            Value::Element(_) => true,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A slot's declared default, distinguishing the three absent-value
/// sentinels: substitute nothing, fail on absence, or substitute a concrete
/// value.
#[derive(Clone, Debug, PartialEq)]
pub enum SlotDefault {
    /// Slot is optional; on no match, record nothing for it.
    None,

    /// Slot is required; on no match, analysis fails.
    Empty,

    /// Slot is optional; on no match, record this value.
    Value(Value),
}

impl SlotDefault {
    pub fn is_required(&self) -> bool {
        matches!(self, SlotDefault::Empty)
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            SlotDefault::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Value> for SlotDefault {
    fn from(value: Value) -> Self {
        SlotDefault::Value(value)
    }
}

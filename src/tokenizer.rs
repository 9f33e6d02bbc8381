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

//! Splits a heterogeneous input into an indexed stream of atoms, and lets an
//! [`crate::analyser::Analyser`] walk that stream with a peek/pop/put-back
//! discipline.

use crate::atom::{Atom, Element, Unit};
use crate::error::AnalysisError;

/// Splits `text` on `sep`, collapsing leading whitespace and treating
/// single- and double-quoted spans as atomic (the quotes themselves are
/// removed). Splits that contain no content are discarded; a quoted empty
/// string (`""`) is content and survives as an empty atom.
pub fn split(text: &str, sep: &str) -> Vec<String> {
    let sep = if sep.is_empty() { " " } else { sep };
    let chars: Vec<char> = text.trim_start().chars().collect();
    let sep_chars: Vec<char> = sep.chars().collect();

    let mut result = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut has_content = false;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if let Some(q) = quote {
            if c == q {
                quote = None;
            } else {
                current.push(c);
            }
            has_content = true;
            i += 1;
            continue;
        }
        if c == '\'' || c == '"' {
            quote = Some(c);
            has_content = true;
            i += 1;
            continue;
        }
        if !sep_chars.is_empty() && chars[i..].starts_with(sep_chars.as_slice()) {
            if has_content {
                result.push(std::mem::take(&mut current));
            }
            has_content = false;
            i += sep_chars.len();
            continue;
        }
        current.push(c);
        has_content = true;
        i += 1;
    }
    if has_content {
        result.push(current);
    }
    result
}

enum RawUnit {
    Text(Vec<String>),
    Element(Element),
}

/// Configuration governing how a [`Tokenizer`] is built from raw [`Unit`]s.
#[derive(Clone, Debug)]
pub struct TokenizerConfig {
    pub separator: String,
    /// Element kinds dropped silently, as if they had never appeared.
    pub filter_out: Vec<String>,
    /// When `Some`, an element whose kind is neither filtered out nor listed
    /// here fails tokenisation with [`AnalysisError::UnexpectedElement`].
    /// `None` means every element kind is accepted.
    pub recognized_kinds: Option<Vec<String>>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            separator: " ".to_string(),
            filter_out: Vec::new(),
            recognized_kinds: None,
        }
    }
}

/// A single-pass, reduce-capable cursor over the atoms derived from a
/// message. Atoms are addressed by a `(current_index, content_index)` pair:
/// `current_index` selects the surviving unit, `content_index` selects a
/// position within that unit's split text (always 0 for an element unit).
pub struct Tokenizer {
    original: Vec<Unit>,
    raw: Vec<RawUnit>,
    separator: String,
    current_index: usize,
    content_index: usize,
}

impl Tokenizer {
    /// Builds a tokenizer from `units`, applying `config`'s separator,
    /// filter-out set, and strict-element policy.
    ///
    /// Fails with [`AnalysisError::NullTextMessage`] if no text unit survives
    /// filtering, or [`AnalysisError::UnexpectedElement`] if strict mode is
    /// engaged (`recognized_kinds` is `Some`) and an unrecognised element
    /// kind appears.
    pub fn new(units: Vec<Unit>, config: &TokenizerConfig) -> Result<Self, AnalysisError> {
        let mut raw = Vec::with_capacity(units.len());
        let mut saw_text = false;
        for unit in &units {
            match unit {
                Unit::Text(text) => {
                    let parts = split(text, &config.separator);
                    if parts.is_empty() {
                        continue;
                    }
                    saw_text = true;
                    raw.push(RawUnit::Text(parts));
                }
                Unit::Element(element) => {
                    if config.filter_out.iter().any(|k| k == &element.kind) {
                        continue;
                    }
                    if let Some(recognized) = &config.recognized_kinds {
                        if !recognized.iter().any(|k| k == &element.kind) {
                            return Err(AnalysisError::UnexpectedElement(element.kind.clone()));
                        }
                    }
                    raw.push(RawUnit::Element(element.clone()));
                }
            }
        }
        if !saw_text {
            return Err(AnalysisError::NullTextMessage);
        }
        Ok(Self {
            original: units,
            raw,
            separator: config.separator.clone(),
            current_index: 0,
            content_index: 0,
        })
    }

    /// Returns the next atom without consuming it if `pop` is false,
    /// otherwise advances the cursor past it.
    ///
    /// `sep` only affects the *count* reported by [`Tokenizer::rest_count`]
    /// when it differs from the separator used to build this tokenizer;
    /// atom boundaries themselves are fixed at construction time.
    pub fn next(&mut self, pop: bool) -> Option<Atom> {
        loop {
            let unit = self.raw.get(self.current_index)?;
            match unit {
                RawUnit::Text(parts) => {
                    if self.content_index >= parts.len() {
                        self.current_index += 1;
                        self.content_index = 0;
                        continue;
                    }
                    let atom = parts[self.content_index].clone();
                    if pop {
                        self.content_index += 1;
                        if self.content_index >= parts.len() {
                            self.current_index += 1;
                            self.content_index = 0;
                        }
                    }
                    return Some(Atom::Text(atom));
                }
                RawUnit::Element(element) => {
                    let atom = element.clone();
                    if pop {
                        self.current_index += 1;
                        self.content_index = 0;
                    }
                    return Some(Atom::Element(atom));
                }
            }
        }
    }

    /// Puts back the most recently popped atom. Must be called at most once
    /// per prior `next(true)` with no intervening `next(true)` — the
    /// analyser and handlers maintain this symmetry (§8's "reduce symmetry"
    /// invariant).
    pub fn reduce(&mut self) {
        if self.content_index > 0 {
            self.content_index -= 1;
            return;
        }
        if self.current_index == 0 {
            return;
        }
        self.current_index -= 1;
        self.content_index = match &self.raw[self.current_index] {
            RawUnit::Text(parts) => parts.len().saturating_sub(1),
            RawUnit::Element(_) => 0,
        };
    }

    /// Number of atoms left to consume, honouring `sep` when recounting the
    /// text unit currently under the cursor.
    pub fn rest_count(&self, sep: &str) -> usize {
        let mut count = 0;
        for (idx, unit) in self.raw.iter().enumerate().skip(self.current_index) {
            match unit {
                RawUnit::Text(parts) => {
                    if idx == self.current_index && sep != self.separator {
                        let joined = parts[self.content_index..].join(&self.separator);
                        count += split(&joined, sep).len();
                    } else {
                        let start = if idx == self.current_index {
                            self.content_index
                        } else {
                            0
                        };
                        count += parts.len() - start;
                    }
                }
                RawUnit::Element(_) => count += 1,
            }
        }
        count
    }

    /// True once every atom has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.current_index >= self.raw.len()
    }

    /// Reconstructs the original units handed to [`Tokenizer::new`],
    /// including ones later dropped by the filter-out set, for echoing back
    /// to the caller in a failed [`crate::analyser::Record`].
    pub fn recover_raw(&self) -> Vec<Unit> {
        self.original.clone()
    }

    pub fn current_position(&self) -> (usize, usize) {
        (self.current_index, self.content_index)
    }
}

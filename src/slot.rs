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

//! An ordered, named list of `(pattern, default)` pairs — the shape shared
//! by a root command's main arguments, an option's arguments, and a
//! sub-command's arguments.

use indexmap::IndexMap;

use crate::error::ConstructError;
use crate::pattern::Pattern;
use crate::value::SlotDefault;

/// One named position in a [`SlotList`].
#[derive(Clone, Debug)]
pub struct Slot {
    pub name: String,
    pub pattern: Pattern,
    pub default: SlotDefault,
}

/// An ordered mapping from slot name to `{pattern, default}` (§3.2). Two
/// name prefixes desugar at construction time: a leading `*` wraps the
/// pattern in [`Pattern::Multi`], a leading `!` wraps it in
/// [`Pattern::Anti`]; the prefix is then stripped from the stored name.
#[derive(Clone, Debug, Default)]
pub struct SlotList {
    slots: IndexMap<String, Slot>,
}

impl SlotList {
    pub fn new() -> Self {
        Self {
            slots: IndexMap::new(),
        }
    }

    /// Declares one slot, applying `*`/`!` prefix desugaring to `name`.
    pub fn push(
        &mut self,
        name: impl Into<String>,
        pattern: Pattern,
        default: SlotDefault,
    ) -> Result<&mut Self, ConstructError> {
        let raw_name = name.into();
        let (mut stripped, mut pattern) = (raw_name.as_str(), pattern);
        let is_multi = stripped.starts_with('*');
        if is_multi {
            stripped = &stripped[1..];
        }
        let is_anti = stripped.starts_with('!');
        if is_anti {
            stripped = &stripped[1..];
        }
        if stripped.is_empty() {
            return Err(ConstructError::EmptyName);
        }
        if is_multi {
            pattern = Pattern::Multi(Box::new(pattern));
        }
        if is_anti {
            pattern = Pattern::Anti(Box::new(pattern));
        }
        let name = stripped.to_string();
        if self.slots.contains_key(&name) {
            return Err(ConstructError::DuplicateSlotName(name));
        }
        self.slots.insert(
            name.clone(),
            Slot {
                name,
                pattern,
                default,
            },
        );
        Ok(self)
    }

    /// A union slot, declared from a sequence of alternative patterns.
    pub fn push_union(
        &mut self,
        name: impl Into<String>,
        alternatives: Vec<Pattern>,
        default: SlotDefault,
    ) -> Result<&mut Self, ConstructError> {
        let raw_name: String = name.into();
        if alternatives.is_empty() {
            return Err(ConstructError::EmptyUnion(raw_name));
        }
        let anti = raw_name.trim_start_matches('*').starts_with('!');
        self.push(
            raw_name,
            Pattern::Union {
                patterns: alternatives,
                anti,
            },
            default,
        )
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Slot> {
        self.slots.get(name)
    }

    pub fn iter(&self) -> indexmap::map::Values<'_, String, Slot> {
        self.slots.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(|s| s.as_str())
    }

    /// Every slot's default is `Empty`.
    pub fn all_required(&self) -> bool {
        self.slots.values().all(|s| s.default.is_required())
    }

    /// Every slot has a usable default (`None` or `Value`), so the consumer
    /// can materialise the whole list from an empty input.
    pub fn all_defaultable(&self) -> bool {
        self.slots.values().all(|s| !s.default.is_required())
    }

    /// Right-biased union on slot names: `other`'s slots win when a name
    /// collides, but a colliding name keeps its original position.
    pub fn merge(mut self, other: SlotList) -> SlotList {
        for (name, slot) in other.slots {
            self.slots.insert(name, slot);
        }
        self
    }
}

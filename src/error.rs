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

//! The two error families: failures raised while building a command tree, and
//! failures raised while analysing a message against one.

use thiserror::Error as ThisError;

/// Raised while constructing a [`crate::slot::SlotList`] or
/// [`crate::tree::CommandTree`]. Always fatal to the construction call; never
/// appears once a tree exists.
#[derive(Clone, Debug, ThisError, PartialEq, Eq)]
pub enum ConstructError {
    /// A slot, option, or sub-command name was the empty string.
    #[error("name cannot be empty")]
    EmptyName,

    /// Two slots in the same list were given the same name.
    #[error("slot name '{0}' is already used in this slot list")]
    DuplicateSlotName(String),

    /// A command, option, or sub-command declared no acceptable head atom.
    #[error("header must declare at least one acceptable head atom")]
    EmptyHeader,

    /// A regex pattern's source failed to compile.
    #[error("invalid regex pattern '{0}': {1}")]
    InvalidRegex(String, String),

    /// A default value was declared as the `Empty` sentinel by name, which is
    /// only meaningful as a *default*, never as a slot's matched value.
    #[error("slot '{0}' cannot use Empty as its matched value")]
    EmptyAsValue(String),

    /// A union pattern was declared with no alternatives.
    #[error("union pattern for slot '{0}' must list at least one alternative")]
    EmptyUnion(String),
}

/// Raised while an [`crate::analyser::Analyser`] walks a message against a
/// [`crate::tree::CommandTree`].
#[derive(Clone, Debug, ThisError, PartialEq, Eq)]
pub enum AnalysisError {
    /// The input contained no atom derived from text.
    #[error("message contained no usable text")]
    NullTextMessage,

    /// A non-text atom of a kind not recognised by the tokeniser's strict
    /// mode appeared in the input.
    #[error("unexpected element of kind '{0}'")]
    UnexpectedElement(String),

    /// An atom was consumed but no pattern, option, or sub-command accepted
    /// it.
    #[error("unmatched parameter: {0}")]
    ParamsUnmatched(String),

    /// A required slot had no atom left to consume.
    #[error("missing argument: {0}")]
    ArgumentMissing(String),
}

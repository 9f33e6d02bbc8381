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

//! A command-line grammar engine.
//!
//! Callers declare a [`tree::CommandTree`] — a header, a main [`slot::SlotList`],
//! and a tree of option/sub-command children — and hand an input message to an
//! [`analyser::Analyser`] bound to that tree. The analyser tokenises the
//! message, matches the header, walks the tree atom by atom, and produces a
//! [`analyser::Record`] describing which header matched, which options and
//! sub-commands fired, and the typed value of every argument slot.
//!
//! The surface syntax for building a [`tree::CommandTree`] from a format
//! string, help-text rendering, and message-bus integration are not part of
//! this crate; they are expected to sit on top of the types here.

pub mod atom;
pub mod analyser;
pub mod diagnostic;
pub mod error;
pub mod handler;
pub mod manager;
pub mod pattern;
pub mod slot;
pub mod snapshot;
pub mod tokenizer;
pub mod tree;
pub mod value;

pub use analyser::{Analyser, Record};
pub use diagnostic::{Diagnostic, Severity};
pub use error::{AnalysisError, ConstructError};
pub use handler::HandlerRegistry;
pub use manager::CommandManager;
pub use pattern::Pattern;
pub use slot::{Slot, SlotList};
pub use tree::{CommandTree, OptionNode, SubcommandNode};
pub use value::{SlotDefault, Value};

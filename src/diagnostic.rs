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

//! A lightweight complaint record, analogous to `pspp::message::{Diagnostic,
//! Severity}` but stripped of that module's file/line source-span machinery:
//! this crate's atoms are positions in a token stream, not byte offsets into
//! a source file, so a [`Diagnostic`] carries a free-text message and the
//! offending atom's text instead of a [`std::ops::Range`] of [`Point`]s.

use std::fmt::{self, Display, Formatter};

use crate::error::AnalysisError;

/// How serious a [`Diagnostic`] is. Analysis failures are always
/// [`Severity::Error`]; the other two variants exist for callers building
/// their own diagnostics on top of this crate (e.g. a surface-syntax layer
/// warning about a deprecated option name).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One complaint raised while analysing a message: a severity, a free-text
/// description, and the offending slice of text, if the complaint can be
/// pinned to one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub text: String,
    pub offending: Option<String>,
}

impl Diagnostic {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
            offending: None,
        }
    }

    pub fn with_offending(mut self, offending: impl Into<String>) -> Self {
        self.offending = Some(offending.into());
        self
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.text)?;
        if let Some(offending) = &self.offending {
            write!(f, " ('{offending}')")?;
        }
        Ok(())
    }
}

impl From<&AnalysisError> for Diagnostic {
    /// Builds the [`Diagnostic`] a failed [`crate::analyser::Record`]'s
    /// `error_info` corresponds to, pulling the offending slice out of the
    /// error's own message where the error kind carries one.
    fn from(error: &AnalysisError) -> Self {
        match error {
            AnalysisError::NullTextMessage => Diagnostic::error(error.to_string()),
            AnalysisError::UnexpectedElement(kind) => {
                Diagnostic::error(error.to_string()).with_offending(kind.clone())
            }
            AnalysisError::ParamsUnmatched(detail) => {
                Diagnostic::error(error.to_string()).with_offending(detail.clone())
            }
            AnalysisError::ArgumentMissing(slot) => {
                Diagnostic::error(error.to_string()).with_offending(slot.clone())
            }
        }
    }
}

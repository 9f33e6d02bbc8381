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

//! Maps each [`PatternKind`] to the function that matches it against the
//! tokeniser (§4.3, §4.4). Seven of the ten pattern variants need nothing
//! beyond [`Pattern::match_one`] and share [`simple_handler`]; [`All`],
//! [`Multi`], and [`Object`] consume a variable number of atoms and get
//! their own handlers.
//!
//! [`All`]: crate::pattern::Pattern::All
//! [`Multi`]: crate::pattern::Pattern::Multi
//! [`Object`]: crate::pattern::Pattern::Object

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::atom::Atom;
use crate::error::AnalysisError;
use crate::pattern::{MatchOutcome, Pattern, PatternKind};
use crate::tokenizer::Tokenizer;
use crate::value::{SlotDefault, Value};

/// Everything a handler needs to match one slot: the tokeniser positioned
/// just past the atom it was dispatched on, that atom itself, the slot's
/// name/pattern/default, the slot list's arity and separator (for the
/// [`crate::pattern::Pattern::Multi`] arity protocol), the dispatch names
/// known at the current tree level (so `Multi` stops before swallowing a
/// sibling option or sub-command), the registry itself (so [`Pattern::Object`]
/// can recurse), and the result map to record into.
pub struct HandlerArgs<'a> {
    pub tokenizer: &'a mut Tokenizer,
    pub peeked: Atom,
    pub slot_name: &'a str,
    pub pattern: &'a Pattern,
    pub default: &'a SlotDefault,
    pub nargs: usize,
    pub sep: &'a str,
    pub known_names: &'a [String],
    pub registry: &'a HandlerRegistry,
    pub result_map: &'a mut IndexMap<String, Value>,
}

pub type HandlerFn = Arc<dyn Fn(HandlerArgs) -> Result<(), AnalysisError> + Send + Sync>;

/// Records `default` into `result_map`, or fails, when an atom was seen but
/// rejected by the pattern (§3.2): `Empty` fails, `None` records nothing,
/// `Value` is recorded verbatim.
fn reject_fallback(
    default: &SlotDefault,
    slot_name: &str,
    rejected: &Atom,
    result_map: &mut IndexMap<String, Value>,
) -> Result<(), AnalysisError> {
    match default {
        SlotDefault::Empty => Err(AnalysisError::ParamsUnmatched(format!(
            "'{rejected}' is not valid for '{slot_name}'"
        ))),
        SlotDefault::None => Ok(()),
        SlotDefault::Value(v) => {
            log::trace!("slot '{slot_name}' defaulted to {v:?} after rejecting '{rejected}'");
            result_map.insert(slot_name.to_string(), v.clone());
            Ok(())
        }
    }
}

/// Handles every pattern variant that [`Pattern::match_one`] can decide on
/// its own: reject puts the atom back and falls through to the slot's
/// default.
fn simple_handler(args: HandlerArgs) -> Result<(), AnalysisError> {
    match args.pattern.match_one(&args.peeked) {
        MatchOutcome::Found(value) => {
            args.result_map.insert(args.slot_name.to_string(), value);
            Ok(())
        }
        MatchOutcome::Reject => {
            args.tokenizer.reduce();
            reject_fallback(args.default, args.slot_name, &args.peeked, args.result_map)
        }
    }
}

/// Consumes every remaining atom, including the one already peeked, as a
/// list. Only sensible as a slot list's last slot.
fn all_handler(args: HandlerArgs) -> Result<(), AnalysisError> {
    let mut values = vec![atom_value(&args.peeked)];
    while let Some(atom) = args.tokenizer.next(true) {
        values.push(atom_value(&atom));
    }
    args.result_map
        .insert(args.slot_name.to_string(), Value::List(values));
    Ok(())
}

fn atom_value(atom: &Atom) -> Value {
    match atom {
        Atom::Text(s) => Value::Text(s.clone()),
        Atom::Element(e) => Value::Element(e.clone()),
    }
}

/// Matches a variable-length run of atoms against the inner pattern,
/// bounded by the slot list's remaining arity (§4.2, grounded on
/// `multi_arg_handler` in the pattern this crate's argument engine is
/// grounded on). `nargs` is the slot list's total slot count and
/// `result_map.len()` the number already filled, so
/// `remaining_slots = nargs - filled - 1` is how many slots still need an
/// atom *after* this one; this slot may claim at most
/// `rest_count(sep) - remaining_slots + 1` atoms, leaving one apiece for
/// the rest.
///
/// On an inner rejection, the rejected atom and up to `remaining_slots` of
/// the atoms already accepted this round are put back — they may belong to
/// a later slot. An empty accepted list with no rejection ever seen cannot
/// happen (there was always at least one atom available to try).
fn multi_handler(args: HandlerArgs) -> Result<(), AnalysisError> {
    let Pattern::Multi(inner) = args.pattern else {
        unreachable!("multi_handler registered only for PatternKind::Multi")
    };

    let remaining_slots = (args.nargs as isize - args.result_map.len() as isize - 1).max(0) as usize;
    args.tokenizer.reduce();
    let rest = args.tokenizer.rest_count(args.sep) as isize;
    let available = (rest - remaining_slots as isize + 1).max(0) as usize;

    let mut accepted: Vec<Value> = Vec::new();
    let mut hit_rejection = false;
    for _ in 0..available {
        let Some(atom) = args.tokenizer.next(true) else {
            break;
        };
        if let Atom::Text(text) = &atom {
            if args.known_names.iter().any(|n| n == text) {
                args.tokenizer.reduce();
                break;
            }
        }
        match inner.match_one(&atom) {
            MatchOutcome::Found(value) => accepted.push(value),
            MatchOutcome::Reject => {
                args.tokenizer.reduce();
                let putback = accepted.len().min(remaining_slots);
                for _ in 0..putback {
                    accepted.pop();
                    args.tokenizer.reduce();
                }
                hit_rejection = true;
                break;
            }
        }
    }

    if accepted.is_empty() && hit_rejection {
        // The slot is list-shaped even when nothing matched: a default of
        // `Value(v)` fills the list with that one value, not `v` itself.
        return match args.default {
            SlotDefault::Empty => Err(AnalysisError::ParamsUnmatched(format!(
                "no value for '{}'",
                args.slot_name
            ))),
            SlotDefault::None => {
                args.result_map
                    .insert(args.slot_name.to_string(), Value::List(Vec::new()));
                Ok(())
            }
            SlotDefault::Value(v) => {
                args.result_map
                    .insert(args.slot_name.to_string(), Value::List(vec![v.clone()]));
                Ok(())
            }
        };
    }
    args.result_map
        .insert(args.slot_name.to_string(), Value::List(accepted));
    Ok(())
}

/// Matches a named aggregate: the atom already peeked is put back, then the
/// inner slot list is consumed from the same tokeniser as a nested record
/// (§3.1's "Object" variant). No action runs afterward — only root, option,
/// and sub-command nodes carry one.
fn object_handler(args: HandlerArgs) -> Result<(), AnalysisError> {
    let Pattern::Object(slots) = args.pattern else {
        unreachable!("object_handler registered only for PatternKind::Object")
    };
    args.tokenizer.reduce();
    let mut nested = IndexMap::new();
    crate::analyser::consume_slot_list(
        args.tokenizer,
        slots,
        args.sep,
        args.known_names,
        args.registry,
        &mut nested,
    )?;
    args.result_map
        .insert(args.slot_name.to_string(), Value::Map(nested));
    Ok(())
}

/// A process-local table from pattern variant to matching function (§4.4).
/// Registration is additive: [`HandlerRegistry::register`] replaces
/// whatever handler, built-in or not, previously owned that variant.
#[derive(Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<PatternKind, HandlerFn>,
}

impl HandlerRegistry {
    /// The registry every [`crate::analyser::Analyser`] starts from: every
    /// variant bound to its built-in handler.
    pub fn with_defaults() -> Self {
        let mut handlers: HashMap<PatternKind, HandlerFn> = HashMap::new();
        for kind in [
            PatternKind::Regex,
            PatternKind::AnyOne,
            PatternKind::ElementClass,
            PatternKind::Anti,
            PatternKind::Union,
            PatternKind::Sequence,
            PatternKind::Mapping,
        ] {
            handlers.insert(kind, Arc::new(simple_handler));
        }
        handlers.insert(PatternKind::All, Arc::new(all_handler));
        handlers.insert(PatternKind::Multi, Arc::new(multi_handler));
        handlers.insert(PatternKind::Object, Arc::new(object_handler));
        Self { handlers }
    }

    pub fn register(&mut self, kind: PatternKind, handler: HandlerFn) {
        self.handlers.insert(kind, handler);
    }

    pub fn dispatch(&self, args: HandlerArgs) -> Result<(), AnalysisError> {
        let kind = args.pattern.kind();
        let handler = self
            .handlers
            .get(&kind)
            .expect("with_defaults registers every PatternKind");
        handler(args)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Unit;
    use crate::pattern::RegexPattern;
    use crate::tokenizer::TokenizerConfig;

    fn tokenizer(text: &str) -> Tokenizer {
        Tokenizer::new(vec![Unit::from(text)], &TokenizerConfig::default()).unwrap()
    }

    #[test]
    fn multi_claims_exactly_the_reserved_share() {
        // nargs=2, this is slot 0 of 2: one slot must be left for the slot
        // after it, so "ab 1 2" leaves "2" unclaimed.
        let mut tok = tokenizer("ab 1 2");
        let peeked = tok.next(true).unwrap();
        let registry = HandlerRegistry::with_defaults();
        let mut result = IndexMap::new();
        let inner = Pattern::Regex(RegexPattern::int_pattern());
        let pattern = Pattern::Multi(Box::new(inner));
        registry
            .dispatch(HandlerArgs {
                tokenizer: &mut tok,
                peeked,
                slot_name: "nums",
                pattern: &pattern,
                default: &SlotDefault::None,
                nargs: 2,
                sep: " ",
                known_names: &[],
                registry: &registry,
                result_map: &mut result,
            })
            .unwrap();
        // "ab" itself is rejected by the int pattern on the first try, so
        // accepted stays empty and the None default records nothing.
        assert!(!result.contains_key("nums"));
    }

    #[test]
    fn multi_stops_on_rejection_and_puts_back() {
        let mut tok = tokenizer("1 2 ab");
        let peeked = tok.next(true).unwrap();
        let registry = HandlerRegistry::with_defaults();
        let mut result = IndexMap::new();
        let inner = Pattern::Regex(RegexPattern::int_pattern());
        let pattern = Pattern::Multi(Box::new(inner));
        registry
            .dispatch(HandlerArgs {
                tokenizer: &mut tok,
                peeked,
                slot_name: "nums",
                pattern: &pattern,
                default: &SlotDefault::None,
                nargs: 1,
                sep: " ",
                known_names: &[],
                registry: &registry,
                result_map: &mut result,
            })
            .unwrap();
        match result.get("nums") {
            Some(Value::List(values)) => {
                assert_eq!(values, &vec![Value::Int(1), Value::Int(2)]);
            }
            other => panic!("expected Some(List), got {other:?}"),
        }
        assert_eq!(tok.next(true).unwrap(), Atom::Text("ab".into()));
    }

    #[test]
    fn multi_stops_before_a_known_sibling_name() {
        let mut tok = tokenizer("1 2 --bar");
        let peeked = tok.next(true).unwrap();
        let registry = HandlerRegistry::with_defaults();
        let mut result = IndexMap::new();
        let inner = Pattern::Regex(RegexPattern::int_pattern());
        let pattern = Pattern::Multi(Box::new(inner));
        let known = vec!["--bar".to_string()];
        registry
            .dispatch(HandlerArgs {
                tokenizer: &mut tok,
                peeked,
                slot_name: "nums",
                pattern: &pattern,
                default: &SlotDefault::None,
                nargs: 1,
                sep: " ",
                known_names: &known,
                registry: &registry,
                result_map: &mut result,
            })
            .unwrap();
        match result.get("nums") {
            Some(Value::List(values)) => {
                assert_eq!(values, &vec![Value::Int(1), Value::Int(2)]);
            }
            other => panic!("expected Some(List), got {other:?}"),
        }
        assert_eq!(tok.next(true).unwrap(), Atom::Text("--bar".into()));
    }

    #[test]
    fn all_handler_consumes_the_rest() {
        let mut tok = tokenizer("a b c");
        let peeked = tok.next(true).unwrap();
        let registry = HandlerRegistry::with_defaults();
        let mut result = IndexMap::new();
        registry
            .dispatch(HandlerArgs {
                tokenizer: &mut tok,
                peeked,
                slot_name: "rest",
                pattern: &Pattern::All,
                default: &SlotDefault::None,
                nargs: 1,
                sep: " ",
                known_names: &[],
                registry: &registry,
                result_map: &mut result,
            })
            .unwrap();
        match result.get("rest") {
            Some(Value::List(values)) => assert_eq!(values.len(), 3),
            other => panic!("expected Some(List), got {other:?}"),
        }
        assert!(tok.is_exhausted());
    }

    #[test]
    fn simple_handler_falls_back_to_default_on_reject() {
        let mut tok = tokenizer("notanumber");
        let peeked = tok.next(true).unwrap();
        let registry = HandlerRegistry::with_defaults();
        let mut result = IndexMap::new();
        let pattern = Pattern::Regex(RegexPattern::int_pattern());
        registry
            .dispatch(HandlerArgs {
                tokenizer: &mut tok,
                peeked,
                slot_name: "n",
                pattern: &pattern,
                default: &SlotDefault::Value(Value::Int(0)),
                nargs: 1,
                sep: " ",
                known_names: &[],
                registry: &registry,
                result_map: &mut result,
            })
            .unwrap();
        assert_eq!(result.get("n"), Some(&Value::Int(0)));
        assert_eq!(tok.next(true).unwrap(), Atom::Text("notanumber".into()));
    }

    #[test]
    fn simple_handler_fails_when_default_is_empty() {
        let mut tok = tokenizer("notanumber");
        let peeked = tok.next(true).unwrap();
        let registry = HandlerRegistry::with_defaults();
        let mut result = IndexMap::new();
        let pattern = Pattern::Regex(RegexPattern::int_pattern());
        let err = registry
            .dispatch(HandlerArgs {
                tokenizer: &mut tok,
                peeked,
                slot_name: "n",
                pattern: &pattern,
                default: &SlotDefault::Empty,
                nargs: 1,
                sep: " ",
                known_names: &[],
                registry: &registry,
                result_map: &mut result,
            })
            .unwrap_err();
        assert!(matches!(err, AnalysisError::ParamsUnmatched(_)));
    }
}

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

//! Walks a message against a [`CommandTree`]: header match, then a
//! peek-dispatch loop over main arguments, options, and sub-commands
//! (§4.2), producing a [`Record`] whether or not the match succeeds.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::atom::{Atom, Unit};
use crate::error::AnalysisError;
use crate::handler::{HandlerArgs, HandlerRegistry};
use crate::slot::{Slot, SlotList};
use crate::tokenizer::{Tokenizer, TokenizerConfig};
use crate::tree::{Action, AsyncActionFn, Child, CommandTree, OptionNode, SubcommandNode, apply_action_result};
use crate::value::{SlotDefault, Value};

fn consume_named_slot(
    tokenizer: &mut Tokenizer,
    slot: &Slot,
    nargs: usize,
    sep: &str,
    known_names: &[String],
    registry: &HandlerRegistry,
    result_map: &mut IndexMap<String, Value>,
) -> Result<(), AnalysisError> {
    match tokenizer.next(true) {
        None => match &slot.default {
            SlotDefault::Empty => Err(AnalysisError::ArgumentMissing(slot.name.clone())),
            SlotDefault::None => Ok(()),
            SlotDefault::Value(v) => {
                result_map.insert(slot.name.clone(), v.clone());
                Ok(())
            }
        },
        Some(peeked) => registry.dispatch(HandlerArgs {
            tokenizer,
            peeked,
            slot_name: &slot.name,
            pattern: &slot.pattern,
            default: &slot.default,
            nargs,
            sep,
            known_names,
            registry,
            result_map,
        }),
    }
}

/// Consumes every slot in `slots`, in order, from `tokenizer`. Used for an
/// option's or sub-command's own argument list, and recursively for
/// [`crate::pattern::Pattern::Object`] — none of these interleave with a
/// sibling dispatch, unlike a command's main arguments.
pub(crate) fn consume_slot_list(
    tokenizer: &mut Tokenizer,
    slots: &SlotList,
    sep: &str,
    known_names: &[String],
    registry: &HandlerRegistry,
    result_map: &mut IndexMap<String, Value>,
) -> Result<(), AnalysisError> {
    let nargs = slots.len();
    for slot in slots.iter() {
        consume_named_slot(tokenizer, slot, nargs, sep, known_names, registry, result_map)?;
    }
    Ok(())
}

fn defaulted_map(slots: &SlotList) -> IndexMap<String, Value> {
    let mut map = IndexMap::new();
    for slot in slots.iter() {
        if let SlotDefault::Value(v) = &slot.default {
            map.insert(slot.name.clone(), v.clone());
        }
    }
    map
}

/// Folds a value into `map`, promoting a repeated option's entries into a
/// list on the second occurrence and appending from the third on (§4.2).
fn promote(map: &mut IndexMap<String, Value>, name: &str, value: Value) {
    match map.shift_remove(name) {
        None => {
            map.insert(name.to_string(), value);
        }
        Some(Value::List(mut list)) => {
            list.push(value);
            map.insert(name.to_string(), Value::List(list));
        }
        Some(existing) => {
            map.insert(name.to_string(), Value::List(vec![existing, value]));
        }
    }
}

/// An [`Action::Async`] deferred out of a matched [`Record`] (§5): the
/// analyser never invokes it inline, so the caller runs it under their own
/// scheduler and, if it returns a positional replacement, applies
/// [`apply_action_result`] itself.
#[derive(Clone)]
pub struct PendingAction {
    /// Empty for the root command's own action, `[option_dest]` or
    /// `[subcommand_name]` for a child's, `[subcommand_name, option_dest]`
    /// for a sub-command's own option.
    pub path: Vec<String>,
    pub action: AsyncActionFn,
    pub values: IndexMap<String, Value>,
}

impl fmt::Debug for PendingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingAction")
            .field("path", &self.path)
            .field("values", &self.values)
            .finish()
    }
}

/// One matched sub-command's own arguments and options.
#[derive(Clone, Debug, Default)]
pub struct SubcommandRecord {
    pub args: IndexMap<String, Value>,
    pub options: IndexMap<String, Value>,
}

/// The outcome of analysing one message against one [`CommandTree`] (§3.4).
/// Produced whether or not the match succeeded — a failed match still
/// reports how far it got and what stopped it.
#[derive(Clone, Debug, Default)]
pub struct Record {
    pub head_matched: bool,
    pub matched: bool,
    pub header: Option<Value>,
    pub main_args: IndexMap<String, Value>,
    pub options: IndexMap<String, Value>,
    pub sub_commands: IndexMap<String, SubcommandRecord>,
    pub error_info: Option<AnalysisError>,
    pub error_data: Option<Vec<Unit>>,
    /// Set instead of matching further when a `--help`-shaped option was
    /// seen (§6 "Help hook"); `matched` stays `false`.
    pub help_text: Option<String>,
    pub pending_actions: Vec<PendingAction>,
}

impl Record {
    pub fn is_success(&self) -> bool {
        self.matched
    }

    /// The [`crate::diagnostic::Diagnostic`] corresponding to `error_info`,
    /// if analysis failed with one.
    pub fn diagnostic(&self) -> Option<crate::diagnostic::Diagnostic> {
        self.error_info.as_ref().map(crate::diagnostic::Diagnostic::from)
    }
}

/// Why the body loop stopped early: a genuine error, or a `--help` short
/// circuit (not an error, but also not a match).
enum Stop {
    Help(String),
    Error(AnalysisError),
}

/// Drives one [`CommandTree`] against messages. Cheap to construct; holds
/// no mutable state of its own, only configuration, so one instance can
/// analyse any number of messages.
pub struct Analyser<'a> {
    tree: &'a CommandTree,
    registry: HandlerRegistry,
    tokenizer_config: TokenizerConfig,
}

impl<'a> Analyser<'a> {
    pub fn new(tree: &'a CommandTree) -> Self {
        Self {
            tree,
            registry: HandlerRegistry::with_defaults(),
            tokenizer_config: TokenizerConfig {
                separator: tree.separator.clone(),
                ..Default::default()
            },
        }
    }

    pub fn with_registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_tokenizer_config(mut self, config: TokenizerConfig) -> Self {
        self.tokenizer_config = config;
        self
    }

    /// Tokenises `units` and matches them against the command tree. Only a
    /// failure to produce any usable atom at all ([`AnalysisError::NullTextMessage`]
    /// or [`AnalysisError::UnexpectedElement`]) propagates as `Err`; every
    /// failure past that point — an unmatched header, a rejected argument, a
    /// missing required slot — is folded into a `Record` with `matched:
    /// false` and `error_info` set, mirroring how a mismatch is just another
    /// outcome, not an exceptional one, once the message has been read at
    /// all.
    pub fn analyse(&self, units: Vec<Unit>) -> Result<Record, AnalysisError> {
        let mut tokenizer = Tokenizer::new(units, &self.tokenizer_config)?;
        let mut record = Record::default();

        let Some(head_atom) = tokenizer.next(true) else {
            record.error_info = Some(AnalysisError::ArgumentMissing("header".to_string()));
            record.error_data = Some(tokenizer.recover_raw());
            return Ok(record);
        };
        let Some(header_value) = self.tree.header.matches(&head_atom) else {
            log::debug!("'{}' header mismatch for command '{}'", head_atom, self.tree.name);
            record.error_info = Some(AnalysisError::ParamsUnmatched(format!(
                "'{head_atom}' does not match header"
            )));
            record.error_data = Some(tokenizer.recover_raw());
            return Ok(record);
        };
        record.head_matched = true;
        record.header = Some(header_value);

        let known_names: Vec<String> = self.tree.children.iter().map(|c| c.name().to_string()).collect();

        match self.consume_body(&mut tokenizer, &mut record, &known_names) {
            Ok(()) => record.matched = true,
            Err(Stop::Help(text)) => {
                record.help_text = Some(text);
                record.matched = false;
            }
            Err(Stop::Error(e)) => {
                record.error_info = Some(e);
                record.error_data = Some(tokenizer.recover_raw());
                record.matched = false;
            }
        }
        Ok(record)
    }

    fn consume_body(
        &self,
        tokenizer: &mut Tokenizer,
        record: &mut Record,
        known_names: &[String],
    ) -> Result<(), Stop> {
        loop {
            if tokenizer.is_exhausted() {
                break;
            }
            let Some(peek) = tokenizer.next(false) else {
                break;
            };
            if let Atom::Text(text) = &peek {
                let help_hit = self.tree.children.iter().any(|c| match c {
                    Child::Option(o) => o.is_help() && o.matches_dispatch(text),
                    Child::Subcommand(_) => false,
                });
                if help_hit {
                    tokenizer.next(true);
                    return Err(Stop::Help(self.help_text()));
                }
                if let Some(child) = self.tree.find_child(text) {
                    let child = child.clone();
                    tokenizer.next(true);
                    match child {
                        Child::Option(opt) => self.consume_option(tokenizer, &opt, known_names, record)?,
                        Child::Subcommand(sub) => self.consume_subcommand(tokenizer, &sub, record)?,
                    }
                    continue;
                }
            }

            let slot = self
                .tree
                .args
                .iter()
                .find(|s| !record.main_args.contains_key(&s.name));
            let Some(slot) = slot else {
                return Err(Stop::Error(AnalysisError::ParamsUnmatched(format!(
                    "unexpected '{peek}'"
                ))));
            };
            consume_named_slot(
                tokenizer,
                slot,
                self.tree.args.len(),
                &self.tree.separator,
                known_names,
                &self.registry,
                &mut record.main_args,
            )
            .map_err(Stop::Error)?;
        }

        for slot in self.tree.args.iter() {
            if record.main_args.contains_key(&slot.name) {
                continue;
            }
            match &slot.default {
                SlotDefault::Empty => {
                    return Err(Stop::Error(AnalysisError::ArgumentMissing(slot.name.clone())));
                }
                SlotDefault::None => {}
                SlotDefault::Value(v) => {
                    record.main_args.insert(slot.name.clone(), v.clone());
                }
            }
        }

        self.materialize_defaulted_children(record);

        if let Some(action) = &self.tree.action {
            let mut values = std::mem::take(&mut record.main_args);
            self.apply_action(action, &mut values, Vec::new(), record);
            record.main_args = values;
        }
        Ok(())
    }

    fn consume_option(
        &self,
        tokenizer: &mut Tokenizer,
        opt: &OptionNode,
        known_names: &[String],
        record: &mut Record,
    ) -> Result<(), Stop> {
        let mut args = IndexMap::new();
        consume_slot_list(tokenizer, &opt.args, &opt.separator, known_names, &self.registry, &mut args)
            .map_err(Stop::Error)?;
        if let Some(action) = &opt.action {
            self.apply_action(action, &mut args, vec![opt.dest.clone()], record);
        }
        promote(&mut record.options, &opt.dest, Value::Map(args));
        Ok(())
    }

    fn consume_subcommand(
        &self,
        tokenizer: &mut Tokenizer,
        sub: &SubcommandNode,
        record: &mut Record,
    ) -> Result<(), Stop> {
        let mut sub_record = SubcommandRecord::default();
        let known: Vec<String> = sub.options.iter().map(|o| o.name.clone()).collect();

        loop {
            if tokenizer.is_exhausted() {
                break;
            }
            let Some(peek) = tokenizer.next(false) else {
                break;
            };
            if let Atom::Text(text) = &peek {
                if let Some(opt) = sub.find_option(text) {
                    let opt = opt.clone();
                    tokenizer.next(true);
                    let mut args = IndexMap::new();
                    consume_slot_list(tokenizer, &opt.args, &opt.separator, &known, &self.registry, &mut args)
                        .map_err(Stop::Error)?;
                    if let Some(action) = &opt.action {
                        self.apply_action(
                            action,
                            &mut args,
                            vec![sub.name.clone(), opt.dest.clone()],
                            record,
                        );
                    }
                    promote(&mut sub_record.options, &opt.dest, Value::Map(args));
                    continue;
                }
            }

            let slot = sub
                .args
                .iter()
                .find(|s| !sub_record.args.contains_key(&s.name));
            let Some(slot) = slot else {
                return Err(Stop::Error(AnalysisError::ParamsUnmatched(format!(
                    "unexpected '{peek}'"
                ))));
            };
            consume_named_slot(
                tokenizer,
                slot,
                sub.args.len(),
                &sub.separator,
                &known,
                &self.registry,
                &mut sub_record.args,
            )
            .map_err(Stop::Error)?;
        }

        for slot in sub.args.iter() {
            if sub_record.args.contains_key(&slot.name) {
                continue;
            }
            match &slot.default {
                SlotDefault::Empty => {
                    return Err(Stop::Error(AnalysisError::ArgumentMissing(slot.name.clone())));
                }
                SlotDefault::None => {}
                SlotDefault::Value(v) => {
                    sub_record.args.insert(slot.name.clone(), v.clone());
                }
            }
        }

        if let Some(action) = &sub.action {
            self.apply_action(action, &mut sub_record.args, vec![sub.name.clone()], record);
        }
        record.sub_commands.insert(sub.name.clone(), sub_record);
        Ok(())
    }

    fn apply_action(
        &self,
        action: &Action,
        values: &mut IndexMap<String, Value>,
        path: Vec<String>,
        record: &mut Record,
    ) {
        match action {
            Action::Sync(f) => {
                let result = f(values);
                apply_action_result(values, result);
            }
            Action::Async(f) => {
                record.pending_actions.push(PendingAction {
                    path,
                    action: Arc::clone(f),
                    values: values.clone(),
                });
            }
        }
    }

    /// An option or sub-command never dispatched in the input still
    /// appears in the record, fully defaulted, when every one of its slots
    /// has a usable default (§4.2's arity notes): a child that *can't*
    /// fail to produce a value needn't have been typed to have one.
    fn materialize_defaulted_children(&self, record: &mut Record) {
        for child in &self.tree.children {
            match child {
                Child::Option(o) if !record.options.contains_key(&o.dest) && o.args.all_defaultable() => {
                    record.options.insert(o.dest.clone(), Value::Map(defaulted_map(&o.args)));
                }
                Child::Subcommand(s)
                    if !record.sub_commands.contains_key(&s.name) && s.args.all_defaultable() =>
                {
                    record.sub_commands.insert(
                        s.name.clone(),
                        SubcommandRecord {
                            args: defaulted_map(&s.args),
                            options: IndexMap::new(),
                        },
                    );
                }
                _ => {}
            }
        }
    }

    fn help_text(&self) -> String {
        let mut lines = vec![self.tree.name.clone()];
        for slot in self.tree.args.iter() {
            lines.push(format!("  {}: {:?}", slot.name, slot.pattern.kind()));
        }
        for child in &self.tree.children {
            lines.push(format!("  {}", child.name()));
        }
        lines.join("\n")
    }
}

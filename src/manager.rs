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

//! The process-wide command registry: a single [`OnceLock`]-guarded table
//! (generalising the `static COMMANDS: OnceLock<Vec<Command>>` this crate's
//! command-dispatch layer is built on) from `(namespace, name)` to a
//! registered [`CommandTree`], plus shortcut names and per-command
//! enable/disable flags.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, OnceLock};

use crate::analyser::{Analyser, Record};
use crate::atom::Unit;
use crate::error::AnalysisError;
use crate::tree::CommandTree;

type Identity = (String, String);

/// A registered expansion: typing the shortcut's name where a command's
/// header was expected behaves as if `expansion` had been typed instead.
/// When `reserve` is set, any atoms that followed the shortcut name are kept
/// and appended after the expansion.
#[derive(Clone, Debug)]
pub struct Shortcut {
    pub expansion: Vec<Unit>,
    pub reserve: bool,
}

/// A caller-supplied help renderer, invoked with the tree view a `--help`
/// hit short-circuited on (§6 "Help hook"). The manager owns one slot for
/// it process-wide (§4.7); an analysis itself never calls this directly —
/// the built-in help short circuit only sets [`crate::analyser::Record::help_text`],
/// leaving actually *sending* that text wherever the caller's message-bus
/// integration lives, which is why this hook exists as a separate
/// registration rather than a field on [`CommandTree`].
pub type HelpCallback = Arc<dyn Fn(&CommandTree, &str) + Send + Sync>;

#[derive(Default)]
struct Registry {
    commands: HashMap<Identity, Arc<CommandTree>>,
    shortcuts: HashMap<String, Shortcut>,
    disabled: HashSet<Identity>,
    /// `name → TypeId`-shaped map for a future surface-syntax front end to
    /// register custom argument types into (§4.7); this crate never reads
    /// from it, only holds it so registration has somewhere to land.
    custom_types: HashMap<String, String>,
    help_callback: Option<HelpCallback>,
}

fn registry() -> &'static Mutex<Registry> {
    static REGISTRY: OnceLock<Mutex<Registry>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(Registry::default()))
}

/// A handle onto the process-wide command table. Every method locks the
/// shared registry for the duration of the call; none of them block on
/// anything else.
pub struct CommandManager;

impl CommandManager {
    /// Registers `tree` under its own `(namespace, name)` identity,
    /// replacing whatever was registered there before.
    pub fn register(tree: CommandTree) {
        let identity = tree.identity();
        registry().lock().unwrap().commands.insert(identity, Arc::new(tree));
    }

    pub fn unregister(namespace: &str, name: &str) -> bool {
        let identity = (namespace.to_string(), name.to_string());
        let mut reg = registry().lock().unwrap();
        reg.disabled.remove(&identity);
        reg.commands.remove(&identity).is_some()
    }

    pub fn get(namespace: &str, name: &str) -> Option<Arc<CommandTree>> {
        let identity = (namespace.to_string(), name.to_string());
        registry().lock().unwrap().commands.get(&identity).cloned()
    }

    pub fn set_enabled(namespace: &str, name: &str, enabled: bool) {
        let identity = (namespace.to_string(), name.to_string());
        let mut reg = registry().lock().unwrap();
        if enabled {
            reg.disabled.remove(&identity);
        } else {
            reg.disabled.insert(identity);
        }
    }

    pub fn is_enabled(namespace: &str, name: &str) -> bool {
        let identity = (namespace.to_string(), name.to_string());
        !registry().lock().unwrap().disabled.contains(&identity)
    }

    pub fn add_shortcut(name: impl Into<String>, expansion: Vec<Unit>, reserve: bool) {
        registry()
            .lock()
            .unwrap()
            .shortcuts
            .insert(name.into(), Shortcut { expansion, reserve });
    }

    pub fn remove_shortcut(name: &str) -> bool {
        registry().lock().unwrap().shortcuts.remove(name).is_some()
    }

    fn find_shortcut(name: &str) -> Option<Shortcut> {
        registry().lock().unwrap().shortcuts.get(name).cloned()
    }

    /// Registers `type_name` under `name` in the process-wide custom-type
    /// table (§4.7). This crate does not interpret the table itself — it is
    /// retained for a surface-syntax front end to register into.
    pub fn register_type(name: impl Into<String>, type_name: impl Into<String>) {
        registry()
            .lock()
            .unwrap()
            .custom_types
            .insert(name.into(), type_name.into());
    }

    pub fn lookup_type(name: &str) -> Option<String> {
        registry().lock().unwrap().custom_types.get(name).cloned()
    }

    /// Installs the process-wide help-send callback, replacing whatever was
    /// installed before.
    pub fn set_help_callback(callback: HelpCallback) {
        registry().lock().unwrap().help_callback = Some(callback);
    }

    pub fn clear_help_callback() {
        registry().lock().unwrap().help_callback = None;
    }

    /// Invokes the installed help callback, if any, with `tree` and
    /// `help_text`. Returns whether a callback was installed to invoke.
    pub fn send_help(tree: &CommandTree, help_text: &str) -> bool {
        let callback = registry().lock().unwrap().help_callback.clone();
        match callback {
            Some(callback) => {
                callback(tree, help_text);
                true
            }
            None => false,
        }
    }

    /// Analyses `units` against the command registered as `(namespace,
    /// name)`. Returns `None` if no such command is registered or it has
    /// been disabled. On a header mismatch, falls back once to a matching
    /// shortcut registration (§4.5 / §6): if the input's first unit is text
    /// whose trimmed form names a registered shortcut, the shortcut's
    /// expansion is substituted in and matching is retried exactly once —
    /// shortcuts do not chain.
    pub fn analyse(
        namespace: &str,
        name: &str,
        units: Vec<Unit>,
    ) -> Option<Result<Record, AnalysisError>> {
        if !Self::is_enabled(namespace, name) {
            return None;
        }
        let tree = Self::get(namespace, name)?;
        let analyser = Analyser::new(tree.as_ref());

        let first = analyser.analyse(units.clone());
        if let Ok(record) = &first {
            if !record.head_matched {
                if let Some(Unit::Text(text)) = units.first() {
                    if let Some(shortcut) = Self::find_shortcut(text.trim()) {
                        log::debug!("shortcut '{}' expanded for command '{namespace}/{name}'", text.trim());
                        let mut expanded = shortcut.expansion.clone();
                        if shortcut.reserve {
                            expanded.extend(units.into_iter().skip(1));
                        }
                        return Some(analyser.analyse(expanded));
                    }
                }
            }
        }
        Some(first)
    }
}

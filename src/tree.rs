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

//! The command tree: a root node (header + main slot list) with an ordered
//! list of option and sub-command children, each a leaf carrying its own
//! slot list. Immutable once built; an [`crate::analyser::Analyser`] carries
//! all the mutable state needed to walk it (§3.3).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::atom::{Atom, Element};
use crate::error::ConstructError;
use crate::slot::SlotList;
use crate::value::Value;

/// One atom a [`Header`] will accept as the first atom of a message.
#[derive(Clone, Debug, PartialEq)]
pub enum HeadAtom {
    Text(String),
    ElementKind(String),
}

/// The non-empty ordered set of atoms identifying a command, plus an
/// optional list of prefixes (`!`, `/`, ...) that also identify it when
/// glued to a text head (§4.5).
#[derive(Clone, Debug)]
pub struct Header {
    pub heads: Vec<HeadAtom>,
    pub prefixes: Vec<String>,
}

impl Header {
    pub fn new(heads: Vec<HeadAtom>) -> Result<Self, ConstructError> {
        if heads.is_empty() {
            return Err(ConstructError::EmptyHeader);
        }
        Ok(Self {
            heads,
            prefixes: Vec::new(),
        })
    }

    pub fn text(head: impl Into<String>) -> Self {
        Self {
            heads: vec![HeadAtom::Text(head.into())],
            prefixes: Vec::new(),
        }
    }

    pub fn with_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.prefixes = prefixes;
        self
    }

    /// Returns the header [`Value`] if `atom` is an acceptable first atom.
    pub fn matches(&self, atom: &Atom) -> Option<Value> {
        match atom {
            Atom::Text(s) => {
                for head in &self.heads {
                    let HeadAtom::Text(text) = head else {
                        continue;
                    };
                    if s == text {
                        return Some(Value::Text(s.clone()));
                    }
                    for prefix in &self.prefixes {
                        if *s == format!("{prefix}{text}") {
                            return Some(Value::Text(s.clone()));
                        }
                    }
                }
                None
            }
            Atom::Element(e) => self.heads.iter().find_map(|head| match head {
                HeadAtom::ElementKind(kind) if kind == &e.kind => {
                    Some(Value::Element(e.clone()))
                }
                _ => None,
            }),
        }
    }
}

/// A future returned by an [`Action::Async`], boxed so the action type
/// doesn't need to be generic over it.
pub type ActionFuture = Pin<Box<dyn Future<Output = Option<Vec<Value>>> + Send>>;

pub type SyncActionFn = Arc<dyn Fn(&IndexMap<String, Value>) -> Option<Vec<Value>> + Send + Sync>;
pub type AsyncActionFn = Arc<dyn Fn(IndexMap<String, Value>) -> ActionFuture + Send + Sync>;

/// A callable attached to a root command, option, or sub-command, invoked
/// with that node's accumulated slot map once matching succeeds. Its
/// return value, if any, is mapped positionally back onto the slot map's
/// existing keys (§4.2).
#[derive(Clone)]
pub enum Action {
    Sync(SyncActionFn),
    /// Deferred; the analyser does not invoke this inline (§5 — core
    /// matching is synchronous). It is instead surfaced to the caller as a
    /// [`crate::analyser::PendingAction`] to run under their own scheduler.
    Async(AsyncActionFn),
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Sync(_) => write!(f, "Action::Sync(..)"),
            Action::Async(_) => write!(f, "Action::Async(..)"),
        }
    }
}

/// Applies a sync action's positional return onto `values`, leaving
/// `values` untouched if the action returned `None`.
pub fn apply_action_result(values: &mut IndexMap<String, Value>, result: Option<Vec<Value>>) {
    let Some(result) = result else { return };
    for (slot, new_value) in values.values_mut().zip(result) {
        *slot = new_value;
    }
}

/// Strips the leading dispatch-prefix characters (`-`) an option's declared
/// name carries, the way `SlotList::push` strips `*`/`!` off a slot name
/// (`slot.rs`'s name-prefix desugaring): `"--foo"` and `"-foo"` both key the
/// record under `"foo"`; a name with no leading `-` keys under itself.
fn strip_dispatch_prefix(name: &str) -> String {
    name.trim_start_matches('-').to_string()
}

/// A leaf child: an option. Matched when the peeked atom equals its name or
/// a registered alias is a prefix of it (§4.2 step 1); recorded into a
/// [`crate::analyser::Record`] under [`OptionNode::dest`], not [`OptionNode::name`]
/// (§3.4 — the dispatch prefix is not part of the result key).
#[derive(Clone, Debug)]
pub struct OptionNode {
    pub name: String,
    /// The key this option's value is recorded under in a
    /// [`crate::analyser::Record`]'s `options` map: `name` with its leading
    /// `-` dispatch prefix, if any, stripped.
    pub dest: String,
    pub aliases: Vec<String>,
    pub args: SlotList,
    pub separator: String,
    pub action: Option<Action>,
}

impl OptionNode {
    pub fn new(name: impl Into<String>, args: SlotList) -> Result<Self, ConstructError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConstructError::EmptyName);
        }
        let dest = strip_dispatch_prefix(&name);
        if dest.is_empty() {
            return Err(ConstructError::EmptyName);
        }
        Ok(Self {
            name,
            dest,
            aliases: Vec::new(),
            args,
            separator: " ".to_string(),
            action: None,
        })
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    /// The built-in `--help` option, conventionally aliased `-h`, short
    /// circuits analysis (§6 "Help hook").
    pub fn is_help(&self) -> bool {
        self.name == "--help"
    }

    /// Whether `text` is this option's own name or is prefixed by one of
    /// its aliases (e.g. `-xyz` when `-x` is a registered alias, for joined
    /// short-flag forms).
    pub fn matches_dispatch(&self, text: &str) -> bool {
        text == self.name || self.aliases.iter().any(|a| text.starts_with(a.as_str()))
    }
}

/// A second child kind: a sub-command. Carries its own slot list and an
/// ordered list of option children; depth is fixed at two (§3.3).
#[derive(Clone, Debug)]
pub struct SubcommandNode {
    pub name: String,
    pub args: SlotList,
    pub options: Vec<OptionNode>,
    pub separator: String,
    pub action: Option<Action>,
}

impl SubcommandNode {
    pub fn new(name: impl Into<String>, args: SlotList) -> Result<Self, ConstructError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConstructError::EmptyName);
        }
        Ok(Self {
            name,
            args,
            options: Vec::new(),
            separator: " ".to_string(),
            action: None,
        })
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn push_option(mut self, option: OptionNode) -> Self {
        self.options.push(option);
        self
    }

    pub fn find_option(&self, text: &str) -> Option<&OptionNode> {
        self.options.iter().find(|o| o.matches_dispatch(text))
    }
}

/// A command tree child: either an option leaf or a sub-command.
#[derive(Clone, Debug)]
pub enum Child {
    Option(OptionNode),
    Subcommand(SubcommandNode),
}

impl Child {
    pub fn name(&self) -> &str {
        match self {
            Child::Option(o) => &o.name,
            Child::Subcommand(s) => &s.name,
        }
    }

    pub fn matches_dispatch(&self, text: &str) -> bool {
        match self {
            Child::Option(o) => o.matches_dispatch(text),
            Child::Subcommand(s) => text == s.name,
        }
    }
}

/// The root of a command tree: header matcher, main slot list, and ordered
/// children (§3.3).
#[derive(Clone, Debug)]
pub struct CommandTree {
    pub namespace: String,
    pub name: String,
    pub header: Header,
    pub args: SlotList,
    pub children: Vec<Child>,
    pub separator: String,
    pub action: Option<Action>,
}

impl CommandTree {
    pub fn new(name: impl Into<String>, header: Header, args: SlotList) -> Self {
        Self {
            namespace: String::new(),
            name: name.into(),
            header,
            args,
            children: Vec::new(),
            separator: " ".to_string(),
            action: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn push_child(mut self, child: Child) -> Self {
        self.append_child(child);
        self
    }

    /// `append_child(node, child)`, the internal contract surface-syntax
    /// builders sit on top of (§9 design notes).
    pub fn append_child(&mut self, child: Child) {
        self.children.push(child);
    }

    pub fn identity(&self) -> (String, String) {
        (self.namespace.clone(), self.name.clone())
    }

    pub fn find_child(&self, text: &str) -> Option<&Child> {
        self.children.iter().find(|c| c.matches_dispatch(text))
    }
}

pub fn element_head(kind: impl Into<String>) -> HeadAtom {
    HeadAtom::ElementKind(kind.into())
}

pub fn element(kind: impl Into<String>) -> Element {
    Element::new(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::SlotList;

    #[test]
    fn header_matches_exact_text_and_prefixed_form() {
        let header = Header::text("music").with_prefixes(vec!["!".to_string(), "/".to_string()]);
        assert_eq!(
            header.matches(&Atom::Text("music".to_string())),
            Some(Value::Text("music".to_string()))
        );
        assert_eq!(
            header.matches(&Atom::Text("!music".to_string())),
            Some(Value::Text("!music".to_string()))
        );
        assert_eq!(header.matches(&Atom::Text("other".to_string())), None);
    }

    #[test]
    fn header_matches_element_kind() {
        let header = Header::new(vec![element_head("sticker")]).unwrap();
        let atom = Atom::Element(element("sticker"));
        assert!(matches!(header.matches(&atom), Some(Value::Element(_))));
        assert_eq!(header.matches(&Atom::Element(element("image"))), None);
    }

    #[test]
    fn empty_header_is_rejected() {
        assert_eq!(Header::new(Vec::new()).unwrap_err(), ConstructError::EmptyHeader);
    }

    #[test]
    fn option_alias_prefix_dispatches_joined_short_flags() {
        let opt = OptionNode::new("--execute", SlotList::new())
            .unwrap()
            .with_alias("-x");
        assert!(opt.matches_dispatch("--execute"));
        assert!(opt.matches_dispatch("-xyz"));
        assert!(!opt.matches_dispatch("-y"));
    }

    #[test]
    fn option_dest_strips_the_dispatch_prefix_but_name_keeps_it() {
        let opt = OptionNode::new("--foo", SlotList::new()).unwrap();
        assert_eq!(opt.name, "--foo");
        assert_eq!(opt.dest, "foo");

        let bare = OptionNode::new("foo", SlotList::new()).unwrap();
        assert_eq!(bare.dest, "foo");
    }

    #[test]
    fn option_name_of_only_dashes_is_rejected() {
        assert_eq!(
            OptionNode::new("--", SlotList::new()).unwrap_err(),
            ConstructError::EmptyName
        );
    }

    #[test]
    fn command_tree_finds_its_children_by_dispatch_name() {
        let help = OptionNode::new("--help", SlotList::new()).unwrap().with_alias("-h");
        let sub = SubcommandNode::new("set", SlotList::new()).unwrap();
        let tree = CommandTree::new("lp", Header::text("lp"), SlotList::new())
            .push_child(Child::Option(help))
            .push_child(Child::Subcommand(sub));
        assert!(matches!(tree.find_child("--help"), Some(Child::Option(_))));
        assert!(matches!(tree.find_child("-h"), Some(Child::Option(_))));
        assert!(matches!(tree.find_child("set"), Some(Child::Subcommand(_))));
        assert!(tree.find_child("nope").is_none());
    }

    #[test]
    fn apply_action_result_maps_positionally_onto_existing_keys() {
        let mut values = IndexMap::new();
        values.insert("a".to_string(), Value::Int(1));
        values.insert("b".to_string(), Value::Int(2));
        apply_action_result(&mut values, Some(vec![Value::Int(10), Value::Int(20)]));
        assert_eq!(values.get("a"), Some(&Value::Int(10)));
        assert_eq!(values.get("b"), Some(&Value::Int(20)));
    }

    #[test]
    fn apply_action_result_is_a_no_op_on_none() {
        let mut values = IndexMap::new();
        values.insert("a".to_string(), Value::Int(1));
        apply_action_result(&mut values, None);
        assert_eq!(values.get("a"), Some(&Value::Int(1)));
    }
}

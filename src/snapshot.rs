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

//! Lossless JSON snapshots of a [`CommandTree`] (§6): `load(dump(tree))`
//! reconstructs an equivalent tree. "Equivalent" stops short of identical —
//! a [`Pattern::Regex`] with a caller-supplied [`crate::pattern::Transform`]
//! closure, or any node carrying an [`Action`], cannot serialise its
//! closure, so round-tripping keeps the pattern's matching behaviour for
//! the five built-in type marks (`str`, `int`, `float`, `bool`, `literal`)
//! and drops actions entirely. This is a deliberate scope cut, not an
//! oversight: see the design notes this crate was built from.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::atom::Element;
use crate::error::ConstructError;
use crate::pattern::{Pattern, RegexPattern, TokenClass, Transform};
use crate::slot::{Slot, SlotList};
use crate::tree::{Child, CommandTree, Header, HeadAtom, OptionNode, SubcommandNode};
use crate::value::{SlotDefault, Value};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ValueSnapshot {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Element(Element),
    List(Vec<ValueSnapshot>),
    Map(IndexMap<String, ValueSnapshot>),
    Omitted,
}

impl From<&Value> for ValueSnapshot {
    fn from(value: &Value) -> Self {
        match value {
            Value::Text(s) => ValueSnapshot::Text(s.clone()),
            Value::Int(n) => ValueSnapshot::Int(*n),
            Value::Float(n) => ValueSnapshot::Float(*n),
            Value::Bool(b) => ValueSnapshot::Bool(*b),
            Value::Element(e) => ValueSnapshot::Element(e.clone()),
            Value::List(values) => ValueSnapshot::List(values.iter().map(ValueSnapshot::from).collect()),
            Value::Map(map) => {
                ValueSnapshot::Map(map.iter().map(|(k, v)| (k.clone(), ValueSnapshot::from(v))).collect())
            }
            Value::Omitted => ValueSnapshot::Omitted,
        }
    }
}

impl From<ValueSnapshot> for Value {
    fn from(snapshot: ValueSnapshot) -> Self {
        match snapshot {
            ValueSnapshot::Text(s) => Value::Text(s),
            ValueSnapshot::Int(n) => Value::Int(n),
            ValueSnapshot::Float(n) => Value::Float(n),
            ValueSnapshot::Bool(b) => Value::Bool(b),
            ValueSnapshot::Element(e) => Value::Element(e),
            ValueSnapshot::List(values) => Value::List(values.into_iter().map(Value::from).collect()),
            ValueSnapshot::Map(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
            ValueSnapshot::Omitted => Value::Omitted,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum DefaultSnapshot {
    None,
    Empty,
    Value(ValueSnapshot),
}

impl From<&SlotDefault> for DefaultSnapshot {
    fn from(default: &SlotDefault) -> Self {
        match default {
            SlotDefault::None => DefaultSnapshot::None,
            SlotDefault::Empty => DefaultSnapshot::Empty,
            SlotDefault::Value(v) => DefaultSnapshot::Value(v.into()),
        }
    }
}

impl From<DefaultSnapshot> for SlotDefault {
    fn from(snapshot: DefaultSnapshot) -> Self {
        match snapshot {
            DefaultSnapshot::None => SlotDefault::None,
            DefaultSnapshot::Empty => SlotDefault::Empty,
            DefaultSnapshot::Value(v) => SlotDefault::Value(v.into()),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub enum TokenClassSnapshot {
    Raw,
    RegexMatch,
    RegexTransform,
}

impl From<TokenClass> for TokenClassSnapshot {
    fn from(class: TokenClass) -> Self {
        match class {
            TokenClass::Raw => TokenClassSnapshot::Raw,
            TokenClass::RegexMatch => TokenClassSnapshot::RegexMatch,
            TokenClass::RegexTransform => TokenClassSnapshot::RegexTransform,
        }
    }
}

impl From<TokenClassSnapshot> for TokenClass {
    fn from(snapshot: TokenClassSnapshot) -> Self {
        match snapshot {
            TokenClassSnapshot::Raw => TokenClass::Raw,
            TokenClassSnapshot::RegexMatch => TokenClass::RegexMatch,
            TokenClassSnapshot::RegexTransform => TokenClass::RegexTransform,
        }
    }
}

/// Reattaches the built-in transform for one of the five type marks
/// [`RegexPattern`]'s own constructors use; any other mark round-trips with
/// no transform; a `RegexTransform`-class pattern with no recognised mark
/// degrades to recording matched text verbatim.
fn known_transform(type_mark: &str) -> Option<Transform> {
    match type_mark {
        "int" => Some(std::sync::Arc::new(|s: &str| s.parse::<i64>().ok().map(Value::Int))),
        "float" => Some(std::sync::Arc::new(|s: &str| s.parse::<f64>().ok().map(Value::Float))),
        "bool" => Some(std::sync::Arc::new(|s: &str| match s.to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        })),
        _ => None,
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum PatternSnapshot {
    Regex {
        source: String,
        token_class: TokenClassSnapshot,
        type_mark: String,
        alias: Option<String>,
    },
    AnyOne,
    All,
    ElementClass(String),
    Multi(Box<PatternSnapshot>),
    Anti(Box<PatternSnapshot>),
    Union {
        patterns: Vec<PatternSnapshot>,
        anti: bool,
    },
    Sequence(Box<PatternSnapshot>),
    Mapping(Box<PatternSnapshot>),
    Object(Vec<SlotSnapshot>),
}

impl From<&Pattern> for PatternSnapshot {
    fn from(pattern: &Pattern) -> Self {
        match pattern {
            Pattern::Regex(r) => PatternSnapshot::Regex {
                source: r.source.clone(),
                token_class: r.token_class.into(),
                type_mark: r.type_mark.clone(),
                alias: r.alias.clone(),
            },
            Pattern::AnyOne => PatternSnapshot::AnyOne,
            Pattern::All => PatternSnapshot::All,
            Pattern::ElementClass(kind) => PatternSnapshot::ElementClass(kind.clone()),
            Pattern::Multi(inner) => PatternSnapshot::Multi(Box::new(inner.as_ref().into())),
            Pattern::Anti(inner) => PatternSnapshot::Anti(Box::new(inner.as_ref().into())),
            Pattern::Union { patterns, anti } => PatternSnapshot::Union {
                patterns: patterns.iter().map(PatternSnapshot::from).collect(),
                anti: *anti,
            },
            Pattern::Sequence(inner) => PatternSnapshot::Sequence(Box::new(inner.as_ref().into())),
            Pattern::Mapping(inner) => PatternSnapshot::Mapping(Box::new(inner.as_ref().into())),
            Pattern::Object(slots) => {
                PatternSnapshot::Object(slots.iter().map(SlotSnapshot::from).collect())
            }
        }
    }
}

impl PatternSnapshot {
    pub fn into_pattern(self) -> Result<Pattern, ConstructError> {
        Ok(match self {
            PatternSnapshot::Regex {
                source,
                token_class,
                type_mark,
                alias,
            } => {
                let mut built = RegexPattern::new(source, token_class.into(), type_mark.clone())?;
                if let Some(transform) = known_transform(&type_mark) {
                    built = built.with_transform(transform);
                }
                if let Some(alias) = alias {
                    built = built.with_alias(alias);
                }
                Pattern::Regex(built)
            }
            PatternSnapshot::AnyOne => Pattern::AnyOne,
            PatternSnapshot::All => Pattern::All,
            PatternSnapshot::ElementClass(kind) => Pattern::ElementClass(kind),
            PatternSnapshot::Multi(inner) => Pattern::Multi(Box::new(inner.into_pattern()?)),
            PatternSnapshot::Anti(inner) => Pattern::Anti(Box::new(inner.into_pattern()?)),
            PatternSnapshot::Union { patterns, anti } => Pattern::Union {
                patterns: patterns
                    .into_iter()
                    .map(PatternSnapshot::into_pattern)
                    .collect::<Result<_, _>>()?,
                anti,
            },
            PatternSnapshot::Sequence(inner) => Pattern::Sequence(Box::new(inner.into_pattern()?)),
            PatternSnapshot::Mapping(inner) => Pattern::Mapping(Box::new(inner.into_pattern()?)),
            PatternSnapshot::Object(slots) => {
                let mut list = SlotList::new();
                for slot in slots {
                    list.push(slot.name, slot.pattern.into_pattern()?, slot.default.into())?;
                }
                Pattern::Object(list)
            }
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SlotSnapshot {
    pub name: String,
    pub pattern: PatternSnapshot,
    pub default: DefaultSnapshot,
}

impl From<&Slot> for SlotSnapshot {
    fn from(slot: &Slot) -> Self {
        Self {
            name: slot.name.clone(),
            pattern: (&slot.pattern).into(),
            default: (&slot.default).into(),
        }
    }
}

fn slot_list_to_snapshots(slots: &SlotList) -> Vec<SlotSnapshot> {
    slots.iter().map(SlotSnapshot::from).collect()
}

fn snapshots_to_slot_list(snapshots: Vec<SlotSnapshot>) -> Result<SlotList, ConstructError> {
    let mut list = SlotList::new();
    for snapshot in snapshots {
        list.push(snapshot.name, snapshot.pattern.into_pattern()?, snapshot.default.into())?;
    }
    Ok(list)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum HeadAtomSnapshot {
    Text(String),
    ElementKind(String),
}

impl From<&HeadAtom> for HeadAtomSnapshot {
    fn from(head: &HeadAtom) -> Self {
        match head {
            HeadAtom::Text(s) => HeadAtomSnapshot::Text(s.clone()),
            HeadAtom::ElementKind(k) => HeadAtomSnapshot::ElementKind(k.clone()),
        }
    }
}

impl From<HeadAtomSnapshot> for HeadAtom {
    fn from(snapshot: HeadAtomSnapshot) -> Self {
        match snapshot {
            HeadAtomSnapshot::Text(s) => HeadAtom::Text(s),
            HeadAtomSnapshot::ElementKind(k) => HeadAtom::ElementKind(k),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HeaderSnapshot {
    pub heads: Vec<HeadAtomSnapshot>,
    pub prefixes: Vec<String>,
}

impl From<&Header> for HeaderSnapshot {
    fn from(header: &Header) -> Self {
        Self {
            heads: header.heads.iter().map(HeadAtomSnapshot::from).collect(),
            prefixes: header.prefixes.clone(),
        }
    }
}

impl HeaderSnapshot {
    fn into_header(self) -> Result<Header, ConstructError> {
        let heads = self.heads.into_iter().map(HeadAtom::from).collect();
        Ok(Header::new(heads)?.with_prefixes(self.prefixes))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OptionSnapshot {
    pub name: String,
    pub aliases: Vec<String>,
    pub args: Vec<SlotSnapshot>,
    pub separator: String,
}

impl From<&OptionNode> for OptionSnapshot {
    fn from(opt: &OptionNode) -> Self {
        Self {
            name: opt.name.clone(),
            aliases: opt.aliases.clone(),
            args: slot_list_to_snapshots(&opt.args),
            separator: opt.separator.clone(),
        }
    }
}

impl OptionSnapshot {
    fn into_option(self) -> Result<OptionNode, ConstructError> {
        let mut node = OptionNode::new(self.name, snapshots_to_slot_list(self.args)?)?
            .with_separator(self.separator);
        for alias in self.aliases {
            node = node.with_alias(alias);
        }
        Ok(node)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubcommandSnapshot {
    pub name: String,
    pub args: Vec<SlotSnapshot>,
    pub options: Vec<OptionSnapshot>,
    pub separator: String,
}

impl From<&SubcommandNode> for SubcommandSnapshot {
    fn from(sub: &SubcommandNode) -> Self {
        Self {
            name: sub.name.clone(),
            args: slot_list_to_snapshots(&sub.args),
            options: sub.options.iter().map(OptionSnapshot::from).collect(),
            separator: sub.separator.clone(),
        }
    }
}

impl SubcommandSnapshot {
    fn into_subcommand(self) -> Result<SubcommandNode, ConstructError> {
        let mut node = SubcommandNode::new(self.name, snapshots_to_slot_list(self.args)?)?
            .with_separator(self.separator);
        for option in self.options {
            node = node.push_option(option.into_option()?);
        }
        Ok(node)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ChildSnapshot {
    Option(OptionSnapshot),
    Subcommand(SubcommandSnapshot),
}

impl From<&Child> for ChildSnapshot {
    fn from(child: &Child) -> Self {
        match child {
            Child::Option(o) => ChildSnapshot::Option(o.into()),
            Child::Subcommand(s) => ChildSnapshot::Subcommand(s.into()),
        }
    }
}

impl ChildSnapshot {
    fn into_child(self) -> Result<Child, ConstructError> {
        Ok(match self {
            ChildSnapshot::Option(o) => Child::Option(o.into_option()?),
            ChildSnapshot::Subcommand(s) => Child::Subcommand(s.into_subcommand()?),
        })
    }
}

/// The serialisable shape of a [`CommandTree`], actions stripped (see the
/// module docs).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommandTreeSnapshot {
    pub namespace: String,
    pub name: String,
    pub header: HeaderSnapshot,
    pub args: Vec<SlotSnapshot>,
    pub children: Vec<ChildSnapshot>,
    pub separator: String,
}

impl From<&CommandTree> for CommandTreeSnapshot {
    fn from(tree: &CommandTree) -> Self {
        Self {
            namespace: tree.namespace.clone(),
            name: tree.name.clone(),
            header: (&tree.header).into(),
            args: slot_list_to_snapshots(&tree.args),
            children: tree.children.iter().map(ChildSnapshot::from).collect(),
            separator: tree.separator.clone(),
        }
    }
}

impl CommandTreeSnapshot {
    pub fn into_tree(self) -> Result<CommandTree, ConstructError> {
        let mut tree = CommandTree::new(
            self.name,
            self.header.into_header()?,
            snapshots_to_slot_list(self.args)?,
        )
        .with_namespace(self.namespace)
        .with_separator(self.separator);
        for child in self.children {
            tree.append_child(child.into_child()?);
        }
        Ok(tree)
    }
}

/// Serialises `tree` to JSON.
pub fn dump(tree: &CommandTree) -> serde_json::Result<String> {
    serde_json::to_string(&CommandTreeSnapshot::from(tree))
}

/// Errors possible while reconstructing a tree from [`dump`]'s output.
#[derive(Debug)]
pub enum LoadError {
    Json(serde_json::Error),
    Construct(ConstructError),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Json(e) => write!(f, "invalid snapshot: {e}"),
            LoadError::Construct(e) => write!(f, "invalid snapshot: {e}"),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<serde_json::Error> for LoadError {
    fn from(e: serde_json::Error) -> Self {
        LoadError::Json(e)
    }
}

impl From<ConstructError> for LoadError {
    fn from(e: ConstructError) -> Self {
        LoadError::Construct(e)
    }
}

/// Parses `text` (as produced by [`dump`]) back into a [`CommandTree`].
pub fn load(text: &str) -> Result<CommandTree, LoadError> {
    let snapshot: CommandTreeSnapshot = serde_json::from_str(text)?;
    Ok(snapshot.into_tree()?)
}

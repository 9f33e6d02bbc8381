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

//! End-to-end scenarios run against a whole [`CommandTree`], exercising the
//! analyser the way a caller would rather than poking at its internals.

use alconna::pattern::{Pattern, RegexPattern};
use alconna::slot::SlotList;
use alconna::tree::{CommandTree, Child, Header, OptionNode};
use alconna::value::{SlotDefault, Value};
use alconna::{CommandManager, snapshot};

fn unique(hint: &str) -> String {
    format!("{hint}-{:p}", hint as *const str)
}

#[test]
fn help_option_short_circuits_before_any_argument_is_consumed() {
    let help = OptionNode::new("--help", SlotList::new()).unwrap().with_alias("-h");
    let tree = CommandTree::new("music", Header::text("music"), SlotList::new())
        .push_child(Child::Option(help));
    let analyser = alconna::Analyser::new(&tree);
    let record = analyser
        .analyse(vec![alconna::atom::Unit::from("music --help")])
        .unwrap();
    assert!(record.head_matched);
    assert!(!record.matched);
    assert!(record.help_text.is_some());
    assert!(record.diagnostic().is_none());
}

/// `test_multi --foo ab --bar 1` against `--foo (*tags:int=1, str1:str)` and
/// `--bar (num:int)`: the Multi slot's int pattern rejects the non-numeric
/// "ab" immediately, falling back to the sibling `str1` scalar slot, and the
/// Multi handler must still stop before swallowing `--bar`.
#[test]
fn multi_slot_stops_before_a_sibling_option_name() {
    let mut foo_args = SlotList::new();
    foo_args
        .push("*tags", Pattern::Regex(RegexPattern::int_pattern()), SlotDefault::Value(Value::Int(1)))
        .unwrap();
    foo_args
        .push("str1", Pattern::Regex(RegexPattern::str_pattern()), SlotDefault::Empty)
        .unwrap();
    let foo = OptionNode::new("--foo", foo_args).unwrap();

    let mut bar_args = SlotList::new();
    bar_args
        .push("num", Pattern::Regex(RegexPattern::int_pattern()), SlotDefault::Empty)
        .unwrap();
    let bar = OptionNode::new("--bar", bar_args).unwrap();

    let tree = CommandTree::new("test_multi", Header::text("test_multi"), SlotList::new())
        .push_child(Child::Option(foo))
        .push_child(Child::Option(bar));
    let analyser = alconna::Analyser::new(&tree);
    let record = analyser
        .analyse(vec![alconna::atom::Unit::from("test_multi --foo ab --bar 1")])
        .unwrap();
    assert!(record.matched, "expected a match, got {:?}", record.error_info);

    let foo_map = match record.options.get("foo") {
        Some(Value::Map(m)) => m,
        other => panic!("expected Some(Map), got {other:?}"),
    };
    assert_eq!(foo_map.get("tags"), Some(&Value::List(vec![Value::Int(1)])));
    assert_eq!(foo_map.get("str1"), Some(&Value::Text("ab".to_string())));

    let bar_map = match record.options.get("bar") {
        Some(Value::Map(m)) => m,
        other => panic!("expected Some(Map), got {other:?}"),
    };
    assert_eq!(bar_map.get("num"), Some(&Value::Int(1)));
}

/// A Multi slot with a permissive (string) inner pattern still has to stop
/// at a known sibling option name even though the pattern itself would
/// happily accept the name's text.
#[test]
fn permissive_multi_slot_still_yields_to_a_known_sibling_name() {
    let mut foo_args = SlotList::new();
    foo_args
        .push("*words", Pattern::Regex(RegexPattern::str_pattern()), SlotDefault::None)
        .unwrap();
    let foo = OptionNode::new("--foo", foo_args).unwrap();

    let mut bar_args = SlotList::new();
    bar_args
        .push("num", Pattern::Regex(RegexPattern::int_pattern()), SlotDefault::Empty)
        .unwrap();
    let bar = OptionNode::new("--bar", bar_args).unwrap();

    let tree = CommandTree::new("test_multi_words", Header::text("test_multi_words"), SlotList::new())
        .push_child(Child::Option(foo))
        .push_child(Child::Option(bar));
    let analyser = alconna::Analyser::new(&tree);
    let record = analyser
        .analyse(vec![alconna::atom::Unit::from(
            "test_multi_words --foo one two --bar 9",
        )])
        .unwrap();
    assert!(record.matched, "expected a match, got {:?}", record.error_info);

    let foo_map = match record.options.get("foo") {
        Some(Value::Map(m)) => m,
        other => panic!("expected Some(Map), got {other:?}"),
    };
    assert_eq!(
        foo_map.get("words"),
        Some(&Value::List(vec![
            Value::Text("one".to_string()),
            Value::Text("two".to_string())
        ]))
    );

    let bar_map = match record.options.get("bar") {
        Some(Value::Map(m)) => m,
        other => panic!("expected Some(Map), got {other:?}"),
    };
    assert_eq!(bar_map.get("num"), Some(&Value::Int(9)));
}

/// An `Anti` slot accepts any atom its inner pattern rejects, so a
/// non-numeric argument passes while a numeric one is turned away.
#[test]
fn anti_slot_accepts_what_its_inner_pattern_rejects() {
    let mut args = SlotList::new();
    args.push(
        "!target",
        Pattern::Regex(RegexPattern::int_pattern()),
        SlotDefault::Empty,
    )
    .unwrap();
    let tree = CommandTree::new("test_anti", Header::text("test_anti"), args);
    let analyser = alconna::Analyser::new(&tree);

    let ok = analyser
        .analyse(vec![alconna::atom::Unit::from("test_anti somewhere")])
        .unwrap();
    assert!(ok.matched);
    assert_eq!(ok.main_args.get("target"), Some(&Value::Text("somewhere".to_string())));

    let rejected = analyser
        .analyse(vec![alconna::atom::Unit::from("test_anti 42")])
        .unwrap();
    assert!(!rejected.matched);
    assert!(rejected.diagnostic().is_some());
}

/// A `Union` slot matches whichever alternative accepts the atom, in order.
#[test]
fn union_slot_matches_the_first_accepting_alternative() {
    let mut args = SlotList::new();
    args.push_union(
        "value",
        vec![
            Pattern::Regex(RegexPattern::int_pattern()),
            Pattern::Regex(RegexPattern::float_pattern()),
        ],
        SlotDefault::Empty,
    )
    .unwrap();
    let tree = CommandTree::new("test_union", Header::text("test_union"), args);
    let analyser = alconna::Analyser::new(&tree);

    let as_int = analyser.analyse(vec![alconna::atom::Unit::from("test_union 3")]).unwrap();
    assert_eq!(as_int.main_args.get("value"), Some(&Value::Int(3)));

    let as_float = analyser
        .analyse(vec![alconna::atom::Unit::from("test_union 3.5")])
        .unwrap();
    assert_eq!(as_float.main_args.get("value"), Some(&Value::Float(3.5)));
}

/// A shortcut registered against a command expands once on header mismatch
/// and is idempotent: re-registering and re-running it produces the same
/// matched record.
#[test]
fn shortcut_expansion_is_idempotent_across_repeated_runs() {
    let name = unique("greet");
    let mut args = SlotList::new();
    args.push("who", Pattern::Regex(RegexPattern::str_pattern()), SlotDefault::Empty)
        .unwrap();
    let tree = CommandTree::new(name.clone(), Header::text(name.clone()), args);
    CommandManager::register(tree);

    let shortcut_name = unique("gr");
    CommandManager::add_shortcut(
        shortcut_name.clone(),
        vec![alconna::atom::Unit::from(name.as_str())],
        true,
    );

    for _ in 0..3 {
        let record = CommandManager::analyse(
            "",
            &name,
            vec![
                alconna::atom::Unit::from(shortcut_name.as_str()),
                alconna::atom::Unit::from("world"),
            ],
        )
        .unwrap()
        .unwrap();
        assert!(record.matched, "expected a match, got {:?}", record.error_info);
        assert_eq!(record.main_args.get("who"), Some(&Value::Text("world".to_string())));
    }

    CommandManager::unregister("", &name);
    CommandManager::remove_shortcut(&shortcut_name);
}

/// A required main slot left unfilled reports `ArgumentMissing`, while an
/// unexpected trailing atom with no slot left to fill reports
/// `ParamsUnmatched` — the two arity failure modes stay distinguishable.
#[test]
fn argument_missing_and_params_unmatched_stay_distinct() {
    let mut args = SlotList::new();
    args.push("name", Pattern::Regex(RegexPattern::str_pattern()), SlotDefault::Empty)
        .unwrap();
    let tree = CommandTree::new("greet", Header::text("greet"), args);
    let analyser = alconna::Analyser::new(&tree);

    let missing = analyser.analyse(vec![alconna::atom::Unit::from("greet")]).unwrap();
    assert!(matches!(
        missing.error_info,
        Some(alconna::AnalysisError::ArgumentMissing(_))
    ));

    let extra = analyser
        .analyse(vec![alconna::atom::Unit::from("greet alice bob")])
        .unwrap();
    assert!(matches!(
        extra.error_info,
        Some(alconna::AnalysisError::ParamsUnmatched(_))
    ));
}

/// A main slot list mixing literal tokens (the kind a format-string front end
/// desugars fixed words into) with typed slots, alongside a sub-command
/// never mentioned in the input but fully defaultable: `lp user AAA perm set
/// admin` against a tree shaped like `lp user {target} perm set {perm}` with
/// a `default` sub-command carrying one defaulted boolean field. Since no
/// atom dispatches to `default`, it still appears in the record, fully
/// materialised from its own slot defaults (§4.2's "after termination"
/// clause).
#[test]
fn undispatched_subcommand_materialises_from_its_own_defaults() {
    let mut args = SlotList::new();
    args.push(
        "user_literal",
        Pattern::Regex(RegexPattern::literal("user")),
        SlotDefault::Empty,
    )
    .unwrap();
    args.push("target", Pattern::Regex(RegexPattern::str_pattern()), SlotDefault::Empty)
        .unwrap();
    args.push(
        "perm_literal",
        Pattern::Regex(RegexPattern::literal("perm")),
        SlotDefault::Empty,
    )
    .unwrap();
    args.push(
        "set_literal",
        Pattern::Regex(RegexPattern::literal("set")),
        SlotDefault::Empty,
    )
    .unwrap();
    args.push("perm", Pattern::Regex(RegexPattern::str_pattern()), SlotDefault::Empty)
        .unwrap();

    let mut default_args = SlotList::new();
    default_args
        .push("de", Pattern::Regex(RegexPattern::bool_pattern()), SlotDefault::Value(Value::Bool(true)))
        .unwrap();
    let default_sub = alconna::tree::SubcommandNode::new("default", default_args).unwrap();

    let tree = CommandTree::new("lp", Header::text("lp"), args)
        .push_child(Child::Subcommand(default_sub));
    let analyser = alconna::Analyser::new(&tree);
    let record = analyser
        .analyse(vec![alconna::atom::Unit::from("lp user AAA perm set admin")])
        .unwrap();
    assert!(record.matched, "expected a match, got {:?}", record.error_info);
    assert_eq!(record.main_args.get("target"), Some(&Value::Text("AAA".to_string())));
    assert_eq!(record.main_args.get("perm"), Some(&Value::Text("admin".to_string())));
    let default_record = record.sub_commands.get("default").expect("default sub-command materialised");
    assert_eq!(default_record.args.get("de"), Some(&Value::Bool(true)));
}

/// A main slot itself declared as a [`Pattern::Object`] recurses into a
/// nested slot list on the same tokeniser, recording the result as a
/// [`Value::Map`] — the aggregate variant §3.1 calls out separately from
/// `Sequence`/`Mapping`'s text-literal parsing.
#[test]
fn object_main_slot_matches_a_nested_slot_list_from_the_stream() {
    let mut nested = SlotList::new();
    nested
        .push("host", Pattern::Regex(RegexPattern::str_pattern()), SlotDefault::Empty)
        .unwrap();
    nested
        .push("port", Pattern::Regex(RegexPattern::int_pattern()), SlotDefault::Value(Value::Int(80)))
        .unwrap();

    let mut args = SlotList::new();
    args.push("endpoint", Pattern::Object(nested), SlotDefault::Empty).unwrap();

    let tree = CommandTree::new("connect", Header::text("connect"), args);
    let analyser = alconna::Analyser::new(&tree);
    let record = analyser
        .analyse(vec![alconna::atom::Unit::from("connect example.com 8080")])
        .unwrap();
    assert!(record.matched, "expected a match, got {:?}", record.error_info);
    match record.main_args.get("endpoint") {
        Some(Value::Map(m)) => {
            assert_eq!(m.get("host"), Some(&Value::Text("example.com".to_string())));
            assert_eq!(m.get("port"), Some(&Value::Int(8080)));
        }
        other => panic!("expected Some(Map), got {other:?}"),
    }
}

/// Dumping a tree to JSON and loading it back produces a tree that analyses
/// the same input the same way, even though the reconstructed tree is not
/// byte-identical to the original (patterns keep their built-in transform,
/// not their closure identity).
#[test]
fn snapshot_round_trip_preserves_analysis_behaviour() {
    let mut args = SlotList::new();
    args.push("count", Pattern::Regex(RegexPattern::int_pattern()), SlotDefault::Empty)
        .unwrap();
    let help = OptionNode::new("--help", SlotList::new()).unwrap().with_alias("-h");
    let tree = CommandTree::new("roll", Header::text("roll"), args).push_child(Child::Option(help));

    let json = snapshot::dump(&tree).unwrap();
    let restored = snapshot::load(&json).unwrap();

    let original_analyser = alconna::Analyser::new(&tree);
    let restored_analyser = alconna::Analyser::new(&restored);

    let original_record = original_analyser
        .analyse(vec![alconna::atom::Unit::from("roll 7")])
        .unwrap();
    let restored_record = restored_analyser
        .analyse(vec![alconna::atom::Unit::from("roll 7")])
        .unwrap();

    assert_eq!(original_record.main_args, restored_record.main_args);
    assert_eq!(original_record.matched, restored_record.matched);
}

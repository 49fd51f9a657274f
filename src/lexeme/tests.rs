// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

#![cfg(test)]

use crate::node;
use crate::build::BuildErrorKind;
use crate::expr::{alt_tree, literal_tree, production_tree, seq_tree};
use crate::lexeme::*;
use crate::lexeme::lexicon::{CompiledLexicon, Lexicon, PatternKind};
use crate::options::Options;

fn compile(lexicon: &Lexicon) -> CompiledLexicon {
    lexicon.compile(&Options::default()).unwrap().0
}

fn scan_str(engine: &mut LexemeEngine, text: &str) {
    for c in text.chars() {
        engine.scan(c);
    }
}

/// `a`, `abc`, `[a-z]+`, skipped `[ ]+`
fn sample_lexicon() -> Lexicon {
    let mut lexicon = Lexicon::new();
    lexicon.add_literal(0, "a");
    lexicon.add_literal(1, "abc");
    let (mut ident, root) = production_tree(2);
    let plus = ident.add(Some(root), node!(+));
    ident.add(Some(plus), node!(['a'-'z']));
    lexicon.add_token(2, "ident", ident);
    let (mut space, root) = production_tree(3);
    let plus = space.add(Some(root), node!(+));
    space.add(Some(plus), node!([' ']));
    lexicon.add_skip(3, "space", space);
    lexicon
}

#[test]
fn lexicon_compile() {
    let lexicon = sample_lexicon();
    let compiled = compile(&lexicon);
    assert_eq!(compiled.tokens().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    assert_eq!(compiled.skip_tokens().collect::<Vec<_>>(), vec![3]);
    assert_eq!(compiled.kind(1), Some(PatternKind::Token));
    assert!(compiled.is_skip(3));
    assert_eq!(compiled.name(2), Some("ident"));
    assert_eq!(compiled.name(1), Some("abc"));
    assert_eq!(compiled.start_state(9), None);
    let starts = (0..4).map(|t| compiled.start_state(t).unwrap()).collect::<Vec<_>>();
    assert_eq!(starts, compiled.dfa().initial_states());
    assert_eq!(compiled.nfa().starts().len(), 4);
}

#[test]
fn lexicon_errors() {
    let mut lexicon = Lexicon::new();
    lexicon.add_token(0, "num", seq_tree(0, vec![node!(nt 5)]));
    let err = lexicon.compile(&Options::default()).unwrap_err();
    assert_eq!(err.kind(), BuildErrorKind::UndefinedReference);

    let mut lexicon = Lexicon::new();
    lexicon.add_token(0, "x", literal_tree(1, "x"));
    let err = lexicon.check().unwrap_err();
    assert_eq!(err.kind(), BuildErrorKind::MalformedExpression);
}

#[test]
fn lexeme_longest_match() {
    let mut lexicon = Lexicon::new();
    lexicon.add_literal(0, "a");
    lexicon.add_literal(1, "abc");
    let compiled = compile(&lexicon);
    let mut engine = LexemeEngine::new(&compiled);
    engine.begin(0);
    assert!(engine.begin_capture_if_not_exists(0));
    assert!(engine.begin_capture_if_not_exists(1));
    assert_eq!(engine.num_active(), 2);

    engine.scan('a');
    // both are still alive after 'a'
    assert_eq!(engine.active_tokens().into_iter().collect::<Vec<_>>(), vec![0, 1]);
    assert!(engine.finalize(false).is_empty());

    engine.scan('b');
    assert_eq!(engine.active_tokens().into_iter().collect::<Vec<_>>(), vec![1]);
    assert_eq!(engine.finalize(false), vec![TokenMatch { token: 0, local: 0, start: 0, end: 1 }]);

    engine.scan('c');
    assert_eq!(engine.capture(0, 0).map(|c| c.end), Some(1));
    assert_eq!(engine.capture(1, 0).map(|c| c.end), Some(3));
    assert_eq!(engine.finalize(true), vec![
        TokenMatch { token: 1, local: 0, start: 0, end: 3 },
        TokenMatch { token: 0, local: 0, start: 0, end: 1 },
    ]);
    assert_eq!(engine.scan('d'), 0);
    assert!(!engine.has_active());
    assert_eq!(engine.finalize(false).len(), 2);
}

#[test]
fn lexeme_capture_extends() {
    let compiled = compile(&sample_lexicon());
    let mut engine = LexemeEngine::new(&compiled);
    engine.begin(4);
    assert!(engine.begin_capture_if_not_exists(2));
    scan_str(&mut engine, "abcd e");
    assert_eq!(engine.position(), 10);
    assert_eq!(engine.session_start(), 4);
    assert_eq!(engine.captures().copied().collect::<Vec<_>>(), vec![Capture { token: 2, local: 0, start: 4, end: 8 }]);
    assert_eq!(engine.finalize(false), vec![TokenMatch { token: 2, local: 0, start: 4, end: 8 }]);
}

#[test]
fn lexeme_no_restart() {
    let compiled = compile(&sample_lexicon());
    let mut engine = LexemeEngine::new(&compiled);
    engine.begin(0);
    assert!(engine.begin_capture_if_not_exists(3));
    assert!(!engine.begin_capture_if_not_exists(3));
    assert!(!engine.begin_capture_if_not_exists(99));
    engine.scan(' ');
    // too late for this session
    assert!(!engine.begin_capture_if_not_exists(2));
    assert_eq!(engine.num_active(), 1);

    engine.begin(1);
    assert!(engine.captures().next().is_none());
    assert!(!engine.has_active());
    assert!(engine.begin_capture_if_not_exists(3));
    assert!(engine.begin_capture_if_not_exists(2));
    // the lexemes of the first session were reused
    assert!(engine.get_pool_stats().reused >= 1);
}

#[test]
fn lexeme_several_productions() {
    // prod 0(|('x', &('x', 'y')))
    let mut lexicon = Lexicon::new();
    lexicon.add_token(0, "xy", alt_tree(0, vec![vec![node!(chr 'x')], vec![node!(chr 'x'), node!(chr 'y')]]));
    let compiled = compile(&lexicon);
    let mut engine = LexemeEngine::new(&compiled);
    engine.begin(0);
    engine.begin_capture_if_not_exists(0);
    scan_str(&mut engine, "xyz");
    assert_eq!(engine.finalize(false), vec![
        TokenMatch { token: 0, local: 1, start: 0, end: 2 },
        TokenMatch { token: 0, local: 0, start: 0, end: 1 },
    ]);
}

#[test]
fn lexeme_fragments() {
    // digit := [0-9], num := digit digit*
    let mut lexicon = Lexicon::new();
    lexicon.add_fragment(10, seq_tree(10, vec![node!(['0'-'9'])]));
    let (mut num, root) = production_tree(0);
    let cc = num.add(Some(root), node!(&));
    num.add(Some(cc), node!(nt 10));
    let star = num.add(Some(cc), node!(*));
    num.add(Some(star), node!(nt 10));
    lexicon.add_token(0, "num", num);
    let compiled = compile(&lexicon);
    let mut engine = LexemeEngine::new(&compiled);
    engine.begin(0);
    engine.begin_capture_if_not_exists(0);
    scan_str(&mut engine, "123a");
    assert_eq!(engine.finalize(false), vec![TokenMatch { token: 0, local: 0, start: 0, end: 3 }]);
    assert_eq!(engine.finalize(false)[0].len(), 3);
}

#[test]
fn lexeme_zero_length_ignored() {
    // prod 0(*('a'))
    let (mut tree, root) = production_tree(0);
    let star = tree.add(Some(root), node!(*));
    tree.add(Some(star), node!(chr 'a'));
    let mut lexicon = Lexicon::new();
    lexicon.add_token(0, "as", tree);
    let compiled = compile(&lexicon);
    let mut engine = LexemeEngine::new(&compiled);
    engine.begin(0);
    engine.begin_capture_if_not_exists(0);
    engine.scan('b');
    assert!(engine.finalize(true).is_empty());
}

// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.
//
// Integration tests: tests that all the functionalities are accessible and work as expected.

#![cfg(test)]

use gramscan::{node, TokenId};
use gramscan::expr::{alt_tree, seq_tree};
use gramscan::grammar::{Grammar, GrammarCompiler};
use gramscan::lexeme::lexicon::Lexicon;

fn letters_lexicon(letters: &str) -> Lexicon {
    let mut lexicon = Lexicon::new();
    for (id, c) in letters.chars().enumerate() {
        lexicon.add_literal(id as TokenId, &c.to_string());
    }
    lexicon
}

mod grammar {
    use gramscan::build::BuildErrorKind;
    use gramscan::parser::ParseResult;
    use super::*;

    #[test]
    fn abcde() {
        // A := a B e, B := b c d
        let mut grammar = Grammar::new(letters_lexicon("abcde"));
        grammar.add_rule(0, "A", seq_tree(0, vec![node!(t 0), node!(nt 1), node!(t 4)]));
        grammar.add_rule(1, "B", seq_tree(1, vec![node!(t 1), node!(t 2), node!(t 3)]));
        grammar.add_start_rule(0);
        let mut compiler = GrammarCompiler::new(grammar);
        compiler.ensure_build().unwrap();
        let mut parser = compiler.parser().unwrap();
        assert!(parser.parse_str("abcde").is_accepted());
        assert_eq!(parser.parse_str("abcd"), ParseResult::Rejected { pos: 4 });
        assert_eq!(parser.parse_str("abcdex"), ParseResult::Rejected { pos: 5 });
    }

    #[test]
    fn left_recursion() {
        // A := a B c | k, B := b A d
        let mut grammar = Grammar::new(letters_lexicon("abcdk"));
        grammar.add_rule(0, "A", alt_tree(0, vec![vec![node!(t 0), node!(nt 1), node!(t 2)], vec![node!(t 4)]]));
        grammar.add_rule(1, "B", seq_tree(1, vec![node!(t 1), node!(nt 0), node!(t 3)]));
        grammar.add_start_rule(0);
        let mut compiler = GrammarCompiler::new(grammar);
        compiler.build().unwrap();
        let mut parser = compiler.parser().unwrap();
        assert!(parser.parse_str("abkdc").is_accepted());
        assert!(!parser.parse_str("abkd").is_accepted());

        // A := a B c, B := b A d
        let mut grammar = Grammar::new(letters_lexicon("abcd"));
        grammar.add_rule(0, "A", seq_tree(0, vec![node!(t 0), node!(nt 1), node!(t 2)]));
        grammar.add_rule(1, "B", seq_tree(1, vec![node!(t 1), node!(nt 0), node!(t 3)]));
        grammar.add_start_rule(0);
        let mut compiler = GrammarCompiler::new(grammar);
        assert_eq!(compiler.build().map_err(|e| e.kind()), Err(BuildErrorKind::UnresolvableRecursion));
        assert!(compiler.parser().is_none());
    }

    #[test]
    fn deterministic() {
        let build = || {
            let mut grammar = Grammar::new(letters_lexicon("abcdk"));
            grammar.add_rule(0, "A", alt_tree(0, vec![vec![node!(t 0), node!(nt 1), node!(t 2)], vec![node!(t 4)]]));
            grammar.add_rule(1, "B", seq_tree(1, vec![node!(t 1), node!(nt 0), node!(t 3)]));
            grammar.add_start_rule(0);
            let mut compiler = GrammarCompiler::new(grammar);
            compiler.build().unwrap();
            compiler.give_compiled().unwrap()
        };
        let (c1, c2) = (build(), build());
        assert_eq!(c1.get_dfa().num_states(), c2.get_dfa().num_states());
        assert_eq!(c1.get_dfa().num_transitions(), c2.get_dfa().num_transitions());
        assert_eq!(c1.get_dfa(), c2.get_dfa());
        assert_eq!(c1.get_lexicon().dfa(), c2.get_lexicon().dfa());
    }
}

mod lexemes {
    use gramscan::lexeme::{LexemeEngine, TokenMatch};
    use gramscan::options::Options;
    use super::*;

    #[test]
    fn longest_match() {
        let mut lexicon = Lexicon::new();
        lexicon.add_literal(0, "a");
        lexicon.add_literal(1, "abc");
        let (compiled, _) = lexicon.compile(&Options::default()).unwrap();
        let mut engine = LexemeEngine::new(&compiled);
        engine.begin(0);
        engine.begin_capture_if_not_exists(0);
        engine.begin_capture_if_not_exists(1);
        for c in "abc".chars() {
            engine.scan(c);
        }
        assert_eq!(engine.capture(0, 0).map(|c| c.end), Some(1));
        assert_eq!(engine.capture(1, 0).map(|c| c.end), Some(3));
        assert_eq!(engine.finalize(true), vec![
            TokenMatch { token: 1, local: 0, start: 0, end: 3 },
            TokenMatch { token: 0, local: 0, start: 0, end: 1 },
        ]);
    }
}

mod partition {
    use std::collections::BTreeSet;
    use gramscan::seg;
    use gramscan::partition::IntervalPartition;
    use gramscan::segments::Seg;

    #[test]
    fn order_independence() {
        let inputs: [(Seg, u32); 4] = [(seg!('a'-'e'), 1), (seg!('i'-'k'), 2), (seg!('d'-'f'), 3), (seg!('b'-'c'), 4)];
        let mut reference: Option<Vec<(Seg, BTreeSet<u32>)>> = None;
        for order in [[0, 1, 2, 3], [3, 2, 1, 0], [2, 0, 3, 1], [1, 3, 0, 2]] {
            let mut partition = IntervalPartition::new();
            for i in order {
                partition.insert(inputs[i].0, inputs[i].1);
            }
            let cells = partition.iter().map(|(s, v)| (*s, v.clone())).collect::<Vec<_>>();
            match &reference {
                Some(r) => assert_eq!(&cells, r, "order {order:?}"),
                None => reference = Some(cells),
            }
        }
        let partition = {
            let mut p = IntervalPartition::new();
            for (seg, v) in inputs {
                p.insert(seg, v);
            }
            p
        };
        let expected = [
            ('a', vec![1]), ('b', vec![1, 4]), ('d', vec![1, 3]), ('f', vec![3]), ('i', vec![2]),
        ];
        for (c, values) in expected {
            assert_eq!(partition.get(c as u32).map(|s| s.iter().copied().collect::<Vec<_>>()), Some(values), "'{c}'");
        }
        assert_eq!(partition.get('g' as u32), None);
    }
}

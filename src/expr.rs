// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

//! Expression model: the trees describing the grammar rules and the lexical patterns.
//!
//! A tree is stored in a [VecTree]. Its root is a [ExprNode::Production] with exactly one
//! child. If that child is a [ExprNode::Or], each of its children is a separate production
//! of the definition, with its own local index; otherwise the definition has one production
//! with the local index 0.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use vectree::VecTree;
use crate::{escape_char, segments, DefId, TokenId, VarId};
use crate::segments::{Seg, Segments};

/// Predefined character class
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CharClass {
    /// any valid codepoint
    Any,
    Digit,
    HexDigit,
    Alpha,
    AlphaNum,
    /// alphanumeric and underscore
    Word,
    /// space, tab, line feed, vertical tab, form feed, carriage return
    Space,
    Set(Box<Segments>),
}

impl CharClass {
    pub fn to_segments(&self) -> Segments {
        match self {
            CharClass::Any => Segments::dot(),
            CharClass::Digit => segments!['0'-'9'],
            CharClass::HexDigit => segments!['0'-'9', 'A'-'F', 'a'-'f'],
            CharClass::Alpha => segments!['A'-'Z', 'a'-'z'],
            CharClass::AlphaNum => segments!['0'-'9', 'A'-'Z', 'a'-'z'],
            CharClass::Word => segments!['0'-'9', 'A'-'Z', '_', 'a'-'z'],
            CharClass::Space => segments!['\t'-'\r', ' '],
            CharClass::Set(segments) => segments.normalized(),
        }
    }
}

impl Display for CharClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CharClass::Any => write!(f, "."),
            CharClass::Digit => write!(f, "\\d"),
            CharClass::HexDigit => write!(f, "\\x"),
            CharClass::Alpha => write!(f, "\\a"),
            CharClass::AlphaNum => write!(f, "\\an"),
            CharClass::Word => write!(f, "\\w"),
            CharClass::Space => write!(f, "\\s"),
            CharClass::Set(segments) => write!(f, "[{segments}]"),
        }
    }
}

// ---------------------------------------------------------------------------------------------

/// Node of an expression tree.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ExprNode {
    /// empty sequence
    #[default] Empty,
    Char(char),
    Range(Seg),
    Class(CharClass),
    /// terminal of the grammar
    Token(TokenId),
    Concat,
    Or,
    Star,
    Plus,
    Maybe,
    /// reference to a rule
    RuleRef(VarId),
    /// root of a definition
    Production(DefId),
}

impl ExprNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self, ExprNode::Empty | ExprNode::Char(_) | ExprNode::Range(_) | ExprNode::Class(_) | ExprNode::Token(_) | ExprNode::RuleRef(_))
    }

    /// Returns the character set of a character terminal.
    pub fn to_segments(&self) -> Option<Segments> {
        match self {
            ExprNode::Char(c) => Some(Segments::from_char(*c)),
            ExprNode::Range(seg) => Some(Segments::new(*seg)),
            ExprNode::Class(class) => Some(class.to_segments()),
            _ => None
        }
    }

    /// Checks the number of children, returning the expected quantity as text if it's wrong.
    fn check_arity(&self, n: usize) -> Result<(), &'static str> {
        match self {
            _ if self.is_leaf() => if n == 0 { Ok(()) } else { Err("no child") },
            ExprNode::Concat | ExprNode::Or => if n > 0 { Ok(()) } else { Err("at least one child") },
            _ => if n == 1 { Ok(()) } else { Err("exactly one child") },
        }
    }
}

impl Display for ExprNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ExprNode::Empty => write!(f, "ε"),
            ExprNode::Char(c) => write!(f, "'{}'", escape_char(*c)),
            ExprNode::Range(seg) => write!(f, "[{seg}]"),
            ExprNode::Class(class) => write!(f, "{class}"),
            ExprNode::Token(t) => write!(f, ":{t}"),
            ExprNode::Concat => write!(f, "&"),
            ExprNode::Or => write!(f, "|"),
            ExprNode::Star => write!(f, "*"),
            ExprNode::Plus => write!(f, "+"),
            ExprNode::Maybe => write!(f, "?"),
            ExprNode::RuleRef(v) => write!(f, "@{v}"),
            ExprNode::Production(d) => write!(f, "prod {d}"),
        }
    }
}

pub type ExprTree = VecTree<ExprNode>;

/// Provides the expression trees of the rules referenced by [ExprNode::RuleRef].
pub trait RuleSource {
    fn get_rule(&self, var: VarId) -> Option<&ExprTree>;
}

impl RuleSource for BTreeMap<VarId, ExprTree> {
    fn get_rule(&self, var: VarId) -> Option<&ExprTree> {
        self.get(&var)
    }
}

// ---------------------------------------------------------------------------------------------
// Tree construction

/// Creates a tree with a [ExprNode::Production] root. Returns the tree and the index of its root.
pub fn production_tree(def: DefId) -> (ExprTree, usize) {
    let mut tree = VecTree::new();
    let root = tree.add_root(ExprNode::Production(def));
    (tree, root)
}

/// Adds a sequence of leaves under `parent`: a single leaf is added directly, several leaves
/// are concatenated, and an empty sequence gives [ExprNode::Empty].
pub fn add_sequence(tree: &mut ExprTree, parent: usize, mut nodes: Vec<ExprNode>) -> usize {
    match nodes.len() {
        0 => tree.add(Some(parent), ExprNode::Empty),
        1 => tree.add(Some(parent), nodes.remove(0)),
        _ => {
            let cc = tree.add(Some(parent), ExprNode::Concat);
            for node in nodes {
                tree.add(Some(cc), node);
            }
            cc
        }
    }
}

/// Tree of a definition made of one sequence of leaves.
pub fn seq_tree(def: DefId, nodes: Vec<ExprNode>) -> ExprTree {
    let (mut tree, root) = production_tree(def);
    add_sequence(&mut tree, root, nodes);
    tree
}

/// Tree of a definition with one production per sequence of leaves.
pub fn alt_tree(def: DefId, alts: Vec<Vec<ExprNode>>) -> ExprTree {
    if alts.len() == 1 {
        if let Some(nodes) = alts.into_iter().next() {
            return seq_tree(def, nodes);
        }
        return seq_tree(def, vec![]);
    }
    let (mut tree, root) = production_tree(def);
    let or = tree.add(Some(root), ExprNode::Or);
    for nodes in alts {
        add_sequence(&mut tree, or, nodes);
    }
    tree
}

/// Tree of a definition matching the literal `text`.
pub fn literal_tree(def: DefId, text: &str) -> ExprTree {
    seq_tree(def, text.chars().map(ExprNode::Char).collect())
}

// ---------------------------------------------------------------------------------------------
// Tree inspection

/// Checks the shape of a tree. Returns the definition ID of its root if it's valid.
pub fn check_tree(tree: &ExprTree) -> Result<DefId, String> {
    let root = tree.get_root().ok_or_else(|| "the tree has no root".to_string())?;
    let ExprNode::Production(def) = tree.get(root) else {
        return Err(format!("the root of the tree must be a production, not '{}'", tree.get(root)));
    };
    if tree.children(root).len() != 1 {
        return Err(format!("the production root of definition {def} must have exactly one child"));
    }
    let mut stack = tree.children(root).to_vec();
    while let Some(index) = stack.pop() {
        let node = tree.get(index);
        if let ExprNode::Production(_) = node {
            return Err(format!("production node found below the root of definition {def}"));
        }
        let children = tree.children(index);
        node.check_arity(children.len())
            .map_err(|expected| format!("node '{node}' of definition {def} must have {expected}, found {}", children.len()))?;
        stack.extend(children);
    }
    Ok(*def)
}

/// Returns the root index and the list of the production sub-trees with their local index.
pub fn productions(tree: &ExprTree) -> Option<(usize, Vec<usize>)> {
    let root = tree.get_root()?;
    let &body = tree.children(root).first()?;
    if let ExprNode::Or = tree.get(body) {
        Some((root, tree.children(body).to_vec()))
    } else {
        Some((root, vec![body]))
    }
}

/// Collects the rules referenced in a tree.
pub fn rule_refs(tree: &ExprTree) -> BTreeSet<VarId> {
    let mut refs = BTreeSet::new();
    let mut stack = tree.get_root().into_iter().collect::<Vec<_>>();
    while let Some(index) = stack.pop() {
        if let ExprNode::RuleRef(v) = tree.get(index) {
            refs.insert(*v);
        }
        stack.extend(tree.children(index));
    }
    refs
}

/// Textual representation of the tree from `index`, like `prod 0(&('a', @1, 'e'))`.
pub fn tree_to_string(tree: &ExprTree, index: usize) -> String {
    let children = tree.children(index);
    if children.is_empty() {
        tree.get(index).to_string()
    } else {
        format!("{}({})", tree.get(index), children.iter().map(|&c| tree_to_string(tree, c)).collect::<Vec<_>>().join(", "))
    }
}

/// Textual representation of the whole tree.
pub fn expr_to_string(tree: &ExprTree) -> String {
    match tree.get_root() {
        Some(root) => tree_to_string(tree, root),
        None => "<empty>".to_string(),
    }
}

// ---------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::{btreeset, node};
    use super::*;

    #[test]
    fn builders() {
        let tests = vec![
            (seq_tree(0, vec![node!(chr 'a'), node!(nt 1), node!(chr 'e')]), "prod 0(&('a', @1, 'e'))"),
            (alt_tree(1, vec![vec![node!(chr 'a'), node!(nt 2)], vec![node!(chr 'k')]]), "prod 1(|(&('a', @2), 'k'))"),
            (alt_tree(2, vec![vec![node!(t 3)]]), "prod 2(:3)"),
            (literal_tree(3, "ab"), "prod 3(&('a', 'b'))"),
            (seq_tree(4, vec![]), "prod 4(ε)"),
        ];
        for (idx, (tree, expected)) in tests.into_iter().enumerate() {
            assert_eq!(expr_to_string(&tree), expected, "test {idx} failed");
            assert!(check_tree(&tree).is_ok(), "test {idx} failed");
        }
    }

    #[test]
    fn check_malformed() {
        let mut no_prod = ExprTree::new();
        no_prod.add_root(node!(&));
        let mut two_children = ExprTree::new();
        let root = two_children.add_root(node!(prod 0));
        two_children.add(Some(root), node!(chr 'a'));
        two_children.add(Some(root), node!(chr 'b'));
        let (mut nested, root) = production_tree(0);
        let cc = nested.add(Some(root), node!(&));
        nested.add(Some(cc), node!(prod 1));
        let (mut star, root) = production_tree(0);
        star.add(Some(root), node!(*));
        let (mut leaf, root) = production_tree(0);
        let c = leaf.add(Some(root), node!(chr 'a'));
        leaf.add(Some(c), node!(chr 'b'));
        for (idx, tree) in [ExprTree::new(), no_prod, two_children, nested, star, leaf].iter().enumerate() {
            assert!(check_tree(tree).is_err(), "test {idx} failed");
        }
    }

    #[test]
    fn inspection() {
        let tree = alt_tree(1, vec![vec![node!(chr 'a'), node!(nt 2), node!(chr 'c')], vec![node!(nt 0)], vec![node!(chr 'k')]]);
        let (root, prods) = productions(&tree).unwrap();
        assert_eq!(tree.get(root), &ExprNode::Production(1));
        assert_eq!(prods.len(), 3);
        assert_eq!(tree.get(prods[2]), &ExprNode::Char('k'));
        assert_eq!(rule_refs(&tree), btreeset![0, 2]);
        assert_eq!(CharClass::Word.to_segments(), segments!['0'-'9', 'A'-'Z', '_', 'a'-'z']);
        assert_eq!(node!(['a'-'c']).to_segments(), Some(segments!['a'-'c']));
        assert_eq!(node!(t 1).to_segments(), None);
    }
}

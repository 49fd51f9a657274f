// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

// Rust lacks the BTreeMap and BTreeSet equivalents of vec!

/// Generates the code to initialize a [BTreeMap](std::collections::BTreeMap).
///
/// The macro can be followed by parentheses or square brackets.
///
/// # Example
/// ```
/// # use std::collections::BTreeMap;
/// # use gramscan::btreemap;
/// let days = btreemap![0 => "Monday", 1 => "Tuesday", 2 => "Wednesday"];
/// assert_eq!(days, BTreeMap::from([(0, "Monday"), (1, "Tuesday"), (2, "Wednesday")]));
/// ```
#[macro_export]
macro_rules! btreemap {
    () => { std::collections::BTreeMap::new() };
    ($($key:expr => $value:expr,)+) => { $crate::btreemap!($($key => $value),+) };
    ($($key:expr => $value:expr),*) => {
        std::collections::BTreeMap::from([ $(($key, $value),)* ])
    };
}

/// Generates the code to initialize a [BTreeSet](std::collections::BTreeSet).
///
/// # Example
/// ```
/// # use std::collections::BTreeSet;
/// # use gramscan::btreeset;
/// let days = btreeset!["Monday", "Tuesday", "Wednesday"];
/// assert_eq!(days, BTreeSet::from(["Monday", "Tuesday", "Wednesday"]));
/// ```
#[macro_export]
macro_rules! btreeset {
    () => { std::collections::BTreeSet::new() };
    ($($key:expr,)+) => { $crate::btreeset!($($key),+) };
    ($($key:expr),*) => { std::collections::BTreeSet::from([ $($key,)* ]) };
}

/// Converts a literal or one of the UTF-8 bound names into a codepoint value (`u32`).
#[macro_export]
macro_rules! utf8 {
    ( MIN )        => { 0_u32 };
    ( LOW_MAX )    => { 0xd7ff_u32 };
    ( GAP_MIN )    => { 0xd800_u32 };
    ( GAP_MAX )    => { 0xdfff_u32 };
    ( HIGH_MIN )   => { 0xe000_u32 };
    ( MAX )        => { 0x10ffff_u32 };
    ( $a:literal ) => { $a as u32 }
}

/// Generates a [Seg](crate::segments::Seg) from one or two values (characters or integers).
///
/// # Example
/// ```
/// # use gramscan::seg;
/// # use gramscan::segments::Seg;
/// assert_eq!(seg!('a'), Seg('a' as u32, 'a' as u32));
/// assert_eq!(seg!('0'-'9'), Seg('0' as u32, '9' as u32));
/// assert_eq!(seg!(HIGH_MIN-MAX), Seg(0xe000, 0x10ffff));
/// ```
#[macro_export]
macro_rules! seg {
    ($($a1:literal)?$($a2:ident)? - $($b1:literal)?$($b2:ident)?) => {
        $crate::segments::Seg($crate::utf8!($($a1)?$($a2)?), $crate::utf8!($($b1)?$($b2)?))
    };
    ($($a1:literal)?$($a2:ident)?) => {
        $crate::segments::Seg($crate::utf8!($($a1)?$($a2)?), $crate::utf8!($($a1)?$($a2)?))
    };
}

/// Generates a [Segments](crate::segments::Segments) from segment values. Accepts literals,
/// either characters or integers, and the bound names of [utf8!](crate::utf8):
///
/// - `DOT` matches all UTF-8 characters
/// - `~` before the list negates it
///
/// # Example
/// ```
/// # use gramscan::{segments, seg};
/// # use gramscan::segments::{Segments, Seg};
/// assert_eq!(segments!('a', '0'-'9'), Segments::from([Seg('0' as u32, '9' as u32), Seg('a' as u32, 'a' as u32)]));
/// assert_eq!(segments!(DOT), Segments::dot());
/// assert_eq!(segments!(~ '1'-'8'), segments![MIN-'0', '9'-LOW_MAX, HIGH_MIN-MAX]);
/// ```
#[macro_export]
macro_rules! segments {
    () => { $crate::segments::Segments::empty() };
    (DOT) => { $crate::segments::Segments::dot() };
    ($($($a1:literal)?$($a2:ident)? $(- $($b1:literal)?$($b2:ident)?)?),+) => {
        $crate::segments::Segments::from([$($crate::seg!($($a1)?$($a2)? $(- $($b1)?$($b2)?)?)),+])
    };
    (~ $($($a1:literal)?$($a2:ident)? $(- $($b1:literal)?$($b2:ident)?)?),+) => {
        $crate::segments![$($($a1)?$($a2)? $(- $($b1)?$($b2)?)?),+].not()
    };
}

/// Generates an [ExprNode](crate::expr::ExprNode).
///
/// - `node!(chr 'a')`: single character
/// - `node!(['a'-'z', '_'])`, `node!(~['0'-'9'])`: character set
/// - `node!(.)`: any character
/// - `node!(t 3)`: grammar terminal (token 3)
/// - `node!(nt 2)`: reference to rule 2
/// - `node!(prod 1)`: production root of definition 1
/// - `node!(&)`, `node!(|)`, `node!(*)`, `node!(+)`, `node!(?)`, `node!(e)`: operators and empty
///
/// # Example
/// ```
/// # use gramscan::node;
/// # use gramscan::expr::{ExprNode, CharClass};
/// assert_eq!(node!(chr 'a'), ExprNode::Char('a'));
/// assert_eq!(node!(nt 2), ExprNode::RuleRef(2));
/// assert_eq!(node!(.), ExprNode::Class(CharClass::Any));
/// ```
#[macro_export]
macro_rules! node {
    (chr $char:expr) => { $crate::expr::ExprNode::Char($char) };
    ([$($($a1:literal)?$($a2:ident)? $(- $($b1:literal)?$($b2:ident)?)?),+]) => {
        $crate::expr::ExprNode::Class($crate::expr::CharClass::Set(Box::new($crate::segments![$($($a1)?$($a2)?$(- $($b1)?$($b2)?)?),+])))
    };
    (~[$($($a1:literal)?$($a2:ident)? $(- $($b1:literal)?$($b2:ident)?)?),+]) => {
        $crate::expr::ExprNode::Class($crate::expr::CharClass::Set(Box::new($crate::segments![~ $($($a1)?$($a2)?$(- $($b1)?$($b2)?)?),+])))
    };
    (.) => { $crate::expr::ExprNode::Class($crate::expr::CharClass::Any) };
    (t $id:expr) => { $crate::expr::ExprNode::Token($id as $crate::TokenId) };
    (nt $id:expr) => { $crate::expr::ExprNode::RuleRef($id as $crate::VarId) };
    (prod $id:expr) => { $crate::expr::ExprNode::Production($id as $crate::DefId) };
    (&) => { $crate::expr::ExprNode::Concat };
    (|) => { $crate::expr::ExprNode::Or };
    (*) => { $crate::expr::ExprNode::Star };
    (+) => { $crate::expr::ExprNode::Plus };
    (?) => { $crate::expr::ExprNode::Maybe };
    (e) => { $crate::expr::ExprNode::Empty };
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};
    use crate::expr::{CharClass, ExprNode};
    use crate::segments::{Seg, Segments};

    #[test]
    fn collections() {
        let m: BTreeMap<u16, &str> = btreemap![2 => "b", 1 => "a",];
        assert_eq!(m.into_iter().collect::<Vec<_>>(), vec![(1, "a"), (2, "b")]);
        let s: BTreeSet<u16> = btreeset![3, 1, 2, 1];
        assert_eq!(s.into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn segs() {
        assert_eq!(seg!('a'-'z'), Seg(97, 122));
        assert_eq!(seg!(0x41), Seg(0x41, 0x41));
        assert_eq!(segments!('a'-'c', 'x'), Segments::from([Seg(97, 99), Seg(120, 120)]));
        assert_eq!(segments!(~ MIN-'9'), segments!(':'-LOW_MAX, HIGH_MIN-MAX));
    }

    #[test]
    fn nodes() {
        let tests = vec![
            (node!(chr 'x'), ExprNode::Char('x')),
            (node!(t 4), ExprNode::Token(4)),
            (node!(prod 1), ExprNode::Production(1)),
            (node!(['0'-'9']), ExprNode::Class(CharClass::Set(Box::new(Segments::from([Seg(48, 57)]))))),
            (node!(?), ExprNode::Maybe),
            (node!(e), ExprNode::Empty),
        ];
        for (test_id, (node, expected)) in tests.into_iter().enumerate() {
            assert_eq!(node, expected, "test {test_id} failed");
        }
    }
}

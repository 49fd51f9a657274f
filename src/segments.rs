// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

use std::collections::BTreeSet;
use std::fmt::{Debug, Display, Formatter};
use std::ops::{Deref, DerefMut, RangeInclusive};
use std::ops::Bound::Included;
use crate::escape_char;
use crate::char_reader::{UTF8_GAP_MAX, UTF8_GAP_MIN, UTF8_HIGH_MIN, UTF8_LOW_MAX, UTF8_MAX, UTF8_MIN};

// ---------------------------------------------------------------------------------------------
// Seg

/// Closed interval of codepoint values `[.0, .1]`.
#[derive(Clone, Copy, PartialOrd, PartialEq, Eq, Ord, Hash, Debug)]
pub struct Seg(pub u32, pub u32);

impl Seg {
    /// low segment of Unicode codepoint values:
    pub const DOT_LOW: Seg = Seg(UTF8_MIN, UTF8_LOW_MAX);
    /// high segment of Unicode codepoint values:
    pub const DOT_HIGH: Seg = Seg(UTF8_HIGH_MIN, UTF8_MAX);

    #[inline]
    pub fn contains(&self, value: u32) -> bool {
        self.0 <= value && value <= self.1
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.0 <= self.1
    }
}

fn codepoint_to_string(code: u32) -> String {
    match char::from_u32(code) {
        Some(c) => escape_char(c),
        None => format!("\\u{{{code:x}}}"),
    }
}

impl Display for Seg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.0 == self.1 {
            write!(f, "'{}'", codepoint_to_string(self.0))
        } else {
            write!(f, "'{}'-'{}'", codepoint_to_string(self.0), codepoint_to_string(self.1))
        }
    }
}

// ---------------------------------------------------------------------------------------------
// Segments

/// Set of codepoint intervals. Once normalized, the intervals are disjoint and not adjacent.
#[derive(Clone, PartialEq, Default, PartialOrd, Eq, Ord, Hash)]
pub struct Segments(pub BTreeSet<Seg>);

impl Segments {
    #[inline]
    pub fn empty() -> Self {
        Segments(BTreeSet::new())
    }

    pub fn new(seg: Seg) -> Self {
        let mut segments = Self::empty();
        segments.insert(seg);
        segments
    }

    #[inline]
    pub fn is_dot(&self) -> bool {
        self.len() == 2 && self.first() == Some(&Seg::DOT_LOW) && self.last() == Some(&Seg::DOT_HIGH)
    }

    /// All the valid codepoints.
    #[inline]
    pub fn dot() -> Segments {
        Segments(BTreeSet::from([Seg::DOT_LOW, Seg::DOT_HIGH]))
    }

    /// Inserts a segment, unless it's empty (start > end).
    pub fn insert(&mut self, seg: Seg) {
        if seg.is_valid() {
            self.0.insert(seg);
        }
    }

    pub fn from_char(c: char) -> Self {
        Self::new(Seg(c as u32, c as u32))
    }

    /// Returns the character if the set contains only one.
    pub fn to_char(&self) -> Option<char> {
        match self.first() {
            Some(Seg(a, b)) if self.len() == 1 && a == b => char::from_u32(*a),
            _ => None
        }
    }

    /// Checks whether `value` is in one of the segments.
    pub fn contains_value(&self, value: u32) -> bool {
        self.0.range((Included(&Seg(0, 0)), Included(&Seg(value, u32::MAX))))
            .next_back()
            .map(|seg| seg.contains(value))
            .unwrap_or(false)
    }

    /// Merges the overlapping and adjacent segments.
    pub fn normalize(&mut self) {
        let mut segments = std::mem::take(&mut self.0).into_iter();
        if let Some(mut last) = segments.next() {
            for Seg(a, b) in segments {
                if a > last.1.saturating_add(1) {
                    self.0.insert(last);
                    last = Seg(a, b);
                } else if b > last.1 {
                    last.1 = b;
                }
            }
            self.0.insert(last);
        }
    }

    pub fn normalized(&self) -> Self {
        let mut n = self.clone();
        n.normalize();
        n
    }

    /// Adds all the segments of `other`.
    pub fn union(&mut self, other: &Segments) {
        self.0.extend(other.iter());
    }

    pub fn chars(&self) -> SegmentsCharIter {
        SegmentsCharIter { segments: self.0.clone(), range: None }
    }

    /// Inserts Seg(start, stop) in the current segment, except the UTF-8 gap between
    /// UTF8_GAP_MIN (0xd800) and UTF8_GAP_MAX (0xdfff). If a part or the entirety of
    /// that gap is within [start-stop], then it's extruded first.
    pub fn insert_utf8(&mut self, start: u32, stop: u32) {
        if start <= stop {
            if stop < UTF8_GAP_MIN || start > UTF8_GAP_MAX {
                self.0.insert(Seg(start, stop));
            } else {
                if start < UTF8_GAP_MIN {
                    self.0.insert(Seg(start, UTF8_GAP_MIN - 1));
                }
                if stop > UTF8_GAP_MAX {
                    self.0.insert(Seg(UTF8_GAP_MAX + 1, stop));
                }
            }
        }
    }

    /// Negates the selection, except the UTF-8 gap between UTF8_GAP_MIN (0xd800) and
    /// UTF8_GAP_MAX (0xdfff), which is always excluded.
    pub fn not(&self) -> Self {
        let mut inv = Segments::empty();
        let mut start = 0;
        for seg in self.normalized().iter() {
            if seg.0 > start {
                inv.insert_utf8(start, seg.0 - 1);
            }
            start = seg.1.saturating_add(1);
        }
        if start <= UTF8_MAX {
            inv.insert_utf8(start, UTF8_MAX);
        }
        inv
    }
}

impl<const N: usize> From<[Seg; N]> for Segments {
    fn from(arr: [Seg; N]) -> Self {
        let mut segments = Segments::empty();
        for seg in arr {
            segments.insert(seg);
        }
        segments
    }
}

impl FromIterator<Seg> for Segments {
    fn from_iter<I: IntoIterator<Item = Seg>>(iter: I) -> Self {
        let mut segments = Segments::empty();
        for seg in iter {
            segments.insert(seg);
        }
        segments
    }
}

impl Deref for Segments {
    type Target = BTreeSet<Seg>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Segments {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Debug for Segments {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Segments({})", self.0.iter().map(|seg| format!("Seg(0x{:x}, 0x{:x})", seg.0, seg.1)).collect::<Vec<_>>().join(", "))
    }
}

impl Display for Segments {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_dot() {
            write!(f, "DOT")
        } else {
            write!(f, "{}", self.0.iter().map(|seg| seg.to_string()).collect::<Vec<_>>().join(", "))
        }
    }
}

pub struct SegmentsCharIter {
    segments: BTreeSet<Seg>,
    range: Option<RangeInclusive<u32>>
}

impl Iterator for SegmentsCharIter {
    type Item = char;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(code) = self.range.as_mut().and_then(|r| r.next()) {
                // skips the codepoints of the UTF-16 surrogate gap
                if let Some(c) = char::from_u32(code) {
                    return Some(c);
                }
            } else {
                let Seg(a, b) = self.segments.pop_first()?;
                self.range = Some(a..=b);
            }
        }
    }
}

// ---------------------------------------------------------------------------------------------

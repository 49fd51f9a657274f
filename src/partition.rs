// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

//! Partition of the codepoint axis into disjoint cells, each cell carrying the set of items
//! whose intervals cover it. The DFA builder uses it to split the character transitions of
//! a set of NFA states into non-overlapping labels.

use std::collections::{BTreeMap, BTreeSet};
use std::collections::btree_map::Iter;
use std::fmt::{Debug, Display, Formatter};
use crate::segments::{Seg, Segments};

/// Interval partition.
///
/// * The cells are disjoint and sorted by their start value.
/// * A value belongs to a cell if and only if at least one inserted interval covers it; the
///   cell's set holds the items of all the intervals covering it.
/// * A cell boundary is kept at every endpoint of an inserted interval, so the cells (and
///   not only the value-to-set mapping) are independent of the insertion order.
#[derive(Clone, PartialEq, Default)]
pub struct IntervalPartition<T> {
    cells: BTreeMap<Seg, BTreeSet<T>>,
}

impl<T: Ord + Clone> IntervalPartition<T> {
    pub fn new() -> Self {
        IntervalPartition { cells: BTreeMap::new() }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Adds `item` to every value of `seg`, splitting the existing cells at the boundaries
    /// of `seg`. Empty segments (start > end) are ignored.
    pub fn insert(&mut self, seg: Seg, item: T) {
        let Seg(a, b) = seg;
        if a > b {
            return;
        }
        // cells are disjoint, so the overlapping ones are the last cells starting at or before `b`
        let overlapping = self.cells.range(..=Seg(b, u32::MAX))
            .rev()
            .take_while(|(s, _)| s.1 >= a)
            .map(|(s, _)| *s)
            .collect::<Vec<_>>();
        // next value of [a, b] not yet covered (None if beyond u32::MAX)
        let mut next = Some(a);
        for s in overlapping.into_iter().rev() {
            let Some(items) = self.cells.remove(&s) else { continue };
            if s.0 < a {
                self.cells.insert(Seg(s.0, a - 1), items.clone());
            }
            let lo = s.0.max(a);
            let hi = s.1.min(b);
            if let Some(gap_start) = next {
                if lo > gap_start {
                    self.cells.insert(Seg(gap_start, lo - 1), BTreeSet::from([item.clone()]));
                }
            }
            let mut inner = items.clone();
            inner.insert(item.clone());
            self.cells.insert(Seg(lo, hi), inner);
            if s.1 > b {
                self.cells.insert(Seg(b + 1, s.1), items);
            }
            next = hi.checked_add(1);
        }
        if let Some(gap_start) = next {
            if gap_start <= b {
                self.cells.insert(Seg(gap_start, b), BTreeSet::from([item]));
            }
        }
    }

    /// Adds `item` to every value of `segments`.
    pub fn insert_segments(&mut self, segments: &Segments, item: T) {
        for seg in segments.iter() {
            self.insert(*seg, item.clone());
        }
    }

    /// Returns the items covering `value`.
    pub fn get(&self, value: u32) -> Option<&BTreeSet<T>> {
        let (seg, items) = self.cells.range(..=Seg(value, u32::MAX)).next_back()?;
        if seg.contains(value) { Some(items) } else { None }
    }

    /// Iterates over the cells, sorted by start value.
    pub fn iter(&self) -> Iter<'_, Seg, BTreeSet<T>> {
        self.cells.iter()
    }

    /// Returns the cells after merging the adjacent cells that have the same item set.
    pub fn merged(&self) -> Vec<(Seg, BTreeSet<T>)> {
        let mut result: Vec<(Seg, BTreeSet<T>)> = Vec::new();
        for (seg, items) in &self.cells {
            match result.last_mut() {
                Some((last, last_items)) if last.1.checked_add(1) == Some(seg.0) && last_items == items => {
                    last.1 = seg.1;
                }
                _ => result.push((*seg, items.clone())),
            }
        }
        result
    }
}

impl<'a, T> IntoIterator for &'a IntervalPartition<T> {
    type Item = (&'a Seg, &'a BTreeSet<T>);
    type IntoIter = Iter<'a, Seg, BTreeSet<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

impl<T: Debug> Debug for IntervalPartition<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.cells.iter()).finish()
    }
}

impl<T: Display> Display for IntervalPartition<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let cells = self.cells.iter()
            .map(|(seg, items)| format!("{seg}: {{{}}}", items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", ")))
            .collect::<Vec<_>>();
        write!(f, "{}", cells.join(", "))
    }
}

// ---------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::{btreeset, seg};
    use super::*;

    fn cells(p: &IntervalPartition<u32>) -> Vec<(Seg, BTreeSet<u32>)> {
        p.iter().map(|(s, i)| (*s, i.clone())).collect()
    }

    /// Visits all the permutations of `items` (Heap's algorithm).
    fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
        fn heap<T: Clone>(k: usize, items: &mut Vec<T>, out: &mut Vec<Vec<T>>) {
            if k <= 1 {
                out.push(items.clone());
                return;
            }
            heap(k - 1, items, out);
            for i in 0..k - 1 {
                if k % 2 == 0 { items.swap(i, k - 1) } else { items.swap(0, k - 1) }
                heap(k - 1, items, out);
            }
        }
        let mut v = items.to_vec();
        let mut out = Vec::new();
        heap(v.len(), &mut v, &mut out);
        out
    }

    #[test]
    fn insert_basic() {
        let tests: Vec<(Vec<(Seg, u32)>, Vec<(Seg, BTreeSet<u32>)>)> = vec![
            (vec![(seg!(1-5), 1)], vec![(seg!(1-5), btreeset![1])]),
            (vec![(seg!(1-5), 1), (seg!(3-8), 2)], vec![(seg!(1-2), btreeset![1]), (seg!(3-5), btreeset![1, 2]), (seg!(6-8), btreeset![2])]),
            (vec![(seg!(1-9), 1), (seg!(3-4), 2)], vec![(seg!(1-2), btreeset![1]), (seg!(3-4), btreeset![1, 2]), (seg!(5-9), btreeset![1])]),
            (vec![(seg!(3-4), 1), (seg!(1-9), 2)], vec![(seg!(1-2), btreeset![2]), (seg!(3-4), btreeset![1, 2]), (seg!(5-9), btreeset![2])]),
            (vec![(seg!(1-2), 1), (seg!(5-6), 1), (seg!(0-9), 2)],
             vec![(seg!(0), btreeset![2]), (seg!(1-2), btreeset![1, 2]), (seg!(3-4), btreeset![2]), (seg!(5-6), btreeset![1, 2]), (seg!(7-9), btreeset![2])]),
            (vec![(seg!(1-2), 1), (seg!(3-4), 1)], vec![(seg!(1-2), btreeset![1]), (seg!(3-4), btreeset![1])]),
            (vec![(seg!(5-2), 1)], vec![]),
            (vec![(Seg(10, u32::MAX), 1), (Seg(5, u32::MAX), 2)], vec![(Seg(5, 9), btreeset![2]), (Seg(10, u32::MAX), btreeset![1, 2])]),
            (vec![(seg!(4), 1), (seg!(4), 1)], vec![(seg!(4), btreeset![1])]),
        ];
        for (idx, (inserts, expected)) in tests.into_iter().enumerate() {
            let mut p = IntervalPartition::new();
            for (seg, item) in inserts {
                p.insert(seg, item);
            }
            assert_eq!(cells(&p), expected, "test {idx} failed");
        }
    }

    #[test]
    fn insert_order_independent() {
        let inserts = vec![(seg!('a'-'e'), 1), (seg!('i'-'k'), 2), (seg!('d'-'f'), 3), (seg!('b'-'c'), 4)];
        let expected = vec![
            (seg!('a'), btreeset![1]),
            (seg!('b'-'c'), btreeset![1, 4]),
            (seg!('d'-'e'), btreeset![1, 3]),
            (seg!('f'), btreeset![3]),
            (seg!('i'-'k'), btreeset![2]),
        ];
        let all = permutations(&inserts);
        assert_eq!(all.len(), 24);
        for (idx, order) in all.into_iter().enumerate() {
            let mut p = IntervalPartition::new();
            for (seg, item) in order {
                p.insert(seg, item);
            }
            assert_eq!(cells(&p), expected, "permutation {idx} failed");
        }
    }

    #[test]
    fn get_and_merged() {
        let mut p = IntervalPartition::new();
        p.insert_segments(&crate::segments!['a'-'c', 'x'-'z'], 7);
        p.insert(seg!('c'-'d'), 8);
        p.insert(seg!('e'), 8);
        assert_eq!(p.get('b' as u32), Some(&btreeset![7]));
        assert_eq!(p.get('c' as u32), Some(&btreeset![7, 8]));
        assert_eq!(p.get('w' as u32), None);
        assert_eq!(p.get(0), None);
        assert_eq!(p.len(), 5);
        assert_eq!(p.merged(), vec![
            (seg!('a'-'b'), btreeset![7]),
            (seg!('c'), btreeset![7, 8]),
            (seg!('d'-'e'), btreeset![8]),
            (seg!('x'-'z'), btreeset![7]),
        ]);
        assert_eq!(p.to_string(), "'a'-'b': {7}, 'c': {7, 8}, 'd': {8}, 'e': {8}, 'x'-'z': {7}");
    }
}

//! Approximate stacktrace matching
//!
//! [`SequenceMatcher`] scores two texts with the Ratcliff/Obershelp
//! matching-block algorithm: repeatedly take the longest common block, then
//! recurse on the unmatched text either side of it. Whitespace is junk: it
//! never starts a block, but a block is extended across it when both sides
//! agree. The score is `2 * matched / (len(a) + len(b))`.
//!
//! Once `b` has [`AUTOJUNK_MIN_LEN`] characters, characters making up more
//! than 1% of it are "popular". Like junk they never seed a block, but a
//! block grows across them. Stacktraces consist almost entirely of a few
//! dozen popular characters, so this keeps block search near linear.
//!
//! [`StacktraceMatcher`] turns that score into a duplicate decision. Cheap
//! upper bounds are checked first so most unrelated candidates never reach
//! the exact scoring step.

use crate::stacktrace::PrintedStacktrace;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Quick estimates at or below this value skip exact scoring
pub const DEFAULT_PREFILTER_THRESHOLD: f64 = 0.6;

/// Exact ratio a candidate must exceed to count as the same defect
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.95;

/// Length of `b` from which popular characters are pruned
pub const AUTOJUNK_MIN_LEN: usize = 200;

fn is_junk(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n')
}

/// A common block: `a[a_start..a_start + size] == b[b_start..b_start + size]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchingBlock {
    pub a_start: usize,
    pub b_start: usize,
    pub size: usize,
}

/// Run lengths of the previous and current row of the block search.
///
/// `prev[j + 1]` is the length of the common run ending at `a[i - 1]` and
/// `b[j]`. Only touched slots are reset, so a row costs as much as the
/// positions it visits.
struct RunTable {
    prev: Vec<usize>,
    curr: Vec<usize>,
    prev_touched: Vec<usize>,
    curr_touched: Vec<usize>,
}

impl RunTable {
    fn new(b_len: usize) -> Self {
        Self {
            prev: vec![0; b_len + 1],
            curr: vec![0; b_len + 1],
            prev_touched: Vec::new(),
            curr_touched: Vec::new(),
        }
    }

    fn next_row(&mut self) {
        for &slot in &self.prev_touched {
            self.prev[slot] = 0;
        }
        self.prev_touched.clear();
        std::mem::swap(&mut self.prev, &mut self.curr);
        std::mem::swap(&mut self.prev_touched, &mut self.curr_touched);
    }

    fn reset(&mut self) {
        self.next_row();
    }
}

/// Character-level sequence matcher with whitespace treated as junk
pub struct SequenceMatcher {
    a: Vec<char>,
    b: Vec<char>,
    b2j: HashMap<char, Vec<usize>>,
    popular: HashSet<char>,
}

impl SequenceMatcher {
    /// Matcher that prunes popular characters of long texts
    pub fn new(a: &str, b: &str) -> Self {
        Self::with_autojunk(a, b, true)
    }

    pub fn with_autojunk(a: &str, b: &str, autojunk: bool) -> Self {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();

        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            if !is_junk(c) {
                b2j.entry(c).or_default().push(j);
            }
        }

        let mut popular = HashSet::new();
        if autojunk && b.len() >= AUTOJUNK_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b2j.retain(|&c, positions| {
                let keep = positions.len() <= limit;
                if !keep {
                    popular.insert(c);
                }
                keep
            });
        }

        Self { a, b, b2j, popular }
    }

    /// Characters of `b` that were too frequent to seed a block
    pub fn popular(&self) -> &HashSet<char> {
        &self.popular
    }

    fn total_len(&self) -> usize {
        self.a.len() + self.b.len()
    }

    fn ratio_of(&self, matches: usize) -> f64 {
        let total = self.total_len();
        if total == 0 {
            1.0
        } else {
            2.0 * matches as f64 / total as f64
        }
    }

    /// Upper bound from the sequence lengths alone
    pub fn real_quick_ratio(&self) -> f64 {
        self.ratio_of(self.a.len().min(self.b.len()))
    }

    /// Upper bound from the character multisets, ignoring order
    pub fn quick_ratio(&self) -> f64 {
        let mut available: HashMap<char, usize> = HashMap::new();
        for &c in &self.b {
            *available.entry(c).or_default() += 1;
        }

        let mut matches = 0;
        for c in &self.a {
            if let Some(count) = available.get_mut(c) {
                if *count > 0 {
                    *count -= 1;
                    matches += 1;
                }
            }
        }
        self.ratio_of(matches)
    }

    /// Exact similarity in `[0, 1]`
    pub fn ratio(&self) -> f64 {
        let matches = self.matching_blocks().iter().map(|block| block.size).sum();
        self.ratio_of(matches)
    }

    /// Longest common block within `a[alo..ahi]` and `b[blo..bhi]`
    fn find_longest_match(
        &self,
        runs: &mut RunTable,
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> MatchingBlock {
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);

        runs.reset();
        for i in alo..ahi {
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                let first = positions.partition_point(|&j| j < blo);
                for &j in positions[first..].iter().take_while(|&&j| j < bhi) {
                    let k = runs.prev[j] + 1;
                    runs.curr[j + 1] = k;
                    runs.curr_touched.push(j + 1);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            runs.next_row();
        }

        // Popular characters never seed a block but may extend one
        while best_i > alo
            && best_j > blo
            && !is_junk(self.b[best_j - 1])
            && self.a[best_i - 1] == self.b[best_j - 1]
        {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && !is_junk(self.b[best_j + best_size])
            && self.a[best_i + best_size] == self.b[best_j + best_size]
        {
            best_size += 1;
        }

        // Same for junk
        while best_i > alo
            && best_j > blo
            && is_junk(self.b[best_j - 1])
            && self.a[best_i - 1] == self.b[best_j - 1]
        {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && is_junk(self.b[best_j + best_size])
            && self.a[best_i + best_size] == self.b[best_j + best_size]
        {
            best_size += 1;
        }

        MatchingBlock {
            a_start: best_i,
            b_start: best_j,
            size: best_size,
        }
    }

    /// All common blocks, ordered by position
    pub fn matching_blocks(&self) -> Vec<MatchingBlock> {
        let mut runs = RunTable::new(self.b.len());
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let block = self.find_longest_match(&mut runs, alo, ahi, blo, bhi);
            if block.size == 0 {
                continue;
            }
            if alo < block.a_start && blo < block.b_start {
                pending.push((alo, block.a_start, blo, block.b_start));
            }
            let a_end = block.a_start + block.size;
            let b_end = block.b_start + block.size;
            if a_end < ahi && b_end < bhi {
                pending.push((a_end, ahi, b_end, bhi));
            }
            blocks.push(block);
        }

        blocks.sort_by_key(|block| (block.a_start, block.b_start));

        let mut collapsed: Vec<MatchingBlock> = Vec::with_capacity(blocks.len());
        for block in blocks {
            if let Some(last) = collapsed.last_mut() {
                if last.a_start + last.size == block.a_start
                    && last.b_start + last.size == block.b_start
                {
                    last.size += block.size;
                    continue;
                }
            }
            collapsed.push(block);
        }
        collapsed
    }
}

/// Outcome of comparing a new report against one candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    /// Exact ratio, or 0 when the pre-filter or location check skipped it
    pub ratio: f64,
    pub same_throw_location: bool,
    pub is_match: bool,
}

/// Decides whether two printed stacktraces describe the same defect
#[derive(Debug, Clone, Copy)]
pub struct StacktraceMatcher {
    prefilter_threshold: f64,
    match_threshold: f64,
}

impl Default for StacktraceMatcher {
    fn default() -> Self {
        Self {
            prefilter_threshold: DEFAULT_PREFILTER_THRESHOLD,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

impl StacktraceMatcher {
    pub fn new(prefilter_threshold: f64, match_threshold: f64) -> Self {
        Self {
            prefilter_threshold,
            match_threshold,
        }
    }

    /// Similarity of two texts, 0 when the quick estimates rule out a match.
    ///
    /// The pair is scored in a canonical order (shorter first, then
    /// lexicographic) so the result does not depend on argument order.
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        let (first, second) = match a.len().cmp(&b.len()).then_with(|| a.cmp(b)) {
            Ordering::Greater => (b, a),
            _ => (a, b),
        };

        let matcher = SequenceMatcher::new(first, second);
        if matcher.real_quick_ratio() <= self.prefilter_threshold
            || matcher.quick_ratio() <= self.prefilter_threshold
        {
            return 0.0;
        }
        matcher.ratio()
    }

    /// Compare a new report's stacktrace with a candidate's
    pub fn compare(&self, new: &PrintedStacktrace, candidate: &PrintedStacktrace) -> Comparison {
        let same_throw_location = new.throw_location() == candidate.throw_location();
        if !same_throw_location {
            debug!(
                "Throw location differs: {:?} vs {:?}",
                new.throw_location(),
                candidate.throw_location()
            );
            return Comparison {
                ratio: 0.0,
                same_throw_location,
                is_match: false,
            };
        }

        let ratio = self.similarity(new.as_str(), candidate.as_str());
        Comparison {
            ratio,
            same_throw_location,
            is_match: ratio > self.match_threshold,
        }
    }

    /// Whether the two stacktraces describe the same defect
    pub fn is_same_defect(&self, new: &PrintedStacktrace, candidate: &PrintedStacktrace) -> bool {
        self.compare(new, candidate).is_match
    }
}

//! Sorted-set value engine.
//!
//! Ordering is by `(score ascending, member lexicographic ascending)`. As
//! called out in the design notes, this is backed by a skip list augmented
//! with per-level span counts (so rank queries are a level descent rather
//! than a linear scan) paired with a `HashMap` from member to score for O(1)
//! score lookups (ZSCORE, ZINCRBY).

use bytes::Bytes;
use rand::Rng;
use std::cmp::Ordering;
use std::collections::HashMap;

const MAX_LEVEL: usize = 32;
const P: f64 = 0.25;

fn score_member_cmp(s1: f64, m1: &[u8], s2: f64, m2: &[u8]) -> Ordering {
    match s1.partial_cmp(&s2).unwrap_or(Ordering::Equal) {
        Ordering::Equal => m1.cmp(m2),
        other => other,
    }
}

struct Node {
    member: Bytes,
    score: f64,
    /// forward[level] = index of the next node at that level, if any
    forward: Vec<Option<usize>>,
    /// span[level] = number of nodes skipped by forward[level]
    span: Vec<u64>,
    backward: Option<usize>,
}

impl Node {
    fn head(levels: usize) -> Node {
        Node {
            member: Bytes::new(),
            score: f64::NEG_INFINITY,
            forward: vec![None; levels],
            span: vec![0; levels],
            backward: None,
        }
    }
}

/// A skip list ordered by `(score, member)`, augmented with span counts.
///
/// Removed nodes are unlinked from the list but their arena slot is not
/// reclaimed; this trades a small amount of steady-state memory for a much
/// simpler (and still safe) implementation, which is an acceptable
/// simplification for a set that is not expected to churn over billions of
/// insert/remove cycles.
pub struct SortedSet {
    nodes: Vec<Node>,
    scores: HashMap<Bytes, f64>,
    level: usize,
    length: u64,
    tail: Option<usize>,
}

impl Default for SortedSet {
    fn default() -> Self {
        Self::new()
    }
}

impl SortedSet {
    pub fn new() -> SortedSet {
        SortedSet {
            nodes: vec![Node::head(1)],
            scores: HashMap::new(),
            level: 1,
            length: 0,
            tail: None,
        }
    }

    pub fn len(&self) -> usize {
        self.length as usize
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn score(&self, member: &[u8]) -> Option<f64> {
        self.scores.get(member).copied()
    }

    fn random_level(&self) -> usize {
        let mut level = 1;
        let mut rng = rand::thread_rng();
        while level < MAX_LEVEL && rng.gen::<f64>() < P {
            level += 1;
        }
        level
    }

    /// Inserts `member` with `score`, replacing any existing entry for that
    /// member. Returns the previous score, if the member already existed.
    pub fn insert(&mut self, member: Bytes, score: f64) -> Option<f64> {
        let previous = self.scores.get(&member).copied();
        if let Some(prev_score) = previous {
            if prev_score == score {
                return previous;
            }
            self.remove_node(prev_score, &member);
        }
        self.scores.insert(member.clone(), score);
        self.insert_node(member, score);
        previous
    }

    fn insert_node(&mut self, member: Bytes, score: f64) {
        let mut update = vec![0usize; MAX_LEVEL];
        let mut rank = vec![0u64; MAX_LEVEL];
        let mut x = 0usize;

        for i in (0..self.level).rev() {
            rank[i] = if i == self.level - 1 { 0 } else { rank[i + 1] };
            while let Some(next) = self.nodes[x].forward[i] {
                let n = &self.nodes[next];
                if score_member_cmp(n.score, &n.member, score, &member) == Ordering::Less {
                    rank[i] += self.nodes[x].span[i];
                    x = next;
                } else {
                    break;
                }
            }
            update[i] = x;
        }

        let new_level = self.random_level();
        if new_level > self.level {
            for i in self.level..new_level {
                rank[i] = 0;
                update[i] = 0;
                self.nodes[0].forward.push(None);
                self.nodes[0].span.push(self.length);
            }
            self.level = new_level;
        }

        let new_index = self.nodes.len();
        let mut node = Node {
            member,
            score,
            forward: vec![None; new_level],
            span: vec![0; new_level],
            backward: None,
        };

        for i in 0..new_level {
            node.forward[i] = self.nodes[update[i]].forward[i];
            self.nodes[update[i]].forward[i] = Some(new_index);

            node.span[i] = self.nodes[update[i]].span[i] - (rank[0] - rank[i]);
            self.nodes[update[i]].span[i] = (rank[0] - rank[i]) + 1;
        }

        for i in new_level..self.level {
            self.nodes[update[i]].span[i] += 1;
        }

        node.backward = if update[0] == 0 { None } else { Some(update[0]) };
        self.nodes.push(node);

        let forward0 = self.nodes[new_index].forward[0];
        if let Some(next) = forward0 {
            self.nodes[next].backward = Some(new_index);
        } else {
            self.tail = Some(new_index);
        }

        self.length += 1;
    }

    pub fn remove(&mut self, member: &[u8]) -> bool {
        if let Some(score) = self.scores.remove(member) {
            self.remove_node(score, member);
            true
        } else {
            false
        }
    }

    fn remove_node(&mut self, score: f64, member: &[u8]) {
        let mut update = vec![0usize; MAX_LEVEL];
        let mut x = 0usize;

        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].forward[i] {
                let n = &self.nodes[next];
                if score_member_cmp(n.score, &n.member, score, member) == Ordering::Less {
                    x = next;
                } else {
                    break;
                }
            }
            update[i] = x;
        }

        let target = self.nodes[x].forward[0];
        let target = match target {
            Some(t) if self.nodes[t].score == score && self.nodes[t].member == member => t,
            _ => return,
        };

        for i in 0..self.level {
            if self.nodes[update[i]].forward[i] == Some(target) {
                self.nodes[update[i]].span[i] += self.nodes[target].span[i];
                self.nodes[update[i]].span[i] -= 1;
                self.nodes[update[i]].forward[i] = self.nodes[target].forward[i];
            } else {
                self.nodes[update[i]].span[i] -= 1;
            }
        }

        if let Some(next) = self.nodes[target].forward[0] {
            self.nodes[next].backward = self.nodes[target].backward;
        } else {
            self.tail = self.nodes[target].backward;
        }

        while self.level > 1 && self.nodes[0].forward[self.level - 1].is_none() {
            self.level -= 1;
        }

        self.length -= 1;
    }

    /// 0-based rank of `member`, ascending by (score, member).
    pub fn rank(&self, member: &[u8]) -> Option<u64> {
        let score = self.score(member)?;
        let mut x = 0usize;
        let mut rank = 0u64;

        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].forward[i] {
                let n = &self.nodes[next];
                if score_member_cmp(n.score, &n.member, score, member) != Ordering::Greater {
                    rank += self.nodes[x].span[i];
                    x = next;
                    if n.member == member {
                        return Some(rank - 1);
                    }
                } else {
                    break;
                }
            }
        }
        None
    }

    fn node_by_rank(&self, rank: u64) -> Option<usize> {
        let mut x = 0usize;
        let mut traversed = 0u64;

        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].forward[i] {
                if traversed + self.nodes[x].span[i] <= rank {
                    traversed += self.nodes[x].span[i];
                    x = next;
                } else {
                    break;
                }
            }
            if traversed == rank && x != 0 {
                return Some(x);
            }
        }
        None
    }

    /// Normalizes a possibly-negative, possibly out-of-range rank pair (as
    /// Redis does for LRANGE/ZRANGE-style commands) to `[start, stop]`
    /// inclusive 0-based indices, or `None` if the range is empty.
    fn normalize_range(&self, start: i64, stop: i64) -> Option<(u64, u64)> {
        let len = self.length as i64;
        if len == 0 {
            return None;
        }
        let mut start = if start < 0 { (len + start).max(0) } else { start };
        let mut stop = if stop < 0 { len + stop } else { stop };
        if stop >= len {
            stop = len - 1;
        }
        if start > stop || start >= len {
            return None;
        }
        if start < 0 {
            start = 0;
        }
        if stop < 0 {
            return None;
        }
        Some((start as u64, stop as u64))
    }

    /// Returns `(member, score)` pairs for 0-based inclusive rank range
    /// `[start, stop]`, with Redis-style negative index normalization.
    pub fn range_by_rank(&self, start: i64, stop: i64) -> Vec<(Bytes, f64)> {
        let (start, stop) = match self.normalize_range(start, stop) {
            Some(r) => r,
            None => return Vec::new(),
        };

        let mut out = Vec::with_capacity((stop - start + 1) as usize);
        let mut idx = match self.node_by_rank(start) {
            Some(i) => i,
            None => return out,
        };
        for _ in start..=stop {
            let n = &self.nodes[idx];
            out.push((n.member.clone(), n.score));
            match n.forward[0] {
                Some(next) => idx = next,
                None => break,
            }
        }
        out
    }

    /// Inclusive score range `[min, max]` query, ordered ascending, honoring
    /// an optional `(offset, count)` LIMIT (count `-1` means "no limit").
    pub fn range_by_score(
        &self,
        min: f64,
        min_exclusive: bool,
        max: f64,
        max_exclusive: bool,
        offset: i64,
        count: i64,
    ) -> Vec<(Bytes, f64)> {
        let mut out = Vec::new();
        let mut x = 0usize;

        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].forward[i] {
                let n = &self.nodes[next];
                let below_min = n.score < min || (min_exclusive && n.score == min);
                if below_min {
                    x = next;
                } else {
                    break;
                }
            }
        }

        let mut cur = self.nodes[x].forward[0];
        let mut skipped = 0i64;
        let mut taken = 0i64;

        while let Some(idx) = cur {
            let n = &self.nodes[idx];
            let above_max = n.score > max || (max_exclusive && n.score == max);
            if above_max {
                break;
            }
            if skipped < offset {
                skipped += 1;
            } else {
                out.push((n.member.clone(), n.score));
                taken += 1;
                if count >= 0 && taken >= count {
                    break;
                }
            }
            cur = n.forward[0];
        }

        out
    }

    /// Count of members with score in the inclusive range `[min, max]`.
    pub fn count_by_score(&self, min: f64, min_exclusive: bool, max: f64, max_exclusive: bool) -> u64 {
        self.range_by_score(min, min_exclusive, max, max_exclusive, 0, -1)
            .len() as u64
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Bytes, f64)> {
        self.scores.iter().map(|(m, s)| (m, *s))
    }

    /// Lexicographic range query (ZRANGEBYLEX family). Only meaningful when
    /// every member in the set shares the same score, per the Redis
    /// contract; this walks the existing (score, member) ordering and
    /// filters by member bounds rather than requiring a separate index.
    pub fn range_by_lex(
        &self,
        min: &LexBound,
        max: &LexBound,
        offset: i64,
        count: i64,
    ) -> Vec<(Bytes, f64)> {
        let mut out = Vec::new();
        let mut skipped = 0i64;
        let mut taken = 0i64;
        for (member, score) in self.range_by_rank(0, -1) {
            if !min.ge_min(&member) || !max.le_max(&member) {
                continue;
            }
            if skipped < offset {
                skipped += 1;
                continue;
            }
            out.push((member, score));
            taken += 1;
            if count >= 0 && taken >= count {
                break;
            }
        }
        out
    }
}

/// One endpoint of a ZRANGEBYLEX-style range: `-`/`+` for unbounded,
/// `[member` for inclusive, `(member` for exclusive.
#[derive(Debug, Clone)]
pub enum LexBound {
    NegInf,
    PosInf,
    Inclusive(Bytes),
    Exclusive(Bytes),
}

impl LexBound {
    pub fn parse(s: &[u8]) -> Option<LexBound> {
        match s.first()? {
            b'-' if s.len() == 1 => Some(LexBound::NegInf),
            b'+' if s.len() == 1 => Some(LexBound::PosInf),
            b'[' => Some(LexBound::Inclusive(Bytes::copy_from_slice(&s[1..]))),
            b'(' => Some(LexBound::Exclusive(Bytes::copy_from_slice(&s[1..]))),
            _ => None,
        }
    }

    fn ge_min(&self, m: &[u8]) -> bool {
        match self {
            LexBound::NegInf => true,
            LexBound::PosInf => false,
            LexBound::Inclusive(b) => m >= b.as_ref(),
            LexBound::Exclusive(b) => m > b.as_ref(),
        }
    }

    fn le_max(&self, m: &[u8]) -> bool {
        match self {
            LexBound::NegInf => false,
            LexBound::PosInf => true,
            LexBound::Inclusive(b) => m <= b.as_ref(),
            LexBound::Exclusive(b) => m < b.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members(v: &[(Bytes, f64)]) -> Vec<String> {
        v.iter()
            .map(|(m, _)| String::from_utf8(m.to_vec()).unwrap())
            .collect()
    }

    #[test]
    fn orders_by_score_then_member() {
        let mut z = SortedSet::new();
        z.insert(Bytes::from_static(b"c"), 3.0);
        z.insert(Bytes::from_static(b"a"), 1.0);
        z.insert(Bytes::from_static(b"b"), 2.0);
        z.insert(Bytes::from_static(b"a2"), 1.0);

        let all = z.range_by_rank(0, -1);
        assert_eq!(members(&all), vec!["a", "a2", "b", "c"]);
    }

    #[test]
    fn rank_matches_insertion_order() {
        let mut z = SortedSet::new();
        for (m, s) in [("a", 1.0), ("b", 2.0), ("c", 3.0)] {
            z.insert(Bytes::from(m.as_bytes().to_vec()), s);
        }
        assert_eq!(z.rank(b"a"), Some(0));
        assert_eq!(z.rank(b"b"), Some(1));
        assert_eq!(z.rank(b"c"), Some(2));
        assert_eq!(z.rank(b"missing"), None);
    }

    #[test]
    fn remove_unlinks_and_updates_spans() {
        let mut z = SortedSet::new();
        for i in 0..50 {
            z.insert(Bytes::from(format!("m{i:03}")), i as f64);
        }
        assert!(z.remove(b"m025"));
        assert_eq!(z.len(), 49);
        assert_eq!(z.rank(b"m026"), Some(24));
        assert!(!z.remove(b"m025"));
    }

    #[test]
    fn range_by_score_respects_exclusivity_and_limit() {
        let mut z = SortedSet::new();
        for i in 1..=5 {
            z.insert(Bytes::from(format!("m{i}")), i as f64);
        }
        let r = z.range_by_score(2.0, true, 4.0, false, 0, -1);
        assert_eq!(members(&r), vec!["m3", "m4"]);

        let limited = z.range_by_score(1.0, false, 5.0, false, 1, 2);
        assert_eq!(members(&limited), vec!["m2", "m3"]);
    }
}

//! Labelled trajectory pairs.

use rand::seq::SliceRandom;
use rand::Rng;

/// Frames `start, start + step, ...` below `end` of trajectory `traj` in bin `bin`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub bin: usize,
    pub traj: usize,
    pub start: usize,
    pub end: usize,
    pub step: usize,
}

impl Span {
    /// Number of frames the span selects.
    pub fn len(&self) -> usize {
        let step = self.step.max(1);
        self.end.saturating_sub(self.start).div_ceil(step)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// How a pair was sampled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PairKind {
    /// Strided suffixes of two full trajectories
    FullTrajectory,
    /// Fixed-length snippets obeying the progress prior
    Snippet,
}

/// Two spans and the preference label between them.
///
/// `label` is 1 when the second trajectory comes from a bin ranked at least
/// as high as the first one, 0 otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrainingPair {
    pub i: Span,
    pub j: Span,
    pub label: u8,
    pub kind: PairKind,
}

impl TrainingPair {
    pub fn new(i: Span, j: Span, kind: PairKind) -> Self {
        Self {
            i,
            j,
            label: u8::from(i.bin <= j.bin),
            kind,
        }
    }

    /// Label as the class index expected by the ranking loss.
    pub fn target(&self) -> i64 {
        i64::from(self.label)
    }
}

/// Accumulated training pairs.
///
/// The set only grows: every dataset construction appends to it and nothing
/// is deduplicated. `clear` is the only way to shrink it.
#[derive(Clone, Debug, Default)]
pub struct TrainingSet {
    pairs: Vec<TrainingPair>,
}

impl TrainingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pair: TrainingPair) {
        self.pairs.push(pair);
    }

    pub fn extend(&mut self, pairs: impl IntoIterator<Item = TrainingPair>) {
        self.pairs.extend(pairs);
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[TrainingPair] {
        &self.pairs
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrainingPair> {
        self.pairs.iter()
    }

    /// Labels in pair order.
    pub fn labels(&self) -> Vec<u8> {
        self.pairs.iter().map(|p| p.label).collect()
    }

    /// Shuffle pair order. Labels travel with their pairs.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.pairs.shuffle(rng);
    }
}

impl<'a> IntoIterator for &'a TrainingSet {
    type Item = &'a TrainingPair;
    type IntoIter = std::slice::Iter<'a, TrainingPair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

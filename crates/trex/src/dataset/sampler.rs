//! Training pair sampling.

use super::{PairKind, Span, TrainingPair, TrainingSet};
use crate::demo::Demonstrations;
use crate::{Result, TrexError};
use rand::seq::index;
use rand::Rng;

/// Start offsets of full-trajectory pairs are drawn from `[0, FULL_TRAJ_MAX_START)`.
const FULL_TRAJ_MAX_START: usize = 6;
/// Strides of full-trajectory pairs are drawn from `[3, 7)`.
const FULL_TRAJ_STEPS: std::ops::Range<usize> = 3..7;
/// Snippets keep every second frame.
const SNIPPET_STEP: usize = 2;

/// How many pairs to sample and how long snippets may be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplingParams {
    pub num_trajs: usize,
    pub num_snippets: usize,
    pub min_snippet_length: usize,
    pub max_snippet_length: usize,
}

/// Summary of one dataset construction call.
#[derive(Clone, Debug, PartialEq)]
pub struct SamplingReport {
    /// Pairs appended by this call
    pub pairs_added: usize,
    /// Trajectory lengths per bin
    pub demo_lengths: Vec<Vec<usize>>,
    pub min_snippet_length: usize,
    /// Maximum snippet length after clamping to the shortest demonstration
    pub max_snippet_length: usize,
    /// Longest trajectory (in frames, after down-sampling) among the new pairs
    pub max_traj_length: usize,
}

/// Clamp the snippet bound to the shortest demonstration and check it.
pub(crate) fn clamp_max_snippet_length(
    demos: &Demonstrations,
    params: &SamplingParams,
) -> Result<usize> {
    let max = params.max_snippet_length.min(demos.shortest_len());
    if params.min_snippet_length == 0 || params.min_snippet_length >= max {
        return Err(TrexError::InvalidConfig(format!(
            "snippet lengths must satisfy 1 <= min < max, got min {} and clamped max {}",
            params.min_snippet_length, max
        )));
    }
    Ok(max)
}

/// Sample preference pairs from ranked demonstrations and append them to `set`.
///
/// Full-trajectory pairs take strided suffixes of two trajectories from
/// distinct bins. Snippet pairs take equal-length windows where the window of
/// the better-ranked trajectory starts no earlier than the other one.
pub fn create_training_data<R: Rng + ?Sized>(
    demos: &Demonstrations,
    params: &SamplingParams,
    rng: &mut R,
    set: &mut TrainingSet,
) -> Result<SamplingReport> {
    let num_bins = demos.num_bins();
    if num_bins < 2 {
        return Err(TrexError::TooFewBins(num_bins));
    }

    let demo_lengths = demos.demo_lengths();
    tracing::info!(?demo_lengths, "Demonstration lengths");

    let max_snippet_length = clamp_max_snippet_length(demos, params)?;
    tracing::info!(
        min = params.min_snippet_length,
        max = max_snippet_length,
        "Snippet length bounds"
    );

    let mut max_traj_length = 0;
    let before = set.len();

    for _ in 0..params.num_trajs {
        let (bi, bj) = pick_bins(num_bins, rng);
        let ti = rng.gen_range(0..demos.bin(bi).len());
        let tj = rng.gen_range(0..demos.bin(bj).len());
        let si = rng.gen_range(0..FULL_TRAJ_MAX_START);
        let sj = rng.gen_range(0..FULL_TRAJ_MAX_START);
        let step = rng.gen_range(FULL_TRAJ_STEPS);

        let len_i = demos.trajectory(bi, ti).len();
        let len_j = demos.trajectory(bj, tj).len();
        let i = Span {
            bin: bi,
            traj: ti,
            start: si.min(len_i),
            end: len_i,
            step,
        };
        let j = Span {
            bin: bj,
            traj: tj,
            start: sj.min(len_j),
            end: len_j,
            step,
        };

        max_traj_length = max_traj_length.max(i.len()).max(j.len());
        set.push(TrainingPair::new(i, j, PairKind::FullTrajectory));
    }

    for _ in 0..params.num_snippets {
        let (bi, bj) = pick_bins(num_bins, rng);
        let ti = rng.gen_range(0..demos.bin(bi).len());
        let tj = rng.gen_range(0..demos.bin(bj).len());
        let length = rng.gen_range(params.min_snippet_length..max_snippet_length);

        let len_i = demos.trajectory(bi, ti).len();
        let len_j = demos.trajectory(bj, tj).len();
        let min_length = len_i.min(len_j);

        // The preferred trajectory's snippet starts no earlier than the other one.
        let (start_i, start_j) = if bi < bj {
            let start_i = rng.gen_range(0..=min_length - length);
            (start_i, rng.gen_range(start_i..=len_j - length))
        } else {
            let start_j = rng.gen_range(0..=min_length - length);
            (rng.gen_range(start_j..=len_i - length), start_j)
        };

        let i = Span {
            bin: bi,
            traj: ti,
            start: start_i,
            end: start_i + length,
            step: SNIPPET_STEP,
        };
        let j = Span {
            bin: bj,
            traj: tj,
            start: start_j,
            end: start_j + length,
            step: SNIPPET_STEP,
        };

        max_traj_length = max_traj_length.max(i.len()).max(j.len());
        set.push(TrainingPair::new(i, j, PairKind::Snippet));
    }

    let report = SamplingReport {
        pairs_added: set.len() - before,
        demo_lengths,
        min_snippet_length: params.min_snippet_length,
        max_snippet_length,
        max_traj_length,
    };
    tracing::info!(
        added = report.pairs_added,
        total = set.len(),
        max_traj_length,
        "Created training data"
    );
    Ok(report)
}

/// Two distinct bins in random order.
fn pick_bins<R: Rng + ?Sized>(num_bins: usize, rng: &mut R) -> (usize, usize) {
    let picked = index::sample(rng, num_bins, 2);
    (picked.index(0), picked.index(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::{LearningReturn, Trajectory};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn demos(lengths: &[usize]) -> Demonstrations {
        let bins = lengths
            .iter()
            .enumerate()
            .map(|(b, &len)| {
                vec![Trajectory::from_rows((0..len).map(|t| vec![b as f32, t as f32]).collect())
                    .unwrap()]
            })
            .collect();
        let returns = (0..lengths.len())
            .map(|b| LearningReturn::new(b as f64, b as i64))
            .collect();
        Demonstrations::new(bins, returns).unwrap()
    }

    fn params(num_trajs: usize, num_snippets: usize, min: usize, max: usize) -> SamplingParams {
        SamplingParams {
            num_trajs,
            num_snippets,
            min_snippet_length: min,
            max_snippet_length: max,
        }
    }

    #[test]
    fn test_pick_bins_distinct() {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..200 {
            let (a, b) = pick_bins(3, &mut rng);
            assert_ne!(a, b);
            assert!(a < 3 && b < 3);
        }
    }

    #[test]
    fn test_max_snippet_length_clamped_to_shortest_demo() {
        let demos = demos(&[12, 40]);
        let mut rng = StdRng::seed_from_u64(1);
        let mut set = TrainingSet::new();
        let report =
            create_training_data(&demos, &params(0, 100, 2, 50), &mut rng, &mut set).unwrap();

        assert_eq!(report.max_snippet_length, 12);
        for pair in &set {
            let length = pair.i.end - pair.i.start;
            assert!((2..12).contains(&length));
        }
    }

    #[test]
    fn test_min_not_below_clamped_max_is_fatal() {
        let demos = demos(&[8, 40]);
        let mut rng = StdRng::seed_from_u64(1);
        let mut set = TrainingSet::new();
        let result = create_training_data(&demos, &params(0, 5, 10, 50), &mut rng, &mut set);
        assert!(matches!(result, Err(TrexError::InvalidConfig(_))));
        assert!(set.is_empty());
    }

    #[test]
    fn test_full_trajectory_pairs() {
        let demos = demos(&[30, 40, 50]);
        let mut rng = StdRng::seed_from_u64(2);
        let mut set = TrainingSet::new();
        create_training_data(&demos, &params(40, 0, 5, 20), &mut rng, &mut set).unwrap();

        assert_eq!(set.len(), 40);
        for pair in &set {
            assert_eq!(pair.kind, PairKind::FullTrajectory);
            assert_ne!(pair.i.bin, pair.j.bin);
            assert_eq!(pair.i.step, pair.j.step);
            assert!((3..7).contains(&pair.i.step));
            assert!(pair.i.start < 6 && pair.j.start < 6);
            assert_eq!(pair.i.end, demos.trajectory(pair.i.bin, pair.i.traj).len());
            assert_eq!(pair.j.end, demos.trajectory(pair.j.bin, pair.j.traj).len());
            assert_eq!(pair.label, u8::from(pair.i.bin <= pair.j.bin));
        }
    }

    #[test]
    fn test_snippets_respect_progress_prior() {
        let demos = demos(&[25, 60, 33, 90]);
        let mut rng = StdRng::seed_from_u64(3);
        let mut set = TrainingSet::new();
        create_training_data(&demos, &params(0, 500, 4, 20), &mut rng, &mut set).unwrap();

        for pair in &set {
            assert_eq!(pair.i.len(), pair.j.len());
            assert_eq!(pair.i.end - pair.i.start, pair.j.end - pair.j.start);
            let (worse, better) = if pair.i.bin < pair.j.bin {
                (pair.i, pair.j)
            } else {
                (pair.j, pair.i)
            };
            assert!(better.start >= worse.start);
            assert!(worse.end <= demos.trajectory(worse.bin, worse.traj).len());
            assert!(better.end <= demos.trajectory(better.bin, better.traj).len());
        }
    }

    #[test]
    fn test_construction_is_additive() {
        let demos = demos(&[30, 30]);
        let mut rng = StdRng::seed_from_u64(4);
        let mut set = TrainingSet::new();
        let p = params(3, 7, 5, 20);
        create_training_data(&demos, &p, &mut rng, &mut set).unwrap();
        let report = create_training_data(&demos, &p, &mut rng, &mut set).unwrap();
        assert_eq!(report.pairs_added, 10);
        assert_eq!(set.len(), 20);
    }

    #[test]
    fn test_same_seed_same_pairs() {
        let demos = demos(&[30, 45, 60]);
        let p = params(5, 20, 5, 20);

        let mut a = TrainingSet::new();
        let mut b = TrainingSet::new();
        create_training_data(&demos, &p, &mut StdRng::seed_from_u64(9), &mut a).unwrap();
        create_training_data(&demos, &p, &mut StdRng::seed_from_u64(9), &mut b).unwrap();
        assert_eq!(a.pairs(), b.pairs());
    }

    #[test]
    fn test_full_trajectory_start_clamped_to_short_demo() {
        let demos = demos(&[3, 3]);
        let mut rng = StdRng::seed_from_u64(2);
        let mut set = TrainingSet::new();
        create_training_data(&demos, &params(200, 0, 1, 3), &mut rng, &mut set).unwrap();

        let spans: Vec<Span> = set.iter().flat_map(|p| [p.i, p.j]).collect();
        assert!(spans.iter().all(|s| s.start <= s.end && s.end == 3));

        let empty: Vec<&Span> = spans.iter().filter(|s| s.start == s.end).collect();
        assert!(!empty.is_empty());
        for span in empty {
            assert_eq!(span.len(), 0);
            assert_eq!(demos.stack(span).unwrap().shape(), &[0, 2]);
        }
    }
}

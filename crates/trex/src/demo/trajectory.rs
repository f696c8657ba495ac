//! Trajectories and ranked demonstration bins.

use crate::dataset::Span;
use crate::{Result, TrexError};
use ndarray::{ArrayD, ArrayView, Axis, IxDyn};
use serde::{Deserialize, Serialize};

/// A recorded episode: observation frames of one fixed shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ArrayD<f32>>", into = "Vec<ArrayD<f32>>")]
pub struct Trajectory {
    frames: Vec<ArrayD<f32>>,
}

impl Trajectory {
    /// Create a trajectory, checking that all frames share one shape.
    pub fn new(frames: Vec<ArrayD<f32>>) -> Result<Self> {
        if let Some(first) = frames.first() {
            let expected = first.shape();
            if let Some(bad) = frames.iter().find(|f| f.shape() != expected) {
                return Err(TrexError::ShapeMismatch {
                    expected: expected.to_vec(),
                    actual: bad.shape().to_vec(),
                });
            }
        }
        Ok(Self { frames })
    }

    /// Create a trajectory of flat observation vectors.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let frames = rows
            .into_iter()
            .map(|row| {
                let n = row.len();
                ArrayD::from_shape_vec(IxDyn(&[n]), row)
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Self::new(frames)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[ArrayD<f32>] {
        &self.frames
    }

    /// Shape of a single frame, `None` for an empty trajectory.
    pub fn frame_shape(&self) -> Option<&[usize]> {
        self.frames.first().map(|f| f.shape())
    }

    /// Stack every `step`-th frame of `[start, end)` into a `[T, ...frame]` array.
    pub fn stack_range(&self, start: usize, end: usize, step: usize) -> Result<ArrayD<f32>> {
        let end = end.min(self.frames.len());
        let start = start.min(end);
        let views: Vec<ArrayView<f32, IxDyn>> = self.frames[start..end]
            .iter()
            .step_by(step.max(1))
            .map(|f| f.view())
            .collect();

        if views.is_empty() {
            let mut shape = vec![0];
            shape.extend_from_slice(self.frame_shape().unwrap_or(&[]));
            return Ok(ArrayD::zeros(IxDyn(&shape)));
        }
        Ok(ndarray::stack(Axis(0), &views)?)
    }

    /// Stack all frames.
    pub fn stack(&self) -> Result<ArrayD<f32>> {
        self.stack_range(0, self.len(), 1)
    }
}

impl TryFrom<Vec<ArrayD<f32>>> for Trajectory {
    type Error = TrexError;

    fn try_from(frames: Vec<ArrayD<f32>>) -> Result<Self> {
        Self::new(frames)
    }
}

impl From<Trajectory> for Vec<ArrayD<f32>> {
    fn from(traj: Trajectory) -> Self {
        traj.frames
    }
}

/// Ground-truth return of a bin, used to order bins for reporting.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LearningReturn {
    #[serde(rename = "return")]
    pub episode_return: f64,
    /// Identifier of the source (e.g. policy checkpoint index)
    pub id: i64,
}

impl LearningReturn {
    pub fn new(episode_return: f64, id: i64) -> Self {
        Self { episode_return, id }
    }
}

/// Demonstrations partitioned into bins.
///
/// Bin index is the preference rank: a trajectory in bin `j` is preferred
/// over one in bin `i` whenever `i < j`.
#[derive(Clone, Debug)]
pub struct Demonstrations {
    bins: Vec<Vec<Trajectory>>,
    learning_returns: Vec<LearningReturn>,
}

impl Demonstrations {
    /// Create demonstrations from bins and one learning return per bin.
    pub fn new(bins: Vec<Vec<Trajectory>>, learning_returns: Vec<LearningReturn>) -> Result<Self> {
        if bins.len() < 2 {
            return Err(TrexError::TooFewBins(bins.len()));
        }
        if learning_returns.len() != bins.len() {
            return Err(TrexError::InvalidDemonstrations(format!(
                "{} bins but {} learning returns",
                bins.len(),
                learning_returns.len()
            )));
        }

        let mut frame_shape: Option<&[usize]> = None;
        for (b, bin) in bins.iter().enumerate() {
            if bin.is_empty() {
                return Err(TrexError::InvalidDemonstrations(format!("bin {} is empty", b)));
            }
            for (t, traj) in bin.iter().enumerate() {
                let shape = traj.frame_shape().ok_or_else(|| {
                    TrexError::InvalidDemonstrations(format!(
                        "trajectory {} of bin {} is empty",
                        t, b
                    ))
                })?;
                match frame_shape {
                    None => frame_shape = Some(shape),
                    Some(expected) if expected != shape => {
                        return Err(TrexError::ShapeMismatch {
                            expected: expected.to_vec(),
                            actual: shape.to_vec(),
                        })
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(Self {
            bins,
            learning_returns,
        })
    }

    pub fn num_bins(&self) -> usize {
        self.bins.len()
    }

    pub fn bins(&self) -> &[Vec<Trajectory>] {
        &self.bins
    }

    pub fn bin(&self, bin: usize) -> &[Trajectory] {
        &self.bins[bin]
    }

    pub fn trajectory(&self, bin: usize, traj: usize) -> &Trajectory {
        &self.bins[bin][traj]
    }

    pub fn learning_returns(&self) -> &[LearningReturn] {
        &self.learning_returns
    }

    /// Shape shared by every frame.
    pub fn frame_shape(&self) -> &[usize] {
        // Non-empty bins of non-empty trajectories are checked in `new`.
        self.bins[0][0].frame_shape().unwrap_or(&[])
    }

    /// Lengths of every trajectory, per bin.
    pub fn demo_lengths(&self) -> Vec<Vec<usize>> {
        self.bins
            .iter()
            .map(|bin| bin.iter().map(Trajectory::len).collect())
            .collect()
    }

    /// Length of the shortest trajectory across all bins.
    pub fn shortest_len(&self) -> usize {
        self.bins
            .iter()
            .flatten()
            .map(Trajectory::len)
            .min()
            .unwrap_or(0)
    }

    /// Bin indices ordered by increasing ground-truth return.
    pub fn ranked_by_return(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.bins.len()).collect();
        order.sort_by(|&a, &b| {
            self.learning_returns[a]
                .episode_return
                .total_cmp(&self.learning_returns[b].episode_return)
        });
        order
    }

    /// Materialize the frames a span points at.
    pub fn stack(&self, span: &Span) -> Result<ArrayD<f32>> {
        self.trajectory(span.bin, span.traj)
            .stack_range(span.start, span.end, span.step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn traj(len: usize, value: f32) -> Trajectory {
        Trajectory::from_rows((0..len).map(|i| vec![value, i as f32]).collect()).unwrap()
    }

    #[test]
    fn test_mixed_frame_shapes_rejected() {
        let frames = vec![
            ArrayD::zeros(IxDyn(&[2])),
            ArrayD::zeros(IxDyn(&[3])),
        ];
        assert!(matches!(
            Trajectory::new(frames),
            Err(TrexError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_stack_range_with_stride() {
        let t = traj(10, 1.0);
        let stacked = t.stack_range(1, 8, 3).unwrap();
        assert_eq!(stacked.shape(), &[3, 2]);
        assert_eq!(stacked[[0, 1]], 1.0);
        assert_eq!(stacked[[1, 1]], 4.0);
        assert_eq!(stacked[[2, 1]], 7.0);
    }

    #[test]
    fn test_stack_empty_range_keeps_frame_shape() {
        let t = traj(4, 0.0);
        let stacked = t.stack_range(6, 10, 2).unwrap();
        assert_eq!(stacked.shape(), &[0, 2]);
    }

    #[test]
    fn test_single_bin_rejected() {
        let result = Demonstrations::new(vec![vec![traj(5, 0.0)]], vec![LearningReturn::new(1.0, 0)]);
        assert!(matches!(result, Err(TrexError::TooFewBins(1))));
    }

    #[test]
    fn test_returns_must_match_bins() {
        let result = Demonstrations::new(
            vec![vec![traj(5, 0.0)], vec![traj(5, 1.0)]],
            vec![LearningReturn::new(1.0, 0)],
        );
        assert!(matches!(result, Err(TrexError::InvalidDemonstrations(_))));
    }

    #[test]
    fn test_lengths_and_ranking() {
        let demos = Demonstrations::new(
            vec![
                vec![traj(12, 0.0), traj(7, 0.0)],
                vec![traj(9, 1.0)],
                vec![traj(30, 2.0)],
            ],
            vec![
                LearningReturn::new(50.0, 0),
                LearningReturn::new(-3.0, 1),
                LearningReturn::new(80.0, 2),
            ],
        )
        .unwrap();

        assert_eq!(demos.demo_lengths(), vec![vec![12, 7], vec![9], vec![30]]);
        assert_eq!(demos.shortest_len(), 7);
        assert_eq!(demos.frame_shape(), &[2]);
        assert_eq!(demos.ranked_by_return(), vec![1, 0, 2]);
    }

    #[test]
    fn test_trajectory_json_is_frame_list() {
        let t = traj(3, 2.0);
        let json = serde_json::to_string(&t).unwrap();
        let restored: Trajectory = serde_json::from_str(&json).unwrap();
        assert_eq!(t, restored);
    }
}

use rand::rngs::StdRng;
use rand::SeedableRng;
use trex::dataset::{create_training_data, PairKind, SamplingParams, TrainingSet};
use trex::demo::{DemoStore, Demonstrations, LearningReturn, Trajectory};
use trex::TrexError;

fn ranked_demos(lengths: &[usize]) -> Demonstrations {
    let bins = lengths
        .iter()
        .enumerate()
        .map(|(b, &len)| {
            let rows = (0..len).map(|t| vec![b as f32, t as f32, 0.5]).collect();
            vec![Trajectory::from_rows(rows).unwrap()]
        })
        .collect();
    let returns = (0..lengths.len())
        .map(|b| LearningReturn::new(100.0 * b as f64, b as i64))
        .collect();
    Demonstrations::new(bins, returns).unwrap()
}

#[test]
fn test_three_bin_snippet_scenario() {
    let demos = ranked_demos(&[50, 60, 70]);
    let params = SamplingParams {
        num_trajs: 0,
        num_snippets: 10,
        min_snippet_length: 5,
        max_snippet_length: 20,
    };
    let mut rng = StdRng::seed_from_u64(42);
    let mut set = TrainingSet::new();

    let report = create_training_data(&demos, &params, &mut rng, &mut set).unwrap();

    assert_eq!(set.len(), 10);
    assert_eq!(report.pairs_added, 10);
    assert_eq!(report.max_snippet_length, 20);
    assert_eq!(report.demo_lengths, vec![vec![50], vec![60], vec![70]]);

    for pair in &set {
        assert_eq!(pair.kind, PairKind::Snippet);

        let raw_length = pair.i.end - pair.i.start;
        assert!((5..20).contains(&raw_length));
        assert_eq!(pair.j.end - pair.j.start, raw_length);

        let frames_i = demos.stack(&pair.i).unwrap();
        let frames_j = demos.stack(&pair.j).unwrap();
        assert_eq!(frames_i.shape()[0], frames_j.shape()[0]);
        assert_eq!(frames_i.shape()[0], raw_length.div_ceil(2));
        assert!(report.max_traj_length >= frames_i.shape()[0]);

        assert!(pair.label <= 1);
        assert_eq!(pair.label == 1, pair.i.bin <= pair.j.bin);

        // Frames carry their bin index and time step.
        assert_eq!(frames_i[[0, 0]], pair.i.bin as f32);
        assert_eq!(frames_i[[0, 1]], pair.i.start as f32);
        if frames_i.shape()[0] > 1 {
            assert_eq!(frames_i[[1, 1]], (pair.i.start + 2) as f32);
        }
    }
}

#[test]
fn test_progress_prior_with_many_trajectories_per_bin() {
    let bins = (0..4)
        .map(|b| {
            (0..3)
                .map(|t| {
                    let len = 20 + 7 * t + 3 * b;
                    Trajectory::from_rows((0..len).map(|i| vec![i as f32]).collect()).unwrap()
                })
                .collect()
        })
        .collect();
    let returns = (0..4).map(|b| LearningReturn::new(b as f64, b)).collect();
    let demos = Demonstrations::new(bins, returns).unwrap();

    let params = SamplingParams {
        num_trajs: 25,
        num_snippets: 300,
        min_snippet_length: 3,
        max_snippet_length: 64,
    };
    let mut set = TrainingSet::new();
    let report =
        create_training_data(&demos, &params, &mut StdRng::seed_from_u64(5), &mut set).unwrap();

    assert_eq!(report.max_snippet_length, 20);
    assert_eq!(set.len(), 325);
    assert_eq!(
        set.iter().filter(|p| p.kind == PairKind::FullTrajectory).count(),
        25
    );

    for pair in set.iter().filter(|p| p.kind == PairKind::Snippet) {
        let (worse, better) = if pair.i.bin < pair.j.bin {
            (pair.i, pair.j)
        } else {
            (pair.j, pair.i)
        };
        assert!(better.start >= worse.start);
        assert_eq!(pair.i.len(), pair.j.len());
        assert!(pair.i.end - pair.i.start < 20);
    }
}

#[test]
fn test_single_bin_store_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let frame = |x: f32| serde_json::json!({ "v": 1, "dim": [1], "data": [x] });
    let episodes = serde_json::json!([[[frame(0.0), frame(1.0), frame(2.0)]]]);
    let returns = serde_json::json!([{ "return": 1.0, "id": 0 }]);
    std::fs::write(dir.path().join("episodes_data.json"), episodes.to_string()).unwrap();
    std::fs::write(dir.path().join("learning_returns.json"), returns.to_string()).unwrap();

    let result = DemoStore::new(dir.path()).load();
    assert!(matches!(result, Err(TrexError::TooFewBins(1))));
}

//! On-disk demonstrations inside an experiment directory.

use super::{Demonstrations, LearningReturn, Trajectory};
use crate::{Result, TrexError};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Bins of trajectories: `[[[frame, ...], ...], ...]`, frames in ndarray's serde layout.
pub const EPISODES_FILE: &str = "episodes_data.json";
/// One `{ "return": f64, "id": i64 }` record per bin.
pub const RETURNS_FILE: &str = "learning_returns.json";

/// Reads and writes the two demonstration artifacts of an experiment.
#[derive(Clone, Debug)]
pub struct DemoStore {
    dir: PathBuf,
}

impl DemoStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn episodes_path(&self) -> PathBuf {
        self.dir.join(EPISODES_FILE)
    }

    pub fn returns_path(&self) -> PathBuf {
        self.dir.join(RETURNS_FILE)
    }

    /// Whether both artifacts are present.
    pub fn exists(&self) -> bool {
        self.episodes_path().is_file() && self.returns_path().is_file()
    }

    /// Load and validate the demonstrations.
    pub fn load(&self) -> Result<Demonstrations> {
        let bins: Vec<Vec<Trajectory>> = read_json(&self.episodes_path())?;
        let learning_returns: Vec<LearningReturn> = read_json(&self.returns_path())?;

        tracing::info!(
            dir = %self.dir.display(),
            bins = bins.len(),
            trajectories = bins.iter().map(Vec::len).sum::<usize>(),
            "Loaded demonstrations"
        );

        Demonstrations::new(bins, learning_returns)
    }

    /// Write both artifacts, creating the directory if needed.
    pub fn save(&self, demos: &Demonstrations) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let file = File::create(self.episodes_path())?;
        serde_json::to_writer(BufWriter::new(file), demos.bins())?;

        let file = File::create(self.returns_path())?;
        serde_json::to_writer_pretty(BufWriter::new(file), demos.learning_returns())?;

        tracing::debug!(dir = %self.dir.display(), "Saved demonstrations");
        Ok(())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.is_file() {
        return Err(TrexError::MissingDemonstrations {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

use crate::error::{Error, Result};
use crate::population::Population;
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Values of one quantity for every agent at a single tick, as `(agent id, value)` pairs.
pub type Snapshot = Vec<(usize, f64)>;

/// Append-only record of the population state after every tick.
///
/// Opinion, attention and information are stored as three parallel
/// series of [`Snapshot`]s laid out in population order.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct DataRecorder {
    ticks: Vec<usize>,
    opinion: Vec<Snapshot>,
    attention: Vec<Snapshot>,
    information: Vec<Snapshot>,
}

impl DataRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the current state of `pop`, taken at `tick`.
    pub fn record(&mut self, tick: usize, pop: &Population) {
        self.ticks.push(tick);
        self.opinion
            .push(pop.iter().map(|agt| (agt.id(), agt.opinion)).collect());
        self.attention
            .push(pop.iter().map(|agt| (agt.id(), agt.attention)).collect());
        self.information
            .push(pop.iter().map(|agt| (agt.id(), agt.information)).collect());
    }

    /// Number of recorded snapshots.
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Tick at which each snapshot was taken.
    pub fn ticks(&self) -> &[usize] {
        &self.ticks
    }

    pub fn opinion(&self) -> &[Snapshot] {
        &self.opinion
    }

    pub fn attention(&self) -> &[Snapshot] {
        &self.attention
    }

    pub fn information(&self) -> &[Snapshot] {
        &self.information
    }

    /// Write the recorded trajectory to a MessagePack file.
    pub fn save<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let io_err = |source| Error::Io {
            path: file.to_path_buf(),
            source,
        };
        let bytes = encode::to_vec_named(self)
            .map_err(|err| Error::Format(format!("failed to serialize trajectory: {err}")))?;
        let mut writer = BufWriter::new(File::create(file).map_err(io_err)?);
        writer.write_all(&bytes).map_err(io_err)?;
        writer.flush().map_err(io_err)?;
        Ok(())
    }

    /// Read a trajectory written by [`DataRecorder::save`].
    pub fn load<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let reader = File::open(file).map_err(|source| Error::Io {
            path: file.to_path_buf(),
            source,
        })?;
        decode::from_read(BufReader::new(reader))
            .map_err(|err| Error::Format(format!("failed to deserialize trajectory {file:?}: {err}")))
    }
}

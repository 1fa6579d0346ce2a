use crate::config::Config;
use crate::dynamics;
use crate::error::{Error, Result};
use crate::network::Network;
use crate::population::Population;
use crate::recorder::DataRecorder;
use crate::scheduler;
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Simulation engine.
///
/// Holds the configuration, the population, the random number generator and
/// the tick counter, and records a snapshot of the population after every tick.
#[derive(Serialize, Deserialize)]
pub struct Engine {
    cfg: Config,
    pop: Population,
    rng: ChaCha12Rng,
    tick: usize,

    #[serde(skip)]
    recorder: DataRecorder,
}

impl Engine {
    /// Create a new `Engine`: build the network and populate it.
    ///
    /// # Errors
    /// Fails on any configuration problem, including an agent count that
    /// does not match the number of network nodes, before any tick runs.
    pub fn new(cfg: Config) -> Result<Self> {
        cfg.validate()?;

        let seed = match cfg.run.seed {
            Some(seed) => seed,
            None => {
                let seed = rand::rng().random();
                log::info!("no seed configured, using {seed}");
                seed
            }
        };
        let mut rng = ChaCha12Rng::seed_from_u64(seed);

        let n_agt = cfg.population_size();
        let network = Network::build(n_agt, &cfg.network, &mut rng)?;
        let pop = Population::new(&network, &cfg.agents, &mut rng)?;
        log::info!(
            "created {} agents on a network with {} edges",
            pop.len(),
            network.edge_count()
        );

        Ok(Self {
            cfg,
            pop,
            rng,
            tick: 0,
            recorder: DataRecorder::new(),
        })
    }

    /// Run `step_count` ticks.
    ///
    /// The current state is recorded first if nothing has been recorded yet,
    /// so a fresh engine ends with `step_count + 1` snapshots.
    pub fn run(&mut self, step_count: usize) -> Result<()> {
        if self.recorder.is_empty() {
            self.recorder.record(self.tick, &self.pop);
        }

        let log_every = (step_count / 10).max(1);
        for i_step in 0..step_count {
            self.step()?;

            if (i_step + 1) % log_every == 0 || i_step + 1 == step_count {
                let progress = 100.0 * (i_step + 1) as f64 / step_count as f64;
                log::info!("completed {progress:06.2}%");
            }
        }

        Ok(())
    }

    /// Perform a single tick and record its result.
    pub fn step(&mut self) -> Result<()> {
        let par = &self.cfg.model;

        let active = scheduler::select_active(&self.pop, &mut self.rng)
            .map_err(|err| tick_error(err, self.tick + 1))?;

        let chosen = dynamics::interact(&mut self.pop, active, par, &mut self.rng)?;
        if chosen.is_none() {
            log::trace!("agent {active} has no neighbors, skipping interaction");
        }

        dynamics::integrate(&mut self.pop, par, &mut self.rng)
            .map_err(|err| tick_error(err, self.tick + 1))?;

        self.tick += 1;
        self.recorder.record(self.tick, &self.pop);

        Ok(())
    }

    pub fn cfg(&self) -> &Config {
        &self.cfg
    }

    pub fn population(&self) -> &Population {
        &self.pop
    }

    /// Number of ticks performed since the engine was created.
    pub fn tick(&self) -> usize {
        self.tick
    }

    pub fn recorder(&self) -> &DataRecorder {
        &self.recorder
    }

    /// Hand over the recorded snapshots, leaving an empty recorder behind.
    pub fn take_recorder(&mut self) -> DataRecorder {
        std::mem::take(&mut self.recorder)
    }

    /// Save a checkpoint of the entire engine state, except the recorder.
    ///
    /// Can be used to resume the simulation later.
    pub fn save_checkpoint<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let io_err = |source| Error::Io {
            path: file.to_path_buf(),
            source,
        };
        let bytes = encode::to_vec_named(self)
            .map_err(|err| Error::Format(format!("failed to serialize engine: {err}")))?;
        let mut writer = BufWriter::new(File::create(file).map_err(io_err)?);
        writer.write_all(&bytes).map_err(io_err)?;
        writer.flush().map_err(io_err)?;
        Ok(())
    }

    /// Load a previously saved engine checkpoint.
    pub fn load_checkpoint<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let reader = File::open(file).map_err(|source| Error::Io {
            path: file.to_path_buf(),
            source,
        })?;
        let engine = decode::from_read(BufReader::new(reader))
            .map_err(|err| Error::Format(format!("failed to deserialize engine: {err}")))?;
        Ok(engine)
    }
}

fn tick_error(err: Error, tick: usize) -> Error {
    match err {
        Error::Arithmetic(msg) => Error::Arithmetic(format!("tick {tick}: {msg}")),
        other => other,
    }
}

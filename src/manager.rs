use anyhow::{Context, Result, bail};
use glob::glob;
use hiom::{Config, Engine};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    pub fn create_run(&self) -> Result<()> {
        let run_idx = self.count_run_dirs().context("failed to count run dirs")?;

        let run_dir = self.run_dir(run_idx);
        fs::create_dir_all(&run_dir).with_context(|| format!("failed to create {run_dir:?}"))?;
        log::info!("created {run_dir:?}");

        let engine = Engine::new(self.cfg.clone()).context("failed to construct engine")?;

        self.run_simulation(run_idx, 0, engine)
    }

    pub fn resume_run(&self, run_idx: usize) -> Result<()> {
        let run_dir = self.run_dir(run_idx);
        if !run_dir.is_dir() {
            bail!("{run_dir:?} does not exist");
        }

        let file_idx = self
            .count_trajectory_files(run_idx)
            .context("failed to count trajectory files")?;

        let checkpoint_file = self.checkpoint_file(run_idx);
        let engine = Engine::load_checkpoint(&checkpoint_file)
            .with_context(|| format!("failed to load {checkpoint_file:?}"))?;
        if engine.cfg() != &self.cfg {
            bail!("checkpoint config differs from the current config");
        }
        log::info!("loaded {checkpoint_file:?} at tick {}", engine.tick());

        self.run_simulation(run_idx, file_idx, engine)
    }

    pub fn clean_sim(&self) -> Result<()> {
        let n_runs = self.count_run_dirs().context("failed to count run dirs")?;
        for run_idx in 0..n_runs {
            let run_dir = self.run_dir(run_idx);
            fs::remove_dir_all(&run_dir)
                .with_context(|| format!("failed to remove {run_dir:?}"))?;
            log::info!("removed {run_dir:?}");
        }
        Ok(())
    }

    fn run_simulation(&self, run_idx: usize, file_idx: usize, mut engine: Engine) -> Result<()> {
        engine
            .run(self.cfg.run.step_count)
            .context("failed to run simulation")?;

        let trajectory_file = self.trajectory_file(run_idx, file_idx);
        engine
            .take_recorder()
            .save(&trajectory_file)
            .with_context(|| format!("failed to save {trajectory_file:?}"))?;
        log::info!("saved {trajectory_file:?}");

        engine
            .save_checkpoint(self.checkpoint_file(run_idx))
            .context("failed to save checkpoint")?;

        Ok(())
    }

    fn count_run_dirs(&self) -> Result<usize> {
        let pattern = self.sim_dir.join("run-*");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let count = glob(pattern)
            .context("failed to glob run dirs")?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .count();
        Ok(count)
    }

    fn run_dir(&self, run_idx: usize) -> PathBuf {
        self.sim_dir.join(format!("run-{run_idx:04}"))
    }

    fn count_trajectory_files(&self, run_idx: usize) -> Result<usize> {
        let pattern = self.run_dir(run_idx).join("trajectory-*.msgpack");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let count = glob(pattern)
            .context("failed to glob trajectory files")?
            .filter_map(Result::ok)
            .count();
        Ok(count)
    }

    fn checkpoint_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("checkpoint.msgpack")
    }

    fn trajectory_file(&self, run_idx: usize, file_idx: usize) -> PathBuf {
        self.run_dir(run_idx)
            .join(format!("trajectory-{file_idx:04}.msgpack"))
    }
}

use crate::error::{Error, Result};
use crate::generator::{AgentType, Generator};
use crate::network::Topology;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Parameters of the update equations.
    #[serde(default)]
    pub model: ModelParams,

    /// Network topology.
    #[serde(default)]
    pub network: Topology,

    /// Agent types used to populate the network.
    #[serde(default = "default_agents")]
    pub agents: Vec<AgentType>,

    /// Run length and random seed.
    #[serde(default)]
    pub run: RunParams,
}

/// Parameters of the attention, information and opinion dynamics.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// Integration time step.
    ///
    /// The opinion step is explicit, so it is only stable while
    /// `dt * (3 * opinion^2 - (attention - a_min))` stays below about `2`.
    /// With opinions of order one, keep `dt` at `0.1` or below.
    pub dt: f64,
    /// Attention gained by both agents of an interaction, and the scale of passive decay.
    pub attention_delta: f64,
    /// Sensitivity of the information transfer to relative attention.
    pub persuasion: f64,
    /// Attention threshold above which the opinion potential becomes bistable.
    pub a_min: f64,
    /// Minimum weight the receiver keeps on its own information.
    pub r_min: f64,
    /// Standard deviation of the opinion noise.
    pub sd_opinion: f64,
    /// Standard deviation of the information transfer noise.
    pub sd_info: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            dt: 0.1,
            attention_delta: 0.1,
            persuasion: 1.0,
            a_min: -0.5,
            r_min: 0.05,
            sd_opinion: 0.15,
            sd_info: 0.005,
        }
    }
}

/// Parameters controlling a single run.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunParams {
    /// Number of ticks performed by each run.
    pub step_count: usize,
    /// Seed of the random number generator (drawn from the OS when absent).
    pub seed: Option<u64>,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            step_count: 500,
            seed: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelParams::default(),
            network: Topology::default(),
            agents: default_agents(),
            run: RunParams::default(),
        }
    }
}

fn default_agents() -> Vec<AgentType> {
    vec![
        AgentType {
            count: 50,
            generator: Generator::Undecided,
        },
        AgentType {
            count: 10,
            generator: Generator::Partisan,
        },
    ]
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// Relative edge-list paths are resolved against the directory of the file.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the file cannot be read and
    /// [`Error::Configuration`] if it cannot be parsed or fails validation.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents = fs::read_to_string(file).map_err(|source| Error::Io {
            path: file.to_path_buf(),
            source,
        })?;

        let mut config = Self::parse(&contents)?;
        if let Some(dir) = file.parent() {
            config.network.resolve_paths(dir);
        }

        Ok(config)
    }

    /// Parse and validate a [`Config`] from a TOML string.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)
            .map_err(|err| Error::config(format!("failed to deserialize config: {err}")))?;

        config.validate()?;

        Ok(config)
    }

    /// Check every parameter that does not depend on the network size.
    pub fn validate(&self) -> Result<()> {
        let par = &self.model;
        check_num(par.dt, 0.0..=1.0).map_err(|e| e.in_param("time step"))?;
        check_num(par.attention_delta, 0.0..=1.0).map_err(|e| e.in_param("attention delta"))?;
        check_finite(par.persuasion).map_err(|e| e.in_param("persuasion"))?;
        check_finite(par.a_min).map_err(|e| e.in_param("attention threshold"))?;
        check_num(par.r_min, 0.0..=1.0).map_err(|e| e.in_param("minimum persuasion weight"))?;
        check_num(par.sd_opinion, 0.0..f64::INFINITY)
            .map_err(|e| e.in_param("opinion noise standard deviation"))?;
        check_num(par.sd_info, 0.0..f64::INFINITY)
            .map_err(|e| e.in_param("information noise standard deviation"))?;

        self.network
            .validate()
            .map_err(|e| e.in_param("network parameters"))?;

        if self.agents.is_empty() {
            return Err(Error::config("at least one agent type is required"));
        }
        for (i_type, agent_type) in self.agents.iter().enumerate() {
            agent_type
                .generator
                .validate()
                .map_err(|e| e.in_param(&format!("generator of agent type {i_type}")))?;
        }
        if self.population_size() == 0 {
            return Err(Error::config("total number of agents must be positive"));
        }

        Ok(())
    }

    /// Total number of agents requested by the agent types.
    pub fn population_size(&self) -> usize {
        self.agents.iter().map(|agent_type| agent_type.count).sum()
    }
}

pub(crate) fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        return Err(Error::config(format!(
            "number must be in the range {range:?}, but is {num:?}"
        )));
    }
    Ok(())
}

pub(crate) fn check_finite(num: f64) -> Result<()> {
    if !num.is_finite() {
        return Err(Error::config(format!("number must be finite, but is {num:?}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::ValueDistribution;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = Config::parse("").unwrap();
        assert_eq!(cfg.model, ModelParams::default());
        assert_eq!(cfg.network, Topology::Er { p: 0.1 });
        assert_eq!(cfg.population_size(), 60);
        assert_eq!(cfg.run.step_count, 500);
        assert_eq!(cfg.run.seed, None);
    }

    #[test]
    fn full_file() {
        let cfg = Config::parse(
            r#"
[model]
dt = 0.05
attention_delta = 0.2
persuasion = 10.0

[network]
method = "ws"
k = 4
p = 0.2

[[agents]]
count = 5
generator = { kind = "uniform" }

[[agents]]
count = 7
generator = { kind = "custom", opinion = { dist = "constant", value = 0.5 }, attention = { dist = "uniform", low = 0.0, high = 1.0 }, information = { dist = "normal", mean = 0.0, std_dev = 0.1 } }

[run]
step_count = 20
seed = 7
"#,
        )
        .unwrap();

        assert_eq!(cfg.model.dt, 0.05);
        assert_eq!(cfg.model.attention_delta, 0.2);
        assert_eq!(cfg.model.persuasion, 10.0);
        assert_eq!(cfg.model.a_min, -0.5);
        assert_eq!(cfg.network, Topology::Ws { k: 4, p: 0.2 });
        assert_eq!(cfg.population_size(), 12);
        assert_eq!(
            cfg.agents[1].generator,
            Generator::Custom {
                opinion: ValueDistribution::Constant { value: 0.5 },
                attention: ValueDistribution::Uniform {
                    low: 0.0,
                    high: 1.0
                },
                information: ValueDistribution::Normal {
                    mean: 0.0,
                    std_dev: 0.1
                },
            }
        );
        assert_eq!(cfg.run.seed, Some(7));
    }

    #[test]
    fn unknown_method_is_a_configuration_error() {
        let err = Config::parse("[network]\nmethod = \"hypercube\"\n").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)), "{err}");
    }

    #[test]
    fn missing_method_parameter_is_a_configuration_error() {
        let err = Config::parse("[network]\nmethod = \"sb\"\nn_blocks = 2\np = 0.1\n").unwrap_err();
        assert!(matches!(err, Error::Configuration(msg) if msg.contains("`k`")));
    }

    #[test]
    fn out_of_range_parameters_are_rejected() {
        for contents in [
            "[model]\ndt = -0.1\n",
            "[model]\nr_min = 1.5\n",
            "[model]\nsd_info = -1.0\n",
            "[network]\nmethod = \"er\"\np = 1.5\n",
            "[network]\nmethod = \"ba\"\nm = 0\n",
            "agents = []\n",
            "[[agents]]\ncount = 0\ngenerator = { kind = \"uniform\" }\n",
        ] {
            let err = Config::parse(contents).unwrap_err();
            assert!(matches!(err, Error::Configuration(_)), "{contents}: {err}");
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Config::from_file("/nonexistent/hiom/config.toml").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn edge_list_path_resolves_against_config_dir() {
        let dir = std::env::temp_dir().join(format!("hiom-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("config.toml");
        fs::write(
            &file,
            "[network]\nmethod = \"social_media\"\npath = \"edges.txt\"\n",
        )
        .unwrap();

        let cfg = Config::from_file(&file).unwrap();
        assert_eq!(
            cfg.network,
            Topology::SocialMedia {
                path: dir.join("edges.txt")
            }
        );

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn check_num_reports_range() {
        let err = check_num(3, 0..2).unwrap_err();
        assert_eq!(
            err.to_string(),
            "configuration error: number must be in the range 0..2, but is 3"
        );
        assert!(check_num(f64::NAN, 0.0..1.0).is_err());
    }
}

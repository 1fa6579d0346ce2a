//! Initial agent states.
//!
//! Every agent type names a [`Generator`] that is sampled once per agent
//! when the population is created.

use crate::config::{check_finite, check_num};
use crate::error::{Error, Result};
use rand::prelude::*;
use rand_distr::{Normal, Uniform};
use serde::{Deserialize, Serialize};

/// Upper bound on rejection-sampling attempts for a truncated normal draw.
const MAX_TRUNC_ATTEMPTS: usize = 100_000;

/// Group of agents sharing the same initial-state generator.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct AgentType {
    /// Number of agents of this type.
    pub count: usize,
    /// Distribution of the initial state of each agent.
    pub generator: Generator,
}

/// Initial `(opinion, attention, information)` triple of an agent.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct InitialState {
    pub opinion: f64,
    pub attention: f64,
    pub information: f64,
}

/// Distribution of the initial state of an agent.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Generator {
    /// Opinion and information uniform in `[-1, 1)`, attention uniform in `[0, 1)`.
    Uniform,
    /// Neutral opinion, almost no attention and weak information around zero.
    Undecided,
    /// Committed agent with opinion and information at `1` and moderate attention.
    Partisan,
    /// Independent distribution for each field.
    Custom {
        opinion: ValueDistribution,
        attention: ValueDistribution,
        information: ValueDistribution,
    },
}

/// Distribution of a single scalar value.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "dist", rename_all = "snake_case")]
pub enum ValueDistribution {
    Constant {
        value: f64,
    },
    Uniform {
        low: f64,
        high: f64,
    },
    Normal {
        mean: f64,
        std_dev: f64,
    },
    /// Normal distribution restricted to `[low, high]`.
    TruncatedNormal {
        mean: f64,
        std_dev: f64,
        low: f64,
        high: f64,
    },
}

impl Generator {
    pub fn validate(&self) -> Result<()> {
        if let Generator::Custom {
            opinion,
            attention,
            information,
        } = self
        {
            opinion.validate().map_err(|e| e.in_param("opinion"))?;
            attention.validate().map_err(|e| e.in_param("attention"))?;
            information
                .validate()
                .map_err(|e| e.in_param("information"))?;
        }
        Ok(())
    }

    /// Draw an initial state.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<InitialState> {
        let state = match self {
            Generator::Uniform => InitialState {
                opinion: -1.0 + 2.0 * rng.random::<f64>(),
                attention: rng.random::<f64>(),
                information: -1.0 + 2.0 * rng.random::<f64>(),
            },
            Generator::Undecided => {
                let attention = 0.01 * rng.random::<f64>();
                let information = sample_truncated_normal(rng, 0.0, 1.0, -0.1, 0.1)?;
                InitialState {
                    opinion: 0.0,
                    attention,
                    information,
                }
            }
            Generator::Partisan => InitialState {
                opinion: 1.0,
                attention: rng.random_range(0.0..0.5),
                information: 1.0,
            },
            Generator::Custom {
                opinion,
                attention,
                information,
            } => {
                let opinion = opinion.sample(rng)?;
                let attention = attention.sample(rng)?;
                let information = information.sample(rng)?;
                InitialState {
                    opinion,
                    attention,
                    information,
                }
            }
        };
        Ok(state)
    }
}

impl ValueDistribution {
    pub fn validate(&self) -> Result<()> {
        match *self {
            ValueDistribution::Constant { value } => check_finite(value),
            ValueDistribution::Uniform { low, high } => {
                check_finite(low)?;
                check_num(high, (std::ops::Bound::Excluded(low), std::ops::Bound::Unbounded))
                    .map_err(|e| e.in_param("upper bound"))?;
                check_finite(high)
            }
            ValueDistribution::Normal { mean, std_dev } => {
                check_finite(mean)?;
                check_num(std_dev, 0.0..f64::INFINITY).map_err(|e| e.in_param("standard deviation"))
            }
            ValueDistribution::TruncatedNormal {
                mean,
                std_dev,
                low,
                high,
            } => {
                check_finite(mean)?;
                check_num(std_dev, 0.0..f64::INFINITY)
                    .map_err(|e| e.in_param("standard deviation"))?;
                check_finite(low)?;
                check_num(high, (std::ops::Bound::Excluded(low), std::ops::Bound::Unbounded))
                    .map_err(|e| e.in_param("upper bound"))?;
                check_finite(high)
            }
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        match *self {
            ValueDistribution::Constant { value } => Ok(value),
            ValueDistribution::Uniform { low, high } => {
                let dist = Uniform::new(low, high)
                    .map_err(|err| Error::config(format!("invalid uniform distribution: {err}")))?;
                Ok(dist.sample(rng))
            }
            ValueDistribution::Normal { mean, std_dev } => {
                let dist = Normal::new(mean, std_dev)
                    .map_err(|err| Error::config(format!("invalid normal distribution: {err}")))?;
                Ok(dist.sample(rng))
            }
            ValueDistribution::TruncatedNormal {
                mean,
                std_dev,
                low,
                high,
            } => sample_truncated_normal(rng, mean, std_dev, low, high),
        }
    }
}

fn sample_truncated_normal<R: Rng + ?Sized>(
    rng: &mut R,
    mean: f64,
    std_dev: f64,
    low: f64,
    high: f64,
) -> Result<f64> {
    let dist = Normal::new(mean, std_dev)
        .map_err(|err| Error::config(format!("invalid normal distribution: {err}")))?;
    for _ in 0..MAX_TRUNC_ATTEMPTS {
        let val = dist.sample(rng);
        if (low..=high).contains(&val) {
            return Ok(val);
        }
    }
    Err(Error::config(format!(
        "truncation interval [{low}, {high}] has negligible probability under N({mean}, {std_dev})"
    )))
}

//! Agents and their creation.

use crate::error::{Error, Result};
use crate::generator::AgentType;
use crate::network::{Network, NodeLabel};
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// State of a single agent.
///
/// The agent's id is its index in the [`Population`], which is also the
/// index of its node in the network it was created from.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct AgentState {
    id: usize,
    node: NodeLabel,
    pub opinion: f64,
    pub attention: f64,
    pub information: f64,
    neighbors: Vec<usize>,
}

impl AgentState {
    pub fn id(&self) -> usize {
        self.id
    }

    /// Label of the network node the agent sits on.
    pub fn node(&self) -> &NodeLabel {
        &self.node
    }

    /// Ids of the agents adjacent to this one.
    pub fn neighbors(&self) -> &[usize] {
        &self.neighbors
    }
}

/// Fixed-size, ordered collection of agents.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Population {
    agents: Vec<AgentState>,
}

impl Population {
    /// Create one agent per network node.
    ///
    /// Nodes are visited in network order. Each node picks uniformly among
    /// the agent types that still have agents left to create, so every
    /// remaining type is equally likely regardless of its count.
    ///
    /// # Errors
    /// Returns [`Error::Configuration`] if the agent counts do not add up
    /// to the number of nodes, or if a generator yields an attention that
    /// is negative or not finite.
    pub fn new<R: Rng + ?Sized>(
        network: &Network,
        agent_types: &[AgentType],
        rng: &mut R,
    ) -> Result<Self> {
        let n_agt: usize = agent_types.iter().map(|agent_type| agent_type.count).sum();
        let n_nodes = network.node_count();
        if n_agt != n_nodes {
            return Err(Error::config(format!(
                "number of agents ({n_agt}) must match number of network nodes ({n_nodes})"
            )));
        }

        // Remaining count and generator of every type not yet exhausted.
        let mut remaining: Vec<_> = agent_types
            .iter()
            .filter(|agent_type| agent_type.count > 0)
            .map(|agent_type| (agent_type.count, &agent_type.generator))
            .collect();

        let mut agents = Vec::with_capacity(n_nodes);
        for idx in 0..n_nodes {
            let i_type = rng.random_range(0..remaining.len());
            let (count, generator) = &mut remaining[i_type];

            let init = generator.sample(rng)?;
            if !(init.attention.is_finite() && init.attention >= 0.0) {
                return Err(Error::config(format!(
                    "initial attention of agent {idx} must be finite and non-negative, but is {:?}",
                    init.attention
                )));
            }
            agents.push(AgentState {
                id: idx,
                node: network.label(idx).clone(),
                opinion: init.opinion,
                attention: init.attention,
                information: init.information,
                neighbors: network.neighbors(idx),
            });

            *count -= 1;
            if *count == 0 {
                remaining.remove(i_type);
            }
        }

        Ok(Self { agents })
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agents(&self) -> &[AgentState] {
        &self.agents
    }

    pub fn agents_mut(&mut self) -> &mut [AgentState] {
        &mut self.agents
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentState> {
        self.agents.iter()
    }

    /// Sum of the attention of every agent.
    pub fn total_attention(&self) -> f64 {
        self.agents.iter().map(|agt| agt.attention).sum()
    }

    #[cfg(test)]
    pub(crate) fn from_agents(agents: Vec<(f64, f64, f64, Vec<usize>)>) -> Self {
        let agents = agents
            .into_iter()
            .enumerate()
            .map(|(id, (opinion, attention, information, neighbors))| AgentState {
                id,
                node: NodeLabel::Index(id),
                opinion,
                attention,
                information,
                neighbors,
            })
            .collect();
        Self { agents }
    }
}

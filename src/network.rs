//! Network topologies.
//!
//! A [`Topology`] describes how the social network is generated and
//! [`Network::build`] turns it into an undirected simple graph. The node
//! order of the resulting graph is the order in which agents are created.

use crate::config::check_num;
use crate::error::{Error, Result};
use petgraph::graph::{NodeIndex, UnGraph};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet},
    fmt, fs,
    path::{Path, PathBuf},
};

/// Network generation method and its parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Topology {
    /// Erdos-Renyi random graph with edge probability `p`.
    Er { p: f64 },
    /// Barabasi-Albert graph where each new node attaches `m` edges.
    Ba { m: usize },
    /// Watts-Strogatz ring of degree `k` with rewiring probability `p`.
    Ws { k: usize, p: f64 },
    /// Stochastic block model with `n_blocks` equal blocks, intra-block
    /// probability `k` and inter-block probability `p`.
    Sb { n_blocks: usize, p: f64, k: f64 },
    /// Two-dimensional grid with `m` rows and `columns` columns
    /// (the node count when `columns` is absent).
    Lattice {
        m: usize,
        #[serde(default)]
        columns: Option<usize>,
    },
    /// Edge list read from a file; the node count is given by the file.
    SocialMedia { path: PathBuf },
}

impl Default for Topology {
    fn default() -> Self {
        Topology::Er { p: 0.1 }
    }
}

impl Topology {
    /// Check the parameters that do not depend on the node count.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Topology::Er { p } => check_num(p, 0.0..=1.0).map_err(|e| e.in_param("p")),
            Topology::Ba { m } => check_num(m, 1..).map_err(|e| e.in_param("m")),
            Topology::Ws { p, .. } => check_num(p, 0.0..=1.0).map_err(|e| e.in_param("p")),
            Topology::Sb { n_blocks, p, k } => {
                check_num(n_blocks, 1..).map_err(|e| e.in_param("n_blocks"))?;
                check_num(p, 0.0..=1.0).map_err(|e| e.in_param("p"))?;
                check_num(k, 0.0..=1.0).map_err(|e| e.in_param("k"))
            }
            Topology::Lattice { m, columns } => {
                check_num(m, 1..).map_err(|e| e.in_param("m"))?;
                if let Some(columns) = columns {
                    check_num(columns, 1..).map_err(|e| e.in_param("columns"))?;
                }
                Ok(())
            }
            Topology::SocialMedia { .. } => Ok(()),
        }
    }

    /// Resolve a relative edge-list path against `dir`.
    pub fn resolve_paths(&mut self, dir: &Path) {
        if let Topology::SocialMedia { path } = self {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Topology::Er { .. } => "er",
            Topology::Ba { .. } => "ba",
            Topology::Ws { .. } => "ws",
            Topology::Sb { .. } => "sb",
            Topology::Lattice { .. } => "lattice",
            Topology::SocialMedia { .. } => "social_media",
        }
    }
}

/// Identifier of a network node.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize)]
pub enum NodeLabel {
    Index(usize),
    Cell(usize, usize),
    Name(String),
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeLabel::Index(idx) => write!(f, "{idx}"),
            NodeLabel::Cell(row, col) => write!(f, "({row}, {col})"),
            NodeLabel::Name(name) => f.write_str(name),
        }
    }
}

/// Undirected simple graph on which agents live.
#[derive(Debug, Clone)]
pub struct Network {
    graph: UnGraph<NodeLabel, ()>,
}

impl Network {
    /// Build a network of `n` nodes (or the number given by the topology).
    ///
    /// # Errors
    /// Returns [`Error::Configuration`] for parameters that are invalid for
    /// `n` and [`Error::Io`] if an edge-list file cannot be read.
    pub fn build<R: Rng + ?Sized>(n: usize, topology: &Topology, rng: &mut R) -> Result<Self> {
        topology.validate()?;

        let network = match *topology {
            Topology::Er { p } => Self::erdos_renyi(n, p, rng),
            Topology::Ba { m } => Self::barabasi_albert(n, m, rng)?,
            Topology::Ws { k, p } => Self::watts_strogatz(n, k, p, rng)?,
            Topology::Sb { n_blocks, p, k } => Self::stochastic_block(n, n_blocks, p, k, rng)?,
            Topology::Lattice { m, columns } => Self::lattice(m, columns.unwrap_or(n)),
            Topology::SocialMedia { ref path } => Self::from_edge_list(path)?,
        };

        log::debug!(
            "built {} network with {} nodes and {} edges",
            topology.name(),
            network.node_count(),
            network.edge_count()
        );

        Ok(network)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Label of the node at `idx`.
    pub fn label(&self, idx: usize) -> &NodeLabel {
        &self.graph[NodeIndex::new(idx)]
    }

    /// Sorted indices of the nodes adjacent to the node at `idx`.
    pub fn neighbors(&self, idx: usize) -> Vec<usize> {
        let mut nbrs: Vec<_> = self
            .graph
            .neighbors(NodeIndex::new(idx))
            .map(|nbr| nbr.index())
            .collect();
        nbrs.sort_unstable();
        nbrs.dedup();
        nbrs
    }

    pub fn degree(&self, idx: usize) -> usize {
        self.neighbors(idx).len()
    }

    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.graph
            .find_edge(NodeIndex::new(a), NodeIndex::new(b))
            .is_some()
    }

    fn with_indexed_nodes(n: usize) -> Self {
        let mut graph = UnGraph::with_capacity(n, 0);
        for idx in 0..n {
            graph.add_node(NodeLabel::Index(idx));
        }
        Self { graph }
    }

    /// Add the edge `a - b` unless it already exists.
    fn connect(&mut self, a: usize, b: usize) {
        let (a, b) = (NodeIndex::new(a), NodeIndex::new(b));
        if self.graph.find_edge(a, b).is_none() {
            self.graph.add_edge(a, b, ());
        }
    }

    fn disconnect(&mut self, a: usize, b: usize) {
        if let Some(edge) = self.graph.find_edge(NodeIndex::new(a), NodeIndex::new(b)) {
            self.graph.remove_edge(edge);
        }
    }

    fn erdos_renyi<R: Rng + ?Sized>(n: usize, p: f64, rng: &mut R) -> Self {
        let mut net = Self::with_indexed_nodes(n);
        for i in 0..n {
            for j in (i + 1)..n {
                if rng.random_bool(p) {
                    net.connect(i, j);
                }
            }
        }
        net
    }

    fn barabasi_albert<R: Rng + ?Sized>(n: usize, m: usize, rng: &mut R) -> Result<Self> {
        if m >= n {
            return Err(Error::config(format!(
                "Barabasi-Albert network must have m < n, but m = {m} and n = {n}"
            )));
        }

        let mut net = Self::with_indexed_nodes(n);

        // The first incoming node attaches to all `m` initial nodes.
        let mut targets: Vec<usize> = (0..m).collect();
        // Every node appears once per incident edge.
        let mut repeated_nodes = Vec::with_capacity(2 * m * n);

        for source in m..n {
            for &target in &targets {
                net.connect(source, target);
            }
            repeated_nodes.extend_from_slice(&targets);
            repeated_nodes.extend(std::iter::repeat_n(source, m));

            targets = random_subset(&repeated_nodes, m, rng)?;
        }

        Ok(net)
    }

    fn watts_strogatz<R: Rng + ?Sized>(n: usize, k: usize, p: f64, rng: &mut R) -> Result<Self> {
        if k > n {
            return Err(Error::config(format!(
                "Watts-Strogatz network must have k <= n, but k = {k} and n = {n}"
            )));
        }
        if k == n {
            return Ok(Self::erdos_renyi(n, 1.0, rng));
        }

        let mut net = Self::with_indexed_nodes(n);
        let half_k = k / 2;

        for j in 1..=half_k {
            for u in 0..n {
                net.connect(u, (u + j) % n);
            }
        }

        // Rewire each lattice edge `(u, u + j)` with probability `p`.
        for j in 1..=half_k {
            for u in 0..n {
                let v = (u + j) % n;
                if !rng.random_bool(p) {
                    continue;
                }
                if net.degree(u) >= n - 1 {
                    continue;
                }
                let mut w = rng.random_range(0..n);
                while w == u || net.has_edge(u, w) {
                    w = rng.random_range(0..n);
                }
                net.disconnect(u, v);
                net.connect(u, w);
            }
        }

        Ok(net)
    }

    fn stochastic_block<R: Rng + ?Sized>(
        n: usize,
        n_blocks: usize,
        p: f64,
        k: f64,
        rng: &mut R,
    ) -> Result<Self> {
        if n_blocks > n {
            return Err(Error::config(format!(
                "stochastic block network must have n_blocks <= n, but n_blocks = {n_blocks} and n = {n}"
            )));
        }

        let block_size = n / n_blocks;
        let n_nodes = block_size * n_blocks;
        let mut net = Self::with_indexed_nodes(n_nodes);

        for i in 0..n_nodes {
            for j in (i + 1)..n_nodes {
                let prob = if i / block_size == j / block_size { k } else { p };
                if rng.random_bool(prob) {
                    net.connect(i, j);
                }
            }
        }

        Ok(net)
    }

    fn lattice(rows: usize, cols: usize) -> Self {
        let mut graph = UnGraph::with_capacity(rows * cols, 0);
        for row in 0..rows {
            for col in 0..cols {
                graph.add_node(NodeLabel::Cell(row, col));
            }
        }
        let mut net = Self { graph };

        let idx = |row: usize, col: usize| row * cols + col;
        for row in 0..rows {
            for col in 0..cols {
                if row + 1 < rows {
                    net.connect(idx(row, col), idx(row + 1, col));
                }
                if col + 1 < cols {
                    net.connect(idx(row, col), idx(row, col + 1));
                }
            }
        }

        net
    }

    /// Read an undirected edge list, one `source target` pair per line.
    ///
    /// Nodes are numbered in order of first appearance.
    pub fn from_edge_list<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents = fs::read_to_string(file).map_err(|source| Error::Io {
            path: file.to_path_buf(),
            source,
        })?;
        Self::parse_edge_list(&contents)
            .map_err(|e| e.in_param(&format!("edge list {file:?}")))
    }

    fn parse_edge_list(contents: &str) -> Result<Self> {
        let mut net = Self {
            graph: UnGraph::default(),
        };
        let mut index_of: HashMap<String, usize> = HashMap::new();

        for (i_line, line) in contents.lines().enumerate() {
            let line = line.split('#').next().unwrap_or_default();
            let mut tokens = line.split_whitespace();
            let (source, target) = match (tokens.next(), tokens.next()) {
                (None, _) => continue,
                (Some(source), Some(target)) => (source, target),
                (Some(_), None) => {
                    return Err(Error::config(format!(
                        "line {} must contain two node ids",
                        i_line + 1
                    )));
                }
            };

            let mut node = |name: &str| {
                *index_of.entry(name.to_owned()).or_insert_with(|| {
                    net.graph
                        .add_node(NodeLabel::Name(name.to_owned()))
                        .index()
                })
            };
            let a = node(source);
            let b = node(target);
            net.connect(a, b);
        }

        Ok(net)
    }
}

/// Draw `m` distinct elements of `seq`, uniformly over its entries.
fn random_subset<R: Rng + ?Sized>(seq: &[usize], m: usize, rng: &mut R) -> Result<Vec<usize>> {
    let mut picked = HashSet::with_capacity(m);
    let mut subset = Vec::with_capacity(m);
    while subset.len() < m {
        let &ele = seq
            .choose(rng)
            .ok_or_else(|| Error::config("cannot draw from an empty node list"))?;
        if picked.insert(ele) {
            subset.push(ele);
        }
    }
    Ok(subset)
}

//! Agent catalog and the user's agent selection

use crate::{QuillError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Content-generation persona understood by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Agent {
    /// Academic thesis writing
    Thesis,
    /// Short social posts
    Twitter,
    /// Data analysis reports
    DataAnalysis,
    /// Financial reports
    Financial,
    /// Product descriptions
    Product,
}

impl Agent {
    /// Full catalog in display order
    pub const ALL: [Agent; 5] = [
        Agent::Thesis,
        Agent::Twitter,
        Agent::DataAnalysis,
        Agent::Financial,
        Agent::Product,
    ];

    /// Wire identifier
    pub fn id(&self) -> &'static str {
        match self {
            Agent::Thesis => "thesis",
            Agent::Twitter => "twitter",
            Agent::DataAnalysis => "data_analysis",
            Agent::Financial => "financial",
            Agent::Product => "product",
        }
    }

    /// Human readable name
    pub fn label(&self) -> &'static str {
        match self {
            Agent::Thesis => "Thesis Writer",
            Agent::Twitter => "Twitter Posts",
            Agent::DataAnalysis => "Data Analysis",
            Agent::Financial => "Financial Reports",
            Agent::Product => "Product Descriptions",
        }
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Agent {
    type Err = QuillError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_lowercase().replace('-', "_");
        Agent::ALL
            .iter()
            .copied()
            .find(|agent| agent.id() == needle)
            .ok_or_else(|| {
                QuillError::validation(format!(
                    "Unknown agent '{}'. Expected one of: {}",
                    s.trim(),
                    Agent::ALL.map(|a| a.id()).join(", ")
                ))
            })
    }
}

/// Set of agents a prompt is scoped to
///
/// Iteration follows catalog order regardless of insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSelection {
    agents: BTreeSet<Agent>,
}

impl Default for AgentSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl AgentSelection {
    /// Every agent in the catalog
    pub fn all() -> Self {
        Self {
            agents: Agent::ALL.into_iter().collect(),
        }
    }

    /// Empty selection
    pub fn none() -> Self {
        Self {
            agents: BTreeSet::new(),
        }
    }

    /// Flip one agent in or out; returns whether it is now selected
    pub fn toggle(&mut self, agent: Agent) -> bool {
        if self.agents.remove(&agent) {
            false
        } else {
            self.agents.insert(agent);
            true
        }
    }

    /// Select the whole catalog
    pub fn select_all(&mut self) {
        self.agents.extend(Agent::ALL);
    }

    /// Deselect everything
    pub fn clear(&mut self) {
        self.agents.clear();
    }

    /// Whether `agent` is selected
    pub fn contains(&self, agent: Agent) -> bool {
        self.agents.contains(&agent)
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Number of selected agents
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Selected agents in catalog order
    pub fn iter(&self) -> impl Iterator<Item = Agent> + '_ {
        self.agents.iter().copied()
    }

    /// Selected agents as an owned list
    pub fn to_vec(&self) -> Vec<Agent> {
        self.iter().collect()
    }
}

impl FromIterator<Agent> for AgentSelection {
    fn from_iter<I: IntoIterator<Item = Agent>>(iter: I) -> Self {
        Self {
            agents: iter.into_iter().collect(),
        }
    }
}

impl FromStr for AgentSelection {
    type Err = QuillError;

    /// Parse a comma separated id list; `all` selects the whole catalog
    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::all());
        }
        s.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(Agent::from_str)
            .collect()
    }
}

impl fmt::Display for AgentSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.iter().map(|a| a.id()).collect();
        f.write_str(&ids.join(","))
    }
}

//! Grid world configuration

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use gridworld_rl_core::{RLError, Result};

use crate::codec::Coord;
use crate::features::Task;
use crate::rewards::RewardSpec;

fn default_transition_probability() -> f64 {
    0.8
}

fn default_distinct_rewards() -> usize {
    3
}

/// Construction parameters of a [`GridWorld`](crate::GridWorld).
///
/// Only `height` is required when deserializing; every other field has the
/// default listed on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridWorldConfig {
    /// Number of rows
    pub height: usize,
    /// Number of columns; defaults to `height`
    #[serde(default)]
    pub width: Option<usize>,
    /// Action codes in listing and sampling order; defaults to `[0, 1, 2, 3]`
    #[serde(default)]
    pub actions: Option<Vec<u8>>,
    /// Reward of entering each cell, indexed `[y][x]`; defaults to -1 per
    /// step and 0 on terminal cells
    #[serde(default)]
    pub rewards: Option<Vec<Vec<RewardSpec>>>,
    /// Probability that the intended action executes; defaults to 0.8
    #[serde(default = "default_transition_probability")]
    pub transition_probability: f64,
    /// Cells that end an episode
    #[serde(default)]
    pub terminal_states: Vec<Coord>,
    /// Cells that can never be entered
    #[serde(default)]
    pub barrier_states: Vec<Coord>,
    /// Fixed start cell; random non-terminal start when absent
    #[serde(default)]
    pub initial_state: Option<Coord>,
    /// Successor-feature task
    #[serde(default)]
    pub task: Task,
    /// Minimum weight length for [`Task::SameBlocksVaryingValues`]; defaults to 3
    #[serde(default = "default_distinct_rewards")]
    pub distinct_rewards: usize,
    /// Seed of the environment's generator; drawn from entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

impl GridWorldConfig {
    /// Defaults for a `height x height` grid
    #[must_use]
    pub fn new(height: usize) -> Self {
        Self {
            height,
            width: None,
            actions: None,
            rewards: None,
            transition_probability: default_transition_probability(),
            terminal_states: Vec::new(),
            barrier_states: Vec::new(),
            initial_state: None,
            task: Task::default(),
            distinct_rewards: default_distinct_rewards(),
            seed: None,
        }
    }

    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read grid world config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse grid world config {}", path.display()))?;
        Ok(config)
    }

    /// Set the width
    #[must_use]
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    /// Set the action codes
    #[must_use]
    pub fn with_actions(mut self, actions: Vec<u8>) -> Self {
        self.actions = Some(actions);
        self
    }

    /// Use a numeric reward grid
    #[must_use]
    pub fn with_rewards(mut self, rewards: Vec<Vec<f64>>) -> Self {
        self.rewards = Some(
            rewards
                .into_iter()
                .map(|row| row.into_iter().map(RewardSpec::from).collect())
                .collect(),
        );
        self
    }

    /// Use a grid of reward specs
    #[must_use]
    pub fn with_reward_specs(mut self, rewards: Vec<Vec<RewardSpec>>) -> Self {
        self.rewards = Some(rewards);
        self
    }

    /// Set the probability that the intended action executes
    #[must_use]
    pub fn with_transition_probability(mut self, p: f64) -> Self {
        self.transition_probability = p;
        self
    }

    /// Set the terminal cells
    #[must_use]
    pub fn with_terminal_states(mut self, states: impl IntoIterator<Item = impl Into<Coord>>) -> Self {
        self.terminal_states = states.into_iter().map(Into::into).collect();
        self
    }

    /// Set the barrier cells
    #[must_use]
    pub fn with_barrier_states(mut self, states: impl IntoIterator<Item = impl Into<Coord>>) -> Self {
        self.barrier_states = states.into_iter().map(Into::into).collect();
        self
    }

    /// Fix the start cell
    #[must_use]
    pub fn with_initial_state(mut self, state: impl Into<Coord>) -> Self {
        self.initial_state = Some(state.into());
        self
    }

    /// Set the successor-feature task
    #[must_use]
    pub fn with_task(mut self, task: Task) -> Self {
        self.task = task;
        self
    }

    /// Set the minimum number of distinct reward weights
    #[must_use]
    pub fn with_distinct_rewards(mut self, n: usize) -> Self {
        self.distinct_rewards = n;
        self
    }

    /// Seed the environment's generator
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Effective width
    #[must_use]
    pub fn width(&self) -> usize {
        self.width.unwrap_or(self.height)
    }

    /// Check every field that can be checked without building the grid
    pub fn validate(&self) -> Result<()> {
        if self.height == 0 {
            return Err(RLError::configuration("height should be a positive integer"));
        }
        if self.width == Some(0) {
            return Err(RLError::configuration("width should be a positive integer"));
        }
        if !(0.0..=1.0).contains(&self.transition_probability) {
            return Err(RLError::configuration(format!(
                "transition probability should be between 0 and 1, got {}",
                self.transition_probability
            )));
        }
        if self.distinct_rewards == 0 {
            return Err(RLError::configuration(
                "distinct_rewards should be a positive integer",
            ));
        }

        let (height, width) = (self.height, self.width());
        let in_bounds = |c: &Coord| c.x < width && c.y < height;
        if let Some(c) = self.terminal_states.iter().find(|c| !in_bounds(c)) {
            return Err(RLError::configuration(format!(
                "terminal state {c} outside {height}x{width} grid"
            )));
        }
        if let Some(c) = self.barrier_states.iter().find(|c| !in_bounds(c)) {
            return Err(RLError::configuration(format!(
                "barrier state {c} outside {height}x{width} grid"
            )));
        }
        if let Some(c) = self.initial_state {
            if !in_bounds(&c) {
                return Err(RLError::configuration(format!(
                    "initial state {c} outside {height}x{width} grid"
                )));
            }
            if self.barrier_states.contains(&c) {
                return Err(RLError::configuration(format!(
                    "initial state {c} is a barrier"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_json_uses_defaults() {
        let config = GridWorldConfig::from_json_str(r#"{"height": 4}"#).unwrap();
        assert_eq!(config, GridWorldConfig::new(4));
        assert_eq!(config.width(), 4);
        assert_eq!(config.transition_probability, 0.8);
        assert_eq!(config.distinct_rewards, 3);
        assert_eq!(config.task, Task::VaryingBlocksSameValues);
    }

    #[test]
    fn test_full_json() {
        let config = GridWorldConfig::from_json_str(
            r#"{
                "height": 3,
                "width": 3,
                "rewards": [[-1, -1, -1], [-1, {"type": "gaussian", "mean": -5.0, "std_dev": 1.0}, -1], [-1, -1, 10]],
                "transition_probability": 0.9,
                "terminal_states": [[2, 2]],
                "barrier_states": [[1, 0]],
                "initial_state": [0, 0],
                "task": "Same Blocks, Varying Values",
                "distinct_rewards": 4,
                "seed": 17
            }"#,
        )
        .unwrap();
        assert_eq!(config.terminal_states, vec![Coord::new(2, 2)]);
        assert_eq!(config.barrier_states, vec![Coord::new(1, 0)]);
        assert_eq!(config.initial_state, Some(Coord::new(0, 0)));
        assert_eq!(config.task, Task::SameBlocksVaryingValues);
        assert_eq!(config.seed, Some(17));
        config.validate().unwrap();
    }

    #[test]
    fn test_missing_height_is_serialization_error() {
        assert!(matches!(
            GridWorldConfig::from_json_str(r#"{"width": 4}"#),
            Err(RLError::Serialization(_))
        ));
    }

    #[test]
    fn test_validation_failures() {
        let bad = [
            GridWorldConfig::new(0),
            GridWorldConfig::new(3).with_width(0),
            GridWorldConfig::new(3).with_transition_probability(1.5),
            GridWorldConfig::new(3).with_distinct_rewards(0),
            GridWorldConfig::new(3).with_terminal_states([(3, 0)]),
            GridWorldConfig::new(3).with_barrier_states([(0, 3)]),
            GridWorldConfig::new(3).with_initial_state((5, 5)),
            GridWorldConfig::new(3)
                .with_barrier_states([(1, 1)])
                .with_initial_state((1, 1)),
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(RLError::Configuration(_))),
                "{config:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = GridWorldConfig::from_file("/nonexistent/gridworld.json").unwrap_err();
        assert!(matches!(err, RLError::Other(_)));
        assert!(err.to_string().contains("failed to read grid world config"));
    }
}

//! Per-cell reward model
//!
//! Every reward query is indexed by the destination cell alone. The origin
//! and action are part of the signatures so callers can treat the model as a
//! general `R(s, a, s')`.

use ndarray::Array2;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use gridworld_rl_core::{
    BernoulliReward, Deterministic, Gaussian, RLError, Result, RewardDistribution, UniformReward,
};

use crate::action::GridAction;
use crate::codec::Coord;

/// Reward of a step into an ordinary cell when no rewards are configured
pub const DEFAULT_STEP_REWARD: f64 = -1.0;
/// Reward of a terminal cell when no rewards are configured
pub const DEFAULT_TERMINAL_REWARD: f64 = 0.0;

/// Serializable description of one cell's reward.
///
/// A bare number is a deterministic reward; an object selects a distribution
/// by its `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RewardSpec {
    /// Deterministic reward
    Value(f64),
    /// Any stock distribution
    Distribution(DistributionSpec),
}

/// Stock reward distributions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DistributionSpec {
    /// Point mass
    Deterministic {
        /// The reward
        value: f64,
    },
    /// `N(mean, std_dev^2)`
    Gaussian {
        /// Mean
        mean: f64,
        /// Standard deviation
        std_dev: f64,
    },
    /// Uniform over `[low, high)`
    Uniform {
        /// Lower bound
        low: f64,
        /// Upper bound
        high: f64,
    },
    /// `success` with probability `p`, else `failure`
    Bernoulli {
        /// Value on success
        success: f64,
        /// Value on failure
        failure: f64,
        /// Success probability
        p: f64,
    },
}

impl RewardSpec {
    /// Build the described distribution
    pub fn build(&self) -> Result<Box<dyn RewardDistribution>> {
        Ok(match *self {
            Self::Value(value)
            | Self::Distribution(DistributionSpec::Deterministic { value }) => {
                Box::new(Deterministic::new(value))
            }
            Self::Distribution(DistributionSpec::Gaussian { mean, std_dev }) => {
                Box::new(Gaussian::new(mean, std_dev)?)
            }
            Self::Distribution(DistributionSpec::Uniform { low, high }) => {
                Box::new(UniformReward::new(low, high)?)
            }
            Self::Distribution(DistributionSpec::Bernoulli { success, failure, p }) => {
                Box::new(BernoulliReward::new(success, failure, p)?)
            }
        })
    }
}

impl From<f64> for RewardSpec {
    fn from(value: f64) -> Self {
        Self::Value(value)
    }
}

/// Grid of reward distributions plus the cached grid of their expectations
#[derive(Debug)]
pub struct RewardModel {
    width: usize,
    cells: Vec<Box<dyn RewardDistribution>>,
    expected: Array2<f64>,
}

impl RewardModel {
    /// Use a grid of distributions as-is. `grid[y][x]` is the reward of
    /// entering cell `(x, y)`.
    pub fn from_distributions(
        grid: Vec<Vec<Box<dyn RewardDistribution>>>,
        height: usize,
        width: usize,
    ) -> Result<Self> {
        check_shape(grid.len(), grid.iter().map(Vec::len), height, width)?;
        let cells = grid.into_iter().flatten().collect();
        Ok(Self::from_cells(cells, height, width))
    }

    /// Wrap a numeric grid as deterministic rewards
    pub fn from_values(values: &[Vec<f64>], height: usize, width: usize) -> Result<Self> {
        check_shape(values.len(), values.iter().map(Vec::len), height, width)?;
        let grid = values
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&v| Box::new(Deterministic::new(v)) as Box<dyn RewardDistribution>)
                    .collect()
            })
            .collect();
        Self::from_distributions(grid, height, width)
    }

    /// Build from serializable cell specs
    pub fn from_specs(specs: &[Vec<RewardSpec>], height: usize, width: usize) -> Result<Self> {
        check_shape(specs.len(), specs.iter().map(Vec::len), height, width)?;
        let grid = specs
            .iter()
            .map(|row| row.iter().map(RewardSpec::build).collect::<Result<Vec<_>>>())
            .collect::<Result<Vec<_>>>()?;
        Self::from_distributions(grid, height, width)
    }

    /// Default rewards: [`DEFAULT_STEP_REWARD`] everywhere and
    /// [`DEFAULT_TERMINAL_REWARD`] on terminal cells.
    ///
    /// With no terminal states the bottom-right cell becomes the only
    /// terminal. Returns the model together with the effective terminal set.
    #[must_use]
    pub fn with_defaults(
        height: usize,
        width: usize,
        terminal_states: &[Coord],
    ) -> (Self, Vec<Coord>) {
        let terminals = if terminal_states.is_empty() {
            vec![Coord::new(width - 1, height - 1)]
        } else {
            terminal_states.to_vec()
        };
        let cells = (0..height)
            .flat_map(|y| (0..width).map(move |x| Coord::new(x, y)))
            .map(|cell| {
                let value = if terminals.contains(&cell) {
                    DEFAULT_TERMINAL_REWARD
                } else {
                    DEFAULT_STEP_REWARD
                };
                Box::new(Deterministic::new(value)) as Box<dyn RewardDistribution>
            })
            .collect();
        (Self::from_cells(cells, height, width), terminals)
    }

    /// `cells` is row-major and already `height * width` long
    fn from_cells(cells: Vec<Box<dyn RewardDistribution>>, height: usize, width: usize) -> Self {
        let expected = Array2::from_shape_fn((height, width), |(y, x)| {
            cells[y * width + x].expected_value()
        });
        Self {
            width,
            cells,
            expected,
        }
    }

    /// Expected reward of every cell, indexed `[[y, x]]`
    #[must_use]
    pub fn expected_rewards(&self) -> &Array2<f64> {
        &self.expected
    }

    /// The reward distribution of entering `next_state`
    pub fn reward(&self, next_state: Coord) -> Result<&dyn RewardDistribution> {
        let (height, width) = self.expected.dim();
        if next_state.x >= width || next_state.y >= height {
            return Err(RLError::precondition(format!(
                "no reward for {next_state}: outside {height}x{width} grid"
            )));
        }
        Ok(self.cells[next_state.y * self.width + next_state.x].as_ref())
    }

    /// Draw a reward for the transition into `next_state`
    pub fn sampled_reward(
        &self,
        _state: Coord,
        _action: GridAction,
        next_state: Coord,
        rng: &mut dyn RngCore,
    ) -> Result<f64> {
        Ok(self.reward(next_state)?.sample(rng))
    }

    /// `E[R | s, a, s']`
    pub fn expected_reward(&self, _state: Coord, _action: GridAction, next_state: Coord) -> Result<f64> {
        Ok(self.reward(next_state)?.expected_value())
    }

    /// `E[R^2 | s, a, s']`
    pub fn expected_reward_squared(
        &self,
        _state: Coord,
        _action: GridAction,
        next_state: Coord,
    ) -> Result<f64> {
        Ok(self.reward(next_state)?.expected_value_squared())
    }

    /// `Var[R | s, a, s']`
    pub fn variance(&self, _state: Coord, _action: GridAction, next_state: Coord) -> Result<f64> {
        Ok(self.reward(next_state)?.variance())
    }
}

fn check_shape(
    rows: usize,
    row_lens: impl Iterator<Item = usize>,
    height: usize,
    width: usize,
) -> Result<()> {
    let mut row_lens = row_lens.enumerate();
    if rows != height {
        return Err(RLError::configuration(format!(
            "reward grid has {rows} rows, grid height is {height}"
        )));
    }
    if let Some((y, len)) = row_lens.find(|&(_, len)| len != width) {
        return Err(RLError::configuration(format!(
            "reward grid row {y} has {len} cells, grid width is {width}"
        )));
    }
    Ok(())
}

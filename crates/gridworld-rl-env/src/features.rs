//! Successor-feature weights and per-transition feature vectors
//!
//! The reward of a transition decomposes as `r(s, a, s') = phi(s, a, s') . w`
//! where `w` is fixed per task and `phi` indicates which part of `w` the
//! transition activates.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use gridworld_rl_core::{RLError, Result};

use crate::action::GridAction;
use crate::codec::{Coord, StateCodec};

/// Which quantity the weight vector enumerates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Task {
    /// One weight per state (its expected reward); features are one-hot over
    /// states
    #[default]
    #[serde(rename = "Varying Blocks, Same Values")]
    VaryingBlocksSameValues,
    /// One weight per distinct reward value; features mark the entries equal
    /// to the destination's reward
    #[serde(rename = "Same Blocks, Varying Values")]
    SameBlocksVaryingValues,
}

/// Task-dependent weight vector and feature map
#[derive(Debug, Clone)]
pub struct FeatureModel {
    task: Task,
    codec: StateCodec,
    expected: Array2<f64>,
    weights: Array1<f64>,
}

impl FeatureModel {
    /// Compute the weights for `task` from the expected-reward grid
    /// (indexed `[[y, x]]`). `distinct_rewards` is the minimum weight length
    /// under [`Task::SameBlocksVaryingValues`].
    pub fn new(
        task: Task,
        codec: StateCodec,
        expected: &Array2<f64>,
        distinct_rewards: usize,
    ) -> Result<Self> {
        if expected.dim() != (codec.height(), codec.width()) {
            return Err(RLError::configuration(format!(
                "expected-reward grid is {:?}, grid is {}x{}",
                expected.dim(),
                codec.height(),
                codec.width()
            )));
        }
        let weights = match task {
            Task::VaryingBlocksSameValues => state_weights(codec, expected)?,
            Task::SameBlocksVaryingValues => value_weights(expected, distinct_rewards),
        };
        Ok(Self {
            task,
            codec,
            expected: expected.clone(),
            weights,
        })
    }

    /// The active task
    #[must_use]
    pub fn task(&self) -> Task {
        self.task
    }

    /// The weight vector `w`
    #[must_use]
    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    /// `len(w)`; every feature vector has this length
    #[must_use]
    pub fn n_weights(&self) -> usize {
        self.weights.len()
    }

    /// `phi(s, a, s')`
    #[allow(clippy::float_cmp)]
    pub fn feature_vector(
        &self,
        _state: Coord,
        _action: GridAction,
        next_state: Coord,
    ) -> Result<Array1<f64>> {
        match self.task {
            Task::VaryingBlocksSameValues => {
                let index = self.codec.encode(next_state)?;
                let mut phi = Array1::zeros(self.n_weights());
                phi[index] = 1.0;
                Ok(phi)
            }
            Task::SameBlocksVaryingValues => {
                let reward = self
                    .expected
                    .get((next_state.y, next_state.x))
                    .copied()
                    .ok_or_else(|| {
                        RLError::precondition(format!("no feature for {next_state}: outside grid"))
                    })?;
                Ok(self.weights.mapv(|w| if w == reward { 1.0 } else { 0.0 }))
            }
        }
    }
}

/// `w[s] = E[R(decode(s))]`
fn state_weights(codec: StateCodec, expected: &Array2<f64>) -> Result<Array1<f64>> {
    let weights = (0..codec.n_states())
        .map(|s| codec.decode(s).map(|c| expected[[c.y, c.x]]))
        .collect::<Result<Vec<_>>>()?;
    Ok(Array1::from_vec(weights))
}

/// Distinct values in ascending order, zero-padded at the front up to
/// `min_len`
#[allow(clippy::float_cmp)]
fn value_weights(expected: &Array2<f64>, min_len: usize) -> Array1<f64> {
    let mut values: Vec<f64> = expected.iter().copied().collect();
    values.sort_by(f64::total_cmp);
    values.dedup();

    let padding = min_len.saturating_sub(values.len());
    let mut weights = vec![0.0; padding];
    weights.extend(values);
    Array1::from_vec(weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn codec3() -> StateCodec {
        StateCodec::new(3, 3).unwrap()
    }

    fn default_grid() -> Array2<f64> {
        let mut grid = Array2::from_elem((3, 3), -1.0);
        grid[[2, 2]] = 0.0;
        grid
    }

    #[test]
    fn test_state_weights_follow_encoding() {
        let grid = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        let model = FeatureModel::new(Task::VaryingBlocksSameValues, codec3(), &grid, 3).unwrap();
        let codec = codec3();
        for s in 0..9 {
            let c = codec.decode(s).unwrap();
            assert_eq!(model.weights()[s], grid[[c.y, c.x]]);
        }
        assert_eq!(model.n_weights(), 9);
    }

    #[test]
    fn test_one_hot_features_recover_reward() {
        let grid = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        let model = FeatureModel::new(Task::VaryingBlocksSameValues, codec3(), &grid, 3).unwrap();
        let next = Coord::new(2, 0);
        let phi = model
            .feature_vector(Coord::new(1, 0), GridAction::Right, next)
            .unwrap();
        assert_eq!(phi.len(), model.n_weights());
        assert_eq!(phi.sum(), 1.0);
        assert_eq!(phi[codec3().encode(next).unwrap()], 1.0);
        assert_eq!(phi.dot(model.weights()), grid[[0, 2]]);
    }

    #[test]
    fn test_value_weights_are_zero_padded() {
        let model =
            FeatureModel::new(Task::SameBlocksVaryingValues, codec3(), &default_grid(), 3).unwrap();
        assert_eq!(model.weights(), &array![0.0, -1.0, 0.0]);
    }

    #[test]
    fn test_value_weights_without_padding() {
        let grid = array![[3.0, -2.0, 3.0], [1.0, 1.0, 5.0], [0.5, -2.0, 5.0]];
        let model = FeatureModel::new(Task::SameBlocksVaryingValues, codec3(), &grid, 3).unwrap();
        assert_eq!(model.weights(), &array![-2.0, 0.5, 1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_multi_hot_features() {
        let model =
            FeatureModel::new(Task::SameBlocksVaryingValues, codec3(), &default_grid(), 3).unwrap();
        let o = Coord::new(1, 1);
        let to_goal = model.feature_vector(o, GridAction::Up, Coord::new(2, 2)).unwrap();
        assert_eq!(to_goal, array![1.0, 0.0, 1.0]);
        let to_step = model.feature_vector(o, GridAction::Up, Coord::new(1, 2)).unwrap();
        assert_eq!(to_step, array![0.0, 1.0, 0.0]);
        assert_eq!(to_step.len(), model.n_weights());
    }

    #[test]
    fn test_feature_out_of_grid_rejected() {
        let model =
            FeatureModel::new(Task::SameBlocksVaryingValues, codec3(), &default_grid(), 3).unwrap();
        assert!(model
            .feature_vector(Coord::new(0, 0), GridAction::Up, Coord::new(0, 3))
            .is_err());
    }

    #[test]
    fn test_task_names() {
        let task: Task = serde_json::from_str(r#""Same Blocks, Varying Values""#).unwrap();
        assert_eq!(task, Task::SameBlocksVaryingValues);
        assert_eq!(
            serde_json::to_string(&Task::default()).unwrap(),
            r#""Varying Blocks, Same Values""#
        );
    }
}

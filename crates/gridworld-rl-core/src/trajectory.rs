//! Transition records and episode trajectories

use serde::{Deserialize, Serialize};

use crate::Reward;

/// Single transition in a trajectory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition<S, A> {
    /// State the transition started from
    pub state: S,
    /// Action actually executed
    pub action: A,
    /// Reward received
    pub reward: Reward,
    /// State the transition ended in
    pub next_state: S,
    /// Whether the episode ended
    pub done: bool,
}

/// Ordered, replayable record of the current episode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trajectory<S, A> {
    /// Sequence of transitions
    pub transitions: Vec<Transition<S, A>>,
    /// Total reward
    pub total_reward: f64,
}

impl<S, A> Trajectory<S, A> {
    /// Create a new empty trajectory
    #[must_use]
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
            total_reward: 0.0,
        }
    }

    /// Add a transition to the trajectory
    pub fn push(&mut self, transition: Transition<S, A>) {
        self.total_reward += transition.reward.0;
        self.transitions.push(transition);
    }

    /// Drop every recorded transition
    pub fn clear(&mut self) {
        self.transitions.clear();
        self.total_reward = 0.0;
    }

    /// Get the length of the trajectory
    #[must_use]
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Check if trajectory is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Iterate over the recorded transitions in order
    pub fn iter(&self) -> std::slice::Iter<'_, Transition<S, A>> {
        self.transitions.iter()
    }

    /// Compute returns (cumulative discounted rewards)
    #[must_use]
    pub fn returns(&self, gamma: f64) -> Vec<f64> {
        let mut returns = vec![0.0; self.len()];
        let mut running_return = 0.0;

        for i in (0..self.len()).rev() {
            if self.transitions[i].done {
                running_return = 0.0;
            }
            running_return = self.transitions[i].reward.0 + gamma * running_return;
            returns[i] = running_return;
        }

        returns
    }
}

impl<S, A> Default for Trajectory<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, S, A> IntoIterator for &'a Trajectory<S, A> {
    type Item = &'a Transition<S, A>;
    type IntoIter = std::slice::Iter<'a, Transition<S, A>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

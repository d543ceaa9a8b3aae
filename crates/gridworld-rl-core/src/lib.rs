//! Core reinforcement learning traits and types for grid world environments
//!
//! This crate provides the foundational abstractions shared by the
//! environments in this workspace: the environment contract, step and
//! episode records, rewards and reward distributions, action spaces and
//! trajectories.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod environment;
pub mod error;
pub mod reward;
pub mod trajectory;

// Re-export core traits and types
pub use action::{Action, ActionSpace};
pub use environment::{Environment, Episode, Step, StepInfo, TrackedEnvironment};
pub use error::{RLError, Result};
pub use reward::{
    BernoulliReward, Deterministic, Gaussian, Reward, RewardDistribution, UniformReward,
};
pub use trajectory::{Trajectory, Transition};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Action, ActionSpace, Environment, Result, Reward, RewardDistribution, Step, StepInfo,
        Trajectory, Transition,
    };
}

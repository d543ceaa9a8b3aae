//! Stochastic grid world environment
//!
//! This crate provides a tabular grid world MDP:
//! - Coordinate/state encoding
//! - Slippery movement with barriers and terminal cells
//! - Per-cell reward distributions
//! - Successor-feature weights and feature vectors
//! - Heat-map data for trajectories and policies

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod codec;
pub mod config;
pub mod features;
pub mod grid_world;
pub mod rewards;
pub mod transition;
pub mod visualization;
pub mod wrappers;

// Re-export environment types
pub use action::{GridAction, GridActionSpace};
pub use codec::{Coord, StateCodec};
pub use config::GridWorldConfig;
pub use features::{FeatureModel, Task};
pub use grid_world::{EpisodeStatus, GridWorld};
pub use rewards::{DistributionSpec, RewardModel, RewardSpec};
pub use transition::{TransitionProbabilities, TransitionResolver};
pub use visualization::{arrow, HeatmapSink, TextHeatmap};
pub use wrappers::{RewardWrapper, TimeLimit};

// Re-export core types
pub use gridworld_rl_core::{
    Action, ActionSpace, Environment, Episode, RLError, Reward, RewardDistribution, Step,
    StepInfo, TrackedEnvironment,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Coord, GridAction, GridActionSpace, GridWorld, GridWorldConfig, TimeLimit,
        TrackedEnvironment,
    };
    pub use gridworld_rl_core::prelude::*;
}

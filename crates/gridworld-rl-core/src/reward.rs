//! Reward signals and per-cell reward distributions

use std::fmt::Debug;

use rand::distributions::{Distribution, Uniform};
use rand::RngCore;
use rand_distr::{Bernoulli, Normal};
use serde::{Deserialize, Serialize};

use crate::{RLError, Result};

/// Reward signal from the environment
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Reward(pub f64);

impl Reward {
    /// Create a new reward
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    /// Get the reward value
    #[must_use]
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl From<f64> for Reward {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<Reward> for f64 {
    fn from(reward: Reward) -> Self {
        reward.0
    }
}

impl std::ops::Add for Reward {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self(self.0 + other.0)
    }
}

impl std::ops::Mul<f64> for Reward {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self(self.0 * scalar)
    }
}

/// A reward source that can be sampled and summarised by its first two moments.
///
/// Sampling draws from the caller's generator so environments stay
/// reproducible under a fixed seed.
pub trait RewardDistribution: Debug + Send + Sync {
    /// Draw one reward value
    fn sample(&self, rng: &mut dyn RngCore) -> f64;

    /// `E[R]`
    fn expected_value(&self) -> f64;

    /// `Var[R]`
    fn variance(&self) -> f64;

    /// `E[R^2]`
    fn expected_value_squared(&self) -> f64 {
        let mean = self.expected_value();
        self.variance() + mean * mean
    }
}

/// Point mass: always yields the same value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Deterministic {
    /// The reward value
    pub value: f64,
}

impl Deterministic {
    /// Create a point-mass reward
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl RewardDistribution for Deterministic {
    fn sample(&self, _rng: &mut dyn RngCore) -> f64 {
        self.value
    }

    fn expected_value(&self) -> f64 {
        self.value
    }

    fn variance(&self) -> f64 {
        0.0
    }
}

/// Normally distributed reward
#[derive(Debug, Clone, Copy)]
pub struct Gaussian {
    mean: f64,
    std_dev: f64,
    normal: Normal<f64>,
}

impl Gaussian {
    /// Create a gaussian reward with the given mean and standard deviation
    pub fn new(mean: f64, std_dev: f64) -> Result<Self> {
        if !mean.is_finite() {
            return Err(RLError::configuration(format!(
                "gaussian reward mean must be finite, got {mean}"
            )));
        }
        let normal = Normal::new(mean, std_dev).map_err(|e| {
            RLError::configuration(format!(
                "gaussian reward N({mean}, {std_dev}) is invalid: {e}"
            ))
        })?;
        Ok(Self {
            mean,
            std_dev,
            normal,
        })
    }
}

impl RewardDistribution for Gaussian {
    fn sample(&self, rng: &mut dyn RngCore) -> f64 {
        self.normal.sample(rng)
    }

    fn expected_value(&self) -> f64 {
        self.mean
    }

    fn variance(&self) -> f64 {
        self.std_dev * self.std_dev
    }
}

/// Reward drawn uniformly from `[low, high)`
#[derive(Debug, Clone, Copy)]
pub struct UniformReward {
    low: f64,
    high: f64,
    uniform: Uniform<f64>,
}

impl UniformReward {
    /// Create a uniform reward over `[low, high)`
    pub fn new(low: f64, high: f64) -> Result<Self> {
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(RLError::configuration(format!(
                "uniform reward needs finite bounds with low < high, got [{low}, {high})"
            )));
        }
        Ok(Self {
            low,
            high,
            uniform: Uniform::new(low, high),
        })
    }
}

impl RewardDistribution for UniformReward {
    fn sample(&self, rng: &mut dyn RngCore) -> f64 {
        self.uniform.sample(rng)
    }

    fn expected_value(&self) -> f64 {
        (self.low + self.high) / 2.0
    }

    fn variance(&self) -> f64 {
        (self.high - self.low).powi(2) / 12.0
    }
}

/// Two-point reward: `success` with probability `p`, otherwise `failure`
#[derive(Debug, Clone, Copy)]
pub struct BernoulliReward {
    success: f64,
    failure: f64,
    p: f64,
    bernoulli: Bernoulli,
}

impl BernoulliReward {
    /// Create a two-point reward
    pub fn new(success: f64, failure: f64, p: f64) -> Result<Self> {
        let bernoulli = Bernoulli::new(p).map_err(|e| {
            RLError::configuration(format!("bernoulli reward probability {p} is invalid: {e}"))
        })?;
        Ok(Self {
            success,
            failure,
            p,
            bernoulli,
        })
    }
}

impl RewardDistribution for BernoulliReward {
    fn sample(&self, rng: &mut dyn RngCore) -> f64 {
        if self.bernoulli.sample(rng) {
            self.success
        } else {
            self.failure
        }
    }

    fn expected_value(&self) -> f64 {
        self.p * self.success + (1.0 - self.p) * self.failure
    }

    fn variance(&self) -> f64 {
        self.p * (1.0 - self.p) * (self.success - self.failure).powi(2)
    }
}

//! Environment wrappers for common transformations

use gridworld_rl_core::{Environment, Result, Reward, Step};

/// Wrapper that modifies rewards
pub struct RewardWrapper<E, F> {
    /// Inner environment
    pub env: E,
    /// Reward transformation function
    pub reward_fn: F,
}

impl<E, F> RewardWrapper<E, F> {
    /// Create a new reward wrapper
    pub fn new(env: E, reward_fn: F) -> Self {
        Self { env, reward_fn }
    }
}

impl<E, F> Environment for RewardWrapper<E, F>
where
    E: Environment,
    F: Fn(Reward, &Step<E::Observation>) -> Reward,
{
    type Observation = E::Observation;
    type Action = E::Action;

    fn reset(&mut self) -> Result<Self::Observation> {
        self.env.reset()
    }

    fn step(&mut self, action: Self::Action) -> Result<Step<Self::Observation>> {
        let mut step = self.env.step(action)?;
        step.reward = (self.reward_fn)(step.reward, &step);
        Ok(step)
    }

    fn render(&self) -> Result<()> {
        self.env.render()
    }

    fn close(&mut self) -> Result<()> {
        self.env.close()
    }
}

/// Time limit wrapper
pub struct TimeLimit<E> {
    /// Inner environment
    pub env: E,
    /// Maximum steps
    pub max_steps: usize,
    /// Current step count
    pub steps: usize,
}

impl<E> TimeLimit<E> {
    /// Create a new time limit wrapper
    pub fn new(env: E, max_steps: usize) -> Self {
        Self {
            env,
            max_steps,
            steps: 0,
        }
    }
}

impl<E> Environment for TimeLimit<E>
where
    E: Environment,
{
    type Observation = E::Observation;
    type Action = E::Action;

    fn reset(&mut self) -> Result<Self::Observation> {
        self.steps = 0;
        self.env.reset()
    }

    fn step(&mut self, action: Self::Action) -> Result<Step<Self::Observation>> {
        self.steps += 1;
        let mut step = self.env.step(action)?;

        if self.steps >= self.max_steps && !step.done {
            step.truncated = true;
            step.done = true;
        }

        Ok(step)
    }

    fn render(&self) -> Result<()> {
        self.env.render()
    }

    fn close(&mut self) -> Result<()> {
        self.env.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GridAction, GridWorld, GridWorldConfig};

    fn corner_world() -> GridWorld {
        let config = GridWorldConfig::new(4)
            .with_transition_probability(1.0)
            .with_initial_state((0, 0))
            .with_seed(5);
        GridWorld::new(config).unwrap()
    }

    #[test]
    fn test_time_limit_truncates() {
        let mut env = TimeLimit::new(corner_world(), 3);
        env.reset().unwrap();
        // walking into the wall never reaches the goal
        for _ in 0..2 {
            let step = env.step(GridAction::Left).unwrap();
            assert!(!step.done);
            assert!(!step.truncated);
        }
        let step = env.step(GridAction::Left).unwrap();
        assert!(step.done);
        assert!(step.truncated);

        env.reset().unwrap();
        assert_eq!(env.steps, 0);
    }

    #[test]
    fn test_time_limit_keeps_natural_termination() {
        let mut env = TimeLimit::new(corner_world(), 6);
        env.reset().unwrap();
        let mut last = None;
        for a in [GridAction::Up; 3].into_iter().chain([GridAction::Right; 3]) {
            last = Some(env.step(a).unwrap());
        }
        let last = last.unwrap();
        assert!(last.done);
        assert!(!last.truncated);
    }

    #[test]
    fn test_reward_wrapper_rescales() {
        let mut env = RewardWrapper::new(corner_world(), |r: Reward, _: &Step<usize>| r * 0.5);
        env.reset().unwrap();
        let step = env.step(GridAction::Up).unwrap();
        assert_eq!(step.reward.value(), -0.5);
    }

    #[test]
    fn test_reward_wrapper_sees_step() {
        let bonus = |r: Reward, step: &Step<usize>| {
            if step.done {
                r + Reward::new(10.0)
            } else {
                r
            }
        };
        let mut env = RewardWrapper::new(corner_world(), bonus);
        env.reset().unwrap();
        let mut total = 0.0;
        for a in [GridAction::Up; 3].into_iter().chain([GridAction::Right; 3]) {
            total += env.step(a).unwrap().reward.value();
        }
        // five -1 steps and a 0 + 10 goal step
        assert_eq!(total, 5.0);
    }
}

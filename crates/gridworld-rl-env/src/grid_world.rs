//! The grid world episode engine

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use gridworld_rl_core::{
    Environment, RLError, Result, Reward, RewardDistribution, Step, StepInfo, Trajectory,
    Transition,
};

use crate::action::{GridAction, GridActionSpace};
use crate::codec::{Coord, StateCodec};
use crate::config::GridWorldConfig;
use crate::features::{FeatureModel, Task};
use crate::rewards::RewardModel;
use crate::transition::{TransitionProbabilities, TransitionResolver};
use crate::visualization::TextHeatmap;

/// Where rewards come from when building a [`GridWorld`]
enum RewardInput {
    /// `config.rewards`, or the defaults when that is absent
    FromConfig,
    /// Caller-provided distributions, indexed `[y][x]`
    Distributions(Vec<Vec<Box<dyn RewardDistribution>>>),
}

/// Whether the current state ends the episode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeStatus {
    /// The agent is on a non-terminal cell
    Running,
    /// The agent is on a terminal cell; further steps re-resolve from it
    Done,
}

/// Stochastic grid world MDP.
///
/// The agent moves on a `height x width` grid. An intended action executes
/// with the configured probability and otherwise drifts to one of its two
/// perpendicular neighbours. Moves off the grid or into a barrier leave the
/// agent in place. The reward of a step depends only on the destination cell.
pub struct GridWorld {
    codec: StateCodec,
    actions: GridActionSpace,
    resolver: TransitionResolver,
    rewards: RewardModel,
    features: FeatureModel,
    terminal_states: Vec<Coord>,
    terminal_set: HashSet<Coord>,
    barrier_states: Vec<Coord>,
    initial_state: Option<Coord>,
    start_candidates: Vec<Coord>,
    barrier_index_set: BTreeSet<usize>,
    danger_sets: Vec<BTreeSet<usize>>,
    state: Coord,
    encoded_state: usize,
    trajectory: Trajectory<Coord, GridAction>,
    rng: StdRng,
}

impl GridWorld {
    /// Build from a config, seeding the generator from `config.seed` or
    /// from entropy
    pub fn new(config: GridWorldConfig) -> Result<Self> {
        let rng = seeded_rng(config.seed);
        Self::build(config, RewardInput::FromConfig, rng)
    }

    /// Build from a config with an explicit generator; `config.seed` is
    /// ignored
    pub fn with_rng(config: GridWorldConfig, rng: StdRng) -> Result<Self> {
        Self::build(config, RewardInput::FromConfig, rng)
    }

    /// Build with caller-provided reward distributions, `grid[y][x]`;
    /// `config.rewards` is ignored
    pub fn with_reward_distributions(
        config: GridWorldConfig,
        grid: Vec<Vec<Box<dyn RewardDistribution>>>,
    ) -> Result<Self> {
        let rng = seeded_rng(config.seed);
        Self::build(config, RewardInput::Distributions(grid), rng)
    }

    fn build(config: GridWorldConfig, rewards: RewardInput, rng: StdRng) -> Result<Self> {
        config.validate()?;
        let (height, width) = (config.height, config.width());

        let codec = StateCodec::new(height, width)?;
        if !codec.is_bijective() {
            return Err(RLError::configuration(format!(
                "state encoding x * width + y is not a bijection on a {height}x{width} grid; \
                 use a square grid"
            )));
        }

        let actions = match &config.actions {
            Some(codes) => GridActionSpace::from_codes(codes)?,
            None => GridActionSpace::default(),
        };
        let probabilities = TransitionProbabilities::new(config.transition_probability)?;

        let (rewards, terminal_states) = match (rewards, &config.rewards) {
            (RewardInput::Distributions(grid), _) => (
                RewardModel::from_distributions(grid, height, width)?,
                config.terminal_states.clone(),
            ),
            (RewardInput::FromConfig, Some(specs)) => (
                RewardModel::from_specs(specs, height, width)?,
                config.terminal_states.clone(),
            ),
            (RewardInput::FromConfig, None) => {
                RewardModel::with_defaults(height, width, &config.terminal_states)
            }
        };

        let features = FeatureModel::new(
            config.task,
            codec,
            rewards.expected_rewards(),
            config.distinct_rewards,
        )?;

        let terminal_set: HashSet<Coord> = terminal_states.iter().copied().collect();
        let barrier_set: HashSet<Coord> = config.barrier_states.iter().copied().collect();
        let start_candidates: Vec<Coord> = codec
            .coords()
            .filter(|c| !terminal_set.contains(c) && !barrier_set.contains(c))
            .collect();
        if config.initial_state.is_none() && start_candidates.is_empty() {
            return Err(RLError::DegenerateConfiguration(format!(
                "every cell of the {height}x{width} grid is terminal or a barrier, \
                 so there is no random start state"
            )));
        }

        let mut barrier_index_set = BTreeSet::new();
        for s in 0..codec.n_states() {
            let c = codec.decode(s)?;
            if rewards.expected_reward(c, GridAction::Up, c)? < 0.0 {
                barrier_index_set.insert(s);
            }
        }
        let danger_sets = barrier_index_set
            .iter()
            .map(|&s| BTreeSet::from([s]))
            .collect();

        let resolver = TransitionResolver::new(codec, barrier_set, probabilities);

        let mut env = Self {
            codec,
            actions,
            resolver,
            rewards,
            features,
            terminal_states,
            terminal_set,
            barrier_states: config.barrier_states,
            initial_state: config.initial_state,
            start_candidates,
            barrier_index_set,
            danger_sets,
            state: Coord::new(0, 0),
            encoded_state: 0,
            trajectory: Trajectory::new(),
            rng,
        };
        env.reset_state()?;

        info!(
            height,
            width,
            p = config.transition_probability,
            terminals = env.terminal_states.len(),
            barriers = env.barrier_states.len(),
            task = ?env.features.task(),
            n_weights = env.features.n_weights(),
            "grid world built"
        );
        Ok(env)
    }

    /// Pick the start cell and clear the trajectory
    fn reset_state(&mut self) -> Result<usize> {
        self.trajectory.clear();
        let start = match self.initial_state {
            Some(c) => c,
            None => {
                if self.start_candidates.is_empty() {
                    return Err(RLError::DegenerateConfiguration(
                        "no non-terminal start state".to_string(),
                    ));
                }
                let i = self.rng.gen_range(0..self.start_candidates.len());
                self.start_candidates[i]
            }
        };
        self.encoded_state = self.codec.encode(start)?;
        self.state = start;
        debug!(start = %start, state = self.encoded_state, "reset");
        Ok(self.encoded_state)
    }

    /// Number of rows
    #[must_use]
    pub fn height(&self) -> usize {
        self.codec.height()
    }

    /// Number of columns
    #[must_use]
    pub fn width(&self) -> usize {
        self.codec.width()
    }

    /// Number of states
    #[must_use]
    pub fn n_states(&self) -> usize {
        self.codec.n_states()
    }

    /// Number of actions
    #[must_use]
    pub fn n_actions(&self) -> usize {
        self.actions.actions().len()
    }

    /// The actions in configured order
    #[must_use]
    pub fn actions(&self) -> &[GridAction; 4] {
        self.actions.actions()
    }

    /// The action space, for sampling
    #[must_use]
    pub fn action_space(&self) -> &GridActionSpace {
        &self.actions
    }

    /// The state codec
    #[must_use]
    pub fn codec(&self) -> StateCodec {
        self.codec
    }

    /// Encode a coordinate
    pub fn encode_state(&self, coord: Coord) -> Result<usize> {
        self.codec.encode(coord)
    }

    /// Decode a state index
    pub fn decode_state(&self, state: usize) -> Result<Coord> {
        self.codec.decode(state)
    }

    /// Terminal cells
    #[must_use]
    pub fn terminal_states(&self) -> &[Coord] {
        &self.terminal_states
    }

    /// Barrier cells
    #[must_use]
    pub fn barrier_states(&self) -> &[Coord] {
        &self.barrier_states
    }

    /// The configured start cell, if any
    #[must_use]
    pub fn initial_state(&self) -> Option<Coord> {
        self.initial_state
    }

    /// Whether reaching `coord` ends the episode
    #[must_use]
    pub fn is_terminal_state(&self, coord: Coord) -> bool {
        self.terminal_set.contains(&coord)
    }

    /// Encoded states whose self-transition has negative expected reward
    #[must_use]
    pub fn barrier_index_set(&self) -> &BTreeSet<usize> {
        &self.barrier_index_set
    }

    /// One singleton set per element of [`Self::barrier_index_set`]
    #[must_use]
    pub fn danger_sets(&self) -> &[BTreeSet<usize>] {
        &self.danger_sets
    }

    /// Current cell
    #[must_use]
    pub fn state(&self) -> Coord {
        self.state
    }

    /// Current encoded state
    #[must_use]
    pub fn encoded_state(&self) -> usize {
        self.encoded_state
    }

    /// Whether the current cell is terminal
    #[must_use]
    pub fn status(&self) -> EpisodeStatus {
        if self.is_terminal_state(self.state) {
            EpisodeStatus::Done
        } else {
            EpisodeStatus::Running
        }
    }

    /// Transitions recorded since the last reset
    #[must_use]
    pub fn transitions(&self) -> &Trajectory<Coord, GridAction> {
        &self.trajectory
    }

    /// Drift probabilities `[intended, right, left, opposite]`
    #[must_use]
    pub fn transition_probabilities(&self) -> [f64; 4] {
        self.resolver.probabilities().as_array()
    }

    /// Probability of executing each action code when `intended` is chosen
    #[must_use]
    pub fn action_probabilities(&self, intended: GridAction) -> [f64; 4] {
        self.resolver.action_probabilities(intended)
    }

    /// Expected reward of every cell, indexed `[[y, x]]`
    #[must_use]
    pub fn expected_rewards(&self) -> &Array2<f64> {
        self.rewards.expected_rewards()
    }

    /// The reward distribution of entering `next_state`
    pub fn reward(&self, next_state: Coord) -> Result<&dyn RewardDistribution> {
        self.rewards.reward(next_state)
    }

    /// Draw a reward for a transition from the environment's generator
    pub fn sampled_reward(
        &mut self,
        state: Coord,
        action: GridAction,
        next_state: Coord,
    ) -> Result<f64> {
        self.rewards
            .sampled_reward(state, action, next_state, &mut self.rng)
    }

    /// `E[R | s, a, s']`
    pub fn expected_reward(&self, state: Coord, action: GridAction, next_state: Coord) -> Result<f64> {
        self.rewards.expected_reward(state, action, next_state)
    }

    /// `E[R^2 | s, a, s']`
    pub fn expected_reward_squared(
        &self,
        state: Coord,
        action: GridAction,
        next_state: Coord,
    ) -> Result<f64> {
        self.rewards.expected_reward_squared(state, action, next_state)
    }

    /// `Var[R | s, a, s']`
    pub fn reward_variance(&self, state: Coord, action: GridAction, next_state: Coord) -> Result<f64> {
        self.rewards.variance(state, action, next_state)
    }

    /// The active successor-feature task
    #[must_use]
    pub fn task(&self) -> Task {
        self.features.task()
    }

    /// Successor-feature weights
    #[must_use]
    pub fn weights(&self) -> &Array1<f64> {
        self.features.weights()
    }

    /// Length of the weight vector
    #[must_use]
    pub fn n_weights(&self) -> usize {
        self.features.n_weights()
    }

    /// Successor-feature vector of a transition
    pub fn feature_vector(
        &self,
        state: Coord,
        action: GridAction,
        next_state: Coord,
    ) -> Result<Array1<f64>> {
        self.features.feature_vector(state, action, next_state)
    }

    /// Deterministic move used for policy roll-outs: no drift, same bounds
    /// and barrier rules as [`Environment::step`]
    #[must_use]
    pub fn move_agent(&self, from: Coord, action: GridAction) -> Coord {
        self.resolver.move_agent(from, action)
    }

    /// Step with a raw action code
    pub fn step_code(&mut self, code: u8) -> Result<Step<usize>> {
        let action = GridAction::try_from(code)?;
        self.step(action)
    }
}

impl Environment for GridWorld {
    type Observation = usize;
    type Action = GridAction;

    fn reset(&mut self) -> Result<usize> {
        self.reset_state()
    }

    fn step(&mut self, action: GridAction) -> Result<Step<usize>> {
        let from = self.state;
        if self.is_terminal_state(from) {
            warn!(state = %from, "step called from a terminal state");
        }

        let (executed, to) = self.resolver.resolve(from, action, &mut self.rng)?;
        let reward = self
            .rewards
            .sampled_reward(from, executed, to, &mut self.rng)?;
        let done = self.is_terminal_state(to);
        let encoded = self.codec.encode(to)?;

        self.state = to;
        self.encoded_state = encoded;
        self.trajectory.push(Transition {
            state: from,
            action: executed,
            reward: Reward(reward),
            next_state: to,
            done,
        });

        debug!(
            intended = %action,
            executed = %executed,
            from = %from,
            to = %to,
            reward,
            done,
            "step"
        );

        Ok(Step {
            observation: encoded,
            reward: Reward(reward),
            done,
            truncated: false,
            info: StepInfo::default(),
        })
    }

    fn render(&self) -> Result<()> {
        let mut sink = TextHeatmap::new();
        self.render_to(&mut sink)?;
        info!("trajectory\n{}", sink.rendered());
        Ok(())
    }
}

impl fmt::Display for GridWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let coords = |cs: &[Coord]| {
            cs.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(
            f,
            "GridWorld(height={}, width={}, rewards={}, terminal_states=[{}], barrier_states=[{}])",
            self.height(),
            self.width(),
            self.expected_rewards(),
            coords(&self.terminal_states),
            coords(&self.barrier_states),
        )
    }
}

impl fmt::Debug for GridWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridWorld")
            .field("height", &self.height())
            .field("width", &self.width())
            .field("state", &self.state)
            .field("terminal_states", &self.terminal_states)
            .field("barrier_states", &self.barrier_states)
            .field("task", &self.task())
            .finish_non_exhaustive()
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

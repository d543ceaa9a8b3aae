//! Property tests for grid world invariants

use std::collections::HashSet;

use approx::assert_relative_eq;
use proptest::prelude::*;

use gridworld_rl_env::{
    Coord, Environment, GridAction, GridWorld, GridWorldConfig, StateCodec, Task,
};

fn action_strategy() -> impl Strategy<Value = GridAction> {
    (0u8..4).prop_map(|code| GridAction::try_from(code).unwrap())
}

/// Any permutation of the four action codes
fn order_strategy() -> impl Strategy<Value = Vec<u8>> {
    Just(vec![0u8, 1, 2, 3]).prop_shuffle()
}

/// A square grid size, a set of barrier cells and a list of actions to take
fn walk_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>, Vec<GridAction>)> {
    (2usize..7).prop_flat_map(|n| {
        (
            Just(n),
            prop::collection::vec((0..n, 0..n), 0..n),
            prop::collection::vec(action_strategy(), 1..60),
        )
    })
}

proptest! {
    #[test]
    fn prop_codec_roundtrip(n in 1usize..12) {
        let codec = StateCodec::new(n, n).unwrap();
        prop_assert!(codec.is_bijective());
        let mut seen = HashSet::new();
        for c in codec.coords() {
            let s = codec.encode(c).unwrap();
            prop_assert!(s < codec.n_states());
            prop_assert!(seen.insert(s));
            prop_assert_eq!(codec.decode(s).unwrap(), c);
        }
    }

    #[test]
    fn prop_action_probabilities_conserve_mass(
        p in 0.0f64..=1.0,
        intended in action_strategy(),
        order in order_strategy(),
    ) {
        let env = GridWorld::new(
            GridWorldConfig::new(3)
                .with_transition_probability(p)
                .with_actions(order)
                .with_seed(0),
        )
        .unwrap();
        let probs = env.action_probabilities(intended);
        let code = usize::from(intended.code());
        assert_relative_eq!(probs.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        prop_assert!(probs.iter().all(|&q| q >= 0.0));
        prop_assert_eq!(probs[code], p);
        prop_assert_eq!(probs[(code + 2) % 4], 0.0);
        assert_relative_eq!(probs[(code + 1) % 4], (1.0 - p) / 2.0, epsilon = 1e-12);
        assert_relative_eq!(probs[(code + 3) % 4], (1.0 - p) / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn prop_walk_respects_bounds_and_barriers(
        (n, barriers, actions) in walk_strategy(),
        p in 0.0f64..=1.0,
        seed in any::<u64>(),
    ) {
        let barrier_set: HashSet<Coord> = barriers.iter().map(|&c| Coord::from(c)).collect();
        let start = Coord::new(0, 0);
        prop_assume!(!barrier_set.contains(&start));
        let goal = Coord::new(n - 1, n - 1);
        prop_assume!(!barrier_set.contains(&goal));

        let config = GridWorldConfig::new(n)
            .with_transition_probability(p)
            .with_barrier_states(barriers)
            .with_initial_state(start)
            .with_seed(seed);
        let mut env = GridWorld::new(config).unwrap();

        for action in actions {
            let from = env.state();
            let step = env.step(action).unwrap();
            let to = env.state();
            prop_assert!(to.x < n && to.y < n);
            prop_assert!(!barrier_set.contains(&to));
            prop_assert_eq!(step.observation, env.encode_state(to).unwrap());
            prop_assert_eq!(step.done, env.is_terminal_state(to));
            // at most one cell per step
            prop_assert!(from.x.abs_diff(to.x) + from.y.abs_diff(to.y) <= 1);
            if step.done {
                break;
            }
        }
        let log = env.transitions();
        prop_assert!(log.iter().rev().skip(1).all(|t| !t.done));
    }

    #[test]
    fn prop_random_reset_avoids_terminals_and_barriers(
        n in 2usize..6,
        seed in any::<u64>(),
    ) {
        let config = GridWorldConfig::new(n)
            .with_terminal_states([(n - 1, n - 1), (0, n - 1)])
            .with_barrier_states([(n - 1, 0)])
            .with_seed(seed);
        let mut env = GridWorld::new(config).unwrap();
        for _ in 0..20 {
            let s = env.reset().unwrap();
            let c = env.decode_state(s).unwrap();
            prop_assert!(!env.is_terminal_state(c));
            prop_assert!(!env.barrier_states().contains(&c));
        }
    }

    #[test]
    fn prop_feature_length_matches_weights(
        values in prop::collection::vec(prop::sample::select(vec![-2.0, -1.0, 0.0, 1.5, 3.0]), 16),
        distinct in 1usize..8,
        next in (0usize..4, 0usize..4),
        same_blocks in any::<bool>(),
    ) {
        let grid: Vec<Vec<f64>> = values.chunks(4).map(<[f64]>::to_vec).collect();
        let task = if same_blocks {
            Task::SameBlocksVaryingValues
        } else {
            Task::VaryingBlocksSameValues
        };
        let env = GridWorld::new(
            GridWorldConfig::new(4)
                .with_rewards(grid.clone())
                .with_terminal_states([(3, 3)])
                .with_task(task)
                .with_distinct_rewards(distinct)
                .with_seed(1),
        )
        .unwrap();

        let next = Coord::from(next);
        let phi = env.feature_vector(Coord::new(0, 0), GridAction::Up, next).unwrap();
        prop_assert_eq!(phi.len(), env.n_weights());
        prop_assert!(phi.iter().all(|&f| f == 0.0 || f == 1.0));

        match task {
            Task::VaryingBlocksSameValues => {
                prop_assert_eq!(env.n_weights(), 16);
                prop_assert_eq!(phi.dot(env.weights()), grid[next.y][next.x]);
            }
            Task::SameBlocksVaryingValues => {
                prop_assert!(env.n_weights() >= distinct);
                prop_assert!(phi.sum() >= 1.0);
            }
        }
    }
}

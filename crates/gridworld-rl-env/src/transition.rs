//! Stochastic action drift and barrier-aware movement

use std::collections::HashSet;

use rand::distributions::{Distribution, WeightedIndex};
use rand::RngCore;
use tracing::trace;

use gridworld_rl_core::{RLError, Result};

use crate::action::GridAction;
use crate::codec::{Coord, StateCodec};

/// Probabilities of executing the intended action, its right-rotated
/// neighbour, its left-rotated neighbour and its opposite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionProbabilities([f64; 4]);

impl TransitionProbabilities {
    /// `[p, (1 - p) / 2, (1 - p) / 2, 0]`
    pub fn new(p: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&p) {
            return Err(RLError::configuration(format!(
                "transition probability must be in [0, 1], got {p}"
            )));
        }
        let drift = (1.0 - p) / 2.0;
        Ok(Self([p, drift, drift, 0.0]))
    }

    /// The relative probability vector
    #[must_use]
    pub fn as_array(&self) -> [f64; 4] {
        self.0
    }
}

impl Default for TransitionProbabilities {
    fn default() -> Self {
        Self([0.8, 0.1, 0.1, 0.0])
    }
}

/// Resolves an intended action into an executed action and destination cell
#[derive(Debug, Clone)]
pub struct TransitionResolver {
    codec: StateCodec,
    barriers: HashSet<Coord>,
    probabilities: TransitionProbabilities,
}

impl TransitionResolver {
    /// Create a resolver for the given grid
    #[must_use]
    pub fn new(
        codec: StateCodec,
        barriers: HashSet<Coord>,
        probabilities: TransitionProbabilities,
    ) -> Self {
        Self {
            codec,
            barriers,
            probabilities,
        }
    }

    /// The drift probabilities
    #[must_use]
    pub fn probabilities(&self) -> TransitionProbabilities {
        self.probabilities
    }

    /// Probability of executing each action, indexed by action code, when
    /// `intended` is chosen. The opposite action never executes.
    #[must_use]
    pub fn action_probabilities(&self, intended: GridAction) -> [f64; 4] {
        let [p_intended, p_right, p_left, p_opposite] = self.probabilities.as_array();
        let mut probs = [0.0; 4];
        probs[usize::from(intended.code())] = p_intended;
        probs[usize::from(intended.right().code())] = p_right;
        probs[usize::from(intended.left().code())] = p_left;
        probs[usize::from(intended.opposite().code())] = p_opposite;
        probs
    }

    /// Sample the action that actually executes
    pub fn sample_action(&self, intended: GridAction, rng: &mut dyn RngCore) -> Result<GridAction> {
        let probs = self.action_probabilities(intended);
        trace!(?intended, ?probs, "action distribution");
        let dist = WeightedIndex::new(probs)
            .map_err(|e| RLError::Computation(format!("invalid action distribution {probs:?}: {e}")))?;
        Ok(GridAction::ALL[dist.sample(rng)])
    }

    /// Destination of executing `action` from `from`. Moves that leave the
    /// grid or enter a barrier leave the agent where it is.
    #[must_use]
    pub fn move_agent(&self, from: Coord, action: GridAction) -> Coord {
        match action.apply(from) {
            Some(to) if self.codec.in_bounds(to) && !self.barriers.contains(&to) => to,
            _ => from,
        }
    }

    /// Sample an executed action and resolve the resulting cell
    pub fn resolve(
        &self,
        from: Coord,
        intended: GridAction,
        rng: &mut dyn RngCore,
    ) -> Result<(GridAction, Coord)> {
        let executed = self.sample_action(intended, rng)?;
        Ok((executed, self.move_agent(from, executed)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn resolver(p: f64, barriers: &[Coord]) -> TransitionResolver {
        TransitionResolver::new(
            StateCodec::new(3, 3).unwrap(),
            barriers.iter().copied().collect(),
            TransitionProbabilities::new(p).unwrap(),
        )
    }

    #[test]
    fn test_probability_vector() {
        let probs = TransitionProbabilities::new(0.8).unwrap().as_array();
        assert_relative_eq!(probs[0], 0.8);
        assert_relative_eq!(probs[1], 0.1);
        assert_relative_eq!(probs[2], 0.1);
        assert_eq!(probs[3], 0.0);
        assert!(TransitionProbabilities::new(1.2).is_err());
        assert!(TransitionProbabilities::new(-0.1).is_err());
        assert!(TransitionProbabilities::new(f64::NAN).is_err());
    }

    #[test]
    fn test_action_probabilities_placement() {
        let r = resolver(0.8, &[]);
        let probs = r.action_probabilities(GridAction::Up);
        assert_relative_eq!(probs[GridAction::Up as usize], 0.8);
        assert_relative_eq!(probs[GridAction::Right as usize], 0.1);
        assert_relative_eq!(probs[GridAction::Left as usize], 0.1);
        assert_eq!(probs[GridAction::Down as usize], 0.0);

        for a in GridAction::ALL {
            let probs = r.action_probabilities(a);
            assert_relative_eq!(probs.iter().sum::<f64>(), 1.0);
            assert!(probs.iter().all(|&p| p >= 0.0));
            assert_eq!(probs[usize::from(a.opposite().code())], 0.0);
            assert_relative_eq!(probs[usize::from(a.right().code())], 0.1);
            assert_relative_eq!(probs[usize::from(a.left().code())], 0.1);
        }
    }

    #[test]
    fn test_certain_up_from_center() {
        let r = resolver(1.0, &[]);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let (executed, to) = r.resolve(Coord::new(1, 1), GridAction::Up, &mut rng).unwrap();
            assert_eq!(executed, GridAction::Up);
            assert_eq!(to, Coord::new(1, 2));
        }
    }

    #[test]
    fn test_barrier_blocks_move() {
        let r = resolver(1.0, &[Coord::new(1, 2)]);
        let mut rng = StdRng::seed_from_u64(11);
        let (executed, to) = r.resolve(Coord::new(1, 1), GridAction::Up, &mut rng).unwrap();
        assert_eq!(executed, GridAction::Up);
        assert_eq!(to, Coord::new(1, 1));
    }

    #[test]
    fn test_edges_block_move() {
        let r = resolver(1.0, &[]);
        assert_eq!(r.move_agent(Coord::new(0, 0), GridAction::Left), Coord::new(0, 0));
        assert_eq!(r.move_agent(Coord::new(0, 0), GridAction::Down), Coord::new(0, 0));
        assert_eq!(r.move_agent(Coord::new(2, 2), GridAction::Up), Coord::new(2, 2));
        assert_eq!(r.move_agent(Coord::new(2, 2), GridAction::Right), Coord::new(2, 2));
    }

    #[test]
    fn test_drift_never_reverses() {
        let r = resolver(0.0, &[]);
        let mut rng = StdRng::seed_from_u64(99);
        let mut seen = HashSet::new();
        for _ in 0..500 {
            let executed = r.sample_action(GridAction::Right, &mut rng).unwrap();
            assert_ne!(executed, GridAction::Left);
            assert_ne!(executed, GridAction::Right);
            seen.insert(executed);
        }
        assert_eq!(seen.len(), 2);
    }
}

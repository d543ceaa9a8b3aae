//! Directional actions and the ordered grid action space

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

use gridworld_rl_core::{Action, ActionSpace, RLError, Result};

use crate::codec::Coord;

/// One of the four compass moves. The discriminant is the action code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum GridAction {
    /// `y + 1`
    Up = 0,
    /// `x + 1`
    Right = 1,
    /// `y - 1`
    Down = 2,
    /// `x - 1`
    Left = 3,
}

impl GridAction {
    /// All actions in code order
    pub const ALL: [GridAction; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    /// The numeric action code
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Cell reached by moving one step from `from`, ignoring the upper grid
    /// bounds. `None` when the move would go below zero.
    #[must_use]
    pub fn apply(self, from: Coord) -> Option<Coord> {
        match self {
            Self::Up => Some(Coord::new(from.x, from.y + 1)),
            Self::Right => Some(Coord::new(from.x + 1, from.y)),
            Self::Down => from.y.checked_sub(1).map(|y| Coord::new(from.x, y)),
            Self::Left => from.x.checked_sub(1).map(|x| Coord::new(x, from.y)),
        }
    }

    /// The action `quarter_turns` places clockwise by code,
    /// `(code + quarter_turns) mod 4`
    #[must_use]
    pub fn rotated(self, quarter_turns: u8) -> Self {
        Self::ALL[usize::from((self.code() + quarter_turns % 4) % 4)]
    }

    /// `(code + 1) mod 4`
    #[must_use]
    pub fn right(self) -> Self {
        self.rotated(1)
    }

    /// `(code - 1) mod 4`
    #[must_use]
    pub fn left(self) -> Self {
        self.rotated(3)
    }

    /// `(code + 2) mod 4`
    #[must_use]
    pub fn opposite(self) -> Self {
        self.rotated(2)
    }
}

impl TryFrom<u8> for GridAction {
    type Error = RLError;

    fn try_from(code: u8) -> Result<Self> {
        Self::ALL
            .get(usize::from(code))
            .copied()
            .ok_or_else(|| RLError::InvalidAction(format!("unknown action code {code}")))
    }
}

impl From<GridAction> for u8 {
    fn from(action: GridAction) -> Self {
        action.code()
    }
}

impl fmt::Display for GridAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Up => "UP",
            Self::Right => "RIGHT",
            Self::Down => "DOWN",
            Self::Left => "LEFT",
        };
        f.write_str(name)
    }
}

impl Action for GridAction {
    fn to_vec(&self) -> Vec<f64> {
        vec![f64::from(self.code())]
    }
}

/// Ordered list of the four actions.
///
/// The order only affects listing and sampling. Drift neighbours always
/// come from the action codes, see [`GridAction::rotated`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridActionSpace {
    actions: [GridAction; 4],
}

impl GridActionSpace {
    /// Build from action codes; exactly four distinct codes in `0..4`
    pub fn from_codes(codes: &[u8]) -> Result<Self> {
        if codes.len() != 4 {
            return Err(RLError::configuration(format!(
                "expected 4 action codes, got {}",
                codes.len()
            )));
        }
        let mut actions = GridAction::ALL;
        for (slot, &code) in actions.iter_mut().zip(codes) {
            *slot = GridAction::try_from(code)
                .map_err(|_| RLError::configuration(format!("unknown action code {code}")))?;
        }
        let mut seen = [false; 4];
        for a in actions {
            let i = usize::from(a.code());
            if seen[i] {
                return Err(RLError::configuration(format!(
                    "action code {} listed twice in {codes:?}",
                    a.code()
                )));
            }
            seen[i] = true;
        }
        Ok(Self { actions })
    }

    /// The actions in configured order
    #[must_use]
    pub fn actions(&self) -> &[GridAction; 4] {
        &self.actions
    }
}

impl Default for GridActionSpace {
    fn default() -> Self {
        Self {
            actions: GridAction::ALL,
        }
    }
}

impl ActionSpace for GridActionSpace {
    type Action = GridAction;

    fn sample(&self, rng: &mut dyn RngCore) -> Self::Action {
        self.actions[rng.gen_range(0..self.actions.len())]
    }

    fn contains(&self, action: &Self::Action) -> bool {
        self.actions.contains(action)
    }

    fn n(&self) -> usize {
        self.actions.len()
    }
}

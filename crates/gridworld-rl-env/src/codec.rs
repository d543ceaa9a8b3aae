//! Grid coordinates and their scalar state encoding

use serde::{Deserialize, Serialize};
use std::fmt;

use gridworld_rl_core::{RLError, Result};

/// A cell of the grid: `x` is the column, `y` the row.
///
/// Serialized as an `[x, y]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct Coord {
    /// Column, `0 <= x < width`
    pub x: usize,
    /// Row, `0 <= y < height`
    pub y: usize,
}

impl Coord {
    /// Create a coordinate
    #[must_use]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl From<(usize, usize)> for Coord {
    fn from((x, y): (usize, usize)) -> Self {
        Self { x, y }
    }
}

impl From<Coord> for (usize, usize) {
    fn from(c: Coord) -> Self {
        (c.x, c.y)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Maps coordinates to state indices with `s = x * width + y` and back with
/// `(s / width, s % width)`.
///
/// The width is the modulus on both sides, so the mapping is a bijection onto
/// `[0, height * width)` only for square grids. See [`StateCodec::is_bijective`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateCodec {
    height: usize,
    width: usize,
    n_states: usize,
}

impl StateCodec {
    /// Create a codec for a `height x width` grid
    pub fn new(height: usize, width: usize) -> Result<Self> {
        if height == 0 || width == 0 {
            return Err(RLError::configuration(format!(
                "grid dimensions must be positive, got {height}x{width}"
            )));
        }
        let n_states = height.checked_mul(width).ok_or_else(|| {
            RLError::configuration(format!("{height}x{width} grid has too many states"))
        })?;
        Ok(Self {
            height,
            width,
            n_states,
        })
    }

    /// Number of rows
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of columns
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of states, `height * width`
    #[must_use]
    pub fn n_states(&self) -> usize {
        self.n_states
    }

    /// Whether `coord` lies inside the grid
    #[must_use]
    pub fn in_bounds(&self, coord: Coord) -> bool {
        coord.x < self.width && coord.y < self.height
    }

    /// Encode an in-bounds coordinate
    pub fn encode(&self, coord: Coord) -> Result<usize> {
        if !self.in_bounds(coord) {
            return Err(RLError::precondition(format!(
                "cannot encode {coord}: outside {}x{} grid",
                self.height, self.width
            )));
        }
        let state = coord.x * self.width + coord.y;
        if state >= self.n_states() {
            return Err(RLError::precondition(format!(
                "{coord} encodes to {state}, past the {} states of a {}x{} grid",
                self.n_states(),
                self.height,
                self.width
            )));
        }
        Ok(state)
    }

    /// Decode a state index back into its coordinate
    pub fn decode(&self, state: usize) -> Result<Coord> {
        if state >= self.n_states() {
            return Err(RLError::precondition(format!(
                "state {state} out of range [0, {})",
                self.n_states()
            )));
        }
        let coord = Coord::new(state / self.width, state % self.width);
        if !self.in_bounds(coord) {
            return Err(RLError::precondition(format!(
                "state {state} decodes to {coord}, outside {}x{} grid",
                self.height, self.width
            )));
        }
        Ok(coord)
    }

    /// Whether encode/decode are mutually inverse over every cell and state,
    /// which holds exactly when the grid is square
    #[must_use]
    pub fn is_bijective(&self) -> bool {
        self.height == self.width
    }

    /// All coordinates in row-major order
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Coord::new(x, y)))
    }
}

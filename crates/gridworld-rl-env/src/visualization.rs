//! Heat-map data for trajectories and policies
//!
//! The grid world only derives what to draw: a value grid, the cells to
//! annotate and the arrows at each of them. Drawing is delegated to a
//! [`HeatmapSink`]. [`TextHeatmap`] is a plain-text sink.

use std::collections::{HashMap, HashSet};

use ndarray::Array2;
use tracing::debug;

use gridworld_rl_core::{RLError, Result};

use crate::action::GridAction;
use crate::codec::Coord;
use crate::grid_world::GridWorld;

const POLICY_TITLE: &str = "Heat Map of Policy";
const TRAJECTORY_TITLE: &str = "Trajectory";

/// Arrow drawn for an action. Rows are drawn top to bottom with `y = 0`
/// first, so up and down are flipped.
#[must_use]
pub fn arrow(action: GridAction) -> char {
    match action {
        GridAction::Up => '↓',
        GridAction::Down => '↑',
        GridAction::Left => '←',
        GridAction::Right => '→',
    }
}

/// Something that can draw an annotated heat map
pub trait HeatmapSink {
    /// Draw `values` (indexed `[[y, x]]`) with `arrows[i]` placed at
    /// `locations[i]`. Both slices have the same length.
    fn draw(
        &mut self,
        values: &Array2<f64>,
        arrows: &[Vec<char>],
        locations: &[Coord],
        title: Option<&str>,
    ) -> Result<()>;
}

/// Renders heat maps as text, one line per row
#[derive(Debug, Clone, Default)]
pub struct TextHeatmap {
    rendered: String,
}

impl TextHeatmap {
    /// Create an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The last drawn heat map
    #[must_use]
    pub fn rendered(&self) -> &str {
        &self.rendered
    }
}

impl HeatmapSink for TextHeatmap {
    fn draw(
        &mut self,
        values: &Array2<f64>,
        arrows: &[Vec<char>],
        locations: &[Coord],
        title: Option<&str>,
    ) -> Result<()> {
        if arrows.len() != locations.len() {
            return Err(RLError::DimensionMismatch {
                expected: locations.len(),
                actual: arrows.len(),
            });
        }
        let (rows, cols) = values.dim();

        let mut marks: HashMap<Coord, String> = HashMap::new();
        for (&at, symbols) in locations.iter().zip(arrows) {
            if at.x >= cols || at.y >= rows {
                return Err(RLError::precondition(format!(
                    "cannot annotate {at}: outside {rows}x{cols} heat map"
                )));
            }
            let mark = marks.entry(at).or_default();
            for &c in symbols {
                if !mark.contains(c) {
                    mark.push(c);
                }
            }
        }

        let mut out = String::new();
        if let Some(title) = title {
            out.push_str(title);
            out.push('\n');
        }
        for y in 0..rows {
            let cells: Vec<String> = (0..cols)
                .map(|x| match marks.get(&Coord::new(x, y)) {
                    Some(mark) if !mark.is_empty() => format!("{mark:^7}"),
                    _ => format!("{:^7.2}", values[[y, x]]),
                })
                .collect();
            out.push_str(&cells.join("|"));
            out.push('\n');
        }
        self.rendered = out;
        Ok(())
    }
}

impl GridWorld {
    /// Draw the recorded trajectory: the executed action's arrow at the cell
    /// each step started from
    pub fn render_to(&self, sink: &mut dyn HeatmapSink) -> Result<()> {
        let transitions = &self.transitions().transitions;
        let arrows: Vec<Vec<char>> = transitions.iter().map(|t| vec![arrow(t.action)]).collect();
        let locations: Vec<Coord> = transitions.iter().map(|t| t.state).collect();
        sink.draw(self.expected_rewards(), &arrows, &locations, None)
    }

    /// Draw a tabular policy: for every non-terminal state, one arrow per
    /// action with non-zero probability in `pi[[state, action_code]]`.
    ///
    /// `values` defaults to the expected rewards and `title` to
    /// "Heat Map of Policy".
    #[allow(clippy::float_cmp)]
    pub fn plot_policy(
        &self,
        sink: &mut dyn HeatmapSink,
        pi: &Array2<f64>,
        values: Option<&Array2<f64>>,
        title: Option<&str>,
    ) -> Result<()> {
        let (n_states, n_actions) = pi.dim();
        if n_states != self.n_states() {
            return Err(RLError::DimensionMismatch {
                expected: self.n_states(),
                actual: n_states,
            });
        }
        if n_actions != self.n_actions() {
            return Err(RLError::DimensionMismatch {
                expected: self.n_actions(),
                actual: n_actions,
            });
        }

        let mut arrows = Vec::new();
        let mut locations = Vec::new();
        for (s, row) in pi.outer_iter().enumerate() {
            let at = self.decode_state(s)?;
            if self.is_terminal_state(at) {
                continue;
            }
            let symbols = GridAction::ALL
                .iter()
                .zip(row.iter())
                .filter(|(_, p)| **p != 0.0)
                .map(|(&a, _)| arrow(a))
                .collect();
            arrows.push(symbols);
            locations.push(at);
        }

        let values = values.unwrap_or_else(|| self.expected_rewards());
        sink.draw(values, &arrows, &locations, Some(title.unwrap_or(POLICY_TITLE)))
    }

    /// Cells visited and actions taken when following the deterministic
    /// policy `pi[state]` from the initial state with no drift.
    ///
    /// The returned cells start at the initial state and end at a terminal
    /// state, so there is one more cell than action.
    pub fn policy_rollout(&self, pi: &[GridAction]) -> Result<(Vec<Coord>, Vec<GridAction>)> {
        let start = self.initial_state().ok_or_else(|| {
            RLError::precondition("a policy roll-out needs a configured initial state")
        })?;
        if pi.len() != self.n_states() {
            return Err(RLError::DimensionMismatch {
                expected: self.n_states(),
                actual: pi.len(),
            });
        }

        let mut at = start;
        let mut visited = HashSet::from([start]);
        let mut locations = vec![start];
        let mut actions = Vec::new();
        while !self.is_terminal_state(at) {
            let action = pi[self.encode_state(at)?];
            at = self.move_agent(at, action);
            if !visited.insert(at) {
                return Err(RLError::precondition(format!(
                    "policy returns to {at} without reaching a terminal state"
                )));
            }
            actions.push(action);
            locations.push(at);
        }
        Ok((locations, actions))
    }

    /// Reset, then draw the roll-out of the deterministic policy `pi`. The
    /// terminal cell is drawn without an arrow. `title` defaults to
    /// "Trajectory".
    pub fn plot_trajectory(
        &mut self,
        sink: &mut dyn HeatmapSink,
        pi: &[GridAction],
        title: Option<&str>,
    ) -> Result<()> {
        let (locations, actions) = self.policy_rollout(pi)?;
        gridworld_rl_core::Environment::reset(self)?;
        debug!(steps = actions.len(), "policy roll-out");

        let mut arrows: Vec<Vec<char>> = actions.into_iter().map(|a| vec![arrow(a)]).collect();
        arrows.push(Vec::new());
        sink.draw(
            self.expected_rewards(),
            &arrows,
            &locations,
            Some(title.unwrap_or(TRAJECTORY_TITLE)),
        )
    }
}

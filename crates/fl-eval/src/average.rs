//! Moving-average filters.
//!
//! Both averages are sampled: the window only advances when a new device data
//! batch arrives. Recomputing between batches previews the value the current
//! input would produce without committing it.

use std::collections::VecDeque;

use fl_core::Real;
use fl_graph::FilterKind;

/// Moving-average configuration for one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovingAverage {
    pub kind: AverageKind,
    /// Window length in samples. Always at least 1.
    pub period: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AverageKind {
    Simple,
    Exponential,
}

/// Per-block averaging state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovingAverageState {
    /// Committed samples, oldest first (simple average).
    pub window: VecDeque<Real>,
    /// Last committed output (exponential average).
    pub last: Option<Real>,
}

impl MovingAverage {
    /// Build from a filter kind and its `period` parameter. Returns `None` for
    /// other filter kinds.
    pub fn for_filter(kind: FilterKind, period: Option<Real>) -> Option<Self> {
        let kind = match kind {
            FilterKind::SimpleMovingAverage => AverageKind::Simple,
            FilterKind::ExponentialMovingAverage => AverageKind::Exponential,
            _ => return None,
        };
        let period = period
            .filter(|p| p.is_finite())
            .map(|p| p.round().max(1.0) as usize)
            .unwrap_or(10);
        Some(Self { kind, period })
    }

    fn alpha(&self) -> Real {
        2.0 / (self.period as Real + 1.0)
    }

    /// Output for input `x`. When `commit` is set the sample is folded into
    /// the state.
    pub fn update(&self, state: &mut MovingAverageState, x: Real, commit: bool) -> Real {
        match self.kind {
            AverageKind::Simple => {
                let keep = self.period.saturating_sub(1);
                let skip = state.window.len().saturating_sub(keep);
                let (sum, count) = state
                    .window
                    .iter()
                    .skip(skip)
                    .fold((x, 1usize), |(s, c), v| (s + v, c + 1));
                if commit {
                    state.window.push_back(x);
                    while state.window.len() > self.period {
                        state.window.pop_front();
                    }
                }
                sum / count as Real
            }
            AverageKind::Exponential => {
                let out = match state.last {
                    Some(prev) => self.alpha() * x + (1.0 - self.alpha()) * prev,
                    None => x,
                };
                if commit {
                    state.last = Some(out);
                }
                out
            }
        }
    }
}

//! Coarse-to-fine pose search.
//!
//! A search runs a fixed list of rounds. Round 0 (the coarse round) generates
//! a wide, sparse grid around the starting center; each later round (a refine
//! round) generates a narrower grid centered on the previous round's winner.
//! Within a round every candidate is produced, scored against the observed
//! image, and the extremum kept with a first-improvement-wins tie-break.
//!
//! Because each grid contains its exact center and providers are
//! deterministic, a refine round can never return a worse score than the
//! round before it.

mod controller;

pub use controller::SearchController;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::similarity::ScoreDirection;

/// Grid resolution of one round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundSpec {
    /// Spacing between neighbouring candidates on both axes.
    pub step: f64,
    /// Candidates extend `half_extent` steps either side of the center.
    pub half_extent: i32,
}

impl RoundSpec {
    pub fn new(step: f64, half_extent: i32) -> Self {
        Self { step, half_extent }
    }
}

/// Shared flag used to abort a running search.
///
/// Clones share the same flag. The controller checks it before every
/// candidate.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Parameters controlling a search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Rounds in execution order. Default: step 10 / half extent 18, then
    /// step 1 / half extent 2.
    pub rounds: Vec<RoundSpec>,
    /// Produce and score a round's candidates on the rayon thread pool.
    /// Results are identical to the sequential path. Default: false
    pub parallel: bool,
    /// Cancellation flag checked before each candidate.
    pub cancel: CancelToken,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            rounds: vec![RoundSpec::new(10.0, 18), RoundSpec::new(1.0, 2)],
            parallel: false,
            cancel: CancelToken::new(),
        }
    }
}

/// Position of a round in the coarse-to-fine sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStage {
    Coarse,
    /// Refine round `n`, counting from 1.
    Refine(usize),
}

impl SearchStage {
    pub fn for_round(round: usize) -> Self {
        if round == 0 {
            SearchStage::Coarse
        } else {
            SearchStage::Refine(round)
        }
    }
}

impl fmt::Display for SearchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchStage::Coarse => write!(f, "coarse"),
            SearchStage::Refine(1) => write!(f, "refined"),
            SearchStage::Refine(n) => write!(f, "refined ({n})"),
        }
    }
}

/// Winner of one round.
#[derive(Debug, Clone)]
pub struct MatchResult<C, I> {
    pub round: usize,
    pub stage: SearchStage,
    /// Index of the winner in the round's enumeration order.
    pub best_index: usize,
    pub best: C,
    pub score: f64,
    pub direction: ScoreDirection,
    /// Candidates generated for the round.
    pub attempted: usize,
    /// Candidates skipped because no image could be produced or scored.
    pub skipped: usize,
    /// The winning candidate's image.
    pub image: I,
}

/// Results of every round of a search, in order.
#[derive(Debug, Clone)]
pub struct SearchOutcome<C, I> {
    rounds: Vec<MatchResult<C, I>>,
}

impl<C, I> SearchOutcome<C, I> {
    pub fn rounds(&self) -> &[MatchResult<C, I>] {
        &self.rounds
    }

    /// Winner of the last round. A completed search always has at least one.
    pub fn final_match(&self) -> &MatchResult<C, I> {
        &self.rounds[self.rounds.len() - 1]
    }

    pub fn into_final_match(mut self) -> Option<MatchResult<C, I>> {
        self.rounds.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names() {
        assert_eq!(SearchStage::for_round(0), SearchStage::Coarse);
        assert_eq!(SearchStage::for_round(2), SearchStage::Refine(2));
        assert_eq!(SearchStage::Coarse.to_string(), "coarse");
        assert_eq!(SearchStage::Refine(1).to_string(), "refined");
    }

    #[test]
    fn cancel_is_shared_between_clones() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn default_rounds_match_coarse_then_refine() {
        let cfg = SearchConfig::default();
        assert_eq!(cfg.rounds, vec![RoundSpec::new(10.0, 18), RoundSpec::new(1.0, 2)]);
    }
}

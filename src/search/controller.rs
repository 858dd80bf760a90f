use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{CandidateError, Error, ScoreError, SearchError};
use crate::grid::{CandidateGrid, CandidateSet};
use crate::provider::ImageProvider;
use crate::similarity::{ScoreDirection, Scorer};

use super::{MatchResult, SearchConfig, SearchOutcome, SearchStage};

/// Runs rounds of candidate evaluation against one observed image.
///
/// The controller owns an [`ImageProvider`] that turns coordinates into
/// images and a [`Scorer`] that compares them with the observation. The two
/// must agree on the image type.
pub struct SearchController<P, S> {
    provider: P,
    scorer: S,
    config: SearchConfig,
}

enum Evaluation<I> {
    Scored(f64, I),
    Skipped,
    /// Produced, but the scorer refused to compare it with the observation.
    Rejected(ScoreError),
    Cancelled,
}

struct Scored<I> {
    index: usize,
    score: f64,
    image: I,
}

/// Running reduction over a round. Merging two tallies is order independent:
/// the better score wins and equal scores keep the lower enumeration index,
/// which is exactly what a sequential first-improvement scan selects.
struct Tally<I> {
    best: Option<Scored<I>>,
    skipped: usize,
    /// Skipped candidates that were rejected by the scorer, with the
    /// rejection of the earliest one.
    rejected: usize,
    first_rejection: Option<(usize, ScoreError)>,
    cancelled: bool,
}

impl<I> Tally<I> {
    fn empty() -> Self {
        Self {
            best: None,
            skipped: 0,
            rejected: 0,
            first_rejection: None,
            cancelled: false,
        }
    }

    fn single(index: usize, evaluation: Evaluation<I>, direction: ScoreDirection) -> Self {
        let mut tally = Self::empty();
        tally.absorb(index, evaluation, direction);
        tally
    }

    fn absorb(&mut self, index: usize, evaluation: Evaluation<I>, direction: ScoreDirection) {
        match evaluation {
            Evaluation::Scored(score, image) => self.offer(Scored { index, score, image }, direction),
            Evaluation::Skipped => self.skipped += 1,
            Evaluation::Rejected(e) => {
                self.skipped += 1;
                self.rejected += 1;
                self.note_rejection(index, e);
            }
            Evaluation::Cancelled => self.cancelled = true,
        }
    }

    fn note_rejection(&mut self, index: usize, error: ScoreError) {
        let earlier = match &self.first_rejection {
            None => true,
            Some((first, _)) => index < *first,
        };
        if earlier {
            self.first_rejection = Some((index, error));
        }
    }

    fn offer(&mut self, candidate: Scored<I>, direction: ScoreDirection) {
        let replace = match &self.best {
            None => true,
            Some(best) => {
                direction.is_improvement(candidate.score, best.score)
                    || (candidate.score == best.score && candidate.index < best.index)
            }
        };
        if replace {
            self.best = Some(candidate);
        }
    }

    fn merge(mut self, other: Self, direction: ScoreDirection) -> Self {
        self.skipped += other.skipped;
        self.rejected += other.rejected;
        self.cancelled |= other.cancelled;
        if let Some((index, error)) = other.first_rejection {
            self.note_rejection(index, error);
        }
        if let Some(best) = other.best {
            self.offer(best, direction);
        }
        self
    }
}

impl<P, S> SearchController<P, S>
where
    P: ImageProvider,
    S: Scorer<Image = P::Image>,
{
    pub fn new(provider: P, scorer: S, config: SearchConfig) -> Self {
        Self {
            provider,
            scorer,
            config,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SearchConfig {
        &mut self.config
    }

    pub fn into_parts(self) -> (P, S, SearchConfig) {
        (self.provider, self.scorer, self.config)
    }

    fn evaluate(&self, coord: &P::Coord, observed: &P::Image) -> Evaluation<P::Image> {
        if self.config.cancel.is_cancelled() {
            return Evaluation::Cancelled;
        }
        let image = match self.provider.produce(coord) {
            Ok(image) => image,
            Err(e) => {
                warn!("Skipping candidate {coord}: {e}");
                return Evaluation::Skipped;
            }
        };
        // Producing may take long enough for a cancel to arrive.
        if self.config.cancel.is_cancelled() {
            return Evaluation::Cancelled;
        }
        match self.scorer.compare(observed, &image) {
            Ok(score) if score.is_nan() => {
                debug!("Candidate {coord} scored NaN; using worst score");
                Evaluation::Scored(self.scorer.worst_score(), image)
            }
            Ok(score) => {
                debug!("Candidate {coord}: score {score:.6}");
                Evaluation::Scored(score, image)
            }
            Err(e) => {
                warn!("Skipping candidate {coord}: {}", CandidateError::from(e.clone()));
                Evaluation::Rejected(e)
            }
        }
    }

    /// Produce and score every candidate of one round and return the best.
    ///
    /// Candidates that cannot be produced or scored are skipped. Among equal
    /// scores the earliest candidate in enumeration order wins.
    ///
    /// # Errors
    ///
    /// * [`SearchError::EmptyCandidateSet`] if `candidates` is empty.
    /// * [`RenderError`](crate::RenderError) if the provider fails to prepare
    ///   the round.
    /// * [`ScoreError`] if every candidate was produced but none could be
    ///   compared with `observed`, e.g. because the sizes differ.
    /// * [`SearchError::NoViableCandidates`] if every candidate was skipped
    ///   for any other mix of reasons.
    /// * [`SearchError::Cancelled`] if the cancel token was set.
    pub fn run_round(
        &mut self,
        round: usize,
        candidates: &CandidateSet<P::Coord>,
        observed: &P::Image,
    ) -> Result<MatchResult<P::Coord, P::Image>, Error> {
        if candidates.is_empty() {
            return Err(SearchError::EmptyCandidateSet { round }.into());
        }
        if self.config.cancel.is_cancelled() {
            return Err(SearchError::Cancelled { round }.into());
        }

        let t0 = Instant::now();
        self.provider.prepare(round, candidates)?;

        let direction = self.scorer.direction();
        let tally = if self.config.parallel {
            candidates
                .as_slice()
                .par_iter()
                .enumerate()
                .map(|(i, c)| Tally::single(i, self.evaluate(c, observed), direction))
                .reduce(Tally::empty, |a, b| a.merge(b, direction))
        } else {
            let mut tally = Tally::empty();
            for (i, c) in candidates.iter().enumerate() {
                tally.absorb(i, self.evaluate(c, observed), direction);
                if tally.cancelled {
                    break;
                }
            }
            tally
        };

        if tally.cancelled {
            info!("Round {round} cancelled");
            return Err(SearchError::Cancelled { round }.into());
        }
        if tally.best.is_none() && tally.rejected == candidates.len() {
            if let Some((_, error)) = tally.first_rejection {
                return Err(error.into());
            }
        }
        let winner = tally.best.and_then(|best| {
            let coord = candidates.get(best.index)?;
            Some((best, coord))
        });
        let Some((best, coord)) = winner else {
            return Err(SearchError::NoViableCandidates {
                round,
                attempted: candidates.len(),
            }
            .into());
        };

        let stage = SearchStage::for_round(round);
        info!(
            "Round {} ({}): best {} with score {:.6} ({} of {} candidates scored, {:.2} s)",
            round,
            stage,
            coord,
            best.score,
            candidates.len() - tally.skipped,
            candidates.len(),
            t0.elapsed().as_secs_f32()
        );

        Ok(MatchResult {
            round,
            stage,
            best_index: best.index,
            best: coord.clone(),
            score: best.score,
            direction,
            attempted: candidates.len(),
            skipped: tally.skipped,
            image: best.image,
        })
    }

    /// Coarse-to-fine search starting at `center`.
    ///
    /// Each configured round generates a grid around the current center with
    /// that round's step and half extent, then recenters on the round's
    /// winner. Returns the winner of every round.
    pub fn search<G>(
        &mut self,
        grid: &G,
        center: P::Coord,
        observed: &P::Image,
    ) -> Result<SearchOutcome<P::Coord, P::Image>, Error>
    where
        G: CandidateGrid<Coord = P::Coord>,
    {
        if self.config.rounds.is_empty() {
            return Err(SearchError::NoRounds.into());
        }
        let specs = self.config.rounds.clone();
        let mut center = center;
        let mut rounds = Vec::with_capacity(specs.len());
        for (round, spec) in specs.iter().enumerate() {
            let candidates = grid.generate(&center, spec.step, spec.half_extent);
            info!(
                "Round {round} ({}): {} candidates around {center} (step {}, half extent {})",
                SearchStage::for_round(round),
                candidates.len(),
                spec.step,
                spec.half_extent
            );
            let result = self.run_round(round, &candidates, observed)?;
            center = result.best.clone();
            rounds.push(result);
        }
        Ok(SearchOutcome { rounds })
    }
}

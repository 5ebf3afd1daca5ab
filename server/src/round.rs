//! The per-round state machine and the scoring formula
//!
//! ```text
//! Idle --request_words--> Selecting --choose--> Active --correct guess--> Resolved
//!                             ^                                              |
//!                             +---------- restart / request_words -----------+
//! ```
//!
//! Only the drawing authority on the host drives `request_words`, `choose`,
//! `relay_stroke` and `restart`; guesses come from any client. Elapsed time
//! never forces a transition, it only feeds the drawer's award.

use crate::error::RoundError;
use crate::words::{WordEntry, WordList};
use log::{debug, info};
use rand::Rng;
use shared::{Stroke, MAX_POINTS_FOR_DRAWING, MIN_POINTS_FOR_DRAWING, POINTS_FOR_GUESS};
use std::time::Instant;

/// Seconds a drawer may take before the award starts decaying
const FULL_AWARD_SECS: u64 = 20;
/// Length of each decay step once past the full-award window
const DECAY_STEP_SECS: u64 = 20;
const DECAY_PER_STEP: u64 = 50;

#[derive(Debug, Clone)]
pub enum RoundState {
    Idle,
    Selecting {
        candidates: Vec<WordEntry>,
    },
    Active {
        word: WordEntry,
        started_at: Instant,
    },
    Resolved {
        word: WordEntry,
        winner: String,
        duration_secs: u64,
    },
}

impl RoundState {
    pub fn name(&self) -> &'static str {
        match self {
            RoundState::Idle => "idle",
            RoundState::Selecting { .. } => "selecting",
            RoundState::Active { .. } => "active",
            RoundState::Resolved { .. } => "resolved",
        }
    }
}

/// Everything decided when a guess ends the round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub winner: String,
    pub word: WordEntry,
    pub duration_secs: u64,
    pub guesser_award: u32,
    pub drawer_award: u32,
}

/// Points for the drawing authority after a round lasting `elapsed_secs`
///
/// Full award up to 20 s, then 50 points less for each started 20 s step
/// beyond that, never below the minimum.
pub fn drawer_award(elapsed_secs: u64) -> u32 {
    if elapsed_secs <= FULL_AWARD_SECS {
        return MAX_POINTS_FOR_DRAWING;
    }

    let extra = elapsed_secs - FULL_AWARD_SECS;
    let reductions = 1 + extra / DECAY_STEP_SECS;
    let award = u64::from(MAX_POINTS_FOR_DRAWING)
        .saturating_sub(reductions.saturating_mul(DECAY_PER_STEP))
        .max(u64::from(MIN_POINTS_FOR_DRAWING));

    award as u32
}

/// The single round owned by the game loop
#[derive(Debug)]
pub struct Round {
    state: RoundState,
}

impl Default for Round {
    fn default() -> Self {
        Self::new()
    }
}

impl Round {
    pub fn new() -> Self {
        Self {
            state: RoundState::Idle,
        }
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    /// Idle or Resolved -> Selecting: offers three fresh candidates
    pub fn request_words<R: Rng + ?Sized>(
        &mut self,
        words: &WordList,
        rng: &mut R,
    ) -> Result<Vec<WordEntry>, RoundError> {
        match self.state {
            RoundState::Idle | RoundState::Resolved { .. } => self.begin_selection(words, rng),
            _ => Err(self.invalid("request words")),
        }
    }

    /// Resolved -> Selecting: the explicit restart after a finished round
    pub fn restart<R: Rng + ?Sized>(
        &mut self,
        words: &WordList,
        rng: &mut R,
    ) -> Result<Vec<WordEntry>, RoundError> {
        match self.state {
            RoundState::Resolved { .. } => self.begin_selection(words, rng),
            _ => Err(self.invalid("restart")),
        }
    }

    /// Selecting -> Active: commits one candidate and starts the clock
    pub fn choose(&mut self, index: usize, now: Instant) -> Result<WordEntry, RoundError> {
        let word = match &self.state {
            RoundState::Selecting { candidates } => candidates
                .get(index)
                .cloned()
                .ok_or(RoundError::NoSuchCandidate(index))?,
            _ => return Err(self.invalid("choose a word")),
        };

        info!("Round started with word '{}'", word.label());
        self.state = RoundState::Active {
            word: word.clone(),
            started_at: now,
        };

        Ok(word)
    }

    /// Passes a stroke through for broadcast; only allowed while the round is active
    ///
    /// Strokes are not interpreted or kept here, the canvas lives on the clients.
    pub fn relay_stroke(&self, stroke: Stroke) -> Result<Stroke, RoundError> {
        match self.state {
            RoundState::Active { .. } => Ok(stroke),
            _ => Err(self.invalid("draw")),
        }
    }

    /// Checks a chat line against the active word
    ///
    /// Returns the resolution exactly once, on the guess that ends the round.
    /// Guesses outside the active state are ignored.
    pub fn evaluate_guess(
        &mut self,
        username: &str,
        text: &str,
        now: Instant,
    ) -> Option<Resolution> {
        let (word, started_at) = match &self.state {
            RoundState::Active {
                word, started_at, ..
            } if word.matches(text) => (word.clone(), *started_at),
            _ => return None,
        };

        let duration_secs = now.saturating_duration_since(started_at).as_secs();
        let resolution = Resolution {
            winner: username.to_string(),
            word: word.clone(),
            duration_secs,
            guesser_award: POINTS_FOR_GUESS,
            drawer_award: drawer_award(duration_secs),
        };

        info!(
            "{} guessed '{}' after {}s",
            username,
            word.label(),
            duration_secs
        );
        self.state = RoundState::Resolved {
            word,
            winner: username.to_string(),
            duration_secs,
        };

        Some(resolution)
    }

    pub fn is_drawing_enabled(&self) -> bool {
        matches!(self.state, RoundState::Active { .. })
    }

    pub fn active_word(&self) -> Option<&WordEntry> {
        match &self.state {
            RoundState::Active { word, .. } => Some(word),
            _ => None,
        }
    }

    /// Whole seconds since the round started, while it is active
    pub fn elapsed_secs(&self, now: Instant) -> Option<u64> {
        match &self.state {
            RoundState::Active { started_at, .. } => {
                Some(now.saturating_duration_since(*started_at).as_secs())
            }
            _ => None,
        }
    }

    fn begin_selection<R: Rng + ?Sized>(
        &mut self,
        words: &WordList,
        rng: &mut R,
    ) -> Result<Vec<WordEntry>, RoundError> {
        let candidates = words.select_candidates(rng)?;
        debug!(
            "Offering candidates: {:?}",
            candidates.iter().map(|w| w.label()).collect::<Vec<_>>()
        );
        self.state = RoundState::Selecting {
            candidates: candidates.clone(),
        };
        Ok(candidates)
    }

    fn invalid(&self, action: &'static str) -> RoundError {
        RoundError::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WordError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    fn entry(variants: &[&str]) -> WordEntry {
        WordEntry::new(variants.iter().map(|v| v.to_string()).collect())
    }

    fn corpus() -> WordList {
        WordList::new(vec![
            entry(&["Haus", "House", "Будинок"]),
            entry(&["Baum", "Tree", "Дерево"]),
            entry(&["Katze", "Cat", "Кіт"]),
        ])
    }

    fn stroke() -> Stroke {
        Stroke {
            prev_x: 1,
            prev_y: 2,
            x: 3,
            y: 4,
            color: -16777216,
            width: 5,
        }
    }

    /// Drives a round to Active with the House entry committed
    fn active_round(now: Instant) -> Round {
        let mut round = Round::new();
        let mut rng = StdRng::seed_from_u64(3);
        let candidates = round.request_words(&corpus(), &mut rng).unwrap();
        let index = candidates
            .iter()
            .position(|w| w.label() == "House")
            .unwrap();
        round.choose(index, now).unwrap();
        round
    }

    #[test]
    fn test_drawer_award_table() {
        assert_eq!(drawer_award(0), 400);
        assert_eq!(drawer_award(20), 400);
        assert_eq!(drawer_award(21), 350);
        assert_eq!(drawer_award(39), 350);
        assert_eq!(drawer_award(40), 300);
        assert_eq!(drawer_award(61), 250);
        assert_eq!(drawer_award(140), 100);
        assert_eq!(drawer_award(1000), 100);
        assert_eq!(drawer_award(u64::MAX), 100);
    }

    #[test]
    fn test_initial_state_is_idle() {
        let round = Round::new();
        assert!(matches!(round.state(), RoundState::Idle));
        assert!(!round.is_drawing_enabled());
        assert!(round.active_word().is_none());
    }

    #[test]
    fn test_full_cycle() {
        let start = Instant::now();
        let mut round = active_round(start);
        assert!(round.is_drawing_enabled());
        assert_eq!(round.active_word().unwrap().label(), "House");

        assert!(round
            .evaluate_guess("bob", "tree", start + Duration::from_secs(5))
            .is_none());

        let resolution = round
            .evaluate_guess("bob", "hOUSE", start + Duration::from_millis(21_900))
            .unwrap();
        assert_eq!(resolution.winner, "bob");
        assert_eq!(resolution.duration_secs, 21);
        assert_eq!(resolution.guesser_award, 200);
        assert_eq!(resolution.drawer_award, 350);
        assert!(!round.is_drawing_enabled());
        assert!(matches!(round.state(), RoundState::Resolved { .. }));

        let mut rng = StdRng::seed_from_u64(9);
        let candidates = round.restart(&corpus(), &mut rng).unwrap();
        assert_eq!(candidates.len(), 3);
        assert!(matches!(round.state(), RoundState::Selecting { .. }));
    }

    #[test]
    fn test_request_words_after_resolution() {
        let mut round = Round::new();
        let mut rng = StdRng::seed_from_u64(5);
        let now = Instant::now();

        round.request_words(&corpus(), &mut rng).unwrap();
        let word = round.choose(2, now).unwrap();
        round.evaluate_guess("bob", word.label(), now).unwrap();

        assert_eq!(round.request_words(&corpus(), &mut rng).unwrap().len(), 3);
        assert!(matches!(round.state(), RoundState::Selecting { .. }));
    }

    #[test]
    fn test_resolution_happens_once() {
        let start = Instant::now();
        let mut round = active_round(start);

        assert!(round.evaluate_guess("bob", "house", start).is_some());
        assert!(round.evaluate_guess("carol", "house", start).is_none());
    }

    #[test]
    fn test_guess_outside_active_is_ignored() {
        let mut round = Round::new();
        assert!(round.evaluate_guess("bob", "house", Instant::now()).is_none());
    }

    #[test]
    fn test_invalid_transitions() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut round = Round::new();

        assert_eq!(
            round.choose(0, Instant::now()).unwrap_err(),
            RoundError::InvalidTransition {
                action: "choose a word",
                state: "idle",
            }
        );
        assert!(round.restart(&corpus(), &mut rng).is_err());

        round.request_words(&corpus(), &mut rng).unwrap();
        assert!(round.request_words(&corpus(), &mut rng).is_err());
        assert_eq!(
            round.choose(3, Instant::now()).unwrap_err(),
            RoundError::NoSuchCandidate(3)
        );
        assert!(matches!(round.state(), RoundState::Selecting { .. }));

        round.choose(0, Instant::now()).unwrap();
        assert!(round.restart(&corpus(), &mut rng).is_err());
        assert!(round.request_words(&corpus(), &mut rng).is_err());
    }

    #[test]
    fn test_strokes_only_while_active() {
        let round = Round::new();
        assert!(round.relay_stroke(stroke()).is_err());

        let start = Instant::now();
        let mut round = active_round(start);
        assert_eq!(round.relay_stroke(stroke()), Ok(stroke()));
        assert!(round.is_drawing_enabled());

        round.evaluate_guess("bob", "Haus", start).unwrap();
        assert!(!round.is_drawing_enabled());
        assert_eq!(
            round.relay_stroke(stroke()).unwrap_err(),
            RoundError::InvalidTransition {
                action: "draw",
                state: "resolved",
            }
        );
    }

    #[test]
    fn test_relay_enabled_again_after_restart() {
        let start = Instant::now();
        let mut round = active_round(start);
        round.evaluate_guess("bob", "house", start).unwrap();

        let mut rng = StdRng::seed_from_u64(5);
        round.restart(&corpus(), &mut rng).unwrap();
        assert!(round.relay_stroke(stroke()).is_err());

        round.choose(1, start).unwrap();
        assert_eq!(round.relay_stroke(stroke()), Ok(stroke()));
    }

    #[test]
    fn test_elapsed_secs() {
        let start = Instant::now();
        let round = active_round(start);

        assert_eq!(round.elapsed_secs(start + Duration::from_millis(2500)), Some(2));
        assert_eq!(Round::new().elapsed_secs(start), None);
    }

    #[test]
    fn test_small_corpus_keeps_state() {
        let mut round = Round::new();
        let words = WordList::new(vec![entry(&["Haus", "House"])]);
        let mut rng = StdRng::seed_from_u64(0);

        assert_eq!(
            round.request_words(&words, &mut rng).unwrap_err(),
            RoundError::Words(WordError::CorpusTooSmall {
                available: 1,
                required: 3,
            })
        );
        assert!(matches!(round.state(), RoundState::Idle));
    }
}

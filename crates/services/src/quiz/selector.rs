use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use std::fmt;

use quiz_core::model::Question;

use crate::error::QuizError;

/// Theme value that selects the whole bank.
pub const THEME_ALL: &str = "all";

/// Normalizes the learner's theme choice: `None` and `"all"` both mean "no filter".
#[must_use]
pub fn theme_filter(theme: Option<&str>) -> Option<&str> {
    theme.filter(|t| *t != THEME_ALL)
}

/// Picks and orders the questions for one attempt.
///
/// The random source is injected so tests can pin the shuffle with a seed.
pub struct QuestionSelector {
    rng: Box<dyn RngCore + Send>,
}

impl QuestionSelector {
    /// Selector backed by an OS-seeded generator.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Selector with a reproducible shuffle sequence.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    #[must_use]
    pub fn with_rng(rng: impl RngCore + Send + 'static) -> Self {
        Self { rng: Box::new(rng) }
    }

    /// Filter `bank` by `theme` and return a fresh uniform shuffle of the matches.
    ///
    /// Theme matching is exact and case-sensitive. Every call shuffles again; no order is
    /// cached between attempts.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptySelection` if no question matches.
    pub fn select(
        &mut self,
        bank: &[Question],
        theme: Option<&str>,
    ) -> Result<Vec<Question>, QuizError> {
        let filter = theme_filter(theme);
        let mut selected: Vec<Question> = bank
            .iter()
            .filter(|q| filter.is_none_or(|t| q.theme() == t))
            .cloned()
            .collect();

        if selected.is_empty() {
            return Err(QuizError::EmptySelection {
                theme: filter.map(ToString::to_string),
            });
        }

        selected.as_mut_slice().shuffle(&mut *self.rng);
        Ok(selected)
    }
}

impl Default for QuestionSelector {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl fmt::Debug for QuestionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuestionSelector").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::test_support::{bank, question};

    #[test]
    fn all_and_absent_theme_select_whole_bank() {
        let bank = bank();
        let mut selector = QuestionSelector::seeded(1);
        assert_eq!(selector.select(&bank, None).unwrap().len(), bank.len());
        assert_eq!(
            selector.select(&bank, Some(THEME_ALL)).unwrap().len(),
            bank.len()
        );
    }

    #[test]
    fn theme_filter_is_exact() {
        let bank = bank();
        let mut selector = QuestionSelector::seeded(1);
        let history = selector.select(&bank, Some("history")).unwrap();
        assert_eq!(history.len(), 3);
        assert!(history.iter().all(|q| q.theme() == "history"));

        let err = selector.select(&bank, Some("History")).unwrap_err();
        assert_eq!(
            err,
            QuizError::EmptySelection {
                theme: Some("History".into())
            }
        );
    }

    #[test]
    fn empty_bank_is_an_empty_selection() {
        let mut selector = QuestionSelector::seeded(1);
        assert_eq!(
            selector.select(&[], None),
            Err(QuizError::EmptySelection { theme: None })
        );
    }

    #[test]
    fn selection_is_a_permutation_of_matches() {
        let bank = bank();
        let mut selector = QuestionSelector::seeded(7);
        let mut ids: Vec<_> = selector
            .select(&bank, None)
            .unwrap()
            .iter()
            .map(|q| q.id().clone())
            .collect();
        ids.sort();
        let mut expected: Vec<_> = bank.iter().map(|q| q.id().clone()).collect();
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[test]
    fn same_seed_gives_same_order_and_reselecting_reshuffles() {
        let bank: Vec<_> = (0..12).map(|i| question(&format!("q{i}"), "tech", 0)).collect();
        let order = |qs: Vec<Question>| qs.iter().map(|q| q.id().clone()).collect::<Vec<_>>();

        let mut a = QuestionSelector::seeded(42);
        let mut b = QuestionSelector::seeded(42);
        let first = order(a.select(&bank, None).unwrap());
        assert_eq!(first, order(b.select(&bank, None).unwrap()));

        // Later draws from the same selector are independent shuffles.
        let later: Vec<_> = (0..5).map(|_| order(a.select(&bank, None).unwrap())).collect();
        assert!(later.iter().any(|o| *o != first));
    }
}

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RankTableError {
    #[error("rank table cannot be empty")]
    Empty,

    #[error("first rank threshold must be 0, got {threshold}")]
    FirstThresholdNotZero { threshold: u32 },

    #[error("rank thresholds must be ascending (entry {index} is lower than its predecessor)")]
    Unordered { index: usize },

    #[error("rank label at entry {index} cannot be empty")]
    EmptyLabel { index: usize },
}

/// One rung of the progression ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankEntry {
    pub threshold_score: u32,
    pub label: String,
}

impl RankEntry {
    #[must_use]
    pub fn new(threshold_score: u32, label: impl Into<String>) -> Self {
        Self {
            threshold_score,
            label: label.into(),
        }
    }

    #[must_use]
    pub fn is_reached(&self, score: u32) -> bool {
        score >= self.threshold_score
    }
}

/// Where a score sits on the ladder, for progress displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankProgress {
    pub current: RankEntry,
    pub next: Option<RankEntry>,
    pub points_to_next: u32,
    /// Share of the span between `current` and `next` already covered, 0..=100.
    pub percent: u8,
}

/// Ordered ladder mapping a minimum cumulative score to a rank label.
///
/// Entries are sorted ascending by threshold and the first threshold is 0, so every
/// score has a rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankTable {
    entries: Vec<RankEntry>,
}

impl RankTable {
    /// Build a ladder from entries in ascending threshold order.
    ///
    /// Equal thresholds are allowed; the later entry wins lookups.
    ///
    /// # Errors
    ///
    /// Returns `RankTableError` if the ladder is empty, does not start at 0,
    /// is not ascending, or has a blank label.
    pub fn new(entries: Vec<RankEntry>) -> Result<Self, RankTableError> {
        let first = entries.first().ok_or(RankTableError::Empty)?;
        if first.threshold_score != 0 {
            return Err(RankTableError::FirstThresholdNotZero {
                threshold: first.threshold_score,
            });
        }
        for (index, pair) in entries.windows(2).enumerate() {
            if pair[1].threshold_score < pair[0].threshold_score {
                return Err(RankTableError::Unordered { index: index + 1 });
            }
        }
        if let Some(index) = entries.iter().position(|e| e.label.trim().is_empty()) {
            return Err(RankTableError::EmptyLabel { index });
        }
        Ok(Self { entries })
    }

    #[must_use]
    pub fn entries(&self) -> &[RankEntry] {
        &self.entries
    }

    /// Returns the entry with the greatest threshold not above `score`.
    #[must_use]
    pub fn rank_for(&self, score: u32) -> &RankEntry {
        let reached = self
            .entries
            .partition_point(|entry| entry.threshold_score <= score);
        // Validation guarantees entries[0].threshold_score == 0, so reached >= 1.
        &self.entries[reached.saturating_sub(1)]
    }

    /// Returns the first entry not yet reached by `score`.
    #[must_use]
    pub fn next_after(&self, score: u32) -> Option<&RankEntry> {
        self.entries
            .iter()
            .find(|entry| entry.threshold_score > score)
    }

    #[must_use]
    pub fn progress(&self, score: u32) -> RankProgress {
        let current = self.rank_for(score).clone();
        let next = self.next_after(score).cloned();

        let (points_to_next, percent) = match &next {
            Some(next) => {
                let span = next.threshold_score - current.threshold_score;
                let covered = score - current.threshold_score;
                let percent = u64::from(covered) * 100 / u64::from(span.max(1));
                (
                    next.threshold_score - score,
                    u8::try_from(percent.min(100)).unwrap_or(100),
                )
            }
            None => (0, 100),
        };

        RankProgress {
            current,
            next,
            points_to_next,
            percent,
        }
    }
}

impl Default for RankTable {
    /// The cord ladder used by the learner app.
    fn default() -> Self {
        let entries = [
            (0, "Aluno Novo (Iniciante)"),
            (1, "Cordão Cru (Iniciante)"),
            (3, "Cordão Amarelo (Estagiário)"),
            (5, "Cordão Laranja (Graduado)"),
            (8, "Cordão Azul (Instrutor)"),
            (12, "Cordão Verde (Professor)"),
            (18, "Cordão Roxo (Mestre)"),
            (25, "Cordão Marrom (Contramestre)"),
            (35, "Cordão Vermelho (Mestre)"),
        ]
        .into_iter()
        .map(|(threshold, label)| RankEntry::new(threshold, label))
        .collect();
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ladder() -> RankTable {
        RankTable::new(vec![
            RankEntry::new(0, "Novice"),
            RankEntry::new(5, "Graduate"),
            RankEntry::new(8, "Instructor"),
        ])
        .unwrap()
    }

    #[test]
    fn rank_for_picks_highest_reached_threshold() {
        let table = ladder();
        assert_eq!(table.rank_for(0).label, "Novice");
        assert_eq!(table.rank_for(4).label, "Novice");
        assert_eq!(table.rank_for(5).label, "Graduate");
        assert_eq!(table.rank_for(7).label, "Graduate");
        assert_eq!(table.rank_for(8).label, "Instructor");
        assert_eq!(table.rank_for(u32::MAX).label, "Instructor");
    }

    #[test]
    fn rank_for_is_monotonic_over_default_ladder() {
        let table = RankTable::default();
        for score in 0..60 {
            let rank = table.rank_for(score);
            assert!(rank.threshold_score <= score);
            assert!(
                !table
                    .entries()
                    .iter()
                    .any(|e| e.threshold_score <= score && e.threshold_score > rank.threshold_score)
            );
        }
    }

    #[test]
    fn tied_thresholds_prefer_later_entry() {
        let table = RankTable::new(vec![
            RankEntry::new(0, "A"),
            RankEntry::new(3, "B"),
            RankEntry::new(3, "C"),
        ])
        .unwrap();
        assert_eq!(table.rank_for(3).label, "C");
        assert_eq!(table.rank_for(2).label, "A");
    }

    #[test]
    fn new_rejects_invalid_ladders() {
        assert_eq!(RankTable::new(Vec::new()), Err(RankTableError::Empty));
        assert_eq!(
            RankTable::new(vec![RankEntry::new(1, "A")]),
            Err(RankTableError::FirstThresholdNotZero { threshold: 1 })
        );
        assert_eq!(
            RankTable::new(vec![
                RankEntry::new(0, "A"),
                RankEntry::new(5, "B"),
                RankEntry::new(4, "C"),
            ]),
            Err(RankTableError::Unordered { index: 2 })
        );
        assert_eq!(
            RankTable::new(vec![RankEntry::new(0, " ")]),
            Err(RankTableError::EmptyLabel { index: 0 })
        );
    }

    #[test]
    fn progress_reports_distance_to_next_rank() {
        let table = ladder();
        let p = table.progress(6);
        assert_eq!(p.current.label, "Graduate");
        assert_eq!(p.next.as_ref().map(|e| e.label.as_str()), Some("Instructor"));
        assert_eq!(p.points_to_next, 2);
        assert_eq!(p.percent, 33);

        let top = table.progress(20);
        assert!(top.next.is_none());
        assert_eq!(top.points_to_next, 0);
        assert_eq!(top.percent, 100);
    }

    #[test]
    fn default_ladder_starts_at_zero() {
        let table = RankTable::default();
        assert_eq!(table.entries().len(), 9);
        assert_eq!(table.rank_for(0).label, "Aluno Novo (Iniciante)");
        assert_eq!(table.rank_for(36).label, "Cordão Vermelho (Mestre)");
        assert_eq!(RankTable::new(table.entries().to_vec()), Ok(table));
    }
}

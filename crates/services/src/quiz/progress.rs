/// Aggregated view of attempt progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizProgress {
    pub total: usize,
    /// Questions already scored, by submit or by timeout.
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

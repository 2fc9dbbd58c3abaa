//! Question selection for quiz rounds.
//!
//! The client keeps track of what it has already been asked and sends those
//! ids back with every request, so nothing here holds state between calls.

use rand::rng;
use rand::seq::IndexedRandom;
use sqlx::SqlitePool;

use crate::db::queries::questions::get_quiz_candidates;
use crate::db::Question;

/// Which questions a quiz draws from. Category id `0` stands for all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizScope {
    All,
    Category(i64),
}

impl From<i64> for QuizScope {
    fn from(id: i64) -> Self {
        match id {
            0 => QuizScope::All,
            id => QuizScope::Category(id),
        }
    }
}

impl QuizScope {
    pub fn category(self) -> Option<i64> {
        match self {
            QuizScope::All => None,
            QuizScope::Category(id) => Some(id),
        }
    }

    /// Label used for metrics.
    pub fn label(self) -> String {
        match self {
            QuizScope::All => "all".to_owned(),
            QuizScope::Category(id) => id.to_string(),
        }
    }
}

/// Picks a random question in `scope` that is not in `previous`, or `None`
/// once the scope is exhausted.
pub async fn next_question(
    pool: &SqlitePool,
    scope: QuizScope,
    previous: &[i64],
) -> sqlx::Result<Option<Question>> {
    let candidates = get_quiz_candidates(pool, scope.category(), previous).await?;
    tracing::debug!(
        remaining = candidates.len(),
        asked = previous.len(),
        "quiz candidates loaded"
    );
    Ok(candidates.choose(&mut rng()).cloned())
}

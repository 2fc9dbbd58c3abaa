use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Question {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub category: i64,
    pub difficulty: i64,
}

/// Fields of a question before it is stored. Anything left out is rejected
/// by the table constraints on insert.
#[derive(Debug, Clone, Default)]
pub struct NewQuestion {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub category: Option<i64>,
    pub difficulty: Option<i64>,
}

const SELECT_QUESTIONS: &str = "SELECT id, question, answer, category, difficulty FROM questions";

pub async fn get_all_questions(pool: &SqlitePool) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(&format!("{SELECT_QUESTIONS} ORDER BY id"))
        .fetch_all(pool)
        .await
}

pub async fn get_questions_for_category(
    pool: &SqlitePool,
    category: i64,
) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(&format!(
        "{SELECT_QUESTIONS} WHERE category = ?1 ORDER BY id"
    ))
    .bind(category)
    .fetch_all(pool)
    .await
}

/// Questions whose text contains `term`, ignoring case. Answers are not
/// searched.
pub async fn search_questions(pool: &SqlitePool, term: &str) -> sqlx::Result<Vec<Question>> {
    // SQLite's LIKE and lower() only fold ASCII letters
    let needle = term.to_lowercase();
    let mut questions = get_all_questions(pool).await?;
    questions.retain(|q| q.question.to_lowercase().contains(&needle));
    Ok(questions)
}

pub async fn get_question_by_id(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Question>> {
    sqlx::query_as::<_, Question>(&format!("{SELECT_QUESTIONS} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Questions a quiz may still serve: optionally limited to one category and
/// never one of the `excluded` ids.
pub async fn get_quiz_candidates(
    pool: &SqlitePool,
    category: Option<i64>,
    excluded: &[i64],
) -> sqlx::Result<Vec<Question>> {
    let mut query = QueryBuilder::<Sqlite>::new(SELECT_QUESTIONS);
    query.push(" WHERE 1 = 1");
    if let Some(category) = category {
        query.push(" AND category = ").push_bind(category);
    }
    if !excluded.is_empty() {
        query.push(" AND id NOT IN (");
        let mut ids = query.separated(", ");
        for id in excluded {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");
    }
    query.push(" ORDER BY id");

    let candidates = query.build_query_as::<Question>().fetch_all(pool).await?;
    Ok(candidates)
}

pub async fn count_questions(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM questions")
        .fetch_one(pool)
        .await
}

pub async fn create_question(pool: &SqlitePool, question: &NewQuestion) -> sqlx::Result<i64> {
    let id = sqlx::query(
        r#"
INSERT INTO questions (question, answer, category, difficulty) VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(question.question.as_deref())
    .bind(question.answer.as_deref())
    .bind(question.category)
    .bind(question.difficulty)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(id)
}

/// Returns whether a row was removed.
pub async fn delete_question(pool: &SqlitePool, id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query(
        r#"
DELETE FROM questions WHERE id = ?1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn import_questions(pool: &SqlitePool, questions: Vec<Question>) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;
    for question in questions {
        sqlx::query(
            r#"
INSERT INTO questions (id, question, answer, category, difficulty) VALUES (?1, ?2, ?3, ?4, ?5)
ON CONFLICT (id) DO UPDATE SET
    question = excluded.question,
    answer = excluded.answer,
    category = excluded.category,
    difficulty = excluded.difficulty
            "#,
        )
        .bind(question.id)
        .bind(&question.question)
        .bind(&question.answer)
        .bind(question.category)
        .bind(question.difficulty)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await
}

#[cfg(test)]
pub(crate) fn new_question(question: &str, answer: &str, category: i64) -> NewQuestion {
    NewQuestion {
        question: Some(question.to_owned()),
        answer: Some(answer.to_owned()),
        category: Some(category),
        difficulty: Some(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    async fn seed(pool: &SqlitePool) -> Vec<i64> {
        let mut ids = vec![];
        for (q, a, c) in [
            ("What is the title of the 1990 fantasy film?", "Edward", 5),
            ("Whose autobiography is entitled 'I Know Why the Caged Bird Sings'?", "Maya Angelou", 4),
            ("What is the heaviest organ in the human body?", "The Liver", 1),
            ("Which novel follows the hunt for a white whale?", "Title: Moby Dick", 2),
            ("Who discovered penicillin?", "Alexander Fleming", 1),
        ] {
            ids.push(create_question(pool, &new_question(q, a, c)).await.unwrap());
        }
        ids
    }

    #[tokio::test]
    async fn questions_are_listed_by_id() {
        let pool = test_pool().await;
        let ids = seed(&pool).await;
        let listed: Vec<i64> = get_all_questions(&pool)
            .await
            .unwrap()
            .iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(listed, ids);
        assert_eq!(count_questions(&pool).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn create_keeps_every_field() {
        let pool = test_pool().await;
        let id = create_question(
            &pool,
            &NewQuestion {
                question: Some("Capital of France?".to_owned()),
                answer: Some("Paris".to_owned()),
                category: Some(3),
                difficulty: Some(2),
            },
        )
        .await
        .unwrap();

        let stored = get_question_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(
            stored,
            Question {
                id,
                question: "Capital of France?".to_owned(),
                answer: "Paris".to_owned(),
                category: 3,
                difficulty: 2,
            }
        );
    }

    #[tokio::test]
    async fn create_rejects_incomplete_question() {
        let pool = test_pool().await;
        let result = create_question(
            &pool,
            &NewQuestion {
                question: Some("No answer?".to_owned()),
                ..Default::default()
            },
        )
        .await;
        assert!(result.is_err());
        assert_eq!(count_questions(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_category_is_accepted() {
        let pool = test_pool().await;
        let id = create_question(&pool, &new_question("Orphan?", "Yes", 999))
            .await
            .unwrap();
        let found = get_questions_for_category(&pool, 999).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);
    }

    #[tokio::test]
    async fn search_matches_question_text_only() {
        let pool = test_pool().await;
        let ids = seed(&pool).await;
        let found: Vec<i64> = search_questions(&pool, "TITLE")
            .await
            .unwrap()
            .iter()
            .map(|q| q.id)
            .collect();
        // "entitled" matches too, the whale question only mentions it in the answer
        assert_eq!(found, vec![ids[0], ids[1]]);

        let none = search_questions(&pool, "Fleming").await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn search_treats_wildcards_literally() {
        let pool = test_pool().await;
        seed(&pool).await;
        assert!(search_questions(&pool, "%").await.unwrap().is_empty());
        assert!(search_questions(&pool, "_").await.unwrap().is_empty());

        let id = create_question(&pool, &new_question("Is 100% a lot?", "Yes", 1))
            .await
            .unwrap();
        let found = search_questions(&pool, "100%").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);
    }

    #[tokio::test]
    async fn search_folds_non_ascii_case() {
        let pool = test_pool().await;
        seed(&pool).await;
        let etudes = new_question("Who composed ÉTUDES for piano?", "Chopin", 2);
        let id = create_question(&pool, &etudes).await.unwrap();
        let found: Vec<i64> = search_questions(&pool, "études")
            .await
            .unwrap()
            .iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(found, vec![id]);
    }

    #[tokio::test]
    async fn category_filter_is_exact() {
        let pool = test_pool().await;
        let ids = seed(&pool).await;
        let science: Vec<i64> = get_questions_for_category(&pool, 1)
            .await
            .unwrap()
            .iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(science, vec![ids[2], ids[4]]);
        assert!(get_questions_for_category(&pool, 6).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn quiz_candidates_respect_category_and_exclusions() {
        let pool = test_pool().await;
        let ids = seed(&pool).await;

        let all = get_quiz_candidates(&pool, None, &[]).await.unwrap();
        assert_eq!(all.len(), 5);

        let rest: Vec<i64> = get_quiz_candidates(&pool, None, &[ids[0], ids[2]])
            .await
            .unwrap()
            .iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(rest, vec![ids[1], ids[3], ids[4]]);

        let science: Vec<i64> = get_quiz_candidates(&pool, Some(1), &[ids[2]])
            .await
            .unwrap()
            .iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(science, vec![ids[4]]);
    }

    #[tokio::test]
    async fn delete_reports_missing_rows() {
        let pool = test_pool().await;
        let ids = seed(&pool).await;
        assert!(delete_question(&pool, ids[1]).await.unwrap());
        assert!(!delete_question(&pool, ids[1]).await.unwrap());
        assert!(get_question_by_id(&pool, ids[1]).await.unwrap().is_none());
        assert_eq!(count_questions(&pool).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn deleted_ids_are_not_reused() {
        let pool = test_pool().await;
        let ids = seed(&pool).await;
        let last = *ids.last().unwrap();
        delete_question(&pool, last).await.unwrap();
        let next = create_question(&pool, &new_question("New?", "Yes", 1))
            .await
            .unwrap();
        assert!(next > last);
    }

    #[tokio::test]
    async fn import_upserts_by_id() {
        let pool = test_pool().await;
        let ids = seed(&pool).await;
        import_questions(
            &pool,
            vec![
                Question {
                    id: ids[0],
                    question: "Replaced?".to_owned(),
                    answer: "Yes".to_owned(),
                    category: 2,
                    difficulty: 4,
                },
                Question {
                    id: 100,
                    question: "Imported?".to_owned(),
                    answer: "Yes".to_owned(),
                    category: 3,
                    difficulty: 1,
                },
            ],
        )
        .await
        .unwrap();

        assert_eq!(count_questions(&pool).await.unwrap(), 6);
        let replaced = get_question_by_id(&pool, ids[0]).await.unwrap().unwrap();
        assert_eq!(replaced.question, "Replaced?");
        assert_eq!(replaced.difficulty, 4);
        assert!(get_question_by_id(&pool, 100).await.unwrap().is_some());
    }
}

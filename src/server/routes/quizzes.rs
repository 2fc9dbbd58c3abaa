use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_option_number_from_string;
use sqlx::SqlitePool;

use crate::{
    db::Question,
    quiz::{next_question, QuizScope},
    server::{app::AppState, error::ApiError},
    telemetry::QUIZ_QUESTIONS_SERVED,
};

use super::{ApiJson, ApiResponse};

#[derive(Debug, Deserialize)]
struct QuizCategory {
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    id: Option<i64>,
    #[serde(flatten)]
    rest: serde_json::Map<String, serde_json::Value>,
}

impl QuizCategory {
    /// `{}` counts as no category at all.
    fn is_empty(&self) -> bool {
        self.id.is_none() && self.rest.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct QuizBody {
    quiz_category: Option<QuizCategory>,
    #[serde(default)]
    previous_questions: Option<Vec<i64>>,
}

/// `question` is `null` once every eligible question has been asked.
#[derive(Serialize)]
struct QuizQuestionBody {
    success: bool,
    question: Option<Question>,
}

async fn quiz_question(
    State(pool): State<SqlitePool>,
    ApiJson(body): ApiJson<QuizBody>,
) -> ApiResponse<Json<QuizQuestionBody>> {
    let previous = body.previous_questions.unwrap_or_default();
    let category = body.quiz_category.filter(|category| !category.is_empty());
    let id = match category {
        Some(QuizCategory { id: Some(id), .. }) => id,
        Some(_) => return Err(ApiError::unprocessable("quiz_category has no id")),
        None if previous.is_empty() => {
            return Err(ApiError::BadRequest(
                "quiz_category and previous_questions are missing".to_owned(),
            ))
        }
        None => return Err(ApiError::unprocessable("quiz_category is missing")),
    };

    let scope = QuizScope::from(id);
    let question = next_question(&pool, scope, &previous)
        .await
        .map_err(ApiError::unprocessable)?;

    match &question {
        Some(question) => {
            QUIZ_QUESTIONS_SERVED
                .with_label_values(&[scope.label().as_str()])
                .inc();
            tracing::debug!(question_id = question.id, ?scope, "quiz question served");
        }
        None => tracing::debug!(?scope, asked = previous.len(), "quiz exhausted"),
    }

    Ok(Json(QuizQuestionBody {
        success: true,
        question,
    }))
}

pub fn quizzes_router(state: AppState) -> Router {
    Router::new()
        .route("/quizzes", post(quiz_question))
        .with_state(state)
}

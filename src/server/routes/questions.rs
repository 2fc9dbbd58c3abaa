use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_option_number_from_string;
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{
            categories::get_category_map,
            questions::{self, count_questions, get_all_questions, search_questions},
        },
        NewQuestion, Question,
    },
    pagination::paginate,
    server::{app::AppState, deserializers::PageQuery, error::ApiError},
    telemetry::QUESTION_WRITES,
};

use super::{ApiJson, ApiResponse};

/// Body of `POST /questions`. Numeric fields also accept numeric strings,
/// which is what form-backed clients tend to send.
#[derive(Debug, Deserialize)]
struct QuestionBody {
    question: Option<String>,
    answer: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    category: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    difficulty: Option<i64>,
}

impl From<QuestionBody> for NewQuestion {
    fn from(body: QuestionBody) -> Self {
        NewQuestion {
            question: body.question,
            answer: body.answer,
            category: body.category,
            difficulty: body.difficulty,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    #[serde(rename = "searchTerm")]
    search_term: Option<String>,
}

#[derive(Serialize)]
struct QuestionsPageBody {
    success: bool,
    questions: Vec<Question>,
    total_questions: usize,
    categories: BTreeMap<i64, String>,
}

#[derive(Serialize)]
struct CreatedBody {
    success: bool,
    created: i64,
    question: Question,
    total_questions: i64,
}

#[derive(Serialize)]
struct DeletedBody {
    success: bool,
    deleted: i64,
}

#[derive(Serialize)]
struct SearchResultsBody {
    success: bool,
    search_term: String,
    questions: Vec<Question>,
    total_questions: usize,
}

async fn list_questions(
    State(pool): State<SqlitePool>,
    Query(query): Query<PageQuery>,
) -> ApiResponse<Json<QuestionsPageBody>> {
    let selection = get_all_questions(&pool).await?;
    let total_questions = selection.len();
    let categories = get_category_map(&pool).await?;

    let page = query.page();
    let questions = paginate(selection, page);
    if questions.is_empty() {
        return Err(ApiError::NotFound(format!("no questions on page {page}")));
    }

    Ok(Json(QuestionsPageBody {
        success: true,
        questions,
        total_questions,
        categories,
    }))
}

async fn create_question(
    State(pool): State<SqlitePool>,
    ApiJson(body): ApiJson<QuestionBody>,
) -> ApiResponse<Json<CreatedBody>> {
    let new_question = NewQuestion::from(body);
    let id = questions::create_question(&pool, &new_question)
        .await
        .map_err(ApiError::unprocessable)?;
    let question = questions::get_question_by_id(&pool, id)
        .await
        .map_err(ApiError::unprocessable)?
        .ok_or_else(|| ApiError::unprocessable(format!("question {id} vanished after insert")))?;
    let total_questions = count_questions(&pool)
        .await
        .map_err(ApiError::unprocessable)?;

    QUESTION_WRITES.with_label_values(&["create"]).inc();
    tracing::info!(question_id = id, category = question.category, "question created");

    Ok(Json(CreatedBody {
        success: true,
        created: id,
        question,
        total_questions,
    }))
}

// Anything but a positive integer cannot name a question, same as an unknown route
fn parse_question_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().filter(|id| *id > 0)
}

async fn delete_question(
    State(pool): State<SqlitePool>,
    Path(raw_id): Path<String>,
) -> ApiResponse<Json<DeletedBody>> {
    let id = parse_question_id(&raw_id)
        .ok_or_else(|| ApiError::NotFound(format!("no route for question {raw_id:?}")))?;

    let existing = questions::get_question_by_id(&pool, id)
        .await
        .map_err(ApiError::unprocessable)?;
    if existing.is_none() {
        return Err(ApiError::NotFound(format!("question {id}")));
    }

    let deleted = questions::delete_question(&pool, id)
        .await
        .map_err(ApiError::unprocessable)?;
    if !deleted {
        // lost a race with another delete
        return Err(ApiError::NotFound(format!("question {id}")));
    }

    QUESTION_WRITES.with_label_values(&["delete"]).inc();
    tracing::info!(question_id = id, "question deleted");

    Ok(Json(DeletedBody {
        success: true,
        deleted: id,
    }))
}

async fn search(
    State(pool): State<SqlitePool>,
    Query(query): Query<PageQuery>,
    ApiJson(body): ApiJson<SearchBody>,
) -> ApiResponse<Json<SearchResultsBody>> {
    let search_term = body
        .search_term
        .ok_or_else(|| ApiError::BadRequest("searchTerm is required".to_owned()))?;

    let selection = search_questions(&pool, &search_term)
        .await
        .map_err(ApiError::unprocessable)?;
    let total_questions = selection.len();

    Ok(Json(SearchResultsBody {
        success: true,
        search_term,
        questions: paginate(selection, query.page()),
        total_questions,
    }))
}

pub fn questions_router(state: AppState) -> Router {
    Router::new()
        .route("/questions", get(list_questions).post(create_question))
        .route("/questions/search", post(search))
        .route("/questions/{question_id}", delete(delete_question))
        .with_state(state)
}

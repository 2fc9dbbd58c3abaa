use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{categories::get_category_map, questions::get_questions_for_category},
        Question,
    },
    pagination::paginate,
    server::{app::AppState, deserializers::PageQuery, error::ApiError},
};

use super::ApiResponse;

#[derive(Serialize)]
struct CategoriesBody {
    success: bool,
    categories: BTreeMap<i64, String>,
}

#[derive(Serialize)]
struct CategoryQuestionsBody {
    success: bool,
    questions: Vec<Question>,
    total_questions: usize,
    current_category: i64,
}

async fn get_categories(State(pool): State<SqlitePool>) -> ApiResponse<Json<CategoriesBody>> {
    let categories = get_category_map(&pool).await?;
    Ok(Json(CategoriesBody {
        success: true,
        categories,
    }))
}

// 0 means "any category" to quizzes, so it is not a category a listing can ask for
fn parse_category_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().filter(|id| *id > 0)
}

async fn questions_for_category(
    State(pool): State<SqlitePool>,
    Path(raw_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResponse<Json<CategoryQuestionsBody>> {
    let category_id = parse_category_id(&raw_id)
        .ok_or_else(|| ApiError::BadRequest(format!("invalid category id {raw_id:?}")))?;

    let selection = get_questions_for_category(&pool, category_id)
        .await
        .map_err(ApiError::unprocessable)?;
    let total_questions = selection.len();

    Ok(Json(CategoryQuestionsBody {
        success: true,
        questions: paginate(selection, query.page()),
        total_questions,
        current_category: category_id,
    }))
}

pub fn category_router(state: AppState) -> Router {
    Router::new()
        .route("/categories", get(get_categories))
        .route(
            "/categories/{category_id}/questions",
            get(questions_for_category),
        )
        .with_state(state)
}

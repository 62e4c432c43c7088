use axum::Json;
use axum::extract::{Path, State};

use crate::db;
use crate::error::AppError;
use crate::models::TestRun;
use crate::state::SharedState;

pub async fn get(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<TestRun>, AppError> {
    let run = db::test_runs::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Test run not found".to_string()))?;
    Ok(Json(run))
}

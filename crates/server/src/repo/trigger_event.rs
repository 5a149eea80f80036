use shared_types::{AppError, TriggerEvent};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

const COLUMNS: &str =
    "id, case_id, rule_id, rule_code, action, observed_value, outcome, detail, created_at";

/// One trigger firing and what came of it.
#[derive(Debug, Clone)]
pub struct NewTriggerEvent {
    pub case_id: Uuid,
    pub rule_id: Uuid,
    pub rule_code: String,
    pub action: String,
    pub observed_value: String,
    pub outcome: String,
    pub detail: Option<String>,
}

pub async fn create(pool: &Pool<Postgres>, new: NewTriggerEvent) -> Result<TriggerEvent, AppError> {
    let sql = format!(
        r#"
        INSERT INTO trigger_events
            (case_id, rule_id, rule_code, action, observed_value, outcome, detail)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {}
        "#,
        COLUMNS
    );
    sqlx::query_as::<_, TriggerEvent>(&sql)
        .bind(new.case_id)
        .bind(new.rule_id)
        .bind(new.rule_code)
        .bind(new.action)
        .bind(new.observed_value)
        .bind(new.outcome)
        .bind(new.detail)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list_for_case(
    pool: &Pool<Postgres>,
    case_id: Uuid,
) -> Result<Vec<TriggerEvent>, AppError> {
    let sql = format!(
        "SELECT {} FROM trigger_events WHERE case_id = $1 ORDER BY created_at DESC",
        COLUMNS
    );
    sqlx::query_as::<_, TriggerEvent>(&sql)
        .bind(case_id)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

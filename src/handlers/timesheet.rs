use actix_web::http::header;
use actix_web::{web, HttpResponse};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, FieldErrors};
use crate::models::employee::EmployeeOption;
use crate::models::timesheet::{Timesheet, TimesheetRow};
use crate::utils::{query, validation};

const LIST_QUERY: &str = "SELECT timesheets.*, employees.full_name AS employee_name \
                          FROM timesheets \
                          LEFT JOIN employees ON timesheets.employee_id = employees.id";
const COUNT_QUERY: &str = "SELECT COUNT(*) \
                           FROM timesheets \
                           LEFT JOIN employees ON timesheets.employee_id = employees.id";

/// Timesheet forms are plain urlencoded; every value arrives as text and
/// is validated into `NewTimesheet` before touching the store.
#[derive(Debug, Deserialize)]
pub struct TimesheetPayload {
    #[serde(default)]
    pub employee_id: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub summary: String,
}

struct NewTimesheet {
    employee_id: i64,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
    summary: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TimesheetListResponse {
    timesheets: Vec<TimesheetRow>,
    current_page: i64,
    total_pages: i64,
    search: String,
}

#[derive(Serialize)]
struct TimesheetDetailResponse {
    timesheet: Timesheet,
    employees: Vec<EmployeeOption>,
}

fn db_error(err: sqlx::Error) -> AppError {
    log::error!("Database error: {:?}", err);
    AppError::DatabaseError("Database error".to_string())
}

fn normalize_summary(summary: &str) -> Option<String> {
    let summary = summary.trim();
    if summary.is_empty() {
        None
    } else {
        Some(summary.to_string())
    }
}

/// Shared ruleset for create and update: the referenced employee must
/// exist and the shift times must be present, parseable, and ordered.
async fn validate_timesheet(
    pool: &sqlx::PgPool,
    payload: &TimesheetPayload,
) -> Result<NewTimesheet, AppError> {
    let mut errors = FieldErrors::new();

    let employee_id = match payload.employee_id.trim().parse::<i64>() {
        Ok(id) => {
            let exists =
                sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM employees WHERE id = $1)")
                    .bind(id)
                    .fetch_one(pool)
                    .await
                    .map_err(db_error)?;
            if exists {
                Some(id)
            } else {
                None
            }
        }
        Err(_) => None,
    };
    if employee_id.is_none() {
        errors.insert("employee_id".to_string(), "Employee does not exist.".to_string());
    }

    let times = validation::parse_shift_times(&payload.start_time, &payload.end_time, &mut errors);

    match (employee_id, times) {
        (Some(employee_id), Some((start_time, end_time))) => Ok(NewTimesheet {
            employee_id,
            start_time,
            end_time,
            summary: normalize_summary(&payload.summary),
        }),
        _ => Err(AppError::Validation(errors)),
    }
}

pub async fn list_timesheets(
    pool: web::Data<sqlx::PgPool>,
    params: web::Query<query::PageParams>,
) -> Result<HttpResponse, actix_web::Error> {
    let page = params.page();
    let term = params.term();

    let mut list_query = query::filtered_select(
        LIST_QUERY,
        query::TIMESHEET_SEARCH_COLUMNS,
        &term,
        "timesheets.id",
        page,
    );
    let timesheets = list_query
        .build_query_as::<TimesheetRow>()
        .fetch_all(&**pool)
        .await
        .map_err(db_error)?;

    let mut count_query = query::filtered_count(COUNT_QUERY, query::TIMESHEET_SEARCH_COLUMNS, &term);
    let total: i64 = count_query
        .build_query_scalar()
        .fetch_one(&**pool)
        .await
        .map_err(db_error)?;

    Ok(HttpResponse::Ok().json(TimesheetListResponse {
        timesheets,
        current_page: page,
        total_pages: query::total_pages(total, query::PAGE_SIZE),
        search: term,
    }))
}

pub async fn get_timesheet(
    pool: web::Data<sqlx::PgPool>,
    id: web::Path<i64>,
) -> Result<HttpResponse, actix_web::Error> {
    let timesheet = sqlx::query_as::<_, Timesheet>("SELECT * FROM timesheets WHERE id = $1")
        .bind(id.into_inner())
        .fetch_optional(&**pool)
        .await
        .map_err(db_error)?;
    let timesheet = match timesheet {
        Some(timesheet) => timesheet,
        None => return Err(AppError::NotFound("Timesheet not found".to_string()).into()),
    };

    // The edit form needs the employee picker alongside the record.
    let employees =
        sqlx::query_as::<_, EmployeeOption>("SELECT id, full_name FROM employees ORDER BY full_name ASC")
            .fetch_all(&**pool)
            .await
            .map_err(db_error)?;

    Ok(HttpResponse::Ok().json(TimesheetDetailResponse { timesheet, employees }))
}

pub async fn create_timesheet(
    pool: web::Data<sqlx::PgPool>,
    payload: web::Form<TimesheetPayload>,
) -> Result<HttpResponse, actix_web::Error> {
    let timesheet = validate_timesheet(&pool, &payload).await?;

    sqlx::query(
        "INSERT INTO timesheets (employee_id, start_time, end_time, summary) VALUES ($1, $2, $3, $4)",
    )
    .bind(timesheet.employee_id)
    .bind(timesheet.start_time)
    .bind(timesheet.end_time)
    .bind(&timesheet.summary)
    .execute(&**pool)
    .await
    .map_err(db_error)?;

    Ok(HttpResponse::Found()
        .append_header((header::LOCATION, "/timesheets"))
        .finish())
}

pub async fn update_timesheet(
    pool: web::Data<sqlx::PgPool>,
    id: web::Path<i64>,
    payload: web::Form<TimesheetPayload>,
) -> Result<HttpResponse, actix_web::Error> {
    let id = id.into_inner();

    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM timesheets WHERE id = $1)")
        .bind(id)
        .fetch_one(&**pool)
        .await
        .map_err(db_error)?;
    if !exists {
        return Err(AppError::NotFound("Timesheet not found".to_string()).into());
    }

    let timesheet = validate_timesheet(&pool, &payload).await?;

    sqlx::query(
        "UPDATE timesheets SET employee_id = $1, start_time = $2, end_time = $3, summary = $4 WHERE id = $5",
    )
    .bind(timesheet.employee_id)
    .bind(timesheet.start_time)
    .bind(timesheet.end_time)
    .bind(&timesheet.summary)
    .bind(id)
    .execute(&**pool)
    .await
    .map_err(db_error)?;

    Ok(HttpResponse::Found()
        .append_header((header::LOCATION, "/timesheets"))
        .finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_blank_becomes_null() {
        assert_eq!(normalize_summary(""), None);
        assert_eq!(normalize_summary("   "), None);
        assert_eq!(normalize_summary(" standup notes "), Some("standup notes".to_string()));
    }
}

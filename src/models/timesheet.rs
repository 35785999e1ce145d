use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug)]
pub struct Timesheet {
    pub id: i64,
    pub employee_id: i64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub summary: Option<String>,
}

/// Listing row: timesheet columns plus the joined employee display name.
/// The join is a LEFT JOIN, so the name is missing for orphaned rows.
#[derive(sqlx::FromRow, Serialize, Deserialize, Debug)]
pub struct TimesheetRow {
    pub id: i64,
    pub employee_id: i64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub summary: Option<String>,
    pub employee_name: Option<String>,
}

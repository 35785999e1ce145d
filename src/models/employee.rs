use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug)]
pub struct Employee {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub date_of_birth: NaiveDate,
    pub job_title: String,
    pub department: String,
    pub salary: f64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub photo_path: Option<String>,
}

/// Slim row for the employee picker on the timesheet forms.
#[derive(sqlx::FromRow, Serialize, Deserialize, Debug)]
pub struct EmployeeOption {
    pub id: i64,
    pub full_name: String,
}

use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use futures_util::StreamExt;
use serde::Serialize;
use std::collections::HashMap;
use validator::Validate;

use crate::errors::{AppError, FieldErrors};
use crate::models::employee::{Employee, EmployeeOption};
use crate::utils::{query, upload, validation};

/// Typed employee form after the multipart fields have been parsed.
/// Declarative rules live here; store-dependent rules (email uniqueness)
/// run in the handlers.
#[derive(Debug, Validate)]
pub struct EmployeeForm {
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    #[validate(custom = "crate::utils::validation::validate_adult")]
    pub date_of_birth: NaiveDate,
    pub job_title: String,
    pub department: String,
    #[validate(range(min = 25000.0, message = "Salary must be at least 25,000."))]
    pub salary: f64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmployeeListResponse {
    employees: Vec<Employee>,
    current_page: i64,
    total_pages: i64,
    search: String,
}

#[derive(Serialize)]
struct EmployeeDetailResponse {
    employee: Employee,
}

#[derive(Serialize)]
struct EmployeeOptionsResponse {
    employees: Vec<EmployeeOption>,
}

/// Raw multipart payload: text fields plus the optional photo part.
struct EmployeeUpload {
    fields: HashMap<String, String>,
    photo: Option<(String, Vec<u8>)>,
}

fn db_error(err: sqlx::Error) -> AppError {
    log::error!("Database error: {:?}", err);
    AppError::DatabaseError("Database error".to_string())
}

fn multipart_error(err: actix_multipart::MultipartError) -> AppError {
    AppError::BadRequest(format!("Malformed multipart payload: {}", err))
}

async fn read_employee_form(mut payload: Multipart) -> Result<EmployeeUpload, AppError> {
    let mut fields = HashMap::new();
    let mut photo = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(multipart_error)?;
        let name = field.name().to_string();
        let file_name = field
            .content_disposition()
            .get_filename()
            .map(str::to_string);

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(multipart_error)?;
            data.extend_from_slice(&chunk);
        }

        if name == "photo" {
            // A file input submitted empty still produces a part; only a
            // named, non-empty upload counts as a new photo.
            if let Some(file_name) = file_name {
                if !file_name.is_empty() && !data.is_empty() {
                    photo = Some((file_name, data));
                }
            }
        } else {
            fields.insert(name, String::from_utf8_lossy(&data).into_owned());
        }
    }

    Ok(EmployeeUpload { fields, photo })
}

/// Builds the typed form, recording one error per unparseable field.
/// Returns `None` when any field failed to parse; the map then carries
/// every violation found so far.
fn parse_employee_form(fields: &HashMap<String, String>, errors: &mut FieldErrors) -> Option<EmployeeForm> {
    let text = |key: &str| {
        fields
            .get(key)
            .map(|value| value.trim().to_string())
            .unwrap_or_default()
    };

    let date_of_birth = validation::parse_date(&text("date_of_birth"));
    if date_of_birth.is_none() {
        errors.insert(
            "date_of_birth".to_string(),
            "Enter a valid date of birth.".to_string(),
        );
    }

    // An unparseable salary reports the floor message, like a NaN would.
    let salary = text("salary").parse::<f64>().ok();
    if salary.is_none() {
        errors.insert("salary".to_string(), "Salary must be at least 25,000.".to_string());
    }

    let start_date = validation::parse_date(&text("start_date"));
    if start_date.is_none() {
        errors.insert("start_date".to_string(), "Enter a valid start date.".to_string());
    }

    let end_date_raw = text("end_date");
    let end_date = if end_date_raw.is_empty() {
        Some(None)
    } else {
        match validation::parse_date(&end_date_raw) {
            Some(date) => Some(Some(date)),
            None => {
                errors.insert("end_date".to_string(), "Enter a valid end date.".to_string());
                None
            }
        }
    };

    match (date_of_birth, salary, start_date, end_date) {
        (Some(date_of_birth), Some(salary), Some(start_date), Some(end_date)) => Some(EmployeeForm {
            full_name: text("full_name"),
            email: text("email"),
            phone_number: text("phone_number"),
            date_of_birth,
            job_title: text("job_title"),
            department: text("department"),
            salary,
            start_date,
            end_date,
        }),
        _ => None,
    }
}

async fn email_taken(
    pool: &sqlx::PgPool,
    email: &str,
    exclude_id: Option<i64>,
) -> Result<bool, AppError> {
    let taken = match exclude_id {
        Some(id) => {
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM employees WHERE LOWER(email) = LOWER($1) AND id != $2)",
            )
            .bind(email)
            .bind(id)
            .fetch_one(pool)
            .await
        }
        None => {
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM employees WHERE LOWER(email) = LOWER($1))",
            )
            .bind(email)
            .fetch_one(pool)
            .await
        }
    };
    taken.map_err(db_error)
}

/// Runs every employee rule and returns the validated form, or the full
/// set of violations at once.
async fn validate_employee(
    pool: &sqlx::PgPool,
    upload: &EmployeeUpload,
    exclude_id: Option<i64>,
) -> Result<EmployeeForm, AppError> {
    let mut errors = FieldErrors::new();
    let form = parse_employee_form(&upload.fields, &mut errors);

    if let Some(form) = &form {
        validation::collect_field_errors(form.validate(), &mut errors);
    }

    let email = upload
        .fields
        .get("email")
        .map(|value| value.trim())
        .unwrap_or_default();
    if email_taken(pool, email, exclude_id).await? {
        errors
            .entry("email".to_string())
            .or_insert_with(|| "This email is already in use.".to_string());
    }

    if let Some((_, bytes)) = &upload.photo {
        if !upload::is_supported_image(bytes) {
            errors.insert(
                "photo".to_string(),
                "Photo must be a JPEG, PNG, or GIF image.".to_string(),
            );
        }
    }

    match form {
        Some(form) if errors.is_empty() => Ok(form),
        _ => Err(AppError::Validation(errors)),
    }
}

fn store_photo(photo: &Option<(String, Vec<u8>)>) -> Result<Option<String>, AppError> {
    match photo {
        Some((file_name, bytes)) => upload::store_photo(file_name, bytes)
            .map(Some)
            .map_err(|err| {
                log::error!("Failed to store employee photo: {:?}", err);
                AppError::InternalServerError("Failed to store photo".to_string())
            }),
        None => Ok(None),
    }
}

pub async fn list_employees(
    pool: web::Data<sqlx::PgPool>,
    params: web::Query<query::PageParams>,
) -> Result<HttpResponse, actix_web::Error> {
    let page = params.page();
    let term = params.term();

    let mut list_query = query::filtered_select(
        "SELECT * FROM employees",
        query::EMPLOYEE_SEARCH_COLUMNS,
        &term,
        "id",
        page,
    );
    let employees = list_query
        .build_query_as::<Employee>()
        .fetch_all(&**pool)
        .await
        .map_err(db_error)?;

    let mut count_query = query::filtered_count(
        "SELECT COUNT(*) FROM employees",
        query::EMPLOYEE_SEARCH_COLUMNS,
        &term,
    );
    let total: i64 = count_query
        .build_query_scalar()
        .fetch_one(&**pool)
        .await
        .map_err(db_error)?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        employees,
        current_page: page,
        total_pages: query::total_pages(total, query::PAGE_SIZE),
        search: term,
    }))
}

pub async fn list_employee_options(
    pool: web::Data<sqlx::PgPool>,
) -> Result<HttpResponse, actix_web::Error> {
    let employees =
        sqlx::query_as::<_, EmployeeOption>("SELECT id, full_name FROM employees ORDER BY full_name ASC")
            .fetch_all(&**pool)
            .await
            .map_err(db_error)?;

    Ok(HttpResponse::Ok().json(EmployeeOptionsResponse { employees }))
}

pub async fn get_employee(
    pool: web::Data<sqlx::PgPool>,
    id: web::Path<i64>,
) -> Result<HttpResponse, actix_web::Error> {
    let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = $1")
        .bind(id.into_inner())
        .fetch_optional(&**pool)
        .await
        .map_err(db_error)?;

    match employee {
        Some(employee) => Ok(HttpResponse::Ok().json(EmployeeDetailResponse { employee })),
        None => Err(AppError::NotFound("Employee not found".to_string()).into()),
    }
}

pub async fn create_employee(
    pool: web::Data<sqlx::PgPool>,
    payload: Multipart,
) -> Result<HttpResponse, actix_web::Error> {
    let upload = read_employee_form(payload).await?;
    let form = validate_employee(&pool, &upload, None).await?;
    let photo_path = store_photo(&upload.photo)?;

    sqlx::query(
        "INSERT INTO employees \
         (full_name, email, phone_number, date_of_birth, job_title, department, salary, start_date, end_date, photo_path) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(&form.full_name)
    .bind(&form.email)
    .bind(&form.phone_number)
    .bind(form.date_of_birth)
    .bind(&form.job_title)
    .bind(&form.department)
    .bind(form.salary)
    .bind(form.start_date)
    .bind(form.end_date)
    .bind(&photo_path)
    .execute(&**pool)
    .await
    .map_err(db_error)?;

    Ok(HttpResponse::Found()
        .append_header((header::LOCATION, "/employees"))
        .finish())
}

pub async fn update_employee(
    pool: web::Data<sqlx::PgPool>,
    id: web::Path<i64>,
    payload: Multipart,
) -> Result<HttpResponse, actix_web::Error> {
    let id = id.into_inner();

    let existing = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = $1")
        .bind(id)
        .fetch_optional(&**pool)
        .await
        .map_err(db_error)?;
    let existing = match existing {
        Some(existing) => existing,
        None => return Err(AppError::NotFound("Employee not found".to_string()).into()),
    };

    let upload = read_employee_form(payload).await?;
    let form = validate_employee(&pool, &upload, Some(id)).await?;

    // A photo stays in place unless the form carried a replacement.
    let photo_path = match store_photo(&upload.photo)? {
        Some(path) => Some(path),
        None => existing.photo_path,
    };

    sqlx::query(
        "UPDATE employees SET full_name = $1, email = $2, phone_number = $3, date_of_birth = $4, \
         job_title = $5, department = $6, salary = $7, start_date = $8, end_date = $9, photo_path = $10 \
         WHERE id = $11",
    )
    .bind(&form.full_name)
    .bind(&form.email)
    .bind(&form.phone_number)
    .bind(form.date_of_birth)
    .bind(&form.job_title)
    .bind(&form.department)
    .bind(form.salary)
    .bind(form.start_date)
    .bind(form.end_date)
    .bind(&photo_path)
    .bind(id)
    .execute(&**pool)
    .await
    .map_err(db_error)?;

    Ok(HttpResponse::Found()
        .append_header((header::LOCATION, "/employees"))
        .finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    fn valid_fields() -> HashMap<String, String> {
        fields(&[
            ("full_name", "Ada Lovelace"),
            ("email", "ada@example.com"),
            ("phone_number", "555-0101"),
            ("date_of_birth", "1990-12-10"),
            ("job_title", "Engineer"),
            ("department", "R&D"),
            ("salary", "52000"),
            ("start_date", "2020-01-06"),
            ("end_date", ""),
        ])
    }

    #[test]
    fn valid_form_parses_and_validates() {
        let mut errors = FieldErrors::new();
        let form = parse_employee_form(&valid_fields(), &mut errors).unwrap();
        assert!(errors.is_empty());
        assert_eq!(form.full_name, "Ada Lovelace");
        assert_eq!(form.salary, 52000.0);
        assert!(form.end_date.is_none());
        assert!(form.validate().is_ok());
    }

    #[test]
    fn salary_below_floor_fails_validation() {
        let mut raw = valid_fields();
        raw.insert("salary".to_string(), "24999.99".to_string());

        let mut errors = FieldErrors::new();
        let form = parse_employee_form(&raw, &mut errors).unwrap();
        validation::collect_field_errors(form.validate(), &mut errors);
        assert_eq!(
            errors.get("salary").map(String::as_str),
            Some("Salary must be at least 25,000.")
        );
    }

    #[test]
    fn unparseable_salary_reports_the_floor_message() {
        let mut raw = valid_fields();
        raw.insert("salary".to_string(), "a lot".to_string());

        let mut errors = FieldErrors::new();
        assert!(parse_employee_form(&raw, &mut errors).is_none());
        assert_eq!(
            errors.get("salary").map(String::as_str),
            Some("Salary must be at least 25,000.")
        );
    }

    #[test]
    fn all_violations_are_collected_together() {
        let mut raw = valid_fields();
        raw.insert("salary".to_string(), "nope".to_string());
        raw.insert("date_of_birth".to_string(), "yesterday".to_string());
        raw.insert("start_date".to_string(), "".to_string());

        let mut errors = FieldErrors::new();
        assert!(parse_employee_form(&raw, &mut errors).is_none());
        assert_eq!(errors.len(), 3);
        assert!(errors.contains_key("salary"));
        assert!(errors.contains_key("date_of_birth"));
        assert!(errors.contains_key("start_date"));
    }

    #[test]
    fn end_date_is_optional_but_must_parse() {
        let mut raw = valid_fields();
        raw.insert("end_date".to_string(), "2026-01-31".to_string());
        let mut errors = FieldErrors::new();
        let form = parse_employee_form(&raw, &mut errors).unwrap();
        assert!(form.end_date.is_some());

        raw.insert("end_date".to_string(), "soon".to_string());
        let mut errors = FieldErrors::new();
        assert!(parse_employee_form(&raw, &mut errors).is_none());
        assert!(errors.contains_key("end_date"));
    }

    #[test]
    fn underage_employee_is_rejected() {
        let today = chrono::Utc::now().date_naive();
        let mut raw = valid_fields();
        raw.insert("date_of_birth".to_string(), today.format("%Y-%m-%d").to_string());

        let mut errors = FieldErrors::new();
        let form = parse_employee_form(&raw, &mut errors).unwrap();
        validation::collect_field_errors(form.validate(), &mut errors);
        assert_eq!(
            errors.get("date_of_birth").map(String::as_str),
            Some("Employee must be at least 18 years old.")
        );
    }
}

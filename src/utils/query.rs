use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};

/// Rows per list page, shared by every listing endpoint.
pub const PAGE_SIZE: i64 = 4;

/// Searchable columns per table. Declared statically so user input never
/// reaches the SQL text; only the `%term%` pattern is bound.
pub const EMPLOYEE_SEARCH_COLUMNS: &[&str] = &[
    "full_name",
    "email",
    "phone_number",
    "date_of_birth",
    "job_title",
    "department",
    "salary",
    "start_date",
    "end_date",
    "photo_path",
];

/// Timesheet columns are table-qualified because the listing joins
/// `employees` for the display name, which is searchable as well.
pub const TIMESHEET_SEARCH_COLUMNS: &[&str] = &[
    "timesheets.employee_id",
    "timesheets.start_time",
    "timesheets.end_time",
    "timesheets.summary",
    "employees.full_name",
];

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub search: Option<String>,
}

impl PageParams {
    /// 1-based page number; anything missing or below 1 becomes page 1.
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Trimmed, lower-cased search term ("" when absent).
    pub fn term(&self) -> String {
        self.search
            .as_deref()
            .unwrap_or("")
            .trim()
            .to_lowercase()
    }
}

/// Builds the paginated SELECT: `base` + optional search filter +
/// `ORDER BY order_by LIMIT $n OFFSET $n`.
pub fn filtered_select(
    base: &str,
    columns: &[&str],
    term: &str,
    order_by: &str,
    page: i64,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(base);
    push_search_filter(&mut builder, columns, term);
    builder.push(format!(" ORDER BY {}", order_by));
    builder.push(" LIMIT ");
    builder.push_bind(PAGE_SIZE);
    builder.push(" OFFSET ");
    builder.push_bind((page - 1) * PAGE_SIZE);
    builder
}

/// Builds the matching COUNT(*) query for the same filter.
pub fn filtered_count(base: &str, columns: &[&str], term: &str) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(base);
    push_search_filter(&mut builder, columns, term);
    builder
}

/// One case-insensitive substring predicate per column, all bound to the
/// same `%term%` pattern. Non-text columns are cast so LIKE applies
/// uniformly. An empty term selects every row.
fn push_search_filter(builder: &mut QueryBuilder<'static, Postgres>, columns: &[&str], term: &str) {
    if term.is_empty() {
        return;
    }
    let pattern = format!("%{}%", term);
    builder.push(" WHERE ");
    let mut predicates = builder.separated(" OR ");
    for column in columns {
        predicates.push(format!("LOWER(CAST({} AS TEXT)) LIKE ", column));
        predicates.push_bind_unseparated(pattern.clone());
    }
}

pub fn total_pages(total_rows: i64, page_size: i64) -> i64 {
    (total_rows + page_size - 1) / page_size
}

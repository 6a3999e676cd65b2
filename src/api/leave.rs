use crate::{
    api::page_window,
    auth::auth::CurrentUser,
    error::{AppError, AppResult},
    model::leave::{LeaveStatus, LeaveType},
    service::leave_policy::{LeaveBalance, check_annual_cap, leave_days},
    utils::leave_type_cache,
};
use actix_web::{HttpResponse, web};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{MySqlPool, prelude::FromRow};
use std::str::FromStr;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct ApplyLeave {
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family event")]
    pub reason: String,
}

#[derive(Serialize, ToSchema)]
pub struct ApplyLeaveResponse {
    #[schema(example = "Leave application submitted successfully")]
    pub message: String,
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 3)]
    pub days: i64,
    pub balance: LeaveBalance,
}

/// Leave application joined with its employee and leave type.
#[derive(Serialize, FromRow, ToSchema)]
pub struct LeaveApplicationDetail {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "EMP-001")]
    pub employee_code: String,
    #[schema(example = "Jane Doe")]
    pub employee_name: String,
    #[schema(example = "Annual")]
    pub leave_type: String,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = 3)]
    pub days: i32,
    pub reason: String,
    #[schema(example = "PENDING")]
    pub status: String,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub applied_on: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveApplicationDetail>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaveFilter {
    /// Filter by employee id (code)
    pub employee_id: Option<String>,
    /// Filter by leave status (PENDING, APPROVED, REJECTED)
    pub status: Option<String>,
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
    /// Pagination per page number
    pub per_page: Option<u32>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateLeaveStatus {
    #[schema(example = "APPROVED")]
    pub status: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LeaveTypeForm {
    #[schema(example = "Annual")]
    pub name: String,
    #[schema(example = 21)]
    pub max_days_per_year: i32,
}

impl LeaveTypeForm {
    fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("name must not be empty".into()));
        }
        if self.max_days_per_year <= 0 {
            return Err(AppError::Validation(
                "max_days_per_year must be positive".into(),
            ));
        }
        Ok(())
    }
}

pub(crate) const DETAIL_SELECT: &str = r#"
    SELECT la.id, e.employee_code,
           CONCAT(e.first_name, ' ', e.last_name) AS employee_name,
           lt.name AS leave_type, la.start_date, la.end_date, la.days,
           la.reason, la.status, la.applied_on
    FROM leave_applications la
    JOIN employees e ON e.id = la.employee_id
    JOIN leave_types lt ON lt.id = la.leave_type_id
"#;

/// Days already pending or approved for this type in `year`.
async fn used_days(
    pool: &MySqlPool,
    employee_id: u64,
    leave_type_id: u64,
    year: i32,
) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT CAST(COALESCE(SUM(days), 0) AS SIGNED)
        FROM leave_applications
        WHERE employee_id = ?
        AND leave_type_id = ?
        AND status IN (?, ?)
        AND YEAR(start_date) = ?
        "#,
    )
    .bind(employee_id)
    .bind(leave_type_id)
    .bind(LeaveStatus::COUNTED[0].to_string())
    .bind(LeaveStatus::COUNTED[1].to_string())
    .bind(year)
    .fetch_one(pool)
    .await
}

/* =========================
Apply for leave
========================= */
#[utoipa::path(
    post,
    path = "/api/leaves/apply",
    request_body = ApplyLeave,
    responses(
        (status = 201, description = "Leave application submitted", body = ApplyLeaveResponse),
        (status = 400, description = "Invalid dates or annual cap exceeded", body = Object, example = json!({
            "message": "You have exceeded the maximum allowed Annual days. Maximum allowed: 10 days, Already used/pending: 9 days, Remaining days: 1 days",
            "max_days": 10,
            "used_days": 9,
            "remaining_days": 1
        })),
        (status = 403, description = "No employee profile"),
        (status = 404, description = "Leave type not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn apply_leave(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<ApplyLeave>,
) -> AppResult<HttpResponse> {
    let employee_id = auth.require_employee()?;

    if payload.reason.trim().is_empty() {
        return Err(AppError::Validation("reason must not be empty".into()));
    }

    // 1️⃣ validate dates
    let days = leave_days(payload.start_date, payload.end_date)?;

    // 2️⃣ leave type
    let leave_type = leave_type_cache::get(pool.get_ref(), payload.leave_type_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Leave type not found".into()))?;

    // 3️⃣ annual cap
    let year = Utc::now().year();
    let used = used_days(pool.get_ref(), employee_id, leave_type.id, year).await?;
    let balance = check_annual_cap(&leave_type, used, days)?;

    // 4️⃣ insert application
    let id = sqlx::query(
        r#"
        INSERT INTO leave_applications
            (employee_id, leave_type_id, start_date, end_date, days, reason, status)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(leave_type.id)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(days as i32)
    .bind(payload.reason.trim())
    .bind(LeaveStatus::Pending.to_string())
    .execute(pool.get_ref())
    .await?
    .last_insert_id();

    info!(employee_id, leave_id = id, days, "Leave application submitted");

    Ok(HttpResponse::Created().json(ApplyLeaveResponse {
        message: "Leave application submitted successfully".into(),
        id,
        days,
        balance,
    }))
}

/* =========================
Own leave history
========================= */
#[utoipa::path(
    get,
    path = "/api/leaves/history",
    responses(
        (status = 200, description = "Current employee's applications, newest first", body = [LeaveApplicationDetail]),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_history(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
) -> AppResult<HttpResponse> {
    let employee_id = auth.require_employee()?;

    let data = sqlx::query_as::<_, LeaveApplicationDetail>(&format!(
        "{DETAIL_SELECT} WHERE la.employee_id = ? ORDER BY la.applied_on DESC"
    ))
    .bind(employee_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(data))
}

/* =========================
All applications (HR/Admin)
========================= */
#[utoipa::path(
    get,
    path = "/api/leave-applications",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 400, description = "Unknown status filter"),
        (status = 403, description = "HR/Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_applications(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    // -------------------------
    // Pagination
    // -------------------------
    let (page, per_page, offset) = page_window(query.page, query.per_page, 10);

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<String> = Vec::new();

    if let Some(code) = query.employee_id.as_deref() {
        where_sql.push_str(" AND e.employee_code = ?");
        args.push(code.to_owned());
    }

    if let Some(status) = query.status.as_deref() {
        let status = LeaveStatus::from_str(status)
            .map_err(|_| AppError::Validation("Unknown leave status".into()))?;
        where_sql.push_str(" AND la.status = ?");
        args.push(status.to_string());
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!(
        r#"
        SELECT COUNT(*)
        FROM leave_applications la
        JOIN employees e ON e.id = la.employee_id
        {where_sql}
        "#
    );

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = count_q.bind(arg);
    }
    let total = count_q.fetch_one(pool.get_ref()).await?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!("{DETAIL_SELECT} {where_sql} ORDER BY la.applied_on DESC LIMIT ? OFFSET ?");

    let mut data_q = sqlx::query_as::<_, LeaveApplicationDetail>(&data_sql);
    for arg in &args {
        data_q = data_q.bind(arg);
    }
    let leaves = data_q
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: leaves,
        page,
        per_page,
        total,
    }))
}

/* =========================
Approve / reject (HR/Admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/leave-applications/{leave_id}/update-status",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave application")
    ),
    request_body = UpdateLeaveStatus,
    responses(
        (status = 200, description = "Status updated", body = Object, example = json!({
            "message": "Leave status updated to APPROVED"
        })),
        (status = 400, description = "Status must be APPROVED or REJECTED"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Leave application not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn update_leave_status(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateLeaveStatus>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let leave_id = path.into_inner();

    let new_status = LeaveStatus::from_str(body.status.trim())
        .ok()
        .filter(|s| s.is_decided())
        .ok_or_else(|| AppError::Validation("Status must be APPROVED or REJECTED".into()))?;

    let current = sqlx::query_scalar::<_, String>(
        "SELECT status FROM leave_applications WHERE id = ?",
    )
    .bind(leave_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| AppError::NotFound("Leave application not found".into()))?;

    // decided applications may be corrected
    if LeaveStatus::from_str(&current).is_ok_and(|s| s.is_decided()) {
        warn!(
            leave_id,
            from = %current,
            to = %new_status,
            user_id = auth.user_id,
            "Changing an already decided leave application"
        );
    }

    sqlx::query("UPDATE leave_applications SET status = ? WHERE id = ?")
        .bind(new_status.to_string())
        .bind(leave_id)
        .execute(pool.get_ref())
        .await?;

    info!(leave_id, status = %new_status, user_id = auth.user_id, "Leave status updated");

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Leave status updated to {new_status}")
    })))
}

/* =========================
Leave types
========================= */
#[utoipa::path(
    get,
    path = "/api/leave-types",
    responses(
        (status = 200, description = "All leave types", body = [LeaveType])
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn list_leave_types(
    _auth: CurrentUser,
    pool: web::Data<MySqlPool>,
) -> AppResult<HttpResponse> {
    let types = sqlx::query_as::<_, LeaveType>(
        "SELECT id, name, max_days_per_year FROM leave_types ORDER BY name",
    )
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(types))
}

#[utoipa::path(
    post,
    path = "/api/leave-types",
    request_body = LeaveTypeForm,
    responses(
        (status = 201, description = "Leave type created", body = LeaveType),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "HR/Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave_type(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<LeaveTypeForm>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;
    body.validate()?;

    let id = sqlx::query("INSERT INTO leave_types (name, max_days_per_year) VALUES (?, ?)")
        .bind(body.name.trim())
        .bind(body.max_days_per_year)
        .execute(pool.get_ref())
        .await?
        .last_insert_id();

    let leave_type = LeaveType {
        id,
        name: body.name.trim().to_owned(),
        max_days_per_year: body.max_days_per_year,
    };
    leave_type_cache::put(leave_type.clone()).await;

    Ok(HttpResponse::Created().json(leave_type))
}

#[utoipa::path(
    put,
    path = "/api/leave-types/{id}",
    params(
        ("id" = u64, Path, description = "Leave type id")
    ),
    request_body = LeaveTypeForm,
    responses(
        (status = 200, description = "Leave type updated", body = LeaveType),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Leave type not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn update_leave_type(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<LeaveTypeForm>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;
    body.validate()?;

    let id = path.into_inner();

    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM leave_types WHERE id = ?")
        .bind(id)
        .fetch_one(pool.get_ref())
        .await?;
    if exists == 0 {
        return Err(AppError::NotFound("Leave type not found".into()));
    }

    sqlx::query("UPDATE leave_types SET name = ?, max_days_per_year = ? WHERE id = ?")
        .bind(body.name.trim())
        .bind(body.max_days_per_year)
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    leave_type_cache::invalidate(id).await;

    Ok(HttpResponse::Ok().json(LeaveType {
        id,
        name: body.name.trim().to_owned(),
        max_days_per_year: body.max_days_per_year,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/leave-types/{id}",
    params(
        ("id" = u64, Path, description = "Leave type id")
    ),
    responses(
        (status = 200, description = "Leave type deleted", body = Object, example = json!({
            "message": "Leave type deleted"
        })),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Leave type not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn delete_leave_type(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let id = path.into_inner();

    let result = sqlx::query("DELETE FROM leave_types WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    leave_type_cache::invalidate(id).await;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Leave type not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave type deleted"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leave_type_form_rejects_non_positive_cap() {
        let form = LeaveTypeForm {
            name: "Annual".into(),
            max_days_per_year: 0,
        };
        assert!(form.validate().is_err());

        let form = LeaveTypeForm {
            name: " ".into(),
            max_days_per_year: 10,
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn counted_statuses_bind_as_stored() {
        let bound: Vec<String> = LeaveStatus::COUNTED.iter().map(|s| s.to_string()).collect();
        assert_eq!(bound, ["PENDING", "APPROVED"]);
    }
}

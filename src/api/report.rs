use crate::{
    api::pdf_response,
    auth::auth::CurrentUser,
    config::Config,
    document::{DocumentKind, DocumentRenderer},
    error::{AppError, AppResult},
    service::{
        payroll::{PayrollRow, PayrollSummary, attendance_summary, summarize, working_days_in_month},
        validation::validate_month,
    },
};
use actix_web::{HttpResponse, web};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::debug;
use utoipa::IntoParams;

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// Defaults to the current month
    pub month: Option<i32>,
    /// Defaults to the current year
    pub year: Option<i32>,
    /// `pdf` for a document, JSON otherwise
    pub format: Option<String>,
}

pub fn report_filename(month: u32, year: i32) -> String {
    format!("payroll_report_{month}_{year}.pdf")
}

async fn monthly_summary(
    pool: &MySqlPool,
    month: u32,
    year: i32,
    top_n: usize,
) -> AppResult<PayrollSummary> {
    let rows = sqlx::query_as::<_, PayrollRow>(
        r#"
        SELECT s.id AS salary_id, s.employee_id,
               CONCAT(e.first_name, ' ', e.last_name) AS employee_name,
               d.name AS department,
               s.base_salary, s.bonus, s.deductions, s.net_salary
        FROM salaries s
        JOIN employees e ON e.id = s.employee_id
        LEFT JOIN departments d ON d.id = e.department_id
        WHERE s.month = ? AND s.year = ?
        "#,
    )
    .bind(month)
    .bind(year)
    .fetch_all(pool)
    .await?;

    let active_employees =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees WHERE is_active_employee = TRUE")
            .fetch_one(pool)
            .await?;

    let (present_days, leave_days) = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT CAST(COALESCE(SUM(is_present), 0) AS SIGNED),
               CAST(COALESCE(SUM(is_leave), 0) AS SIGNED)
        FROM attendance
        WHERE YEAR(date) = ? AND MONTH(date) = ?
        "#,
    )
    .bind(year)
    .bind(month)
    .fetch_one(pool)
    .await?;

    debug!(month, year, records = rows.len(), "Aggregating payroll");

    let attendance = attendance_summary(
        active_employees.max(0) as u64,
        working_days_in_month(year, month),
        present_days.max(0) as u64,
        leave_days.max(0) as u64,
    );

    Ok(summarize(month, year, &rows, top_n, attendance))
}

/// Monthly payroll report (HR)
#[utoipa::path(
    get,
    path = "/api/reports/monthly",
    params(ReportQuery),
    responses(
        (status = 200, description = "Payroll summary as JSON, or a PDF with format=pdf", body = PayrollSummary),
        (status = 400, description = "month must be between 1 and 12"),
        (status = 403, description = "HR/Admin only")
    ),
    tag = "Payroll",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn monthly_report(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    renderer: web::Data<DocumentRenderer>,
    query: web::Query<ReportQuery>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let today = Utc::now().date_naive();
    let month = query.month.unwrap_or(today.month() as i32);
    let year = query.year.unwrap_or(today.year());
    validate_month(month)?;
    let month = month as u32;

    let as_pdf = match query.format.as_deref() {
        None | Some("json") => false,
        Some("pdf") => true,
        Some(other) => {
            return Err(AppError::Validation(format!("Unknown report format: {other}")));
        }
    };

    let summary =
        monthly_summary(pool.get_ref(), month, year, config.report_top_n as usize).await?;

    if as_pdf {
        let bytes = renderer.render_pdf(DocumentKind::MonthlyReport, &summary)?;
        return Ok(pdf_response(bytes, &report_filename(month, year)));
    }

    Ok(HttpResponse::Ok().json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_format() {
        assert_eq!(report_filename(1, 2026), "payroll_report_1_2026.pdf");
    }
}

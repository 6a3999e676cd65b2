use crate::{
    api::{employee::find_employee_id, pdf_response},
    auth::auth::CurrentUser,
    document::{DocumentKind, DocumentRenderer},
    error::{AppError, AppResult},
    model::salary::{PaySlip, Salary},
    service::{
        payroll::working_days_in_month,
        validation::{validate_amounts, validate_month},
    },
};
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{MySqlPool, prelude::FromRow};
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const SALARY_COLUMNS: &str =
    "s.id, s.employee_id, s.base_salary, s.bonus, s.deductions, s.tax_rate, s.net_salary, s.month, s.year";

#[derive(Deserialize, ToSchema)]
pub struct SalaryForm {
    /// Employee id (code)
    #[schema(example = "EMP-001")]
    pub employee_id: String,
    /// Falls back to the employee's role base salary, then their basic salary
    #[schema(example = 50000.0)]
    pub base_salary: Option<f64>,
    #[serde(default)]
    #[schema(example = 5000.0)]
    pub bonus: f64,
    #[serde(default)]
    #[schema(example = 7500.0)]
    pub deductions: f64,
    #[serde(default)]
    #[schema(example = 15.0)]
    pub tax_rate: f64,
    #[schema(example = 1)]
    pub month: i32,
    #[schema(example = 2026)]
    pub year: i32,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SalaryFilter {
    pub month: Option<i32>,
    pub year: Option<i32>,
    /// Employee id (code)
    pub employee_id: Option<String>,
}

/// Salary record with the employee it belongs to.
#[derive(Serialize, FromRow, ToSchema)]
pub struct SalaryRecord {
    pub id: u64,
    #[schema(example = "EMP-001")]
    pub employee_code: String,
    #[schema(example = "Jane Doe")]
    pub employee_name: String,
    pub base_salary: f64,
    pub bonus: f64,
    pub deductions: f64,
    pub tax_rate: f64,
    pub net_salary: f64,
    pub month: i32,
    pub year: i32,
}

/// Everything printed on a payslip.
#[derive(Serialize, ToSchema)]
pub struct PayslipDocument {
    pub salary_id: u64,
    pub employee_name: String,
    pub employee_code: String,
    pub username: String,
    pub department: Option<String>,
    pub role: Option<String>,
    pub month: i32,
    pub year: i32,
    pub base_salary: f64,
    pub bonus: f64,
    pub gross_pay: f64,
    pub deductions: f64,
    pub tax_rate: f64,
    pub net_salary: f64,
    /// Set once the payslip is issued
    pub receipt_number: Option<String>,
    #[schema(value_type = Option<String>, format = "date")]
    pub issue_date: Option<NaiveDate>,
    pub total_working_days: i32,
    pub days_present: i32,
}

#[derive(FromRow)]
struct PayslipRow {
    salary_id: u64,
    employee_id: u64,
    employee_code: String,
    employee_name: String,
    username: Option<String>,
    department: Option<String>,
    role: Option<String>,
    base_salary: f64,
    bonus: f64,
    deductions: f64,
    tax_rate: f64,
    net_salary: f64,
    month: i32,
    year: i32,
    receipt_number: Option<String>,
    issue_date: Option<NaiveDate>,
    total_working_days: Option<i32>,
    days_present: Option<i32>,
}

const PAYSLIP_SELECT: &str = r#"
    SELECT s.id AS salary_id, s.employee_id, e.employee_code,
           CONCAT(e.first_name, ' ', e.last_name) AS employee_name,
           u.username, d.name AS department, r.title AS role,
           s.base_salary, s.bonus, s.deductions, s.tax_rate, s.net_salary, s.month, s.year,
           p.receipt_number, p.issue_date, p.total_working_days, p.days_present
    FROM salaries s
    JOIN employees e ON e.id = s.employee_id
    LEFT JOIN users u ON u.employee_id = e.id
    LEFT JOIN departments d ON d.id = e.department_id
    LEFT JOIN employee_roles r ON r.id = e.role_id
    LEFT JOIN payslips p ON p.salary_id = s.id
"#;

async fn days_present(pool: &MySqlPool, employee_id: u64, year: i32, month: i32) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM attendance
        WHERE employee_id = ? AND is_present = TRUE
        AND YEAR(date) = ? AND MONTH(date) = ?
        "#,
    )
    .bind(employee_id)
    .bind(year)
    .bind(month)
    .fetch_one(pool)
    .await
}

/// Payslip content for one salary record, plus the owning employee id.
/// Working days and presence come from the issued payslip when there is one.
async fn load_payslip(pool: &MySqlPool, salary_id: u64) -> AppResult<(PayslipDocument, u64)> {
    let row = sqlx::query_as::<_, PayslipRow>(&format!("{PAYSLIP_SELECT} WHERE s.id = ?"))
        .bind(salary_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Salary record not found".into()))?;

    let total_working_days = match row.total_working_days {
        Some(days) => days,
        None => working_days_in_month(row.year, row.month.clamp(1, 12) as u32) as i32,
    };
    let present = match row.days_present {
        Some(days) => days,
        None => days_present(pool, row.employee_id, row.year, row.month).await? as i32,
    };

    Ok((
        PayslipDocument {
            salary_id: row.salary_id,
            employee_name: row.employee_name,
            employee_code: row.employee_code,
            username: row.username.unwrap_or_default(),
            department: row.department,
            role: row.role,
            month: row.month,
            year: row.year,
            base_salary: row.base_salary,
            bonus: row.bonus,
            gross_pay: row.base_salary + row.bonus,
            deductions: row.deductions,
            tax_rate: row.tax_rate,
            net_salary: row.net_salary,
            receipt_number: row.receipt_number,
            issue_date: row.issue_date,
            total_working_days,
            days_present: present,
        },
        row.employee_id,
    ))
}

pub fn receipt_number(year: i32, month: i32) -> String {
    let suffix: String = Uuid::new_v4()
        .to_simple()
        .to_string()
        .chars()
        .take(8)
        .collect();
    format!("PS-{year}{month:02}-{}", suffix.to_uppercase())
}

pub fn payslip_filename(username: &str, month: i32, year: i32) -> String {
    format!("payslip_{username}_{month}_{year}.pdf")
}

/// Add Salary (HR)
#[utoipa::path(
    post,
    path = "/api/salary/add",
    request_body = SalaryForm,
    responses(
        (status = 201, description = "Salary record created; net = base + bonus - deductions", body = Salary),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Payroll",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn add_salary(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<SalaryForm>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;
    validate_month(body.month)?;

    let employee_id = find_employee_id(pool.get_ref(), &body.employee_id).await?;

    let base_salary = match body.base_salary {
        Some(base) => base,
        None => sqlx::query_scalar::<_, Option<f64>>(
            r#"
            SELECT COALESCE(r.base_salary, e.basic_salary)
            FROM employees e
            LEFT JOIN employee_roles r ON r.id = e.role_id
            WHERE e.id = ?
            "#,
        )
        .bind(employee_id)
        .fetch_one(pool.get_ref())
        .await?
        .ok_or_else(|| AppError::Validation("base_salary is required".into()))?,
    };

    validate_amounts(&[
        ("base_salary", base_salary),
        ("bonus", body.bonus),
        ("deductions", body.deductions),
        ("tax_rate", body.tax_rate),
    ])?;

    let net_salary = Salary::net(base_salary, body.bonus, body.deductions);

    let id = sqlx::query(
        r#"
        INSERT INTO salaries
            (employee_id, base_salary, bonus, deductions, tax_rate, net_salary, month, year)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(base_salary)
    .bind(body.bonus)
    .bind(body.deductions)
    .bind(body.tax_rate)
    .bind(net_salary)
    .bind(body.month)
    .bind(body.year)
    .execute(pool.get_ref())
    .await?
    .last_insert_id();

    info!(salary_id = id, employee_id, month = body.month, year = body.year, "Salary recorded");

    Ok(HttpResponse::Created().json(Salary {
        id,
        employee_id,
        base_salary,
        bonus: body.bonus,
        deductions: body.deductions,
        tax_rate: body.tax_rate,
        net_salary,
        month: body.month,
        year: body.year,
    }))
}

/// My salary history
#[utoipa::path(
    get,
    path = "/api/my-salary",
    responses(
        (status = 200, description = "Current employee's salaries, newest first", body = [Salary]),
        (status = 403, description = "No employee profile")
    ),
    tag = "Payroll",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn my_salary(auth: CurrentUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    let employee_id = auth.require_employee()?;

    let salaries = sqlx::query_as::<_, Salary>(&format!(
        "SELECT {SALARY_COLUMNS} FROM salaries s WHERE s.employee_id = ? ORDER BY s.year DESC, s.month DESC"
    ))
    .bind(employee_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(salaries))
}

/// All salaries (HR)
#[utoipa::path(
    get,
    path = "/api/general-salaries",
    params(SalaryFilter),
    responses(
        (status = 200, description = "Salary records", body = [SalaryRecord]),
        (status = 403, description = "HR/Admin only")
    ),
    tag = "Payroll",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn general_salaries(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<SalaryFilter>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let mut sql = String::from(
        r#"
        SELECT s.id, e.employee_code, CONCAT(e.first_name, ' ', e.last_name) AS employee_name,
               s.base_salary, s.bonus, s.deductions, s.tax_rate, s.net_salary, s.month, s.year
        FROM salaries s
        JOIN employees e ON e.id = s.employee_id
        WHERE 1=1
        "#,
    );
    if query.month.is_some() {
        sql.push_str(" AND s.month = ?");
    }
    if query.year.is_some() {
        sql.push_str(" AND s.year = ?");
    }
    if query.employee_id.is_some() {
        sql.push_str(" AND e.employee_code = ?");
    }
    sql.push_str(" ORDER BY s.year DESC, s.month DESC, s.id DESC");

    let mut q = sqlx::query_as::<_, SalaryRecord>(&sql);
    if let Some(month) = query.month {
        q = q.bind(month);
    }
    if let Some(year) = query.year {
        q = q.bind(year);
    }
    if let Some(code) = &query.employee_id {
        q = q.bind(code);
    }

    let records = q.fetch_all(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(records))
}

/// Latest payslip of the current user
#[utoipa::path(
    get,
    path = "/api/payslip",
    responses(
        (status = 200, description = "Payslip for the most recent salary record", body = PayslipDocument),
        (status = 403, description = "No employee profile"),
        (status = 404, description = "No salary recorded yet")
    ),
    tag = "Payroll",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn payslip(auth: CurrentUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    let employee_id = auth.require_employee()?;

    let salary_id = sqlx::query_scalar::<_, u64>(
        "SELECT id FROM salaries WHERE employee_id = ? ORDER BY id DESC LIMIT 1",
    )
    .bind(employee_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| AppError::NotFound("No salary recorded yet".into()))?;

    let (document, _) = load_payslip(pool.get_ref(), salary_id).await?;

    Ok(HttpResponse::Ok().json(document))
}

/// Issue a payslip for a salary record (HR)
#[utoipa::path(
    post,
    path = "/api/payslip/{salary_id}/issue",
    params(
        ("salary_id" = u64, Path, description = "Salary record id")
    ),
    responses(
        (status = 201, description = "Payslip issued", body = PaySlip),
        (status = 404, description = "Salary record not found"),
        (status = 409, description = "Payslip already issued")
    ),
    tag = "Payroll",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn issue_payslip(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let salary_id = path.into_inner();

    let (employee_id, month, year) = sqlx::query_as::<_, (u64, i32, i32)>(
        "SELECT employee_id, month, year FROM salaries WHERE id = ?",
    )
    .bind(salary_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| AppError::NotFound("Salary record not found".into()))?;

    let total_working_days = working_days_in_month(year, month.clamp(1, 12) as u32) as i32;
    let present = days_present(pool.get_ref(), employee_id, year, month).await? as i32;
    let issue_date = Utc::now().date_naive();
    let receipt = receipt_number(year, month);

    let id = sqlx::query(
        r#"
        INSERT INTO payslips
            (salary_id, issue_date, receipt_number, total_working_days, days_present)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(salary_id)
    .bind(issue_date)
    .bind(&receipt)
    .bind(total_working_days)
    .bind(present)
    .execute(pool.get_ref())
    .await?
    .last_insert_id();

    info!(salary_id, receipt = %receipt, "Payslip issued");

    Ok(HttpResponse::Created().json(PaySlip {
        id,
        salary_id,
        issue_date,
        receipt_number: receipt,
        total_working_days,
        days_present: present,
    }))
}

/// Payslip as PDF (owner or HR)
#[utoipa::path(
    get,
    path = "/api/payslip/{salary_id}/pdf",
    params(
        ("salary_id" = u64, Path, description = "Salary record id")
    ),
    responses(
        (status = 200, description = "Payslip PDF", body = String, content_type = "application/pdf"),
        (status = 403, description = "Not your payslip"),
        (status = 404, description = "Salary record not found"),
        (status = 500, description = "Failed to generate document")
    ),
    tag = "Payroll",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn payslip_pdf(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    renderer: web::Data<DocumentRenderer>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let (document, employee_id) = load_payslip(pool.get_ref(), path.into_inner()).await?;

    if !auth.has_elevated_view() && auth.employee_id != Some(employee_id) {
        return Err(AppError::Forbidden("You can only download your own payslips".into()));
    }

    let bytes = renderer.render_pdf(DocumentKind::Payslip, &document)?;
    let filename = payslip_filename(&document.username, document.month, document.year);

    Ok(pdf_response(bytes, &filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_numbers_carry_the_period_and_differ() {
        let a = receipt_number(2026, 3);
        let b = receipt_number(2026, 3);
        assert!(a.starts_with("PS-202603-"));
        assert_eq!(a.len(), "PS-202603-".len() + 8);
        assert_ne!(a, b);
    }

    #[test]
    fn payslip_filename_format() {
        assert_eq!(payslip_filename("jane", 3, 2026), "payslip_jane_3_2026.pdf");
    }
}

use crate::{
    api::leave::{DETAIL_SELECT, LeaveApplicationDetail},
    auth::auth::CurrentUser,
    error::AppResult,
    model::{
        attendance::Attendance,
        department::Department,
        leave::LeaveStatus,
        salary::{PaySlip, Salary},
        tax_declaration::TaxDeclaration,
    },
};
use actix_web::{HttpResponse, web};
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct AdminDashboard {
    #[schema(example = 42)]
    pub employee_count: i64,
    pub departments: Vec<Department>,
    /// Five most recent pending applications
    pub pending_leaves: Vec<LeaveApplicationDetail>,
    /// The caller's own attendance today, if any
    pub today_attendance: Option<Attendance>,
}

#[derive(Serialize, ToSchema)]
pub struct UserDashboard {
    pub attendance: Vec<Attendance>,
    pub leave_applications: Vec<LeaveApplicationDetail>,
    pub salaries: Vec<Salary>,
    pub payslips: Vec<PaySlip>,
    pub tax_declarations: Vec<TaxDeclaration>,
}

/// Admin / HR dashboard
#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Organisation overview", body = AdminDashboard),
        (status = 403, description = "HR/Admin only")
    ),
    tag = "Dashboard",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn dashboard(auth: CurrentUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;
    let pool = pool.get_ref();

    let employee_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees")
        .fetch_one(pool)
        .await?;

    let departments = sqlx::query_as::<_, Department>(
        "SELECT id, name, description FROM departments ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    let pending_leaves = sqlx::query_as::<_, LeaveApplicationDetail>(&format!(
        "{DETAIL_SELECT} WHERE la.status = ? ORDER BY la.applied_on DESC LIMIT 5"
    ))
    .bind(LeaveStatus::Pending.to_string())
    .fetch_all(pool)
    .await?;

    let today_attendance = match auth.employee_id {
        Some(employee_id) => {
            sqlx::query_as::<_, Attendance>(
                r#"
                SELECT id, employee_id, date, check_in, check_out, is_present, is_leave
                FROM attendance
                WHERE employee_id = ? AND date = CURDATE()
                "#,
            )
            .bind(employee_id)
            .fetch_optional(pool)
            .await?
        }
        None => None,
    };

    Ok(HttpResponse::Ok().json(AdminDashboard {
        employee_count,
        departments,
        pending_leaves,
        today_attendance,
    }))
}

/// Employee dashboard
#[utoipa::path(
    get,
    path = "/api/user_dashboard",
    responses(
        (status = 200, description = "Recent activity of the current employee", body = UserDashboard),
        (status = 403, description = "No employee profile")
    ),
    tag = "Dashboard",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn user_dashboard(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
) -> AppResult<HttpResponse> {
    let employee_id = auth.require_employee()?;
    let pool = pool.get_ref();

    let attendance = sqlx::query_as::<_, Attendance>(
        r#"
        SELECT id, employee_id, date, check_in, check_out, is_present, is_leave
        FROM attendance WHERE employee_id = ?
        ORDER BY date DESC LIMIT 5
        "#,
    )
    .bind(employee_id)
    .fetch_all(pool)
    .await?;

    let leave_applications = sqlx::query_as::<_, LeaveApplicationDetail>(&format!(
        "{DETAIL_SELECT} WHERE la.employee_id = ? ORDER BY la.applied_on DESC LIMIT 5"
    ))
    .bind(employee_id)
    .fetch_all(pool)
    .await?;

    let salaries = sqlx::query_as::<_, Salary>(
        r#"
        SELECT id, employee_id, base_salary, bonus, deductions, tax_rate, net_salary, month, year
        FROM salaries WHERE employee_id = ?
        ORDER BY year DESC, month DESC LIMIT 3
        "#,
    )
    .bind(employee_id)
    .fetch_all(pool)
    .await?;

    let payslips = sqlx::query_as::<_, PaySlip>(
        r#"
        SELECT p.id, p.salary_id, p.issue_date, p.receipt_number, p.total_working_days, p.days_present
        FROM payslips p
        JOIN salaries s ON s.id = p.salary_id
        WHERE s.employee_id = ?
        ORDER BY p.issue_date DESC LIMIT 3
        "#,
    )
    .bind(employee_id)
    .fetch_all(pool)
    .await?;

    let tax_declarations = sqlx::query_as::<_, TaxDeclaration>(
        r#"
        SELECT id, employee_id, financial_year, total_investment, tax_exemption_claimed,
               submitted_date, is_verified
        FROM tax_declarations WHERE employee_id = ?
        ORDER BY submitted_date DESC LIMIT 2
        "#,
    )
    .bind(employee_id)
    .fetch_all(pool)
    .await?;

    Ok(HttpResponse::Ok().json(UserDashboard {
        attendance,
        leave_applications,
        salaries,
        payslips,
        tax_declarations,
    }))
}

use crate::{
    api::page_window,
    auth::{auth::CurrentUser, password::hash_password},
    config::Config,
    error::{AppError, AppResult},
    model::{
        access::AccessRole,
        attendance::Attendance,
        employee::{EMPLOYEE_COLUMNS, Employee, EmployeeSummary},
        leave::LeaveApplication,
        salary::Salary,
    },
    service::validation::{
        validate_amounts, validate_gender, validate_password_confirmation, validate_phone_number,
        validate_username,
    },
};
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{MySql, MySqlPool, mysql::MySqlArguments, query::Query};
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};

fn default_true() -> bool {
    true
}

/// Full employee record as submitted by a form; updates replace every field.
#[derive(Debug, Deserialize, ToSchema)]
pub struct EmployeeForm {
    #[schema(example = "EMP-001")]
    pub employee_code: String,
    #[schema(example = "John")]
    pub first_name: String,
    pub middle_name: Option<String>,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "john@company.com", format = "email")]
    pub email: String,
    #[schema(value_type = Option<String>, format = "date")]
    pub date_of_birth: Option<NaiveDate>,
    #[schema(example = "M")]
    pub gender: String,
    #[schema(example = "+254712345678")]
    pub phone_number: String,
    pub address: Option<String>,
    /// Defaults to today
    #[schema(value_type = Option<String>, format = "date")]
    pub joined_date: Option<NaiveDate>,
    #[schema(example = 1)]
    pub role_id: Option<u64>,
    #[schema(example = 1)]
    pub department_id: Option<u64>,
    #[serde(default = "default_true")]
    pub is_active_employee: bool,
    pub residential_status: Option<String>,
    pub national_id: Option<String>,
    pub kra_pin: Option<String>,
    pub nssf_no: Option<String>,
    pub nhif_no: Option<String>,
    pub basic_salary: Option<f64>,
    pub bank: Option<String>,
    pub bank_account_name: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_branch: Option<String>,
    pub employee_personal_number: Option<String>,
    #[schema(value_type = Option<String>, format = "date")]
    pub date_of_employment: Option<NaiveDate>,
    pub contract_type: Option<String>,
    pub job_title: Option<String>,
    pub employee_email: Option<String>,
    pub mobile_phone: Option<String>,
}

impl EmployeeForm {
    pub fn validate(&self) -> AppResult<()> {
        for (name, value) in [
            ("employee_code", &self.employee_code),
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("email", &self.email),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("{name} must not be empty")));
            }
        }
        if !self.email.contains('@') {
            return Err(AppError::Validation("email is not valid".into()));
        }
        validate_gender(&self.gender)?;
        validate_phone_number(&self.phone_number)?;
        if let Some(mobile) = self.mobile_phone.as_deref().filter(|m| !m.is_empty()) {
            validate_phone_number(mobile)?;
        }
        if let Some(status) = self.residential_status.as_deref() {
            if !matches!(status, "R" | "NR") {
                return Err(AppError::Validation(
                    "residential_status must be R or NR".into(),
                ));
            }
        }
        if let Some(contract) = self.contract_type.as_deref() {
            if !matches!(contract, "P" | "T") {
                return Err(AppError::Validation("contract_type must be P or T".into()));
            }
        }
        if let Some(salary) = self.basic_salary {
            validate_amounts(&[("basic_salary", salary)])?;
        }
        Ok(())
    }
}

#[derive(Deserialize, ToSchema)]
pub struct AddEmployee {
    #[schema(example = "jdoe")]
    pub username: String,
    /// Omitted: the configured default password is set
    pub password: Option<String>,
    pub confirm_password: Option<String>,
    /// 1 admin, 2 HR, 3 employee (default)
    #[schema(example = 3)]
    pub access_role_id: Option<u8>,
    #[serde(flatten)]
    pub employee: EmployeeForm,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Department name
    pub department: Option<String>,
    /// Role title
    pub role: Option<String>,
    /// Matches name, email or employee code
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<EmployeeSummary>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 10)]
    pub total: i64,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeProfile {
    pub employee: Employee,
    pub username: Option<String>,
    pub department: Option<String>,
    pub role: Option<String>,
    pub attendance_records: Vec<Attendance>,
    pub salary_history: Vec<Salary>,
    pub leave_history: Vec<LeaveApplication>,
}

const INSERT_EMPLOYEE: &str = r#"
    INSERT INTO employees
    (employee_code, first_name, middle_name, last_name, email, date_of_birth,
     gender, phone_number, address, joined_date, role_id, department_id,
     is_active_employee, residential_status, national_id, kra_pin, nssf_no,
     nhif_no, basic_salary, bank, bank_account_name, bank_account_number,
     bank_branch, employee_personal_number, date_of_employment, contract_type,
     job_title, employee_email, mobile_phone)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const UPDATE_EMPLOYEE: &str = r#"
    UPDATE employees SET
        employee_code = ?, first_name = ?, middle_name = ?, last_name = ?,
        email = ?, date_of_birth = ?, gender = ?, phone_number = ?, address = ?,
        joined_date = ?, role_id = ?, department_id = ?, is_active_employee = ?,
        residential_status = ?, national_id = ?, kra_pin = ?, nssf_no = ?,
        nhif_no = ?, basic_salary = ?, bank = ?, bank_account_name = ?,
        bank_account_number = ?, bank_branch = ?, employee_personal_number = ?,
        date_of_employment = ?, contract_type = ?, job_title = ?,
        employee_email = ?, mobile_phone = ?
    WHERE id = ?
"#;

/// Binds the form in `INSERT_EMPLOYEE` / `UPDATE_EMPLOYEE` column order.
fn bind_form<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    form: &'q EmployeeForm,
    joined_date: NaiveDate,
) -> Query<'q, MySql, MySqlArguments> {
    query
        .bind(form.employee_code.trim())
        .bind(form.first_name.as_str())
        .bind(form.middle_name.as_deref())
        .bind(form.last_name.as_str())
        .bind(form.email.as_str())
        .bind(form.date_of_birth)
        .bind(form.gender.as_str())
        .bind(form.phone_number.as_str())
        .bind(form.address.as_deref())
        .bind(joined_date)
        .bind(form.role_id)
        .bind(form.department_id)
        .bind(form.is_active_employee)
        .bind(form.residential_status.as_deref())
        .bind(form.national_id.as_deref())
        .bind(form.kra_pin.as_deref())
        .bind(form.nssf_no.as_deref())
        .bind(form.nhif_no.as_deref())
        .bind(form.basic_salary)
        .bind(form.bank.as_deref())
        .bind(form.bank_account_name.as_deref())
        .bind(form.bank_account_number.as_deref())
        .bind(form.bank_branch.as_deref())
        .bind(form.employee_personal_number.as_deref())
        .bind(form.date_of_employment)
        .bind(form.contract_type.as_deref())
        .bind(form.job_title.as_deref())
        .bind(form.employee_email.as_deref())
        .bind(form.mobile_phone.as_deref())
}

pub async fn is_username_available(pool: &MySqlPool, username: &str) -> AppResult<bool> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE username = ?")
        .bind(username)
        .fetch_one(pool)
        .await?;
    Ok(count == 0)
}

/// Inserts the employee and its login in one transaction.
/// Returns `(employee_id, user_id)`.
pub async fn insert_employee_account(
    pool: &MySqlPool,
    form: &EmployeeForm,
    username: &str,
    password_hash: &str,
    role: AccessRole,
) -> AppResult<(u64, u64)> {
    let joined_date = form.joined_date.unwrap_or_else(|| Utc::now().date_naive());

    let mut tx = pool.begin().await?;

    let employee_id = bind_form(sqlx::query(INSERT_EMPLOYEE), form, joined_date)
        .execute(&mut *tx)
        .await?
        .last_insert_id();

    let user_id = sqlx::query(
        "INSERT INTO users (username, password, role_id, employee_id) VALUES (?, ?, ?, ?)",
    )
    .bind(username)
    .bind(password_hash)
    .bind(role.id())
    .bind(employee_id)
    .execute(&mut *tx)
    .await?
    .last_insert_id();

    tx.commit().await?;

    Ok((employee_id, user_id))
}

/// Resolves the public employee code to the row id.
pub async fn find_employee_id(pool: &MySqlPool, employee_code: &str) -> AppResult<u64> {
    sqlx::query_scalar::<_, u64>("SELECT id FROM employees WHERE employee_code = ?")
        .bind(employee_code)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee not found".into()))
}

/// Add Employee (HR)
#[utoipa::path(
    post,
    path = "/api/employee/add",
    request_body = AddEmployee,
    responses(
        (status = 201, description = "Employee added successfully", body = Object, example = json!({
            "message": "Employee added successfully",
            "employee_id": 1
        })),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Username or employee id already exists")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn add_employee(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<AddEmployee>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let payload = payload.into_inner();
    let username = payload.username.trim().to_lowercase();
    validate_username(&username)?;
    payload.employee.validate()?;

    let password = match payload.password.as_deref() {
        Some(password) => {
            validate_password_confirmation(
                password,
                payload.confirm_password.as_deref().unwrap_or_default(),
            )?;
            password.to_owned()
        }
        None => config.default_employee_password.clone(),
    };

    let role = match payload.access_role_id {
        Some(id) => AccessRole::from_id(id)
            .ok_or_else(|| AppError::Validation("Unknown access role".into()))?,
        None => AccessRole::Employee,
    };
    if role == AccessRole::Admin {
        auth.require_admin()?;
    }

    if !is_username_available(pool.get_ref(), &username).await? {
        return Err(AppError::Conflict("Username already taken".into()));
    }

    let hashed = hash_password(&password).map_err(|e| {
        tracing::error!(error = %e, "Password hashing failed");
        AppError::Validation("Password could not be processed".into())
    })?;

    let (employee_id, _) =
        insert_employee_account(pool.get_ref(), &payload.employee, &username, &hashed, role)
            .await?;

    info!(employee_id, added_by = auth.user_id, "Employee added");

    Ok(HttpResponse::Created().json(json!({
        "message": "Employee added successfully!",
        "employee_id": employee_id
    })))
}

/// List employees with optional department / role filters
#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse)
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let (page, per_page, offset) = page_window(query.page, query.per_page, 20);

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(department) = query.department.as_deref().filter(|d| !d.is_empty()) {
        conditions.push("d.name = ?");
        bindings.push(department.to_owned());
    }

    if let Some(role) = query.role.as_deref().filter(|r| !r.is_empty()) {
        conditions.push("r.title = ?");
        bindings.push(role.to_owned());
    }

    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        conditions.push(
            "(e.first_name LIKE ? OR e.last_name LIKE ? OR e.email LIKE ? OR e.employee_code LIKE ?)",
        );
        let like = format!("%{}%", search);
        bindings.extend(std::iter::repeat(like).take(4));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let from = r#"
        FROM employees e
        LEFT JOIN users u ON u.employee_id = e.id
        LEFT JOIN departments d ON d.id = e.department_id
        LEFT JOIN employee_roles r ON r.id = e.role_id
    "#;

    let count_sql = format!("SELECT COUNT(*) {from} {where_clause}");
    debug!(sql = %count_sql, bindings = ?bindings, "Counting employees");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }
    let total = count_query.fetch_one(pool.get_ref()).await?;

    let data_sql = format!(
        r#"
        SELECT e.id, e.employee_code, u.username, e.first_name, e.last_name, e.email,
               d.name AS department, r.title AS role, e.is_active_employee, e.joined_date
        {from} {where_clause}
        ORDER BY e.id DESC
        LIMIT ? OFFSET ?
        "#
    );
    debug!(sql = %data_sql, page, per_page, offset, "Fetching employees");

    let mut data_query = sqlx::query_as::<_, EmployeeSummary>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    let employees = data_query
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page,
        per_page,
        total,
    }))
}

/// Employee profile with recent attendance, salary and leave history
#[utoipa::path(
    get,
    path = "/api/employees/profile/{employee_id}",
    params(
        ("employee_id" = String, Path, description = "Employee id (code)")
    ),
    responses(
        (status = 200, description = "Employee found", body = EmployeeProfile),
        (status = 403, description = "Not your profile"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn employee_profile(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let employee_code = path.into_inner();
    let pool = pool.get_ref();

    let employee = sqlx::query_as::<_, Employee>(&format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees e WHERE e.employee_code = ?"
    ))
    .bind(&employee_code)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Employee not found".into()))?;

    if !auth.has_elevated_view() && auth.employee_id != Some(employee.id) {
        return Err(AppError::Forbidden(
            "You can only view your own profile".into(),
        ));
    }

    let (username, department, role) =
        sqlx::query_as::<_, (Option<String>, Option<String>, Option<String>)>(
            r#"
            SELECT u.username, d.name, r.title
            FROM employees e
            LEFT JOIN users u ON u.employee_id = e.id
            LEFT JOIN departments d ON d.id = e.department_id
            LEFT JOIN employee_roles r ON r.id = e.role_id
            WHERE e.id = ?
            "#,
        )
        .bind(employee.id)
        .fetch_one(pool)
        .await?;

    let attendance_records = sqlx::query_as::<_, Attendance>(
        r#"
        SELECT id, employee_id, date, check_in, check_out, is_present, is_leave
        FROM attendance WHERE employee_id = ?
        ORDER BY date DESC LIMIT 10
        "#,
    )
    .bind(employee.id)
    .fetch_all(pool)
    .await?;

    let salary_history = sqlx::query_as::<_, Salary>(
        r#"
        SELECT id, employee_id, base_salary, bonus, deductions, tax_rate, net_salary, month, year
        FROM salaries WHERE employee_id = ?
        ORDER BY year DESC, month DESC
        "#,
    )
    .bind(employee.id)
    .fetch_all(pool)
    .await?;

    let leave_history = sqlx::query_as::<_, LeaveApplication>(
        r#"
        SELECT id, employee_id, leave_type_id, start_date, end_date, days, reason, status, applied_on
        FROM leave_applications WHERE employee_id = ?
        ORDER BY applied_on DESC
        "#,
    )
    .bind(employee.id)
    .fetch_all(pool)
    .await?;

    Ok(HttpResponse::Ok().json(EmployeeProfile {
        employee,
        username,
        department,
        role,
        attendance_records,
        salary_history,
        leave_history,
    }))
}

/// Update Employee (full record)
#[utoipa::path(
    post,
    path = "/api/update-employee/{employee_id}",
    params(
        ("employee_id" = String, Path, description = "Employee id (code)")
    ),
    request_body = EmployeeForm,
    responses(
        (status = 200, description = "Employee updated successfully", body = Object, example = json!({
            "message": "Employee updated successfully"
        })),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_employee(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    body: web::Json<EmployeeForm>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;
    body.validate()?;

    let employee_id = find_employee_id(pool.get_ref(), &path.into_inner()).await?;

    // joined_date is required on the row; keep the stored one when omitted
    let joined_date = match body.joined_date {
        Some(d) => d,
        None => {
            sqlx::query_scalar::<_, NaiveDate>("SELECT joined_date FROM employees WHERE id = ?")
                .bind(employee_id)
                .fetch_one(pool.get_ref())
                .await?
        }
    };

    bind_form(sqlx::query(UPDATE_EMPLOYEE), &body, joined_date)
        .bind(employee_id)
        .execute(pool.get_ref())
        .await?;

    info!(employee_id, updated_by = auth.user_id, "Employee updated");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee updated successfully"
    })))
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/api/employee/delete/{employee_id}",
    params(
        ("employee_id" = String, Path, description = "Employee id (code)")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_employee(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let employee_code = path.into_inner();

    let result = sqlx::query("DELETE FROM employees WHERE employee_code = ?")
        .bind(&employee_code)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Employee not found".into()));
    }

    info!(employee_code = %employee_code, deleted_by = auth.user_id, "Employee deleted");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> EmployeeForm {
        serde_json::from_value(json!({
            "employee_code": "EMP-001",
            "first_name": "Jane",
            "last_name": "Doe",
            "email": "jane@company.com",
            "gender": "F",
            "phone_number": "+254712345678"
        }))
        .unwrap()
    }

    #[test]
    fn minimal_form_is_valid_and_active_by_default() {
        let form = form();
        assert!(form.is_active_employee);
        assert!(form.validate().is_ok());
    }

    #[test]
    fn bad_phone_or_gender_is_rejected() {
        let mut bad_phone = form();
        bad_phone.phone_number = "12-34".into();
        assert!(bad_phone.validate().is_err());

        let mut bad_gender = form();
        bad_gender.gender = "X".into();
        assert!(bad_gender.validate().is_err());
    }

    #[test]
    fn residential_and_contract_codes_are_checked() {
        let mut f = form();
        f.residential_status = Some("NR".into());
        f.contract_type = Some("T".into());
        assert!(f.validate().is_ok());
        f.contract_type = Some("X".into());
        assert!(f.validate().is_err());
    }

    #[test]
    fn add_employee_payload_flattens_the_form() {
        let payload: AddEmployee = serde_json::from_value(json!({
            "username": "jane",
            "employee_code": "EMP-002",
            "first_name": "Jane",
            "last_name": "Doe",
            "email": "jane@company.com",
            "gender": "F",
            "phone_number": "712345678"
        }))
        .unwrap();
        assert_eq!(payload.username, "jane");
        assert!(payload.password.is_none());
        assert_eq!(payload.employee.employee_code, "EMP-002");
    }
}

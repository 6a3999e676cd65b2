use crate::{
    auth::auth::CurrentUser,
    error::{AppError, AppResult},
    model::employee_role::EmployeeRole,
    service::validation::validate_amounts,
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct RoleForm {
    #[schema(example = "Engineer")]
    pub title: String,
    #[schema(example = 50000.0)]
    pub base_salary: f64,
    #[schema(example = 1)]
    pub department_id: Option<u64>,
}

impl RoleForm {
    fn validate(&self) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("title must not be empty".into()));
        }
        validate_amounts(&[("base_salary", self.base_salary)])
    }
}

#[utoipa::path(
    get,
    path = "/api/roles",
    responses(
        (status = 200, description = "All employee roles", body = [EmployeeRole])
    ),
    tag = "Organisation",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_roles(_auth: CurrentUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    let roles = sqlx::query_as::<_, EmployeeRole>(
        "SELECT id, title, base_salary, department_id FROM employee_roles ORDER BY title",
    )
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(roles))
}

#[utoipa::path(
    post,
    path = "/api/roles",
    request_body = RoleForm,
    responses(
        (status = 201, description = "Role created", body = EmployeeRole),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Unknown department")
    ),
    tag = "Organisation",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_role(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<RoleForm>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;
    body.validate()?;

    let id = sqlx::query(
        "INSERT INTO employee_roles (title, base_salary, department_id) VALUES (?, ?, ?)",
    )
    .bind(body.title.trim())
    .bind(body.base_salary)
    .bind(body.department_id)
    .execute(pool.get_ref())
    .await?
    .last_insert_id();

    Ok(HttpResponse::Created().json(EmployeeRole {
        id,
        title: body.title.trim().to_owned(),
        base_salary: body.base_salary,
        department_id: body.department_id,
    }))
}

#[utoipa::path(
    put,
    path = "/api/roles/{id}",
    params(
        ("id" = u64, Path, description = "Role id")
    ),
    request_body = RoleForm,
    responses(
        (status = 200, description = "Role updated", body = EmployeeRole),
        (status = 404, description = "Role not found")
    ),
    tag = "Organisation",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_role(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<RoleForm>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;
    body.validate()?;

    let id = path.into_inner();

    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employee_roles WHERE id = ?")
        .bind(id)
        .fetch_one(pool.get_ref())
        .await?;
    if exists == 0 {
        return Err(AppError::NotFound("Role not found".into()));
    }

    sqlx::query(
        "UPDATE employee_roles SET title = ?, base_salary = ?, department_id = ? WHERE id = ?",
    )
    .bind(body.title.trim())
    .bind(body.base_salary)
    .bind(body.department_id)
    .bind(id)
    .execute(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(EmployeeRole {
        id,
        title: body.title.trim().to_owned(),
        base_salary: body.base_salary,
        department_id: body.department_id,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/roles/{id}",
    params(
        ("id" = u64, Path, description = "Role id")
    ),
    responses(
        (status = 200, description = "Role deleted", body = Object, example = json!({
            "message": "Role deleted"
        })),
        (status = 404, description = "Role not found")
    ),
    tag = "Organisation",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_role(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let result = sqlx::query("DELETE FROM employee_roles WHERE id = ?")
        .bind(path.into_inner())
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Role not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Role deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_base_salary_is_rejected() {
        let form = RoleForm {
            title: "Engineer".into(),
            base_salary: -1.0,
            department_id: None,
        };
        assert!(form.validate().is_err());
    }
}

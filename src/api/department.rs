use crate::{
    auth::auth::CurrentUser,
    error::{AppError, AppResult},
    model::department::Department,
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct DepartmentForm {
    #[schema(example = "Engineering")]
    pub name: String,
    #[schema(example = "Product and platform engineering")]
    pub description: Option<String>,
}

async fn fetch_department(pool: &MySqlPool, id: u64) -> AppResult<Department> {
    sqlx::query_as::<_, Department>("SELECT id, name, description FROM departments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Department not found".into()))
}

#[utoipa::path(
    get,
    path = "/api/departments",
    responses(
        (status = 200, description = "All departments", body = [Department])
    ),
    tag = "Organisation",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_departments(
    _auth: CurrentUser,
    pool: web::Data<MySqlPool>,
) -> AppResult<HttpResponse> {
    let departments = sqlx::query_as::<_, Department>(
        "SELECT id, name, description FROM departments ORDER BY name",
    )
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(departments))
}

#[utoipa::path(
    get,
    path = "/api/departments/{id}",
    params(
        ("id" = u64, Path, description = "Department id")
    ),
    responses(
        (status = 200, description = "Department found", body = Department),
        (status = 404, description = "Department not found")
    ),
    tag = "Organisation",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_department(
    _auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let department = fetch_department(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(department))
}

#[utoipa::path(
    post,
    path = "/api/departments",
    request_body = DepartmentForm,
    responses(
        (status = 201, description = "Department created", body = Department),
        (status = 409, description = "Department name already exists")
    ),
    tag = "Organisation",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_department(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<DepartmentForm>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name must not be empty".into()));
    }

    let id = sqlx::query("INSERT INTO departments (name, description) VALUES (?, ?)")
        .bind(name)
        .bind(body.description.as_deref())
        .execute(pool.get_ref())
        .await?
        .last_insert_id();

    Ok(HttpResponse::Created().json(Department {
        id,
        name: name.to_owned(),
        description: body.description.clone(),
    }))
}

#[utoipa::path(
    put,
    path = "/api/departments/{id}",
    params(
        ("id" = u64, Path, description = "Department id")
    ),
    request_body = DepartmentForm,
    responses(
        (status = 200, description = "Department updated", body = Department),
        (status = 404, description = "Department not found")
    ),
    tag = "Organisation",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_department(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<DepartmentForm>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let id = path.into_inner();
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name must not be empty".into()));
    }

    fetch_department(pool.get_ref(), id).await?;

    sqlx::query("UPDATE departments SET name = ?, description = ? WHERE id = ?")
        .bind(name)
        .bind(body.description.as_deref())
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(Department {
        id,
        name: name.to_owned(),
        description: body.description.clone(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/departments/{id}",
    params(
        ("id" = u64, Path, description = "Department id")
    ),
    responses(
        (status = 200, description = "Department deleted", body = Object, example = json!({
            "message": "Department deleted"
        })),
        (status = 404, description = "Department not found")
    ),
    tag = "Organisation",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_department(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let result = sqlx::query("DELETE FROM departments WHERE id = ?")
        .bind(path.into_inner())
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Department not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Department deleted" })))
}

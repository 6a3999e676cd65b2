use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A position an employee can hold; `base_salary` seeds new salary records.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct EmployeeRole {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Engineer")]
    pub title: String,
    #[schema(example = 50000.0)]
    pub base_salary: f64,
    #[schema(example = 1, nullable = true)]
    pub department_id: Option<u64>,
}

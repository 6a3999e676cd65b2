use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct TaxDeclaration {
    pub id: u64,
    pub employee_id: u64,
    #[schema(example = 2026)]
    pub financial_year: i32,
    #[schema(example = 120000.0)]
    pub total_investment: f64,
    #[schema(example = 24000.0)]
    pub tax_exemption_claimed: f64,
    #[schema(value_type = String, format = "date")]
    pub submitted_date: NaiveDate,
    pub is_verified: bool,
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Salary {
    pub id: u64,
    pub employee_id: u64,
    #[schema(example = 50000.0)]
    pub base_salary: f64,
    #[schema(example = 5000.0)]
    pub bonus: f64,
    #[schema(example = 7500.0)]
    pub deductions: f64,
    #[schema(example = 15.0)]
    pub tax_rate: f64,
    #[schema(example = 47500.0)]
    pub net_salary: f64,
    #[schema(example = 1)]
    pub month: i32,
    #[schema(example = 2026)]
    pub year: i32,
}

impl Salary {
    pub fn net(base_salary: f64, bonus: f64, deductions: f64) -> f64 {
        base_salary + bonus - deductions
    }

    pub fn gross(&self) -> f64 {
        self.base_salary + self.bonus
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PaySlip {
    pub id: u64,
    pub salary_id: u64,
    #[schema(example = "2026-01-31", value_type = String, format = "date")]
    pub issue_date: NaiveDate,
    #[schema(example = "PS-202601-3F2A9C1B")]
    pub receipt_number: String,
    #[schema(example = 22)]
    pub total_working_days: i32,
    #[schema(example = 20)]
    pub days_present: i32,
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "EMP-001",
        "first_name": "John",
        "middle_name": null,
        "last_name": "Doe",
        "email": "john.doe@company.com",
        "gender": "M",
        "phone_number": "+254712345678",
        "joined_date": "2024-01-01",
        "department_id": 10,
        "role_id": 3,
        "is_active_employee": true
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-001")]
    pub employee_code: String,

    #[schema(example = "John")]
    pub first_name: String,

    #[schema(nullable = true)]
    pub middle_name: Option<String>,

    #[schema(example = "Doe")]
    pub last_name: String,

    #[schema(example = "john.doe@company.com")]
    pub email: String,

    #[schema(value_type = Option<String>, format = "date", nullable = true)]
    pub date_of_birth: Option<NaiveDate>,

    /// `M`, `F` or `O`
    #[schema(example = "M")]
    pub gender: String,

    #[schema(example = "+254712345678")]
    pub phone_number: String,

    #[schema(nullable = true)]
    pub address: Option<String>,

    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub joined_date: NaiveDate,

    #[schema(example = 3, nullable = true)]
    pub role_id: Option<u64>,

    #[schema(example = 10, nullable = true)]
    pub department_id: Option<u64>,

    pub is_active_employee: bool,

    /// `R` resident, `NR` non-resident
    #[schema(nullable = true)]
    pub residential_status: Option<String>,
    #[schema(nullable = true)]
    pub national_id: Option<String>,
    #[schema(nullable = true)]
    pub kra_pin: Option<String>,
    #[schema(nullable = true)]
    pub nssf_no: Option<String>,
    #[schema(nullable = true)]
    pub nhif_no: Option<String>,
    #[schema(nullable = true)]
    pub basic_salary: Option<f64>,
    #[schema(nullable = true)]
    pub bank: Option<String>,
    #[schema(nullable = true)]
    pub bank_account_name: Option<String>,
    #[schema(nullable = true)]
    pub bank_account_number: Option<String>,
    #[schema(nullable = true)]
    pub bank_branch: Option<String>,
    #[schema(nullable = true)]
    pub employee_personal_number: Option<String>,
    #[schema(value_type = Option<String>, format = "date", nullable = true)]
    pub date_of_employment: Option<NaiveDate>,
    /// `P` permanent, `T` temporary
    #[schema(nullable = true)]
    pub contract_type: Option<String>,
    #[schema(nullable = true)]
    pub job_title: Option<String>,
    #[schema(nullable = true)]
    pub employee_email: Option<String>,
    #[schema(nullable = true)]
    pub mobile_phone: Option<String>,
}

/// Listing row: the employee joined with login name, department and role.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct EmployeeSummary {
    pub id: u64,
    #[schema(example = "EMP-001")]
    pub employee_code: String,
    #[schema(example = "jdoe", nullable = true)]
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,
    #[schema(example = "Engineer", nullable = true)]
    pub role: Option<String>,
    pub is_active_employee: bool,
    #[schema(value_type = String, format = "date")]
    pub joined_date: NaiveDate,
}

pub const EMPLOYEE_COLUMNS: &str = r#"
    e.id, e.employee_code, e.first_name, e.middle_name, e.last_name, e.email,
    e.date_of_birth, e.gender, e.phone_number, e.address, e.joined_date,
    e.role_id, e.department_id, e.is_active_employee, e.residential_status,
    e.national_id, e.kra_pin, e.nssf_no, e.nhif_no, e.basic_salary, e.bank,
    e.bank_account_name, e.bank_account_number, e.bank_branch,
    e.employee_personal_number, e.date_of_employment, e.contract_type,
    e.job_title, e.employee_email, e.mobile_phone
"#;

impl Employee {
    pub fn full_name(&self) -> String {
        match self.middle_name.as_deref().filter(|m| !m.is_empty()) {
            Some(middle) => format!("{} {} {}", self.first_name, middle, self.last_name),
            None => format!("{} {}", self.first_name, self.last_name),
        }
    }
}

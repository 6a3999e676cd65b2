use crate::api::{
    attendance::{AttendanceListResponse, AttendanceRange},
    dashboard::{AdminDashboard, UserDashboard},
    department::DepartmentForm,
    employee::{AddEmployee, EmployeeForm, EmployeeListResponse, EmployeeProfile},
    employee_role::RoleForm,
    leave::{
        ApplyLeave, ApplyLeaveResponse, LeaveApplicationDetail, LeaveListResponse, LeaveTypeForm,
        UpdateLeaveStatus,
    },
    salary::{PayslipDocument, SalaryForm, SalaryRecord},
    tax::DeclarationForm,
};
use crate::model::{
    attendance::Attendance,
    department::Department,
    employee::{Employee, EmployeeSummary},
    employee_role::EmployeeRole,
    leave::{LeaveApplication, LeaveStatus, LeaveType},
    salary::{PaySlip, Salary},
    tax_declaration::TaxDeclaration,
};
use crate::models::{LoginReqDto, LoginResponse, RegisterReq, TokenPair};
use crate::service::{
    attendance_range::RangeOutcome,
    leave_policy::LeaveBalance,
    payroll::{AttendanceSummary, DepartmentPayroll, PayrollRow, PayrollSummary, PayrollTotals},
    tax::{MonthlyEarning, TaxCertificate, YearToDate},
};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

/// Registers the `bearer_auth` scheme referenced by protected paths.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR & Payroll API",
        version = "1.0.0",
        description = r#"
## HR & Payroll Administration

Back office for a small organisation: employees, attendance, leave, salaries,
payslips and tax declarations.

### 🔹 Key Features
- **Employee Management**
  - Add, update, list, delete and view employee profiles
- **Attendance**
  - Daily marking, check-out and bulk date ranges
- **Leave Management**
  - Leave types with yearly caps, applications and HR decisions
- **Payroll**
  - Monthly salaries, payslips (JSON or PDF) and a monthly payroll report
- **Tax**
  - Investment declarations and yearly tax certificates

### 🔐 Security
Protected endpoints expect a **JWT Bearer** access token from `/login`.
Roles: **Admin**, **HR** and **Employee**.

---
Built with **Rust**, **Actix Web**, **SQLx** and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::dashboard::dashboard,
        crate::api::dashboard::user_dashboard,

        crate::api::employee::add_employee,
        crate::api::employee::list_employees,
        crate::api::employee::employee_profile,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::attendance::mark_attendance,
        crate::api::attendance::check_out,
        crate::api::attendance::attendance_range,
        crate::api::attendance::list_attendance,
        crate::api::attendance::my_attendance,

        crate::api::leave::apply_leave,
        crate::api::leave::leave_history,
        crate::api::leave::leave_applications,
        crate::api::leave::update_leave_status,
        crate::api::leave::list_leave_types,
        crate::api::leave::create_leave_type,
        crate::api::leave::update_leave_type,
        crate::api::leave::delete_leave_type,

        crate::api::department::list_departments,
        crate::api::department::get_department,
        crate::api::department::create_department,
        crate::api::department::update_department,
        crate::api::department::delete_department,

        crate::api::employee_role::list_roles,
        crate::api::employee_role::create_role,
        crate::api::employee_role::update_role,
        crate::api::employee_role::delete_role,

        crate::api::salary::add_salary,
        crate::api::salary::my_salary,
        crate::api::salary::general_salaries,
        crate::api::salary::payslip,
        crate::api::salary::issue_payslip,
        crate::api::salary::payslip_pdf,
        crate::api::report::monthly_report,

        crate::api::tax::submit_declaration,
        crate::api::tax::list_declarations,
        crate::api::tax::verify_declaration,
        crate::api::tax::my_tax_certificate,
        crate::api::tax::tax_certificate_for_year,
        crate::api::tax::employee_tax_certificate
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            TokenPair,
            LoginResponse,
            AdminDashboard,
            UserDashboard,
            Employee,
            EmployeeSummary,
            EmployeeForm,
            AddEmployee,
            EmployeeListResponse,
            EmployeeProfile,
            Attendance,
            AttendanceRange,
            AttendanceListResponse,
            RangeOutcome,
            LeaveType,
            LeaveStatus,
            LeaveApplication,
            LeaveApplicationDetail,
            LeaveListResponse,
            LeaveBalance,
            ApplyLeave,
            ApplyLeaveResponse,
            UpdateLeaveStatus,
            LeaveTypeForm,
            Department,
            DepartmentForm,
            EmployeeRole,
            RoleForm,
            Salary,
            SalaryForm,
            SalaryRecord,
            PaySlip,
            PayslipDocument,
            PayrollRow,
            PayrollTotals,
            DepartmentPayroll,
            AttendanceSummary,
            PayrollSummary,
            TaxDeclaration,
            DeclarationForm,
            YearToDate,
            MonthlyEarning,
            TaxCertificate
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and token rotation"),
        (name = "Dashboard", description = "Landing page summaries"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Organisation", description = "Departments and roles"),
        (name = "Payroll", description = "Salaries, payslips and payroll reports"),
        (name = "Tax", description = "Tax declarations and certificates"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }

    #[test]
    fn session_and_report_paths_are_documented() {
        let doc = ApiDoc::openapi();
        for path in ["/login", "/refresh", "/api/reports/monthly", "/api/payslip/{salary_id}/pdf"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}

//! Year-to-date earnings and the effective tax rate for tax certificates.

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    auth::auth::CurrentUser,
    error::{AppError, AppResult},
    model::{salary::Salary, tax_declaration::TaxDeclaration},
    service::payroll::{percentage, round2},
};

#[derive(Debug, Default, Clone, PartialEq, Serialize, ToSchema)]
pub struct YearToDate {
    pub base_salary: f64,
    pub bonus: f64,
    pub deductions: f64,
    pub net_salary: f64,
    pub gross_income: f64,
    /// Deductions withheld over the year.
    pub tax_paid: f64,
    pub effective_tax_rate: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MonthlyEarning {
    pub month: i32,
    pub base_salary: f64,
    pub bonus: f64,
    pub deductions: f64,
    pub net_salary: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TaxCertificate {
    pub employee_id: u64,
    pub employee_code: String,
    pub employee_name: String,
    pub username: String,
    #[schema(nullable = true)]
    pub kra_pin: Option<String>,
    pub financial_year: i32,
    pub year_to_date: YearToDate,
    pub months: Vec<MonthlyEarning>,
    pub declarations: Vec<TaxDeclaration>,
    pub total_investment: f64,
    pub total_exemption_claimed: f64,
}

/// `tax_paid / gross * 100`, zero for zero gross income.
pub fn effective_tax_rate(tax_paid: f64, gross_income: f64) -> f64 {
    percentage(tax_paid, gross_income)
}

pub fn year_to_date(salaries: &[Salary]) -> YearToDate {
    let base_salary: f64 = salaries.iter().map(|s| s.base_salary).sum();
    let bonus: f64 = salaries.iter().map(|s| s.bonus).sum();
    let deductions: f64 = salaries.iter().map(|s| s.deductions).sum();
    let net_salary: f64 = salaries.iter().map(|s| s.net_salary).sum();
    let gross_income = base_salary + bonus;

    YearToDate {
        base_salary: round2(base_salary),
        bonus: round2(bonus),
        deductions: round2(deductions),
        net_salary: round2(net_salary),
        gross_income: round2(gross_income),
        tax_paid: round2(deductions),
        effective_tax_rate: effective_tax_rate(deductions, gross_income),
    }
}

pub fn monthly_breakdown(salaries: &[Salary]) -> Vec<MonthlyEarning> {
    let mut months: Vec<MonthlyEarning> = salaries
        .iter()
        .map(|s| MonthlyEarning {
            month: s.month,
            base_salary: s.base_salary,
            bonus: s.bonus,
            deductions: s.deductions,
            net_salary: s.net_salary,
        })
        .collect();
    months.sort_by_key(|m| m.month);
    months
}

/// An employee sees only their own certificate; Admin and HR see anyone's.
pub fn ensure_can_view_certificate(user: &CurrentUser, employee_id: u64) -> AppResult<()> {
    if user.has_elevated_view() || user.employee_id == Some(employee_id) {
        return Ok(());
    }
    Err(certificate_forbidden())
}

pub fn certificate_forbidden() -> AppError {
    AppError::Forbidden("You are not allowed to view this tax certificate".into())
}

pub struct CertificateSubject {
    pub employee_id: u64,
    pub employee_code: String,
    pub employee_name: String,
    pub username: String,
    pub kra_pin: Option<String>,
}

pub fn build_certificate(
    subject: CertificateSubject,
    financial_year: i32,
    salaries: &[Salary],
    declarations: Vec<TaxDeclaration>,
) -> TaxCertificate {
    let total_investment = round2(declarations.iter().map(|d| d.total_investment).sum());
    let total_exemption_claimed =
        round2(declarations.iter().map(|d| d.tax_exemption_claimed).sum());

    TaxCertificate {
        employee_id: subject.employee_id,
        employee_code: subject.employee_code,
        employee_name: subject.employee_name,
        username: subject.username,
        kra_pin: subject.kra_pin,
        financial_year,
        year_to_date: year_to_date(salaries),
        months: monthly_breakdown(salaries),
        declarations,
        total_investment,
        total_exemption_claimed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::access::AccessRole;

    fn salary(month: i32, base: f64, bonus: f64, deductions: f64) -> Salary {
        Salary {
            id: month as u64,
            employee_id: 1,
            base_salary: base,
            bonus,
            deductions,
            tax_rate: 0.0,
            net_salary: Salary::net(base, bonus, deductions),
            month,
            year: 2026,
        }
    }

    fn user(role: AccessRole, employee_id: Option<u64>) -> CurrentUser {
        CurrentUser {
            user_id: 1,
            username: "someone".into(),
            role,
            employee_id,
        }
    }

    #[test]
    fn zero_gross_gives_zero_rate() {
        assert_eq!(effective_tax_rate(0.0, 0.0), 0.0);
        assert_eq!(year_to_date(&[]), YearToDate::default());
    }

    #[test]
    fn rate_is_tax_over_gross() {
        let ytd = year_to_date(&[salary(1, 100000.0, 0.0, 15000.0)]);
        assert_eq!(ytd.effective_tax_rate, 15.0);
        assert_eq!(ytd.tax_paid, 15000.0);
        assert_eq!(ytd.net_salary, 85000.0);
    }

    #[test]
    fn year_to_date_sums_every_month() {
        let salaries = vec![
            salary(2, 50000.0, 5000.0, 5500.0),
            salary(1, 50000.0, 0.0, 5000.0),
            salary(3, 50000.0, 0.0, 5000.0),
        ];

        let ytd = year_to_date(&salaries);
        assert_eq!(ytd.base_salary, 150000.0);
        assert_eq!(ytd.bonus, 5000.0);
        assert_eq!(ytd.gross_income, 155000.0);
        assert_eq!(ytd.deductions, 15500.0);
        assert_eq!(ytd.effective_tax_rate, 10.0);

        let months: Vec<_> = monthly_breakdown(&salaries).iter().map(|m| m.month).collect();
        assert_eq!(months, vec![1, 2, 3]);
    }

    #[test]
    fn employees_only_see_their_own_certificate() {
        assert!(ensure_can_view_certificate(&user(AccessRole::Employee, Some(5)), 5).is_ok());
        assert!(matches!(
            ensure_can_view_certificate(&user(AccessRole::Employee, Some(5)), 6),
            Err(AppError::Forbidden(_))
        ));
        assert!(ensure_can_view_certificate(&user(AccessRole::Employee, None), 6).is_err());
    }

    #[test]
    fn hr_and_admin_see_any_certificate() {
        assert!(ensure_can_view_certificate(&user(AccessRole::Hr, None), 6).is_ok());
        assert!(ensure_can_view_certificate(&user(AccessRole::Admin, Some(1)), 6).is_ok());
    }
}

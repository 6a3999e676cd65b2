//! Monthly payroll aggregation and working-day arithmetic.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use utoipa::ToSchema;

const UNASSIGNED: &str = "Unassigned";

/// One salary record joined with its employee and department.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct PayrollRow {
    pub salary_id: u64,
    pub employee_id: u64,
    #[schema(example = "John Doe")]
    pub employee_name: String,
    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,
    pub base_salary: f64,
    pub bonus: f64,
    pub deductions: f64,
    pub net_salary: f64,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, ToSchema)]
pub struct PayrollTotals {
    pub total_base: f64,
    pub total_bonus: f64,
    pub total_deductions: f64,
    pub total_net: f64,
    pub employee_count: u64,
    pub average_net: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DepartmentPayroll {
    pub department: String,
    #[serde(flatten)]
    pub totals: PayrollTotals,
    /// Share of the period's total net pay, in percent.
    pub share_of_net: f64,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, ToSchema)]
pub struct AttendanceSummary {
    pub working_days: u32,
    pub active_employees: u64,
    pub present_days: u64,
    pub leave_days: u64,
    pub present_percentage: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PayrollSummary {
    pub month: u32,
    pub year: i32,
    pub totals: PayrollTotals,
    pub departments: Vec<DepartmentPayroll>,
    pub top_earners: Vec<PayrollRow>,
    pub attendance: AttendanceSummary,
}

/// `part / whole * 100`, zero when `whole` is zero.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    round2(part * 100.0 / whole)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Default)]
struct Accumulator {
    base: f64,
    bonus: f64,
    deductions: f64,
    net: f64,
    employees: BTreeSet<u64>,
}

impl Accumulator {
    fn add(&mut self, row: &PayrollRow) {
        self.base += row.base_salary;
        self.bonus += row.bonus;
        self.deductions += row.deductions;
        self.net += row.net_salary;
        self.employees.insert(row.employee_id);
    }

    fn totals(&self) -> PayrollTotals {
        let employee_count = self.employees.len() as u64;
        PayrollTotals {
            total_base: round2(self.base),
            total_bonus: round2(self.bonus),
            total_deductions: round2(self.deductions),
            total_net: round2(self.net),
            employee_count,
            average_net: if employee_count == 0 {
                0.0
            } else {
                round2(self.net / employee_count as f64)
            },
        }
    }
}

pub fn aggregate_totals(rows: &[PayrollRow]) -> PayrollTotals {
    let mut acc = Accumulator::default();
    rows.iter().for_each(|r| acc.add(r));
    acc.totals()
}

/// Sub-totals per department, ordered by department name.
pub fn aggregate_by_department(rows: &[PayrollRow]) -> Vec<DepartmentPayroll> {
    let mut groups: BTreeMap<String, Accumulator> = BTreeMap::new();
    for row in rows {
        let key = row.department.clone().unwrap_or_else(|| UNASSIGNED.to_string());
        groups.entry(key).or_default().add(row);
    }

    let grand_net: f64 = rows.iter().map(|r| r.net_salary).sum();

    groups
        .into_iter()
        .map(|(department, acc)| DepartmentPayroll {
            share_of_net: percentage(acc.net, grand_net),
            department,
            totals: acc.totals(),
        })
        .collect()
}

/// Highest `n` records by net salary; ties keep the older record first.
pub fn top_earners(rows: &[PayrollRow], n: usize) -> Vec<PayrollRow> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| {
        b.net_salary
            .total_cmp(&a.net_salary)
            .then(a.salary_id.cmp(&b.salary_id))
    });
    sorted.truncate(n);
    sorted
}

/// Monday to Friday days of the month.
pub fn working_days_in_month(year: i32, month: u32) -> u32 {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return 0;
    };

    first
        .iter_days()
        .take_while(|d| d.month() == month)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .count() as u32
}

pub fn attendance_summary(
    active_employees: u64,
    working_days: u32,
    present_days: u64,
    leave_days: u64,
) -> AttendanceSummary {
    let expected = active_employees as f64 * f64::from(working_days);
    AttendanceSummary {
        working_days,
        active_employees,
        present_days,
        leave_days,
        present_percentage: percentage(present_days as f64, expected),
    }
}

pub fn summarize(
    month: u32,
    year: i32,
    rows: &[PayrollRow],
    top_n: usize,
    attendance: AttendanceSummary,
) -> PayrollSummary {
    PayrollSummary {
        month,
        year,
        totals: aggregate_totals(rows),
        departments: aggregate_by_department(rows),
        top_earners: top_earners(rows, top_n),
        attendance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(salary_id: u64, employee_id: u64, department: Option<&str>, base: f64, bonus: f64, deductions: f64) -> PayrollRow {
        PayrollRow {
            salary_id,
            employee_id,
            employee_name: format!("Employee {employee_id}"),
            department: department.map(str::to_string),
            base_salary: base,
            bonus,
            deductions,
            net_salary: base + bonus - deductions,
        }
    }

    #[test]
    fn empty_period_is_all_zero() {
        let summary = summarize(1, 2026, &[], 5, attendance_summary(0, 22, 0, 0));

        assert_eq!(summary.totals, PayrollTotals::default());
        assert!(summary.departments.is_empty());
        assert!(summary.top_earners.is_empty());
        assert_eq!(summary.attendance.present_percentage, 0.0);
    }

    #[test]
    fn totals_count_distinct_employees() {
        let rows = vec![
            row(1, 10, Some("Engineering"), 50000.0, 5000.0, 7500.0),
            row(2, 11, Some("Engineering"), 40000.0, 0.0, 4000.0),
            // a second record for the same employee in the period
            row(3, 10, Some("Engineering"), 0.0, 1000.0, 0.0),
        ];

        let totals = aggregate_totals(&rows);

        assert_eq!(totals.total_base, 90000.0);
        assert_eq!(totals.total_bonus, 6000.0);
        assert_eq!(totals.total_deductions, 11500.0);
        assert_eq!(totals.total_net, 84500.0);
        assert_eq!(totals.employee_count, 2);
        assert_eq!(totals.average_net, 42250.0);
    }

    #[test]
    fn departments_are_grouped_with_unassigned_bucket() {
        let rows = vec![
            row(1, 10, Some("Engineering"), 60000.0, 0.0, 0.0),
            row(2, 11, Some("Sales"), 30000.0, 0.0, 0.0),
            row(3, 12, None, 10000.0, 0.0, 0.0),
        ];

        let departments = aggregate_by_department(&rows);
        let names: Vec<_> = departments.iter().map(|d| d.department.as_str()).collect();

        assert_eq!(names, vec!["Engineering", "Sales", "Unassigned"]);
        assert_eq!(departments[0].share_of_net, 60.0);
        assert_eq!(departments[1].totals.average_net, 30000.0);
        assert_eq!(departments[2].totals.employee_count, 1);
    }

    #[test]
    fn top_earners_sorted_by_net_descending() {
        let rows = vec![
            row(1, 10, None, 1000.0, 0.0, 0.0),
            row(2, 11, None, 3000.0, 0.0, 0.0),
            row(3, 12, None, 2000.0, 0.0, 0.0),
            row(4, 13, None, 3000.0, 0.0, 0.0),
        ];

        let top: Vec<_> = top_earners(&rows, 3).iter().map(|r| r.salary_id).collect();
        assert_eq!(top, vec![2, 4, 3]);
        assert_eq!(top_earners(&rows, 10).len(), 4);
    }

    #[test]
    fn working_days_skip_weekends() {
        // March 2026 starts on a Sunday: 31 days, 9 weekend days
        assert_eq!(working_days_in_month(2026, 3), 22);
        // February 2026 is exactly four weeks
        assert_eq!(working_days_in_month(2026, 2), 20);
        assert_eq!(working_days_in_month(2026, 13), 0);
    }

    #[test]
    fn attendance_percentage_guards_zero_employees() {
        assert_eq!(attendance_summary(0, 20, 0, 0).present_percentage, 0.0);
        assert_eq!(attendance_summary(2, 0, 0, 0).present_percentage, 0.0);
        assert_eq!(attendance_summary(2, 20, 30, 4).present_percentage, 75.0);
    }
}

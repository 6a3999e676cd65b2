pub mod attendance_range;
pub mod leave_policy;
pub mod payroll;
pub mod tax;
pub mod validation;

pub mod access;
pub mod attendance;
pub mod department;
pub mod employee;
pub mod employee_role;
pub mod leave;
pub mod salary;
pub mod tax_declaration;
pub mod user;

//! Payslip, tax certificate and payroll report PDFs.
//!
//! Each document is a tera template rendered to plain text, then laid out
//! on A4 pages by [`pdf::layout`].

pub mod pdf;
pub mod template;

use derive_more::Display;
use serde::Serialize;
use tera::{Context, Tera};

#[derive(Debug, Display)]
pub enum DocumentError {
    #[display(fmt = "template error: {}", _0)]
    Template(tera::Error),

    #[display(fmt = "pdf error: {}", _0)]
    Pdf(String),

    #[display(fmt = "logo error: {}", _0)]
    Logo(String),
}

impl std::error::Error for DocumentError {}

impl From<tera::Error> for DocumentError {
    fn from(e: tera::Error) -> Self {
        DocumentError::Template(e)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DocumentKind {
    Payslip,
    TaxCertificate,
    MonthlyReport,
}

impl DocumentKind {
    pub fn template_name(self) -> &'static str {
        match self {
            DocumentKind::Payslip => "payslip.txt",
            DocumentKind::TaxCertificate => "tax_certificate.txt",
            DocumentKind::MonthlyReport => "monthly_report.txt",
        }
    }

    fn title(self) -> &'static str {
        match self {
            DocumentKind::Payslip => "Payslip",
            DocumentKind::TaxCertificate => "Tax Certificate",
            DocumentKind::MonthlyReport => "Monthly Payroll Report",
        }
    }
}

/// Compiled templates plus the company name stamped on every document.
/// Shared read-only across workers.
pub struct DocumentRenderer {
    tera: Tera,
    company_name: String,
}

impl DocumentRenderer {
    pub fn new(company_name: impl Into<String>) -> Result<Self, DocumentError> {
        Ok(Self {
            tera: template::builtin()?,
            company_name: company_name.into(),
        })
    }

    /// Template output only, without the PDF step.
    pub fn render_text<T: Serialize>(
        &self,
        kind: DocumentKind,
        data: &T,
    ) -> Result<String, DocumentError> {
        let mut ctx = Context::from_serialize(data)?;
        ctx.insert("company_name", &self.company_name);
        Ok(self.tera.render(kind.template_name(), &ctx)?)
    }

    pub fn render_pdf<T: Serialize>(
        &self,
        kind: DocumentKind,
        data: &T,
    ) -> Result<Vec<u8>, DocumentError> {
        let body = self.render_text(kind, data)?;
        pdf::layout(kind.title(), &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::payroll::{attendance_summary, summarize};
    use serde_json::json;

    fn renderer() -> DocumentRenderer {
        DocumentRenderer::new("Acme Ltd").unwrap()
    }

    fn payslip() -> serde_json::Value {
        json!({
            "employee_name": "Jane Doe",
            "employee_code": "EMP-001",
            "username": "jane",
            "department": "Engineering",
            "role": "Engineer",
            "month": 3,
            "year": 2026,
            "base_salary": 50000.0,
            "bonus": 5000.0,
            "gross_pay": 55000.0,
            "deductions": 7500.0,
            "tax_rate": 15.0,
            "net_salary": 47500.0,
            "receipt_number": "PS-202603-ABCD1234",
            "issue_date": "2026-03-31",
            "total_working_days": 22,
            "days_present": 20
        })
    }

    #[test]
    fn payslip_text_is_formatted() {
        let text = renderer().render_text(DocumentKind::Payslip, &payslip()).unwrap();
        assert!(text.contains("Acme Ltd"));
        assert!(text.contains("March 2026"));
        assert!(text.contains("47,500.00"));
    }

    #[test]
    fn payslip_pdf_has_pdf_header() {
        let bytes = renderer().render_pdf(DocumentKind::Payslip, &payslip()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn monthly_report_renders_for_an_empty_period() {
        let summary = summarize(1, 2026, &[], 5, attendance_summary(0, 22, 0, 0));
        let bytes = renderer()
            .render_pdf(DocumentKind::MonthlyReport, &summary)
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn missing_fields_are_a_template_error() {
        let err = renderer()
            .render_pdf(DocumentKind::Payslip, &json!({ "month": 1 }))
            .unwrap_err();
        assert!(matches!(err, DocumentError::Template(_)));
    }
}

pub mod attendance;
pub mod dashboard;
pub mod department;
pub mod employee;
pub mod employee_role;
pub mod leave;
pub mod report;
pub mod salary;
pub mod tax;

use actix_web::{
    HttpResponse,
    http::header::{ContentDisposition, DispositionParam, DispositionType},
};

/// Normalised `(page, per_page, offset)` for list endpoints.
/// The offset is widened so large page numbers cannot overflow.
pub fn page_window(
    page: Option<u32>,
    per_page: Option<u32>,
    default_per_page: u32,
) -> (u32, u32, u64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(default_per_page).clamp(1, 100);
    let offset = (u64::from(page) - 1) * u64::from(per_page);
    (page, per_page, offset)
}

/// PDF download with the given attachment filename.
pub fn pdf_response(bytes: Vec<u8>, filename: &str) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename.to_owned())],
        })
        .body(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::CONTENT_DISPOSITION;

    #[test]
    fn page_window_defaults_and_clamps() {
        assert_eq!(page_window(None, None, 20), (1, 20, 0));
        assert_eq!(page_window(Some(0), Some(500), 20), (1, 100, 0));
        assert_eq!(page_window(Some(3), Some(10), 20), (3, 10, 20));
    }

    #[test]
    fn huge_page_numbers_do_not_overflow() {
        let (page, per_page, offset) = page_window(Some(u32::MAX), Some(100), 10);
        assert_eq!(page, u32::MAX);
        assert_eq!(per_page, 100);
        assert_eq!(offset, (u64::from(u32::MAX) - 1) * 100);
        assert!(i64::try_from(offset).is_ok());
    }

    #[test]
    fn pdf_response_is_an_attachment() {
        let resp = pdf_response(b"%PDF-1.3".to_vec(), "payslip_jane_3_2026.pdf");
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            "application/pdf"
        );
        let disposition = resp
            .headers()
            .get(CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(disposition.starts_with("attachment"));
        assert!(disposition.contains("payslip_jane_3_2026.pdf"));
    }
}

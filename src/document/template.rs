use std::collections::HashMap;

use tera::{Tera, Value, to_value, try_get_value};

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn month_name(month: u64) -> Option<&'static str> {
    let index = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTHS.get(index).copied()
}

/// Two decimals with `,` between thousands: `1234567.8` -> `1,234,567.80`.
pub fn intcomma(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}

fn month_name_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let month = try_get_value!("month_name", "value", u64, value);
    match month_name(month) {
        Some(name) => Ok(to_value(name)?),
        None => Err(tera::Error::msg(format!("{month} is not a month"))),
    }
}

fn intcomma_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let number = try_get_value!("intcomma", "value", f64, value);
    Ok(to_value(intcomma(number))?)
}

/// Registers the document filters and compiles `sources` as `(name, body)` pairs.
pub fn compile(sources: &[(&str, &str)]) -> tera::Result<Tera> {
    let mut tera = Tera::default();
    tera.register_filter("month_name", month_name_filter);
    tera.register_filter("intcomma", intcomma_filter);
    // plain text, nothing to escape
    tera.autoescape_on(vec![]);
    tera.add_raw_templates(sources.to_vec())?;
    Ok(tera)
}

pub fn builtin() -> tera::Result<Tera> {
    compile(&[
        (
            "payslip.txt",
            include_str!("../../templates/payslip.txt.tera"),
        ),
        (
            "tax_certificate.txt",
            include_str!("../../templates/tax_certificate.txt.tera"),
        ),
        (
            "monthly_report.txt",
            include_str!("../../templates/monthly_report.txt.tera"),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentError;

    #[test]
    fn month_names() {
        assert_eq!(month_name(1), Some("January"));
        assert_eq!(month_name(12), Some("December"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
    }

    #[test]
    fn intcomma_groups_thousands() {
        assert_eq!(intcomma(0.0), "0.00");
        assert_eq!(intcomma(999.5), "999.50");
        assert_eq!(intcomma(1000.0), "1,000.00");
        assert_eq!(intcomma(1234567.891), "1,234,567.89");
        assert_eq!(intcomma(-2500.0), "-2,500.00");
    }

    #[test]
    fn builtin_templates_compile() {
        let tera = builtin().unwrap();
        let names: Vec<&str> = tera.get_template_names().collect();
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn broken_template_is_a_document_error() {
        let err = compile(&[("broken.txt", "{% for x in %}")]).unwrap_err();
        assert!(matches!(DocumentError::from(err), DocumentError::Template(_)));
    }

    #[test]
    fn filters_apply_inside_templates() {
        let tera = compile(&[("t", "{{ m | month_name }} {{ n | intcomma }}")]).unwrap();
        let mut ctx = tera::Context::new();
        ctx.insert("m", &2);
        ctx.insert("n", &15000.0);
        assert_eq!(tera.render("t", &ctx).unwrap(), "February 15,000.00");
    }
}

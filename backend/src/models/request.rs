//! Report request parameters and their validation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::hijri::IslamicMonth;

/// Highest Hijri year accepted in a request.
pub const MAX_ISLAMIC_YEAR: u32 = 9999;

/// Parameters shared by both report endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub date: NaiveDate,
    pub islamic_month: u8,
    pub islamic_year: u32,
}

/// One invalid or missing field in a request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Location of the field, e.g. `["body", "date"]`
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldError {
    /// Error located in the request body, optionally at `field`.
    pub fn body(field: Option<&str>, msg: impl Into<String>, kind: &str) -> Self {
        let mut loc = vec!["body".to_string()];
        if let Some(field) = field {
            loc.push(field.to_string());
        }
        Self {
            loc,
            msg: msg.into(),
            kind: kind.to_string(),
        }
    }
}

impl ReportRequest {
    pub fn month(&self) -> IslamicMonth {
        // Validated on construction through `from_json`
        IslamicMonth::from_number(self.islamic_month).unwrap_or(IslamicMonth::Muharram)
    }

    /// Stable token used in generated file names.
    pub fn file_stem(&self) -> String {
        format!(
            "{}_{}_{}",
            self.date.format("%Y-%m-%d"),
            self.islamic_month,
            self.islamic_year
        )
    }

    /// Validate a raw request body, reporting every bad field at once.
    pub fn from_json_slice(body: &[u8]) -> Result<Self, Vec<FieldError>> {
        let value: Value = serde_json::from_slice(body).map_err(|e| {
            vec![FieldError::body(
                None,
                format!("Invalid JSON body: {}", e),
                "json_invalid",
            )]
        })?;
        Self::from_json(&value)
    }

    pub fn from_json(value: &Value) -> Result<Self, Vec<FieldError>> {
        let Some(object) = value.as_object() else {
            return Err(vec![FieldError::body(
                None,
                "Input should be a JSON object",
                "model_type",
            )]);
        };

        let mut errors = Vec::new();
        let date = validate_date(object, &mut errors);
        let islamic_month = validate_int(object, "islamic_month", 1, 12, &mut errors);
        let islamic_year = validate_int(
            object,
            "islamic_year",
            1,
            i64::from(MAX_ISLAMIC_YEAR),
            &mut errors,
        );

        match (date, islamic_month, islamic_year) {
            (Some(date), Some(month), Some(year)) if errors.is_empty() => Ok(Self {
                date,
                islamic_month: month as u8,
                islamic_year: year as u32,
            }),
            _ => Err(errors),
        }
    }
}

fn validate_date(object: &Map<String, Value>, errors: &mut Vec<FieldError>) -> Option<NaiveDate> {
    match object.get("date") {
        None | Some(Value::Null) => {
            errors.push(FieldError::body(Some("date"), "Field required", "missing"));
            None
        }
        Some(Value::String(text)) => match NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(e) => {
                errors.push(FieldError::body(
                    Some("date"),
                    format!("Input should be a valid date in YYYY-MM-DD format, {}", e),
                    "date_from_datetime_parsing",
                ));
                None
            }
        },
        Some(_) => {
            errors.push(FieldError::body(
                Some("date"),
                "Input should be a valid date string",
                "date_type",
            ));
            None
        }
    }
}

fn validate_int(
    object: &Map<String, Value>,
    field: &str,
    min: i64,
    max: i64,
    errors: &mut Vec<FieldError>,
) -> Option<i64> {
    let value = match object.get(field) {
        None | Some(Value::Null) => {
            errors.push(FieldError::body(Some(field), "Field required", "missing"));
            return None;
        }
        Some(value) => value,
    };

    let Some(number) = coerce_int(value) else {
        errors.push(FieldError::body(
            Some(field),
            "Input should be a valid integer",
            "int_type",
        ));
        return None;
    };

    if !(min..=max).contains(&number) {
        errors.push(FieldError::body(
            Some(field),
            format!("Input should be between {} and {}", min, max),
            "out_of_range",
        ));
        return None;
    }

    Some(number)
}

/// Integer value of a JSON number or numeric string; `9`, `9.0` and `"9"` all give 9.
fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

fn integral(v: f64) -> Option<i64> {
    (v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64).then_some(v as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.loc.last().unwrap().as_str()).collect()
    }

    #[test]
    fn test_valid_request() {
        let request = ReportRequest::from_json(&json!({
            "date": "2024-03-10",
            "islamic_month": 9,
            "islamic_year": 1445
        }))
        .unwrap();

        assert_eq!(request.date, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(request.month(), IslamicMonth::Ramadan);
        assert_eq!(request.islamic_year, 1445);
        assert_eq!(request.file_stem(), "2024-03-10_9_1445");
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let request = ReportRequest::from_json(&json!({
            "date": "2024-04-08",
            "islamic_month": 10,
            "islamic_year": 1445,
            "location": "Rabat"
        }));
        assert!(request.is_ok());
    }

    #[test]
    fn test_every_bad_field_is_reported() {
        let errors = ReportRequest::from_json(&json!({
            "date": "10th of March",
            "islamic_month": "nine",
            "islamic_year": 14.5
        }))
        .unwrap_err();

        assert_eq!(fields(&errors), vec!["date", "islamic_month", "islamic_year"]);
        assert_eq!(errors[1].kind, "int_type");
    }

    #[test]
    fn test_missing_fields() {
        let errors = ReportRequest::from_json(&json!({ "islamic_month": 9 })).unwrap_err();
        assert_eq!(fields(&errors), vec!["date", "islamic_year"]);
        assert!(errors.iter().all(|e| e.kind == "missing"));
    }

    #[test]
    fn test_integral_floats_and_numeric_strings_are_coerced() {
        let request = ReportRequest::from_json(&json!({
            "date": "2024-03-10",
            "islamic_month": "9",
            "islamic_year": 1445.0
        }))
        .unwrap();
        assert_eq!(request.islamic_month, 9);
        assert_eq!(request.islamic_year, 1445);

        let request = ReportRequest::from_json(&json!({
            "date": "2024-03-10",
            "islamic_month": 9.0,
            "islamic_year": " 1445 "
        }))
        .unwrap();
        assert_eq!(request.month(), IslamicMonth::Ramadan);

        let errors = ReportRequest::from_json(&json!({
            "date": "2024-03-10",
            "islamic_month": "9.5",
            "islamic_year": true
        }))
        .unwrap_err();
        assert_eq!(fields(&errors), vec!["islamic_month", "islamic_year"]);
        assert!(errors.iter().all(|e| e.kind == "int_type"));

        let errors = ReportRequest::from_json(&json!({
            "date": "2024-03-10",
            "islamic_month": "13",
            "islamic_year": 1445
        }))
        .unwrap_err();
        assert_eq!(errors[0].kind, "out_of_range");
    }

    #[test]
    fn test_month_out_of_range() {
        let errors = ReportRequest::from_json(&json!({
            "date": "2024-03-10",
            "islamic_month": 13,
            "islamic_year": 1445
        }))
        .unwrap_err();
        assert_eq!(fields(&errors), vec!["islamic_month"]);
        assert_eq!(errors[0].kind, "out_of_range");
    }

    #[test]
    fn test_non_object_and_malformed_bodies() {
        let errors = ReportRequest::from_json(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(errors[0].loc, vec!["body".to_string()]);

        let errors = ReportRequest::from_json_slice(b"{not json").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, "json_invalid");
    }

    #[test]
    fn test_field_error_serializes_type_key() {
        let error = FieldError::body(Some("date"), "Field required", "missing");
        let value = serde_json::to_value(&error).unwrap();
        assert_eq!(value["type"], "missing");
        assert_eq!(value["loc"], json!(["body", "date"]));
    }
}

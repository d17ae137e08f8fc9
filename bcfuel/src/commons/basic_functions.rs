use serde_json::Value;

/// Format a coordinate for text output
///
/// Without a precision the shortest representation that parses back to the
/// same `f64` is used. With a precision the value is rounded to that many
/// decimals and trailing zeros are trimmed.
pub fn format_ordinate(value: f64, precision: Option<usize>) -> String {
    let mut text = match precision {
        Some(digits) => {
            let mut rounded = format!("{:.*}", digits, value);
            if rounded.contains('.') {
                let trimmed_len = rounded.trim_end_matches('0').trim_end_matches('.').len();
                rounded.truncate(trimmed_len);
            }
            rounded
        }
        None => value.to_string(),
    };
    if text == "-0" {
        text.remove(0);
    }
    text
}

/// Render an attribute value as a CSV cell
pub fn format_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(true)) => "True".to_string(),
        Some(Value::Bool(false)) => "False".to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(1.0, None, "1")]
    #[case(1234567.125, None, "1234567.125")]
    #[case(0.1, None, "0.1")]
    #[case(-0.0, None, "0")]
    #[case(1.23456789, Some(3), "1.235")]
    #[case(2.5, Some(6), "2.5")]
    #[case(100.0, Some(0), "100")]
    #[case(-0.0000001, Some(6), "0")]
    fn test_format_ordinate(
        #[case] value: f64,
        #[case] precision: Option<usize>,
        #[case] expected: &str,
    ) {
        assert_eq!(format_ordinate(value, precision), expected);
    }

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(None), "");
        assert_eq!(format_cell(Some(&json!(null))), "");
        assert_eq!(format_cell(Some(&json!("C-3"))), "C-3");
        assert_eq!(format_cell(Some(&json!(42))), "42");
        assert_eq!(format_cell(Some(&json!(12.5))), "12.5");
        assert_eq!(format_cell(Some(&json!(true))), "True");
        assert_eq!(format_cell(Some(&json!([1, 2]))), "[1,2]");
        assert_eq!(format_cell(Some(&json!({"a": 1}))), r#"{"a":1}"#);
    }
}

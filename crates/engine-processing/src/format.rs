use model::{
    core::{format::TextFormat, value::Value},
    error::FormatError,
    records::row::Row,
};

/// Renders source rows as delimited text lines.
///
/// Text values are wrapped but embedded wrapper or terminator characters are
/// not escaped, so such values do not survive a split on the terminators.
#[derive(Debug, Clone)]
pub struct RowFormatter {
    format: TextFormat,
}

impl RowFormatter {
    pub fn new(format: TextFormat) -> Self {
        Self { format }
    }

    /// Formats one row, terminator included.
    pub fn format(&self, row: Row) -> String {
        let mut line = String::new();

        for (i, value) in row.into_iter().enumerate() {
            if i > 0 {
                line.push_str(&self.format.field_terminator);
            }
            self.push_field(&mut line, &value);
        }

        line.push_str(&self.format.line_terminator);
        line
    }

    /// Size of `line` once encoded for the target.
    pub fn encoded_len(&self, line: &str) -> Result<usize, FormatError> {
        self.format.encoding.encoded_len(line)
    }

    fn push_field(&self, line: &mut String, value: &Value) {
        match value {
            Value::Null => {}
            Value::String(text) => {
                line.push_str(&self.format.field_wrapper);
                line.push_str(text);
                line.push_str(&self.format.field_wrapper);
            }
            other => match other.as_date() {
                Some(date) => line.push_str(&date.format("%Y-%m-%d").to_string()),
                None => line.push_str(&other.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use model::core::encoding::Encoding;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_format_with_defaults() {
        let formatter = RowFormatter::new(TextFormat::default());
        let row = Row::new(vec![
            Value::from("O'Brien"),
            Value::Null,
            Value::Int(42),
            Value::Date(date(2020, 1, 5)),
        ]);

        assert_eq!(formatter.format(row), "\"O'Brien\"||42|2020-01-05\n");
    }

    #[test]
    fn test_timestamps_keep_only_the_date() {
        let formatter = RowFormatter::new(TextFormat::default());
        let ts: NaiveDateTime = date(2021, 12, 31).and_hms_opt(23, 59, 1).unwrap();
        let row = Row::new(vec![Value::Timestamp(ts), Value::Float(1.5)]);

        assert_eq!(formatter.format(row), "2021-12-31|1.5\n");
    }

    #[test]
    fn test_numeric_text_is_written_unwrapped() {
        let formatter = RowFormatter::new(TextFormat::default());
        let row = Row::new(vec![
            Value::Numeric("100000000000000000000000000000000.5".to_string()),
            Value::Numeric("NaN".to_string()),
            Value::Real(1.1),
        ]);

        assert_eq!(
            formatter.format(row),
            "100000000000000000000000000000000.5|NaN|1.1\n"
        );
    }

    #[test]
    fn test_custom_delimiters_and_encoding() {
        let formatter = RowFormatter::new(TextFormat {
            field_terminator: "\t".to_string(),
            field_wrapper: "'".to_string(),
            line_terminator: "\r\n".to_string(),
            encoding: Encoding::Latin1,
        });
        let line = formatter.format(Row::new(vec![Value::from("café"), Value::Int(-3)]));

        assert_eq!(line, "'café'\t-3\r\n");
        assert_eq!(formatter.encoded_len(&line).unwrap(), 11);
        assert_eq!(RowFormatter::new(TextFormat::default()).encoded_len(&line).unwrap(), 12);
    }

    #[test]
    fn test_empty_row_is_just_a_terminator() {
        let formatter = RowFormatter::new(TextFormat::default());
        assert_eq!(formatter.format(Row::new(Vec::new())), "\n");
    }
}

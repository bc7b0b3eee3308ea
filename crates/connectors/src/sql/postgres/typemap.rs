//! Static mapping from Postgres column types to target column types.

/// Target column families understood by the analytical database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    Long,
    Double,
    String,
    Date,
}

impl TargetType {
    pub fn render(&self, max_length: Option<i32>) -> String {
        match (self, max_length) {
            (TargetType::Long, _) => "long".to_string(),
            (TargetType::Double, _) => "double".to_string(),
            (TargetType::String, Some(len)) => format!("string({len})"),
            (TargetType::String, None) => "string".to_string(),
            (TargetType::Date, _) => "date".to_string(),
        }
    }
}

/// How a column is read back out of a Postgres row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadAs {
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Numeric,
    Text,
    Date,
    Timestamp,
    TimestampTz,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PgTypeMapping {
    pub target: TargetType,
    pub read_as: ReadAs,
    /// Cast applied in the select list so the value can be decoded as `read_as`.
    pub cast: Option<&'static str>,
}

const fn mapping(target: TargetType, read_as: ReadAs, cast: Option<&'static str>) -> PgTypeMapping {
    PgTypeMapping {
        target,
        read_as,
        cast,
    }
}

/// Looks up the mapping for an `information_schema.columns.data_type` value.
pub fn lookup(data_type: &str) -> Option<PgTypeMapping> {
    use ReadAs::*;
    use TargetType::{Date as TDate, Double, Long, String as TString};

    let found = match data_type.to_ascii_lowercase().as_str() {
        "bit" | "boolean" => mapping(Long, Int4, Some("integer")),
        "smallint" => mapping(Long, Int2, None),
        "integer" => mapping(Long, Int4, None),
        "bigint" => mapping(Long, Int8, None),

        "real" => mapping(Double, Float4, None),
        "double precision" => mapping(Double, Float8, None),
        // Read as text so any precision, and NaN, survives.
        "numeric" => mapping(Double, Numeric, Some("text")),
        "money" => mapping(Double, Numeric, Some("numeric::text")),

        "character" | "character varying" | "text" => mapping(TString, Text, None),
        "time with time zone" | "time without time zone" => mapping(TString, Text, Some("text")),

        "date" => mapping(TDate, Date, None),
        "timestamp without time zone" => mapping(TDate, Timestamp, None),
        "timestamp with time zone" => mapping(TDate, TimestampTz, None),

        _ => return None,
    };

    Some(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_families() {
        assert_eq!(lookup("bigint").unwrap().target, TargetType::Long);
        assert_eq!(lookup("money").unwrap().cast, Some("numeric::text"));
        assert_eq!(lookup("numeric").unwrap().cast, Some("text"));
        assert_eq!(lookup("double precision").unwrap().target, TargetType::Double);
    }

    #[test]
    fn test_string_length_is_rendered() {
        let m = lookup("character varying").unwrap();
        assert_eq!(m.target.render(Some(45)), "string(45)");
        assert_eq!(m.target.render(None), "string");
    }

    #[test]
    fn test_unknown_type() {
        assert!(lookup("tsvector").is_none());
    }
}

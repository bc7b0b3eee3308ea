use crate::core::encoding::Encoding;

/// Delimiters and encoding shared by the row formatter and the load commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFormat {
    pub field_terminator: String,
    pub field_wrapper: String,
    pub line_terminator: String,
    pub encoding: Encoding,
}

impl Default for TextFormat {
    fn default() -> Self {
        Self {
            field_terminator: "|".to_string(),
            field_wrapper: "\"".to_string(),
            line_terminator: "\n".to_string(),
            encoding: Encoding::Utf8,
        }
    }
}

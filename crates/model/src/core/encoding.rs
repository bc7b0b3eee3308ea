use crate::error::FormatError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Text encoding used to measure batch sizes and write chunk files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Encoding {
    #[default]
    Utf8,
    Latin1,
    Ascii,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Latin1 => "latin-1",
            Encoding::Ascii => "ascii",
        }
    }

    /// Number of bytes `text` occupies once encoded.
    pub fn encoded_len(&self, text: &str) -> Result<usize, FormatError> {
        match self {
            Encoding::Utf8 => Ok(text.len()),
            Encoding::Latin1 | Encoding::Ascii => {
                let limit = self.single_byte_limit();
                let mut len = 0;
                for ch in text.chars() {
                    if (ch as u32) > limit {
                        return Err(self.unencodable(ch));
                    }
                    len += 1;
                }
                Ok(len)
            }
        }
    }

    pub fn encode(&self, text: &str) -> Result<Vec<u8>, FormatError> {
        match self {
            Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
            Encoding::Latin1 | Encoding::Ascii => {
                let limit = self.single_byte_limit();
                text.chars()
                    .map(|ch| {
                        if (ch as u32) > limit {
                            Err(self.unencodable(ch))
                        } else {
                            Ok(ch as u32 as u8)
                        }
                    })
                    .collect()
            }
        }
    }

    fn single_byte_limit(&self) -> u32 {
        match self {
            Encoding::Ascii => 0x7F,
            _ => 0xFF,
        }
    }

    fn unencodable(&self, ch: char) -> FormatError {
        FormatError::Unencodable {
            ch,
            encoding: *self,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "utf8" => Ok(Encoding::Utf8),
            "latin1" | "iso88591" => Ok(Encoding::Latin1),
            "ascii" | "usascii" => Ok(Encoding::Ascii),
            _ => Err(FormatError::UnsupportedEncoding(s.to_string())),
        }
    }
}

impl TryFrom<String> for Encoding {
    type Error = FormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Encoding> for String {
    fn from(value: Encoding) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("UTF-8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!("iso-8859-1".parse::<Encoding>().unwrap(), Encoding::Latin1);
        assert_eq!("latin_1".parse::<Encoding>().unwrap(), Encoding::Latin1);
        assert!("utf-16".parse::<Encoding>().is_err());
    }

    #[test]
    fn test_encoded_len_counts_bytes() {
        assert_eq!(Encoding::Utf8.encoded_len("née").unwrap(), 4);
        assert_eq!(Encoding::Latin1.encoded_len("née").unwrap(), 3);
        assert_eq!(
            Encoding::Ascii.encoded_len("née"),
            Err(FormatError::Unencodable {
                ch: 'é',
                encoding: Encoding::Ascii
            })
        );
    }

    #[test]
    fn test_latin1_encode() {
        assert_eq!(Encoding::Latin1.encode("é|a").unwrap(), vec![0xE9, b'|', b'a']);
    }
}

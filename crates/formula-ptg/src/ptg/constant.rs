//! Constant operands: `PtgStr` text and Excel error codes.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::PtgError;

/// Longest text a `PtgStr` can carry (`cch` is a single byte).
pub const MAX_STR_CHARS: usize = 255;

/// `PtgStr` payload (ShortXLUnicodeString without rich text / phonetic runs).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StrPtg {
    text: String,
    utf16: bool,
}

impl StrPtg {
    /// Build a string constant, choosing the compressed (1 byte per char) layout when every
    /// character fits in Latin-1.
    pub fn new(text: impl Into<String>) -> Result<Self, PtgError> {
        let text = text.into();
        let utf16 = text.chars().any(|c| u32::from(c) > 0xFF);
        Self::with_encoding(text, utf16)
    }

    /// Build a string constant with an explicit storage layout.
    ///
    /// A compressed layout is silently widened if `text` has characters outside Latin-1.
    pub fn with_encoding(text: impl Into<String>, utf16: bool) -> Result<Self, PtgError> {
        let text = text.into();
        let utf16 = utf16 || text.chars().any(|c| u32::from(c) > 0xFF);
        let len = char_count(&text, utf16);
        if len > MAX_STR_CHARS {
            return Err(PtgError::StringTooLong { len });
        }
        Ok(Self { text, utf16 })
    }

    pub(crate) fn from_decoded(text: String, utf16: bool) -> Self {
        Self { text, utf16 }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the characters are stored as UTF-16LE rather than compressed Latin-1.
    pub fn is_utf16(&self) -> bool {
        self.utf16
    }

    /// Number of characters as counted by the `cch` field.
    pub fn cch(&self) -> usize {
        char_count(&self.text, self.utf16)
    }

    pub(crate) fn payload_size(&self) -> usize {
        let unit = if self.utf16 { 2 } else { 1 };
        2 + self.cch() * unit
    }

    /// Formula text: the value in double quotes with embedded quotes doubled.
    pub fn to_formula_text(&self) -> String {
        let mut out = String::with_capacity(self.text.len() + 2);
        out.push('"');
        for ch in self.text.chars() {
            if ch == '"' {
                out.push('"');
            }
            out.push(ch);
        }
        out.push('"');
        out
    }
}

pub(crate) fn char_count(text: &str, utf16: bool) -> usize {
    if utf16 {
        text.encode_utf16().count()
    } else {
        text.chars().count()
    }
}

/// Excel error values as stored in `PtgErr` and array constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ErrorCode {
    Null,
    Div0,
    Value,
    Ref,
    Name,
    Num,
    NA,
}

impl ErrorCode {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(Self::Null),
            0x07 => Some(Self::Div0),
            0x0F => Some(Self::Value),
            0x17 => Some(Self::Ref),
            0x1D => Some(Self::Name),
            0x24 => Some(Self::Num),
            0x2A => Some(Self::NA),
            _ => None,
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            Self::Null => 0x00,
            Self::Div0 => 0x07,
            Self::Value => 0x0F,
            Self::Ref => 0x17,
            Self::Name => 0x1D,
            Self::Num => 0x24,
            Self::NA => 0x2A,
        }
    }

    pub const fn literal(self) -> &'static str {
        match self {
            Self::Null => "#NULL!",
            Self::Div0 => "#DIV/0!",
            Self::Value => "#VALUE!",
            Self::Ref => "#REF!",
            Self::Name => "#NAME?",
            Self::Num => "#NUM!",
            Self::NA => "#N/A",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.literal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_compressed_layout_for_latin1() {
        let s = StrPtg::new("caf\u{e9}").unwrap();
        assert!(!s.is_utf16());
        assert_eq!(s.payload_size(), 2 + 4);

        let s = StrPtg::new("\u{65e5}\u{672c}").unwrap();
        assert!(s.is_utf16());
        assert_eq!(s.payload_size(), 2 + 4);
    }

    #[test]
    fn rejects_long_strings() {
        let long = "x".repeat(256);
        assert_eq!(
            StrPtg::new(long),
            Err(PtgError::StringTooLong { len: 256 })
        );
        assert!(StrPtg::new("x".repeat(255)).is_ok());
    }

    #[test]
    fn formula_text_doubles_quotes() {
        let s = StrPtg::new("say \"hi\"").unwrap();
        assert_eq!(s.to_formula_text(), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn error_codes_round_trip() {
        for code in 0u8..=0xFF {
            if let Some(err) = ErrorCode::from_code(code) {
                assert_eq!(err.code(), code);
            }
        }
        assert_eq!(ErrorCode::from_code(0x2B), None);
    }
}

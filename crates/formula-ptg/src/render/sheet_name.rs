//! Sheet-name formatting for 3D references.

/// Append `sheet` to `out`, quoting it when formula text would otherwise misread it.
pub fn append_sheet_name(out: &mut String, sheet: &str) {
    if sheet_name_needs_quotes(sheet) {
        push_quoted(out, sheet);
    } else {
        out.push_str(sheet);
    }
}

/// Append `[workbook]sheet`, quoting the pair as a unit when either part needs it.
pub fn append_workbook_sheet_name(out: &mut String, workbook: &str, sheet: &str) {
    let needs_quotes = sheet_name_needs_quotes(sheet)
        || workbook
            .chars()
            .any(|c| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'));
    if needs_quotes {
        out.push('\'');
        push_escaped(out, "[");
        push_escaped(out, workbook);
        push_escaped(out, "]");
        push_escaped(out, sheet);
        out.push('\'');
    } else {
        out.push('[');
        out.push_str(workbook);
        out.push(']');
        out.push_str(sheet);
    }
}

/// Whether `sheet` must be wrapped in single quotes.
pub fn sheet_name_needs_quotes(sheet: &str) -> bool {
    if sheet.is_empty() {
        return true;
    }
    if !sheet
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return true;
    }
    if sheet.starts_with(|c: char| c.is_ascii_digit()) {
        return true;
    }
    if sheet.eq_ignore_ascii_case("TRUE") || sheet.eq_ignore_ascii_case("FALSE") {
        return true;
    }
    // `A1B!C1` would lex as a cell reference followed by garbage.
    starts_like_a1_cell_ref(sheet)
}

fn push_quoted(out: &mut String, sheet: &str) {
    out.push('\'');
    push_escaped(out, sheet);
    out.push('\'');
}

fn push_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        if ch == '\'' {
            out.push('\'');
        }
        out.push(ch);
    }
}

fn starts_like_a1_cell_ref(s: &str) -> bool {
    let bytes = s.as_bytes();
    let letters = bytes.iter().take_while(|b| b.is_ascii_alphabetic()).count();
    if letters == 0 || letters > 3 {
        return false;
    }
    let digits = bytes[letters..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        return false;
    }

    let col = bytes[..letters].iter().fold(0u32, |acc, b| {
        acc * 26 + u32::from(b.to_ascii_uppercase() - b'A') + 1
    });
    // XFD, the last column a modern formula parser accepts.
    if col > 16_384 {
        return false;
    }
    matches!(s[letters..letters + digits].parse::<u32>(), Ok(row) if row != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formatted(sheet: &str) -> String {
        let mut out = String::new();
        append_sheet_name(&mut out, sheet);
        out
    }

    #[test]
    fn plain_names_are_not_quoted() {
        assert_eq!(formatted("Sheet1"), "Sheet1");
        assert_eq!(formatted("data_2024.v2"), "data_2024.v2");
        assert_eq!(formatted("XFE1"), "XFE1");
    }

    #[test]
    fn quotes_names_that_would_misparse() {
        assert_eq!(formatted("My Sheet"), "'My Sheet'");
        assert_eq!(formatted("O'Brien"), "'O''Brien'");
        assert_eq!(formatted(""), "''");
        assert_eq!(formatted("2024"), "'2024'");
        assert_eq!(formatted("true"), "'true'");
        assert_eq!(formatted("A1"), "'A1'");
        assert_eq!(formatted("ab12x"), "'ab12x'");
    }

    #[test]
    fn workbook_prefix_quotes_as_a_unit() {
        let mut out = String::new();
        append_workbook_sheet_name(&mut out, "Book1.xls", "Sheet1");
        assert_eq!(out, "[Book1.xls]Sheet1");

        let mut out = String::new();
        append_workbook_sheet_name(&mut out, "My Book.xls", "Sheet1");
        assert_eq!(out, "'[My Book.xls]Sheet1'");
    }
}

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("empty range")]
    Empty,
    #[error("invalid A1 range: {0}")]
    Invalid(String),
}

/// Widest grid the store allows (column `ZZZ`).
pub const MAX_COLUMNS: usize = 18_278;

/// A parsed `'<sheet>'!A1:B2` reference. Columns are 0-based, rows 1-based and
/// optional (open-ended column spans such as `A:F` carry no rows).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRange {
    pub sheet: String,
    pub start_col: usize,
    pub start_row: Option<usize>,
    pub end_col: usize,
    pub end_row: Option<usize>,
}

/// Converts a 1-based column number to its letters: 1 → `A`, 26 → `Z`, 27 → `AA`.
pub fn column_letter(mut column: usize) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push(b'A' + rem as u8);
        column = (column - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Parses column letters to a 0-based index: `A` → 0, `AA` → 26.
fn parse_column(letters: &str) -> Option<usize> {
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    letters
        .to_ascii_uppercase()
        .chars()
        .map(|c| c as usize - 'A' as usize + 1)
        .reduce(|index, digit| index * 26 + digit)
        .map(|column| column - 1)
}

/// Quotes a sheet title for use in A1 notation, doubling embedded quotes.
pub fn quote_sheet(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// `'<sheet>'!A:<last>` covering `columns` columns.
pub fn column_span(sheet: &str, columns: usize) -> String {
    format!("{}!A:{}", quote_sheet(sheet), column_letter(columns.max(1)))
}

/// `'<sheet>'!A<row>:<last><row>` covering one physical row.
pub fn row_span(sheet: &str, row: usize, columns: usize) -> String {
    format!(
        "{}!A{row}:{}{row}",
        quote_sheet(sheet),
        column_letter(columns.max(1))
    )
}

/// `'<sheet>'`, every populated cell of the sheet.
pub fn whole_sheet(sheet: &str) -> String {
    quote_sheet(sheet)
}

/// `'<sheet>'!A1`, the anchor for writing a header.
pub fn first_cell(sheet: &str) -> String {
    format!("{}!A1", quote_sheet(sheet))
}

pub fn parse_range(range: &str) -> Result<SheetRange, RangeError> {
    let range = range.trim();
    if range.is_empty() {
        return Err(RangeError::Empty);
    }

    // A bare quoted title addresses the whole sheet
    if range.len() > 2 && range.starts_with('\'') && range.ends_with('\'') {
        let sheet = unquote_sheet(range).ok_or_else(|| RangeError::Invalid(range.to_string()))?;
        return Ok(SheetRange {
            sheet,
            start_col: 0,
            start_row: None,
            end_col: MAX_COLUMNS - 1,
            end_row: None,
        });
    }

    let (sheet, cells) = range
        .rsplit_once('!')
        .ok_or_else(|| RangeError::Invalid(range.to_string()))?;
    let sheet = unquote_sheet(sheet).ok_or_else(|| RangeError::Invalid(range.to_string()))?;

    let (start, end) = cells.split_once(':').unwrap_or((cells, cells));
    let (start_col, start_row) = parse_cell(start).ok_or_else(|| RangeError::Invalid(range.to_string()))?;
    let (end_col, end_row) = parse_cell(end).ok_or_else(|| RangeError::Invalid(range.to_string()))?;

    if end_col < start_col {
        return Err(RangeError::Invalid(range.to_string()));
    }
    if let (Some(s), Some(e)) = (start_row, end_row) {
        if e < s {
            return Err(RangeError::Invalid(range.to_string()));
        }
    }

    Ok(SheetRange {
        sheet,
        start_col,
        start_row,
        end_col,
        end_row,
    })
}

fn unquote_sheet(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    match raw.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        Some(inner) => Some(inner.replace("''", "'")),
        None => Some(raw.to_string()),
    }
}

fn parse_cell(cell: &str) -> Option<(usize, Option<usize>)> {
    let cell = cell.trim();
    let split = cell.find(|c: char| c.is_ascii_digit()).unwrap_or(cell.len());
    let (letters, digits) = cell.split_at(split);
    let col = parse_column(letters)?;
    let row = if digits.is_empty() {
        None
    } else {
        Some(digits.parse::<usize>().ok().filter(|row| *row > 0)?)
    };
    Some((col, row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters_follow_bijective_base_26() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(4), "D");
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(52), "AZ");
        assert_eq!(column_letter(53), "BA");
    }

    #[test]
    fn formats_table_addresses() {
        assert_eq!(column_span("users", 4), "'users'!A:D");
        assert_eq!(row_span("worklogs", 5, 6), "'worklogs'!A5:F5");
        assert_eq!(first_cell("worklogs"), "'worklogs'!A1");
        assert_eq!(quote_sheet("bob's"), "'bob''s'");
    }

    #[test]
    fn parses_open_column_span() {
        let r = parse_range("'users'!A:D").unwrap();
        assert_eq!(r.sheet, "users");
        assert_eq!((r.start_col, r.end_col), (0, 3));
        assert_eq!((r.start_row, r.end_row), (None, None));
    }

    #[test]
    fn parses_row_span_and_single_cell() {
        let r = parse_range("'worklogs'!A5:F5").unwrap();
        assert_eq!((r.start_col, r.start_row, r.end_col, r.end_row), (0, Some(5), 5, Some(5)));

        let r = parse_range("'it''s'!A1").unwrap();
        assert_eq!(r.sheet, "it's");
        assert_eq!((r.start_col, r.start_row, r.end_col, r.end_row), (0, Some(1), 0, Some(1)));
    }

    #[test]
    fn bare_quoted_title_spans_every_column() {
        assert_eq!(whole_sheet("worklogs"), "'worklogs'");
        let r = parse_range("'worklogs'").unwrap();
        assert_eq!(r.sheet, "worklogs");
        assert_eq!((r.start_col, r.end_col), (0, MAX_COLUMNS - 1));
        assert_eq!((r.start_row, r.end_row), (None, None));
        assert_eq!(column_letter(MAX_COLUMNS), "ZZZ");
    }

    #[test]
    fn rejects_malformed_ranges() {
        assert_eq!(parse_range(""), Err(RangeError::Empty));
        assert!(parse_range("A1:B2").is_err());
        assert!(parse_range("worklogs").is_err());
        assert!(parse_range("''").is_err());
        assert!(parse_range("'x'!1A").is_err());
        assert!(parse_range("'x'!D:A").is_err());
        assert!(parse_range("'x'!A0").is_err());
    }
}

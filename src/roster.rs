// Roster parsing: raw page markup → player name → level mapping.
//
// Pure function over the markup. Malformed rows are skipped, never fatal; an
// empty mapping is a valid outcome (transient empty page, missing table).

use std::collections::HashMap;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

// ---------------------------------------------------------------------------
// Selectors and constants
// ---------------------------------------------------------------------------

static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static DATA_CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static HEADER_CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th").unwrap());
static ANY_CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th, td").unwrap());

/// Column headers that identify a table as the online-players roster.
const ROSTER_HEADER_HINTS: &[&str] = &["level", "vocation"];

const NAME_COLUMN: usize = 0;
const LEVEL_COLUMN: usize = 1;
const MIN_COLUMNS: usize = 2;

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Extract the online roster from page markup.
///
/// Selects the table whose headers mention "Level" or "Vocation" (a page may
/// carry several tables), falling back to the first table found. Each row
/// with at least two cells contributes one entry: the name column's text
/// (nested link markup flattened) mapped to the first contiguous digit run in
/// the level column. Rows failing either extraction are skipped.
pub fn parse(markup: &str) -> HashMap<String, u32> {
    let document = Html::parse_document(markup);

    let Some(table) = find_roster_table(&document) else {
        return HashMap::new();
    };

    let mut roster = HashMap::new();
    for row in table.select(&ROW) {
        let cells: Vec<ElementRef> = row.select(&DATA_CELL).collect();
        if cells.len() < MIN_COLUMNS {
            continue;
        }

        let name = cell_text(&cells[NAME_COLUMN]);
        if name.is_empty() {
            continue;
        }

        let Some(level) = first_number(&cell_text(&cells[LEVEL_COLUMN])) else {
            continue;
        };

        roster.insert(name, level);
    }

    roster
}

/// Pick the table that looks like the roster, or the first table on the page.
fn find_roster_table(document: &Html) -> Option<ElementRef<'_>> {
    let tables: Vec<ElementRef> = document.select(&TABLE).collect();
    tables
        .iter()
        .copied()
        .find(|table| looks_like_roster(*table))
        .or_else(|| tables.first().copied())
}

/// A table is the roster if any `<th>`, or any cell of its first row,
/// mentions one of the known roster headers.
fn looks_like_roster(table: ElementRef<'_>) -> bool {
    if table
        .select(&HEADER_CELL)
        .any(|cell| is_roster_header(&cell_text(&cell)))
    {
        return true;
    }

    table
        .select(&ROW)
        .next()
        .is_some_and(|row| {
            row.select(&ANY_CELL)
                .any(|cell| is_roster_header(&cell_text(&cell)))
        })
}

fn is_roster_header(text: &str) -> bool {
    let lower = text.to_lowercase();
    ROSTER_HEADER_HINTS.iter().any(|hint| lower.contains(hint))
}

/// All text within a cell, flattened and trimmed. `<td><a>Name</a></td>`
/// yields `Name`.
fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// First contiguous run of ASCII digits in `text`, if any. Tolerates trailing
/// annotations like `527 (ML 90)`.
fn first_number(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_roster_table() {
        let markup = r#"
            <html><body><table>
                <tr><th>Name</th><th>Level</th><th>Vocation</th></tr>
                <tr><td>Alienwarre</td><td>527</td><td>Ninja</td></tr>
                <tr><td>Zeus</td><td>480</td><td>Samurai</td></tr>
            </table></body></html>"#;
        let roster = parse(markup);
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.get("Alienwarre"), Some(&527));
        assert_eq!(roster.get("Zeus"), Some(&480));
    }

    #[test]
    fn skips_malformed_row_keeps_the_rest() {
        let markup = r#"
            <table>
                <tr><td>Alienwarre</td><td>527</td></tr>
                <tr><td>Broken</td><td>not a number</td></tr>
                <tr><td>Zeus</td><td>480</td></tr>
            </table>"#;
        let roster = parse(markup);
        assert_eq!(roster.len(), 2);
        assert!(!roster.contains_key("Broken"));
        assert_eq!(roster.get("Zeus"), Some(&480));
    }

    #[test]
    fn strips_nested_link_markup_from_name() {
        let markup = r#"
            <table>
                <tr><td><a href="/character/Alienwarre">Alienwarre</a></td><td>527</td></tr>
            </table>"#;
        assert_eq!(parse(markup).get("Alienwarre"), Some(&527));
    }

    #[test]
    fn level_tolerates_trailing_annotations() {
        let markup = r#"
            <table>
                <tr><td>Alienwarre</td><td>527 (ML 92)</td></tr>
                <tr><td>Zeus</td><td>Level: 480</td></tr>
            </table>"#;
        let roster = parse(markup);
        assert_eq!(roster.get("Alienwarre"), Some(&527));
        assert_eq!(roster.get("Zeus"), Some(&480));
    }

    #[test]
    fn selects_roster_table_among_several() {
        let markup = r#"
            <table>
                <tr><th>Server</th><th>Uptime</th></tr>
                <tr><td>Tenkai</td><td>99</td></tr>
            </table>
            <table>
                <tr><th>Name</th><th>Level</th></tr>
                <tr><td>Alienwarre</td><td>527</td></tr>
            </table>"#;
        let roster = parse(markup);
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.get("Alienwarre"), Some(&527));
        assert!(!roster.contains_key("Tenkai"));
    }

    #[test]
    fn falls_back_to_first_table_without_headers() {
        let markup = r#"
            <table>
                <tr><td>Alienwarre</td><td>527</td></tr>
            </table>
            <table>
                <tr><td>Other</td><td>1</td></tr>
            </table>"#;
        let roster = parse(markup);
        assert_eq!(roster.get("Alienwarre"), Some(&527));
        assert!(!roster.contains_key("Other"));
    }

    #[test]
    fn rows_with_too_few_cells_are_skipped() {
        let markup = r#"
            <table>
                <tr><td>colspan banner</td></tr>
                <tr><td>Alienwarre</td><td>527</td></tr>
            </table>"#;
        let roster = parse(markup);
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn no_table_yields_empty_roster() {
        assert!(parse("<html><body><p>maintenance</p></body></html>").is_empty());
    }

    #[test]
    fn empty_markup_yields_empty_roster() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn header_row_does_not_become_an_entry() {
        let markup = r#"
            <table>
                <tr><th>Name</th><th>Level</th></tr>
                <tr><td>Alienwarre</td><td>527</td></tr>
            </table>"#;
        let roster = parse(markup);
        assert_eq!(roster.len(), 1);
        assert!(!roster.contains_key("Name"));
    }

    #[test]
    fn first_number_extraction() {
        assert_eq!(first_number("527"), Some(527));
        assert_eq!(first_number("  527  "), Some(527));
        assert_eq!(first_number("Level 527 up"), Some(527));
        assert_eq!(first_number("no digits"), None);
        assert_eq!(first_number(""), None);
    }
}

// src/fetch/tables.rs
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::utils::error::FetchError;

// --- CSS Selectors (Lazy Static) ---
static TABLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("table").expect("Failed to compile TABLE_SELECTOR")
});

static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("tr").expect("Failed to compile ROW_SELECTOR")
});

static CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("td, th").expect("Failed to compile CELL_SELECTOR")
});

/// Serializes every `<table>` in the document to CSV text.
///
/// `host` is prepended as the first field of each table's first row so the
/// inference step can tell which institution the rows belong to. Tables
/// without rows are skipped.
pub fn extract_tables(html: &str, host: &str) -> Result<Vec<String>, FetchError> {
    let document = Html::parse_document(html);
    let mut tables = Vec::new();

    for (idx, table) in document.select(&TABLE_SELECTOR).enumerate() {
        let csv_text = table_to_csv(table, host)?;
        if csv_text.is_empty() {
            tracing::trace!("Skipping empty table #{} on {}", idx, host);
            continue;
        }
        tables.push(csv_text);
    }

    tracing::debug!("Serialized {} table(s) for {}", tables.len(), host);
    Ok(tables)
}

fn table_to_csv(table: ElementRef, host: &str) -> Result<String, FetchError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let mut first_row = true;
    for row in table.select(&ROW_SELECTOR) {
        let mut fields: Vec<String> = row.select(&CELL_SELECTOR).map(cell_text).collect();
        if first_row {
            fields.insert(0, host.to_string());
            first_row = false;
        }
        writer
            .write_record(&fields)
            .map_err(|e| FetchError::Serialize(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| FetchError::Serialize(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| FetchError::Serialize(e.to_string()))
}

// Text of one cell with each text node trimmed, joined by single spaces.
fn cell_text(cell: ElementRef) -> String {
    cell.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_serialized_with_host_tag() {
        let html = r#"
            <html><body>
            <h1>Rates</h1>
            <table>
              <tr><th>Term</th><th>APY</th></tr>
              <tr><td>12-month CD</td><td> 4.50% </td></tr>
            </table>
            <p>Other text</p>
            <table>
              <tr><th>Name</th><th>Rate</th></tr>
              <tr><td>24-month <b>CD</b></td><td>4.25%</td></tr>
            </table>
            </body></html>
        "#;

        let tables = extract_tables(html, "www.bank.example.com").unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0], "www.bank.example.com,Term,APY\n12-month CD,4.50%\n");
        assert_eq!(tables[1], "www.bank.example.com,Name,Rate\n24-month CD,4.25%\n");
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let html = "<table><tr><td>Minimum</td></tr><tr><td>$1,000</td></tr></table>";
        let tables = extract_tables(html, "dcu.org").unwrap();
        assert_eq!(tables, vec!["dcu.org,Minimum\n\"$1,000\"\n".to_string()]);
    }

    #[test]
    fn test_page_without_tables() {
        let html = "<html><body><div>No rates here</div></body></html>";
        assert!(extract_tables(html, "example.com").unwrap().is_empty());
    }

    #[test]
    fn test_table_without_rows_is_skipped() {
        let html = "<table></table><table><tr><td>Savings</td><td>0.05</td></tr></table>";
        let tables = extract_tables(html, "salemcoop.com").unwrap();
        assert_eq!(tables, vec!["salemcoop.com,Savings,0.05\n".to_string()]);
    }
}

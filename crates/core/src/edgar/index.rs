use crate::edgar::types::FilingRef;
use anyhow::{anyhow, Context, Result};
use scraper::{ElementRef, Html, Selector};

const INFO_TABLE_MARKER: &str = "INFORMATION TABLE";

// Seq, Description, Document, Type, Size.
const DOCUMENT_CELL: usize = 2;
const TYPE_CELL: usize = 3;
const MIN_CELLS: usize = 5;

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {css:?}: {e}"))
}

/// Finds the information-table document link on a filing index page.
///
/// Only rows of the first `tableFile` table whose Type cell reads
/// "INFORMATION TABLE" count. The first such link ending in `.xml` wins,
/// otherwise the first candidate at all.
pub fn find_information_table_href(html: &str) -> Result<Option<String>> {
    let table_sel = selector("table.tableFile")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("td")?;
    let link_sel = selector("a[href]")?;

    let doc = Html::parse_document(html);
    let Some(table) = doc.select(&table_sel).next() else {
        return Ok(None);
    };

    let mut fallback: Option<String> = None;
    for row in table.select(&row_sel) {
        let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
        if cells.len() < MIN_CELLS {
            continue;
        }
        let type_text: String = cells[TYPE_CELL].text().collect();
        if !type_text.contains(INFO_TABLE_MARKER) {
            continue;
        }

        let Some(href) = cells[DOCUMENT_CELL]
            .select(&link_sel)
            .filter_map(|a| a.value().attr("href"))
            .map(str::trim)
            .find(|h| !h.is_empty())
        else {
            continue;
        };
        if href.to_ascii_lowercase().ends_with(".xml") {
            return Ok(Some(href.to_string()));
        }
        fallback.get_or_insert_with(|| href.to_string());
    }
    Ok(fallback)
}

/// Resolves a document link from the index page against the filing's directory.
/// Only the file name is kept, so rendered (`xslForm13F...`) links map to the raw XML.
pub fn information_table_url(filing: &FilingRef, href: &str) -> Result<String> {
    let file_name = href
        .rsplit('/')
        .next()
        .filter(|s| !s.trim().is_empty())
        .with_context(|| format!("document link has no file name: {href}"))?;
    Ok(format!("{}/{}", filing.base_url(), file_name.trim()))
}

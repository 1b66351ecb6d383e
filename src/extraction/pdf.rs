// PDF page helpers over lopdf

use lopdf::Document;
use tracing::{debug, warn};

use super::ExtractError;

/// Pages mentioning any of these are kept by the web PDF policy.
pub const KEY_PAGE_KEYWORDS: [&str; 6] = [
    "resumen",
    "resultados",
    "conclusiones",
    "tabla",
    "gráfico",
    "análisis",
];

/// Pages used when no page mentions a keyword.
pub const FALLBACK_PAGE_COUNT: usize = 5;

pub fn load(bytes: &[u8]) -> Result<Document, ExtractError> {
    let doc = Document::load_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;
    if doc.is_encrypted() {
        warn!("PDF is encrypted, extraction may be incomplete");
    }
    Ok(doc)
}

/// Text of every page in page order; unreadable pages yield an empty string.
pub fn page_texts(doc: &Document) -> Vec<String> {
    doc.get_pages()
        .keys()
        .map(|&page_number| match doc.extract_text(&[page_number]) {
            Ok(text) => text,
            Err(e) => {
                debug!(page_number, error = %e, "Could not extract PDF page text");
                String::new()
            }
        })
        .collect()
}

/// Keeps pages containing any key keyword (case-insensitive); when none
/// match, the first [`FALLBACK_PAGE_COUNT`] pages.
pub fn select_key_pages(pages: &[String]) -> Vec<&str> {
    let relevant: Vec<&str> = pages
        .iter()
        .filter(|page| {
            let lower = page.to_lowercase();
            KEY_PAGE_KEYWORDS.iter().any(|kw| lower.contains(kw))
        })
        .map(String::as_str)
        .collect();

    if !relevant.is_empty() {
        return relevant;
    }

    pages.iter().take(FALLBACK_PAGE_COUNT).map(String::as_str).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    /// Builds an in-memory PDF with one page per entry.
    pub(crate) fn build_pdf(pages: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    fn pages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_select_key_pages_filters_by_keyword() {
        let pages = pages(&["Portada", "RESUMEN ejecutivo", "Anexo", "Tabla de costes"]);
        assert_eq!(select_key_pages(&pages), vec!["RESUMEN ejecutivo", "Tabla de costes"]);
    }

    #[test]
    fn test_select_key_pages_accented_keyword() {
        let pages = pages(&["Intro", "Análisis de mercado"]);
        assert_eq!(select_key_pages(&pages), vec!["Análisis de mercado"]);
    }

    #[test]
    fn test_select_key_pages_falls_back_to_first_pages() {
        let pages = pages(&["1", "2", "3", "4", "5", "6", "7"]);
        assert_eq!(select_key_pages(&pages), vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn test_load_rejects_garbage() {
        assert!(matches!(load(b"not a pdf"), Err(ExtractError::Pdf(_))));
    }

    #[test]
    fn test_page_texts_reads_generated_pdf() {
        let bytes = build_pdf(&["Hello page one", "Resultados finales"]);
        let doc = load(&bytes).unwrap();
        let texts = page_texts(&doc);
        assert_eq!(texts.len(), 2);
        assert!(texts[0].contains("Hello page one"));
        assert!(texts[1].contains("Resultados finales"));
    }
}

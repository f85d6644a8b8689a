//! Renderer-neutral report document.

use serde::Serialize;

/// A report ready to be laid out on pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    pub title: String,
    pub subtitle: Option<String>,
    pub sections: Vec<Section>,
    /// Printed at the bottom of every page, next to the page number
    pub footer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub heading: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Block {
    KeyValues(Vec<(String, String)>),
    Paragraph(String),
    Table(TableBlock),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableBlock {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            sections: Vec::new(),
            footer: None,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn push(&mut self, section: Section) {
        self.sections.push(section);
    }

    pub fn section(&self, heading: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.heading == heading)
    }
}

impl Section {
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            blocks: Vec::new(),
        }
    }

    pub fn key_values<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let pairs = pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self.blocks.push(Block::KeyValues(pairs));
        self
    }

    pub fn paragraph(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Paragraph(text.into()));
        self
    }

    pub fn table(mut self, columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        self.blocks.push(Block::Table(TableBlock { columns, rows }));
        self
    }

    /// First table in the section, if any.
    pub fn first_table(&self) -> Option<&TableBlock> {
        self.blocks.iter().find_map(|b| match b {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }
}

/// Format a measurement with at most `decimals` places and no trailing zeros.
pub fn format_number(value: f64, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, value);
    let text = if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    };
    if text == "-0" {
        "0".to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1.5, 3), "1.5");
        assert_eq!(format_number(2.0, 3), "2");
        assert_eq!(format_number(-0.0001, 3), "0");
        assert_eq!(format_number(0.21649, 3), "0.216");
        assert_eq!(format_number(120.0, 0), "120");
    }

    #[test]
    fn test_builder() {
        let mut doc = ReportDocument::new("Moon Parameters").with_subtitle("Ramadan 1445 AH");
        doc.push(
            Section::new("Rows")
                .paragraph("intro")
                .table(vec!["a".into()], vec![vec!["1".into()]]),
        );

        let section = doc.section("Rows").unwrap();
        assert_eq!(section.blocks.len(), 2);
        assert_eq!(section.first_table().unwrap().rows.len(), 1);
        assert!(doc.section("Missing").is_none());
    }
}

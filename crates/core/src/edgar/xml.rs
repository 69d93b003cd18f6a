use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum XmlNode<'a> {
    Start,
    End,
    Text(&'a str),
}

/// Streams `xml`, calling `visit` with the current element path (local names,
/// namespace prefixes dropped) for every start, end and non-blank text node.
pub(crate) fn walk<F>(xml: &str, mut visit: F) -> Result<()>
where
    F: FnMut(&[String], XmlNode<'_>),
{
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();
    loop {
        let event = reader
            .read_event()
            .with_context(|| format!("malformed XML at byte {}", reader.buffer_position()))?;

        match event {
            Event::Start(e) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                visit(&path, XmlNode::Start);
            }
            Event::Empty(e) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                visit(&path, XmlNode::Start);
                visit(&path, XmlNode::End);
                path.pop();
            }
            Event::End(_) => {
                visit(&path, XmlNode::End);
                path.pop();
            }
            Event::Text(t) => {
                let text = t.unescape().context("invalid XML text")?;
                visit(&path, XmlNode::Text(&text));
            }
            Event::CData(c) => {
                let raw = c.into_inner();
                let text = String::from_utf8_lossy(&raw);
                visit(&path, XmlNode::Text(text.trim()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    anyhow::ensure!(
        path.is_empty(),
        "XML ended inside <{}>",
        path.last().map(String::as_str).unwrap_or_default()
    );
    Ok(())
}

pub(crate) fn ends_with(path: &[String], suffix: &[&str]) -> bool {
    path.len() >= suffix.len()
        && path[path.len() - suffix.len()..]
            .iter()
            .zip(suffix)
            .all(|(a, b)| a == b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_local_names_and_text() {
        let xml = r#"<a:root xmlns:a="urn:x"><a:item k="v">one &amp; two</a:item><empty/></a:root>"#;
        let mut seen = Vec::new();
        walk(xml, |path, node| {
            seen.push((path.join("/"), format!("{node:?}")));
        })
        .unwrap();

        assert_eq!(seen[0], ("root".to_string(), "Start".to_string()));
        assert_eq!(seen[1], ("root/item".to_string(), "Start".to_string()));
        assert_eq!(
            seen[2],
            ("root/item".to_string(), "Text(\"one & two\")".to_string())
        );
        assert_eq!(seen[4], ("root/empty".to_string(), "Start".to_string()));
        assert_eq!(seen.last().unwrap().0, "root");
    }

    #[test]
    fn rejects_mismatched_and_truncated_documents() {
        assert!(walk("<a><b></a>", |_, _| {}).is_err());
        assert!(walk("<a><b></b>", |_, _| {}).is_err());
    }

    #[test]
    fn suffix_match() {
        let path: Vec<String> = ["x", "shrsOrPrnAmt", "sshPrnamt"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(ends_with(&path, &["shrsOrPrnAmt", "sshPrnamt"]));
        assert!(!ends_with(&path, &["sshPrnamtType"]));
    }
}

//! Ticket link detection.
//!
//! `[ticket: PROJ-123]` blocks become links to `<ticketBaseUrl>/PROJ-123`
//! when a base URL is configured. Without one, no links are produced.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static TICKET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[ticket:\s*([A-Z]+-\d+)\]").expect("valid ticket regex"));

/// A ticket reference in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketLink {
    pub ticket_id: String,

    /// Character range of the whole `[ticket: ...]` block.
    pub start: usize,
    pub end: usize,

    pub url: String,
}

impl TicketLink {
    #[must_use]
    pub fn tooltip(&self) -> String {
        format!("Open {} in browser", self.ticket_id)
    }
}

/// Finds every ticket block in `text` and links it under `base_url`.
#[must_use]
pub fn ticket_links(text: &str, base_url: Option<&str>) -> Vec<TicketLink> {
    let Some(base) = base_url.map(|url| url.trim().trim_end_matches('/')) else {
        return Vec::new();
    };
    if base.is_empty() {
        return Vec::new();
    }

    let mut links = Vec::new();
    let mut counted_bytes = 0;
    let mut counted_chars = 0;

    for caps in TICKET_RE.captures_iter(text) {
        let (Some(block), Some(id)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        counted_chars += text[counted_bytes..block.start()].chars().count();
        counted_bytes = block.start();

        links.push(TicketLink {
            ticket_id: id.as_str().to_string(),
            start: counted_chars,
            end: counted_chars + block.as_str().chars().count(),
            url: format!("{base}/{}", id.as_str()),
        });
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_base_url_no_links() {
        assert!(ticket_links("// TODO: x [ticket: AB-1]", None).is_empty());
        assert!(ticket_links("// TODO: x [ticket: AB-1]", Some("  ")).is_empty());
    }

    #[test]
    fn links_ticket_blocks() {
        let text = "// TODO: x [ticket: AB-12] and [Ticket:cd-7]";
        let links = ticket_links(text, Some("https://jira.example.com/browse/"));

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].ticket_id, "AB-12");
        assert_eq!(links[0].url, "https://jira.example.com/browse/AB-12");
        assert_eq!(&text[links[0].start..links[0].end], "[ticket: AB-12]");
        assert_eq!(links[1].ticket_id, "cd-7");
        assert_eq!(links[0].tooltip(), "Open AB-12 in browser");
    }

    #[test]
    fn malformed_ids_are_skipped() {
        let links = ticket_links("[ticket: 123] [ticket: AB_1]", Some("https://t"));
        assert!(links.is_empty());
    }

    #[test]
    fn offsets_are_characters() {
        let text = "🎫 [ticket: ZZ-9]";
        let links = ticket_links(text, Some("https://t"));
        assert_eq!(links[0].start, 2);
        assert_eq!(links[0].end, 2 + "[ticket: ZZ-9]".len());
    }
}

//! Text-fragment deep links to evidence.

/// Build a text-fragment link that scrolls to `evidence` on the page at `url`.
///
/// Without evidence (absent or blank) the URL is returned unchanged. Any
/// existing fragment on `url` is replaced. Dashes are encoded as well, since
/// the text directive uses them as prefix/suffix delimiters.
pub fn build_text_fragment_link(url: &str, evidence: Option<&str>) -> String {
    let evidence = match evidence.map(str::trim) {
        Some(e) if !e.is_empty() => e,
        _ => return url.to_string(),
    };

    let base = url.split_once('#').map_or(url, |(base, _)| base);
    let encoded = urlencoding::encode(evidence).replace('-', "%2D");
    format!("{base}#:~:text={encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ADA: &str = "https://en.wikipedia.org/wiki/Ada_Lovelace";

    #[test]
    fn test_link_percent_encodes_evidence() {
        let link = build_text_fragment_link(ADA, Some("born on 10 December 1815"));
        assert_eq!(
            link,
            "https://en.wikipedia.org/wiki/Ada_Lovelace#:~:text=born%20on%2010%20December%201815"
        );
    }

    #[test]
    fn test_link_encodes_reserved_characters() {
        let link = build_text_fragment_link(ADA, Some("Lovelace & Babbage, co-workers"));
        assert!(link.ends_with("#:~:text=Lovelace%20%26%20Babbage%2C%20co%2Dworkers"));
        assert!(!link.contains(' '));
    }

    #[test]
    fn test_link_without_evidence_is_bare_url() {
        assert_eq!(build_text_fragment_link(ADA, None), ADA);
        assert_eq!(build_text_fragment_link(ADA, Some("   ")), ADA);
    }

    #[test]
    fn test_link_replaces_existing_fragment() {
        let url = format!("{ADA}#Early_life");
        let link = build_text_fragment_link(&url, Some("born"));
        assert_eq!(link, format!("{ADA}#:~:text=born"));
    }
}

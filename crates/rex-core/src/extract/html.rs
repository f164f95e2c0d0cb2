//! Link extraction for HTML bodies, on top of `scraper`'s HTML5 parser.
//!
//! Elements are visited in document order. `<base href>` moves the base for
//! every later link.

use scraper::{Html, Selector};
use url::Url;

use crate::response::FetchedResponse;

use super::{LinkExtractor, ObservedLink};

/// Element → attribute holding its link.
const LINK_ATTRS: &[(&str, &str)] = &[
    ("a", "href"),
    ("link", "href"),
    ("img", "src"),
    ("script", "src"),
    ("frame", "src"),
    ("iframe", "src"),
    ("embed", "src"),
    ("source", "src"),
];

const HTML_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];

const ELEMENTS: &str = "a, link, img, script, frame, iframe, embed, source, base";

#[derive(Debug, thiserror::Error)]
#[error("invalid link selector: {0}")]
pub struct SelectorError(String);

pub struct HtmlLinkExtractor {
    elements: Selector,
}

impl HtmlLinkExtractor {
    pub fn new() -> Result<Self, SelectorError> {
        let elements = Selector::parse(ELEMENTS).map_err(|e| SelectorError(e.to_string()))?;
        Ok(Self { elements })
    }
}

fn is_html(response: &FetchedResponse) -> bool {
    response
        .media_type()
        .is_some_and(|t| HTML_TYPES.contains(&t.as_str()))
}

impl LinkExtractor for HtmlLinkExtractor {
    fn extract(&self, request_uri: &str, response: &FetchedResponse) -> Vec<ObservedLink> {
        if !is_html(response) {
            return Vec::new();
        }
        let text = String::from_utf8_lossy(&response.body);
        let document = Html::parse_document(&text);

        let mut base = request_uri.to_string();
        let mut links = Vec::new();
        for element in document.select(&self.elements) {
            let el = element.value();
            let tag = el.name();

            if tag == "base" {
                let joined = el
                    .attr("href")
                    .and_then(|href| Url::parse(request_uri).and_then(|u| u.join(href)).ok());
                if let Some(u) = joined {
                    base = u.into();
                }
                continue;
            }

            let Some((_, wanted)) = LINK_ATTRS.iter().find(|(t, _)| *t == tag) else {
                continue;
            };
            let Some(value) = el.attr(wanted) else {
                continue;
            };
            links.push(ObservedLink {
                base: base.clone(),
                link: value.to_string(),
                tag: tag.to_string(),
                title: el.attr("title").unwrap_or_default().to_string(),
            });
        }
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html(body: &str) -> FetchedResponse {
        let lines = vec![
            "HTTP/1.1 200 OK".to_string(),
            "Content-Type: text/html; charset=utf-8".to_string(),
        ];
        FetchedResponse::from_parts(&lines, body.as_bytes().to_vec(), body.len() as u64)
    }

    fn triples(links: &[ObservedLink]) -> Vec<(&str, &str, &str)> {
        links
            .iter()
            .map(|l| (l.tag.as_str(), l.link.as_str(), l.base.as_str()))
            .collect()
    }

    #[test]
    fn finds_links_in_document_order() {
        let x = HtmlLinkExtractor::new().unwrap();
        let body = r#"<html><head><link rel=stylesheet href="/s.css">
            <script src='/app.js'></script></head>
            <body><IMG SRC=/b.png title="Logo"><a href="/c">c</a><abbr title="x">y</abbr></body></html>"#;
        let links = x.extract("http://x/a", &html(body));
        assert_eq!(
            triples(&links),
            vec![
                ("link", "/s.css", "http://x/a"),
                ("script", "/app.js", "http://x/a"),
                ("img", "/b.png", "http://x/a"),
                ("a", "/c", "http://x/a"),
            ]
        );
        assert_eq!(links[2].title, "Logo");
        assert_eq!(links[3].title, "");
    }

    #[test]
    fn base_element_moves_base_for_later_links() {
        let x = HtmlLinkExtractor::new().unwrap();
        let body = r#"<img src="one.png"><base href="/assets/"><img src="two.png">"#;
        let links = x.extract("http://x/dir/page", &html(body));
        assert_eq!(links[0].base, "http://x/dir/page");
        assert_eq!(links[1].base, "http://x/assets/");
    }

    #[test]
    fn comments_and_missing_attributes_skipped() {
        let x = HtmlLinkExtractor::new().unwrap();
        let body = "<!-- <img src=\"/hidden.png\"> --><a name=\"top\"></a><img src=\"\">";
        let links = x.extract("http://x/", &html(body));
        assert_eq!(triples(&links), vec![("img", "", "http://x/")]);
    }

    #[test]
    fn entities_decoded_in_values() {
        let x = HtmlLinkExtractor::new().unwrap();
        let body = r#"<a href="/q?a=1&amp;b=2">q</a><img src="/a&#38;b.png" title="&quot;hi&quot;">"#;
        let links = x.extract("http://x/", &html(body));
        assert_eq!(links[0].link, "/q?a=1&b=2");
        assert_eq!(links[1].link, "/a&b.png");
        assert_eq!(links[1].title, "\"hi\"");
    }

    #[test]
    fn angle_bracket_inside_attribute_value() {
        let x = HtmlLinkExtractor::new().unwrap();
        let links = x.extract("http://x/", &html(r#"<img alt="a > b" src="/x.png">"#));
        assert_eq!(triples(&links), vec![("img", "/x.png", "http://x/")]);
    }

    #[test]
    fn non_html_ignored() {
        let x = HtmlLinkExtractor::new().unwrap();
        let lines = vec!["HTTP/1.1 200 OK".to_string(), "Content-Type: text/plain".to_string()];
        let body = b"<img src=\"/x.png\">".to_vec();
        let r = FetchedResponse::from_parts(&lines, body, 18);
        assert!(x.extract("http://x/", &r).is_empty());
    }
}

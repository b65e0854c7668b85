//! Sitemap generation.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/posts/hello/</loc>
//!     <lastmod>2025-01-01</lastmod>
//!   </url>
//! </urlset>
//! ```

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Single URL entry in the sitemap
pub struct UrlEntry {
    /// Full URL location
    pub loc: String,
    /// Last modification date (YYYY-MM-DD)
    pub lastmod: Option<String>,
}

/// Render entries in the given order.
pub fn render(entries: &[UrlEntry]) -> String {
    let mut xml = String::with_capacity(128 + entries.len() * 96);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
    xml.push('\n');

    for entry in entries {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
        if let Some(lastmod) = &entry.lastmod {
            xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
        }
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(loc: &str, lastmod: Option<&str>) -> UrlEntry {
        UrlEntry {
            loc: loc.to_owned(),
            lastmod: lastmod.map(str::to_owned),
        }
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a & b"), "a &amp; b");
        assert_eq!(escape_xml("<it's \"x\">"), "&lt;it&apos;s &quot;x&quot;&gt;");
    }

    #[test]
    fn test_sitemap_empty() {
        let xml = render(&[]);
        let lines: Vec<&str> = xml.lines().collect();
        assert_eq!(lines[0], r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        assert_eq!(lines[1], format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
        assert_eq!(lines[2], "</urlset>");
    }

    #[test]
    fn test_sitemap_entries() {
        let xml = render(&[
            entry("https://example.com/", None),
            entry("https://example.com/posts/hello/", Some("2025-01-01")),
        ]);

        assert_eq!(xml.matches("<url>").count(), 2);
        assert!(xml.contains("<loc>https://example.com/posts/hello/</loc>"));
        assert!(xml.contains("<lastmod>2025-01-01</lastmod>"));
        assert_eq!(xml.matches("<lastmod>").count(), 1);
    }

    #[test]
    fn test_sitemap_escapes_loc() {
        let xml = render(&[entry("https://example.com/?q=a&b=c", None)]);
        assert!(xml.contains("<loc>https://example.com/?q=a&amp;b=c</loc>"));
    }
}

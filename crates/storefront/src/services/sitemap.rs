//! Sitemap rendering.

use std::fmt::Write as _;

use crate::models::SitemapRow;

/// Render a sitemap with the home page, every category and every product.
#[must_use]
pub fn render(site_url: &str, categories: &[SitemapRow], products: &[SitemapRow]) -> String {
    let base = site_url.trim_end_matches('/');
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );

    push_url(&mut xml, &format!("{base}/"), None, "daily", "1.0");

    for row in categories {
        push_url(
            &mut xml,
            &format!("{base}/categories/{}", row.slug),
            Some(row),
            "weekly",
            "0.8",
        );
    }
    for row in products {
        push_url(
            &mut xml,
            &format!("{base}/products/{}", row.slug),
            Some(row),
            "weekly",
            "0.6",
        );
    }

    xml.push_str("</urlset>\n");
    xml
}

fn push_url(xml: &mut String, loc: &str, row: Option<&SitemapRow>, changefreq: &str, priority: &str) {
    xml.push_str("  <url>\n");
    let _ = writeln!(xml, "    <loc>{}</loc>", escape(loc));
    if let Some(row) = row {
        let _ = writeln!(xml, "    <lastmod>{}</lastmod>", row.updated_at.format("%Y-%m-%d"));
    }
    let _ = writeln!(xml, "    <changefreq>{changefreq}</changefreq>");
    let _ = writeln!(xml, "    <priority>{priority}</priority>");
    xml.push_str("  </url>\n");
}

/// Escape the five XML special characters.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn row(slug: &str) -> SitemapRow {
        SitemapRow {
            slug: slug.to_string(),
            updated_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).single().unwrap_or_default(),
        }
    }

    #[test]
    fn test_render_lists_every_page() {
        let xml = render("https://sonic.example/", &[row("pumps")], &[row("jet-pump-1hp"), row("mini-pump")]);

        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<loc>https://sonic.example/</loc>"));
        assert!(xml.contains("<loc>https://sonic.example/categories/pumps</loc>"));
        assert!(xml.contains("<loc>https://sonic.example/products/jet-pump-1hp</loc>"));
        assert!(xml.contains("<lastmod>2026-03-14</lastmod>"));
        assert_eq!(xml.matches("<url>").count(), 4);
        assert!(xml.trim_end().ends_with("</urlset>"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a&b<c>'\""), "a&amp;b&lt;c&gt;&apos;&quot;");
    }
}

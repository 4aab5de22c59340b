//! `sitemap.xml` generation (sitemap protocol 0.9).
//!
//! One `<url>` for the site root followed by one per post, in collection order.

use tracing::debug;

use crate::config::SiteConfig;
use crate::models::PostRecord;
use crate::xml::escape;

pub const SITEMAP_FILE: &str = "sitemap.xml";

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

pub fn render_sitemap(site: &SiteConfig, posts: &[PostRecord]) -> String {
    debug!(count = posts.len(), "rendering sitemap");

    let mut xml = String::with_capacity(128 + posts.len() * 96);
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!("<urlset xmlns=\"{SITEMAP_NS}\">\n"));

    push_url(&mut xml, site.root_url());
    for post in posts {
        push_url(&mut xml, &site.post_url(&post.slug));
    }

    xml.push_str("</urlset>\n");
    xml
}

fn push_url(xml: &mut String, loc: &str) {
    xml.push_str("  <url>\n    <loc>");
    xml.push_str(&escape(loc));
    xml.push_str("</loc>\n  </url>\n");
}

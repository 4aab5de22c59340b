//! RSS 2.0 feed generation.

use rss::extension::atom::{AtomExtension, Link};
use rss::{Channel, ChannelBuilder, GuidBuilder, Item, ItemBuilder};
use tracing::debug;

use crate::config::SiteConfig;
use crate::dates::{format_rss_date, parse_post_date};
use crate::error::PipelineError;
use crate::models::PostRecord;

pub const RSS_FILE: &str = "rss.xml";
pub const RSS_CONTENT_TYPE: &str = "application/rss+xml";

/// Builds the channel with one item per post, in collection order. A post
/// whose date cannot be parsed fails the whole feed.
pub fn rss_channel(site: &SiteConfig, posts: &[PostRecord]) -> Result<Channel, PipelineError> {
    debug!(count = posts.len(), "building RSS channel");

    let items = posts
        .iter()
        .map(|post| post_to_item(site, post))
        .collect::<Result<Vec<Item>, _>>()?;

    let mut self_link = Link::default();
    self_link.set_href(site.feed_url());
    self_link.set_rel("self");
    self_link.set_mime_type(Some(RSS_CONTENT_TYPE.to_string()));
    let mut atom = AtomExtension::default();
    atom.set_links(vec![self_link]);

    Ok(ChannelBuilder::default()
        .title(&site.title)
        .link(site.root_url())
        .description(&site.description)
        .atom_ext(Some(atom))
        .items(items)
        .build())
}

pub fn render_rss(site: &SiteConfig, posts: &[PostRecord]) -> Result<String, PipelineError> {
    Ok(rss_channel(site, posts)?.to_string())
}

fn post_to_item(site: &SiteConfig, post: &PostRecord) -> Result<Item, PipelineError> {
    let published = parse_post_date(&post.date).map_err(|source| PipelineError::Date {
        slug: post.slug.clone(),
        source,
    })?;
    let url = site.post_url(&post.slug);

    Ok(ItemBuilder::default()
        .guid(Some(GuidBuilder::default().value(&url).permalink(true).build()))
        .title(Some(post.title.clone()))
        .link(Some(url))
        .description(Some(post.meta_desc.clone()))
        .pub_date(Some(format_rss_date(&published)))
        .build())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::Map;

    use crate::error::DateError;

    use super::*;

    fn post(slug: &str, date: &str) -> PostRecord {
        PostRecord {
            slug: slug.to_string(),
            title: format!("Title of {slug}"),
            date: date.to_string(),
            meta_desc: format!("About {slug}"),
            reading_time: 2,
            extra: Map::new(),
        }
    }

    fn site() -> SiteConfig {
        SiteConfig {
            base_url: "https://faisal.sh".to_string(),
            title: "Faisal".to_string(),
            description: "Sample work".to_string(),
        }
    }

    #[test]
    fn one_item_per_post_with_unique_guids() {
        let posts = [post("c", "2024-03-01"), post("b", "2024-02-01"), post("a", "2024-01-01")];
        let channel = rss_channel(&site(), &posts).unwrap();

        let guids: Vec<&str> = channel
            .items()
            .iter()
            .map(|item| item.guid().unwrap().value())
            .collect();
        assert_eq!(
            guids,
            [
                "https://faisal.sh/posts/c",
                "https://faisal.sh/posts/b",
                "https://faisal.sh/posts/a",
            ]
        );
        assert_eq!(guids.iter().collect::<HashSet<_>>().len(), 3);
        assert!(channel.items().iter().all(|item| item.guid().unwrap().is_permalink()));

        let xml = render_rss(&site(), &posts).unwrap();
        assert_eq!(xml.matches("<item>").count(), 3);
    }

    #[test]
    fn channel_metadata_and_self_link() {
        let xml = render_rss(&site(), &[]).unwrap();
        let channel = Channel::read_from(xml.as_bytes()).unwrap();

        assert_eq!(channel.title(), "Faisal");
        assert_eq!(channel.link(), "https://faisal.sh");
        assert_eq!(channel.description(), "Sample work");
        assert!(channel.items().is_empty());

        let links = channel.atom_ext().unwrap().links();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].href(), "https://faisal.sh/rss");
        assert_eq!(links[0].rel(), "self");
        assert_eq!(links[0].mime_type(), Some("application/rss+xml"));
    }

    #[test]
    fn item_fields() {
        let channel = rss_channel(&site(), &[post("hello", "2024-03-01")]).unwrap();
        let item = &channel.items()[0];

        assert_eq!(item.title(), Some("Title of hello"));
        assert_eq!(item.link(), Some("https://faisal.sh/posts/hello"));
        assert_eq!(item.description(), Some("About hello"));
        assert_eq!(item.pub_date(), Some("Fri, 01 Mar 2024 00:00:00 GMT"));
    }

    #[test]
    fn escapes_user_authored_text() {
        let mut tricky = post("tricky", "2024-01-01");
        tricky.title = "Rust & <XML>".to_string();
        tricky.meta_desc = "a < b && c > d".to_string();

        let xml = render_rss(&site(), &[tricky]).unwrap();
        assert!(!xml.contains("Rust & <XML>"));

        let channel = Channel::read_from(xml.as_bytes()).unwrap();
        assert_eq!(channel.items()[0].title(), Some("Rust & <XML>"));
        assert_eq!(channel.items()[0].description(), Some("a < b && c > d"));
    }

    #[test]
    fn escapes_site_level_text() {
        let site = SiteConfig {
            base_url: "https://example.com/?a=1&b=2".to_string(),
            title: "Tom & Jerry <blog>".to_string(),
            description: "cats < mice & \"friends\"".to_string(),
        };

        let xml = render_rss(&site, &[post("p", "2024-01-01")]).unwrap();
        assert!(!xml.contains("Tom & Jerry"));

        let channel = Channel::read_from(xml.as_bytes()).unwrap();
        assert_eq!(channel.title(), "Tom & Jerry <blog>");
        assert_eq!(channel.description(), "cats < mice & \"friends\"");
        assert_eq!(
            channel.atom_ext().unwrap().links()[0].href(),
            "https://example.com/?a=1&b=2/rss"
        );
        assert_eq!(
            channel.items()[0].guid().unwrap().value(),
            "https://example.com/?a=1&b=2/posts/p"
        );
    }

    #[test]
    fn unparseable_date_fails_the_feed() {
        let err = render_rss(&site(), &[post("ok", "2024-01-01"), post("bad", "yesterday")])
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Date { ref slug, source: DateError::Unparseable(_) } if slug == "bad"
        ));
    }
}

use serde::Serialize;
use serde_json::{Map, Value};

/// Raw contents of one post directory's index file.
#[derive(Debug, Clone, PartialEq)]
pub struct PostSource {
    pub slug: String,
    pub raw_body: String,
}

/// A fully assembled post as served in `posts.json` and consumed by the feeds.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub slug: String,
    pub title: String,
    pub date: String,
    pub meta_desc: String,
    pub reading_time: u32,
    /// Frontmatter keys beyond the ones above, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of the `posts.json` endpoint.
#[derive(Serialize, Debug)]
pub struct PostsBody {
    pub posts: Vec<PostRecord>,
}

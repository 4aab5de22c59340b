use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::Value;
use tracing::info;

use crate::dates::parse_post_date;
use crate::error::{CompileError, DateError, PipelineError};
use crate::markdown::FrontmatterCompiler;
use crate::models::{PostRecord, PostSource};
use crate::reading_time::ReadingConfig;

/// Keys computed by the pipeline or lifted into dedicated fields; never passed through.
const RESERVED_KEYS: [&str; 5] = ["slug", "title", "date", "metaDesc", "readingTime"];

/// Compiles a single post and merges its frontmatter with the computed fields.
pub fn assemble_post(
    post: &PostSource,
    compiler: &dyn FrontmatterCompiler,
    reading: &ReadingConfig,
) -> Result<PostRecord, PipelineError> {
    let compile_error = |source: CompileError| PipelineError::Compile {
        slug: post.slug.clone(),
        source,
    };
    let mut compiled = compiler.compile(&post.raw_body).map_err(compile_error)?;
    let fields = &mut compiled.frontmatter;

    let title = scalar_field(fields.get("title"))
        .ok_or(CompileError::MissingField("title"))
        .map_err(compile_error)?;
    let meta_desc = scalar_field(fields.get("metaDesc"))
        .ok_or(CompileError::MissingField("metaDesc"))
        .map_err(compile_error)?;
    let date = scalar_field(fields.get("date")).ok_or_else(|| PipelineError::Date {
        slug: post.slug.clone(),
        source: DateError::Missing,
    })?;

    for key in RESERVED_KEYS {
        fields.remove(key);
    }

    Ok(PostRecord {
        slug: post.slug.clone(),
        title,
        date,
        meta_desc,
        reading_time: reading.estimate(&post.raw_body),
        extra: std::mem::take(fields),
    })
}

fn scalar_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Compiles every source, at most `concurrency` at a time, then sorts the
/// result newest first. The first failure aborts the run.
pub async fn assemble_posts(
    sources: Vec<PostSource>,
    compiler: Arc<dyn FrontmatterCompiler>,
    reading: Arc<ReadingConfig>,
    concurrency: usize,
) -> Result<Vec<PostRecord>, PipelineError> {
    let records: Vec<PostRecord> = stream::iter(sources)
        .map(|source| {
            let compiler = Arc::clone(&compiler);
            let reading = Arc::clone(&reading);
            tokio::task::spawn_blocking(move || {
                assemble_post(&source, compiler.as_ref(), &reading)
            })
        })
        .buffered(concurrency.max(1))
        .map(|joined| joined.map_err(PipelineError::from).and_then(|record| record))
        .try_collect()
        .await?;

    info!(count = records.len(), "assembled posts");
    sort_by_date(records)
}

/// Stable sort by descending date. Every date must parse.
pub fn sort_by_date(records: Vec<PostRecord>) -> Result<Vec<PostRecord>, PipelineError> {
    let mut keyed = records
        .into_iter()
        .map(|record| match parse_post_date(&record.date) {
            Ok(published) => Ok((published, record)),
            Err(source) => Err(PipelineError::Date {
                slug: record.slug.clone(),
                source,
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    keyed.sort_by(|(a, _), (b, _)| b.cmp(a));
    Ok(keyed.into_iter().map(|(_, record)| record).collect())
}

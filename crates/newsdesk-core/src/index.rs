//! Per-channel document index: rebuild, search and pagination.
//!
//! An index is built wholesale from the channel history and never mutated
//! afterwards. Posts are ordered newest first; equal creation times fall
//! back to the snowflake id, also descending.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use futures::future::join_all;
use maud::{PreEscaped, html};
use regex::Regex;

use crate::document::{Attachment, Document, HistorySource, compare_ids, fetch_all_history};
use crate::error::Result;
use crate::postprocess::{escape_html, heading_title};
use crate::render::{is_safe_image_url, render_body, render_plain};
use crate::resolve::EntityResolver;

/// Posts per listing or search page.
pub const PAGE_SIZE: usize = 50;

/// Longest plaintext summary kept for descriptions.
const DESCRIPTION_MAX_CHARS: usize = 300;

/// Leading `Written by … on …` byline of a stored card.
static BYLINE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*<i>.+?</i>").expect("byline regex should compile"));

/// Rebuild settings that come from configuration.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Zone used for byline dates.
    pub timezone: Tz,
    /// Source ids never shown.
    pub blacklist: HashSet<String>,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Europe::Berlin,
            blacklist: HashSet::new(),
        }
    }
}

/// A rendered source document.
#[derive(Debug, Clone)]
pub struct RenderedPost {
    pub source_id: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    /// Listing card: byline followed by the rendered body.
    pub html: String,
    pub attachment_count: usize,
    /// Attachment URLs, proxy preferred.
    pub attachments: Vec<String>,
    /// First `# ` heading as plain text.
    pub title: Option<String>,
    /// Plaintext summary.
    pub description: String,
    /// Byline date (medium en-US date in the configured zone).
    pub date: String,
}

impl RenderedPost {
    /// Title, falling back to the byline date.
    pub fn title_or_date(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.date)
    }
}

/// Immutable, versioned index of one channel.
#[derive(Debug, Clone, Default)]
pub struct DocumentIndex {
    version: u64,
    posts: Vec<RenderedPost>,
    bodies: HashMap<String, String>,
}

impl DocumentIndex {
    /// Empty index at version 0.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Posts, newest first.
    pub fn posts(&self) -> &[RenderedPost] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Rendered body HTML (no byline) of a source id.
    pub fn body(&self, source_id: &str) -> Option<&str> {
        self.bodies.get(source_id).map(String::as_str)
    }

    pub fn post(&self, source_id: &str) -> Option<&RenderedPost> {
        self.posts.iter().find(|post| post.source_id == source_id)
    }

    pub(crate) fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }
}

/// Medium en-US date (`Apr 20, 2021`) in `zone`.
pub fn byline_date(at: DateTime<Utc>, zone: Tz) -> String {
    at.with_timezone(&zone).format("%b %-d, %Y").to_string()
}

/// Sort newest first, ties broken by descending source id.
pub fn sort_newest_first(documents: &mut [Document]) {
    documents.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| compare_ids(&b.id, &a.id))
    });
}

fn summarize(plain: &str) -> String {
    let collapsed = plain.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(DESCRIPTION_MAX_CHARS) {
        Some((cut, _)) => format!("{}…", collapsed[..cut].trim_end()),
        None => collapsed,
    }
}

/// Render one document into a post and its body HTML.
pub async fn render_document(
    document: &Document,
    resolver: &dyn EntityResolver,
    options: &IndexOptions,
) -> (RenderedPost, String) {
    let (body, plain) = futures::join!(
        render_body(&document.ast, resolver),
        render_plain(&document.ast, resolver)
    );
    let author = document.author.name().to_string();
    let date = byline_date(document.created_at, options.timezone);

    let card = html! {
        i { "Written by " b { (author) } " on " b { (date) } }
        br;
        (PreEscaped(&body))
    };
    // maud writes void elements as `<br>`; line splitting expects `<br />`.
    let card = card.into_string().replacen("<br>", "<br />", 1);

    let post = RenderedPost {
        source_id: document.id.clone(),
        author,
        created_at: document.created_at,
        edited_at: document.edited_at,
        html: card,
        attachment_count: document.attachments.len(),
        attachments: document
            .attachments
            .iter()
            .map(Attachment::display_url)
            .filter(|url| is_safe_image_url(url))
            .map(str::to_string)
            .collect(),
        title: heading_title(&plain),
        description: summarize(&plain),
        date,
    };
    (post, body)
}

/// Build a fresh index (version 0) from the whole channel history.
///
/// Tombstones and blacklisted ids are dropped before rendering.
pub async fn rebuild<S: HistorySource + ?Sized>(
    source: &S,
    resolver: &dyn EntityResolver,
    options: &IndexOptions,
) -> Result<DocumentIndex> {
    let mut documents = fetch_all_history(source).await?;
    let fetched = documents.len();
    documents.retain(|doc| !doc.is_tombstone() && !options.blacklist.contains(&doc.id));
    sort_newest_first(&mut documents);

    let rendered = join_all(
        documents
            .iter()
            .map(|doc| render_document(doc, resolver, options)),
    )
    .await;

    let mut posts = Vec::with_capacity(rendered.len());
    let mut bodies = HashMap::with_capacity(rendered.len());
    for (post, body) in rendered {
        bodies.insert(post.source_id.clone(), body);
        posts.push(post);
    }

    tracing::info!(
        channel = source.channel(),
        fetched,
        posts = posts.len(),
        "index rebuilt"
    );

    Ok(DocumentIndex {
        version: 0,
        posts,
        bodies,
    })
}

fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Case- and whitespace-insensitive substring search over stored cards.
///
/// The byline is ignored. The query is escaped the way card text is, so
/// `&` or quotes in a query match their rendered form. An empty query
/// matches nothing.
pub fn search<'a>(posts: &'a [RenderedPost], query: &str) -> Vec<&'a RenderedPost> {
    let needle = escape_html(&normalize(query));
    if needle.is_empty() {
        return Vec::new();
    }
    posts
        .iter()
        .filter(|post| normalize(&BYLINE_REGEX.replace(&post.html, "")).contains(&needle))
        .collect()
}

/// 1-indexed page of `items`; pages below 1 are page 1, pages past the end
/// are empty.
pub fn paginate<T>(items: &[T], page: i64, page_size: usize) -> &[T] {
    let page = usize::try_from(page.max(1)).unwrap_or(usize::MAX);
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Number of pages needed for `count` items.
pub fn page_count(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1))
}

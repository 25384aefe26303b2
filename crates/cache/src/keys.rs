//! Cache keys: canonical resource URIs paired with a resource kind

use serde_json::Value;
use std::fmt;
use url::Url;

/// Kind of IIIF resource an entry holds
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Manifest,
    Canvas,
    AnnotationPage,
    Annotation,
    Collection,
    /// Any other type, lowercased with its prefix removed
    Other(String),
}

impl ResourceKind {
    /// Parse a requested kind or a `type`/`@type` value.
    ///
    /// Namespace prefixes (`sc:`, `oa:`) are ignored and matching is
    /// case-insensitive. Presentation 2 `AnnotationList` is an annotation page.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let local = trimmed.rsplit(':').next().unwrap_or(trimmed);
        let lower = local.to_ascii_lowercase();
        match lower.as_str() {
            "manifest" => ResourceKind::Manifest,
            "canvas" => ResourceKind::Canvas,
            "annotationpage" | "annotationlist" => ResourceKind::AnnotationPage,
            "annotation" => ResourceKind::Annotation,
            "collection" => ResourceKind::Collection,
            _ => ResourceKind::Other(lower),
        }
    }

    /// The kind a JSON document declares through `type` or `@type`.
    ///
    /// When the declaration is an array the first string is used.
    pub fn declared_by(value: &Value) -> Option<Self> {
        let declared = value.get("type").or_else(|| value.get("@type"))?;
        let name = match declared {
            Value::String(s) => s.as_str(),
            Value::Array(items) => items.iter().find_map(Value::as_str)?,
            _ => return None,
        };
        Some(Self::parse(name))
    }

    pub fn as_str(&self) -> &str {
        match self {
            ResourceKind::Manifest => "manifest",
            ResourceKind::Canvas => "canvas",
            ResourceKind::AnnotationPage => "annotationpage",
            ResourceKind::Annotation => "annotation",
            ResourceKind::Collection => "collection",
            ResourceKind::Other(name) => name,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ResourceKind {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

/// Canonical form of a resource URI.
///
/// Parsable URLs lose their fragment; anything else is only trimmed.
pub fn canonicalize(uri: &str) -> String {
    let trimmed = uri.trim();
    match Url::parse(trimmed) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => trimmed.to_string(),
    }
}

/// The identifier a JSON document declares through `id` or `@id`
pub fn declared_id(value: &Value) -> Option<&str> {
    value
        .get("id")
        .or_else(|| value.get("@id"))
        .and_then(Value::as_str)
}

/// Identity of one cache entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub uri: String,
    pub kind: ResourceKind,
}

impl CacheKey {
    pub fn new(uri: &str, kind: ResourceKind) -> Self {
        Self {
            uri: canonicalize(uri),
            kind,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.uri, self.kind)
    }
}

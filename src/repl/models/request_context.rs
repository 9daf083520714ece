//! # Request Context Model
//!
//! The cumulative state of one HTTP request under construction. Commands
//! mutate a staged copy of it and merge the copy back with [`RequestContext::update`].

use std::collections::BTreeMap;

/// Default target when neither the command line nor a persisted context gives one
pub const DEFAULT_URL: &str = "http://localhost:8000";

/// Header name to value
pub type Headers = BTreeMap<String, String>;

/// Querystring key to every value given for it, in insertion order
pub type QuerystringParams = BTreeMap<String, Vec<String>>;

/// Body field name to value
pub type BodyParams = BTreeMap<String, String>;

/// Client flag to its argument; `None` is a bare flag such as `--form`
pub type Options = BTreeMap<String, Option<String>>;

/// HTTP request-in-progress
///
/// Maps are ordered by key so that every rendering of a context is
/// deterministic without a separate sort step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestContext {
    pub url: String,
    pub headers: Headers,
    pub querystring_params: QuerystringParams,
    pub body_params: BodyParams,
    pub options: Options,
    pub should_exit: bool,
}

impl RequestContext {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Empty staging area seeded with this context's URL
    pub fn staging(&self) -> Self {
        Self::new(self.url.clone())
    }

    /// Fully independent deep copy
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Merge `other` into `self`
    ///
    /// The URL is replaced only when `other` has one. Every map is merged key
    /// by key, the value from `other` winning on conflict.
    pub fn update(&mut self, other: &RequestContext) {
        if !other.url.is_empty() {
            self.url = other.url.clone();
        }

        self.headers
            .extend(other.headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.querystring_params.extend(
            other
                .querystring_params
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        self.body_params
            .extend(other.body_params.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.options
            .extend(other.options.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    /// Drop every header, querystring parameter, body field and option
    pub fn clear(&mut self) {
        self.headers.clear();
        self.querystring_params.clear();
        self.body_params.clear();
        self.options.clear();
    }

    /// Append one querystring value, keeping earlier values for the key
    pub fn add_querystring_param(&mut self, key: String, value: String) {
        self.querystring_params.entry(key).or_default().push(value);
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
            && self.querystring_params.is_empty()
            && self.body_params.is_empty()
            && self.options.is_empty()
    }
}

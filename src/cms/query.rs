//! Search queries against the CMS document API

use indexmap::IndexMap;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters escaped in query-string values
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// A filter on document fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `path` equals `value` exactly
    At { path: String, value: String },
}

impl Predicate {
    /// Build an equality predicate
    ///
    /// # Examples
    /// ```ignore
    /// Predicate::at("document.type", "posts") // -> [at(document.type, "posts")]
    /// ```
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::At {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Render in the backend's predicate syntax
    pub fn to_query(&self) -> String {
        match self {
            Predicate::At { path, value } => {
                format!("[at({}, \"{}\")]", path, value.replace('"', "\\\""))
            }
        }
    }
}

/// A document search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub predicates: Vec<Predicate>,

    /// Fields to return, e.g. `posts.title`; empty means all fields
    pub fetch: Vec<String>,

    pub page_size: Option<u32>,

    /// Only return documents positioned after this document id
    pub after: Option<String>,

    /// Ordering expression, e.g. `[document.first_publication_date desc]`
    pub orderings: Option<String>,

    /// Content ref to resolve against; `None` uses the published master ref
    pub reference: Option<String>,
}

impl Query {
    /// All documents of a custom type
    pub fn documents_of_type(doc_type: &str) -> Self {
        Self {
            predicates: vec![Predicate::at("document.type", doc_type)],
            ..Default::default()
        }
    }

    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn fetch<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fetch.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn after(mut self, document_id: impl Into<String>) -> Self {
        self.after = Some(document_id.into());
        self
    }

    pub fn orderings(mut self, orderings: impl Into<String>) -> Self {
        self.orderings = Some(orderings.into());
        self
    }

    pub fn with_ref(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }

    /// Query parameters in the order the backend documents them
    pub fn to_params(&self, reference: &str) -> IndexMap<&'static str, String> {
        let mut params = IndexMap::new();
        params.insert("ref", reference.to_string());

        if !self.predicates.is_empty() {
            let q: String = self.predicates.iter().map(Predicate::to_query).collect();
            params.insert("q", format!("[{}]", q));
        }
        if !self.fetch.is_empty() {
            params.insert("fetch", self.fetch.join(","));
        }
        if let Some(size) = self.page_size {
            params.insert("pageSize", size.to_string());
        }
        if let Some(after) = &self.after {
            params.insert("after", after.clone());
        }
        if let Some(orderings) = &self.orderings {
            params.insert("orderings", orderings.clone());
        }

        params
    }
}

/// Encode parameters as a URL query string
pub fn encode_params<'a, I>(params: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    params
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, encode_value(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Percent-encode a single query-string value
pub fn encode_value(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}

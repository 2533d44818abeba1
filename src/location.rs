//! The one piece of persisted client state: the `poem` query parameter.
//!
//! A `Location` either names a poem (`?poem=<id>`) or is empty, meaning
//! "show a random poem". Ids are percent-encoded on the way out and decoded on
//! the way in, so any id survives a round trip through a URL.

use std::fmt;

use percent_encoding::{NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Query parameter carrying the poem id.
pub const POEM_PARAM: &str = "poem";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    poem: Option<String>,
}

impl Location {
    /// Location without a poem id.
    pub fn random() -> Self {
        Self { poem: None }
    }

    pub fn poem(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            poem: (!id.is_empty()).then_some(id),
        }
    }

    pub fn poem_id(&self) -> Option<&str> {
        self.poem.as_deref()
    }

    /// Read the `poem` parameter from a query string or a full URL.
    ///
    /// Accepts `?poem=12`, `poem=12&x=1` and `http://host/page?poem=12#top`.
    /// An empty value counts as absent; the first occurrence wins.
    pub fn from_query(input: &str) -> Self {
        let query = match input.split_once('?') {
            Some((_, q)) => q,
            None => input,
        };
        let query = query.split('#').next().unwrap_or_default();

        let poem = query
            .split('&')
            .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
            .find(|(key, _)| *key == POEM_PARAM)
            .map(|(_, value)| decode(value))
            .filter(|value| !value.is_empty());
        Self { poem }
    }

    /// Interpret a command-line argument: either a bare id or something that
    /// carries a `poem=` parameter.
    pub fn parse_arg(arg: &str) -> Self {
        let arg = arg.trim();
        if arg.contains(&format!("{POEM_PARAM}=")) {
            Self::from_query(arg)
        } else {
            Self::poem(arg)
        }
    }

    /// `?poem=<id>`, or an empty string for the random location.
    pub fn to_query(&self) -> String {
        match &self.poem {
            Some(id) => format!("?{POEM_PARAM}={}", utf8_percent_encode(id, NON_ALPHANUMERIC)),
            None => String::new(),
        }
    }

    /// Join this location onto a page URL, dropping any query or fragment the
    /// page URL already had.
    pub fn to_url(&self, page_url: &str) -> String {
        let page = page_url
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        format!("{page}{}", self.to_query())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.poem {
            Some(_) => f.write_str(&self.to_query()),
            None => f.write_str("(random)"),
        }
    }
}

fn decode(value: &str) -> String {
    let value = value.replace('+', " ");
    percent_decode_str(&value).decode_utf8_lossy().into_owned()
}

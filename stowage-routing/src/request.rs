//! Page requests and route parameters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

/// Parameters extracted from the matched route, e.g. `id` in `/orders/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteParameters(BTreeMap<String, String>);

impl RouteParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RouteParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A request from one page that led to another page being opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Id of the page that sent the request, if it came from a page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_page_id: Option<String>,
    /// The url that was requested.
    pub target: Url,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl PageRequest {
    pub fn new(target: Url) -> Self {
        Self {
            origin_page_id: None,
            target,
            parameters: BTreeMap::new(),
        }
    }

    pub fn from_page(mut self, page_id: impl Into<String>) -> Self {
        self.origin_page_id = Some(page_id.into());
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

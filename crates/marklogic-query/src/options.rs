//! Request options carried alongside a query.
//!
//! The recognized option names are fixed. Anything else in a configuration
//! object is dropped, with a debug event naming the key.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Result;
use crate::value::Number;

/// Option key to the request parameter it becomes.
static OPTION_PARAMS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("search", "search-option"),
        ("weight", "quality-weight"),
        ("forestNames", "forest-names"),
        ("similarDocs", "return-similar"),
        ("metrics", "return-metrics"),
        ("queryPlan", "return-plan"),
        ("debug", "debug"),
        ("concurrencyLevel", "concurrency-level"),
        ("categories", "categories"),
        ("txid", "txid"),
    ])
});

/// Returns `true` if `key` is a recognized option.
pub fn is_option(key: &str) -> bool {
    OPTION_PARAMS.contains_key(key)
}

/// Options that tune how the server runs a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithOptions {
    /// Search options such as `filtered` or `unfaceted`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "one_or_many"
    )]
    pub search: Option<Vec<String>>,
    /// Quality weight for relevance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Number>,
    /// Forests to search.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "one_or_many"
    )]
    pub forest_names: Option<Vec<String>>,
    /// Whether to return similar documents for each result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similar_docs: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_plan: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency_level: Option<u32>,
    /// Document categories to return: `content`, `metadata`, and so on.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "one_or_many"
    )]
    pub categories: Option<Vec<String>>,
    /// Transaction to run the query in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txid: Option<String>,
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => None,
        Some(OneOrMany::One(s)) => Some(vec![s]),
        Some(OneOrMany::Many(v)) => Some(v),
    })
}

impl WithOptions {
    /// Reads options from a configuration object, dropping unrecognized
    /// keys.
    pub fn from_config(config: Map<String, Value>) -> Result<WithOptions> {
        let mut known = Map::new();
        for (key, value) in config {
            if is_option(&key) {
                known.insert(key, value);
            } else {
                debug!(key = %key, "dropping unrecognized option");
            }
        }
        Ok(serde_json::from_value(Value::Object(known))?)
    }

    /// Returns `true` if no option is set.
    pub fn is_empty(&self) -> bool {
        *self == WithOptions::default()
    }

    /// Returns the options as request parameters, keyed by parameter name.
    pub fn wire_params(&self) -> Result<Map<String, Value>> {
        let mut params = Map::new();
        if let Value::Object(fields) = serde_json::to_value(self)? {
            for (key, value) in fields {
                if let Some(param) = OPTION_PARAMS.get(key.as_str()) {
                    params.insert((*param).to_string(), value);
                }
            }
        }
        Ok(params)
    }
}

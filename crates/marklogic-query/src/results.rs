//! Result shaping: server-side transforms, document extracts, and snippets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::arg::{as_args, Arg};
use crate::error::{QueryError, Result};
use crate::module::LibraryRoot;

/// A server-side transform applied to each result document.
///
/// Written as `[name]` or `[name, params]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<Value>", try_from = "Vec<Value>")]
pub struct Transform {
    pub name: String,
    pub params: Option<Map<String, Value>>,
}

impl From<Transform> for Vec<Value> {
    fn from(transform: Transform) -> Self {
        let mut items = vec![Value::String(transform.name)];
        if let Some(params) = transform.params {
            items.push(Value::Object(params));
        }
        items
    }
}

impl TryFrom<Vec<Value>> for Transform {
    type Error = String;

    fn try_from(items: Vec<Value>) -> std::result::Result<Self, Self::Error> {
        let mut items = items.into_iter();
        let name = match items.next() {
            Some(Value::String(name)) => name,
            other => return Err(format!("transform name must be a string, got {other:?}")),
        };
        let params = match items.next() {
            None | Some(Value::Null) => None,
            Some(Value::Object(params)) => Some(params),
            Some(other) => {
                return Err(format!(
                    "transform parameters must be an object, got {other}"
                ))
            }
        };
        if items.next().is_some() {
            return Err("transform takes a name and optional parameters".to_string());
        }
        Ok(Transform { name, params })
    }
}

/// Names an installed transform and its parameters.
pub fn transform(name: &str, params: Option<Map<String, Value>>) -> Result<Transform> {
    if name.is_empty() {
        return Err(QueryError::arity("transform", "missing transform name"));
    }
    Ok(Transform {
        name: name.to_string(),
        params,
    })
}

/// Which parts of a document an extract returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractSelection {
    Include,
    IncludeWithAncestors,
    Exclude,
    All,
}

/// Paths to extract from each result document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Extract {
    pub extract_path: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<ExtractSelection>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ExtractConfig {
    paths: OneOrMany,
    #[serde(default)]
    namespaces: Option<BTreeMap<String, String>>,
    #[serde(default)]
    selected: Option<ExtractSelection>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// Extracts paths from each result document.
///
/// Takes the paths as strings, or one configuration object with `paths`,
/// `namespaces`, and `selected`.
pub fn extract(args: Vec<Arg>) -> Result<Extract> {
    let args = as_args(args);
    match <[Arg; 1]>::try_from(args) {
        Ok([Arg::Json(config)]) => {
            let config: ExtractConfig = serde_json::from_value(config)?;
            let extract_path = match config.paths {
                OneOrMany::One(path) => vec![path],
                OneOrMany::Many(paths) => paths,
            };
            Ok(Extract {
                extract_path,
                namespaces: config.namespaces,
                selected: config.selected,
            })
        }
        Ok([single]) => Ok(Extract {
            extract_path: vec![single.into_text("extract")?],
            namespaces: None,
            selected: None,
        }),
        Err(args) if args.is_empty() => Err(QueryError::arity("extract", "missing paths")),
        Err(args) => Ok(Extract {
            extract_path: args
                .into_iter()
                .map(|arg| arg.into_text("extract"))
                .collect::<Result<_>>()?,
            namespaces: None,
            selected: None,
        }),
    }
}

/// How each result is summarized.
///
/// `apply` names a built-in snippeter or a function in a custom library;
/// any other keys are snippeter options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub apply: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ns: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<String>,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

fn builtin_snippeter(name: &str) -> Option<&'static str> {
    match name {
        "empty" => Some("empty-snippet"),
        "metadata" => Some("metadata-snippet"),
        "snippet" => Some("snippet"),
        _ => None,
    }
}

/// Summarizes each result.
///
/// With no arguments the default snippeter is used. A string is `empty`,
/// `metadata`, `snippet`, or the file name of a custom snippet library. An
/// options object sets snippeter options such as `preferred-matches`.
pub fn snippet(args: Vec<Arg>) -> Result<Snippet> {
    let mut snippet = Snippet {
        apply: "snippet".to_string(),
        ns: None,
        at: None,
        options: Map::new(),
    };
    let mut named = false;
    for arg in as_args(args) {
        match arg {
            Arg::Text(name) if !named => {
                named = true;
                if let Some(builtin) = builtin_snippeter(&name) {
                    snippet.apply = builtin.to_string();
                } else {
                    let module = LibraryRoot::Snippet.reference("snippet", &name)?;
                    snippet.apply = module.apply;
                    snippet.ns = Some(module.ns);
                    snippet.at = Some(module.at);
                }
            }
            Arg::Json(Value::Object(options)) => {
                for (key, value) in options {
                    match value {
                        Value::String(v) if key == "apply" => snippet.apply = v,
                        Value::String(v) if key == "ns" => snippet.ns = Some(v),
                        Value::String(v) if key == "at" => snippet.at = Some(v),
                        value => {
                            snippet.options.insert(key, value);
                        }
                    }
                }
            }
            other => return Err(QueryError::unrecognized("snippet", other)),
        }
    }
    Ok(snippet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use serde_json::json;

    #[test]
    fn transform_array_form() {
        let t = transform("ex", None).unwrap();
        assert_eq!(serde_json::to_value(&t).unwrap(), json!(["ex"]));

        let params = json!({"a": 1}).as_object().cloned();
        let t = transform("ex", params).unwrap();
        let encoded = serde_json::to_value(&t).unwrap();
        assert_eq!(encoded, json!(["ex", {"a": 1}]));
        let decoded: Transform = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, t);

        assert!(transform("", None).is_err());
        assert!(serde_json::from_value::<Transform>(json!([1])).is_err());
    }

    #[test]
    fn extract_from_paths() {
        let e = extract(args!["/title", "/author"]).unwrap();
        assert_eq!(
            serde_json::to_value(&e).unwrap(),
            json!({"extract-path": ["/title", "/author"]})
        );
        assert_eq!(extract(args![vec!["/title", "/author"]]).unwrap(), e);
    }

    #[test]
    fn extract_from_config() {
        let e = extract(args![json!({
            "paths": "/ex:title",
            "namespaces": {"ex": "http://example.com"},
            "selected": "include-with-ancestors"
        })])
        .unwrap();
        assert_eq!(
            serde_json::to_value(&e).unwrap(),
            json!({
                "extract-path": ["/ex:title"],
                "namespaces": {"ex": "http://example.com"},
                "selected": "include-with-ancestors"
            })
        );
        assert!(extract(args![json!({"paths": [], "bogus": 1})]).is_err());
        assert!(extract(args![]).is_err());
    }

    #[test]
    fn builtin_snippets() {
        assert_eq!(snippet(args![]).unwrap().apply, "snippet");
        assert_eq!(snippet(args!["empty"]).unwrap().apply, "empty-snippet");
        assert_eq!(snippet(args!["metadata"]).unwrap().apply, "metadata-snippet");
    }

    #[test]
    fn custom_snippet_library() {
        let s = snippet(args!["short.xqy", json!({"max-matches": 2})]).unwrap();
        assert_eq!(
            serde_json::to_value(&s).unwrap(),
            json!({
                "apply": "snippet",
                "ns": "http://marklogic.com/snippet/custom/short",
                "at": "/ext/marklogic/snippet/custom/short.xqy",
                "max-matches": 2
            })
        );
        let decoded: Snippet = serde_json::from_value(serde_json::to_value(&s).unwrap()).unwrap();
        assert_eq!(decoded, s);
    }

    #[test]
    fn custom_snippet_needs_extension() {
        assert!(matches!(
            snippet(args!["short"]).unwrap_err(),
            QueryError::MissingModuleExtension(_)
        ));
    }
}

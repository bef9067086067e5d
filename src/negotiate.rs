//! Content negotiation: request normalisation and body parsing.
//!
//! The dispatcher normalises the path and content type, resolves the route,
//! and only then asks [`negotiate`] for the body. A `GET` never reads its
//! body; its parameters come from the query string.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::DispatchError;
use crate::request::Request;

// ── Normalisation ─────────────────────────────────────────────────────────────

/// Trims `raw`, drops one trailing slash and adds the leading one.
///
/// `""` and `"/"` both normalise to `""`. Case is preserved; the route table
/// folds case itself so a pattern suffix keeps the client's spelling.
pub fn normalize_path(raw: &str) -> String {
    let path = raw.trim();
    if path.is_empty() || path == "/" {
        return String::new();
    }
    let path = path.strip_suffix('/').unwrap_or(path);
    if path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{path}")
    }
}

/// Declared body type, reduced by substring containment.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MediaType {
    Json,
    Csv,
    /// `text/html`, `text/plain`, and anything unrecognised.
    Text,
    Multipart,
    FormUrlEncoded,
}

impl MediaType {
    /// Classifies a raw `Content-Type` header. Absent or unknown is [`Text`](Self::Text).
    pub fn from_header(raw: Option<&str>) -> Self {
        let Some(raw) = raw else { return Self::Text };
        let raw = raw.to_ascii_lowercase();
        if raw.contains("json") {
            Self::Json
        } else if raw.contains("csv") {
            Self::Csv
        } else if raw.contains("multipart/form-data") {
            Self::Multipart
        } else if raw.contains("x-www-form-urlencoded") {
            Self::FormUrlEncoded
        } else {
            Self::Text
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json           => "application/json",
            Self::Csv            => "text/csv",
            Self::Text           => "text/html",
            Self::Multipart      => "multipart/form-data",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Parsed bodies ─────────────────────────────────────────────────────────────

/// Query or form parameters as a multi-map, in first-seen order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params {
    values: IndexMap<String, Vec<String>>,
}

impl Params {
    /// Parses `a=1&b=2&a=3`.
    pub fn parse(encoded: &str) -> Result<Self, serde_urlencoded::de::Error> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(encoded)?;
        let mut values: IndexMap<String, Vec<String>> = IndexMap::new();
        for (name, value) in pairs {
            values.entry(name).or_default().push(value);
        }
        Ok(Self { values })
    }

    /// First value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name)?.first().map(String::as_str)
    }

    pub fn get_all(&self, name: &str) -> &[String] {
        self.values.get(name).map_or(&[], Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// CSV rows under a required header row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CsvTable {
    headers: IndexMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn parse(body: &[u8]) -> Result<Self, csv::Error> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(body);
        let headers = reader.headers()?
            .iter()
            .enumerate()
            .map(|(index, name)| (name.to_owned(), index))
            .collect();
        let rows = reader.records()
            .map(|row| row.map(|r| r.iter().map(str::to_owned).collect::<Vec<_>>()))
            .collect::<Result<_, _>>()?;
        Ok(Self { headers, rows })
    }

    /// Header name → column index.
    pub fn headers(&self) -> &IndexMap<String, usize> {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }
}

/// What negotiation produced, exactly one per request.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    /// Query parameters (`GET`) or a url-encoded form.
    Params(Params),
    /// A JSON object or array.
    Json(Value),
    Csv(CsvTable),
    Text(String),
}

/// Reads the body of `request` the way its verb and media type call for.
///
/// `method` is the normalised verb and `path` the normalised path, used in
/// error messages.
pub fn negotiate(
    method: &str,
    media: MediaType,
    request: &Request,
    path: &str,
) -> Result<Body, DispatchError> {
    let invalid = |reason: String| DispatchError::InvalidBodyFormat { path: path.to_owned(), reason };

    match method {
        "GET" => {
            let params = Params::parse(request.query().unwrap_or_default())
                .map_err(|e| invalid(e.to_string()))?;
            Ok(Body::Params(params))
        }
        "POST" | "DELETE" => match media {
            MediaType::Json => {
                let value: Value = serde_json::from_slice(request.body())
                    .map_err(|e| invalid(e.to_string()))?;
                if value.is_object() || value.is_array() {
                    Ok(Body::Json(value))
                } else {
                    Err(invalid("expected a JSON object or array".to_owned()))
                }
            }
            MediaType::Csv => CsvTable::parse(request.body())
                .map(Body::Csv)
                .map_err(|e| invalid(e.to_string())),
            MediaType::FormUrlEncoded => {
                let text = std::str::from_utf8(request.body()).map_err(|e| invalid(e.to_string()))?;
                Params::parse(text)
                    .map(Body::Params)
                    .map_err(|e| invalid(e.to_string()))
            }
            MediaType::Text => String::from_utf8(request.body().to_vec())
                .map(Body::Text)
                .map_err(|e| invalid(e.to_string())),
            MediaType::Multipart => Err(DispatchError::UnsupportedContentType {
                path: path.to_owned(),
                content_type: request.content_type().unwrap_or(media.as_str()).to_owned(),
            }),
        },
        other => Err(DispatchError::UnsupportedMethod {
            path: path.to_owned(),
            method: other.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn normalizes_paths() {
        assert_eq!(normalize_path(""), "");
        assert_eq!(normalize_path(" / "), "");
        assert_eq!(normalize_path("/Items/"), "/Items");
        assert_eq!(normalize_path("items/list"), "/items/list");
        assert_eq!(normalize_path("/items//"), "/items/");
    }

    #[test]
    fn media_type_by_substring() {
        assert_eq!(MediaType::from_header(Some("application/json; charset=utf-8")), MediaType::Json);
        assert_eq!(MediaType::from_header(Some("TEXT/CSV")), MediaType::Csv);
        assert_eq!(MediaType::from_header(Some("multipart/form-data; boundary=x")), MediaType::Multipart);
        assert_eq!(
            MediaType::from_header(Some("application/x-www-form-urlencoded")),
            MediaType::FormUrlEncoded
        );
        assert_eq!(MediaType::from_header(Some("application/octet-stream")), MediaType::Text);
        assert_eq!(MediaType::from_header(None), MediaType::Text);
    }

    #[test]
    fn get_reads_query_not_body() {
        let req = Request::new("GET", "/items?limit=10&tag=a&tag=b")
            .with_header("content-type", "application/json")
            .with_body("not json");
        let Body::Params(params) = negotiate("GET", MediaType::Json, &req, "/items").unwrap() else {
            panic!("expected params");
        };
        assert_eq!(params.get("limit"), Some("10"));
        assert_eq!(params.get_all("tag"), ["a", "b"]);
        assert!(params.get_all("none").is_empty());
    }

    #[test]
    fn post_json_keeps_arrays_and_objects() {
        let req = Request::new("POST", "/items").with_body("[1,2,3]");
        let body = negotiate("POST", MediaType::Json, &req, "/items").unwrap();
        assert_eq!(body, Body::Json(json!([1, 2, 3])));
    }

    #[test]
    fn json_scalar_is_invalid_body() {
        let req = Request::new("POST", "/items").with_body("42");
        let err = negotiate("POST", MediaType::Json, &req, "/items").unwrap_err();
        assert!(matches!(err, DispatchError::InvalidBodyFormat { .. }));

        let req = Request::new("DELETE", "/items").with_body("{oops");
        let err = negotiate("DELETE", MediaType::Json, &req, "/items").unwrap_err();
        assert!(matches!(err, DispatchError::InvalidBodyFormat { .. }));
    }

    #[test]
    fn csv_keeps_header_index() {
        let req = Request::new("POST", "/import").with_body("id,name\n1,widget\n2,gadget\n");
        let Body::Csv(table) = negotiate("POST", MediaType::Csv, &req, "/import").unwrap() else {
            panic!("expected csv");
        };
        assert_eq!(table.headers().get("name"), Some(&1));
        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.rows()[1][1], "gadget");
    }

    #[test]
    fn text_and_form_bodies() {
        let req = Request::new("POST", "/note").with_body("hello");
        assert_eq!(negotiate("POST", MediaType::Text, &req, "/note").unwrap(), Body::Text("hello".into()));

        let req = Request::new("POST", "/login").with_body("user=ann&remember=on");
        let Body::Params(form) = negotiate("POST", MediaType::FormUrlEncoded, &req, "/login").unwrap() else {
            panic!("expected form");
        };
        assert_eq!(form.get("user"), Some("ann"));
    }

    #[test]
    fn multipart_and_other_verbs_are_rejected() {
        let req = Request::new("POST", "/upload").with_header("content-type", "multipart/form-data; boundary=z");
        let err = negotiate("POST", MediaType::Multipart, &req, "/upload").unwrap_err();
        assert!(matches!(err, DispatchError::UnsupportedContentType { .. }));

        let req = Request::new("PUT", "/items");
        let err = negotiate("PUT", MediaType::Json, &req, "/items").unwrap_err();
        assert!(matches!(err, DispatchError::UnsupportedMethod { ref method, .. } if method == "PUT"));
    }
}

//! Message lookup for error and status text.
//!
//! The dispatcher never formats user-facing text itself. It hands a message
//! code plus positional arguments to a [`Localizer`] and writes whatever comes
//! back. [`Messages`] is the stock implementation: one catalogue per language,
//! `{0}`, `{1}`… substituted positionally, and the code itself echoed back
//! when no pattern is known.

use std::collections::HashMap;

use crate::config::Settings;
use crate::error::codes;

/// Resolves a message code and its arguments to display text.
pub trait Localizer: Send + Sync + 'static {
    fn message(&self, code: &str, args: &[String]) -> String;
}

impl<F> Localizer for F
where
    F: Fn(&str, &[String]) -> String + Send + Sync + 'static,
{
    fn message(&self, code: &str, args: &[String]) -> String {
        self(code, args)
    }
}

const ENGLISH: &[(&str, &str)] = &[
    (codes::PATH,          "Service not found : {0}"),
    (codes::HTTP_METHOD,   "{0} : http method {1} is not valid, expected {2}"),
    (codes::UNAUTHORIZED,  "Unauthorized access : {0}"),
    (codes::CONTENT,       "{0} : content type {1} is not supported"),
    (codes::JSON,          "{0} : request body format error : {1}"),
    (codes::JSON_TYPE,     "{0} : json object or array expected"),
    (codes::JSON_OBJECT,   "{0} : json object expected"),
    (codes::RESPONSE_TYPE, "{0} : response type is not implemented"),
    (codes::METHOD,        "{0} : http method {1} is not supported"),
];

/// Per-language message catalogues.
#[derive(Clone, Debug)]
pub struct Messages {
    language: String,
    catalogues: HashMap<String, HashMap<String, String>>,
}

impl Messages {
    /// The built-in English catalogue, with `en` as the active language.
    pub fn english() -> Self {
        let en = ENGLISH.iter()
            .map(|(code, pattern)| ((*code).to_owned(), (*pattern).to_owned()))
            .collect();
        Self {
            language: "en".to_owned(),
            catalogues: HashMap::from([("en".to_owned(), en)]),
        }
    }

    /// Built-in catalogue overlaid with the `[messages.<lang>]` tables from
    /// settings, using the configured language.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut messages = Self::english();
        for (lang, table) in &settings.messages {
            let catalogue = messages.catalogues.entry(lang.to_ascii_lowercase()).or_default();
            catalogue.extend(table.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        messages.language = settings.language.to_ascii_lowercase();
        messages
    }

    /// Adds or replaces a pattern in the active language.
    pub fn with_message(mut self, code: &str, pattern: &str) -> Self {
        self.catalogues
            .entry(self.language.clone())
            .or_default()
            .insert(code.to_owned(), pattern.to_owned());
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Raw pattern for `code` in `lang`, falling back to the active language.
    pub fn pattern(&self, lang: Option<&str>, code: &str) -> Option<&str> {
        let lang = lang.unwrap_or(&self.language);
        self.catalogues.get(lang)?.get(code).map(String::as_str)
    }
}

impl Localizer for Messages {
    fn message(&self, code: &str, args: &[String]) -> String {
        match self.pattern(None, code).or_else(|| self.pattern(Some("en"), code)) {
            Some(pattern) => format_positional(pattern, args),
            None => code.to_owned(),
        }
    }
}

/// Substitutes `{n}` with `args[n]`. Unknown indices are left as written.
pub fn format_positional(pattern: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let arg = after.find('}').and_then(|close| {
            let index: usize = after[..close].trim().parse().ok()?;
            Some((args.get(index)?, close))
        });
        match arg {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

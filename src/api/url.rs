//! URL templating for endpoint path templates
//!
//! Resolves `${name}` placeholders from named parameters, appends leftovers
//! as a query string, and turns positional parameters into path segments.

use serde_json::Value;

/// Parameters accepted by an endpoint call
///
/// Named parameters fill `${name}` placeholders in the path template, with
/// any leftover pairs appended as a query string. List parameters are
/// appended to the URL as sequential path segments instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// Key-value pairs, kept in insertion order
    Named(Vec<(String, Value)>),
    /// Positional path segments
    List(Vec<Value>),
}

impl Params {
    /// Builds named parameters from `(key, value)` pairs
    ///
    /// # Example
    /// ```
    /// use cachecall::Params;
    ///
    /// let params = Params::named([("id", 123)]);
    /// ```
    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Params::Named(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Builds positional parameters from a sequence of values
    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Params::List(values.into_iter().map(Into::into).collect())
    }
}

/// Renders a parameter value without JSON string quoting
///
/// Strings render bare, arrays join their rendered elements with commas,
/// everything else uses its JSON form.
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(format_value)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

/// Renders `params` as a URL suffix
///
/// List parameters become `/a/b` path segments, named parameters become a
/// `?k=v&k2=v2` query string, and empty parameters render as nothing.
pub fn format_params_to_string(params: &Params) -> String {
    match params {
        Params::List(values) if !values.is_empty() => {
            let segments = values.iter().map(format_value).collect::<Vec<_>>();
            format!("/{}", segments.join("/"))
        }
        Params::Named(pairs) if !pairs.is_empty() => {
            let query = pairs
                .iter()
                .map(|(key, value)| format!("{}={}", key, format_value(value)))
                .collect::<Vec<_>>()
                .join("&");
            format!("?{}", query)
        }
        _ => String::new(),
    }
}

/// Substitutes `${key}` placeholders in `template` from `pairs`
///
/// Pairs without a matching placeholder end up in the query string, in their
/// original order.
pub fn replace_path_params(template: &str, pairs: &[(String, Value)]) -> String {
    let mut resolved = template.to_string();
    let mut query = Vec::new();

    for (key, value) in pairs {
        let placeholder = format!("${{{}}}", key);
        if resolved.contains(&placeholder) {
            resolved = resolved.replacen(&placeholder, &format_value(value), 1);
        } else {
            query.push((key.clone(), value.clone()));
        }
    }

    format!(
        "{}{}",
        resolved,
        format_params_to_string(&Params::Named(query))
    )
}

/// Resolves the final URL for `template` given optional call parameters
///
/// Named parameters trigger placeholder substitution when the template
/// contains `${`; otherwise the rendered parameter suffix is appended as-is.
pub fn format_url_with_params(template: &str, params: Option<&Params>) -> String {
    match params {
        Some(Params::Named(pairs)) if template.contains("${") => {
            replace_path_params(template, pairs)
        }
        Some(params) => format!("{}{}", template, format_params_to_string(params)),
        None => template.to_string(),
    }
}

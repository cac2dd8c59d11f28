use url::Url;

use crate::ObjectMap;

/// Window inner size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 768.0,
        }
    }
}

/// Query-string pairs of `url`, or `None` when it has no query.
///
/// Values are kept as strings; a key without `=` maps to an empty string.
pub(crate) fn parse_params(url: &str) -> Option<ObjectMap> {
    let query = match Url::parse(url) {
        Ok(parsed) => parsed.query().map(str::to_owned),
        // Relative URLs such as `/page?x=1` are not parseable on their own.
        Err(_) => url
            .split_once('?')
            .map(|(_, query)| query.split('#').next().unwrap_or_default().to_owned()),
    }?;
    if query.is_empty() {
        return None;
    }

    let params = url::form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect::<ObjectMap>();
    Some(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn params_from_absolute_and_relative_urls() {
        let params = parse_params("https://example.com/p?page=2&q=a%20b&flag#top");
        let params = params.unwrap_or_default();
        assert_eq!(params.get_str("page"), Some("2"));
        assert_eq!(params.get_str("q"), Some("a b"));
        assert_eq!(params.get("flag"), Some(&Value::from("")));
        assert_eq!(params.len(), 3);

        let relative = parse_params("/list?sort=desc").unwrap_or_default();
        assert_eq!(relative.get_str("sort"), Some("desc"));
    }

    #[test]
    fn missing_query_is_none() {
        assert_eq!(parse_params("https://example.com/"), None);
        assert_eq!(parse_params("https://example.com/?"), None);
        assert_eq!(parse_params("about:blank"), None);
    }
}

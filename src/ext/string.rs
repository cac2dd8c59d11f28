use std::sync::OnceLock;

use fancy_regex::{Captures, Regex};

use crate::ext::ObjectMap;
use crate::{Error, Result, Value};

const STEM_SUFFIXES: &[&str] = &[
    "able", "ac", "acity", "ocity", "ade", "age", "aholic", "oholic", "al", "algia", "an", "ian",
    "ance", "ant", "ar", "ard", "arian", "arium", "orium", "ary", "ate", "ation", "ative", "cide",
    "cracy", "crat", "cule", "cy", "cycle", "dom", "dox", "ectomy", "ed", "ee", "eer", "emia",
    "en", "ence", "ency", "ent", "er", "ern", "escence", "ese", "esque", "ess", "est", "etic",
    "ette", "ful", "fy", "gam", "gamy", "gon", "gonic", "hood", "ial", "ian", "iasis", "iatric",
    "ible", "ic", "ical", "ile", "ily", "ine", "ing", "ion", "ious", "ish", "ism", "ist", "ite",
    "itis", "ity", "ive", "ization", "ize", "less", "let", "like", "ling", "loger", "log", "ly",
    "ment", "ness", "oid", "ology", "oma", "onym", "opia", "opsy", "or", "ory", "osis", "ostomy",
    "otomy", "ous", "path", "pathy", "phile", "phobia", "phone", "phyte", "plegia", "plegic",
    "pnea", "scopy", "scope", "scribe", "script", "sect", "ship", "sion", "some", "sophy",
    "sophic", "th", "tion", "tome", "tomy", "trophy", "tude", "ty", "ular", "uous", "ure", "ward",
    "ware", "wise", "y",
];

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn dash_case_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"([A-Z])|_(.)")
}

fn snake_case_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"([A-Z])|-(.)")
}

fn camel_case_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"[-_](.)")
}

fn calls_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"^(.*?)\((.*)\)$")
}

fn stem_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!(r"^(.+)(?:{})s?$", STEM_SUFFIXES.join("|"));
        Regex::new(&pattern).ok()
    })
    .as_ref()
}

fn compile(method: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|err| Error::invalid_argument(method, err.to_string()))
}

fn separated_case(text: &str, re: Option<&Regex>, separator: char) -> String {
    let Some(re) = re else {
        return text.to_string();
    };
    re.replace_all(text, |caps: &Captures<'_>| {
        let offset = caps.get(0).map_or(0, |m| m.start());
        let letter = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map_or(String::new(), |m| m.as_str().to_lowercase());
        if offset > 0 {
            format!("{separator}{letter}")
        } else {
            letter
        }
    })
    .into_owned()
}

fn numeric_prefix(text: &str, allow_fraction: bool) -> &str {
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut has_digits = end > digits_start;
    if allow_fraction {
        if end < bytes.len() && bytes[end] == b'.' {
            let frac_start = end + 1;
            let mut frac_end = frac_start;
            while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
                frac_end += 1;
            }
            if has_digits || frac_end > frac_start {
                has_digits = true;
                end = frac_end;
            }
        }
        if has_digits && end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
            let mut exp_end = end + 1;
            if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
                exp_end += 1;
            }
            let exp_digits = exp_end;
            while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
                exp_end += 1;
            }
            if exp_end > exp_digits {
                end = exp_end;
            }
        }
    }
    if has_digits { &text[..end] } else { "" }
}

pub trait StrExt {
    /// Leading integer, ignoring surrounding whitespace and trailing garbage.
    fn to_int(&self) -> Option<i64>;
    /// Leading decimal number, ignoring trailing garbage.
    fn to_number(&self) -> Option<f64>;
    fn to_dash_case(&self) -> String;
    fn to_snake_case(&self) -> String;
    fn to_camel_case(&self) -> String;
    fn times(&self, n: usize) -> String;
    /// `#rrggbb` or `#rgb` to its three channels.
    fn color_hex_to_dec(&self) -> Option<[u8; 3]>;
    /// Splits `k=v&k=v` style text into an ordered map.
    fn structure(&self, pairs_delim: &str, pair_delim: &str) -> ObjectMap;
    /// Splits `name(value) name(value)` text into an ordered map.
    fn calls_object(&self, delim: &str) -> ObjectMap;
    /// First capture group of `pattern`, or the whole match when it has none.
    fn extract(&self, pattern: &str) -> Result<Option<String>>;
    fn matches_pattern(&self, pattern: &str) -> Result<bool>;
    fn stem(&self) -> Option<String>;
    fn to_value(&self) -> Result<Value>;
}

impl StrExt for str {
    fn to_int(&self) -> Option<i64> {
        numeric_prefix(self.trim_start(), false).parse().ok()
    }

    fn to_number(&self) -> Option<f64> {
        numeric_prefix(self.trim_start(), true).parse().ok()
    }

    fn to_dash_case(&self) -> String {
        separated_case(self, dash_case_regex(), '-')
    }

    fn to_snake_case(&self) -> String {
        separated_case(self, snake_case_regex(), '_')
    }

    fn to_camel_case(&self) -> String {
        let Some(re) = camel_case_regex() else {
            return self.to_string();
        };
        re.replace_all(self, |caps: &Captures<'_>| {
                caps.get(1)
                    .map_or(String::new(), |m| m.as_str().to_uppercase())
            })
            .into_owned()
    }

    fn times(&self, n: usize) -> String {
        self.repeat(n)
    }

    fn color_hex_to_dec(&self) -> Option<[u8; 3]> {
        let hex = self.strip_prefix('#').unwrap_or(self);
        let expanded = match hex.len() {
            3 => hex.chars().flat_map(|ch| [ch, ch]).collect::<String>(),
            6 => hex.to_string(),
            _ => return None,
        };
        let channel = |idx: usize| u8::from_str_radix(expanded.get(idx..idx + 2)?, 16).ok();
        Some([channel(0)?, channel(2)?, channel(4)?])
    }

    fn structure(&self, pairs_delim: &str, pair_delim: &str) -> ObjectMap {
        let mut out = ObjectMap::new();
        if self.is_empty() {
            return out;
        }
        for pair in self.split(pairs_delim) {
            match pair.split_once(pair_delim) {
                Some((key, value)) => out.insert(key, value),
                None => out.insert(pair, Value::Undefined),
            };
        }
        out
    }

    fn calls_object(&self, delim: &str) -> ObjectMap {
        let mut out = ObjectMap::new();
        if self.trim().is_empty() {
            return out;
        }
        for call in self.split(delim) {
            let Some(re) = calls_regex() else {
                break;
            };
            if let Ok(Some(caps)) = re.captures(call.trim()) {
                let name = caps.get(1).map_or("", |m| m.as_str());
                let value = caps.get(2).map_or("", |m| m.as_str());
                out.insert(name, value);
            }
        }
        out
    }

    fn extract(&self, pattern: &str) -> Result<Option<String>> {
        let re = compile("extract", pattern)?;
        let caps = re
            .captures(self)
            .map_err(|err| Error::invalid_argument("extract", err.to_string()))?;
        Ok(caps.and_then(|caps| {
            caps.get(1)
                .or_else(|| caps.get(0))
                .map(|m| m.as_str().to_string())
        }))
    }

    fn matches_pattern(&self, pattern: &str) -> Result<bool> {
        compile("matches", pattern)?
            .is_match(self)
            .map_err(|err| Error::invalid_argument("matches", err.to_string()))
    }

    fn stem(&self) -> Option<String> {
        let caps = stem_regex()?.captures(self).ok()??;
        caps.get(1).map(|m| m.as_str().to_string())
    }

    fn to_value(&self) -> Result<Value> {
        let json: serde_json::Value = serde_json::from_str(self)
            .map_err(|err| Error::invalid_argument("to_value", err.to_string()))?;
        Ok(Value::from_json(json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_prefixes_parse_like_loose_number_reads() {
        assert_eq!("12px".to_int(), Some(12));
        assert_eq!("  -3.7em".to_int(), Some(-3));
        assert_eq!("auto".to_int(), None);
        assert_eq!("1.5e2x".to_number(), Some(150.0));
        assert_eq!(".5".to_number(), Some(0.5));
        assert_eq!("".to_number(), None);
    }

    #[test]
    fn case_conversions() {
        assert_eq!("backgroundColor".to_dash_case(), "background-color");
        assert_eq!("margin_top".to_dash_case(), "margin-top");
        assert_eq!("Border".to_dash_case(), "border");
        assert_eq!("borderTopWidth".to_snake_case(), "border_top_width");
        assert_eq!("z-index".to_camel_case(), "zIndex");
        assert_eq!("box_shadow".to_camel_case(), "boxShadow");
    }

    #[test]
    fn structure_splits_pairs_in_order() {
        let map = "q=rust&page=2&flag".structure("&", "=");
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["q", "page", "flag"]);
        assert_eq!(map.get_str("page"), Some("2"));
        assert_eq!(map.get("flag"), Some(&Value::Undefined));
        assert!("".structure("&", "=").is_empty());
    }

    #[test]
    fn calls_object_reads_function_call_lists() {
        let map = "translateX(10px) rotate(45deg)".calls_object(" ");
        assert_eq!(map.get_str("translateX"), Some("10px"));
        assert_eq!(map.get_str("rotate"), Some("45deg"));
    }

    #[test]
    fn color_and_pattern_helpers() -> Result<()> {
        assert_eq!("#ff8000".color_hex_to_dec(), Some([255, 128, 0]));
        assert_eq!("#fff".color_hex_to_dec(), Some([255, 255, 255]));
        assert_eq!("nope".color_hex_to_dec(), None);
        assert_eq!("id-42".extract(r"id-(\d+)")?, Some("42".to_string()));
        assert!("hello".matches_pattern("^h.*o$")?);
        assert!("x".extract("(").is_err());
        Ok(())
    }

    #[test]
    fn stem_strips_known_suffixes() {
        assert_eq!("hopeful".stem().as_deref(), Some("hope"));
        assert_eq!("running".stem().as_deref(), Some("runn"));
        assert_eq!("x".stem(), None);
    }

    #[test]
    fn to_value_parses_json() -> Result<()> {
        let value = r#"{"a":[1,true,null]}"#.to_value()?;
        let Value::Object(map) = value else {
            panic!("expected object");
        };
        assert_eq!(
            map.get("a"),
            Some(&Value::Array(vec![
                Value::Number(1.0),
                Value::Bool(true),
                Value::Null
            ]))
        );
        Ok(())
    }
}

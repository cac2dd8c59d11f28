use crate::Value;

/// Insertion-ordered string-keyed map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectMap {
    entries: Vec<(String, Value)>,
}

impl ObjectMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replaces the value in place when the key exists, otherwise appends.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.get_mut(&key) {
            return Some(std::mem::replace(slot, value));
        }
        self.entries.push((key, value));
        None
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(name, _)| name == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, value)| value)
    }

    /// Projection onto `keys`; missing keys come back as `Undefined`.
    pub fn only(&self, keys: &[&str]) -> ObjectMap {
        keys.iter()
            .map(|key| {
                (
                    (*key).to_string(),
                    self.get(key).cloned().unwrap_or_default(),
                )
            })
            .collect()
    }

    pub fn has(&self, keys: &[&str]) -> bool {
        keys.iter().all(|key| self.contains_key(key))
    }

    /// Every entry of `self` is present with an equal value in `other`.
    pub fn equals(&self, other: &ObjectMap) -> bool {
        self.iter()
            .all(|(key, value)| other.get(key).is_some_and(|theirs| theirs == value))
    }

    pub fn extend(&mut self, other: &ObjectMap) -> &mut Self {
        for (key, value) in other.iter() {
            self.insert(key, value.clone());
        }
        self
    }

    /// Fills keys that are absent or nullish from `other`.
    pub fn defaults(&mut self, other: &ObjectMap) -> &mut Self {
        for (key, value) in other.iter() {
            if self.get(key).is_none_or(Value::is_nullish) {
                self.insert(key, value.clone());
            }
        }
        self
    }

    pub fn merge_into<'a>(&self, target: &'a mut ObjectMap) -> &'a mut ObjectMap {
        target.extend(self)
    }

    pub fn map_values<F>(&self, mut f: F) -> ObjectMap
    where
        F: FnMut(&Value, &str) -> Value,
    {
        self.iter()
            .map(|(key, value)| (key.to_string(), f(value, key)))
            .collect()
    }

    pub fn map_keys<F>(&self, mut f: F) -> ObjectMap
    where
        F: FnMut(&str) -> String,
    {
        self.iter()
            .map(|(key, value)| (f(key), value.clone()))
            .collect()
    }

    pub fn reduce<A, F>(&self, init: A, mut f: F) -> A
    where
        F: FnMut(A, &Value, &str) -> A,
    {
        self.iter()
            .fold(init, |acc, (key, value)| f(acc, value, key))
    }

    /// Joins entries as `key{pair_delim}value` separated by `pairs_delim`.
    pub fn destructure(&self, pairs_delim: &str, pair_delim: &str) -> String {
        self.iter()
            .map(|(key, value)| format!("{key}{pair_delim}{}", value.to_display_string()))
            .collect::<Vec<_>>()
            .join(pairs_delim)
    }

    /// Renders entries as `key(value)` calls, the inverse of `StrExt::calls_object`.
    pub fn calls_string(&self, delim: &str) -> String {
        self.iter()
            .map(|(key, value)| format!("{key}({})", value.to_display_string()))
            .collect::<Vec<_>>()
            .join(delim)
    }

    pub fn to_cson(&self, depth: usize) -> String {
        let indent = "&nbsp;".repeat(depth * 2);
        let mut out = String::new();
        for (key, value) in self.iter() {
            match value {
                Value::Object(inner) => {
                    out.push_str(&format!("{indent}{key}:<br>"));
                    out.push_str(&inner.to_cson(depth + 1));
                }
                _ => out.push_str(&format!("{indent}{key}: {}<br>", value.to_display_string())),
            }
        }
        out
    }
}

impl<K, V> FromIterator<(K, V)> for ObjectMap
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ObjectMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for ObjectMap {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

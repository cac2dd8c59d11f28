use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{Error, Result, Value};

/// String key to JSON text, like a browser's `localStorage`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Storage {
    entries: BTreeMap<String, String>,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set_item(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_string(), value.into());
    }

    pub fn remove_item(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn save<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        let text = serde_json::to_string(value)
            .map_err(|err| Error::Storage(format!("cannot serialize {key}: {err}")))?;
        self.set_item(key, text);
        Ok(())
    }

    /// `Ok(None)` when the key is absent; an error when the stored text does not parse.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(text) = self.get_item(key) else {
            return Ok(None);
        };
        serde_json::from_str(text)
            .map(Some)
            .map_err(|err| Error::Storage(format!("cannot parse {key}: {err}")))
    }

    pub fn erase(&mut self, key: &str) -> bool {
        self.remove_item(key)
    }

    pub fn save_value(&mut self, key: &str, value: &Value) -> Result<()> {
        let json = value.to_json()?;
        self.save(key, &json)
    }

    pub fn load_value(&self, key: &str) -> Result<Option<Value>> {
        Ok(self
            .load::<serde_json::Value>(key)?
            .map(Value::from_json))
    }
}

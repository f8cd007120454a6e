//! Named fields consumed by prompt parts.
//!
//! [`PromptData`] is an open mapping of JSON values with no schema: any key
//! can be set. An agent either owns its data outright or holds a
//! [`SharedPromptData`] handle that other agents in a pipeline also hold.
//! [`PromptDataBinding`] makes that choice explicit.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::{Arc, PoisonError, RwLock};

/// Open mapping of named prompt fields.
///
/// # Example
///
/// ```
/// use parley::agent::prompt::PromptData;
/// use serde_json::json;
///
/// let mut data = PromptData::new();
/// data.update([("query", json!("rust lifetimes")), ("docs", json!(["a", "b"]))]);
///
/// assert_eq!(data.str("query").unwrap(), "rust lifetimes");
/// assert_eq!(data.list("docs").unwrap().len(), 2);
/// assert!(data.str("missing").is_err());
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct PromptData {
    fields: Map<String, Value>,
}

impl PromptData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object. Anything else is rejected.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(Error::invalid_field("<root>", "an object")),
        }
    }

    /// Set or overwrite every supplied field. Unknown keys are accepted.
    pub fn update<K, V>(&mut self, new_fields: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in new_fields {
            self.fields.insert(key.into(), value.into());
        }
    }

    /// Merge the top-level fields of any serializable struct or map.
    pub fn update_from<T: Serialize>(&mut self, source: &T) -> Result<()> {
        let value = serde_json::to_value(source)
            .map_err(|_| Error::invalid_field("<root>", "serializable"))?;
        match value {
            Value::Object(fields) => {
                self.update(fields);
                Ok(())
            }
            _ => Err(Error::invalid_field("<root>", "an object")),
        }
    }

    /// A fully independent copy. `Value` owns its children, so nothing is
    /// shared with `self` afterwards.
    pub fn deep_copy(&self) -> Self {
        self.clone()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The raw value of a field, or `MissingData` if it is absent.
    pub fn get(&self, key: &str) -> Result<&Value> {
        self.fields.get(key).ok_or_else(|| Error::missing_field(key))
    }

    /// Mutable access to a field, or `MissingData` if it is absent.
    pub fn get_mut(&mut self, key: &str) -> Result<&mut Value> {
        self.fields
            .get_mut(key)
            .ok_or_else(|| Error::missing_field(key))
    }

    pub fn str(&self, key: &str) -> Result<&str> {
        self.get(key)?
            .as_str()
            .ok_or_else(|| Error::invalid_field(key, "a string"))
    }

    pub fn i64(&self, key: &str) -> Result<i64> {
        self.get(key)?
            .as_i64()
            .ok_or_else(|| Error::invalid_field(key, "an integer"))
    }

    pub fn f64(&self, key: &str) -> Result<f64> {
        self.get(key)?
            .as_f64()
            .ok_or_else(|| Error::invalid_field(key, "a number"))
    }

    pub fn bool(&self, key: &str) -> Result<bool> {
        self.get(key)?
            .as_bool()
            .ok_or_else(|| Error::invalid_field(key, "a boolean"))
    }

    pub fn list(&self, key: &str) -> Result<&Vec<Value>> {
        self.get(key)?
            .as_array()
            .ok_or_else(|| Error::invalid_field(key, "a list"))
    }

    /// Deserialize a field into any owned type.
    pub fn parse<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        T::deserialize(self.get(key)?)
            .map_err(|_| Error::invalid_field(key, std::any::type_name::<T>()))
    }
}

impl TryFrom<Value> for PromptData {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for PromptData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut data = PromptData::new();
        data.update(iter);
        data
    }
}

// ── Shared handle ──────────────────────────────────────────────────

/// A prompt-data scratchpad shared by reference.
///
/// Clones point at the same fields: an update made through one handle is
/// visible through every other. Use [`snapshot`](Self::snapshot) to fork an
/// independent copy.
#[derive(Clone, Debug, Default)]
pub struct SharedPromptData {
    inner: Arc<RwLock<PromptData>>,
}

impl SharedPromptData {
    pub fn new(data: PromptData) -> Self {
        Self {
            inner: Arc::new(RwLock::new(data)),
        }
    }

    /// Apply [`PromptData::update`] under the write lock.
    pub fn update<K, V>(&self, new_fields: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.write(|data| data.update(new_fields));
    }

    /// Run `f` with read access to the fields.
    pub fn with<R>(&self, f: impl FnOnce(&PromptData) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Run `f` with write access to the fields.
    pub fn write<R>(&self, f: impl FnOnce(&mut PromptData) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Independent deep copy of the current fields.
    pub fn snapshot(&self) -> PromptData {
        self.with(PromptData::deep_copy)
    }

    /// True when both handles point at the same scratchpad.
    pub fn ptr_eq(&self, other: &SharedPromptData) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<PromptData> for SharedPromptData {
    fn from(data: PromptData) -> Self {
        Self::new(data)
    }
}

// ── Ownership tag ──────────────────────────────────────────────────

/// How an agent holds its prompt data.
#[derive(Clone, Debug)]
pub enum PromptDataBinding {
    /// Data owned by exactly one agent.
    Owned(PromptData),
    /// A scratchpad shared with other holders of the same handle.
    Shared(SharedPromptData),
}

impl PromptDataBinding {
    /// Run `f` against the current fields.
    pub fn with<R>(&self, f: impl FnOnce(&PromptData) -> R) -> R {
        match self {
            PromptDataBinding::Owned(data) => f(data),
            PromptDataBinding::Shared(shared) => shared.with(f),
        }
    }

    /// Apply [`PromptData::update`] to the bound fields.
    pub fn update<K, V>(&mut self, new_fields: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        match self {
            PromptDataBinding::Owned(data) => data.update(new_fields),
            PromptDataBinding::Shared(shared) => shared.update(new_fields),
        }
    }

    /// Independent deep copy of the current fields.
    pub fn snapshot(&self) -> PromptData {
        self.with(PromptData::deep_copy)
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, PromptDataBinding::Shared(_))
    }
}

impl From<PromptData> for PromptDataBinding {
    fn from(data: PromptData) -> Self {
        PromptDataBinding::Owned(data)
    }
}

impl From<SharedPromptData> for PromptDataBinding {
    fn from(shared: SharedPromptData) -> Self {
        PromptDataBinding::Shared(shared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_sets_and_overwrites() {
        let mut data = PromptData::new();
        data.update([("a", json!(1)), ("b", json!("two"))]);
        data.update([("a", json!(10))]);
        assert_eq!(data.i64("a").unwrap(), 10);
        assert_eq!(data.str("b").unwrap(), "two");
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn update_accepts_unknown_keys() {
        let mut data: PromptData = [("known", "x")].into_iter().collect();
        data.update([("anything_goes", json!({"nested": true}))]);
        assert!(data.contains("anything_goes"));
    }

    #[test]
    fn update_from_struct() {
        #[derive(Serialize)]
        struct Fields {
            question: String,
            top_k: u32,
        }
        let mut data = PromptData::new();
        data.update_from(&Fields {
            question: "why".into(),
            top_k: 3,
        })
        .unwrap();
        assert_eq!(data.str("question").unwrap(), "why");
        assert_eq!(data.i64("top_k").unwrap(), 3);
    }

    #[test]
    fn update_from_rejects_non_object() {
        let mut data = PromptData::new();
        assert!(data.update_from(&vec![1, 2, 3]).is_err());
    }

    #[test]
    fn deep_copy_is_independent() {
        let mut original = PromptData::new();
        original.set("docs", json!(["first"]));

        let mut copy = original.deep_copy();
        copy.get_mut("docs")
            .unwrap()
            .as_array_mut()
            .unwrap()
            .push(json!("second"));

        assert_eq!(original.list("docs").unwrap().len(), 1);
        assert_eq!(copy.list("docs").unwrap().len(), 2);
    }

    #[test]
    fn missing_key_fails_loudly() {
        let data = PromptData::new();
        assert!(matches!(data.get("nope"), Err(Error::MissingData(_))));
        assert!(matches!(data.str("nope"), Err(Error::MissingData(_))));
    }

    #[test]
    fn wrong_type_is_invalid_field() {
        let data: PromptData = [("n", json!(5))].into_iter().collect();
        assert!(matches!(data.str("n"), Err(Error::InvalidField { .. })));
        assert!(matches!(data.list("n"), Err(Error::InvalidField { .. })));
        assert_eq!(data.f64("n").unwrap(), 5.0);
    }

    #[test]
    fn parse_typed_field() {
        let data: PromptData = [("tags", json!(["a", "b"]))].into_iter().collect();
        let tags: Vec<String> = data.parse("tags").unwrap();
        assert_eq!(tags, vec!["a", "b"]);
        assert!(data.parse::<u32>("tags").is_err());
    }

    #[test]
    fn from_value_requires_object() {
        assert!(PromptData::from_value(json!({"k": "v"})).is_ok());
        assert!(PromptData::from_value(json!([1])).is_err());
    }

    #[test]
    fn shared_handles_see_each_others_updates() {
        let shared = SharedPromptData::new(PromptData::new());
        let other = shared.clone();
        other.update([("summary", "done")]);

        assert!(shared.ptr_eq(&other));
        assert_eq!(shared.with(|d| d.str("summary").unwrap().to_string()), "done");
    }

    #[test]
    fn snapshot_forks_shared_data() {
        let shared = SharedPromptData::new([("step", 1)].into_iter().collect());
        let mut fork = shared.snapshot();
        fork.set("step", 2);
        assert_eq!(shared.with(|d| d.i64("step").unwrap()), 1);
    }

    #[test]
    fn binding_update_goes_through_shared_handle() {
        let shared = SharedPromptData::default();
        let mut binding = PromptDataBinding::from(shared.clone());
        binding.update([("k", "v")]);
        assert!(binding.is_shared());
        assert!(shared.with(|d| d.contains("k")));
    }
}

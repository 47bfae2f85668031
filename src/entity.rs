use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{HydroShareError, Result};

/// Names starting with this prefix denote entity bookkeeping, not data.
pub const INTERNAL_PREFIX: &str = "_";

pub type Mapping = Map<String, Value>;

/// A record backed by a plain field mapping.
///
/// Data fields live in the mapping and travel over the wire unchanged.
/// Bookkeeping state set under [INTERNAL_PREFIX]-ed names is kept apart
/// and never exported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity {
    fields: Mapping,
    #[serde(skip)]
    internal: Mapping,
}

impl Entity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_mapping(fields: Mapping) -> Self {
        Self {
            fields,
            internal: Mapping::new(),
        }
    }

    /// Value stored under `name`.
    ///
    /// Internal names are never looked up in the mapping.
    pub fn get(&self, name: &str) -> Result<&Value> {
        if is_internal(name) {
            return Err(HydroShareError::InternalAccess(name.to_owned()));
        }
        self.fields
            .get(name)
            .ok_or_else(|| HydroShareError::MissingField(name.to_owned()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Value> {
        if is_internal(name) {
            return Err(HydroShareError::InternalAccess(name.to_owned()));
        }
        self.fields
            .get_mut(name)
            .ok_or_else(|| HydroShareError::MissingField(name.to_owned()))
    }

    /// Insert or overwrite a field. Values are opaque at this level.
    pub fn set<V: Into<Value>>(&mut self, name: &str, value: V) {
        let value = value.into();
        if is_internal(name) {
            log::trace!("Setting internal attribute {}", name);
            self.internal.insert(name.to_owned(), value);
        } else {
            self.fields.insert(name.to_owned(), value);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        !is_internal(name) && self.fields.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        if is_internal(name) {
            self.internal.remove(name)
        } else {
            self.fields.remove(name)
        }
    }

    /// Bookkeeping value previously set under an internal name.
    pub fn internal(&self, name: &str) -> Option<&Value> {
        self.internal.get(name)
    }

    /// The backing mapping itself, as sent to the service.
    pub fn export_mapping(&self) -> &Mapping {
        &self.fields
    }

    pub fn export_mapping_mut(&mut self) -> &mut Mapping {
        &mut self.fields
    }

    /// Swap in a new backing mapping, e.g. after a server round-trip.
    pub fn replace_mapping(&mut self, fields: Mapping) -> Mapping {
        log::debug!(
            "Replacing entity mapping ({} fields -> {} fields)",
            self.fields.len(),
            fields.len()
        );
        std::mem::replace(&mut self.fields, fields)
    }

    pub fn into_mapping(self) -> Mapping {
        self.fields
    }
}

impl From<Mapping> for Entity {
    fn from(fields: Mapping) -> Self {
        Self::from_mapping(fields)
    }
}

fn is_internal(name: &str) -> bool {
    name.starts_with(INTERNAL_PREFIX)
}

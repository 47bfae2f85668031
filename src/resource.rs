use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{Entity, Mapping};
use crate::{HydroShareError, Result};

pub const ID_KEY: &str = "id";
pub const TITLE_KEY: &str = "title";
pub const CREATOR_KEY: &str = "creator";
pub const USER_KEY: &str = "user";
pub const RESOURCE_URI_KEY: &str = "resource_uri";

pub const RESOURCE_FILE_KEY: &str = "resource_file";
pub const FILE_KEY: &str = "file";
pub const FILE_NAME_KEY: &str = "name";
pub const FILE_TYPE_KEY: &str = "content-type";

/// Sub-fields every `resource_file` object must carry.
const RESOURCE_FILE_KEYS: [&str; 3] = [FILE_KEY, FILE_NAME_KEY, FILE_TYPE_KEY];

/// A HydroShare generic resource.
///
/// Dereferences to the underlying [Entity] for untyped field access.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Resource {
    entity: Entity,
}

/// Typed view of the `resource_file` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceFile {
    /// Base64 encoded file content
    pub file: String,
    pub name: String,
    #[serde(rename = "content-type")]
    pub content_type: String,
}

impl Resource {
    /// An empty draft, not yet known to the service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a mapping received from the service.
    ///
    /// Drafts without an `id` are accepted as they are. Otherwise a present
    /// `resource_file` object must carry all of its sub-fields.
    pub fn from_mapping(fields: Mapping) -> Result<Self> {
        let resource = Self {
            entity: Entity::from_mapping(fields),
        };
        resource.validate()?;
        Ok(resource)
    }

    fn validate(&self) -> Result<()> {
        let Some(id) = self.entity.export_mapping().get(ID_KEY) else {
            log::trace!("Skipping validation of unsaved resource");
            return Ok(());
        };
        let file = match self.entity.export_mapping().get(RESOURCE_FILE_KEY) {
            None | Some(Value::Null) => return Ok(()),
            Some(file) => file,
        };

        for key in RESOURCE_FILE_KEYS {
            let present = file
                .as_object()
                .map_or(false, |file| file.contains_key(key));
            if !present {
                return Err(HydroShareError::MalformedResource {
                    id: id_from_value(id),
                    key,
                });
            }
        }
        Ok(())
    }

    pub fn id(&self) -> Option<i64> {
        self.entity
            .export_mapping()
            .get(ID_KEY)
            .and_then(id_from_value)
    }

    pub fn title(&self) -> Result<&str> {
        self.str_field(TITLE_KEY)
    }

    pub fn set_title<S: Into<String>>(&mut self, title: S) {
        self.entity.set(TITLE_KEY, title.into());
    }

    pub fn creator(&self) -> Result<&str> {
        self.str_field(CREATOR_KEY)
    }

    pub fn user(&self) -> Result<&str> {
        self.str_field(USER_KEY)
    }

    pub fn has_resource_file(&self) -> bool {
        matches!(
            self.entity.export_mapping().get(RESOURCE_FILE_KEY),
            Some(Value::Object(_))
        )
    }

    /// The attached file record, if complete.
    pub fn resource_file(&self) -> Result<ResourceFile> {
        let value = self.entity.get(RESOURCE_FILE_KEY)?;
        Ok(ResourceFile::deserialize(value)?)
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn into_entity(self) -> Entity {
        self.entity
    }

    fn str_field(&self, name: &str) -> Result<&str> {
        self.entity.get(name)?.as_str().ok_or_else(|| {
            HydroShareError::Parse(format!("field {name} is not a string"))
        })
    }
}

impl Deref for Resource {
    type Target = Entity;

    fn deref(&self) -> &Self::Target {
        &self.entity
    }
}

impl DerefMut for Resource {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.entity
    }
}

impl<'de> Deserialize<'de> for Resource {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let fields = Mapping::deserialize(deserializer)?;
        Self::from_mapping(fields).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<Value> for Resource {
    type Error = HydroShareError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Self::from_mapping(fields),
            other => Err(HydroShareError::Parse(format!(
                "expected a resource object, got {other}"
            ))),
        }
    }
}

/// Ids arrive as numbers, but some endpoints render them as strings.
pub(crate) fn id_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn mapping(value: Value) -> Mapping {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[rstest]
    #[case(json!({"file": "AAAA", "name": "foo.zip"}), "content-type")]
    #[case(json!({"file": "AAAA", "content-type": "application/zip"}), "name")]
    #[case(json!({"name": "foo.zip", "content-type": "application/zip"}), "file")]
    #[case(json!({}), "file")]
    fn incomplete_resource_file(
        #[case] resource_file: Value,
        #[case] missing: &str,
    ) {
        let fields = mapping(json!({
            "id": 17,
            "title": "t",
            "resource_file": resource_file,
        }));
        match Resource::from_mapping(fields) {
            Err(HydroShareError::MalformedResource { id, key }) => {
                assert_eq!(id, Some(17));
                assert_eq!(key, missing);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[rstest]
    #[case(json!({"id": 1}))]
    #[case(json!({"id": 1, "title": "t", "creator": "/api/v1/user/1/"}))]
    #[case(json!({"anything": [1, 2, 3]}))]
    fn no_resource_file_is_valid(#[case] fields: Value) {
        assert!(Resource::from_mapping(mapping(fields)).is_ok());
    }

    #[test]
    fn drafts_skip_validation() {
        let fields = mapping(json!({
            "title": "draft",
            "resource_file": {"file": "AAAA"},
        }));
        let resource = Resource::from_mapping(fields).unwrap();
        assert_eq!(resource.id(), None);
        assert!(resource.resource_file().is_err());
    }

    #[test]
    fn typed_accessors() {
        let resource = Resource::try_from(json!({
            "id": "5",
            "title": "my new resource",
            "creator": "/api/v1/user/2/",
            "user": "/api/v1/user/2/",
            "resource_file": {
                "file": "dGhpcyBpcyBhIHRlc3QK",
                "name": "foo.txt",
                "content-type": "text/plain",
            },
        }))
        .unwrap();

        assert_eq!(resource.id(), Some(5));
        assert_eq!(resource.title().unwrap(), "my new resource");
        assert_eq!(resource.creator().unwrap(), "/api/v1/user/2/");
        assert_eq!(resource.user().unwrap(), "/api/v1/user/2/");
        assert!(resource.has_resource_file());
        assert_eq!(
            resource.resource_file().unwrap(),
            ResourceFile {
                file: "dGhpcyBpcyBhIHRlc3QK".into(),
                name: "foo.txt".into(),
                content_type: "text/plain".into(),
            }
        );
    }

    #[test]
    fn untyped_access_through_entity() {
        let mut resource = Resource::new();
        resource.set_title("first");
        resource.set("abstract", "about");
        assert_eq!(resource.get("title").unwrap(), &json!("first"));
        assert_eq!(resource.get("abstract").unwrap(), &json!("about"));
        assert!(matches!(
            resource.creator(),
            Err(HydroShareError::MissingField(_))
        ));
    }

    #[test]
    fn deserialization_validates() {
        let err = serde_json::from_value::<Resource>(json!({
            "id": 3,
            "resource_file": {"file": "", "name": "empty.bin"},
        }))
        .unwrap_err();
        assert!(err.to_string().contains("content-type"));

        let resource: Resource =
            serde_json::from_value(json!({"id": 3, "resource_file": null}))
                .unwrap();
        assert!(!resource.has_resource_file());
    }

    #[test]
    fn rejects_non_objects() {
        assert!(matches!(
            Resource::try_from(json!([1, 2])),
            Err(HydroShareError::Parse(_))
        ));
    }
}

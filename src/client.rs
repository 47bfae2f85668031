use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::entity::Mapping;
use crate::resource::{
    id_from_value, Resource, CREATOR_KEY, ID_KEY, RESOURCE_URI_KEY, USER_KEY,
};
use crate::transport::{HttpTransport, Transport};
use crate::{HydroShareError, Result};

pub const USER_ENDPOINT: &str = "user/";
pub const RESOURCE_ENDPOINT: &str = "resource/";

const OBJECTS_KEY: &str = "objects";

/// The account a client is authenticated as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub resource_uri: String,
    #[serde(default)]
    pub username: String,
    #[serde(flatten)]
    pub extra: Mapping,
}

/// Client of a HydroShare REST API.
///
/// Every mutating call re-fetches the resource afterwards, so the returned
/// [Resource] is always the canonical state held by the service.
pub struct HydroShare<T: Transport = HttpTransport> {
    transport: T,
    user: User,
}

impl HydroShare<HttpTransport> {
    /// Connect over HTTP and look up the configured user.
    pub fn connect(config: Config) -> Result<Self> {
        log::info!(
            "Connecting to {} as {}",
            config.base_url,
            config.username
        );
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(transport, &config.username)
    }
}

impl<T: Transport> HydroShare<T> {
    pub fn with_transport(transport: T, username: &str) -> Result<Self> {
        let response =
            transport.get(USER_ENDPOINT, &[("username", username)])?;
        let user = first_object(response).ok_or_else(|| {
            HydroShareError::service(None, format!("unknown user {username}"))
        })?;
        let user: User = serde_json::from_value(user)?;
        log::debug!("Authenticated as {}", user.resource_uri);

        Ok(Self { transport, user })
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Create a resource owned by the authenticated user, optionally with
    /// the file at `file` attached.
    pub fn create_resource(
        &self,
        title: &str,
        file: Option<&Path>,
    ) -> Result<Resource> {
        let mut resource = Resource::new();
        resource.set(USER_KEY, self.user.resource_uri.as_str());
        resource.set(CREATOR_KEY, self.user.resource_uri.as_str());
        resource.set_title(title);
        if let Some(path) = file {
            resource.read_file(path)?;
            if let Some(name) = path.file_name() {
                resource.set_filename(name.to_string_lossy());
            }
        }

        log::info!("Creating resource {:?}", title);
        let response = self
            .transport
            .post(RESOURCE_ENDPOINT, resource.export_mapping())?;
        let id = created_id(&response).ok_or_else(|| {
            HydroShareError::service(
                None,
                format!("creating resource {title:?} returned no id"),
            )
        })?;
        log::debug!("Created resource {}", id);

        // The service does not echo the file back
        self.get_resource(id)
    }

    pub fn get_resource(&self, id: i64) -> Result<Resource> {
        let id_string = id.to_string();
        let response = self
            .transport
            .get(RESOURCE_ENDPOINT, &[(ID_KEY, id_string.as_str())])?;
        let object = first_object(response)
            .ok_or(HydroShareError::NotFound(id_string))?;
        Resource::try_from(object)
    }

    /// Submit the local state of `resource` and return the canonical one.
    pub fn update_resource(&self, resource: &Resource) -> Result<Resource> {
        let id = required_id(resource)?;
        log::info!("Updating resource {}", id);

        let response = self
            .transport
            .put(&resource_path(id), resource.export_mapping())?;
        if response == Value::Bool(false) {
            return Err(HydroShareError::service(
                Some(id),
                "update was rejected",
            ));
        }

        self.get_resource(id)
    }

    pub fn delete_resource(&self, resource: &Resource) -> Result<bool> {
        let id = required_id(resource)?;
        log::info!("Deleting resource {}", id);

        let deleted = self.transport.delete(&resource_path(id))?;
        if !deleted {
            log::warn!("Service did not delete resource {}", id);
        }
        Ok(deleted)
    }
}

fn resource_path(id: i64) -> String {
    format!("{RESOURCE_ENDPOINT}{id}/")
}

fn required_id(resource: &Resource) -> Result<i64> {
    resource
        .id()
        .ok_or_else(|| HydroShareError::MissingField(ID_KEY.to_owned()))
}

/// First element of an `{"objects": [...]}` envelope. A bare object is
/// taken as is.
fn first_object(response: Value) -> Option<Value> {
    match response {
        Value::Object(mut map) => match map.remove(OBJECTS_KEY) {
            Some(Value::Array(objects)) => objects.into_iter().next(),
            Some(_) => None,
            None if map.is_empty() => None,
            None => Some(Value::Object(map)),
        },
        _ => None,
    }
}

/// Id of a freshly created resource, either echoed directly or as the
/// last segment of its `resource_uri`.
fn created_id(response: &Value) -> Option<i64> {
    response
        .get(ID_KEY)
        .and_then(id_from_value)
        .or_else(|| {
            response
                .get(RESOURCE_URI_KEY)
                .and_then(Value::as_str)
                .and_then(id_from_uri)
        })
}

fn id_from_uri(uri: &str) -> Option<i64> {
    uri.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}

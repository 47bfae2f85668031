use std::fs;
use std::path::Path;

use base64::{engine::general_purpose, Engine};
use serde_json::{Map, Value};

use crate::resource::{
    Resource, FILE_KEY, FILE_NAME_KEY, FILE_TYPE_KEY, RESOURCE_FILE_KEY,
};
use crate::{HydroShareError, Result};

pub const MIME_DEFAULT: &str = "application/octet-stream";

/// Transcoding of the attached file between disk and the base64 text
/// carried in `resource_file`. Files are handled whole, in memory.
impl Resource {
    /// Encode the content of the file at `path` into the resource.
    ///
    /// The file name is not touched, set it with [Resource::set_filename].
    pub fn read_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        log::debug!(
            "Encoding {} ({} bytes) into resource file",
            path.display(),
            bytes.len()
        );

        let encoded = general_purpose::STANDARD.encode(&bytes);

        self.resource_file_mut()
            .insert(FILE_KEY.to_owned(), Value::String(encoded));
        Ok(())
    }

    /// Decode the attached file and write it to `path`, truncating any
    /// existing content.
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.file_bytes()?;
        log::debug!(
            "Writing resource file ({} bytes) to {}",
            bytes.len(),
            path.display()
        );
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Decoded content of the attached file.
    pub fn file_bytes(&self) -> Result<Vec<u8>> {
        let encoded = self.file_field(FILE_KEY)?;
        // Tolerate payloads produced by line-wrapping encoders
        let compact: Vec<u8> = encoded
            .bytes()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        Ok(general_purpose::STANDARD.decode(compact)?)
    }

    /// Store the file name along with the MIME type guessed from its
    /// extension.
    pub fn set_filename<S: Into<String>>(&mut self, name: S) {
        let name = name.into();
        let mime = mime_guess::from_path(&name)
            .first_raw()
            .unwrap_or(MIME_DEFAULT);
        log::trace!("File name {} has content type {}", name, mime);

        let resource_file = self.resource_file_mut();
        resource_file.insert(FILE_TYPE_KEY.to_owned(), Value::from(mime));
        resource_file.insert(FILE_NAME_KEY.to_owned(), Value::String(name));
    }

    pub fn filename(&self) -> Result<&str> {
        self.file_field(FILE_NAME_KEY)
    }

    /// MIME type of the attached file
    pub fn filetype(&self) -> Result<&str> {
        self.file_field(FILE_TYPE_KEY)
    }

    fn file_field(&self, key: &str) -> Result<&str> {
        let resource_file = self.get(RESOURCE_FILE_KEY)?;
        match resource_file.get(key) {
            Some(Value::String(value)) => Ok(value),
            Some(_) => Err(HydroShareError::Parse(format!(
                "{RESOURCE_FILE_KEY}.{key} is not a string"
            ))),
            None => Err(HydroShareError::MissingField(format!(
                "{RESOURCE_FILE_KEY}.{key}"
            ))),
        }
    }

    fn resource_file_mut(&mut self) -> &mut Map<String, Value> {
        let mapping = self.export_mapping_mut();
        let value = mapping
            .entry(RESOURCE_FILE_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if !value.is_object() {
            *value = Value::Object(Map::new());
        }
        match value {
            Value::Object(resource_file) => resource_file,
            _ => unreachable!("resource_file was just made an object"),
        }
    }
}

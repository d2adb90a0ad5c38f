//! DeviceAddress and PathResolver
//!
//! Resource path format:
//! `projects/{project_id}/locations/{location}/registries/{registry_id}/devices/{device_id}`

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{AddressField, InvalidAddressError};

/// Identifying tuple of a managed device
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAddress {
    pub project_id: String,
    pub location: String,
    pub registry_id: String,
    pub device_id: String,
}

impl DeviceAddress {
    pub fn new(
        project_id: impl Into<String>,
        location: impl Into<String>,
        registry_id: impl Into<String>,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            location: location.into(),
            registry_id: registry_id.into(),
            device_id: device_id.into(),
        }
    }

    /// Fields in path order
    pub fn fields(&self) -> [(AddressField, &str); 4] {
        [
            (AddressField::ProjectId, self.project_id.as_str()),
            (AddressField::Location, self.location.as_str()),
            (AddressField::RegistryId, self.registry_id.as_str()),
            (AddressField::DeviceId, self.device_id.as_str()),
        ]
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.project_id, self.location, self.registry_id, self.device_id
        )
    }
}

/// Builds fully-qualified device resource paths
pub struct PathResolver;

impl PathResolver {
    /// Resolve the device resource path
    ///
    /// # Errors
    /// `InvalidAddressError` if a field is empty, a dot segment, or contains
    /// characters that are not path-segment safe.
    pub fn resolve(address: &DeviceAddress) -> Result<String, InvalidAddressError> {
        for (field, value) in address.fields() {
            Self::check_segment(field, value)?;
        }

        Ok(format!(
            "projects/{}/locations/{}/registries/{}/devices/{}",
            address.project_id, address.location, address.registry_id, address.device_id
        ))
    }

    fn check_segment(field: AddressField, value: &str) -> Result<(), InvalidAddressError> {
        if value.is_empty() {
            return Err(InvalidAddressError::new(field, "must not be empty"));
        }
        if value == "." || value == ".." {
            return Err(InvalidAddressError::new(
                field,
                format!("'{value}' is not a valid path segment"),
            ));
        }
        if let Some(c) = value.chars().find(|c| !is_segment_char(*c)) {
            return Err(InvalidAddressError::new(
                field,
                format!("illegal character {c:?}"),
            ));
        }
        Ok(())
    }
}

fn is_segment_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~' | '+' | '%')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_exact_format() {
        let addr = DeviceAddress::new("proj1", "us-central1", "reg1", "dev1");
        assert_eq!(
            PathResolver::resolve(&addr).unwrap(),
            "projects/proj1/locations/us-central1/registries/reg1/devices/dev1"
        );
    }

    #[test]
    fn test_resolve_is_pure() {
        let addr = DeviceAddress::new("p", "l", "r", "d");
        let first = PathResolver::resolve(&addr).unwrap();
        let second = PathResolver::resolve(&addr.clone()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_field_is_rejected() {
        let addr = DeviceAddress::new("", "loc", "reg", "dev");
        let err = PathResolver::resolve(&addr).unwrap_err();
        assert_eq!(err.field, AddressField::ProjectId);

        let addr = DeviceAddress::new("proj", "loc", "reg", "");
        let err = PathResolver::resolve(&addr).unwrap_err();
        assert_eq!(err.field, AddressField::DeviceId);
    }

    #[test]
    fn test_unsafe_characters_are_rejected() {
        for bad in ["dev/1", "dev 1", "dev?x", "dev#1", "dév", ".."] {
            let addr = DeviceAddress::new("proj", "loc", "reg", bad);
            let err = PathResolver::resolve(&addr).unwrap_err();
            assert_eq!(err.field, AddressField::DeviceId, "input: {bad}");
        }

        let addr = DeviceAddress::new("proj", "loc", "reg/evil", "dev");
        assert_eq!(
            PathResolver::resolve(&addr).unwrap_err().field,
            AddressField::RegistryId
        );
    }

    #[test]
    fn test_allowed_punctuation() {
        let addr = DeviceAddress::new("my-proj", "europe-west1", "reg_1.a", "fan+01~%20");
        assert!(PathResolver::resolve(&addr).is_ok());
    }

    #[test]
    fn test_wire_form_is_camel_case() {
        let addr = DeviceAddress::new("p", "l", "r", "d");
        let json = serde_json::to_value(&addr).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "projectId": "p",
                "location": "l",
                "registryId": "r",
                "deviceId": "d"
            })
        );
    }
}

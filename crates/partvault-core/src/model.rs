//! Typed snapshots of remote catalog entities.
//!
//! Every entity is an immutable snapshot of what the catalog reported at
//! fetch time, identified by a unique identifier string. Wire names are
//! camelCase to match the catalog's JSON; marker files round-trip through
//! the same serde derives, so an unchanged snapshot always re-serializes
//! byte-identically.

use serde::{Deserialize, Serialize};

/// A catalog part/assembly record, ownable and favoritable by a remote user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Unique identifier of the component.
    pub uuid: String,
    /// Display name of the component.
    pub name: String,
    /// User who owns the component on the catalog.
    pub owner_user: OwnerUser,
    /// Optional preview image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_file: Option<ImageFile>,
}

impl Component {
    /// Deterministic local folder name for this component.
    ///
    /// The owner is part of the name so two users' identically named parts
    /// never collide in the library tree.
    #[must_use]
    pub fn folder_name(&self) -> String {
        format!("{} (from {})", self.name, self.owner_user.username)
    }
}

/// Owning user of a catalog component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerUser {
    /// Unique identifier of the user.
    pub uuid: String,
    /// Username as shown on the catalog.
    pub username: String,
}

/// Reference to a remote preview image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFile {
    /// URL the preview image can be fetched from.
    pub download_url: String,
}

/// A named variant/revision of a [`Component`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Modification {
    /// Unique identifier of the modification.
    pub uuid: String,
    /// Display name of the modification; doubles as its folder name.
    pub modification_name: String,
    /// Identifier of the parent component.
    ///
    /// Not reported by the modifications query; the sync step fills it in
    /// from the component marker it was expanded under.
    #[serde(default)]
    pub component_uuid: String,
}

/// A group of files for a [`Modification`], scoped to one target program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fileset {
    /// Unique identifier of the fileset.
    pub uuid: String,
    /// Target program this fileset was prepared for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<Program>,
}

/// Target CAD program descriptor attached to a fileset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    /// Catalog-side identifier of the program.
    pub id: u32,
    /// Display name of the program.
    pub name: String,
}

/// A downloadable file belonging to a [`Fileset`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesetFile {
    /// Unique identifier of the file record.
    pub uuid: String,
    /// File name the download should be stored under.
    pub filename: String,
    /// URL the file content can be fetched from.
    pub download_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bracket() -> Component {
        Component {
            uuid: "a1".to_string(),
            name: "Bracket".to_string(),
            owner_user: OwnerUser {
                uuid: "u1".to_string(),
                username: "alice".to_string(),
            },
            image_file: None,
        }
    }

    #[test]
    fn test_component_folder_name() {
        assert_eq!(bracket().folder_name(), "Bracket (from alice)");
    }

    #[test]
    fn test_component_decodes_camel_case_wire_names() {
        let json = r#"{
            "uuid": "a1",
            "name": "Bracket",
            "ownerUser": {"uuid": "u1", "username": "alice"},
            "imageFile": {"downloadUrl": "https://catalog.test/img/a1.png"}
        }"#;
        let component: Component = serde_json::from_str(json).expect("decode component");
        assert_eq!(component.uuid, "a1");
        assert_eq!(component.owner_user.username, "alice");
        assert_eq!(
            component.image_file.map(|i| i.download_url),
            Some("https://catalog.test/img/a1.png".to_string())
        );
    }

    #[test]
    fn test_component_serialization_round_trip() {
        let component = bracket();
        let json = serde_json::to_string(&component).expect("serialize");
        let decoded: Component = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(component, decoded);
    }

    #[test]
    fn test_component_without_image_omits_field() {
        let json = serde_json::to_string(&bracket()).expect("serialize");
        assert!(!json.contains("imageFile"));
    }

    #[test]
    fn test_modification_wire_decode_defaults_parent() {
        let json = r#"{"uuid": "m1", "modificationName": "v2 steel"}"#;
        let modification: Modification = serde_json::from_str(json).expect("decode");
        assert_eq!(modification.modification_name, "v2 steel");
        assert!(modification.component_uuid.is_empty());
    }

    #[test]
    fn test_fileset_program_is_optional() {
        let bare: Fileset = serde_json::from_str(r#"{"uuid": "fs1"}"#).expect("decode");
        assert!(bare.program.is_none());

        let tagged: Fileset = serde_json::from_str(
            r#"{"uuid": "fs1", "program": {"id": 42, "name": "CadApp"}}"#,
        )
        .expect("decode");
        assert_eq!(tagged.program.map(|p| p.id), Some(42));
    }

    #[test]
    fn test_fileset_file_decode() {
        let json = r#"{
            "uuid": "f1",
            "filename": "bracket.step",
            "downloadUrl": "https://files.test/f1"
        }"#;
        let file: FilesetFile = serde_json::from_str(json).expect("decode");
        assert_eq!(file.filename, "bracket.step");
        assert_eq!(file.download_url, "https://files.test/f1");
    }
}

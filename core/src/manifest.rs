//! Module manifests.
//!
//! A [`ModuleManifest`] is the YAML/JSON form of a command module: its name,
//! documentation, version, module-level flags and members.

use serde::{Deserialize, Serialize};

use crate::{CommandMeta, FlagTable};

/// Serializable description of a command module.
///
/// A manifest lists a module's members the way source code would: each
/// member has a name, optional documentation, the name of the handler that
/// implements it, and optional [`CommandMeta`]. Only members carrying
/// metadata become commands.
///
/// # Examples
///
/// ```
/// use skal_core::*;
///
/// let yaml = r#"
/// name: tools
/// doc: |
///   Tool commands
///
///   Longer description.
/// flags:
///   - key: "-b"
///     action: store_true
/// members:
///   - name: first
///     doc: first command
///     command: {}
///   - name: second
///     doc: not exposed
/// "#;
///
/// let manifest: ModuleManifest = serde_yaml::from_str(yaml).unwrap();
/// assert_eq!(manifest.name, "tools");
/// assert_eq!(manifest.member_count(), 2);
/// assert_eq!(manifest.command_names(), vec!["first"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleManifest {
    /// Manifest contract version (populated from
    /// [`MANIFEST_CONTRACT_VERSION`](crate::MANIFEST_CONTRACT_VERSION)).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_version: Option<String>,
    /// Module name; dotted names nest (`pkg.tools`).
    pub name: String,
    /// Module documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    /// Module version string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Flags added to the parser the module's commands are attached to.
    #[serde(default, skip_serializing_if = "FlagTable::is_empty")]
    pub flags: FlagTable,
    /// Members in declaration order.
    #[serde(default)]
    pub members: Vec<MemberManifest>,
}

impl ModuleManifest {
    /// Creates an empty manifest.
    ///
    /// The `manifest_version` is set from
    /// [`MANIFEST_CONTRACT_VERSION`](crate::MANIFEST_CONTRACT_VERSION).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            manifest_version: Some(crate::MANIFEST_CONTRACT_VERSION.to_string()),
            name: name.into(),
            doc: None,
            version: None,
            flags: FlagTable::new(),
            members: Vec::new(),
        }
    }

    /// Returns the number of members.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Names of the members that are commands.
    pub fn command_names(&self) -> Vec<&str> {
        self.members
            .iter()
            .filter(|m| m.command.is_some())
            .map(|m| m.name.as_str())
            .collect()
    }
}

/// One member of a [`ModuleManifest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberManifest {
    /// Member name, used as the command name.
    pub name: String,
    /// Member documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    /// Handler implementing the member (defaults to `name`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    /// Command metadata; absent for plain members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<CommandMeta>,
}

impl MemberManifest {
    /// Creates a plain member.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            handler: None,
            command: None,
        }
    }

    /// Sets the documentation.
    pub fn with_doc(mut self, doc: &str) -> Self {
        self.doc = Some(doc.to_string());
        self
    }

    /// Names the handler implementing the member.
    pub fn with_handler(mut self, handler: &str) -> Self {
        self.handler = Some(handler.to_string());
        self
    }

    /// Marks the member as a command.
    pub fn as_command(mut self, meta: CommandMeta) -> Self {
        self.command = Some(meta);
        self
    }

    /// The handler name, falling back to the member name.
    pub fn handler_name(&self) -> &str {
        self.handler.as_deref().unwrap_or(&self.name)
    }
}

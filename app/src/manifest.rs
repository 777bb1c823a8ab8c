//! Loading modules from YAML or JSON manifests.
//!
//! A manifest describes a module's members; the code behind each command is
//! looked up by name in a [`HandlerTable`]. Manifests live in a directory,
//! with dotted module names mapping to nested paths:
//!
//! ```text
//! <dir>/tools.yaml          module "tools"
//! <dir>/pkg/greetings.json  module "pkg.greetings"
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use skal_core::{Location, ModuleManifest, ValidationError, validate_manifest};
use tracing::debug;

use crate::args::CommandArgs;
use crate::error::{CommandResult, LoadError};
use crate::module::{Handler, Member, Module, ModuleLoader};

/// Supported manifest extensions, in lookup order.
const EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Named command implementations referenced by manifests.
///
/// # Examples
///
/// ```
/// use skal_app::HandlerTable;
///
/// let handlers = HandlerTable::new().with("greet", |_args| Ok(()));
/// assert!(handlers.contains("greet"));
/// ```
#[derive(Default, Clone)]
pub struct HandlerTable {
    handlers: HashMap<String, Handler>,
}

impl HandlerTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler and returns the table.
    pub fn with<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(&CommandArgs) -> CommandResult + 'static,
    {
        self.insert(name, handler);
        self
    }

    /// Registers a handler, replacing any earlier one for `name`.
    pub fn insert<F>(&mut self, name: &str, handler: F)
    where
        F: Fn(&CommandArgs) -> CommandResult + 'static,
    {
        self.handlers.insert(name.to_string(), Rc::new(handler));
    }

    /// Handler registered under `name`.
    pub fn get(&self, name: &str) -> Option<Handler> {
        self.handlers.get(name).cloned()
    }

    /// Returns `true` if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Loads modules from manifest files in one directory.
///
/// - no manifest file for the name: [`LoadError::NotFound`]
/// - unreadable or malformed file, or an unusable member name:
///   [`LoadError::Syntax`]
/// - a command naming a handler missing from the table: [`LoadError::Name`]
///
/// Members without command metadata need no handler; if theirs is missing
/// they are left out of the module.
pub struct ManifestLoader {
    dir: PathBuf,
    handlers: HandlerTable,
}

impl ManifestLoader {
    /// Loader reading manifests from `dir`, resolving handlers in `handlers`.
    pub fn new(dir: impl Into<PathBuf>, handlers: HandlerTable) -> Self {
        Self {
            dir: dir.into(),
            handlers,
        }
    }

    /// Directory searched for manifests.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the manifest for `name`, if one exists.
    pub fn manifest_path(&self, name: &str) -> Option<PathBuf> {
        let mut base = self.dir.clone();
        for segment in name.split('.') {
            base.push(segment);
        }
        EXTENSIONS
            .iter()
            .map(|ext| base.with_extension(ext))
            .find(|path| path.is_file())
    }

    /// Reads and parses the manifest for `name`.
    pub fn read_manifest(&self, name: &str) -> Result<(ModuleManifest, PathBuf), LoadError> {
        let path = self
            .manifest_path(name)
            .ok_or_else(|| LoadError::NotFound {
                module: name.to_string(),
            })?;

        let syntax = |detail: String| LoadError::Syntax {
            module: name.to_string(),
            detail,
        };

        let content = fs::read_to_string(&path).map_err(|e| syntax(e.to_string()))?;
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        let manifest: ModuleManifest = if is_json {
            serde_json::from_str(&content).map_err(|e| syntax(e.to_string()))?
        } else {
            serde_yaml::from_str(&content).map_err(|e| syntax(e.to_string()))?
        };

        Ok((manifest, path))
    }

    fn build_module(
        &self,
        name: &str,
        manifest: ModuleManifest,
        path: &Path,
    ) -> Result<Module, LoadError> {
        // Flag and duplicate problems are reported during discovery; only
        // names that cannot appear on a command line fail the load.
        let fatal: Vec<String> = validate_manifest(&manifest)
            .into_iter()
            .filter(|e| {
                matches!(
                    e,
                    ValidationError::EmptyCommandName | ValidationError::InvalidCommandName(_)
                )
            })
            .map(|e| e.to_string())
            .collect();
        if !fatal.is_empty() {
            return Err(LoadError::Syntax {
                module: name.to_string(),
                detail: fatal.join("; "),
            });
        }

        let location = Location::file(path.display().to_string());
        let mut module = Module::at(name, location.clone());
        module.doc = manifest.doc;
        module.version = manifest.version;
        if !manifest.flags.is_empty() {
            module.flags = Some(manifest.flags);
        }

        for entry in manifest.members {
            let handler_name = entry.handler_name().to_string();
            let Some(handler) = self.handlers.get(&handler_name) else {
                if entry.command.is_some() {
                    return Err(LoadError::Name {
                        module: name.to_string(),
                        detail: format!(
                            "handler `{handler_name}` for \"{}\" is not registered",
                            entry.name
                        ),
                    });
                }
                continue;
            };
            let mut member = Member::from_handler(entry.name, handler, location.clone());
            member.doc = entry.doc;
            member.meta = entry.command;
            module.members.push(member);
        }

        Ok(module)
    }
}

impl ModuleLoader for ManifestLoader {
    fn load(&self, name: &str) -> Result<Module, LoadError> {
        let (manifest, path) = self.read_manifest(name)?;
        debug!(module = %name, path = %path.display(), members = manifest.member_count(), "loaded manifest");
        self.build_module(name, manifest, &path)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn handlers() -> HandlerTable {
        HandlerTable::new()
            .with("first", |_| Ok(()))
            .with("run_third", |_| Ok(()))
    }

    #[test]
    fn test_missing_manifest_is_not_found() {
        let dir = TempDir::new().unwrap();
        let loader = ManifestLoader::new(dir.path(), handlers());

        let err = loader.load("missing_module").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_dotted_name_maps_to_nested_path() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("pkg")).unwrap();
        fs::write(
            dir.path().join("pkg").join("tools.json"),
            r#"{"name": "pkg.tools", "members": [{"name": "first", "command": {}}]}"#,
        )
        .unwrap();
        let loader = ManifestLoader::new(dir.path(), handlers());

        let module = loader.load("pkg.tools").unwrap();
        assert_eq!(module.short_name(), "tools");
        assert_eq!(module.command_names(), vec!["first"]);
        assert!(module.location.file.ends_with("tools.json"));
    }

    #[test]
    fn test_malformed_yaml_is_syntax_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.yaml"), "name: [unclosed\n").unwrap();
        let loader = ManifestLoader::new(dir.path(), handlers());

        let err = loader.load("broken").unwrap_err();
        assert!(matches!(err, LoadError::Syntax { ref module, .. } if module == "broken"));
    }

    #[test]
    fn test_unknown_command_handler_is_name_error() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("tools.yaml"),
            "name: tools\nmembers:\n  - name: fourth\n    command: {}\n",
        )
        .unwrap();
        let loader = ManifestLoader::new(dir.path(), handlers());

        let err = loader.load("tools").unwrap_err();
        assert_eq!(
            err,
            LoadError::Name {
                module: "tools".into(),
                detail: "handler `fourth` for \"fourth\" is not registered".into(),
            }
        );
    }

    #[test]
    fn test_plain_member_without_handler_is_dropped() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("tools.yml"),
            r#"
name: tools
doc: Tool commands
version: "1.2"
flags:
  - key: "-q"
    action: store_true
members:
  - name: third
    handler: run_third
    doc: third command
    command:
      flags:
        - key: ["-t", "--test"]
  - name: helper
"#,
        )
        .unwrap();
        let loader = ManifestLoader::new(dir.path(), handlers());

        let module = loader.load("tools").unwrap();
        assert_eq!(module.members.len(), 1);
        assert_eq!(module.version.as_deref(), Some("1.2"));
        assert_eq!(module.flags.as_ref().map(|f| f.len()), Some(1));
        assert_eq!(module.members[0].flags().map(|f| f.len()), Some(1));
    }

    #[test]
    fn test_invalid_member_name_is_syntax_error() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("tools.yaml"),
            "name: tools\nmembers:\n  - name: \"-x\"\n    handler: first\n    command: {}\n",
        )
        .unwrap();
        let loader = ManifestLoader::new(dir.path(), handlers());

        assert!(matches!(
            loader.load("tools").unwrap_err(),
            LoadError::Syntax { .. }
        ));
    }
}

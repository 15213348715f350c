//! Declaration tables and their TOML form.
//!
//! A `DeclarationTable` is the load-time-immutable store of type-level and
//! method-level declarations. Build one programmatically with
//! `declare_type` / `declare_method`, or load a whole `SecurityPolicy`
//! (settings plus declarations) from TOML:
//!
//! ```toml
//! [settings]
//! role_prefix = "ROLE_"
//! default_when_no_rule = "permit"
//!
//! [[types]]
//! name = "AccountService"
//! roles_allowed = ["USER"]
//!
//! [[types.methods]]
//! name = "close_account"
//! deny_all = true
//! ```
//!
//! Every declaration is validated while loading, so a misconfigured rule is
//! reported before any guarded call is made.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use rolegate_contracts::{
    config::SecurityConfig,
    error::{RolegateError, RolegateResult},
    rule::Declaration,
    target::MethodKey,
};
use rolegate_core::traits::DeclarationSource;

/// In-memory declarations keyed by type name and by method.
#[derive(Debug, Clone, Default)]
pub struct DeclarationTable {
    types: HashMap<String, Declaration>,
    methods: HashMap<MethodKey, Declaration>,
}

impl DeclarationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `declaration` to the type itself.
    ///
    /// # Errors
    ///
    /// `MisconfiguredRule` if the declaration is invalid, `ConfigError` if the
    /// type already carries a declaration.
    pub fn declare_type(
        &mut self,
        type_name: impl Into<String>,
        declaration: Declaration,
    ) -> RolegateResult<&mut Self> {
        let type_name = type_name.into();
        declaration.to_rule(&type_name)?;
        if self.types.contains_key(&type_name) {
            return Err(RolegateError::ConfigError {
                reason: format!("type '{type_name}' is declared more than once"),
            });
        }
        self.types.insert(type_name, declaration);
        Ok(self)
    }

    /// Attach `declaration` directly to a method.
    ///
    /// An empty declaration is accepted: it registers the method as a known
    /// target that inherits whatever its type declares.
    ///
    /// # Errors
    ///
    /// As for `declare_type`.
    pub fn declare_method(&mut self, key: MethodKey, declaration: Declaration) -> RolegateResult<&mut Self> {
        declaration.to_rule(&key.to_string())?;
        if self.methods.contains_key(&key) {
            return Err(RolegateError::ConfigError {
                reason: format!("method '{key}' is declared more than once"),
            });
        }
        self.methods.insert(key, declaration);
        Ok(self)
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }
}

impl DeclarationSource for DeclarationTable {
    fn type_declaration(&self, type_name: &str) -> Option<&Declaration> {
        self.types.get(type_name)
    }

    fn method_declaration(&self, target: &MethodKey) -> Option<&Declaration> {
        self.methods.get(target)
    }

    fn targets(&self) -> Vec<MethodKey> {
        let mut keys: Vec<MethodKey> = self.methods.keys().cloned().collect();
        keys.sort();
        keys
    }
}

// ── TOML schema ───────────────────────────────────────────────────────────────
//
// Every table rejects unknown keys: a misspelled declaration key would
// otherwise load as an empty declaration and leave the method unguarded.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyFile {
    #[serde(default)]
    settings: SecurityConfig,
    #[serde(default)]
    types: Vec<TypeEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TypeEntry {
    name: String,
    #[serde(default)]
    roles_allowed: Option<Vec<String>>,
    #[serde(default)]
    roles_required: Option<Vec<String>>,
    #[serde(default)]
    permit_all: bool,
    #[serde(default)]
    deny_all: bool,
    #[serde(default)]
    methods: Vec<MethodEntry>,
}

impl TypeEntry {
    fn declaration(&self) -> Declaration {
        Declaration {
            roles_allowed: self.roles_allowed.clone(),
            roles_required: self.roles_required.clone(),
            permit_all: self.permit_all,
            deny_all: self.deny_all,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct MethodEntry {
    name: String,
    #[serde(default)]
    roles_allowed: Option<Vec<String>>,
    #[serde(default)]
    roles_required: Option<Vec<String>>,
    #[serde(default)]
    permit_all: bool,
    #[serde(default)]
    deny_all: bool,
}

impl From<MethodEntry> for Declaration {
    fn from(entry: MethodEntry) -> Self {
        Declaration {
            roles_allowed: entry.roles_allowed,
            roles_required: entry.roles_required,
            permit_all: entry.permit_all,
            deny_all: entry.deny_all,
        }
    }
}

/// Settings and declarations loaded together from one TOML document.
#[derive(Debug, Clone, Default)]
pub struct SecurityPolicy {
    pub settings: SecurityConfig,
    pub declarations: DeclarationTable,
}

impl SecurityPolicy {
    /// Parse `s` as TOML and validate every declaration in it.
    ///
    /// Returns `ConfigError` for malformed TOML or duplicate entries and
    /// `MisconfiguredRule` for an invalid declaration.
    pub fn from_toml_str(s: &str) -> RolegateResult<Self> {
        let file: PolicyFile = toml::from_str(s).map_err(|e| RolegateError::ConfigError {
            reason: format!("failed to parse security policy TOML: {}", e),
        })?;

        let mut declarations = DeclarationTable::new();
        for entry in file.types {
            if entry.name.trim().is_empty() {
                return Err(RolegateError::ConfigError {
                    reason: "type entry with an empty name".to_string(),
                });
            }
            let type_declaration = entry.declaration();
            if !type_declaration.is_empty() {
                declarations.declare_type(entry.name.as_str(), type_declaration)?;
            }
            for method in entry.methods {
                if method.name.trim().is_empty() {
                    return Err(RolegateError::ConfigError {
                        reason: format!("type '{}' has a method entry with an empty name", entry.name),
                    });
                }
                let key = MethodKey::new(entry.name.as_str(), method.name.as_str());
                declarations.declare_method(key, method.into())?;
            }
        }

        info!(
            types = declarations.type_count(),
            methods = declarations.method_count(),
            role_prefix = %file.settings.role_prefix,
            "security policy loaded"
        );

        Ok(Self { settings: file.settings, declarations })
    }

    /// Read the file at `path` and parse it as a TOML security policy.
    pub fn from_file(path: &Path) -> RolegateResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| RolegateError::ConfigError {
            reason: format!("failed to read security policy '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }
}

//! Role-based access control for picomcp tools.
//!
//! API keys map to roles; tools map to sets of permitted roles. A tool
//! with no entry is unrestricted, a tool with an empty set is callable
//! by nobody, and a caller without a recognized key falls back to the
//! default role. Disabling RBAC allows everything.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Point-in-time view of the access table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessControlStats {
    pub enabled: bool,
    pub default_role: String,
    pub role_count: usize,
    pub key_count: usize,
    pub restricted_tool_count: usize,
}

/// The key-to-role and tool-to-roles tables.
pub struct AccessControl {
    enabled: bool,
    default_role: String,
    roles: HashSet<String>,
    key_to_role: HashMap<String, String>,
    tool_allowed_roles: HashMap<String, HashSet<String>>,
}

impl AccessControl {
    /// Creates an enabled table whose unauthenticated callers carry
    /// `default_role`.
    pub fn new(default_role: &str) -> Self {
        let mut roles = HashSet::new();
        roles.insert(default_role.to_string());
        Self {
            enabled: true,
            default_role: default_role.to_string(),
            roles,
            key_to_role: HashMap::new(),
            tool_allowed_roles: HashMap::new(),
        }
    }

    /// Turns enforcement on or off. A disabled table allows everything.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns whether enforcement is on.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Changes the role assumed for unrecognized callers.
    pub fn set_default_role(&mut self, role: &str) {
        self.default_role = role.to_string();
        self.roles.insert(role.to_string());
    }

    /// Declares a role.
    pub fn add_role(&mut self, role: &str) {
        self.roles.insert(role.to_string());
    }

    /// Maps an API key to a role, declaring the role if new.
    pub fn assign(&mut self, api_key: &str, role: &str) {
        self.roles.insert(role.to_string());
        self.key_to_role
            .insert(api_key.to_string(), role.to_string());
    }

    /// Permits a role to call a tool, creating the tool's restriction
    /// entry if this is its first rule.
    pub fn allow(&mut self, tool: &str, role: &str) {
        self.roles.insert(role.to_string());
        self.tool_allowed_roles
            .entry(tool.to_string())
            .or_default()
            .insert(role.to_string());
    }

    /// Restricts a tool with an (initially empty) allowed set: until
    /// roles are added, nobody may call it.
    pub fn restrict(&mut self, tool: &str) {
        self.tool_allowed_roles.entry(tool.to_string()).or_default();
    }

    /// Resolves the role for an optional API key.
    pub fn role_for(&self, api_key: Option<&str>) -> &str {
        api_key
            .and_then(|key| self.key_to_role.get(key))
            .map(String::as_str)
            .unwrap_or(&self.default_role)
    }

    /// Decides whether the holder of `api_key` may call `tool`.
    ///
    /// True when enforcement is off, when the tool is unrestricted, or
    /// when the caller's role is in the tool's allowed set. Tool
    /// restrictions take precedence over role existence: an empty
    /// allowed set denies every caller.
    pub fn can_access(&self, tool: &str, api_key: Option<&str>) -> bool {
        if !self.enabled {
            return true;
        }
        let Some(allowed) = self.tool_allowed_roles.get(tool) else {
            return true;
        };
        allowed.contains(self.role_for(api_key))
    }

    /// Returns a snapshot of the table.
    pub fn stats(&self) -> AccessControlStats {
        AccessControlStats {
            enabled: self.enabled,
            default_role: self.default_role.clone(),
            role_count: self.roles.len(),
            key_count: self.key_to_role.len(),
            restricted_tool_count: self.tool_allowed_roles.len(),
        }
    }
}

impl Default for AccessControl {
    fn default() -> Self {
        Self::new("guest")
    }
}

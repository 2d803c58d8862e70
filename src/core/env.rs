//! # Environment Registry / 环境变量注册表
//!
//! Holds the flat `name -> value` bindings that job types read and write.
//! A name can be *declared* (known to the host) without carrying a value.
//!
//! 保存作业类型读写的扁平 `名称 -> 值` 绑定。
//! 名称可以被 *声明*（主机已知）而不携带值。

use std::collections::BTreeMap;

use crate::core::error::{JobError, Result};

/// Ordered registry of environment bindings.
#[derive(Debug, Clone, Default)]
pub struct EnvRegistry {
    vars: BTreeMap<String, Option<String>>,
}

impl EnvRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `name` known to the registry. An existing value is kept.
    pub fn declare(&mut self, name: &str) {
        self.vars.entry(name.to_string()).or_insert(None);
    }

    pub fn declare_all<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        for name in names {
            self.declare(name);
        }
    }

    /// Declares `name` and assigns `value` to it.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.vars.insert(name.to_string(), Some(value.into()));
    }

    /// Clears the value of `name` but keeps it declared.
    pub fn unset(&mut self, name: &str) {
        if let Some(value) = self.vars.get_mut(name) {
            *value = None;
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).and_then(|v| v.as_deref())
    }

    /// Reads a value the way a shell would: unset reads as the empty string.
    pub fn get_or_empty(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// `true` when `name` holds a non-empty value.
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_empty())
    }

    /// Checks that every name is declared. Values may be empty.
    pub fn verify_env<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
        let missing: Vec<String> = names
            .into_iter()
            .filter(|name| !self.is_declared(name))
            .map(str::to_string)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(JobError::MissingEnv(missing))
        }
    }

    /// Assigns values from a configuration table, declaring unknown names.
    pub fn apply<K, V>(&mut self, values: impl IntoIterator<Item = (K, V)>)
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, value) in values {
            self.set(name.as_ref(), value);
        }
    }

    /// Pulls values for every declared name from the process environment.
    /// Names missing from the process environment keep their current value.
    pub fn overlay_process_env(&mut self) {
        self.overlay_from(|name| std::env::var(name).ok());
    }

    /// Same as [`overlay_process_env`](Self::overlay_process_env) with a custom lookup.
    pub fn overlay_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for (name, value) in self.vars.iter_mut() {
            if let Some(found) = lookup(name) {
                *value = Some(found);
            }
        }
    }

    /// Returns ordered `(name, value)` pairs, unset values rendered as "".
    pub fn export<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Vec<(String, String)> {
        names
            .into_iter()
            .map(|name| (name.to_string(), self.get_or_empty(name).to_string()))
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_names_read_as_empty() {
        let mut env = EnvRegistry::new();
        env.declare("GOOD_COMMIT");

        assert!(env.is_declared("GOOD_COMMIT"));
        assert!(!env.is_set("GOOD_COMMIT"));
        assert_eq!(env.get_or_empty("GOOD_COMMIT"), "");
        assert_eq!(env.get("GOOD_COMMIT"), None);
    }

    #[test]
    fn declare_keeps_existing_value() {
        let mut env = EnvRegistry::new();
        env.set("SITESIZE", "M");
        env.declare("SITESIZE");
        assert_eq!(env.get("SITESIZE"), Some("M"));
    }

    #[test]
    fn verify_env_reports_all_missing_names() {
        let mut env = EnvRegistry::new();
        env.declare("UUID");

        let err = env
            .verify_env(["UUID", "WORKSPACE", "SHAREDDIR"])
            .unwrap_err();
        match err {
            JobError::MissingEnv(names) => assert_eq!(names, vec!["WORKSPACE", "SHAREDDIR"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn overlay_only_touches_declared_names() {
        let mut env = EnvRegistry::new();
        env.declare("WEBSERVER");
        env.set("DBTYPE", "pgsql");

        env.overlay_from(|name| match name {
            "WEBSERVER" => Some("web1".to_string()),
            "UNRELATED" => Some("nope".to_string()),
            _ => None,
        });

        assert_eq!(env.get("WEBSERVER"), Some("web1"));
        assert_eq!(env.get("DBTYPE"), Some("pgsql"));
        assert!(!env.is_declared("UNRELATED"));
    }

    #[test]
    fn export_preserves_requested_order() {
        let mut env = EnvRegistry::new();
        env.set("WEBSERVER", "web1");
        env.declare("DBTAG");

        let pairs = env.export(["WEBSERVER", "DBTAG", "NEVER_DECLARED"]);
        assert_eq!(
            pairs,
            vec![
                ("WEBSERVER".to_string(), "web1".to_string()),
                ("DBTAG".to_string(), String::new()),
                ("NEVER_DECLARED".to_string(), String::new()),
            ]
        );
    }
}

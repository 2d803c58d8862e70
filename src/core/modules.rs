//! # Module Registry / 模块注册表
//!
//! Host infrastructure modules a job type can depend on (env, docker,
//! database, ...). Each module contributes a set of env names that become
//! known to the [`EnvRegistry`] once the module is loaded.
//!
//! 作业类型可以依赖的主机基础设施模块（env、docker、数据库等）。
//! 每个模块都会提供一组环境变量名称，加载模块后这些名称会在 [`EnvRegistry`] 中可见。

use crate::core::env::EnvRegistry;
use crate::core::error::{JobError, Result};

/// Static description of a host module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    pub name: &'static str,
    pub env: &'static [&'static str],
}

const BUILTIN_MODULES: &[ModuleDescriptor] = &[
    ModuleDescriptor {
        name: "env",
        env: &["UUID", "WORKSPACE", "SHAREDDIR", "ENVIROPATH"],
    },
    ModuleDescriptor {
        name: "summary",
        env: &[],
    },
    ModuleDescriptor {
        name: "docker",
        env: &["DOCKER_NETWORK"],
    },
    ModuleDescriptor {
        name: "docker-logs",
        env: &[],
    },
    ModuleDescriptor {
        name: "git",
        env: &["GOOD_COMMIT", "BAD_COMMIT", "MOODLE_BRANCH", "GIT_COMMIT"],
    },
    ModuleDescriptor {
        name: "browser",
        env: &[],
    },
    ModuleDescriptor {
        name: "docker-database",
        env: &[
            "DBTYPE",
            "DBTAG",
            "DBHOST",
            "DBNAME",
            "DBUSER",
            "DBPASS",
            "DBCOLLATION",
            "DBREPLICAS",
            "DBHOST_DBREPLICA",
        ],
    },
    ModuleDescriptor {
        name: "docker-php",
        env: &["WEBSERVER", "PHP_VERSION"],
    },
    ModuleDescriptor {
        name: "moodle-core-copy",
        env: &[],
    },
    ModuleDescriptor {
        name: "docker-healthy",
        env: &[],
    },
    ModuleDescriptor {
        name: "moodle-config",
        env: &["MOODLE_CONFIG"],
    },
    ModuleDescriptor {
        name: "plugins",
        env: &["PLUGINSTOINSTALL"],
    },
    ModuleDescriptor {
        name: "docker-jmeter",
        env: &["JMETER"],
    },
];

/// The set of modules the host can initialize.
#[derive(Debug, Clone)]
pub struct ModuleRegistry {
    modules: Vec<ModuleDescriptor>,
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl ModuleRegistry {
    /// An empty registry. Mostly useful in tests.
    pub fn empty() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// The registry with every module the host ships.
    pub fn with_builtin() -> Self {
        Self {
            modules: BUILTIN_MODULES.to_vec(),
        }
    }

    pub fn register(&mut self, module: ModuleDescriptor) {
        self.modules.retain(|m| m.name != module.name);
        self.modules.push(module);
    }

    /// Removes a module, returning whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.modules.len();
        self.modules.retain(|m| m.name != name);
        before != self.modules.len()
    }

    pub fn get(&self, name: &str) -> Option<&ModuleDescriptor> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Fails on the first name that is not registered.
    pub fn verify_modules<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for name in names {
            if self.get(name).is_none() {
                return Err(JobError::MissingModule(name.to_string()));
            }
        }
        Ok(())
    }

    /// Declares the env names of every listed module, in list order.
    /// Unknown modules are skipped; [`verify_modules`](Self::verify_modules) reports them.
    pub fn load<'a>(&self, names: impl IntoIterator<Item = &'a str>, env: &mut EnvRegistry) {
        for name in names {
            if let Some(module) = self.get(name) {
                tracing::debug!(module = module.name, vars = module.env.len(), "loading module");
                env.declare_all(module.env.iter().copied());
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.modules.iter()
    }
}

//! Module loading.
//!
//! A test binary owns its fixtures, so "loading" means looking up a registered module builder and running it.
//! [`ModuleLoader`] is the seam; [`Registry`] is the in-process implementation the CLI uses.

use miette::Diagnostic;
use thiserror::Error;

use crate::describe::Module;
use crate::failure::{Failure, capture};

#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    #[error("no module named `{0}` is registered")]
    #[diagnostic(code(rigor::load::not_found), help("run with --list to see the registered modules"))]
    NotFound(String),

    #[error("module `{module}` failed to build: {cause}")]
    #[diagnostic(code(rigor::load::build))]
    Build { module: String, cause: Failure },
}

/// Resolves a module name to a [`Module`].
pub trait ModuleLoader {
    fn load(&self, name: &str) -> Result<Module, LoadError>;

    /// Names this loader can resolve, for listings.
    fn names(&self) -> Vec<String> {
        Vec::new()
    }
}

type ModuleFactory = Box<dyn Fn() -> Module>;

/// Named module builders, in registration order.
#[derive(Default)]
pub struct Registry {
    modules: Vec<(String, ModuleFactory)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `build` under `name`. A later registration with the same name shadows the earlier one.
    pub fn module(mut self, name: impl Into<String>, build: impl Fn() -> Module + 'static) -> Self {
        self.modules.push((name.into(), Box::new(build)));
        self
    }
}

impl ModuleLoader for Registry {
    fn load(&self, name: &str) -> Result<Module, LoadError> {
        let (_, build) = self
            .modules
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .ok_or_else(|| LoadError::NotFound(name.to_string()))?;
        capture(build).map_err(|cause| LoadError::Build {
            module: name.to_string(),
            cause,
        })
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for (name, _) in &self.modules {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }
}

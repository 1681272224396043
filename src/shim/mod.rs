#[cfg(feature = "bindgen")]
pub mod bindgen;
pub mod header;

pub use header::{
    render_header,
    FieldRole,
    ProbeType,
    ShimField,
    Substitution,
    DEFAULT_CXX_STD,
    DEFAULT_INCLUDES,
    ENV_CXX_STD,
    ENV_INCLUDE_DIRS,
    HEADER_NAME,
    PROBE_TYPES,
    SUBSTITUTIONS
};
use std::{
    env,
    ffi::OsString,
    path::{ Path, PathBuf }
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShimConfig {
    /// `#include` targets, brackets or quotes included, e.g. `<lldb/API/LLDB.h>`
    pub includes: Vec<String>,
    pub include_dirs: Vec<PathBuf>,
    pub cxx_std: String,
    pub allowlist_types: Vec<String>,
    pub allowlist_functions: Vec<String>,
    /// Appended to the header verbatim
    pub declarations: Vec<String>,
    /// Emit the `static_assert`s against the real templates (needs `<memory>`)
    pub probe_layouts: bool
}

impl Default for ShimConfig {
    fn default() -> Self { Self::new() }
}

impl ShimConfig {
    pub fn new() -> Self {
        Self {
            includes: DEFAULT_INCLUDES.iter().map(|s| s.to_string()).collect(),
            include_dirs: vec![],
            cxx_std: DEFAULT_CXX_STD.to_string(),
            allowlist_types: vec![],
            allowlist_functions: vec![],
            declarations: vec![],
            probe_layouts: true
        }
    }

    /// Defaults, overridden by `SIMPLE_PTR_CXX_STD` and `SIMPLE_PTR_INCLUDE_DIRS`.
    pub fn from_env() -> Self {
        Self::new().with_env(env::var(ENV_CXX_STD).ok(), env::var_os(ENV_INCLUDE_DIRS))
    }

    fn with_env(mut self, cxx_std: Option<String>, include_dirs: Option<OsString>) -> Self {
        if let Some(cxx_std) = cxx_std.filter(|s| !s.trim().is_empty()) {
            self.cxx_std = cxx_std.trim().to_string();
        }
        if let Some(dirs) = include_dirs {
            self.include_dirs.extend(env::split_paths(&dirs).filter(|p| !p.as_os_str().is_empty()));
        }
        self
    }

    /// LLDB's public API, as installed under an LLVM prefix such as `/usr/lib/llvm-13`.
    pub fn lldb<P: AsRef<Path>>(llvm_dir: P) -> Self {
        Self::from_env()
            .include("<lldb/API/LLDB.h>")
            .include_dir(llvm_dir.as_ref().join("include"))
            .allowlist_type("lldb::SB.*")
    }

    pub fn include<S: Into<String>>(mut self, include: S) -> Self {
        self.includes.push(include.into());
        self
    }

    pub fn include_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.include_dirs.push(dir.into());
        self
    }

    pub fn cxx_std<S: Into<String>>(mut self, cxx_std: S) -> Self {
        self.cxx_std = cxx_std.into();
        self
    }

    pub fn allowlist_type<S: Into<String>>(mut self, pattern: S) -> Self {
        self.allowlist_types.push(pattern.into());
        self
    }

    pub fn allowlist_function<S: Into<String>>(mut self, pattern: S) -> Self {
        self.allowlist_functions.push(pattern.into());
        self
    }

    pub fn declare<S: Into<String>>(mut self, declaration: S) -> Self {
        self.declarations.push(declaration.into());
        self
    }

    pub fn probe_layouts(mut self, probe: bool) -> Self {
        self.probe_layouts = probe;
        self
    }

    pub fn header(&self) -> String {
        let includes: Vec<&str> = self.includes.iter().map(String::as_str).collect();
        let declarations: Vec<&str> = self.declarations.iter().map(String::as_str).collect();
        let probes = match self.probe_layouts {
            true => PROBE_TYPES,
            false => &[]
        };
        render_header(&includes, probes, &declarations)
    }

    /// Configured type patterns, then each real template and its placeholder.
    pub fn allowlist(&self) -> Vec<String> {
        let mut types = self.allowlist_types.clone();
        for sub in SUBSTITUTIONS.iter() {
            types.push(sub.replaces.to_string());
            types.push(sub.placeholder.to_string());
        }
        types
    }

    pub fn clang_args(&self) -> Vec<String> {
        let mut args = vec!["-xc++".to_string(), format!("-std={}", self.cxx_std)];
        args.extend(self.include_dirs.iter().map(|dir| format!("-I{}", dir.display())));
        args
    }
}

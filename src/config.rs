//! Compiler settings shared by the frontend and the binary.

use std::path::PathBuf;

/// Source file extension of a module.
pub const SOURCE_EXTENSION: &str = "gh";

/// Name of the directory whose `lib/` folder holds the standard modules.
pub const LIB_MARKER: &str = "ghoul";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Dump tokens, the AST and the symbol table
    pub verbose: bool,
    pub verbose_ast: bool,
    pub verbose_symtable: bool,
    pub verbose_ir: bool,
    pub extension: String,
    pub lib_marker: String,
    /// Executable path; the build directory is used when absent
    pub output: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            verbose: false,
            verbose_ast: false,
            verbose_symtable: false,
            verbose_ir: false,
            extension: String::from(SOURCE_EXTENSION),
            lib_marker: String::from(LIB_MARKER),
            output: None,
        }
    }
}

impl Config {
    pub fn show_tokens(&self) -> bool {
        self.verbose
    }

    pub fn show_ast(&self) -> bool {
        self.verbose || self.verbose_ast
    }

    pub fn show_symtable(&self) -> bool {
        self.verbose || self.verbose_symtable
    }

    pub fn show_ir(&self) -> bool {
        self.verbose || self.verbose_ir
    }
}

/// File name of module `module`, e.g. `io.gh`.
pub fn module_file(module: &str, extension: &str) -> String {
    format!("{}.{}", module, extension)
}

#[cfg(test)]
mod tests {
    use super::{module_file, Config, SOURCE_EXTENSION};

    #[test]
    fn test_verbose_implies_every_dump() {
        let config = Config {
            verbose: true,
            ..Default::default()
        };

        assert!(config.show_tokens());
        assert!(config.show_ast());
        assert!(config.show_symtable());
        assert!(config.show_ir());
    }

    #[test]
    fn test_module_file() {
        assert_eq!(module_file("io", SOURCE_EXTENSION), "io.gh");
    }
}

//! Drives lexing, parsing and semantic analysis for one program.
//!
//! Modules are looked up through a `SourceProvider`. The frontend is also the
//! parser's `ImportHandler`: an imported module is lexed and parsed on the
//! spot and its declarations are spliced into the importing module.

use std::{
    collections::{HashMap, HashSet},
    env,
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
    time::Instant,
};

use tracing::{debug, info, warn};

use crate::{
    ast::{printer::AstPrinter, statements::Toplevel},
    config::{module_file, Config, SOURCE_EXTENSION},
    errors::errors::{Error, ErrorImpl, ErrorStack},
    lexer::{lexer::tokenize, tokens::TokenKind},
    parser::parser::{parse, ImportHandler},
    symtable::symtable::SymTable,
    Position,
};

/// The text of one module and the name used for it in diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub name: String,
    pub text: String,
}

/// Maps module names to source text.
pub trait SourceProvider {
    fn load(&self, module: &str) -> Option<Source>;

    /// Identity of the module's source, used to detect cycles and repeated
    /// imports. Two names that reach the same source share an identity.
    fn identify(&self, module: &str) -> String {
        module.to_string()
    }
}

/// Resolves module `M` to `M.gh` in `root`, falling back to `lib/M.gh` below
/// the nearest ancestor of `root` named after the library marker.
///
/// A relative `root` is taken relative to the working directory.
#[derive(Debug, Clone)]
pub struct FileSystemProvider {
    root: PathBuf,
    extension: String,
    lib_marker: String,
}

impl FileSystemProvider {
    pub fn new(root: impl Into<PathBuf>, config: &Config) -> Self {
        FileSystemProvider {
            root: absolute(root.into()),
            extension: config.extension.clone(),
            lib_marker: config.lib_marker.clone(),
        }
    }

    /// Returns the path `module` resolves to, if the file exists.
    pub fn resolve(&self, module: &str) -> Option<PathBuf> {
        let file = module_file(module, &self.extension);

        let local = self.root.join(&file);
        if local.is_file() {
            return Some(local);
        }

        let marker = OsStr::new(&self.lib_marker);
        let lib = self
            .root
            .ancestors()
            .find(|dir| dir.file_name() == Some(marker))?
            .join("lib")
            .join(&file);

        lib.is_file().then_some(lib)
    }

    fn display_name(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }
}

fn absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }

    match env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(error) => {
            warn!(%error, "working directory unavailable");
            path
        }
    }
}

impl SourceProvider for FileSystemProvider {
    fn identify(&self, module: &str) -> String {
        match self.resolve(module) {
            Some(path) => fs::canonicalize(&path)
                .unwrap_or(path)
                .to_string_lossy()
                .into_owned(),
            None => module.to_string(),
        }
    }

    fn load(&self, module: &str) -> Option<Source> {
        let path = self.resolve(module)?;

        match fs::read_to_string(&path) {
            Ok(text) => Some(Source {
                name: self.display_name(&path),
                text,
            }),
            Err(error) => {
                warn!(path = %path.display(), %error, "failed to read module");
                None
            }
        }
    }
}

/// Modules held in memory, keyed by module name.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    modules: HashMap<String, String>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        MemoryProvider::default()
    }

    pub fn with_module(mut self, module: &str, text: &str) -> Self {
        self.insert(module, text);
        self
    }

    pub fn insert(&mut self, module: &str, text: &str) {
        self.modules.insert(module.to_string(), text.to_string());
    }
}

impl SourceProvider for MemoryProvider {
    fn load(&self, module: &str) -> Option<Source> {
        self.modules.get(module).map(|text| Source {
            name: module_file(module, SOURCE_EXTENSION),
            text: text.clone(),
        })
    }
}

/// An analyzed program, ready for code generation.
#[derive(Debug)]
pub struct Compilation {
    pub toplevel: Toplevel,
    pub symtable: SymTable,
}

pub struct Frontend {
    config: Config,
    provider: Box<dyn SourceProvider>,
    /// Identities of the modules currently being parsed, outermost first
    in_progress: Vec<String>,
    /// Identities of the modules already spliced into the program
    loaded: HashSet<String>,
}

impl Frontend {
    pub fn new(config: Config, provider: Box<dyn SourceProvider>) -> Self {
        Frontend {
            config,
            provider,
            in_progress: vec![],
            loaded: HashSet::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compiles `module` and everything it imports.
    ///
    /// # Returns
    ///
    /// The analyzed program, or every diagnostic of the first phase that
    /// reported any, in the order they were found.
    pub fn compile(&mut self, module: &str) -> Result<Compilation, Vec<Error>> {
        let start = Instant::now();
        let mut errors = ErrorStack::new();

        self.in_progress.clear();
        self.loaded.clear();

        let identity = self.provider.identify(module);
        self.in_progress.push(identity.clone());
        let toplevel = self.parse_module(module, &Position::null(), &mut errors);
        self.in_progress.pop();
        self.loaded.insert(identity);

        let mut toplevel = match toplevel {
            Some(toplevel) if errors.is_empty() => toplevel,
            _ => return Err(errors.drain()),
        };

        if self.config.show_ast() {
            println!("{}", AstPrinter::print(&toplevel));
        }

        let analyze_start = Instant::now();
        let mut symtable = SymTable::new();
        symtable.analyze(&mut toplevel, &mut errors);
        info!(module, elapsed = ?analyze_start.elapsed(), "symbol pass completed");

        if self.config.show_symtable() {
            println!("{}", symtable.dump());
        }

        if !errors.is_empty() {
            return Err(errors.drain());
        }

        info!(module, elapsed = ?start.elapsed(), "frontend finished");
        Ok(Compilation { toplevel, symtable })
    }

    /// Lexes and parses a single module.
    ///
    /// Returns `None` when the module cannot be found, fails to lex, or
    /// holds no tokens. `position` is where the module was requested.
    fn parse_module(
        &mut self,
        module: &str,
        position: &Position,
        errors: &mut ErrorStack,
    ) -> Option<Toplevel> {
        let Some(source) = self.provider.load(module) else {
            errors.push(
                ErrorImpl::ModuleNotFound {
                    module: module.to_string(),
                },
                position.clone(),
            );
            return None;
        };
        debug!(module, file = %source.name, "resolved module");

        let lex_start = Instant::now();
        let reported = errors.len();
        let tokens = tokenize(source.text, Some(source.name.clone()), errors);
        info!(file = %source.name, elapsed = ?lex_start.elapsed(), "tokenized");

        if self.config.show_tokens() {
            for token in &tokens {
                println!("{}", token.debug());
            }
        }

        if errors.len() > reported {
            return None;
        }

        let has_content = tokens
            .iter()
            .any(|token| !matches!(token.kind, TokenKind::Terminator | TokenKind::EOF));
        if !has_content {
            errors.push(
                ErrorImpl::EmptyModule {
                    module: module.to_string(),
                },
                position.clone(),
            );
            return None;
        }

        let parse_start = Instant::now();
        let file = Rc::new(source.name.clone());
        let mut toplevel = parse(tokens, file, self, errors);
        toplevel.module = module.to_string();
        info!(file = %source.name, elapsed = ?parse_start.elapsed(), "ast built");

        Some(toplevel)
    }
}

impl ImportHandler for Frontend {
    fn import(
        &mut self,
        module: &str,
        position: &Position,
        errors: &mut ErrorStack,
    ) -> Option<Toplevel> {
        let identity = self.provider.identify(module);

        if self.in_progress.contains(&identity) {
            errors.push(
                ErrorImpl::CyclicImport {
                    module: module.to_string(),
                },
                position.clone(),
            );
            return None;
        }

        if self.loaded.contains(&identity) {
            debug!(module, %identity, "module already imported");
            return None;
        }

        self.in_progress.push(identity.clone());
        let toplevel = self.parse_module(module, position, errors);
        self.in_progress.pop();
        self.loaded.insert(identity);

        toplevel
    }
}

/// Compiles a single in-memory module named `main`.
pub fn compile_source(source: &str) -> Result<Compilation, Vec<Error>> {
    let provider = MemoryProvider::new().with_module("main", source);
    Frontend::new(Config::default(), Box::new(provider)).compile("main")
}

#[cfg(test)]
mod tests {
    use crate::config::Config;

    use super::{compile_source, Frontend, MemoryProvider};

    fn frontend(provider: MemoryProvider) -> Frontend {
        Frontend::new(Config::default(), Box::new(provider))
    }

    fn messages(errors: &[crate::errors::errors::Error]) -> Vec<String> {
        errors.iter().map(|error| error.message()).collect()
    }

    #[test]
    fn test_compile_source() {
        let compilation = compile_source("fn main() int {\n return 0\n}").unwrap();

        assert_eq!(compilation.toplevel.module, "main");
        assert!(compilation.toplevel.analyzed);
        assert!(compilation.symtable.function("main").is_some());
    }

    #[test]
    fn test_imports_are_spliced() {
        let provider = MemoryProvider::new()
            .with_module("main", "import \"io\"\nfn main() {\n print(\"hi\")\n}")
            .with_module("io", "extern fn puts(char* s) int\nfn print(char* s) {\n puts(s)\n}");

        let compilation = frontend(provider).compile("main").unwrap();

        assert_eq!(compilation.toplevel.functions().count(), 2);
        assert_eq!(compilation.toplevel.externs().count(), 1);
    }

    #[test]
    fn test_diamond_import_is_loaded_once() {
        let provider = MemoryProvider::new()
            .with_module("main", "import \"a\"\nimport \"b\"\nfn main() {\n}")
            .with_module("a", "import \"shared\"\nfn a() {\n}")
            .with_module("b", "import \"shared\"\nfn b() {\n}")
            .with_module("shared", "fn shared() {\n}");

        let compilation = frontend(provider).compile("main").unwrap();

        assert_eq!(compilation.toplevel.functions().count(), 4);
    }

    #[test]
    fn test_cyclic_import() {
        let provider = MemoryProvider::new()
            .with_module("main", "import \"a\"\nfn main() {\n}")
            .with_module("a", "import \"main\"\nfn a() {\n}");

        let errors = frontend(provider).compile("main").unwrap_err();

        assert_eq!(messages(&errors), vec!["Cyclic import of module 'main'"]);
        assert_eq!(errors[0].get_position().file.as_str(), "a.gh");
    }

    #[test]
    fn test_missing_modules() {
        let errors = frontend(MemoryProvider::new()).compile("main").unwrap_err();
        assert_eq!(messages(&errors), vec!["Could not find module 'main'"]);

        let provider = MemoryProvider::new().with_module("main", "import \"gone\"\nfn main() {\n}");
        let errors = frontend(provider).compile("main").unwrap_err();
        assert_eq!(messages(&errors), vec!["Could not find module 'gone'"]);
        assert_eq!(errors[0].get_position().row, 1);
    }

    #[test]
    fn test_empty_module() {
        let provider = MemoryProvider::new()
            .with_module("main", "import \"blank\"\nfn main() {\n}")
            .with_module("blank", "// nothing here\n");

        let errors = frontend(provider).compile("main").unwrap_err();

        assert_eq!(
            messages(&errors),
            vec!["Module 'blank' does not contain any valid tokens"]
        );
    }

    #[test]
    fn test_module_with_only_a_repeated_import() {
        let provider = MemoryProvider::new()
            .with_module("main", "import \"a\"\nimport \"b\"\nfn main() {\n}")
            .with_module("a", "import \"shared\"\nfn a() {\n}")
            .with_module("b", "import \"shared\"\n")
            .with_module("shared", "fn shared() {\n}");

        let compilation = frontend(provider).compile("main").unwrap();

        assert_eq!(compilation.toplevel.functions().count(), 3);
    }

    #[test]
    fn test_lexical_errors_stop_before_parsing() {
        let errors = compile_source("fn main() {\n int a = $\n}").unwrap_err();

        assert_eq!(messages(&errors), vec!["Unrecognized token '$'"]);
    }

    #[test]
    fn test_semantic_errors_are_returned_in_order() {
        let errors = compile_source("fn main() {\n a = 1\n b = 2\n}").unwrap_err();

        assert_eq!(
            messages(&errors),
            vec![
                "Variable 'a' used but never defined",
                "Variable 'b' used but never defined"
            ]
        );
        assert_eq!(errors[1].to_string(), "main.gh:3:2\nVariable 'b' used but never defined");
    }
}

//! Integration tests for end-to-end compilation.
//!
//! These tests drive the frontend from source text, or from files on disk,
//! through lexing, parsing and semantic analysis.

use std::{fs, process::Command};

use ghoul::{
    ast::{
        ast::Expr,
        printer::render_expr,
        statements::{Stmt, Toplevel},
    },
    config::Config,
    errors::errors::Error,
    frontend::{compile_source, Compilation, FileSystemProvider, Frontend},
};

fn compile_ok(source: &str) -> Compilation {
    match compile_source(source) {
        Ok(compilation) => compilation,
        Err(errors) => panic!("unexpected diagnostics: {:?}", messages(&errors)),
    }
}

fn messages(errors: &[Error]) -> Vec<String> {
    errors.iter().map(|error| error.message()).collect()
}

fn main_body(toplevel: &Toplevel) -> &[Stmt] {
    &toplevel.function("main").expect("main missing").body
}

/// Value of a variable declaration or the expression of an expression statement.
fn expression_of(stmt: &Stmt) -> &Expr {
    match stmt {
        Stmt::VarDecl(decl) => decl.value.as_ref().expect("declaration without value"),
        Stmt::Expression(stmt) => &stmt.expression,
        other => panic!("no expression in {:?}", other),
    }
}

#[test]
fn test_compile_simple_program() {
    let compilation = compile_ok("fn main() int {\n int x = 42\n return x\n}");

    assert!(compilation.toplevel.analyzed);
    assert_eq!(main_body(&compilation.toplevel).len(), 2);
}

#[test]
fn test_operator_precedence() {
    let compilation = compile_ok("fn main() {\n int a = 1 + 2 * 3\n int b = 1 * 2 + 3\n}");
    let body = main_body(&compilation.toplevel);

    assert_eq!(render_expr(expression_of(&body[0])), "(1 + (2 * 3))");
    assert_eq!(render_expr(expression_of(&body[1])), "((1 * 2) + 3)");
}

#[test]
fn test_chained_assignment() {
    let compilation = compile_ok("fn main() {\n int a = 0\n int b = 0\n a = b = 3\n}");
    let body = main_body(&compilation.toplevel);

    assert_eq!(render_expr(expression_of(&body[2])), "(a = (b = 3))");
}

#[test]
fn test_assignment_to_constant() {
    let errors = compile_source("fn main() {\n int a = 0\n 3 = a\n}").unwrap_err();

    assert_eq!(
        messages(&errors),
        vec!["Constant expression or operator result may not appear to the left of an assignment"]
    );
    assert_eq!(errors[0].get_position().row, 3);
}

#[test]
fn test_single_redefinition_diagnostic() {
    let errors = compile_source("fn f() {\n}\nfn f() {\n}\nfn main() {\n f()\n}").unwrap_err();

    assert_eq!(messages(&errors), vec!["Function redefinition 'f'"]);
    assert_eq!(errors[0].to_string(), "main.gh:3:1\nFunction redefinition 'f'");
}

#[test]
fn test_variadic_calls() {
    compile_ok(
        "extern fn printf(char* fmt, ...) int
fn main() {
 printf(\"plain\")
 printf(\"%d %s\", 1, \"two\")
}",
    );

    let errors = compile_source(
        "extern fn printf(char* fmt, ...) int
fn main() {
 printf()
}",
    )
    .unwrap_err();
    assert_eq!(
        messages(&errors),
        vec!["Function call 'printf()' does not match function signature of 'printf(char*, ...)'"]
    );
}

#[test]
fn test_condition_demotion() {
    let compilation = compile_ok("fn main() {\n int a = 1\n if a {\n  a = 2\n }\n}");
    let body = main_body(&compilation.toplevel);

    let Stmt::Branch(branch) = &body[1] else {
        panic!("expected a branch, got {:?}", body[1]);
    };
    assert_eq!(render_expr(&branch.condition), "(a != 0)");
    assert!(branch.condition.get_type().is_scalar("bool"));
}

#[test]
fn test_dead_code_after_return_is_pruned() {
    let compilation = compile_ok("fn main() int {\n return 1\n int unreachable = 2\n return 3\n}");

    assert_eq!(main_body(&compilation.toplevel).len(), 1);
}

#[test]
fn test_volatile_member_offset() {
    let compilation =
        compile_ok("volatile struct P {\n int x\n char c\n}\nfn main() {\n P p\n p.c = <char> 1\n}");
    let symtable = &compilation.symtable;
    let p = symtable.struct_type("P").expect("P missing").clone();

    assert_eq!(symtable.member_offset(&p, "c"), Some(1));
}

#[test]
fn test_imports_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("main.gh"),
        "import \"util\"\nfn main() int {\n return twice(2)\n}",
    )
    .unwrap();
    fs::write(
        dir.path().join("util.gh"),
        "fn twice(int n) int {\n return n * 2\n}",
    )
    .unwrap();

    let config = Config::default();
    let provider = FileSystemProvider::new(dir.path(), &config);
    let compilation = Frontend::new(config, Box::new(provider))
        .compile("main")
        .unwrap();

    assert!(compilation.symtable.function("twice").is_some());
}

#[test]
fn test_imports_from_library_directory() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("ghoul").join("examples").join("hello");
    let lib = dir.path().join("ghoul").join("lib");
    fs::create_dir_all(&project).unwrap();
    fs::create_dir_all(&lib).unwrap();

    fs::write(
        project.join("main.gh"),
        "import \"io\"\nfn main() {\n say(\"hi\")\n}",
    )
    .unwrap();
    fs::write(
        lib.join("io.gh"),
        "extern fn puts(char* s) int\nfn say(char* s) {\n puts(s)\n}",
    )
    .unwrap();

    let config = Config::default();
    let provider = FileSystemProvider::new(&project, &config);
    assert_eq!(provider.resolve("io"), Some(lib.join("io.gh")));
    assert_eq!(provider.resolve("missing"), None);

    let compilation = Frontend::new(config, Box::new(provider))
        .compile("main")
        .unwrap();
    assert!(compilation.symtable.function("say").is_some());
}

#[test]
fn test_diagnostics_from_imported_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("main.gh"), "import \"bad\"\nfn main() {\n}").unwrap();
    fs::write(dir.path().join("bad.gh"), "fn broken() {\n int a = \"text\"\n}").unwrap();

    let config = Config::default();
    let provider = FileSystemProvider::new(dir.path(), &config);
    let errors = Frontend::new(config, Box::new(provider))
        .compile("main")
        .unwrap_err();

    assert_eq!(
        errors[0].to_string(),
        "bad.gh:2:2\nCannot assign value of type 'char*' to variable of type 'int'"
    );
}

#[test]
fn test_cli_reports_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("main.gh");
    fs::write(&source, "fn main() {\n missing()\n}").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_ghoul"))
        .arg("build")
        .arg(&source)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("main.gh:2:2\nFunction 'missing' does not exist"));
    assert!(stderr.contains("2 | missing()"));
}

#[cfg(not(feature = "llvm"))]
#[test]
fn test_cli_accepts_valid_program() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("main.gh");
    fs::write(&source, "fn main() int {\n return 0\n}").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_ghoul"))
        .arg("build")
        .arg(&source)
        .output()
        .unwrap();

    assert!(output.status.success());
}

#[test]
fn test_cli_finds_library_from_relative_path() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("ghoul").join("examples");
    let lib = dir.path().join("ghoul").join("lib");
    fs::create_dir_all(&project).unwrap();
    fs::create_dir_all(&lib).unwrap();

    fs::write(
        project.join("main.gh"),
        "import \"io\"\nfn main() int {\n say(\"hi\")\n return 0\n}",
    )
    .unwrap();
    fs::write(
        lib.join("io.gh"),
        "extern fn puts(char* s) int\nfn say(char* s) {\n puts(s)\n}",
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_ghoul"))
        .current_dir(&project)
        .arg("build")
        .arg("main.gh")
        .output()
        .unwrap();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("Could not find module"), "{}", stderr);
    #[cfg(not(feature = "llvm"))]
    assert!(output.status.success(), "{}", stderr);
}

#[test]
fn test_one_file_imported_under_two_names_loads_once() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("util")).unwrap();
    fs::write(
        dir.path().join("main.gh"),
        "import \"io\"\nimport \"util/../io\"\nfn main() {\n say()\n}",
    )
    .unwrap();
    fs::write(dir.path().join("io.gh"), "fn say() {\n}").unwrap();

    let config = Config::default();
    let provider = FileSystemProvider::new(dir.path(), &config);
    let compilation = Frontend::new(config, Box::new(provider))
        .compile("main")
        .unwrap();

    assert_eq!(compilation.toplevel.functions().count(), 2);
}

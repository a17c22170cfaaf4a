//! Unit tests for semantic analysis.

use std::rc::Rc;

use crate::{
    ast::{
        ast::Expr,
        printer::render_expr,
        statements::{Stmt, Toplevel},
        types::Type,
    },
    errors::errors::ErrorStack,
    lexer::lexer::tokenize,
    parser::parser::{parse, NoImports},
};

use super::symtable::SymTable;

fn analyze(source: &str) -> (Toplevel, SymTable, ErrorStack) {
    let mut errors = ErrorStack::new();
    let tokens = tokenize(source.to_string(), Some("test.gh".to_string()), &mut errors);
    let mut toplevel = parse(
        tokens,
        Rc::new("test.gh".to_string()),
        &mut NoImports,
        &mut errors,
    );
    assert!(errors.is_empty(), "syntax errors: {:?}", errors.errors());

    let mut symtable = SymTable::new();
    symtable.analyze(&mut toplevel, &mut errors);
    (toplevel, symtable, errors)
}

fn messages(errors: &ErrorStack) -> Vec<String> {
    errors.errors().iter().map(|error| error.message()).collect()
}

fn names(errors: &ErrorStack) -> Vec<&str> {
    errors.errors().iter().map(|error| error.get_error_name()).collect()
}

#[test]
fn test_well_typed_program() {
    let (_, _, errors) = analyze(
        "extern fn printf(char* fmt, ...) int
struct Point { int x; int y }
fn length(Point p) int {
    return p.x * p.x + p.y * p.y
}
fn main() int {
    Point p
    p.x = 3
    var n = length(p)
    printf(\"%d\\n\", n)
    return 0
}",
    );

    assert!(errors.is_empty(), "{:?}", messages(&errors));
}

#[test]
fn test_function_redefinition_reported_once() {
    let (_, symtable, errors) = analyze("fn f() {\n}\nfn f() int {\n return 1\n}\nextern fn f()");

    assert_eq!(
        messages(&errors),
        vec!["Function redefinition 'f'", "Function redefinition 'f'"]
    );
    assert!(symtable.function("f").unwrap().return_type.is_void());
}

#[test]
fn test_type_redefinition() {
    let (_, symtable, errors) = analyze("struct S { int a }\nstruct S { char b }\nstruct int { int c }");

    assert_eq!(names(&errors), vec!["TypeRedefinition", "TypeRedefinition"]);
    assert!(symtable.member_type(&Type::named("S"), "a").is_some());
    assert!(symtable.member_type(&Type::named("S"), "b").is_none());
}

#[test]
fn test_variable_redefinition_and_shadowing() {
    let (_, _, errors) = analyze(
        "fn main() {
    int a = 1
    int a = 2
    if true {
        int a = 3
    }
}",
    );

    assert_eq!(messages(&errors), vec!["Redefinition of variable 'a'"]);
}

#[test]
fn test_sibling_blocks_do_not_share_locals() {
    let (_, _, errors) = analyze(
        "fn main() {
    if true {
        int inner = 1
    }
    inner = 2
}",
    );

    assert_eq!(
        messages(&errors),
        vec!["Variable 'inner' used but never defined"]
    );
}

#[test]
fn test_local_named_like_function() {
    let (_, _, errors) = analyze("fn helper() {\n}\nfn main() {\n int helper = 1\n}");

    assert_eq!(messages(&errors), vec!["Redefinition of identifier 'helper'"]);
}

#[test]
fn test_unknown_and_void_types() {
    let (_, _, errors) = analyze("fn main() {\n Missing m\n void v\n void* ok\n}");

    assert_eq!(
        messages(&errors),
        vec![
            "Type 'Missing' is not defined",
            "May not declare variable of type 'void'"
        ]
    );
}

#[test]
fn test_var_infers_initializer_type() {
    let (toplevel, symtable, errors) = analyze("fn main() {\n var s = \"hi\"\n var n = 2 * 3\n}");

    assert!(errors.is_empty());
    let body = &toplevel.function("main").unwrap().body;
    let Stmt::VarDecl(s) = &body[0] else { panic!() };
    assert_eq!(s.ty, Type::pointer("char", 1));
    let Stmt::VarDecl(n) = &body[1] else { panic!() };
    assert_eq!(n.ty, Type::int());

    let locals = symtable.locals_of("main").unwrap();
    assert_eq!(locals.len(), 2);
    assert_eq!(locals[1].name, "n");
}

#[test]
fn test_declaration_initializer_must_match() {
    let (_, _, errors) = analyze("fn main() {\n int a = 1.5\n}");

    assert_eq!(
        messages(&errors),
        vec!["Cannot assign value of type 'float' to variable of type 'int'"]
    );
}

#[test]
fn test_variadic_call_matching() {
    let (_, _, errors) = analyze(
        "extern fn printf(char* fmt, ...) int
fn main() {
    printf(\"a\")
    printf(\"%d %d\", 1, 2)
    printf()
}",
    );

    assert_eq!(
        messages(&errors),
        vec!["Function call 'printf()' does not match function signature of 'printf(char*, ...)'"]
    );
}

#[test]
fn test_void_pointer_parameter_accepts_pointers_and_arrays() {
    let (_, _, errors) = analyze(
        "extern fn free(void* ptr)
fn main() {
    int* p
    []char buffer
    free(p)
    free(buffer)
    free(3)
}",
    );

    assert_eq!(
        messages(&errors),
        vec!["Function call 'free(int)' does not match function signature of 'free(void*)'"]
    );
}

#[test]
fn test_undefined_function() {
    let (_, _, errors) = analyze("fn main() {\n launch(1)\n}");

    assert_eq!(messages(&errors), vec!["Function 'launch' does not exist"]);
}

#[test]
fn test_condition_demotion() {
    let (toplevel, _, errors) = analyze(
        "fn main() {
    int n = 3
    int* p
    while n {
        n -= 1
    }
    if p {
    }
    if n == 0 {
    }
}",
    );

    assert!(errors.is_empty(), "{:?}", messages(&errors));
    let body = &toplevel.function("main").unwrap().body;

    let Stmt::Loop(loop_stmt) = &body[2] else { panic!() };
    assert_eq!(render_expr(&loop_stmt.condition), "(n != 0)");
    assert_eq!(loop_stmt.condition.get_type(), &Type::bool());

    let Stmt::Branch(pointer) = &body[3] else { panic!() };
    assert_eq!(render_expr(&pointer.condition), "(p != 0)");

    let Stmt::Branch(compare) = &body[4] else { panic!() };
    assert_eq!(render_expr(&compare.condition), "(n == 0)");
}

#[test]
fn test_condition_must_be_boolean() {
    let (_, _, errors) = analyze("fn main() {\n float f = 1.0\n if f {\n }\n}");

    assert_eq!(
        messages(&errors),
        vec!["Cannot translate result of expression of type 'float' into type 'bool'"]
    );
}

#[test]
fn test_statements_after_return_are_pruned() {
    let (toplevel, _, errors) = analyze(
        "fn f() int {
    return 1
    f()
    int dead = 2
}",
    );

    assert!(errors.is_empty());
    let body = &toplevel.function("f").unwrap().body;
    assert_eq!(body.len(), 1);
    assert!(matches!(body[0], Stmt::Return(_)));
}

#[test]
fn test_nested_return_does_not_prune() {
    let (toplevel, _, errors) = analyze(
        "fn f(bool b) int {
    if b {
        return 1
    }
    return 2
}",
    );

    assert!(errors.is_empty());
    assert_eq!(toplevel.function("f").unwrap().body.len(), 2);
}

#[test]
fn test_missing_return() {
    let (_, _, errors) = analyze("fn f() int {\n}");

    assert_eq!(
        messages(&errors),
        vec!["Function 'f' does not return a value, expected return of type 'int'"]
    );
}

#[test]
fn test_return_type_checks() {
    let (_, _, errors) = analyze(
        "fn f() int {
    return 1.5
}
fn g() {
    return 1
}
fn h() int {
    return
}",
    );

    assert_eq!(
        names(&errors),
        vec!["ReturnTypeMismatch", "ReturnValueInVoid", "ReturnTypeMismatch"]
    );
}

#[test]
fn test_binary_operator_types() {
    let (toplevel, _, errors) = analyze(
        "fn main() {
    int a = 1
    float b = 2.0
    bool c = a < 2
    a = a + b
    c = c + c
}",
    );

    assert_eq!(
        messages(&errors),
        vec![
            "Type mismatch, cannot perform '+' with 'int' and a 'float'",
            "Cannot apply '+' to type 'bool'"
        ]
    );

    let body = &toplevel.function("main").unwrap().body;
    let Stmt::VarDecl(c) = &body[2] else { panic!() };
    assert_eq!(c.value.as_ref().unwrap().get_type(), &Type::bool());
}

#[test]
fn test_assignment_mismatch() {
    let (_, _, errors) = analyze("fn main() {\n int a = 1\n a = true\n}");

    assert_eq!(
        messages(&errors),
        vec!["Cannot assign value of type 'bool' to variable of type 'int'"]
    );
}

#[test]
fn test_pointer_operators() {
    let (toplevel, _, errors) = analyze(
        "fn main() {
    int a = 1
    int* p = &a
    int** pp = &p
    *p = 2
    a = *a
}",
    );

    assert_eq!(messages(&errors), vec!["Cannot dereference further"]);

    let body = &toplevel.function("main").unwrap().body;
    let Stmt::VarDecl(pp) = &body[2] else { panic!() };
    assert_eq!(pp.value.as_ref().unwrap().get_type(), &Type::pointer("int", 2));
}

#[test]
fn test_array_operators() {
    let (toplevel, _, errors) = analyze(
        "fn main() {
    []int xs = [4]int
    xs <- 3
    int n = xs?
    int last = xs->
    int first = xs[0]
    xs <- 1.5
}",
    );

    assert_eq!(
        messages(&errors),
        vec!["Type mismatch, cannot perform '<-' with '[]int' and a 'float'"]
    );

    let body = &toplevel.function("main").unwrap().body;
    let Stmt::VarDecl(first) = &body[4] else { panic!() };
    let Some(Expr::Index(index)) = &first.value else { panic!() };
    assert_eq!(index.ty, Type::int());
}

#[test]
fn test_array_misuse() {
    let (_, _, errors) = analyze(
        "fn main() {
    int a = 1
    int b = a[0]
    []int xs = [1.5]int
    int c = xs[true]
    int n = a?
}",
    );

    assert_eq!(
        messages(&errors),
        vec![
            "Cannot index into type 'int'",
            "Array declaration expects length definition to be of type 'int'",
            "Indexing a variable requires the index to be of type 'int'",
            "Cannot apply '?' to type 'int'"
        ]
    );
}

#[test]
fn test_realigned_arrays() {
    let (_, _, errors) = analyze(
        "struct Particle { float x; float y }
fn main() {
    []@Particle ps = [16]@Particle
    float x = ps[0].x
    ps[1].y = x
    Particle whole = ps[0]
    float bad = ps.x
    []@int ints = [2]@int
}",
    );

    assert_eq!(
        names(&errors),
        vec!["RealignedIndexWithoutMember", "UnknownMember", "RealignedElement"]
    );
}

#[test]
fn test_member_access() {
    let (_, _, errors) = analyze(
        "struct Point { int x; int y }
fn main() {
    Point p
    Point* ptr = &p
    int x = p.x
    int z = p.z
    int w = ptr.x
}",
    );

    assert_eq!(
        messages(&errors),
        vec![
            "Type 'Point' has no member 'z'",
            "Type 'Point*' has no member 'x'"
        ]
    );
}

#[test]
fn test_casts() {
    let (toplevel, _, errors) = analyze(
        "fn main() {
    int a = 1
    float f = <float>a
    char* raw = <char*>&a
    int bad = <Missing>a
}",
    );

    assert_eq!(messages(&errors), vec!["Cannot cast 'int' into 'Missing'"]);

    let body = &toplevel.function("main").unwrap().body;
    let Stmt::VarDecl(raw) = &body[2] else { panic!() };
    assert_eq!(raw.value.as_ref().unwrap().get_type(), &Type::pointer("char", 1));
}

#[test]
fn test_struct_member_errors() {
    let (_, _, errors) = analyze(
        "struct A { int x; Missing m; int x; void v }
struct Node { Node* next; []Node children }
struct Loop { Loop inner }",
    );

    assert_eq!(
        names(&errors),
        vec![
            "UnknownType",
            "MemberRedefinition",
            "VoidVariable",
            "RecursiveStruct"
        ]
    );
}

#[test]
fn test_volatile_layout_keeps_declaration_order() {
    let (_, symtable, errors) = analyze("volatile struct P { int x; char c }");

    assert!(errors.is_empty());
    let p = Type::named("P");
    assert_eq!(symtable.member_offset(&p, "x"), Some(0));
    assert_eq!(symtable.member_offset(&p, "c"), Some(1));
    assert_eq!(symtable.member_byte_offset(&p, "c"), Some(4));
}

#[test]
fn test_layout_orders_members_by_size() {
    let (_, symtable, errors) = analyze("struct Q { char c; int x; bool b; char* name }");

    assert!(errors.is_empty());
    let order: Vec<_> = symtable
        .layout("Q")
        .unwrap()
        .iter()
        .map(|member| member.name.as_str())
        .collect();
    assert_eq!(order, vec!["name", "x", "c", "b"]);

    let q = Type::named("Q");
    assert_eq!(symtable.member_offset(&q, "c"), Some(2));
    assert_eq!(symtable.member_byte_offset(&q, "b"), Some(13));
    assert_eq!(symtable.size_of(&q), 14);
}

#[test]
fn test_size_of_resolves_structs() {
    let (_, symtable, _) = analyze("struct V { float x; float y; float z }\nstruct W { V a; int n }");

    assert_eq!(symtable.size_of(&Type::named("V")), 12);
    assert_eq!(symtable.size_of(&Type::named("W")), 16);
    assert_eq!(symtable.size_of(&Type::realigned_array(Type::named("V"))), 8 + 3 * 8);
    assert_eq!(symtable.size_of(&Type::array(Type::named("V"))), 16);
}

#[test]
fn test_analysis_is_idempotent() {
    let (mut toplevel, mut symtable, mut errors) = analyze("fn f() int {\n}");
    assert_eq!(errors.len(), 1);

    symtable.analyze(&mut toplevel, &mut errors);
    assert_eq!(errors.len(), 1);
    assert!(toplevel.analyzed);
}

#[test]
fn test_dump_lists_types_and_functions() {
    let (_, symtable, _) = analyze("struct Point { int x }\nextern fn puts(char* s) int");
    let dump = symtable.dump();

    assert!(dump.starts_with("Types:\n"));
    assert!(dump.contains("Point\n\tint x"));
    assert!(dump.contains("Functions:\nputs\n\treturns int\n\tchar* s\n"));
}

#[test]
fn test_local_named_like_struct() {
    let (_, _, errors) = analyze("struct P {\n int x\n}\nfn main() {\n int P = 3\n}");

    assert_eq!(messages(&errors), vec!["Redefinition of identifier 'P'"]);
}

#[test]
fn test_parameter_named_like_struct() {
    let (_, _, errors) = analyze("struct P {\n int x\n}\nfn take(int P) {\n}\nfn main() {\n}");

    assert_eq!(messages(&errors), vec!["Redefinition of identifier 'P'"]);
}

#[test]
fn test_realigned_and_plain_arrays_do_not_mix() {
    let (_, _, errors) = analyze(
        "struct P { int x; int y }
fn take([]P items) {
}
fn main() {
    []P a = [4]@P
    []@P b = [4]@P
    []P c = [4]P
    c = [2]@P
    take(b)
    a[0] = a[1]
}",
    );

    assert_eq!(
        messages(&errors),
        vec![
            "Cannot assign value of type '[]@P' to variable of type '[]P'",
            "Cannot assign value of type '[]@P' to variable of type '[]P'",
            "Function call 'take([]@P)' does not match function signature of 'take([]P)'"
        ]
    );
}

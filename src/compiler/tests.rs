use inkwell::context::Context;

use crate::frontend::compile_source;

use super::compiler::compile;

/// Compiles `source` to verified IR text.
fn ir_of(source: &str) -> String {
    let compilation = compile_source(source).expect("frontend errors");
    let context = Context::create();
    let module = compile(&context, &compilation.toplevel, &compilation.symtable, "main")
        .expect("code generation failed");

    module.print_to_string().to_string()
}

#[test]
fn test_functions_and_calls() {
    let ir = ir_of(
        "fn add(int a, int b) int {
 return a + b
}
fn main() int {
 return add(1, 2 * 3)
}",
    );

    assert!(ir.contains("define i32 @add(i32 %a, i32 %b)"));
    assert!(ir.contains("define i32 @main()"));
    assert!(ir.contains("call i32 @add"));
}

#[test]
fn test_variadic_extern_promotes_floats() {
    let ir = ir_of(
        "extern fn printf(char* fmt, ...) int
fn main() {
 float f = 1.5
 printf(\"%f %d\\n\", f, 3)
}",
    );

    assert!(ir.contains("declare i32 @printf(i8*, ...)"));
    assert!(ir.contains("fpext float"));
}

#[test]
fn test_control_flow() {
    let ir = ir_of(
        "fn count(int n) int {
 int total = 0
 for int i = 0; i < n; i += 1 {
  if i % 2 == 0 {
   total += i
  } else {
   total -= 1
  }
 }
 while total {
  total -= 1
 }
 return total
}",
    );

    assert!(ir.contains("condition:"));
    assert!(ir.contains("icmp ne i32"));
    assert!(ir.contains("srem i32"));
}

#[test]
fn test_returning_from_both_branches() {
    let ir = ir_of(
        "fn sign(int n) int {
 if n < 0 {
  return 0 - 1
 } else {
  return 1
 }
 return 0
}",
    );

    assert!(ir.contains("define i32 @sign(i32 %n)"));
}

#[test]
fn test_struct_members_follow_layout() {
    let ir = ir_of(
        "struct Q {
 char c
 int x
}
fn main() int {
 Q q
 q.x = 4
 q.c = <char> 1
 return q.x
}",
    );

    assert!(ir.contains("%Q = type { i32, i8 }"));
    assert!(ir.contains("getelementptr inbounds %Q, %Q* %q, i32 0, i32 0"));
}

#[test]
fn test_volatile_struct_keeps_declaration_order() {
    let ir = ir_of(
        "volatile struct P {
 char c
 int x
}
fn main() {
 P p
 p.x = 1
}",
    );

    assert!(ir.contains("%P = type { i8, i32 }"));
}

#[test]
fn test_arrays() {
    let ir = ir_of(
        "fn main() int {
 []int values = [4]int
 values[0] = 7
 values <- 9
 int last = values->
 return values? + last
}",
    );

    assert!(ir.contains("%\"[]int\" = type { i32*, i32, i32 }"));
    assert!(ir.contains("call i8* @malloc"));
    assert!(ir.contains("call i8* @realloc"));
}

#[test]
fn test_realigned_arrays() {
    let ir = ir_of(
        "struct S {
 int a
 float b
}
fn main() int {
 []@S items = [2]@S
 items[1].a = 3
 return items[1].a
}",
    );

    assert!(ir.contains("%\"[]@S\" = type { i32, i32, i32*, float* }"));
}

#[test]
fn test_pointers_and_void_pointer_arguments() {
    let ir = ir_of(
        "extern fn free(void* p)
fn main() {
 int a = 1
 int* p = &a
 *p = 2
 []int values = [1]int
 free(values)
}",
    );

    assert!(ir.contains("call void @free(i8*"));
}

#[test]
fn test_casts() {
    let ir = ir_of(
        "fn main() int {
 int n = 300
 float f = <float> n
 char c = <char> n
 return <int> f + <int> c
}",
    );

    assert!(ir.contains("sitofp i32"));
    assert!(ir.contains("fptosi float"));
    assert!(ir.contains("trunc i32"));
}

//! End-to-end tests: compile whole programs and inspect diagnostics,
//! status, and the built IR.

use hlslc_analysis::collect_violations;
use hlslc_ir::{
    dump_program, JumpKind, Modifiers, NodeKind, Program, RegisterKind, ShaderType, TypeClass,
};
use hlslc_parser::{compile, CompileOptions, CompileOutput, Status};

fn compile_entry(source: &str, entry: &str) -> CompileOutput {
    let options = CompileOptions::new(entry, ShaderType::Pixel, 2, 0);
    compile(source, "test.fx", &options)
}

fn compile_ps(source: &str) -> CompileOutput {
    compile_entry(source, "main")
}

/// Compiles expecting success and structurally valid IR.
fn compile_ok(source: &str) -> Program {
    let output = compile_ps(source);
    assert_ne!(
        output.status,
        Status::Error,
        "unexpected errors:\n{}",
        output.diagnostics
    );
    let program = output.program.expect("program should be built");
    let violations = collect_violations(&program);
    assert!(
        violations.is_empty(),
        "IR violations: {violations:?}\n{}",
        dump_program(&program)
    );
    program
}

/// Compiles expecting an error; returns the diagnostics.
fn compile_err(source: &str) -> String {
    let output = compile_ps(source);
    assert_eq!(
        output.status,
        Status::Error,
        "expected errors, got:\n{}",
        output.diagnostics
    );
    assert!(output.program.is_none(), "no IR may be surfaced on error");
    output.diagnostics
}

fn entry_body(program: &Program) -> &[hlslc_ir::Handle<hlslc_ir::Node>] {
    let entry = program.entry.expect("entry selected");
    program.functions[entry].body.as_deref().expect("entry body")
}

// ---- Spec scenarios ----

#[test]
fn swizzle_of_swizzle_returns_float4() {
    let program = compile_ok("float4 main(float4 p : TEXCOORD) : COLOR { return p.xyz.xxyy; }");
    let body = entry_body(&program);
    let last = *body.last().unwrap();
    let NodeKind::Jump(JumpKind::Return(Some(value))) = program.nodes[last].kind else {
        panic!("body must end in a value-bearing return");
    };
    // The returned value is a swizzle of a swizzle.
    let NodeKind::Swizzle { base, count, .. } = program.nodes[value].kind else {
        panic!("return value must be a swizzle");
    };
    assert_eq!(count, 4);
    assert!(matches!(
        program.nodes[base].kind,
        NodeKind::Swizzle { count: 3, .. }
    ));
    let ty = &program.types[program.nodes[value].ty];
    assert_eq!(ty.class, TypeClass::Vector);
    assert_eq!(ty.dimx, 4);
}

#[test]
fn struct_initializer_distributes_scalars() {
    let program = compile_ok(
        "struct S { float a; float2 b; };\n\
         float main() : COLOR { S s = {1.0, 2.0, 3.0}; return s.a + s.b.x; }",
    );
    let body = entry_body(&program);
    let assignments = body
        .iter()
        .filter(|&&h| matches!(program.nodes[h].kind, NodeKind::Assign { .. }))
        .count();
    assert_eq!(assignments, 3, "one store per initializer value");
    assert!(matches!(
        program.nodes[*body.last().unwrap()].kind,
        NodeKind::Jump(JumpKind::Return(Some(_)))
    ));
}

#[test]
fn const_without_initializer_is_an_error() {
    let diagnostics = compile_err("float4 main() : COLOR { const int x; return 0; }");
    assert!(
        diagnostics.contains("const variable 'x' without initializer"),
        "{diagnostics}"
    );
    assert!(diagnostics.starts_with("test.fx:1:"));
}

#[test]
fn scalar_broadcasts_into_swizzle_store() {
    let program = compile_ok("float4 main() : COLOR { float4 v; v.xy = 1.0; return v; }");
    let body = entry_body(&program);
    // Find the store through the swizzle; its rhs must be a cast of the
    // scalar constant up to float2.
    let assign = body
        .iter()
        .find_map(|&h| match program.nodes[h].kind {
            NodeKind::Assign { lhs, rhs, .. } => Some((lhs, rhs)),
            _ => None,
        })
        .expect("a store must be lowered");
    assert!(matches!(
        program.nodes[assign.0].kind,
        NodeKind::Swizzle { count: 2, .. }
    ));
    let rhs_ty = &program.types[program.nodes[assign.1].ty];
    assert_eq!(rhs_ty.dimx, 2);
}

#[test]
fn vector_indexing_is_not_range_checked() {
    compile_ok("float main() : COLOR { float3 v; return v[4]; }");
}

#[test]
fn out_of_range_swizzle_is_an_error() {
    let diagnostics = compile_err("float main() : COLOR { float3 v; return v.abcd; }");
    assert!(diagnostics.contains("invalid swizzle 'abcd'"), "{diagnostics}");
}

#[test]
fn for_loop_lowers_to_canonical_shape() {
    let program =
        compile_ok("float main() : COLOR { for (int i = 0; i < 4; ++i) { } return 0; }");
    let body = entry_body(&program);

    let (loop_body, next_index) = body
        .iter()
        .find_map(|&h| match &program.nodes[h].kind {
            NodeKind::Loop { body, next_index } => Some((body.clone(), *next_index)),
            _ => None,
        })
        .expect("a loop must be lowered");

    // The loop body starts with the negated-condition break, then the
    // (empty) user body, then the iteration.
    let break_check = loop_body
        .iter()
        .find(|&&h| matches!(program.nodes[h].kind, NodeKind::If { .. }))
        .expect("condition break");
    let NodeKind::If {
        condition,
        ref then_block,
        ..
    } = program.nodes[*break_check].kind
    else {
        unreachable!();
    };
    assert!(matches!(
        program.nodes[condition].kind,
        NodeKind::Expr {
            op: hlslc_ir::ExprOp::LogicNot,
            ..
        }
    ));
    assert!(matches!(
        program.nodes[then_block[0]].kind,
        NodeKind::Jump(JumpKind::Break)
    ));
    // The increment trails the body.
    assert!(matches!(
        program.nodes[*loop_body.last().unwrap()].kind,
        NodeKind::Assign { .. }
    ));

    // Liveness of i spans the whole loop.
    let (_, i_var) = program
        .variables
        .iter()
        .find(|(_, v)| v.name == "i")
        .expect("loop variable");
    let loop_index = body
        .iter()
        .find_map(|&h| match program.nodes[h].kind {
            NodeKind::Loop { .. } => Some(program.nodes[h].index),
            _ => None,
        })
        .unwrap();
    assert!(i_var.first_write <= loop_index);
    assert!(i_var.last_read >= next_index);
}

// ---- Declarations and scoping ----

#[test]
fn redefinition_in_same_scope_is_an_error() {
    let diagnostics = compile_err("float4 main() : COLOR { float x; float x; return 0; }");
    assert!(diagnostics.contains("redefinition of 'x'"), "{diagnostics}");
    assert!(diagnostics.contains("note: previous definition is here"));
}

#[test]
fn shadowing_in_inner_scope_is_allowed() {
    compile_ok("float main() : COLOR { float x = 1.0; { float x = 2.0; } return x; }");
}

#[test]
fn globals_become_uniform() {
    let program = compile_ok("float4 tint; float4 main() : COLOR { return tint; }");
    let (_, tint) = program
        .variables
        .iter()
        .find(|(_, v)| v.name == "tint")
        .expect("global variable");
    assert!(tint.modifiers.contains(Modifiers::UNIFORM));
    assert_eq!(tint.first_write, 1);
}

#[test]
fn storage_modifiers_are_rejected_on_locals() {
    let diagnostics = compile_err("float main() : COLOR { uniform float x = 1.0; return x; }");
    assert!(
        diagnostics.contains("modifier not allowed on local variable 'x'"),
        "{diagnostics}"
    );
}

#[test]
fn semantics_are_rejected_on_locals() {
    let diagnostics = compile_err("float main() : COLOR { float x : TEXCOORD0; return x; }");
    assert!(
        diagnostics.contains("semantics are not allowed on local variable 'x'"),
        "{diagnostics}"
    );
}

#[test]
fn array_sizes_are_constant_folded() {
    let program = compile_ok("float arr[2 * 4]; float main() : COLOR { return arr[0]; }");
    let (_, arr) = program
        .variables
        .iter()
        .find(|(_, v)| v.name == "arr")
        .unwrap();
    let ty = &program.types[arr.ty];
    assert_eq!(ty.class, TypeClass::Array);
    assert_eq!(ty.array_len, 8);
}

#[test]
fn array_size_limits_are_enforced() {
    let diagnostics = compile_err("float arr[0]; float main() : COLOR { return 0; }");
    assert!(diagnostics.contains("array size"), "{diagnostics}");
    let diagnostics = compile_err("float arr[65537]; float main() : COLOR { return 0; }");
    assert!(diagnostics.contains("array size"), "{diagnostics}");
    let diagnostics =
        compile_err("float main() : COLOR { float n = 2.0; float a[n]; return 0; }");
    assert!(diagnostics.contains("not a constant"), "{diagnostics}");
}

#[test]
fn broadcast_initializer_repeats_the_scalar() {
    let program = compile_ok("float4 main() : COLOR { float4 v = 1.0; return v; }");
    let body = entry_body(&program);
    let ctor = body
        .iter()
        .find_map(|&h| match &program.nodes[h].kind {
            NodeKind::Constructor { args } => Some(args.clone()),
            _ => None,
        })
        .expect("broadcast lowers to a constructor");
    assert_eq!(ctor.len(), 4);
    assert!(ctor.iter().all(|&a| a == ctor[0]));
}

#[test]
fn initializer_component_mismatch_is_an_error() {
    let diagnostics =
        compile_err("float4 main() : COLOR { float4 v = {1.0, 2.0}; return v; }");
    assert!(
        diagnostics.contains("wrong number of components in initializer (expected 4, got 2)"),
        "{diagnostics}"
    );
}

// ---- Typedefs ----

#[test]
fn typedefs_introduce_type_names() {
    let program = compile_ok(
        "typedef float4 color_t;\n\
         color_t main() : COLOR { color_t c = {1.0, 0.0, 0.0, 1.0}; return c; }",
    );
    let (_, c) = program
        .variables
        .iter()
        .find(|(_, v)| v.name == "c")
        .unwrap();
    assert_eq!(program.types[c.ty].dimx, 4);
}

#[test]
fn typedef_redefinition_is_an_error() {
    let diagnostics = compile_err(
        "typedef float4 t; typedef float3 t;\nfloat4 main() : COLOR { return 0; }",
    );
    assert!(diagnostics.contains("redefinition of type 't'"), "{diagnostics}");
}

#[test]
fn storage_modifiers_on_typedefs_are_an_error() {
    let diagnostics =
        compile_err("typedef uniform float t;\nfloat main() : COLOR { return 0; }");
    assert!(
        diagnostics.contains("storage modifiers are not allowed on typedefs"),
        "{diagnostics}"
    );
}

// ---- Functions ----

#[test]
fn overloads_by_signature_coexist() {
    compile_ok(
        "float f(float a);\n\
         float f(float2 a);\n\
         float4 main() : COLOR { return 0; }",
    );
}

#[test]
fn function_body_redefinition_is_an_error() {
    let diagnostics = compile_err(
        "float f(float a) { return a; }\n\
         float f(float a) { return a; }\n\
         float4 main() : COLOR { return 0; }",
    );
    assert!(diagnostics.contains("redefinition of 'f'"), "{diagnostics}");
    assert!(diagnostics.contains("note:"));
}

#[test]
fn return_type_mismatch_across_declarations_is_an_error() {
    let diagnostics = compile_err(
        "float f(float a);\nint f(float a);\nfloat4 main() : COLOR { return 0; }",
    );
    assert!(
        diagnostics.contains("redefinition of 'f' with a different return type"),
        "{diagnostics}"
    );
}

#[test]
fn void_function_with_semantic_is_an_error() {
    let diagnostics = compile_err("void main() : COLOR { }");
    assert!(
        diagnostics.contains("void function 'main' cannot have a semantic"),
        "{diagnostics}"
    );
}

#[test]
fn duplicate_parameter_modifier_is_an_error() {
    let diagnostics = compile_err("float main(in in float4 p) : COLOR { return 0; }");
    assert!(diagnostics.contains("duplicate modifier"), "{diagnostics}");
}

#[test]
fn function_calls_are_reported() {
    let diagnostics = compile_err(
        "float helper(float a) { return a; }\n\
         float main() : COLOR { return helper(1.0); }",
    );
    assert!(
        diagnostics.contains("call to function 'helper' is not supported"),
        "{diagnostics}"
    );
}

// ---- Expressions ----

#[test]
fn const_lvalue_assignment_is_an_error() {
    let diagnostics =
        compile_err("float main() : COLOR { const float c = 1.0; c = 2.0; return c; }");
    assert!(diagnostics.contains("l-value is const"), "{diagnostics}");
}

#[test]
fn post_increment_result_cannot_be_assigned() {
    let diagnostics = compile_err("float main() : COLOR { float x = 1.0; x++ = 2.0; return x; }");
    assert!(diagnostics.contains("l-value is const"), "{diagnostics}");
}

#[test]
fn compound_assignment_materializes_the_operation() {
    let program = compile_ok("float main() : COLOR { float x = 1.0; x += 2.0; return x; }");
    let body = entry_body(&program);
    let compound = body
        .iter()
        .find_map(|&h| match program.nodes[h].kind {
            NodeKind::Assign {
                op: hlslc_ir::AssignOp::Add,
                rhs,
                ..
            } => Some(rhs),
            _ => None,
        })
        .expect("compound assignment");
    // The stored value is the materialized addition.
    assert!(matches!(
        program.nodes[compound].kind,
        NodeKind::Expr {
            op: hlslc_ir::ExprOp::Add,
            ..
        }
    ));
}

#[test]
fn indexing_a_scalar_is_an_error() {
    let diagnostics = compile_err("float main() : COLOR { float x = 1.0; return x[0]; }");
    assert!(diagnostics.contains("cannot index a scalar"), "{diagnostics}");
}

#[test]
fn non_scalar_index_is_an_error() {
    let diagnostics =
        compile_err("float main() : COLOR { float3 v; float2 i; return v[i]; }");
    assert!(diagnostics.contains("array index is not scalar"), "{diagnostics}");
}

#[test]
fn matrix_indexing_yields_a_row_vector() {
    let program = compile_ok("float main() : COLOR { float4x3 m; return m[1].x; }");
    let body = entry_body(&program);
    let deref = body
        .iter()
        .find_map(|&h| match program.nodes[h].kind {
            NodeKind::ArrayDeref { .. } => Some(program.nodes[h].ty),
            _ => None,
        })
        .expect("matrix index");
    let ty = &program.types[deref];
    assert_eq!(ty.class, TypeClass::Vector);
    assert_eq!(ty.dimx, 4);
}

#[test]
fn matrix_swizzles_resolve_both_forms() {
    compile_ok("float2 main() : COLOR { float4x4 m; return m._m00_m11; }");
    compile_ok("float2 main() : COLOR { float4x4 m; return m._11_22; }");
    let diagnostics = compile_err("float2 main() : COLOR { float4x4 m; return m._m00_11; }");
    assert!(diagnostics.contains("invalid swizzle"), "{diagnostics}");
}

#[test]
fn invalid_struct_field_is_an_error() {
    let diagnostics = compile_err(
        "struct S { float a; };\n\
         float main() : COLOR { S s; return s.missing; }",
    );
    assert!(diagnostics.contains("invalid field 'missing'"), "{diagnostics}");
}

#[test]
fn constructor_component_count_is_checked() {
    let diagnostics = compile_err("float4 main() : COLOR { return float4(1.0, 2.0); }");
    assert!(
        diagnostics.contains("wrong number of components in constructor (expected 4, got 2)"),
        "{diagnostics}"
    );
}

#[test]
fn constructors_flatten_mixed_arguments() {
    compile_ok("float4 main() : COLOR { float2 ab; return float4(ab, 1.0, 0.0); }");
}

#[test]
fn casts_check_compatibility() {
    compile_ok("float main() : COLOR { float4 v; return (float)v; }");
    let diagnostics = compile_err(
        "struct S { float a; };\n\
         float main() : COLOR { S s; return (float4)s; }",
    );
    assert!(diagnostics.contains("cannot convert from"), "{diagnostics}");
}

#[test]
fn implicit_truncation_warns() {
    let output = compile_ps("float2 main() : COLOR { float4 v; float2 w; w = v; return w; }");
    assert_eq!(output.status, Status::Warning, "{}", output.diagnostics);
    assert!(
        output.diagnostics.contains("implicit truncation of vector type"),
        "{}",
        output.diagnostics
    );
    assert!(output.program.is_some(), "warnings do not suppress IR");
}

#[test]
fn ternary_and_logic_operators_lower() {
    compile_ok(
        "float main() : COLOR {\n\
         float a = 1.0;\n\
         float b = 2.0;\n\
         return (a < b && b > 0.0) ? a : b;\n\
         }",
    );
}

#[test]
fn bitwise_operators_require_integers() {
    compile_ok("float main() : COLOR { int a = 3; int b = 5; return a & b; }");
    let diagnostics = compile_err("float main() : COLOR { float a = 1.0; return a << 1; }");
    assert!(
        diagnostics.contains("bitwise operations require integer operands"),
        "{diagnostics}"
    );
}

#[test]
fn undeclared_identifier_is_an_error() {
    let diagnostics = compile_err("float main() : COLOR { return nothere; }");
    assert!(
        diagnostics.contains("undeclared identifier 'nothere'"),
        "{diagnostics}"
    );
}

// ---- Control flow ----

#[test]
fn if_condition_must_be_scalar() {
    let diagnostics = compile_err("float main() : COLOR { float4 v; if (v) return 1.0; return 0; }");
    assert!(diagnostics.contains("condition must be scalar"), "{diagnostics}");
}

#[test]
fn while_loop_checks_condition_first() {
    let program = compile_ok(
        "float main() : COLOR { float x = 0.0; while (x < 3.0) { x += 1.0; } return x; }",
    );
    let body = entry_body(&program);
    let loop_body = body
        .iter()
        .find_map(|&h| match &program.nodes[h].kind {
            NodeKind::Loop { body, .. } => Some(body.clone()),
            _ => None,
        })
        .expect("loop");
    // Condition break precedes the user body.
    let if_pos = loop_body
        .iter()
        .position(|&h| matches!(program.nodes[h].kind, NodeKind::If { .. }))
        .unwrap();
    let store_pos = loop_body
        .iter()
        .position(|&h| matches!(program.nodes[h].kind, NodeKind::Assign { .. }))
        .unwrap();
    assert!(if_pos < store_pos);
}

#[test]
fn do_while_checks_condition_last() {
    let program = compile_ok(
        "float main() : COLOR { float x = 0.0; do { x += 1.0; } while (x < 3.0); return x; }",
    );
    let body = entry_body(&program);
    let loop_body = body
        .iter()
        .find_map(|&h| match &program.nodes[h].kind {
            NodeKind::Loop { body, .. } => Some(body.clone()),
            _ => None,
        })
        .expect("loop");
    let if_pos = loop_body
        .iter()
        .position(|&h| matches!(program.nodes[h].kind, NodeKind::If { .. }))
        .unwrap();
    let store_pos = loop_body
        .iter()
        .position(|&h| matches!(program.nodes[h].kind, NodeKind::Assign { .. }))
        .unwrap();
    assert!(store_pos < if_pos);
}

#[test]
fn empty_for_condition_is_an_infinite_loop() {
    let program = compile_ok("float main() : COLOR { for (;;) { break; } return 0; }");
    let body = entry_body(&program);
    let loop_body = body
        .iter()
        .find_map(|&h| match &program.nodes[h].kind {
            NodeKind::Loop { body, .. } => Some(body.clone()),
            _ => None,
        })
        .expect("loop");
    assert!(matches!(
        program.nodes[loop_body[0]].kind,
        NodeKind::Jump(JumpKind::Break)
    ));
}

#[test]
fn return_value_mismatches_are_errors() {
    let diagnostics = compile_err("float main() : COLOR { return; }");
    assert!(
        diagnostics.contains("non-void function must return a value"),
        "{diagnostics}"
    );
    let diagnostics = compile_err(
        "void helper() { return 1.0; }\nfloat main() : COLOR { return 0; }",
    );
    assert!(
        diagnostics.contains("void function cannot return a value"),
        "{diagnostics}"
    );
}

#[test]
fn return_inserts_implicit_conversion() {
    let program = compile_ok("float4 main() : COLOR { return 1; }");
    let body = entry_body(&program);
    let NodeKind::Jump(JumpKind::Return(Some(value))) =
        program.nodes[*body.last().unwrap()].kind
    else {
        panic!("value return expected");
    };
    assert!(matches!(
        program.nodes[value].kind,
        NodeKind::Expr {
            op: hlslc_ir::ExprOp::Cast,
            ..
        }
    ));
    assert_eq!(program.types[program.nodes[value].ty].dimx, 4);
}

// ---- Register reservations and semantics ----

#[test]
fn register_reservations_are_recorded() {
    let program = compile_ok(
        "sampler tex : register(s3);\nfloat4 color : register(c7);\n\
         float4 main() : COLOR { return color; }",
    );
    let (_, tex) = program
        .variables
        .iter()
        .find(|(_, v)| v.name == "tex")
        .unwrap();
    let reservation = tex.reservation.expect("sampler reservation");
    assert_eq!(reservation.kind, RegisterKind::Sampler);
    assert_eq!(reservation.index, 3);

    let (_, color) = program
        .variables
        .iter()
        .find(|(_, v)| v.name == "color")
        .unwrap();
    let reservation = color.reservation.expect("const reservation");
    assert_eq!(reservation.kind, RegisterKind::Const);
    assert_eq!(reservation.index, 7);
}

#[test]
fn unknown_register_tag_warns_and_is_dropped() {
    let output = compile_ps(
        "float4 color : register(t0);\nfloat4 main() : COLOR { return color; }",
    );
    assert_eq!(output.status, Status::Warning, "{}", output.diagnostics);
    assert!(
        output.diagnostics.contains("unsupported register type 't0'"),
        "{}",
        output.diagnostics
    );
    let program = output.program.unwrap();
    let (_, color) = program
        .variables
        .iter()
        .find(|(_, v)| v.name == "color")
        .unwrap();
    assert!(color.reservation.is_none());
}

#[test]
fn register_target_argument_is_ignored_with_a_diagnostic() {
    let output = compile_ps(
        "float4 color : register(ps, c2);\nfloat4 main() : COLOR { return color; }",
    );
    assert_eq!(output.status, Status::Warning, "{}", output.diagnostics);
    let program = output.program.unwrap();
    let (_, color) = program
        .variables
        .iter()
        .find(|(_, v)| v.name == "color")
        .unwrap();
    let reservation = color.reservation.expect("reservation from second argument");
    assert_eq!(reservation.kind, RegisterKind::Const);
    assert_eq!(reservation.index, 2);
}

#[test]
fn register_on_function_is_discarded_with_a_diagnostic() {
    let output = compile_ps("float4 main() : register(c0) : COLOR { return 0; }");
    assert_eq!(output.status, Status::Warning, "{}", output.diagnostics);
    assert!(
        output
            .diagnostics
            .contains("register reservations on functions are not supported"),
        "{}",
        output.diagnostics
    );
}

#[test]
fn entry_semantics_are_recorded() {
    let program = compile_ok("float4 main(float4 p : TEXCOORD0) : COLOR { return p; }");
    let entry = program.entry.unwrap();
    let function = &program.functions[entry];
    assert_eq!(function.semantic.as_deref(), Some("COLOR"));
    let param = &program.variables[function.parameters[0]];
    assert_eq!(param.semantic.as_deref(), Some("TEXCOORD0"));
    assert!(param.modifiers.contains(Modifiers::IN));
}

// ---- Matrices and majority ----

#[test]
fn matrix_majority_defaults_to_column() {
    let program = compile_ok("float4x3 m; float main() : COLOR { return m[0].x; }");
    let (_, m) = program
        .variables
        .iter()
        .find(|(_, v)| v.name == "m")
        .unwrap();
    let ty = &program.types[m.ty];
    assert!(ty.modifiers.contains(Modifiers::COLUMN_MAJOR));
    assert_eq!(ty.reg_size(&program.types), 4);
}

#[test]
fn row_major_matrix_reg_size_is_the_row_count() {
    let program =
        compile_ok("row_major float4x3 m; float main() : COLOR { return m[0].x; }");
    let (_, m) = program
        .variables
        .iter()
        .find(|(_, v)| v.name == "m")
        .unwrap();
    let ty = &program.types[m.ty];
    assert!(ty.modifiers.contains(Modifiers::ROW_MAJOR));
    assert!(!ty.modifiers.contains(Modifiers::COLUMN_MAJOR));
    assert_eq!(ty.reg_size(&program.types), 3);
}

#[test]
fn conflicting_majorities_are_an_error() {
    let diagnostics =
        compile_err("row_major column_major float4x4 m; float main() : COLOR { return 0; }");
    assert!(
        diagnostics.contains("more than one matrix majority keyword"),
        "{diagnostics}"
    );
}

// ---- Source locations ----

#[test]
fn line_directives_redirect_diagnostics() {
    let diagnostics = compile_err(
        "#line 40 \"included.fxh\"\nfloat main() : COLOR { return nothere; }",
    );
    assert!(
        diagnostics.contains("included.fxh:40:"),
        "{diagnostics}"
    );
}

#[test]
fn diagnostics_use_one_line_per_message() {
    let diagnostics = compile_err("float main() : COLOR { float x; float x; return x; }");
    for line in diagnostics.lines() {
        let mut parts = line.splitn(4, ':');
        assert_eq!(parts.next(), Some("test.fx"));
        assert!(parts.next().unwrap().parse::<u32>().is_ok(), "{line}");
        assert!(parts.next().unwrap().parse::<u32>().is_ok(), "{line}");
        let rest = parts.next().unwrap();
        assert!(
            rest.starts_with(" error: ")
                || rest.starts_with(" warning: ")
                || rest.starts_with(" note: "),
            "{line}"
        );
    }
}

// ---- Multiple errors accumulate ----

#[test]
fn compilation_continues_after_errors() {
    let diagnostics = compile_err(
        "float main() : COLOR {\n\
         float4 v;\n\
         if (v) return 1.0;\n\
         return v.abcz;\n\
         }",
    );
    assert!(diagnostics.contains("condition must be scalar"), "{diagnostics}");
    assert!(diagnostics.contains("invalid swizzle"), "{diagnostics}");
}

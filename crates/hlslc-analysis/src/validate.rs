//! Structural IR validation.
//!
//! Read-only checks over a built (and, when applicable, indexed)
//! program. Returns violation messages rather than logging, so tests
//! and debug builds can assert on them directly.

use std::collections::HashSet;

use hlslc_ir::{Block, Handle, Modifiers, Node, NodeKind, Program, Type, TypeClass};

/// Collects structural violations for the entry function's IR.
///
/// Checked invariants:
/// - every node's type and location handles are valid;
/// - within a list, operands precede the instructions using them;
/// - after indexing, reachable instructions have unique indices ≥ 2 and
///   every loop's `next_index` exceeds the indices in its body;
/// - every matrix type attached to declared storage (variables, struct
///   fields, array elements) carries exactly one majority bit.
pub fn collect_violations(program: &Program) -> Vec<String> {
    let mut violations = Vec::new();

    for (handle, node) in program.nodes.iter() {
        if program.types.get(node.ty).is_none() {
            violations.push(format!("node {handle:?} has an invalid type handle"));
        }
        if program.files.get(node.loc.file).is_none() {
            violations.push(format!("node {handle:?} has a location outside the file pool"));
        }
    }
    for (handle, var) in program.variables.iter() {
        if program.types.get(var.ty).is_none() {
            violations.push(format!("variable {handle:?} ('{}') has an invalid type", var.name));
        }
        check_majority(program, var.ty, &mut violations);
    }

    let Some(entry) = program.entry else {
        return violations;
    };
    let Some(body) = &program.functions[entry].body else {
        return violations;
    };

    let mut seen = HashSet::new();
    check_block(program, body, &mut seen, &mut violations);

    let mut indices = HashSet::new();
    check_indices(program, body, &mut indices, &mut violations);

    violations
}

/// A matrix type (directly or via arrays/struct fields) must carry
/// exactly one majority bit once it is attached to a variable or node.
fn check_majority(program: &Program, ty: Handle<Type>, violations: &mut Vec<String>) {
    let Some(t) = program.types.get(ty) else {
        return;
    };
    match t.class {
        TypeClass::Matrix => {
            let row = t.modifiers.contains(Modifiers::ROW_MAJOR);
            let col = t.modifiers.contains(Modifiers::COLUMN_MAJOR);
            if row == col {
                violations.push(format!(
                    "matrix type {:?} does not carry exactly one majority bit",
                    t.name
                ));
            }
        }
        TypeClass::Array => {
            if let Some(element) = t.element {
                check_majority(program, element, violations);
            }
        }
        TypeClass::Struct => {
            for field in &t.fields {
                check_majority(program, field.ty, violations);
            }
        }
        _ => {}
    }
}

fn operand_seen(
    program: &Program,
    user: Handle<Node>,
    operand: Handle<Node>,
    seen: &HashSet<Handle<Node>>,
    violations: &mut Vec<String>,
) {
    if !seen.contains(&operand) {
        violations.push(format!(
            "node {:?} (index {}) uses operand {:?} that does not precede it",
            user, program.nodes[user].index, operand
        ));
    }
}

fn check_block(
    program: &Program,
    block: &Block,
    seen: &mut HashSet<Handle<Node>>,
    violations: &mut Vec<String>,
) {
    for &handle in block {
        match &program.nodes[handle].kind {
            NodeKind::Constant(_) | NodeKind::VarDeref(_) => {}
            NodeKind::RecordDeref { base, .. } | NodeKind::Swizzle { base, .. } => {
                operand_seen(program, handle, *base, seen, violations);
            }
            NodeKind::ArrayDeref { base, index } => {
                operand_seen(program, handle, *base, seen, violations);
                operand_seen(program, handle, *index, seen, violations);
            }
            NodeKind::Constructor { args } => {
                for &arg in args {
                    operand_seen(program, handle, arg, seen, violations);
                }
            }
            NodeKind::Expr { operands, .. } => {
                for operand in operands.iter().flatten() {
                    operand_seen(program, handle, *operand, seen, violations);
                }
            }
            NodeKind::Assign { rhs, .. } => {
                // The store target lives outside the list by design.
                operand_seen(program, handle, *rhs, seen, violations);
            }
            NodeKind::If {
                condition,
                then_block,
                else_block,
            } => {
                operand_seen(program, handle, *condition, seen, violations);
                let mut branch_seen = seen.clone();
                check_block(program, then_block, &mut branch_seen, violations);
                if let Some(else_block) = else_block {
                    let mut branch_seen = seen.clone();
                    check_block(program, else_block, &mut branch_seen, violations);
                }
            }
            NodeKind::Loop { body, .. } => {
                let mut body_seen = seen.clone();
                check_block(program, body, &mut body_seen, violations);
            }
            NodeKind::Jump(kind) => {
                if let hlslc_ir::JumpKind::Return(Some(value)) = kind {
                    operand_seen(program, handle, *value, seen, violations);
                }
            }
        }
        seen.insert(handle);
    }
}

fn check_indices(
    program: &Program,
    block: &Block,
    indices: &mut HashSet<u32>,
    violations: &mut Vec<String>,
) -> u32 {
    let mut max_index = 0;
    for &handle in block {
        let index = program.nodes[handle].index;
        if index < 2 {
            violations.push(format!(
                "reachable node {handle:?} has index {index}, below the first valid index"
            ));
        } else if !indices.insert(index) {
            violations.push(format!("duplicate instruction index {index}"));
        }
        max_index = max_index.max(index);

        match &program.nodes[handle].kind {
            NodeKind::If {
                then_block,
                else_block,
                ..
            } => {
                max_index = max_index.max(check_indices(program, then_block, indices, violations));
                if let Some(else_block) = else_block {
                    max_index =
                        max_index.max(check_indices(program, else_block, indices, violations));
                }
            }
            NodeKind::Loop { body, next_index } => {
                let body_max = check_indices(program, body, indices, violations);
                if *next_index <= body_max {
                    violations.push(format!(
                        "loop at index {index} has next_index {next_index} not past its body (max {body_max})"
                    ));
                }
                max_index = max_index.max(body_max);
            }
            _ => {}
        }
    }
    max_index
}

#[cfg(test)]
mod tests {
    use super::*;
    use hlslc_ir::{
        BaseType, Function, ScalarValue, ShaderType, SourceLoc, TargetProfile, Variable,
    };

    fn test_program() -> (Program, SourceLoc, Handle<Type>) {
        let mut program = Program::new(TargetProfile {
            shader_type: ShaderType::Pixel,
            major: 2,
            minor: 0,
        });
        let file = program.files.intern("test.fx");
        let loc = SourceLoc::new(file, 1, 1);
        let float_ = program.types.add(Type::scalar(BaseType::Float));
        (program, loc, float_)
    }

    #[test]
    fn clean_program_has_no_violations() {
        let (mut program, loc, float_) = test_program();
        let a = program.nodes.add(Node::new(
            NodeKind::Constant(ScalarValue::Float(1.0)),
            float_,
            loc,
        ));
        let neg = program.nodes.add(Node::new(
            NodeKind::Expr {
                op: hlslc_ir::ExprOp::Neg,
                operands: [Some(a), None, None],
            },
            float_,
            loc,
        ));
        let mut main = Function::new("main", float_, loc);
        main.body = Some(vec![a, neg]);
        let entry = program.functions.add(main);
        program.entry = Some(entry);
        crate::index_program(&mut program);

        assert!(collect_violations(&program).is_empty());
    }

    #[test]
    fn detects_operand_after_use() {
        let (mut program, loc, float_) = test_program();
        let a = program.nodes.add(Node::new(
            NodeKind::Constant(ScalarValue::Float(1.0)),
            float_,
            loc,
        ));
        let neg = program.nodes.add(Node::new(
            NodeKind::Expr {
                op: hlslc_ir::ExprOp::Neg,
                operands: [Some(a), None, None],
            },
            float_,
            loc,
        ));
        let mut main = Function::new("main", float_, loc);
        // Operand listed after its user.
        main.body = Some(vec![neg, a]);
        let entry = program.functions.add(main);
        program.entry = Some(entry);
        crate::index_program(&mut program);

        let violations = collect_violations(&program);
        assert!(violations.iter().any(|v| v.contains("does not precede")));
    }

    #[test]
    fn detects_missing_majority() {
        let (mut program, loc, _) = test_program();
        let matrix = program
            .types
            .add(Type::matrix(BaseType::Float, 4, 4));
        program
            .variables
            .add(Variable::new("m", matrix, loc));

        let violations = collect_violations(&program);
        assert!(violations
            .iter()
            .any(|v| v.contains("majority")));
    }

    #[test]
    fn detects_bad_loop_next_index() {
        let (mut program, loc, float_) = test_program();
        let inner = program.nodes.add(Node::new(
            NodeKind::Constant(ScalarValue::Float(0.0)),
            float_,
            loc,
        ));
        let lp = program.nodes.add(Node::new(
            NodeKind::Loop {
                body: vec![inner],
                next_index: 0,
            },
            float_,
            loc,
        ));
        let mut main = Function::new("main", float_, loc);
        main.body = Some(vec![lp]);
        let entry = program.functions.add(main);
        program.entry = Some(entry);
        crate::index_program(&mut program);

        // Sabotage the loop exit marker.
        if let NodeKind::Loop { next_index, .. } = &mut program.nodes[lp].kind {
            *next_index = 1;
        }
        let violations = collect_violations(&program);
        assert!(violations.iter().any(|v| v.contains("next_index")));
    }
}

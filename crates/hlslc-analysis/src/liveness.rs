//! Variable liveness computation.
//!
//! Runs after [`crate::index_program`]. Computes, per variable, the
//! index of its first write and last read. A variable referenced
//! anywhere inside a loop has its range extended to the whole loop,
//! because a use may observe a value written by a previous iteration.
//! Anonymous expression nodes are excluded from the loop extension;
//! they cannot carry values across iterations by construction.

use hlslc_ir::{Block, Handle, JumpKind, Modifiers, Node, NodeKind, Program, Variable};

/// Computes liveness for the entry function and the globals it can see.
pub fn compute_liveness(program: &mut Program) {
    let Some(entry) = program.entry else {
        return;
    };

    // Globals are written by the environment at function entry.
    let globals = program.scopes[program.globals].vars.clone();
    for var in globals {
        program.variables[var].first_write = 1;
    }

    // Input parameters are written at entry; output parameters are read
    // at exit.
    let parameters = program.functions[entry].parameters.clone();
    for param in parameters {
        let var = &mut program.variables[param];
        if var.modifiers.contains(Modifiers::IN) {
            var.first_write = 1;
        }
        if var.modifiers.contains(Modifiers::OUT) {
            var.last_read = u32::MAX;
        }
    }

    let Some(body) = program.functions[entry].body.clone() else {
        return;
    };
    walk_block(program, &body, 0, 0);
}

/// Marks a read of an anonymous node. Nodes never get the loop
/// extension.
fn node_read(program: &mut Program, node: Handle<Node>, index: u32) {
    program.nodes[node].last_read = index;
}

/// Marks a read of a variable, extending to the loop exit when inside
/// a loop.
fn var_read(program: &mut Program, var: Handle<Variable>, index: u32, loop_exit: u32) {
    let last = if loop_exit > 0 {
        index.max(loop_exit)
    } else {
        index
    };
    program.variables[var].last_read = last;
}

fn walk_block(program: &mut Program, block: &Block, loop_first: u32, loop_exit: u32) {
    for &handle in block {
        let index = program.nodes[handle].index;
        let kind = program.nodes[handle].kind.clone();
        match kind {
            NodeKind::Constant(_) => {}
            NodeKind::VarDeref(var) => var_read(program, var, index, loop_exit),
            NodeKind::RecordDeref { base, .. } => node_read(program, base, index),
            NodeKind::ArrayDeref { base, index: idx } => {
                node_read(program, base, index);
                node_read(program, idx, index);
            }
            NodeKind::Swizzle { base, .. } => node_read(program, base, index),
            NodeKind::Constructor { args } => {
                for arg in args {
                    node_read(program, arg, index);
                }
            }
            NodeKind::Expr { operands, .. } => {
                for operand in operands.into_iter().flatten() {
                    node_read(program, operand, index);
                }
            }
            NodeKind::Assign { lhs, rhs, .. } => {
                node_read(program, rhs, index);
                mark_store(program, lhs, index, loop_first);
            }
            NodeKind::If {
                condition,
                then_block,
                else_block,
            } => {
                node_read(program, condition, index);
                walk_block(program, &then_block, loop_first, loop_exit);
                if let Some(else_block) = else_block {
                    walk_block(program, &else_block, loop_first, loop_exit);
                }
            }
            NodeKind::Loop { body, next_index } => {
                let first = if loop_first > 0 { loop_first } else { index };
                let exit = if loop_exit > 0 { loop_exit } else { next_index };
                walk_block(program, &body, first, exit);
            }
            NodeKind::Jump(JumpKind::Return(Some(value))) => {
                node_read(program, value, index);
            }
            NodeKind::Jump(_) => {}
        }
    }
}

/// Walks an assignment's store-target chain: records the root
/// variable's first write and the reads performed by any index
/// computations along the chain.
fn mark_store(program: &mut Program, lhs: Handle<Node>, index: u32, loop_first: u32) {
    enum Step {
        Var(Handle<Variable>),
        Index(Handle<Node>, Handle<Node>),
        Base(Handle<Node>),
        Stop,
    }
    let mut cursor = lhs;
    loop {
        let step = match &program.nodes[cursor].kind {
            NodeKind::VarDeref(var) => Step::Var(*var),
            NodeKind::ArrayDeref { base, index } => Step::Index(*base, *index),
            NodeKind::RecordDeref { base, .. } | NodeKind::Swizzle { base, .. } => {
                Step::Base(*base)
            }
            _ => Step::Stop,
        };
        match step {
            Step::Var(var) => {
                let v = &mut program.variables[var];
                if v.first_write == 0 {
                    v.first_write = if loop_first > 0 {
                        index.min(loop_first)
                    } else {
                        index
                    };
                }
                return;
            }
            Step::Index(base, idx) => {
                node_read(program, idx, index);
                cursor = base;
            }
            Step::Base(base) => cursor = base,
            Step::Stop => return,
        }
    }
}

//! Program-order instruction indexing.
//!
//! Assigns every reachable instruction of the entry function a strictly
//! increasing index. Index 0 means "unassigned", index 1 is reserved
//! for the function-entry event (where globals and input parameters are
//! considered written), so numbering starts at 2. Loop nodes are
//! annotated with the index of the first instruction after the loop.

use hlslc_ir::{Block, Handle, Node, NodeKind, Program};

/// Index at which instruction numbering starts.
pub const FIRST_INSTR_INDEX: u32 = 2;

/// Numbers the entry function's instructions in traversal order,
/// descending into branches and loop bodies. No further edits may be
/// made to the instruction lists after this runs.
pub fn index_program(program: &mut Program) {
    let Some(entry) = program.entry else {
        return;
    };
    let Some(body) = program.functions[entry].body.clone() else {
        return;
    };
    index_block(program, &body, FIRST_INSTR_INDEX);
}

fn index_block(program: &mut Program, block: &Block, mut index: u32) -> u32 {
    for &handle in block {
        program.nodes[handle].index = index;
        index += 1;
        index = index_children(program, handle, index);
    }
    index
}

fn index_children(program: &mut Program, handle: Handle<Node>, index: u32) -> u32 {
    enum Children {
        If(Block, Option<Block>),
        Loop(Block),
        None,
    }
    let children = match &program.nodes[handle].kind {
        NodeKind::If {
            then_block,
            else_block,
            ..
        } => Children::If(then_block.clone(), else_block.clone()),
        NodeKind::Loop { body, .. } => Children::Loop(body.clone()),
        _ => Children::None,
    };
    match children {
        Children::If(then_block, else_block) => {
            let mut index = index_block(program, &then_block, index);
            if let Some(else_block) = else_block {
                index = index_block(program, &else_block, index);
            }
            index
        }
        Children::Loop(body) => {
            let index = index_block(program, &body, index);
            if let NodeKind::Loop { next_index, .. } = &mut program.nodes[handle].kind {
                // The first instruction after the loop: its exit marker.
                *next_index = index;
            }
            index
        }
        Children::None => index,
    }
}

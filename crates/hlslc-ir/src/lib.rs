//! hlslc intermediate representation.
//!
//! An arena-based IR for an HLSL front-end: typed instruction streams
//! with source locations, scope-owned variables, and per-variable
//! liveness annotations filled in by the analysis passes.

pub mod arena;
mod display;
mod func;
mod loc;
mod node;
mod scope;
mod types;
mod var;

use std::collections::HashMap;

pub use arena::{Arena, Handle};
pub use display::{dump_function, dump_program, format_type};
pub use func::{signatures_match, Function};
pub use loc::{FileName, NamePool, SourceLoc, TokenSpan};
pub use node::{
    matrix_swizzle_component, pack_matrix_swizzle, pack_vector_swizzle, vector_swizzle_component,
    AssignOp, Block, ExprOp, JumpKind, Node, NodeKind, ScalarValue,
};
pub use scope::Scope;
pub use types::{types_equal, BaseType, Modifiers, SamplerDim, StructField, Type, TypeClass};
pub use var::{RegisterKind, RegisterReservation, Variable};

/// The kind of shader a program is compiled as.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum ShaderType {
    Pixel,
    Vertex,
}

/// A target profile: shader type plus model version.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct TargetProfile {
    pub shader_type: ShaderType,
    pub major: u8,
    pub minor: u8,
}

/// A compiled program: the per-compilation container owning every arena.
///
/// Dropping the program releases all types, nodes, variables, scopes,
/// and functions at once.
#[derive(Clone, Debug)]
pub struct Program {
    /// Deduplicated source file-name pool.
    pub files: NamePool,
    pub types: Arena<Type>,
    pub nodes: Arena<Node>,
    pub variables: Arena<Variable>,
    pub scopes: Arena<Scope>,
    pub functions: Arena<Function>,
    /// Function overload sets keyed by name.
    pub function_table: HashMap<String, Vec<Handle<Function>>>,
    /// The root ("globals") scope.
    pub globals: Handle<Scope>,
    pub profile: TargetProfile,
    /// The selected entry function, once resolved.
    pub entry: Option<Handle<Function>>,
}

impl Program {
    /// Creates an empty program with a root scope.
    pub fn new(profile: TargetProfile) -> Self {
        let mut scopes = Arena::new();
        let globals = scopes.add(Scope::new(None));
        Self {
            files: NamePool::new(),
            types: Arena::new(),
            nodes: Arena::new(),
            variables: Arena::new(),
            scopes,
            functions: Arena::new(),
            function_table: HashMap::new(),
            globals,
            profile,
            entry: None,
        }
    }

    /// Resolves the variable at the root of a deref chain, if the node is
    /// an lvalue-shaped chain (`VarDeref`, `RecordDeref`, `ArrayDeref`,
    /// or a swizzle of one).
    pub fn deref_variable(&self, node: Handle<Node>) -> Option<Handle<Variable>> {
        match &self.nodes[node].kind {
            NodeKind::VarDeref(var) => Some(*var),
            NodeKind::RecordDeref { base, .. }
            | NodeKind::ArrayDeref { base, .. }
            | NodeKind::Swizzle { base, .. } => self.deref_variable(*base),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_profile() -> TargetProfile {
        TargetProfile {
            shader_type: ShaderType::Pixel,
            major: 2,
            minor: 0,
        }
    }

    #[test]
    fn new_program_has_root_scope() {
        let program = Program::new(test_profile());
        assert_eq!(program.scopes.len(), 1);
        assert!(program.scopes[program.globals].parent.is_none());
        assert!(program.entry.is_none());
    }

    #[test]
    fn deref_variable_walks_chains() {
        let mut program = Program::new(test_profile());
        let file = program.files.intern("a.fx");
        let loc = SourceLoc::new(file, 1, 1);
        let float4 = program.types.add(Type::vector(BaseType::Float, 4));
        let float1 = program.types.add(Type::scalar(BaseType::Float));
        let int1 = program.types.add(Type::scalar(BaseType::Int));

        let v = program
            .variables
            .add(Variable::new("v", float4, loc));
        let deref = program
            .nodes
            .add(Node::new(NodeKind::VarDeref(v), float4, loc));
        let idx = program.nodes.add(Node::new(
            NodeKind::Constant(ScalarValue::Int(0)),
            int1,
            loc,
        ));
        let elem = program.nodes.add(Node::new(
            NodeKind::ArrayDeref {
                base: deref,
                index: idx,
            },
            float1,
            loc,
        ));

        assert_eq!(program.deref_variable(deref), Some(v));
        assert_eq!(program.deref_variable(elem), Some(v));
        assert_eq!(program.deref_variable(idx), None);
    }
}

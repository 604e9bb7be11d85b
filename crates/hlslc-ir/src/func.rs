//! Functions and overload sets.

use crate::arena::{Arena, Handle};
use crate::loc::SourceLoc;
use crate::node::Block;
use crate::types::{types_equal, Type};
use crate::var::Variable;

/// A function declaration or definition.
#[derive(Clone, Debug)]
pub struct Function {
    pub name: String,
    /// Formal parameters, each a scope-owned variable.
    pub parameters: Vec<Handle<Variable>>,
    pub return_ty: Handle<Type>,
    /// The body instruction list; `None` for a prototype.
    pub body: Option<Block>,
    pub semantic: Option<String>,
    pub loc: SourceLoc,
    /// Set for compiler-declared intrinsics.
    pub intrinsic: bool,
}

impl Function {
    pub fn new(name: impl Into<String>, return_ty: Handle<Type>, loc: SourceLoc) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_ty,
            body: None,
            semantic: None,
            loc,
            intrinsic: false,
        }
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }
}

/// Compares two parameter lists for overload identity: same length and
/// pairwise structurally equal parameter types.
pub fn signatures_match(
    types: &Arena<Type>,
    variables: &Arena<Variable>,
    a: &[Handle<Variable>],
    b: &[Handle<Variable>],
) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(&pa, &pb)| types_equal(types, variables[pa].ty, variables[pb].ty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loc::NamePool;
    use crate::types::BaseType;

    fn loc(files: &mut NamePool) -> SourceLoc {
        let f = files.intern("a.fx");
        SourceLoc::new(f, 1, 1)
    }

    #[test]
    fn prototype_has_no_body() {
        let mut files = NamePool::new();
        let mut types = Arena::new();
        let float4 = types.add(Type::vector(BaseType::Float, 4));
        let f = Function::new("main", float4, loc(&mut files));
        assert!(!f.has_body());
        assert!(!f.intrinsic);
    }

    #[test]
    fn signature_match_is_structural() {
        let mut files = NamePool::new();
        let l = loc(&mut files);
        let mut types = Arena::new();
        let mut vars = Arena::new();
        // Two distinct float4 type descriptors still match structurally.
        let f4_a = types.add(Type::vector(BaseType::Float, 4));
        let f4_b = types.add(Type::vector(BaseType::Float, 4));
        let i1 = types.add(Type::scalar(BaseType::Int));

        let pa = vars.add(Variable::new("p", f4_a, l));
        let pb = vars.add(Variable::new("q", f4_b, l));
        let pc = vars.add(Variable::new("r", i1, l));

        assert!(signatures_match(&types, &vars, &[pa], &[pb]));
        assert!(!signatures_match(&types, &vars, &[pa], &[pc]));
        assert!(!signatures_match(&types, &vars, &[pa], &[pa, pb]));
        assert!(signatures_match(&types, &vars, &[], &[]));
    }
}

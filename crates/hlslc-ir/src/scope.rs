//! Scopes: nested namespaces for variables and type names.

use std::collections::HashMap;

use crate::arena::Handle;
use crate::types::Type;
use crate::var::Variable;

/// One scope in the scope tree. Variables keep insertion order; type
/// names map to registered type descriptors. Name lookup walks outward
/// through `parent`.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    pub parent: Option<Handle<Scope>>,
    pub vars: Vec<Handle<Variable>>,
    pub types: HashMap<String, Handle<Type>>,
}

impl Scope {
    pub fn new(parent: Option<Handle<Scope>>) -> Self {
        Self {
            parent,
            vars: Vec::new(),
            types: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;

    #[test]
    fn scope_tree_links_to_parent() {
        let mut scopes = Arena::new();
        let root = scopes.add(Scope::new(None));
        let inner = scopes.add(Scope::new(Some(root)));
        assert_eq!(scopes[inner].parent, Some(root));
        assert!(scopes[root].parent.is_none());
        assert!(scopes[root].vars.is_empty());
    }
}

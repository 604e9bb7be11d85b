//! Compilation context: the program under construction plus the scope
//! stack and semantic state the parser's reductions operate on.

use hlslc_ir::{
    signatures_match, BaseType, FileName, Function, Handle, Modifiers, Node, NodeKind, Program,
    SamplerDim, Scope, ScalarValue, SourceLoc, TargetProfile, Type, TypeClass, Variable,
};

use crate::diag::{DiagnosticSink, Level};
use crate::lexer::{IdentClass, LexerEnv};

/// Handles to the predefined types the builder needs on demand.
#[derive(Clone, Copy, Debug)]
pub struct BuiltinTypes {
    pub void: Handle<Type>,
    pub bool_: Handle<Type>,
    pub int_: Handle<Type>,
    pub uint_: Handle<Type>,
    pub half_: Handle<Type>,
    pub float_: Handle<Type>,
    pub double_: Handle<Type>,
    pub sampler: Handle<Type>,
    pub sampler1d: Handle<Type>,
    pub sampler2d: Handle<Type>,
    pub sampler3d: Handle<Type>,
    pub sampler_cube: Handle<Type>,
    pub texture: Handle<Type>,
    pub string: Handle<Type>,
}

pub struct Context {
    pub program: Program,
    pub sink: DiagnosticSink,
    pub builtins: BuiltinTypes,
    current_scope: Handle<Scope>,
    /// Compilation-wide default matrix majority.
    pub default_majority: Modifiers,
}

impl LexerEnv for Context {
    fn classify(&self, name: &str) -> IdentClass {
        if self.lookup_variable(name).is_some() {
            IdentClass::Variable
        } else if self.lookup_type(name).is_some() {
            IdentClass::Type
        } else {
            IdentClass::Fresh
        }
    }

    fn intern_file(&mut self, name: &str) -> Handle<FileName> {
        self.program.files.intern(name)
    }
}

impl Context {
    pub fn new(profile: TargetProfile) -> Self {
        let mut program = Program::new(profile);
        let builtins = seed_types(&mut program);
        let globals = program.globals;
        Self {
            program,
            sink: DiagnosticSink::new(),
            builtins,
            current_scope: globals,
            default_majority: Modifiers::COLUMN_MAJOR,
        }
    }

    /// Tears the context apart into the built program and the collected
    /// diagnostics.
    pub fn into_parts(self) -> (Program, DiagnosticSink) {
        (self.program, self.sink)
    }

    // ---- Diagnostics ----

    pub fn error(&mut self, loc: SourceLoc, message: &str) {
        self.sink
            .report(&self.program.files, loc, Level::Error, message);
    }

    pub fn warning(&mut self, loc: SourceLoc, message: &str) {
        self.sink
            .report(&self.program.files, loc, Level::Warning, message);
    }

    pub fn note(&mut self, loc: SourceLoc, message: &str) {
        self.sink
            .report(&self.program.files, loc, Level::Note, message);
    }

    // ---- Scopes ----

    pub fn push_scope(&mut self) -> Handle<Scope> {
        let scope = self
            .program
            .scopes
            .add(Scope::new(Some(self.current_scope)));
        self.current_scope = scope;
        scope
    }

    pub fn pop_scope(&mut self) {
        if let Some(parent) = self.program.scopes[self.current_scope].parent {
            self.current_scope = parent;
        }
    }

    /// Walks the scope stack outward for a variable.
    pub fn lookup_variable(&self, name: &str) -> Option<Handle<Variable>> {
        let mut scope = Some(self.current_scope);
        while let Some(handle) = scope {
            let s = &self.program.scopes[handle];
            if let Some(&var) = s
                .vars
                .iter()
                .find(|&&v| self.program.variables[v].name == name)
            {
                return Some(var);
            }
            scope = s.parent;
        }
        None
    }

    /// Walks the scope stack outward for a type name.
    pub fn lookup_type(&self, name: &str) -> Option<Handle<Type>> {
        let mut scope = Some(self.current_scope);
        while let Some(handle) = scope {
            let s = &self.program.scopes[handle];
            if let Some(&ty) = s.types.get(name) {
                return Some(ty);
            }
            scope = s.parent;
        }
        None
    }

    /// The seeded (unmodified) numeric type with the given shape.
    pub fn builtin_numeric(&self, base: BaseType, dimx: u32, dimy: u32) -> Handle<Type> {
        let name = numeric_type_name(base, dimx, dimy);
        *self.program.scopes[self.program.globals]
            .types
            .get(&name)
            .expect("predefined numeric types are seeded at startup")
    }

    pub fn scalar_of(&self, base: BaseType) -> Handle<Type> {
        match base {
            BaseType::Bool => self.builtins.bool_,
            BaseType::Int => self.builtins.int_,
            BaseType::Uint => self.builtins.uint_,
            BaseType::Half => self.builtins.half_,
            BaseType::Float => self.builtins.float_,
            BaseType::Double => self.builtins.double_,
            _ => self.builtins.void,
        }
    }

    // ---- Declarations ----

    /// Registers a type name in the current scope. The second definition
    /// of a name is discarded with an error.
    pub fn register_type(&mut self, name: &str, ty: Handle<Type>, loc: SourceLoc) -> bool {
        let scope = self.current_scope;
        if self.program.scopes[scope].types.contains_key(name) {
            self.error(loc, &format!("redefinition of type '{name}'"));
            return false;
        }
        self.program.scopes[scope]
            .types
            .insert(name.to_string(), ty);
        true
    }

    /// Declares a variable in the current scope, checking collisions
    /// against functions and prior same-scope variables. Returns `None`
    /// (declaration discarded) on collision.
    pub fn declare_variable(&mut self, var: Variable) -> Option<Handle<Variable>> {
        if let Some(overloads) = self.program.function_table.get(&var.name) {
            let prior = self.program.functions[overloads[0]].loc;
            let message = format!("'{}' redefined as a different kind of symbol", var.name);
            self.error(var.loc, &message);
            self.note(prior, "previous definition is here");
            return None;
        }
        let scope = self.current_scope;
        let prior = self.program.scopes[scope]
            .vars
            .iter()
            .find(|&&v| self.program.variables[v].name == var.name)
            .copied();
        if let Some(prior) = prior {
            let prior_loc = self.program.variables[prior].loc;
            let message = format!("redefinition of '{}'", var.name);
            self.error(var.loc, &message);
            self.note(prior_loc, "previous definition is here");
            return None;
        }
        let handle = self.program.variables.add(var);
        self.program.scopes[scope].vars.push(handle);
        Some(handle)
    }

    /// Clones a type with modifier bits overlaid. Injects the default
    /// matrix majority when the declaration specifies none; reports
    /// conflicting majorities.
    pub fn type_with_modifiers(
        &mut self,
        base: Handle<Type>,
        modifiers: Modifiers,
        loc: SourceLoc,
    ) -> Handle<Type> {
        let mut modifiers = modifiers;
        if modifiers.contains(Modifiers::MAJORITY) {
            self.error(loc, "more than one matrix majority keyword");
            modifiers = modifiers.difference(Modifiers::COLUMN_MAJOR);
        }

        let ty = &self.program.types[base];
        let mut combined = ty.modifiers | modifiers;
        if ty.class == TypeClass::Matrix && !combined.intersects(Modifiers::MAJORITY) {
            combined |= self.default_majority;
        }
        if combined == ty.modifiers {
            return base;
        }
        let mut new_ty = ty.clone();
        new_ty.modifiers = combined;
        self.program.types.add(new_ty)
    }

    /// Adds a function declaration to the overload set for its name,
    /// applying the redefinition rules.
    pub fn declare_function(&mut self, function: Function) -> Handle<Function> {
        let name = function.name.clone();
        let overloads = self
            .program
            .function_table
            .get(&name)
            .cloned()
            .unwrap_or_default();

        let matching = overloads.iter().copied().find(|&existing| {
            signatures_match(
                &self.program.types,
                &self.program.variables,
                &self.program.functions[existing].parameters,
                &function.parameters,
            )
        });

        let Some(existing) = matching else {
            let handle = self.program.functions.add(function);
            self.program
                .function_table
                .entry(name)
                .or_default()
                .push(handle);
            return handle;
        };

        let prior_loc = self.program.functions[existing].loc;
        if !hlslc_ir::types_equal(
            &self.program.types,
            self.program.functions[existing].return_ty,
            function.return_ty,
        ) {
            let message = format!("redefinition of '{name}' with a different return type");
            self.error(function.loc, &message);
            self.note(prior_loc, "previous declaration is here");
            return existing;
        }
        if function.has_body() && self.program.functions[existing].has_body() {
            let message = format!("redefinition of '{name}'");
            self.error(function.loc, &message);
            self.note(prior_loc, "previous definition is here");
            return existing;
        }
        if function.has_body() {
            self.program.functions[existing] = function;
        }
        existing
    }

    // ---- Constant folding ----

    /// Folds a lowered scalar expression to an integer, for array sizes.
    pub fn fold_constant(&self, node: Handle<Node>) -> Option<i64> {
        match &self.program.nodes[node].kind {
            NodeKind::Constant(value) => Some(match *value {
                ScalarValue::Bool(v) => i64::from(v),
                ScalarValue::Int(v) => i64::from(v),
                ScalarValue::Uint(v) => i64::from(v),
                ScalarValue::Half(v) => v as i64,
                ScalarValue::Float(v) => v as i64,
                ScalarValue::Double(v) => v as i64,
            }),
            &NodeKind::Expr { op, operands } => {
                use hlslc_ir::ExprOp;
                let fold = |handle: Option<Handle<Node>>| handle.and_then(|h| self.fold_constant(h));
                match op {
                    ExprOp::Neg => Some(-fold(operands[0])?),
                    ExprOp::Cast => fold(operands[0]),
                    ExprOp::Add => Some(fold(operands[0])?.wrapping_add(fold(operands[1])?)),
                    ExprOp::Sub => Some(fold(operands[0])?.wrapping_sub(fold(operands[1])?)),
                    ExprOp::Mul => Some(fold(operands[0])?.wrapping_mul(fold(operands[1])?)),
                    ExprOp::Div => fold(operands[0])?.checked_div(fold(operands[1])?),
                    ExprOp::Mod => fold(operands[0])?.checked_rem(fold(operands[1])?),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

fn numeric_type_name(base: BaseType, dimx: u32, dimy: u32) -> String {
    if dimy > 1 {
        format!("{base}{dimx}x{dimy}")
    } else if dimx > 1 {
        format!("{base}{dimx}")
    } else {
        base.to_string()
    }
}

/// Seeds the predefined types into the global scope: every numeric
/// {base} × 1..4 × 1..4 combination plus the legacy effect-framework
/// names, and caches handles for the object types built on demand.
fn seed_types(program: &mut Program) -> BuiltinTypes {
    const NUMERIC: [BaseType; 6] = [
        BaseType::Float,
        BaseType::Half,
        BaseType::Double,
        BaseType::Int,
        BaseType::Uint,
        BaseType::Bool,
    ];

    let mut register = |program: &mut Program, name: String, ty: Type| {
        let handle = program.types.add(Type {
            name: Some(name.clone()),
            ..ty
        });
        program.scopes[program.globals].types.insert(name, handle);
        handle
    };

    for base in NUMERIC {
        for x in 1..=4u32 {
            for y in 1..=4u32 {
                register(
                    program,
                    format!("{base}{x}x{y}"),
                    Type::matrix(base, x, y),
                );
                if y == 1 {
                    register(program, format!("{base}{x}"), Type::vector(base, x));
                    if x == 1 {
                        register(program, base.to_string(), Type::scalar(base));
                    }
                }
            }
        }
    }

    // Legacy effect-framework names.
    register(program, "DWORD".into(), Type::scalar(BaseType::Uint));
    register(program, "FLOAT".into(), Type::scalar(BaseType::Float));
    register(program, "VECTOR".into(), Type::vector(BaseType::Float, 4));
    register(
        program,
        "MATRIX".into(),
        Type::matrix(BaseType::Float, 4, 4),
    );
    let string = register(
        program,
        "STRING".into(),
        Type::object(BaseType::String, SamplerDim::Generic),
    );
    let texture = register(
        program,
        "TEXTURE".into(),
        Type::object(BaseType::Texture, SamplerDim::Generic),
    );
    register(
        program,
        "PIXELSHADER".into(),
        Type::object(BaseType::PixelShader, SamplerDim::Generic),
    );
    register(
        program,
        "VERTEXSHADER".into(),
        Type::object(BaseType::VertexShader, SamplerDim::Generic),
    );

    let lookup = |program: &Program, name: &str| -> Handle<Type> {
        *program.scopes[program.globals]
            .types
            .get(name)
            .expect("seeded above")
    };

    BuiltinTypes {
        void: program.types.add(Type::void()),
        bool_: lookup(program, "bool"),
        int_: lookup(program, "int"),
        uint_: lookup(program, "uint"),
        half_: lookup(program, "half"),
        float_: lookup(program, "float"),
        double_: lookup(program, "double"),
        sampler: program
            .types
            .add(Type::object(BaseType::Sampler, SamplerDim::Generic)),
        sampler1d: program
            .types
            .add(Type::object(BaseType::Sampler, SamplerDim::Dim1D)),
        sampler2d: program
            .types
            .add(Type::object(BaseType::Sampler, SamplerDim::Dim2D)),
        sampler3d: program
            .types
            .add(Type::object(BaseType::Sampler, SamplerDim::Dim3D)),
        sampler_cube: program
            .types
            .add(Type::object(BaseType::Sampler, SamplerDim::Cube)),
        texture,
        string,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hlslc_ir::ShaderType;

    fn test_context() -> Context {
        Context::new(TargetProfile {
            shader_type: ShaderType::Pixel,
            major: 2,
            minor: 0,
        })
    }

    fn test_loc(ctx: &mut Context) -> SourceLoc {
        let file = ctx.intern_file("test.fx");
        SourceLoc::new(file, 1, 1)
    }

    #[test]
    fn predefined_types_are_seeded() {
        let ctx = test_context();
        for name in ["float", "float3", "float4x4", "int2", "bool", "half2x3"] {
            assert!(ctx.lookup_type(name).is_some(), "missing {name}");
        }
        let f3 = ctx.lookup_type("float3").unwrap();
        let ty = &ctx.program.types[f3];
        assert_eq!(ty.class, TypeClass::Vector);
        assert_eq!((ty.dimx, ty.dimy), (3, 1));

        // float1 is a one-component vector, distinct from the float scalar.
        let f1 = ctx.lookup_type("float1").unwrap();
        assert_eq!(ctx.program.types[f1].class, TypeClass::Vector);
        let f = ctx.lookup_type("float").unwrap();
        assert_eq!(ctx.program.types[f].class, TypeClass::Scalar);
    }

    #[test]
    fn legacy_names_are_seeded() {
        let ctx = test_context();
        let dword = ctx.lookup_type("DWORD").unwrap();
        assert_eq!(ctx.program.types[dword].base, BaseType::Uint);
        let matrix = ctx.lookup_type("MATRIX").unwrap();
        assert_eq!(ctx.program.types[matrix].class, TypeClass::Matrix);
        assert!(ctx.lookup_type("VERTEXSHADER").is_some());
    }

    #[test]
    fn classification_prefers_variables() {
        let mut ctx = test_context();
        let loc = test_loc(&mut ctx);
        assert_eq!(ctx.classify("float4"), IdentClass::Type);
        assert_eq!(ctx.classify("fresh"), IdentClass::Fresh);

        let float4 = ctx.lookup_type("float4").unwrap();
        ctx.declare_variable(Variable::new("float4", float4, loc));
        assert_eq!(ctx.classify("float4"), IdentClass::Variable);
    }

    #[test]
    fn scope_lookup_walks_outward() {
        let mut ctx = test_context();
        let loc = test_loc(&mut ctx);
        let float_ = ctx.builtins.float_;
        let outer = ctx
            .declare_variable(Variable::new("x", float_, loc))
            .unwrap();

        ctx.push_scope();
        assert_eq!(ctx.lookup_variable("x"), Some(outer));

        // Shadowing in an inner scope is allowed.
        let inner = ctx
            .declare_variable(Variable::new("x", float_, loc))
            .unwrap();
        assert_eq!(ctx.lookup_variable("x"), Some(inner));

        ctx.pop_scope();
        assert_eq!(ctx.lookup_variable("x"), Some(outer));
    }

    #[test]
    fn same_scope_redefinition_is_rejected() {
        let mut ctx = test_context();
        let loc = test_loc(&mut ctx);
        let float_ = ctx.builtins.float_;
        assert!(ctx
            .declare_variable(Variable::new("x", float_, loc))
            .is_some());
        assert!(ctx
            .declare_variable(Variable::new("x", float_, loc))
            .is_none());
        assert!(ctx.sink.has_errors());
        assert!(ctx.sink.buffer().contains("redefinition of 'x'"));
        assert!(ctx.sink.buffer().contains("note"));
    }

    #[test]
    fn variable_colliding_with_function_is_rejected() {
        let mut ctx = test_context();
        let loc = test_loc(&mut ctx);
        let float_ = ctx.builtins.float_;
        ctx.declare_function(Function::new("f", float_, loc));
        assert!(ctx
            .declare_variable(Variable::new("f", float_, loc))
            .is_none());
        assert!(ctx.sink.has_errors());
    }

    #[test]
    fn matrix_gets_default_majority() {
        let mut ctx = test_context();
        let loc = test_loc(&mut ctx);
        let m = ctx.lookup_type("float4x4").unwrap();
        let with = ctx.type_with_modifiers(m, Modifiers::EMPTY, loc);
        assert!(ctx.program.types[with]
            .modifiers
            .contains(Modifiers::COLUMN_MAJOR));

        let with_row = ctx.type_with_modifiers(m, Modifiers::ROW_MAJOR, loc);
        let ty = &ctx.program.types[with_row];
        assert!(ty.modifiers.contains(Modifiers::ROW_MAJOR));
        assert!(!ty.modifiers.contains(Modifiers::COLUMN_MAJOR));
    }

    #[test]
    fn conflicting_majority_is_an_error() {
        let mut ctx = test_context();
        let loc = test_loc(&mut ctx);
        let m = ctx.lookup_type("float4x4").unwrap();
        ctx.type_with_modifiers(m, Modifiers::ROW_MAJOR | Modifiers::COLUMN_MAJOR, loc);
        assert!(ctx.sink.has_errors());
    }

    #[test]
    fn overload_with_new_signature_is_added() {
        let mut ctx = test_context();
        let loc = test_loc(&mut ctx);
        let float_ = ctx.builtins.float_;
        let int_ = ctx.builtins.int_;

        let f1 = ctx.declare_function(Function::new("f", float_, loc));
        let mut with_param = Function::new("f", float_, loc);
        let p = ctx
            .program
            .variables
            .add(Variable::new("a", int_, loc));
        with_param.parameters.push(p);
        let f2 = ctx.declare_function(with_param);

        assert_ne!(f1, f2);
        assert_eq!(ctx.program.function_table["f"].len(), 2);
        assert!(!ctx.sink.has_errors());
    }

    #[test]
    fn function_body_redefinition_is_rejected() {
        let mut ctx = test_context();
        let loc = test_loc(&mut ctx);
        let float_ = ctx.builtins.float_;

        let mut first = Function::new("f", float_, loc);
        first.body = Some(Vec::new());
        ctx.declare_function(first);

        let mut second = Function::new("f", float_, loc);
        second.body = Some(Vec::new());
        ctx.declare_function(second);
        assert!(ctx.sink.buffer().contains("redefinition of 'f'"));
    }

    #[test]
    fn return_type_mismatch_is_rejected() {
        let mut ctx = test_context();
        let loc = test_loc(&mut ctx);
        let float_ = ctx.builtins.float_;
        let int_ = ctx.builtins.int_;

        ctx.declare_function(Function::new("f", float_, loc));
        ctx.declare_function(Function::new("f", int_, loc));
        assert!(ctx
            .sink
            .buffer()
            .contains("different return type"));
    }

    #[test]
    fn fold_constant_arithmetic() {
        let mut ctx = test_context();
        let loc = test_loc(&mut ctx);
        let int_ = ctx.builtins.int_;
        let a = ctx.program.nodes.add(Node::new(
            NodeKind::Constant(ScalarValue::Int(6)),
            int_,
            loc,
        ));
        let b = ctx.program.nodes.add(Node::new(
            NodeKind::Constant(ScalarValue::Int(7)),
            int_,
            loc,
        ));
        let mul = ctx.program.nodes.add(Node::new(
            NodeKind::Expr {
                op: hlslc_ir::ExprOp::Mul,
                operands: [Some(a), Some(b), None],
            },
            int_,
            loc,
        ));
        assert_eq!(ctx.fold_constant(mul), Some(42));
    }

    #[test]
    fn fold_constant_rejects_non_constants() {
        let mut ctx = test_context();
        let loc = test_loc(&mut ctx);
        let float_ = ctx.builtins.float_;
        let v = ctx
            .program
            .variables
            .add(Variable::new("v", float_, loc));
        let deref = ctx
            .program
            .nodes
            .add(Node::new(NodeKind::VarDeref(v), float_, loc));
        assert_eq!(ctx.fold_constant(deref), None);
    }
}

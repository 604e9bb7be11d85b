//! Recursive-descent parser whose reductions drive the IR builder.
//!
//! The parser owns the lexer and the compilation context. Scope
//! mutations are ordered before the token fetch that follows them, so
//! the lexer's scope-sensitive identifier classification stays in step
//! with at most one token of lookahead.

mod expr;

use hlslc_ir::{
    Block, Function, Handle, JumpKind, Modifiers, Node, NodeKind, RegisterKind,
    RegisterReservation, SourceLoc, StructField, TargetProfile, Type, TypeClass, Variable,
};

use crate::ctx::Context;
use crate::lexer::Lexer;
use crate::token::{Keyword, Token, TokenKind};

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    pub ctx: Context,
    current: Token,
    /// One extra lookahead slot. Filled only at points where no
    /// declaration can occur before the token is consumed.
    peeked: Option<Token>,
    /// Return type of the function body being parsed.
    current_return: Option<Handle<Type>>,
}

/// What was parsed between `=` and the end of an initializer.
struct Initializer {
    parts: Vec<Handle<Node>>,
    braced: bool,
    loc: SourceLoc,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, source_name: &str, profile: TargetProfile) -> Self {
        let mut ctx = Context::new(profile);
        let file = {
            use crate::lexer::LexerEnv;
            ctx.intern_file(source_name)
        };
        let mut lexer = Lexer::new(source, file);
        let current = lexer.next_token(&mut ctx);
        Self {
            lexer,
            ctx,
            current,
            peeked: None,
            current_return: None,
        }
    }

    pub fn finish(self) -> Context {
        self.ctx
    }

    // ---- Token plumbing ----

    fn advance(&mut self) -> Token {
        let next = match self.peeked.take() {
            Some(token) => token,
            None => self.lexer.next_token(&mut self.ctx),
        };
        std::mem::replace(&mut self.current, next)
    }

    fn peek_second(&mut self) -> &TokenKind {
        if self.peeked.is_none() {
            self.peeked = Some(self.lexer.next_token(&mut self.ctx));
        }
        &self.peeked.as_ref().expect("filled above").kind
    }

    fn loc(&self) -> SourceLoc {
        self.current.span.start
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.current.kind == *kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> bool {
        if self.eat(kind) {
            true
        } else {
            let message = format!("expected {what}");
            let loc = self.loc();
            self.ctx.error(loc, &message);
            false
        }
    }

    /// Skips to the next statement boundary: past a `;`, or up to a `}`.
    fn recover_statement(&mut self) {
        loop {
            match &self.current.kind {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace | TokenKind::Eof => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Consumes a balanced token run starting at the current opening
    /// delimiter, e.g. to skip the arguments of an unsupported call.
    fn skim_balanced(&mut self, open: &TokenKind, close: &TokenKind) {
        if !self.at(open) {
            return;
        }
        self.advance();
        let mut depth = 1usize;
        while depth > 0 && !self.at(&TokenKind::Eof) {
            if self.at(open) {
                depth += 1;
            } else if self.at(close) {
                depth -= 1;
            }
            self.advance();
        }
    }

    // ---- Top level ----

    pub fn parse_program(&mut self) {
        while !self.at(&TokenKind::Eof) {
            self.parse_top_level();
        }
    }

    fn parse_top_level(&mut self) {
        match &self.current.kind {
            TokenKind::Semicolon => {
                self.advance();
            }
            TokenKind::Keyword(Keyword::Typedef) => self.parse_typedef(),
            kind if kind.starts_modifier() || kind.starts_type() => self.parse_declaration(None),
            _ => {
                let loc = self.loc();
                self.ctx.error(loc, "expected a declaration");
                self.recover_statement();
                // A stray '}' at the top level would never be consumed
                // by statement recovery.
                self.eat(&TokenKind::RBrace);
            }
        }
    }

    // ---- Modifiers and types ----

    fn parse_modifiers(&mut self) -> Modifiers {
        let mut modifiers = Modifiers::EMPTY;
        loop {
            let bit = match &self.current.kind {
                TokenKind::Keyword(kw) => match kw {
                    Keyword::Extern => Modifiers::EXTERN,
                    Keyword::NoInterpolation => Modifiers::NOINTERPOLATION,
                    Keyword::Precise => Modifiers::PRECISE,
                    Keyword::Shared => Modifiers::SHARED,
                    Keyword::GroupShared => Modifiers::GROUPSHARED,
                    Keyword::Static => Modifiers::STATIC,
                    Keyword::Uniform => Modifiers::UNIFORM,
                    Keyword::Volatile => Modifiers::VOLATILE,
                    Keyword::Const => Modifiers::CONST,
                    Keyword::RowMajor => Modifiers::ROW_MAJOR,
                    Keyword::ColumnMajor => Modifiers::COLUMN_MAJOR,
                    Keyword::In => Modifiers::IN,
                    Keyword::Out => Modifiers::OUT,
                    Keyword::InOut => Modifiers::IN | Modifiers::OUT,
                    _ => break,
                },
                _ => break,
            };
            let loc = self.loc();
            self.advance();
            if modifiers.contains(bit) {
                self.ctx.error(loc, "duplicate modifier");
            }
            modifiers |= bit;
        }
        modifiers
    }

    /// Parses a type specifier. Inline struct definitions register the
    /// new type as a side effect.
    fn parse_type(&mut self) -> Option<Handle<Type>> {
        let loc = self.loc();
        match self.current.kind.clone() {
            TokenKind::TypeName(name) => {
                self.advance();
                let ty = self.ctx.lookup_type(&name);
                debug_assert!(ty.is_some(), "lexer classified an unregistered type");
                ty
            }
            TokenKind::Keyword(Keyword::Void) => {
                self.advance();
                Some(self.ctx.builtins.void)
            }
            TokenKind::Keyword(Keyword::Sampler) => {
                self.advance();
                Some(self.ctx.builtins.sampler)
            }
            TokenKind::Keyword(Keyword::Sampler1D) => {
                self.advance();
                Some(self.ctx.builtins.sampler1d)
            }
            TokenKind::Keyword(Keyword::Sampler2D) => {
                self.advance();
                Some(self.ctx.builtins.sampler2d)
            }
            TokenKind::Keyword(Keyword::Sampler3D) => {
                self.advance();
                Some(self.ctx.builtins.sampler3d)
            }
            TokenKind::Keyword(Keyword::SamplerCube) => {
                self.advance();
                Some(self.ctx.builtins.sampler_cube)
            }
            TokenKind::Keyword(Keyword::Texture) => {
                self.advance();
                Some(self.ctx.builtins.texture)
            }
            TokenKind::Keyword(Keyword::String) => {
                self.advance();
                Some(self.ctx.builtins.string)
            }
            TokenKind::Keyword(Keyword::Struct) => self.parse_struct_spec(),
            TokenKind::Keyword(Keyword::Vector | Keyword::Matrix) => {
                self.advance();
                self.ctx
                    .error(loc, "template vector/matrix syntax is not supported");
                None
            }
            _ => {
                self.ctx.error(loc, "expected a type");
                None
            }
        }
    }

    // ---- Structs ----

    /// Parses what follows the `struct` keyword: a reference to a named
    /// struct type, or a (possibly anonymous) definition.
    fn parse_struct_spec(&mut self) -> Option<Handle<Type>> {
        self.advance(); // 'struct'
        let loc = self.loc();
        match self.current.kind.clone() {
            TokenKind::TypeName(name) => {
                if *self.peek_second() == TokenKind::LBrace {
                    // Redefinition attempt; parse the body for recovery,
                    // then report through register_type.
                    self.advance();
                    let fields = self.parse_struct_fields()?;
                    let ty = self
                        .ctx
                        .program
                        .types
                        .add(Type::structure(Some(name.clone()), fields));
                    self.ctx.register_type(&name, ty, loc);
                    return Some(ty);
                }
                self.advance();
                let ty = self.ctx.lookup_type(&name)?;
                if self.ctx.program.types[ty].class != TypeClass::Struct {
                    let message = format!("'{name}' is not a struct type");
                    self.ctx.error(loc, &message);
                    return None;
                }
                Some(ty)
            }
            TokenKind::NewIdent(name) | TokenKind::VarName(name) => {
                self.advance();
                let fields = self.parse_struct_fields()?;
                let ty = self
                    .ctx
                    .program
                    .types
                    .add(Type::structure(Some(name.clone()), fields));
                // Register before the caller consumes the token after the
                // closing brace, so `struct S {...} S_user;` classifies.
                self.ctx.register_type(&name, ty, loc);
                Some(ty)
            }
            TokenKind::LBrace => {
                let fields = self.parse_struct_fields()?;
                Some(self.ctx.program.types.add(Type::structure(None, fields)))
            }
            _ => {
                self.ctx.error(loc, "expected a struct name or body");
                None
            }
        }
    }

    fn parse_struct_fields(&mut self) -> Option<Vec<StructField>> {
        if !self.expect(&TokenKind::LBrace, "'{' starting a struct body") {
            return None;
        }
        let mut fields = Vec::new();
        let mut reg_offset = 0u32;

        while !self.at(&TokenKind::RBrace) && !self.at(&TokenKind::Eof) {
            let field_loc = self.loc();
            let modifiers = self.parse_modifiers();
            if modifiers.difference(Modifiers::TYPE_MODIFIERS | Modifiers::NOINTERPOLATION)
                != Modifiers::EMPTY
            {
                self.ctx
                    .error(field_loc, "storage modifiers are not allowed on struct fields");
            }
            let Some(base) = self.parse_type() else {
                self.recover_statement();
                continue;
            };

            loop {
                let name_loc = self.loc();
                let Some(name) = self.current.kind.ident_text().map(String::from) else {
                    self.ctx.error(name_loc, "expected a field name");
                    self.recover_statement();
                    break;
                };
                self.advance();

                let mut ty = self.ctx.type_with_modifiers(
                    base,
                    modifiers.masked(Modifiers::TYPE_MODIFIERS),
                    name_loc,
                );
                if let Some(size) = self.parse_array_suffix() {
                    ty = self.ctx.program.types.add(Type::array(ty, size));
                }
                let (semantic, reservation) = self.parse_colon_attributes();
                if reservation.is_some() {
                    self.ctx
                        .warning(name_loc, "register reservations on struct fields are ignored");
                }

                let size = self.ctx.program.types[ty].reg_size(&self.ctx.program.types);
                fields.push(StructField {
                    name,
                    ty,
                    modifiers,
                    semantic,
                    reg_offset,
                });
                reg_offset += size;

                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::Semicolon, "';' after a struct field");
        }
        self.expect(&TokenKind::RBrace, "'}' closing a struct body");
        Some(fields)
    }

    /// Parses an optional `[<const-expr>]` declarator suffix and folds
    /// the size. Reports and yields `None` for invalid sizes.
    fn parse_array_suffix(&mut self) -> Option<u32> {
        if !self.at(&TokenKind::LBracket) {
            return None;
        }
        let loc = self.loc();
        self.advance();
        let mut scratch = Block::new();
        let size_node = self.parse_expression(&mut scratch);
        if size_node.is_none() {
            while !matches!(
                self.current.kind,
                TokenKind::RBracket | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
            ) {
                self.advance();
            }
        }
        self.expect(&TokenKind::RBracket, "']' closing an array size");

        let folded = size_node.and_then(|node| self.ctx.fold_constant(node));
        match folded {
            Some(size) if size > 0 && size <= 65536 => Some(size as u32),
            Some(_) => {
                self.ctx
                    .error(loc, "array size must be a positive integer no larger than 65536");
                None
            }
            None => {
                self.ctx.error(loc, "array size is not a constant");
                None
            }
        }
    }

    // ---- Colon attributes (semantics, register reservations) ----

    fn parse_colon_attributes(&mut self) -> (Option<String>, Option<RegisterReservation>) {
        let mut semantic = None;
        let mut reservation = None;
        while self.at(&TokenKind::Colon) {
            self.advance();
            if self.at(&TokenKind::Keyword(Keyword::Register)) {
                reservation = self.parse_register_reservation();
            } else if let Some(name) = self.current.kind.ident_text() {
                semantic = Some(name.to_string());
                self.advance();
            } else {
                let loc = self.loc();
                self.ctx
                    .error(loc, "expected a semantic or register reservation");
                break;
            }
        }
        (semantic, reservation)
    }

    fn parse_register_reservation(&mut self) -> Option<RegisterReservation> {
        self.advance(); // 'register'
        if !self.expect(&TokenKind::LParen, "'(' after register") {
            return None;
        }
        let first_loc = self.loc();
        let first = self.current.kind.ident_text().map(String::from);
        if first.is_none() {
            self.ctx.error(first_loc, "expected a register name");
            self.skim_to_rparen();
            return None;
        }
        self.advance();

        let mut spec = first.expect("checked above");
        let mut spec_loc = first_loc;
        if self.eat(&TokenKind::Comma) {
            // First argument was a shader target; tolerated but ignored.
            self.ctx
                .warning(first_loc, "shader target in register reservation is ignored");
            spec_loc = self.loc();
            match self.current.kind.ident_text().map(String::from) {
                Some(second) => {
                    spec = second;
                    self.advance();
                }
                None => {
                    self.ctx.error(spec_loc, "expected a register name");
                    self.skim_to_rparen();
                    return None;
                }
            }
        }
        self.expect(&TokenKind::RParen, "')' closing a register reservation");

        match parse_register_spec(&spec) {
            Some(reservation) => Some(reservation),
            None => {
                let message = format!("unsupported register type '{spec}'");
                self.ctx.warning(spec_loc, &message);
                None
            }
        }
    }

    fn skim_to_rparen(&mut self) {
        while !self.at(&TokenKind::RParen) && !self.at(&TokenKind::Eof) {
            self.advance();
        }
        self.eat(&TokenKind::RParen);
    }

    // ---- Typedefs ----

    fn parse_typedef(&mut self) {
        let typedef_loc = self.loc();
        self.advance(); // 'typedef'
        let modifiers = self.parse_modifiers();
        if modifiers.difference(Modifiers::TYPE_MODIFIERS) != Modifiers::EMPTY {
            self.ctx
                .error(typedef_loc, "storage modifiers are not allowed on typedefs");
        }
        let Some(base) = self.parse_type() else {
            self.recover_statement();
            return;
        };

        loop {
            let name_loc = self.loc();
            let Some(name) = self.current.kind.ident_text().map(String::from) else {
                self.ctx.error(name_loc, "expected a typedef name");
                self.recover_statement();
                return;
            };
            self.advance();

            let mut ty = self.ctx.type_with_modifiers(
                base,
                modifiers.masked(Modifiers::TYPE_MODIFIERS),
                name_loc,
            );
            if let Some(size) = self.parse_array_suffix() {
                ty = self.ctx.program.types.add(Type::array(ty, size));
            }
            // Typedefs always get their own descriptor carrying the new name.
            let mut named = self.ctx.program.types[ty].clone();
            named.name = Some(name.clone());
            let named = self.ctx.program.types.add(named);
            // Register before consuming the separator so the next token
            // classifies against the new name.
            self.ctx.register_type(&name, named, name_loc);

            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::Semicolon, "';' after a typedef");
    }

    // ---- Declarations ----

    /// Parses a variable or function declaration. `block` receives
    /// lowered initializer instructions for locals; `None` at global
    /// scope.
    fn parse_declaration(&mut self, mut block: Option<&mut Block>) {
        let decl_loc = self.loc();
        let modifiers = self.parse_modifiers();
        let Some(base) = self.parse_type() else {
            self.recover_statement();
            return;
        };

        // Type-only declaration (e.g. a struct definition).
        if self.at(&TokenKind::Semicolon) {
            self.advance();
            return;
        }

        let name_loc = self.loc();
        let Some(name) = self.current.kind.ident_text().map(String::from) else {
            self.ctx.error(name_loc, "expected a declarator name");
            self.recover_statement();
            return;
        };
        self.advance();

        if self.at(&TokenKind::LParen) {
            if block.is_some() {
                self.ctx
                    .error(name_loc, "local function definitions are not allowed");
                self.recover_statement();
                return;
            }
            self.parse_function(modifiers, base, name, name_loc);
            return;
        }

        let mut first = Some((name, name_loc));
        loop {
            let (name, name_loc) = match first.take() {
                Some(pair) => pair,
                None => {
                    let loc = self.loc();
                    let Some(name) = self.current.kind.ident_text().map(String::from) else {
                        self.ctx.error(loc, "expected a declarator name");
                        self.recover_statement();
                        return;
                    };
                    self.advance();
                    (name, loc)
                }
            };
            self.parse_one_declarator(decl_loc, modifiers, base, name, name_loc, block.as_deref_mut());
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::Semicolon, "';' after a declaration");
    }

    fn parse_one_declarator(
        &mut self,
        decl_loc: SourceLoc,
        modifiers: Modifiers,
        base: Handle<Type>,
        name: String,
        name_loc: SourceLoc,
        block: Option<&mut Block>,
    ) {
        let mut ty = self.ctx.type_with_modifiers(
            base,
            modifiers.masked(Modifiers::TYPE_MODIFIERS),
            decl_loc,
        );
        if let Some(size) = self.parse_array_suffix() {
            ty = self.ctx.program.types.add(Type::array(ty, size));
        }
        let (semantic, reservation) = self.parse_colon_attributes();

        let mut scratch = Block::new();
        let (target, is_global): (&mut Block, bool) = match block {
            Some(block) => (block, false),
            None => (&mut scratch, true),
        };

        let initializer = if self.at(&TokenKind::Assign) {
            let init_loc = self.loc();
            self.advance();
            self.parse_initializer(target).map(|(parts, braced)| Initializer {
                parts,
                braced,
                loc: init_loc,
            })
        } else {
            None
        };

        let mut var_modifiers = modifiers;
        if is_global {
            var_modifiers |= Modifiers::UNIFORM;
        } else {
            if var_modifiers.intersects(Modifiers::ILLEGAL_ON_LOCALS) {
                let message =
                    format!("modifier not allowed on local variable '{name}'");
                self.ctx.error(name_loc, &message);
            }
            if semantic.is_some() {
                let message = format!("semantics are not allowed on local variable '{name}'");
                self.ctx.error(name_loc, &message);
            }
        }

        if modifiers.contains(Modifiers::CONST)
            && !var_modifiers.contains(Modifiers::UNIFORM)
            && initializer.is_none()
        {
            let message = format!("const variable '{name}' without initializer");
            self.ctx.error(name_loc, &message);
        }

        let mut var = Variable::new(name, ty, name_loc);
        var.modifiers = var_modifiers;
        var.semantic = semantic;
        var.reservation = reservation;

        let Some(declared) = self.ctx.declare_variable(var) else {
            return;
        };
        let Some(initializer) = initializer else {
            return;
        };
        if is_global {
            log::debug!("initializer on global variable is not lowered");
            return;
        }
        self.lower_initializer(target, declared, initializer);
    }

    /// Parses `= expr` or `= { expr, ... }`. Nested braces are consumed
    /// but not lowered.
    fn parse_initializer(&mut self, block: &mut Block) -> Option<(Vec<Handle<Node>>, bool)> {
        if !self.at(&TokenKind::LBrace) {
            let part = self.parse_assignment_expr(block)?;
            return Some((vec![part], false));
        }
        self.advance();
        let mut parts = Vec::new();
        loop {
            if self.at(&TokenKind::RBrace) {
                break;
            }
            if self.at(&TokenKind::LBrace) {
                log::warn!("nested compound initializers are not implemented");
                self.skim_balanced(&TokenKind::LBrace, &TokenKind::RBrace);
            } else {
                parts.push(self.parse_assignment_expr(block)?);
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace, "'}' closing an initializer");
        Some((parts, true))
    }

    fn lower_initializer(&mut self, block: &mut Block, var: Handle<Variable>, init: Initializer) {
        let Initializer { parts, braced, loc } = init;
        let var_ty = self.ctx.program.variables[var].ty;
        let class = self.ctx.program.types[var_ty].class;
        let total: u32 = parts
            .iter()
            .map(|&p| self.component_count_of(p))
            .sum();
        let expected = self.ctx.program.types[var_ty].component_count(&self.ctx.program.types);

        match class {
            TypeClass::Scalar | TypeClass::Vector | TypeClass::Matrix => {
                let rhs = if parts.len() == 1 && total == expected {
                    parts[0]
                } else if parts.len() == 1 && total == 1 {
                    // Broadcast: repeat the scalar through a constructor.
                    let base = self.ctx.program.types[var_ty].base;
                    let scalar_ty = self.ctx.scalar_of(base);
                    let Some(scalar) = self.implicit_convert(block, parts[0], scalar_ty, loc)
                    else {
                        return;
                    };
                    let shape = self.unmodified_shape(var_ty);
                    self.append_node(
                        block,
                        NodeKind::Constructor {
                            args: vec![scalar; expected as usize],
                        },
                        shape,
                        loc,
                    )
                } else if total == expected {
                    let shape = self.unmodified_shape(var_ty);
                    self.append_node(block, NodeKind::Constructor { args: parts }, shape, loc)
                } else {
                    let message = format!(
                        "wrong number of components in initializer (expected {expected}, got {total})"
                    );
                    self.ctx.error(loc, &message);
                    return;
                };
                let Some(rhs) = self.implicit_convert(block, rhs, var_ty, loc) else {
                    return;
                };
                self.append_store_to_var(block, var, rhs, loc);
            }
            TypeClass::Struct => {
                // Whole-struct copy from a matching value.
                if !braced && parts.len() == 1 {
                    let src_ty = self.ctx.program.nodes[parts[0]].ty;
                    if hlslc_ir::types_equal(&self.ctx.program.types, src_ty, var_ty) {
                        self.append_store_to_var(block, var, parts[0], loc);
                    } else {
                        self.ctx
                            .error(loc, "cannot initialize a struct from an unrelated value");
                    }
                    return;
                }
                if total != expected {
                    let message = format!(
                        "wrong number of components in initializer (expected {expected}, got {total})"
                    );
                    self.ctx.error(loc, &message);
                    return;
                }
                self.lower_struct_initializer(block, var, var_ty, &parts, loc);
            }
            TypeClass::Array => {
                if total != expected {
                    let message = format!(
                        "wrong number of components in initializer (expected {expected}, got {total})"
                    );
                    self.ctx.error(loc, &message);
                    return;
                }
                log::warn!("array initializers are not implemented");
            }
            TypeClass::Object => {
                self.ctx.error(loc, "cannot initialize an object variable");
            }
        }
    }

    /// Lowers a braced struct initializer to per-field assignments
    /// through record derefs. A vector field fed by scalar parts is
    /// filled one component at a time; other size mismatches are left
    /// unlowered.
    fn lower_struct_initializer(
        &mut self,
        block: &mut Block,
        var: Handle<Variable>,
        var_ty: Handle<Type>,
        parts: &[Handle<Node>],
        loc: SourceLoc,
    ) {
        let field_count = self.ctx.program.types[var_ty].fields.len();
        let mut next_part = 0usize;
        for field_index in 0..field_count {
            let Some(&part) = parts.get(next_part) else {
                return;
            };

            let field_ty = self.ctx.program.types[var_ty].fields[field_index].ty;
            let field_size =
                self.ctx.program.types[field_ty].component_count(&self.ctx.program.types);
            let part_size = self.component_count_of(part);

            if part_size == field_size {
                next_part += 1;
                let Some(rhs) = self.implicit_convert(block, part, field_ty, loc) else {
                    continue;
                };
                let record = self.struct_field_target(var, var_ty, field_index, field_ty, loc);
                self.append_node(
                    block,
                    NodeKind::Assign {
                        lhs: record,
                        op: hlslc_ir::AssignOp::Assign,
                        rhs,
                    },
                    field_ty,
                    loc,
                );
                continue;
            }

            let available = &parts[next_part..];
            let scalar_fill = self.ctx.program.types[field_ty].class == TypeClass::Vector
                && available.len() >= field_size as usize
                && available[..field_size as usize]
                    .iter()
                    .all(|&p| self.component_count_of(p) == 1);
            if !scalar_fill {
                log::warn!("struct initializer with mismatched field sizes is not implemented");
                next_part += 1;
                continue;
            }

            let elem_ty = self.ctx.scalar_of(self.ctx.program.types[field_ty].base);
            for component in 0..field_size {
                let part = parts[next_part];
                next_part += 1;
                let Some(rhs) = self.implicit_convert(block, part, elem_ty, loc) else {
                    continue;
                };
                let record = self.struct_field_target(var, var_ty, field_index, field_ty, loc);
                let index = self.ctx.program.nodes.add(Node::new(
                    NodeKind::Constant(hlslc_ir::ScalarValue::Int(component as i32)),
                    self.ctx.builtins.int_,
                    loc,
                ));
                let element = self.ctx.program.nodes.add(Node::new(
                    NodeKind::ArrayDeref {
                        base: record,
                        index,
                    },
                    elem_ty,
                    loc,
                ));
                self.append_node(
                    block,
                    NodeKind::Assign {
                        lhs: element,
                        op: hlslc_ir::AssignOp::Assign,
                        rhs,
                    },
                    elem_ty,
                    loc,
                );
            }
        }
    }

    /// Builds the unlinked `var.field` deref chain an initializer
    /// assignment stores through.
    fn struct_field_target(
        &mut self,
        var: Handle<Variable>,
        var_ty: Handle<Type>,
        field: usize,
        field_ty: Handle<Type>,
        loc: SourceLoc,
    ) -> Handle<Node> {
        let deref = self
            .ctx
            .program
            .nodes
            .add(Node::new(NodeKind::VarDeref(var), var_ty, loc));
        self.ctx.program.nodes.add(Node::new(
            NodeKind::RecordDeref { base: deref, field },
            field_ty,
            loc,
        ))
    }

    fn append_store_to_var(
        &mut self,
        block: &mut Block,
        var: Handle<Variable>,
        rhs: Handle<Node>,
        loc: SourceLoc,
    ) {
        let var_ty = self.ctx.program.variables[var].ty;
        let deref = self
            .ctx
            .program
            .nodes
            .add(Node::new(NodeKind::VarDeref(var), var_ty, loc));
        self.append_node(
            block,
            NodeKind::Assign {
                lhs: deref,
                op: hlslc_ir::AssignOp::Assign,
                rhs,
            },
            var_ty,
            loc,
        );
    }

    // ---- Functions ----

    fn parse_function(
        &mut self,
        modifiers: Modifiers,
        return_base: Handle<Type>,
        name: String,
        name_loc: SourceLoc,
    ) {
        let return_ty = self.ctx.type_with_modifiers(
            return_base,
            modifiers.masked(Modifiers::TYPE_MODIFIERS),
            name_loc,
        );

        self.ctx.push_scope(); // parameter scope
        self.advance(); // '('
        let mut parameters = Vec::new();
        if !self.at(&TokenKind::RParen) {
            loop {
                if let Some(param) = self.parse_parameter() {
                    parameters.push(param);
                }
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen, "')' closing a parameter list");

        let (semantic, reservation) = self.parse_colon_attributes();
        if reservation.is_some() {
            self.ctx.warning(
                name_loc,
                "register reservations on functions are not supported",
            );
        }
        if self.ctx.program.types[return_ty].is_void() && semantic.is_some() {
            let message = format!("void function '{name}' cannot have a semantic");
            self.ctx.error(name_loc, &message);
        }

        let mut function = Function::new(name, return_ty, name_loc);
        function.parameters = parameters;
        function.semantic = semantic;

        if self.at(&TokenKind::LBrace) {
            let mut body = Block::new();
            self.current_return = Some(return_ty);
            self.parse_compound(&mut body);
            self.current_return = None;
            function.body = Some(body);
        } else {
            self.expect(&TokenKind::Semicolon, "';' or a function body");
        }
        self.ctx.pop_scope();
        self.ctx.declare_function(function);
    }

    fn parse_parameter(&mut self) -> Option<Handle<Variable>> {
        let param_loc = self.loc();
        let mut modifiers = self.parse_modifiers();
        // Parameters default to inputs.
        if !modifiers.intersects(Modifiers::IN | Modifiers::OUT) {
            modifiers |= Modifiers::IN;
        }
        let base = self.parse_type()?;
        let mut ty = self.ctx.type_with_modifiers(
            base,
            modifiers.masked(Modifiers::TYPE_MODIFIERS),
            param_loc,
        );

        let name_loc = self.loc();
        let Some(name) = self.current.kind.ident_text().map(String::from) else {
            self.ctx.error(name_loc, "expected a parameter name");
            return None;
        };
        self.advance();

        if let Some(size) = self.parse_array_suffix() {
            ty = self.ctx.program.types.add(Type::array(ty, size));
        }
        let (semantic, reservation) = self.parse_colon_attributes();

        let mut var = Variable::new(name, ty, name_loc);
        var.modifiers = modifiers;
        var.semantic = semantic;
        var.reservation = reservation;
        self.ctx.declare_variable(var)
    }

    // ---- Statements ----

    fn parse_compound(&mut self, block: &mut Block) {
        self.advance(); // '{'
        self.ctx.push_scope();
        while !self.at(&TokenKind::RBrace) && !self.at(&TokenKind::Eof) {
            self.parse_statement(block);
        }
        // Pop before consuming '}' so the next token classifies against
        // the enclosing scope.
        self.ctx.pop_scope();
        self.expect(&TokenKind::RBrace, "'}' closing a block");
    }

    fn parse_statement(&mut self, block: &mut Block) {
        match &self.current.kind {
            TokenKind::LBrace => self.parse_compound(block),
            TokenKind::Semicolon => {
                self.advance();
            }
            TokenKind::Keyword(Keyword::If) => self.parse_if(block),
            TokenKind::Keyword(Keyword::While) => self.parse_while(block),
            TokenKind::Keyword(Keyword::Do) => self.parse_do_while(block),
            TokenKind::Keyword(Keyword::For) => self.parse_for(block),
            TokenKind::Keyword(Keyword::Return) => self.parse_return(block),
            TokenKind::Keyword(Keyword::Break) => {
                let loc = self.loc();
                self.advance();
                self.expect(&TokenKind::Semicolon, "';' after break");
                let void = self.ctx.builtins.void;
                self.append_node(block, NodeKind::Jump(JumpKind::Break), void, loc);
            }
            TokenKind::Keyword(Keyword::Continue) => {
                let loc = self.loc();
                self.advance();
                self.expect(&TokenKind::Semicolon, "';' after continue");
                let void = self.ctx.builtins.void;
                self.append_node(block, NodeKind::Jump(JumpKind::Continue), void, loc);
            }
            TokenKind::Keyword(Keyword::Typedef) => self.parse_typedef(),
            TokenKind::TypeName(_) => {
                // `float4 x;` declares; `float4(...)` constructs.
                if *self.peek_second() == TokenKind::LParen {
                    self.parse_expression_statement(block);
                } else {
                    self.parse_declaration(Some(block));
                }
            }
            kind if kind.starts_modifier() || kind.starts_type() => {
                self.parse_declaration(Some(block));
            }
            _ => self.parse_expression_statement(block),
        }
    }

    fn parse_expression_statement(&mut self, block: &mut Block) {
        if self.parse_expression(block).is_none() {
            self.recover_statement();
            return;
        }
        if !self.expect(&TokenKind::Semicolon, "';' after an expression") {
            self.recover_statement();
        }
    }

    fn parse_if(&mut self, block: &mut Block) {
        let loc = self.loc();
        self.advance(); // 'if'
        self.expect(&TokenKind::LParen, "'(' after if");
        let condition = self.parse_expression(block);
        self.expect(&TokenKind::RParen, "')' closing an if condition");

        if let Some(condition) = condition {
            self.check_scalar_condition(condition, loc);
        }

        let mut then_block = Block::new();
        self.parse_statement(&mut then_block);
        let else_block = if self.eat(&TokenKind::Keyword(Keyword::Else)) {
            let mut b = Block::new();
            self.parse_statement(&mut b);
            Some(b)
        } else {
            None
        };

        let Some(condition) = condition else {
            return;
        };
        let void = self.ctx.builtins.void;
        self.append_node(
            block,
            NodeKind::If {
                condition,
                then_block,
                else_block,
            },
            void,
            loc,
        );
    }

    fn check_scalar_condition(&mut self, condition: Handle<Node>, loc: SourceLoc) {
        let ty = &self.ctx.program.types[self.ctx.program.nodes[condition].ty];
        if !(ty.dimx == 1 && ty.dimy == 1) {
            self.ctx.error(loc, "condition must be scalar");
        }
    }

    /// Builds the canonical loop prologue/epilogue: the condition
    /// instructions followed by `if (!cond) break;`. An absent condition
    /// yields an unconditional infinite loop.
    fn make_condition_break(
        &mut self,
        mut condition_instrs: Block,
        condition: Option<Handle<Node>>,
        loc: SourceLoc,
    ) -> Block {
        let Some(condition) = condition else {
            return condition_instrs;
        };
        self.check_scalar_condition(condition, loc);
        let cond_ty = self.ctx.program.nodes[condition].ty;
        let not = self.append_node(
            &mut condition_instrs,
            NodeKind::Expr {
                op: hlslc_ir::ExprOp::LogicNot,
                operands: [Some(condition), None, None],
            },
            cond_ty,
            loc,
        );
        let void = self.ctx.builtins.void;
        let brk = self
            .ctx
            .program
            .nodes
            .add(Node::new(NodeKind::Jump(JumpKind::Break), void, loc));
        let mut then_block = Block::new();
        then_block.push(brk);
        self.append_node(
            &mut condition_instrs,
            NodeKind::If {
                condition: not,
                then_block,
                else_block: None,
            },
            void,
            loc,
        );
        condition_instrs
    }

    fn append_loop(&mut self, block: &mut Block, body: Block, loc: SourceLoc) {
        let void = self.ctx.builtins.void;
        self.append_node(
            block,
            NodeKind::Loop {
                body,
                next_index: 0,
            },
            void,
            loc,
        );
    }

    fn parse_while(&mut self, block: &mut Block) {
        let loc = self.loc();
        self.advance(); // 'while'
        self.expect(&TokenKind::LParen, "'(' after while");
        let mut condition_instrs = Block::new();
        let condition = self.parse_expression(&mut condition_instrs);
        self.expect(&TokenKind::RParen, "')' closing a while condition");

        let mut body = Block::new();
        self.parse_statement(&mut body);

        let mut loop_body = self.make_condition_break(condition_instrs, condition, loc);
        loop_body.append(&mut body);
        self.append_loop(block, loop_body, loc);
    }

    fn parse_do_while(&mut self, block: &mut Block) {
        let loc = self.loc();
        self.advance(); // 'do'
        let mut body = Block::new();
        self.parse_statement(&mut body);

        self.expect(&TokenKind::Keyword(Keyword::While), "'while' after a do body");
        self.expect(&TokenKind::LParen, "'(' after while");
        let mut condition_instrs = Block::new();
        let condition = self.parse_expression(&mut condition_instrs);
        self.expect(&TokenKind::RParen, "')' closing a do-while condition");
        self.expect(&TokenKind::Semicolon, "';' after a do-while loop");

        let mut check = self.make_condition_break(condition_instrs, condition, loc);
        body.append(&mut check);
        self.append_loop(block, body, loc);
    }

    fn parse_for(&mut self, block: &mut Block) {
        let loc = self.loc();
        self.advance(); // 'for'
        self.ctx.push_scope();
        self.expect(&TokenKind::LParen, "'(' after for");

        let mut init = Block::new();
        if self.at(&TokenKind::Semicolon) {
            self.advance();
        } else if self.current.kind.starts_modifier() || self.current.kind.starts_type() {
            // The initializer declaration consumes its own ';'.
            self.parse_declaration(Some(&mut init));
        } else {
            self.parse_expression(&mut init);
            self.expect(&TokenKind::Semicolon, "';' after a for initializer");
        }

        let mut condition_instrs = Block::new();
        let condition = if self.at(&TokenKind::Semicolon) {
            None
        } else {
            self.parse_expression(&mut condition_instrs)
        };
        self.expect(&TokenKind::Semicolon, "';' after a for condition");

        let mut iter = Block::new();
        if !self.at(&TokenKind::RParen) {
            self.parse_expression(&mut iter);
        }
        self.expect(&TokenKind::RParen, "')' closing a for header");

        let mut body = Block::new();
        self.parse_statement(&mut body);
        self.ctx.pop_scope();

        block.append(&mut init);
        let mut loop_body = self.make_condition_break(condition_instrs, condition, loc);
        loop_body.append(&mut body);
        loop_body.append(&mut iter);
        self.append_loop(block, loop_body, loc);
    }

    fn parse_return(&mut self, block: &mut Block) {
        let loc = self.loc();
        self.advance(); // 'return'
        let return_ty = self
            .current_return
            .expect("return only parses inside function bodies");
        let returns_void = self.ctx.program.types[return_ty].is_void();
        let void = self.ctx.builtins.void;

        if self.eat(&TokenKind::Semicolon) {
            if !returns_void {
                self.ctx
                    .error(loc, "non-void function must return a value");
            }
            self.append_node(block, NodeKind::Jump(JumpKind::Return(None)), void, loc);
            return;
        }

        let value = self.parse_expression(block);
        self.expect(&TokenKind::Semicolon, "';' after a return value");
        if returns_void {
            self.ctx.error(loc, "void function cannot return a value");
            self.append_node(block, NodeKind::Jump(JumpKind::Return(None)), void, loc);
            return;
        }
        let Some(value) = value else {
            return;
        };
        let Some(converted) = self.implicit_convert(block, value, return_ty, loc) else {
            return;
        };
        self.append_node(
            block,
            NodeKind::Jump(JumpKind::Return(Some(converted))),
            void,
            loc,
        );
    }

    // ---- Node helpers ----

    pub(crate) fn append_node(
        &mut self,
        block: &mut Block,
        kind: NodeKind,
        ty: Handle<Type>,
        loc: SourceLoc,
    ) -> Handle<Node> {
        let handle = self.ctx.program.nodes.add(Node::new(kind, ty, loc));
        block.push(handle);
        handle
    }

    pub(crate) fn component_count_of(&self, node: Handle<Node>) -> u32 {
        let ty = self.ctx.program.nodes[node].ty;
        self.ctx.program.types[ty].component_count(&self.ctx.program.types)
    }

    /// The seeded, modifier-free type with the same shape as `ty`.
    pub(crate) fn unmodified_shape(&self, ty: Handle<Type>) -> Handle<Type> {
        let t = &self.ctx.program.types[ty];
        match t.class {
            TypeClass::Scalar | TypeClass::Vector | TypeClass::Matrix => {
                self.ctx.builtin_numeric(t.base, t.dimx, t.dimy)
            }
            _ => ty,
        }
    }
}

/// Parses a `<tag><number>` register spec (`c0`, `s3`, ...).
fn parse_register_spec(spec: &str) -> Option<RegisterReservation> {
    let mut chars = spec.chars();
    let kind = match chars.next()? {
        'c' => RegisterKind::Const,
        'i' => RegisterKind::ConstInt,
        'b' => RegisterKind::ConstBool,
        's' => RegisterKind::Sampler,
        _ => return None,
    };
    let rest = chars.as_str();
    if rest.is_empty() {
        return None;
    }
    let index: u32 = rest.parse().ok()?;
    Some(RegisterReservation { kind, index })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_spec_tags() {
        let r = parse_register_spec("c12").unwrap();
        assert_eq!(r.kind, RegisterKind::Const);
        assert_eq!(r.index, 12);
        assert_eq!(parse_register_spec("s0").unwrap().kind, RegisterKind::Sampler);
        assert_eq!(parse_register_spec("i3").unwrap().kind, RegisterKind::ConstInt);
        assert_eq!(parse_register_spec("b1").unwrap().kind, RegisterKind::ConstBool);
    }

    #[test]
    fn register_spec_rejects_unknown_tags() {
        assert!(parse_register_spec("t0").is_none());
        assert!(parse_register_spec("c").is_none());
        assert!(parse_register_spec("cx").is_none());
        assert!(parse_register_spec("").is_none());
    }
}

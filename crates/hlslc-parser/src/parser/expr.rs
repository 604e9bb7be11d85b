//! Expression parsing and lowering.
//!
//! Expressions lower into linear instruction lists whose last element is
//! the expression's result node; every lowering helper upholds that
//! invariant, which lets assignment parsing pop its lvalue off the list.

use hlslc_ir::{
    format_type, pack_matrix_swizzle, pack_vector_swizzle, types_equal, AssignOp, BaseType, Block,
    ExprOp, Handle, Node, NodeKind, ScalarValue, SourceLoc, Type, TypeClass,
};

use super::Parser;
use crate::token::TokenKind;

fn assign_op_of(kind: &TokenKind) -> Option<AssignOp> {
    Some(match kind {
        TokenKind::Assign => AssignOp::Assign,
        TokenKind::AddAssign => AssignOp::Add,
        TokenKind::SubAssign => AssignOp::Sub,
        TokenKind::MulAssign => AssignOp::Mul,
        TokenKind::DivAssign => AssignOp::Div,
        TokenKind::ModAssign => AssignOp::Mod,
        TokenKind::ShlAssign => AssignOp::Shl,
        TokenKind::ShrAssign => AssignOp::Shr,
        TokenKind::AndAssign => AssignOp::BitAnd,
        TokenKind::OrAssign => AssignOp::BitOr,
        TokenKind::XorAssign => AssignOp::BitXor,
        _ => return None,
    })
}

/// Binary operators with their precedence (higher binds tighter).
fn binary_op_of(kind: &TokenKind) -> Option<(ExprOp, u8)> {
    Some(match kind {
        TokenKind::PipePipe => (ExprOp::LogicOr, 1),
        TokenKind::AmpAmp => (ExprOp::LogicAnd, 2),
        TokenKind::Pipe => (ExprOp::BitOr, 3),
        TokenKind::Caret => (ExprOp::BitXor, 4),
        TokenKind::Amp => (ExprOp::BitAnd, 5),
        TokenKind::EqEq => (ExprOp::Equal, 6),
        TokenKind::Ne => (ExprOp::NotEqual, 6),
        TokenKind::Lt => (ExprOp::Less, 7),
        TokenKind::Gt => (ExprOp::Greater, 7),
        TokenKind::Le => (ExprOp::LessEqual, 7),
        TokenKind::Ge => (ExprOp::GreaterEqual, 7),
        TokenKind::Shl => (ExprOp::Shl, 8),
        TokenKind::Shr => (ExprOp::Shr, 8),
        TokenKind::Plus => (ExprOp::Add, 9),
        TokenKind::Minus => (ExprOp::Sub, 9),
        TokenKind::Star => (ExprOp::Mul, 10),
        TokenKind::Slash => (ExprOp::Div, 10),
        TokenKind::Percent => (ExprOp::Mod, 10),
        _ => return None,
    })
}

fn base_rank(base: BaseType) -> u8 {
    match base {
        BaseType::Bool => 0,
        BaseType::Int => 1,
        BaseType::Uint => 2,
        BaseType::Half => 3,
        BaseType::Float => 4,
        BaseType::Double => 5,
        _ => 0,
    }
}

impl Parser<'_> {
    pub(crate) fn parse_expression(&mut self, block: &mut Block) -> Option<Handle<Node>> {
        self.parse_assignment_expr(block)
    }

    pub(crate) fn parse_assignment_expr(&mut self, block: &mut Block) -> Option<Handle<Node>> {
        let lhs = self.parse_conditional(block)?;
        let Some(op) = assign_op_of(&self.current.kind) else {
            return Some(lhs);
        };
        let loc = self.loc();
        self.advance();
        // The store target leaves the instruction list; it is owned by
        // the assignment node.
        debug_assert_eq!(block.last().copied(), Some(lhs));
        block.pop();
        let rhs = self.parse_assignment_expr(block)?;
        self.lower_assignment(block, lhs, op, rhs, loc)
    }

    fn parse_conditional(&mut self, block: &mut Block) -> Option<Handle<Node>> {
        let condition = self.parse_binary(block, 0)?;
        if !self.at(&TokenKind::Question) {
            return Some(condition);
        }
        let loc = self.loc();
        self.advance();
        let accept = self.parse_assignment_expr(block)?;
        self.expect(&TokenKind::Colon, "':' in a conditional expression");
        let reject = self.parse_conditional(block)?;

        self.require_numeric(condition, loc)?;
        let common = self.common_type(accept, reject, loc)?;
        let accept = self.implicit_convert(block, accept, common, loc)?;
        let reject = self.implicit_convert(block, reject, common, loc)?;
        Some(self.append_node(
            block,
            NodeKind::Expr {
                op: ExprOp::Select,
                operands: [Some(condition), Some(accept), Some(reject)],
            },
            common,
            loc,
        ))
    }

    fn parse_binary(&mut self, block: &mut Block, min_prec: u8) -> Option<Handle<Node>> {
        let mut lhs = self.parse_unary(block)?;
        while let Some((op, prec)) = binary_op_of(&self.current.kind) {
            if prec < min_prec {
                break;
            }
            let loc = self.loc();
            self.advance();
            let rhs = self.parse_binary(block, prec + 1)?;
            lhs = self.lower_binary(block, op, lhs, rhs, loc)?;
        }
        Some(lhs)
    }

    fn parse_unary(&mut self, block: &mut Block) -> Option<Handle<Node>> {
        let loc = self.loc();
        if self.at(&TokenKind::LParen) && self.peek_second().starts_type() {
            return self.parse_cast(block);
        }
        match &self.current.kind {
            TokenKind::Inc => {
                self.advance();
                let operand = self.parse_unary(block)?;
                self.lower_increment(block, operand, true, false, loc)
            }
            TokenKind::Dec => {
                self.advance();
                let operand = self.parse_unary(block)?;
                self.lower_increment(block, operand, false, false, loc)
            }
            TokenKind::Plus => {
                self.advance();
                let operand = self.parse_unary(block)?;
                self.require_numeric(operand, loc)?;
                Some(operand)
            }
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_unary(block)?;
                self.require_numeric(operand, loc)?;
                let ty = self.ctx.program.nodes[operand].ty;
                Some(self.append_node(
                    block,
                    NodeKind::Expr {
                        op: ExprOp::Neg,
                        operands: [Some(operand), None, None],
                    },
                    ty,
                    loc,
                ))
            }
            TokenKind::Not => {
                self.advance();
                let operand = self.parse_unary(block)?;
                self.require_numeric(operand, loc)?;
                let ty = self.bool_shape_of(operand);
                Some(self.append_node(
                    block,
                    NodeKind::Expr {
                        op: ExprOp::LogicNot,
                        operands: [Some(operand), None, None],
                    },
                    ty,
                    loc,
                ))
            }
            TokenKind::Tilde => {
                self.advance();
                let operand = self.parse_unary(block)?;
                self.require_integer(operand, loc)?;
                let ty = self.ctx.program.nodes[operand].ty;
                Some(self.append_node(
                    block,
                    NodeKind::Expr {
                        op: ExprOp::BitNot,
                        operands: [Some(operand), None, None],
                    },
                    ty,
                    loc,
                ))
            }
            _ => self.parse_postfix(block),
        }
    }

    /// Parses `(type)expr` once the lookahead has confirmed a type after
    /// the parenthesis. A parenthesized constructor, `(float4(...))`,
    /// shares the prefix and is disambiguated here.
    fn parse_cast(&mut self, block: &mut Block) -> Option<Handle<Node>> {
        self.advance(); // '('
        let loc = self.loc();
        let modifiers = self.parse_modifiers();
        if !modifiers.is_empty() {
            self.ctx.error(loc, "modifiers are not allowed on casts");
        }
        let base = self.parse_type()?;
        let mut ty = base;
        while self.at(&TokenKind::LBracket) {
            if let Some(size) = self.parse_array_suffix() {
                ty = self.ctx.program.types.add(Type::array(ty, size));
            }
        }

        if self.eat(&TokenKind::RParen) {
            let operand = self.parse_unary(block)?;
            return self.lower_cast(block, operand, ty, loc);
        }
        if self.at(&TokenKind::LParen) {
            let constructed = self.lower_constructor_call(block, ty, loc)?;
            self.expect(&TokenKind::RParen, "')' closing a parenthesized expression");
            return self.parse_postfix_suffixes(block, constructed);
        }
        self.ctx.error(loc, "expected ')' closing a cast");
        None
    }

    fn parse_postfix(&mut self, block: &mut Block) -> Option<Handle<Node>> {
        let primary = self.parse_primary(block)?;
        self.parse_postfix_suffixes(block, primary)
    }

    fn parse_postfix_suffixes(
        &mut self,
        block: &mut Block,
        mut expr: Handle<Node>,
    ) -> Option<Handle<Node>> {
        loop {
            match &self.current.kind {
                TokenKind::Dot => {
                    self.advance();
                    let loc = self.loc();
                    let Some(name) = self.current.kind.ident_text().map(String::from) else {
                        self.ctx.error(loc, "expected a member name");
                        return None;
                    };
                    self.advance();
                    expr = self.lower_member_access(block, expr, &name, loc)?;
                }
                TokenKind::LBracket => {
                    let loc = self.loc();
                    self.advance();
                    let index = self.parse_expression(block)?;
                    self.expect(&TokenKind::RBracket, "']' closing an index");
                    expr = self.lower_index(block, expr, index, loc)?;
                }
                TokenKind::Inc => {
                    let loc = self.loc();
                    self.advance();
                    expr = self.lower_increment(block, expr, true, true, loc)?;
                }
                TokenKind::Dec => {
                    let loc = self.loc();
                    self.advance();
                    expr = self.lower_increment(block, expr, false, true, loc)?;
                }
                _ => return Some(expr),
            }
        }
    }

    fn parse_primary(&mut self, block: &mut Block) -> Option<Handle<Node>> {
        let loc = self.loc();
        match self.current.kind.clone() {
            TokenKind::IntConst(v) => {
                self.advance();
                let ty = self.ctx.builtins.int_;
                Some(self.append_node(block, NodeKind::Constant(ScalarValue::Int(v)), ty, loc))
            }
            TokenKind::UintConst(v) => {
                self.advance();
                let ty = self.ctx.builtins.uint_;
                Some(self.append_node(block, NodeKind::Constant(ScalarValue::Uint(v)), ty, loc))
            }
            TokenKind::FloatConst(v) => {
                self.advance();
                let ty = self.ctx.builtins.float_;
                Some(self.append_node(block, NodeKind::Constant(ScalarValue::Float(v)), ty, loc))
            }
            TokenKind::HalfConst(v) => {
                self.advance();
                let ty = self.ctx.builtins.half_;
                Some(self.append_node(block, NodeKind::Constant(ScalarValue::Half(v)), ty, loc))
            }
            TokenKind::BoolConst(v) => {
                self.advance();
                let ty = self.ctx.builtins.bool_;
                Some(self.append_node(block, NodeKind::Constant(ScalarValue::Bool(v)), ty, loc))
            }
            TokenKind::StringConst(_) => {
                self.advance();
                self.ctx
                    .error(loc, "string literals are not supported in expressions");
                None
            }
            TokenKind::VarName(name) => {
                self.advance();
                match self.ctx.lookup_variable(&name) {
                    Some(var) => {
                        let ty = self.ctx.program.variables[var].ty;
                        Some(self.append_node(block, NodeKind::VarDeref(var), ty, loc))
                    }
                    None => {
                        let message = format!("undeclared identifier '{name}'");
                        self.ctx.error(loc, &message);
                        None
                    }
                }
            }
            TokenKind::NewIdent(name) => {
                self.advance();
                if self.at(&TokenKind::LParen) {
                    let message = if self.ctx.program.function_table.contains_key(&name) {
                        format!("call to function '{name}' is not supported")
                    } else {
                        format!("undeclared identifier '{name}'")
                    };
                    self.ctx.error(loc, &message);
                    self.skim_balanced(&TokenKind::LParen, &TokenKind::RParen);
                } else {
                    let message = format!("undeclared identifier '{name}'");
                    self.ctx.error(loc, &message);
                }
                None
            }
            TokenKind::TypeName(name) => {
                self.advance();
                let ty = self.ctx.lookup_type(&name)?;
                if self.at(&TokenKind::LParen) {
                    self.lower_constructor_call(block, ty, loc)
                } else {
                    self.ctx.error(loc, "unexpected type name in expression");
                    None
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression(block)?;
                self.expect(&TokenKind::RParen, "')' closing a parenthesized expression");
                Some(inner)
            }
            _ => {
                self.ctx.error(loc, "expected an expression");
                None
            }
        }
    }

    // ---- Lowering helpers ----

    fn require_numeric(&mut self, node: Handle<Node>, loc: SourceLoc) -> Option<()> {
        let ty = self.ctx.program.nodes[node].ty;
        if self.ctx.program.types[ty].is_numeric() {
            Some(())
        } else {
            self.ctx.error(loc, "expression has a non-numeric type");
            None
        }
    }

    fn require_integer(&mut self, node: Handle<Node>, loc: SourceLoc) -> Option<()> {
        let ty = self.ctx.program.nodes[node].ty;
        let t = &self.ctx.program.types[ty];
        if t.is_numeric() && matches!(t.base, BaseType::Int | BaseType::Uint) {
            Some(())
        } else {
            self.ctx
                .error(loc, "bitwise operations require integer operands");
            None
        }
    }

    /// The seeded bool type with the same shape as the node's type.
    pub(crate) fn bool_shape_of(&self, node: Handle<Node>) -> Handle<Type> {
        let ty = &self.ctx.program.types[self.ctx.program.nodes[node].ty];
        self.ctx.builtin_numeric(BaseType::Bool, ty.dimx, ty.dimy)
    }

    /// Whether a value of `src` may be cast to `dst`: identical types,
    /// or numeric-to-numeric where the source is a single component
    /// (broadcast) or the destination is no wider than the source.
    fn compatible_cast(&self, src: Handle<Type>, dst: Handle<Type>) -> bool {
        if types_equal(&self.ctx.program.types, src, dst) {
            return true;
        }
        let types = &self.ctx.program.types;
        let (s, d) = (&types[src], &types[dst]);
        if !s.is_numeric() || !d.is_numeric() {
            return false;
        }
        if s.is_single_component() {
            return true;
        }
        d.component_count(types) <= s.component_count(types)
    }

    /// Converts `node` to `target`, inserting a cast node when the types
    /// differ and are compatible. Warns when components are dropped.
    pub(crate) fn implicit_convert(
        &mut self,
        block: &mut Block,
        node: Handle<Node>,
        target: Handle<Type>,
        loc: SourceLoc,
    ) -> Option<Handle<Node>> {
        let src = self.ctx.program.nodes[node].ty;
        if types_equal(&self.ctx.program.types, src, target) {
            return Some(node);
        }
        if !self.compatible_cast(src, target) {
            let from = format_type(&self.ctx.program.types, src);
            let to = format_type(&self.ctx.program.types, target);
            let message = format!("cannot implicitly convert from '{from}' to '{to}'");
            self.ctx.error(loc, &message);
            return None;
        }
        let types = &self.ctx.program.types;
        let src_count = types[src].component_count(types);
        let dst_count = types[target].component_count(types);
        if dst_count < src_count {
            self.ctx.warning(loc, "implicit truncation of vector type");
        }
        Some(self.append_node(
            block,
            NodeKind::Expr {
                op: ExprOp::Cast,
                operands: [Some(node), None, None],
            },
            target,
            loc,
        ))
    }

    fn lower_cast(
        &mut self,
        block: &mut Block,
        operand: Handle<Node>,
        target: Handle<Type>,
        loc: SourceLoc,
    ) -> Option<Handle<Node>> {
        let src = self.ctx.program.nodes[operand].ty;
        if !self.compatible_cast(src, target) {
            let from = format_type(&self.ctx.program.types, src);
            let to = format_type(&self.ctx.program.types, target);
            let message = format!("cannot convert from '{from}' to '{to}'");
            self.ctx.error(loc, &message);
            return None;
        }
        Some(self.append_node(
            block,
            NodeKind::Expr {
                op: ExprOp::Cast,
                operands: [Some(operand), None, None],
            },
            target,
            loc,
        ))
    }

    /// The promoted type two operands combine at: the higher-ranked base
    /// type, in the wider of the two shapes (scalars broadcast).
    fn common_type(
        &mut self,
        a: Handle<Node>,
        b: Handle<Node>,
        loc: SourceLoc,
    ) -> Option<Handle<Type>> {
        let ta = self.ctx.program.nodes[a].ty;
        let tb = self.ctx.program.nodes[b].ty;
        let types = &self.ctx.program.types;
        let (sa, sb) = (&types[ta], &types[tb]);
        if !sa.is_numeric() || !sb.is_numeric() {
            self.ctx.error(loc, "expression has a non-numeric type");
            return None;
        }

        let base = if base_rank(sa.base) >= base_rank(sb.base) {
            sa.base
        } else {
            sb.base
        };

        let dims = if sa.class == sb.class && sa.dimx == sb.dimx && sa.dimy == sb.dimy {
            Some((sa.dimx, sa.dimy))
        } else if sa.is_single_component() {
            Some((sb.dimx, sb.dimy))
        } else if sb.is_single_component() {
            Some((sa.dimx, sa.dimy))
        } else {
            vector_matrix_dims(sa, sb).or_else(|| vector_matrix_dims(sb, sa))
        };

        let Some((dimx, dimy)) = dims else {
            let from = format_type(types, ta);
            let to = format_type(types, tb);
            let message = format!("cannot combine '{from}' and '{to}' operands");
            self.ctx.error(loc, &message);
            return None;
        };
        Some(self.ctx.builtin_numeric(base, dimx, dimy))
    }

    fn lower_binary(
        &mut self,
        block: &mut Block,
        op: ExprOp,
        a: Handle<Node>,
        b: Handle<Node>,
        loc: SourceLoc,
    ) -> Option<Handle<Node>> {
        if matches!(
            op,
            ExprOp::Shl | ExprOp::Shr | ExprOp::BitAnd | ExprOp::BitOr | ExprOp::BitXor
        ) {
            self.require_integer(a, loc)?;
            self.require_integer(b, loc)?;
        }
        let common = self.common_type(a, b, loc)?;
        let a = self.implicit_convert(block, a, common, loc)?;
        let b = self.implicit_convert(block, b, common, loc)?;
        let result_ty = if op.is_comparison() {
            let t = &self.ctx.program.types[common];
            self.ctx.builtin_numeric(BaseType::Bool, t.dimx, t.dimy)
        } else {
            common
        };
        Some(self.append_node(
            block,
            NodeKind::Expr {
                op,
                operands: [Some(a), Some(b), None],
            },
            result_ty,
            loc,
        ))
    }

    /// Lowers an assignment. `lhs` must already be popped from the
    /// instruction list; its sub-expressions stay in the list.
    pub(crate) fn lower_assignment(
        &mut self,
        block: &mut Block,
        lhs: Handle<Node>,
        op: AssignOp,
        rhs: Handle<Node>,
        loc: SourceLoc,
    ) -> Option<Handle<Node>> {
        let lhs_ty = self.ctx.program.nodes[lhs].ty;
        if self.ctx.program.types[lhs_ty]
            .modifiers
            .contains(hlslc_ir::Modifiers::CONST)
        {
            self.ctx.error(loc, "l-value is const");
            return None;
        }
        if self.ctx.program.deref_variable(lhs).is_none() {
            self.ctx.error(loc, "invalid lvalue in assignment");
            return None;
        }

        let final_rhs = match op.binary_op() {
            None => self.implicit_convert(block, rhs, lhs_ty, loc)?,
            Some(bin) => {
                // Re-read the destination for the combining operation;
                // the store target itself stays out of the list.
                let read = self.ctx.program.nodes[lhs].clone();
                let read = {
                    let handle = self.ctx.program.nodes.add(read);
                    block.push(handle);
                    handle
                };
                let combined = self.lower_binary(block, bin, read, rhs, loc)?;
                self.implicit_convert(block, combined, lhs_ty, loc)?
            }
        };
        Some(self.append_node(
            block,
            NodeKind::Assign {
                lhs,
                op,
                rhs: final_rhs,
            },
            lhs_ty,
            loc,
        ))
    }

    /// Lowers `++e`/`e++` (and the `--` forms) as a compound assignment
    /// by one. Post forms yield a const-adorned result type so they
    /// cannot be assigned to.
    fn lower_increment(
        &mut self,
        block: &mut Block,
        operand: Handle<Node>,
        increment: bool,
        post: bool,
        loc: SourceLoc,
    ) -> Option<Handle<Node>> {
        debug_assert_eq!(block.last().copied(), Some(operand));
        block.pop();
        let int_ty = self.ctx.builtins.int_;
        let one = self.append_node(
            block,
            NodeKind::Constant(ScalarValue::Int(1)),
            int_ty,
            loc,
        );
        let op = if increment { AssignOp::Add } else { AssignOp::Sub };
        let assign = self.lower_assignment(block, operand, op, one, loc)?;
        if post {
            let ty = self.ctx.program.nodes[assign].ty;
            let mut const_ty = self.ctx.program.types[ty].clone();
            const_ty.modifiers |= hlslc_ir::Modifiers::CONST;
            let const_ty = self.ctx.program.types.add(const_ty);
            self.ctx.program.nodes[assign].ty = const_ty;
        }
        Some(assign)
    }

    fn lower_member_access(
        &mut self,
        block: &mut Block,
        base: Handle<Node>,
        name: &str,
        loc: SourceLoc,
    ) -> Option<Handle<Node>> {
        let base_ty = self.ctx.program.nodes[base].ty;
        let t = &self.ctx.program.types[base_ty];
        match t.class {
            TypeClass::Struct => {
                let Some(field) = t.fields.iter().position(|f| f.name == name) else {
                    let message = format!("invalid field '{name}'");
                    self.ctx.error(loc, &message);
                    return None;
                };
                let field_ty = t.fields[field].ty;
                Some(self.append_node(
                    block,
                    NodeKind::RecordDeref { base, field },
                    field_ty,
                    loc,
                ))
            }
            TypeClass::Scalar | TypeClass::Vector => {
                let (dimx, elem_base) = (t.dimx, t.base);
                let Some((mask, count)) = parse_vector_swizzle(name, dimx) else {
                    let message = format!("invalid swizzle '{name}'");
                    self.ctx.error(loc, &message);
                    return None;
                };
                let ty = self.ctx.builtin_numeric(elem_base, count, 1);
                Some(self.append_node(block, NodeKind::Swizzle { base, mask, count }, ty, loc))
            }
            TypeClass::Matrix => {
                let (dimx, dimy, elem_base) = (t.dimx, t.dimy, t.base);
                let Some((mask, count)) = parse_matrix_swizzle(name, dimx, dimy) else {
                    let message = format!("invalid swizzle '{name}'");
                    self.ctx.error(loc, &message);
                    return None;
                };
                let ty = self.ctx.builtin_numeric(elem_base, count, 1);
                Some(self.append_node(block, NodeKind::Swizzle { base, mask, count }, ty, loc))
            }
            _ => {
                let message = format!("invalid member access '.{name}'");
                self.ctx.error(loc, &message);
                None
            }
        }
    }

    fn lower_index(
        &mut self,
        block: &mut Block,
        base: Handle<Node>,
        index: Handle<Node>,
        loc: SourceLoc,
    ) -> Option<Handle<Node>> {
        let index_ty = &self.ctx.program.types[self.ctx.program.nodes[index].ty];
        if !(index_ty.is_numeric() && index_ty.dimx == 1 && index_ty.dimy == 1) {
            self.ctx.error(loc, "array index is not scalar");
            return None;
        }
        let base_ty = &self.ctx.program.types[self.ctx.program.nodes[base].ty];
        let result_ty = match base_ty.class {
            TypeClass::Array => base_ty.element.expect("array types carry an element"),
            // Indexing a matrix yields a row vector.
            TypeClass::Matrix => self.ctx.builtin_numeric(base_ty.base, base_ty.dimx, 1),
            TypeClass::Vector => self.ctx.scalar_of(base_ty.base),
            TypeClass::Scalar => {
                self.ctx.error(loc, "cannot index a scalar");
                return None;
            }
            _ => {
                self.ctx.error(loc, "this type cannot be indexed");
                return None;
            }
        };
        Some(self.append_node(block, NodeKind::ArrayDeref { base, index }, result_ty, loc))
    }

    /// Lowers `T(args...)`. Valid only for numeric `T` with an argument
    /// component total equal to `T`'s component count.
    pub(crate) fn lower_constructor_call(
        &mut self,
        block: &mut Block,
        ty: Handle<Type>,
        loc: SourceLoc,
    ) -> Option<Handle<Node>> {
        if !self.ctx.program.types[ty].is_numeric() {
            self.ctx
                .error(loc, "constructors may only be used with numeric types");
            self.skim_balanced(&TokenKind::LParen, &TokenKind::RParen);
            return None;
        }
        self.advance(); // '('
        let mut args = Vec::new();
        let mut components = 0u32;
        if !self.at(&TokenKind::RParen) {
            loop {
                let arg_loc = self.loc();
                let arg = self.parse_assignment_expr(block)?;
                if self.require_numeric(arg, arg_loc).is_some() {
                    components += self.component_count_of(arg);
                    args.push(arg);
                }
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen, "')' closing a constructor");

        let expected =
            self.ctx.program.types[ty].component_count(&self.ctx.program.types);
        if components != expected {
            let message = format!(
                "wrong number of components in constructor (expected {expected}, got {components})"
            );
            self.ctx.error(loc, &message);
            return None;
        }
        Some(self.append_node(block, NodeKind::Constructor { args }, ty, loc))
    }
}

/// A vector combined with a one-row or one-column matrix of the same
/// length keeps the vector shape.
fn vector_matrix_dims(vec: &Type, mat: &Type) -> Option<(u32, u32)> {
    if vec.class != TypeClass::Vector || mat.class != TypeClass::Matrix {
        return None;
    }
    if (mat.dimy == 1 && mat.dimx == vec.dimx) || (mat.dimx == 1 && mat.dimy == vec.dimx) {
        Some((vec.dimx, 1))
    } else {
        None
    }
}

/// Parses a vector swizzle suffix: 1–4 characters from `{x,y,z,w}` or
/// `{r,g,b,a}` (never mixed), each naming a component below `dimx`.
fn parse_vector_swizzle(text: &str, dimx: u32) -> Option<(u32, u32)> {
    if text.is_empty() || text.len() > 4 {
        return None;
    }
    const XYZW: [char; 4] = ['x', 'y', 'z', 'w'];
    const RGBA: [char; 4] = ['r', 'g', 'b', 'a'];
    let first = text.chars().next()?;
    let set = if XYZW.contains(&first) {
        XYZW
    } else if RGBA.contains(&first) {
        RGBA
    } else {
        return None;
    };

    let mut components = Vec::with_capacity(text.len());
    for c in text.chars() {
        let index = set.iter().position(|&s| s == c)? as u32;
        if index >= dimx {
            return None;
        }
        components.push(index);
    }
    Some((pack_vector_swizzle(&components), components.len() as u32))
}

/// Parses a matrix swizzle suffix: repeated `_mRC` (zero-based) or `_RC`
/// (one-based) groups, never mixed, with rows below `dimy` and columns
/// below `dimx`.
fn parse_matrix_swizzle(text: &str, dimx: u32, dimy: u32) -> Option<(u32, u32)> {
    let bytes = text.as_bytes();
    if bytes.first() != Some(&b'_') {
        return None;
    }
    let zero_based = bytes.get(1) == Some(&b'm');

    let mut pairs = Vec::new();
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] != b'_' {
            return None;
        }
        i += 1;
        if zero_based {
            if bytes.get(i) != Some(&b'm') {
                return None;
            }
            i += 1;
        } else if bytes.get(i) == Some(&b'm') {
            return None;
        }
        let row = *bytes.get(i)? as char;
        let col = *bytes.get(i + 1)? as char;
        i += 2;
        let (mut row, mut col) = (row.to_digit(10)?, col.to_digit(10)?);
        if !zero_based {
            if row == 0 || col == 0 {
                return None;
            }
            row -= 1;
            col -= 1;
        }
        if row >= dimy || col >= dimx {
            return None;
        }
        pairs.push((row, col));
        if pairs.len() > 4 {
            return None;
        }
    }
    if pairs.is_empty() {
        return None;
    }
    Some((pack_matrix_swizzle(&pairs), pairs.len() as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hlslc_ir::vector_swizzle_component;

    #[test]
    fn vector_swizzle_xyzw() {
        let (mask, count) = parse_vector_swizzle("xyz", 4).unwrap();
        assert_eq!(count, 3);
        assert_eq!(vector_swizzle_component(mask, 0), 0);
        assert_eq!(vector_swizzle_component(mask, 2), 2);
    }

    #[test]
    fn vector_swizzle_rgba() {
        let (mask, count) = parse_vector_swizzle("bgra", 4).unwrap();
        assert_eq!(count, 4);
        assert_eq!(vector_swizzle_component(mask, 0), 2);
        assert_eq!(vector_swizzle_component(mask, 1), 1);
        assert_eq!(vector_swizzle_component(mask, 2), 0);
        assert_eq!(vector_swizzle_component(mask, 3), 3);
    }

    #[test]
    fn vector_swizzle_repeats_components() {
        let (mask, count) = parse_vector_swizzle("xxyy", 4).unwrap();
        assert_eq!(count, 4);
        assert_eq!(vector_swizzle_component(mask, 1), 0);
        assert_eq!(vector_swizzle_component(mask, 2), 1);
    }

    #[test]
    fn vector_swizzle_rejects_mixed_sets() {
        assert!(parse_vector_swizzle("xg", 4).is_none());
        assert!(parse_vector_swizzle("rz", 4).is_none());
    }

    #[test]
    fn vector_swizzle_respects_dimension() {
        assert!(parse_vector_swizzle("z", 2).is_none());
        assert!(parse_vector_swizzle("xy", 2).is_some());
        // 'a' selects component 3, out of range for a float3.
        assert!(parse_vector_swizzle("a", 3).is_none());
    }

    #[test]
    fn vector_swizzle_rejects_bad_lengths() {
        assert!(parse_vector_swizzle("", 4).is_none());
        assert!(parse_vector_swizzle("xyzxy", 4).is_none());
        assert!(parse_vector_swizzle("abcd", 4).is_none());
    }

    #[test]
    fn matrix_swizzle_zero_based() {
        let (mask, count) = parse_matrix_swizzle("_m00_m11", 4, 4).unwrap();
        assert_eq!(count, 2);
        assert_eq!(hlslc_ir::matrix_swizzle_component(mask, 0), (0, 0));
        assert_eq!(hlslc_ir::matrix_swizzle_component(mask, 1), (1, 1));
    }

    #[test]
    fn matrix_swizzle_one_based() {
        let (mask, count) = parse_matrix_swizzle("_11_22", 4, 4).unwrap();
        assert_eq!(count, 2);
        assert_eq!(hlslc_ir::matrix_swizzle_component(mask, 0), (0, 0));
        assert_eq!(hlslc_ir::matrix_swizzle_component(mask, 1), (1, 1));
    }

    #[test]
    fn matrix_swizzle_rejects_mixed_forms() {
        assert!(parse_matrix_swizzle("_m00_11", 4, 4).is_none());
        assert!(parse_matrix_swizzle("_11_m00", 4, 4).is_none());
    }

    #[test]
    fn matrix_swizzle_checks_bounds() {
        // Row index must stay below dimy, column below dimx.
        assert!(parse_matrix_swizzle("_m30", 4, 3).is_none());
        assert!(parse_matrix_swizzle("_m23", 4, 3).is_some());
        assert!(parse_matrix_swizzle("_00", 4, 4).is_none());
        assert!(parse_matrix_swizzle("_44_44", 4, 4).is_some());
    }

    #[test]
    fn matrix_swizzle_rejects_garbage() {
        assert!(parse_matrix_swizzle("xyz", 4, 4).is_none());
        assert!(parse_matrix_swizzle("_", 4, 4).is_none());
        assert!(parse_matrix_swizzle("_m0", 4, 4).is_none());
        assert!(parse_matrix_swizzle("_m00_m11_m22_m33_m00", 4, 4).is_none());
    }
}

//! Display implementations and text dump for debugging.

use std::fmt;
use std::fmt::Write;

use crate::arena::{Arena, Handle};
use crate::func::Function;
use crate::node::{
    matrix_swizzle_component, vector_swizzle_component, AssignOp, ExprOp, JumpKind, Node, NodeKind,
    ScalarValue,
};
use crate::types::{BaseType, SamplerDim, Type, TypeClass};
use crate::var::RegisterKind;
use crate::Program;

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Float => "float",
            Self::Half => "half",
            Self::Double => "double",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Bool => "bool",
            Self::Void => "void",
            Self::Sampler => "sampler",
            Self::Texture => "texture",
            Self::String => "string",
            Self::PixelShader => "pixelshader",
            Self::VertexShader => "vertexshader",
        })
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}u"),
            Self::Half(v) => write!(f, "{v:?}h"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Double(v) => write!(f, "{v:?}L"),
        }
    }
}

impl fmt::Display for ExprOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Neg => "-",
            Self::LogicNot => "!",
            Self::BitNot => "~",
            Self::Cast => "cast",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::LogicAnd => "&&",
            Self::LogicOr => "||",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::Select => "?:",
        })
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Assign => "=",
            Self::Add => "+=",
            Self::Sub => "-=",
            Self::Mul => "*=",
            Self::Div => "/=",
            Self::Mod => "%=",
            Self::Shl => "<<=",
            Self::Shr => ">>=",
            Self::BitAnd => "&=",
            Self::BitOr => "|=",
            Self::BitXor => "^=",
        })
    }
}

impl fmt::Display for RegisterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Const => "c",
            Self::ConstInt => "i",
            Self::ConstBool => "b",
            Self::Sampler => "s",
        })
    }
}

/// Renders a type the way it would be spelled in source.
pub fn format_type(types: &Arena<Type>, handle: Handle<Type>) -> String {
    let ty = &types[handle];
    match ty.class {
        TypeClass::Scalar => ty.base.to_string(),
        TypeClass::Vector => format!("{}{}", ty.base, ty.dimx),
        TypeClass::Matrix => format!("{}{}x{}", ty.base, ty.dimx, ty.dimy),
        TypeClass::Array => match ty.element {
            Some(elem) => format!("{}[{}]", format_type(types, elem), ty.array_len),
            None => "<array>".to_string(),
        },
        TypeClass::Struct => match &ty.name {
            Some(name) => format!("struct {name}"),
            None => "struct <anonymous>".to_string(),
        },
        TypeClass::Object => match (ty.base, ty.sampler_dim) {
            (BaseType::Sampler, SamplerDim::Dim1D) => "sampler1D".to_string(),
            (BaseType::Sampler, SamplerDim::Dim2D) => "sampler2D".to_string(),
            (BaseType::Sampler, SamplerDim::Dim3D) => "sampler3D".to_string(),
            (BaseType::Sampler, SamplerDim::Cube) => "samplerCUBE".to_string(),
            (base, _) => base.to_string(),
        },
    }
}

fn node_ref(nodes: &Arena<Node>, handle: Handle<Node>) -> String {
    let index = nodes[handle].index;
    if index > 0 {
        format!("@{index}")
    } else {
        format!("@[{}]", handle.index())
    }
}

fn vector_swizzle_text(mask: u32, count: u32) -> String {
    const NAMES: [char; 4] = ['x', 'y', 'z', 'w'];
    (0..count)
        .map(|i| NAMES[vector_swizzle_component(mask, i) as usize])
        .collect()
}

fn matrix_swizzle_text(mask: u32, count: u32) -> String {
    let mut out = String::new();
    for i in 0..count {
        let (row, col) = matrix_swizzle_component(mask, i);
        let _ = write!(out, "_m{row}{col}");
    }
    out
}

fn lvalue_text(program: &Program, handle: Handle<Node>) -> String {
    let node = &program.nodes[handle];
    match node.kind {
        NodeKind::VarDeref(var) => program.variables[var].name.clone(),
        NodeKind::RecordDeref { base, field } => {
            let base_ty = &program.types[program.nodes[base].ty];
            let name = base_ty
                .fields
                .get(field)
                .map_or("<bad field>", |f| f.name.as_str());
            format!("{}.{}", lvalue_text(program, base), name)
        }
        NodeKind::ArrayDeref { base, index } => format!(
            "{}[{}]",
            lvalue_text(program, base),
            node_ref(&program.nodes, index)
        ),
        NodeKind::Swizzle { base, mask, count } => {
            let suffix = match program.types[program.nodes[base].ty].class {
                TypeClass::Matrix => matrix_swizzle_text(mask, count),
                _ => vector_swizzle_text(mask, count),
            };
            format!("{}.{}", lvalue_text(program, base), suffix)
        }
        _ => "<not an lvalue>".to_string(),
    }
}

fn write_node(out: &mut String, program: &Program, handle: Handle<Node>, indent: usize) {
    let node = &program.nodes[handle];
    let pad = " ".repeat(indent);
    let label = if node.index > 0 {
        format!("{:>4}", node.index)
    } else {
        format!("[{:>2}]", handle.index())
    };
    let ty = format_type(&program.types, node.ty);
    let _ = write!(out, "{pad}{label}: {ty} | ");

    match &node.kind {
        NodeKind::Constant(value) => {
            let _ = writeln!(out, "const {value}");
        }
        NodeKind::VarDeref(var) => {
            let _ = writeln!(out, "deref {}", program.variables[*var].name);
        }
        NodeKind::RecordDeref { base, field } => {
            let base_ty = &program.types[program.nodes[*base].ty];
            let name = base_ty
                .fields
                .get(*field)
                .map_or("<bad field>", |f| f.name.as_str());
            let _ = writeln!(out, "{}.{}", node_ref(&program.nodes, *base), name);
        }
        NodeKind::ArrayDeref { base, index } => {
            let _ = writeln!(
                out,
                "{}[{}]",
                node_ref(&program.nodes, *base),
                node_ref(&program.nodes, *index)
            );
        }
        NodeKind::Swizzle { base, mask, count } => {
            let suffix = match program.types[program.nodes[*base].ty].class {
                TypeClass::Matrix => matrix_swizzle_text(*mask, *count),
                _ => vector_swizzle_text(*mask, *count),
            };
            let _ = writeln!(out, "{}.{}", node_ref(&program.nodes, *base), suffix);
        }
        NodeKind::Constructor { args } => {
            let rendered: Vec<_> = args.iter().map(|&a| node_ref(&program.nodes, a)).collect();
            let _ = writeln!(out, "{ty}({})", rendered.join(", "));
        }
        NodeKind::Expr { op, operands } => match (op, operands) {
            (ExprOp::Cast, [Some(a), _, _]) => {
                let _ = writeln!(out, "({ty}) {}", node_ref(&program.nodes, *a));
            }
            (ExprOp::Select, [Some(c), Some(a), Some(b)]) => {
                let _ = writeln!(
                    out,
                    "{} ? {} : {}",
                    node_ref(&program.nodes, *c),
                    node_ref(&program.nodes, *a),
                    node_ref(&program.nodes, *b)
                );
            }
            (op, [Some(a), None, _]) => {
                let _ = writeln!(out, "{op}{}", node_ref(&program.nodes, *a));
            }
            (op, [Some(a), Some(b), _]) => {
                let _ = writeln!(
                    out,
                    "{} {op} {}",
                    node_ref(&program.nodes, *a),
                    node_ref(&program.nodes, *b)
                );
            }
            _ => {
                let _ = writeln!(out, "{op} <missing operands>");
            }
        },
        NodeKind::Assign { lhs, op, rhs } => {
            let _ = writeln!(
                out,
                "{} {op} {}",
                lvalue_text(program, *lhs),
                node_ref(&program.nodes, *rhs)
            );
        }
        NodeKind::If {
            condition,
            then_block,
            else_block,
        } => {
            let _ = writeln!(out, "if {}", node_ref(&program.nodes, *condition));
            write_block(out, program, then_block, indent + 2);
            if let Some(else_block) = else_block {
                let _ = writeln!(out, "{pad}      else");
                write_block(out, program, else_block, indent + 2);
            }
        }
        NodeKind::Loop { body, next_index } => {
            let _ = writeln!(out, "loop (exit -> {next_index})");
            write_block(out, program, body, indent + 2);
        }
        NodeKind::Jump(kind) => match kind {
            JumpKind::Break => {
                let _ = writeln!(out, "break");
            }
            JumpKind::Continue => {
                let _ = writeln!(out, "continue");
            }
            JumpKind::Return(None) => {
                let _ = writeln!(out, "return");
            }
            JumpKind::Return(Some(value)) => {
                let _ = writeln!(out, "return {}", node_ref(&program.nodes, *value));
            }
        },
    }
}

fn write_block(out: &mut String, program: &Program, block: &[Handle<Node>], indent: usize) {
    for &handle in block {
        write_node(out, program, handle, indent);
    }
}

/// Renders one function: signature, parameters, and body.
pub fn dump_function(program: &Program, function: &Function) -> String {
    let mut out = String::new();
    let params: Vec<_> = function
        .parameters
        .iter()
        .map(|&p| {
            let var = &program.variables[p];
            let mut text = String::new();
            if var.is_input() {
                text.push_str("in ");
            }
            if var.is_output() {
                text.push_str("out ");
            }
            let _ = write!(text, "{} {}", format_type(&program.types, var.ty), var.name);
            if let Some(semantic) = &var.semantic {
                let _ = write!(text, " : {semantic}");
            }
            text
        })
        .collect();

    let _ = write!(
        out,
        "function {} {}({})",
        format_type(&program.types, function.return_ty),
        function.name,
        params.join(", ")
    );
    if let Some(semantic) = &function.semantic {
        let _ = write!(out, " : {semantic}");
    }
    out.push('\n');

    match &function.body {
        Some(body) => write_block(&mut out, program, body, 2),
        None => out.push_str("  <no body>\n"),
    }
    out
}

/// Renders the whole program: global variables and every function.
pub fn dump_program(program: &Program) -> String {
    let mut out = String::new();

    out.push_str("Globals:\n");
    for &var in &program.scopes[program.globals].vars {
        let v = &program.variables[var];
        let _ = write!(out, "  {} {}", format_type(&program.types, v.ty), v.name);
        if let Some(semantic) = &v.semantic {
            let _ = write!(out, " : {semantic}");
        }
        if let Some(reservation) = &v.reservation {
            let _ = write!(out, " : register({}{})", reservation.kind, reservation.index);
        }
        let _ = writeln!(out, " [{}, {}]", v.first_write, v.last_read);
    }

    out.push_str("Functions:\n");
    for (_, function) in program.functions.iter() {
        out.push_str(&dump_function(program, function));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loc::SourceLoc;
    use crate::node::pack_vector_swizzle;
    use crate::types::Modifiers;
    use crate::var::Variable;
    use crate::{ShaderType, TargetProfile};

    fn test_program() -> Program {
        Program::new(TargetProfile {
            shader_type: ShaderType::Pixel,
            major: 2,
            minor: 0,
        })
    }

    #[test]
    fn format_basic_types() {
        let mut types = Arena::new();
        let f = types.add(Type::scalar(BaseType::Float));
        let f3 = types.add(Type::vector(BaseType::Float, 3));
        let f4x4 = types.add(Type::matrix(BaseType::Float, 4, 4));
        let arr = types.add(Type::array(f3, 8));
        assert_eq!(format_type(&types, f), "float");
        assert_eq!(format_type(&types, f3), "float3");
        assert_eq!(format_type(&types, f4x4), "float4x4");
        assert_eq!(format_type(&types, arr), "float3[8]");
    }

    #[test]
    fn format_sampler_types() {
        let mut types = Arena::new();
        let s2d = types.add(Type::object(BaseType::Sampler, SamplerDim::Dim2D));
        let cube = types.add(Type::object(BaseType::Sampler, SamplerDim::Cube));
        assert_eq!(format_type(&types, s2d), "sampler2D");
        assert_eq!(format_type(&types, cube), "samplerCUBE");
    }

    #[test]
    fn dump_renders_swizzle_and_return() {
        let mut program = test_program();
        let file = program.files.intern("test.fx");
        let loc = SourceLoc::new(file, 1, 1);
        let float4 = program.types.add(Type::vector(BaseType::Float, 4));

        let mut var = Variable::new("p", float4, loc);
        var.modifiers |= Modifiers::IN;
        var.semantic = Some("TEXCOORD0".to_string());
        let var = program.variables.add(var);

        let deref = program
            .nodes
            .add(Node::new(NodeKind::VarDeref(var), float4, loc));
        let swizzle = program.nodes.add(Node::new(
            NodeKind::Swizzle {
                base: deref,
                mask: pack_vector_swizzle(&[3, 2, 1, 0]),
                count: 4,
            },
            float4,
            loc,
        ));
        let ret = program.nodes.add(Node::new(
            NodeKind::Jump(JumpKind::Return(Some(swizzle))),
            float4,
            loc,
        ));

        let mut function = Function::new("main", float4, loc);
        function.parameters.push(var);
        function.semantic = Some("COLOR".to_string());
        function.body = Some(vec![deref, swizzle, ret]);

        let text = dump_function(&program, &function);
        assert!(text.contains("function float4 main(in float4 p : TEXCOORD0) : COLOR"));
        assert!(text.contains("deref p"));
        assert!(text.contains(".wzyx"));
        assert!(text.contains("return"));
    }
}

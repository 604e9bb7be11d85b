//! Tokens of the HLSL surface syntax.

use hlslc_ir::TokenSpan;

/// A reserved word. Many of these are accepted lexically but rejected by
/// the grammar (technique/pass, buffer-state objects); the numeric type
/// names (`float4` etc.) are deliberately *not* keywords; they are
/// predefined type names resolved through scope lookup.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum Keyword {
    BlendState,
    Break,
    Buffer,
    CBuffer,
    Compile,
    Const,
    Continue,
    DepthStencilState,
    DepthStencilView,
    Discard,
    Do,
    Else,
    Extern,
    For,
    GeometryShader,
    GroupShared,
    If,
    In,
    Inline,
    InOut,
    Matrix,
    Namespace,
    NoInterpolation,
    NoPerspective,
    Out,
    Pass,
    PixelShader,
    Precise,
    RasterizerState,
    Register,
    RenderTargetView,
    Return,
    RowMajor,
    ColumnMajor,
    Sampler,
    Sampler1D,
    Sampler2D,
    Sampler3D,
    SamplerCube,
    SamplerComparisonState,
    SamplerState,
    Shared,
    StateBlock,
    StateBlockState,
    Static,
    String,
    Struct,
    Switch,
    Technique,
    Technique10,
    Texture,
    Texture1D,
    Texture2D,
    Texture3D,
    TextureCube,
    Typedef,
    Uniform,
    Vector,
    VertexShader,
    Void,
    Volatile,
    While,
}

impl Keyword {
    /// Looks up a reserved word; `true`/`false` are handled separately as
    /// boolean literals.
    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "BlendState" => Self::BlendState,
            "break" => Self::Break,
            "Buffer" => Self::Buffer,
            "cbuffer" => Self::CBuffer,
            "compile" => Self::Compile,
            "const" => Self::Const,
            "continue" => Self::Continue,
            "DepthStencilState" => Self::DepthStencilState,
            "DepthStencilView" => Self::DepthStencilView,
            "discard" => Self::Discard,
            "do" => Self::Do,
            "else" => Self::Else,
            "extern" => Self::Extern,
            "for" => Self::For,
            "GeometryShader" => Self::GeometryShader,
            "groupshared" => Self::GroupShared,
            "if" => Self::If,
            "in" => Self::In,
            "inline" => Self::Inline,
            "inout" => Self::InOut,
            "matrix" => Self::Matrix,
            "namespace" => Self::Namespace,
            "nointerpolation" => Self::NoInterpolation,
            "noperspective" => Self::NoPerspective,
            "out" => Self::Out,
            "pass" => Self::Pass,
            "PixelShader" => Self::PixelShader,
            "precise" => Self::Precise,
            "RasterizerState" => Self::RasterizerState,
            "register" => Self::Register,
            "RenderTargetView" => Self::RenderTargetView,
            "return" => Self::Return,
            "row_major" => Self::RowMajor,
            "column_major" => Self::ColumnMajor,
            "sampler" => Self::Sampler,
            "sampler1D" => Self::Sampler1D,
            "sampler2D" => Self::Sampler2D,
            "sampler3D" => Self::Sampler3D,
            "samplerCUBE" => Self::SamplerCube,
            "SamplerComparisonState" => Self::SamplerComparisonState,
            "sampler_state" => Self::SamplerState,
            "shared" => Self::Shared,
            "stateblock" => Self::StateBlock,
            "stateblock_state" => Self::StateBlockState,
            "static" => Self::Static,
            "string" => Self::String,
            "struct" => Self::Struct,
            "switch" => Self::Switch,
            "technique" => Self::Technique,
            "technique10" => Self::Technique10,
            "texture" => Self::Texture,
            "texture1D" => Self::Texture1D,
            "texture2D" => Self::Texture2D,
            "texture3D" => Self::Texture3D,
            "textureCUBE" => Self::TextureCube,
            "typedef" => Self::Typedef,
            "uniform" => Self::Uniform,
            "vector" => Self::Vector,
            "VertexShader" => Self::VertexShader,
            "void" => Self::Void,
            "volatile" => Self::Volatile,
            "while" => Self::While,
            _ => return None,
        })
    }
}

/// A lexed token.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    /// An identifier naming a type in the current scope stack.
    TypeName(String),
    /// An identifier naming a variable in the current scope stack.
    VarName(String),
    /// An identifier naming neither.
    NewIdent(String),

    IntConst(i32),
    UintConst(u32),
    HalfConst(f32),
    FloatConst(f32),
    BoolConst(bool),
    StringConst(String),

    Keyword(Keyword),

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    Dot,
    Question,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Inc,
    Dec,

    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    Ne,

    Not,
    Tilde,
    AmpAmp,
    PipePipe,
    Amp,
    Pipe,
    Caret,
    Shl,
    Shr,

    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    ShlAssign,
    ShrAssign,
    AndAssign,
    OrAssign,
    XorAssign,

    /// A character the lexer could not map to any token.
    Unknown(char),
    Eof,
}

impl TokenKind {
    /// The identifier text, for any of the three identifier classes.
    pub fn ident_text(&self) -> Option<&str> {
        match self {
            Self::TypeName(s) | Self::VarName(s) | Self::NewIdent(s) => Some(s),
            _ => None,
        }
    }

    /// Returns `true` for tokens that may begin a declaration specifier.
    pub fn starts_type(&self) -> bool {
        matches!(
            self,
            Self::TypeName(_)
                | Self::Keyword(
                    Keyword::Void
                        | Keyword::Sampler
                        | Keyword::Sampler1D
                        | Keyword::Sampler2D
                        | Keyword::Sampler3D
                        | Keyword::SamplerCube
                        | Keyword::Texture
                        | Keyword::String
                        | Keyword::Struct
                )
        )
    }

    /// Returns `true` for tokens that may begin a declaration modifier.
    pub fn starts_modifier(&self) -> bool {
        matches!(
            self,
            Self::Keyword(
                Keyword::Extern
                    | Keyword::NoInterpolation
                    | Keyword::Precise
                    | Keyword::Shared
                    | Keyword::GroupShared
                    | Keyword::Static
                    | Keyword::Uniform
                    | Keyword::Volatile
                    | Keyword::Const
                    | Keyword::RowMajor
                    | Keyword::ColumnMajor
                    | Keyword::In
                    | Keyword::Out
                    | Keyword::InOut
            )
        )
    }
}

/// A token with its source extent.
#[derive(Clone, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub span: TokenSpan,
}

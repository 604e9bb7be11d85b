//! HLSL type descriptors and the modifier algebra.

use crate::arena::{Arena, Handle};

/// Bitflags for storage and type modifiers.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct Modifiers(u32);

impl Modifiers {
    /// No modifiers set.
    pub const EMPTY: Self = Self(0);
    pub const EXTERN: Self = Self(1 << 0);
    pub const NOINTERPOLATION: Self = Self(1 << 1);
    pub const PRECISE: Self = Self(1 << 2);
    pub const SHARED: Self = Self(1 << 3);
    pub const GROUPSHARED: Self = Self(1 << 4);
    pub const STATIC: Self = Self(1 << 5);
    pub const UNIFORM: Self = Self(1 << 6);
    pub const VOLATILE: Self = Self(1 << 7);
    pub const CONST: Self = Self(1 << 8);
    pub const ROW_MAJOR: Self = Self(1 << 9);
    pub const COLUMN_MAJOR: Self = Self(1 << 10);
    pub const IN: Self = Self(1 << 11);
    pub const OUT: Self = Self(1 << 12);

    /// Matrix majority bits. Mutually exclusive on any one type.
    pub const MAJORITY: Self = Self(Self::ROW_MAJOR.0 | Self::COLUMN_MAJOR.0);

    /// Modifiers that may appear on a typedef.
    pub const TYPE_MODIFIERS: Self = Self(
        Self::PRECISE.0
            | Self::VOLATILE.0
            | Self::CONST.0
            | Self::ROW_MAJOR.0
            | Self::COLUMN_MAJOR.0,
    );

    /// Storage classes a local variable may not carry.
    pub const ILLEGAL_ON_LOCALS: Self =
        Self(Self::EXTERN.0 | Self::SHARED.0 | Self::GROUPSHARED.0 | Self::UNIFORM.0);

    /// The modifier subset relevant to type identity.
    pub const IDENTITY: Self = Self::MAJORITY;

    /// Returns `true` if `self` contains all flags in `other`.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if `self` and `other` share any flag.
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns `true` if no flags are set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns the flags present in `self` but not in `other`.
    pub fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Restricts `self` to the flags in `mask`.
    pub fn masked(self, mask: Self) -> Self {
        Self(self.0 & mask.0)
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for Modifiers {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// The shape class of a type.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum TypeClass {
    Scalar,
    Vector,
    Matrix,
    Array,
    Struct,
    Object,
}

/// The element base of a type.
///
/// Only the numeric bases are meaningful for scalar/vector/matrix
/// classes; the remainder identify specific object kinds.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum BaseType {
    Float,
    Half,
    Double,
    Int,
    Uint,
    Bool,
    Void,
    Sampler,
    Texture,
    String,
    PixelShader,
    VertexShader,
}

impl BaseType {
    /// Returns `true` for the bases usable in scalar/vector/matrix types.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Float | Self::Half | Self::Double | Self::Int | Self::Uint | Self::Bool
        )
    }
}

/// The dimensionality of a sampler object.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum SamplerDim {
    Generic,
    Dim1D,
    Dim2D,
    Dim3D,
    Cube,
}

/// A field of a struct type.
#[derive(Clone, Debug)]
pub struct StructField {
    pub name: String,
    pub ty: Handle<Type>,
    pub modifiers: Modifiers,
    pub semantic: Option<String>,
    /// Running register offset of this field within the struct.
    pub reg_offset: u32,
}

/// An HLSL type descriptor.
///
/// Dimensions follow HLSL conventions: a scalar is `(1, 1)`, a vector of
/// `n` components is `(n, 1)`, and a matrix is `(columns, rows)`.
#[derive(Clone, Debug)]
pub struct Type {
    /// Name under which the type is registered in a scope, if any.
    pub name: Option<String>,
    pub class: TypeClass,
    pub base: BaseType,
    pub dimx: u32,
    pub dimy: u32,
    pub modifiers: Modifiers,
    /// Element type when `class` is `Array`.
    pub element: Option<Handle<Type>>,
    /// Element count when `class` is `Array`.
    pub array_len: u32,
    /// Fields when `class` is `Struct`.
    pub fields: Vec<StructField>,
    pub sampler_dim: SamplerDim,
}

impl Type {
    pub fn scalar(base: BaseType) -> Self {
        Self {
            name: None,
            class: TypeClass::Scalar,
            base,
            dimx: 1,
            dimy: 1,
            modifiers: Modifiers::EMPTY,
            element: None,
            array_len: 0,
            fields: Vec::new(),
            sampler_dim: SamplerDim::Generic,
        }
    }

    pub fn vector(base: BaseType, dimx: u32) -> Self {
        Self {
            class: TypeClass::Vector,
            dimx,
            ..Self::scalar(base)
        }
    }

    pub fn matrix(base: BaseType, dimx: u32, dimy: u32) -> Self {
        Self {
            class: TypeClass::Matrix,
            dimx,
            dimy,
            ..Self::scalar(base)
        }
    }

    pub fn array(element: Handle<Type>, len: u32) -> Self {
        Self {
            class: TypeClass::Array,
            element: Some(element),
            array_len: len,
            dimx: 0,
            dimy: 0,
            ..Self::scalar(BaseType::Void)
        }
    }

    pub fn structure(name: Option<String>, fields: Vec<StructField>) -> Self {
        Self {
            name,
            class: TypeClass::Struct,
            fields,
            dimx: 0,
            dimy: 0,
            ..Self::scalar(BaseType::Void)
        }
    }

    pub fn object(base: BaseType, sampler_dim: SamplerDim) -> Self {
        Self {
            class: TypeClass::Object,
            sampler_dim,
            dimx: 0,
            dimy: 0,
            ..Self::scalar(base)
        }
    }

    pub fn void() -> Self {
        Self::object(BaseType::Void, SamplerDim::Generic)
    }

    /// Returns `true` for scalar, vector, and matrix classes.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self.class,
            TypeClass::Scalar | TypeClass::Vector | TypeClass::Matrix
        ) && self.base.is_numeric()
    }

    /// Returns `true` when the type has exactly one component.
    pub fn is_single_component(&self) -> bool {
        self.is_numeric() && self.dimx == 1 && self.dimy == 1
    }

    pub fn is_void(&self) -> bool {
        self.class == TypeClass::Object && self.base == BaseType::Void
    }

    pub fn is_row_major(&self) -> bool {
        self.modifiers.contains(Modifiers::ROW_MAJOR)
    }

    /// Total scalar component count.
    pub fn component_count(&self, types: &Arena<Type>) -> u32 {
        match self.class {
            TypeClass::Scalar | TypeClass::Vector | TypeClass::Matrix => self.dimx * self.dimy,
            TypeClass::Array => match self.element {
                Some(elem) => self.array_len * types[elem].component_count(types),
                None => 0,
            },
            TypeClass::Struct => self
                .fields
                .iter()
                .map(|f| types[f.ty].component_count(types))
                .sum(),
            TypeClass::Object => 0,
        }
    }

    /// Register footprint: the number of registers a value of this type
    /// occupies. For a matrix this is the row count if row-major, the
    /// column count otherwise.
    pub fn reg_size(&self, types: &Arena<Type>) -> u32 {
        match self.class {
            TypeClass::Scalar | TypeClass::Vector => 1,
            TypeClass::Matrix => {
                if self.is_row_major() {
                    self.dimy
                } else {
                    self.dimx
                }
            }
            TypeClass::Array => match self.element {
                Some(elem) => self.array_len * types[elem].reg_size(types),
                None => 0,
            },
            TypeClass::Struct => self.fields.iter().map(|f| types[f.ty].reg_size(types)).sum(),
            TypeClass::Object => 1,
        }
    }
}

/// Structural type equality: class, base, dimensions, and the
/// identity-relevant modifier subset must match; arrays and structs
/// compare recursively.
pub fn types_equal(types: &Arena<Type>, a: Handle<Type>, b: Handle<Type>) -> bool {
    if a == b {
        return true;
    }
    let (ta, tb) = (&types[a], &types[b]);
    if ta.class != tb.class || ta.base != tb.base {
        return false;
    }
    if ta.modifiers.masked(Modifiers::IDENTITY) != tb.modifiers.masked(Modifiers::IDENTITY) {
        return false;
    }
    match ta.class {
        TypeClass::Scalar | TypeClass::Vector | TypeClass::Matrix => {
            ta.dimx == tb.dimx && ta.dimy == tb.dimy
        }
        TypeClass::Array => {
            ta.array_len == tb.array_len
                && match (ta.element, tb.element) {
                    (Some(ea), Some(eb)) => types_equal(types, ea, eb),
                    _ => false,
                }
        }
        TypeClass::Struct => {
            ta.fields.len() == tb.fields.len()
                && ta
                    .fields
                    .iter()
                    .zip(&tb.fields)
                    .all(|(fa, fb)| fa.name == fb.name && types_equal(types, fa.ty, fb.ty))
        }
        TypeClass::Object => ta.sampler_dim == tb.sampler_dim,
    }
}

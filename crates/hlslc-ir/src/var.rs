//! Variables and register reservations.

use crate::arena::Handle;
use crate::loc::SourceLoc;
use crate::types::{Modifiers, Type};

/// The register file a reservation binds into.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum RegisterKind {
    /// `c#`: float constant register.
    Const,
    /// `i#`: integer constant register.
    ConstInt,
    /// `b#`: boolean constant register.
    ConstBool,
    /// `s#`: sampler register.
    Sampler,
}

/// A `: register(<tag><num>)` reservation.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct RegisterReservation {
    pub kind: RegisterKind,
    pub index: u32,
}

/// A named binding, owned by its declaring scope.
#[derive(Clone, Debug)]
pub struct Variable {
    pub name: String,
    pub ty: Handle<Type>,
    pub loc: SourceLoc,
    pub modifiers: Modifiers,
    pub semantic: Option<String>,
    pub reservation: Option<RegisterReservation>,
    /// Index of the first instruction writing this variable; 0 = never
    /// written, 1 = written at function entry (globals, input parameters).
    pub first_write: u32,
    /// Index of the last instruction reading this variable; `u32::MAX`
    /// for output parameters (read at function exit).
    pub last_read: u32,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: Handle<Type>, loc: SourceLoc) -> Self {
        Self {
            name: name.into(),
            ty,
            loc,
            modifiers: Modifiers::EMPTY,
            semantic: None,
            reservation: None,
            first_write: 0,
            last_read: 0,
        }
    }

    /// Returns `true` for function parameters marked as inputs.
    pub fn is_input(&self) -> bool {
        self.modifiers.contains(Modifiers::IN)
    }

    /// Returns `true` for function parameters marked as outputs.
    pub fn is_output(&self) -> bool {
        self.modifiers.contains(Modifiers::OUT)
    }
}

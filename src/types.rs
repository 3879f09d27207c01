//! Shape of the external type model.
//!
//! The metadata/type extractor (out of scope, spec.md §1) builds the real
//! thing from compiled binary metadata; this module only fixes the shape
//! that instruction operands and method signatures may reference so the
//! analytical core has something concrete to name in its public API. The
//! core never inspects these values — they pass through untouched.

use std::collections::HashMap;

/// A reference to a type, as it would appear on an instruction operand or
/// in a method signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// A named type with generic arguments, e.g. `List<String>`.
    Named {
        name: String,
        type_arguments: Vec<TypeRef>,
    },
    Array(Box<TypeRef>),
    Pointer(Box<TypeRef>),
    /// An unresolved generic parameter, e.g. `T`.
    TypeVariable(String),
}

/// A declaration record from the type model: the thing a `TypeRef` by
/// name ultimately resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDecl {
    Class(ClassDecl),
    Struct(StructDecl),
    Interface(InterfaceDecl),
    Enum(EnumDecl),
    Method(MethodDecl),
    Field(FieldDecl),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
    pub name: String,
    pub generic_parameters: Vec<String>,
    pub base: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDecl {
    pub name: String,
    pub generic_parameters: Vec<String>,
    pub fields: Vec<FieldDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDecl {
    pub name: String,
    pub generic_parameters: Vec<String>,
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDecl {
    pub name: String,
    pub variants: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub name: String,
    pub generic_parameters: Vec<String>,
    pub parameters: Vec<TypeRef>,
    pub return_type: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: String,
    pub field_type: TypeRef,
}

/// Read-only mapping from a type's name to its declaration, as handed to
/// the core by the type extractor. The core never constructs or mutates
/// this — it's here purely so signatures that need to reference "the
/// type model" have a concrete thing to name.
pub type TypeModel = HashMap<String, TypeDecl>;

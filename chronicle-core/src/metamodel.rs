//! The metamodel interface: everything the core treats as an external
//! collaborator (§1, §4.1 component B) rather than owning itself. Domain
//! code supplies concrete `ObjectType`/`Trait` implementations; the core
//! only ever consults them through these trait objects.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use chronicle_value::ValueType;

use crate::structure::StructuralKind;

/// One attribute a [`Trait`] declares, with the type it must satisfy.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSchema {
    /// Attribute name.
    pub name: String,
    /// Required value type (per §3.2's conversion matrix — an attribute
    /// value satisfies the schema if it is convertible to this type).
    pub value_type: ValueType,
    /// Whether acceptance must fail if the attribute is absent.
    pub required: bool,
}

/// A named attribute schema a type may include (§3.3 invariant 4).
pub trait Trait {
    /// This trait's name, used in `TypeError::MissingTraitAttribute`.
    fn name(&self) -> &str;

    /// The attributes this trait requires or allows.
    fn attributes(&self) -> &[AttributeSchema];
}

/// A type in the metamodel: provides the allowed structural role and the
/// set of traits (hence attribute schemas) an object of this type must
/// satisfy.
pub trait ObjectType {
    /// This type's name, used for `["type"]` in a foreign record (§6.1)
    /// and `UnknownObjectType` in loader errors.
    fn name(&self) -> &str;

    /// The only [`StructuralKind`] an object of this type may have
    /// (§3.3 invariant 3).
    fn structural_role(&self) -> StructuralKind;

    /// The traits this type includes.
    fn traits(&self) -> &[Box<dyn Trait + Send + Sync>];
}

/// A minimal, concrete [`ObjectType`]/[`Trait`] pair for tests and small
/// embeddings that don't need a full metamodel crate.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleTrait {
    name: String,
    attributes: Vec<AttributeSchema>,
}

impl SimpleTrait {
    /// Builds a trait from its name and attribute schemas.
    pub fn new(name: impl Into<String>, attributes: Vec<AttributeSchema>) -> Self {
        SimpleTrait {
            name: name.into(),
            attributes,
        }
    }
}

impl Trait for SimpleTrait {
    fn name(&self) -> &str {
        &self.name
    }

    fn attributes(&self) -> &[AttributeSchema] {
        &self.attributes
    }
}

/// A minimal, concrete [`ObjectType`] for tests and small embeddings.
pub struct SimpleObjectType {
    name: String,
    structural_role: StructuralKind,
    traits: Vec<Box<dyn Trait + Send + Sync>>,
}

impl SimpleObjectType {
    /// Builds a type from its name, structural role, and traits.
    pub fn new(name: impl Into<String>, structural_role: StructuralKind, traits: Vec<Box<dyn Trait + Send + Sync>>) -> Self {
        SimpleObjectType {
            name: name.into(),
            structural_role,
            traits,
        }
    }
}

impl ObjectType for SimpleObjectType {
    fn name(&self) -> &str {
        &self.name
    }

    fn structural_role(&self) -> StructuralKind {
        self.structural_role
    }

    fn traits(&self) -> &[Box<dyn Trait + Send + Sync>] {
        &self.traits
    }
}

/// Looks up an [`ObjectType`] by name; the interface a design loader
/// (§6.3) consults to resolve the `type` key of a foreign record.
pub trait Metamodel {
    /// Resolves a type name, or `None` if the metamodel has no such type
    /// (the loader turns that into `UnknownObjectType`).
    fn object_type(&self, name: &str) -> Option<alloc::sync::Arc<dyn ObjectType + Send + Sync>>;
}

//! Runtime values.
//!
//! Primitives (`Int`, `Str`, `Bool`) and `Void` are value-semantic; objects
//! are reference-semantic handles (`Rc<Instance>`) whose slot storage is
//! shared between aliases. Cool `Int` is backed by 64-bit two's-complement
//! with wrapping arithmetic.

use std::{cell::RefCell, fmt, rc::Rc};

use indexmap::IndexMap;

use crate::symbols::{BOOL, INT, STRING};

/// A heap object: its dynamic class and the mutable attribute slots.
///
/// The slot layout is fixed at construction (`new T` lays out every attribute
/// from `Object` down to `T`); only the slot contents are mutable. Writes
/// through one handle are visible through every alias.
#[derive(Debug)]
pub struct Instance {
    class_name: Rc<str>,
    slots: RefCell<IndexMap<Rc<str>, Value>>,
}

impl Instance {
    pub(crate) fn new(class_name: Rc<str>, slots: IndexMap<Rc<str>, Value>) -> Self {
        Self {
            class_name,
            slots: RefCell::new(slots),
        }
    }

    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub(crate) fn get_slot(&self, name: &str) -> Option<Value> {
        self.slots.borrow().get(name).cloned()
    }

    /// Writes an existing slot; false when the object has no such slot.
    pub(crate) fn set_slot(&self, name: &str, value: Value) -> bool {
        let mut slots = self.slots.borrow_mut();
        match slots.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// A new object of the same class whose slots hold the same values but
    /// share no slot storage with the original.
    pub(crate) fn shallow_copy(&self) -> Self {
        Self {
            class_name: Rc::clone(&self.class_name),
            slots: RefCell::new(self.slots.borrow().clone()),
        }
    }
}

/// A Cool runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Str(Rc<str>),
    Bool(bool),
    /// The designated uninitialized reference value.
    Void,
    Object(Rc<Instance>),
}

impl Value {
    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    /// The dynamic class of this value; None for `Void`, which has no class.
    #[must_use]
    pub fn dynamic_class_name(&self) -> Option<&str> {
        match self {
            Self::Int(_) => Some(INT),
            Self::Str(_) => Some(STRING),
            Self::Bool(_) => Some(BOOL),
            Self::Void => None,
            Self::Object(instance) => Some(instance.class_name()),
        }
    }

    /// The default a freshly laid-out slot of `type_name` holds.
    #[must_use]
    pub(crate) fn default_for_type(type_name: &str) -> Self {
        match type_name {
            INT => Self::Int(0),
            STRING => Self::Str(Rc::from("")),
            BOOL => Self::Bool(false),
            _ => Self::Void,
        }
    }

    /// The `=` operator: structural for primitives and Void, identity for
    /// objects. Cross-primitive comparisons are ruled out by the checker.
    #[must_use]
    pub fn cool_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a.as_bytes() == b.as_bytes(),
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Void, Self::Void) => true,
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    #[must_use]
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "Int",
            Self::Str(_) => "String",
            Self::Bool(_) => "Bool",
            Self::Void => "Void",
            Self::Object(_) => "Object",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Str(value) => f.write_str(value),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Void => f.write_str("void"),
            Self::Object(instance) => write!(f, "<instance of {}>", instance.class_name()),
        }
    }
}

/// Conversion failure from a [`Value`] into a host type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrongValueKind {
    pub expected: &'static str,
    pub found: &'static str,
}

impl fmt::Display for WrongValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected a {} value, found {}", self.expected, self.found)
    }
}

impl std::error::Error for WrongValueKind {}

impl TryFrom<&Value> for i64 {
    type Error = WrongValueKind;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Int(v) => Ok(*v),
            other => Err(WrongValueKind {
                expected: "Int",
                found: other.kind_name(),
            }),
        }
    }
}

impl TryFrom<&Value> for bool {
    type Error = WrongValueKind;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Bool(v) => Ok(*v),
            other => Err(WrongValueKind {
                expected: "Bool",
                found: other.kind_name(),
            }),
        }
    }
}

impl TryFrom<&Value> for String {
    type Error = WrongValueKind;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Str(v) => Ok(v.to_string()),
            other => Err(WrongValueKind {
                expected: "String",
                found: other.kind_name(),
            }),
        }
    }
}

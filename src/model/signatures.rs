use std::fmt;

use super::types::ValueType;

/// Parameter and return shape of a method, without owner or name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct MethodDescriptor {
    pub params: Vec<ValueType>,
    /// `None` means the method returns no value.
    pub ret: Option<ValueType>,
}

impl MethodDescriptor {
    #[must_use]
    pub fn new(params: Vec<ValueType>, ret: Option<ValueType>) -> Self {
        Self { params, ret }
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (index, param) in self.params.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")")?;
        match &self.ret {
            Some(ret) => write!(f, " -> {ret}"),
            None => Ok(()),
        }
    }
}

/// Fully-qualified method reference: owning type, name and descriptor.
///
/// Used as the key for the virtual registry and for per-table slot
/// resolution, so it must stay cheap to hash and compare.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    pub owner: String,
    pub name: String,
    pub descriptor: MethodDescriptor,
}

impl MethodSignature {
    #[must_use]
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: MethodDescriptor,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            descriptor,
        }
    }

    /// Owner-independent slot key for virtual dispatch.
    #[must_use]
    pub fn key(&self) -> MethodKey {
        MethodKey {
            name: self.name.clone(),
            descriptor: self.descriptor.clone(),
        }
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.owner, self.name, self.descriptor)
    }
}

/// Name plus descriptor, shared by every override of one virtual method.
///
/// Two methods with equal keys occupy the same virtual table slot across a
/// class and all of its descendants.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodKey {
    pub name: String,
    pub descriptor: MethodDescriptor,
}

use std::fmt;

/// Primitive kinds understood by the emission backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    /// Runtime-visible name, as surfaced through reflection metadata.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    /// Size of one value of this kind in bytes.
    #[must_use]
    pub fn size_in_bytes(self) -> u32 {
        match self {
            PrimitiveKind::Boolean | PrimitiveKind::Byte => 1,
            PrimitiveKind::Short | PrimitiveKind::Char => 2,
            PrimitiveKind::Int | PrimitiveKind::Float => 4,
            PrimitiveKind::Long | PrimitiveKind::Double => 8,
        }
    }
}

/// Closed type shape used for fields, descriptors and metadata enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Primitive(PrimitiveKind),
    Object(String),
    Array(Box<ValueType>),
}

impl ValueType {
    #[must_use]
    pub fn object(name: impl Into<String>) -> Self {
        ValueType::Object(name.into())
    }

    #[must_use]
    pub fn array_of(element: ValueType) -> Self {
        ValueType::Array(Box::new(element))
    }

    /// Whether values of this type are managed heap references.
    #[must_use]
    pub fn is_reference(&self) -> bool {
        matches!(self, ValueType::Object(_) | ValueType::Array(_))
    }

    /// Innermost element type of a (possibly nested) array, or `self`.
    #[must_use]
    pub fn ultimate_element(&self) -> &ValueType {
        let mut current = self;
        while let ValueType::Array(element) = current {
            current = element;
        }
        current
    }

    /// Runtime-visible name of this type: `app.Point`, `int`,
    /// `core.String[]`, `long[][]`.
    #[must_use]
    pub fn runtime_name(&self) -> String {
        let mut out = String::new();
        let mut rank = 0usize;
        let mut current = self;
        while let ValueType::Array(element) = current {
            rank += 1;
            current = element;
        }
        match current {
            ValueType::Primitive(kind) => out.push_str(kind.name()),
            ValueType::Object(name) => out.push_str(name),
            ValueType::Array(_) => unreachable!("array ranks already unwound"),
        }
        for _ in 0..rank {
            out.push_str("[]");
        }
        out
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.runtime_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_names_render_nested_arrays() {
        let ty = ValueType::array_of(ValueType::array_of(ValueType::Primitive(
            PrimitiveKind::Long,
        )));
        assert_eq!(ty.runtime_name(), "long[][]");
        assert_eq!(
            ValueType::object("core.String").runtime_name(),
            "core.String"
        );
    }

    #[test]
    fn ultimate_element_unwraps_all_ranks() {
        let ty = ValueType::array_of(ValueType::array_of(ValueType::object("app.Point")));
        assert_eq!(ty.ultimate_element(), &ValueType::object("app.Point"));
        assert!(ty.is_reference());
        assert!(!ValueType::Primitive(PrimitiveKind::Int).is_reference());
    }
}

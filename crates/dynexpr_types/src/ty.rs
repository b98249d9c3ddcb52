//! Semantic types.
//!
//! A [`Type`] is cheap to clone: predefined types are plain variants and
//! every user-described type sits behind an `Arc`. Host classes and enums
//! compare by identity, records by identity of their synthesized type, and
//! the structural wrappers (nullable, sequence, array, lambda) by their
//! components.

use crate::member::{HostFn, MethodBody, MethodInfo, ParamInfo, PropertyInfo, Access};
use crate::record::RecordType;
use dynexpr_core::CaseInsensitiveMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[derive(Clone)]
pub enum Type {
    Object,
    Boolean,
    Char,
    String,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    Decimal,
    DateTime,
    TimeSpan,
    Guid,
    /// Static-only predefined types.
    Math,
    Convert,
    Nullable(Box<Type>),
    Enum(Arc<EnumType>),
    Record(Arc<RecordType>),
    Class(Arc<ClassType>),
    /// A sequence of elements (the aggregate capability).
    Sequence(Box<Type>),
    /// A single-dimension array; also a sequence.
    Array(Box<Type>),
    Lambda(Arc<LambdaType>),
}

impl Type {
    pub fn nullable(inner: Type) -> Type {
        Type::Nullable(Box::new(inner))
    }

    pub fn sequence(element: Type) -> Type {
        Type::Sequence(Box::new(element))
    }

    pub fn array(element: Type) -> Type {
        Type::Array(Box::new(element))
    }

    #[inline]
    pub fn is_nullable(&self) -> bool {
        matches!(self, Type::Nullable(_))
    }

    /// Strip one level of `Nullable`.
    #[inline]
    pub fn non_nullable(&self) -> &Type {
        match self {
            Type::Nullable(inner) => inner,
            other => other,
        }
    }

    /// Value types: everything except `Object`, `String`, the static
    /// classes, records, host classes, sequences, arrays and lambdas.
    pub fn is_value_type(&self) -> bool {
        !matches!(
            self,
            Type::Object
                | Type::String
                | Type::Math
                | Type::Convert
                | Type::Record(_)
                | Type::Class(_)
                | Type::Sequence(_)
                | Type::Array(_)
                | Type::Lambda(_)
        )
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.non_nullable(), Type::Enum(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(_))
    }

    /// The element type when this type can be enumerated.
    pub fn element_type(&self) -> Option<Type> {
        match self {
            Type::Sequence(e) | Type::Array(e) => Some((**e).clone()),
            Type::Class(c) => c.element_type(),
            _ => None,
        }
    }

    /// Whether a value of `source` can be stored in a location of this
    /// reference type without conversion.
    pub fn is_assignable_from(&self, source: &Type) -> bool {
        if self == source {
            return true;
        }
        match self {
            Type::Object => true,
            Type::Sequence(e) => {
                let covariant = |se: &Type| se == &**e || (!se.is_value_type() && e.is_assignable_from(se));
                match source {
                    Type::Sequence(se) | Type::Array(se) => covariant(se),
                    Type::Class(c) => c.element_type().map_or(false, |se| covariant(&se)),
                    Type::String => **e == Type::Char,
                    _ => false,
                }
            }
            Type::Class(target) => match source {
                Type::Class(c) => c.derives_from(target),
                _ => false,
            },
            _ => false,
        }
    }

    /// Resolve a predefined type by name, ignoring case.
    pub fn predefined(name: &str) -> Option<Type> {
        PREDEFINED_NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, t)| t.clone())
    }

    /// Parse a type reference such as `Int32`, `Int32?` or `String[]`.
    pub fn parse_name(name: &str) -> Option<Type> {
        let name = name.trim();
        if let Some(inner) = name.strip_suffix("[]") {
            return Type::parse_name(inner).map(Type::array);
        }
        if let Some(inner) = name.strip_suffix('?') {
            let inner = Type::parse_name(inner)?;
            if !inner.is_value_type() || inner.is_nullable() {
                return None;
            }
            return Some(Type::nullable(inner));
        }
        Type::predefined(name)
    }

    fn ordinal(&self) -> u8 {
        match self {
            Type::Object => 0,
            Type::Boolean => 1,
            Type::Char => 2,
            Type::String => 3,
            Type::SByte => 4,
            Type::Byte => 5,
            Type::Int16 => 6,
            Type::UInt16 => 7,
            Type::Int32 => 8,
            Type::UInt32 => 9,
            Type::Int64 => 10,
            Type::UInt64 => 11,
            Type::Single => 12,
            Type::Double => 13,
            Type::Decimal => 14,
            Type::DateTime => 15,
            Type::TimeSpan => 16,
            Type::Guid => 17,
            Type::Math => 18,
            Type::Convert => 19,
            Type::Nullable(_) => 20,
            Type::Enum(_) => 21,
            Type::Record(_) => 22,
            Type::Class(_) => 23,
            Type::Sequence(_) => 24,
            Type::Array(_) => 25,
            Type::Lambda(_) => 26,
        }
    }
}

/// Every predefined type reachable by name from an expression.
pub const PREDEFINED_NAMES: &[(&str, Type)] = &[
    ("Object", Type::Object),
    ("Boolean", Type::Boolean),
    ("Char", Type::Char),
    ("String", Type::String),
    ("SByte", Type::SByte),
    ("Byte", Type::Byte),
    ("Int16", Type::Int16),
    ("UInt16", Type::UInt16),
    ("Int32", Type::Int32),
    ("UInt32", Type::UInt32),
    ("Int64", Type::Int64),
    ("UInt64", Type::UInt64),
    ("Single", Type::Single),
    ("Double", Type::Double),
    ("Decimal", Type::Decimal),
    ("DateTime", Type::DateTime),
    ("TimeSpan", Type::TimeSpan),
    ("Guid", Type::Guid),
    ("Math", Type::Math),
    ("Convert", Type::Convert),
];

impl PartialEq for Type {
    fn eq(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Nullable(a), Type::Nullable(b)) => a == b,
            (Type::Sequence(a), Type::Sequence(b)) => a == b,
            (Type::Array(a), Type::Array(b)) => a == b,
            (Type::Enum(a), Type::Enum(b)) => Arc::ptr_eq(a, b),
            (Type::Record(a), Type::Record(b)) => Arc::ptr_eq(a, b),
            (Type::Class(a), Type::Class(b)) => Arc::ptr_eq(a, b),
            (Type::Lambda(a), Type::Lambda(b)) => a == b,
            (a, b) => a.ordinal() == b.ordinal() && a.ordinal() < 20,
        }
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(self.ordinal());
        match self {
            Type::Nullable(t) | Type::Sequence(t) | Type::Array(t) => t.hash(state),
            Type::Enum(e) => e.name.hash(state),
            Type::Record(r) => r.id().hash(state),
            Type::Class(c) => c.name.hash(state),
            Type::Lambda(l) => l.hash(state),
            _ => {}
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Nullable(inner) => write!(f, "{}?", inner),
            Type::Enum(e) => write!(f, "{}", e.name),
            Type::Record(r) => write!(f, "{}", r.name()),
            Type::Class(c) => write!(f, "{}", c.name),
            Type::Sequence(e) => write!(f, "IEnumerable<{}>", e),
            Type::Array(e) => write!(f, "{}[]", e),
            Type::Lambda(l) => {
                write!(f, "Func<")?;
                for p in &l.parameters {
                    write!(f, "{}, ", p)?;
                }
                write!(f, "{}>", l.result)
            }
            other => {
                let name = PREDEFINED_NAMES
                    .iter()
                    .find(|(_, t)| t == other)
                    .map(|(n, _)| *n)
                    .unwrap_or("?");
                write!(f, "{}", name)
            }
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

// ============================================================================
// Enums
// ============================================================================

/// A host enum: a named set of integral constants.
#[derive(Debug)]
pub struct EnumType {
    pub name: String,
    /// The integral type backing the enum.
    pub underlying: Type,
    members: Vec<(String, i64)>,
}

impl EnumType {
    pub fn new(name: impl Into<String>, underlying: Type, members: &[(&str, i64)]) -> Arc<EnumType> {
        Arc::new(EnumType {
            name: name.into(),
            underlying,
            members: members.iter().map(|(n, v)| (n.to_string(), *v)).collect(),
        })
    }

    /// Look up a member by name, ignoring case.
    pub fn member(&self, name: &str) -> Option<i64> {
        self.members
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }

    pub fn name_of(&self, value: i64) -> Option<&str> {
        self.members
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(n, _)| n.as_str())
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, i64)> {
        self.members.iter().map(|(n, v)| (n.as_str(), *v))
    }
}

// ============================================================================
// Lambdas
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LambdaType {
    pub parameters: Vec<Type>,
    pub result: Type,
}

// ============================================================================
// Host classes
// ============================================================================

/// A caller-described class: its members, base class, and optionally the
/// element type that makes it enumerable.
pub struct ClassType {
    pub name: String,
    pub base: Option<Arc<ClassType>>,
    pub interfaces: Vec<Arc<ClassType>>,
    pub is_interface: bool,
    pub(crate) properties: CaseInsensitiveMap<PropertyInfo>,
    pub(crate) methods: Vec<Arc<MethodInfo>>,
    pub(crate) constructors: Vec<Arc<MethodInfo>>,
    pub(crate) indexers: Vec<Arc<MethodInfo>>,
    element_type: Option<Type>,
}

impl ClassType {
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder {
            class: ClassType {
                name: name.into(),
                base: None,
                interfaces: Vec::new(),
                is_interface: false,
                properties: CaseInsensitiveMap::new(),
                methods: Vec::new(),
                constructors: Vec::new(),
                indexers: Vec::new(),
                element_type: None,
            },
        }
    }

    /// Whether this class is `target`, derives from it, or implements it.
    pub fn derives_from(&self, target: &Arc<ClassType>) -> bool {
        if std::ptr::eq(self, Arc::as_ptr(target)) {
            return true;
        }
        if let Some(base) = &self.base {
            if base.derives_from(target) {
                return true;
            }
        }
        self.interfaces.iter().any(|i| i.derives_from(target))
    }

    pub fn element_type(&self) -> Option<Type> {
        self.element_type
            .clone()
            .or_else(|| self.base.as_ref().and_then(|b| b.element_type()))
            .or_else(|| self.interfaces.iter().find_map(|i| i.element_type()))
    }

    pub fn property(&self, name: &str) -> Option<&PropertyInfo> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> impl Iterator<Item = &PropertyInfo> {
        self.properties.values()
    }
}

impl fmt::Debug for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassType")
            .field("name", &self.name)
            .field("properties", &self.properties.len())
            .field("methods", &self.methods.len())
            .finish()
    }
}

pub struct ClassBuilder {
    class: ClassType,
}

impl ClassBuilder {
    pub fn base(mut self, base: Arc<ClassType>) -> Self {
        self.class.base = Some(base);
        self
    }

    pub fn interface(mut self, interface: Arc<ClassType>) -> Self {
        self.class.interfaces.push(interface);
        self
    }

    pub fn as_interface(mut self) -> Self {
        self.class.is_interface = true;
        self
    }

    pub fn element_type(mut self, element: Type) -> Self {
        self.class.element_type = Some(element);
        self
    }

    pub fn property(mut self, name: &str, ty: Type) -> Self {
        let info = PropertyInfo {
            name: name.to_string(),
            ty,
            is_static: false,
            is_field: false,
            access: Access::Host,
        };
        self.class.properties.try_insert(name, info);
        self
    }

    pub fn field(mut self, name: &str, ty: Type) -> Self {
        let info = PropertyInfo {
            name: name.to_string(),
            ty,
            is_static: false,
            is_field: true,
            access: Access::Host,
        };
        self.class.properties.try_insert(name, info);
        self
    }

    /// A method with no declared result (`None`) cannot be called from an
    /// expression, but still takes part in overload resolution.
    pub fn method(mut self, name: &str, params: &[Type], result: Option<Type>, body: HostFn) -> Self {
        self.class.methods.push(Arc::new(host_method(name, params, result, false, body)));
        self
    }

    pub fn static_method(mut self, name: &str, params: &[Type], result: Option<Type>, body: HostFn) -> Self {
        self.class.methods.push(Arc::new(host_method(name, params, result, true, body)));
        self
    }

    pub fn constructor(mut self, params: &[Type], body: HostFn) -> Self {
        let name = self.class.name.clone();
        self.class.constructors.push(Arc::new(host_method(&name, params, None, true, body)));
        self
    }

    pub fn indexer(mut self, params: &[Type], result: Type, body: HostFn) -> Self {
        self.class.indexers.push(Arc::new(host_method("Item", params, Some(result), false, body)));
        self
    }

    pub fn build(self) -> Arc<ClassType> {
        Arc::new(self.class)
    }
}

fn host_method(name: &str, params: &[Type], result: Option<Type>, is_static: bool, body: HostFn) -> MethodInfo {
    MethodInfo {
        name: name.to_string(),
        params: params.iter().cloned().map(ParamInfo::new).collect(),
        result,
        is_static,
        body: MethodBody::Host(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names() {
        assert_eq!(Type::Int32.to_string(), "Int32");
        assert_eq!(Type::nullable(Type::Double).to_string(), "Double?");
        assert_eq!(Type::array(Type::String).to_string(), "String[]");
        assert_eq!(Type::sequence(Type::Int64).to_string(), "IEnumerable<Int64>");
    }

    #[test]
    fn test_parse_name() {
        assert_eq!(Type::parse_name("int32"), Some(Type::Int32));
        assert_eq!(Type::parse_name("Int32?"), Some(Type::nullable(Type::Int32)));
        assert_eq!(Type::parse_name("String[]"), Some(Type::array(Type::String)));
        assert_eq!(Type::parse_name("String?"), None);
        assert_eq!(Type::parse_name("Widget"), None);
        assert_eq!(Type::parse_name("decimal?"), Some(Type::nullable(Type::Decimal)));
        assert_ne!(Type::Decimal, Type::Double);
    }

    #[test]
    fn test_value_types() {
        assert!(Type::Int32.is_value_type());
        assert!(Type::nullable(Type::Int32).is_value_type());
        assert!(!Type::String.is_value_type());
        assert!(!Type::Object.is_value_type());
    }

    #[test]
    fn test_host_types_compare_by_identity() {
        let a = ClassType::builder("Order").build();
        let b = ClassType::builder("Order").build();
        assert_eq!(Type::Class(a.clone()), Type::Class(a.clone()));
        assert_ne!(Type::Class(a), Type::Class(b));
    }

    #[test]
    fn test_assignability() {
        let base = ClassType::builder("Animal").build();
        let derived = ClassType::builder("Dog").base(base.clone()).build();
        assert!(Type::Class(base.clone()).is_assignable_from(&Type::Class(derived.clone())));
        assert!(!Type::Class(derived).is_assignable_from(&Type::Class(base)));
        assert!(Type::Object.is_assignable_from(&Type::Int32));
        assert!(Type::sequence(Type::Int32).is_assignable_from(&Type::array(Type::Int32)));
        assert!(Type::sequence(Type::Object).is_assignable_from(&Type::array(Type::String)));
        assert!(!Type::sequence(Type::Object).is_assignable_from(&Type::array(Type::Int32)));
    }

    #[test]
    fn test_enum_members_ignore_case() {
        let color = EnumType::new("Color", Type::Int32, &[("Red", 0), ("Green", 1)]);
        assert_eq!(color.member("green"), Some(1));
        assert_eq!(color.name_of(0), Some("Red"));
        assert_eq!(color.member("Blue"), None);
    }
}

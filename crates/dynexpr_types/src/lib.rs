//! dynexpr_types: The semantic type model shared by the parser and evaluator.
//!
//! Contains the predefined and host type descriptions, runtime values, the
//! implicit conversion lattice, the predefined member catalog, and the
//! structural record types synthesized by the [`TypeFactory`].

pub mod catalog;
pub mod conversion;
pub mod factory;
pub mod member;
pub mod record;
pub mod signature;
pub mod ty;
pub mod value;

pub use factory::{FactoryError, TypeFactory};
pub use member::{Access, Builtin, HostFn, MethodBody, MethodInfo, ParamInfo, PropertyInfo};
pub use record::{PropertyDescriptor, RecordInstance, RecordType};
pub use signature::Signature;
pub use ty::{ClassBuilder, ClassType, EnumType, LambdaType, Type};
pub use rust_decimal::Decimal;
pub use value::{HostInstance, Value};

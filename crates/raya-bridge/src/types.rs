//! Generic type signatures and bridge type descriptors
//!
//! A bridge resolves the static element/key/value types of its collection
//! exactly once, at construction:
//!
//! 1. an explicit signature handed to the constructor wins, parameterized or
//!    not;
//! 2. otherwise the collection's own declared signature (see
//!    [`crate::collection::Introspect`]);
//! 3. otherwise every slot is [`NativeType::Unconstrained`].
//!
//! Turning one type argument into a raw [`NativeType`] is delegated to a
//! [`TypeResolver`], the host's introspection utility.

use std::fmt;
use std::sync::Arc;

use crate::host::NativeType;

// ============================================================================
// TypeSignature
// ============================================================================

/// Generic type signature as declared by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSignature {
    /// Plain, non-generic type
    Raw(NativeType),
    /// Generic type applied to arguments, e.g. `Map<String, Integer>`
    Parameterized {
        /// Raw generic type name
        raw: Arc<str>,
        /// Type arguments in declaration order
        args: Vec<TypeSignature>,
    },
    /// Wildcard argument, optionally bounded: `?` or `? extends T`
    Wildcard {
        /// Upper bound
        upper: Option<Box<TypeSignature>>,
    },
}

impl TypeSignature {
    /// Plain type
    pub fn raw(ty: NativeType) -> Self {
        TypeSignature::Raw(ty)
    }

    /// Generic type applied to arguments
    pub fn parameterized(raw: &str, args: Vec<TypeSignature>) -> Self {
        TypeSignature::Parameterized {
            raw: Arc::from(raw),
            args,
        }
    }

    /// `List<element>`
    pub fn list_of(element: NativeType) -> Self {
        Self::parameterized("List", vec![TypeSignature::Raw(element)])
    }

    /// `Map<key, value>`
    pub fn map_of(key: NativeType, value: NativeType) -> Self {
        Self::parameterized(
            "Map",
            vec![TypeSignature::Raw(key), TypeSignature::Raw(value)],
        )
    }

    /// Type arguments, if this signature is parameterized
    pub fn type_arguments(&self) -> Option<&[TypeSignature]> {
        match self {
            TypeSignature::Parameterized { args, .. } => Some(args),
            _ => None,
        }
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSignature::Raw(ty) => write!(f, "{}", ty),
            TypeSignature::Parameterized { raw, args } => {
                write!(f, "{}<", raw)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(">")
            }
            TypeSignature::Wildcard { upper: None } => f.write_str("?"),
            TypeSignature::Wildcard { upper: Some(bound) } => write!(f, "? extends {}", bound),
        }
    }
}

// ============================================================================
// TypeResolver
// ============================================================================

/// Extracts the raw type from a (possibly generic) type signature.
pub trait TypeResolver: Send + Sync {
    /// Raw type of `signature`; `Unconstrained` when nothing better is known
    fn raw_type(&self, signature: &TypeSignature) -> NativeType;
}

/// Default resolver: erases type arguments and follows wildcard bounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawTypeResolver;

impl TypeResolver for RawTypeResolver {
    fn raw_type(&self, signature: &TypeSignature) -> NativeType {
        match signature {
            TypeSignature::Raw(ty) => ty.clone(),
            TypeSignature::Parameterized { raw, .. } => NativeType::from_name(raw),
            TypeSignature::Wildcard { upper: Some(bound) } => self.raw_type(bound),
            TypeSignature::Wildcard { upper: None } => NativeType::Unconstrained,
        }
    }
}

// ============================================================================
// TypeDescriptor
// ============================================================================

/// Where a bridge's type descriptor came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSource {
    /// Signature passed to the constructor
    Explicit,
    /// Signature declared by the collection itself
    Introspected,
    /// No signature; everything unconstrained
    Default,
}

/// Resolved static types of a bridged collection.
///
/// For sequences only `value` (the element type) is meaningful and `key` is
/// always `Unconstrained`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    key: NativeType,
    value: NativeType,
    source: TypeSource,
}

impl TypeDescriptor {
    /// Descriptor with every slot unconstrained
    pub fn unconstrained() -> Self {
        Self {
            key: NativeType::Unconstrained,
            value: NativeType::Unconstrained,
            source: TypeSource::Default,
        }
    }

    /// Resolve a sequence's element type from argument 0
    pub fn for_list(
        explicit: Option<&TypeSignature>,
        introspected: Option<TypeSignature>,
        resolver: &dyn TypeResolver,
    ) -> Self {
        let (signature, source) = Self::pick(explicit, introspected);
        Self {
            key: NativeType::Unconstrained,
            value: Self::argument(signature.as_ref(), 0, resolver),
            source,
        }
    }

    /// Resolve a map's key type from argument 0 and value type from
    /// argument 1
    pub fn for_map(
        explicit: Option<&TypeSignature>,
        introspected: Option<TypeSignature>,
        resolver: &dyn TypeResolver,
    ) -> Self {
        let (signature, source) = Self::pick(explicit, introspected);
        Self {
            key: Self::argument(signature.as_ref(), 0, resolver),
            value: Self::argument(signature.as_ref(), 1, resolver),
            source,
        }
    }

    /// Key type (maps only)
    pub fn key(&self) -> &NativeType {
        &self.key
    }

    /// Element type (sequences) or value type (maps)
    pub fn value(&self) -> &NativeType {
        &self.value
    }

    /// Where the descriptor came from
    pub fn source(&self) -> TypeSource {
        self.source
    }

    fn pick(
        explicit: Option<&TypeSignature>,
        introspected: Option<TypeSignature>,
    ) -> (Option<TypeSignature>, TypeSource) {
        if let Some(sig) = explicit {
            (Some(sig.clone()), TypeSource::Explicit)
        } else if let Some(sig) = introspected {
            (Some(sig), TypeSource::Introspected)
        } else {
            (None, TypeSource::Default)
        }
    }

    fn argument(
        signature: Option<&TypeSignature>,
        index: usize,
        resolver: &dyn TypeResolver,
    ) -> NativeType {
        signature
            .and_then(TypeSignature::type_arguments)
            .and_then(|args| args.get(index))
            .map(|arg| resolver.raw_type(arg))
            .unwrap_or(NativeType::Unconstrained)
    }
}

impl Default for TypeDescriptor {
    fn default() -> Self {
        Self::unconstrained()
    }
}

//! BridgeContext - the capabilities a bridge is constructed with
//!
//! Bundles everything the bridges consume from the outside world: the type
//! resolver, both coercion directions, the scope wrapped values are exposed
//! into, and the bridge configuration. Cloning is cheap (shared `Arc`s).

use std::sync::Arc;

use crate::config::BridgeConfig;
use crate::convert::{CoerceToDynamic, CoerceToNative, ScopeId, StandardCoercion};
use crate::error::BridgeResult;
use crate::host::{HostValue, NativeType};
use crate::types::{RawTypeResolver, TypeResolver};
use crate::value::Value;

/// Injected capabilities shared by all bridges.
#[derive(Clone)]
pub struct BridgeContext {
    resolver: Arc<dyn TypeResolver>,
    to_native: Arc<dyn CoerceToNative>,
    to_dynamic: Arc<dyn CoerceToDynamic>,
    scope: ScopeId,
    config: BridgeConfig,
}

impl BridgeContext {
    /// Context with the standard resolver and coercion rules
    pub fn new() -> Self {
        Self {
            resolver: Arc::new(RawTypeResolver),
            to_native: Arc::new(StandardCoercion),
            to_dynamic: Arc::new(StandardCoercion),
            scope: ScopeId::default(),
            config: BridgeConfig::default(),
        }
    }

    /// Replace the type resolver
    pub fn with_resolver(mut self, resolver: impl TypeResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Replace the script → host coercion
    pub fn with_to_native(mut self, coercion: impl CoerceToNative + 'static) -> Self {
        self.to_native = Arc::new(coercion);
        self
    }

    /// Replace the host → script coercion
    pub fn with_to_dynamic(mut self, coercion: impl CoerceToDynamic + 'static) -> Self {
        self.to_dynamic = Arc::new(coercion);
        self
    }

    /// Set the scope wrapped values are exposed into
    pub fn with_scope(mut self, scope: ScopeId) -> Self {
        self.scope = scope;
        self
    }

    /// Set the bridge configuration
    pub fn with_config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Type resolver
    pub fn resolver(&self) -> &dyn TypeResolver {
        self.resolver.as_ref()
    }

    /// Scope wrapped values are exposed into
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// Bridge configuration
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Coerce a script value to `target`
    pub fn to_native(&self, value: &Value, target: &NativeType) -> BridgeResult<HostValue> {
        self.to_native.to_native(value, target)
    }

    /// Expose a host value declared as `declared`
    pub fn to_dynamic(&self, value: &HostValue, declared: &NativeType) -> BridgeResult<Value> {
        self.to_dynamic.to_dynamic(value, declared, self.scope)
    }
}

impl Default for BridgeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BridgeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeContext")
            .field("scope", &self.scope)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

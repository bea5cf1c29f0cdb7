use std::collections::HashMap;
use std::sync::Arc;

use crate::audience::{
    AreaAudience, CombinedAudience, PartyAudience, Resolver, RoleGatedAudience, RoomAudience,
    WorldAudience,
};
use crate::error::ScopeError;
use crate::roles::Role;

/// Per-channel knobs handed to a scope factory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScopeParams {
    pub min_role: Option<Role>,
}

pub type ScopeFactory =
    Box<dyn Fn(&ScopeParams) -> Result<Arc<dyn Resolver>, ScopeError> + Send + Sync>;

/// Scope name -> resolver factory. Built once at startup.
///
/// A scope written `a+b` builds each part and unions them.
pub struct ScopeRegistry {
    factories: HashMap<String, ScopeFactory>,
}

impl std::fmt::Debug for ScopeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeRegistry")
            .field("scopes", &self.names())
            .finish()
    }
}

impl Default for ScopeRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl ScopeRegistry {
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn with_builtin() -> Self {
        let mut r = Self::empty();
        for name in ["world", "global"] {
            r.register(name, world);
        }
        for name in ["area", "zone"] {
            r.register(name, area);
        }
        for name in ["party", "group"] {
            r.register(name, party);
        }
        for name in ["room", "local"] {
            r.register(name, room);
        }
        r.register("role", role);
        r
    }

    /// Adds or replaces a scope.
    pub fn register<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&ScopeParams) -> Result<Arc<dyn Resolver>, ScopeError> + Send + Sync + 'static,
    {
        self.factories
            .insert(name.trim().to_ascii_lowercase(), Box::new(f));
    }

    pub fn names(&self) -> Vec<&str> {
        let mut v = self.factories.keys().map(String::as_str).collect::<Vec<_>>();
        v.sort_unstable();
        v
    }

    pub fn build(
        &self,
        scope: &str,
        params: &ScopeParams,
    ) -> Result<Arc<dyn Resolver>, ScopeError> {
        let scope = scope.trim().to_ascii_lowercase();
        if scope.is_empty() {
            return Err(ScopeError::EmptyScope);
        }

        let parts = scope.split('+').map(str::trim).collect::<Vec<_>>();
        if parts.len() == 1 {
            return self.build_one(parts[0], params);
        }

        let mut built = Vec::with_capacity(parts.len());
        for p in parts {
            if p.is_empty() {
                return Err(ScopeError::EmptyScope);
            }
            built.push(self.build_one(p, params)?);
        }
        Ok(Arc::new(CombinedAudience::new(built)))
    }

    fn build_one(&self, name: &str, params: &ScopeParams) -> Result<Arc<dyn Resolver>, ScopeError> {
        let f = self
            .factories
            .get(name)
            .ok_or_else(|| ScopeError::UnknownScope(name.to_string()))?;
        f(params)
    }
}

fn world(_: &ScopeParams) -> Result<Arc<dyn Resolver>, ScopeError> {
    Ok(Arc::new(WorldAudience))
}

fn area(_: &ScopeParams) -> Result<Arc<dyn Resolver>, ScopeError> {
    Ok(Arc::new(AreaAudience))
}

fn party(_: &ScopeParams) -> Result<Arc<dyn Resolver>, ScopeError> {
    Ok(Arc::new(PartyAudience))
}

fn room(_: &ScopeParams) -> Result<Arc<dyn Resolver>, ScopeError> {
    Ok(Arc::new(RoomAudience))
}

fn role(p: &ScopeParams) -> Result<Arc<dyn Resolver>, ScopeError> {
    Ok(Arc::new(RoleGatedAudience::new(p.min_role)?))
}

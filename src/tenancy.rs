use uuid::Uuid;

use crate::models::DataEnvironment;

/// Who is calling, for which tenant, against which data environment.
/// Injected into every protected request by the tenant middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantContext {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub environment: DataEnvironment,
}

/// The isolation key carried by every repository call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TenantScope {
    pub tenant_id: Uuid,
    pub is_live: bool,
}

impl TenantContext {
    pub fn new(tenant_id: Uuid, user_id: Uuid, environment: DataEnvironment) -> Self {
        Self { tenant_id, user_id, environment }
    }

    pub fn scope(&self) -> TenantScope {
        TenantScope {
            tenant_id: self.tenant_id,
            is_live: self.environment.is_live(),
        }
    }
}

impl TenantScope {
    /// True when a row tagged with (`tenant_id`, `is_live`) belongs to this scope
    pub fn owns(&self, tenant_id: Uuid, is_live: bool) -> bool {
        self.tenant_id == tenant_id && self.is_live == is_live
    }

    pub fn environment(&self) -> DataEnvironment {
        DataEnvironment::from_is_live(self.is_live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_separates_tenants_and_environments() {
        let tenant = Uuid::new_v4();
        let live = TenantContext::new(tenant, Uuid::new_v4(), DataEnvironment::Live).scope();
        let test = TenantContext::new(tenant, Uuid::new_v4(), DataEnvironment::Test).scope();

        assert!(live.owns(tenant, true));
        assert!(!live.owns(tenant, false));
        assert!(test.owns(tenant, false));
        assert!(!live.owns(Uuid::new_v4(), true));
        assert_eq!(test.environment(), DataEnvironment::Test);
    }
}

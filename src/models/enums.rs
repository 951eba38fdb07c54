use crate::string_enum;

string_enum! {
    /// Kind of sellable catalog entry
    pub enum ItemType {
        Service => "service",
        Product => "product",
        Package => "package",
    }
}

string_enum! {
    pub enum PricingType {
        Fixed => "fixed",
        Hourly => "hourly",
        PerUnit => "per_unit",
        PerSession => "per_session",
        Free => "free",
    }
}

string_enum! {
    /// Publication state of a catalog item, independent of the soft-delete flag
    pub enum ItemStatus {
        Draft => "draft",
        Active => "active",
        Inactive => "inactive",
        Archived => "archived",
    }
}

string_enum! {
    pub enum ResourceType {
        Staff => "staff",
        Equipment => "equipment",
        Consumable => "consumable",
        Asset => "asset",
        Partner => "partner",
    }
}

string_enum! {
    pub enum ResourceStatus {
        Available => "available",
        Unavailable => "unavailable",
        Retired => "retired",
    }
}

string_enum! {
    /// Live production data vs. test data within one tenant
    pub enum DataEnvironment {
        Live => "live",
        Test => "test",
    }
}

impl PricingType {
    /// Pricing models that only make sense with a known duration
    pub fn requires_duration(&self) -> bool {
        matches!(self, PricingType::Hourly | PricingType::PerSession)
    }
}

impl DataEnvironment {
    pub fn is_live(&self) -> bool {
        matches!(self, DataEnvironment::Live)
    }

    pub fn from_is_live(is_live: bool) -> Self {
        if is_live {
            DataEnvironment::Live
        } else {
            DataEnvironment::Test
        }
    }
}

impl Default for ItemStatus {
    fn default() -> Self {
        ItemStatus::Draft
    }
}

impl Default for ResourceStatus {
    fn default() -> Self {
        ResourceStatus::Available
    }
}

impl Default for DataEnvironment {
    fn default() -> Self {
        DataEnvironment::Live
    }
}

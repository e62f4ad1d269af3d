use staffguard_domain::RoleTier;

/// Maps one identity-provider role name onto a local role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRoleMapping {
    /// Role name asserted by the identity provider.
    pub provider_role: String,
    /// Local role name granted for it.
    pub local_role: String,
    /// Provider-side ranking used to pick the platform-owner grant.
    pub rank: i32,
    /// Only applies inside a vendor context.
    pub vendor_only: bool,
}

impl ProviderRoleMapping {
    fn new(provider_role: &str, tier: RoleTier, rank: i32, vendor_only: bool) -> Self {
        Self {
            provider_role: provider_role.to_owned(),
            local_role: tier.role_name().to_owned(),
            rank,
            vendor_only,
        }
    }
}

/// Lookup table from provider role names to local roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMappingTable {
    mappings: Vec<ProviderRoleMapping>,
}

impl RoleMappingTable {
    /// Creates a table from explicit mappings.
    #[must_use]
    pub fn new(mappings: Vec<ProviderRoleMapping>) -> Self {
        Self { mappings }
    }

    /// Returns the mapping of a provider role, if any.
    #[must_use]
    pub fn lookup(&self, provider_role: &str) -> Option<&ProviderRoleMapping> {
        self.mappings
            .iter()
            .find(|mapping| mapping.provider_role == provider_role)
    }

    /// Returns the tenant-wide mapping with the highest rank.
    #[must_use]
    pub fn highest(&self) -> Option<&ProviderRoleMapping> {
        self.mappings
            .iter()
            .filter(|mapping| !mapping.vendor_only)
            .max_by_key(|mapping| mapping.rank)
    }
}

impl Default for RoleMappingTable {
    fn default() -> Self {
        Self::new(vec![
            ProviderRoleMapping::new("platform_owner", RoleTier::SuperAdmin, 200, false),
            ProviderRoleMapping::new("store_owner", RoleTier::Owner, 100, false),
            ProviderRoleMapping::new("store_admin", RoleTier::Admin, 90, false),
            ProviderRoleMapping::new("store_manager", RoleTier::Manager, 70, false),
            ProviderRoleMapping::new("marketing_specialist", RoleTier::Member, 60, false),
            ProviderRoleMapping::new("inventory_specialist", RoleTier::Member, 60, false),
            ProviderRoleMapping::new("order_specialist", RoleTier::Member, 60, false),
            ProviderRoleMapping::new("customer_support", RoleTier::Member, 50, false),
            ProviderRoleMapping::new("viewer", RoleTier::Viewer, 10, false),
            ProviderRoleMapping::new("vendor_owner", RoleTier::Owner, 80, true),
            ProviderRoleMapping::new("vendor_admin", RoleTier::Admin, 75, true),
            ProviderRoleMapping::new("vendor_manager", RoleTier::Manager, 65, true),
            ProviderRoleMapping::new("vendor_staff", RoleTier::Member, 55, true),
        ])
    }
}

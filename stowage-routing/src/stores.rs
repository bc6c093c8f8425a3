//! Application-wide stores and the global container that owns them.

use std::fmt;
use std::sync::Arc;

use stowage_container::{Container, Result, ServiceKey};
use tracing::info;

/// Tracks the current route and navigates between pages.
pub trait RouterStore: Send + Sync {}

/// Describes the pages of the site and how they nest.
pub trait SiteMapStore: Send + Sync {}

/// Owns the open pages and creates their containers.
pub trait PageManagementStore: Send + Sync {}

/// Carries requests and responses between pages.
pub trait PageCommunicationStore: Send + Sync {}

pub const ROUTER_STORE: ServiceKey<dyn RouterStore> = ServiceKey::new("IRouterStore");
pub const SITE_MAP_STORE: ServiceKey<dyn SiteMapStore> = ServiceKey::new("ISiteMapStore");
pub const PAGE_MANAGEMENT_STORE: ServiceKey<dyn PageManagementStore> =
    ServiceKey::new("IPageManagementStore");
pub const PAGE_COMMUNICATION_STORE: ServiceKey<dyn PageCommunicationStore> =
    ServiceKey::new("IPageCommunicationStore");

/// The stores every page can reach.
#[derive(Clone)]
pub struct GlobalStores {
    pub router: Arc<dyn RouterStore>,
    pub site_map: Arc<dyn SiteMapStore>,
    pub page_management: Arc<dyn PageManagementStore>,
    pub page_communication: Arc<dyn PageCommunicationStore>,
}

/// Global stores registered in one container that page containers use as
/// their parent.
#[derive(Clone)]
pub struct GlobalComponents {
    stores: GlobalStores,
    container: Arc<Container>,
}

impl GlobalComponents {
    /// Builds the global container with each store under its well-known key.
    pub fn new(stores: GlobalStores) -> Result<Self> {
        let mut builder = Container::builder();
        builder.register_value(&ROUTER_STORE, Arc::clone(&stores.router));
        builder.register_value(&SITE_MAP_STORE, Arc::clone(&stores.site_map));
        builder.register_value(&PAGE_MANAGEMENT_STORE, Arc::clone(&stores.page_management));
        builder.register_value(
            &PAGE_COMMUNICATION_STORE,
            Arc::clone(&stores.page_communication),
        );

        let container = builder.build()?;
        info!(container = %container.id(), "Global components ready");

        Ok(Self { stores, container })
    }

    pub fn stores(&self) -> &GlobalStores {
        &self.stores
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }
}

impl fmt::Debug for GlobalComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalComponents")
            .field("container", &self.container)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub struct Router;
    impl RouterStore for Router {}

    pub struct SiteMap;
    impl SiteMapStore for SiteMap {}

    pub struct PageManagement;
    impl PageManagementStore for PageManagement {}

    pub struct PageCommunication;
    impl PageCommunicationStore for PageCommunication {}

    pub fn global_stores() -> GlobalStores {
        GlobalStores {
            router: Arc::new(Router),
            site_map: Arc::new(SiteMap),
            page_management: Arc::new(PageManagement),
            page_communication: Arc::new(PageCommunication),
        }
    }

    #[test]
    fn global_container_serves_each_store() {
        let stores = global_stores();
        let globals = GlobalComponents::new(stores.clone()).unwrap();
        let container = globals.container();

        assert!(Arc::ptr_eq(&container.resolve(&ROUTER_STORE).unwrap(), &stores.router));
        assert!(Arc::ptr_eq(&container.resolve(&SITE_MAP_STORE).unwrap(), &stores.site_map));
        assert!(Arc::ptr_eq(
            &container.resolve(&PAGE_MANAGEMENT_STORE).unwrap(),
            &stores.page_management
        ));
        assert!(Arc::ptr_eq(
            &container.resolve(&PAGE_COMMUNICATION_STORE).unwrap(),
            &stores.page_communication
        ));
        assert_eq!(container.len(), 4);
    }

    #[test]
    fn stores_accessor_returns_originals() {
        let globals = GlobalComponents::new(global_stores()).unwrap();
        let resolved = globals.container().resolve(&ROUTER_STORE).unwrap();
        assert!(Arc::ptr_eq(&resolved, &globals.stores().router));
    }
}

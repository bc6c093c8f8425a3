//! Page-scoped composition on top of `stowage-container`.
//!
//! The global stores live in one container built by [`GlobalComponents`].
//! A [`PageContainerFactory`] builds a child container per page with that
//! global container as its parent.

pub mod factory;
pub mod request;
pub mod stores;

pub use factory::{PAGE_ID, PAGE_REQUEST, PAGE_URL, PageContainerFactory, ROUTE_PARAMETERS};
pub use request::{PageRequest, RouteParameters};
pub use stores::{
    GlobalComponents, GlobalStores, PAGE_COMMUNICATION_STORE, PAGE_MANAGEMENT_STORE,
    PageCommunicationStore, PageManagementStore, ROUTER_STORE, RouterStore, SITE_MAP_STORE,
    SiteMapStore,
};

//! Page containers.
//!
//! Every opened page gets its own container. The global container is its
//! parent, so page code resolves the global stores through fallback while
//! page stores stay private to the page.

use std::sync::Arc;

use stowage_container::{Container, ContainerBuilder, Result, ServiceKey};
use tracing::{debug, instrument};
use url::Url;

use crate::request::{PageRequest, RouteParameters};
use crate::stores::GlobalComponents;

pub const PAGE_ID: ServiceKey<String> = ServiceKey::new("PageId");
pub const PAGE_URL: ServiceKey<Url> = ServiceKey::new("PageUrl");
pub const ROUTE_PARAMETERS: ServiceKey<RouteParameters> = ServiceKey::new("RouteParameters");
pub const PAGE_REQUEST: ServiceKey<PageRequest> = ServiceKey::new("IPageRequest");

/// Creates the container for a page.
///
/// Implementors provide [`register_stores`](Self::register_stores) with the
/// page-specific registrations.
///
/// # Examples
/// ```rust
/// use std::sync::Arc;
/// use stowage_container::ContainerBuilder;
/// use stowage_routing::{PageContainerFactory, RouteParameters};
/// use url::Url;
///
/// struct OrderPage {
///     order_id: Option<String>,
/// }
///
/// const ORDER_PAGE: stowage_container::ServiceKey<OrderPage> =
///     stowage_container::ServiceKey::new("IOrderPageStore");
///
/// struct Pages;
///
/// impl PageContainerFactory for Pages {
///     fn register_stores(&self, builder: &mut ContainerBuilder, _url: &Url, params: &RouteParameters) {
///         let order_id = params.get("id").map(str::to_owned);
///         builder.register(&ORDER_PAGE, move |_| {
///             Ok(Arc::new(OrderPage { order_id: order_id.clone() }))
///         });
///     }
/// }
/// ```
pub trait PageContainerFactory: Send + Sync {
    /// Registers the stores of the page at `url`.
    fn register_stores(
        &self,
        builder: &mut ContainerBuilder,
        url: &Url,
        route_parameters: &RouteParameters,
    );

    /// Builds a fresh container for one page.
    ///
    /// Registers the page id, url, route parameters and, when present, the
    /// request that opened the page, then calls
    /// [`register_stores`](Self::register_stores). Registrations made by the
    /// hook replace the defaults for the same key.
    #[instrument(skip_all, fields(page_id = page_id, url = %url))]
    fn create_container(
        &self,
        page_id: &str,
        url: &Url,
        route_parameters: &RouteParameters,
        globals: &GlobalComponents,
        page_request: Option<PageRequest>,
    ) -> Result<Arc<Container>> {
        let mut builder = Container::builder();
        builder.add_parent_container(Arc::clone(globals.container()));

        builder.register_value(&PAGE_ID, Arc::new(page_id.to_owned()));
        builder.register_value(&PAGE_URL, Arc::new(url.clone()));
        builder.register_value(&ROUTE_PARAMETERS, Arc::new(route_parameters.clone()));
        if let Some(request) = page_request {
            builder.register_value(&PAGE_REQUEST, Arc::new(request));
        }

        self.register_stores(&mut builder, url, route_parameters);

        let container = builder.build()?;
        debug!(container = %container.id(), keys = container.len(), "Page container created");
        Ok(container)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use stowage_container::StowageError;

    use super::*;
    use crate::stores::tests::global_stores;
    use crate::stores::{ROUTER_STORE, RouterStore};

    struct OrderPageStore {
        order_id: String,
        router: Arc<dyn RouterStore>,
    }

    const ORDER_PAGE_STORE: ServiceKey<OrderPageStore> = ServiceKey::new("IOrderPageStore");

    struct OrderPages {
        created: Arc<AtomicU32>,
    }

    impl PageContainerFactory for OrderPages {
        fn register_stores(&self, builder: &mut ContainerBuilder, _url: &Url, params: &RouteParameters) {
            let order_id = params.get("id").unwrap_or_default().to_owned();
            let created = Arc::clone(&self.created);
            builder.register(&ORDER_PAGE_STORE, move |r| {
                created.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(OrderPageStore {
                    order_id: order_id.clone(),
                    router: r.resolve(&ROUTER_STORE)?,
                }))
            });
        }
    }

    fn factory() -> OrderPages {
        OrderPages {
            created: Arc::new(AtomicU32::new(0)),
        }
    }

    fn open(
        factory: &OrderPages,
        globals: &GlobalComponents,
        id: &str,
        request: Option<PageRequest>,
    ) -> Arc<Container> {
        let url = Url::parse(&format!("https://shop.test/orders/{id}")).unwrap();
        let params: RouteParameters = [("id", id)].into_iter().collect();
        factory
            .create_container(&format!("orders/{id}"), &url, &params, globals, request)
            .unwrap()
    }

    #[test]
    fn page_store_sees_global_router() {
        let globals = GlobalComponents::new(global_stores()).unwrap();
        let page = open(&factory(), &globals, "7", None);

        let store = page.resolve(&ORDER_PAGE_STORE).unwrap();
        assert_eq!(store.order_id, "7");
        assert!(Arc::ptr_eq(&store.router, &globals.stores().router));
    }

    #[test]
    fn global_container_is_the_parent() {
        let globals = GlobalComponents::new(global_stores()).unwrap();
        let page = open(&factory(), &globals, "7", None);

        assert_eq!(page.parents().len(), 1);
        assert_eq!(page.parents()[0].id(), globals.container().id());
        assert!(page.contains("IRouterStore"));
        assert!(!page.keys().contains(&"IRouterStore"));
    }

    #[test]
    fn pages_have_independent_stores() {
        let factory = factory();
        let globals = GlobalComponents::new(global_stores()).unwrap();
        let first = open(&factory, &globals, "1", None);
        let second = open(&factory, &globals, "2", None);

        let a = first.resolve(&ORDER_PAGE_STORE).unwrap();
        let b = second.resolve(&ORDER_PAGE_STORE).unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(b.order_id, "2");
        assert!(Arc::ptr_eq(&a.router, &b.router));
        assert_eq!(factory.created.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn page_metadata_is_registered() {
        let globals = GlobalComponents::new(global_stores()).unwrap();
        let page = open(&factory(), &globals, "7", None);

        assert_eq!(*page.resolve(&PAGE_ID).unwrap(), "orders/7");
        assert_eq!(page.resolve(&PAGE_URL).unwrap().path(), "/orders/7");
        assert_eq!(page.resolve(&ROUTE_PARAMETERS).unwrap().get("id"), Some("7"));
    }

    #[test]
    fn page_request_is_optional() {
        let globals = GlobalComponents::new(global_stores()).unwrap();
        let factory = factory();

        let plain = open(&factory, &globals, "7", None);
        assert!(plain.try_resolve(&PAGE_REQUEST).unwrap().is_none());
        assert!(matches!(
            plain.resolve(&PAGE_REQUEST).unwrap_err(),
            StowageError::NotRegistered(_)
        ));

        let target = Url::parse("https://shop.test/orders/8").unwrap();
        let request = PageRequest::new(target).from_page("orders/7");
        let requested = open(&factory, &globals, "8", Some(request.clone()));
        assert_eq!(*requested.resolve(&PAGE_REQUEST).unwrap(), request);
    }

    #[test]
    fn hook_can_replace_defaults() {
        struct Rewriting;

        impl PageContainerFactory for Rewriting {
            fn register_stores(&self, builder: &mut ContainerBuilder, url: &Url, _params: &RouteParameters) {
                let canonical = url.join("/canonical").unwrap();
                builder.register(&PAGE_URL, move |_| Ok(Arc::new(canonical.clone())));
            }
        }

        let globals = GlobalComponents::new(global_stores()).unwrap();
        let url = Url::parse("https://shop.test/orders/7").unwrap();
        let page = Rewriting
            .create_container("orders/7", &url, &RouteParameters::new(), &globals, None)
            .unwrap();

        assert_eq!(page.resolve(&PAGE_URL).unwrap().path(), "/canonical");
    }
}

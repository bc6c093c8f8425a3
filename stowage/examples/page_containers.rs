//! Page containers chained to a global container.
//!
//! Run with `RUST_LOG=stowage_container=trace` to watch parent fallback.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use stowage::prelude::*;
use stowage::replay::{REPLAY_LISTENERS, notify_replay_ended, notify_replay_started};
use stowage::{
    ContainerBuilder, GlobalComponents, GlobalStores, PAGE_URL, PageCommunicationStore,
    PageContainerFactory, PageManagementStore, ROUTER_STORE, ReplayAware, ReplayState,
    RouteParameters, RouterStore, SiteMapStore,
};
use tracing_subscriber::EnvFilter;
use url::Url;

// === Application-wide stores ===

#[derive(Default)]
struct HistoryRouter {
    replay: ReplayState,
    navigations: AtomicUsize,
}

impl HistoryRouter {
    fn navigate(&self, to: &str) {
        if self.is_replaying() {
            println!("  (replay) skipping navigation to {to}");
            return;
        }
        self.navigations.fetch_add(1, Ordering::Relaxed);
        println!("  navigating to {to}");
    }
}

impl RouterStore for HistoryRouter {}

impl ReplayAware for HistoryRouter {
    fn replay_state(&self) -> &ReplayState {
        &self.replay
    }
}

struct StaticSiteMap;
impl SiteMapStore for StaticSiteMap {}

struct Pages;
impl PageManagementStore for Pages {}

struct Mailbox;
impl PageCommunicationStore for Mailbox {}

// === Page-level store ===

struct OrderPageStore {
    order_id: String,
    url: Arc<Url>,
    router: Arc<HistoryRouter>,
}

const HISTORY_ROUTER: ServiceKey<HistoryRouter> = ServiceKey::new("HistoryRouter");
const ORDER_PAGE_STORE: ServiceKey<OrderPageStore> = ServiceKey::new("IOrderPageStore");

struct OrderPages {
    global: Arc<Container>,
}

impl PageContainerFactory for OrderPages {
    fn register_stores(&self, builder: &mut ContainerBuilder, _url: &Url, params: &RouteParameters) {
        let order_id = params.get("id").unwrap_or("new").to_owned();
        let global = Arc::clone(&self.global);
        builder.register(&ORDER_PAGE_STORE, move |r| {
            Ok(Arc::new(OrderPageStore {
                order_id: order_id.clone(),
                url: r.resolve(&PAGE_URL)?,
                router: global.resolve(&HISTORY_ROUTER)?,
            }))
        });
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("stowage=debug,stowage_container=debug,stowage_routing=debug")),
        )
        .init();

    let router = Arc::new(HistoryRouter::default());

    let globals = GlobalComponents::new(GlobalStores {
        router: Arc::clone(&router) as Arc<dyn RouterStore>,
        site_map: Arc::new(StaticSiteMap),
        page_management: Arc::new(Pages),
        page_communication: Arc::new(Mailbox),
    })?;

    // Concrete router access and replay listeners live one level below the
    // well-known stores.
    let mut app = Container::builder();
    app.add_parent_container(Arc::clone(globals.container()));
    app.register_value(&HISTORY_ROUTER, Arc::clone(&router));
    app.register_value(&REPLAY_LISTENERS, Arc::clone(&router) as Arc<dyn ReplayAware>)
        .in_collection();
    let app = app.build()?;

    println!("✅ Global container: {:?}", globals.container());

    let factory = OrderPages {
        global: Arc::clone(&app),
    };

    for id in ["17", "42"] {
        let url = Url::parse(&format!("https://shop.example/orders/{id}"))
            .map_err(|e| StowageError::construction_failed(InstanceKey::new("PageUrl", None), e))?;
        let params: RouteParameters = [("id", id)].into_iter().collect();

        let page = factory.create_container(&format!("orders/{id}"), &url, &params, &globals, None)?;
        let store = page.resolve(&ORDER_PAGE_STORE)?;
        let shared_router = page.resolve(&ROUTER_STORE)?;

        println!("📄 Page {} at {}", store.order_id, store.url);
        println!(
            "   global router shared: {}",
            std::ptr::addr_eq(Arc::as_ptr(&shared_router), Arc::as_ptr(&router))
        );
        store.router.navigate(store.url.path());
    }

    println!("\n⏪ Replaying...");
    let notified = notify_replay_started(&app)?;
    println!("   notified {notified} listener(s)");
    router.navigate("/orders/17");
    notify_replay_ended(&app)?;

    println!(
        "\n🎉 Done: {} real navigation(s)",
        router.navigations.load(Ordering::Relaxed)
    );
    Ok(())
}

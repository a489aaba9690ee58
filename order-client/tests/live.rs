use order_client::{
    ClientConfig, ClientError, ConnectionState, ExportFormat, OrderApi, OrderCache, OrderSync,
    PushSubscriber, SubscriberEvent,
};
use order_server::{Config, Server, ServerState};
use shared::{OrderCreate, OrderStatus, OrderUpdate, PushEvent};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

struct LiveServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    _dir: TempDir,
}

impl LiveServer {
    async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::for_work_dir(dir.path().to_string_lossy().to_string());
        let state = ServerState::initialize(&config).await.unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        tokio::spawn(async move { Server::with_state(config, state).serve(listener, token).await });
        Self {
            addr,
            shutdown,
            _dir: dir,
        }
    }

    fn config(&self) -> ClientConfig {
        ClientConfig::new(format!("http://{}", self.addr))
    }
}

impl Drop for LiveServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// The server registers a push client after the client sees the handshake
async fn wait_for_push_clients(api: &OrderApi, expected: usize) {
    for _ in 0..200 {
        if api.health().await.unwrap().connections == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("server never saw {expected} push clients");
}

fn order() -> OrderCreate {
    OrderCreate {
        customer: "Mariama".into(),
        items: vec!["Boubou brodé".into()],
        total_amount: 10_000,
        paid_amount: 4_000,
        ..Default::default()
    }
}

#[tokio::test]
async fn crud_through_the_client() {
    let server = LiveServer::start().await;
    let api = OrderApi::new(&server.config()).unwrap();

    let created = api.create_order(&order()).await.unwrap();
    assert_eq!(created.status, OrderStatus::Partial);

    let update = OrderUpdate {
        paid_amount: Some(10_000),
        ..Default::default()
    };
    let updated = api.update_order(&created.id, &update).await.unwrap();
    assert_eq!(updated.status, OrderStatus::Paid);
    assert_eq!(api.get_order(&created.id).await.unwrap().status, OrderStatus::Paid);
    assert_eq!(api.list_orders().await.unwrap().len(), 1);

    let invalid = OrderCreate {
        customer: String::new(),
        ..order()
    };
    assert!(matches!(
        api.create_order(&invalid).await,
        Err(ClientError::Validation(msg)) if msg.contains("customer")
    ));

    api.delete_order(&created.id).await.unwrap();
    assert!(matches!(
        api.delete_order(&created.id).await,
        Err(ClientError::NotFound(_))
    ));
}

#[tokio::test]
async fn upload_and_export_through_the_client() {
    let server = LiveServer::start().await;
    let api = OrderApi::new(&server.config()).unwrap();

    let url = api.upload_image("photo.webp", b"bytes".to_vec()).await.unwrap();
    assert!(url.starts_with("/uploads/") && url.ends_with(".webp"));

    assert!(matches!(
        api.export(ExportFormat::Csv, None, None).await,
        Err(ClientError::NotFound(_))
    ));

    api.create_order(&order()).await.unwrap();
    let download = api.export(ExportFormat::Json, None, None).await.unwrap();
    assert_eq!(download.file_name.as_deref(), Some("commandes.json"));
    let json: serde_json::Value = serde_json::from_slice(&download.bytes).unwrap();
    assert_eq!(json["total_commandes"], 1);
    assert_eq!(json["total_dette"], 6_000);
}

#[tokio::test]
async fn subscriber_receives_mutations() {
    let server = LiveServer::start().await;
    let api = OrderApi::new(&server.config()).unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = PushSubscriber::connect(&server.config(), move |event| {
        let _ = tx.send(event);
    });
    let mut state = handle.state();
    tokio::time::timeout(
        Duration::from_secs(5),
        state.wait_for(|s| *s == ConnectionState::Connected),
    )
    .await
    .unwrap()
    .unwrap();
    assert!(matches!(rx.recv().await, Some(SubscriberEvent::Connected)));
    wait_for_push_clients(&api, 1).await;

    let created = api.create_order(&order()).await.unwrap();
    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    match event {
        SubscriberEvent::Push(PushEvent::OrderCreated(pushed)) => assert_eq!(pushed, created),
        other => panic!("unexpected event {other:?}"),
    }

    api.delete_order(&created.id).await.unwrap();
    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(
        event,
        SubscriberEvent::Push(PushEvent::OrderDeleted(ref d)) if d.id == created.id
    ));

    handle.shutdown().await;
    wait_for_push_clients(&api, 0).await;
}

#[tokio::test]
async fn order_sync_refetches_after_push() {
    let server = LiveServer::start().await;
    let config = server.config();
    let api = OrderApi::new(&config).unwrap();
    let cache = Arc::new(OrderCache::new(api.clone()));

    let sync = OrderSync::connect(cache.clone(), &config);
    let mut refreshes = sync.refreshes();
    tokio::time::timeout(Duration::from_secs(5), refreshes.wait_for(|n| *n >= 1))
        .await
        .unwrap()
        .unwrap();
    assert!(cache.cached().unwrap().is_empty());
    wait_for_push_clients(&api, 1).await;

    api.create_order(&order()).await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), refreshes.wait_for(|n| *n >= 2))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cache.cached().unwrap().len(), 1);

    sync.shutdown().await;
}

//! Integration tests for bundle upload against a capturing endpoint

#[cfg(all(feature = "upload", feature = "server"))]
mod upload_tests {
    use axum::{
        body::Bytes,
        extract::State,
        http::{HeaderMap, StatusCode},
        routing::post,
        Router,
    };
    use investigation_agent::collector::device::DeviceSnapshot;
    use investigation_agent::collector::{
        Coordinate, DirectoryPhotoLibrary, FixedLocationService, PhotoMetadata,
    };
    use investigation_agent::export::{BundleInputs, BundleStore, InvestigationBundle};
    use investigation_agent::transparency::create_shared_log;
    use investigation_agent::upload::{UploadClient, UploadConfig, UploadError};
    use investigation_agent::InvestigationAgent;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    type Captured = Arc<Mutex<Vec<(Option<String>, Bytes)>>>;

    async fn capture(
        State(captured): State<Captured>,
        headers: HeaderMap,
        body: Bytes,
    ) -> &'static str {
        let content_type = headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        captured.lock().unwrap().push((content_type, body));
        "ok"
    }

    async fn start_capture() -> (SocketAddr, Captured) {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route("/upload", post(capture))
            .with_state(captured.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (addr, captured)
    }

    async fn start_unavailable() -> SocketAddr {
        let app = Router::new().route(
            "/upload",
            post(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        addr
    }

    async fn closed_port() -> u16 {
        // Bind then drop to get a port with nothing listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    fn saved_bundle(dir: &std::path::Path) -> BundleStore {
        let device = DeviceSnapshot {
            descriptor: "Field phone — iPhone, iOS 17.4".to_string(),
            battery_level: 0.9,
        };
        let photos = vec![PhotoMetadata {
            creation_date: None,
            file_size: 5_000,
            location: Some(Coordinate::new(51.5, -0.12)),
        }];
        let bundle = InvestigationBundle::build(
            BundleInputs {
                location: Some(Coordinate::new(51.5, -0.12)),
                device: &device,
                installed_apps: &["Instagram".to_string()],
                photos: &photos,
            },
            chrono::Utc::now(),
        );
        let store = BundleStore::in_dir(dir);
        store.save(&bundle).unwrap();
        store
    }

    #[tokio::test]
    async fn test_upload_sends_exact_file_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = saved_bundle(dir.path());
        let on_disk = std::fs::read(store.path()).unwrap();

        let (addr, captured) = start_capture().await;
        let client = UploadClient::new(UploadConfig::new("127.0.0.1", addr.port())).unwrap();

        let receipt = client.upload_bundle(&store).await.unwrap();
        assert_eq!(receipt.status, 200);
        assert_eq!(receipt.bytes_sent, on_disk.len());

        let captured = captured.lock().unwrap();
        assert_eq!(captured.len(), 1);
        let (content_type, body) = &captured[0];
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(body.as_ref(), on_disk.as_slice());
    }

    #[tokio::test]
    async fn test_upload_to_unreachable_endpoint_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = saved_bundle(dir.path());

        let port = closed_port().await;
        let client = UploadClient::new(UploadConfig::new("127.0.0.1", port)).unwrap();

        let result = client.upload_bundle(&store).await;
        assert!(matches!(result, Err(UploadError::Network(_))));
    }

    #[tokio::test]
    async fn test_agent_upload_records_each_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let activity = create_shared_log();
        let agent = InvestigationAgent::new(
            FixedLocationService::new(Some(Coordinate::new(51.5, -0.12))),
            DirectoryPhotoLibrary::new(dir.path().join("photos")),
            BundleStore::in_dir(dir.path()),
            activity.clone(),
        );
        agent.save().unwrap();
        let on_disk = std::fs::read(agent.store().path()).unwrap();

        let (addr, captured) = start_capture().await;
        let client = UploadClient::new(UploadConfig::new("127.0.0.1", addr.port())).unwrap();
        let receipt = agent.upload(&client).await.unwrap();
        assert!(receipt.is_success());
        assert_eq!(captured.lock().unwrap()[0].1.as_ref(), on_disk.as_slice());

        let addr = start_unavailable().await;
        let client = UploadClient::new(UploadConfig::new("127.0.0.1", addr.port())).unwrap();
        let receipt = agent.upload(&client).await.unwrap();
        assert_eq!(receipt.status, 503);
        assert!(!receipt.is_success());

        let port = closed_port().await;
        let client = UploadClient::new(UploadConfig::new("127.0.0.1", port)).unwrap();
        let result = agent.upload(&client).await;
        assert!(matches!(result, Err(UploadError::Network(_))));

        let stats = activity.stats();
        assert_eq!(stats.uploads_attempted, 3);
        assert_eq!(stats.uploads_succeeded, 1);
        assert_eq!(stats.bundles_saved, 1);
    }
}

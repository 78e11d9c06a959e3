//! Client against a live server backed by the in-memory store

use std::sync::Arc;

use arshelf_client::{ClientError, FormData, Request};
use arshelf_server::{build_router, AppState, MemoryStore, ServerConfig};

async fn spawn_server() -> String {
    let config = ServerConfig {
        login_max_failures: 1,
        ..ServerConfig::default()
    };
    let app = build_router(AppState::new(Arc::new(MemoryStore::new()), config));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/", addr)
}

#[tokio::test]
async fn admin_flow_and_lookup() {
    let base = spawn_server().await;
    let client = Request::new(&base).unwrap();

    client
        .register("alice", Some("alice@example.com"), "password1")
        .await
        .unwrap();
    assert!(!client.session().is_logged_in());

    client.login("alice", "password1").await.unwrap();
    assert!(client.session().is_logged_in());
    assert_eq!(client.current_user().await.unwrap().username, "alice");

    let app = client
        .create_app(&FormData::new().text("name", "Furniture"))
        .await
        .unwrap();

    let model = client
        .upload_model(
            app.id,
            FormData::new()
                .text("name", "Chair")
                .file("file", "chair.glb", "", b"glTF-chair".to_vec()),
        )
        .await
        .unwrap();
    assert_eq!(model.size_bytes, 10);

    client
        .create_product(
            app.id,
            FormData::new()
                .text("name", "Oak chair")
                .text("barcode", "ABC-123")
                .text("model_id", model.id.to_string()),
        )
        .await
        .unwrap();

    assert_eq!(client.list_models(app.id, 1).await.unwrap().total, 1);
    assert_eq!(client.list_products(app.id, 1).await.unwrap().total, 1);

    // Lookup works from a fresh client with no session.
    let viewer = Request::new(&base).unwrap();
    let scan = viewer.lookup_barcode(app.id, "ABC-123").await.unwrap();
    assert_eq!(scan.product.name, "Oak chair");
    let linked = scan.model.unwrap();
    assert_eq!(viewer.download_model(&linked).await.unwrap(), b"glTF-chair");

    let removed = client.delete_app(app.id).await.unwrap();
    assert_eq!((removed.models, removed.products), (1, 1));

    client.logout().await.unwrap();
    assert!(matches!(
        client.list_apps(1).await,
        Err(ClientError::Unauthorized)
    ));
}

#[tokio::test]
async fn server_errors_map_to_variants() {
    let base = spawn_server().await;
    let client = Request::new(&base).unwrap();
    client.register("bob", None, "password1").await.unwrap();

    let err = client.register("bob", None, "password1").await.unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 409, .. }));

    let err = client.login("bob", "wrong-pass").await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized));
    let err = client.login("bob", "wrong-pass").await.unwrap_err();
    assert!(matches!(err, ClientError::RateLimited { retry_after: Some(_) }));
    assert!(err.display_message().starts_with("Too many attempts"));
}

//! Integration tests for fragments-service
//!
//! Every property runs against both the ephemeral backend and the durable
//! backend over an in-memory object store.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use fragments_core::{Fragment, FragmentError};
use fragments_service::{FragmentService, Listing, Storage, StorageConfig};
use fragments_storage::{
    EphemeralMetadataStore, EphemeralObjectStore, MetadataStore, ObjectStore, StorageError,
};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

// ============================================================================
// Fixtures
// ============================================================================

fn services() -> Vec<(&'static str, FragmentService)> {
    fragments_logging::init_testing();
    vec![
        (
            "ephemeral",
            FragmentService::from_config(&StorageConfig::Ephemeral).unwrap(),
        ),
        (
            "durable",
            FragmentService::from_config(&StorageConfig::durable_in_memory()).unwrap(),
        ),
    ]
}

fn png_1x1() -> Bytes {
    let img = RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 255]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    Bytes::from(out.into_inner())
}

fn text(content: &fragments_service::Content) -> String {
    String::from_utf8(content.bytes.to_vec()).unwrap()
}

/// Object store whose writes and deletes can be made to fail
#[derive(Default)]
struct FlakyObjectStore {
    inner: EphemeralObjectStore,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
}

#[async_trait]
impl ObjectStore for FlakyObjectStore {
    async fn put(&self, owner_id: &str, id: &str, data: Bytes) -> Result<(), StorageError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::io("injected put failure"));
        }
        self.inner.put(owner_id, id, data).await
    }

    async fn get(&self, owner_id: &str, id: &str) -> Result<Option<Bytes>, StorageError> {
        self.inner.get(owner_id, id).await
    }

    async fn delete(&self, owner_id: &str, id: &str) -> Result<(), StorageError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::io("injected delete failure"));
        }
        self.inner.delete(owner_id, id).await
    }
}

fn flaky_service() -> (FragmentService, Arc<FlakyObjectStore>) {
    let objects = Arc::new(FlakyObjectStore::default());
    let storage = Storage::new(Arc::new(EphemeralMetadataStore::new()), objects.clone());
    (FragmentService::new(storage), objects)
}

/// Metadata store whose writes can be made to fail
#[derive(Default)]
struct FlakyMetadataStore {
    inner: EphemeralMetadataStore,
    fail_puts: AtomicBool,
}

#[async_trait]
impl MetadataStore for FlakyMetadataStore {
    async fn put(&self, fragment: &Fragment) -> Result<(), StorageError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::io("injected metadata put failure"));
        }
        self.inner.put(fragment).await
    }

    async fn get(&self, owner_id: &str, id: &str) -> Result<Option<Fragment>, StorageError> {
        self.inner.get(owner_id, id).await
    }

    async fn query(&self, owner_id: &str, expand: bool) -> Result<Listing, StorageError> {
        self.inner.query(owner_id, expand).await
    }

    async fn delete(&self, owner_id: &str, id: &str) -> Result<(), StorageError> {
        self.inner.delete(owner_id, id).await
    }
}

fn flaky_metadata_service() -> (FragmentService, Arc<FlakyMetadataStore>, Arc<EphemeralObjectStore>) {
    let metadata = Arc::new(FlakyMetadataStore::default());
    let objects = Arc::new(EphemeralObjectStore::new());
    let storage = Storage::new(metadata.clone(), objects.clone());
    (FragmentService::new(storage), metadata, objects)
}

// ============================================================================
// Properties
// ============================================================================

#[tokio::test]
async fn test_round_trip() {
    for (name, service) in services() {
        let payload = Bytes::from_static(b"some \x00 exact \xff bytes");
        let created = service.create("owner-a", "text/plain", payload.clone()).await.unwrap();
        assert_eq!(created.size(), payload.len() as u64, "backend {name}");

        let read = service.read("owner-a", created.id()).await.unwrap();
        assert_eq!(read, created);

        let content = service.read_content("owner-a", created.id(), None).await.unwrap();
        assert_eq!(content.bytes, payload, "backend {name}");
        assert_eq!(content.mime_type, "text/plain");
    }
}

#[tokio::test]
async fn test_isolation() {
    for (name, service) in services() {
        let created = service
            .create("owner-a", "text/plain", Bytes::from_static(b"private"))
            .await
            .unwrap();
        let id = created.id();

        assert!(service.read("owner-b", id).await.unwrap_err().is_not_found(), "backend {name}");
        assert!(
            service.read_content("owner-b", id, None).await.unwrap_err().is_not_found()
        );
        assert!(
            service
                .read_content("owner-b", id, Some("html"))
                .await
                .unwrap_err()
                .is_not_found()
        );
        assert!(
            service
                .update("owner-b", id, "text/plain", Bytes::from_static(b"hijack"))
                .await
                .unwrap_err()
                .is_not_found()
        );
        assert!(service.delete("owner-b", id).await.unwrap_err().is_not_found());
        assert!(service.list("owner-b", false).await.unwrap().is_empty());

        // Owner A is unaffected
        let content = service.read_content("owner-a", id, None).await.unwrap();
        assert_eq!(&content.bytes[..], b"private");
    }
}

#[tokio::test]
async fn test_owner_ids_are_opaque() {
    for (name, service) in services() {
        let created = service
            .create(" alice", "text/plain", Bytes::from_static(b"secret"))
            .await
            .unwrap();
        let id = created.id();
        assert_eq!(created.owner_id(), " alice", "backend {name}");

        let read = service.read(" alice", id).await.unwrap();
        assert_eq!(read.owner_id(), " alice");
        let content = service.read_content(" alice", id, None).await.unwrap();
        assert_eq!(&content.bytes[..], b"secret");
        assert_eq!(service.list(" alice", false).await.unwrap().ids(), vec![id]);

        for other in ["alice", "alice ", "Alice", " Alice"] {
            assert!(
                service.read(other, id).await.unwrap_err().is_not_found(),
                "backend {name}, owner {other:?}"
            );
            assert!(service.read_content(other, id, None).await.unwrap_err().is_not_found());
            assert!(service.delete(other, id).await.unwrap_err().is_not_found());
            assert!(service.list(other, false).await.unwrap().is_empty());
        }

        service.delete(" alice", id).await.unwrap();
        assert!(service.read(" alice", id).await.unwrap_err().is_not_found());
    }
}

#[tokio::test]
async fn test_blank_owner_is_rejected() {
    for (name, service) in services() {
        for blank in ["", " ", "\t"] {
            let err = service
                .create(blank, "text/plain", Bytes::from_static(b"x"))
                .await
                .unwrap_err();
            assert!(matches!(err, FragmentError::Validation(_)), "backend {name}");
        }
    }
}

#[tokio::test]
async fn test_update_type_stability() {
    for (name, service) in services() {
        let created = service
            .create("owner-a", "text/plain", Bytes::from_static(b"original"))
            .await
            .unwrap();

        let err = service
            .update("owner-a", created.id(), "text/html", Bytes::from_static(b"<p>new</p>"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, FragmentError::TypeMismatch { ref expected, ref actual }
                if expected == "text/plain" && actual == "text/html"),
            "backend {name} returned {err:?}"
        );

        let content = service.read_content("owner-a", created.id(), None).await.unwrap();
        assert_eq!(&content.bytes[..], b"original");
        assert_eq!(service.read("owner-a", created.id()).await.unwrap(), created);
    }
}

#[tokio::test]
async fn test_update_refreshes_size_and_params() {
    for (name, service) in services() {
        let created = service
            .create("owner-a", "text/plain", Bytes::from_static(b"short"))
            .await
            .unwrap();

        let updated = service
            .update(
                "owner-a",
                created.id(),
                "text/plain; charset=utf-8",
                Bytes::from_static(b"a much longer body"),
            )
            .await
            .unwrap();
        assert_eq!(updated.size(), 18, "backend {name}");
        assert_eq!(updated.content_type(), "text/plain; charset=utf-8");
        assert_eq!(updated.created(), created.created());
        assert!(updated.updated() >= created.updated());

        let stored = service.read("owner-a", created.id()).await.unwrap();
        assert_eq!(stored, updated);
        let content = service.read_content("owner-a", created.id(), None).await.unwrap();
        assert_eq!(content.bytes.len() as u64, stored.size());
    }
}

#[tokio::test]
async fn test_update_missing_is_not_found() {
    for (_, service) in services() {
        let err = service
            .update("owner-a", "nope", "text/plain", Bytes::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}

#[tokio::test]
async fn test_delete_completeness() {
    for (name, service) in services() {
        let keep = service
            .create("owner-a", "text/csv", Bytes::from_static(b"a,b"))
            .await
            .unwrap();
        let gone = service
            .create("owner-a", "text/csv", Bytes::from_static(b"c,d"))
            .await
            .unwrap();

        service.delete("owner-a", gone.id()).await.unwrap();

        assert!(service.read("owner-a", gone.id()).await.unwrap_err().is_not_found());
        assert!(
            service
                .read_content("owner-a", gone.id(), None)
                .await
                .unwrap_err()
                .is_not_found()
        );
        let listing = service.list("owner-a", false).await.unwrap();
        assert_eq!(listing.ids(), vec![keep.id()], "backend {name}");
        assert!(service.storage().objects().get("owner-a", gone.id()).await.unwrap().is_none());

        assert!(service.delete("owner-a", gone.id()).await.unwrap_err().is_not_found());
    }
}

#[tokio::test]
async fn test_list_expand() {
    for (name, service) in services() {
        let a = service.create("owner-a", "text/plain", Bytes::new()).await.unwrap();
        let b = service.create("owner-a", "image/png", png_1x1()).await.unwrap();
        service.create("owner-b", "text/plain", Bytes::new()).await.unwrap();

        let Listing::Fragments(mut fragments) = service.list("owner-a", true).await.unwrap() else {
            panic!("expected expanded listing from backend {name}");
        };
        fragments.sort_by(|x, y| x.id().cmp(y.id()));
        let mut expected = vec![a, b];
        expected.sort_by(|x, y| x.id().cmp(y.id()));
        assert_eq!(fragments, expected, "backend {name}");
    }
}

#[tokio::test]
async fn test_formats() {
    for (_, service) in services() {
        let created = service.create("owner-a", "image/gif", Bytes::new()).await.unwrap();
        let formats = service.formats("owner-a", created.id()).await.unwrap();
        assert_eq!(formats, vec!["image/gif", "image/png", "image/jpeg", "image/webp"]);
        assert!(service.formats("owner-b", created.id()).await.unwrap_err().is_not_found());
    }
}

// ============================================================================
// Concrete Scenarios
// ============================================================================

#[tokio::test]
async fn test_hello_world_size() {
    for (_, service) in services() {
        let created = service
            .create("owner", "text/plain", Bytes::from_static(b"Hello, World!"))
            .await
            .unwrap();
        assert_eq!(created.size(), 13);
    }
}

#[tokio::test]
async fn test_json_to_yaml() {
    for (_, service) in services() {
        let created = service
            .create("owner", "application/json", Bytes::from_static(br#"{"name":"John"}"#))
            .await
            .unwrap();
        let content = service.read_content("owner", created.id(), Some("yaml")).await.unwrap();
        assert_eq!(content.mime_type, "application/yaml");
        assert!(text(&content).contains("name: John"));
    }
}

#[tokio::test]
async fn test_csv_to_json() {
    for (_, service) in services() {
        let created = service
            .create("owner", "text/csv", Bytes::from_static(b"name,age\nJohn,30"))
            .await
            .unwrap();
        let content = service.read_content("owner", created.id(), Some("json")).await.unwrap();
        assert_eq!(content.mime_type, "application/json");
        assert_eq!(text(&content), r#"[{"name":"John","age":"30"}]"#);

        let parsed: serde_json::Value = serde_json::from_slice(&content.bytes).unwrap();
        assert_eq!(parsed[0]["age"], "30");
    }
}

#[tokio::test]
async fn test_header_only_csv_to_json() {
    for (_, service) in services() {
        let created = service
            .create("owner", "text/csv", Bytes::from_static(b"name,age"))
            .await
            .unwrap();
        let content = service.read_content("owner", created.id(), Some("json")).await.unwrap();
        assert_eq!(text(&content), "[]");
    }
}

#[tokio::test]
async fn test_png_to_jpg() {
    for (_, service) in services() {
        let created = service.create("owner", "image/png", png_1x1()).await.unwrap();
        let content = service.read_content("owner", created.id(), Some("jpg")).await.unwrap();
        assert_eq!(content.mime_type, "image/jpeg");
        assert_eq!(&content.bytes[..2], &[0xFF, 0xD8]);
    }
}

#[tokio::test]
async fn test_text_to_png_is_unsupported() {
    for (_, service) in services() {
        let created = service
            .create("owner", "text/plain", Bytes::from_static(b"not an image"))
            .await
            .unwrap();
        let err = service
            .read_content("owner", created.id(), Some("png"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FragmentError::UnsupportedConversion { ref from, ref to }
                if from == "text/plain" && to == "image/png"
        ));
    }
}

#[tokio::test]
async fn test_unknown_extension_and_malformed_payload() {
    for (_, service) in services() {
        let created = service
            .create("owner", "application/json", Bytes::from_static(b"{broken"))
            .await
            .unwrap();

        let err = service.read_content("owner", created.id(), Some("exe")).await.unwrap_err();
        assert!(matches!(err, FragmentError::UnsupportedExtension(ref e) if e == "exe"));

        let err = service.read_content("owner", created.id(), Some("yml")).await.unwrap_err();
        assert!(matches!(err, FragmentError::ConversionFailed { .. }));
    }
}

// ============================================================================
// Partial Failures
// ============================================================================

#[tokio::test]
async fn test_partial_delete_reports_sides() {
    let (service, objects) = flaky_service();
    let created = service
        .create("owner", "text/plain", Bytes::from_static(b"x"))
        .await
        .unwrap();

    objects.fail_deletes.store(true, Ordering::SeqCst);
    let err = service.delete("owner", created.id()).await.unwrap_err();
    assert!(matches!(err, FragmentError::Storage(_)));
    let message = err.to_string();
    assert!(message.contains("metadata deleted: true"), "{message}");
    assert!(message.contains("content deleted: false"), "{message}");

    // Metadata is gone, content remains until a caller cleans it up
    assert!(service.read("owner", created.id()).await.unwrap_err().is_not_found());
    assert!(objects.inner.get("owner", created.id()).await.unwrap().is_some());
}

#[tokio::test]
async fn test_partial_create_reports_metadata_written() {
    let (service, objects) = flaky_service();
    objects.fail_puts.store(true, Ordering::SeqCst);

    let err = service
        .create("owner", "text/plain", Bytes::from_static(b"x"))
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("metadata written: true"), "{message}");
    assert!(message.contains("content written: false"), "{message}");

    // The orphaned record is visible and reading its content is inconsistent
    let listing = service.list("owner", true).await.unwrap();
    assert_eq!(listing.len(), 1);
    let id = listing.ids()[0].to_string();
    let err = service.read_content("owner", &id, None).await.unwrap_err();
    assert!(err.to_string().contains("metadata present without content"));
}

#[tokio::test]
async fn test_failed_update_write_leaves_metadata() {
    let (service, objects) = flaky_service();
    let created = service
        .create("owner", "text/plain", Bytes::from_static(b"x"))
        .await
        .unwrap();

    objects.fail_puts.store(true, Ordering::SeqCst);
    let err = service
        .update("owner", created.id(), "text/plain", Bytes::from_static(b"longer"))
        .await
        .unwrap_err();
    assert!(matches!(err, FragmentError::Storage(_)));
    assert_eq!(service.read("owner", created.id()).await.unwrap().size(), 1);
}

#[tokio::test]
async fn test_partial_update_reports_content_written() {
    let (service, metadata, objects) = flaky_metadata_service();
    let created = service
        .create("owner", "text/plain", Bytes::from_static(b"x"))
        .await
        .unwrap();

    metadata.fail_puts.store(true, Ordering::SeqCst);
    let err = service
        .update("owner", created.id(), "text/plain", Bytes::from_static(b"longer"))
        .await
        .unwrap_err();
    assert!(matches!(err, FragmentError::Storage(_)));
    let message = err.to_string();
    assert!(message.contains("metadata written: false"), "{message}");
    assert!(message.contains("content written: true"), "{message}");

    // New bytes landed under the old record
    let stored = objects.get("owner", created.id()).await.unwrap().unwrap();
    assert_eq!(&stored[..], b"longer");
    assert_eq!(service.read("owner", created.id()).await.unwrap().size(), 1);
}

#[tokio::test]
async fn test_concurrent_creates() {
    for (name, service) in services() {
        let mut handles = Vec::new();
        for i in 0..20 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service
                    .create("owner", "text/plain", Bytes::from(format!("body {i}")))
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(service.list("owner", false).await.unwrap().len(), 20, "backend {name}");
    }
}

mod support;

use std::sync::Arc;
use std::time::Duration;
use support::{comment_fields, png_bytes, png_file, tracing_init, MockAssetStore};
use tourdesk::asset_store::{AssetNamespace, AssetStoreManager};
use tourdesk::listing::ListingController;
use tourdesk::record::{FieldValue, COMMENT_SCHEMA};
use tourdesk::record_store::MemoryRecordStore;
use tourdesk::upload::{UploadCoordinator, UploadEvent, UploadState};
use tourdesk::validation::{UploadFile, ValidationError, MAX_UPLOAD_BYTES};

fn coordinator(store: &Arc<MockAssetStore>) -> UploadCoordinator {
    UploadCoordinator::new(AssetStoreManager::from_storage(store.clone()))
}

#[tokio::test]
async fn test_oversize_file_never_reaches_store() {
    tracing_init();
    let store = Arc::new(MockAssetStore::new());
    let mut form = coordinator(&store);

    let file = UploadFile::new("big.png", png_bytes(MAX_UPLOAD_BYTES));
    let err = form
        .start("avatar", AssetNamespace::Avatars, file)
        .unwrap_err();

    assert!(matches!(err, ValidationError::TooLarge { .. }));
    assert_eq!(form.state("avatar"), UploadState::Idle);
    assert!(form.draft().is_empty());
    assert!(form.next_event().await.is_none());
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_non_image_is_rejected() {
    tracing_init();
    let store = Arc::new(MockAssetStore::new());
    let mut form = coordinator(&store);

    let gif = UploadFile::new("anim.gif", b"GIF89a-not-allowed".to_vec());
    assert!(matches!(
        form.start("avatar", AssetNamespace::Avatars, gif),
        Err(ValidationError::UnsupportedType(_))
    ));

    // Declared PNG, but the bytes are plain text
    let disguised = UploadFile::new("notes.png", b"just some text".to_vec());
    assert!(matches!(
        form.start("avatar", AssetNamespace::Avatars, disguised),
        Err(ValidationError::UnsupportedType(_))
    ));
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_successful_upload_binds_url() {
    tracing_init();
    let store = Arc::new(MockAssetStore::new());
    let mut form = coordinator(&store);
    let mut events = form.subscribe();

    let task = form
        .start("avatar", AssetNamespace::Avatars, png_file("anna.png"))
        .unwrap();
    assert_eq!(form.state("avatar"), UploadState::Uploading { task });
    assert!(form.is_uploading());

    form.wait_idle().await;

    let url = MockAssetStore::url("avatars/anna.png");
    assert_eq!(
        form.state("avatar"),
        UploadState::Succeeded {
            task,
            url: url.clone()
        }
    );
    assert_eq!(form.draft().get("avatar"), Some(&FieldValue::text(url.clone())));

    assert!(matches!(events.try_recv().unwrap(), UploadEvent::Started { .. }));
    assert_eq!(
        events.try_recv().unwrap(),
        UploadEvent::Succeeded {
            field: "avatar".into(),
            task,
            url
        }
    );
}

#[tokio::test]
async fn test_late_result_of_replaced_upload_is_dropped() {
    tracing_init();
    let store = Arc::new(MockAssetStore::new());
    store.hold("avatars/first.png");
    store.hold("avatars/second.png");
    let mut form = coordinator(&store);

    let first = form
        .start("avatar", AssetNamespace::Avatars, png_file("first.png"))
        .unwrap();
    let second = form
        .start("avatar", AssetNamespace::Avatars, png_file("second.png"))
        .unwrap();

    store.release("avatars/second.png");
    let event = form.next_event().await.unwrap();
    assert!(matches!(event, UploadEvent::Succeeded { task, .. } if task == second));

    store.release("avatars/first.png");
    let event = form.next_event().await.unwrap();
    assert_eq!(
        event,
        UploadEvent::Superseded {
            field: "avatar".into(),
            task: first
        }
    );

    // The replaced blob is stored, but the draft keeps the newer URL
    assert!(store.contains("avatars/first.png"));
    assert_eq!(
        form.draft().get("avatar"),
        Some(&FieldValue::text(MockAssetStore::url("avatars/second.png")))
    );
}

#[tokio::test]
async fn test_early_result_of_replaced_upload_is_dropped() {
    tracing_init();
    let store = Arc::new(MockAssetStore::new());
    store.hold("avatars/first.png");
    store.hold("avatars/second.png");
    let mut form = coordinator(&store);

    let first = form
        .start("avatar", AssetNamespace::Avatars, png_file("first.png"))
        .unwrap();
    let second = form
        .start("avatar", AssetNamespace::Avatars, png_file("second.png"))
        .unwrap();

    store.release("avatars/first.png");
    assert_eq!(
        form.next_event().await.unwrap(),
        UploadEvent::Superseded {
            field: "avatar".into(),
            task: first
        }
    );
    assert_eq!(form.state("avatar"), UploadState::Uploading { task: second });
    assert!(form.draft().get("avatar").is_none());

    store.release("avatars/second.png");
    form.wait_idle().await;
    assert!(matches!(
        form.state("avatar"),
        UploadState::Succeeded { task, .. } if task == second
    ));
}

#[tokio::test]
async fn test_fields_upload_independently() {
    tracing_init();
    let store = Arc::new(MockAssetStore::new());
    let mut form = coordinator(&store);

    form.start("image", AssetNamespace::TourImages, png_file("bay.png"))
        .unwrap();
    form.start("avatar", AssetNamespace::Avatars, png_file("me.png"))
        .unwrap();
    form.wait_idle().await;

    assert_eq!(
        form.draft().get("image"),
        Some(&FieldValue::text(MockAssetStore::url("tour-images/bay.png")))
    );
    assert_eq!(
        form.draft().get("avatar"),
        Some(&FieldValue::text(MockAssetStore::url("avatars/me.png")))
    );
}

#[tokio::test]
async fn test_failed_upload_keeps_previous_value() {
    tracing_init();
    let store = Arc::new(MockAssetStore::failing());
    let mut draft = comment_fields("Anna", 5.0);
    draft.insert("avatar".into(), FieldValue::text("https://cdn/old.png"));
    let mut form =
        UploadCoordinator::for_draft(AssetStoreManager::from_storage(store.clone()), draft);

    let task = form
        .start("avatar", AssetNamespace::Avatars, png_file("new.png"))
        .unwrap();
    let events = form.wait_idle().await;

    assert!(matches!(events.as_slice(), [UploadEvent::Failed { .. }]));
    assert!(matches!(form.state("avatar"), UploadState::Failed { task: t, .. } if t == task));
    assert_eq!(
        form.draft().get("avatar"),
        Some(&FieldValue::text("https://cdn/old.png"))
    );
}

#[tokio::test]
async fn test_upload_lands_after_form_is_closed() {
    tracing_init();
    let store = Arc::new(MockAssetStore::new());
    store.hold("avatars/late.png");
    let mut form = coordinator(&store);

    form.start("avatar", AssetNamespace::Avatars, png_file("late.png"))
        .unwrap();
    drop(form);
    store.release("avatars/late.png");

    tokio::time::timeout(Duration::from_secs(5), async {
        while !store.contains("avatars/late.png") {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("upload should complete without the form");
}

#[tokio::test]
async fn test_uploaded_url_is_written_with_the_record() {
    tracing_init();
    let assets = Arc::new(MockAssetStore::new());
    let records = Arc::new(MemoryRecordStore::new());
    let mut listing = ListingController::new(records.clone(), &COMMENT_SCHEMA);
    let mut form =
        UploadCoordinator::for_draft(AssetStoreManager::from_storage(assets.clone()), comment_fields("Anna", 5.0));

    form.start("avatar", AssetNamespace::Avatars, png_file("anna.png"))
        .unwrap();
    form.wait_idle().await;

    let id = listing.add(form.into_draft()).await.unwrap();
    let record = listing.find(&id).unwrap();
    assert_eq!(
        record.text("avatar"),
        Some(MockAssetStore::url("avatars/anna.png").as_str())
    );
}

use std::sync::{Arc, Mutex};

use gallery_ingest_core::contract::{
    AccessToken, ImageForCreation, MockGalleryApi, UploadStatus,
};
use gallery_ingest_core::upload::upload_all;
use gallery_ingest_core::GalleryError;

fn images(titles: &[&str]) -> Vec<ImageForCreation> {
    titles
        .iter()
        .map(|t| ImageForCreation::new(*t, "Test Category", t.as_bytes().to_vec()).unwrap())
        .collect()
}

fn token() -> AccessToken {
    AccessToken::new("token-abc").unwrap()
}

#[tokio::test]
async fn every_image_is_attempted_once_in_order() {
    let posted = Arc::new(Mutex::new(Vec::new()));
    let seen = posted.clone();

    let mut gallery = MockGalleryApi::new();
    gallery
        .expect_create_image()
        .times(4)
        .returning(move |token, image| {
            assert_eq!(token.secret(), "token-abc");
            seen.lock().unwrap().push(image.title().to_string());
            Ok(201)
        });

    let report = upload_all(&gallery, &token(), images(&["one", "two", "three", "four"]))
        .await
        .unwrap();

    assert_eq!(report.attempted(), 4);
    assert_eq!(report.succeeded(), 4);
    assert_eq!(*posted.lock().unwrap(), vec!["one", "two", "three", "four"]);
}

#[tokio::test]
async fn unauthorized_mid_sequence_does_not_stop_later_uploads() {
    let mut gallery = MockGalleryApi::new();
    gallery
        .expect_create_image()
        .times(3)
        .returning(|_, image| match image.title() {
            "second" => Err(GalleryError::Api {
                status: 401,
                body: String::new(),
            }),
            _ => Ok(201),
        });

    let report = upload_all(&gallery, &token(), images(&["first", "second", "third"]))
        .await
        .unwrap();

    assert_eq!(report.attempted(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.outcomes[0].status, UploadStatus::Created(201));
    match &report.outcomes[1].status {
        UploadStatus::Failed { status, .. } => assert_eq!(*status, Some(401)),
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(report.outcomes[2].is_success());
}

#[tokio::test]
async fn attempts_equal_input_length_even_when_all_fail() {
    for n in 1..=5usize {
        let mut gallery = MockGalleryApi::new();
        gallery.expect_create_image().times(n).returning(|_, _| {
            Err(GalleryError::Api {
                status: 500,
                body: "boom".into(),
            })
        });

        let titles: Vec<String> = (0..n).map(|i| format!("img-{i}")).collect();
        let input: Vec<_> = titles
            .iter()
            .map(|t| ImageForCreation::new(t.as_str(), "c", vec![1]).unwrap())
            .collect();

        let report = upload_all(&gallery, &token(), input).await.unwrap();
        assert_eq!(report.attempted(), n);
        assert_eq!(report.failed(), n);
    }
}

#[tokio::test]
async fn empty_input_makes_no_calls() {
    let mut gallery = MockGalleryApi::new();
    gallery.expect_create_image().times(0);

    let report = upload_all(&gallery, &token(), Vec::new()).await.unwrap();
    assert_eq!(report.attempted(), 0);
}

#[tokio::test]
async fn unreachable_gallery_aborts_the_loop() {
    let mut gallery = MockGalleryApi::new();
    gallery
        .expect_create_image()
        .times(1)
        .returning(|_, _| {
            Err(GalleryError::Transport {
                url: "http://localhost:8050/api/images".into(),
                reason: "connection refused".into(),
            })
        });

    let err = upload_all(&gallery, &token(), images(&["a", "b", "c"]))
        .await
        .unwrap_err();
    assert!(matches!(err, GalleryError::Transport { .. }));
}

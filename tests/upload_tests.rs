use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};

mod common;
use common::*;

#[tokio::test]
async fn test_upload_forwards_file_to_storage() {
    let app = setup_test_app();
    let image = create_test_image();
    let body = multipart_body(&[
        Part::Text { name: "caption", value: "ignored" },
        Part::File {
            name: "file",
            filename: "holiday photo.jpg",
            content_type: "image/png",
            data: &image,
        },
    ]);

    let (status, json) = app.send(upload_request(body)).await;

    assert_eq!(status, StatusCode::OK, "unexpected body: {}", json);
    assert_eq!(json["message"], "File uploaded successfully");
    assert_eq!(
        json["url"],
        "https://res.cloudinary.test/image/upload/blog_uploads/holiday_photo.png"
    );
    assert_eq!(json["public_id"], "blog_uploads/holiday_photo");

    let uploads = app.media.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].data, image);
    assert_eq!(uploads[0].filename, "holiday photo.jpg");
    assert_eq!(uploads[0].content_type.as_deref(), Some("image/png"));
}

#[tokio::test]
async fn test_upload_rejects_text_field_named_file() {
    let app = setup_test_app();
    let body = multipart_body(&[Part::Text { name: "file", value: "not really a file" }]);

    let (status, json) = app.send(upload_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_code"], "VALIDATION_FAILED");
    assert!(app.media.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_requires_file_field() {
    let app = setup_test_app();
    let image = create_test_image();
    let body = multipart_body(&[Part::File {
        name: "image",
        filename: "a.png",
        content_type: "image/png",
        data: &image,
    }]);

    let (status, json) = app.send(upload_request(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("'file'"));
}

#[tokio::test]
async fn test_upload_rejects_oversized_payload() {
    let app = setup_test_app();
    let large = vec![0xAB; TEST_MAX_FILE_SIZE * 4];
    let body = multipart_body(&[Part::File {
        name: "file",
        filename: "big.png",
        content_type: "image/png",
        data: &large,
    }]);

    let (status, json) = app.send(upload_request(body)).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json["error_code"], "PAYLOAD_TOO_LARGE");
    assert!(app.media.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_rejects_non_image_content_type() {
    let app = setup_test_app();
    let body = multipart_body(&[Part::File {
        name: "file",
        filename: "notes.txt",
        content_type: "text/plain",
        data: b"hello",
    }]);

    let (status, _) = app.send(upload_request(body)).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_upload_rejects_empty_and_duplicate_files() {
    let app = setup_test_app();
    let image = create_test_image();

    let empty = multipart_body(&[Part::File {
        name: "file",
        filename: "empty.png",
        content_type: "image/png",
        data: &[],
    }]);
    let (status, _) = app.send(upload_request(empty)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let file = Part::File {
        name: "file",
        filename: "a.png",
        content_type: "image/png",
        data: &image,
    };
    let second = Part::File {
        name: "file",
        filename: "b.png",
        content_type: "image/png",
        data: &image,
    };
    let (status, _) = app.send(upload_request(multipart_body(&[file, second]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_provider_rejection_is_client_error() {
    let app = setup_test_app();
    let image = create_test_image();
    let body = multipart_body(&[Part::File {
        name: "file",
        filename: "reject-me.png",
        content_type: "image/png",
        data: &image,
    }]);

    let (status, json) = app.send(upload_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_code"], "UPLOAD_REJECTED");
    assert_eq!(json["details"], "Invalid image file");
}

#[tokio::test]
async fn test_upload_requires_multipart_body() {
    let app = setup_test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/upload")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let (status, json) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_code"], "VALIDATION_FAILED");
}

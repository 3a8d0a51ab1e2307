use serde_json::json;

use crate::common::{TestApp, UploadFile, routes};

fn sample_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[tokio::test]
async fn document_upload_serve_delete_lifecycle() {
    let app = TestApp::spawn().await;
    let token = app.admin_token();

    let res = app
        .upload(
            UploadFile::new("doc.pdf", "application/pdf", b"0123456789".to_vec()),
            Some("T"),
            Some("D"),
            Some("Th"),
            &token,
        )
        .await;
    assert_eq!(res.status, 201, "upload failed: {}", res.text);
    assert_eq!(res.body["category"], "document");
    assert_eq!(res.body["size_bytes"], 10);
    assert_eq!(res.body["original_name"], "doc.pdf");
    assert_eq!(res.body["owner_id"], 1);
    assert_eq!(res.body["streamable"], false);
    let id = res.id();

    assert_eq!(app.stored_files().len(), 1);
    assert!(app.staged_files().is_empty());

    let content = app.fetch_content(&routes::asset_serve(id), None, &token).await;
    assert_eq!(content.status, 200);
    assert_eq!(content.header("content-type"), Some("application/pdf"));
    assert_eq!(content.header("content-length"), Some("10"));
    assert!(
        content
            .header("content-disposition")
            .unwrap()
            .starts_with("inline; filename=\"doc.pdf\"")
    );
    assert_eq!(content.bytes, b"0123456789");

    let res = app.delete_with_token(&routes::asset(id), &token).await;
    assert_eq!(res.status, 200, "delete failed: {}", res.text);
    assert_eq!(res.body["id"], id);
    assert_eq!(res.body["file_removed"], true);
    assert!(res.body["warning"].is_null());
    assert!(app.stored_files().is_empty());

    let content = app.fetch_content(&routes::asset_serve(id), None, &token).await;
    assert_eq!(content.status, 404);
    let res = app.get_with_token(&routes::asset(id), &token).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn video_serves_byte_ranges() {
    let app = TestApp::spawn().await;
    let token = app.admin_token();
    let data = sample_bytes(1000);
    let id = app
        .create_asset(UploadFile::new("clip.mp4", "video/mp4", data.clone()), "Clip", "Film")
        .await;

    let full = app.fetch_content(&routes::asset_serve(id), None, &token).await;
    assert_eq!(full.status, 200);
    assert_eq!(full.header("accept-ranges"), Some("bytes"));
    assert_eq!(full.header("content-type"), Some("video/mp4"));
    assert_eq!(full.bytes, data);

    let head = app
        .fetch_content(&routes::asset_serve(id), Some("bytes=0-99"), &token)
        .await;
    assert_eq!(head.status, 206);
    assert_eq!(head.header("content-range"), Some("bytes 0-99/1000"));
    assert_eq!(head.header("content-length"), Some("100"));
    assert_eq!(head.bytes, &data[..100]);

    let tail = app
        .fetch_content(&routes::asset_serve(id), Some("bytes=900-"), &token)
        .await;
    assert_eq!(tail.status, 206);
    assert_eq!(tail.header("content-range"), Some("bytes 900-999/1000"));
    assert_eq!(tail.bytes, &data[900..]);
}

#[tokio::test]
async fn unsatisfiable_range_reports_total_size() {
    let app = TestApp::spawn().await;
    let token = app.admin_token();
    let id = app
        .create_asset(
            UploadFile::new("song.mp3", "audio/mpeg", sample_bytes(64)),
            "Song",
            "Music",
        )
        .await;

    for range in ["bytes=64-", "bytes=-10", "bytes=10-5"] {
        let res = app
            .fetch_content(&routes::asset_serve(id), Some(range), &token)
            .await;
        assert_eq!(res.status, 416, "range {range}");
        assert_eq!(res.header("content-range"), Some("bytes */64"), "range {range}");
    }
}

#[tokio::test]
async fn documents_ignore_range_header() {
    let app = TestApp::spawn().await;
    let token = app.admin_token();
    let id = app
        .create_asset(
            UploadFile::new("notes.pdf", "application/pdf", b"plain text notes".to_vec()),
            "Notes",
            "Study",
        )
        .await;

    let res = app
        .fetch_content(&routes::asset_serve(id), Some("bytes=0-3"), &token)
        .await;
    assert_eq!(res.status, 200);
    assert!(res.header("accept-ranges").is_none());
    assert_eq!(res.bytes, b"plain text notes");
}

#[tokio::test]
async fn download_is_an_attachment() {
    let app = TestApp::spawn().await;
    let token = app.admin_token();
    let id = app
        .create_asset(
            UploadFile::new("cover art.png", "image/png", sample_bytes(32)),
            "Cover",
            "Art",
        )
        .await;

    let res = app
        .fetch_content(&routes::asset_download(id), None, &token)
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.header("content-type"), Some("application/octet-stream"));
    assert_eq!(
        res.header("content-disposition"),
        Some("attachment; filename=\"cover art.png\"; filename*=UTF-8''cover%20art.png")
    );
    assert_eq!(res.bytes, sample_bytes(32));
}

#[tokio::test]
async fn upload_requires_admin() {
    let app = TestApp::spawn().await;

    let res = app
        .upload(
            UploadFile::new("doc.pdf", "application/pdf", b"data".to_vec()),
            Some("T"),
            Some("D"),
            Some("Th"),
            &app.user_token(),
        )
        .await;
    assert_eq!(res.status, 403);
    assert_eq!(res.body["code"], "PERMISSION_DENIED");
    assert!(app.stored_files().is_empty());
    assert!(app.staged_files().is_empty());
}

#[tokio::test]
async fn requests_without_token_are_rejected() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::ASSETS).await;
    assert_eq!(res.status, 401);
    assert_eq!(res.body["code"], "TOKEN_MISSING");

    let res = app.get_with_token(routes::ASSETS, "not-a-jwt").await;
    assert_eq!(res.status, 401);
    assert_eq!(res.body["code"], "TOKEN_INVALID");
}

#[tokio::test]
async fn unsupported_type_leaves_no_trace() {
    let app = TestApp::spawn().await;
    let token = app.admin_token();

    let res = app
        .upload(
            UploadFile::new("page.html", "text/html", b"<html></html>".to_vec()),
            Some("Page"),
            Some("A web page"),
            Some("Web"),
            &token,
        )
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "UNSUPPORTED_TYPE");
    assert!(res.body["message"].as_str().unwrap().contains("text/html"));

    assert!(app.stored_files().is_empty());
    assert!(app.staged_files().is_empty());
    let list = app.get_with_token(routes::ASSETS, &token).await;
    assert_eq!(list.body["pagination"]["total"], 0);
}

#[tokio::test]
async fn missing_content_type_is_guessed_from_filename() {
    let app = TestApp::spawn().await;
    let token = app.admin_token();

    let res = app
        .upload(
            UploadFile {
                name: "lecture.mp4",
                mime: None,
                bytes: sample_bytes(16),
            },
            Some("Lecture"),
            Some("Week one"),
            Some("Courses"),
            &token,
        )
        .await;
    assert_eq!(res.status, 201, "upload failed: {}", res.text);
    assert_eq!(res.body["category"], "video");
    assert_eq!(res.body["streamable"], true);
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let app = TestApp::spawn_with_limit(1024).await;
    let token = app.admin_token();

    let res = app
        .upload(
            UploadFile::new("big.pdf", "application/pdf", sample_bytes(4096)),
            Some("Big"),
            Some("Too big"),
            Some("Docs"),
            &token,
        )
        .await;
    assert_eq!(res.status, 413);
    assert_eq!(res.body["code"], "PAYLOAD_TOO_LARGE");
    assert!(app.stored_files().is_empty());
    assert!(app.staged_files().is_empty());
}

#[tokio::test]
async fn upload_validates_descriptive_fields() {
    let app = TestApp::spawn().await;
    let token = app.admin_token();

    let res = app
        .upload(
            UploadFile::new("doc.pdf", "application/pdf", b"data".to_vec()),
            None,
            Some("No title"),
            Some("Docs"),
            &token,
        )
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");

    let long_theme = "x".repeat(51);
    let res = app
        .upload(
            UploadFile::new("doc.pdf", "application/pdf", b"data".to_vec()),
            Some("Title"),
            Some("Description"),
            Some(&long_theme),
            &token,
        )
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");

    assert!(app.stored_files().is_empty());
    assert!(app.staged_files().is_empty());
}

#[tokio::test]
async fn patch_updates_descriptive_fields_only() {
    let app = TestApp::spawn().await;
    let token = app.admin_token();
    let id = app
        .create_asset(
            UploadFile::new("song.mp3", "audio/mpeg", sample_bytes(8)),
            "Song",
            "Music",
        )
        .await;

    let res = app
        .patch_with_token(
            &routes::asset(id),
            &json!({ "title": "Renamed", "theme": "Concerts" }),
            &token,
        )
        .await;
    assert_eq!(res.status, 200, "patch failed: {}", res.text);
    assert_eq!(res.body["title"], "Renamed");
    assert_eq!(res.body["theme"], "Concerts");
    assert_eq!(res.body["description"], "Uploaded by a test");
    assert_eq!(res.body["category"], "audio");
    assert_eq!(res.body["size_bytes"], 8);

    let res = app
        .patch_with_token(&routes::asset(id), &json!({ "title": "" }), &token)
        .await;
    assert_eq!(res.status, 400);

    let res = app
        .patch_with_token(&routes::asset(id), &json!({ "title": "x" }), &app.user_token())
        .await;
    assert_eq!(res.status, 403);

    let res = app
        .patch_with_token(&routes::asset(id + 100), &json!({ "title": "x" }), &token)
        .await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn list_filters_and_stats_summarize() {
    let app = TestApp::spawn().await;
    let token = app.admin_token();

    app.create_asset(
        UploadFile::new("a.mp3", "audio/mpeg", sample_bytes(4)),
        "Autumn Jazz",
        "Jazz",
    )
    .await;
    app.create_asset(
        UploadFile::new("b.mp3", "audio/mpeg", sample_bytes(4)),
        "Blue Notes",
        "Jazz",
    )
    .await;
    app.create_asset(
        UploadFile::new("c.pdf", "application/pdf", sample_bytes(4)),
        "Chord Charts",
        "Theory",
    )
    .await;

    let res = app
        .get_with_token(&format!("{}?category=audio", routes::ASSETS), &token)
        .await;
    assert_eq!(res.status, 200, "list failed: {}", res.text);
    assert_eq!(res.body["pagination"]["total"], 2);

    let res = app
        .get_with_token(&format!("{}?search=CHORD", routes::ASSETS), &token)
        .await;
    assert_eq!(res.body["pagination"]["total"], 1);
    assert_eq!(res.body["data"][0]["title"], "Chord Charts");

    let res = app
        .get_with_token(
            &format!("{}?sort_by=title&sort_order=asc&per_page=2", routes::ASSETS),
            &token,
        )
        .await;
    assert_eq!(res.body["data"][0]["title"], "Autumn Jazz");
    assert_eq!(res.body["data"].as_array().unwrap().len(), 2);
    assert_eq!(res.body["pagination"]["total_pages"], 2);

    let res = app
        .get_with_token(&format!("{}?sort_by=owner", routes::ASSETS), &token)
        .await;
    assert_eq!(res.status, 400);

    let res = app
        .get_with_token(&format!("{}?page=18446744073709551615", routes::ASSETS), &token)
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");

    let res = app
        .get_with_token(&format!("{}?page=1000", routes::ASSETS), &token)
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["pagination"]["total"], 3);
    assert!(res.body["data"].as_array().unwrap().is_empty());

    let stats = app.get_with_token(routes::ASSET_STATS, &app.user_token()).await;
    assert_eq!(stats.status, 200, "stats failed: {}", stats.text);
    assert_eq!(stats.body["total"], 3);
    assert_eq!(stats.body["top_themes"][0]["theme"], "Jazz");
    assert_eq!(stats.body["top_themes"][0]["count"], 2);
    let audio = stats.body["by_category"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["category"] == "audio")
        .unwrap();
    assert_eq!(audio["count"], 2);
}

#[tokio::test]
async fn delete_tolerates_missing_file() {
    let app = TestApp::spawn().await;
    let token = app.admin_token();
    let id = app
        .create_asset(
            UploadFile::new("scan.jpg", "image/jpeg", sample_bytes(10)),
            "Scan",
            "Archive",
        )
        .await;

    for path in app.stored_files() {
        std::fs::remove_file(path).unwrap();
    }

    let content = app.fetch_content(&routes::asset_serve(id), None, &token).await;
    assert_eq!(content.status, 404);

    let res = app.delete_with_token(&routes::asset(id), &token).await;
    assert_eq!(res.status, 200, "delete failed: {}", res.text);
    assert_eq!(res.body["file_removed"], false);
    assert!(res.body["warning"].as_str().unwrap().contains("already missing"));

    let res = app.get_with_token(&routes::asset(id), &token).await;
    assert_eq!(res.status, 404);
}

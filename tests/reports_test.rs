mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{Part, TestApp};

#[tokio::test]
async fn test_create_report_starts_pending() {
    let app = TestApp::new();
    let (token, user_id) = app.register_user("Anu", "anu@example.com").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/userPost",
            Some(&token),
            Some(json!({
                "title": "Pothole",
                "description": "Large pothole near the school gate",
                "category": "Roads",
                "location": "Main St",
                "wardNo": 3,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Report created successfully");

    let report = &body["report"];
    assert_eq!(report["status"], "Pending");
    assert_eq!(report["likes"], json!([]));
    assert_eq!(report["dislikes"], json!([]));
    assert_eq!(report["upvotes"], json!([]));
    assert_eq!(report["createdBy"]["id"], user_id.as_str());
    assert_eq!(report["createdBy"]["name"], "Anu");
    assert_eq!(report["wardNo"], 3);
}

#[tokio::test]
async fn test_create_report_validation() {
    let app = TestApp::new();
    let (token, _) = app.register_user("Anu", "anu@example.com").await;

    let (status, body) = app
        .request(Method::POST, "/userPost", Some(&token), Some(json!({ "title": "x" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "All fields are required");

    let (status, body) = app
        .request(
            Method::POST,
            "/userPost",
            Some(&token),
            Some(json!({
                "title": "x",
                "description": "y",
                "category": "Parks",
                "location": "z",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid category");

    assert_eq!(app.count("reports"), 0);
}

#[tokio::test]
async fn test_member_can_file_report() {
    let app = TestApp::new();
    let (member_token, member_id) = app.register_member("Lakshmi", "lakshmi@example.com").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/userPost",
            Some(&member_token),
            Some(json!({
                "title": "Pipe burst",
                "description": "Water leaking near the ward office",
                "category": "Water",
                "location": "Ward office",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["report"]["createdBy"]["id"], member_id.as_str());
    assert_eq!(body["report"]["createdBy"]["name"], "Lakshmi");

    let (_, listed) = app
        .get(&format!("/userPost/user/{}", member_id), Some(&member_token))
        .await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_report_with_media_uploads() {
    let app = TestApp::new();
    let (token, _) = app.register_user("Anu", "anu@example.com").await;

    let (status, body) = app
        .multipart(
            Method::POST,
            "/userPost",
            &token,
            &[
                ("title", "Broken streetlight"),
                ("description", "Dark at night"),
                ("category", "Electricity"),
                ("location", "Temple road"),
            ],
            &[
                Part { field: "media", file_name: "photo.JPG", data: b"jpegdata" },
                Part { field: "media", file_name: "clip.mp4", data: b"mp4data" },
            ],
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let media = body["report"]["media"].as_array().unwrap();
    assert_eq!(media.len(), 2);
    let url = media[0].as_str().unwrap();
    assert!(url.starts_with("http://test.local/media/reports/"));
    assert!(url.ends_with(".jpg"));

    let path = url.trim_start_matches("http://test.local");
    let (status, _) = app.get(path, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_disallowed_attachment_rejected_and_nothing_stored() {
    let app = TestApp::new();
    let (token, _) = app.register_user("Anu", "anu@example.com").await;

    let (status, body) = app
        .multipart(
            Method::POST,
            "/userPost",
            &token,
            &[
                ("title", "t"),
                ("description", "d"),
                ("category", "Waste"),
                ("location", "l"),
            ],
            &[
                Part { field: "media", file_name: "ok.png", data: b"png" },
                Part { field: "media", file_name: "bad.exe", data: b"MZ" },
            ],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Unsupported file type");
    assert_eq!(app.count("reports"), 0);
    assert!(!app.dir.path().join("media/reports").exists());
}

#[tokio::test]
async fn test_like_toggles_off_when_repeated() {
    let app = TestApp::new();
    let (token, _) = app.register_user("Anu", "anu@example.com").await;
    let (member_token, member_id) = app.register_member("Lakshmi", "lakshmi@example.com").await;
    let report_id = app.create_report(&token, "Pothole").await;
    let uri = format!("/userPost/{}/like", report_id);

    let (status, body) = app.request(Method::PATCH, &uri, Some(&member_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Like updated");
    assert_eq!(body["updatedPost"]["likes"], json!([member_id]));

    let (_, body) = app.request(Method::PATCH, &uri, Some(&member_token), None).await;
    assert_eq!(body["updatedPost"]["likes"], json!([]));
}

#[tokio::test]
async fn test_votes_are_mutually_exclusive() {
    let app = TestApp::new();
    let (token, user_id) = app.register_user("Anu", "anu@example.com").await;
    let report_id = app.create_report(&token, "Pothole").await;

    app.request(
        Method::PATCH,
        &format!("/userPost/{}/like", report_id),
        Some(&token),
        None,
    )
    .await;
    let (_, body) = app
        .request(
            Method::PATCH,
            &format!("/userPost/{}/dislike", report_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(body["message"], "Dislike updated");
    assert_eq!(body["updatedPost"]["likes"], json!([]));
    assert_eq!(body["updatedPost"]["dislikes"], json!([user_id]));

    let (_, body) = app
        .request(
            Method::PATCH,
            &format!("/userPost/{}/upvote", report_id),
            Some(&token),
            None,
        )
        .await;
    let post = &body["updatedPost"];
    assert_eq!(post["likes"], json!([]));
    assert_eq!(post["dislikes"], json!([]));
    assert_eq!(post["upvotes"], json!([user_id]));
}

#[tokio::test]
async fn test_vote_on_missing_report() {
    let app = TestApp::new();
    let (token, _) = app.register_user("Anu", "anu@example.com").await;
    let (status, body) = app
        .request(Method::PATCH, "/userPost/missing/upvote", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Report not found");
}

#[tokio::test]
async fn test_status_update_rejects_unknown_value() {
    let app = TestApp::new();
    let (token, _) = app.register_user("Anu", "anu@example.com").await;
    let report_id = app.create_report(&token, "Pothole").await;
    let uri = format!("/userPost/{}/status", report_id);

    let (status, body) = app
        .request(Method::PATCH, &uri, Some(&token), Some(json!({ "status": "Closed" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid status value");

    let (status, body) = app
        .request(Method::PATCH, &uri, Some(&token), Some(json!({ "status": 3 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid status value");

    let (status, body) = app.request(Method::PATCH, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (_, body) = app.get(&format!("/userPost/{}", report_id), None).await;
    assert_eq!(body["status"], "Pending");

    let (status, body) = app
        .request(Method::PATCH, &uri, Some(&token), Some(json!({ "status": "Solved" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Status updated successfully");
    assert_eq!(body["report"]["status"], "Solved");

    let (_, body) = app
        .request(Method::PATCH, &uri, Some(&token), Some(json!({ "status": "Pending" })))
        .await;
    assert_eq!(body["report"]["status"], "Pending");
}

#[tokio::test]
async fn test_update_report_merges_fields() {
    let app = TestApp::new();
    let (token, _) = app.register_user("Anu", "anu@example.com").await;
    let report_id = app.create_report(&token, "Pothole").await;

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/userPost/{}", report_id),
            Some(&token),
            Some(json!({ "title": "Deep pothole", "status": "Inprogress" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report"]["title"], "Deep pothole");
    assert_eq!(body["report"]["status"], "Inprogress");
    assert_eq!(body["report"]["location"], "Main St");

    let (other_token, _) = app.register_user("Bina", "bina@example.com").await;
    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/userPost/{}", report_id),
            Some(&other_token),
            Some(json!({ "title": "Hijacked" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_delete_report_owner_or_admin() {
    let app = TestApp::new();
    let (token, _) = app.register_user("Anu", "anu@example.com").await;
    let (other_token, _) = app.register_user("Bina", "bina@example.com").await;
    let (admin_token, _) = app.register_admin("Root", "root@example.com").await;
    let first = app.create_report(&token, "One").await;
    let second = app.create_report(&token, "Two").await;

    app.request(
        Method::POST,
        "/postcomment",
        Some(&other_token),
        Some(json!({ "text": "Same here", "issueId": first })),
    )
    .await;

    let (status, _) = app
        .request(Method::DELETE, &format!("/userPost/{}", first), Some(&other_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(Method::DELETE, &format!("/userPost/{}", first), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.count("report_comments"), 0);

    let (status, _) = app
        .request(Method::DELETE, &format!("/userPost/{}", second), Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&format!("/userPost/{}", second), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_reports_and_by_owner() {
    let app = TestApp::new();
    let (token, user_id) = app.register_user("Anu", "anu@example.com").await;
    let (other_token, _) = app.register_user("Bina", "bina@example.com").await;
    let first = app.create_report(&token, "One").await;
    let second = app.create_report(&token, "Two").await;
    app.create_report(&other_token, "Three").await;

    let (_, body) = app.get("/userPost", None).await;
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (status, body) = app
        .get(&format!("/userPost/user/{}", user_id), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![second.as_str(), first.as_str()]);
}

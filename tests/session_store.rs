mod support;

use std::sync::atomic::Ordering;

use reserva_hub_lib::test_support as ts;

fn rt() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("tokio runtime")
}

#[test]
fn login_persists_credentials_and_logout_clears_them() {
    let app = support::TestApp::new();
    let handle = app.handle();
    let rt = rt();

    rt.block_on(async {
        let api = support::spawn_mock_api().await;
        let notifier = ts::RecordingNotifier::new();
        let client =
            ts::build_api_client(&handle, &api.base_url, 0, notifier.clone()).expect("client");

        let snapshot = ts::login_json(&client, support::MOCK_USERNAME, support::MOCK_PASSWORD)
            .await
            .expect("login");
        assert_eq!(snapshot["authenticated"], serde_json::json!(true));
        assert_eq!(snapshot["profile"]["username"], serde_json::json!("admin"));
        assert_eq!(snapshot["profile"]["role"], serde_json::json!("admin"));

        assert_eq!(api.state.token_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            ts::session_access_token(&client).as_deref(),
            Some(api.state.current_access().as_str())
        );
        assert_eq!(
            ts::session_refresh_token(&client).as_deref(),
            Some(api.state.current_refresh().as_str())
        );

        // A store opened over the same database sees the credentials.
        assert_eq!(
            ts::persisted_access_token(&handle).expect("reload"),
            Some(api.state.current_access())
        );

        ts::logout(&client).expect("logout");
        assert!(!ts::session_is_authenticated(&client));
        assert_eq!(ts::persisted_access_token(&handle).expect("reload"), None);

        let snapshot = ts::session_snapshot_json(&client).expect("snapshot");
        assert_eq!(snapshot["authenticated"], serde_json::json!(false));
        assert!(snapshot["profile"].is_null());
    });
}

#[test]
fn failed_login_leaves_no_session_behind() {
    let app = support::TestApp::new();
    let handle = app.handle();
    let rt = rt();

    rt.block_on(async {
        let api = support::spawn_mock_api().await;
        let notifier = ts::RecordingNotifier::new();
        let client =
            ts::build_api_client(&handle, &api.base_url, 0, notifier.clone()).expect("client");

        let err = ts::login_json(&client, support::MOCK_USERNAME, "incorrecta")
            .await
            .expect_err("login must fail");
        assert_eq!(ts::app_error_code(&err), "API_UNAUTHORIZED");

        assert!(!ts::session_is_authenticated(&client));
        assert_eq!(ts::persisted_access_token(&handle).expect("reload"), None);
    });
}

#[test]
fn db_file_lands_inside_the_isolated_data_dir() {
    let app = support::TestApp::new();
    let handle = app.handle();

    ts::init_db(&handle).expect("init db");
    let db_path = ts::db_path(&handle).expect("db path");
    let data_dir = ts::app_data_dir(&handle).expect("data dir");

    assert!(db_path.starts_with(&data_dir));
    assert!(db_path.starts_with(app.home_dir()));
    assert!(db_path.exists());
}

//! Saving and restoring the context through the session listener.

mod common;

use common::Harness;
use reqline::config::CookiePolicy;
use reqline::repl::services::{HttpResponse, SessionListener};
use reqline::repl::testing::RecordingHttpClient;
use reqline::repl::RequestContext;

fn listener(dir: &tempfile::TempDir, url: &str, per_host: bool) -> SessionListener {
    SessionListener::new(dir.path().to_path_buf(), url, per_host, CookiePolicy::Auto)
}

#[test]
fn committed_lines_should_be_saved() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new("http://localhost").with_listener(listener(&dir, "http://localhost", false));

    assert!(h.run("name=alice --style monokai"));
    assert!(h.run("cd api"));

    assert_eq!(
        std::fs::read_to_string(dir.path().join("context.hp")).unwrap(),
        "cd http://localhost/api\nname=alice\n"
    );
}

#[test]
fn read_only_commands_should_not_save() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new("http://localhost").with_listener(listener(&dir, "http://localhost", false));

    assert!(h.run("httpie name=alice"));
    assert!(h.run("get page==1"));

    assert!(!dir.path().join("context.hp").exists());
}

#[test]
fn saved_context_should_load_back() {
    let dir = tempfile::tempdir().unwrap();
    let mut first = Harness::new("http://localhost").with_listener(listener(&dir, "http://localhost", false));
    assert!(first.run("cd /api/v1"));
    assert!(first.run("'name=John Doe' Accept:text/csv page==1 page==2 --verify no"));

    let mut second = Harness::new("http://localhost");
    let mut ctx = RequestContext::new("http://localhost");
    second
        .executor
        .load(&dir.path().join("context.hp"), &mut ctx)
        .unwrap();

    assert_eq!(ctx, first.ctx);
}

#[test]
fn load_should_ignore_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new("http://localhost");
    let mut ctx = RequestContext::new("http://localhost");

    h.executor
        .load(&dir.path().join("missing.hp"), &mut ctx)
        .unwrap();

    assert_eq!(ctx, RequestContext::new("http://localhost"));
}

#[test]
fn load_should_not_rewrite_the_file_it_reads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("context.hp");
    let saved = "cd http://localhost/api\n\nname=bob\n";
    std::fs::write(&path, saved).unwrap();
    let mut h = Harness::new("http://localhost").with_listener(listener(&dir, "http://localhost", false));
    let mut ctx = RequestContext::new("http://localhost");

    h.executor.load(&path, &mut ctx).unwrap();

    assert_eq!(ctx.url, "http://localhost/api");
    assert_eq!(ctx.body_params["name"], "bob");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), saved);
}

#[test]
fn per_host_contexts_should_follow_url() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new("http://localhost").with_listener(listener(&dir, "http://localhost", true));

    assert!(h.run("name=alice"));
    assert!(h.run("cd http://example.com/api"));

    assert!(dir.path().join("localhost.hp").exists());
    assert!(std::fs::read_to_string(dir.path().join("example.com.hp"))
        .unwrap()
        .starts_with("cd http://example.com/api\n"));
}

#[test]
fn response_cookies_should_be_stored_in_context() {
    let dir = tempfile::tempdir().unwrap();
    let http = RecordingHttpClient::new().with_response(HttpResponse {
        status: 200,
        headers: vec![
            ("Set-Cookie".to_string(), "sid=abc; HttpOnly".to_string()),
            ("Set-Cookie".to_string(), "theme=dark".to_string()),
        ],
        ..HttpResponse::default()
    });
    let mut h = Harness::with_client("http://localhost", http)
        .with_listener(listener(&dir, "http://localhost", false));

    assert!(h.run("get"));

    assert_eq!(h.ctx.headers["Cookie"], "sid=abc; theme=dark");
    assert!(std::fs::read_to_string(dir.path().join("context.hp"))
        .unwrap()
        .contains("'Cookie:sid=abc; theme=dark'"));
}

//! End-to-end command lines against an executor with in-memory doubles.

mod common;

use common::{api_context, temp_file, Harness, REPLAY_FIXTURE};
use reqline::repl::services::HttpResponse;
use reqline::repl::testing::{CapturedPager, RecordingHttpClient};
use reqline::repl::RequestContext;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn cd_should_resolve_relative_and_absolute_targets() {
    let mut h = Harness::new("http://localhost:8000");

    assert!(h.run("cd api/v1/"));
    assert_eq!(h.ctx.url, "http://localhost:8000/api/v1/");

    assert!(h.run("cd .."));
    assert_eq!(h.ctx.url, "http://localhost:8000/api");

    assert!(h.run("cd //example.com/api"));
    assert_eq!(h.ctx.url, "http://example.com/api");

    assert!(h.run("cd https://example.org/v2"));
    assert_eq!(h.ctx.url, "https://example.org/v2");
}

#[test]
fn mutations_should_accumulate_across_lines() {
    let mut h = Harness::new("http://localhost");

    assert!(h.run("name=alice 'full name=Alice Liddell'"));
    assert!(h.run("Accept:application/json --auth user:pass"));
    assert!(h.run("--form"));

    assert_eq!(h.ctx.body_params["name"], "alice");
    assert_eq!(h.ctx.body_params["full name"], "Alice Liddell");
    assert_eq!(h.ctx.headers["Accept"], "application/json");
    assert_eq!(h.ctx.options["--auth"], Some("user:pass".to_string()));
    assert_eq!(h.ctx.options["--form"], None);
}

#[test]
fn querystring_values_should_be_replaced_by_a_later_line() {
    let mut h = Harness::new("http://localhost");

    assert!(h.run("page==1 page==2 limit==10"));
    assert_eq!(h.ctx.querystring_params["page"], vec!["1", "2"]);

    assert!(h.run("page==3"));
    assert_eq!(h.ctx.querystring_params["page"], vec!["3"]);
    assert_eq!(h.ctx.querystring_params["limit"], vec!["10"]);
}

#[test]
fn rm_should_remove_keys_and_report_missing_ones() {
    let mut h = Harness::new("http://localhost");
    assert!(h.run("name=alice Accept:text/html page==1 --form"));

    assert!(h.run("rm -b name"));
    assert!(h.run("rm -h Accept"));
    assert!(h.run("rm -q page"));
    assert!(h.run("rm -o --form"));
    assert!(h.ctx.is_empty());

    assert!(!h.run("rm -h abcd"));
    assert!(h.errors.contents().contains("Key 'abcd' not found"));
}

#[test]
fn rm_all_should_keep_url() {
    let mut h = Harness::new("http://localhost/api");
    assert!(h.run("name=alice Accept:text/html"));

    assert!(h.run("rm *"));

    assert!(h.ctx.is_empty());
    assert_eq!(h.ctx.url, "http://localhost/api");
}

#[test]
fn syntax_error_should_not_change_context() {
    let mut h = Harness::new("http://localhost");
    let before = h.ctx.clone();

    assert!(!h.run("name=alice \"unterminated"));

    assert_eq!(h.ctx, before);
    assert!(h.errors.contents().contains("Syntax error near"));
}

#[test]
fn exit_should_request_shutdown() {
    let mut h = Harness::new("http://localhost");
    assert!(h.run("exit"));
    assert!(h.ctx.should_exit);
}

#[test]
fn help_should_list_commands() {
    let mut h = Harness::new("http://localhost");
    assert!(h.run("help"));
    assert!(h.pager.output().starts_with("Commands:\n\tcd <URL>"));
}

#[test]
fn blank_line_should_do_nothing() {
    let mut h = Harness::new("http://localhost");
    assert!(h.run("   "));
    assert!(h.pager.output().is_empty());
    assert!(h.errors.contents().is_empty());
}

#[test]
fn httpie_preview_should_render_context() {
    let mut h = Harness::new("http://localhost");
    assert!(h.run("httpie"));
    assert_eq!(h.pager.output(), "http http://localhost");
}

#[test]
fn httpie_preview_should_apply_line_mutations_without_committing() {
    let mut h = Harness::new("http://localhost");
    assert!(h.run("Accept:text/html"));

    assert!(h.run("httpie post /things 'name=John Doe' page==2"));

    assert_eq!(
        h.pager.output(),
        "http POST http://localhost/things page==2 'name=John Doe' Accept:text/html"
    );
    assert!(h.ctx.body_params.is_empty());
    assert_eq!(h.ctx.url, "http://localhost");
}

#[test]
fn curl_preview_should_be_reported_as_unsupported() {
    let mut h = Harness::new("http://localhost");
    assert!(!h.run("curl"));
    assert!(h.errors.contents().contains("curl format is not supported yet"));
}

#[test]
fn action_should_send_final_context_without_persisting_line_items() {
    let mut h = Harness::new("http://localhost");
    assert!(h.run("--auth user:pass Accept:text/html"));

    assert!(h.run("post page==1 name=alice"));

    assert_eq!(
        h.http.requests(),
        vec![strings(&[
            "--auth",
            "user:pass",
            "POST",
            "http://localhost",
            "page==1",
            "name=alice",
            "Accept:text/html",
        ])]
    );
    assert!(h.ctx.querystring_params.is_empty());
    assert!(h.ctx.body_params.is_empty());
}

#[test]
fn action_should_accept_url_token() {
    let mut h = Harness::new("http://localhost/api");

    assert!(h.run("GET users/1"));

    assert_eq!(
        h.http.requests(),
        vec![strings(&["GET", "http://localhost/api/users/1"])]
    );
    assert_eq!(h.ctx.url, "http://localhost/api");
}

#[test]
fn action_output_should_reach_pager() {
    let http = RecordingHttpClient::new().with_response(HttpResponse {
        status: 200,
        body: b"{\"ok\":true}".to_vec(),
        ..HttpResponse::default()
    });
    let mut h = Harness::with_client("http://localhost", http);

    assert!(h.run("get"));

    assert_eq!(h.pager.output(), "{\"ok\":true}");
    assert_eq!(h.http.styled(), vec![false]);
}

#[test]
fn action_output_should_be_written_unstyled_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");
    let http = RecordingHttpClient::new().with_response(HttpResponse {
        status: 200,
        body: b"{\"ok\":true}".to_vec(),
        ..HttpResponse::default()
    });
    let mut h = Harness::with_parts("http://localhost", http, CapturedPager::terminal());

    assert!(h.run("get"));
    assert!(h.run(&format!("get > '{}'", path.display())));

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"ok\":true}");
    assert_eq!(h.http.styled(), vec![true, false]);
    assert_eq!(h.pager.pages().len(), 1);
}

#[test]
fn failed_action_should_still_truncate_target_file() {
    let (_dir, path) = temp_file("data.json", "stale contents");
    let http = RecordingHttpClient::new().failing("connection refused");
    let mut h = Harness::with_client("http://localhost", http);

    assert!(!h.run(&format!("get > '{}'", path.display())));

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    assert!(h.errors.contents().contains("connection refused"));
    assert!(h.pager.output().is_empty());
}

#[test]
fn failed_action_should_not_touch_context() {
    let http = RecordingHttpClient::new().failing("timed out");
    let mut h = Harness::with_client("http://localhost", http);
    assert!(h.run("name=alice"));
    let before = h.ctx.clone();

    assert!(!h.run("post extra=1"));

    assert_eq!(h.ctx, before);
    assert!(h.errors.contents().contains("timed out"));
}

#[test]
fn env_should_print_replayable_context() {
    let mut h = Harness::new("http://localhost");
    h.ctx = api_context();

    assert!(h.run("env"));

    assert_eq!(
        h.pager.output(),
        "--form\n--verify=no\ncd http://localhost:8000/api\nlimit==50\npage==1\n\
         'name=John Doe'\nAccept:text/csv\n'Authorization:ApiKey 1234'\n"
    );
}

#[test]
fn env_should_write_and_append_to_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("env.hp");
    let mut h = Harness::new("http://localhost");

    assert!(h.run(&format!("env > '{}'", path.display())));
    assert!(h.run(&format!("env >> '{}'", path.display())));

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "cd http://localhost\ncd http://localhost\n"
    );
    assert!(h.pager.output().is_empty());
}

#[test]
fn source_should_merge_file_into_context() {
    let (_dir, path) = temp_file("ctx.hp", REPLAY_FIXTURE);
    let mut h = Harness::new("http://localhost");
    h.ctx = api_context();

    assert!(h.run(&format!("source {}", path.display())));

    assert_eq!(h.ctx.url, "http://localhost:8000/api/v2/user");
    assert_eq!(h.ctx.headers.len(), 3);
    assert_eq!(h.ctx.headers["Accept"], "text/csv");
    assert_eq!(h.ctx.headers["Authorization"], "ApiKey 5678");
    assert_eq!(h.ctx.headers["Language"], "en");
    assert_eq!(h.ctx.querystring_params["page"], vec!["1"]);
    assert_eq!(h.ctx.querystring_params["limit"], vec!["25"]);
    assert_eq!(h.ctx.body_params.len(), 2);
    assert_eq!(h.ctx.body_params["name"], "Jane Doe");
    assert_eq!(h.ctx.body_params["username"], "jane");
    assert_eq!(h.ctx.options.len(), 1);
    assert_eq!(h.ctx.options["--verify"], Some("no".to_string()));
}

#[test]
fn source_should_accept_quoted_path_with_spaces() {
    let (_dir, path) = temp_file("my ctx.hp", REPLAY_FIXTURE);
    let mut h = Harness::new("http://localhost");
    h.ctx = api_context();

    assert!(h.run(&format!("  source   \"{}\"  ", path.display())));

    assert_eq!(h.ctx.url, "http://localhost:8000/api/v2/user");
    assert_eq!(h.ctx.headers["Language"], "en");
}

#[test]
fn exec_should_replace_context_with_file() {
    let (_dir, path) = temp_file("ctx.hp", REPLAY_FIXTURE);
    let mut h = Harness::new("http://localhost");
    h.ctx = api_context();

    assert!(h.run(&format!("exec '{}'", path.display())));

    assert_eq!(h.ctx.url, "http://localhost:8000/api/v2/user");
    assert_eq!(h.ctx.headers.len(), 2);
    assert_eq!(h.ctx.headers["Authorization"], "ApiKey 5678");
    assert_eq!(h.ctx.headers["Language"], "en");
    assert_eq!(h.ctx.querystring_params.len(), 1);
    assert_eq!(h.ctx.querystring_params["limit"], vec!["25"]);
    assert_eq!(h.ctx.body_params["name"], "Jane Doe");
    assert!(h.ctx.options.is_empty());
    // `rm -o --form` has nothing left to remove after the reset
    assert!(h.errors.contents().contains("Key '--form' not found"));
}

#[test]
fn source_should_report_missing_file_and_keep_context() {
    let mut h = Harness::new("http://localhost");
    h.ctx = api_context();
    let before = h.ctx.clone();

    assert!(!h.run("source no_such_file.txt"));

    assert_eq!(h.ctx, before);
    assert!(h.errors.contents().contains("no_such_file.txt"));
}

#[test]
fn replayed_env_should_reproduce_context() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("round-trip.hp");
    let mut h = Harness::new("http://localhost");
    assert!(h.run("cd /api/v1"));
    assert!(h.run("page==1 page==2 'name=John Doe' \"x-note:it's here\" --verify no --form"));
    assert!(h.run("'odd key=value' path\\ with\\ spaces=1"));
    assert!(h.run(&format!("env > '{}'", path.display())));
    let original = h.ctx.clone();

    let mut replayed = Harness::new("http://elsewhere");
    assert!(replayed.run(&format!("exec '{}'", path.display())));

    assert_eq!(replayed.ctx, original);
    assert!(replayed.errors.contents().is_empty());
}

#[test]
fn replayed_env_should_keep_dashed_keys_as_items() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dashed.hp");
    let mut h = Harness::new("http://localhost");
    assert!(h.run("'--auth=secret' '-a==1' '--style:x y' --verify=no"));
    assert!(h.run(&format!("env > '{}'", path.display())));
    let original = h.ctx.clone();

    let mut replayed = Harness::new("http://elsewhere");
    assert!(replayed.run(&format!("exec '{}'", path.display())));

    assert_eq!(replayed.ctx, original);
    assert_eq!(replayed.ctx.body_params["--auth"], "secret");
    assert_eq!(replayed.ctx.options.len(), 1);
}

#[test]
fn ls_should_be_empty_without_navigation_tree() {
    let mut h = Harness::new("http://localhost");
    assert!(h.run("ls"));
    assert!(h.pager.output().is_empty());
}

#[test]
fn cleared_context_should_still_accept_commands() {
    let mut h = Harness::new("http://localhost");
    h.ctx = RequestContext::new("http://localhost");
    assert!(h.run("rm *"));
    assert!(h.run("name=bob"));
    assert_eq!(h.ctx.body_params["name"], "bob");
}

#[cfg(unix)]
mod shell {
    use super::*;

    #[test]
    fn backticks_should_substitute_command_output() {
        let mut h = Harness::new("http://localhost");

        assert!(h.run("name=`echo alice` Authorization:'Bearer `printf abc`'"));

        assert_eq!(h.ctx.body_params["name"], "alice");
        assert_eq!(h.ctx.headers["Authorization"], "Bearer abc");
    }

    #[test]
    fn failing_substitution_should_abort_line() {
        let mut h = Harness::new("http://localhost");

        assert!(!h.run("name=alice token=`exit 3`"));

        assert!(h.ctx.body_params.is_empty());
    }

    #[test]
    fn multiline_substitution_should_be_rejected() {
        let mut h = Harness::new("http://localhost");

        assert!(!h.run(r"Accept:json X-Multi:`printf 'a\nb'`"));

        assert!(h.ctx.headers.is_empty());
        assert!(h
            .errors
            .contents()
            .contains("Line breaks are not allowed in 'X-Multi'"));
    }

    #[test]
    fn trailing_newline_from_substitution_should_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ctx.hp");
        let mut h = Harness::new("http://localhost");
        assert!(h.run("X-Token:`printf 'abc\\n'`"));
        assert!(h.run(&format!("env > '{}'", path.display())));

        let mut replayed = Harness::new("http://elsewhere");
        assert!(replayed.run(&format!("exec '{}'", path.display())));

        assert_eq!(replayed.ctx.headers["X-Token"], "abc");
        assert_eq!(replayed.ctx, h.ctx);
    }

    #[test]
    fn env_should_pipe_through_shell_command() {
        let mut h = Harness::new("http://localhost");
        assert!(h.run("name=alice"));

        assert!(h.run("env | grep name"));

        assert_eq!(h.pager.output(), "name=alice\n");
    }

    #[test]
    fn failing_pipe_should_be_reported() {
        let mut h = Harness::new("http://localhost");

        assert!(!h.run("env | cat > /dev/null; exit 4"));

        assert!(!h.errors.contents().is_empty());
    }
}

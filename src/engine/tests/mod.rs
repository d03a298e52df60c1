use std::sync::Arc;

use super::*;
use crate::model::PolicyModel;
use crate::types::ResourcePattern;
use yare::parameterized;

mod scenarios;

const SERVICE: &str = "scribble/contents";

const TEST_POLICY: &str = r#"
g, system:anonymous, system:unauthenticated

p, system:authenticated, scribble/contents, -, createPost
p, system:authenticated, scribble/contents, -, listPosts
p, system:unauthenticated, scribble/contents, -, listPosts
p, system:authenticated, scribble/contents, *, getPost
p, system:unauthenticated, scribble/contents, *, getPost
"#;

const TEST_POLICY_EXACT: &str = r#"
p, alice, scribble/contents, post1, editPost
p, editors, scribble/contents, *, editPost
g, bob, editors
"#;

const TEST_POLICY_SHARED_ACTION: &str = r#"
p, alice, scribble/contents, *, get
p, bob, scribble/reactions, *, get
"#;

#[derive(Clone)]
struct SharedLogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

struct SharedLogWriter(Arc<std::sync::Mutex<Vec<u8>>>);

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedLogBuffer {
    type Writer = SharedLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SharedLogWriter(Arc::clone(&self.0))
    }
}

impl std::io::Write for SharedLogWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn model_from_policy(policy_text: &str) -> PolicyModel {
    PolicyModel::new_from_str(policy_text).expect("policy should load")
}

fn decide(model: &PolicyModel, subject: &str, resource: &str, action: &str) -> Decision {
    evaluate(&model.current_snapshot(), subject, SERVICE, resource, action)
}

fn assert_allow(decision: &Decision) {
    assert!(matches!(decision, Decision::Allow { .. }), "{decision}");
}

fn assert_deny(decision: &Decision) {
    assert!(matches!(decision, Decision::Deny { .. }), "{decision}");
}

#[parameterized(
    alice_exact_id_allow = { "alice", "post1", true },
    alice_other_id_deny = { "alice", "post2", false },
    alice_collection_deny = { "alice", "", false },
    bob_via_group_any_id_allow = { "bob", "post2", true },
    bob_via_group_collection_deny = { "bob", "", false },
    carol_deny = { "carol", "post1", false },
)]
fn test_evaluate_requests(subject: &str, resource: &str, allowed: bool) {
    let model = model_from_policy(TEST_POLICY_EXACT);
    let decision = decide(&model, subject, resource, "editPost");
    assert_eq!(decision.is_allow(), allowed, "{decision}");
}

#[test]
fn test_services_namespace_actions() {
    let model = model_from_policy(TEST_POLICY_SHARED_ACTION);
    let snapshot = model.current_snapshot();

    assert!(enforce(&snapshot, "alice", "scribble/contents", "x", "get"));
    assert!(!enforce(&snapshot, "alice", "scribble/reactions", "x", "get"));
    assert!(enforce(&snapshot, "bob", "scribble/reactions", "x", "get"));
    assert!(!enforce(&snapshot, "bob", "scribble/contents", "x", "get"));
}

#[test]
fn test_allow_reports_permitting_rule() {
    let model = model_from_policy(TEST_POLICY);
    let decision = decide(&model, "system:anonymous", "post1", "getPost");

    insta::assert_json_snapshot!(decision, @r#"
    {
      "Allow": {
        "rule": {
          "subject": "system:unauthenticated",
          "service": "scribble/contents",
          "resource": "*",
          "action": "getPost"
        },
        "generation": 0
      }
    }
    "#);
}

#[test]
fn test_deny_snapshot() {
    let model = model_from_policy(TEST_POLICY);
    let decision = decide(&model, "system:anonymous", "", "createPost");

    insta::assert_json_snapshot!(decision, @r#"
    {
      "Deny": {
        "generation": 0
      }
    }
    "#);
}

#[test]
fn test_decision_tracks_generation() {
    let model = model_from_policy(TEST_POLICY);
    model.add_group_edge("user1", "system:authenticated");

    let decision = decide(&model, "user1", "", "createPost");
    assert_allow(&decision);
    assert_eq!(decision.generation(), 1);
}

#[test]
fn test_permit_is_logged_with_rule() {
    let buffer = SharedLogBuffer(Arc::new(std::sync::Mutex::new(Vec::new())));
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .finish();

    let model = model_from_policy(TEST_POLICY);
    tracing::subscriber::with_default(subscriber, || {
        let decision = decide(&model, "system:anonymous", "", "listPosts");
        assert_allow(&decision);
    });

    let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    assert!(output.contains("Candidates"), "{output}");
    assert!(
        output.contains("p, system:unauthenticated, scribble/contents, -, listPosts"),
        "{output}"
    );
}

#[test]
fn test_rule_matching_uses_pattern_not_string_equality() {
    // A literal "*" resource id is still a concrete id; "-" is collection scope.
    let model = model_from_policy(
        "p, alice, scribble/contents, post1, getPost\np, alice, scribble/contents, -, listPosts",
    );
    let snapshot = model.current_snapshot();
    assert!(!enforce(&snapshot, "alice", SERVICE, "*", "getPost"));
    assert!(!enforce(&snapshot, "alice", SERVICE, "-", "getPost"));
    assert!(enforce(&snapshot, "alice", SERVICE, "-", "listPosts"));
    assert_eq!(
        snapshot.rules_for(SERVICE, "getPost")[0].resource,
        ResourcePattern::Exact("post1".into())
    );
}

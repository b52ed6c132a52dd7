mod common;

use common::{harness, harness_with_settings, reply, tool_request, FakeSearcher, ScriptedLlm};
use paperchat::chat::{ChatError, ChatSettings, NO_RESPONSE};
use paperchat::documents::annotations::{AnnotationStore, Annotations, Highlight, Note};
use paperchat::llm::models::Role;
use paperchat::llm::LlmError;
use paperchat::tools::search::NO_RESULTS;

#[tokio::test]
async fn turns_without_a_document_share_the_default_session() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        dir.path(),
        ScriptedLlm::new(vec![reply("Hi there"), reply("Still here")]),
        FakeSearcher::returning(""),
    );

    assert_eq!(h.orchestrator.chat(None, "hello").await.unwrap(), "Hi there");
    assert_eq!(h.sessions.len("default"), 2);

    assert_eq!(h.orchestrator.chat(Some("  "), "again").await.unwrap(), "Still here");
    assert_eq!(h.sessions.len("default"), 4);

    let history = h.orchestrator.history(None);
    let roles: Vec<Role> = history.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User, Role::Assistant]);
    assert_eq!(history[2].content, "again");

    let calls = h.llm.calls.lock().unwrap();
    let second = &calls[1].messages;
    assert_eq!(second.len(), 4);
    assert_eq!(second[0].role, Role::System);
    assert_eq!(second[1].content, "hello");
    assert_eq!(second[2].content, "Hi there");
    assert_eq!(second[3].content, "again");
}

#[tokio::test]
async fn sessions_are_partitioned_by_document() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        dir.path(),
        ScriptedLlm::new(vec![reply("a"), reply("b")]),
        FakeSearcher::returning(""),
    );

    h.orchestrator.chat(Some("one.pdf"), "q1").await.unwrap();
    h.orchestrator.chat(Some("two.pdf"), "q2").await.unwrap();

    assert_eq!(h.sessions.len("one.pdf"), 2);
    assert_eq!(h.sessions.len("two.pdf"), 2);
    assert!(h.sessions.is_empty("default"));
}

#[tokio::test]
async fn path_and_base_name_share_one_session() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        dir.path(),
        ScriptedLlm::new(vec![reply("a"), reply("b")]),
        FakeSearcher::returning(""),
    );

    h.orchestrator.chat(Some("uploads/paper.pdf"), "q1").await.unwrap();
    h.orchestrator.chat(Some("paper.pdf"), "q2").await.unwrap();

    assert_eq!(h.sessions.len("paper.pdf"), 4);
    assert!(h.sessions.is_empty("uploads/paper.pdf"));
    assert_eq!(h.orchestrator.history(Some("x\\paper.pdf")).len(), 4);
}

#[tokio::test]
async fn history_window_limits_what_is_sent_but_not_what_is_stored() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness_with_settings(
        dir.path(),
        ScriptedLlm::new(vec![reply("r1"), reply("r2"), reply("r3")]),
        FakeSearcher::returning(""),
        ChatSettings {
            max_history_messages: 2,
            ..ChatSettings::default()
        },
    );

    for question in ["q1", "q2", "q3"] {
        h.orchestrator.chat(None, question).await.unwrap();
    }
    assert_eq!(h.sessions.len("default"), 6);

    let calls = h.llm.calls.lock().unwrap();
    let third = &calls[2].messages;
    let contents: Vec<&str> = third.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(third.len(), 4);
    assert_eq!(third[0].role, Role::System);
    assert_eq!(&contents[1..], ["q2", "r2", "q3"]);
}

#[tokio::test]
async fn search_tool_call_runs_one_search_and_one_follow_up() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        dir.path(),
        ScriptedLlm::new(vec![
            tool_request("", &[("call_1", "search_document", r#"{"query": "foo"}"#)]),
            reply("Foo appears in section 2."),
        ]),
        FakeSearcher::returning("12:foo bar\n13-context"),
    );

    let answer = h
        .orchestrator
        .chat(Some("paper.pdf"), "Where is foo?")
        .await
        .unwrap();
    assert_eq!(answer, "Foo appears in section 2.");

    let queries = h.searcher.queries.lock().unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].0, dir.path().join("paper.md"));
    assert_eq!(queries[0].1, "foo");

    let calls = h.llm.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].tools.as_ref().is_some_and(|t| t[0].function.name == "search_document"));
    assert!(calls[1].tools.is_none());

    let follow_up = &calls[1].messages;
    let call_msg = &follow_up[follow_up.len() - 2];
    assert_eq!(call_msg.role, Role::Assistant);
    assert_eq!(call_msg.tool_calls.as_ref().unwrap()[0].id, "call_1");
    let tool_msg = follow_up.last().unwrap();
    assert_eq!(tool_msg.role, Role::Tool);
    assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(tool_msg.content, "12:foo bar\n13-context");

    let history = h.orchestrator.history(Some("paper.pdf"));
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].content, "Foo appears in section 2.");
    assert!(history.iter().all(|m| m.tool_calls.is_none()));
}

#[tokio::test]
async fn several_tool_calls_share_a_single_follow_up() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        dir.path(),
        ScriptedLlm::new(vec![
            tool_request(
                "Let me check.",
                &[
                    ("call_a", "search_document", r#"{"query": "alpha"}"#),
                    ("call_b", "search_document", r#"{"query": "beta"}"#),
                ],
            ),
            reply("Both found."),
        ]),
        FakeSearcher::returning("match"),
    );

    let answer = h.orchestrator.chat(Some("paper.pdf"), "compare").await.unwrap();
    assert_eq!(answer, "Both found.");
    assert_eq!(h.searcher.query_count(), 2);
    assert_eq!(h.llm.call_count(), 2);

    let calls = h.llm.calls.lock().unwrap();
    let follow_up = &calls[1].messages;
    // system, user, then an assistant/tool pair per call
    assert_eq!(follow_up.len(), 6);
    assert_eq!(follow_up[2].content, "Let me check.");
    assert_eq!(follow_up[5].tool_call_id.as_deref(), Some("call_b"));
}

#[tokio::test]
async fn failed_search_still_completes_the_turn() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        dir.path(),
        ScriptedLlm::new(vec![
            tool_request("", &[("call_1", "search_document", r#"{"query": "foo"}"#)]),
            reply("I could not search the paper, but here is what I know."),
        ]),
        FakeSearcher::failing(),
    );

    let answer = h.orchestrator.chat(Some("paper.pdf"), "foo?").await.unwrap();
    assert!(!answer.is_empty());
    assert_ne!(answer, NO_RESPONSE);

    let calls = h.llm.calls.lock().unwrap();
    let tool_msg = calls[1].messages.last().unwrap();
    assert!(tool_msg.content.starts_with("Error running search"));
    assert!(tool_msg.content.contains("simulated failure"));
}

#[tokio::test]
async fn empty_search_output_is_reported_as_no_results() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        dir.path(),
        ScriptedLlm::new(vec![
            tool_request("", &[("call_1", "search_document", r#"{"query": "zzz"}"#)]),
            reply("Nothing about zzz."),
        ]),
        FakeSearcher::returning(""),
    );

    h.orchestrator.chat(Some("paper.pdf"), "zzz?").await.unwrap();

    let calls = h.llm.calls.lock().unwrap();
    assert_eq!(calls[1].messages.last().unwrap().content, NO_RESULTS);
}

#[tokio::test]
async fn unknown_tool_calls_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        dir.path(),
        ScriptedLlm::new(vec![tool_request(
            "Answer without tools.",
            &[("call_x", "run_shell", r#"{"cmd": "ls"}"#)],
        )]),
        FakeSearcher::returning("unused"),
    );

    let answer = h.orchestrator.chat(Some("paper.pdf"), "hi").await.unwrap();
    assert_eq!(answer, "Answer without tools.");
    assert_eq!(h.searcher.query_count(), 0);
    assert_eq!(h.llm.call_count(), 1);
}

#[tokio::test]
async fn empty_reply_becomes_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        dir.path(),
        ScriptedLlm::new(vec![reply("")]),
        FakeSearcher::returning(""),
    );

    let answer = h.orchestrator.chat(None, "hello").await.unwrap();
    assert_eq!(answer, "No response");

    let history = h.orchestrator.history(None);
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].content, "");
}

#[tokio::test]
async fn annotations_are_folded_into_the_system_prompt() {
    let dir = tempfile::tempdir().unwrap();
    AnnotationStore::new(dir.path())
        .save(
            "paper.pdf",
            &Annotations {
                highlights: vec![Highlight::new("Transformers scale well")],
                notes: vec![Note::new("Check the appendix")],
                ..Default::default()
            },
        )
        .unwrap();

    let h = harness(
        dir.path(),
        ScriptedLlm::new(vec![reply("ok")]),
        FakeSearcher::returning(""),
    );
    h.orchestrator.chat(Some("paper.pdf"), "summarize").await.unwrap();

    let calls = h.llm.calls.lock().unwrap();
    assert_eq!(
        calls[0].messages[0].content,
        "You help with papers.\n- Highlight: Transformers scale well\n- Note: Check the appendix"
    );
}

#[tokio::test]
async fn malformed_annotations_abort_the_turn() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("paper.pdf.annotations.json"), "{not json").unwrap();

    let h = harness(
        dir.path(),
        ScriptedLlm::new(vec![reply("unused")]),
        FakeSearcher::returning(""),
    );

    let err = h.orchestrator.chat(Some("paper.pdf"), "hi").await.unwrap_err();
    assert!(matches!(err, ChatError::Annotations(_)));
    assert_eq!(h.llm.call_count(), 0);
    assert!(h.sessions.is_empty("paper.pdf"));
}

#[tokio::test]
async fn llm_failures_propagate_and_leave_history_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        dir.path(),
        ScriptedLlm::new(vec![Err(LlmError::RateLimited)]),
        FakeSearcher::returning(""),
    );

    let err = h.orchestrator.chat(None, "hello").await.unwrap_err();
    assert!(matches!(err, ChatError::Llm(LlmError::RateLimited)));
    assert!(h.sessions.is_empty("default"));
}

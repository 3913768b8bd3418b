// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn extract_prefers_json_fenced_block() {
    let text = "Here is my status:\n```json\n{\"status\": \"complete\"}\n```\nDone.";
    assert_eq!(extract_json(text), "{\"status\": \"complete\"}");
}

#[test]
fn extract_accepts_plain_fences() {
    let text = "```\n{\"status\": \"waiting\"}\n```";
    assert_eq!(extract_json(text), "{\"status\": \"waiting\"}");
}

#[test]
fn extract_falls_back_to_whole_text() {
    let text = "  {\"status\": \"working\"}  ";
    assert_eq!(extract_json(text), "{\"status\": \"working\"}");
}

#[test]
fn unclosed_fence_falls_back_to_whole_text() {
    let text = "```json\n{\"status\": \"working\"}";
    // No closing fence: the whole (trimmed) text is returned and will
    // fail to parse, which degrades to an error reply.
    assert_eq!(parse_reply(text).status, ProbeStatus::Error);
}

#[test]
fn parse_reply_reads_all_fields() {
    let reply = parse_reply(
        r#"{"status": "complete", "message": "all tasks done",
            "should_continue": false, "agents_active": 0,
            "tasks_completed": ["1", "2"], "tasks_pending": []}"#,
    );
    assert_eq!(reply.status, ProbeStatus::Complete);
    assert_eq!(reply.message, "all tasks done");
    assert!(!reply.should_continue);
    assert_eq!(reply.agents_active, Some(0));
    assert_eq!(reply.tasks_completed, vec!["1", "2"]);
}

#[test]
fn missing_optional_fields_take_defaults() {
    let reply = parse_reply(r#"{"status": "working"}"#);
    assert_eq!(reply.status, ProbeStatus::Working);
    assert!(reply.should_continue, "should_continue defaults to true");
    assert!(reply.message.is_empty());
    assert!(reply.tasks_pending.is_empty());
}

#[test]
fn malformed_json_degrades_to_error_reply() {
    let reply = parse_reply("I'm doing great, thanks for asking!");
    assert_eq!(reply.status, ProbeStatus::Error);
    assert!(reply.message.contains("malformed"));
    assert!(reply.should_continue);
}

#[test]
fn fenced_reply_inside_prose_parses() {
    let reply = parse_reply(
        "The session is still running.\n\n```json\n{\"status\": \"waiting\", \"message\": \"blocked on review\"}\n```\n",
    );
    assert_eq!(reply.status, ProbeStatus::Waiting);
    assert_eq!(reply.message, "blocked on review");
}

#[tokio::test]
async fn fake_probe_pops_replies_then_reports_working() {
    let probe = fake::FakeProbe::new();
    probe.push(ProbeReply::with_status(ProbeStatus::Complete));

    let first = probe.probe(Path::new("/p")).await.unwrap();
    assert_eq!(first.status, ProbeStatus::Complete);

    let second = probe.probe(Path::new("/p")).await.unwrap();
    assert_eq!(second.status, ProbeStatus::Working);
    assert_eq!(probe.calls(), 2);
}

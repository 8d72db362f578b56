//! Drives whole session turns through the public API with a scripted SSE
//! backend and a scripted operator.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::Cursor;
use std::rc::Rc;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use tofumatic::llm::{ChatRequest, DeltaStream, SseStream};
use tofumatic::{
    Banner, ChatClient, Console, ConsoleError, LlmError, Models, RetryPolicy, Session, StepStatus, ToolRegistry,
    Verdict,
};

/// Replies with canned SSE bodies, one per request.
struct SseBackend {
    bodies: RefCell<VecDeque<String>>,
    requests: RefCell<Vec<ChatRequest>>,
}

impl SseBackend {
    fn new(bodies: Vec<String>) -> Self {
        Self {
            bodies: RefCell::new(bodies.into()),
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl ChatClient for SseBackend {
    fn stream(&self, request: &ChatRequest) -> Result<DeltaStream, LlmError> {
        self.requests.borrow_mut().push(request.clone());
        let body = self
            .bodies
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| LlmError::Network("backend exhausted".to_string()))?;
        Ok(Box::new(SseStream::new(Cursor::new(body.into_bytes()))))
    }
}

/// Split `text` into content chunks of a few characters each.
fn content_body(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut body = String::new();
    for piece in chars.chunks(7) {
        let piece: String = piece.iter().collect();
        let chunk = json!({"choices": [{"delta": {"content": piece}}]});
        body.push_str(&format!("data: {chunk}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

/// One tool call whose arguments arrive in two fragments.
fn tool_call_body(name: &str, arguments: &str) -> String {
    let (head, tail) = arguments.split_at(arguments.len() / 2);
    let first = json!({"choices": [{"delta": {"tool_calls": [
        {"index": 0, "id": "call_1", "function": {"name": name, "arguments": head}}
    ]}}]});
    let second = json!({"choices": [{"delta": {"tool_calls": [
        {"index": 0, "function": {"arguments": tail}}
    ]}}]});
    format!("data: {first}\n\ndata: {second}\n\ndata: [DONE]\n\n")
}

#[derive(Default)]
struct Seen {
    fragments: String,
    banners: Vec<(Banner, String)>,
    prompts: Vec<String>,
}

struct ScriptedOperator {
    answers: VecDeque<&'static str>,
    seen: Rc<RefCell<Seen>>,
}

impl Console for ScriptedOperator {
    fn fragment(&mut self, text: &str) {
        self.seen.borrow_mut().fragments.push_str(text);
    }

    fn end_stream(&mut self) {}

    fn banner(&mut self, kind: Banner, message: &str) {
        self.seen.borrow_mut().banners.push((kind, message.to_string()));
    }

    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, ConsoleError> {
        self.seen.borrow_mut().prompts.push(prompt.to_string());
        self.answers
            .pop_front()
            .map(|a| Some(a.to_string()))
            .ok_or(ConsoleError::Closed)
    }
}

fn operator(answers: &[&'static str]) -> (ScriptedOperator, Rc<RefCell<Seen>>) {
    let seen = Rc::new(RefCell::new(Seen::default()));
    let console = ScriptedOperator {
        answers: answers.iter().copied().collect(),
        seen: seen.clone(),
    };
    (console, seen)
}

fn session(backend: &Rc<SseBackend>, console: ScriptedOperator) -> Session {
    let registry = Rc::new(ToolRegistry::standard("tofu").unwrap());
    Session::with_retry(
        backend.clone(),
        registry,
        &Models::default(),
        console,
        RetryPolicy::new(3, Duration::from_millis(1)),
    )
    .unwrap()
}

#[test]
fn request_is_refined_planned_and_executed() {
    let dir = TempDir::new().unwrap();
    let module = dir.path().join("modules").join("vpc");
    let main_tf = module.join("main.tf");

    let refinement = json!({"prompt": "Create a VPC module", "continue": true}).to_string();
    let plan = json!([
        {"step": 1, "description": "Create the module directory.", "tool": "create_directory"},
        {"step": 2, "description": "Write main.tf.", "tool": "write_file", "notes": "keep it small"},
        {"step": 3, "description": "Format the module.", "tool": "opentofu"}
    ])
    .to_string();
    let backend = Rc::new(SseBackend::new(vec![
        content_body(&refinement),
        content_body(&format!("```json\n{plan}\n```")),
        tool_call_body(
            "create_directory",
            &json!({"directory_path": module.display().to_string()}).to_string(),
        ),
        tool_call_body(
            "write_file",
            &json!({"file_path": main_tf.display().to_string(), "content": "resource \"aws_vpc\" \"main\" {}\n"})
                .to_string(),
        ),
        tool_call_body("opentofu", &json!({"directory_path": "/", "command": "fmt"}).to_string()),
    ]));
    // approve the first two calls, decline the third
    let (console, seen) = operator(&["y", "Y", "n"]);

    let state = session(&backend, console).turn("vpc module please").unwrap();

    assert_eq!(state.verdict, Verdict::Succeeded);
    assert_eq!(state.description, "Create a VPC module");
    let statuses: Vec<StepStatus> = state.plan.steps().iter().map(|s| s.status()).collect();
    assert_eq!(statuses, vec![StepStatus::Completed, StepStatus::Completed, StepStatus::Pending]);
    assert_eq!(std::fs::read_to_string(&main_tf).unwrap(), "resource \"aws_vpc\" \"main\" {}\n");

    let requests = backend.requests.borrow();
    assert_eq!(requests.len(), 5);
    // extra keys from the planner survive into the executor's step message
    assert!(requests[3].messages.last().unwrap().content.contains("keep it small"));
    // the directory tool result is in the history of the next step
    assert!(
        requests[3]
            .messages
            .iter()
            .any(|m| m.content.contains("Directory created successfully.") && m.tool_call_id.as_deref() == Some("call_1"))
    );

    let seen = seen.borrow();
    assert!(seen.fragments.contains("Create a VPC module"));
    assert_eq!(seen.prompts.len(), 3);
    assert!(
        seen.banners
            .iter()
            .any(|(kind, msg)| *kind == Banner::Info && msg == "Tool Call: opentofu")
    );
}

#[test]
fn unknown_tool_and_failed_step_do_not_stop_the_turn() {
    let plan = json!([
        {"step": 1, "description": "Delete everything.", "tool": "delete_universe"},
        {"step": 1, "description": "Duplicate number, still run.", "tool": "read_file"}
    ])
    .to_string();
    let backend = Rc::new(SseBackend::new(vec![
        content_body(&json!({"prompt": "p", "continue": true}).to_string()),
        content_body(&plan),
        tool_call_body("delete_universe", "{}"),
        content_body("Step 1: Duplicate number, still run. Tool: read_file Completed"),
    ]));
    let (console, seen) = operator(&["y"]);

    let state = session(&backend, console).turn("wipe it").unwrap();

    assert_eq!(state.verdict, Verdict::Succeeded);
    assert_eq!(state.plan.steps()[0].status(), StepStatus::Error);
    assert!(state.plan.steps()[1].is_completed());
    assert!(
        seen.borrow()
            .banners
            .iter()
            .any(|(kind, msg)| *kind == Banner::Error && msg.contains("delete_universe"))
    );
}

#[test]
fn planner_garbage_ends_turn_without_execution() {
    let backend = Rc::new(SseBackend::new(vec![
        content_body(&json!({"prompt": "p", "continue": true}).to_string()),
        content_body("I would rather not."),
    ]));
    let (console, _seen) = operator(&[]);

    let state = session(&backend, console).turn("vpc").unwrap();

    assert_eq!(state.verdict, Verdict::NoPlan);
    assert!(state.plan.is_empty());
    assert_eq!(backend.requests.borrow().len(), 2);
}

#[test]
fn interactive_loop_runs_turns_until_exit() {
    let backend = Rc::new(SseBackend::new(vec![
        content_body(&json!({"prompt": "", "continue": false}).to_string()),
        content_body(&json!({"prompt": "", "continue": false}).to_string()),
    ]));
    let (console, seen) = operator(&["bake bread", "", "paint a fence", "exit"]);
    let mut session = session(&backend, console);

    session.run(None).unwrap();

    assert_eq!(session.ctx().session(), 2);
    assert_eq!(backend.requests.borrow().len(), 2);
    let seen = seen.borrow();
    assert_eq!(seen.prompts.len(), 4);
    assert!(
        seen.banners
            .iter()
            .any(|(kind, msg)| *kind == Banner::Warning && msg.contains("not related to OpenTofu"))
    );
}

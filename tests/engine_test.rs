//! End-to-end interpreter tests driving a real engine through page loads,
//! event dispatch, suspension, and resumption.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use pageflow::{
    ConfirmationChoice, Effects, EngineBuilder, FetchOptions, MemoryStateHost, PageModel,
    StateHost, Vars,
};
use serde_json::{Value, json};

/// Effects double that records analytics calls and serves canned
/// lead/fetch results.
#[derive(Default)]
struct RecordingEffects {
    events: Mutex<Vec<(String, Vars)>>,
    lead_accept: Mutex<bool>,
    fetch_responses: Mutex<HashMap<String, Result<Value, String>>>,
}

impl RecordingEffects {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            lead_accept: Mutex::new(true),
            ..Default::default()
        })
    }

    fn events(&self) -> Vec<(String, Vars)> {
        self.events.lock().unwrap().clone()
    }

    fn set_lead_accept(
        &self,
        accept: bool,
    ) {
        *self.lead_accept.lock().unwrap() = accept;
    }

    fn set_fetch_response(
        &self,
        url: &str,
        response: Result<Value, String>,
    ) {
        self.fetch_responses.lock().unwrap().insert(url.to_string(), response);
    }
}

#[async_trait]
impl Effects for RecordingEffects {
    fn log_event(
        &self,
        event_type: &str,
        payload: Vars,
    ) {
        self.events.lock().unwrap().push((event_type.to_string(), payload));
    }

    async fn submit_lead(
        &self,
        _variables: Vars,
    ) -> pageflow::Result<bool> {
        Ok(*self.lead_accept.lock().unwrap())
    }

    async fn fetch_api(
        &self,
        url: &str,
        _options: FetchOptions,
    ) -> pageflow::Result<Value> {
        match self.fetch_responses.lock().unwrap().get(url) {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(message)) => Err(pageflow::PageflowError::Http(message.clone())),
            None => Err(pageflow::PageflowError::Http(format!("no canned response for {}", url))),
        }
    }
}

fn setup() -> (pageflow::Engine, Arc<MemoryStateHost>, Arc<RecordingEffects>) {
    let host = Arc::new(MemoryStateHost::new());
    let effects = RecordingEffects::new();
    let engine = EngineBuilder::new()
        .async_worker_thread_number(2)
        .state(host.clone())
        .effects(effects.clone())
        .build()
        .unwrap();
    engine.launch();
    (engine, host, effects)
}

/// Poll until `f` returns true, panicking after three seconds.
fn wait_until(
    what: &str,
    f: impl Fn() -> bool,
) {
    let deadline = Instant::now() + Duration::from_secs(3);
    while Instant::now() < deadline {
        if f() {
            return;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("timed out waiting for {}", what);
}

fn page(value: Value) -> PageModel {
    serde_json::from_value(value).unwrap()
}

fn item(
    id: &str,
    name: &str,
) -> Value {
    json!({ "id": id, "name": name, "x": 0.0, "y": 0.0, "width": 100.0, "height": 40.0 })
}

#[test]
fn test_click_show_hide_toggle() {
    let (engine, host, _) = setup();
    engine
        .load_page(page(json!({
            "id": "p1",
            "items": [item("btn", "button"), item("box", "shape")],
            "logic": {
                "btn": {
                    "nodes": [
                        { "id": "ev", "type": "eventNode", "data": { "eventType": "click" } },
                        { "id": "act", "type": "actionNode", "data": { "targetItemId": "box", "mode": "toggle" } }
                    ],
                    "edges": [ { "id": "e1", "source": "ev", "target": "act" } ]
                }
            }
        })))
        .unwrap();
    wait_until("page load", || host.preview_state().current_page_id.as_deref() == Some("p1"));
    assert!(host.preview_state().items["box"].is_visible);

    engine.dispatch("click", "btn").unwrap();
    wait_until("toggle off", || !host.preview_state().items["box"].is_visible);

    engine.dispatch("click", "btn").unwrap();
    wait_until("toggle on", || host.preview_state().items["box"].is_visible);

    engine.shutdown();
}

#[test]
fn test_trigger_item_targets_origin() {
    let (engine, host, _) = setup();
    // one shared graph owner targeted by two items; the action hides
    // whichever item originated the event
    engine
        .load_page(page(json!({
            "id": "p1",
            "items": [item("a", "button"), item("b", "button")],
            "logic": {
                "shared": {
                    "nodes": [
                        { "id": "ev", "type": "eventNode", "data": { "eventType": "click", "targetItemIds": ["a", "b"] } },
                        { "id": "act", "type": "actionNode", "data": { "targetItemId": "TRIGGER_ITEM", "mode": "hide" } }
                    ],
                    "edges": [ { "id": "e1", "source": "ev", "target": "act" } ]
                }
            }
        })))
        .unwrap();
    wait_until("page load", || host.preview_state().current_page_id.is_some());

    engine.dispatch("click", "b").unwrap();
    wait_until("b hidden", || !host.preview_state().items["b"].is_visible);
    assert!(host.preview_state().items["a"].is_visible);

    engine.shutdown();
}

#[test]
fn test_if_branches_on_variable() {
    let (engine, host, _) = setup();
    host.set_variables(Vars::new().with("score", 10));
    engine
        .load_page(page(json!({
            "id": "p1",
            "items": [item("btn", "button"), item("win", "shape"), item("lose", "shape")],
            "logic": {
                "btn": {
                    "nodes": [
                        { "id": "ev", "type": "eventNode", "data": {} },
                        { "id": "if", "type": "ifNode", "data": {
                            "conditionSource": "variable",
                            "variableName": "score",
                            "comparisonType": "number",
                            "comparison": ">=",
                            "comparisonValue": 10
                        } },
                        { "id": "a", "type": "actionNode", "data": { "targetItemId": "win", "mode": "hide" } },
                        { "id": "b", "type": "actionNode", "data": { "targetItemId": "lose", "mode": "hide" } }
                    ],
                    "edges": [
                        { "id": "e1", "source": "ev", "target": "if" },
                        { "id": "e2", "source": "if", "target": "a", "sourceHandle": "true" },
                        { "id": "e3", "source": "if", "target": "b", "sourceHandle": "false" }
                    ]
                }
            }
        })))
        .unwrap();
    wait_until("page load", || host.preview_state().current_page_id.is_some());

    engine.dispatch("click", "btn").unwrap();
    wait_until("true branch", || !host.preview_state().items["win"].is_visible);
    assert!(host.preview_state().items["lose"].is_visible);

    engine.shutdown();
}

#[test]
fn test_string_comparison_coerces_missing_to_empty() {
    let (engine, host, _) = setup();
    // "name" is never set; != "" must be false, so the false branch runs
    engine
        .load_page(page(json!({
            "id": "p1",
            "items": [item("btn", "button"), item("box", "shape")],
            "logic": {
                "btn": {
                    "nodes": [
                        { "id": "ev", "type": "eventNode", "data": {} },
                        { "id": "if", "type": "ifNode", "data": {
                            "conditionSource": "variable",
                            "variableName": "name",
                            "comparisonType": "string",
                            "comparison": "!=",
                            "comparisonValue": ""
                        } },
                        { "id": "hide", "type": "actionNode", "data": { "targetItemId": "box", "mode": "hide" } }
                    ],
                    "edges": [
                        { "id": "e1", "source": "ev", "target": "if" },
                        { "id": "e2", "source": "if", "target": "hide", "sourceHandle": "false" }
                    ]
                }
            }
        })))
        .unwrap();
    wait_until("page load", || host.preview_state().current_page_id.is_some());

    engine.dispatch("click", "btn").unwrap();
    wait_until("false branch", || !host.preview_state().items["box"].is_visible);

    engine.shutdown();
}

#[test]
fn test_set_variable_add_coerces() {
    let (engine, host, _) = setup();
    host.set_variables(Vars::new().with("count", "2"));
    engine
        .load_page(page(json!({
            "id": "p1",
            "items": [item("btn", "button")],
            "logic": {
                "btn": {
                    "nodes": [
                        { "id": "ev", "type": "eventNode", "data": {} },
                        { "id": "set", "type": "setVariableNode", "data": { "variableName": "count", "operation": "add", "value": 3 } }
                    ],
                    "edges": [ { "id": "e1", "source": "ev", "target": "set" } ]
                }
            }
        })))
        .unwrap();
    wait_until("page load", || host.preview_state().current_page_id.is_some());

    engine.dispatch("click", "btn").unwrap();
    wait_until("variable added", || host.variables().number("count") == 5.0);

    engine.shutdown();
}

#[test]
fn test_level_order_traversal() {
    let (engine, host, effects) = setup();
    // set, then branch on the value just written; siblings of the same
    // level all run before the next level starts
    engine
        .load_page(page(json!({
            "id": "p1",
            "items": [item("btn", "button"), item("box", "shape")],
            "logic": {
                "btn": {
                    "nodes": [
                        { "id": "ev", "type": "eventNode", "data": {} },
                        { "id": "set", "type": "setVariableNode", "data": { "variableName": "v", "operation": "set", "value": 1 } },
                        { "id": "if", "type": "ifNode", "data": {
                            "conditionSource": "variable",
                            "variableName": "v",
                            "comparisonType": "number",
                            "comparison": "==",
                            "comparisonValue": 1
                        } },
                        { "id": "hide", "type": "actionNode", "data": { "targetItemId": "box", "mode": "hide" } }
                    ],
                    "edges": [
                        { "id": "e1", "source": "ev", "target": "set" },
                        { "id": "e2", "source": "set", "target": "if" },
                        { "id": "e3", "source": "if", "target": "hide", "sourceHandle": "true" }
                    ]
                }
            }
        })))
        .unwrap();
    wait_until("page load", || host.preview_state().current_page_id.is_some());

    engine.dispatch("click", "btn").unwrap();
    wait_until("downstream branch saw the write", || !host.preview_state().items["box"].is_visible);
    assert!(effects.events().is_empty());

    engine.shutdown();
}

#[test]
fn test_page_validation_blocks_then_passes() {
    let (engine, host, effects) = setup();
    engine
        .load_page(page(json!({
            "id": "p1",
            "items": [
                item("btn", "button"),
                { "id": "email", "name": "input-email", "data": { "variableName": "email", "required": true, "inputType": "email" } }
            ],
            "logic": {
                "btn": {
                    "nodes": [
                        { "id": "ev", "type": "eventNode", "data": {} },
                        { "id": "pg", "type": "pageNode", "data": { "targetPageId": "p2", "enableValidation": true } }
                    ],
                    "edges": [ { "id": "e1", "source": "ev", "target": "pg" } ]
                }
            }
        })))
        .unwrap();
    wait_until("page load", || host.preview_state().current_page_id.is_some());

    engine.dispatch("click", "btn").unwrap();
    wait_until("validation error set", || host.preview_state().items["email"].error.is_some());
    assert!(host.page_changes().is_empty());
    wait_until("validation telemetry", || {
        effects.events().iter().any(|(t, _)| t == "validation_failed")
    });

    host.set_variables(Vars::new().with("email", "a@b.co"));
    engine.dispatch("click", "btn").unwrap();
    wait_until("page change requested", || host.page_changes() == vec!["p2".to_string()]);
    assert!(host.preview_state().items["email"].error.is_none());

    engine.shutdown();
}

#[test]
fn test_delay_suspends_and_resumes() {
    let (engine, host, _) = setup();
    engine
        .load_page(page(json!({
            "id": "p1",
            "items": [item("btn", "button"), item("box", "shape")],
            "logic": {
                "btn": {
                    "nodes": [
                        { "id": "ev", "type": "eventNode", "data": {} },
                        { "id": "wait", "type": "delayNode", "data": { "durationS": 0.05 } },
                        { "id": "hide", "type": "actionNode", "data": { "targetItemId": "box", "mode": "hide" } }
                    ],
                    "edges": [
                        { "id": "e1", "source": "ev", "target": "wait" },
                        { "id": "e2", "source": "wait", "target": "hide" }
                    ]
                }
            }
        })))
        .unwrap();
    wait_until("page load", || host.preview_state().current_page_id.is_some());

    engine.dispatch("click", "btn").unwrap();
    // still visible right after dispatch, hidden once the timer fires
    std::thread::sleep(Duration::from_millis(10));
    assert!(host.preview_state().items["box"].is_visible);
    wait_until("timer resume", || !host.preview_state().items["box"].is_visible);

    engine.shutdown();
}

#[test]
fn test_reset_cancels_pending_timer() {
    let (engine, host, _) = setup();
    engine
        .load_page(page(json!({
            "id": "p1",
            "items": [item("btn", "button"), item("box", "shape")],
            "logic": {
                "btn": {
                    "nodes": [
                        { "id": "ev", "type": "eventNode", "data": {} },
                        { "id": "wait", "type": "delayNode", "data": { "durationS": 0.1 } },
                        { "id": "hide", "type": "actionNode", "data": { "targetItemId": "box", "mode": "hide" } }
                    ],
                    "edges": [
                        { "id": "e1", "source": "ev", "target": "wait" },
                        { "id": "e2", "source": "wait", "target": "hide" }
                    ]
                }
            }
        })))
        .unwrap();
    wait_until("page load", || host.preview_state().current_page_id.is_some());

    engine.dispatch("click", "btn").unwrap();
    engine.reset().unwrap();
    std::thread::sleep(Duration::from_millis(300));
    // the timer fired into a stale generation and was dropped
    assert!(host.preview_state().items["box"].is_visible);

    engine.shutdown();
}

#[test]
fn test_reset_before_first_page_load_is_a_no_op() {
    let (engine, host, _) = setup();
    engine.reset().unwrap();
    std::thread::sleep(Duration::from_millis(50));
    assert!(host.preview_state().current_page_id.is_none());

    engine.shutdown();
}

#[test]
fn test_wait_for_click_resumes_once_and_rebinds() {
    let (engine, host, _) = setup();
    engine
        .load_page(page(json!({
            "id": "p1",
            "items": [item("start", "button"), item("next", "button")],
            "logic": {
                "start": {
                    "nodes": [
                        { "id": "ev", "type": "eventNode", "data": {} },
                        { "id": "wfc", "type": "waitForClickNode", "data": { "targetItemId": "next" } },
                        { "id": "hide", "type": "actionNode", "data": { "targetItemId": "TRIGGER_ITEM", "mode": "hide" } }
                    ],
                    "edges": [
                        { "id": "e1", "source": "ev", "target": "wfc" },
                        { "id": "e2", "source": "wfc", "target": "hide" }
                    ]
                }
            }
        })))
        .unwrap();
    wait_until("page load", || host.preview_state().current_page_id.is_some());

    engine.dispatch("click", "start").unwrap();
    std::thread::sleep(Duration::from_millis(50));
    // the chain is parked; nothing hidden yet
    assert!(host.preview_state().items["next"].is_visible);

    engine.dispatch("click", "next").unwrap();
    // the resumed chain is re-bound to the clicked item, not "start"
    wait_until("rebound trigger hidden", || !host.preview_state().items["next"].is_visible);
    assert!(host.preview_state().items["start"].is_visible);

    // the listener was drained; a second click changes nothing further
    let snapshot = host.preview_state().items["next"].clone();
    engine.dispatch("click", "next").unwrap();
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(host.preview_state().items["next"], snapshot);

    engine.shutdown();
}

#[test]
fn test_external_api_routes_success_and_stores_variable() {
    let (engine, host, effects) = setup();
    effects.set_fetch_response("https://api.test/ok", Ok(json!({ "answer": 42 })));
    engine
        .load_page(page(json!({
            "id": "p1",
            "items": [item("btn", "button"), item("box", "shape")],
            "logic": {
                "btn": {
                    "nodes": [
                        { "id": "ev", "type": "eventNode", "data": {} },
                        { "id": "api", "type": "externalApiNode", "data": { "url": "https://api.test/ok", "variableName": "resp" } },
                        { "id": "ok", "type": "actionNode", "data": { "targetItemId": "box", "mode": "hide" } },
                        { "id": "err", "type": "actionNode", "data": { "targetItemId": "box", "mode": "show" } }
                    ],
                    "edges": [
                        { "id": "e1", "source": "ev", "target": "api" },
                        { "id": "e2", "source": "api", "target": "ok", "sourceHandle": "success" },
                        { "id": "e3", "source": "api", "target": "err", "sourceHandle": "error" }
                    ]
                }
            }
        })))
        .unwrap();
    wait_until("page load", || host.preview_state().current_page_id.is_some());

    engine.dispatch("click", "btn").unwrap();
    wait_until("success branch", || !host.preview_state().items["box"].is_visible);
    wait_until("response stored", || {
        host.variables().get_value("resp") == Some(&json!({ "answer": 42 }))
    });

    engine.shutdown();
}

#[test]
fn test_external_api_error_routes_error_edge() {
    let (engine, host, effects) = setup();
    effects.set_fetch_response("https://api.test/bad", Err("503".to_string()));
    engine
        .load_page(page(json!({
            "id": "p1",
            "items": [item("btn", "button"), item("box", "shape")],
            "logic": {
                "btn": {
                    "nodes": [
                        { "id": "ev", "type": "eventNode", "data": {} },
                        { "id": "api", "type": "externalApiNode", "data": { "url": "https://api.test/bad" } },
                        { "id": "err", "type": "actionNode", "data": { "targetItemId": "box", "mode": "hide" } }
                    ],
                    "edges": [
                        { "id": "e1", "source": "ev", "target": "api" },
                        { "id": "e2", "source": "api", "target": "err", "sourceHandle": "error" }
                    ]
                }
            }
        })))
        .unwrap();
    wait_until("page load", || host.preview_state().current_page_id.is_some());

    engine.dispatch("click", "btn").unwrap();
    wait_until("error branch", || !host.preview_state().items["box"].is_visible);

    engine.shutdown();
}

#[test]
fn test_submit_form_rejection_routes_error_edge() {
    let (engine, host, effects) = setup();
    effects.set_lead_accept(false);
    engine
        .load_page(page(json!({
            "id": "p1",
            "items": [item("btn", "button"), item("box", "shape")],
            "logic": {
                "btn": {
                    "nodes": [
                        { "id": "ev", "type": "eventNode", "data": {} },
                        { "id": "sub", "type": "submitFormNode", "data": {} },
                        { "id": "err", "type": "actionNode", "data": { "targetItemId": "box", "mode": "hide" } }
                    ],
                    "edges": [
                        { "id": "e1", "source": "ev", "target": "sub" },
                        { "id": "e2", "source": "sub", "target": "err", "sourceHandle": "error" }
                    ]
                }
            }
        })))
        .unwrap();
    wait_until("page load", || host.preview_state().current_page_id.is_some());
    host.set_variables(Vars::new().with("email", "a@b.co").with("age", 30));

    engine.dispatch("click", "btn").unwrap();
    wait_until("error branch", || !host.preview_state().items["box"].is_visible);
    wait_until("submit telemetry", || effects.events().iter().any(|(t, _)| t == "submit_form"));

    // the outcome log names each submitted field with its value type
    let events = effects.events();
    let (_, detail) = events.iter().find(|(t, _)| t == "submit_form").unwrap();
    let fields = detail.get_value("fields").unwrap().as_array().unwrap().clone();
    assert!(fields.contains(&json!({ "name": "email", "type": "string" })));
    assert!(fields.contains(&json!({ "name": "age", "type": "number" })));

    engine.shutdown();
}

#[test]
fn test_confirmation_opens_and_resolves() {
    let (engine, host, _) = setup();
    engine
        .load_page(page(json!({
            "id": "p1",
            "items": [item("btn", "button"), item("box", "shape")],
            "logic": {
                "btn": {
                    "nodes": [
                        { "id": "ev", "type": "eventNode", "data": {} },
                        { "id": "conf", "type": "confirmationNode", "data": { "headerText": "Sure?" } },
                        { "id": "yes", "type": "actionNode", "data": { "targetItemId": "box", "mode": "hide" } },
                        { "id": "no", "type": "actionNode", "data": { "targetItemId": "box", "mode": "show" } }
                    ],
                    "edges": [
                        { "id": "e1", "source": "ev", "target": "conf" },
                        { "id": "e2", "source": "conf", "target": "yes", "sourceHandle": "confirm" },
                        { "id": "e3", "source": "conf", "target": "no", "sourceHandle": "back" }
                    ]
                }
            }
        })))
        .unwrap();
    wait_until("page load", || host.preview_state().current_page_id.is_some());

    engine.dispatch("click", "btn").unwrap();
    wait_until("modal open", || {
        host.preview_state().confirmation.as_ref().is_some_and(|m| m.is_open)
    });
    let modal = host.preview_state().confirmation.unwrap();
    assert_eq!(modal.header_text, "Sure?");
    assert!(host.preview_state().items["box"].is_visible);

    engine.resolve_confirmation(&modal.node_id, ConfirmationChoice::Confirm).unwrap();
    wait_until("confirm branch", || !host.preview_state().items["box"].is_visible);
    assert!(host.preview_state().confirmation.is_none());

    engine.shutdown();
}

#[test]
fn test_animate_writes_target_value_and_resumes() {
    let (engine, host, _) = setup();
    engine
        .load_page(page(json!({
            "id": "p1",
            "items": [item("btn", "button"), item("box", "shape")],
            "logic": {
                "btn": {
                    "nodes": [
                        { "id": "ev", "type": "eventNode", "data": {} },
                        { "id": "anim", "type": "animateNode", "data": {
                            "targetItemId": "box",
                            "property": "opacity",
                            "mode": "absolute",
                            "value": 0.25,
                            "durationS": 0.05
                        } },
                        { "id": "hide", "type": "actionNode", "data": { "targetItemId": "box", "mode": "hide" } }
                    ],
                    "edges": [
                        { "id": "e1", "source": "ev", "target": "anim" },
                        { "id": "e2", "source": "anim", "target": "hide" }
                    ]
                }
            }
        })))
        .unwrap();
    wait_until("page load", || host.preview_state().current_page_id.is_some());

    engine.dispatch("click", "btn").unwrap();
    wait_until("target value written", || host.preview_state().items["box"].opacity == 0.25);
    let transition = host.preview_state().items["box"].transition.clone();
    assert!(transition.is_some_and(|t| t.contains("opacity") && t.contains("ease")));
    wait_until("branch resumed after animation", || !host.preview_state().items["box"].is_visible);

    engine.shutdown();
}

#[test]
fn test_unknown_node_kind_halts_quietly() {
    let (engine, host, _) = setup();
    engine
        .load_page(page(json!({
            "id": "p1",
            "items": [item("btn", "button"), item("box", "shape")],
            "logic": {
                "btn": {
                    "nodes": [
                        { "id": "ev", "type": "eventNode", "data": {} },
                        { "id": "mystery", "type": "teleportNode", "data": {} },
                        { "id": "hide", "type": "actionNode", "data": { "targetItemId": "box", "mode": "hide" } }
                    ],
                    "edges": [
                        { "id": "e1", "source": "ev", "target": "mystery" },
                        { "id": "e2", "source": "mystery", "target": "hide" }
                    ]
                }
            }
        })))
        .unwrap();
    wait_until("page load", || host.preview_state().current_page_id.is_some());

    engine.dispatch("click", "btn").unwrap();
    std::thread::sleep(Duration::from_millis(100));
    // traversal halted at the unknown node without failing the page
    assert!(host.preview_state().items["box"].is_visible);

    engine.shutdown();
}

#[test]
fn test_event_fans_out_to_parallel_branches() {
    let (engine, host, effects) = setup();
    // the api branch fails remotely; the sibling branch from the same
    // event node still runs
    effects.set_fetch_response("https://api.test/x", Err("boom".to_string()));
    engine
        .load_page(page(json!({
            "id": "p1",
            "items": [item("btn", "button"), item("box", "shape")],
            "logic": {
                "btn": {
                    "nodes": [
                        { "id": "ev", "type": "eventNode", "data": {} },
                        { "id": "api", "type": "externalApiNode", "data": { "url": "https://api.test/x" } },
                        { "id": "hide", "type": "actionNode", "data": { "targetItemId": "box", "mode": "hide" } }
                    ],
                    "edges": [
                        { "id": "e1", "source": "ev", "target": "api" },
                        { "id": "e2", "source": "ev", "target": "hide" }
                    ]
                }
            }
        })))
        .unwrap();
    wait_until("page load", || host.preview_state().current_page_id.is_some());

    engine.dispatch("click", "btn").unwrap();
    wait_until("sibling still ran", || !host.preview_state().items["box"].is_visible);

    engine.shutdown();
}

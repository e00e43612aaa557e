//! Demo catalog and a loopback SDK
//!
//! The loopback SDK keeps conversations, messages and groups in memory so
//! every page of the demo catalog has something to call. Several methods
//! answer asynchronously, some fail with coded errors, and `im.addListener`
//! invokes the callback it receives.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use explorer_app::{Catalog, Deferred, PageSpec, SdkRegistry, Thrown};
use explorer_core::prelude::*;
use explorer_core::{
    duplicate_keys, LiveValue, MenuNode, ParameterDescriptor as P, ParameterSchema,
};
use serde_json::{json, Value};

/// Simulated network latency for deferred answers
const LATENCY: Duration = Duration::from_millis(120);

pub fn menu() -> Vec<MenuNode> {
    vec![
        MenuNode::branch(
            "im",
            "Messaging",
            vec![
                MenuNode::branch(
                    "im.conversations",
                    "Conversations",
                    vec![
                        MenuNode::leaf("im.createConversation", "Create conversation"),
                        MenuNode::leaf("im.getConversation", "Get conversation"),
                    ],
                ),
                MenuNode::branch(
                    "im.messages",
                    "Messages",
                    vec![
                        MenuNode::leaf("im.sendText", "Send text"),
                        MenuNode::leaf("im.sendFile", "Send file"),
                        MenuNode::leaf("im.recallMessage", "Recall message"),
                    ],
                ),
                MenuNode::branch(
                    "im.settings",
                    "Settings",
                    vec![
                        MenuNode::leaf("im.addListener", "Add listener"),
                        MenuNode::leaf("im.setRetryCount", "Retry count"),
                    ],
                ),
            ],
        ),
        MenuNode::branch(
            "group",
            "Groups",
            vec![
                MenuNode::leaf("group.createGroup", "Create group"),
                MenuNode::leaf("group.joinGroup", "Join group"),
                MenuNode::leaf("group.getGroupInfo", "Group info"),
                MenuNode::leaf("group.dismissGroup", "Dismiss group"),
            ],
        ),
    ]
}

/// Pages for every leaf of [`menu`]
pub fn catalog() -> Result<Catalog> {
    let mut catalog = Catalog::new(menu());
    catalog
        .add(
            PageSpec::new(
                "im",
                "createConversation",
                ParameterSchema::new(vec![
                    P::text("name").default("general"),
                    P::structured("members")
                        .default(r#"["alice", "bob"]"#)
                        .description("JSON array of user ids"),
                    P::boolean("private"),
                ])?,
            )
            .title("Create conversation")
            .store_result_as("conversation"),
        )
        .add(
            PageSpec::new(
                "im",
                "getConversation",
                ParameterSchema::new(vec![P::text("id").default("conv-1")])?,
            )
            .title("Get conversation"),
        )
        .add(
            PageSpec::new(
                "im",
                "sendText",
                ParameterSchema::new(vec![
                    P::structured("conversation")
                        .default("[[conversation]]")
                        .description("Conversation object, or [[conversation]] after creating one"),
                    P::text("text").default("hello"),
                    P::boolean("silent"),
                ])?,
            )
            .title("Send text")
            .store_result_as("lastMessage"),
        )
        .add(
            PageSpec::new(
                "im",
                "sendFile",
                ParameterSchema::new(vec![
                    P::structured("conversation").default("[[conversation]]"),
                    P::binary("file").label("File"),
                    P::text("caption"),
                ])?,
            )
            .title("Send file")
            .description("Uploads the first attached file")
            .store_result_as("lastMessage"),
        )
        .add(
            PageSpec::new(
                "im",
                "recallMessage",
                ParameterSchema::new(vec![P::structured("message").default("[[lastMessage]]")])?,
            )
            .title("Recall message"),
        )
        .add(
            PageSpec::new(
                "im",
                "addListener",
                ParameterSchema::new(vec![
                    P::text("event").default("message"),
                    P::callback("handler")
                        .default("return function(event) { console.log(event.text); return event.id; }")
                        .description("Called once with a sample event"),
                ])?,
            )
            .title("Add listener"),
        )
        .add(
            PageSpec::new(
                "im",
                "setRetryCount",
                ParameterSchema::new(vec![P::number("count").default(3)])?,
            )
            .title("Retry count"),
        )
        .add(
            PageSpec::new(
                "group",
                "createGroup",
                ParameterSchema::new(vec![
                    P::text("name").default("book club"),
                    P::structured("options").default(
                        r#"{"maxMembers": 2, "onFull": "return function(group) { return group.name; }"}"#,
                    ),
                ])?,
            )
            .title("Create group")
            .store_result_as("group"),
        )
        .add(
            PageSpec::new(
                "group",
                "joinGroup",
                ParameterSchema::new(vec![
                    P::structured("group").default("[[group]]"),
                    P::text("nickname").default("carol"),
                ])?,
            )
            .title("Join group"),
        )
        .add(
            PageSpec::new(
                "group",
                "getGroupInfo",
                ParameterSchema::new(vec![P::text("groupId").default("group-1")])?,
            )
            .title("Group info"),
        )
        .add(
            PageSpec::new(
                "group",
                "dismissGroup",
                ParameterSchema::new(vec![P::structured("group").default("[[group]]")])?,
            )
            .title("Dismiss group"),
        );

    for key in catalog.dangling_menu_keys() {
        warn!("Menu entry {} has no page", key);
    }
    for key in duplicate_keys(catalog.menu()) {
        warn!("Menu key {} appears more than once", key);
    }
    Ok(catalog)
}

/// In-memory state behind the loopback SDK
#[derive(Debug, Default)]
pub struct Loopback {
    next_id: u64,
    retry_count: i64,
    conversations: BTreeMap<String, Value>,
    messages: BTreeMap<String, Value>,
    groups: BTreeMap<String, Value>,
}

impl Loopback {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

type Shared = Arc<Mutex<Loopback>>;

fn lock(state: &Shared) -> std::result::Result<MutexGuard<'_, Loopback>, Thrown> {
    state
        .lock()
        .map_err(|_| Thrown::coded("INTERNAL", "loopback state is poisoned"))
}

fn arg(args: &[LiveValue], index: usize) -> LiveValue {
    args.get(index).cloned().unwrap_or_default()
}

/// An id given directly as a string, or an object's `id` member
fn id_of(value: &LiveValue) -> Option<String> {
    match value {
        LiveValue::String(s) => Some(s.clone()),
        other => other.get("id").and_then(LiveValue::as_str).map(str::to_string),
    }
}

fn require_id(value: &LiveValue, what: &str) -> std::result::Result<String, Thrown> {
    id_of(value).ok_or_else(|| {
        Thrown::coded("INVALID_ARGUMENT", format!("expected a {} or its id", what))
    })
}

/// The loopback SDK with a fresh in-memory state
pub fn registry() -> SdkRegistry {
    registry_with(Arc::new(Mutex::new(Loopback::default())))
}

/// Register the `im` and `group` namespaces over `state`
pub fn registry_with(state: Shared) -> SdkRegistry {
    let mut registry = SdkRegistry::new();
    register_im(&mut registry, &state);
    register_group(&mut registry, &state);
    registry
}

fn register_im(registry: &mut SdkRegistry, state: &Shared) {
    let s = state.clone();
    registry.register(
        "im",
        "createConversation",
        move |args: Vec<LiveValue>| -> std::result::Result<Deferred, Thrown> {
            let name = arg(&args, 0).to_string();
            if name.trim().is_empty() {
                return Err(Thrown::coded("INVALID_ARGUMENT", "conversation name is empty"));
            }
            let members = arg(&args, 1).to_json();
            let private = arg(&args, 2).as_bool().unwrap_or(false);
            let s = s.clone();
            Ok(Deferred::pending(async move {
                tokio::time::sleep(LATENCY).await;
                let mut state = lock(&s)?;
                let id = state.next_id("conv");
                let conversation = json!({
                    "id": id,
                    "name": name,
                    "members": members,
                    "private": private,
                });
                state.conversations.insert(id, conversation.clone());
                Ok(LiveValue::from(conversation))
            }))
        },
    );

    let s = state.clone();
    registry.register(
        "im",
        "getConversation",
        move |args: Vec<LiveValue>| -> std::result::Result<Deferred, Thrown> {
            let id = require_id(&arg(&args, 0), "conversation")?;
            let state = lock(&s)?;
            match state.conversations.get(&id) {
                Some(conversation) => Ok(Deferred::ready(LiveValue::from(conversation.clone()))),
                None => Err(Thrown::coded("NOT_FOUND", format!("no conversation {}", id))),
            }
        },
    );

    let s = state.clone();
    registry.register(
        "im",
        "sendText",
        move |args: Vec<LiveValue>| -> std::result::Result<Deferred, Thrown> {
            let conversation = require_id(&arg(&args, 0), "conversation")?;
            let text = arg(&args, 1).to_string();
            let silent = arg(&args, 2).as_bool().unwrap_or(false);
            let s = s.clone();
            Ok(Deferred::pending(async move {
                tokio::time::sleep(LATENCY).await;
                let mut state = lock(&s)?;
                if !state.conversations.contains_key(&conversation) {
                    return Err(Thrown::coded(
                        "NOT_FOUND",
                        format!("no conversation {}", conversation),
                    )
                    .with_detail(json!({ "conversationId": conversation })));
                }
                let id = state.next_id("msg");
                let message = json!({
                    "id": id,
                    "conversationId": conversation,
                    "text": text,
                    "silent": silent,
                });
                state.messages.insert(id, message.clone());
                Ok(LiveValue::from(message))
            }))
        },
    );

    let s = state.clone();
    registry.register(
        "im",
        "sendFile",
        move |args: Vec<LiveValue>| -> std::result::Result<Deferred, Thrown> {
            let conversation = require_id(&arg(&args, 0), "conversation")?;
            let file = arg(&args, 1)
                .as_attachment()
                .cloned()
                .ok_or_else(|| Thrown::coded("INVALID_ARGUMENT", "expected a file"))?;
            let caption = arg(&args, 2).to_string();
            let s = s.clone();
            Ok(Deferred::pending(async move {
                let bytes = file
                    .read()
                    .map_err(|e| Thrown::coded("UPLOAD_FAILED", e.to_string()))?;
                tokio::time::sleep(LATENCY).await;
                let mut state = lock(&s)?;
                let id = state.next_id("msg");
                let message = json!({
                    "id": id,
                    "conversationId": conversation,
                    "fileName": file.name,
                    "size": bytes.len(),
                    "caption": caption,
                });
                state.messages.insert(id, message.clone());
                Ok(LiveValue::from(message))
            }))
        },
    );

    let s = state.clone();
    registry.register(
        "im",
        "recallMessage",
        move |args: Vec<LiveValue>| -> std::result::Result<Deferred, Thrown> {
            let id = require_id(&arg(&args, 0), "message")?;
            let mut state = lock(&s)?;
            match state.messages.remove(&id) {
                Some(_) => Ok(Deferred::ready(LiveValue::from(json!({
                    "id": id,
                    "recalled": true,
                })))),
                None => Err(Thrown::coded("NOT_FOUND", format!("no message {}", id))),
            }
        },
    );

    let s = state.clone();
    registry.register(
        "im",
        "addListener",
        move |args: Vec<LiveValue>| -> std::result::Result<Deferred, Thrown> {
            let event = arg(&args, 0).to_string();
            let handler = arg(&args, 1);
            let callback = handler
                .as_callback()
                .ok_or_else(|| Thrown::coded("INVALID_ARGUMENT", "handler must be a function"))?;

            let listener = lock(&s)?.next_id("listener");
            let sample = LiveValue::from(json!({
                "id": "msg-sample",
                "type": event,
                "text": "sample event",
            }));
            let returned = callback
                .call(&[sample])
                .map_err(|e| Thrown::coded("CALLBACK_FAILED", e.to_string()))?;

            Ok(Deferred::ready(LiveValue::Object(vec![
                ("listener".to_string(), LiveValue::from(listener)),
                ("event".to_string(), LiveValue::from(event)),
                ("handlerReturned".to_string(), returned),
            ])))
        },
    );

    let s = state.clone();
    registry.register(
        "im",
        "setRetryCount",
        move |args: Vec<LiveValue>| -> std::result::Result<Deferred, Thrown> {
            let count = arg(&args, 0).as_i64().unwrap_or(-1);
            if count < 0 {
                // the SDK throws a bare value here, not an error object
                return Err(Thrown::value(json!({ "rejected": count })));
            }
            let previous = std::mem::replace(&mut lock(&s)?.retry_count, count);
            Ok(Deferred::ready(LiveValue::from(json!({
                "previous": previous,
                "retryCount": count,
            }))))
        },
    );
}

fn register_group(registry: &mut SdkRegistry, state: &Shared) {
    let s = state.clone();
    registry.register(
        "group",
        "createGroup",
        move |args: Vec<LiveValue>| -> std::result::Result<Deferred, Thrown> {
            let name = arg(&args, 0).to_string();
            let options = arg(&args, 1);
            let max_members = options
                .get("maxMembers")
                .and_then(LiveValue::as_i64)
                .unwrap_or(100);
            let has_full_hook = options
                .get("onFull")
                .and_then(LiveValue::as_callback)
                .is_some_and(|cb| cb.is_compiled());
            let s = s.clone();
            Ok(Deferred::pending(async move {
                tokio::time::sleep(LATENCY).await;
                let mut state = lock(&s)?;
                let id = state.next_id("group");
                let group = json!({
                    "id": id,
                    "name": name,
                    "maxMembers": max_members,
                    "members": [],
                    "hasFullHook": has_full_hook,
                });
                state.groups.insert(id, group.clone());
                Ok(LiveValue::from(group))
            }))
        },
    );

    let s = state.clone();
    registry.register(
        "group",
        "joinGroup",
        move |args: Vec<LiveValue>| -> std::result::Result<Deferred, Thrown> {
            let id = require_id(&arg(&args, 0), "group")?;
            let nickname = arg(&args, 1).to_string();
            let mut state = lock(&s)?;
            let group = state
                .groups
                .get_mut(&id)
                .ok_or_else(|| Thrown::coded("NOT_FOUND", format!("no group {}", id)))?;

            let max = group["maxMembers"].as_i64().unwrap_or(0);
            let members = group["members"].as_array_mut().ok_or_else(|| {
                Thrown::coded("INTERNAL", "group record has no member list")
            })?;
            if members.len() as i64 >= max {
                return Err(Thrown::coded("GROUP_FULL", format!("group {} is full", id))
                    .with_detail(json!({ "maxMembers": max })));
            }
            members.push(Value::String(nickname));
            Ok(Deferred::ready(LiveValue::from(group.clone())))
        },
    );

    let s = state.clone();
    registry.register(
        "group",
        "getGroupInfo",
        move |args: Vec<LiveValue>| -> std::result::Result<Deferred, Thrown> {
            let id = require_id(&arg(&args, 0), "group")?;
            let state = lock(&s)?;
            state
                .groups
                .get(&id)
                .map(|group| Deferred::ready(LiveValue::from(group.clone())))
                .ok_or_else(|| Thrown::coded("NOT_FOUND", format!("no group {}", id)))
        },
    );

    let s = state.clone();
    registry.register(
        "group",
        "dismissGroup",
        move |args: Vec<LiveValue>| -> std::result::Result<Deferred, Thrown> {
            let id = require_id(&arg(&args, 0), "group")?;
            let s = s.clone();
            Ok(Deferred::pending(async move {
                tokio::time::sleep(LATENCY).await;
                match lock(&s)?.groups.remove(&id) {
                    Some(_) => Ok(LiveValue::Null),
                    None => Err(Thrown::coded("NOT_FOUND", format!("no group {}", id))),
                }
            }))
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use explorer_app::{invoke, SdkMethod};
    use explorer_core::{find_ancestor_keys, leaf_keys, Callback, CallbackError, FormKey};

    fn call(registry: &SdkRegistry, key: &str, args: Vec<LiveValue>) -> explorer_app::Outcome {
        let method = registry.get(&FormKey::parse(key).unwrap()).unwrap();
        tokio_test::block_on(invoke(move || method.call(args)))
    }

    #[test]
    fn test_every_menu_leaf_has_page_and_method() {
        let catalog = catalog().unwrap();
        let registry = registry();

        assert!(catalog.dangling_menu_keys().is_empty());
        assert!(duplicate_keys(catalog.menu()).is_empty());
        for key in leaf_keys(&menu()) {
            let key = FormKey::parse(&key).unwrap();
            assert!(catalog.get(&key).is_some(), "no page for {}", key);
            assert!(registry.contains(&key), "no method for {}", key);
        }
    }

    #[test]
    fn test_menu_ancestors_for_nested_page() {
        assert_eq!(
            find_ancestor_keys(&menu(), "im.sendText"),
            vec!["im".to_string(), "im.messages".to_string()]
        );
    }

    #[tokio::test]
    async fn test_conversation_then_message() {
        let registry = registry();
        let key = FormKey::new("im", "createConversation");
        let method = registry.get(&key).unwrap();
        let conversation = invoke(move || {
            method.call(vec![
                LiveValue::from("general"),
                LiveValue::from(json!(["alice"])),
                LiveValue::from(false),
            ])
        })
        .await
        .unwrap();
        assert_eq!(conversation.get("id").and_then(LiveValue::as_str), Some("conv-1"));

        let method = registry.get(&FormKey::new("im", "sendText")).unwrap();
        let message = invoke(move || {
            method.call(vec![conversation, LiveValue::from("hi"), LiveValue::from(true)])
        })
        .await
        .unwrap();
        assert_eq!(
            message.get("conversationId").and_then(LiveValue::as_str),
            Some("conv-1")
        );
    }

    #[test]
    fn test_unknown_conversation_is_coded_error() {
        let registry = registry();
        let err = call(&registry, "im.getConversation", vec![LiveValue::from("nope")]).unwrap_err();
        assert_eq!(err.code.as_deref(), Some("NOT_FOUND"));
    }

    #[test]
    fn test_negative_retry_count_throws_plain_value() {
        let registry = registry();
        let err = call(&registry, "im.setRetryCount", vec![LiveValue::from(-1_i64)]).unwrap_err();
        assert!(err.code.is_none());
        assert!(err.message.contains("rejected"));
    }

    #[test]
    fn test_add_listener_invokes_callback() {
        let registry = registry();
        let echo_type: Arc<dyn explorer_core::CompiledFunction> =
            Arc::new(|args: &[LiveValue]| -> std::result::Result<LiveValue, CallbackError> {
                Ok(args[0].get("type").cloned().unwrap_or_default())
            });
        let handler = LiveValue::Callback(Callback::compiled("function(e){return e.type}", echo_type));

        let result = call(
            &registry,
            "im.addListener",
            vec![LiveValue::from("message"), handler],
        )
        .unwrap();

        assert_eq!(result.get("handlerReturned"), Some(&LiveValue::from("message")));
    }

    #[test]
    fn test_add_listener_rejects_uncompiled_handler() {
        let registry = registry();
        let handler = LiveValue::Callback(Callback::source_only("function(e){}"));
        let err = call(
            &registry,
            "im.addListener",
            vec![LiveValue::from("message"), handler],
        )
        .unwrap_err();
        assert_eq!(err.code.as_deref(), Some("CALLBACK_FAILED"));
    }

    #[tokio::test]
    async fn test_group_fills_up() {
        let state = Arc::new(Mutex::new(Loopback::default()));
        let registry = registry_with(state.clone());

        let method = registry.get(&FormKey::new("group", "createGroup")).unwrap();
        let group = invoke(move || {
            method.call(vec![
                LiveValue::from("club"),
                LiveValue::from(json!({"maxMembers": 1})),
            ])
        })
        .await
        .unwrap();

        let join = registry.get(&FormKey::new("group", "joinGroup")).unwrap();
        let first_group = group.clone();
        let first = join.clone();
        assert!(invoke(move || first.call(vec![first_group, LiveValue::from("a")]))
            .await
            .is_ok());
        let err = invoke(move || join.call(vec![group, LiveValue::from("b")]))
            .await
            .unwrap_err();
        assert_eq!(err.code.as_deref(), Some("GROUP_FULL"));
        assert_eq!(state.lock().unwrap().groups.len(), 1);
    }
}

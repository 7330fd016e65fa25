//! Push-style messages the server piggybacks on responses, and the reducers
//! that fold them into the loaded player tree.

use serde_json::Value;
use tracing::{info, warn};

use crate::api::merge::merge_deep;
use crate::data::player::PlayerData;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdatePatch {
    pub player: Option<Value>,
    pub character: Option<Value>,
    pub event: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeletePatch {
    /// Collection name to a list of `{id}` stubs to remove.
    pub character: Option<Value>,
    pub event: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Update(UpdatePatch),
    Delete(DeletePatch),
    /// Forwarded to the caller uninterpreted.
    Ephemeral(Value),
    Unknown { action: String },
    /// A message without an `action`; forwarded like an ephemeral.
    Untagged(Value),
}

impl ServerMessage {
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut body) = value else {
            return ServerMessage::Untagged(value);
        };
        let Some(action) = body.get("action").and_then(Value::as_str).map(str::to_owned) else {
            return ServerMessage::Untagged(Value::Object(body));
        };
        match action.as_str() {
            "update" => ServerMessage::Update(UpdatePatch {
                player: body.remove("player"),
                character: body.remove("character"),
                event: body.remove("event"),
            }),
            "delete" => ServerMessage::Delete(DeletePatch {
                character: body.remove("character"),
                event: body.remove("event"),
            }),
            "ephemeral" => ServerMessage::Ephemeral(Value::Object(body)),
            _ => ServerMessage::Unknown { action },
        }
    }
}

/// Flattens a response body (single message, array, or nested arrays) into messages.
pub fn parse_messages(value: Value) -> Vec<ServerMessage> {
    let mut messages = Vec::new();
    collect_messages(value, &mut messages);
    messages
}

fn collect_messages(value: Value, out: &mut Vec<ServerMessage>) {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                collect_messages(item, out);
            }
        }
        other => out.push(ServerMessage::from_value(other)),
    }
}

pub fn apply_update(player: &mut PlayerData, patch: UpdatePatch) {
    if let Some(update) = patch.player {
        merge_deep(player.tree_mut(), update);
    }

    if let Some(update) = patch.character {
        match player.character_mut() {
            Some(character) => merge_deep(character, update),
            None => {
                if let Value::Object(tree) = player.tree_mut() {
                    tree.insert("character".to_string(), update);
                }
            }
        }
    }

    if let Some(update) = patch.event {
        let single_event = player
            .character_mut()
            .and_then(|character| character.get_mut("events"))
            .and_then(Value::as_array_mut)
            .filter(|events| events.len() == 1)
            .and_then(|events| events.first_mut());
        if let Some(event) = single_event {
            merge_deep(event, update);
        }
    }
}

pub fn apply_delete(player: &mut PlayerData, patch: DeletePatch) {
    if let Some(Value::Object(collections)) = patch.character {
        let Some(Value::Object(character)) = player.character_mut() else {
            warn!("delete not applied; no character loaded; data is most likely stale");
            return;
        };
        for (collection, stubs) in collections {
            let (Value::Array(stubs), Some(Value::Array(items))) =
                (stubs, character.get_mut(&collection))
            else {
                continue;
            };
            let ids: Vec<Value> = stubs
                .iter()
                .filter_map(|stub| stub.get("id").cloned())
                .collect();
            items.retain(|item| item.get("id").map_or(true, |id| !ids.contains(id)));
        }
        return;
    }

    if let Some(adventure_id) = patch.event.as_ref().and_then(single_adventure_id) {
        let adventures = player
            .character_mut()
            .and_then(|character| character.pointer_mut("/events/0/content/gather_pools/0/adventures"))
            .and_then(Value::as_array_mut);
        match adventures {
            Some(adventures) => {
                adventures.retain(|adventure| adventure.get("id") != Some(&adventure_id));
            }
            None => warn!("delete not applied; no gather pool loaded; data is most likely stale"),
        }
        return;
    }

    warn!("delete not applied; data is most likely stale; user should refresh");
}

/// Id of the one adventure in a delete for an event with exactly one gather
/// pool holding exactly one adventure.
fn single_adventure_id(event: &Value) -> Option<Value> {
    let pools = event.pointer("/content/gather_pools")?.as_array()?;
    let [pool] = pools.as_slice() else {
        return None;
    };
    let adventures = pool.get("adventures")?.as_array()?;
    let [adventure] = adventures.as_slice() else {
        return None;
    };
    adventure.get("id").cloned()
}

/// Applies messages in order and returns the ephemeral and untagged payloads.
pub fn apply_messages(player: &mut PlayerData, messages: Vec<ServerMessage>) -> Vec<Value> {
    let mut forwarded = Vec::new();
    for message in messages {
        match message {
            ServerMessage::Update(patch) => apply_update(player, patch),
            ServerMessage::Delete(patch) => apply_delete(player, patch),
            ServerMessage::Ephemeral(body) => forwarded.push(body),
            ServerMessage::Untagged(body) => {
                info!("forwarding message without an action");
                forwarded.push(body);
            }
            ServerMessage::Unknown { action } => {
                warn!(%action, "unknown data action not applied; data is most likely stale");
            }
        }
    }
    forwarded
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn messages_are_classified_by_action() {
        let messages = parse_messages(json!([
            { "action": "update", "character": { "money": 1 } },
            [{ "action": "delete", "character": { "items": [{ "id": 1 }] } }],
            { "action": "ephemeral", "toast": "hi" },
            { "action": "rewind" },
            { "crew": {} },
            null
        ]));
        assert_eq!(messages.len(), 5);
        assert!(matches!(messages[0], ServerMessage::Update(_)));
        assert!(matches!(messages[1], ServerMessage::Delete(_)));
        assert_eq!(
            messages[2],
            ServerMessage::Ephemeral(json!({ "action": "ephemeral", "toast": "hi" }))
        );
        assert_eq!(
            messages[3],
            ServerMessage::Unknown {
                action: "rewind".to_string()
            }
        );
        assert!(matches!(messages[4], ServerMessage::Untagged(_)));
    }
}

//! # Live Collection Stream
//!
//! The database streams changes to a collection as server-sent events when
//! it is read with `Accept: text/event-stream`:
//!
//! | Event | Data | Effect |
//! |-------|------|--------|
//! | `put` | `{"path": P, "data": D}` | replace the node at `P` with `D` (`null` deletes) |
//! | `patch` | `{"path": P, "data": {k: v, ..}}` | replace each child `P/k` with `v` |
//! | `keep-alive` | `null` | none |
//! | `cancel` | reason | stream ends with an error |
//! | `auth_revoked` | reason | stream ends with an error |
//!
//! The first event is a `put` at `/` carrying the whole collection.
//! [`EventStream`] mirrors the collection locally and hands back the full
//! tree after every `put` or `patch`, so consumers only ever see complete
//! snapshots.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::StoreError;

/// The local mirror of one collection: record key → record body.
pub(crate) type Tree = Map<String, Value>;

/// One parsed server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ServerEvent {
    pub(crate) name: String,
    pub(crate) data: String,
}

#[derive(Deserialize)]
struct PathData {
    path: String,
    data: Value,
}

/// Parse one event block (the lines between blank-line separators).
///
/// Returns `None` for comment-only or empty blocks.
pub(crate) fn parse_event(block: &str) -> Option<ServerEvent> {
    let mut name = None;
    let mut data: Vec<&str> = Vec::new();
    for line in block.lines() {
        if line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };
        match field {
            "event" => name = Some(value.to_string()),
            "data" => data.push(value),
            _ => {}
        }
    }
    if name.is_none() && data.is_empty() {
        return None;
    }
    Some(ServerEvent {
        name: name.unwrap_or_else(|| "message".to_string()),
        data: data.join("\n"),
    })
}

/// Apply one event to the mirrored tree.
///
/// Returns `Ok(true)` when the tree changed, `Ok(false)` for events that
/// carry no data, and `Err(reason)` when the server ended the stream or
/// sent something unreadable.
pub(crate) fn apply_event(tree: &mut Value, event: &ServerEvent) -> Result<bool, String> {
    match event.name.as_str() {
        "put" | "patch" => {
            let body: PathData = serde_json::from_str(&event.data)
                .map_err(|e| format!("malformed {} event: {e}", event.name))?;
            let segments = split_path(&body.path);
            if event.name == "put" {
                set_path(tree, &segments, body.data);
            } else {
                let Value::Object(children) = body.data else {
                    return Err("patch event data is not an object".to_string());
                };
                for (child, value) in children {
                    let mut full = segments.clone();
                    full.extend(split_path(&child));
                    set_path(tree, &full, value);
                }
            }
            Ok(true)
        }
        "keep-alive" => Ok(false),
        "cancel" => Err(format!("cancelled by the server: {}", event.data)),
        "auth_revoked" => Err("credential expired or was revoked".to_string()),
        other => {
            tracing::debug!(event = other, "ignoring unknown stream event");
            Ok(false)
        }
    }
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Replace the node at `segments` with `data`. Writing `null` deletes the
/// node, and parents left empty are pruned, as the database does.
pub(crate) fn set_path(node: &mut Value, segments: &[&str], data: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = data;
        return;
    };
    if !node.is_object() {
        if data.is_null() {
            return;
        }
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return;
    };
    let child = map.entry(head.to_string()).or_insert(Value::Null);
    set_path(child, rest, data);
    let prune = child.is_null() || child.as_object().is_some_and(Map::is_empty);
    if prune {
        map.remove(*head);
    }
}

/// The mirrored tree as a record map. A missing collection is empty.
pub(crate) fn as_tree(node: &Value) -> Tree {
    match node {
        Value::Object(map) => map.clone(),
        _ => Tree::new(),
    }
}

/// A decoded server-sent event stream over one collection.
pub(crate) struct EventStream {
    endpoint: String,
    response: reqwest::Response,
    buffer: Vec<u8>,
    tree: Value,
    finished: bool,
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("endpoint", &self.endpoint)
            .field("buffered", &self.buffer.len())
            .field("finished", &self.finished)
            .finish()
    }
}

impl EventStream {
    pub(crate) fn new(endpoint: String, response: reqwest::Response) -> Self {
        Self {
            endpoint,
            response,
            buffer: Vec::new(),
            tree: Value::Null,
            finished: false,
        }
    }

    /// Wait for the next change and return the full collection after it.
    ///
    /// `None` once the server closes the stream.
    pub(crate) async fn next_tree(&mut self) -> Option<Result<Tree, StoreError>> {
        loop {
            while let Some(event) = self.take_event() {
                tracing::debug!(endpoint = %self.endpoint, event = %event.name, "stream event");
                match apply_event(&mut self.tree, &event) {
                    Ok(true) => return Some(Ok(as_tree(&self.tree))),
                    Ok(false) => {}
                    Err(reason) => {
                        self.finished = true;
                        return Some(Err(StoreError::Stream {
                            endpoint: self.endpoint.clone(),
                            reason,
                        }));
                    }
                }
            }
            if self.finished {
                return None;
            }
            match self.response.chunk().await {
                Ok(Some(bytes)) => self.buffer.extend(bytes.iter().filter(|b| **b != b'\r')),
                Ok(None) => {
                    self.finished = true;
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(StoreError::Http {
                        endpoint: self.endpoint.clone(),
                        source: e,
                    }));
                }
            }
        }
    }

    /// Pop the next complete event off the buffer.
    fn take_event(&mut self) -> Option<ServerEvent> {
        loop {
            let end = self.buffer.windows(2).position(|w| w == b"\n\n")?;
            let block: Vec<u8> = self.buffer.drain(..end + 2).collect();
            let text = String::from_utf8_lossy(&block[..end]);
            if let Some(event) = parse_event(&text) {
                return Some(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(name: &str, data: Value) -> ServerEvent {
        ServerEvent {
            name: name.to_string(),
            data: data.to_string(),
        }
    }

    #[test]
    fn parses_event_blocks() {
        let ev = parse_event("event: put\ndata: {\"path\":\"/\",\"data\":null}").unwrap();
        assert_eq!(ev.name, "put");
        assert_eq!(ev.data, "{\"path\":\"/\",\"data\":null}");
        assert!(parse_event(": comment only").is_none());
        assert_eq!(parse_event("data: x").unwrap().name, "message");
    }

    #[test]
    fn root_put_replaces_everything() {
        let mut tree = json!({"old": {"a": 1}});
        let changed = apply_event(
            &mut tree,
            &event("put", json!({"path": "/", "data": {"-N1": {"name": "Idli"}}})),
        )
        .unwrap();
        assert!(changed);
        assert_eq!(tree, json!({"-N1": {"name": "Idli"}}));
    }

    #[test]
    fn nested_put_and_delete() {
        let mut tree = json!({"-N1": {"name": "Idli", "amount": 40}});
        apply_event(
            &mut tree,
            &event("put", json!({"path": "/-N1/amount", "data": 45})),
        )
        .unwrap();
        assert_eq!(tree["-N1"]["amount"], json!(45));

        apply_event(&mut tree, &event("put", json!({"path": "/-N2", "data": {"name": "Vada"}})))
            .unwrap();
        apply_event(&mut tree, &event("put", json!({"path": "/-N1", "data": null}))).unwrap();
        assert_eq!(tree, json!({"-N2": {"name": "Vada"}}));
    }

    #[test]
    fn deleting_last_child_prunes_parent() {
        let mut tree = json!({"-N1": {"name": "Idli"}});
        apply_event(&mut tree, &event("put", json!({"path": "/-N1/name", "data": null}))).unwrap();
        assert_eq!(as_tree(&tree), Tree::new());
    }

    #[test]
    fn patch_merges_children() {
        let mut tree = json!({"-N1": {"name": "Idli", "amount": 40}});
        apply_event(
            &mut tree,
            &event("patch", json!({"path": "/-N1", "data": {"amount": 50, "rating": 5}})),
        )
        .unwrap();
        assert_eq!(tree, json!({"-N1": {"name": "Idli", "amount": 50, "rating": 5}}));
    }

    #[test]
    fn keep_alive_changes_nothing() {
        let mut tree = json!({});
        assert!(!apply_event(&mut tree, &ServerEvent {
            name: "keep-alive".into(),
            data: "null".into()
        })
        .unwrap());
    }

    #[test]
    fn cancel_and_revocation_end_the_stream() {
        let mut tree = Value::Null;
        assert!(apply_event(&mut tree, &ServerEvent {
            name: "cancel".into(),
            data: "\"permission denied\"".into()
        })
        .is_err());
        assert!(apply_event(&mut tree, &ServerEvent {
            name: "auth_revoked".into(),
            data: "\"expired\"".into()
        })
        .is_err());
    }

    #[test]
    fn null_root_is_an_empty_collection() {
        let mut tree = json!({"-N1": {}});
        apply_event(&mut tree, &event("put", json!({"path": "/", "data": null}))).unwrap();
        assert!(as_tree(&tree).is_empty());
    }
}

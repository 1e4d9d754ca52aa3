//! Client behavior against in-process transport doubles.
//!
//! `MemoryTransport` answers requests from a JSON tree held in memory, using
//! the mock server's tree operations, and records every request it receives.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use percent_encoding::percent_decode_str;
use rtdb_core::{
    ClientConfig, DatabaseClient, DbError, HttpMethod, HttpRequest, HttpResponse, Transport, TransportError,
};
use serde_json::{json, Value};

const BASE_URL: &str = "mem://db";

#[derive(Default)]
struct MemoryTransport {
    root: Mutex<Value>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MemoryTransport {
    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn root(&self) -> Value {
        self.root.lock().unwrap().clone()
    }
}

impl Transport for MemoryTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());

        let rest = request.url.strip_prefix(BASE_URL).unwrap();
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
        let path = path.strip_suffix(".json").unwrap();
        let keys: Vec<String> = mock_server::tree::segments(path)
            .into_iter()
            .map(|s| percent_decode_str(s).decode_utf8().unwrap().into_owned())
            .collect();
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        let shallow = query.split('&').any(|kv| kv == "shallow=true");
        let body: Value = request
            .body
            .as_deref()
            .map(|b| serde_json::from_str(b).unwrap())
            .unwrap_or(Value::Null);

        let mut root = self.root.lock().unwrap();
        let reply = match request.method {
            HttpMethod::Get => {
                let node = mock_server::tree::get(&root, &keys).cloned().unwrap_or(Value::Null);
                if shallow {
                    mock_server::tree::shallow(&node)
                } else {
                    node
                }
            }
            HttpMethod::Put => {
                mock_server::tree::set(&mut root, &keys, body.clone());
                body
            }
            HttpMethod::Post => json!({ "name": mock_server::tree::push(&mut root, &keys, body) }),
            HttpMethod::Patch => {
                let Value::Object(patch) = body else {
                    return Ok(HttpResponse::new(400, r#"{"error":"expected object"}"#));
                };
                mock_server::tree::merge(&mut root, &keys, patch.clone());
                Value::Object(patch)
            }
            HttpMethod::Delete => {
                mock_server::tree::remove(&mut root, &keys);
                Value::Null
            }
        };
        Ok(HttpResponse::new(200, reply.to_string()))
    }
}

/// Always answers with the same status and body, counting calls.
struct FixedStatus {
    status: u16,
    body: &'static str,
    calls: AtomicUsize,
}

impl Transport for FixedStatus {
    fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(HttpResponse::new(self.status, self.body))
    }
}

/// Fails every request as if the network were down, counting calls.
#[derive(Default)]
struct Unreachable {
    calls: AtomicUsize,
}

impl Transport for Unreachable {
    fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(TransportError::from_source(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        )))
    }
}

fn memory_client() -> (Arc<MemoryTransport>, DatabaseClient<Arc<MemoryTransport>>) {
    let transport = Arc::new(MemoryTransport::default());
    let client = DatabaseClient::with_transport(ClientConfig::new(BASE_URL), Arc::clone(&transport));
    (transport, client)
}

#[test]
fn write_then_get_returns_equal_value() {
    let (_, client) = memory_client();
    let values = [
        json!("plain string"),
        json!(42),
        json!(1.5),
        json!(true),
        json!({ "name": "Ada", "langs": ["en", "fr"], "address": { "city": "London" } }),
        json!([1, 2, 3]),
    ];
    for (i, value) in values.iter().enumerate() {
        let path = format!("/values/{i}");
        client.set(&path, value).unwrap();
        let back: Value = client.get(&path).unwrap();
        assert_eq!(&back, value, "{path}");
    }
}

#[test]
fn set_replaces_whole_node() {
    let (_, client) = memory_client();
    client.set("/u", &json!({ "a": 1, "b": 2 })).unwrap();
    client.set("/u", &json!({ "c": 3 })).unwrap();
    let back: Value = client.get("/u").unwrap();
    assert_eq!(back, json!({ "c": 3 }));
}

#[test]
fn update_merges_without_replacing_siblings() {
    let (transport, client) = memory_client();
    client.set("/u", &json!({ "name": "Ada", "age": 36 })).unwrap();
    client.update("/u", &json!({ "age": 37 })).unwrap();

    let back: Value = client.get("/u").unwrap();
    assert_eq!(back, json!({ "name": "Ada", "age": 37 }));

    let patch = &transport.requests()[1];
    assert_eq!(patch.method, HttpMethod::Patch);
    assert_eq!(patch.body.as_deref(), Some(r#"{"age":37}"#));
}

#[test]
fn push_posts_and_leaves_siblings_alone() {
    let (transport, client) = memory_client();
    client.set("/list", &json!({ "existing": "keep me" })).unwrap();

    let key = client.push("/list", &json!("new")).unwrap().unwrap();

    let requests = transport.requests();
    let post = requests.last().unwrap();
    assert_eq!(post.method, HttpMethod::Post);
    assert_eq!(post.url, "mem://db/list.json");
    assert_eq!(post.body.as_deref(), Some(r#""new""#));
    assert_eq!(requests.len(), 2);

    let root = transport.root();
    assert_eq!(root["list"]["existing"], "keep me");
    assert_eq!(root["list"][&key], "new");
}

#[test]
fn delete_sends_empty_body_and_node_reads_null() {
    let (transport, client) = memory_client();
    client.set("/users/42", &json!({ "name": "Ada" })).unwrap();

    client.delete("/users/42").unwrap();

    let delete = transport.requests().pop().unwrap();
    assert_eq!(delete.method, HttpMethod::Delete);
    assert!(delete.body.is_none());
    assert!(delete.headers.is_empty());

    let back: Option<Value> = client.get("/users/42").unwrap();
    assert!(back.is_none());
    let raw: Value = client.get("/users/42").unwrap();
    assert_eq!(raw, Value::Null);
}

#[test]
fn shallow_only_applies_to_reads() {
    let (transport, client) = memory_client();
    let shallow = client.with_shallow(true);
    shallow.set("/a", &json!({ "b": { "c": 1 }, "d": 2 })).unwrap();

    let top: Value = shallow.get("/a").unwrap();
    assert_eq!(top, json!({ "b": true, "d": true }));

    shallow.delete("/a").unwrap();
    let urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
    assert_eq!(
        urls,
        vec![
            "mem://db/a.json".to_string(),
            "mem://db/a.json?shallow=true".to_string(),
            "mem://db/a.json".to_string(),
        ]
    );
}

#[test]
fn non_success_status_is_remote_error_for_every_operation() {
    for status in [404, 500] {
        let transport = FixedStatus {
            status,
            body: "not json at all",
            calls: AtomicUsize::new(0),
        };
        let client = DatabaseClient::with_transport(ClientConfig::new(BASE_URL), &transport);

        let results = [
            client.get::<Value>("/a").map(|_| ()),
            client.set("/a", &1).map(|_| ()),
            client.push("/a", &1).map(|_| ()),
            client.update("/a", &json!({ "x": 1 })).map(|_| ()),
            client.delete("/a"),
        ];
        for result in results {
            let err = result.unwrap_err();
            assert!(matches!(err, DbError::Remote { status: s, .. } if s == status), "{err:?}");
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), 5);
    }
}

#[test]
fn transport_failure_is_passed_through_after_one_attempt() {
    let transport = Unreachable::default();
    let client = DatabaseClient::with_transport(ClientConfig::new(BASE_URL), &transport);

    let err = client.get::<Value>("/a").unwrap_err();
    match err {
        DbError::Transport(e) => assert_eq!(e.message(), "connection refused"),
        other => panic!("expected Transport, got {other:?}"),
    }
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn serialization_failure_makes_no_request() {
    let transport = Unreachable::default();
    let client = DatabaseClient::with_transport(ClientConfig::new(BASE_URL), &transport);

    let mut bad = std::collections::BTreeMap::new();
    bad.insert(vec![1u8], "non-string key");
    for err in [
        client.set("/a", &bad).unwrap_err(),
        client.push("/a", &bad).unwrap_err(),
        client.update("/a", &bad).unwrap_err(),
    ] {
        assert!(matches!(err, DbError::Serialization(_)), "{err:?}");
    }
    assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn shared_client_across_threads() {
    let (transport, client) = memory_client();
    std::thread::scope(|s| {
        for i in 0..8 {
            let client = &client;
            s.spawn(move || {
                let path = format!("/threads/{i}");
                client.set(&path, &i).unwrap();
                let back: u32 = client.get(&path).unwrap();
                assert_eq!(back, i);
            });
        }
    });
    assert_eq!(transport.root()["threads"].as_object().unwrap().len(), 8);
}

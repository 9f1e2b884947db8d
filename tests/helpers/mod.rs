#![allow(dead_code)] // Test helpers appear unused when compiled independently

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;

use list_aci_issue::azure::{
    ArmClient, ContainerGroupsClient, PollOptions, ResourceGroupsClient, RetryConfig,
    StaticTokenCredential,
};
use list_aci_issue::{Repro, ReproSettings};

pub const SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000001";
pub const TOKEN: &str = "test-token";
const CG_PROVIDER: &str = "providers/Microsoft.ContainerInstance/containerGroups";

/// In-memory stand-in for Azure Resource Manager
#[derive(Default)]
pub struct ArmState {
    pub base: String,
    /// "METHOD /path" for every request, query stripped
    pub requests: Vec<String>,
    pub unauthorized: usize,
    pub resource_group_exists: bool,
    pub groups: BTreeMap<String, Value>,
    pub put_bodies: Vec<Value>,
    /// operation id -> polls left before it reports a terminal state
    pub operations: HashMap<u64, u32>,
    pub next_operation: u64,
    /// In-progress polls every operation reports first
    pub polls_before_done: u32,
    pub fail_container_groups: bool,
    /// Operations end in Canceled instead of Succeeded
    pub cancel_operations: bool,
    pub page_size: usize,
    /// Answer this many requests with 429 before serving normally
    pub throttle: u32,
}

pub type SharedArm = Arc<Mutex<ArmState>>;

pub struct MockArm {
    pub state: SharedArm,
    pub base_url: String,
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl MockArm {
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.handle.await;
    }

    pub async fn requests(&self) -> Vec<String> {
        self.state.lock().await.requests.clone()
    }
}

/// Best-effort check for whether binding to loopback is permitted in the current sandbox.
pub async fn can_bind_loopback() -> bool {
    match TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => {
            drop(listener);
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => false,
        Err(_) => true,
    }
}

pub async fn spawn_mock_arm(configure: impl FnOnce(&mut ArmState)) -> MockArm {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind mock ARM listener");
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let mut initial = ArmState {
        base: base_url.clone(),
        page_size: 1,
        next_operation: 1,
        ..Default::default()
    };
    configure(&mut initial);
    let state = Arc::new(Mutex::new(initial));

    let app = Router::new().fallback(handle).with_state(state.clone());

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        });
        if let Err(err) = server.await {
            eprintln!("mock ARM server error: {}", err);
        }
    });

    MockArm {
        state,
        base_url,
        shutdown_tx,
        handle,
    }
}

pub fn fast_poll() -> PollOptions {
    PollOptions {
        interval: Duration::from_millis(5),
        timeout: Duration::from_secs(10),
    }
}

pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        delay: Duration::from_millis(1),
        backoff: Default::default(),
    }
}

pub fn arm_client(base_url: &str) -> Arc<ArmClient> {
    let client = ArmClient::new(
        base_url,
        SUBSCRIPTION,
        Arc::new(StaticTokenCredential::new(TOKEN)),
    )
    .expect("client")
    .with_retry_config(fast_retry());
    Arc::new(client)
}

pub fn repro(base_url: &str, settings: ReproSettings) -> Repro {
    let arm = arm_client(base_url);
    Repro::new(
        ResourceGroupsClient::new(arm.clone(), fast_poll()),
        ContainerGroupsClient::new(arm, fast_poll()),
        settings,
    )
}

fn reply(status: StatusCode, headers: &[(&str, String)], body: Option<Value>) -> Response {
    let mut builder = Response::builder().status(status);
    for (name, value) in headers {
        builder = builder.header(*name, value.as_str());
    }
    let body = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

fn arm_error(status: StatusCode, code: &str, message: &str) -> Response {
    reply(
        status,
        &[],
        Some(json!({"error": {"code": code, "message": message}})),
    )
}

fn query_param<'a>(uri: &'a Uri, key: &str) -> Option<&'a str> {
    uri.query()?.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then_some(v)
    })
}

impl ArmState {
    fn start_operation(&mut self) -> u64 {
        let id = self.next_operation;
        self.next_operation += 1;
        self.operations.insert(id, self.polls_before_done);
        id
    }

    /// Some(true) once the operation is done
    fn advance(&mut self, id: u64) -> Option<bool> {
        let left = self.operations.get_mut(&id)?;
        if *left > 0 {
            *left -= 1;
            Some(false)
        } else {
            Some(true)
        }
    }

    fn group_resource(&self, rg: &str, name: &str, body: &Value) -> Value {
        let mut group = body.clone();
        group["id"] = json!(format!(
            "/subscriptions/{}/resourceGroups/{}/{}/{}",
            SUBSCRIPTION, rg, CG_PROVIDER, name
        ));
        group["name"] = json!(name);
        group["type"] = json!("Microsoft.ContainerInstance/containerGroups");
        group["properties"]["provisioningState"] = json!("Succeeded");
        group["properties"]["instanceView"] = json!({"state": "Running", "events": []});
        group
    }
}

async fn handle(
    State(state): State<SharedArm>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut arm = state.lock().await;
    let path = uri.path().to_string();
    arm.requests.push(format!("{} {}", method, path));

    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false);
    if !authorized {
        arm.unauthorized += 1;
        return arm_error(StatusCode::UNAUTHORIZED, "InvalidAuthenticationToken", "bad token");
    }

    if arm.throttle > 0 {
        arm.throttle -= 1;
        return reply(
            StatusCode::TOO_MANY_REQUESTS,
            &[("retry-after", "0".to_string())],
            Some(json!({"error": {"code": "TooManyRequests", "message": "slow down"}})),
        );
    }

    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    let retry_now = ("retry-after", "0".to_string());

    match segments.as_slice() {
        ["operations", id] => {
            let id: u64 = id.parse().unwrap_or(0);
            match arm.advance(id) {
                None => arm_error(StatusCode::NOT_FOUND, "NotFound", "no such operation"),
                Some(false) => reply(
                    StatusCode::OK,
                    &[retry_now],
                    Some(json!({"status": "InProgress"})),
                ),
                Some(true) if arm.fail_container_groups => reply(
                    StatusCode::OK,
                    &[],
                    Some(json!({
                        "status": "Failed",
                        "error": {"code": "ContainerGroupQuotaReached", "message": "quota exceeded for region"}
                    })),
                ),
                Some(true) if arm.cancel_operations => reply(
                    StatusCode::OK,
                    &[],
                    Some(json!({
                        "status": "Canceled",
                        "error": {"code": "OperationCanceled", "message": "operation was canceled"}
                    })),
                ),
                Some(true) => reply(StatusCode::OK, &[], Some(json!({"status": "Succeeded"}))),
            }
        }
        ["locations", "op", id] => {
            let id: u64 = id.parse().unwrap_or(0);
            match arm.advance(id) {
                None => arm_error(StatusCode::NOT_FOUND, "NotFound", "no such operation"),
                Some(false) => reply(StatusCode::ACCEPTED, &[retry_now], None),
                Some(true) => reply(StatusCode::OK, &[], None),
            }
        }
        ["subscriptions", _, "resourcegroups", rg] => match method {
            Method::HEAD => {
                if arm.resource_group_exists {
                    reply(StatusCode::NO_CONTENT, &[], None)
                } else {
                    reply(StatusCode::NOT_FOUND, &[], None)
                }
            }
            Method::PUT => {
                let req: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
                arm.resource_group_exists = true;
                reply(
                    StatusCode::CREATED,
                    &[],
                    Some(json!({
                        "id": format!("/subscriptions/{}/resourceGroups/{}", SUBSCRIPTION, rg),
                        "name": rg,
                        "location": req["location"],
                        "properties": {"provisioningState": "Succeeded"}
                    })),
                )
            }
            Method::DELETE => {
                if !arm.resource_group_exists {
                    return arm_error(StatusCode::NOT_FOUND, "ResourceGroupNotFound", "missing");
                }
                arm.resource_group_exists = false;
                arm.groups.clear();
                let id = arm.start_operation();
                let location = format!("{}/locations/op/{}", arm.base, id);
                reply(
                    StatusCode::ACCEPTED,
                    &[("location", location), retry_now],
                    None,
                )
            }
            _ => arm_error(StatusCode::METHOD_NOT_ALLOWED, "MethodNotAllowed", "nope"),
        },
        ["subscriptions", _, "resourceGroups", _, "providers", "Microsoft.ContainerInstance", "containerGroups"] =>
        {
            if !arm.resource_group_exists {
                return arm_error(StatusCode::NOT_FOUND, "ResourceGroupNotFound", "missing");
            }
            let skip: usize = query_param(&uri, "skip")
                .and_then(|s| s.parse().ok())
                .unwrap_or(0);
            let all: Vec<Value> = arm.groups.values().cloned().collect();
            let page: Vec<Value> = all.iter().skip(skip).take(arm.page_size).cloned().collect();
            let next = skip + page.len();
            let mut body = json!({ "value": page });
            if next < all.len() {
                body["nextLink"] = json!(format!(
                    "{}{}?api-version=2023-05-01&skip={}",
                    arm.base, path, next
                ));
            }
            reply(StatusCode::OK, &[], Some(body))
        }
        ["subscriptions", _, "resourceGroups", rg, "providers", "Microsoft.ContainerInstance", "containerGroups", name] =>
        {
            let (rg, name) = (rg.to_string(), name.to_string());
            if !arm.resource_group_exists {
                return arm_error(StatusCode::NOT_FOUND, "ResourceGroupNotFound", "missing");
            }
            match method {
                Method::PUT => {
                    let req: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
                    arm.put_bodies.push(req.clone());
                    let group = arm.group_resource(&rg, &name, &req);
                    if !arm.fail_container_groups {
                        arm.groups.insert(name.clone(), group.clone());
                    }
                    let id = arm.start_operation();
                    let op = format!("{}/operations/{}", arm.base, id);
                    let mut pending = group;
                    pending["properties"]["provisioningState"] = json!("Pending");
                    reply(
                        StatusCode::CREATED,
                        &[("azure-asyncoperation", op), retry_now],
                        Some(pending),
                    )
                }
                Method::GET => match arm.groups.get(&name) {
                    Some(group) => reply(StatusCode::OK, &[], Some(group.clone())),
                    None => arm_error(StatusCode::NOT_FOUND, "ResourceNotFound", "no such group"),
                },
                Method::DELETE => match arm.groups.remove(&name) {
                    Some(group) => reply(StatusCode::OK, &[], Some(group)),
                    None => reply(StatusCode::NO_CONTENT, &[], None),
                },
                _ => arm_error(StatusCode::METHOD_NOT_ALLOWED, "MethodNotAllowed", "nope"),
            }
        }
        _ => arm_error(StatusCode::NOT_FOUND, "InvalidResourceType", "unknown path"),
    }
}

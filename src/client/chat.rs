use crate::client::error_sink::{ErrorRecord, ErrorSink};
use crate::client::heartbeat::{HeartbeatContext, HeartbeatHandle};
use crate::client::session::Session;
use crate::core::config::ChatConfig;
use crate::core::errors::ChatError;
use crate::core::kernel::{
    next_salt, ReqwestRest, RequestSigner, RestClient, RestClientBuilder, RestClientConfig,
};
use crate::core::types::{GroupInfo, LoginResponse, MessageBatch, UserInfo};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{instrument, warn};

/// Default keep-alive interval in seconds, matching the server default.
pub const DEFAULT_HEARTBEAT_INTERVAL: i64 = 60;

/// Client for the pychat service
///
/// Every operation follows the same template: generate a salt, sign the
/// operation's fields in their canonical order (salt last), POST the
/// payload, and branch on the response `status`. A non-zero status is
/// recorded in the error history and surfaced as [`ChatError::ApiError`].
///
/// The transport is generic so tests can inject a mock; production code
/// uses [`ChatClient::new`], which wires up a [`ReqwestRest`].
pub struct ChatClient<R: RestClient = ReqwestRest> {
    config: ChatConfig,
    rest: Arc<R>,
    signer: RequestSigner,
    session: Session,
    errors: Arc<ErrorSink>,
    heartbeat: Mutex<Option<HeartbeatHandle>>,
}

impl ChatClient<ReqwestRest> {
    /// Create a client backed by a reqwest transport.
    pub fn new(config: ChatConfig) -> Result<Self, ChatError> {
        let rest_config =
            RestClientConfig::new(config.base_url()).with_timeout(config.timeout_seconds);
        let rest = RestClientBuilder::new(rest_config).build()?;
        Ok(Self::with_transport(config, rest))
    }
}

impl<R: RestClient + 'static> ChatClient<R> {
    /// Create a client over an explicit transport.
    pub fn with_transport(config: ChatConfig, rest: R) -> Self {
        let signer = RequestSigner::new(config.app_id.clone(), config.app_key.clone());
        Self {
            config,
            rest: Arc::new(rest),
            signer,
            session: Session::new(),
            errors: Arc::new(ErrorSink::default()),
            heartbeat: Mutex::new(None),
        }
    }

    /// Register a new user account.
    ///
    /// Signed fields: `username, password, description, salt`.
    #[instrument(skip(self, password))]
    pub async fn register_user(
        &self,
        username: &str,
        password: &str,
        description: &str,
    ) -> Result<(), ChatError> {
        let salt = next_salt();
        let sign = self.signer.sign(&[username, password, description, &salt])?;
        let payload = json!({
            "app_id": self.config.app_id,
            "username": username,
            "password": password,
            "description": description,
            "salt": salt,
            "sign": sign,
        });
        self.execute("register_user", &payload).await?;
        Ok(())
    }

    /// Log in and establish a session.
    ///
    /// Signed fields: `username, password, salt`. On success the session
    /// (connected flag, username, token) is populated atomically, and a
    /// background keep-alive task is spawned when `heartbeat_interval` is
    /// positive; pass `-1` (or any non-positive value) to disable it.
    /// Logging in again replaces any previous heartbeat task.
    #[instrument(skip(self, password))]
    pub async fn login_user(
        &self,
        username: &str,
        password: &str,
        heartbeat_interval: i64,
    ) -> Result<(), ChatError> {
        let salt = next_salt();
        let sign = self.signer.sign(&[username, password, &salt])?;
        let payload = json!({
            "app_id": self.config.app_id,
            "username": username,
            "password": password,
            "salt": salt,
            "sign": sign,
        });

        let response = self.execute("login_user", &payload).await?;
        let login: LoginResponse = serde_json::from_value(response).map_err(|e| {
            ChatError::DeserializationError(format!("login response missing session: {}", e))
        })?;

        self.session.establish(username.to_string(), login.session);

        // Replace any heartbeat left over from a previous login.
        let previous = self
            .heartbeat
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(previous) = previous {
            previous.stop().await;
        }

        if heartbeat_interval > 0 {
            let handle = HeartbeatHandle::spawn(
                HeartbeatContext {
                    rest: Arc::clone(&self.rest),
                    signer: self.signer.clone(),
                    session: self.session.clone(),
                    errors: Arc::clone(&self.errors),
                    app_id: self.config.app_id.clone(),
                },
                Duration::from_secs(heartbeat_interval as u64),
            );
            *self.heartbeat.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        }

        Ok(())
    }

    /// Send a single keep-alive request for the current session.
    ///
    /// Signed fields: `session, salt`.
    pub async fn heartbeat(&self) -> Result<(), ChatError> {
        let token = self.session.token();
        let salt = next_salt();
        let sign = self.signer.sign(&[&token, &salt])?;
        let payload = json!({
            "app_id": self.config.app_id,
            "session": token,
            "salt": salt,
            "sign": sign,
        });
        self.execute("heartbeat", &payload).await?;
        Ok(())
    }

    /// Fetch a user record.
    ///
    /// Signed fields: `session, username, salt`.
    #[instrument(skip(self))]
    pub async fn get_user_info(&self, username: &str) -> Result<UserInfo, ChatError> {
        let token = self.session.token();
        let salt = next_salt();
        let sign = self.signer.sign(&[&token, username, &salt])?;
        let payload = json!({
            "app_id": self.config.app_id,
            "session": token,
            "username": username,
            "salt": salt,
            "sign": sign,
        });

        let response = self.execute("get_user_info", &payload).await?;
        serde_json::from_value(response).map_err(|e| {
            ChatError::DeserializationError(format!("malformed user record: {}", e))
        })
    }

    /// Change a user's password.
    ///
    /// Regular users may only change their own; admins may change any.
    /// Signed fields: `session, username, new_password, salt`.
    #[instrument(skip(self, new_password))]
    pub async fn change_password(
        &self,
        username: &str,
        new_password: &str,
    ) -> Result<Value, ChatError> {
        let token = self.session.token();
        let salt = next_salt();
        let sign = self.signer.sign(&[&token, username, new_password, &salt])?;
        let payload = json!({
            "app_id": self.config.app_id,
            "session": token,
            "username": username,
            "new_password": new_password,
            "salt": salt,
            "sign": sign,
        });
        self.execute("change_password", &payload).await
    }

    /// Send a direct message to another user.
    ///
    /// Signed fields: `session, recv_user, message, salt`.
    #[instrument(skip(self, message))]
    pub async fn send_direct_message(
        &self,
        recv_user: &str,
        message: &str,
    ) -> Result<Value, ChatError> {
        let token = self.session.token();
        let salt = next_salt();
        let sign = self.signer.sign(&[&token, recv_user, message, &salt])?;
        let payload = json!({
            "app_id": self.config.app_id,
            "session": token,
            "recv_user": recv_user,
            "message": message,
            "salt": salt,
            "sign": sign,
        });
        self.execute("send_direct_message", &payload).await
    }

    /// Fetch queued direct messages.
    ///
    /// The server deletes them once delivered; persist client-side if
    /// history is needed. Signed fields: `session, salt`.
    #[instrument(skip(self))]
    pub async fn get_direct_message(&self) -> Result<MessageBatch, ChatError> {
        let token = self.session.token();
        let salt = next_salt();
        let sign = self.signer.sign(&[&token, &salt])?;
        let payload = json!({
            "app_id": self.config.app_id,
            "session": token,
            "salt": salt,
            "sign": sign,
        });

        let response = self.execute("get_direct_message", &payload).await?;
        serde_json::from_value(response).map_err(|e| {
            ChatError::DeserializationError(format!("malformed message batch: {}", e))
        })
    }

    /// Send a message to a group.
    ///
    /// The group id travels as a decimal string in both the payload and
    /// the signature. Signed fields: `session, gid, message, salt`.
    #[instrument(skip(self, message))]
    pub async fn send_group_message(&self, gid: i64, message: &str) -> Result<Value, ChatError> {
        let token = self.session.token();
        let gid = gid.to_string();
        let salt = next_salt();
        let sign = self.signer.sign(&[&token, &gid, message, &salt])?;
        let payload = json!({
            "app_id": self.config.app_id,
            "session": token,
            "gid": gid,
            "message": message,
            "salt": salt,
            "sign": sign,
        });
        self.execute("send_group_message", &payload).await
    }

    /// Fetch queued messages for a group.
    ///
    /// Signed fields: `session, gid, salt`.
    #[instrument(skip(self))]
    pub async fn get_group_message(&self, gid: i64) -> Result<MessageBatch, ChatError> {
        let token = self.session.token();
        let gid = gid.to_string();
        let salt = next_salt();
        let sign = self.signer.sign(&[&token, &gid, &salt])?;
        let payload = json!({
            "app_id": self.config.app_id,
            "session": token,
            "gid": gid,
            "salt": salt,
            "sign": sign,
        });

        let response = self.execute("get_group_message", &payload).await?;
        serde_json::from_value(response).map_err(|e| {
            ChatError::DeserializationError(format!("malformed message batch: {}", e))
        })
    }

    /// Fetch a group record.
    ///
    /// Signed fields: `session, gid, salt`.
    #[instrument(skip(self))]
    pub async fn get_group_info(&self, gid: i64) -> Result<GroupInfo, ChatError> {
        let token = self.session.token();
        let gid = gid.to_string();
        let salt = next_salt();
        let sign = self.signer.sign(&[&token, &gid, &salt])?;
        let payload = json!({
            "app_id": self.config.app_id,
            "session": token,
            "gid": gid,
            "salt": salt,
            "sign": sign,
        });

        let response = self.execute("get_group_info", &payload).await?;
        serde_json::from_value(response).map_err(|e| {
            ChatError::DeserializationError(format!("malformed group record: {}", e))
        })
    }

    /// Create a new group.
    ///
    /// Signed fields: `session, group_name, description, salt`.
    #[instrument(skip(self))]
    pub async fn register_group(
        &self,
        group_name: &str,
        description: &str,
    ) -> Result<Value, ChatError> {
        let token = self.session.token();
        let salt = next_salt();
        let sign = self.signer.sign(&[&token, group_name, description, &salt])?;
        let payload = json!({
            "app_id": self.config.app_id,
            "session": token,
            "group_name": group_name,
            "description": description,
            "salt": salt,
            "sign": sign,
        });
        self.execute("register_group", &payload).await
    }

    /// Tear down the session: cancel and join the heartbeat task, then
    /// clear the local session state. Idempotent; purely client-side.
    pub async fn disconnect(&self) {
        let handle = self
            .heartbeat
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.stop().await;
        }
        self.session.clear();
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    pub fn username(&self) -> String {
        self.session.username()
    }

    /// Current session token; empty until login succeeds.
    pub fn session_token(&self) -> String {
        self.session.token()
    }

    /// Whether a background heartbeat task is currently alive.
    pub fn heartbeat_running(&self) -> bool {
        self.heartbeat
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Snapshot of the retained server-reported failures, oldest first.
    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.errors.all()
    }

    /// Remove and return the retained failures.
    pub fn drain_errors(&self) -> Vec<ErrorRecord> {
        self.errors.drain()
    }

    /// POST a built payload and branch on the response `status`.
    async fn execute(&self, endpoint: &str, payload: &Value) -> Result<Value, ChatError> {
        let response = self.rest.post(endpoint, payload).await?;
        let status = response
            .get("status")
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                ChatError::DeserializationError("response missing status field".to_string())
            })?;

        if status == 0 {
            return Ok(response);
        }

        let code = response
            .get("err_no")
            .and_then(Value::as_i64)
            .unwrap_or(status);
        let message = response
            .get("err_info")
            .and_then(Value::as_str)
            .unwrap_or("unknown server error")
            .to_string();

        warn!("{} rejected by server: {} - {}", endpoint, code, message);
        self.errors.record(code, message.clone());
        Err(ChatError::ApiError { code, message })
    }
}

impl<R: RestClient> std::fmt::Debug for ChatClient<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("server", &self.config.base_url())
            .field("app_id", &self.config.app_id)
            .field("connected", &self.session.is_connected())
            .finish_non_exhaustive()
    }
}

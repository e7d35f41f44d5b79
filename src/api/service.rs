use anyhow::Result;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use super::auth;
use super::protocol::*;
use crate::clock::LamportClock;
use crate::config::Config;
use crate::state::{StateStore, Task};

pub struct ClientApi {
    config: Arc<Config>,
    state: Arc<StateStore>,
    clock: Arc<LamportClock>,
    listener: TcpListener,
}

impl ClientApi {
    /// Binds the client listener. A bind failure here is fatal to startup.
    pub async fn bind(
        config: Arc<Config>,
        state: Arc<StateStore>,
        clock: Arc<LamportClock>,
    ) -> Result<Arc<Self>> {
        let listener = TcpListener::bind((config.host.as_str(), config.client_port)).await?;
        tracing::info!(
            "Listening for clients on {}:{}",
            config.host,
            config.client_port
        );
        Ok(Arc::new(Self {
            config,
            state,
            clock,
            listener,
        }))
    }

    /// Address the listener actually bound (the configured port may be 0
    /// in tests).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn serve(self: Arc<Self>) {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let api = self.clone();
                    tokio::spawn(async move {
                        api.handle_connection(stream, peer).await;
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to accept client connection: {}", e);
                    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                }
            }
        }
    }

    /// One request, one response, close. The read is a single recv of at
    /// most `MAX_REQUEST_BYTES`; there is no length prefix on the wire.
    async fn handle_connection(&self, mut stream: TcpStream, peer: SocketAddr) {
        let mut buf = vec![0u8; MAX_REQUEST_BYTES];
        let len = match stream.read(&mut buf).await {
            Ok(0) => return,
            Ok(len) => len,
            Err(e) => {
                tracing::error!("Error reading from client {}: {}", peer, e);
                return;
            }
        };

        let Some(response) = self.process_request(&buf[..len]) else {
            return;
        };

        if let Err(e) = stream.write_all(&response).await {
            tracing::error!("Error replying to client {}: {}", peer, e);
        }
    }

    /// Decodes and dispatches one request. The token gate runs on the raw
    /// JSON value before any action is recognized: without a token only
    /// `login` is acceptable, every other action (known or not) is answered
    /// with the auth-required error. `None` means the connection is closed
    /// without a reply: the frame was not JSON at all, or an authenticated
    /// request carried no action this endpoint serves.
    pub fn process_request(&self, raw: &[u8]) -> Option<Vec<u8>> {
        let value = match serde_json::from_slice::<serde_json::Value>(raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Dropping malformed client request: {}", e);
                return None;
            }
        };

        let Some(token) = value.get("token") else {
            return Some(match serde_json::from_value::<ClientRequest>(value) {
                Ok(ClientRequest::Login { username, password }) => {
                    self.handle_login(&username, &password)
                }
                _ => encode(&ErrorResponse {
                    error: ERR_AUTH_REQUIRED,
                }),
            });
        };

        // A token of the wrong JSON type matches no user, same as a forged
        // one.
        let token = token.as_str().unwrap_or_default();
        let Some(username) =
            auth::resolve_token(token, &self.config.users, &self.config.secret_key)
        else {
            return Some(encode(&ErrorResponse {
                error: ERR_BAD_TOKEN,
            }));
        };
        let username = username.to_string();

        match serde_json::from_value::<ClientRequest>(value) {
            Ok(ClientRequest::SubmitTask { data }) => Some(self.handle_submit_task(username, data)),
            Ok(ClientRequest::TaskStatus { task_id }) => Some(self.handle_task_status(&task_id)),
            Ok(ClientRequest::Login { .. }) => {
                // An already-authenticated login is not served; the
                // connection just closes.
                None
            }
            Err(e) => {
                tracing::warn!("Dropping authenticated request with unknown action: {}", e);
                None
            }
        }
    }

    fn handle_login(&self, username: &str, password: &str) -> Vec<u8> {
        if self.config.users.get(username).map(String::as_str) == Some(password) {
            tracing::info!("User '{}' authenticated", username);
            encode(&LoginResponse {
                token: auth::token_for(username, &self.config.secret_key),
            })
        } else {
            tracing::warn!("Authentication failure for user '{}'", username);
            encode(&ErrorResponse {
                error: ERR_BAD_CREDENTIALS,
            })
        }
    }

    fn handle_submit_task(&self, username: String, data: serde_json::Value) -> Vec<u8> {
        let task = Task::new(username, data, self.clock.increment());
        let task_id = task.id.clone();
        self.state.add_task(task);

        encode(&SubmitTaskResponse {
            status: MSG_TASK_ACCEPTED,
            task_id,
        })
    }

    fn handle_task_status(&self, task_id: &str) -> Vec<u8> {
        match self.state.get_task_status(task_id) {
            Some(task) => encode(&task),
            None => encode(&ErrorResponse {
                error: ERR_UNKNOWN_TASK,
            }),
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Vec<u8> {
    match serde_json::to_vec(value) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("Failed to encode client response: {}", e);
            Vec::new()
        }
    }
}

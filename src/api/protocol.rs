use serde::{Deserialize, Serialize};

/// A client frame is a single JSON object read in one shot; anything beyond
/// this many bytes is never read.
pub const MAX_REQUEST_BYTES: usize = 4096;

pub const MSG_TASK_ACCEPTED: &str = "Tarefa recebida";
pub const ERR_BAD_CREDENTIALS: &str = "Credenciais inválidas";
pub const ERR_AUTH_REQUIRED: &str = "Autenticação necessária";
pub const ERR_BAD_TOKEN: &str = "Token inválido ou expirado";
pub const ERR_UNKNOWN_TASK: &str = "Tarefa não encontrada";

/// The closed set of client actions, decoded only after the token gate has
/// run on the raw frame. Field absence degrades to the matching application
/// error (bad credentials, unknown task) rather than a decode failure; only
/// an unrecognized `action` tag fails here.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientRequest {
    Login {
        #[serde(default)]
        username: String,
        #[serde(default)]
        password: String,
    },
    SubmitTask {
        #[serde(default)]
        data: serde_json::Value,
    },
    TaskStatus {
        #[serde(default)]
        task_id: String,
    },
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitTaskResponse {
    pub status: &'static str,
    pub task_id: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
}

// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Daemon server implementation.
//!
//! Clients connect over a Unix socket and exchange newline-delimited JSON.
//! Each line is one request; an optional `"id"` member is echoed back in
//! the response so clients can match answers to requests.

use std::path::PathBuf;

use serde_json::{Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tracing::{debug, error, info, trace};

use sqlbridge_session::{PathResolver, Response, SessionHandler};

/// Simple daemon server that listens on a Unix socket.
pub struct DaemonServer<R> {
    handler: SessionHandler<R>,
    socket_path: PathBuf,
}

impl<R: PathResolver> DaemonServer<R> {
    pub fn new(handler: SessionHandler<R>, socket_path: PathBuf) -> Self {
        Self {
            handler,
            socket_path,
        }
    }

    /// Bind the socket, replacing a stale one.
    pub fn bind(&self) -> Result<UnixListener, std::io::Error> {
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }

        if let Some(parent) = self.socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;

        // Make socket world-accessible so other users can connect
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o666);
            std::fs::set_permissions(&self.socket_path, perms)?;
        }

        info!("Listening on {:?}", self.socket_path);
        Ok(listener)
    }

    pub async fn serve(&self) -> Result<(), std::io::Error> {
        let listener = self.bind()?;
        self.serve_on(listener).await
    }

    /// Accept connections forever, one task per client.
    pub async fn serve_on(&self, listener: UnixListener) -> Result<(), std::io::Error> {
        loop {
            let (stream, _addr) = listener.accept().await?;
            let handler = self.handler.clone();

            tokio::spawn(async move {
                let (reader, writer) = stream.into_split();
                if let Err(e) = serve_connection(&handler, reader, writer).await {
                    error!("Connection error: {e}");
                }
            });
        }
    }
}

/// Answer requests from one client, in order, until it hangs up.
pub async fn serve_connection<R, In, Out>(
    handler: &SessionHandler<R>,
    reader: In,
    mut writer: Out,
) -> Result<(), std::io::Error>
where
    R: PathResolver,
    In: AsyncRead + Unpin,
    Out: AsyncWrite + Unpin,
{
    debug!("Client connected");
    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        trace!("request: {line}");
        let reply = handle_line(handler, &line).await;
        let mut encoded = reply.to_string();
        encoded.push('\n');
        writer.write_all(encoded.as_bytes()).await?;
        writer.flush().await?;
    }
    debug!("Client disconnected");
    Ok(())
}

async fn handle_line<R: PathResolver>(handler: &SessionHandler<R>, line: &str) -> Value {
    let (id, response) = match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(mut request)) => {
            let id = request.remove("id");
            (id, handler.dispatch_value(Value::Object(request)).await)
        }
        Ok(_) => (None, Response::error("Invalid request: expected a JSON object")),
        Err(e) => (None, Response::error(format!("Invalid request: {e}"))),
    };
    envelope(id, response)
}

fn envelope(id: Option<Value>, response: Response) -> Value {
    let mut reply = match serde_json::to_value(response) {
        Ok(Value::Object(reply)) => reply,
        _ => {
            let mut reply = Map::new();
            reply.insert("status".into(), "error".into());
            reply.insert("error".into(), "Failed to encode response".into());
            reply
        }
    };
    if let Some(id) = id {
        reply.insert("id".into(), id);
    }
    Value::Object(reply)
}

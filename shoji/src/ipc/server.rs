use std::path::PathBuf;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;

use super::SOCKET_PATH;
use shoji_ipc::{Command, Response};

type CommandTx = mpsc::Sender<(Command, mpsc::Sender<Response>)>;

/// Accepts newline-delimited JSON commands and answers each with one
/// response line.
pub struct IpcServer {
    socket_path: PathBuf,
    cmd_tx: CommandTx,
}

impl IpcServer {
    pub fn new(cmd_tx: CommandTx) -> Self {
        Self {
            socket_path: PathBuf::from(SOCKET_PATH),
            cmd_tx,
        }
    }

    pub async fn run(&self) -> Result<()> {
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;
        tracing::info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let cmd_tx = self.cmd_tx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_connection(stream, cmd_tx).await {
                            tracing::error!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Accept error: {}", e);
                }
            }
        }
    }

    async fn handle_connection(
        stream: UnixStream,
        cmd_tx: CommandTx,
    ) -> Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        loop {
            line.clear();
            let n = reader.read_line(&mut line).await?;
            if n == 0 {
                break;
            }

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let response = match parse_command(line) {
                Ok(cmd) => dispatch(&cmd_tx, cmd).await,
                Err(response) => response,
            };

            let response_json = serde_json::to_string(&response)?;
            writer.write_all(response_json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        Ok(())
    }
}

fn parse_command(line: &str) -> Result<Command, Response> {
    serde_json::from_str::<Command>(line).map_err(|e| Response::Error {
        message: format!("Invalid command: {}", e),
    })
}

async fn dispatch(cmd_tx: &CommandTx, cmd: Command) -> Response {
    tracing::debug!("Dispatching command: {:?}", cmd);
    let (resp_tx, mut resp_rx) = mpsc::channel(1);
    if cmd_tx.send((cmd, resp_tx)).await.is_err() {
        return Response::Error {
            message: "Session is not running".to_string(),
        };
    }
    resp_rx.recv().await.unwrap_or(Response::Error {
        message: "Session dropped the command".to_string(),
    })
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert!(matches!(
            parse_command("{\"type\":\"refresh\"}"),
            Ok(Command::Refresh)
        ));
        match parse_command("{\"type\":\"bogus\"}") {
            Err(Response::Error { message }) => assert!(message.starts_with("Invalid command")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dispatch_round_trip() {
        let (tx, mut rx) = mpsc::channel::<(Command, mpsc::Sender<Response>)>(1);
        tokio::spawn(async move {
            if let Some((cmd, resp_tx)) = rx.recv().await {
                assert!(matches!(cmd, Command::Status));
                let _ = resp_tx
                    .send(Response::Status {
                        text: "1".to_string(),
                    })
                    .await;
            }
        });

        match dispatch(&tx, Command::Status).await {
            Response::Status { text } => assert_eq!(text, "1"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dispatch_without_session() {
        let (tx, rx) = mpsc::channel::<(Command, mpsc::Sender<Response>)>(1);
        drop(rx);
        assert!(matches!(
            dispatch(&tx, Command::Refresh).await,
            Response::Error { .. }
        ));
    }
}

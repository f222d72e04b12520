use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;

use anyhow::{Context, Result};

use super::{EVENT_SOCKET_PATH, SOCKET_PATH};
use shoji_ipc::{Command, EventFilter, Response, StateEvent, SubscribeRequest};

pub struct IpcClient {
    stream: UnixStream,
}

impl IpcClient {
    pub fn connect() -> Result<Self> {
        let stream = UnixStream::connect(SOCKET_PATH).context("Failed to connect to shoji daemon")?;
        Ok(Self { stream })
    }

    pub fn send(&mut self, cmd: &Command) -> Result<Response> {
        let json = serde_json::to_string(cmd)?;
        writeln!(self.stream, "{}", json)?;
        self.stream.flush()?;

        let mut reader = BufReader::new(&self.stream);
        let mut line = String::new();
        reader.read_line(&mut line)?;
        if line.is_empty() {
            anyhow::bail!("Daemon closed the connection");
        }

        let response: Response = serde_json::from_str(&line)?;
        Ok(response)
    }
}

/// Blocking reader of the event stream.
pub struct EventClient {
    reader: BufReader<UnixStream>,
}

impl EventClient {
    pub fn connect(request: &SubscribeRequest) -> Result<Self> {
        let mut stream = UnixStream::connect(EVENT_SOCKET_PATH)
            .context("Failed to connect to shoji event server")?;

        let json = serde_json::to_string(request)?;
        writeln!(stream, "{}", json)?;
        stream.flush()?;

        Ok(Self {
            reader: BufReader::new(stream),
        })
    }

    /// Next event, or `None` once the daemon closes the stream.
    pub fn next_event(&mut self) -> Result<Option<StateEvent>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let event: StateEvent = serde_json::from_str(&line)?;
        Ok(Some(event))
    }
}

/// Prints every matching event as a JSON line until the daemon goes away.
pub fn subscribe_and_print(filter: EventFilter) -> Result<()> {
    let request = SubscribeRequest { filter };
    let mut client = EventClient::connect(&request)?;

    while let Some(event) = client.next_event()? {
        println!("{}", serde_json::to_string(&event)?);
    }

    Ok(())
}

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use anyhow::{Context, Result};

use crate::core::WindowId;
use shoji_ipc::{LayoutKind, LayoutMessage, LayoutResult, WindowGeometry};

/// Computes geometries for a workspace root. Geometries are relative to the
/// monitor origin.
pub trait Layouter: Send {
    fn layout(
        &mut self,
        kind: LayoutKind,
        width: u32,
        height: u32,
        windows: &[WindowId],
    ) -> Result<Vec<WindowGeometry>>;
}

fn find_layout_engine(command_name: &str) -> Option<PathBuf> {
    // .app bundle (Contents/Resources/layouts/), then next to the executable
    let exe_path = std::env::current_exe().ok()?;
    let exe_dir = exe_path.parent()?;

    if let Some(contents_dir) = exe_dir.parent() {
        let path = contents_dir
            .join("Resources")
            .join("layouts")
            .join(command_name);
        if path.exists() {
            tracing::debug!("Found layout engine in bundle: {:?}", path);
            return Some(path);
        }
    }

    let path = exe_dir.join(command_name);
    if path.exists() {
        tracing::debug!("Found layout engine in exe dir: {:?}", path);
        return Some(path);
    }

    None
}

pub struct LayoutEngine {
    // Keep process alive until this struct is dropped
    _child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl LayoutEngine {
    pub fn spawn(kind: LayoutKind) -> Result<Self> {
        let command_name = format!("shoji-layout-{}", kind.name());
        let program = find_layout_engine(&command_name).unwrap_or_else(|| command_name.clone().into());

        let mut child = Command::new(program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("Failed to spawn layout engine: {}", command_name))?;

        let stdin = child.stdin.take().context("Failed to get stdin")?;
        let stdout = child.stdout.take().context("Failed to get stdout")?;

        tracing::info!("Layout engine '{}' spawned", command_name);

        Ok(Self {
            _child: child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    pub fn request_layout(
        &mut self,
        width: u32,
        height: u32,
        window_ids: &[WindowId],
    ) -> Result<Vec<WindowGeometry>> {
        let msg = LayoutMessage::Layout {
            width,
            height,
            windows: window_ids.to_vec(),
        };

        match self.send(&msg)? {
            LayoutResult::Layout { windows } => Ok(windows),
            LayoutResult::Error { message } => {
                anyhow::bail!("Layout engine error: {}", message)
            }
        }
    }

    fn send(&mut self, msg: &LayoutMessage) -> Result<LayoutResult> {
        serde_json::to_writer(&mut self.stdin, msg)?;
        writeln!(self.stdin)?;
        self.stdin.flush()?;

        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            anyhow::bail!("Layout engine closed its output");
        }

        let result: LayoutResult = serde_json::from_str(&line)
            .with_context(|| format!("Failed to parse layout response: {}", line.trim()))?;

        Ok(result)
    }
}

/// Spawns one engine process per layout kind on first use.
#[derive(Default)]
pub struct LayoutEngineManager {
    engines: HashMap<LayoutKind, LayoutEngine>,
}

impl LayoutEngineManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_spawn(&mut self, kind: LayoutKind) -> Result<&mut LayoutEngine> {
        use std::collections::hash_map::Entry;

        match self.engines.entry(kind) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => Ok(e.insert(LayoutEngine::spawn(kind)?)),
        }
    }
}

impl Layouter for LayoutEngineManager {
    fn layout(
        &mut self,
        kind: LayoutKind,
        width: u32,
        height: u32,
        windows: &[WindowId],
    ) -> Result<Vec<WindowGeometry>> {
        let result = self
            .get_or_spawn(kind)?
            .request_layout(width, height, windows);
        if result.is_err() {
            // A broken pipe leaves the engine unusable; respawn next time
            self.engines.remove(&kind);
        }
        result
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;

    /// Splits the area into equal columns in tiling order.
    #[derive(Default)]
    pub struct MockLayouter {
        pub requests: Vec<(LayoutKind, Vec<WindowId>)>,
    }

    impl Layouter for MockLayouter {
        fn layout(
            &mut self,
            kind: LayoutKind,
            width: u32,
            height: u32,
            windows: &[WindowId],
        ) -> Result<Vec<WindowGeometry>> {
            self.requests.push((kind, windows.to_vec()));
            let column = width / windows.len().max(1) as u32;
            Ok(windows
                .iter()
                .enumerate()
                .map(|(i, &id)| WindowGeometry {
                    id,
                    x: (column * i as u32) as i32,
                    y: 0,
                    width: column,
                    height,
                })
                .collect())
        }
    }
}

//! Audio output: an mpv child process driven over its JSON IPC socket.

use crate::app::events::{Event, PlayerEvent};
use crate::player::{PlaybackRejection, TransportCommand, TransportEvent};
use anyhow::Context;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::{
    io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, WriteHalf},
    net::UnixStream,
    process::{Child, Command},
    sync::mpsc,
};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct MpvHandle {
    child: Child,
    socket_path: PathBuf,
    ipc: IpcWriter<WriteHalf<UnixStream>>,
}

/// Write side of the IPC socket. Every command is tagged with a fresh request id.
#[derive(Debug)]
struct IpcWriter<W> {
    writer: tokio::sync::Mutex<W>,
    request_id: AtomicU64,
    /// Request id of the last "start playback" command; its failure is a play rejection.
    play_request: Arc<AtomicU64>,
}

impl MpvHandle {
    pub async fn spawn(
        event_tx: mpsc::Sender<Event>,
        audio_device: Option<&str>,
        log_file: Option<&Path>,
    ) -> anyhow::Result<Self> {
        let socket_path = std::env::temp_dir().join(format!("tonearm-mpv-{}.sock", std::process::id()));
        let _ = std::fs::remove_file(&socket_path);

        let mut cmd = Command::new("mpv");
        cmd.args(["--no-video", "--idle=yes", "--input-terminal=no", "--really-quiet"]);
        if let Some(dev) = audio_device {
            cmd.arg(format!("--audio-device={dev}"));
        }
        if let Some(p) = log_file {
            cmd.arg(format!("--log-file={}", p.display()));
        }
        let child = cmd
            .arg(format!("--input-ipc-server={}", socket_path.display()))
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .context("spawn mpv")?;

        let stream = connect_with_retry(&socket_path).await?;
        let (reader, writer) = tokio::io::split(stream);

        let play_request = Arc::new(AtomicU64::new(0));
        tokio::spawn(read_events_loop(reader, event_tx, Arc::clone(&play_request)));

        let ipc = IpcWriter::new(writer, play_request);
        ipc.command(json!(["request_log_messages", "warn"])).await?;
        ipc.command(json!(["observe_property", 1, "time-pos"])).await?;
        ipc.command(json!(["observe_property", 2, "duration"])).await?;
        ipc.command(json!(["observe_property", 3, "pause"])).await?;

        Ok(Self {
            child,
            socket_path,
            ipc,
        })
    }

    pub async fn execute(&self, cmd: &TransportCommand) -> anyhow::Result<()> {
        let ipc = &self.ipc;
        match cmd {
            TransportCommand::Stop => ipc.command(json!(["stop"])).await,
            TransportCommand::Load(url) => ipc.command(json!(["loadfile", url, "replace"])).await,
            TransportCommand::Play => ipc.play().await,
            TransportCommand::TogglePause => ipc.command(json!(["cycle", "pause"])).await,
            TransportCommand::Seek(secs) => ipc.command(json!(["seek", secs, "relative"])).await,
            TransportCommand::Volume(v) => ipc.command(json!(["set_property", "volume", v])).await,
        }
    }
}

impl<W: AsyncWrite + Unpin> IpcWriter<W> {
    fn new(writer: W, play_request: Arc<AtomicU64>) -> Self {
        Self {
            writer: tokio::sync::Mutex::new(writer),
            request_id: AtomicU64::new(1),
            play_request,
        }
    }

    async fn command(&self, args: Value) -> anyhow::Result<()> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        self.send(id, args).await
    }

    /// Unpause. The id is recorded before the write so the reply can never beat it.
    async fn play(&self) -> anyhow::Result<()> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        self.play_request.store(id, Ordering::Relaxed);
        self.send(id, json!(["set_property", "pause", false])).await
    }

    async fn send(&self, id: u64, args: Value) -> anyhow::Result<()> {
        let mut line = serde_json::to_vec(&json!({ "command": args, "request_id": id }))
            .context("encode mpv json")?;
        line.push(b'\n');
        let mut w = self.writer.lock().await;
        w.write_all(&line).await.context("write mpv ipc")?;
        w.flush().await.context("flush mpv ipc")?;
        Ok(())
    }
}

impl Drop for MpvHandle {
    fn drop(&mut self) {
        let _ = self.child.start_kill();
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Device names as printed by `mpv --audio-device=help`.
pub async fn list_audio_devices() -> anyhow::Result<Vec<String>> {
    let out = Command::new("mpv")
        .args(["--audio-device=help", "--no-video", "--idle=no"])
        .output()
        .await
        .context("run mpv --audio-device=help")?;
    Ok(parse_device_list(&String::from_utf8_lossy(&out.stdout)))
}

fn parse_device_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix('\''))
        .filter_map(|rest| rest.find('\'').map(|end| rest[..end].to_string()))
        .collect()
}

async fn connect_with_retry(path: &Path) -> anyhow::Result<UnixStream> {
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(5);
    loop {
        match UnixStream::connect(path).await {
            Ok(s) => return Ok(s),
            Err(e) => {
                if tokio::time::Instant::now() > deadline {
                    return Err(e).with_context(|| format!("connect to mpv ipc {}", path.display()));
                }
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
        }
    }
}

async fn read_events_loop(
    reader: tokio::io::ReadHalf<UnixStream>,
    event_tx: mpsc::Sender<Event>,
    play_request: Arc<AtomicU64>,
) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let Ok(v) = serde_json::from_str::<Value>(&line) else {
            continue;
        };
        let ev = match reply_error(&v) {
            Some((rid, err)) if rid == play_request.load(Ordering::Relaxed) => {
                Some(PlayerEvent::Transport(TransportEvent::PlayRejected(rejection(err))))
            }
            Some((rid, err)) => {
                warn!(request_id = rid, "mpv ipc error: {err}");
                None
            }
            None => map_mpv_event(&v),
        };
        if let Some(ev) = ev
            && event_tx.send(Event::Player(ev)).await.is_err()
        {
            break;
        }
    }
    debug!("mpv event stream closed");
}

/// `{"request_id": n, "error": "..."}` with anything but success.
fn reply_error(v: &Value) -> Option<(u64, &str)> {
    let rid = v.get("request_id")?.as_u64()?;
    let err = v.get("error")?.as_str()?;
    (err != "success").then_some((rid, err))
}

fn rejection(err: &str) -> PlaybackRejection {
    if err.to_ascii_lowercase().contains("abort") {
        PlaybackRejection::Aborted
    } else {
        PlaybackRejection::Blocked
    }
}

fn map_mpv_event(v: &Value) -> Option<PlayerEvent> {
    match v.get("event")?.as_str()? {
        "property-change" => {
            let data = v.get("data");
            match v.get("name")?.as_str()? {
                "time-pos" => Some(PlayerEvent::Position {
                    seconds: data.and_then(Value::as_f64).unwrap_or(0.0),
                }),
                "duration" => Some(PlayerEvent::Duration {
                    seconds: data.and_then(Value::as_f64).unwrap_or(0.0),
                }),
                "pause" => {
                    let paused = data.and_then(Value::as_bool).unwrap_or(false);
                    Some(if paused { PlayerEvent::Paused } else { PlayerEvent::Started })
                }
                _ => None,
            }
        }
        // Only a natural end advances; "stop" and "redirect" come from our own commands.
        "end-file" => match v.get("reason").and_then(Value::as_str).unwrap_or("") {
            "eof" => Some(PlayerEvent::Transport(TransportEvent::Ended)),
            "error" => {
                let err = v.get("file_error").or_else(|| v.get("error")).and_then(Value::as_str);
                Some(PlayerEvent::Transport(TransportEvent::Failed(
                    err.unwrap_or("unknown error").to_string(),
                )))
            }
            _ => None,
        },
        "log-message" => {
            let level = v.get("level").and_then(Value::as_str).unwrap_or("info");
            let text = v.get("text").and_then(Value::as_str).unwrap_or("").trim();
            if !text.is_empty() {
                warn!(target: "mpv", "{level}: {text}");
            }
            None
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_eof_ends_a_track() {
        let eof = json!({"event": "end-file", "reason": "eof"});
        assert!(matches!(
            map_mpv_event(&eof),
            Some(PlayerEvent::Transport(TransportEvent::Ended))
        ));
        let stop = json!({"event": "end-file", "reason": "stop"});
        assert!(map_mpv_event(&stop).is_none());
        let err = json!({"event": "end-file", "reason": "error", "file_error": "loading failed"});
        match map_mpv_event(&err) {
            Some(PlayerEvent::Transport(TransportEvent::Failed(msg))) => assert_eq!(msg, "loading failed"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn property_changes() {
        let pos = json!({"event": "property-change", "name": "time-pos", "data": 12.5});
        assert!(matches!(map_mpv_event(&pos), Some(PlayerEvent::Position { seconds }) if seconds == 12.5));
        let pause = json!({"event": "property-change", "name": "pause", "data": true});
        assert!(matches!(map_mpv_event(&pause), Some(PlayerEvent::Paused)));
        let idle = json!({"event": "property-change", "name": "time-pos"});
        assert!(matches!(map_mpv_event(&idle), Some(PlayerEvent::Position { seconds }) if seconds == 0.0));
    }

    #[test]
    fn reply_errors() {
        assert_eq!(reply_error(&json!({"request_id": 4, "error": "success"})), None);
        assert_eq!(
            reply_error(&json!({"request_id": 4, "error": "property unavailable"})),
            Some((4, "property unavailable"))
        );
        assert_eq!(rejection("operation aborted"), PlaybackRejection::Aborted);
        assert_eq!(rejection("error running command"), PlaybackRejection::Blocked);
    }

    #[tokio::test]
    async fn play_request_is_recorded_before_the_command_lands() {
        let (ours, theirs) = tokio::io::duplex(8);
        let play_request = Arc::new(AtomicU64::new(0));
        let ipc = IpcWriter::new(ours, Arc::clone(&play_request));
        // The pipe holds less than one command, so the write is still pending while we read.
        let task = tokio::spawn(async move { ipc.play().await });

        let mut lines = BufReader::new(theirs).lines();
        let sent: Value = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(sent["command"], json!(["set_property", "pause", false]));
        assert_eq!(sent["request_id"].as_u64(), Some(play_request.load(Ordering::Relaxed)));
        assert_eq!(play_request.load(Ordering::Relaxed), 1);
        task.await.unwrap().unwrap();
    }

    #[test]
    fn parses_device_help() {
        let text = "List of detected audio devices:\n  'auto' (Autoselect device)\n  'pulse/sink' (Speakers)\n";
        assert_eq!(parse_device_list(text), vec!["auto".to_string(), "pulse/sink".to_string()]);
    }
}

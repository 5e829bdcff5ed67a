mod app;
mod config;
mod input;
mod lyrics;
mod netease;
mod player;
mod playlist;
mod proxy;
mod storage;
mod tui;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use netease::NeteaseClient;
use netease::models::{QrStatus, Track};
use proxy::ProxyClient;
use proxy::server::ProxyContext;
use std::net::SocketAddr;
use std::time::Duration;
use storage::{Storage, StorageHandle};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tonearm", version, about = "Terminal music player with a session-keeping API proxy")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the interactive TUI (default).
    Tui {
        /// Play this track id on start without touching the saved queue.
        #[arg(long)]
        track: Option<String>,
    },
    /// Run the API proxy in the foreground.
    Serve {
        #[arg(long)]
        listen: Option<SocketAddr>,
    },
    /// Search songs and print them (headless).
    Search {
        keyword: String,
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    /// Search playlists and print them (headless).
    SearchPlaylists {
        keyword: String,
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    /// Search albums and print them (headless).
    SearchAlbums {
        keyword: String,
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    /// Print a playlist's tracks.
    Playlist { id: String },
    /// Print an album's tracks.
    Album { id: String },
    /// Print today's recommendations (needs a login).
    Daily,
    /// Print a track's lyrics with translations.
    Lyrics { id: String },
    /// Log in by scanning a QR code with the mobile app.
    Login,
    Logout,
    /// Show the logged-in profile.
    Whoami,
    /// Print a user's playlists.
    UserPlaylists {
        uid: String,
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    /// Audio output device management (mpv).
    Audio {
        #[command(subcommand)]
        cmd: AudioCommand,
    },
}

#[derive(Debug, Subcommand)]
enum AudioCommand {
    /// List mpv audio devices.
    List,
    /// Set mpv audio device (name as shown in list).
    Set { device: String },
    /// Clear mpv audio device override.
    Clear,
}

const QR_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;
    let cfg_path = match cli.config.clone() {
        Some(p) => p,
        None => config::default_config_path().context("default config path")?,
    };
    let command = cli.command.unwrap_or(Command::Tui { track: None });

    // The TUI owns the terminal, so its logs go to a file.
    if matches!(command, Command::Tui { .. }) {
        std::fs::create_dir_all(&cfg.paths.data_dir)
            .with_context(|| format!("create {}", cfg.paths.data_dir.display()))?;
        let log = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(cfg.paths.log_file())
            .context("open log file")?;
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_target(false)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(log))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match command {
        Command::Tui { track } => {
            let store = open_store(&cfg)?;
            let client = connect(&cfg, store.clone()).await?;
            let mut terminal = tui::TerminalGuard::enter().context("init terminal")?;
            let mut app = app::App::new(cfg, cfg_path, client, store);
            app.run(terminal.terminal_mut(), track.as_deref()).await?;
        }
        Command::Serve { listen } => {
            let addr = listen.unwrap_or(cfg.proxy.listen);
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("bind {addr}"))?;
            proxy::server::serve(listener, proxy_context(&cfg)?).await?;
        }
        Command::Search { keyword, page } => {
            let found = headless(&cfg).await?.search_music(&keyword, page).await?;
            println!("{} songs", found.song_count);
            print_tracks(&found.songs);
        }
        Command::SearchPlaylists { keyword, page } => {
            let found = headless(&cfg).await?.search_playlist(&keyword, page).await?;
            println!("{} playlists", found.playlist_count);
            for p in &found.playlists {
                println!("{:>12}  {}  ({})", p.id, p.name, p.creator_name);
            }
        }
        Command::SearchAlbums { keyword, page } => {
            let found = headless(&cfg).await?.search_album(&keyword, page).await?;
            println!("{} albums", found.album_count);
            for a in &found.albums {
                println!("{:>12}  {}  ({})", a.id, a.name, a.creator_name);
            }
        }
        Command::Playlist { id } => {
            let detail = headless(&cfg).await?.playlist(&id).await?;
            print_collection(&detail);
        }
        Command::Album { id } => {
            let detail = headless(&cfg).await?.album(&id).await?;
            print_collection(&detail);
        }
        Command::Daily => {
            let tracks = headless(&cfg).await?.daily_recommendation().await?;
            print_tracks(&tracks);
        }
        Command::Lyrics { id } => {
            let store = open_store(&cfg)?;
            let client = connect(&cfg, store.clone()).await?;
            let lyrics = lyrics::load(&client, &store, &id).await?;
            if let Some(notice) = lyrics.notice {
                println!("({})", notice.message());
            }
            for line in &lyrics.lines {
                let ms = line.time_ms;
                let stamp = format!("[{:02}:{:02}.{:02}]", ms / 60_000, ms / 1000 % 60, ms % 1000 / 10);
                match &line.translation {
                    Some(tr) => println!("{stamp} {}  /  {tr}", line.text),
                    None => println!("{stamp} {}", line.text),
                }
            }
        }
        Command::Login => {
            let client = headless(&cfg).await?;
            login(&client).await?;
        }
        Command::Logout => {
            headless(&cfg).await?.logout().await?;
            println!("Logged out.");
        }
        Command::Whoami => match headless(&cfg).await?.login_status().await? {
            Some(p) => println!("{} (uid {})\n{}", p.nickname, p.uid, p.signature),
            None => println!("Not logged in."),
        },
        Command::UserPlaylists { uid, page } => {
            let playlists = headless(&cfg).await?.user_playlists(&uid, page).await?;
            for p in &playlists {
                println!("{:>12}  {}  ({})", p.id, p.name, p.creator_name);
            }
        }
        Command::Audio { cmd } => match cmd {
            AudioCommand::List => {
                for device in player::mpv::list_audio_devices().await? {
                    println!("{device}");
                }
            }
            AudioCommand::Set { device } => {
                let mut cfg = cfg;
                cfg.player.audio_device = Some(device);
                config::save(&cfg, cli.config.as_deref()).context("save config")?;
                println!("Updated audio device in config.");
            }
            AudioCommand::Clear => {
                let mut cfg = cfg;
                cfg.player.audio_device = None;
                config::save(&cfg, cli.config.as_deref()).context("save config")?;
                println!("Cleared audio device override.");
            }
        },
    }

    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn open_store(cfg: &config::Config) -> anyhow::Result<StorageHandle> {
    let storage = Storage::open(&cfg.paths.database()).context("open storage")?;
    Ok(StorageHandle::new(storage))
}

fn proxy_context(cfg: &config::Config) -> anyhow::Result<ProxyContext> {
    let upstream = NeteaseClient::new(&cfg.upstream.base_url, &cfg.upstream.app_version, cfg.upstream.timeout())?;
    Ok(ProxyContext { upstream })
}

/// A proxy client for `proxy.url`, or for a proxy started in-process on a loopback port.
async fn connect(cfg: &config::Config, store: StorageHandle) -> anyhow::Result<ProxyClient> {
    let base = match &cfg.proxy.url {
        Some(url) => url.clone(),
        None => {
            let addr = proxy::server::spawn(SocketAddr::from(([127, 0, 0, 1], 0)), proxy_context(cfg)?)
                .await
                .context("start local proxy")?;
            format!("http://{addr}")
        }
    };
    // Leave the proxy room to time out upstream first.
    ProxyClient::with_store(&base, cfg.upstream.timeout() + Duration::from_secs(5), store).await
}

async fn headless(cfg: &config::Config) -> anyhow::Result<ProxyClient> {
    connect(cfg, open_store(cfg)?).await
}

async fn login(client: &ProxyClient) -> anyhow::Result<()> {
    let url = client.qr_code_url().await?;
    let key = url
        .rsplit_once("codekey=")
        .map(|(_, k)| k.to_string())
        .context("qr url without a key")?;
    println!("Open this link on a phone logged in to the app, or render it as a QR code:\n\n  {url}\n");

    loop {
        tokio::time::sleep(QR_POLL_INTERVAL).await;
        match client.qr_code_status(&key).await? {
            QrStatus::Waiting => continue,
            QrStatus::Expired => bail!("QR code expired, run `tonearm login` again"),
            QrStatus::Success => break,
            QrStatus::Unknown => tracing::debug!("qr status unknown, polling on"),
        }
    }

    match client.login_status().await? {
        Some(p) => println!("Logged in as {} (uid {}).", p.nickname, p.uid),
        None => println!("Logged in."),
    }
    Ok(())
}

fn print_collection(detail: &netease::models::CollectionDetail) {
    println!("{} by {}", detail.name, detail.creator_name);
    if !detail.create_time.is_empty() {
        println!("created {}", detail.create_time);
    }
    if !detail.description.is_empty() {
        println!("{}", detail.description);
    }
    println!();
    print_tracks(&detail.songs);
}

fn print_tracks(tracks: &[Track]) {
    for (i, t) in tracks.iter().enumerate() {
        let secs = t.duration / 1000;
        println!("{:02}. {}  [{}:{:02}]  (id={})", i + 1, t.display(), secs / 60, secs % 60, t.id);
    }
}

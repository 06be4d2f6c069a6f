use std::time::Duration;

use clap::{Parser, Subcommand};
use participant::{ClientError, Connection, Mirror};
use protocol::{Command as WireCommand, Event, Position};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid websocket URL: {0}")]
    InvalidUrl(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned HTTP {0}")]
    HttpStatus(u16),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("websocket closed")]
    WsClosed,
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),
    #[error("expected init as the first event, got {0}")]
    MissingInit(String),
    #[error("no box with id `{0}`")]
    UnknownBox(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "boxboard", about = "Shared box workspace CLI")]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "BOXBOARD_URL",
        default_value = "ws://127.0.0.1:8080/ws"
    )]
    url: String,

    /// Participant label stamped on created boxes. Random when omitted.
    #[arg(long, global = true, env = "BOXBOARD_USER")]
    user: Option<String>,

    #[arg(long, global = true, default_value_t = 5000)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Follow the workspace and print every event.
    Watch,
    /// Create a box and print its id.
    Add {
        text: String,
        #[arg(long)]
        color: Option<String>,
        #[arg(long, default_value_t = 100.0, allow_negative_numbers = true)]
        x: f64,
        #[arg(long, default_value_t = 100.0, allow_negative_numbers = true)]
        y: f64,
    },
    /// Move a box to a new position.
    Move {
        box_id: String,
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },
    /// Delete a box.
    Delete { box_id: String },
    /// Print the current boxes from the HTTP snapshot endpoint.
    List {
        /// HTTP base URL. Derived from --url when omitted.
        #[arg(long)]
        http: Option<String>,
    },
}

#[derive(Debug, Clone)]
struct CliContext {
    url: String,
    user: Option<String>,
    wait: Duration,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = CliContext {
        url: cli.url,
        user: cli.user,
        wait: Duration::from_millis(cli.timeout_ms),
    };

    match cli.command {
        Command::Watch => run_watch(&ctx).await,
        Command::Add { text, color, x, y } => {
            run_add(&ctx, text, color, Position::new(x, y)).await
        }
        Command::Move { box_id, x, y } => run_move(&ctx, box_id, Position::new(x, y)).await,
        Command::Delete { box_id } => run_delete(&ctx, box_id).await,
        Command::List { http } => run_list(&ctx, http).await,
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// A connected participant whose mirror has been seeded from `init`.
struct Session {
    conn: Connection,
    mirror: Mirror,
    wait: Duration,
}

impl Session {
    async fn open(ctx: &CliContext) -> Result<Self, CliError> {
        let conn = Connection::connect(&ctx.url).await?;
        let mut session = Self {
            conn,
            mirror: Mirror::new(),
            wait: ctx.wait,
        };
        let first = session.wait_for("init", |_| true).await?;
        if !matches!(first, Event::Init { .. }) {
            return Err(CliError::MissingInit(first.kind().to_owned()));
        }
        Ok(session)
    }

    /// Apply events to the mirror until one satisfies `matches`, bounded by
    /// the session timeout.
    async fn wait_for<F>(&mut self, what: &'static str, matches: F) -> Result<Event, CliError>
    where
        F: FnMut(&Event) -> bool,
    {
        let wait = self.wait;
        tokio::time::timeout(wait, self.next_matching(matches))
            .await
            .map_err(|_| CliError::Timeout(what))?
    }

    async fn next_matching<F>(&mut self, mut matches: F) -> Result<Event, CliError>
    where
        F: FnMut(&Event) -> bool,
    {
        loop {
            let Some(event) = self.conn.next_event().await? else {
                return Err(CliError::WsClosed);
            };
            self.mirror.apply(event.clone());
            if matches(&event) {
                return Ok(event);
            }
            debug!(kind = event.kind(), "skipping unrelated event");
        }
    }

    fn require_box(&self, box_id: &str) -> Result<(), CliError> {
        if self.mirror.get(box_id).is_none() {
            return Err(CliError::UnknownBox(box_id.to_owned()));
        }
        Ok(())
    }

    async fn finish(self) -> Result<(), CliError> {
        self.conn.close().await?;
        Ok(())
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

async fn run_watch(ctx: &CliContext) -> Result<(), CliError> {
    let mut conn = Connection::connect(&ctx.url).await?;
    let mut mirror = Mirror::new();

    while let Some(event) = conn.next_event().await? {
        let line = describe(&event);
        mirror.apply(event);
        println!("{line} [{} boxes]", mirror.len());
    }
    Ok(())
}

async fn run_add(
    ctx: &CliContext,
    text: String,
    color: Option<String>,
    position: Position,
) -> Result<(), CliError> {
    let user_id = ctx.user.clone().unwrap_or_else(participant::new_user_id);
    let color = color.unwrap_or_else(|| participant::random_color().to_owned());

    let mut session = Session::open(ctx).await?;
    session
        .conn
        .send(&WireCommand::AddBox {
            user_id: user_id.clone(),
            text: text.clone(),
            color,
            position,
        })
        .await?;

    let added = session
        .wait_for("box_added", |event| {
            matches!(event, Event::BoxAdded { item } if item.created_by == user_id && item.text == text)
        })
        .await?;
    if let Event::BoxAdded { item } = added {
        println!("{}", item.id);
    }
    session.finish().await
}

async fn run_move(ctx: &CliContext, box_id: String, position: Position) -> Result<(), CliError> {
    let mut session = Session::open(ctx).await?;
    session.require_box(&box_id)?;
    session
        .conn
        .send(&WireCommand::MoveBox {
            box_id: box_id.clone(),
            position,
        })
        .await?;

    session
        .wait_for("box_moved", |event| {
            matches!(event, Event::BoxMoved { box_id: id, position: p } if *id == box_id && *p == position)
        })
        .await?;
    println!("moved {box_id} to ({}, {})", position.x, position.y);
    session.finish().await
}

async fn run_delete(ctx: &CliContext, box_id: String) -> Result<(), CliError> {
    let mut session = Session::open(ctx).await?;
    session.require_box(&box_id)?;
    session
        .conn
        .send(&WireCommand::DeleteBox {
            box_id: box_id.clone(),
        })
        .await?;

    session
        .wait_for("box_deleted", |event| {
            matches!(event, Event::BoxDeleted { box_id: id } if *id == box_id)
        })
        .await?;
    println!("deleted {box_id}");
    session.finish().await
}

async fn run_list(ctx: &CliContext, http: Option<String>) -> Result<(), CliError> {
    let base = match http {
        Some(base) => base,
        None => http_base(&ctx.url)?,
    };
    let url = format!("{}/api/boxes", base.trim_end_matches('/'));

    let client = reqwest::Client::builder().timeout(ctx.wait).build()?;
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CliError::HttpStatus(status.as_u16()));
    }
    let json = response.json::<Value>().await?;
    print_json(&json)
}

// =============================================================================
// HELPERS
// =============================================================================

/// Map a websocket endpoint to the HTTP origin serving the same app.
fn http_base(ws_url: &str) -> Result<String, CliError> {
    let (scheme, rest) = if let Some(rest) = ws_url.strip_prefix("ws://") {
        ("http", rest)
    } else if let Some(rest) = ws_url.strip_prefix("wss://") {
        ("https", rest)
    } else {
        return Err(CliError::InvalidUrl(ws_url.to_owned()));
    };

    let host = rest.split('/').next().unwrap_or_default();
    if host.is_empty() {
        return Err(CliError::InvalidUrl(ws_url.to_owned()));
    }
    Ok(format!("{scheme}://{host}"))
}

fn describe(event: &Event) -> String {
    match event {
        Event::Init { boxes } => format!("init: {} boxes", boxes.len()),
        Event::BoxAdded { item } => format!(
            "box_added {} \"{}\" {} at ({}, {}) by {}",
            item.id, item.text, item.color, item.position.x, item.position.y, item.created_by
        ),
        Event::BoxMoved { box_id, position } => {
            format!("box_moved {box_id} to ({}, {})", position.x, position.y)
        }
        Event::BoxDeleted { box_id } => format!("box_deleted {box_id}"),
        Event::Unrecognized { kind } => format!("ignored {kind}"),
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;

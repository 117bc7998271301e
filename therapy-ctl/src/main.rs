//! therapy-ctl entry point.
//!
//! ```text
//! therapy-ctl hello                   Ping the canvas
//! therapy-ctl --config <path> ...     Use custom config TOML
//! therapy-ctl --gen-config            Dump default config and exit
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use therapy_core::config::DEFAULT_PUSH_PORT;
use therapy_core::{
    Canvas, Client, ClientConfig, DispatchMode, DrawLine, Endpoint, EventFilter, EventKind, Point,
    Rgba,
};

use therapy_ctl::commands;
use therapy_ctl::config::CtlConfig;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "therapy-ctl", about = "Remote control for the Therapy canvas")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "therapy-ctl.toml")]
    config: PathBuf,

    /// Server host for all channels (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Extra push destination host; repeatable.
    #[arg(long = "push-peer")]
    push_peers: Vec<String>,

    /// How draw_line, pan and zoom are sent (overrides config).
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Push,
    Request,
}

impl From<Mode> for DispatchMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Push => DispatchMode::Push,
            Mode::Request => DispatchMode::Request,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print the server greeting.
    Hello,
    /// List layers.
    Layers,
    DeleteLayer { name: String },
    ShowLayer { name: String },
    HideLayer { name: String },
    SetLayerPos {
        name: String,
        #[arg(allow_negative_numbers = true)]
        x: f32,
        #[arg(allow_negative_numbers = true)]
        y: f32,
    },
    ScreenSize,
    ScreenToWorld {
        #[arg(allow_negative_numbers = true)]
        x: f32,
        #[arg(allow_negative_numbers = true)]
        y: f32,
    },
    DrawLine {
        layer: String,
        #[arg(allow_negative_numbers = true)]
        x1: f32,
        #[arg(allow_negative_numbers = true)]
        y1: f32,
        #[arg(allow_negative_numbers = true)]
        x2: f32,
        #[arg(allow_negative_numbers = true)]
        y2: f32,
        #[arg(long)]
        thickness: Option<f32>,
        /// R G B A, each in 0..=1.
        #[arg(long, num_args = 4, value_names = ["R", "G", "B", "A"])]
        color: Option<Vec<f32>>,
    },
    Pan {
        #[arg(allow_negative_numbers = true)]
        x: f32,
        #[arg(allow_negative_numbers = true)]
        y: f32,
    },
    Zoom { scale: f32 },
    /// Print events until Ctrl-C.
    Events {
        /// Only these kinds, e.g. `mouse_motion`; repeatable.
        #[arg(long, value_parser = parse_kind)]
        filter: Vec<EventKind>,
        /// One JSON object per line.
        #[arg(long)]
        json: bool,
    },
    /// Keyboard navigation tool.
    Nav,
    /// Click-to-draw line tool.
    LineTool,
    /// Freehand pencil tool.
    Pencil,
    /// Stylus tool reading `down`, `up` or `X Y` lines from stdin.
    Stylus,
}

fn parse_kind(s: &str) -> Result<EventKind, String> {
    EventKind::from_name(s).ok_or_else(|| {
        let names: Vec<_> = EventKind::ALL.iter().map(|k| k.name()).collect();
        format!("unknown event kind `{s}`; expected one of {}", names.join(", "))
    })
}

fn apply_overrides(config: &mut ClientConfig, cli: &Cli) {
    if let Some(host) = &cli.host {
        let mut rehomed = ClientConfig::for_host(host);
        rehomed.dispatch = config.dispatch;
        rehomed.connect_timeout_ms = config.connect_timeout_ms;
        rehomed.request_timeout_ms = config.request_timeout_ms;
        rehomed.push_queue = config.push_queue;
        *config = rehomed;
    }
    for peer in &cli.push_peers {
        config.push.push(Endpoint::new(peer.as_str(), DEFAULT_PUSH_PORT));
    }
    if let Some(mode) = cli.mode {
        config.dispatch = mode.into();
    }
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&CtlConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let mut config = CtlConfig::load(&cli.config);
    apply_overrides(&mut config.connection, &cli);

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("therapy-ctl v{}", env!("CARGO_PKG_VERSION"));

    let Some(command) = cli.command else {
        return Err("no command given; see --help".into());
    };

    let client = Client::connect(config.connection.clone()).await?;
    let tools = &config.tools;

    match command {
        Cmd::Hello => println!("{}", client.hello().await?),
        Cmd::Layers => {
            for layer in client.get_layers().await? {
                println!("{layer}");
            }
        }
        Cmd::DeleteLayer { name } => println!("{}", client.delete_layer(&name).await?),
        Cmd::ShowLayer { name } => println!("{}", client.show_layer(&name).await?),
        Cmd::HideLayer { name } => println!("{}", client.hide_layer(&name).await?),
        Cmd::SetLayerPos { name, x, y } => {
            println!("{}", client.set_layer_pos(&name, x, y).await?)
        }
        Cmd::ScreenSize => {
            let size = client.screen_size().await?;
            println!("{} {}", size.width, size.height);
        }
        Cmd::ScreenToWorld { x, y } => {
            let p = client.screen_to_world(x, y).await?;
            println!("{} {}", p.x, p.y);
        }
        Cmd::DrawLine {
            layer,
            x1,
            y1,
            x2,
            y2,
            thickness,
            color,
        } => {
            let color = match color.as_deref() {
                Some(&[r, g, b, a]) => Rgba::new(r, g, b, a),
                _ => tools.color,
            };
            let line = DrawLine::new(
                layer,
                Point::new(x1, y1),
                Point::new(x2, y2),
                thickness.unwrap_or(tools.line_thickness),
                color,
            );
            client.draw_line(&line).await?;
        }
        Cmd::Pan { x, y } => client.pan(x, y).await?,
        Cmd::Zoom { scale } => client.zoom(scale).await?,
        Cmd::Events { filter, json } => {
            commands::print_events(&client, EventFilter::only(filter), json, tools.event_queue)
                .await?
        }
        Cmd::Nav => commands::navigate(&client, &tools.navigation, tools.event_queue).await?,
        Cmd::LineTool => commands::line_tool(&client, tools).await?,
        Cmd::Pencil => commands::pencil(&client, tools).await?,
        Cmd::Stylus => commands::stylus(&client, tools).await?,
    }

    client.close().await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn overrides_apply() {
        let cli = Cli::parse_from([
            "therapy-ctl",
            "--host",
            "10.0.0.1",
            "--push-peer",
            "10.0.0.2",
            "--mode",
            "request",
            "pan",
            "-0.5",
            "0.25",
        ]);
        let mut config = ClientConfig::default();
        apply_overrides(&mut config, &cli);

        assert_eq!(config.request.address(), "10.0.0.1:9464");
        assert_eq!(config.push.len(), 2);
        assert_eq!(config.push[1].address(), "10.0.0.2:9466");
        assert_eq!(config.dispatch, DispatchMode::Request);
        assert!(matches!(cli.command, Some(Cmd::Pan { x, .. }) if x == -0.5));
    }

    #[test]
    fn event_filter_names() {
        let cli = Cli::parse_from([
            "therapy-ctl",
            "events",
            "--filter",
            "mouse_motion",
            "--filter",
            "key_down",
        ]);
        match cli.command {
            Some(Cmd::Events { filter, json }) => {
                assert_eq!(filter, vec![EventKind::MouseMotion, EventKind::KeyDown]);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(parse_kind("bogus").is_err());
    }
}

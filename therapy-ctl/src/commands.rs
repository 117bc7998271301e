//! Long-running subcommands: the event printer and the drawing tools.

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use therapy_core::{
    Client, Event, EventFilter, EventListener, KeyboardNavigator, LineTool, Pencil, Result,
    StylusTool, TherapyError, TipEvent,
};

use crate::config::ToolsConfig;

/// Next event from the listener, or `None` on Ctrl-C or end of stream.
/// Undecodable events are logged and skipped.
async fn next_event(listener: &mut EventListener) -> Result<Option<Event>> {
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(None),
            item = listener.recv() => match item {
                None => return Ok(None),
                Some(Ok(event)) => return Ok(Some(event)),
                Some(Err(e)) if e.is_fatal() => return Err(e),
                Some(Err(e)) => warn!("skipping event: {e}"),
            },
        }
    }
}

/// One-line human-readable form of an event.
pub fn describe(event: &Event) -> String {
    match event {
        Event::KeyDown {
            key,
            modifiers,
            repeat,
        } => {
            let mut line = format!("Key down: {key}");
            if !modifiers.is_empty() {
                line.push_str(&format!(" [{}]", modifiers.join("+")));
            }
            if *repeat {
                line.push_str(" (repeat)");
            }
            line
        }
        Event::MouseMotion { x, y } => format!("Mouse motion: ({x}, {y})"),
        Event::MouseWheel { x, y } => format!("Mouse wheel: ({x}, {y})"),
        Event::MouseButtonDown { button, x, y } => {
            format!("Mouse button down: {button:?} @ ({x}, {y})")
        }
        Event::MouseButtonUp { button, x, y } => {
            format!("Mouse button up: {button:?} @ ({x}, {y})")
        }
    }
}

pub async fn print_events(client: &Client, filter: EventFilter, json: bool, queue: usize) -> Result<()> {
    let mut listener = client.subscribe(filter).await?.spawn(queue);
    let result = async {
        while let Some(event) = next_event(&mut listener).await? {
            if json {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => warn!("cannot render event: {e}"),
                }
            } else {
                println!("{}", describe(&event));
            }
        }
        Ok::<_, TherapyError>(())
    }
    .await;
    listener.shutdown().await;
    result
}

pub async fn navigate(client: &Client, nav: &KeyboardNavigator, queue: usize) -> Result<()> {
    info!(step = nav.step, "keyboard navigation: arrows pan, Z/X zoom, wheel zooms");
    let mut listener = client.subscribe(KeyboardNavigator::filter()).await?.spawn(queue);
    let result = async {
        while let Some(event) = next_event(&mut listener).await? {
            if let Some(action) = nav.handle(client, &event).await? {
                debug!(?action, "view changed");
            }
        }
        Ok::<_, TherapyError>(())
    }
    .await;
    listener.shutdown().await;
    result
}

pub async fn line_tool(client: &Client, tools: &ToolsConfig) -> Result<()> {
    let mut tool = LineTool::new(tools.line_brush());
    let mut listener = client.subscribe(LineTool::filter()).await?.spawn(tools.event_queue);
    let result = async {
        while let Some(event) = next_event(&mut listener).await? {
            println!("{}", describe(&event));
            if let Some(line) = tool.handle(client, &event).await? {
                debug!(?line, "line drawn");
            }
        }
        Ok::<_, TherapyError>(())
    }
    .await;
    listener.shutdown().await;
    result
}

pub async fn pencil(client: &Client, tools: &ToolsConfig) -> Result<()> {
    let mut pencil = Pencil::new(tools.pencil_brush());
    let mut listener = client
        .subscribe(EventFilter::all())
        .await?
        .spawn(tools.event_queue);
    let result = async {
        while let Some(event) = next_event(&mut listener).await? {
            if matches!(
                event,
                Event::MouseButtonDown { .. } | Event::MouseButtonUp { .. }
            ) {
                println!("{}", describe(&event));
            }
            pencil.handle(client, &event).await?;
        }
        Ok::<_, TherapyError>(())
    }
    .await;
    listener.shutdown().await;
    result
}

/// Drive the stylus tool from stdin lines: `down`, `up` or `X Y`.
pub async fn stylus(client: &Client, tools: &ToolsConfig) -> Result<()> {
    let mut tool = StylusTool::new(tools.stylus_brush()).with_cursor_layer(tools.cursor_layer.clone());
    tool.setup(client).await?;
    info!(cursor = tool.cursor_layer(), "stylus ready; reading tip events from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<TipEvent>() {
            Ok(event) => tool.handle(client, event).await?,
            Err(e) => warn!("ignoring input: {e}"),
        }
    }
    Ok(())
}

use crate::time::{parse_timestamp, to_canonical_time_string, TimeFormat};

use anyhow::{anyhow, bail, Context, Result};

/// One line of a `play` event script.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Media {
        path: String,
        content_type: Option<String>,
    },
    Subtitles {
        path: String,
    },
    Key(String),
    Select(usize),
    Wait(f64),
    Seek(f64),
    Drag {
        client_x: f64,
        container_left: f64,
        container_width: f64,
    },
    Status,
}

/// Parses one script line. Blank lines and `#` comments give `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut words = line.split_whitespace();
    let name = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    let command = match (name, args.as_slice()) {
        ("media", [path]) => Command::Media {
            path: path.to_string(),
            content_type: None,
        },
        ("media", [path, content_type]) => Command::Media {
            path: path.to_string(),
            content_type: Some(content_type.to_string()),
        },
        ("subtitles", [path]) => Command::Subtitles {
            path: path.to_string(),
        },
        ("key", [code]) => Command::Key(code.to_string()),
        ("space", []) => Command::Key("Space".to_string()),
        ("select", [index]) => Command::Select(
            index
                .parse()
                .context(format!("Invalid cue index: '{}'", index))?,
        ),
        ("wait", [secs]) => {
            let secs: f64 = secs
                .parse()
                .context(format!("Invalid duration: '{}'", secs))?;
            if !secs.is_finite() || secs < 0.0 {
                bail!("Duration must be a non-negative number of seconds");
            }
            Command::Wait(secs)
        }
        ("seek", [position]) => Command::Seek(parse_position(position)?),
        ("drag", [x, left, width]) => Command::Drag {
            client_x: number(x)?,
            container_left: number(left)?,
            container_width: number(width)?,
        },
        ("status", []) => Command::Status,
        (
            "media" | "subtitles" | "key" | "space" | "select" | "wait" | "seek" | "drag"
            | "status",
            _,
        ) => bail!("Wrong number of arguments for '{}'", name),
        _ => bail!("Unknown command '{}'", name),
    };
    Ok(Some(command))
}

/// A playback position given either as seconds or as a timestamp
/// (`HH:MM:SS,mmm`, `HH:MM:SS.mmm` or `MM:SS.mmm`).
pub fn parse_position(input: &str) -> Result<f64> {
    if input.contains(':') {
        let canonical = to_canonical_time_string(input, TimeFormat::Bracketed);
        return parse_timestamp(&canonical).map_err(|_| anyhow!("Invalid position: '{}'", input));
    }
    let secs = number(input)?;
    if secs < 0.0 {
        bail!("Invalid position: '{}'", input);
    }
    Ok(secs)
}

fn number(input: &str) -> Result<f64> {
    input
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| anyhow!("Invalid number: '{}'", input))
}

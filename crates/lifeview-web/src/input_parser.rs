#![forbid(unsafe_code)]

//! JSON decoding of host inputs into [`HostInput`] values.
//!
//! A browser shell forwards store notifications and DOM input as one JSON
//! object per input, discriminated by `kind`:
//!
//! ```json
//! {"kind": "insert", "table": "alive_cells", "row": {"x": 3, "y": 4, "player_id": 1}}
//! {"kind": "update", "table": "players", "old": {...}, "new": {...}}
//! {"kind": "transaction", "events": [{"kind": "delete", "table": "alive_cells", "row": {...}}]}
//! {"kind": "click", "x": 120, "y": 64}
//! {"kind": "color", "color": "#00FF00"}
//! {"kind": "connect", "identity": "<64 hex digits>", "token": "..."}
//! ```
//!
//! Unknown kinds decode to `Ok(None)` so a newer host can talk to an older
//! driver. Unknown tables are an error: dropping a row silently would leave
//! the mirror out of step with the store.

use lifeview_core::{AliveCell, Identity, Player, SimConfig};
use lifeview_render::Viewport;
use lifeview_runtime::{TableEvent, TableUpdate, TransactionUpdate};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::HostInput;

/// Errors from decoding an encoded host input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputParseError {
    /// Malformed JSON, or a row that does not match its table.
    Json(String),
    /// Missing required field.
    MissingField(&'static str),
    /// Table name the driver does not mirror.
    UnknownTable(String),
    /// Identity that is not 64 hex digits.
    InvalidIdentity(String),
    /// Resize geometry rejected by the viewport.
    InvalidViewport(String),
    /// Pointer coordinate outside the `i32` range.
    InvalidPointer(String),
    /// Transactions may only contain row events.
    NestedInput(String),
}

impl core::fmt::Display for InputParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Json(msg) => write!(f, "JSON parse error: {msg}"),
            Self::MissingField(field) => write!(f, "missing required field: {field}"),
            Self::UnknownTable(table) => write!(f, "unknown table: {table}"),
            Self::InvalidIdentity(msg) => write!(f, "invalid identity: {msg}"),
            Self::InvalidViewport(msg) => write!(f, "invalid viewport: {msg}"),
            Self::InvalidPointer(msg) => write!(f, "invalid pointer coordinate: {msg}"),
            Self::NestedInput(kind) => write!(f, "{kind} is not allowed inside a transaction"),
        }
    }
}

impl std::error::Error for InputParseError {}

#[derive(Debug, Deserialize)]
struct RawInput {
    kind: String,
    #[serde(default)]
    table: Option<String>,
    #[serde(default)]
    row: Option<Value>,
    #[serde(default)]
    old: Option<Value>,
    #[serde(default)]
    new: Option<Value>,
    #[serde(default)]
    events: Option<Vec<Value>>,
    #[serde(default)]
    x: Option<f64>,
    #[serde(default)]
    y: Option<f64>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    interval_ms: Option<u32>,
    #[serde(default)]
    cols: Option<u32>,
    #[serde(default)]
    rows: Option<u32>,
    #[serde(default)]
    cell_size: Option<u32>,
    #[serde(default)]
    origin_x: Option<i32>,
    #[serde(default)]
    origin_y: Option<i32>,
    #[serde(default)]
    identity: Option<String>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAliveCell {
    x: i32,
    y: i32,
    #[serde(alias = "player_id")]
    owner_id: u32,
}

#[derive(Debug, Deserialize)]
struct RawPlayer {
    id: u32,
    identity: String,
    #[serde(alias = "color")]
    color_hex: String,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    id: u32,
    tick_interval_ms: u32,
}

/// Decode one encoded host input.
///
/// Returns `Ok(None)` for kinds this driver does not know.
pub fn parse_encoded_input(json: &str) -> Result<Option<HostInput>, InputParseError> {
    let raw: RawInput =
        serde_json::from_str(json).map_err(|e| InputParseError::Json(e.to_string()))?;
    parse_raw(raw)
}

fn parse_raw(raw: RawInput) -> Result<Option<HostInput>, InputParseError> {
    let input = match raw.kind.as_str() {
        "insert" | "update" | "delete" => HostInput::Table(parse_table_event(raw)?),
        "transaction" => {
            let events = raw.events.ok_or(InputParseError::MissingField("events"))?;
            let mut tx = TransactionUpdate::default();
            for value in events {
                let nested: RawInput = serde_json::from_value(value)
                    .map_err(|e| InputParseError::Json(e.to_string()))?;
                match nested.kind.as_str() {
                    "insert" | "update" | "delete" => tx.push(parse_table_event(nested)?),
                    other => return Err(InputParseError::NestedInput(other.to_owned())),
                }
            }
            HostInput::Transaction(tx)
        }
        "click" => HostInput::PointerClick {
            x: pointer_coord(raw.x, "x")?,
            y: pointer_coord(raw.y, "y")?,
        },
        "color" => HostInput::ColorPick(raw.color.ok_or(InputParseError::MissingField("color"))?),
        "commit" => HostInput::Commit,
        "tick_interval" => HostInput::SetTickInterval(
            raw.interval_ms
                .ok_or(InputParseError::MissingField("interval_ms"))?,
        ),
        "resize" => {
            let cols = raw.cols.ok_or(InputParseError::MissingField("cols"))?;
            let rows = raw.rows.ok_or(InputParseError::MissingField("rows"))?;
            let cell_size = raw
                .cell_size
                .ok_or(InputParseError::MissingField("cell_size"))?;
            let viewport = Viewport::new(cols, rows, cell_size)
                .map_err(|e| InputParseError::InvalidViewport(e.to_string()))?
                .with_origin(lifeview_core::Cell::new(
                    raw.origin_x.unwrap_or(0),
                    raw.origin_y.unwrap_or(0),
                ));
            HostInput::Resize(viewport)
        }
        "connecting" => HostInput::Connecting,
        "connect" => {
            let hex = raw
                .identity
                .ok_or(InputParseError::MissingField("identity"))?;
            HostInput::Connected {
                identity: parse_identity(&hex)?,
                token: raw.token.ok_or(InputParseError::MissingField("token"))?,
            }
        }
        "disconnect" => HostInput::Disconnected,
        "connect_error" => {
            HostInput::ConnectError(raw.error.ok_or(InputParseError::MissingField("error"))?)
        }
        _ => return Ok(None),
    };
    Ok(Some(input))
}

fn parse_table_event(raw: RawInput) -> Result<TableUpdate, InputParseError> {
    let table = raw.table.ok_or(InputParseError::MissingField("table"))?;
    match table.as_str() {
        "alive_cells" => {
            build_event::<RawAliveCell, _, _>(&raw.kind, raw.row, raw.old, raw.new, |r| {
                Ok(AliveCell::new(r.x, r.y, r.owner_id))
            })
            .map(TableUpdate::Cells)
        }
        "players" => build_event::<RawPlayer, _, _>(&raw.kind, raw.row, raw.old, raw.new, |r| {
            Ok(Player::new(r.id, parse_identity(&r.identity)?, r.color_hex))
        })
        .map(TableUpdate::Players),
        "config" => build_event::<RawConfig, _, _>(&raw.kind, raw.row, raw.old, raw.new, |r| {
            Ok(SimConfig {
                id: r.id,
                tick_interval_ms: r.tick_interval_ms,
            })
        })
        .map(TableUpdate::Config),
        _ => Err(InputParseError::UnknownTable(table)),
    }
}

fn build_event<R, T, F>(
    kind: &str,
    row: Option<Value>,
    old: Option<Value>,
    new: Option<Value>,
    convert: F,
) -> Result<TableEvent<T>, InputParseError>
where
    R: DeserializeOwned,
    F: Fn(R) -> Result<T, InputParseError>,
{
    let decode = |value: Value| -> Result<T, InputParseError> {
        let raw: R =
            serde_json::from_value(value).map_err(|e| InputParseError::Json(e.to_string()))?;
        convert(raw)
    };
    match kind {
        "insert" => Ok(TableEvent::Insert(decode(
            row.ok_or(InputParseError::MissingField("row"))?,
        )?)),
        "delete" => Ok(TableEvent::Delete(decode(
            row.ok_or(InputParseError::MissingField("row"))?,
        )?)),
        _ => {
            let old = decode(old.ok_or(InputParseError::MissingField("old"))?)?;
            // `row` is accepted as the new value when `new` is absent.
            let new = decode(new.or(row).ok_or(InputParseError::MissingField("new"))?)?;
            Ok(TableEvent::Update { old, new })
        }
    }
}

/// DOM pointer offsets may be fractional; cells are found by floor division,
/// so the pixel is the floor of the offset.
fn pointer_coord(value: Option<f64>, field: &'static str) -> Result<i32, InputParseError> {
    let value = value.ok_or(InputParseError::MissingField(field))?;
    let floored = value.floor();
    if !(f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&floored) {
        return Err(InputParseError::InvalidPointer(format!("{field} = {value}")));
    }
    Ok(floored as i32)
}

fn parse_identity(hex: &str) -> Result<Identity, InputParseError> {
    Identity::from_hex(hex).map_err(|e| InputParseError::InvalidIdentity(e.to_string()))
}

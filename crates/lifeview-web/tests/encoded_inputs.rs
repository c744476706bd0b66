//! End-to-end scenarios fed through the JSON input path.

use lifeview_core::{Cell, PackedRgba};
use lifeview_runtime::OutboundIntent;
use lifeview_web::{InputParseError, StepSession};
use pretty_assertions::assert_eq;

const RED: PackedRgba = PackedRgba::rgb(0xFF, 0, 0);
const GREEN: PackedRgba = PackedRgba::rgb(0, 0xFF, 0);

fn local_hex() -> String {
    "0a".repeat(32)
}

fn feed(driver: &mut StepSession, lines: &[String]) {
    for line in lines {
        assert!(driver.push_encoded_input(line).unwrap(), "skipped: {line}");
    }
}

/// Center pixel of a cell on a 4-pixel board.
fn center(cell: Cell) -> (u32, u32) {
    (cell.x as u32 * 4 + 2, cell.y as u32 * 4 + 2)
}

fn connected_driver() -> StepSession {
    let mut d = StepSession::new();
    let id = local_hex();
    feed(
        &mut d,
        &[
            r#"{"kind":"resize","cols":16,"rows":8,"cell_size":4}"#.to_owned(),
            r#"{"kind":"connecting"}"#.to_owned(),
            format!(r#"{{"kind":"connect","identity":"{id}","token":"secret"}}"#),
            format!(
                r##"{{"kind":"insert","table":"players","row":{{"id":1,"identity":"{id}","color_hex":"#FF0000"}}}}"##
            ),
        ],
    );
    d.step();
    d.take_outputs();
    d
}

#[test]
fn click_commit_and_authoritative_echo() {
    let mut d = connected_driver();
    feed(
        &mut d,
        &[
            r#"{"kind":"click","x":9,"y":5}"#.to_owned(),
            r#"{"kind":"click","x":2,"y":2}"#.to_owned(),
        ],
    );
    let r = d.step();
    assert!(r.rendered);
    let out = d.take_outputs();
    let frame = out.last_frame.unwrap();
    let (px, py) = center(Cell::new(2, 1));
    assert_eq!(frame.get(px, py), Some(RED), "pending edit shows local color");

    feed(&mut d, &[r#"{"kind":"commit"}"#.to_owned()]);
    d.step();
    let out = d.take_outputs();
    assert_eq!(
        out.intents,
        vec![OutboundIntent::CellToggles(vec![
            Cell::new(0, 0),
            Cell::new(2, 1)
        ])]
    );

    // The store echoes both cells back as alive rows owned by the local player.
    feed(
        &mut d,
        &[r#"{"kind":"transaction","events":[
            {"kind":"insert","table":"alive_cells","row":{"x":0,"y":0,"player_id":1}},
            {"kind":"insert","table":"alive_cells","row":{"x":2,"y":1,"player_id":1}}
        ]}"#
        .to_owned()],
    );
    let r = d.step();
    assert_eq!(r.events_processed, 1);
    let frame = d.take_outputs().last_frame.unwrap();
    let (px, py) = center(Cell::new(2, 1));
    assert_eq!(frame.get(px, py), Some(RED));
    assert_eq!(d.session().cells().len(), 2);
}

#[test]
fn color_pick_recolors_owned_cells_optimistically() {
    let mut d = connected_driver();
    feed(
        &mut d,
        &[
            r#"{"kind":"insert","table":"alive_cells","row":{"x":3,"y":3,"player_id":1}}"#
                .to_owned(),
            r##"{"kind":"color","color":"#00FF00"}"##.to_owned(),
        ],
    );
    d.step();
    let out = d.take_outputs();
    assert_eq!(
        out.intents,
        vec![OutboundIntent::ColorChange("#00FF00".into())]
    );
    let (px, py) = center(Cell::new(3, 3));
    assert_eq!(out.last_frame.unwrap().get(px, py), Some(GREEN));
}

#[test]
fn unknown_owner_renders_fallback() {
    let mut d = connected_driver();
    feed(
        &mut d,
        &[r#"{"kind":"insert","table":"alive_cells","row":{"x":5,"y":1,"player_id":99}}"#
            .to_owned()],
    );
    d.step();
    let (px, py) = center(Cell::new(5, 1));
    assert_eq!(
        d.take_outputs().last_frame.unwrap().get(px, py),
        Some(PackedRgba::rgb(0xFF, 0xFF, 0xFF))
    );
}

#[test]
fn malformed_input_is_rejected_before_queueing() {
    let mut d = StepSession::new();
    assert!(matches!(
        d.push_encoded_input("{"),
        Err(InputParseError::Json(_))
    ));
    assert_eq!(
        d.push_encoded_input(r#"{"kind":"color"}"#),
        Err(InputParseError::MissingField("color"))
    );
    assert_eq!(d.push_encoded_input(r#"{"kind":"focus"}"#), Ok(false));
    assert_eq!(d.pending_inputs(), 0);
}

//! End-to-end compositing scenarios over live mirrors and the overlay.

use lifeview_core::{
    AliveCell, Cell, Dirty, EntityMirror, Identity, Invalidator, OwnershipIndex, PackedRgba,
    PendingEditOverlay, Player,
};
use lifeview_render::{CompositeRenderer, Palette, PixelBuffer, Scene, Viewport};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const BG: PackedRgba = PackedRgba::rgb(0x11, 0x11, 0x11);
const RED: PackedRgba = PackedRgba::rgb(255, 0, 0);
const GREEN: PackedRgba = PackedRgba::rgb(0, 255, 0);
const BLUE: PackedRgba = PackedRgba::rgb(0, 0, 255);

fn me() -> Identity {
    Identity::from_bytes([1; 32])
}

struct Board {
    inv: Invalidator,
    cells: EntityMirror<AliveCell>,
    players: EntityMirror<Player>,
    overlay: PendingEditOverlay,
    index: OwnershipIndex,
    renderer: CompositeRenderer,
    viewport: Viewport,
}

impl Board {
    fn new() -> Self {
        let inv = Invalidator::new();
        Self {
            cells: EntityMirror::attached(inv.clone(), Dirty::CELLS),
            players: EntityMirror::attached(inv.clone(), Dirty::PLAYERS),
            overlay: PendingEditOverlay::attached(inv.clone()),
            index: OwnershipIndex::new(),
            renderer: CompositeRenderer::new(Palette::plain(BG)),
            viewport: Viewport::new(10, 10, 4).unwrap(),
            inv,
        }
    }

    fn render(&mut self) -> PixelBuffer {
        let ownership = self.index.resolve(&self.players, Some(&me()));
        let snapshot = self.cells.snapshot();
        let pending = self.overlay.snapshot();
        self.renderer.render(&Scene {
            cells: &snapshot,
            pending: &pending,
            ownership: &ownership,
            viewport: self.viewport,
        })
    }

    fn pixel_of(buf: &PixelBuffer, cell: Cell) -> PackedRgba {
        buf.get(cell.x as u32 * 4 + 1, cell.y as u32 * 4 + 1)
            .unwrap_or(PackedRgba::TRANSPARENT)
    }
}

#[test]
fn red_cell_then_delete_returns_to_background() {
    let mut board = Board::new();
    board.players.on_insert(Player::new(1, Identity::from_bytes([2; 32]), "#FF0000"));
    board.cells.on_insert(AliveCell::new(5, 5, 1));

    assert_eq!(board.inv.take_frame(), Some(Dirty::CELLS | Dirty::PLAYERS));
    let frame = board.render();
    assert_eq!(Board::pixel_of(&frame, Cell::new(5, 5)), RED);

    board.cells.on_delete(&AliveCell::new(5, 5, 1));
    assert_eq!(board.inv.take_frame(), Some(Dirty::CELLS));
    let frame = board.render();
    assert_eq!(Board::pixel_of(&frame, Cell::new(5, 5)), BG);
    assert!(frame.pixels().iter().all(|p| *p == BG));
}

#[test]
fn pending_toggle_then_commit_flickers_to_background() {
    let mut board = Board::new();
    board.players.on_insert(Player::new(4, me(), "#0000FF"));
    board.inv.take_frame();

    board.overlay.toggle(Cell::new(2, 3));
    assert_eq!(board.inv.take_frame(), Some(Dirty::OVERLAY));
    let frame = board.render();
    assert_eq!(Board::pixel_of(&frame, Cell::new(2, 3)), BLUE);

    let outbound = board.overlay.drain_and_clear();
    assert_eq!(outbound, vec![Cell::new(2, 3)]);
    assert_eq!(board.inv.take_frame(), Some(Dirty::OVERLAY));
    // The remote insert has not arrived yet: the cell is dark.
    let frame = board.render();
    assert_eq!(Board::pixel_of(&frame, Cell::new(2, 3)), BG);

    board.cells.on_insert(AliveCell::new(2, 3, 4));
    let frame = board.render();
    assert_eq!(Board::pixel_of(&frame, Cell::new(2, 3)), BLUE);
}

#[test]
fn recolor_repaints_owned_cells_without_cell_mutation() {
    let mut board = Board::new();
    let other = Identity::from_bytes([3; 32]);
    board.players.on_insert(Player::new(7, other, "#FF0000"));
    board.cells.on_insert(AliveCell::new(0, 0, 7));
    board.cells.on_insert(AliveCell::new(9, 9, 7));
    board.inv.take_frame();

    let frame = board.render();
    assert_eq!(Board::pixel_of(&frame, Cell::new(9, 9)), RED);
    let cells_version = board.cells.version();

    board.players.on_update(
        Player::new(7, other, "#FF0000"),
        Player::new(7, other, "#00FF00"),
    );
    assert_eq!(board.inv.take_frame(), Some(Dirty::PLAYERS));
    let frame = board.render();
    assert_eq!(board.cells.version(), cells_version);
    assert_eq!(Board::pixel_of(&frame, Cell::new(0, 0)), GREEN);
    assert_eq!(Board::pixel_of(&frame, Cell::new(9, 9)), GREEN);
}

#[test]
fn unknown_owner_renders_in_fallback() {
    let mut board = Board::new();
    board.cells.on_insert(AliveCell::new(1, 1, 42));
    let frame = board.render();
    assert_eq!(Board::pixel_of(&frame, Cell::new(1, 1)), PackedRgba::WHITE);
}

fn arb_cells() -> impl Strategy<Value = Vec<AliveCell>> {
    prop::collection::vec(
        (-2i32..12, -2i32..12, 0u32..3).prop_map(|(x, y, o)| AliveCell::new(x, y, o)),
        0..40,
    )
}

proptest! {
    #[test]
    fn pending_order_does_not_change_pixels(
        alive in arb_cells(),
        pending in prop::collection::btree_set((-2i32..12, -2i32..12), 0..20),
    ) {
        let mut board = Board::new();
        board.players.on_insert(Player::new(1, me(), "#ABCDEF"));
        for row in alive {
            board.cells.on_insert(row);
        }
        let ordered: Vec<Cell> = pending.iter().map(|&(x, y)| Cell::new(x, y)).collect();
        let mut reversed = ordered.clone();
        reversed.reverse();

        let ownership = board.index.resolve(&board.players, Some(&me()));
        let snapshot = board.cells.snapshot();
        let a = board.renderer.render(&Scene {
            cells: &snapshot,
            pending: &ordered,
            ownership: &ownership,
            viewport: board.viewport,
        });
        let b = board.renderer.render(&Scene {
            cells: &snapshot,
            pending: &reversed,
            ownership: &ownership,
            viewport: board.viewport,
        });
        prop_assert_eq!(a.to_rgba8(), b.to_rgba8());
    }
}

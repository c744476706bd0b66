#![forbid(unsafe_code)]

//! Session wiring: remote events, user input, and the frame loop.
//!
//! A [`Session`] owns every piece of view state and is the only thing the
//! host talks to. The host feeds it table notifications, lifecycle changes,
//! and user input in any interleaving, and calls [`Session::frame`] at each
//! frame boundary.
//!
//! # Frame contract
//!
//! Mutations only raise dirty bits. [`Session::frame`] renders when something
//! is dirty and returns `None` otherwise, so any burst of events between two
//! frame boundaries costs at most one render. A [`TransactionUpdate`] is
//! applied inside a batch scope; a frame boundary reached while it is being
//! applied cannot observe it half-done.
//!
//! # Connection lifecycle
//!
//! ```text
//! Disconnected --begin_connect--> Connecting --on_connect--> Connected
//!      ^                              |                          |
//!      |                              +--on_connect_error--> Failed
//!      +------------------------on_disconnect--------------------+
//! ```
//!
//! Mirrors are never cleared by lifecycle changes; after a disconnect the
//! board keeps showing the last known state.

use std::rc::Rc;

use lifeview_core::{
    AliveCell, BatchScope, Cell, Dirty, EntityMirror, Identity, InvalidationStats, Invalidator,
    MirrorChange, OwnershipIndex, OwnershipResolution, PackedRgba, PendingEditOverlay, Player,
    SimConfig, TableRow,
};
use lifeview_render::{CompositeRenderer, CompositeStats, PixelBuffer, Scene, Viewport};
use tracing::{debug, field, info, info_span, warn};
use web_time::Instant;

use crate::config::{ConfigError, ResolvedView};
use crate::controller::{InputError, InteractionController};
use crate::events::{ConnectionState, TableEvent, TableUpdate, TransactionUpdate};
use crate::outbound::MutationSink;
use crate::token_store::{MemoryTokenStore, TokenStore, TokenStoreError};

/// All client-side view state plus its outbound sink.
pub struct Session<S: MutationSink> {
    invalidator: Invalidator,
    cells: EntityMirror<AliveCell>,
    players: EntityMirror<Player>,
    config: EntityMirror<SimConfig>,
    ownership: OwnershipIndex,
    controller: InteractionController,
    renderer: CompositeRenderer,
    connection: ConnectionState,
    local_identity: Option<Identity>,
    tokens: Box<dyn TokenStore>,
    sink: S,
    frame: PixelBuffer,
    frame_idx: u64,
    last_stats: CompositeStats,
}

impl<S: MutationSink> Session<S> {
    /// Session with the default board and an in-memory token store.
    pub fn new(sink: S) -> Self {
        Self::assemble(
            ResolvedView::default(),
            OwnershipIndex::new(),
            sink,
            Box::new(MemoryTokenStore::new()),
        )
    }

    /// Session with a resolved view configuration and a token store.
    pub fn with_view(
        view: ResolvedView,
        sink: S,
        tokens: Box<dyn TokenStore>,
    ) -> Result<Self, ConfigError> {
        let ownership = OwnershipIndex::with_fallback(&view.fallback_hex)
            .map_err(|e| ConfigError::Validation(vec![format!("fallback_color: {e}")]))?;
        Ok(Self::assemble(view, ownership, sink, tokens))
    }

    fn assemble(
        view: ResolvedView,
        ownership: OwnershipIndex,
        sink: S,
        tokens: Box<dyn TokenStore>,
    ) -> Self {
        let invalidator = Invalidator::new();
        // The first frame boundary always paints.
        invalidator.invalidate(Dirty::VIEWPORT);
        Self {
            cells: EntityMirror::attached(invalidator.clone(), Dirty::CELLS),
            players: EntityMirror::attached(invalidator.clone(), Dirty::PLAYERS),
            config: EntityMirror::new(),
            ownership,
            controller: InteractionController::new(view.viewport, invalidator.clone()),
            renderer: CompositeRenderer::new(view.palette),
            connection: ConnectionState::Disconnected,
            local_identity: None,
            tokens,
            sink,
            frame: PixelBuffer::new(0, 0, view.palette.background),
            frame_idx: 0,
            last_stats: CompositeStats::default(),
            invalidator,
        }
    }

    // ------------------------------------------------------------------
    // Remote notifications
    // ------------------------------------------------------------------

    /// Apply one table notification.
    pub fn apply(&mut self, update: TableUpdate) -> MirrorChange {
        let _span = info_span!("lifeview.apply", table = update.table(), kind = update.kind())
            .entered();
        match update {
            TableUpdate::Cells(event) => apply_event(&mut self.cells, event),
            TableUpdate::Players(event) => {
                let local_color = match &event {
                    TableEvent::Insert(row) | TableEvent::Update { new: row, .. }
                        if Some(row.identity) == self.local_identity =>
                    {
                        PackedRgba::from_hex(&row.color_hex).ok()
                    }
                    _ => None,
                };
                let change = apply_event(&mut self.players, event);
                // Only the row confirming the picked color supersedes it.
                let confirmed = change.is_effective()
                    && local_color.is_some()
                    && self
                        .ownership
                        .optimistic_color()
                        .and_then(|hex| PackedRgba::from_hex(hex).ok())
                        == local_color;
                if confirmed && self.ownership.clear_optimistic_color() {
                    debug!("optimistic color superseded by authoritative player row");
                    self.invalidator.invalidate(Dirty::LOCAL);
                }
                change
            }
            TableUpdate::Config(event) => apply_event(&mut self.config, event),
        }
    }

    /// Apply a remote transaction as one burst. Returns how many of its
    /// events changed a mirror.
    pub fn apply_transaction(&mut self, tx: TransactionUpdate) -> usize {
        let _batch = self.invalidator.batch();
        let total = tx.len();
        let effective = tx
            .events
            .into_iter()
            .map(|event| self.apply(event))
            .filter(|change| change.is_effective())
            .count();
        debug!(total, effective, "transaction applied");
        effective
    }

    /// Hold frame boundaries off until the returned scope drops.
    ///
    /// For hosts that deliver one logical burst as several calls.
    #[must_use]
    pub fn batch(&self) -> BatchScope {
        self.invalidator.batch()
    }

    // ------------------------------------------------------------------
    // Connection lifecycle
    // ------------------------------------------------------------------

    /// Enter `Connecting` and return the token to resume with, if any.
    pub fn begin_connect(&mut self) -> Result<Option<String>, TokenStoreError> {
        self.set_connection(ConnectionState::Connecting);
        self.reconnect_token()
    }

    /// Stored reconnection token.
    pub fn reconnect_token(&self) -> Result<Option<String>, TokenStoreError> {
        self.tokens.load()
    }

    /// Connection established. The token is persisted for the next session;
    /// a persistence failure leaves the connection up and is returned.
    pub fn on_connect(&mut self, identity: Identity, token: &str) -> Result<(), TokenStoreError> {
        if self.local_identity != Some(identity) {
            self.local_identity = Some(identity);
            self.invalidator.invalidate(Dirty::LOCAL);
        }
        self.set_connection(ConnectionState::Connected { identity });
        self.tokens.store(token).inspect_err(|e| {
            warn!(error = %e, "failed to persist reconnection token");
        })
    }

    /// Connection lost. Mirrors keep their contents.
    pub fn on_disconnect(&mut self) {
        self.set_connection(ConnectionState::Disconnected);
    }

    /// Connection attempt failed. Mirrors keep their contents.
    pub fn on_connect_error(&mut self, error: impl Into<String>) {
        let error = error.into();
        warn!(error = %error, "connection failed");
        self.set_connection(ConnectionState::Failed { error });
    }

    /// Drop the stored token so the next connection gets a fresh identity.
    pub fn forget_token(&mut self) -> Result<(), TokenStoreError> {
        self.tokens.clear()
    }

    fn set_connection(&mut self, next: ConnectionState) {
        if self.connection != next {
            info!(from = self.connection.as_str(), to = next.as_str(), "connection state changed");
            self.connection = next;
        }
    }

    // ------------------------------------------------------------------
    // User input
    // ------------------------------------------------------------------

    pub fn handle_pointer_click(&mut self, px: i32, py: i32) -> Option<Cell> {
        self.controller.handle_pointer_click(px, py)
    }

    /// Submit pending toggles. Returns the number of cells sent.
    pub fn commit(&mut self) -> usize {
        self.controller.commit(&mut self.sink)
    }

    pub fn handle_color_pick(&mut self, color_hex: &str) -> Result<PackedRgba, InputError> {
        self.controller
            .handle_color_pick(color_hex, &mut self.ownership, &mut self.sink)
    }

    pub fn set_tick_interval(&mut self, interval_ms: u32) -> Result<(), InputError> {
        self.controller.set_tick_interval(interval_ms, &mut self.sink)
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.controller.set_viewport(viewport);
    }

    // ------------------------------------------------------------------
    // Frame loop
    // ------------------------------------------------------------------

    /// Frame boundary: render if anything changed since the last frame.
    pub fn frame(&mut self) -> Option<&PixelBuffer> {
        let dirty = self.invalidator.take_frame()?;
        self.render(dirty);
        Some(&self.frame)
    }

    fn render(&mut self, dirty: Dirty) {
        let viewport = self.controller.viewport();
        let span = info_span!(
            "lifeview.render",
            alive = self.cells.len(),
            pending = self.controller.overlay().len(),
            width = viewport.pixel_width(),
            height = viewport.pixel_height(),
            duration_us = field::Empty,
        );
        let _guard = span.enter();
        let start = Instant::now();

        let ownership = self.ownership.resolve(&self.players, self.local_identity.as_ref());
        let cells = self.cells.snapshot();
        let pending = self.controller.overlay().snapshot();
        let scene = Scene {
            cells: &cells,
            pending: &pending,
            ownership: &ownership,
            viewport,
        };
        self.last_stats = self.renderer.render_into(&scene, &mut self.frame);
        self.frame_idx += 1;

        let duration_us = start.elapsed().as_micros() as u64;
        span.record("duration_us", duration_us);
        debug!(
            frame_idx = self.frame_idx,
            dirty = ?dirty,
            clipped = self.last_stats.alive_clipped + self.last_stats.pending_clipped,
            "frame rendered"
        );
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Most recently rendered frame (empty before the first frame).
    #[must_use]
    pub fn last_frame(&self) -> &PixelBuffer {
        &self.frame
    }

    /// Number of frames rendered so far.
    #[must_use]
    pub fn frame_idx(&self) -> u64 {
        self.frame_idx
    }

    #[must_use]
    pub fn last_stats(&self) -> CompositeStats {
        self.last_stats
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.invalidator.is_dirty()
    }

    #[must_use]
    pub fn invalidation_stats(&self) -> InvalidationStats {
        self.invalidator.stats()
    }

    #[must_use]
    pub fn cells(&self) -> &EntityMirror<AliveCell> {
        &self.cells
    }

    #[must_use]
    pub fn players(&self) -> &EntityMirror<Player> {
        &self.players
    }

    /// Current simulation tick interval, once the config row is known.
    #[must_use]
    pub fn tick_interval_ms(&self) -> Option<u32> {
        self.config.iter().next().map(|row| row.tick_interval_ms)
    }

    #[must_use]
    pub fn pending(&self) -> &PendingEditOverlay {
        self.controller.overlay()
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.controller.viewport()
    }

    /// Current ownership resolution.
    pub fn ownership(&mut self) -> Rc<OwnershipResolution> {
        self.ownership.resolve(&self.players, self.local_identity.as_ref())
    }

    #[must_use]
    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    /// Identity of the last successful connection.
    #[must_use]
    pub fn local_identity(&self) -> Option<&Identity> {
        self.local_identity.as_ref()
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

impl<S: MutationSink> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("connection", &self.connection)
            .field("cells", &self.cells)
            .field("players", &self.players)
            .field("pending", &self.controller.overlay().len())
            .field("frame_idx", &self.frame_idx)
            .finish_non_exhaustive()
    }
}

fn apply_event<T: TableRow>(mirror: &mut EntityMirror<T>, event: TableEvent<T>) -> MirrorChange {
    match event {
        TableEvent::Insert(row) => mirror.on_insert(row),
        TableEvent::Update { old, new } => mirror.on_update(old, new),
        TableEvent::Delete(row) => mirror.on_delete(&row),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::{OutboundIntent, OutboundQueue};
    use pretty_assertions::assert_eq;

    fn me() -> Identity {
        Identity::from_bytes([5; 32])
    }

    fn session() -> Session<OutboundQueue> {
        let view = ResolvedView {
            viewport: Viewport::new(8, 8, 4).unwrap(),
            palette: lifeview_render::Palette::plain(PackedRgba::BLACK),
            ..ResolvedView::default()
        };
        Session::with_view(view, OutboundQueue::new(), Box::new(MemoryTokenStore::new())).unwrap()
    }

    #[test]
    fn first_frame_always_renders() {
        let mut s = session();
        let frame = s.frame().unwrap();
        assert_eq!((frame.width(), frame.height()), (32, 32));
        assert!(s.frame().is_none());
        assert_eq!(s.frame_idx(), 1);
    }

    #[test]
    fn event_burst_renders_once() {
        let mut s = session();
        s.frame();
        for x in 0..8 {
            s.apply(TableEvent::Insert(AliveCell::new(x, 0, 1)).into());
        }
        assert!(s.frame().is_some());
        assert!(s.frame().is_none());
        assert_eq!(s.frame_idx(), 2);
        assert_eq!(s.last_stats().alive_drawn, 8);
    }

    #[test]
    fn transaction_is_atomic_for_frames() {
        let mut s = session();
        s.frame();
        let mut tx = TransactionUpdate::default();
        tx.push(TableEvent::Insert(AliveCell::new(1, 1, 1)));
        tx.push(TableEvent::Delete(AliveCell::new(1, 1, 1)));
        tx.push(TableEvent::Delete(AliveCell::new(1, 1, 1)));
        assert_eq!(s.apply_transaction(tx), 2);
        assert!(s.cells().is_empty());
        assert!(s.frame().is_some());
    }

    #[test]
    fn connect_persists_token_and_sets_identity() {
        let mut s = session();
        assert_eq!(s.begin_connect().unwrap(), None);
        assert_eq!(s.connection(), &ConnectionState::Connecting);
        s.on_connect(me(), "tok").unwrap();
        assert_eq!(s.connection().identity(), Some(&me()));
        assert_eq!(s.reconnect_token().unwrap().as_deref(), Some("tok"));
    }

    #[test]
    fn disconnect_keeps_mirrors() {
        let mut s = session();
        s.on_connect(me(), "tok").unwrap();
        s.apply(TableEvent::Insert(AliveCell::new(2, 2, 1)).into());
        s.on_disconnect();
        assert_eq!(s.connection(), &ConnectionState::Disconnected);
        assert_eq!(s.cells().len(), 1);

        s.on_connect_error("timeout");
        assert_eq!(
            s.connection(),
            &ConnectionState::Failed {
                error: "timeout".into()
            }
        );
        assert_eq!(s.cells().len(), 1);
        assert_eq!(s.local_identity(), Some(&me()));
    }

    #[test]
    fn optimistic_color_cleared_by_authoritative_local_row() {
        let mut s = session();
        s.on_connect(me(), "tok").unwrap();
        s.apply(TableEvent::Insert(Player::new(1, me(), "#FFFFFF")).into());
        s.handle_color_pick("#00FF00").unwrap();
        assert_eq!(s.ownership().local_color(), PackedRgba::rgb(0, 255, 0));

        // A row for someone else does not touch the override.
        let other = Identity::from_bytes([6; 32]);
        s.apply(TableEvent::Insert(Player::new(2, other, "#0000FF")).into());
        assert_eq!(s.ownership().local_color(), PackedRgba::rgb(0, 255, 0));

        s.apply(
            TableEvent::Update {
                old: Player::new(1, me(), "#FFFFFF"),
                new: Player::new(1, me(), "#00FF00"),
            }
            .into(),
        );
        let ownership = s.ownership();
        assert_eq!(ownership.local_color(), PackedRgba::rgb(0, 255, 0));
        assert_eq!(ownership.local_player(), Some(1));
        assert_eq!(s.sink_mut().drain(), vec![OutboundIntent::ColorChange("#00FF00".into())]);
    }

    #[test]
    fn duplicate_local_row_keeps_optimistic_color() {
        let mut s = session();
        s.on_connect(me(), "tok").unwrap();
        s.apply(TableEvent::Insert(Player::new(1, me(), "#FFFFFF")).into());
        s.handle_color_pick("#00FF00").unwrap();

        let change = s.apply(TableEvent::Insert(Player::new(1, me(), "#FFFFFF")).into());
        assert_eq!(change, MirrorChange::Duplicate);
        assert_eq!(s.ownership().local_color(), PackedRgba::rgb(0, 255, 0));
    }

    #[test]
    fn stale_confirmation_keeps_newer_pick() {
        let mut s = session();
        s.on_connect(me(), "tok").unwrap();
        s.apply(TableEvent::Insert(Player::new(1, me(), "#FFFFFF")).into());
        s.handle_color_pick("#FF0000").unwrap();
        s.handle_color_pick("#00FF00").unwrap();

        // Confirmation of the first pick arrives after the second was made.
        s.apply(
            TableEvent::Update {
                old: Player::new(1, me(), "#FFFFFF"),
                new: Player::new(1, me(), "#FF0000"),
            }
            .into(),
        );
        assert_eq!(s.ownership().local_color(), PackedRgba::rgb(0, 255, 0));

        s.apply(
            TableEvent::Update {
                old: Player::new(1, me(), "#FF0000"),
                new: Player::new(1, me(), "#00ff00"),
            }
            .into(),
        );
        assert_eq!(s.ownership.optimistic_color(), None);
        assert_eq!(s.ownership().local_color(), PackedRgba::rgb(0, 255, 0));
    }

    #[test]
    fn forget_token_clears_stored_token() {
        let mut s = session();
        s.on_connect(me(), "tok").unwrap();
        s.forget_token().unwrap();
        assert_eq!(s.reconnect_token().unwrap(), None);
        // Clearing twice is harmless.
        s.forget_token().unwrap();
        assert_eq!(s.begin_connect().unwrap(), None);
    }

    #[test]
    fn tick_interval_follows_config_mirror_only() {
        let mut s = session();
        assert_eq!(s.tick_interval_ms(), None);
        s.apply(TableEvent::Insert(SimConfig { id: 0, tick_interval_ms: 500 }).into());
        s.set_tick_interval(100).unwrap();
        assert_eq!(s.tick_interval_ms(), Some(500));
        s.apply(
            TableEvent::Update {
                old: SimConfig { id: 0, tick_interval_ms: 500 },
                new: SimConfig { id: 0, tick_interval_ms: 100 },
            }
            .into(),
        );
        assert_eq!(s.tick_interval_ms(), Some(100));
        assert_eq!(s.sink_mut().drain(), vec![OutboundIntent::TickInterval(100)]);
    }

    #[test]
    fn commit_goes_through_sink() {
        let mut s = session();
        assert_eq!(s.handle_pointer_click(5, 5), Some(Cell::new(1, 1)));
        assert_eq!(s.commit(), 1);
        assert_eq!(s.commit(), 0);
        assert_eq!(
            s.sink_mut().drain(),
            vec![OutboundIntent::CellToggles(vec![Cell::new(1, 1)])]
        );
    }

    #[test]
    fn invalid_fallback_is_a_config_error() {
        let view = ResolvedView {
            fallback_hex: "white".into(),
            ..ResolvedView::default()
        };
        assert!(matches!(
            Session::with_view(view, OutboundQueue::new(), Box::new(MemoryTokenStore::new())),
            Err(ConfigError::Validation(_))
        ));
    }
}

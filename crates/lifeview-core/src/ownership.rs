#![forbid(unsafe_code)]

//! Player-to-color resolution derived from the player mirror.
//!
//! [`OwnershipIndex`] never owns player data. It derives an immutable
//! [`OwnershipResolution`] from the current contents of the player mirror
//! and the caller's local identity, and caches it until one of its inputs
//! changes:
//!
//! - the mirror's version (any effective insert/update/delete),
//! - the local identity passed by the caller,
//! - the optimistic local color override.
//!
//! Lookups are total. An owner id with no player record, or a player whose
//! `color_hex` does not parse, resolves to the fallback color. The local
//! user's color is found by scanning for a player whose identity equals the
//! caller's identity (byte equality), again with the fallback when absent.

use std::rc::Rc;

use ahash::AHashMap;
use tracing::{debug, trace};

use crate::color::{ColorParseError, PackedRgba};
use crate::mirror::EntityMirror;
use crate::model::{Identity, Player, PlayerId};

/// Default color of unknown owners; matches the color the remote store
/// assigns to freshly connected players.
pub const DEFAULT_FALLBACK_HEX: &str = "#FFFFFF";

/// Immutable color lookup for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnershipResolution {
    colors: AHashMap<PlayerId, (PackedRgba, String)>,
    local_player: Option<PlayerId>,
    local: (PackedRgba, String),
    fallback: (PackedRgba, String),
}

impl OwnershipResolution {
    /// Color of `owner`, or the fallback.
    #[must_use]
    pub fn color_of(&self, owner: PlayerId) -> PackedRgba {
        self.colors.get(&owner).map_or(self.fallback.0, |(c, _)| *c)
    }

    /// Hex string of `owner`'s color, or the fallback hex.
    #[must_use]
    pub fn color_hex_of(&self, owner: PlayerId) -> &str {
        self.colors
            .get(&owner)
            .map_or(self.fallback.1.as_str(), |(_, hex)| hex.as_str())
    }

    /// The local user's color (optimistic override first, then the player
    /// record matching the local identity, then the fallback).
    #[must_use]
    pub fn local_color(&self) -> PackedRgba {
        self.local.0
    }

    #[must_use]
    pub fn local_color_hex(&self) -> &str {
        &self.local.1
    }

    /// Player id whose identity matched the local identity.
    #[must_use]
    pub fn local_player(&self) -> Option<PlayerId> {
        self.local_player
    }

    #[must_use]
    pub fn fallback(&self) -> PackedRgba {
        self.fallback.0
    }

    /// Number of players with a resolvable color.
    #[must_use]
    pub fn resolved_players(&self) -> usize {
        self.colors.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheKey {
    players_version: u64,
    local: Option<Identity>,
    optimistic_generation: u64,
}

/// Lazily recomputed ownership lookup.
#[derive(Debug)]
pub struct OwnershipIndex {
    fallback: (PackedRgba, String),
    optimistic: Option<(PackedRgba, String)>,
    optimistic_generation: u64,
    cache: Option<(CacheKey, Rc<OwnershipResolution>)>,
    recomputes: u64,
}

impl Default for OwnershipIndex {
    fn default() -> Self {
        Self {
            fallback: (PackedRgba::WHITE, DEFAULT_FALLBACK_HEX.to_owned()),
            optimistic: None,
            optimistic_generation: 0,
            cache: None,
            recomputes: 0,
        }
    }
}

impl OwnershipIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index with a custom fallback color.
    pub fn with_fallback(hex: &str) -> Result<Self, ColorParseError> {
        let color = PackedRgba::from_hex(hex)?;
        Ok(Self {
            fallback: (color, color.to_hex()),
            ..Self::default()
        })
    }

    #[must_use]
    pub fn fallback(&self) -> PackedRgba {
        self.fallback.0
    }

    /// Resolve against the player mirror, recomputing only if an input
    /// changed since the previous call.
    pub fn resolve(
        &mut self,
        players: &EntityMirror<Player>,
        local: Option<&Identity>,
    ) -> Rc<OwnershipResolution> {
        let key = CacheKey {
            players_version: players.version(),
            local: local.copied(),
            optimistic_generation: self.optimistic_generation,
        };
        if let Some((cached_key, resolution)) = &self.cache
            && *cached_key == key
        {
            trace!(players_version = key.players_version, "ownership cache hit");
            return Rc::clone(resolution);
        }

        let resolution = Rc::new(self.build(players, local));
        self.recomputes += 1;
        debug!(
            players = players.len(),
            players_version = key.players_version,
            local_player = ?resolution.local_player,
            "ownership index recomputed"
        );
        self.cache = Some((key, Rc::clone(&resolution)));
        resolution
    }

    fn build(&self, players: &EntityMirror<Player>, local: Option<&Identity>) -> OwnershipResolution {
        let mut colors = AHashMap::with_capacity(players.len());
        let mut local_match: Option<(PlayerId, Option<(PackedRgba, String)>)> = None;

        for player in players.iter() {
            let parsed = PackedRgba::from_hex(&player.color_hex)
                .ok()
                .map(|c| (c, player.color_hex.clone()));
            match &parsed {
                Some(entry) => {
                    colors.insert(player.id, entry.clone());
                }
                None => {
                    debug!(
                        player = player.id,
                        color_hex = %player.color_hex,
                        "unparseable player color, using fallback"
                    );
                }
            }
            // Identities are unique remotely; on a transient duplicate the
            // lowest id wins.
            if local_match.is_none() && local.is_some_and(|id| *id == player.identity) {
                local_match = Some((player.id, parsed));
            }
        }

        let local_player = local_match.as_ref().map(|(id, _)| *id);
        let mut local_color = local_match
            .and_then(|(_, color)| color)
            .unwrap_or_else(|| self.fallback.clone());

        if let Some(optimistic) = &self.optimistic {
            local_color = optimistic.clone();
            if let Some(id) = local_player {
                colors.insert(id, optimistic.clone());
            }
        }

        OwnershipResolution {
            colors,
            local_player,
            local: local_color,
            fallback: self.fallback.clone(),
        }
    }

    /// Apply a locally-picked color ahead of remote confirmation.
    pub fn set_optimistic_color(&mut self, hex: &str) -> Result<PackedRgba, ColorParseError> {
        let color = PackedRgba::from_hex(hex)?;
        self.optimistic = Some((color, hex.to_owned()));
        self.optimistic_generation += 1;
        Ok(color)
    }

    /// Drop the optimistic color. Returns whether one was set.
    pub fn clear_optimistic_color(&mut self) -> bool {
        if self.optimistic.take().is_some() {
            self.optimistic_generation += 1;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn optimistic_color(&self) -> Option<&str> {
        self.optimistic.as_ref().map(|(_, hex)| hex.as_str())
    }

    /// How many times a resolution was actually rebuilt.
    #[must_use]
    pub fn recompute_count(&self) -> u64 {
        self.recomputes
    }
}

//! Teleporter lookup for one map.

use std::collections::HashMap;

/// A teleporter tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Teleporter {
    pub tile_x: usize,
    pub tile_y: usize,
    /// Link code shared with the matching teleporter on the destination map.
    pub code: String,
    /// Destination map id.
    pub destination: String,
}

/// Teleporters of a map, indexed both by tile position and by code.
#[derive(Debug, Clone, Default)]
pub struct TeleporterManager {
    teleporters: Vec<Teleporter>,
    by_position: HashMap<(usize, usize), usize>,
    /// First teleporter registered for each code.
    by_code: HashMap<String, usize>,
}

impl TeleporterManager {
    /// Register a teleporter. A later teleporter on the same tile replaces
    /// the earlier one; the first teleporter of a code stays its anchor.
    pub fn add(&mut self, teleporter: Teleporter) {
        let pos = (teleporter.tile_x, teleporter.tile_y);
        if let Some(&idx) = self.by_position.get(&pos) {
            self.teleporters[idx] = teleporter;
            self.reindex_codes();
            return;
        }
        let idx = self.teleporters.len();
        self.by_code.entry(teleporter.code.clone()).or_insert(idx);
        self.by_position.insert(pos, idx);
        self.teleporters.push(teleporter);
    }

    fn reindex_codes(&mut self) {
        self.by_code.clear();
        for (idx, t) in self.teleporters.iter().enumerate() {
            self.by_code.entry(t.code.clone()).or_insert(idx);
        }
    }

    #[inline]
    pub fn at(&self, tile_x: usize, tile_y: usize) -> Option<&Teleporter> {
        self.by_position
            .get(&(tile_x, tile_y))
            .map(|&idx| &self.teleporters[idx])
    }

    #[inline]
    pub fn by_code(&self, code: &str) -> Option<&Teleporter> {
        self.by_code.get(code).map(|&idx| &self.teleporters[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Teleporter> {
        self.teleporters.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.teleporters.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.teleporters.is_empty()
    }
}

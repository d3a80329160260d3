use super::bot_player::Bot;
use crate::entity::{EntityId, Player};
use crate::runtime::MapRuntime;
use rand::Rng;
use std::collections::BTreeMap;

/// Bot manager.
#[derive(Debug, Default)]
pub struct BotManager {
    /// Active bots.
    pub bots: Vec<Bot>,
}

impl BotManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive the player with id `id`.
    pub fn add_bot(&mut self, id: EntityId) {
        self.bots.push(Bot::new(id));
    }

    pub fn remove_bot(&mut self, id: EntityId) {
        self.bots.retain(|b| b.id != id);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bots.is_empty()
    }

    /// Set movement intent for every bot whose player and map are present.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        players: &mut BTreeMap<EntityId, Player>,
        runtimes: &BTreeMap<String, MapRuntime>,
        rng: &mut R,
    ) {
        for bot in &mut self.bots {
            let Some(player) = players.get_mut(&bot.id) else {
                continue;
            };
            let Some(runtime) = runtimes.get(&player.current_map_id) else {
                continue;
            };
            bot.update(player, runtime, rng);
        }
    }
}

//! A shared movement arena: the reference [`Simulation`] for Statecast.
//!
//! Each connected peer controls one sprite in a rectangular arena. Peers
//! send movement events (`up`, `down`, `left`, `right`); each cycle the
//! coordinator broadcasts the full arena state, so every client renders
//! every sprite from the same snapshot.
//!
//! Wire shapes:
//!
//! - inbound event: `{"playerId": "<uuid>", "action": "up"}`
//! - snapshot payload: `{"players": {"<uuid>": {"x": .., "y": ..}}}`
//!
//! The arena is deliberately small — it exists so the engine is runnable
//! and testable end to end, not as a game in its own right.

use std::collections::BTreeMap;

use rand::Rng as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use statecast_hub::simulation::{Simulation, SimulationError};
use statecast_types::{InboundEvent, PeerId};

/// Arena dimensions and movement step, from the `game:` config section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Arena width in pixels.
    pub width: f64,
    /// Arena height in pixels.
    pub height: f64,
    /// Distance one movement event travels, in pixels.
    pub step: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            step: 5.0,
        }
    }
}

/// One sprite's position inside the arena.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Horizontal position, 0 at the left edge.
    pub x: f64,
    /// Vertical position, 0 at the top edge.
    pub y: f64,
}

/// A movement command from a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveAction {
    /// Decrease `y` by one step.
    Up,
    /// Increase `y` by one step.
    Down,
    /// Decrease `x` by one step.
    Left,
    /// Increase `x` by one step.
    Right,
}

/// The decoded form of one inbound peer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// The player the event claims to act for. Must match the
    /// connection the event arrived on.
    #[serde(rename = "playerId")]
    pub player_id: PeerId,

    /// The movement to perform.
    pub action: MoveAction,
}

/// The arena state: one [`Player`] per connected peer.
///
/// Mutated only from the coordinator task, so no interior locking.
#[derive(Debug)]
pub struct Game {
    config: GameConfig,
    players: BTreeMap<PeerId, Player>,
}

impl Game {
    /// Create an empty arena with the given configuration.
    pub const fn new(config: GameConfig) -> Self {
        Self {
            config,
            players: BTreeMap::new(),
        }
    }

    /// Number of players currently in the arena.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Look up one player's position.
    pub fn player(&self, id: PeerId) -> Option<Player> {
        self.players.get(&id).copied()
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

impl Simulation for Game {
    fn add_peer(&mut self, id: PeerId) {
        // Random spawn so simultaneous joiners don't stack on one pixel.
        let mut rng = rand::rng();
        let player = Player {
            x: rng.random_range(0.0..=self.config.width),
            y: rng.random_range(0.0..=self.config.height),
        };
        self.players.insert(id, player);
    }

    fn remove_peer(&mut self, id: PeerId) {
        self.players.remove(&id);
    }

    fn apply(&mut self, event: &InboundEvent) -> Result<(), SimulationError> {
        let decoded: GameEvent = serde_json::from_str(&event.data)?;
        if decoded.player_id != event.origin {
            return Err(SimulationError::Unsupported {
                reason: format!(
                    "event claims player {} but arrived from {}",
                    decoded.player_id, event.origin
                ),
            });
        }

        let Some(player) = self.players.get_mut(&decoded.player_id) else {
            return Err(SimulationError::Unsupported {
                reason: format!("unknown player {}", decoded.player_id),
            });
        };

        let step = self.config.step;
        match decoded.action {
            MoveAction::Up => player.y = (player.y - step).max(0.0),
            MoveAction::Down => player.y = (player.y + step).min(self.config.height),
            MoveAction::Left => player.x = (player.x - step).max(0.0),
            MoveAction::Right => player.x = (player.x + step).min(self.config.width),
        }
        Ok(())
    }

    fn snapshot(&self) -> Result<Value, SimulationError> {
        let players = serde_json::to_value(&self.players)
            .map_err(|source| SimulationError::Snapshot { source })?;
        Ok(serde_json::json!({ "players": players }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn move_event(id: PeerId, action: &str) -> InboundEvent {
        InboundEvent::new(id, format!(r#"{{"playerId":"{id}","action":"{action}"}}"#))
    }

    fn make_game() -> Game {
        Game::new(GameConfig {
            width: 100.0,
            height: 100.0,
            step: 10.0,
        })
    }

    #[test]
    fn peers_spawn_inside_the_arena() {
        let mut game = make_game();
        let id = PeerId::new();
        game.add_peer(id);

        let player = game.player(id).unwrap();
        assert!((0.0..=100.0).contains(&player.x));
        assert!((0.0..=100.0).contains(&player.y));
        assert_eq!(game.player_count(), 1);

        game.remove_peer(id);
        assert_eq!(game.player_count(), 0);
    }

    #[test]
    fn movement_applies_one_step() {
        let mut game = make_game();
        let id = PeerId::new();
        game.add_peer(id);
        let before = game.player(id).unwrap();

        game.apply(&move_event(id, "right")).unwrap();
        let after = game.player(id).unwrap();

        let expected = (before.x + 10.0).min(100.0);
        assert!((after.x - expected).abs() < f64::EPSILON);
        assert!((after.y - before.y).abs() < f64::EPSILON);
    }

    #[test]
    fn movement_clamps_to_arena_bounds() {
        let mut game = make_game();
        let id = PeerId::new();
        game.add_peer(id);

        // Walk well past the left edge.
        for _ in 0..30 {
            game.apply(&move_event(id, "left")).unwrap();
        }
        let player = game.player(id).unwrap();
        assert!(player.x.abs() < f64::EPSILON);

        for _ in 0..30 {
            game.apply(&move_event(id, "down")).unwrap();
        }
        let player = game.player(id).unwrap();
        assert!((player.y - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_event_is_rejected() {
        let mut game = make_game();
        let id = PeerId::new();
        game.add_peer(id);

        let bad = InboundEvent::new(id, String::from("{broken"));
        assert!(game.apply(&bad).is_err());

        let unknown_action = InboundEvent::new(
            id,
            format!(r#"{{"playerId":"{id}","action":"teleport"}}"#),
        );
        assert!(game.apply(&unknown_action).is_err());
    }

    #[test]
    fn spoofed_player_id_is_rejected() {
        let mut game = make_game();
        let honest = PeerId::new();
        let victim = PeerId::new();
        game.add_peer(honest);
        game.add_peer(victim);

        let spoofed = InboundEvent::new(
            honest,
            format!(r#"{{"playerId":"{victim}","action":"up"}}"#),
        );
        assert!(matches!(
            game.apply(&spoofed),
            Err(SimulationError::Unsupported { .. })
        ));
    }

    #[test]
    fn event_for_departed_player_is_rejected() {
        let mut game = make_game();
        let id = PeerId::new();
        game.add_peer(id);
        game.remove_peer(id);

        assert!(matches!(
            game.apply(&move_event(id, "up")),
            Err(SimulationError::Unsupported { .. })
        ));
    }

    #[test]
    fn snapshot_is_stable_without_events() {
        let mut game = make_game();
        game.add_peer(PeerId::new());
        game.add_peer(PeerId::new());

        let first = game.snapshot().unwrap();
        let second = game.snapshot().unwrap();
        assert_eq!(first, second);
        assert_eq!(first["players"].as_object().unwrap().len(), 2);
    }

    #[test]
    fn snapshot_reflects_an_applied_event_exactly_once() {
        let mut game = make_game();
        let id = PeerId::new();
        game.add_peer(id);

        // Pin the sprite to the left edge so the next move is a
        // guaranteed position change.
        for _ in 0..30 {
            game.apply(&move_event(id, "left")).unwrap();
        }

        let before = game.snapshot().unwrap();
        game.apply(&move_event(id, "right")).unwrap();
        let after = game.snapshot().unwrap();

        assert_ne!(before, after);
        // No further change until another event arrives.
        assert_eq!(after, game.snapshot().unwrap());
    }
}

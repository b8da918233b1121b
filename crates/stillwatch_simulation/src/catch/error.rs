//! Причины отказа старта catch sequence.

use bevy::prelude::Entity;
use thiserror::Error;

/// Catch не стартует: ни один флаг ещё не переключён
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CatchAbort {
    #[error("no player for enemy {0:?} to catch")]
    MissingPlayer(Entity),
    #[error("player {0:?} has no camera view")]
    MissingCamera(Entity),
    #[error("enemy {enemy:?} is already running a catch sequence on {player:?}")]
    AlreadyRunning { enemy: Entity, player: Entity },
    #[error("catching is disabled for enemy {0:?}")]
    Disabled(Entity),
    #[error("enemy {0:?} is concealed and cannot catch")]
    Concealed(Entity),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_messages_name_entities() {
        let enemy = Entity::from_raw(3);
        let message = CatchAbort::Disabled(enemy).to_string();
        assert!(message.contains(&format!("{:?}", enemy)));
    }
}

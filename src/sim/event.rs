/// Events emitted by a simulation step.
///
/// The step function returns these instead of talking to the UI directly;
/// the presentation layer turns them into messages, screen transitions and
/// level changes.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameEvent {
    /// Player touched a checkpoint tile that was not already active.
    CheckpointReached { x: i32, y: i32 },
    /// A hit landed; carries remaining health.
    PlayerDamaged { hp: u32 },
    PlayerDied,
    PlayerRespawned,
    /// Player fell below the level and was returned to the checkpoint.
    VoidFall,
    /// A crumbling platform started its arming countdown.
    PlatformTriggered { x: i32, y: i32 },
    /// Player attack connected; carries the boss's remaining health.
    BossHit { hp: u32 },
    BossEnraged,
    BossTeleported,
    BossDefeated,
    /// Player reached the exit tile.
    LevelComplete,
}

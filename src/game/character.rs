use crate::game::action::Action;
use crate::game::attack::{AttackData, HitArea};
use crate::game::{CHARACTER_HEIGHT, CHARACTER_WIDTH, GROUND_Y, MAX_HP};
use serde::{Deserialize, Serialize};

/// Which player a character is. P1 is index 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerSide {
    P1,
    P2,
}

impl PlayerSide {
    pub const BOTH: [PlayerSide; 2] = [PlayerSide::P1, PlayerSide::P2];

    pub fn index(self) -> usize {
        match self {
            PlayerSide::P1 => 0,
            PlayerSide::P2 => 1,
        }
    }

    pub fn opponent(self) -> PlayerSide {
        match self {
            PlayerSide::P1 => PlayerSide::P2,
            PlayerSide::P2 => PlayerSide::P1,
        }
    }
}

/// Coarse posture of a character; the ordinal feeds `*_state{N}_ratio`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterPhase {
    Stand,
    Crouch,
    Air,
    Down,
}

impl CharacterPhase {
    pub const COUNT: usize = 4;

    pub fn ordinal(self) -> usize {
        self as usize
    }
}

/// Point-in-time state of one character. `x` is the horizontal center, `y`
/// the bottom edge of the body box in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterState {
    pub side: PlayerSide,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub speed_x: i32,
    pub speed_y: i32,
    pub hp: i32,
    pub energy: i32,
    pub action: Action,
    pub phase: CharacterPhase,
    /// Facing right.
    pub front: bool,
    /// False while an action or hit stun is in progress.
    pub control: bool,
    pub remaining_frames: u32,
    /// Frames elapsed since the current action started.
    pub action_frame: u32,
    pub attack: Option<AttackData>,
}

impl CharacterState {
    /// Idle character standing on the ground at `x`.
    pub fn standing(side: PlayerSide, x: i32) -> Self {
        CharacterState {
            side,
            x,
            y: GROUND_Y,
            width: CHARACTER_WIDTH,
            height: CHARACTER_HEIGHT,
            speed_x: 0,
            speed_y: 0,
            hp: MAX_HP,
            energy: 0,
            action: Action::Stand,
            phase: CharacterPhase::Stand,
            front: side == PlayerSide::P1,
            control: true,
            remaining_frames: 0,
            action_frame: 0,
            attack: None,
        }
    }

    pub fn left(&self) -> i32 {
        self.x - self.width / 2
    }

    pub fn right(&self) -> i32 {
        self.x + self.width / 2
    }

    pub fn top(&self) -> i32 {
        self.y - self.height
    }

    pub fn bottom(&self) -> i32 {
        self.y
    }

    pub fn hit_box(&self) -> HitArea {
        HitArea {
            left: self.left(),
            right: self.right(),
            top: self.top(),
            bottom: self.bottom(),
        }
    }

    pub fn is_airborne(&self) -> bool {
        self.phase == CharacterPhase::Air
    }
}

use crate::game::character::PlayerSide;

/// Axis-aligned box in screen coordinates (`top < bottom`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HitArea {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl HitArea {
    pub fn overlaps(&self, other: &HitArea) -> bool {
        self.left <= other.right
            && other.left <= self.right
            && self.top <= other.bottom
            && other.top <= self.bottom
    }

    pub fn translate_x(&mut self, dx: i32) {
        self.left += dx;
        self.right += dx;
    }
}

/// An attack in flight: either the melee attack a character is performing or
/// a detached projectile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackData {
    pub owner: PlayerSide,
    /// 0 = none, 1 = high, 2 = middle, 3 = low, 4 = throw.
    pub attack_type: i32,
    pub hit_damage: i32,
    pub guard_damage: i32,
    pub hit_add_energy: i32,
    pub hit_stun: u32,
    pub hit_area: HitArea,
    pub speed_x: i32,
    /// Frames left before the hit area disappears.
    pub remaining_frames: u32,
    /// Whether the hit area currently connects.
    pub active: bool,
    /// Set once the attack has hit or been guarded.
    pub consumed: bool,
}

impl AttackData {
    pub fn is_projectile(&self) -> bool {
        self.speed_x != 0
    }
}

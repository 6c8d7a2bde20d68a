//! Immutable per-frame snapshot of both fighters.

use crate::game::attack::AttackData;
use crate::game::character::{CharacterState, PlayerSide};
use crate::game::{FPS, ROUND_TIME_MS};

/// Projectiles further than this horizontal gap are ignored by
/// [`GameState::closest_projectile`].
const PROJECTILE_SEARCH_LIMIT: i32 = 1000;

/// Both characters, the live projectiles, the absolute frame index and the
/// round number. Accessors hand out copies, so a snapshot stored in a
/// trajectory can never be altered through them.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    characters: [CharacterState; 2],
    projectiles: Vec<AttackData>,
    pub frame: u32,
    pub round: u32,
}

impl GameState {
    pub fn new(p1: CharacterState, p2: CharacterState) -> Self {
        GameState {
            characters: [p1, p2],
            projectiles: Vec::new(),
            frame: 0,
            round: 1,
        }
    }

    pub fn with_projectiles(mut self, projectiles: Vec<AttackData>) -> Self {
        self.projectiles = projectiles;
        self
    }

    pub fn with_frame(mut self, frame: u32) -> Self {
        self.frame = frame;
        self
    }

    pub fn character(&self, side: PlayerSide) -> CharacterState {
        self.characters[side.index()]
    }

    /// Copies of every live projectile.
    pub fn projectiles(&self) -> Vec<AttackData> {
        self.projectiles.clone()
    }

    /// Copies of the projectiles fired by `owner`.
    pub fn projectiles_by(&self, owner: PlayerSide) -> impl Iterator<Item = AttackData> + '_ {
        self.projectiles
            .iter()
            .filter(move |p| p.owner == owner)
            .copied()
    }

    pub(crate) fn characters_mut(&mut self) -> &mut [CharacterState; 2] {
        &mut self.characters
    }

    pub(crate) fn projectiles_mut(&mut self) -> &mut Vec<AttackData> {
        &mut self.projectiles
    }

    /// Horizontal gap between the two body boxes, 0 when they overlap.
    pub fn distance_x(&self, a: PlayerSide, b: PlayerSide) -> i32 {
        let a = &self.characters[a.index()];
        let b = &self.characters[b.index()];
        if a.left() > b.right() || a.right() < b.left() {
            (a.right() - b.left()).abs().min((a.left() - b.right()).abs())
        } else {
            0
        }
    }

    /// The projectile fired by `owner` closest to `target`, compared by
    /// horizontal gap and then by vertical gap (0 when the projectile overlaps
    /// the target's vertical span).
    pub fn closest_projectile(&self, target: PlayerSide, owner: PlayerSide) -> Option<AttackData> {
        let t = &self.characters[target.index()];
        let mut best: Option<(i32, i32, AttackData)> = None;

        for projectile in self.projectiles_by(owner) {
            let area = projectile.hit_area;
            let gap_x = (t.right() - area.left)
                .abs()
                .min((t.left() - area.right).abs());
            if gap_x >= PROJECTILE_SEARCH_LIMIT {
                continue;
            }
            let within = |y: i32| t.top() <= y && y <= t.bottom();
            let gap_y = if within(area.bottom) || within(area.top) {
                0
            } else {
                (t.top() - area.bottom).abs().min((area.top - t.bottom()).abs())
            };

            let closer = match &best {
                None => true,
                Some((bx, by, _)) => gap_x < *bx || (gap_x == *bx && gap_y < *by),
            };
            if closer {
                best = Some((gap_x, gap_y, projectile));
            }
        }

        best.map(|(_, _, projectile)| projectile)
    }

    pub fn remaining_time_ms(&self) -> i64 {
        ROUND_TIME_MS - (self.frame as i64 * 1000) / FPS as i64
    }

    /// Whether `side` may be given a new action: it is not mid-action and
    /// the round has time left.
    pub fn is_ready_to_act(&self, side: PlayerSide) -> bool {
        self.characters[side.index()].control && self.remaining_time_ms() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::attack::HitArea;

    fn projectile(owner: PlayerSide, left: i32, top: i32) -> AttackData {
        AttackData {
            owner,
            attack_type: 2,
            hit_damage: 10,
            guard_damage: 2,
            hit_add_energy: 5,
            hit_stun: 10,
            hit_area: HitArea {
                left,
                right: left + 40,
                top,
                bottom: top + 40,
            },
            speed_x: 8,
            remaining_frames: 30,
            active: true,
            consumed: false,
        }
    }

    #[test]
    fn test_distance_uses_box_gap() {
        let state = GameState::new(
            CharacterState::standing(PlayerSide::P1, 200),
            CharacterState::standing(PlayerSide::P2, 310),
        );
        assert_eq!(state.distance_x(PlayerSide::P1, PlayerSide::P2), 50);

        let overlapping = GameState::new(
            CharacterState::standing(PlayerSide::P1, 200),
            CharacterState::standing(PlayerSide::P2, 230),
        );
        assert_eq!(overlapping.distance_x(PlayerSide::P1, PlayerSide::P2), 0);
    }

    #[test]
    fn test_accessors_return_copies() {
        let state = GameState::new(
            CharacterState::standing(PlayerSide::P1, 200),
            CharacterState::standing(PlayerSide::P2, 600),
        );
        let mut copy = state.character(PlayerSide::P1);
        copy.hp = 0;
        assert_eq!(copy.hp, 0);
        assert_eq!(state.character(PlayerSide::P1).hp, crate::game::MAX_HP);
    }

    #[test]
    fn test_closest_projectile_tie_broken_vertically() {
        let target = CharacterState::standing(PlayerSide::P2, 600);
        // Same horizontal gap, one at body height, one far above.
        let high = projectile(PlayerSide::P1, 400, 100);
        let level = projectile(PlayerSide::P1, 400, target.top() + 20);
        let far = projectile(PlayerSide::P1, 100, target.top() + 20);
        let state = GameState::new(CharacterState::standing(PlayerSide::P1, 200), target)
            .with_projectiles(vec![far, high, level]);

        let closest = state.closest_projectile(PlayerSide::P2, PlayerSide::P1).unwrap();
        assert_eq!(closest, level);
        assert!(state.closest_projectile(PlayerSide::P1, PlayerSide::P2).is_none());
    }

    #[test]
    fn test_ready_to_act_requires_control_and_time() {
        let mut p1 = CharacterState::standing(PlayerSide::P1, 200);
        let p2 = CharacterState::standing(PlayerSide::P2, 600);
        let state = GameState::new(p1, p2);
        assert!(state.is_ready_to_act(PlayerSide::P1));

        let expired = state.clone().with_frame(60 * 60);
        assert!(!expired.is_ready_to_act(PlayerSide::P1));

        p1.control = false;
        assert!(!GameState::new(p1, p2).is_ready_to_act(PlayerSide::P1));
    }
}

//! One-frame state transition of a fight.
//!
//! The search only needs "advance one frame given the actions each side
//! starts this frame". Engines plug their own physics behind [`FightModel`];
//! [`KinematicModel`] is a small built-in model used for local matches and
//! tests. It moves, jumps, guards, throws hit boxes and projectiles, and
//! nothing more.

use crate::game::action::Action;
use crate::game::attack::{AttackData, HitArea};
use crate::game::character::{CharacterPhase, CharacterState, PlayerSide};
use crate::game::game_state::GameState;
use crate::game::motion::{AttackSpec, MotionTable};
use crate::game::{GROUND_Y, MAX_ENERGY, STAGE_WIDTH};

/// Frame-stepping physics consumed by the forward simulator.
pub trait FightModel: Send + Sync {
    fn motion_table(&self, side: PlayerSide) -> &MotionTable;

    /// Advances `state` by one frame. `commands[i]` is the action player `i`
    /// starts this frame, if any. Commands given to a character without
    /// control, or air actions requested on the ground (and the reverse),
    /// are dropped.
    fn step(&self, state: &mut GameState, commands: [Option<Action>; 2]);
}

const GRAVITY: i32 = 3;
const LANDING_FRAMES: u32 = 4;
const KNOCKBACK: i32 = 6;

#[derive(Debug, Clone, Default)]
pub struct KinematicModel {
    motions: [MotionTable; 2],
}

impl KinematicModel {
    pub fn new(p1: MotionTable, p2: MotionTable) -> Self {
        KinematicModel { motions: [p1, p2] }
    }

    fn start_action(&self, c: &mut CharacterState, action: Action) {
        if !c.control || action.is_air() != c.is_airborne() {
            return;
        }
        let motion = self.motion_table(c.side).get(action);
        if motion.energy_cost() > c.energy {
            return;
        }

        let facing = if c.front { 1 } else { -1 };
        c.action = action;
        c.action_frame = 0;
        c.remaining_frames = motion.frame_number;
        c.control = false;
        c.energy = (c.energy + motion.attack_start_add_energy).clamp(0, MAX_ENERGY);
        c.speed_x = motion.speed_x * facing;
        c.attack = None;

        if action.is_jump() {
            c.phase = CharacterPhase::Air;
            c.speed_y = motion.speed_y;
        } else if c.is_airborne() {
            c.speed_y += motion.speed_y;
        } else if action.name().starts_with("CROUCH") {
            c.phase = CharacterPhase::Crouch;
        }
    }

    /// Moves the character and runs its action timer.
    fn integrate(&self, c: &mut CharacterState) {
        c.x = (c.x + c.speed_x).clamp(c.width / 2, STAGE_WIDTH - c.width / 2);

        if c.is_airborne() {
            c.y += c.speed_y;
            c.speed_y += GRAVITY;
            if c.y >= GROUND_Y && c.speed_y > 0 {
                c.y = GROUND_Y;
                c.speed_y = 0;
                c.speed_x = 0;
                c.phase = CharacterPhase::Stand;
                if c.control {
                    c.action = Action::Stand;
                } else {
                    c.action = Action::Landing;
                    c.action_frame = 0;
                    c.remaining_frames = LANDING_FRAMES;
                    c.attack = None;
                }
            }
        }

        c.action_frame += 1;
        c.remaining_frames = c.remaining_frames.saturating_sub(1);
        if !c.control && c.remaining_frames == 0 {
            c.control = true;
            c.attack = None;
            c.action_frame = 0;
            if c.is_airborne() {
                c.action = Action::Air;
            } else {
                c.action = Action::Stand;
                c.phase = CharacterPhase::Stand;
                c.speed_x = 0;
            }
        }
    }

    fn attack_area(c: &CharacterState, spec: &AttackSpec) -> HitArea {
        let center_y = c.y - c.height / 2;
        let (left, right) = if c.front {
            (c.x + spec.area_left, c.x + spec.area_right)
        } else {
            (c.x - spec.area_right, c.x - spec.area_left)
        };
        HitArea {
            left,
            right,
            top: center_y + spec.area_top,
            bottom: center_y + spec.area_bottom,
        }
    }

    /// Keeps the melee attack in sync with the motion and spawns projectiles
    /// on their start-up frame.
    fn update_attack(&self, c: &mut CharacterState, projectiles: &mut Vec<AttackData>) {
        if c.control {
            return;
        }
        let Some(spec) = self.motion_table(c.side).get(c.action).attack.clone() else {
            return;
        };

        let facing = if c.front { 1 } else { -1 };
        match spec.projectile_speed_x {
            Some(speed) => {
                if c.action_frame == spec.start_up {
                    projectiles.push(AttackData {
                        owner: c.side,
                        attack_type: spec.attack_type,
                        hit_damage: spec.hit_damage,
                        guard_damage: spec.guard_damage,
                        hit_add_energy: spec.hit_add_energy,
                        hit_stun: spec.hit_stun,
                        hit_area: Self::attack_area(c, &spec),
                        speed_x: speed * facing,
                        remaining_frames: spec.active,
                        active: true,
                        consumed: false,
                    });
                }
            }
            None => {
                let consumed = c.attack.map(|a| a.consumed).unwrap_or(false);
                let active = c.action_frame >= spec.start_up
                    && c.action_frame < spec.start_up + spec.active;
                let end = spec.start_up + spec.active;
                c.attack = Some(AttackData {
                    owner: c.side,
                    attack_type: spec.attack_type,
                    hit_damage: spec.hit_damage,
                    guard_damage: spec.guard_damage,
                    hit_add_energy: spec.hit_add_energy,
                    hit_stun: spec.hit_stun,
                    hit_area: Self::attack_area(c, &spec),
                    speed_x: 0,
                    remaining_frames: end.saturating_sub(c.action_frame),
                    active,
                    consumed,
                });
            }
        }
    }

    /// Applies `attack` to `defender`. Returns the energy the attacker gains.
    fn land_hit(attack: &AttackData, defender: &mut CharacterState) -> i32 {
        let guarded = attack.attack_type != 4 && defender.action.is_guard();
        if guarded {
            defender.hp = (defender.hp - attack.guard_damage).max(0);
            return 0;
        }

        defender.hp = (defender.hp - attack.hit_damage).max(0);
        defender.control = false;
        defender.attack = None;
        defender.action_frame = 0;
        defender.remaining_frames = attack.hit_stun;
        defender.action = if defender.is_airborne() {
            Action::AirRecov
        } else {
            Action::StandRecov
        };
        defender.speed_x = if attack.hit_area.left + attack.hit_area.right < 2 * defender.x {
            KNOCKBACK
        } else {
            -KNOCKBACK
        };
        attack.hit_add_energy
    }
}

impl FightModel for KinematicModel {
    fn motion_table(&self, side: PlayerSide) -> &MotionTable {
        &self.motions[side.index()]
    }

    fn step(&self, state: &mut GameState, commands: [Option<Action>; 2]) {
        let mut characters = *state.characters_mut();
        let mut projectiles = std::mem::take(state.projectiles_mut());

        for side in PlayerSide::BOTH {
            if let Some(action) = commands[side.index()] {
                self.start_action(&mut characters[side.index()], action);
            }
        }
        for c in characters.iter_mut() {
            self.integrate(c);
            self.update_attack(c, &mut projectiles);
        }

        // Melee
        for side in PlayerSide::BOTH {
            let (a, d) = (side.index(), side.opponent().index());
            let Some(mut attack) = characters[a].attack else {
                continue;
            };
            if attack.active && !attack.consumed && attack.hit_area.overlaps(&characters[d].hit_box()) {
                attack.consumed = true;
                let gain = Self::land_hit(&attack, &mut characters[d]);
                characters[a].energy = (characters[a].energy + gain).min(MAX_ENERGY);
                characters[a].attack = Some(attack);
            }
        }

        // Projectiles
        for projectile in projectiles.iter_mut() {
            projectile.hit_area.translate_x(projectile.speed_x);
            projectile.remaining_frames = projectile.remaining_frames.saturating_sub(1);
            let (a, d) = (projectile.owner.index(), projectile.owner.opponent().index());
            if !projectile.consumed && projectile.hit_area.overlaps(&characters[d].hit_box()) {
                projectile.consumed = true;
                let gain = Self::land_hit(projectile, &mut characters[d]);
                characters[a].energy = (characters[a].energy + gain).min(MAX_ENERGY);
            }
        }
        projectiles.retain(|p| {
            !p.consumed
                && p.remaining_frames > 0
                && p.hit_area.right >= 0
                && p.hit_area.left <= STAGE_WIDTH
        });

        let (p1_x, p2_x) = (characters[0].x, characters[1].x);
        if characters[0].control {
            characters[0].front = p1_x <= p2_x;
        }
        if characters[1].control {
            characters[1].front = p2_x < p1_x;
        }

        *state.characters_mut() = characters;
        *state.projectiles_mut() = projectiles;
        state.frame += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn duel(p1_x: i32, p2_x: i32) -> GameState {
        GameState::new(
            CharacterState::standing(PlayerSide::P1, p1_x),
            CharacterState::standing(PlayerSide::P2, p2_x),
        )
    }

    #[test]
    fn test_walk_moves_forward_and_returns_control() {
        let model = KinematicModel::default();
        let mut state = duel(200, 700);
        model.step(&mut state, [Some(Action::ForwardWalk), None]);

        let p1 = state.character(PlayerSide::P1);
        assert_eq!(p1.x, 205);
        assert!(p1.control);
        assert_eq!(state.frame, 1);
    }

    #[test]
    fn test_jump_then_land() {
        let model = KinematicModel::default();
        let mut state = duel(200, 700);
        model.step(&mut state, [Some(Action::Jump), None]);
        assert!(state.character(PlayerSide::P1).is_airborne());

        for _ in 0..60 {
            model.step(&mut state, [None, None]);
        }
        let p1 = state.character(PlayerSide::P1);
        assert!(!p1.is_airborne());
        assert_eq!(p1.y, GROUND_Y);
        assert!(p1.control);
    }

    #[test]
    fn test_air_action_on_ground_is_dropped() {
        let model = KinematicModel::default();
        let mut state = duel(200, 700);
        model.step(&mut state, [Some(Action::AirA), None]);
        let p1 = state.character(PlayerSide::P1);
        assert_eq!(p1.action, Action::Stand);
        assert!(p1.control);
    }

    #[test]
    fn test_melee_hit_damages_and_stuns() {
        let model = KinematicModel::default();
        let mut state = duel(300, 370);
        model.step(&mut state, [Some(Action::StandB), None]);
        for _ in 0..12 {
            model.step(&mut state, [None, None]);
        }
        let p2 = state.character(PlayerSide::P2);
        assert_eq!(p2.hp, crate::game::MAX_HP - 10);
        assert!(!p2.control || p2.action == Action::Stand);
        assert!(state.character(PlayerSide::P1).energy > 0);
    }

    #[test]
    fn test_guard_reduces_damage() {
        let model = KinematicModel::default();
        let mut state = duel(300, 370);
        model.step(&mut state, [Some(Action::StandB), None]);
        model.step(&mut state, [None, None]);
        model.step(&mut state, [None, None]);
        // Guard lasts 8 frames and has to cover the active frame 8.
        model.step(&mut state, [None, Some(Action::StandGuard)]);
        for _ in 0..10 {
            model.step(&mut state, [None, None]);
        }
        let p2 = state.character(PlayerSide::P2);
        assert_eq!(p2.hp, crate::game::MAX_HP - 2);
    }

    #[test]
    fn test_projectile_travels_and_hits() {
        let model = KinematicModel::default();
        let mut state = duel(200, 500);
        model.step(&mut state, [Some(Action::StandDDfFA), None]);
        let mut seen_projectile = false;
        for _ in 0..60 {
            model.step(&mut state, [None, None]);
            seen_projectile |= state.projectiles_by(PlayerSide::P1).count() > 0;
        }
        assert!(seen_projectile);
        assert_eq!(state.character(PlayerSide::P2).hp, crate::game::MAX_HP - 5);
        assert_eq!(state.projectiles().len(), 0);
    }
}

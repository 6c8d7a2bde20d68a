//! Static per-character motion table.
//!
//! Every action has a duration, a movement impulse and an energy delta paid or
//! gained when the action starts (`attack_start_add_energy`, negative for
//! skills that cost energy). Attacking actions carry an [`AttackSpec`].

use crate::game::action::Action;
use crate::{FightingMctsError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Attack carried by a motion. Hit area offsets are relative to the
/// attacker's center for a character facing right, in screen coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackSpec {
    /// 1 = high, 2 = middle, 3 = low, 4 = throw.
    pub attack_type: i32,
    pub hit_damage: i32,
    pub guard_damage: i32,
    /// Frame (from motion start) at which the hit area becomes active.
    pub start_up: u32,
    /// Number of active frames.
    pub active: u32,
    pub area_left: i32,
    pub area_right: i32,
    pub area_top: i32,
    pub area_bottom: i32,
    /// Energy granted to the attacker when the attack connects.
    pub hit_add_energy: i32,
    /// Frames the defender loses control after being hit.
    pub hit_stun: u32,
    /// Projectiles detach from the attacker and travel on their own.
    pub projectile_speed_x: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotionData {
    pub action: Action,
    pub frame_number: u32,
    pub speed_x: i32,
    pub speed_y: i32,
    pub attack_start_add_energy: i32,
    pub attack: Option<AttackSpec>,
}

impl MotionData {
    fn idle(action: Action, frame_number: u32) -> Self {
        MotionData {
            action,
            frame_number,
            speed_x: 0,
            speed_y: 0,
            attack_start_add_energy: 0,
            attack: None,
        }
    }

    /// Energy needed to start this motion.
    pub fn energy_cost(&self) -> i32 {
        self.attack_start_add_energy.abs()
    }
}

/// Motion data indexed by action ordinal.
#[derive(Debug, Clone)]
pub struct MotionTable {
    motions: Vec<MotionData>,
}

impl MotionTable {
    pub fn get(&self, action: Action) -> &MotionData {
        &self.motions[action.ordinal()]
    }

    pub fn energy_cost(&self, action: Action) -> i32 {
        self.get(action).energy_cost()
    }

    /// Loads a character motion table from CSV.
    ///
    /// Required columns: `motionName`, `frameNumber`, `speedX`, `speedY`,
    /// `attackStartAddEnergy`. Optional attack columns (`attackType`,
    /// `attackHitDamage`, `attackGuardDamage`, `attackStartUp`,
    /// `attackActive`, `attackHitAreaLeft/Right/Top/Bottom`,
    /// `attackHitAddEnergy`, `attackHitStun`, `projectileSpeedX`) default to 0;
    /// a row with `attackType` 0 has no attack. Every engine action must appear.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)?;
        let mut rows: HashMap<Action, MotionData> = HashMap::new();

        for record in reader.deserialize::<MotionRow>() {
            let row = record?;
            let action: Action = row
                .motion_name
                .parse()
                .map_err(FightingMctsError::Config)?;
            rows.insert(action, row.into_motion(action));
        }

        let mut motions = Vec::with_capacity(Action::COUNT);
        for &action in Action::ALL {
            let motion = rows.remove(&action).ok_or_else(|| {
                FightingMctsError::Config(format!(
                    "motion table {} is missing {}",
                    path.display(),
                    action
                ))
            })?;
            motions.push(motion);
        }

        log::debug!("Loaded motion table from {}", path.display());
        Ok(MotionTable { motions })
    }
}

impl Default for MotionTable {
    /// Built-in table for the default character.
    fn default() -> Self {
        MotionTable {
            motions: Action::ALL.iter().map(|&a| default_motion(a)).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MotionRow {
    motion_name: String,
    frame_number: u32,
    speed_x: i32,
    speed_y: i32,
    attack_start_add_energy: i32,
    #[serde(default)]
    attack_type: i32,
    #[serde(default)]
    attack_hit_damage: i32,
    #[serde(default)]
    attack_guard_damage: i32,
    #[serde(default)]
    attack_start_up: u32,
    #[serde(default)]
    attack_active: u32,
    #[serde(default)]
    attack_hit_area_left: i32,
    #[serde(default)]
    attack_hit_area_right: i32,
    #[serde(default)]
    attack_hit_area_top: i32,
    #[serde(default)]
    attack_hit_area_bottom: i32,
    #[serde(default)]
    attack_hit_add_energy: i32,
    #[serde(default)]
    attack_hit_stun: u32,
    #[serde(default)]
    projectile_speed_x: Option<i32>,
}

impl MotionRow {
    fn into_motion(self, action: Action) -> MotionData {
        let attack = (self.attack_type != 0).then(|| AttackSpec {
            attack_type: self.attack_type,
            hit_damage: self.attack_hit_damage,
            guard_damage: self.attack_guard_damage,
            start_up: self.attack_start_up,
            active: self.attack_active,
            area_left: self.attack_hit_area_left,
            area_right: self.attack_hit_area_right,
            area_top: self.attack_hit_area_top,
            area_bottom: self.attack_hit_area_bottom,
            hit_add_energy: self.attack_hit_add_energy,
            hit_stun: self.attack_hit_stun,
            projectile_speed_x: self.projectile_speed_x.filter(|&s| s != 0),
        });
        MotionData {
            action,
            frame_number: self.frame_number.max(1),
            speed_x: self.speed_x,
            speed_y: self.speed_y,
            attack_start_add_energy: self.attack_start_add_energy,
            attack,
        }
    }
}

/// Melee attack reaching `reach` pixels in front of the attacker at body height.
fn melee(attack_type: i32, damage: i32, start_up: u32, active: u32, reach: i32) -> AttackSpec {
    let (top, bottom) = match attack_type {
        1 => (-90, -30),
        3 => (0, 90),
        _ => (-60, 40),
    };
    AttackSpec {
        attack_type,
        hit_damage: damage,
        guard_damage: (damage / 5).max(1),
        start_up,
        active,
        area_left: 10,
        area_right: reach,
        area_top: top,
        area_bottom: bottom,
        hit_add_energy: 5 + damage / 2,
        hit_stun: 12 + damage as u32 / 2,
        projectile_speed_x: None,
    }
}

fn projectile(damage: i32, start_up: u32, speed: i32, height: i32) -> AttackSpec {
    AttackSpec {
        attack_type: 2,
        hit_damage: damage,
        guard_damage: (damage / 4).max(1),
        start_up,
        active: 90,
        area_left: 20,
        area_right: 60,
        area_top: -height / 2,
        area_bottom: height / 2,
        hit_add_energy: 5,
        hit_stun: 20,
        projectile_speed_x: Some(speed),
    }
}

fn default_motion(action: Action) -> MotionData {
    use Action::*;

    let base = MotionData::idle(action, 1);
    let m = |frames: u32, speed_x: i32, speed_y: i32, energy: i32, attack: Option<AttackSpec>| {
        MotionData {
            action,
            frame_number: frames,
            speed_x,
            speed_y,
            attack_start_add_energy: energy,
            attack,
        }
    };

    match action {
        Neutral | Stand | Crouch | Air => base,
        ForwardWalk => m(1, 5, 0, 0, None),
        Dash => m(15, 12, 0, 0, None),
        BackStep => m(15, -10, 0, 0, None),
        Jump => m(4, 0, -30, 0, None),
        ForJump => m(4, 6, -30, 0, None),
        BackJump => m(4, -6, -30, 0, None),
        StandGuard | CrouchGuard | AirGuard => m(8, 0, 0, 0, None),
        StandGuardRecov | CrouchGuardRecov | AirGuardRecov => m(10, 0, 0, 0, None),
        StandRecov | CrouchRecov | AirRecov => m(18, 0, 0, 0, None),
        ChangeDown => m(6, 0, 0, 0, None),
        Down => m(40, 0, 0, 0, None),
        Rise => m(20, 0, 0, 0, None),
        Landing => m(4, 0, 0, 0, None),
        ThrowA => m(30, 0, 0, -5, Some(melee(4, 10, 4, 2, 50))),
        ThrowB => m(35, 0, 0, -10, Some(melee(4, 20, 6, 2, 50))),
        ThrowHit | ThrowSuffer => m(40, 0, 0, 0, None),
        StandA => m(18, 0, 0, 0, Some(melee(1, 5, 4, 3, 80))),
        StandB => m(26, 0, 0, 0, Some(melee(2, 10, 8, 4, 100))),
        CrouchA => m(18, 0, 0, 0, Some(melee(3, 5, 4, 3, 75))),
        CrouchB => m(26, 0, 0, 0, Some(melee(3, 10, 8, 4, 110))),
        AirA => m(16, 0, 0, 0, Some(melee(2, 5, 4, 4, 70))),
        AirB => m(22, 0, 0, 0, Some(melee(2, 10, 7, 4, 90))),
        AirDA => m(18, 0, 4, 0, Some(melee(3, 5, 5, 4, 60))),
        AirDB => m(24, 0, 6, 0, Some(melee(3, 10, 7, 4, 80))),
        StandFA => m(24, 2, 0, 0, Some(melee(2, 8, 7, 3, 110))),
        StandFB => m(34, 3, 0, 0, Some(melee(2, 12, 12, 4, 130))),
        CrouchFA => m(26, 0, 0, 0, Some(melee(3, 8, 8, 3, 120))),
        CrouchFB => m(36, 0, 0, 0, Some(melee(1, 12, 14, 4, 100))),
        AirFA => m(20, 2, 0, 0, Some(melee(2, 8, 6, 4, 100))),
        AirFB => m(28, 3, 0, 0, Some(melee(2, 12, 9, 4, 110))),
        AirUA => m(20, 0, -2, 0, Some(melee(1, 8, 6, 4, 70))),
        AirUB => m(28, 0, -3, 0, Some(melee(1, 12, 9, 4, 80))),
        StandDDfFA => m(40, 0, 0, 0, Some(projectile(5, 14, 10, 40))),
        StandDDfFB => m(50, 0, 0, -30, Some(projectile(20, 18, 12, 60))),
        StandFDDfA => m(36, 4, -6, 0, Some(melee(1, 10, 8, 6, 90))),
        StandFDDfB => m(48, 6, -10, -55, Some(melee(1, 40, 10, 8, 110))),
        StandDDbBA => m(34, 8, 0, 0, Some(melee(2, 10, 10, 5, 100))),
        StandDDbBB => m(46, 10, 0, -50, Some(melee(2, 25, 14, 6, 120))),
        AirDDfFA => m(38, 0, 0, 0, Some(projectile(5, 12, 10, 40))),
        AirDDfFB => m(44, 0, 0, -50, Some(projectile(20, 16, 12, 60))),
        AirFDDfA => m(34, 4, 6, 0, Some(melee(3, 10, 8, 6, 90))),
        AirFDDfB => m(42, 6, 8, -40, Some(melee(3, 35, 10, 8, 110))),
        AirDDbBA => m(32, 6, 0, 0, Some(melee(2, 10, 8, 5, 90))),
        AirDDbBB => m(40, 8, 0, -50, Some(melee(2, 25, 10, 6, 110))),
        StandDDfFC => m(70, 0, 0, -150, Some(projectile(120, 22, 8, 200))),
    }
}

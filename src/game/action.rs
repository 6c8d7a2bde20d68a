//! Engine action identifiers.
//!
//! The ordinal of every variant is fixed: it indexes the motion table and the
//! `*_action{N}_ratio` features, so variants must never be reordered.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

macro_rules! actions {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// An action a character can be performing or be asked to perform.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Action {
            $($variant),+
        }

        impl Action {
            /// Every action in ordinal order.
            pub const ALL: &'static [Action] = &[$(Action::$variant),+];

            /// Engine name, e.g. `STAND_D_DF_FC`.
            pub fn name(self) -> &'static str {
                match self {
                    $(Action::$variant => $name),+
                }
            }
        }

        impl FromStr for Action {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Action::$variant),)+
                    other => Err(format!("unknown action: {}", other)),
                }
            }
        }
    };
}

actions! {
    Neutral => "NEUTRAL",
    Stand => "STAND",
    ForwardWalk => "FORWARD_WALK",
    Dash => "DASH",
    BackStep => "BACK_STEP",
    Crouch => "CROUCH",
    Jump => "JUMP",
    ForJump => "FOR_JUMP",
    BackJump => "BACK_JUMP",
    Air => "AIR",
    StandGuard => "STAND_GUARD",
    CrouchGuard => "CROUCH_GUARD",
    AirGuard => "AIR_GUARD",
    StandGuardRecov => "STAND_GUARD_RECOV",
    CrouchGuardRecov => "CROUCH_GUARD_RECOV",
    AirGuardRecov => "AIR_GUARD_RECOV",
    StandRecov => "STAND_RECOV",
    CrouchRecov => "CROUCH_RECOV",
    AirRecov => "AIR_RECOV",
    ChangeDown => "CHANGE_DOWN",
    Down => "DOWN",
    Rise => "RISE",
    Landing => "LANDING",
    ThrowA => "THROW_A",
    ThrowB => "THROW_B",
    ThrowHit => "THROW_HIT",
    ThrowSuffer => "THROW_SUFFER",
    StandA => "STAND_A",
    StandB => "STAND_B",
    CrouchA => "CROUCH_A",
    CrouchB => "CROUCH_B",
    AirA => "AIR_A",
    AirB => "AIR_B",
    AirDA => "AIR_DA",
    AirDB => "AIR_DB",
    StandFA => "STAND_FA",
    StandFB => "STAND_FB",
    CrouchFA => "CROUCH_FA",
    CrouchFB => "CROUCH_FB",
    AirFA => "AIR_FA",
    AirFB => "AIR_FB",
    AirUA => "AIR_UA",
    AirUB => "AIR_UB",
    StandDDfFA => "STAND_D_DF_FA",
    StandDDfFB => "STAND_D_DF_FB",
    StandFDDfA => "STAND_F_D_DFA",
    StandFDDfB => "STAND_F_D_DFB",
    StandDDbBA => "STAND_D_DB_BA",
    StandDDbBB => "STAND_D_DB_BB",
    AirDDfFA => "AIR_D_DF_FA",
    AirDDfFB => "AIR_D_DF_FB",
    AirFDDfA => "AIR_F_D_DFA",
    AirFDDfB => "AIR_F_D_DFB",
    AirDDbBA => "AIR_D_DB_BA",
    AirDDbBB => "AIR_D_DB_BB",
    StandDDfFC => "STAND_D_DF_FC",
}

impl Action {
    /// Number of engine actions.
    pub const COUNT: usize = Action::ALL.len();

    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn from_ordinal(ordinal: usize) -> Option<Action> {
        Action::ALL.get(ordinal).copied()
    }

    /// Actions only valid while airborne.
    pub fn is_air(self) -> bool {
        self.name().starts_with("AIR")
    }

    pub fn is_guard(self) -> bool {
        matches!(
            self,
            Action::StandGuard | Action::CrouchGuard | Action::AirGuard
        )
    }

    /// Ground actions that leave the floor.
    pub fn is_jump(self) -> bool {
        matches!(self, Action::Jump | Action::ForJump | Action::BackJump)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

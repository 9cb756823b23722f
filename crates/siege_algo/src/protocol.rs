//! JSON line protocol spoken by the game engine.
//!
//! The engine writes one JSON object per line on our stdin:
//!
//! 1. The game configuration, once, before anything else.
//! 2. A state frame per turn start (`turnInfo[0] == 0`). We answer with
//!    two lines: the build list, then the deploy list.
//! 3. Action frames while units move (`turnInfo[0] == 1`). These carry
//!    breach and spawn events and need no answer.
//! 4. A final frame with `turnInfo[0] == 2` when the match is over.
//!
//! # Example Session
//!
//! ```text
//! -> {"unitInformation":[{"shorthand":"FF","cost1":1.0,...},...],"resources":{...}}
//! -> {"turnInfo":[0,0,-1],"p1Stats":[30.0,40.0,5.0,0],"p1Units":[[],...],...}
//! <- [["DF",0,13],["DF",27,13]]
//! <- []
//! -> {"turnInfo":[1,0,0],"events":{"breach":[],"spawn":[[[13,0],3,"17",2]]},...}
//! -> {"turnInfo":[2,41,0],...}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use siege_core::board::{GameState, PlayerStats};
use siege_core::data::{GameConfig, ResourceRules, UnitStats, UnitTable, UpgradeStats};
use siege_core::error::{Result, SiegeError};
use siege_core::grid::Cell;
use siege_core::intents::Intent;
use siege_core::math::{fixed_from_f64, Fixed};
use siege_core::units::{Player, Unit, UnitType};

/// Shorthand the engine uses for removal requests.
pub const REMOVE_SHORTHAND: &str = "RM";
/// Shorthand the engine uses for upgrade requests.
pub const UPGRADE_SHORTHAND: &str = "UP";

/// Index of the pending-removal list in a frame's unit lists.
const REMOVAL_LIST: usize = 6;
/// Index of the upgrade list in a frame's unit lists.
const UPGRADE_LIST: usize = 7;

// ============================================================================
// Game configuration (first line)
// ============================================================================

/// Game configuration line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Per-type stats in engine index order, followed by the removal and
    /// upgrade pseudo-types.
    pub unit_information: Vec<WireUnitInfo>,
    /// Income schedule.
    #[serde(default)]
    pub resources: WireResources,
}

/// Stats for one unit type as the engine writes them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireUnitInfo {
    /// Wire shorthand.
    #[serde(default)]
    pub shorthand: Option<String>,
    /// Structure point cost.
    #[serde(default)]
    pub cost1: Option<f64>,
    /// Mobility point cost.
    #[serde(default)]
    pub cost2: Option<f64>,
    /// Starting health.
    #[serde(default)]
    pub start_health: Option<f64>,
    /// Damage per hit against mobile units.
    #[serde(default)]
    pub attack_damage_walker: Option<f64>,
    /// Damage per hit against structures.
    #[serde(default)]
    pub attack_damage_tower: Option<f64>,
    /// Attack range.
    #[serde(default)]
    pub attack_range: Option<f64>,
    /// Shield per passing unit.
    #[serde(default)]
    pub shield_per_unit: Option<f64>,
    /// Shield aura range.
    #[serde(default)]
    pub shield_range: Option<f64>,
    /// Upgraded overrides.
    #[serde(default)]
    pub upgrade: Option<Box<WireUnitInfo>>,
}

/// Income schedule as the engine writes it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireResources {
    /// Fraction of mobility lost per round.
    #[serde(default)]
    pub bit_decay_per_round: Option<f64>,
    /// Base mobility income.
    #[serde(default)]
    pub bits_per_round: Option<f64>,
    /// Mobility income increase per interval.
    #[serde(default)]
    pub bit_growth_rate: Option<f64>,
    /// Turns between income increases.
    #[serde(default)]
    pub turn_interval_for_bit_schedule: Option<u32>,
    /// Structure point income.
    #[serde(default)]
    pub cores_per_round: Option<f64>,
}

fn decimal(field: &str, value: Option<f64>, fallback: Fixed) -> Result<Fixed> {
    match value {
        None => Ok(fallback),
        Some(raw) => fixed_from_f64(raw)
            .ok_or_else(|| SiegeError::SnapshotParse(format!("{field} = {raw} is not representable"))),
    }
}

impl WireUnitInfo {
    fn to_stats(&self, unit_type: UnitType) -> Result<UnitStats> {
        let stock = UnitStats::standard(unit_type);
        let upgrade = match &self.upgrade {
            Some(raw) => Some(raw.to_upgrade(stock.upgrade.clone().unwrap_or_default())?),
            None => stock.upgrade.clone(),
        };
        Ok(UnitStats {
            shorthand: self.shorthand.clone().unwrap_or(stock.shorthand),
            structure_cost: decimal("cost1", self.cost1, stock.structure_cost)?,
            mobility_cost: decimal("cost2", self.cost2, stock.mobility_cost)?,
            health: decimal("startHealth", self.start_health, stock.health)?,
            damage_to_mobile: decimal(
                "attackDamageWalker",
                self.attack_damage_walker,
                stock.damage_to_mobile,
            )?,
            damage_to_structure: decimal(
                "attackDamageTower",
                self.attack_damage_tower,
                stock.damage_to_structure,
            )?,
            attack_range: decimal("attackRange", self.attack_range, stock.attack_range)?,
            shield_per_unit: decimal("shieldPerUnit", self.shield_per_unit, stock.shield_per_unit)?,
            shield_range: decimal("shieldRange", self.shield_range, stock.shield_range)?,
            upgrade,
        })
    }

    fn to_upgrade(&self, stock: UpgradeStats) -> Result<UpgradeStats> {
        let optional = |field: &str, value: Option<f64>, fallback: Option<Fixed>| {
            value
                .map(|raw| decimal(field, Some(raw), Fixed::ZERO))
                .transpose()
                .map(|parsed| parsed.or(fallback))
        };
        Ok(UpgradeStats {
            structure_cost: decimal("upgrade.cost1", self.cost1, stock.structure_cost)?,
            mobility_cost: decimal("upgrade.cost2", self.cost2, stock.mobility_cost)?,
            damage_to_mobile: optional(
                "upgrade.attackDamageWalker",
                self.attack_damage_walker,
                stock.damage_to_mobile,
            )?,
            attack_range: optional("upgrade.attackRange", self.attack_range, stock.attack_range)?,
            health: optional("upgrade.startHealth", self.start_health, stock.health)?,
        })
    }
}

impl EngineConfig {
    /// Parse the configuration line.
    ///
    /// # Errors
    ///
    /// Returns `SiegeError::SnapshotParse` if the line is not valid JSON.
    pub fn from_json(line: &str) -> Result<Self> {
        serde_json::from_str(line).map_err(|e| SiegeError::SnapshotParse(format!("config: {e}")))
    }

    /// Build the rule set, falling back to stock values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns `SiegeError::SnapshotParse` if fewer than six unit types are
    /// described or a number cannot be represented.
    pub fn to_game_config(&self) -> Result<GameConfig> {
        if self.unit_information.len() < UnitType::ALL.len() {
            return Err(SiegeError::SnapshotParse(format!(
                "config describes {} unit types, expected at least {}",
                self.unit_information.len(),
                UnitType::ALL.len()
            )));
        }

        let entries = UnitType::ALL
            .into_iter()
            .map(|unit_type| self.unit_information[unit_type.index()].to_stats(unit_type))
            .collect::<Result<Vec<_>>>()?;
        let units = UnitTable::from_entries(entries)
            .ok_or_else(|| SiegeError::SnapshotParse("incomplete unit table".to_string()))?;

        let stock = ResourceRules::default();
        let raw = &self.resources;
        let resources = ResourceRules {
            mobility_decay_per_round: decimal(
                "bitDecayPerRound",
                raw.bit_decay_per_round,
                stock.mobility_decay_per_round,
            )?,
            mobility_per_round: decimal("bitsPerRound", raw.bits_per_round, stock.mobility_per_round)?,
            mobility_growth_rate: decimal(
                "bitGrowthRate",
                raw.bit_growth_rate,
                stock.mobility_growth_rate,
            )?,
            growth_interval: raw
                .turn_interval_for_bit_schedule
                .unwrap_or(stock.growth_interval)
                .max(1),
            structure_per_round: decimal(
                "coresPerRound",
                raw.cores_per_round,
                stock.structure_per_round,
            )?,
        };

        Ok(GameConfig {
            units,
            resources,
            ..GameConfig::default()
        })
    }
}

// ============================================================================
// State and action frames
// ============================================================================

/// Kind of frame, from `turnInfo[0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    /// Start of a turn; we must answer.
    Turn,
    /// Units are moving; events only.
    Action,
    /// The match is over.
    End,
}

/// A unit entry: `[x, y, health, id]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireUnit(pub i32, pub i32, pub f64, pub Value);

/// A breach event: `[[x, y], damage, unit_type, id, owner]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreachEvent(pub [i32; 2], pub f64, pub i64, pub Value, pub u8);

/// A spawn event: `[[x, y], unit_type, id, owner]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnEvent(pub [i32; 2], pub i64, pub Value, pub u8);

/// Events carried by action frames.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameEvents {
    /// Mobile units that reached an edge.
    #[serde(default)]
    pub breach: Vec<BreachEvent>,
    /// Units placed this turn.
    #[serde(default)]
    pub spawn: Vec<SpawnEvent>,
}

/// One state or action frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateFrame {
    /// `[phase, turn, action_frame]`.
    pub turn_info: Vec<i64>,
    /// Our `[health, structure, mobility, time]`.
    #[serde(default)]
    pub p1_stats: Vec<f64>,
    /// Opponent `[health, structure, mobility, time]`.
    #[serde(default)]
    pub p2_stats: Vec<f64>,
    /// Our units, one list per unit type index.
    #[serde(default)]
    pub p1_units: Vec<Vec<WireUnit>>,
    /// Opponent units, one list per unit type index.
    #[serde(default)]
    pub p2_units: Vec<Vec<WireUnit>>,
    /// Action frame events.
    #[serde(default)]
    pub events: FrameEvents,
}

impl StateFrame {
    /// Parse a frame line.
    ///
    /// # Errors
    ///
    /// Returns `SiegeError::SnapshotParse` if the line is not a frame.
    pub fn from_json(line: &str) -> Result<Self> {
        serde_json::from_str(line).map_err(|e| SiegeError::SnapshotParse(format!("frame: {e}")))
    }

    /// Frame kind; `None` for an unknown phase code.
    #[must_use]
    pub fn phase(&self) -> Option<FramePhase> {
        match self.turn_info.first() {
            Some(0) => Some(FramePhase::Turn),
            Some(1) => Some(FramePhase::Action),
            Some(2) => Some(FramePhase::End),
            _ => None,
        }
    }

    /// Turn number the frame belongs to.
    #[must_use]
    pub fn turn(&self) -> u32 {
        self.turn_info
            .get(1)
            .and_then(|&turn| u32::try_from(turn).ok())
            .unwrap_or(0)
    }

    /// Build the board snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SiegeError::SnapshotParse` for missing player stats or a
    /// unit the board rejects.
    pub fn to_game_state(&self, config: &GameConfig) -> Result<GameState> {
        let mut state = GameState::new(config.clone(), self.turn());
        state.set_player_stats(Player::Friendly, player_stats("p1Stats", &self.p1_stats)?);
        state.set_player_stats(Player::Enemy, player_stats("p2Stats", &self.p2_stats)?);

        for (owner, lists) in [(Player::Friendly, &self.p1_units), (Player::Enemy, &self.p2_units)] {
            for unit_type in UnitType::ALL {
                for raw in lists.get(unit_type.index()).into_iter().flatten() {
                    let health = decimal("unit health", Some(raw.2), Fixed::ZERO)?;
                    state.add_unit(Cell::new(raw.0, raw.1), Unit::new(unit_type, owner, health))?;
                }
            }
        }

        for (owner, lists) in [(Player::Friendly, &self.p1_units), (Player::Enemy, &self.p2_units)] {
            for raw in lists.get(REMOVAL_LIST).into_iter().flatten() {
                mark(&mut state, Cell::new(raw.0, raw.1), owner, |unit| unit.pending_removal = true);
            }
            for raw in lists.get(UPGRADE_LIST).into_iter().flatten() {
                mark(&mut state, Cell::new(raw.0, raw.1), owner, |unit| unit.upgraded = true);
            }
        }

        Ok(state)
    }
}

fn player_stats(field: &str, raw: &[f64]) -> Result<PlayerStats> {
    let [health, structure, mobility, ..] = raw else {
        return Err(SiegeError::SnapshotParse(format!(
            "{field} has {} entries, expected at least 3",
            raw.len()
        )));
    };
    Ok(PlayerStats {
        health: decimal(field, Some(*health), Fixed::ZERO)?,
        structure_points: decimal(field, Some(*structure), Fixed::ZERO)?,
        mobility_points: decimal(field, Some(*mobility), Fixed::ZERO)?,
    })
}

fn mark(state: &mut GameState, cell: Cell, owner: Player, apply: impl FnOnce(&mut Unit)) {
    match state.stationary_unit_mut(cell) {
        Some(unit) if unit.owner == owner => apply(unit),
        _ => debug!(%cell, "Marker without a matching structure"),
    }
}

/// Game event decoded from an action frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEvent {
    /// A mobile unit reached an edge, scored by `scorer`.
    Breach {
        /// Cell the unit left from.
        cell: Cell,
        /// Player who scored.
        scorer: Player,
    },
    /// A unit was placed.
    Spawn {
        /// Unit kind.
        unit_type: UnitType,
        /// Placing player.
        owner: Player,
    },
}

impl StateFrame {
    /// Decode breach and spawn events, skipping malformed entries.
    #[must_use]
    pub fn decode_events(&self) -> Vec<FrameEvent> {
        let breaches = self.events.breach.iter().filter_map(|raw| {
            let scorer = Player::from_frame_owner(raw.4)?;
            Some(FrameEvent::Breach {
                cell: Cell::new(raw.0[0], raw.0[1]),
                scorer,
            })
        });
        let spawns = self.events.spawn.iter().filter_map(|raw| {
            let unit_type = usize::try_from(raw.1).ok().and_then(UnitType::from_index)?;
            let owner = Player::from_frame_owner(raw.3)?;
            Some(FrameEvent::Spawn { unit_type, owner })
        });
        breaches.chain(spawns).collect()
    }
}

// ============================================================================
// Turn answer (two lines)
// ============================================================================

/// One `[shorthand, x, y]` entry.
pub type WireAction = (String, i32, i32);

/// Build and deploy lists for one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnAnswer {
    /// Structures, removals and upgrades.
    pub build: Vec<WireAction>,
    /// Mobile units, one entry per unit.
    pub deploy: Vec<WireAction>,
}

impl TurnAnswer {
    /// Translate intents into wire actions, keeping their order.
    #[must_use]
    pub fn from_intents(intents: &[Intent], config: &GameConfig) -> Self {
        let mut answer = Self::default();
        for intent in intents {
            match *intent {
                Intent::Remove(cell) => answer.build.push((REMOVE_SHORTHAND.to_string(), cell.x, cell.y)),
                Intent::Upgrade(cell) => answer.build.push((UPGRADE_SHORTHAND.to_string(), cell.x, cell.y)),
                Intent::Spawn {
                    unit_type,
                    cell,
                    count,
                } => {
                    let entry = (config.shorthand(unit_type).to_string(), cell.x, cell.y);
                    if unit_type.is_stationary() {
                        answer.build.push(entry);
                    } else {
                        for _ in 0..count {
                            answer.deploy.push(entry.clone());
                        }
                    }
                }
            }
        }
        answer
    }

    /// Serialize as the two protocol lines, newline-terminated.
    #[must_use]
    pub fn to_lines(&self) -> String {
        let encode = |actions: &[WireAction]| {
            serde_json::to_string(actions).unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to encode turn answer");
                "[]".to_string()
            })
        };
        format!("{}\n{}\n", encode(&self.build), encode(&self.deploy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siege_core::board::BoardQuery;
    use siege_core::units::ResourcePool;

    const CONFIG: &str = r#"{
        "unitInformation": [
            {"shorthand": "FF", "cost1": 1.0, "startHealth": 60.0,
             "upgrade": {"cost1": 1.0, "startHealth": 120.0}},
            {"shorthand": "EF", "cost1": 4.0, "startHealth": 30.0, "shieldRange": 3.5},
            {"shorthand": "DF", "cost1": 2.0, "startHealth": 75.0, "attackDamageWalker": 6.0,
             "attackRange": 2.5, "upgrade": {"cost1": 4.0, "attackDamageWalker": 14.0}},
            {"shorthand": "PI", "cost2": 1.0, "startHealth": 15.0},
            {"shorthand": "EI", "cost2": 3.0, "startHealth": 5.0},
            {"shorthand": "SI", "cost2": 1.0, "startHealth": 40.0},
            {"shorthand": "RM"},
            {"shorthand": "UP"}
        ],
        "resources": {"bitDecayPerRound": 0.25, "bitsPerRound": 5.0, "bitGrowthRate": 1.0,
                      "turnIntervalForBitSchedule": 10, "coresPerRound": 5.0}
    }"#;

    fn config() -> GameConfig {
        EngineConfig::from_json(CONFIG).unwrap().to_game_config().unwrap()
    }

    #[test]
    fn test_parse_config() {
        let config = config();
        assert_eq!(config.shorthand(UnitType::Turret), "DF");
        let turret = config.stats(UnitType::Turret);
        assert_eq!(turret.damage_to_mobile(false), Fixed::from_num(6));
        assert_eq!(turret.damage_to_mobile(true), Fixed::from_num(14));
        assert_eq!(config.resources.growth_interval, 10);
    }

    #[test]
    fn test_config_needs_six_types() {
        let short = r#"{"unitInformation": [{"shorthand": "FF"}]}"#;
        assert!(EngineConfig::from_json(short).unwrap().to_game_config().is_err());
    }

    #[test]
    fn test_frame_to_state() {
        let line = r#"{
            "turnInfo": [0, 3, -1],
            "p1Stats": [28.0, 12.0, 7.5, 0],
            "p2Stats": [30.0, 4.0, 9.0, 0],
            "p1Units": [[[5, 11, 60.0, "1"]], [], [[0, 13, 75.0, "2"]], [], [], [], [], [[0, 13, 75.0, "2"]]],
            "p2Units": [[], [], [[13, 16, 75.0, "9"]], [], [], [], [[13, 16, 75.0, "9"]], []]
        }"#;
        let frame = StateFrame::from_json(line).unwrap();
        assert_eq!(frame.phase(), Some(FramePhase::Turn));
        assert_eq!(frame.turn(), 3);

        let state = frame.to_game_state(&config()).unwrap();
        assert_eq!(state.turn_number(), 3);
        assert_eq!(
            state.resource(ResourcePool::Mobility, Player::Friendly),
            Fixed::from_num(7.5)
        );
        assert!(state.stationary_unit_at(Cell::new(0, 13)).unwrap().upgraded);
        assert!(state.stationary_unit_at(Cell::new(13, 16)).unwrap().pending_removal);
        assert_eq!(state.stationary_unit_at(Cell::new(5, 11)).unwrap().unit_type, UnitType::Wall);
    }

    #[test]
    fn test_frame_missing_stats() {
        let frame = StateFrame::from_json(r#"{"turnInfo": [0, 1, -1]}"#).unwrap();
        assert!(frame.to_game_state(&config()).is_err());
    }

    #[test]
    fn test_decode_events() {
        let line = r#"{
            "turnInfo": [1, 4, 12],
            "events": {
                "breach": [[[3, 10], 1.0, 3, "40", 2], [[20, 16], 1.0, 3, "41", 9]],
                "spawn": [[[13, 27], 4, "42", 2], [[1, 1], 17, "43", 1]]
            }
        }"#;
        let frame = StateFrame::from_json(line).unwrap();
        assert_eq!(frame.phase(), Some(FramePhase::Action));
        assert_eq!(
            frame.decode_events(),
            vec![
                FrameEvent::Breach {
                    cell: Cell::new(3, 10),
                    scorer: Player::Enemy,
                },
                FrameEvent::Spawn {
                    unit_type: UnitType::Demolisher,
                    owner: Player::Enemy,
                },
            ]
        );
    }

    #[test]
    fn test_answer_lines() {
        let intents = vec![
            Intent::Remove(Cell::new(1, 13)),
            Intent::Spawn {
                unit_type: UnitType::Turret,
                cell: Cell::new(0, 13),
                count: 1,
            },
            Intent::Spawn {
                unit_type: UnitType::Scout,
                cell: Cell::new(13, 0),
                count: 2,
            },
            Intent::Upgrade(Cell::new(0, 13)),
        ];
        let answer = TurnAnswer::from_intents(&intents, &config());
        assert_eq!(
            answer.to_lines(),
            "[[\"RM\",1,13],[\"DF\",0,13],[\"UP\",0,13]]\n[[\"PI\",13,0],[\"PI\",13,0]]\n"
        );
    }
}

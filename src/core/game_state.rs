use crate::character::cultivation::CultivationFlow;
use crate::character::derived_stats::max_hp;
use crate::combat::types::{CombatTimers, Enemy};
use crate::core::config::GameConfig;
use crate::world::hex::Hex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The five leveled stats. Strength and endurance grow from combat;
/// body, mind and spirit grow from cultivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stat {
    Strength,
    Endurance,
    Body,
    Mind,
    Spirit,
}

impl Stat {
    pub const ALL: [Stat; 5] = [
        Stat::Strength,
        Stat::Endurance,
        Stat::Body,
        Stat::Mind,
        Stat::Spirit,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stat::Strength => "strength",
            Stat::Endurance => "endurance",
            Stat::Body => "body",
            Stat::Mind => "mind",
            Stat::Spirit => "spirit",
        }
    }
}

/// A level plus the XP accumulated toward the next one.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub level: u32,
    pub xp: f64,
}

impl Track {
    pub const fn at_level(level: u32) -> Self {
        Self { level, xp: 0.0 }
    }
}

/// A cultivation stat: a run-scoped track and a prestige track that
/// survives defeat.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CultivationStat {
    pub progress: Track,
    pub prestige: Track,
}

impl CultivationStat {
    /// Fresh run progress, same prestige.
    pub fn carry_prestige(&self) -> Self {
        Self {
            progress: Track::default(),
            prestige: self.prestige,
        }
    }
}

/// Per-life progress, replaced on defeat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    pub strength: Track,
    pub endurance: Track,
    pub hp: f64,
    pub body: CultivationStat,
    pub mind: CultivationStat,
    pub spirit: CultivationStat,
    pub ki: f64,
}

impl RunState {
    /// Baseline run with `hp` left at 0; callers fill it from max HP.
    pub fn baseline() -> Self {
        Self {
            strength: Track::at_level(1),
            endurance: Track::at_level(1),
            hp: 0.0,
            body: CultivationStat::default(),
            mind: CultivationStat::default(),
            spirit: CultivationStat::default(),
            ki: 0.0,
        }
    }

    /// Baseline run that keeps this run's cultivation prestige tracks.
    pub fn next_life(&self) -> Self {
        Self {
            body: self.body.carry_prestige(),
            mind: self.mind.carry_prestige(),
            spirit: self.spirit.carry_prestige(),
            ..Self::baseline()
        }
    }

    pub fn cultivation(&self, stat: Stat) -> Option<&CultivationStat> {
        match stat {
            Stat::Body => Some(&self.body),
            Stat::Mind => Some(&self.mind),
            Stat::Spirit => Some(&self.spirit),
            Stat::Strength | Stat::Endurance => None,
        }
    }
}

/// Combat prestige; never reset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentState {
    pub strength_prestige: Track,
    pub endurance_prestige: Track,
}

impl PersistentState {
    pub fn total_prestige_levels(&self) -> u32 {
        self.strength_prestige.level + self.endurance_prestige.level
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldState {
    pub travel_depth: u32,
    pub best_depth: u32,
    pub revealed_hexes: u64,
    pub pending_encounters: u32,
    pub move_direction_index: usize,
    pub spawn_miss_streak: u32,
}

impl WorldState {
    /// Fresh exploration that remembers the best depth ever reached.
    pub fn after_defeat(&self) -> Self {
        Self {
            best_depth: self.best_depth,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattlePositions {
    pub player_hex: Hex,
    pub enemy_hex: Option<Hex>,
    pub movement_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resources {
    pub essence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unlocks {
    pub cultivation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityMode {
    #[default]
    Battle,
    Cultivation,
}

/// One counter per leveled track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelCounters {
    pub strength: u32,
    pub endurance: u32,
    pub body: u32,
    pub mind: u32,
    pub spirit: u32,
    pub strength_prestige: u32,
    pub endurance_prestige: u32,
    pub body_prestige: u32,
    pub mind_prestige: u32,
    pub spirit_prestige: u32,
}

impl LevelCounters {
    pub fn get(&self, stat: Stat, prestige: bool) -> u32 {
        let mut copy = *self;
        *copy.get_mut(stat, prestige)
    }

    pub fn get_mut(&mut self, stat: Stat, prestige: bool) -> &mut u32 {
        match (stat, prestige) {
            (Stat::Strength, false) => &mut self.strength,
            (Stat::Endurance, false) => &mut self.endurance,
            (Stat::Body, false) => &mut self.body,
            (Stat::Mind, false) => &mut self.mind,
            (Stat::Spirit, false) => &mut self.spirit,
            (Stat::Strength, true) => &mut self.strength_prestige,
            (Stat::Endurance, true) => &mut self.endurance_prestige,
            (Stat::Body, true) => &mut self.body_prestige,
            (Stat::Mind, true) => &mut self.mind_prestige,
            (Stat::Spirit, true) => &mut self.spirit_prestige,
        }
    }

    /// Raises a counter to `value` if it is higher.
    pub fn raise(&mut self, stat: Stat, prestige: bool, value: u32) {
        let slot = self.get_mut(stat, prestige);
        *slot = (*slot).max(value);
    }
}

/// Monotonic lifetime counters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_deaths: u64,
    pub total_enemies_defeated: u64,
    pub enemies_defeated_by_rarity: BTreeMap<String, u64>,
    pub total_levels_gained: LevelCounters,
    pub highest_levels: LevelCounters,
}

impl Statistics {
    pub fn new(config: &GameConfig) -> Self {
        let enemies_defeated_by_rarity = config
            .combat
            .rarity_tiers
            .iter()
            .map(|tier| (tier.key.clone(), 0))
            .collect();

        Self {
            enemies_defeated_by_rarity,
            highest_levels: LevelCounters {
                strength: 1,
                endurance: 1,
                ..LevelCounters::default()
            },
            ..Self::default()
        }
    }

    pub fn record_enemy_defeated(&mut self, rarity_key: &str) {
        self.total_enemies_defeated += 1;
        *self
            .enemies_defeated_by_rarity
            .entry(rarity_key.to_string())
            .or_insert(0) += 1;
    }
}

/// The whole simulation. `tick` consumes a reference and returns a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationState {
    pub elapsed_ms: f64,
    pub resources: Resources,
    pub unlocks: Unlocks,
    pub activity_mode: ActivityMode,
    pub run: RunState,
    pub persistent: PersistentState,
    pub cultivation: CultivationFlow,
    pub world: WorldState,
    pub statistics: Statistics,
    pub combat_timers: CombatTimers,
    pub battle_positions: BattlePositions,
    pub enemy: Option<Enemy>,
}

impl SimulationState {
    /// Fresh state: level-1 run at full HP, standing on the origin.
    pub fn new(config: &GameConfig) -> Self {
        let mut run = RunState::baseline();
        run.hp = max_hp(&run, config);

        Self {
            elapsed_ms: 0.0,
            resources: Resources::default(),
            unlocks: Unlocks::default(),
            activity_mode: ActivityMode::Battle,
            run,
            persistent: PersistentState::default(),
            cultivation: CultivationFlow::default(),
            world: WorldState::default(),
            statistics: Statistics::new(config),
            combat_timers: CombatTimers::default(),
            battle_positions: BattlePositions::default(),
            enemy: None,
        }
    }

    pub fn has_enemy(&self) -> bool {
        self.enemy.is_some()
    }

    /// Switches activity. Cultivation is refused until it has been unlocked.
    /// Picking it mid-encounter is allowed; flow only runs once the enemy
    /// is gone.
    pub fn set_activity_mode(&mut self, mode: ActivityMode) -> bool {
        if mode == ActivityMode::Cultivation && !self.unlocks.cultivation {
            return false;
        }
        self.activity_mode = mode;
        true
    }

    /// Stores raw flow rates; they are normalized whenever they are read.
    pub fn set_flow_rates(&mut self, body: f64, mind: f64, spirit: f64) {
        self.cultivation = CultivationFlow { body, mind, spirit };
    }

    /// Drops the current enemy and everything tied to it.
    pub fn clear_combat(&mut self) {
        self.enemy = None;
        self.battle_positions.enemy_hex = None;
        self.combat_timers.reset();
    }
}

/// Engine entry point for a brand new game.
pub fn create_initial_state(config: &GameConfig) -> SimulationState {
    SimulationState::new(config)
}

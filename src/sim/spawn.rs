//! Enemy waves, item spawning and drop tables

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::{EnemyKind, ItemKind, PowerType};
use crate::consts::*;
use crate::{Rect, random_point_in_rect};

/// Cumulative-weight random table
#[derive(Debug, Clone, Copy)]
pub struct WeightedTable<T: 'static> {
    entries: &'static [(T, u32)],
}

impl<T: Copy> WeightedTable<T> {
    pub const fn new(entries: &'static [(T, u32)]) -> Self {
        Self { entries }
    }

    pub fn total_weight(&self) -> u32 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    /// First bucket whose cumulative weight exceeds `roll`
    pub fn select(&self, roll: u32) -> Option<T> {
        let mut cumulative = 0;
        for &(value, weight) in self.entries {
            cumulative += weight;
            if roll < cumulative {
                return Some(value);
            }
        }
        None
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<T> {
        let total = self.total_weight();
        if total == 0 {
            return None;
        }
        self.select(rng.random_range(0..total))
    }
}

pub const ENEMY_TABLE: WeightedTable<EnemyKind> = WeightedTable::new(&[
    (EnemyKind::Hitodama, 40),
    (EnemyKind::BakeChouchin, 30),
    (EnemyKind::Rokurokubi, 20),
    (EnemyKind::Rumuru, 10),
]);

pub const ITEM_TABLE: WeightedTable<ItemKind> = WeightedTable::new(&[
    (ItemKind::Coin, 50),
    (ItemKind::Health, 15),
    (ItemKind::CrystalBall, 10),
    (ItemKind::PowerUp(PowerType::Damage), 8),
    (ItemKind::PowerUp(PowerType::Speed), 8),
    (ItemKind::PowerUp(PowerType::Pierce), 9),
]);

/// Equal-odds drops from killed enemies
pub const DROP_KINDS: [ItemKind; 6] = [
    ItemKind::Coin,
    ItemKind::Health,
    ItemKind::CrystalBall,
    ItemKind::PowerUp(PowerType::Damage),
    ItemKind::PowerUp(PowerType::Speed),
    ItemKind::PowerUp(PowerType::Pierce),
];

/// Entry points just outside the top and side edges
pub const SPAWN_POINTS: [Vec2; 9] = [
    Vec2::new(SCREEN_WIDTH * 0.25, SCREEN_HEIGHT + 50.0),
    Vec2::new(SCREEN_WIDTH * 0.5, SCREEN_HEIGHT + 50.0),
    Vec2::new(SCREEN_WIDTH * 0.75, SCREEN_HEIGHT + 50.0),
    Vec2::new(-50.0, SCREEN_HEIGHT * 0.7),
    Vec2::new(SCREEN_WIDTH + 50.0, SCREEN_HEIGHT * 0.7),
    Vec2::new(-50.0, SCREEN_HEIGHT * 0.5),
    Vec2::new(SCREEN_WIDTH + 50.0, SCREEN_HEIGHT * 0.5),
    Vec2::new(-30.0, SCREEN_HEIGHT + 30.0),
    Vec2::new(SCREEN_WIDTH + 30.0, SCREEN_HEIGHT + 30.0),
];

/// Enemies in a wave
pub fn enemies_in_wave(wave: u32) -> u32 {
    (10 + wave * 2).min(25)
}

/// Roll for an item drop on a kill
pub fn roll_drop<R: Rng + ?Sized>(rng: &mut R, drop_rate: f32) -> Option<ItemKind> {
    if rng.random::<f32>() >= drop_rate {
        return None;
    }
    Some(DROP_KINDS[rng.random_range(0..DROP_KINDS.len())])
}

/// What the director wants spawned or announced
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SpawnEvent {
    Enemy { kind: EnemyKind, pos: Vec2 },
    Item { kind: ItemKind, pos: Vec2 },
    WaveCleared { wave: u32 },
    WaveStarted { wave: u32, enemies: u32 },
}

/// Timed enemy and item spawning with wave progression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnDirector {
    /// Seconds of play since the game started
    pub game_time: f32,
    spawn_timer: f32,
    item_timer: f32,
    base_interval: f32,
    wave: u32,
    remaining_in_wave: u32,
}

impl Default for SpawnDirector {
    fn default() -> Self {
        Self {
            game_time: 0.0,
            spawn_timer: 0.0,
            item_timer: 0.0,
            base_interval: ENEMY_SPAWN_INTERVAL,
            wave: 0,
            remaining_in_wave: 0,
        }
    }
}

impl SpawnDirector {
    /// Reset and open the first wave
    pub fn start(&mut self) -> SpawnEvent {
        *self = Self::default();
        self.start_next_wave()
    }

    fn start_next_wave(&mut self) -> SpawnEvent {
        self.wave += 1;
        self.remaining_in_wave = enemies_in_wave(self.wave);
        log::info!(
            "Wave {} starting ({} enemies)",
            self.wave,
            self.remaining_in_wave
        );
        SpawnEvent::WaveStarted {
            wave: self.wave,
            enemies: self.remaining_in_wave,
        }
    }

    pub fn wave(&self) -> u32 {
        self.wave
    }

    pub fn remaining_in_wave(&self) -> u32 {
        self.remaining_in_wave
    }

    /// Current seconds between enemy spawns
    pub fn spawn_interval(&self) -> f32 {
        (self.base_interval - self.game_time / 60.0).max(MIN_SPAWN_INTERVAL)
    }

    /// Advance timers; `live_enemies` is the count still on the field
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        live_enemies: usize,
        rng: &mut R,
    ) -> Vec<SpawnEvent> {
        let mut events = Vec::new();
        self.game_time += dt;
        self.spawn_timer += dt;
        self.item_timer += dt;

        if self.remaining_in_wave > 0
            && self.spawn_timer >= self.spawn_interval()
            && live_enemies < MAX_ENEMIES_ON_SCREEN
        {
            if let Some(kind) = ENEMY_TABLE.draw(rng) {
                let pos = SPAWN_POINTS[rng.random_range(0..SPAWN_POINTS.len())];
                events.push(SpawnEvent::Enemy { kind, pos });
                self.remaining_in_wave -= 1;
                self.spawn_timer = 0.0;
            }
        } else if self.remaining_in_wave == 0 && live_enemies == 0 && self.wave > 0 {
            events.push(SpawnEvent::WaveCleared { wave: self.wave });
            events.push(self.start_next_wave());
            self.spawn_timer = 0.0;
        }

        if self.item_timer >= ITEM_SPAWN_INTERVAL {
            self.item_timer -= ITEM_SPAWN_INTERVAL;
            if let Some(kind) = ITEM_TABLE.draw(rng) {
                let area = Rect::screen().inset(ITEM_SPAWN_MARGIN);
                let pos = random_point_in_rect(rng, &area);
                events.push(SpawnEvent::Item { kind, pos });
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn enemy_spawns(events: &[SpawnEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, SpawnEvent::Enemy { .. }))
            .count()
    }

    #[test]
    fn test_tables_sum_to_100() {
        assert_eq!(ENEMY_TABLE.total_weight(), 100);
        assert_eq!(ITEM_TABLE.total_weight(), 100);
    }

    #[test]
    fn test_select_walks_cumulative_weights() {
        assert_eq!(ENEMY_TABLE.select(0), Some(EnemyKind::Hitodama));
        assert_eq!(ENEMY_TABLE.select(39), Some(EnemyKind::Hitodama));
        assert_eq!(ENEMY_TABLE.select(40), Some(EnemyKind::BakeChouchin));
        assert_eq!(ENEMY_TABLE.select(89), Some(EnemyKind::Rokurokubi));
        assert_eq!(ENEMY_TABLE.select(99), Some(EnemyKind::Rumuru));
        assert_eq!(ENEMY_TABLE.select(100), None);
    }

    #[test]
    fn test_enemy_distribution() {
        let mut rng = Pcg32::seed_from_u64(2024);
        let draws = 100_000;
        let mut counts = [0u32; 4];
        for _ in 0..draws {
            let index = match ENEMY_TABLE.draw(&mut rng) {
                Some(EnemyKind::Hitodama) => 0,
                Some(EnemyKind::BakeChouchin) => 1,
                Some(EnemyKind::Rokurokubi) => 2,
                Some(EnemyKind::Rumuru) => 3,
                None => panic!("empty draw"),
            };
            counts[index] += 1;
        }
        for (count, expected) in counts.iter().zip([0.4, 0.3, 0.2, 0.1]) {
            let observed = *count as f64 / draws as f64;
            assert!((observed - expected).abs() < 0.02, "{observed}");
        }
    }

    #[test]
    fn test_wave_sizes() {
        assert_eq!(enemies_in_wave(1), 12);
        assert_eq!(enemies_in_wave(7), 24);
        assert_eq!(enemies_in_wave(20), 25);
    }

    #[test]
    fn test_spawn_interval_shrinks() {
        let mut director = SpawnDirector::default();
        assert_eq!(director.spawn_interval(), 2.0);
        director.game_time = 60.0;
        assert_eq!(director.spawn_interval(), 1.0);
        director.game_time = 600.0;
        assert_eq!(director.spawn_interval(), MIN_SPAWN_INTERVAL);
    }

    #[test]
    fn test_spawns_respect_cap_and_wave_quota() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut director = SpawnDirector::default();
        assert_eq!(
            director.start(),
            SpawnEvent::WaveStarted {
                wave: 1,
                enemies: 12
            }
        );

        // Live cap blocks spawning
        let events = director.tick(2.5, MAX_ENEMIES_ON_SCREEN, &mut rng);
        assert_eq!(enemy_spawns(&events), 0);

        let mut spawned = 0;
        for _ in 0..100 {
            for event in director.tick(2.5, 0, &mut rng) {
                if let SpawnEvent::Enemy { pos, .. } = event {
                    assert!(SPAWN_POINTS.contains(&pos));
                    spawned += 1;
                }
            }
            if director.remaining_in_wave() == 0 {
                break;
            }
        }
        assert_eq!(spawned, 12);

        // Field still occupied: wave holds
        let events = director.tick(0.1, 3, &mut rng);
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, SpawnEvent::WaveStarted { .. }))
        );

        let events = director.tick(0.1, 0, &mut rng);
        assert_eq!(events[0], SpawnEvent::WaveCleared { wave: 1 });
        assert_eq!(
            events[1],
            SpawnEvent::WaveStarted {
                wave: 2,
                enemies: 14
            }
        );
    }

    #[test]
    fn test_item_timer() {
        let mut rng = Pcg32::seed_from_u64(11);
        let mut director = SpawnDirector::default();
        director.start();
        let area = Rect::screen().inset(ITEM_SPAWN_MARGIN);
        let mut items = 0;
        for _ in 0..(60 * 11) {
            for event in director.tick(SIM_DT, MAX_ENEMIES_ON_SCREEN, &mut rng) {
                if let SpawnEvent::Item { pos, .. } = event {
                    assert!(area.contains(pos));
                    items += 1;
                }
            }
        }
        assert_eq!(items, 2);
    }

    #[test]
    fn test_drop_rate() {
        let mut rng = Pcg32::seed_from_u64(5);
        assert!(roll_drop(&mut rng, 0.0).is_none());
        assert!(roll_drop(&mut rng, 1.0).is_some());
        let hits = (0..10_000).filter(|_| roll_drop(&mut rng, 0.25).is_some()).count();
        assert!((2_200..2_800).contains(&hits));
    }
}

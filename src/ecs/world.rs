//! World - owns the flock, the traps and everything a tick needs

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::SimulationConfig;
use crate::core::error::{ForageError, Result};
use crate::core::types::{AgentId, FaceId, SpeciesId, Tick, Tier, TrapId, Vec2};
use crate::data::catalog::ContentTables;
use crate::entity::flock::Flock;
use crate::entity::stats::{draw_obesity, resolve_stats, AgentStatBlock};
use crate::simulation::trap::Trap;
use crate::spatial::sparse_hash::SparseHashGrid;

/// The simulation world
///
/// Content tables are injected at construction and never change afterwards.
pub struct World {
    pub current_tick: Tick,
    pub flock: Flock,
    pub traps: Vec<Trap>,
    pub grid: SparseHashGrid,
    pub rng: ChaCha8Rng,
    /// Player position, `None` while no player is present
    pub player: Option<Vec2>,
    config: SimulationConfig,
    tables: ContentTables,
    next_trap_id: u32,
}

impl World {
    pub fn new(tables: ContentTables, config: SimulationConfig, seed: u64) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            current_tick: 0,
            flock: Flock::new(tables.stress),
            traps: Vec::new(),
            grid: SparseHashGrid::new(config.grid_cell_size),
            rng: ChaCha8Rng::seed_from_u64(seed),
            player: None,
            config,
            tables,
            next_trap_id: 1,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn tables(&self) -> &ContentTables {
        &self.tables
    }

    /// Spawn a pigeon at its species' default tier with a drawn obesity
    pub fn spawn_pigeon(
        &mut self,
        species_id: SpeciesId,
        face_id: FaceId,
        position: Vec2,
    ) -> Result<AgentId> {
        let species = self
            .tables
            .species(species_id)
            .ok_or(ForageError::UnknownSpecies(species_id))?;
        let tier = species.tier;
        let obesity = draw_obesity(species, &mut self.rng);

        self.spawn_pigeon_with(species_id, face_id, obesity, tier, position)
    }

    /// Spawn a pigeon with explicit obesity and tier
    pub fn spawn_pigeon_with(
        &mut self,
        species_id: SpeciesId,
        face_id: FaceId,
        obesity: i32,
        tier: Tier,
        position: Vec2,
    ) -> Result<AgentId> {
        let stats = resolve_stats(&self.tables, species_id, face_id, obesity, tier)?;
        let id = self.flock.spawn(stats, position);

        tracing::debug!(
            "Spawned {:?}: species {:?}, tier {}, obesity {} at ({:.1}, {:.1})",
            id,
            species_id,
            tier.0,
            obesity,
            position.x,
            position.y
        );

        Ok(id)
    }

    /// Place a trap of a named type
    pub fn place_trap(&mut self, name: &str, position: Vec2) -> Result<TrapId> {
        let def = self
            .tables
            .trap(name)
            .ok_or_else(|| ForageError::UnknownName(name.to_string()))?;

        let id = TrapId(self.next_trap_id);
        let trap = Trap::new(id, def, position)?;
        self.next_trap_id += 1;
        self.traps.push(trap);

        Ok(id)
    }

    pub fn trap(&self, id: TrapId) -> Option<&Trap> {
        self.traps.iter().find(|trap| trap.id() == id)
    }

    /// Destroy a pigeon and purge it from every trap in the same call
    pub fn despawn_pigeon(&mut self, id: AgentId) -> Option<AgentStatBlock> {
        let position = self.flock.position(id);
        let stats = self.flock.despawn(id)?;

        for trap in &mut self.traps {
            trap.forget(id);
        }
        if let Some(pos) = position {
            self.grid.remove(id, pos);
        }

        Some(stats)
    }

    pub fn set_player(&mut self, player: Option<Vec2>) {
        self.player = player;
    }

    pub fn pigeon_count(&self) -> usize {
        self.flock.count()
    }

    /// Traps that have not captured yet
    pub fn active_traps(&self) -> impl Iterator<Item = &Trap> {
        self.traps.iter().filter(|trap| !trap.has_captured_pigeon())
    }
}

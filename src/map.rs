//! Session orchestrator: input dispatch, row clears, gravity, spawning

use crate::bag::PieceSource;
use crate::collision::{classify_cells, Collision, Movement};
use crate::error::{EngineError, Result};
use crate::events::{EngineEvent, EventBus, InputEvent, SoundCue};
use crate::grid::{Grid, Point, RenderSnapshot};
use crate::score::Score;
use crate::shape::{Shape, ShapeManager};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Session configuration, read once when the map is built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapConfig {
    /// Inner grid width in cells
    pub width: usize,
    /// Inner grid height in cells
    pub height: usize,
    /// Rendered size of one cell (terminal columns)
    pub cell_size: u16,
    /// Gravity tick period
    pub tick_interval: Duration,
    /// Undelivered notifications kept before new ones are dropped
    pub event_capacity: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 12,
            height: 20,
            cell_size: 2,
            tick_interval: Duration::from_millis(500),
            event_capacity: 256,
        }
    }
}

impl MapConfig {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(EngineError::config(format!(
                "grid dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.cell_size == 0 {
            return Err(EngineError::config("cell size must be positive"));
        }
        if self.tick_interval.is_zero() {
            return Err(EngineError::config("tick interval must be positive"));
        }
        if self.event_capacity == 0 {
            return Err(EngineError::config("event capacity must be positive"));
        }
        Ok(())
    }
}

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapState {
    Running,
    /// Terminal: no further mutation is accepted
    GameOver,
}

/// Owns the grid and the active shape for a whole session
pub struct Map {
    config: MapConfig,
    grid: Grid,
    shapes: ShapeManager,
    pieces: Box<dyn PieceSource>,
    bus: EventBus,
    score: Score,
    state: MapState,
}

impl Map {
    /// Build an empty map. No shape is active until [`Map::spawn_new_shape`].
    pub fn new(config: MapConfig, pieces: Box<dyn PieceSource>, bus: EventBus) -> Result<Self> {
        config.validate()?;
        let grid = Grid::new(config.width, config.height)?;
        info!(
            "map created: {}x{} interior, tick {:?}",
            config.width, config.height, config.tick_interval
        );
        Ok(Self {
            config,
            grid,
            shapes: ShapeManager::new(),
            pieces,
            bus,
            score: Score::new(),
            state: MapState::Running,
        })
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Direct grid access for collaborators that stage boards
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn active_shape(&self) -> Option<&Shape> {
        self.shapes.active()
    }

    pub fn shapes(&self) -> &ShapeManager {
        &self.shapes
    }

    pub fn score(&self) -> &Score {
        &self.score
    }

    pub fn state(&self) -> MapState {
        self.state
    }

    pub fn is_game_over(&self) -> bool {
        self.state == MapState::GameOver
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        self.grid.snapshot()
    }

    /// Fixed top-center origin new shapes appear at
    pub fn spawn_origin(&self) -> Point {
        Point::new(((self.config.width - 1) / 2) as i32, 0)
    }

    /// Apply one player input.
    ///
    /// Returns the collision outcome, or `None` once the session is over or
    /// while no shape is active.
    pub fn process_event(&mut self, input: InputEvent) -> Option<Collision> {
        let outcome = match input {
            InputEvent::MoveLeft => self.step(Movement::Shift(Point::new(-1, 0))),
            InputEvent::MoveRight => self.step(Movement::Shift(Point::new(1, 0))),
            InputEvent::SoftDrop => self.step(Movement::Drop),
            InputEvent::Rotate => self.step(Movement::Rotate),
        }?;
        if input == InputEvent::SoftDrop && outcome == Collision::Free {
            self.score.add_soft_drop(1);
        }
        Some(outcome)
    }

    /// Apply a raw input symbol. Unknown symbols are logged and ignored.
    pub fn process_symbol(&mut self, symbol: &str) -> Option<Collision> {
        match symbol.parse::<InputEvent>() {
            Ok(input) => self.process_event(input),
            Err(e) => {
                warn!("ignoring input: {}", e);
                None
            }
        }
    }

    /// Periodic gravity: move the active shape one row down
    pub fn tick(&mut self) -> Option<Collision> {
        self.step(Movement::Drop)
    }

    fn step(&mut self, movement: Movement) -> Option<Collision> {
        if self.is_game_over() {
            return None;
        }
        let shape = self.shapes.active_mut()?;

        let collision = match movement {
            Movement::Rotate => {
                if shape.rotate(&mut self.grid) {
                    self.bus.publish(EngineEvent::Sound(SoundCue::RotateOk));
                    Collision::Free
                } else {
                    Collision::Blocked
                }
            }
            other => shape.move_by(&mut self.grid, other),
        };

        match collision {
            Collision::Free => self.bus.publish(EngineEvent::StateChanged),
            Collision::Grounded => self.settle_active(),
            Collision::Blocked => {}
        }
        Some(collision)
    }

    /// Post-placement sequence: game-over check, row clears, next spawn.
    /// Cells are already marked placed by the shape.
    fn settle_active(&mut self) {
        let Some(shape) = self.shapes.retire_active() else {
            return;
        };
        debug!(
            "placed {:?} at {:?} rotation {}",
            shape.kind(),
            shape.origin(),
            shape.rotation()
        );
        self.bus.publish(EngineEvent::Sound(SoundCue::Placed));

        if shape.touches_top_row() {
            self.bus.publish(EngineEvent::StateChanged);
            self.initiate_game_over();
            return;
        }

        let rows = self.check_for_combo();
        if rows > 0 {
            let awarded = self.score.add_clear(rows);
            info!("cleared {} row(s) for {} points", rows, awarded);
            self.bus.publish(EngineEvent::RowsCleared { count: rows });
            self.bus.publish(EngineEvent::Sound(SoundCue::LineClear));
        }
        self.bus.publish(EngineEvent::StateChanged);
        self.spawn_new_shape();
    }

    /// Spawn the next piece at the top-center origin.
    ///
    /// A spawn whose cells are not free ends the session. Any shape still
    /// active is superseded and its cells erased.
    pub fn spawn_new_shape(&mut self) -> bool {
        if self.is_game_over() {
            return false;
        }
        if let Some(previous) = self.shapes.active() {
            previous.erase(&mut self.grid);
        }

        let spec = self.pieces.next_piece();
        let shape = Shape::new(spec.kind, self.spawn_origin(), spec.color);
        let cells = shape.points_in_grid_coords();
        if classify_cells(&self.grid, &cells, false) != Collision::Free {
            warn!("no room to spawn {:?}", spec.kind);
            self.shapes.clear();
            self.initiate_game_over();
            return false;
        }

        shape.paint(&mut self.grid);
        debug!("spawned {:?} at {:?}", spec.kind, shape.origin());
        self.shapes.replace(shape);
        self.bus.publish(EngineEvent::StateChanged);
        true
    }

    /// Enter the terminal state. Notifies only on the first call.
    pub fn initiate_game_over(&mut self) {
        if self.is_game_over() {
            return;
        }
        self.state = MapState::GameOver;
        info!(
            "game over: {} points, {} rows, {} shapes placed",
            self.score.points,
            self.score.lines,
            self.shapes.placed_shapes()
        );
        self.bus.publish(EngineEvent::GameOver);
        self.bus.publish(EngineEvent::Sound(SoundCue::GameOver));
    }

    /// Clear every fully placed interior row, settling the rest after each
    /// clear. Repeats until no complete row is left; returns the rows cleared.
    pub fn check_for_combo(&mut self) -> u32 {
        let mut cleared = 0;
        while let Some(row) = self.next_deletable_row() {
            self.clear(row);
            self.apply_gravity();
            cleared += 1;
        }
        cleared
    }

    fn next_deletable_row(&self) -> Option<usize> {
        self.grid.interior_rows().find(|&y| self.row_deletable(y))
    }

    fn row_deletable(&self, y: usize) -> bool {
        self.grid
            .interior_columns()
            .all(|x| self.grid.field_at(x, y).is_placed())
    }

    /// Reset the interior cells of `row` to empty
    pub fn clear(&mut self, row: usize) {
        for x in self.grid.interior_columns() {
            self.grid.field_at_mut(x, row).wipe_out();
        }
    }

    /// Let floating placed cells sink onto the nearest support below them.
    ///
    /// Columns settle independently. Within a column cells are visited from
    /// the bottom up, so a cell that already fell is never seen again.
    /// Cells of a live shape never move and act as obstacles.
    /// Returns the number of cells moved.
    pub fn apply_gravity(&mut self) -> usize {
        let mut moved = 0;
        for x in self.grid.interior_columns() {
            for y in self.grid.interior_rows().rev() {
                let cell = *self.grid.field_at(x, y);
                if !cell.is_placed() {
                    continue;
                }

                let mut rest = y;
                while let Some(n) = self.grid.neighbors(x, rest) {
                    if !self.grid.cell(n.bottom).is_empty() {
                        break;
                    }
                    rest = self.grid.coords_of(n.bottom).1;
                }

                if rest != y {
                    self.grid.field_at_mut(x, rest).copy_state_from(&cell);
                    self.grid.field_at_mut(x, y).wipe_out();
                    moved += 1;
                }
            }
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::{PieceSpec, Sequence};
    use crate::cell::{Cell, CellType};
    use crate::collision::classify;
    use crate::events::EventReceiver;
    use crate::tetromino::PieceKind;
    use ratatui::style::Color;

    fn placed(color: Color) -> Cell {
        Cell {
            color: Some(color),
            kind: CellType::Placed,
        }
    }

    fn map_with(width: usize, height: usize, pieces: Vec<PieceSpec>) -> (Map, EventReceiver) {
        let config = MapConfig {
            width,
            height,
            ..MapConfig::default()
        };
        let (bus, rx) = EventBus::bounded(1024);
        let map = Map::new(config, Box::new(Sequence::new(pieces)), bus).unwrap();
        (map, rx)
    }

    fn blue_line() -> PieceSpec {
        PieceSpec::new(PieceKind::I, Color::Blue)
    }

    fn cells_of(map: &Map) -> Vec<Cell> {
        let grid = map.grid();
        let mut cells = Vec::new();
        for y in 0..grid.total_height() {
            for x in 0..grid.total_width() {
                cells.push(*grid.field_at(x, y));
            }
        }
        cells
    }

    fn filled_interior(map: &Map) -> Vec<(usize, usize)> {
        let grid = map.grid();
        let mut cells = Vec::new();
        for y in grid.interior_rows() {
            for x in grid.interior_columns() {
                if grid.field_at(x, y).is_filled() {
                    cells.push((x, y));
                }
            }
        }
        cells.sort();
        cells
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let (bus, _rx) = EventBus::bounded(4);
        let config = MapConfig {
            width: 0,
            ..MapConfig::default()
        };
        let result = Map::new(config, Box::new(Sequence::new(vec![])), bus);
        assert!(matches!(result, Err(EngineError::Config { .. })));
    }

    #[test]
    fn test_combo_without_full_row_is_idempotent() {
        let (mut map, _rx) = map_with(6, 6, vec![blue_line()]);
        for x in 1..=5 {
            map.grid_mut().set_field_at(x, 6, placed(Color::Red));
        }
        map.grid_mut().set_field_at(3, 5, placed(Color::Red));
        let before = cells_of(&map);

        assert_eq!(map.check_for_combo(), 0);
        assert_eq!(cells_of(&map), before);
    }

    #[test]
    fn test_row_clear_shifts_cells_above_down_one_row() {
        let (mut map, _rx) = map_with(5, 6, vec![blue_line()]);
        let grid = map.grid_mut();
        // Bottom row: all but column 5, stays
        for x in 1..=4 {
            grid.set_field_at(x, 6, placed(Color::Green));
        }
        // Row 5 is full and gets cleared
        for x in 1..=5 {
            grid.set_field_at(x, 5, placed(Color::Red));
        }
        // Stacks resting on row 5
        grid.set_field_at(1, 4, placed(Color::Blue));
        grid.set_field_at(1, 3, placed(Color::Cyan));
        grid.set_field_at(3, 4, placed(Color::Yellow));

        assert_eq!(map.check_for_combo(), 1);

        let grid = map.grid();
        assert_eq!(grid.field_at(1, 5).color, Some(Color::Blue));
        assert_eq!(grid.field_at(1, 4).color, Some(Color::Cyan));
        assert_eq!(grid.field_at(3, 5).color, Some(Color::Yellow));
        assert!(grid.field_at(1, 3).is_empty());
        assert!(grid.field_at(3, 4).is_empty());
        for x in [2, 4, 5] {
            assert!(grid.field_at(x, 5).is_empty());
        }
        // Row below the cleared one is untouched
        for x in 1..=4 {
            assert_eq!(*grid.field_at(x, 6), placed(Color::Green));
        }
        assert!(grid.field_at(5, 6).is_empty());
    }

    #[test]
    fn test_gravity_settles_bottom_up_per_column() {
        let (mut map, _rx) = map_with(3, 6, vec![blue_line()]);
        let grid = map.grid_mut();
        grid.set_field_at(2, 2, placed(Color::Red));
        grid.set_field_at(2, 4, placed(Color::Blue));

        assert_eq!(map.apply_gravity(), 2);

        let grid = map.grid();
        assert_eq!(grid.field_at(2, 6).color, Some(Color::Blue));
        assert_eq!(grid.field_at(2, 5).color, Some(Color::Red));
        assert!(grid.field_at(2, 5).is_placed());
        assert!(grid.field_at(2, 2).is_empty());
        assert!(grid.field_at(2, 4).is_empty());
    }

    #[test]
    fn test_cascading_clears() {
        let (mut map, _rx) = map_with(3, 4, vec![blue_line()]);
        let grid = map.grid_mut();
        // Two full rows with a gap between them
        for x in 1..=3 {
            grid.set_field_at(x, 4, placed(Color::Red));
            grid.set_field_at(x, 2, placed(Color::Red));
        }
        assert_eq!(map.check_for_combo(), 2);
        for y in 1..=4 {
            for x in 1..=3 {
                assert!(map.grid().field_at(x, y).is_empty());
            }
        }
    }

    #[test]
    fn test_combo_leaves_live_shape_in_place() {
        let (mut map, _rx) = map_with(12, 20, vec![blue_line()]);
        assert!(map.spawn_new_shape());
        for x in 1..=12 {
            map.grid_mut().set_field_at(x, 20, placed(Color::Red));
        }

        assert_eq!(map.check_for_combo(), 1);

        let shape = map.active_shape().unwrap().clone();
        assert_eq!(shape.origin(), Point::new(5, 0));
        let mut expected: Vec<_> = shape
            .points_in_grid_coords()
            .iter()
            .map(|p| (p.x as usize, p.y as usize))
            .collect();
        expected.sort();
        assert_eq!(filled_interior(&map), expected);

        // Moving afterwards leaves no stray cells behind
        assert_eq!(map.process_event(InputEvent::MoveLeft), Some(Collision::Free));
        let mut expected: Vec<_> = map
            .active_shape()
            .unwrap()
            .points_in_grid_coords()
            .iter()
            .map(|p| (p.x as usize, p.y as usize))
            .collect();
        expected.sort();
        assert_eq!(filled_interior(&map), expected);
    }

    #[test]
    fn test_side_move_into_border_is_blocked() {
        let (mut map, _rx) = map_with(12, 20, vec![blue_line()]);
        assert!(map.spawn_new_shape());
        // Line covers grid columns origin..=origin+3
        for _ in 0..4 {
            assert_eq!(map.process_event(InputEvent::MoveLeft), Some(Collision::Free));
        }
        let origin = map.active_shape().unwrap().origin();
        assert_eq!(origin, Point::new(1, 0));

        assert_eq!(map.process_event(InputEvent::MoveLeft), Some(Collision::Blocked));
        assert_eq!(map.active_shape().unwrap().origin(), origin);
    }

    #[test]
    fn test_line_piece_end_to_end() {
        let (mut map, rx) = map_with(12, 20, vec![blue_line()]);
        assert!(map.spawn_new_shape());
        assert_eq!(map.spawn_origin(), Point::new(5, 0));
        for x in 5..=8 {
            assert_eq!(map.grid().field_at(x, 1).color, Some(Color::Blue));
        }

        for _ in 0..19 {
            assert_eq!(map.process_event(InputEvent::SoftDrop), Some(Collision::Free));
        }
        let shape = map.active_shape().unwrap();
        assert_eq!(shape.origin(), Point::new(5, 19));
        assert_eq!(classify(map.grid(), shape, Movement::Drop), Collision::Grounded);

        assert_eq!(map.process_event(InputEvent::SoftDrop), Some(Collision::Grounded));
        for x in 5..=8 {
            assert_eq!(*map.grid().field_at(x, 20), placed(Color::Blue));
        }

        let next = map.active_shape().unwrap();
        assert_eq!(next.origin(), map.spawn_origin());
        assert_eq!(next.rotation(), 0);
        for x in 5..=8 {
            let cell = map.grid().field_at(x, 1);
            assert_eq!(cell.color, Some(Color::Blue));
            assert_eq!(cell.kind, CellType::Normal);
        }
        assert_eq!(map.shapes().placed_shapes(), 1);
        assert_eq!(map.score().points, 19);

        let events: Vec<_> = rx.try_iter().collect();
        assert!(events.contains(&EngineEvent::Sound(SoundCue::Placed)));
        assert!(!events.contains(&EngineEvent::GameOver));
    }

    #[test]
    fn test_grounded_on_stack_spawns_without_clear() {
        let (mut map, rx) = map_with(12, 20, vec![blue_line()]);
        for x in 6..=7 {
            map.grid_mut().set_field_at(x, 20, placed(Color::Red));
        }
        assert!(map.spawn_new_shape());

        let mut outcome = None;
        for _ in 0..20 {
            outcome = map.tick();
            if outcome == Some(Collision::Grounded) {
                break;
            }
        }
        assert_eq!(outcome, Some(Collision::Grounded));
        for x in 5..=8 {
            assert!(map.grid().field_at(x, 19).is_placed());
        }
        assert!(map.active_shape().is_some());
        assert!(!map.is_game_over());
        // Gravity ticks score nothing
        assert_eq!(map.score().points, 0);
        assert!(!rx.try_iter().any(|e| matches!(e, EngineEvent::RowsCleared { .. })));
    }

    #[test]
    fn test_completing_a_row_clears_it() {
        let (mut map, rx) = map_with(4, 5, vec![blue_line()]);
        // Spawn origin is 1, so the line covers columns 1..=4 and fills a row
        assert!(map.spawn_new_shape());
        map.grid_mut().set_field_at(2, 4, placed(Color::Red));
        for _ in 0..5 {
            map.process_event(InputEvent::SoftDrop);
        }

        let events: Vec<_> = rx.try_iter().collect();
        assert!(events.contains(&EngineEvent::RowsCleared { count: 1 }));
        assert!(events.contains(&EngineEvent::Sound(SoundCue::LineClear)));
        assert_eq!(map.score().lines, 1);
        // The support cell sank to the floor once row 3 was cleared
        assert_eq!(*map.grid().field_at(2, 5), placed(Color::Red));
        for x in [1, 3, 4] {
            assert!(map.grid().field_at(x, 5).is_empty());
        }
    }

    #[test]
    fn test_spawn_into_placed_row_is_game_over() {
        let (mut map, rx) = map_with(12, 20, vec![blue_line()]);
        for x in 2..=12 {
            map.grid_mut().set_field_at(x, 1, placed(Color::Red));
        }

        assert!(!map.spawn_new_shape());
        assert!(map.is_game_over());
        assert!(map.active_shape().is_none());

        let before = cells_of(&map);
        for input in [
            InputEvent::SoftDrop,
            InputEvent::Rotate,
            InputEvent::MoveLeft,
            InputEvent::MoveRight,
        ] {
            assert_eq!(map.process_event(input), None);
        }
        assert_eq!(map.tick(), None);
        assert!(!map.spawn_new_shape());
        map.initiate_game_over();
        assert_eq!(cells_of(&map), before);

        let game_overs = rx
            .try_iter()
            .filter(|e| *e == EngineEvent::GameOver)
            .count();
        assert_eq!(game_overs, 1);
    }

    #[test]
    fn test_placement_in_top_row_is_game_over() {
        let (mut map, rx) = map_with(12, 20, vec![blue_line()]);
        // Stack reaching up to row 2 under the spawn columns
        for y in 2..=20 {
            map.grid_mut().set_field_at(6, y, placed(Color::Red));
        }
        assert!(map.spawn_new_shape());
        assert_eq!(map.process_event(InputEvent::SoftDrop), Some(Collision::Grounded));

        assert!(map.is_game_over());
        assert!(map.grid().field_at(5, 1).is_placed());
        assert_eq!(map.process_event(InputEvent::MoveLeft), None);
        assert_eq!(
            rx.try_iter().filter(|e| *e == EngineEvent::GameOver).count(),
            1
        );
    }

    #[test]
    fn test_rotation_emits_cue() {
        let (mut map, rx) = map_with(12, 20, vec![PieceSpec::new(PieceKind::T, Color::Magenta)]);
        assert!(map.spawn_new_shape());
        map.process_event(InputEvent::SoftDrop);
        assert_eq!(map.process_event(InputEvent::Rotate), Some(Collision::Free));
        assert_eq!(map.active_shape().unwrap().rotation(), 1);
        assert!(rx
            .try_iter()
            .any(|e| e == EngineEvent::Sound(SoundCue::RotateOk)));
    }

    #[test]
    fn test_unknown_symbol_is_ignored() {
        let (mut map, _rx) = map_with(12, 20, vec![blue_line()]);
        assert!(map.spawn_new_shape());
        let before = cells_of(&map);
        assert_eq!(map.process_symbol("jump"), None);
        assert_eq!(cells_of(&map), before);
        assert_eq!(map.process_symbol("d"), Some(Collision::Free));
    }

    #[test]
    fn test_snapshot_reflects_active_shape() {
        let (mut map, _rx) = map_with(12, 20, vec![blue_line()]);
        assert!(map.spawn_new_shape());
        let snapshot = map.snapshot();
        assert_eq!(snapshot.width, 14);
        assert_eq!(snapshot.height, 22);
        let cell = snapshot.at(5, 1).unwrap();
        assert_eq!(cell.color, Some(Color::Blue));
    }
}

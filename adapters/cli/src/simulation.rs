use std::time::Duration;

use caveslave_core::{CellCoord, Command, Event};
use caveslave_persistence::LevelStore;
use caveslave_rendering::{
    FrameInput, GhostTile, PlayerPresentation, RenderingError, Scene, TileGridPresentation,
};
use caveslave_system_camera::{CameraInput, CenteredCamera};
use caveslave_system_editor::{Editor, EditorInput};
use caveslave_system_motion::{Motion, MotionInput};
use caveslave_world::{self as world, query, World};

use crate::prompt::LevelNamePrompt;

/// Game-state aggregate driven once per rendered frame.
///
/// Systems observe the events produced earlier in the same frame, so a mode
/// toggle takes effect for painting and movement immediately.
#[derive(Debug)]
pub(crate) struct Simulation<P> {
    world: World,
    motion: Motion,
    editor: Editor,
    camera: CenteredCamera,
    store: LevelStore,
    prompt: P,
    events: Vec<Event>,
    commands: Vec<Command>,
    cursor_cell: Option<CellCoord>,
    status: Option<String>,
    exit_prompt: bool,
    exit_confirmed: bool,
}

impl<P: LevelNamePrompt> Simulation<P> {
    pub(crate) fn new(
        world: World,
        motion: Motion,
        camera: CenteredCamera,
        store: LevelStore,
        prompt: P,
    ) -> Self {
        Self {
            world,
            motion,
            editor: Editor::default(),
            camera,
            store,
            prompt,
            events: Vec::new(),
            commands: Vec::new(),
            cursor_cell: None,
            status: None,
            exit_prompt: false,
            exit_confirmed: false,
        }
    }

    /// Runs one frame of input handling and simulation.
    pub(crate) fn advance(&mut self, dt: Duration, input: FrameInput) {
        if self.handle_exit(&input) {
            return;
        }

        if input.pressed.load_level {
            self.prompt_load();
        }
        if input.pressed.save_level {
            self.prompt_save();
        }
        if input.pressed.toggle_mode {
            let mode = query::play_mode(&self.world).toggled();
            world::apply(&mut self.world, Command::SetPlayMode { mode }, &mut self.events);
        }

        let pointer = self.camera.view().screen_to_world(input.mouse_position);
        self.cursor_cell = Some(CellCoord::containing(
            pointer,
            query::tile_length(&self.world),
        ));

        self.editor.handle(
            &self.events,
            query::tile_selection(&self.world),
            editor_input(&input, self.cursor_cell),
            &mut self.commands,
        );
        self.flush_commands();

        self.motion.handle(
            &self.events,
            motion_input(&input),
            query::player(&self.world),
            query::tile_view(&self.world),
            dt,
            &mut self.commands,
        );
        self.flush_commands();

        self.camera.update(
            query::player(&self.world).center(),
            CameraInput {
                wheel: input.mouse_wheel,
                modifier_held: input.held.modifier,
            },
            input.viewport,
        );

        self.events.clear();
    }

    /// Replaces the grid with the named level, keeping the current one on failure.
    pub(crate) fn load_level(&mut self, name: &str) {
        let level = match self.store.load(name) {
            Ok(level) => level,
            Err(error) => {
                log::warn!("failed to load level `{name}`: {error}");
                self.status = Some(format!("Failed to load level {name}"));
                return;
            }
        };

        let first = self.events.len();
        world::apply(&mut self.world, Command::InstallLevel { level }, &mut self.events);
        self.status = self.events[first..].iter().find_map(|event| match event {
            Event::LevelInstalled { width, height } => {
                Some(format!("Loaded level {name} ({width}x{height})"))
            }
            Event::LevelRejected { .. } => Some(format!("Failed to load level {name}")),
            _ => None,
        });
    }

    /// Builds the initial scene handed to the rendering backend.
    pub(crate) fn scene(&self) -> Result<Scene, RenderingError> {
        let mut scene = Scene::new(
            self.tile_grid()?,
            self.player_presentation(),
            self.camera.view(),
            query::play_mode(&self.world),
            query::tile_selection(&self.world),
        );
        self.populate_overlays(&mut scene);
        Ok(scene)
    }

    /// Copies the current state into the scene rendered this frame.
    pub(crate) fn populate_scene(&self, scene: &mut Scene) -> Result<(), RenderingError> {
        scene.tile_grid = self.tile_grid()?;
        scene.player = self.player_presentation();
        scene.camera = self.camera.view();
        scene.play_mode = query::play_mode(&self.world);
        scene.tile_selection = query::tile_selection(&self.world);
        self.populate_overlays(scene);
        Ok(())
    }

    fn handle_exit(&mut self, input: &FrameInput) -> bool {
        if self.exit_prompt {
            if input.pressed.confirm {
                log::info!("exit confirmed");
                self.exit_confirmed = true;
            } else if input.pressed.deny {
                self.exit_prompt = false;
            }
            return true;
        }

        if input.pressed.escape || input.pressed.close_requested {
            self.exit_prompt = true;
            return true;
        }

        false
    }

    fn prompt_load(&mut self) {
        let Some(name) = self.prompt.ask("Load level:") else {
            return;
        };
        if name.trim().is_empty() {
            self.status = Some("Level not loaded".to_owned());
            return;
        }
        self.load_level(&name);
    }

    fn prompt_save(&mut self) {
        let Some(name) = self.prompt.ask("Save level as:") else {
            return;
        };
        if name.trim().is_empty() {
            self.status = Some("Level not saved".to_owned());
            return;
        }

        match self.store.save(&name, query::grid(&self.world)) {
            Ok(path) => self.status = Some(format!("Saved level to {}", path.display())),
            Err(error) => {
                log::error!("failed to save level `{name}`: {error}");
                self.status = Some(format!("Failed to save level {name}"));
            }
        }
    }

    fn flush_commands(&mut self) {
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }
    }

    fn tile_grid(&self) -> Result<TileGridPresentation, RenderingError> {
        let view = query::tile_view(&self.world);
        let (columns, rows) = view.dimensions();
        TileGridPresentation::new(columns, rows, view.tile_length(), view.iter().collect())
    }

    fn player_presentation(&self) -> PlayerPresentation {
        let player = query::player(&self.world);
        PlayerPresentation {
            rect: player.rect,
            facing: player.facing,
        }
    }

    fn populate_overlays(&self, scene: &mut Scene) {
        let tiles = query::tile_view(&self.world);
        scene.ghost_tile = self
            .editor
            .preview(query::tile_selection(&self.world), self.cursor_cell)
            .filter(|preview| tiles.tile(preview.cell).is_some())
            .map(|preview| GhostTile {
                cell: preview.cell,
                kind: preview.kind,
            });
        scene.status = self.status.clone();
        scene.exit_prompt = self.exit_prompt;
        scene.exit_confirmed = self.exit_confirmed;
    }
}

fn axis(negative: bool, positive: bool) -> f32 {
    f32::from(u8::from(positive)) - f32::from(u8::from(negative))
}

fn motion_input(input: &FrameInput) -> MotionInput {
    let held = input.held;
    MotionInput {
        horizontal: axis(held.left, held.right),
        vertical: axis(held.up, held.down),
        jump_pressed: input.pressed.jump,
    }
}

fn editor_input(input: &FrameInput, cursor_cell: Option<CellCoord>) -> EditorInput {
    let wheel_steps = if input.held.modifier || !input.mouse_wheel.is_finite() {
        0
    } else {
        input.mouse_wheel.round() as i32
    };

    EditorInput {
        paint_held: input.held.paint,
        erase_held: input.held.erase,
        cursor_cell,
        cycle_forward: input.pressed.jump,
        wheel_steps,
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, fs};

    use caveslave_core::{GameMode, TileKind};
    use caveslave_world::WorldSettings;
    use glam::Vec2;

    use super::*;

    #[derive(Debug, Default)]
    struct ScriptedPrompt {
        answers: VecDeque<String>,
    }

    impl LevelNamePrompt for ScriptedPrompt {
        fn ask(&mut self, _message: &str) -> Option<String> {
            self.answers.pop_front()
        }
    }

    const VIEWPORT: Vec2 = Vec2::new(160.0, 160.0);

    fn simulation(store: LevelStore, answers: &[&str]) -> Simulation<ScriptedPrompt> {
        let settings = WorldSettings {
            columns: 16,
            rows: 16,
            ..WorldSettings::default()
        };
        let world = World::with_settings(&settings).expect("valid settings");
        let prompt = ScriptedPrompt {
            answers: answers.iter().map(|answer| (*answer).to_owned()).collect(),
        };
        Simulation::new(
            world,
            Motion::default(),
            CenteredCamera::default(),
            store,
            prompt,
        )
    }

    fn idle() -> FrameInput {
        FrameInput {
            viewport: VIEWPORT,
            ..FrameInput::default()
        }
    }

    fn toggle() -> FrameInput {
        let mut input = idle();
        input.pressed.toggle_mode = true;
        input
    }

    #[test]
    fn double_toggle_preserves_mode_and_position() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut simulation = simulation(LevelStore::new(dir.path()), &[]);
        let before = query::player(&simulation.world).rect;

        simulation.advance(Duration::ZERO, toggle());
        assert_eq!(query::play_mode(&simulation.world), GameMode::Play);
        simulation.advance(Duration::ZERO, toggle());

        assert_eq!(query::play_mode(&simulation.world), GameMode::Editor);
        assert_eq!(query::player(&simulation.world).rect, before);
    }

    #[test]
    fn editor_paints_the_hovered_cell() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut simulation = simulation(LevelStore::new(dir.path()), &[]);
        simulation.advance(Duration::ZERO, idle());

        let mut input = idle();
        input.mouse_position = VIEWPORT / 2.0 + Vec2::splat(4.0);
        input.held.paint = true;
        simulation.advance(Duration::ZERO, input);

        let cell = CellCoord::new(8, 8);
        assert_eq!(
            query::grid(&simulation.world).tile(cell),
            Ok(TileKind::new(1))
        );

        let mut scene = simulation.scene().expect("scene");
        simulation
            .populate_scene(&mut scene)
            .expect("populate scene");
        assert_eq!(
            scene.ghost_tile,
            Some(GhostTile {
                cell,
                kind: TileKind::new(1),
            })
        );
    }

    #[test]
    fn play_mode_hides_the_ghost_tile_and_ignores_painting() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut simulation = simulation(LevelStore::new(dir.path()), &[]);
        simulation.advance(Duration::ZERO, idle());

        let mut input = toggle();
        input.mouse_position = VIEWPORT / 2.0 + Vec2::splat(4.0);
        input.held.paint = true;
        simulation.advance(Duration::ZERO, input);

        assert_eq!(
            query::grid(&simulation.world).tile(CellCoord::new(8, 8)),
            Ok(TileKind::EMPTY)
        );
        let scene = simulation.scene().expect("scene");
        assert_eq!(scene.ghost_tile, None);
        assert_eq!(scene.play_mode, GameMode::Play);
    }

    #[test]
    fn save_and_load_round_trip_through_prompt() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = LevelStore::new(dir.path());
        let mut simulation = simulation(store.clone(), &["cave", "cave"]);
        world::apply(
            &mut simulation.world,
            Command::PlaceTile {
                cell: CellCoord::new(3, 4),
                kind: TileKind::new(5),
            },
            &mut Vec::new(),
        );
        let saved = query::grid(&simulation.world).clone();

        let mut save = idle();
        save.pressed.save_level = true;
        simulation.advance(Duration::ZERO, save);
        assert!(dir.path().join("cave.json").exists());

        world::apply(
            &mut simulation.world,
            Command::PlaceTile {
                cell: CellCoord::new(3, 4),
                kind: TileKind::EMPTY,
            },
            &mut Vec::new(),
        );

        let mut load = idle();
        load.pressed.load_level = true;
        simulation.advance(Duration::ZERO, load);

        assert_eq!(query::grid(&simulation.world), &saved);
        assert_eq!(
            simulation.status.as_deref(),
            Some("Loaded level cave (16x16)")
        );
    }

    #[test]
    fn empty_save_name_is_a_no_op() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut simulation = simulation(LevelStore::new(dir.path().join("levels")), &["  "]);

        let mut save = idle();
        save.pressed.save_level = true;
        simulation.advance(Duration::ZERO, save);

        assert!(!dir.path().join("levels").exists());
        assert_eq!(simulation.status.as_deref(), Some("Level not saved"));
    }

    #[test]
    fn corrupt_level_keeps_grid_and_reports_status() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join("broken.json"), "{ \"width\": ").expect("write level");
        let mut simulation = simulation(LevelStore::new(dir.path()), &[]);
        let before = query::grid(&simulation.world).clone();

        simulation.load_level("broken");

        assert_eq!(query::grid(&simulation.world), &before);
        assert_eq!(
            simulation.status.as_deref(),
            Some("Failed to load level broken")
        );
    }

    #[test]
    fn exit_prompt_pauses_until_answered() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut simulation = simulation(LevelStore::new(dir.path()), &[]);

        let mut escape = idle();
        escape.pressed.escape = true;
        simulation.advance(Duration::ZERO, escape);
        assert!(simulation.exit_prompt);

        simulation.advance(Duration::ZERO, toggle());
        assert_eq!(query::play_mode(&simulation.world), GameMode::Editor);

        let mut deny = idle();
        deny.pressed.deny = true;
        simulation.advance(Duration::ZERO, deny);
        assert!(!simulation.exit_prompt);
        assert!(!simulation.exit_confirmed);

        simulation.advance(Duration::ZERO, escape);
        let mut confirm = idle();
        confirm.pressed.confirm = true;
        simulation.advance(Duration::ZERO, confirm);

        let scene = simulation.scene().expect("scene");
        assert!(scene.exit_prompt);
        assert!(scene.exit_confirmed);
    }

    #[test]
    fn closing_the_window_asks_before_exiting() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut simulation = simulation(LevelStore::new(dir.path()), &[]);

        let mut close = idle();
        close.pressed.close_requested = true;
        simulation.advance(Duration::ZERO, close);

        let scene = simulation.scene().expect("scene");
        assert!(scene.exit_prompt);
        assert!(!scene.exit_confirmed);

        let mut deny = idle();
        deny.pressed.deny = true;
        simulation.advance(Duration::ZERO, deny);
        assert!(!simulation.exit_prompt);
    }
}

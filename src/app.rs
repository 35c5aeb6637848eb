use crate::config::{clamp_scale, Settings, ViewKind};
use crate::controller::{Controller, MountOptions, RunState, Simulator};
use crate::input::{collect_input_nonblocking, map_key, Action, InputEvent};
use crate::moon::{MoonSim, PhaseBrowser};
use crate::orbit::{OrbitKind, OrbitSim};
use crate::render::{
    build_stars, draw_center_box, draw_moon, draw_orbit, draw_today, Hud, Palette, Star, Terminal,
    HELP_TEXT,
};
use anyhow::Result;
use chrono::Utc;
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const SPEED_STEP: f64 = 0.5;
const SCALE_STEP: f64 = 10.0;
const STAR_COUNT: usize = 90;

pub struct App {
    settings: Settings,
    term: Terminal,
    pal: Palette,
    view: ViewKind,
    orbit_kind: OrbitKind,
    scale: f64,
    orbit: Controller<OrbitSim>,
    moon: Controller<MoonSim>,
    today: PhaseBrowser,
    focused: Rc<Cell<bool>>,
    help_open: bool,
    should_quit: bool,
    stars: Vec<Star>,
    started: Instant,
}

/// Mount `sim` with the speed the user last picked for this view.
fn mount<S: Simulator>(ctrl: &mut Controller<S>, sim: S, autoplay: bool, speed: f64, start_at: f64) {
    ctrl.mount(
        sim,
        MountOptions {
            autoplay,
            speed,
            start_at,
        },
    );
}

fn nudge_speed<S: Simulator>(ctrl: &mut Controller<S>, delta: f64) -> Option<f64> {
    let cur = ctrl.speed()?;
    ctrl.set_speed(cur + delta);
    ctrl.speed()
}

impl App {
    fn init(settings: Settings) -> Result<Self> {
        let focused = Rc::new(Cell::new(true));
        let orbit_focus = focused.clone();
        let moon_focus = focused.clone();
        let mut orbit = Controller::new("orbit").with_visibility(move || orbit_focus.get());
        let mut moon = Controller::new("moon").with_visibility(move || moon_focus.get());

        // mount before taking the terminal so bad config reports cleanly
        let view = settings.start_view;
        match view {
            ViewKind::Orbit => {
                let sim = settings.orbit_sim(settings.orbit.model)?;
                mount(&mut orbit, sim, settings.autoplay, settings.orbit.speed, 0.0);
            }
            ViewKind::Moon => {
                let sim = settings.moon_sim()?;
                let m = &settings.moon;
                mount(&mut moon, sim, settings.autoplay, m.speed, m.initial_phase);
            }
            ViewKind::Today => {}
        }

        let term = Terminal::begin()?;
        let stars = build_stars(term.cols, term.rows, STAR_COUNT, settings.seed);
        Ok(Self {
            pal: Palette {
                color: settings.enable_color,
            },
            view,
            orbit_kind: settings.orbit.model,
            scale: clamp_scale(settings.orbit.scale),
            orbit,
            moon,
            today: PhaseBrowser::new(Utc::now()),
            focused,
            help_open: false,
            should_quit: false,
            stars,
            started: Instant::now(),
            term,
            settings,
        })
    }

    fn mount_view(&mut self, view: ViewKind) -> Result<()> {
        let autoplay = self.settings.autoplay;
        match view {
            ViewKind::Orbit => {
                let sim = self.settings.orbit_sim(self.orbit_kind)?;
                mount(&mut self.orbit, sim, autoplay, self.settings.orbit.speed, 0.0);
            }
            ViewKind::Moon => {
                let sim = self.settings.moon_sim()?;
                let m = &self.settings.moon;
                mount(&mut self.moon, sim, autoplay, m.speed, m.initial_phase);
            }
            ViewKind::Today => {
                self.today = PhaseBrowser::new(Utc::now());
            }
        }
        Ok(())
    }

    fn unmount_view(&mut self, view: ViewKind) {
        match view {
            ViewKind::Orbit => self.orbit.unmount(),
            ViewKind::Moon => self.moon.unmount(),
            ViewKind::Today => self.today.tour.stop(),
        }
    }

    fn switch_view(&mut self, to: ViewKind) -> Result<()> {
        if to == self.view {
            return Ok(());
        }
        debug!(from = ?self.view, to = ?to, "switch view");
        self.unmount_view(self.view);
        self.view = to;
        self.mount_view(to)
    }

    fn handle(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Quit => self.should_quit = true,
            Action::Back => {
                if self.help_open {
                    self.help_open = false;
                } else {
                    self.should_quit = true;
                }
            }
            Action::HelpToggle => self.help_open = !self.help_open,
            Action::NextView => self.switch_view(self.view.next())?,
            Action::TogglePause => match self.view {
                ViewKind::Orbit => self.orbit.toggle_pause(),
                ViewKind::Moon => self.moon.toggle_pause(),
                ViewKind::Today => {}
            },
            Action::SpeedUp | Action::SpeedDown => {
                let delta = if action == Action::SpeedUp {
                    SPEED_STEP
                } else {
                    -SPEED_STEP
                };
                match self.view {
                    ViewKind::Orbit => {
                        if let Some(s) = nudge_speed(&mut self.orbit, delta) {
                            self.settings.orbit.speed = s;
                        }
                    }
                    ViewKind::Moon => {
                        if let Some(s) = nudge_speed(&mut self.moon, delta) {
                            self.settings.moon.speed = s;
                        }
                    }
                    ViewKind::Today => {}
                }
            }
            Action::ScaleUp => self.scale = clamp_scale(self.scale + SCALE_STEP),
            Action::ScaleDown => self.scale = clamp_scale(self.scale - SCALE_STEP),
            Action::ToggleModel => {
                self.orbit_kind = self.orbit_kind.toggled();
                info!(model = self.orbit_kind.label(), "orbit model");
                self.mount_view(ViewKind::Orbit)?;
            }
            Action::JumpPhase(i) => self.moon.jump_to_phase(i),
            Action::PrevPhase | Action::NextPhase => {
                let forward = action == Action::NextPhase;
                match self.view {
                    ViewKind::Moon => self.moon.step_phase(forward),
                    ViewKind::Today => {
                        self.today.tour.stop();
                        if forward {
                            self.today.next();
                        } else {
                            self.today.previous();
                        }
                    }
                    ViewKind::Orbit => {}
                }
            }
            Action::AnimateCycle => {
                if self.today.tour.start() {
                    debug!("cycle tour started");
                }
            }
            Action::Reset => {
                self.unmount_view(self.view);
                self.mount_view(self.view)?;
            }
        }
        Ok(())
    }

    fn pump(&mut self, wall_dt: Duration) {
        match self.view {
            ViewKind::Orbit => {
                self.orbit.pump(wall_dt);
            }
            ViewKind::Moon => {
                self.moon.pump(wall_dt);
            }
            ViewKind::Today => {
                if self.focused.get() {
                    self.today.pump(wall_dt);
                }
            }
        }
    }

    fn hud<S: Simulator>(&self, ctrl: &Controller<S>) -> Hud {
        Hud {
            state: ctrl.state(),
            speed: ctrl.speed().unwrap_or(0.0),
            focused: self.focused.get(),
        }
    }

    fn render_frame(&mut self) -> Result<()> {
        let t_real = self.started.elapsed().as_secs_f32();
        match self.view {
            ViewKind::Orbit => {
                let hud = self.hud(&self.orbit);
                if let (Some(sim), Some(frame)) = (self.orbit.sim(), self.orbit.frame()) {
                    draw_orbit(&mut self.term, sim, &frame, self.scale, hud, &self.stars, t_real, self.pal);
                }
            }
            ViewKind::Moon => {
                let hud = self.hud(&self.moon);
                if let Some(frame) = self.moon.frame() {
                    draw_moon(&mut self.term, &frame, hud, &self.stars, t_real, self.pal);
                }
            }
            ViewKind::Today => draw_today(&mut self.term, &self.today, &self.stars, t_real, self.pal),
        }

        if self.help_open {
            draw_center_box(&mut self.term.cur, "Lunarium help", HELP_TEXT, self.pal);
        }

        self.term.present(true)?;
        Ok(())
    }

    fn run(&mut self) -> Result<()> {
        let fps = self.settings.fps_cap.clamp(10, 240);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);
        let mut last_frame = Instant::now();
        let mut frames: u64 = 0;

        info!(view = ?self.view, fps, color = self.pal.color, "session start");

        while !self.should_quit {
            if self.term.resize_if_needed()? {
                self.stars = build_stars(self.term.cols, self.term.rows, STAR_COUNT, self.settings.seed);
            }

            for ev in collect_input_nonblocking(frame_dt)? {
                match ev {
                    InputEvent::Key { key, mods } => {
                        if let Some(action) = map_key(self.view, self.help_open, key, mods) {
                            self.handle(action)?;
                        }
                    }
                    InputEvent::Focus(f) => {
                        debug!(focused = f, "focus");
                        self.focused.set(f);
                    }
                    InputEvent::Resize => {}
                }
                if self.should_quit {
                    break;
                }
            }

            let now = Instant::now();
            let real_dt = now.saturating_duration_since(last_frame);
            last_frame = now;
            self.pump(real_dt);

            self.render_frame()?;
            frames += 1;

            spin_sleep(frame_dt, Instant::now());
        }

        let state = match self.view {
            ViewKind::Orbit => self.orbit.state(),
            ViewKind::Moon => self.moon.state(),
            ViewKind::Today => RunState::Stopped,
        };
        info!(frames, last_view = ?self.view, ?state, "session end");
        self.unmount_view(self.view);
        Ok(())
    }
}

/// Takes over the terminal until the user quits. The terminal is restored
/// even when the loop fails.
pub fn run(settings: Settings) -> Result<()> {
    let mut app = App::init(settings)?;
    let res = app.run();
    let ended = app.term.end();
    res.and(ended)
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}

use chrono::{TimeZone, Utc};
use lunarium::config::Settings;
use lunarium::controller::{Controller, MountOptions, RunState};
use lunarium::model::{default_circular_bodies, Body, Rgb};
use lunarium::moon::{real_world_phase_index, MoonSim, PhaseBrowser};
use lunarium::orbit::{OrbitKind, OrbitSim};
use lunarium::SimError;
use std::time::Duration;

const FRAME: Duration = Duration::from_millis(16);
const MOON_TICK: Duration = Duration::from_millis(150);

fn orbit_controller(kind: OrbitKind) -> Controller<OrbitSim> {
    let mut c = Controller::new("orbit");
    let sim = Settings::default().orbit_sim(kind).unwrap();
    c.mount(sim, MountOptions::default());
    c
}

fn angles(c: &Controller<OrbitSim>) -> Vec<f64> {
    c.frame().unwrap().iter().map(|f| f.angle).collect()
}

#[test]
fn running_orbits_always_move_forward() {
    for kind in [OrbitKind::Circular, OrbitKind::Elliptical] {
        let mut c = orbit_controller(kind);
        let mut last = angles(&c);
        for _ in 0..30 {
            assert_eq!(c.pump(FRAME), 1);
            let now = angles(&c);
            assert!(now.iter().zip(&last).all(|(a, b)| a > b), "{kind:?}");
            last = now;
        }
    }
}

#[test]
fn paused_orbits_hold_still() {
    let mut c = orbit_controller(OrbitKind::Circular);
    c.pump(FRAME);
    c.pause();
    let frozen = c.frame();
    for _ in 0..100 {
        assert_eq!(c.pump(FRAME), 0);
    }
    assert_eq!(c.frame(), frozen);
    assert_eq!(c.state(), RunState::Paused);
}

#[test]
fn long_frames_are_capped() {
    let mut slow = orbit_controller(OrbitKind::Circular);
    let mut capped = orbit_controller(OrbitKind::Circular);
    slow.pump(Duration::from_millis(50));
    capped.pump(Duration::from_secs(3));
    assert_eq!(angles(&slow), angles(&capped));
}

#[test]
fn switching_models_starts_from_initial_angles() {
    let mut c = orbit_controller(OrbitKind::Circular);
    for _ in 0..10 {
        c.pump(FRAME);
    }
    let sim = Settings::default().orbit_sim(OrbitKind::Elliptical).unwrap();
    c.mount(sim, MountOptions::default());
    let fresh = Settings::default().orbit_sim(OrbitKind::Elliptical).unwrap();
    let expected: Vec<f64> = fresh.frame_at(0.0).iter().map(|f| f.angle).collect();
    assert_eq!(angles(&c), expected);
    assert_eq!(c.sim().map(|s| s.kind()), Some(OrbitKind::Elliptical));
}

#[test]
fn unmounted_view_never_ticks() {
    let mut c = orbit_controller(OrbitKind::Elliptical);
    c.pump(FRAME);
    c.unmount();
    for _ in 0..20 {
        assert_eq!(c.pump(FRAME), 0);
    }
    assert_eq!(c.state(), RunState::Stopped);
    assert!(c.frame().is_none());
}

fn moon_controller(speed: f64) -> Controller<MoonSim> {
    let mut c = Controller::new("moon");
    c.mount(MoonSim::new(29.5).unwrap(), MountOptions { speed, ..MountOptions::default() });
    c
}

#[test]
fn moon_advances_half_a_day_per_tick_and_wraps() {
    let mut c = moon_controller(1.0);
    for _ in 0..10 {
        c.pump(MOON_TICK);
    }
    let f = c.frame().unwrap();
    assert_eq!(f.cycle_day, 5.0);
    assert_eq!(f.phase_index, 1);
    assert_eq!(f.day_label(), "Day 5 of 29.5");

    for _ in 10..59 {
        c.pump(MOON_TICK);
    }
    let f = c.frame().unwrap();
    assert_eq!(f.cycle_day, 0.0);
    assert_eq!(f.phase_name, "New Moon");
}

#[test]
fn moon_phase_index_never_skips_backwards_within_a_cycle() {
    let mut c = moon_controller(3.0);
    let mut last = 0;
    let mut seen = [false; 8];
    // 1.5 days per tick, 19 ticks stay inside the first 29.5 days
    for _ in 0..19 {
        c.pump(MOON_TICK);
        let idx = c.frame().unwrap().phase_index;
        assert!(idx >= last);
        seen[idx as usize] = true;
        last = idx;
    }
    assert!(seen[1..].iter().all(|s| *s));
}

#[test]
fn moon_speed_is_clamped() {
    let mut c = moon_controller(10.0);
    assert_eq!(c.speed(), Some(3.0));
    c.set_speed(0.0);
    assert_eq!(c.speed(), Some(0.5));
    c.set_speed(-2.0);
    assert_eq!(c.speed(), Some(0.5));
}

#[test]
fn moon_view_opens_on_configured_day() {
    let mut s = Settings::default();
    s.moon.initial_phase = 14.75;
    let mut c = Controller::new("moon");
    c.mount(
        s.moon_sim().unwrap(),
        MountOptions {
            start_at: s.moon.initial_phase,
            ..MountOptions::default()
        },
    );
    let f = c.frame().unwrap();
    assert_eq!(f.phase_name, "Full Moon");
    assert_eq!(f.day_label(), "Day 14 of 29.5");

    // beyond one cycle folds back into it
    c.mount(
        s.moon_sim().unwrap(),
        MountOptions {
            start_at: 29.5 + 7.375,
            ..MountOptions::default()
        },
    );
    assert_eq!(c.frame().unwrap().phase_index, 2);
}

#[test]
fn calendar_phase_is_a_pure_function_of_the_instant() {
    let at = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
    let first = real_world_phase_index(at);
    for _ in 0..5 {
        assert_eq!(real_world_phase_index(at), first);
    }
    assert_eq!(PhaseBrowser::new(at).phase, first);
}

#[test]
fn browser_tour_ends_on_new_moon() {
    let at = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
    let mut b = PhaseBrowser::new(at);
    assert!(b.tour.start());
    for _ in 0..20 {
        b.pump(Duration::from_secs(1));
    }
    assert_eq!(b.phase, 0);
    assert!(!b.tour.is_running());
}

#[test]
fn bad_settings_fail_before_anything_runs() {
    let mut s = Settings::default();
    s.orbit.bodies = Some(vec![Body::new("Void", 0.0, 1.0, Rgb::new(0, 0, 0), 1.0)]);
    assert!(matches!(s.validate(), Err(SimError::InvalidRadius { .. })));

    let mut s = Settings::default();
    s.orbit.bodies = Some(Vec::new());
    assert_eq!(s.validate(), Err(SimError::NoBodies));

    let mut s = Settings::default();
    s.orbit.bodies = Some(default_circular_bodies());
    assert!(s.validate().is_ok());
}

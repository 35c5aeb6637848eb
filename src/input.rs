use crate::config::ViewKind;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Key { key: KeyCode, mods: KeyModifiers },
    Focus(bool),
    Resize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    Back,
    HelpToggle,
    NextView,
    TogglePause,
    SpeedUp,
    SpeedDown,
    ScaleUp,
    ScaleDown,
    ToggleModel,
    JumpPhase(u8),
    PrevPhase,
    NextPhase,
    AnimateCycle,
    Reset,
}

pub fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        match event::read()? {
            Event::Key(k) if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat => {
                out.push(InputEvent::Key {
                    key: k.code,
                    mods: k.modifiers,
                });
            }
            Event::FocusGained => out.push(InputEvent::Focus(true)),
            Event::FocusLost => out.push(InputEvent::Focus(false)),
            Event::Resize(_, _) => out.push(InputEvent::Resize),
            _ => {}
        }
        if out.len() >= 32 {
            break;
        }
    }
    Ok(out)
}

pub fn map_key(view: ViewKind, help_open: bool, key: KeyCode, mods: KeyModifiers) -> Option<Action> {
    if matches!(key, KeyCode::Char('c')) && mods.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }
    match key {
        KeyCode::Char('q') | KeyCode::Char('Q') => return Some(Action::Quit),
        KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => {
            return Some(Action::HelpToggle)
        }
        KeyCode::Esc => return Some(Action::Back),
        _ => {}
    }
    if help_open {
        return None;
    }
    if key == KeyCode::Tab {
        return Some(Action::NextView);
    }

    match view {
        ViewKind::Orbit => match key {
            KeyCode::Char(' ') | KeyCode::Char('p') | KeyCode::Char('P') => Some(Action::TogglePause),
            KeyCode::Char('+') | KeyCode::Char('=') => Some(Action::SpeedUp),
            KeyCode::Char('-') | KeyCode::Char('_') => Some(Action::SpeedDown),
            KeyCode::Char(']') => Some(Action::ScaleUp),
            KeyCode::Char('[') => Some(Action::ScaleDown),
            KeyCode::Char('m') | KeyCode::Char('M') => Some(Action::ToggleModel),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::Reset),
            _ => None,
        },
        ViewKind::Moon => match key {
            KeyCode::Char(' ') | KeyCode::Char('p') | KeyCode::Char('P') => Some(Action::TogglePause),
            KeyCode::Char('+') | KeyCode::Char('=') => Some(Action::SpeedUp),
            KeyCode::Char('-') | KeyCode::Char('_') => Some(Action::SpeedDown),
            KeyCode::Char(c @ '1'..='8') => Some(Action::JumpPhase(c as u8 - b'1')),
            KeyCode::Left => Some(Action::PrevPhase),
            KeyCode::Right => Some(Action::NextPhase),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::Reset),
            _ => None,
        },
        ViewKind::Today => match key {
            KeyCode::Left => Some(Action::PrevPhase),
            KeyCode::Right => Some(Action::NextPhase),
            KeyCode::Char('a') | KeyCode::Char('A') => Some(Action::AnimateCycle),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::Reset),
            _ => None,
        },
    }
}

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

use crate::shared::{InputEvent, instrument_for_key};

// poll for input from the terminal and resolve keys into semantic input
// events for the middle layer to handle
pub fn poll_input(timeout: Duration) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(vec![]);
        }
        return Ok(handle_key(key.code));
    }
    Ok(vec![])
}

fn handle_key(code: KeyCode) -> Vec<InputEvent> {
    match code {
        KeyCode::Esc => vec![InputEvent::Quit],
        KeyCode::Char(' ') => vec![InputEvent::PlayPress],
        KeyCode::Enter => vec![InputEvent::ToggleStep],

        KeyCode::Up => vec![InputEvent::CursorUp],
        KeyCode::Down => vec![InputEvent::CursorDown],
        KeyCode::Left => vec![InputEvent::CursorLeft],
        KeyCode::Right => vec![InputEvent::CursorRight],

        // velocity at the cursor, coarse and fine
        KeyCode::Char('[') => vec![InputEvent::NudgeVelocity(-5)],
        KeyCode::Char(']') => vec![InputEvent::NudgeVelocity(5)],
        KeyCode::Char('{') => vec![InputEvent::NudgeVelocity(-1)],
        KeyCode::Char('}') => vec![InputEvent::NudgeVelocity(1)],

        // tempo, coarse and fine
        KeyCode::Char('-') => vec![InputEvent::NudgeBpm(-5)],
        KeyCode::Char('=') => vec![InputEvent::NudgeBpm(5)],
        KeyCode::Char('_') => vec![InputEvent::NudgeBpm(-1)],
        KeyCode::Char('+') => vec![InputEvent::NudgeBpm(1)],

        KeyCode::Char('c') => vec![InputEvent::ClearPattern],
        KeyCode::Char('e') => vec![InputEvent::ExportPattern],
        KeyCode::Char('r') => vec![InputEvent::ReloadSamples],

        // everything else: maybe a live pad key for one of the instruments
        KeyCode::Char(c) => match instrument_for_key(c) {
            Some(row) => vec![InputEvent::TriggerPad(row)],
            None => vec![],
        },

        _ => vec![],
    }
}

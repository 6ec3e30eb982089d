use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::shared::{DisplayState, INSTRUMENTS, NUM_STEPS};

const CELL: &str = "   ";
const CURSOR_CELL: &str = "[ ]";

pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                           // transport line
            Constraint::Length(INSTRUMENTS.len() as u16 + 2), // grid
            Constraint::Length(2),                           // key help
        ])
        .split(area);

    draw_transport(frame, sections[0], state);
    draw_grid(frame, sections[1], state);
    draw_help(frame, sections[2]);
}

fn draw_transport(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let transport = if state.playing {
        Span::styled(" PLAYING ", Style::default().fg(Color::Black).bg(Color::Rgb(0xff, 0x98, 0x00)))
    } else {
        Span::styled(" STOPPED ", Style::default().fg(Color::White).bg(Color::Rgb(0xd3, 0x2f, 0x2f)))
    };

    let (row, idx) = state.cursor;
    let step = state.pattern.step(row, idx);
    let line = Line::from(vec![
        transport,
        Span::raw(format!("  BPM {:>3}", state.bpm)),
        Span::raw(format!("  {} · step {:>2} · vel {:>3}", INSTRUMENTS[row].name, idx + 1, step.velocity())),
        Span::raw("  "),
        Span::styled(state.status.as_str(), Style::default().fg(Color::Gray)),
    ]);

    let block = Block::default().borders(Borders::ALL).title(" stepbox ");
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_grid(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let mut lines = Vec::with_capacity(INSTRUMENTS.len());

    for (row, inst) in INSTRUMENTS.iter().enumerate() {
        let mut spans = Vec::with_capacity(NUM_STEPS + 1);

        let label_style = if state.loaded[row] {
            Style::default().fg(rgb(inst.color))
        } else {
            // no sample: the row still sequences visually, it just can't sound
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!("{:>10} ", inst.name), label_style));

        for idx in 0..NUM_STEPS {
            let step = state.pattern.step(row, idx);
            let mut bg = if step.active {
                velocity_color(step.velocity())
            } else if idx % 4 == 0 {
                (0x44, 0x44, 0x44) // beat marker
            } else {
                (0x2a, 0x2a, 0x2a)
            };

            if state.playing_step == Some(idx as u8) {
                bg = lighten(bg);
            }

            let text = if state.cursor == (row, idx) { CURSOR_CELL } else { CELL };
            let mut style = Style::default().bg(rgb(bg)).fg(Color::White);
            if state.cursor == (row, idx) {
                style = style.add_modifier(Modifier::BOLD);
            }
            spans.push(Span::styled(text, style));
        }

        lines.push(Line::from(spans));
    }

    // the flash pulse lives on the grid border, fading back to dark
    let border = match state.flash {
        Some(flash) => rgb(scale(flash.color, flash.alpha / 0.4)),
        None => Color::DarkGray,
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Line::from(Span::styled(
        " space play/stop · arrows move · enter toggle · [/] velocity · -/= bpm · 1-0 pads · c clear · e export · r reload · esc quit",
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(help), area);
}

// velocity bands: soft cyan, medium yellow, hard red
fn velocity_color(velocity: u8) -> (u8, u8, u8) {
    if velocity < 50 {
        (0x00, 0xbc, 0xd4)
    } else if velocity < 100 {
        (0xff, 0xeb, 0x3b)
    } else {
        (0xff, 0x22, 0x22)
    }
}

fn lighten(c: (u8, u8, u8)) -> (u8, u8, u8) {
    let up = |v: u8| v.saturating_add((255 - v) / 2);
    (up(c.0), up(c.1), up(c.2))
}

fn scale(c: (u8, u8, u8), factor: f32) -> (u8, u8, u8) {
    let f = factor.clamp(0.0, 1.0);
    let s = |v: u8| (v as f32 * f) as u8;
    (s(c.0), s(c.1), s(c.2))
}

fn rgb(c: (u8, u8, u8)) -> Color {
    Color::Rgb(c.0, c.1, c.2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn velocity_bands_match_grid_colors() {
        assert_eq!(velocity_color(1), (0x00, 0xbc, 0xd4));
        assert_eq!(velocity_color(49), (0x00, 0xbc, 0xd4));
        assert_eq!(velocity_color(50), (0xff, 0xeb, 0x3b));
        assert_eq!(velocity_color(99), (0xff, 0xeb, 0x3b));
        assert_eq!(velocity_color(100), (0xff, 0x22, 0x22));
        assert_eq!(velocity_color(127), (0xff, 0x22, 0x22));
    }

    #[test]
    fn flash_scales_toward_black() {
        assert_eq!(scale((200, 100, 40), 1.0), (200, 100, 40));
        assert_eq!(scale((200, 100, 40), 0.5), (100, 50, 20));
        assert_eq!(scale((200, 100, 40), 0.0), (0, 0, 0));
    }
}

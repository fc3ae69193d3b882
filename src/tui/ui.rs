//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::CpuState;
use crate::cpu::decode::decode;
use crate::word::{raw_word, WORD_BITS};
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(65),
            Constraint::Percentage(35),
        ])
        .split(frame.area());

    draw_store(frame, chunks[0], app);

    // Right side: registers, status and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Min(3),
            Constraint::Length(6),
        ])
        .split(chunks[1]);

    draw_registers(frame, right_chunks[0], app);
    draw_status(frame, right_chunks[1], app);
    draw_help(frame, right_chunks[2]);
}

/// Draw the store as the CRT showed it: one row per line, bit 0 on the left.
fn draw_store(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let visible_rows = (area.height as usize).saturating_sub(2);
    let next = app.next_fetch();

    let items: Vec<ListItem> = app.cpu.mem()
        .iter()
        .skip(app.mem_scroll)
        .take(visible_rows)
        .map(|(addr, word)| {
            let is_next = next == Some(addr);
            let prefix = if is_next { "▶" } else { " " };
            let bp = if app.breakpoints.contains(&addr) { "●" } else { " " };

            let line_style = if is_next {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if app.breakpoints.contains(&addr) {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            let mut spans = vec![Span::styled(format!("{}{} {:02} ", bp, prefix, addr.value()), line_style)];
            spans.extend(dots(raw_word(word)));
            spans.push(Span::styled(format!("  {:<7} {}", decode(word).to_string(), word), line_style));

            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Store ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

/// Render a raw word as lit and dark dots, most significant raw bit first.
fn dots(raw: u32) -> Vec<Span<'static>> {
    (0..WORD_BITS)
        .rev()
        .map(|bit| {
            if (raw >> bit) & 1 == 1 {
                Span::styled("●", Style::default().fg(Color::Green))
            } else {
                Span::styled("·", Style::default().fg(Color::DarkGray))
            }
        })
        .collect()
}

/// Draw register state.
fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let cpu = &app.cpu;

    let content = vec![
        Line::from(vec![
            Span::raw("CI: "),
            Span::styled(format!("{}", cpu.ci()), Style::default().fg(Color::Yellow)),
        ]),
        Line::from(vec![
            Span::raw("A:  "),
            Span::styled(format!("{}", cpu.acc()), Style::default().fg(Color::White)),
        ]),
        Line::from(dots(raw_word(cpu.acc()))),
        Line::from(vec![
            Span::raw("Cycles: "),
            Span::styled(format!("{}", cpu.cycles()), Style::default().fg(Color::Cyan)),
            Span::raw("   State: "),
            Span::styled(format!("{:?}", cpu.state()), state_style(cpu.state())),
        ]),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("s: Step  r: Run  p: Pause"),
        Line::from("b: Breakpoint  x: Reset  l: Reboot"),
        Line::from("↑↓: Scroll store  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}

/// Get color style for an execution state.
fn state_style(state: CpuState) -> Style {
    match state {
        CpuState::Running => Style::default().fg(Color::Green),
        CpuState::Halted => Style::default().fg(Color::Gray),
        CpuState::Faulted => Style::default().fg(Color::Red),
    }
}

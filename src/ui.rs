use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
};

use flowforge::{clock::PlaybackClock, session::PlaybackState, util::format_duration};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl<C: PlaybackClock> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Practice => render_practice(self, area, buf),
            AppState::Summary => render_summary(self, area, buf),
        }
    }
}

fn render_practice<C: PlaybackClock>(app: &App<C>, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    let settings = &app.settings;
    let session = app.driver.session();
    let frame = &app.frame;

    let header = Paragraph::new(Line::from(vec![
        Span::styled(settings.beat.title.clone(), bold_style),
        Span::raw(format!(
            "  ·  {:.0} bpm  ·  {}  ·  {}",
            settings.bpm.get(),
            settings.frequency,
            settings.difficulty
        )),
    ]))
    .alignment(Alignment::Center);
    header.render(chunks[0], buf);

    let word_line = match (session.state(), frame.current_word.as_deref()) {
        (PlaybackState::Stopped, None) => Line::from(Span::styled(
            "press space to start",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::ITALIC),
        )),
        (_, None) => Line::from(Span::styled("get ready…", italic_style)),
        (_, Some(word)) => {
            let style = if frame.show_word {
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                bold_style
            };
            Line::from(Span::styled(word.to_uppercase(), style))
        }
    };
    Paragraph::new(word_line)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
        .render(chunks[2], buf);

    if let Some(next) = session.next_word() {
        Paragraph::new(Span::styled(format!("next: {next}"), dim_style))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
    }

    let until_next = (frame.next_boundary - frame.elapsed).max(0.0);
    Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" interval "))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(frame.interval_progress.clamp(0.0, 1.0))
        .label(format!("bar {}  ·  next word in {:.1}s", frame.bar_count, until_next))
        .render(chunks[4], buf);

    let total = settings
        .duration_secs
        .map(|d| format!(" / {}", format_duration(d)))
        .unwrap_or_default();
    let status = match session.state() {
        PlaybackState::Playing => "playing",
        PlaybackState::Paused => "paused",
        PlaybackState::Stopped => "stopped",
    };
    Paragraph::new(Line::from(vec![
        Span::styled(status, italic_style),
        Span::raw(format!(
            "  {}{}  ·  {} prompts",
            format_duration(frame.elapsed),
            total,
            frame.prompt_count
        )),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[5], buf);

    Paragraph::new(Span::styled(
        "(space) play/pause  (s)top  (1/2/3) difficulty  (f)requency  (+/-) bpm  (esc)ape",
        italic_style,
    ))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .render(chunks[6], buf);
}

fn render_summary<C: PlaybackClock>(app: &App<C>, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(Span::styled(
        "Session complete",
        bold_style.fg(Color::Green),
    ))
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    let Some(summary) = &app.summary else {
        return;
    };

    Paragraph::new(vec![
        Line::from(format!(
            "{}  ·  {:.0} bpm  ·  {}",
            app.settings.beat.title,
            app.settings.bpm.get(),
            app.settings.difficulty
        )),
        Line::from(format!(
            "{} practiced  ·  {} prompts",
            format_duration(summary.duration_secs),
            summary.prompt_count
        )),
    ])
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    let words = if summary.words.is_empty() {
        String::from("no words this time")
    } else {
        summary.words.join("  ·  ")
    };
    Paragraph::new(words)
        .block(Block::default().borders(Borders::ALL).title(" words "))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);

    Paragraph::new(Span::styled("(r)estart  (q)uit  (esc)ape", italic_style))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
}

//! Main application logic for the terminal board.
//!
//! `BoardApp` shows the categorised week as one scrolling list: a header line
//! per section followed by its tasks. It subscribes to the store, so every
//! change made through the service re-categorises the board before the next
//! frame.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Datelike, Local, NaiveDate};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::categorizer::{categorize, Section};
use crate::db::{SubscriptionId, TaskStore};
use crate::fields::{Category, ManualSlot, Priority};
use crate::locale::{Locale, Localizer};
use crate::render::{format_due_relative, task_line};
use crate::service::{Completion, TaskService};
use crate::task::{format_due_time, Task};
use crate::tui::colors::*;
use crate::tui::utils::centered_rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Board,
    Detail,
    ConfirmDelete,
}

pub struct BoardApp<'a, S: TaskStore> {
    service: &'a mut TaskService<S>,
    locale: Locale,
    /// Latest task list pushed by the store subscription, not yet applied.
    snapshot: Rc<RefCell<Option<Vec<Task>>>>,
    subscription: SubscriptionId,
    tasks: Vec<Task>,
    sections: Vec<Section>,
    /// Index into the flattened task rows (headers excluded).
    selected: usize,
    mode: Mode,
    status_message: String,
    today: NaiveDate,
}

impl<'a, S: TaskStore> BoardApp<'a, S> {
    pub fn new(service: &'a mut TaskService<S>, locale: Locale, now: DateTime<Local>) -> Self {
        let snapshot: Rc<RefCell<Option<Vec<Task>>>> = Rc::default();
        let sink = Rc::clone(&snapshot);
        let owner = service.owner().to_string();
        let subscription = service
            .store_mut()
            .subscribe(&owner, Box::new(move |tasks| *sink.borrow_mut() = Some(tasks.to_vec())));

        let mut app = BoardApp {
            service,
            locale,
            snapshot,
            subscription,
            tasks: Vec::new(),
            sections: Vec::new(),
            selected: 0,
            mode: Mode::Board,
            status_message: String::new(),
            today: now.date_naive(),
        };
        app.refresh(now);
        app
    }

    /// Apply any pending snapshot and re-categorise as of `now`.
    fn refresh(&mut self, now: DateTime<Local>) {
        let fresh = self.snapshot.borrow_mut().take();
        if let Some(tasks) = fresh {
            self.tasks = tasks;
        }
        self.today = now.date_naive();
        self.sections = categorize(&self.tasks, now.naive_local());
        let count = self.row_count();
        if self.selected >= count {
            self.selected = count.saturating_sub(1);
        }
    }

    fn row_count(&self) -> usize {
        self.sections.iter().map(Section::task_count).sum()
    }

    fn selected_entry(&self) -> Option<(&Section, &Task)> {
        self.sections
            .iter()
            .flat_map(|s| s.tasks.iter().map(move |t| (s, t)))
            .nth(self.selected)
    }

    fn is_today(&self, category: Category) -> bool {
        category == Category::Day(self.today.weekday())
    }

    fn set_status_message(&mut self, msg: String) {
        self.status_message = msg;
    }

    fn move_selection(&mut self, forward: bool) {
        let count = self.row_count();
        if count == 0 {
            return;
        }
        self.selected = if forward {
            (self.selected + 1).min(count - 1)
        } else {
            self.selected.saturating_sub(1)
        };
    }

    /// Move to the first task of the next or previous section.
    fn jump_section(&mut self, forward: bool) {
        let starts: Vec<usize> = self
            .sections
            .iter()
            .scan(0, |start, s| {
                let this = *start;
                *start += s.task_count();
                Some(this)
            })
            .collect();
        let current = starts.iter().rposition(|&s| s <= self.selected).unwrap_or(0);
        let target = if forward {
            (current + 1).min(starts.len().saturating_sub(1))
        } else {
            current.saturating_sub(1)
        };
        if let Some(&start) = starts.get(target) {
            self.selected = start;
        }
    }

    fn toggle_selected(&mut self, now: DateTime<Local>) {
        let Some((section, task)) = self.selected_entry() else {
            return;
        };
        if task.is_daily() && !self.is_today(section.category) {
            self.set_status_message("Daily tasks are completed from today's section".to_string());
            return;
        }
        let id = task.id.clone();
        let msg = match self.service.toggle(&id, now) {
            Ok(Completion::Completed) => "Task marked as completed".to_string(),
            Ok(Completion::Reopened) => "Task reopened".to_string(),
            Ok(Completion::Advanced { next_due: Some(next) }) => format!("Next occurrence due {next}"),
            Ok(Completion::Advanced { next_due: None }) => "Moved to next occurrence".to_string(),
            Err(e) => format!("Error: {e}"),
        };
        self.set_status_message(msg);
        self.refresh(now);
    }

    fn set_selected_slot(&mut self, slot: Option<ManualSlot>, now: DateTime<Local>) {
        let Some((_, task)) = self.selected_entry() else {
            return;
        };
        let id = task.id.clone();
        let msg = match self.service.set_slot(&id, slot, now) {
            Ok(_) => match slot {
                Some(s) => format!("Pinned to {}", s.label()),
                None => "Back to automatic ordering".to_string(),
            },
            Err(e) => format!("Error: {e}"),
        };
        self.set_status_message(msg);
        self.refresh(now);
    }

    fn delete_selected(&mut self, now: DateTime<Local>) {
        let Some((_, task)) = self.selected_entry() else {
            return;
        };
        let id = task.id.clone();
        let msg = match self.service.delete(&id, now) {
            Ok(()) => "Task deleted".to_string(),
            Err(e) => format!("Error: {e}"),
        };
        self.set_status_message(msg);
        self.refresh(now);
    }

    /// Handle one key press. Returns true when the app should exit.
    fn handle_key(&mut self, code: KeyCode, now: DateTime<Local>) -> bool {
        match self.mode {
            Mode::ConfirmDelete => {
                self.mode = Mode::Board;
                if code == KeyCode::Char('y') {
                    self.delete_selected(now);
                } else {
                    self.set_status_message("Delete cancelled".to_string());
                }
                return false;
            }
            Mode::Detail => {
                if matches!(code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                    self.mode = Mode::Board;
                }
                return false;
            }
            Mode::Board => {}
        }

        self.status_message.clear();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(true),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(false),
            KeyCode::Right | KeyCode::Tab => self.jump_section(true),
            KeyCode::Left | KeyCode::BackTab => self.jump_section(false),
            KeyCode::Enter => {
                if self.selected_entry().is_some() {
                    self.mode = Mode::Detail;
                }
            }
            KeyCode::Char(' ') | KeyCode::Char('x') => self.toggle_selected(now),
            KeyCode::Char(c @ '0'..='3') => {
                let slot = c.to_digit(10).and_then(|d| ManualSlot::from_position(d as u8));
                self.set_selected_slot(slot, now);
            }
            KeyCode::Char('a') => self.set_selected_slot(None, now),
            KeyCode::Char('d') => {
                if let Some((_, task)) = self.selected_entry() {
                    let prompt = format!("Delete '{}'? (y/n)", task.description);
                    self.set_status_message(prompt);
                    self.mode = Mode::ConfirmDelete;
                }
            }
            KeyCode::Char('l') => {
                self.locale = match self.locale {
                    Locale::English => Locale::Hebrew,
                    Locale::Hebrew => Locale::English,
                };
            }
            _ => {}
        }
        false
    }

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Board
                Constraint::Length(1), // Status bar
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_board(f, chunks[1]);
        self.render_status_bar(f, chunks[2]);

        if self.mode == Mode::Detail {
            self.render_detail_popup(f);
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let context = format!(
            "{}  {}  owner: {}",
            self.locale.category(Category::Day(self.today.weekday())),
            self.today,
            self.service.owner()
        );
        let header_text = vec![Line::from(vec![
            Span::styled("MY TODO", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(context, Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC)),
        ])];
        let header = Paragraph::new(header_text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header, area);
    }

    fn render_board(&self, f: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title(" Week ");
        if self.sections.is_empty() {
            let empty = Paragraph::new("No tasks. Add one with `todo add`.")
                .block(block)
                .alignment(Alignment::Center);
            f.render_widget(empty, area);
            return;
        }

        let mut items = Vec::new();
        let mut selected_row = None;
        let mut index = 0;
        for section in &self.sections {
            let color = section_color(section.category, self.is_today(section.category));
            let header = format!("{} ({})", section.title(&self.locale), section.task_count());
            items.push(ListItem::new(Line::from(Span::styled(
                header,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))));
            for task in &section.tasks {
                if index == self.selected {
                    selected_row = Some(items.len());
                }
                let style = if task.is_completed {
                    Style::default().fg(ASH).add_modifier(Modifier::CROSSED_OUT)
                } else if task.priority_level() == Priority::High {
                    Style::default().fg(DARK_RED)
                } else {
                    Style::default()
                };
                items.push(ListItem::new(Line::from(Span::styled(
                    task_line(task, &self.locale, self.today),
                    style,
                ))));
                index += 1;
            }
        }

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(SELECTED_BG).add_modifier(Modifier::BOLD));
        let mut state = ListState::default().with_selected(selected_row);
        f.render_stateful_widget(list, area, &mut state);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            format!(
                "Tasks: {} | space: Toggle done | 0-3: Slot | a: Auto | d: Delete | Enter: Details | l: Language | q: Quit",
                self.row_count()
            )
        };
        let status = Paragraph::new(status_text)
            .style(Style::default().bg(STATUS_BAR_BG).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    fn render_detail_popup(&self, f: &mut Frame) {
        let Some((section, task)) = self.selected_entry() else {
            return;
        };
        let area = centered_rect(60, 60, f.area());
        let due = match task.due_date {
            Some(d) => format!("{d} ({})", format_due_relative(d, self.today)),
            None => "-".into(),
        };
        let mut lines = vec![
            Line::from(Span::styled(
                task.description.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!("Section:   {}", section.title(&self.locale))),
            Line::from(format!("Due:       {due}")),
            Line::from(format!(
                "Time:      {}",
                task.due_time.map(format_due_time).unwrap_or_else(|| "-".into())
            )),
            Line::from(format!(
                "Repeats:   {}",
                task.recurrence().map(|r| self.locale.recurrence(&r)).unwrap_or_else(|| "-".into())
            )),
            Line::from(format!("Priority:  {}", task.priority_level().label())),
            Line::from(format!(
                "Slot:      {}",
                task.manual_position
                    .and_then(ManualSlot::from_position)
                    .map(ManualSlot::label)
                    .unwrap_or("auto")
            )),
        ];
        if task.is_externally_sourced() {
            lines.push(Line::from(format!(
                "Source:    FamilySync {}",
                task.provenance.source_task_id.as_deref().unwrap_or("-")
            )));
        }
        lines.push(Line::from(format!("ID:        {}", task.id)));

        let popup = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(" Task "))
            .wrap(Wrap { trim: false });
        f.render_widget(Clear, area);
        f.render_widget(popup, area);
    }

    /// Main event loop.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if event::poll(Duration::from_millis(250))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press && self.handle_key(key.code, Local::now()) {
                        break;
                    }
                }
            } else {
                self.refresh(Local::now());
            }
        }
        Ok(())
    }
}

impl<S: TaskStore> Drop for BoardApp<'_, S> {
    fn drop(&mut self) {
        self.service.store_mut().unsubscribe(self.subscription);
    }
}

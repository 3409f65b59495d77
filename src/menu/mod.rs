//! Hierarchical menu on the character LCD.
//!
//! Menus are static tables of [`MenuEntry`] over an application context
//! `C`. The state machine only ever moves cursors on a bounded stack of
//! [`Frame`]s; the tables themselves are never mutated.
//!
//! Row layout (20 columns):
//!
//! ```text
//!  col 0      : marker  (' ', '→' selected, '*' editing)
//!  col 1..    : label
//!  col 14..19 : value + unit, submenu '>' or return '←', right aligned
//! ```

pub mod stock;


use core::fmt::Write;

use heapless::{String, Vec};

use crate::config::{LCD_COLUMNS, MENU_MAX_DEPTH, MENU_VALUE_COLUMN, MENU_VISIBLE_ROWS};
use crate::lcd::{TextSink, BACK_ARROW, EDIT_MARKER, SELECT_MARKER, SUBMENU_MARKER};

const _: () = assert!(MENU_MAX_DEPTH >= 1);

/// Byte capacity of one rendered row (20 chars, some of them multi-byte).
const ROW_BYTES: usize = 64;

/// Width of the right-aligned value field.
const VALUE_WIDTH: usize = (LCD_COLUMNS - MENU_VALUE_COLUMN) as usize;

/// One line of a menu table.
pub enum MenuEntry<C: 'static> {
    /// Runs `action` on press.
    Simple {
        label: &'static str,
        action: fn(&mut C),
    },
    /// Opens `entries` one level deeper.
    Submenu {
        label: &'static str,
        entries: &'static [MenuEntry<C>],
    },
    /// Editable number. `value(ctx, delta)` applies `delta` (owning clamping
    /// and wraparound) and returns the new value; a delta of 0 only reads.
    /// `changed` runs after every adjustment.
    Number {
        label: &'static str,
        unit: char,
        value: fn(&mut C, i8) -> i32,
        changed: fn(&mut C),
    },
    /// Goes back one level.
    Return { label: &'static str },
    /// Read-only text. Editing text is not supported; pressing does nothing.
    Text {
        label: &'static str,
        text: &'static str,
    },
}

impl<C: 'static> MenuEntry<C> {
    pub fn label(&self) -> &'static str {
        match *self {
            MenuEntry::Simple { label, .. }
            | MenuEntry::Submenu { label, .. }
            | MenuEntry::Number { label, .. }
            | MenuEntry::Return { label }
            | MenuEntry::Text { label, .. } => label,
        }
    }
}

/// Input to the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuEvent {
    Press,
    Back,
    /// Negative moves up, positive moves down.
    Rotate(i8),
}

/// Cursor state of one menu level.
pub struct Frame<C: 'static> {
    entries: &'static [MenuEntry<C>],
    selected: usize,
    first: usize,
    editing: bool,
}

// Manual impls: a derive would require `C: Copy`.
impl<C: 'static> Clone for Frame<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: 'static> Copy for Frame<C> {}

impl<C: 'static> Frame<C> {
    const fn new(entries: &'static [MenuEntry<C>]) -> Self {
        Self {
            entries,
            selected: 0,
            first: 0,
            editing: false,
        }
    }

    fn entry(&self) -> Option<&'static MenuEntry<C>> {
        self.entries.get(self.selected)
    }

    /// Screen row of the selected entry.
    fn selected_row(&self) -> u8 {
        (self.selected - self.first) as u8
    }

    fn marker(&self) -> char {
        if self.editing {
            EDIT_MARKER
        } else {
            SELECT_MARKER
        }
    }
}

/// The menu state machine.
pub struct Menu<C: 'static> {
    root: Frame<C>,
    nested: Vec<Frame<C>, { MENU_MAX_DEPTH - 1 }>,
}

impl<C: 'static> Menu<C> {
    pub fn new(root: &'static [MenuEntry<C>]) -> Self {
        Self {
            root: Frame::new(root),
            nested: Vec::new(),
        }
    }

    fn frame(&self) -> &Frame<C> {
        self.nested.last().unwrap_or(&self.root)
    }

    fn frame_mut(&mut self) -> &mut Frame<C> {
        match self.nested.last_mut() {
            Some(frame) => frame,
            None => &mut self.root,
        }
    }

    /// Number of open levels, root included.
    pub fn depth(&self) -> usize {
        1 + self.nested.len()
    }

    pub fn selected(&self) -> usize {
        self.frame().selected
    }

    pub fn first_visible(&self) -> usize {
        self.frame().first
    }

    pub fn is_editing(&self) -> bool {
        self.frame().editing
    }

    pub fn entries(&self) -> &'static [MenuEntry<C>] {
        self.frame().entries
    }

    pub fn selected_entry(&self) -> Option<&'static MenuEntry<C>> {
        self.frame().entry()
    }

    /// Feed one input event.
    pub fn dispatch(&mut self, ctx: &mut C, lcd: &mut impl TextSink, event: MenuEvent) {
        if self.is_editing() {
            self.dispatch_editing(ctx, lcd, event);
        } else {
            self.dispatch_browsing(ctx, lcd, event);
        }
    }

    fn dispatch_browsing(&mut self, ctx: &mut C, lcd: &mut impl TextSink, event: MenuEvent) {
        match event {
            MenuEvent::Press => match self.selected_entry() {
                Some(&MenuEntry::Simple { label, action }) => {
                    debug!("Menu: action {}", label);
                    action(ctx);
                }
                Some(&MenuEntry::Submenu { entries, .. }) => self.push(ctx, lcd, entries),
                Some(MenuEntry::Return { .. }) => self.pop(ctx, lcd),
                Some(MenuEntry::Number { .. }) => {
                    self.frame_mut().editing = true;
                    self.draw_selected_row(ctx, lcd);
                }
                Some(&MenuEntry::Text { label, .. }) => {
                    debug!("Menu: {} is read-only", label);
                }
                None => {}
            },
            MenuEvent::Back => self.pop(ctx, lcd),
            MenuEvent::Rotate(delta) => self.scroll(ctx, lcd, delta),
        }
    }

    fn dispatch_editing(&mut self, ctx: &mut C, lcd: &mut impl TextSink, event: MenuEvent) {
        match event {
            MenuEvent::Press | MenuEvent::Back => {
                self.frame_mut().editing = false;
                self.draw_selected_row(ctx, lcd);
            }
            MenuEvent::Rotate(0) => {}
            MenuEvent::Rotate(delta) => {
                if let Some(&MenuEntry::Number { value, changed, .. }) = self.selected_entry() {
                    value(ctx, delta);
                    changed(ctx);
                    self.draw_selected_row(ctx, lcd);
                }
            }
        }
    }

    fn push(&mut self, ctx: &mut C, lcd: &mut impl TextSink, entries: &'static [MenuEntry<C>]) {
        if self.nested.push(Frame::new(entries)).is_err() {
            warn!("Menu: max depth {} reached, submenu ignored", MENU_MAX_DEPTH);
            return;
        }
        self.redraw(ctx, lcd);
    }

    fn pop(&mut self, ctx: &mut C, lcd: &mut impl TextSink) {
        if self.nested.pop().is_some() {
            self.redraw(ctx, lcd);
        }
    }

    fn scroll(&mut self, ctx: &mut C, lcd: &mut impl TextSink, delta: i8) {
        let frame = self.frame_mut();
        let old_row = frame.selected_row();
        if delta < 0 && frame.selected > 0 {
            frame.selected -= 1;
            if frame.selected < frame.first {
                frame.first = frame.selected;
                self.redraw(ctx, lcd);
                return;
            }
        } else if delta > 0 && frame.selected + 1 < frame.entries.len() {
            frame.selected += 1;
            if frame.selected >= frame.first + MENU_VISIBLE_ROWS {
                frame.first = frame.selected + 1 - MENU_VISIBLE_ROWS;
                self.redraw(ctx, lcd);
                return;
            }
        } else {
            return;
        }
        let new_row = frame.selected_row();
        lcd.write_char(0, old_row, ' ');
        lcd.write_char(0, new_row, SELECT_MARKER);
    }

    /// Draw every visible row of the current level.
    pub fn redraw(&self, ctx: &mut C, lcd: &mut impl TextSink) {
        let frame = self.frame();
        for row in 0..MENU_VISIBLE_ROWS {
            let index = frame.first + row;
            let line = match frame.entries.get(index) {
                Some(entry) => {
                    let marker = if index == frame.selected { frame.marker() } else { ' ' };
                    render_row(ctx, entry, marker)
                }
                None => render_blank(),
            };
            lcd.write_at(0, row as u8, &line);
        }
    }

    fn draw_selected_row(&self, ctx: &mut C, lcd: &mut impl TextSink) {
        let frame = self.frame();
        if let Some(entry) = frame.entry() {
            lcd.write_at(0, frame.selected_row(), &render_row(ctx, entry, frame.marker()));
        }
    }
}

fn render_blank() -> String<ROW_BYTES> {
    let mut line = String::new();
    pad_to(&mut line, LCD_COLUMNS as usize);
    line
}

/// Render one full-width row.
fn render_row<C: 'static>(ctx: &mut C, entry: &MenuEntry<C>, marker: char) -> String<ROW_BYTES> {
    let mut tail: String<ROW_BYTES> = String::new();
    // Overflow only truncates the tail.
    let _ = match *entry {
        MenuEntry::Number { unit, value, .. } => {
            write!(tail, "{:>w$}{}", value(ctx, 0), unit, w = VALUE_WIDTH - 1)
        }
        MenuEntry::Text { text, .. } => write!(tail, "{:>w$}", text, w = VALUE_WIDTH),
        MenuEntry::Submenu { .. } => write!(tail, "{:>w$}", SUBMENU_MARKER, w = VALUE_WIDTH),
        MenuEntry::Return { .. } => write!(tail, "{:>w$}", BACK_ARROW, w = VALUE_WIDTH),
        MenuEntry::Simple { .. } => Ok(()),
    };

    let columns = LCD_COLUMNS as usize;
    let tail_len = tail.chars().count().min(columns - 1);
    let label_end = columns - tail_len;

    let mut line: String<ROW_BYTES> = String::new();
    let _ = line.push(marker);
    for ch in entry.label().chars().take(label_end - 1) {
        let _ = line.push(ch);
    }
    pad_to(&mut line, label_end);
    for ch in tail.chars().take(tail_len) {
        let _ = line.push(ch);
    }
    pad_to(&mut line, columns);
    line
}

fn pad_to(line: &mut String<ROW_BYTES>, columns: usize) {
    let mut len = line.chars().count();
    while len < columns {
        if line.push(' ').is_err() {
            break;
        }
        len += 1;
    }
}

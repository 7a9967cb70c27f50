//! Terminal front-end
//!
//! Raw-mode, alternate-screen presentation with mouse capture. The
//! [`TerminalGuard`] restores the terminal on drop, including on panic.

use std::io::{self, Stdout, Write};

use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::{cursor, execute, queue};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::DeckError;
use crate::input::{Key, PointerButton, RawInput};

use super::layout::{self, Tone};
use super::{FrontendEvent, Renderer, View};

/// Puts the terminal into presentation mode and restores it on drop.
#[derive(Debug)]
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    /// Enables raw mode, the alternate screen, and mouse capture.
    ///
    /// # Errors
    ///
    /// Returns `DeckError::Terminal` if stdout is not a usable terminal.
    pub fn enter() -> Result<Self, DeckError> {
        install_panic_hook();
        terminal::enable_raw_mode().map_err(terminal_error)?;
        let guard = Self { _private: () };
        execute!(
            io::stdout(),
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide
        )
        .map_err(terminal_error)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore();
    }
}

fn restore() {
    let _ = execute!(
        io::stdout(),
        DisableMouseCapture,
        terminal::LeaveAlternateScreen,
        cursor::Show
    );
    let _ = terminal::disable_raw_mode();
}

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore();
        previous(info);
    }));
}

fn terminal_error(e: io::Error) -> DeckError {
    DeckError::Terminal(e.to_string())
}

/// Converts a terminal event into a front-end event.
///
/// Quit keys are handled here, before the input adapter sees anything.
#[must_use]
pub fn map_event(event: &Event) -> Option<FrontendEvent> {
    match event {
        Event::Key(key) => map_key(key),
        Event::Mouse(mouse) => map_mouse(mouse),
        Event::Resize(..) => Some(FrontendEvent::Redraw),
        _ => None,
    }
}

fn map_key(key: &KeyEvent) -> Option<FrontendEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let event = match key.code {
        KeyCode::Esc | KeyCode::Char('q') => FrontendEvent::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            FrontendEvent::Quit
        }
        KeyCode::Enter => FrontendEvent::Trigger,
        KeyCode::Right => FrontendEvent::Input(RawInput::Key(Key::ArrowRight)),
        KeyCode::Left => FrontendEvent::Input(RawInput::Key(Key::ArrowLeft)),
        KeyCode::Char(' ') => FrontendEvent::Input(RawInput::Key(Key::Space)),
        other => FrontendEvent::Input(RawInput::Key(Key::Other(format!("{other:?}")))),
    };
    Some(event)
}

/// Terminals report only left, middle and right buttons, so the back and
/// forward side buttons never arrive here. Headless `button 3` / `button 4`
/// is the only way to exercise them.
fn map_mouse(mouse: &MouseEvent) -> Option<FrontendEvent> {
    let MouseEventKind::Down(button) = mouse.kind else {
        return None;
    };
    let button = match button {
        MouseButton::Left => PointerButton::PRIMARY,
        MouseButton::Middle => PointerButton::AUXILIARY,
        MouseButton::Right => PointerButton::SECONDARY,
    };
    Some(FrontendEvent::Input(RawInput::Pointer(button)))
}

/// Spawns a task that forwards terminal events into `tx` until `cancel`
/// fires, the stream ends, or the receiver is dropped.
pub fn spawn_event_reader(
    tx: mpsc::UnboundedSender<FrontendEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut events = EventStream::new();
        loop {
            let next = tokio::select! {
                () = cancel.cancelled() => break,
                next = events.next() => next,
            };
            match next {
                Some(Ok(event)) => {
                    if let Some(mapped) = map_event(&event) {
                        if tx.send(mapped).is_err() {
                            break;
                        }
                    }
                }
                Some(Err(e)) => {
                    warn!(error = %e, "terminal event error");
                    break;
                }
                None => break,
            }
        }
        debug!("terminal event reader finished");
    })
}

/// Draws frames with `crossterm`.
#[derive(Debug)]
pub struct TerminalRenderer {
    out: Stdout,
}

impl TerminalRenderer {
    /// Creates a renderer on stdout.
    #[must_use]
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, view: &View<'_>) -> Result<(), DeckError> {
        let (width, height) = terminal::size().map_err(terminal_error)?;
        let accent = parse_hex_color(view.slide.accent()).unwrap_or(Color::Cyan);
        let lines = layout::slide_lines(view, usize::from(width.saturating_sub(4)));

        queue!(self.out, Clear(ClearType::All)).map_err(terminal_error)?;

        let body_height = height.saturating_sub(2);
        let top = body_height.saturating_sub(u16::try_from(lines.len()).unwrap_or(u16::MAX)) / 2;
        for (row, line) in (top..body_height).zip(&lines) {
            let len = u16::try_from(line.text.chars().count()).unwrap_or(width);
            let col = width.saturating_sub(len) / 2;
            queue!(
                self.out,
                cursor::MoveTo(col, row),
                SetForegroundColor(tone_color(line.tone, accent)),
                Print(&line.text)
            )
            .map_err(terminal_error)?;
        }

        let title = &view.deck.deck.title;
        let footer = layout::footer(view);
        let footer_len = u16::try_from(footer.chars().count()).unwrap_or(width);
        queue!(
            self.out,
            SetForegroundColor(Color::DarkGrey),
            cursor::MoveTo(1, height.saturating_sub(1)),
            Print(title),
            cursor::MoveTo(width.saturating_sub(footer_len.saturating_add(1)), height.saturating_sub(1)),
            Print(&footer),
            ResetColor
        )
        .map_err(terminal_error)?;

        self.out.flush().map_err(terminal_error)
    }
}

const fn tone_color(tone: Tone, accent: Color) -> Color {
    match tone {
        Tone::Plain => Color::White,
        Tone::Accent => accent,
        Tone::Muted => Color::DarkGrey,
        Tone::Alert => Color::Rgb {
            r: 0xFF,
            g: 0x2A,
            b: 0x2A,
        },
        Tone::Success => Color::Rgb {
            r: 0x00,
            g: 0xFF,
            b: 0x41,
        },
    }
}

/// Parses `#RRGGBB`.
#[must_use]
pub fn parse_hex_color(value: &str) -> Option<Color> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(Color::Rgb {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
    })
}

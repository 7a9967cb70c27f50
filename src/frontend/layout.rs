//! Slide text layout
//!
//! Turns a [`View`] into styled lines. Pure, so it is tested without a
//! terminal; renderers only decide where and in which colour to put them.

use crate::config::schema::{SlideConfig, SlideKind};
use crate::scenario::ScenarioPhase;
use crate::scenario::engine::FOUND_PREFIX;

use super::View;

/// How a line should be styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Default foreground
    Plain,
    /// Slide accent colour
    Accent,
    /// De-emphasised
    Muted,
    /// Warning red
    Alert,
    /// Success green
    Success,
}

/// One laid-out line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Text, already wrapped to the target width
    pub text: String,
    /// Styling hint
    pub tone: Tone,
}

impl Line {
    fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }

    fn blank() -> Self {
        Self::new("", Tone::Plain)
    }
}

/// Lays out the body of the current slide.
#[must_use]
pub fn slide_lines(view: &View<'_>, width: usize) -> Vec<Line> {
    let width = width.max(8);
    let slide = view.slide;
    let mut out = Vec::new();

    match slide.kind {
        SlideKind::Title => {
            push_opt(&mut out, slide.title.as_deref(), Tone::Plain, width);
            push_opt(&mut out, slide.subtitle.as_deref(), Tone::Accent, width);
            if slide.description.is_some() {
                out.push(Line::blank());
            }
            push_opt(&mut out, slide.description.as_deref(), Tone::Muted, width);
        }
        SlideKind::Warning => card(&mut out, slide, "!! WARNING !!", Tone::Alert, width),
        SlideKind::Info => card(&mut out, slide, "-- INFO --", Tone::Accent, width),
        SlideKind::List => {
            heading(&mut out, slide, width);
            out.push(Line::blank());
            for point in &slide.bullet_points {
                for (i, line) in wrap(point, width.saturating_sub(2)).into_iter().enumerate() {
                    let bullet = if i == 0 { "• " } else { "  " };
                    out.push(Line::new(format!("{bullet}{line}"), Tone::Plain));
                }
            }
        }
        SlideKind::Iframe => {
            let url = slide.content_url.as_deref().unwrap_or("");
            push_wrapped(&mut out, &format!("LIVE ENVIRONMENT :: {url}"), Tone::Accent, width);
            out.push(Line::blank());
            out.push(Line::new("[embedded page]", Tone::Muted));
        }
        SlideKind::Image => {
            heading(&mut out, slide, width);
            for image in &slide.images {
                out.push(Line::blank());
                push_wrapped(&mut out, &format!("[image] {}", image.url), Tone::Muted, width);
                if let Some(arrow) = image.arrow {
                    out.push(Line::new(
                        format!("{} at {}%, {}%", arrow.direction.glyph(), arrow.x, arrow.y),
                        Tone::Accent,
                    ));
                }
                push_opt(&mut out, image.caption.as_deref(), Tone::Plain, width);
            }
        }
        SlideKind::Scenario => scenario_panel(&mut out, view, width),
    }

    out
}

/// Footer text: position, slide count, lock marker.
#[must_use]
pub fn footer(view: &View<'_>) -> String {
    let mut text = format!("{}/{}", view.position + 1, view.len);
    if view.locked {
        text.push_str("  [LOCKED]");
    }
    text
}

fn scenario_panel(out: &mut Vec<Line>, view: &View<'_>, width: usize) {
    heading(out, view.slide, width);
    out.push(Line::blank());

    let Some(scenario) = view.scenario else {
        out.push(Line::new("[scenario inactive]", Tone::Muted));
        return;
    };

    push_wrapped(out, &format!("TARGET: {}", scenario.target), Tone::Accent, width);
    let status = match scenario.phase {
        ScenarioPhase::Idle => Line::new("press → to start the attack", Tone::Muted),
        ScenarioPhase::Running if scenario.revealed.is_none() => {
            Line::new("ATTACK IN PROGRESS...", Tone::Alert)
        }
        ScenarioPhase::Running | ScenarioPhase::Done => Line::new("ACCESS GRANTED", Tone::Success),
    };
    out.push(status);
    out.push(Line::blank());

    for line in scenario.log.lines() {
        let tone = if line.starts_with("[+]") {
            Tone::Success
        } else {
            Tone::Muted
        };
        out.push(Line::new(truncate(line, width), tone));
    }

    if scenario.phase == ScenarioPhase::Done {
        if let Some(value) = scenario.revealed {
            out.push(Line::blank());
            out.push(Line::new(
                format!("{}{value}", FOUND_PREFIX.trim_start_matches("[+] ")),
                Tone::Success,
            ));
        }
    }
}

fn card(out: &mut Vec<Line>, slide: &SlideConfig, label: &str, tone: Tone, width: usize) {
    out.push(Line::new(label, tone));
    out.push(Line::blank());
    push_opt(out, slide.title.as_deref(), Tone::Muted, width);
    push_opt(out, slide.main_text.as_deref(), Tone::Plain, width);
    push_opt(out, slide.description.as_deref(), Tone::Muted, width);
}

fn heading(out: &mut Vec<Line>, slide: &SlideConfig, width: usize) {
    push_opt(out, slide.title.as_deref(), Tone::Accent, width);
    push_opt(out, slide.main_text.as_deref(), Tone::Plain, width);
    push_opt(out, slide.description.as_deref(), Tone::Muted, width);
}

fn push_opt(out: &mut Vec<Line>, text: Option<&str>, tone: Tone, width: usize) {
    if let Some(text) = text {
        push_wrapped(out, text, tone, width);
    }
}

fn push_wrapped(out: &mut Vec<Line>, text: &str, tone: Tone, width: usize) {
    out.extend(wrap(text, width).into_iter().map(|l| Line::new(l, tone)));
}

/// Greedy word wrap. Words longer than `width` are split.
#[must_use]
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let needed = if current_len == 0 {
            word.len()
        } else {
            current_len + 1 + word.len()
        };
        if needed > width && current_len > 0 {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current_len += word.len();
        current.extend(word);
    }
    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

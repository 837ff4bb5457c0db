//! Presentation: a pure mapping from session state to a [`View`], plus a
//! terminal writer for it.
//!
//! Model text is never interpreted as markup. The only formatting applied is
//! line breaks and `**bold**` spans, turned into [`Segment`]s.

use std::io::{self, Write};

use crate::{
    profile::{Profile, RenderMode},
    session::{Phase, Session},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Bold(String),
    LineBreak,
}

/// Split model text into plain, bold and line-break segments.
///
/// `**x**` becomes `Bold("x")` (shortest match). A bold span may cross line
/// breaks: each of its lines becomes a `Bold` piece separated by
/// `LineBreak`. An unmatched `**` is kept as literal text.
pub fn format_rich_text(mut text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    while let Some(start) = text.find("**") {
        let after = &text[start + 2..];
        let Some(end) = after.find("**") else {
            break;
        };
        push_lines(&text[..start], Segment::Text, &mut segments);
        let span = &after[..end];
        if span.is_empty() {
            segments.push(Segment::Bold(String::new()));
        } else {
            push_lines(span, Segment::Bold, &mut segments);
        }
        text = &after[end + 2..];
    }
    push_lines(text, Segment::Text, &mut segments);
    segments
}

fn push_lines(text: &str, wrap: fn(String) -> Segment, segments: &mut Vec<Segment>) {
    if text.is_empty() {
        return;
    }
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            segments.push(Segment::LineBreak);
        }
        let line = line.strip_suffix('\r').unwrap_or(line);
        if !line.is_empty() {
            segments.push(wrap(line.to_string()));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub key: &'static str,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub body: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Empty,
    Loading(&'static str),
    Cards {
        cards: Vec<Card>,
        footer: &'static str,
    },
    RawJson(String),
    Error(String),
    /// A success with nothing to show for the active profile.
    Notice(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub submit_enabled: bool,
    pub body: Body,
}

/// Derive what to show from the current session state.
pub fn render(session: &Session, profile: &Profile, mode: RenderMode) -> View {
    let body = match session.phase() {
        Phase::Idle => Body::Empty,
        Phase::Submitting => Body::Loading(profile.messages.submitting),
        Phase::Failed(error) => Body::Error(error.user_message(profile)),
        Phase::Success(result) => match mode {
            RenderMode::RawJson => Body::RawJson(result.to_pretty_json()),
            RenderMode::Cards => {
                let cards: Vec<Card> = profile
                    .roles
                    .iter()
                    .filter_map(|role| {
                        result.get(role.key).map(|text| Card {
                            key: role.key,
                            title: role.title,
                            subtitle: role.subtitle,
                            body: format_rich_text(text),
                        })
                    })
                    .collect();
                if cards.is_empty() {
                    Body::Notice(profile.messages.empty_response)
                } else {
                    Body::Cards {
                        cards,
                        footer: profile.messages.results_footer,
                    }
                }
            }
        },
    };
    View {
        submit_enabled: !session.is_submitting(),
        body,
    }
}

const BOLD: &str = "\x1b[1m";
const GOLD: &str = "\x1b[38;5;178m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Writes a [`View`] as plain or ANSI-styled text.
#[derive(Debug, Clone, Copy)]
pub struct TerminalRenderer {
    color: bool,
}

impl TerminalRenderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn style<'a>(&self, code: &'a str) -> &'a str {
        if self.color {
            code
        } else {
            ""
        }
    }

    pub fn write_view(&self, out: &mut impl Write, view: &View) -> io::Result<()> {
        match &view.body {
            Body::Empty => Ok(()),
            Body::Loading(label) => writeln!(out, "{label}"),
            Body::Error(message) => {
                writeln!(out, "{}{message}{}", self.style(RED), self.style(RESET))
            }
            Body::Notice(message) => writeln!(out, "{message}"),
            Body::RawJson(json) => writeln!(out, "{json}"),
            Body::Cards { cards, footer } => {
                for card in cards {
                    self.write_card(out, card)?;
                    writeln!(out)?;
                }
                writeln!(out, "{}{footer}{}", self.style(GOLD), self.style(RESET))
            }
        }
    }

    pub fn write_card(&self, out: &mut impl Write, card: &Card) -> io::Result<()> {
        let (gold, bold, reset) = (self.style(GOLD), self.style(BOLD), self.style(RESET));
        writeln!(out, "{gold}★★★★★{reset}")?;
        writeln!(out, "{gold}{}{reset}", card.subtitle.to_uppercase())?;
        writeln!(out, "{bold}{}{reset}", card.title)?;
        writeln!(out, "{}", "─".repeat(40))?;
        self.write_segments(out, &card.body)?;
        writeln!(out)
    }

    pub fn write_segments(&self, out: &mut impl Write, segments: &[Segment]) -> io::Result<()> {
        for segment in segments {
            match segment {
                Segment::Text(text) => write!(out, "{text}")?,
                Segment::Bold(text) if self.color => write!(out, "{BOLD}{text}{RESET}")?,
                Segment::Bold(text) => write!(out, "{text}")?,
                Segment::LineBreak => writeln!(out)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dispatch::AnalysisResult, profile::PRO};

    fn text(s: &str) -> Segment {
        Segment::Text(s.to_string())
    }

    fn bold(s: &str) -> Segment {
        Segment::Bold(s.to_string())
    }

    #[test]
    fn formats_bold_and_breaks() {
        assert_eq!(
            format_rich_text("**Hook:** open strong\nthen **pause** here"),
            vec![
                bold("Hook:"),
                text(" open strong"),
                Segment::LineBreak,
                text("then "),
                bold("pause"),
                text(" here"),
            ]
        );
    }

    #[test]
    fn bold_is_not_greedy_and_unmatched_stays_literal() {
        assert_eq!(
            format_rich_text("**a** and **b** but **c"),
            vec![bold("a"), text(" and "), bold("b"), text(" but **c")]
        );
        assert_eq!(format_rich_text("****"), vec![bold("")]);
        assert_eq!(format_rich_text(""), Vec::<Segment>::new());
    }

    #[test]
    fn bold_spans_line_breaks() {
        assert_eq!(
            format_rich_text("**Tip:\nsmile** then **go**"),
            vec![
                bold("Tip:"),
                Segment::LineBreak,
                bold("smile"),
                text(" then "),
                bold("go"),
            ]
        );
        assert_eq!(
            format_rich_text("a\r\n**b\n\nc**\n**d"),
            vec![
                text("a"),
                Segment::LineBreak,
                bold("b"),
                Segment::LineBreak,
                Segment::LineBreak,
                bold("c"),
                Segment::LineBreak,
                text("**d"),
            ]
        );
    }

    #[test]
    fn multibyte_text_is_safe() {
        assert_eq!(
            format_rich_text("**במאי** מעולה"),
            vec![bold("במאי"), text(" מעולה")]
        );
    }

    fn settled(json: &str) -> Session {
        let mut session = Session::new();
        session.set_note("x");
        session.begin_submission();
        session.settle(AnalysisResult::parse(json).map_err(|source| {
            crate::dispatch::AnalyzeError::MalformedResponse { source }
        }));
        session
    }

    #[test]
    fn one_card_per_populated_role() {
        let session = settled(r#"{"director":"X","casting":"  ","unknown":"Y"}"#);
        let view = render(&session, &PRO, RenderMode::Cards);
        assert!(view.submit_enabled);
        let Body::Cards { cards, .. } = &view.body else {
            panic!("expected cards, got {:?}", view.body);
        };
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].key, "director");
        assert_eq!(cards[0].body, vec![text("X")]);
    }

    #[test]
    fn raw_json_mode_prints_whole_object() {
        let session = settled(r#"{"director":"X","unknown":"Y"}"#);
        let view = render(&session, &PRO, RenderMode::RawJson);
        let Body::RawJson(json) = &view.body else {
            panic!("expected raw json");
        };
        assert!(json.contains("\"unknown\": \"Y\""));
    }

    #[test]
    fn success_without_known_roles_shows_a_notice() {
        let session = settled(r#"{"unknown":"Y","director":null}"#);
        let view = render(&session, &PRO, RenderMode::Cards);
        assert_eq!(view.body, Body::Notice(PRO.messages.empty_response));

        let mut out = Vec::new();
        TerminalRenderer::new(false).write_view(&mut out, &view).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{}\n", PRO.messages.empty_response)
        );
    }

    #[test]
    fn raw_json_keeps_response_key_order() {
        let session = settled(r#"{"producer":"a","director":"b","casting":"c"}"#);
        let Body::RawJson(json) = render(&session, &PRO, RenderMode::RawJson).body else {
            panic!("expected raw json");
        };
        let producer = json.find("producer").unwrap();
        let director = json.find("director").unwrap();
        let casting = json.find("casting").unwrap();
        assert!(producer < director && director < casting, "{json}");
    }

    #[test]
    fn submitting_disables_submit() {
        let mut session = Session::new();
        session.set_note("x");
        session.begin_submission();
        let view = render(&session, &PRO, RenderMode::Cards);
        assert!(!view.submit_enabled);
        assert_eq!(view.body, Body::Loading(PRO.messages.submitting));
    }

    #[test]
    fn plain_terminal_output_has_no_escape_codes() {
        let session = settled(r#"{"producer":"**Go** now"}"#);
        let view = render(&session, &PRO, RenderMode::Cards);
        let mut out = Vec::new();
        TerminalRenderer::new(false).write_view(&mut out, &view).unwrap();
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("EXECUTIVE PRODUCER"));
        assert!(printed.contains("Go now"));
        assert!(!printed.contains('\x1b'));
    }
}

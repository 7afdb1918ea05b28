//! Typed filter graph
//!
//! A graph is a list of filter nodes wired by ports. Output ports are
//! allocated by the graph itself, so two chained draw-text lines can never end
//! up writing to the same label.

use std::fmt;

use serde::Serialize;

/// Stream kind selected from a job input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Video,
    Audio,
}

impl StreamKind {
    fn specifier(self) -> &'static str {
        match self {
            StreamKind::Video => "v",
            StreamKind::Audio => "a",
        }
    }
}

/// Port produced by a filter node; only the graph can create one
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Port(String);

impl Port {
    pub fn label(&self) -> &str {
        &self.0
    }
}

/// Anything a filter or an output map can read from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StreamRef {
    /// Stream of the n-th job input; optional refs tolerate a missing stream
    Input {
        index: usize,
        kind: StreamKind,
        optional: bool,
    },
    Port(Port),
}

impl StreamRef {
    pub fn video(index: usize) -> Self {
        StreamRef::Input {
            index,
            kind: StreamKind::Video,
            optional: false,
        }
    }

    pub fn audio(index: usize) -> Self {
        StreamRef::Input {
            index,
            kind: StreamKind::Audio,
            optional: false,
        }
    }

    /// Audio of an input that may have none
    pub fn maybe_audio(index: usize) -> Self {
        StreamRef::Input {
            index,
            kind: StreamKind::Audio,
            optional: true,
        }
    }

    /// Pad form used inside `-filter_complex`
    pub fn as_pad(&self) -> String {
        match self {
            StreamRef::Input { index, kind, .. } => format!("[{}:{}]", index, kind.specifier()),
            StreamRef::Port(port) => format!("[{}]", port.0),
        }
    }

    /// Form used as a `-map` argument
    pub fn as_map(&self) -> String {
        match self {
            StreamRef::Input {
                index,
                kind,
                optional,
            } => {
                let suffix = if *optional { "?" } else { "" };
                format!("{}:{}{}", index, kind.specifier(), suffix)
            }
            StreamRef::Port(port) => format!("[{}]", port.0),
        }
    }
}

impl From<Port> for StreamRef {
    fn from(port: Port) -> Self {
        StreamRef::Port(port)
    }
}

/// Fade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FadeDirection {
    In,
    Out,
}

/// When a fade starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FadeStart {
    /// Absolute offset in seconds
    At(f64),
    /// Ends exactly at the end of the input; needs the input's duration
    BeforeEnd,
}

/// Font used by a draw-text node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStyle {
    pub font: String,
    pub font_file: Option<String>,
    pub size: u32,
    pub color: String,
}

/// One filter with its parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "filter", rename_all = "camelCase")]
pub enum Filter {
    /// Fit inside the frame, never upscaling past it or cropping
    ScaleToFit { width: u32, height: u32 },
    Pad {
        width: u32,
        height: u32,
        color: String,
    },
    SetSar,
    Fps { rate: u32 },
    DrawText {
        text: String,
        style: TextStyle,
        x: String,
        y: String,
    },
    Fade {
        direction: FadeDirection,
        start: FadeStart,
        duration: f64,
        color: String,
    },
    Concat { segments: usize },
}

impl Filter {
    fn render(&self) -> String {
        match self {
            Filter::ScaleToFit { width, height } => format!(
                "scale=w={}:h={}:force_original_aspect_ratio=decrease",
                width, height
            ),
            Filter::Pad {
                width,
                height,
                color,
            } => format!(
                "pad=w={}:h={}:x=(ow-iw)/2:y=(oh-ih)/2:color={}",
                width, height, color
            ),
            Filter::SetSar => "setsar=1".to_string(),
            Filter::Fps { rate } => format!("fps={}", rate),
            Filter::DrawText { text, style, x, y } => {
                let font = match &style.font_file {
                    Some(path) => format!("fontfile={}", escape_argument(path)),
                    None => format!("font={}", escape_argument(&style.font)),
                };
                format!(
                    "drawtext={}:fontsize={}:fontcolor={}:x={}:y={}:text={}",
                    font,
                    style.size,
                    style.color,
                    x,
                    y,
                    escape_drawtext(text)
                )
            }
            Filter::Fade {
                direction,
                start,
                duration,
                color,
            } => {
                let kind = match direction {
                    FadeDirection::In => "in",
                    FadeDirection::Out => "out",
                };
                // unresolved starts render as 0; the orchestrator resolves them first
                let st = match start {
                    FadeStart::At(seconds) => *seconds,
                    FadeStart::BeforeEnd => 0.0,
                };
                format!(
                    "fade=t={}:st={}:d={}:color={}",
                    kind,
                    format_seconds(st),
                    format_seconds(*duration),
                    color
                )
            }
            Filter::Concat { segments } => format!("concat=n={}:v=1:a=1", segments),
        }
    }
}

/// Node of the graph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterNode {
    pub filter: Filter,
    pub inputs: Vec<StreamRef>,
    pub outputs: Vec<Port>,
}

/// Directed acyclic graph of filters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterGraph {
    nodes: Vec<FilterNode>,
    #[serde(skip)]
    next_port: usize,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self, kind: StreamKind) -> Port {
        let port = Port(format!("{}{}", kind.specifier(), self.next_port));
        self.next_port += 1;
        port
    }

    /// Append a single-input, single-video-output filter
    pub fn chain(&mut self, input: impl Into<StreamRef>, filter: Filter) -> Port {
        let output = self.allocate(StreamKind::Video);
        self.nodes.push(FilterNode {
            filter,
            inputs: vec![input.into()],
            outputs: vec![output.clone()],
        });
        output
    }

    /// Append a filter with arbitrary inputs and typed outputs
    pub fn apply(
        &mut self,
        inputs: Vec<StreamRef>,
        filter: Filter,
        outputs: &[StreamKind],
    ) -> Vec<Port> {
        let ports: Vec<Port> = outputs.iter().map(|kind| self.allocate(*kind)).collect();
        self.nodes.push(FilterNode {
            filter,
            inputs,
            outputs: ports.clone(),
        });
        ports
    }

    pub fn nodes(&self) -> &[FilterNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut FilterNode> {
        self.nodes.iter_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Render as a `-filter_complex` argument
    pub fn render(&self) -> String {
        self.nodes
            .iter()
            .map(|node| {
                let inputs: String = node.inputs.iter().map(StreamRef::as_pad).collect();
                let outputs: String = node
                    .outputs
                    .iter()
                    .map(|port| format!("[{}]", port.0))
                    .collect();
                format!("{}{}{}", inputs, node.filter.render(), outputs)
            })
            .collect::<Vec<_>>()
            .join(";")
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Escape a literal for a filter option value.
///
/// The result is wrapped in single quotes unless it contains a comma; inside
/// quotes only the apostrophe needs care and is written `'\''`. Literals with
/// a comma stay unquoted and have backslash, colon and apostrophe escaped.
/// The comma itself is left to [`escape_graph`].
pub fn escape_literal(text: &str) -> String {
    if !text.contains(',') {
        return format!("'{}'", text.replace('\'', "'\\''"));
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        if matches!(ch, '\\' | ':' | '\'') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Escape drawtext's own expansion characters (`\` and `%`)
pub fn escape_expansion(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 4);
    for ch in text.chars() {
        if matches!(ch, '\\' | '%') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Escape an option value for the filtergraph parser, which reads the whole
/// filter argument string before the option parser sees it.
pub fn escape_graph(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        if matches!(ch, '\\' | '\'' | '[' | ']' | ',' | ';') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Plain option value (font name, font file) ready for `-filter_complex`
pub fn escape_argument(value: &str) -> String {
    escape_graph(&escape_literal(value))
}

/// drawtext `text=` value ready for `-filter_complex`
pub fn escape_drawtext(text: &str) -> String {
    escape_graph(&escape_literal(&escape_expansion(text)))
}

/// Seconds without trailing noise (`1`, `0.5`, `12.345`)
pub fn format_seconds(seconds: f64) -> String {
    let rounded = (seconds * 1000.0).round() / 1000.0;
    format!("{}", rounded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style() -> TextStyle {
        TextStyle {
            font: "Arial".to_string(),
            font_file: None,
            size: 40,
            color: "white".to_string(),
        }
    }

    /// Reads one token the way the engine's tokenizer does: a backslash
    /// escapes the next character, quotes protect everything up to the next
    /// apostrophe, and any of `terms` ends the token.
    fn read_token<'a>(input: &'a str, terms: &str) -> (String, &'a str) {
        let mut out = String::new();
        let mut chars = input.char_indices().peekable();
        while let Some(&(index, ch)) = chars.peek() {
            if terms.contains(ch) {
                return (out, &input[index..]);
            }
            chars.next();
            match ch {
                '\\' => {
                    if let Some((_, next)) = chars.next() {
                        out.push(next);
                    }
                }
                '\'' => {
                    for (_, quoted) in chars.by_ref() {
                        if quoted == '\'' {
                            break;
                        }
                        out.push(quoted);
                    }
                }
                _ => out.push(ch),
            }
        }
        (out, "")
    }

    /// Graph level, then option level
    fn parse_value(rendered: &str) -> (String, String) {
        let (graph, rest) = read_token(rendered, "[],;");
        assert!(rest.is_empty(), "graph token ended early at {:?}", rest);
        let (option, rest) = read_token(&graph, ":");
        assert!(rest.is_empty(), "option split at {:?}", rest);
        (graph, option)
    }

    #[test]
    fn test_escape_quotes_when_no_comma() {
        let text = "50% off: it's \"fine\"";
        assert_eq!(escape_literal(text), "'50% off: it'\\''s \"fine\"'");

        let rendered = escape_drawtext(text);
        assert_eq!(rendered, "\\'50\\\\% off: it\\'\\\\\\'\\'s \"fine\"\\'");
        let (graph, option) = parse_value(&rendered);
        assert_eq!(graph, "'50\\% off: it'\\''s \"fine\"'");
        assert_eq!(option, "50\\% off: it's \"fine\"");
    }

    #[test]
    fn test_escape_skips_quotes_with_comma() {
        let text = "Stage 1, HF: 6.2";
        assert_eq!(escape_literal(text), "Stage 1, HF\\: 6.2");

        let rendered = escape_drawtext(text);
        assert_eq!(rendered, "Stage 1\\, HF\\\\: 6.2");
        let (_, option) = parse_value(&rendered);
        assert_eq!(option, text);
    }

    #[test]
    fn test_escape_apostrophe_with_comma() {
        let rendered = escape_drawtext("Stage 1, it's 5:00");
        let (_, option) = parse_value(&rendered);
        assert_eq!(option, "Stage 1, it's 5:00");
    }

    #[test]
    fn test_escape_backslash_and_brackets() {
        let (_, option) = parse_value(&escape_drawtext("a\\b [x];y"));
        assert_eq!(option, "a\\\\b [x];y");

        let (_, path) = parse_value(&escape_argument("C:\\Fonts\\arial.ttf"));
        assert_eq!(path, "C:\\Fonts\\arial.ttf");
    }

    #[test]
    fn test_drawtext_render_survives_parsing() {
        let mut graph = FilterGraph::new();
        graph.chain(
            StreamRef::video(0),
            Filter::DrawText {
                text: "HF: 6.2, 91.5%".to_string(),
                style: style(),
                x: "15".to_string(),
                y: "15".to_string(),
            },
        );
        let rendered = graph.render();
        let args = rendered
            .strip_prefix("[0:v]drawtext=")
            .and_then(|rest| rest.strip_suffix("[v0]"))
            .unwrap();
        let (graph_level, rest) = read_token(args, "[],;");
        assert!(rest.is_empty());
        let text = graph_level.split_once("text=").unwrap().1;
        let (option, _) = read_token(text, ":");
        assert_eq!(option, "HF: 6.2, 91.5\\%");
    }

    #[test]
    fn test_chained_ports_are_unique() {
        let mut graph = FilterGraph::new();
        let mut current: StreamRef = StreamRef::video(0);
        for line in ["one", "two", "three"] {
            let port = graph.chain(
                current,
                Filter::DrawText {
                    text: line.to_string(),
                    style: style(),
                    x: "15".to_string(),
                    y: "15".to_string(),
                },
            );
            current = port.into();
        }
        let labels: Vec<&str> = graph
            .nodes()
            .iter()
            .flat_map(|node| node.outputs.iter().map(Port::label))
            .collect();
        assert_eq!(labels, vec!["v0", "v1", "v2"]);

        let rendered = graph.render();
        assert!(rendered.starts_with("[0:v]drawtext="));
        assert!(rendered.contains("[v0];[v0]drawtext="));
        assert!(rendered.ends_with("text=\\'three\\'[v2]"));
    }

    #[test]
    fn test_concat_render() {
        let mut graph = FilterGraph::new();
        let inputs = vec![
            StreamRef::video(0),
            StreamRef::audio(0),
            StreamRef::video(1),
            StreamRef::audio(1),
        ];
        let outputs = graph.apply(
            inputs,
            Filter::Concat { segments: 2 },
            &[StreamKind::Video, StreamKind::Audio],
        );
        assert_eq!(outputs[0].label(), "v0");
        assert_eq!(outputs[1].label(), "a1");
        assert_eq!(graph.render(), "[0:v][0:a][1:v][1:a]concat=n=2:v=1:a=1[v0][a1]");
    }

    #[test]
    fn test_fade_render() {
        let mut graph = FilterGraph::new();
        graph.chain(
            StreamRef::video(0),
            Filter::Fade {
                direction: FadeDirection::Out,
                start: FadeStart::At(9.5),
                duration: 0.5,
                color: "white".to_string(),
            },
        );
        assert_eq!(graph.render(), "[0:v]fade=t=out:st=9.5:d=0.5:color=white[v0]");
    }

    #[test]
    fn test_map_forms() {
        assert_eq!(StreamRef::maybe_audio(0).as_map(), "0:a?");
        assert_eq!(StreamRef::video(2).as_map(), "2:v");
    }
}

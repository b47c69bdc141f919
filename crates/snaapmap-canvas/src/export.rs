//! PNG export of the mind map. The primary strategy lays the graph out as SVG
//! and rasterizes it with resvg; the fallback paints boxes and connectors
//! directly with tiny-skia (no text).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use snaapmap_core::{Graph, Node, NodeKind};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("nothing to export")]
    EmptyGraph,
    #[error("failed to parse SVG")]
    SvgParse,
    #[error("failed to allocate pixmap for raster rendering")]
    PixmapAlloc,
    #[error("failed to encode PNG")]
    PngEncode,
    #[error("invalid background color `{0}`")]
    InvalidBackground(String),
    #[error("no raster strategy available")]
    NoStrategy,
    #[error("image of {width}x{height} pixels is too large to export")]
    TooLarge { width: u64, height: u64 },
    #[error("invalid export file name `{0}`")]
    InvalidFileName(String),
    #[error("failed to write image: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Clone)]
pub struct RasterOptions {
    pub scale: f32,
    pub background: String,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            background: "#1e293b".to_string(),
        }
    }
}

pub trait RasterStrategy: Send {
    fn name(&self) -> &'static str;
    fn render(&self, graph: &Graph, options: &RasterOptions) -> Result<Vec<u8>>;
}

pub fn default_strategies() -> Vec<Box<dyn RasterStrategy>> {
    vec![Box::new(SvgRaster::new()), Box::new(ShapeRaster)]
}

/// Try each strategy in order; the first success wins.
pub fn render_png(
    graph: &Graph,
    options: &RasterOptions,
    strategies: &[Box<dyn RasterStrategy>],
) -> Result<Vec<u8>> {
    let mut last_error = None;
    for strategy in strategies {
        match strategy.render(graph, options) {
            Ok(bytes) => {
                tracing::debug!(strategy = strategy.name(), bytes = bytes.len(), "rendered mind map");
                return Ok(bytes);
            }
            Err(e) => {
                tracing::warn!(strategy = strategy.name(), error = %e, "raster strategy failed");
                last_error = Some(e);
            }
        }
    }
    Err(last_error.unwrap_or(ExportError::NoStrategy))
}

/// Write via temp file + rename so a failed export never leaves a partial image.
/// `file_name` must be a plain file name; anything that could leave `dir` is rejected.
pub fn write_png(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    check_file_name(file_name)?;
    fs::create_dir_all(dir)?;
    let tmp = dir.join(format!(".{}.tmp", file_name));
    let path = dir.join(file_name);
    if let Err(e) = fs::write(&tmp, bytes).and_then(|()| fs::rename(&tmp, &path)) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(path)
}

fn check_file_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && Path::new(name).file_name().is_some_and(|f| f == name);
    if valid {
        Ok(())
    } else {
        Err(ExportError::InvalidFileName(name.to_string()))
    }
}

// --- Layout shared by both strategies ---

const NODE_MIN_WIDTH: f64 = 120.0;
const NODE_HEIGHT: f64 = 40.0;
const CHAR_WIDTH: f64 = 7.5;
const PADDING: f64 = 20.0;

#[derive(Debug, Clone, Copy)]
struct Frame {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

fn node_frame(node: &Node) -> Frame {
    let (width, height) = match node.measured {
        Some(d) if d.width > 0.0 && d.height > 0.0 => (d.width, d.height),
        _ => (
            (node.display_label().chars().count() as f64 * CHAR_WIDTH + 32.0).max(NODE_MIN_WIDTH),
            NODE_HEIGHT,
        ),
    };
    Frame {
        x: node.position.x,
        y: node.position.y,
        width,
        height,
    }
}

#[derive(Debug, Clone, Copy)]
struct Bounds {
    min_x: f64,
    min_y: f64,
    width: f64,
    height: f64,
}

fn bounds(graph: &Graph) -> Result<Bounds> {
    let mut frames = graph.nodes.iter().map(node_frame);
    let first = frames.next().ok_or(ExportError::EmptyGraph)?;
    let (mut min_x, mut min_y) = (first.x, first.y);
    let (mut max_x, mut max_y) = (first.x + first.width, first.y + first.height);
    for f in frames {
        min_x = min_x.min(f.x);
        min_y = min_y.min(f.y);
        max_x = max_x.max(f.x + f.width);
        max_y = max_y.max(f.y + f.height);
    }
    Ok(Bounds {
        min_x: min_x - PADDING,
        min_y: min_y - PADDING,
        width: max_x - min_x + 2.0 * PADDING,
        height: max_y - min_y + 2.0 * PADDING,
    })
}

struct Palette {
    fill: &'static str,
    stroke: &'static str,
    text: &'static str,
}

fn palette(kind: NodeKind) -> Palette {
    match kind {
        NodeKind::Root | NodeKind::App => Palette {
            fill: "#3b82f6",
            stroke: "#3b82f6",
            text: "#ffffff",
        },
        NodeKind::User => Palette {
            fill: "#475569",
            stroke: "#22c55e",
            text: "#e2e8f0",
        },
        NodeKind::Benefit => Palette {
            fill: "#475569",
            stroke: "#f59e0b",
            text: "#e2e8f0",
        },
        NodeKind::Feature | NodeKind::Default => Palette {
            fill: "#475569",
            stroke: "#64748b",
            text: "#e2e8f0",
        },
    }
}

const EDGE_COLOR: &str = "#94a3b8";

/// Connector endpoints: source handle at the bottom centre, target at the top centre.
fn connectors(graph: &Graph) -> Vec<((f64, f64), (f64, f64))> {
    graph
        .edges
        .iter()
        .filter_map(|edge| {
            let source = node_frame(graph.node(&edge.source)?);
            let target = node_frame(graph.node(&edge.target)?);
            Some((
                (source.x + source.width / 2.0, source.y + source.height),
                (target.x + target.width / 2.0, target.y),
            ))
        })
        .collect()
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Standalone SVG document of the graph.
pub fn graph_to_svg(graph: &Graph, background: &str) -> Result<String> {
    let b = bounds(graph)?;
    let mut out = String::with_capacity(1024 + graph.nodes.len() * 256);
    out.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="{x} {y} {w} {h}">"#,
        x = b.min_x,
        y = b.min_y,
        w = b.width,
        h = b.height,
    ));
    out.push_str(&format!(
        r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
        b.min_x,
        b.min_y,
        b.width,
        b.height,
        escape_xml(background)
    ));
    for ((x1, y1), (x2, y2)) in connectors(graph) {
        out.push_str(&format!(
            r#"<line x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}" stroke="{EDGE_COLOR}" stroke-width="1.5"/>"#
        ));
    }
    for node in &graph.nodes {
        let f = node_frame(node);
        let p = palette(node.kind());
        let stroke_width = if node.selected { 3 } else { 2 };
        out.push_str(&format!(
            r#"<rect x="{}" y="{}" width="{}" height="{}" rx="12" fill="{}" stroke="{}" stroke-width="{}"/>"#,
            f.x, f.y, f.width, f.height, p.fill, p.stroke, stroke_width
        ));
        out.push_str(&format!(
            r#"<text x="{}" y="{}" font-family="Arial" font-size="14" font-weight="500" fill="{}" text-anchor="middle" dominant-baseline="central">{}</text>"#,
            f.x + f.width / 2.0,
            f.y + f.height / 2.0,
            p.text,
            escape_xml(node.display_label())
        ));
    }
    out.push_str("</svg>");
    Ok(out)
}

const MAX_SIDE: f64 = 16_384.0;
const MAX_PIXELS: f64 = 64.0 * 1024.0 * 1024.0;

/// Pixel size of a `width` x `height` drawing at `scale`, refused before any
/// allocation when it exceeds the raster limits.
fn pixel_size(width: f64, height: f64, scale: f32) -> Result<(u32, u32)> {
    let scale = f64::from(scale);
    let w = (width * scale).ceil().max(1.0);
    let h = (height * scale).ceil().max(1.0);
    if !w.is_finite() || !h.is_finite() || w > MAX_SIDE || h > MAX_SIDE || w * h > MAX_PIXELS {
        return Err(ExportError::TooLarge {
            width: w as u64,
            height: h as u64,
        });
    }
    Ok((w as u32, h as u32))
}

/// SVG document rasterized through usvg/resvg. System fonts are loaded on
/// the first render and reused afterwards.
#[derive(Default)]
pub struct SvgRaster {
    fonts: OnceLock<Arc<usvg::fontdb::Database>>,
}

impl std::fmt::Debug for SvgRaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgRaster")
            .field("fonts_loaded", &self.fonts.get().is_some())
            .finish()
    }
}

impl SvgRaster {
    pub fn new() -> Self {
        Self::default()
    }

    fn fonts(&self) -> Arc<usvg::fontdb::Database> {
        self.fonts
            .get_or_init(|| {
                let mut db = usvg::fontdb::Database::new();
                db.load_system_fonts();
                tracing::debug!(faces = db.len(), "loaded system fonts");
                Arc::new(db)
            })
            .clone()
    }
}

impl RasterStrategy for SvgRaster {
    fn name(&self) -> &'static str {
        "svg"
    }

    fn render(&self, graph: &Graph, options: &RasterOptions) -> Result<Vec<u8>> {
        parse_color(&options.background)
            .ok_or_else(|| ExportError::InvalidBackground(options.background.clone()))?;
        let b = bounds(graph)?;
        pixel_size(b.width, b.height, options.scale)?;
        let svg = graph_to_svg(graph, &options.background)?;

        let mut opt = usvg::Options::default();
        opt.fontdb = self.fonts();
        opt.font_family = "Arial".to_string();
        let tree = usvg::Tree::from_str(&svg, &opt).map_err(|_| ExportError::SvgParse)?;

        let size = tree.size();
        let (width, height) = pixel_size(
            f64::from(size.width()),
            f64::from(size.height()),
            options.scale,
        )?;
        let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or(ExportError::PixmapAlloc)?;
        resvg::render(
            &tree,
            tiny_skia::Transform::from_scale(options.scale, options.scale),
            &mut pixmap.as_mut(),
        );
        pixmap.encode_png().map_err(|_| ExportError::PngEncode)
    }
}

/// Boxes and connectors painted straight onto a pixmap.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeRaster;

impl RasterStrategy for ShapeRaster {
    fn name(&self) -> &'static str {
        "shapes"
    }

    fn render(&self, graph: &Graph, options: &RasterOptions) -> Result<Vec<u8>> {
        let background = parse_color(&options.background)
            .ok_or_else(|| ExportError::InvalidBackground(options.background.clone()))?;
        let b = bounds(graph)?;
        let (width, height) = pixel_size(b.width, b.height, options.scale)?;
        let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or(ExportError::PixmapAlloc)?;
        pixmap.fill(background);

        let transform = tiny_skia::Transform::from_row(
            options.scale,
            0.0,
            0.0,
            options.scale,
            -(b.min_x as f32) * options.scale,
            -(b.min_y as f32) * options.scale,
        );

        let mut paint = tiny_skia::Paint::default();
        paint.anti_alias = true;
        let stroke = tiny_skia::Stroke {
            width: 1.5,
            ..tiny_skia::Stroke::default()
        };

        set_paint_color(&mut paint, EDGE_COLOR);
        for ((x1, y1), (x2, y2)) in connectors(graph) {
            let mut pb = tiny_skia::PathBuilder::new();
            pb.move_to(x1 as f32, y1 as f32);
            pb.line_to(x2 as f32, y2 as f32);
            if let Some(path) = pb.finish() {
                pixmap.stroke_path(&path, &paint, &stroke, transform, None);
            }
        }

        let border = tiny_skia::Stroke {
            width: 2.0,
            ..tiny_skia::Stroke::default()
        };
        for node in &graph.nodes {
            let f = node_frame(node);
            let Some(rect) =
                tiny_skia::Rect::from_xywh(f.x as f32, f.y as f32, f.width as f32, f.height as f32)
            else {
                continue;
            };
            let p = palette(node.kind());
            set_paint_color(&mut paint, p.fill);
            pixmap.fill_rect(rect, &paint, transform, None);
            set_paint_color(&mut paint, p.stroke);
            pixmap.stroke_path(&tiny_skia::PathBuilder::from_rect(rect), &paint, &border, transform, None);
        }

        pixmap.encode_png().map_err(|_| ExportError::PngEncode)
    }
}

fn set_paint_color(paint: &mut tiny_skia::Paint, hex: &str) {
    if let Some(color) = parse_color(hex) {
        paint.set_color(color);
    }
}

fn parse_color(text: &str) -> Option<tiny_skia::Color> {
    let s = text.trim().to_ascii_lowercase();
    match s.as_str() {
        "transparent" => return Some(tiny_skia::Color::from_rgba8(0, 0, 0, 0)),
        "white" => return Some(tiny_skia::Color::WHITE),
        "black" => return Some(tiny_skia::Color::BLACK),
        _ => {}
    }

    let hex = s.strip_prefix('#')?;
    let digit = |c: u8| (c as char).to_digit(16).map(|v| v as u8);
    let bytes = hex.as_bytes();
    let channels: Vec<u8> = match bytes.len() {
        3 | 4 => bytes
            .iter()
            .map(|&c| digit(c).map(|v| (v << 4) | v))
            .collect::<Option<_>>()?,
        6 | 8 => bytes
            .chunks(2)
            .map(|pair| Some((digit(pair[0])? << 4) | digit(pair[1])?))
            .collect::<Option<_>>()?,
        _ => return None,
    };
    let alpha = channels.get(3).copied().unwrap_or(255);
    Some(tiny_skia::Color::from_rgba8(channels[0], channels[1], channels[2], alpha))
}

#[cfg(test)]
mod tests {
    use super::*;
    use snaapmap_core::{Edge, Position, ROOT_ID};

    const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

    fn graph() -> Graph {
        Graph::new(
            vec![
                Node::new(ROOT_ID, NodeKind::Root, "Tom & Jerry's <App>", Position::new(250.0, 50.0)),
                Node::new("users", NodeKind::User, "Users", Position::new(50.0, 180.0)),
            ],
            vec![Edge::new("root-users", ROOT_ID, "users")],
        )
    }

    struct Failing;

    impl RasterStrategy for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn render(&self, _: &Graph, _: &RasterOptions) -> Result<Vec<u8>> {
            Err(ExportError::SvgParse)
        }
    }

    #[test]
    fn svg_escapes_labels_and_covers_all_nodes() {
        let svg = graph_to_svg(&graph(), "#1e293b").unwrap();
        assert!(svg.contains("Tom &amp; Jerry&apos;s &lt;App&gt;"));
        assert!(svg.contains(r#"viewBox="30 30 "#));
        assert_eq!(svg.matches("<line ").count(), 1);
        assert!(is_complete_document(&svg));
    }

    fn is_complete_document(svg: &str) -> bool {
        svg.starts_with("<svg ") && svg.ends_with("</svg>") && svg.matches("<text").count() == 2
    }

    #[test]
    fn both_strategies_produce_png() {
        let options = RasterOptions::default();
        for strategy in default_strategies() {
            let bytes = strategy.render(&graph(), &options).unwrap();
            assert!(bytes.starts_with(PNG_SIGNATURE), "{}", strategy.name());
        }
    }

    #[test]
    fn falls_back_to_the_next_strategy() {
        let strategies: Vec<Box<dyn RasterStrategy>> = vec![Box::new(Failing), Box::new(ShapeRaster)];
        let bytes = render_png(&graph(), &RasterOptions::default(), &strategies).unwrap();
        assert!(bytes.starts_with(PNG_SIGNATURE));
    }

    #[test]
    fn reports_the_last_failure_when_every_strategy_fails() {
        let strategies: Vec<Box<dyn RasterStrategy>> = vec![Box::new(Failing), Box::new(Failing)];
        assert!(matches!(
            render_png(&graph(), &RasterOptions::default(), &strategies),
            Err(ExportError::SvgParse)
        ));
        assert!(matches!(
            render_png(&graph(), &RasterOptions::default(), &[]),
            Err(ExportError::NoStrategy)
        ));
        assert!(matches!(
            ShapeRaster.render(&Graph::default(), &RasterOptions::default()),
            Err(ExportError::EmptyGraph)
        ));
    }

    #[test]
    fn oversized_drawings_are_refused_before_allocating() {
        let mut far = graph();
        far.nodes[1].position = Position::new(2.0e6, 2.0e6);
        for strategy in default_strategies() {
            assert!(
                matches!(
                    strategy.render(&far, &RasterOptions::default()),
                    Err(ExportError::TooLarge { .. })
                ),
                "{}",
                strategy.name()
            );
        }

        let wide = RasterOptions {
            scale: 1000.0,
            ..RasterOptions::default()
        };
        assert!(matches!(
            ShapeRaster.render(&graph(), &wide),
            Err(ExportError::TooLarge { .. })
        ));
        assert!(matches!(pixel_size(100.0, 100.0, f32::INFINITY), Err(ExportError::TooLarge { .. })));
        assert_eq!(pixel_size(100.5, 40.0, 2.0).unwrap(), (201, 80));
    }

    #[test]
    fn svg_raster_reuses_its_font_database() {
        let raster = SvgRaster::new();
        let first = raster.fonts();
        raster.render(&graph(), &RasterOptions::default()).unwrap();
        assert!(Arc::ptr_eq(&first, &raster.fonts()));
    }

    #[test]
    fn write_png_rejects_names_that_leave_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let inner = dir.path().join("exports");
        for name in ["../escape.png", "nested/mindmap.png", "..\\escape.png", "..", "", ".hidden.png"] {
            assert!(
                matches!(
                    write_png(&inner, name, PNG_SIGNATURE),
                    Err(ExportError::InvalidFileName(_))
                ),
                "{name:?}"
            );
        }
        assert!(!dir.path().join("escape.png").exists());
    }

    #[test]
    fn write_png_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "mindmap.png", PNG_SIGNATURE).unwrap();
        assert_eq!(path, dir.path().join("mindmap.png"));
        assert_eq!(fs::read(&path).unwrap(), PNG_SIGNATURE);
        assert!(!dir.path().join(".mindmap.png.tmp").exists());
    }

    #[test]
    fn parses_hex_and_named_colors() {
        assert_eq!(parse_color("#fff"), Some(tiny_skia::Color::WHITE));
        assert_eq!(
            parse_color("#1e293b"),
            Some(tiny_skia::Color::from_rgba8(0x1e, 0x29, 0x3b, 255))
        );
        assert_eq!(parse_color("black"), Some(tiny_skia::Color::BLACK));
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("slate"), None);
    }
}

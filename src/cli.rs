use crate::adapter::parse_tree_json;
use crate::config::{Config, load_config};
use crate::events::{EventFilter, SortOrder, build_events};
use crate::ir::{Person, Tree};
use crate::layout::{
    Layout, ViewKind, compute_family_tree, compute_map_layout, compute_timeline_layout, fit_tree, group_by_place,
};
use crate::layout_dump::{LayoutDump, write_layout_dump};
use crate::render::{render_svg, write_output_png, write_output_svg};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lnmap", version, about = "Family tree, map and timeline layout renderer")]
pub struct Args {
    /// Family JSON file or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png/json). Defaults to stdout for SVG and JSON.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// View to lay out
    #[arg(short = 'v', long = "view", value_enum, default_value = "tree")]
    pub view: ViewArg,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Container width
    #[arg(short = 'w', long = "width", default_value_t = 1200.0)]
    pub width: f32,

    /// Container height
    #[arg(short = 'H', long = "height", default_value_t = 800.0)]
    pub height: f32,

    /// Frame the tree tightly (no minimum size, no bottom room)
    #[arg(long = "fit")]
    pub fit: bool,

    /// Map only the people of this country
    #[arg(long = "country")]
    pub country: Option<String>,

    /// Background image size as WIDTHxHEIGHT, for letterboxed maps
    #[arg(long = "imageSize", value_parser = parse_size)]
    pub image_size: Option<(f32, f32)>,

    /// Timeline event type (birth, death, marriage, move, ...)
    #[arg(long = "eventType")]
    pub event_type: Option<String>,

    /// Timeline free-text filter
    #[arg(short = 'q', long = "query", default_value = "")]
    pub query: String,

    /// Timeline order
    #[arg(long = "order", value_enum, default_value = "asc")]
    pub order: OrderArg,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewArg {
    Tree,
    Map,
    Timeline,
}

impl From<ViewArg> for ViewKind {
    fn from(view: ViewArg) -> Self {
        match view {
            ViewArg::Tree => ViewKind::Tree,
            ViewArg::Map => ViewKind::Map,
            ViewArg::Timeline => ViewKind::Timeline,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OrderArg {
    Asc,
    Desc,
}

fn parse_size(raw: &str) -> std::result::Result<(f32, f32), String> {
    let (w, h) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{raw}'"))?;
    let w: f32 = w.trim().parse().map_err(|_| format!("bad width '{w}'"))?;
    let h: f32 = h.trim().parse().map_err(|_| format!("bad height '{h}'"))?;
    Ok((w, h))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let mut config = load_config(args.config.as_deref())?;
    config.render.width = args.width;
    config.render.height = args.height;

    let input = read_input(args.input.as_deref())?;
    let tree = parse_tree_json(&input)?;
    tracing::debug!(
        people = tree.people.len(),
        relationships = tree.relationships.len(),
        "family data loaded"
    );

    let layout = build_layout(&tree, &args, &config)?;
    match args.output_format {
        OutputFormat::Svg => {
            let svg = render_svg(&layout, &config);
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            let svg = render_svg(&layout, &config);
            write_output_png(&svg, &output, &config.render, &config.theme)?;
        }
        OutputFormat::Json => match args.output.as_deref() {
            Some(path) => write_layout_dump(path, &layout)?,
            None => println!("{}", serde_json::to_string_pretty(&LayoutDump::from_layout(&layout))?),
        },
    }
    Ok(())
}

fn build_layout(tree: &Tree, args: &Args, config: &Config) -> Result<Layout> {
    let (width, height) = (config.render.width, config.render.height);
    let layout = match ViewKind::from(args.view) {
        ViewKind::Tree => {
            let mut layout = compute_family_tree(tree, width, config);
            if args.fit {
                layout.view_box = fit_tree(&layout.nodes, &config.view);
            }
            Layout::Tree(layout)
        }
        ViewKind::Map => {
            let people = map_people(tree, args.country.as_deref())?;
            Layout::Map(compute_map_layout(people, width, height, args.image_size, &config.map))
        }
        ViewKind::Timeline => {
            let filter = EventFilter {
                kind: args.event_type.clone(),
                query: args.query.clone(),
                order: match args.order {
                    OrderArg::Asc => SortOrder::Asc,
                    OrderArg::Desc => SortOrder::Desc,
                },
            };
            let events = filter.apply(&build_events(tree));
            if events.is_empty() {
                tracing::warn!("no matching events");
            }
            Layout::Timeline(compute_timeline_layout(&events, width, &config.timeline))
        }
    };
    Ok(layout)
}

fn map_people<'a>(tree: &'a Tree, country: Option<&str>) -> Result<Vec<&'a Person>> {
    let Some(country) = country else {
        return Ok(tree.people.iter().collect());
    };
    let groups = group_by_place(&tree.people);
    let group = groups
        .iter()
        .find(|g| g.country.eq_ignore_ascii_case(country.trim()))
        .ok_or_else(|| anyhow::anyhow!("No people found in country '{}'", country))?;
    Ok(group
        .person_ids()
        .filter_map(|id| tree.person(id))
        .collect())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(std::fs::read_to_string(path)?);
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAMILY: &str = r#"{
        "people": [
            {"id": "a", "name": "Ada", "born": "1900", "location": "York, Yorkshire, England", "x": 20, "y": 30},
            {"id": "b", "name": "Ben", "born": "1930", "location": "Lyon, France", "x": 60, "y": 40}
        ],
        "relationships": [{"parentId": "a", "childId": "b"}]
    }"#;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["lnmap"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn parses_image_size() {
        assert_eq!(parse_size("1600x800"), Ok((1600.0, 800.0)));
        assert!(parse_size("wide").is_err());
        let parsed = args(&["--view", "map", "--imageSize", "400X300"]);
        assert_eq!(parsed.image_size, Some((400.0, 300.0)));
        assert_eq!(parsed.view, ViewArg::Map);
    }

    #[test]
    fn country_filter_limits_map() {
        let tree = parse_tree_json(FAMILY).unwrap();
        let layout = build_layout(&tree, &args(&["-v", "map", "--country", "france"]), &Config::default()).unwrap();
        let Layout::Map(map) = layout else {
            panic!("map layout");
        };
        assert_eq!(map.pins.len(), 1);
        assert_eq!(map.pins[0].person_id, "b");

        assert!(build_layout(&tree, &args(&["-v", "map", "--country", "Spain"]), &Config::default()).is_err());
    }

    #[test]
    fn timeline_respects_order() {
        let tree = parse_tree_json(FAMILY).unwrap();
        let layout = build_layout(&tree, &args(&["-v", "timeline", "--order", "desc"]), &Config::default()).unwrap();
        let Layout::Timeline(timeline) = layout else {
            panic!("timeline layout");
        };
        assert_eq!(timeline.cards[0].event.date, "1930");
    }

    #[test]
    fn fit_flag_drops_minimum_frame() {
        let tree = parse_tree_json(FAMILY).unwrap();
        let loose = build_layout(&tree, &args(&[]), &Config::default()).unwrap();
        let tight = build_layout(&tree, &args(&["--fit"]), &Config::default()).unwrap();
        assert!(tight.view_box().width < loose.view_box().width);
    }
}

use crate::config::load_config;
use crate::diagram::{DEFAULT_FILENAME, DEFAULT_TITLE, Diagram, DiagramOptions};
use crate::error::Error;
use crate::ir::{Direction, OutputFormat};
use crate::layout_dump::write_layout_dump;
use crate::topology::Topology;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_DEPENDENCY_MISSING: i32 = 1;
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser, Debug)]
#[command(
    name = "infra-diagram",
    version,
    about = "Render the AWS infrastructure diagram of the React app deployment"
)]
pub struct Args {
    /// Output path without extension
    #[arg(short = 'o', long = "output", default_value = DEFAULT_FILENAME)]
    pub output: PathBuf,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "png")]
    pub output_format: FormatArg,

    /// Layout direction; overrides the topology file
    #[arg(short = 'd', long = "direction", value_enum)]
    pub direction: Option<DirectionArg>,

    /// Diagram title; overrides the topology file
    #[arg(short = 't', long = "title")]
    pub title: Option<String>,

    /// Config JSON5 file (theme name, themeVariables, layout and render settings)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Topology JSON5 file used instead of the built-in AWS topology
    #[arg(long = "topology")]
    pub topology: Option<PathBuf>,

    /// Write the computed layout as JSON to this path
    #[arg(long = "dump-layout")]
    pub dump_layout: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long = "log-level", default_value = "warn")]
    pub log_level: String,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum FormatArg {
    Png,
    Svg,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum DirectionArg {
    #[value(name = "TB", alias = "tb", alias = "TD")]
    Tb,
    #[value(name = "BT", alias = "bt")]
    Bt,
    #[value(name = "LR", alias = "lr")]
    Lr,
    #[value(name = "RL", alias = "rl")]
    Rl,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Png => OutputFormat::Png,
            FormatArg::Svg => OutputFormat::Svg,
        }
    }
}

impl From<DirectionArg> for Direction {
    fn from(value: DirectionArg) -> Self {
        match value {
            DirectionArg::Tb => Direction::TopBottom,
            DirectionArg::Bt => Direction::BottomTop,
            DirectionArg::Lr => Direction::LeftRight,
            DirectionArg::Rl => Direction::RightLeft,
        }
    }
}

impl Args {
    pub fn format(&self) -> OutputFormat {
        self.output_format.into()
    }
}

/// Builds the diagram described by `args` and returns the written path.
pub fn run(args: &Args) -> Result<PathBuf> {
    let config = load_config(args.config.as_deref())?;
    let topology = match &args.topology {
        Some(path) => Topology::load(path)?,
        None => Topology::aws_reference(),
    };
    // The guard renders on drop, so reject a bad table before opening it.
    topology.validate()?;

    let options = DiagramOptions {
        title: args
            .title
            .clone()
            .or_else(|| topology.title.clone())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        filename: args.output.clone(),
        direction: args
            .direction
            .map(Direction::from)
            .or(topology.direction)
            .unwrap_or_default(),
        format: args.format(),
        config,
    };
    log::debug!(options:?; "Resolved diagram options");

    let mut diagram = Diagram::open(options)?;
    topology.declare_into(&mut diagram)?;

    if let Some(path) = &args.dump_layout {
        let layout = diagram.layout();
        write_layout_dump(path, &layout, diagram.graph())
            .with_context(|| format!("Failed to write layout dump to {}", path.display()))?;
    }

    Ok(diagram.render()?)
}

/// Prints the outcome of [`run`] and returns the process exit code.
///
/// A missing rendering backend gets the remediation text on `out`; every
/// other failure goes to `err` as `error: …`.
pub fn report(
    result: &Result<PathBuf>,
    format: OutputFormat,
    out: &mut impl Write,
    err: &mut impl Write,
) -> io::Result<i32> {
    match result {
        Ok(path) => {
            writeln!(out, "✅ Architecture diagram generated: {}", path.display())?;
            writeln!(
                out,
                "📖 View the {} diagram with your image viewer",
                format.display_name()
            )?;
            Ok(EXIT_SUCCESS)
        }
        Err(error)
            if error
                .downcast_ref::<Error>()
                .is_some_and(Error::is_dependency_missing) =>
        {
            writeln!(out, "❌ Error: 'diagram' library not installed")?;
            writeln!(out, "Install with: cargo install infra-diagram --features png")?;
            writeln!(out)?;
            writeln!(out, "Alternatively, use the Mermaid diagram:")?;
            writeln!(out, "  ./scripts/generate-architecture-diagram.sh")?;
            Ok(EXIT_DEPENDENCY_MISSING)
        }
        Err(error) => {
            writeln!(err, "error: {error:#}")?;
            Ok(EXIT_FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn report_to_strings(result: &Result<PathBuf>, format: OutputFormat) -> (i32, String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = report(result, format, &mut out, &mut err).unwrap();
        (
            code,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn defaults_match_fixed_contract() {
        let args = Args::parse_from(["infra-diagram"]);
        assert_eq!(args.output, PathBuf::from("docs/architecture"));
        assert_eq!(args.format(), OutputFormat::Png);
        assert!(args.direction.is_none());
        assert_eq!(args.log_level, "warn");
    }

    #[test]
    fn parses_direction_and_format() {
        let args = Args::parse_from(["infra-diagram", "-d", "LR", "-e", "svg", "-t", "Staging"]);
        assert_eq!(args.direction.map(Direction::from), Some(Direction::LeftRight));
        assert_eq!(args.format(), OutputFormat::Svg);
        assert_eq!(args.title.as_deref(), Some("Staging"));
    }

    #[test]
    fn reports_success() {
        let result = Ok(PathBuf::from("docs/architecture.png"));
        let (code, out, err) = report_to_strings(&result, OutputFormat::Png);
        assert_eq!(code, EXIT_SUCCESS);
        assert_eq!(
            out,
            "✅ Architecture diagram generated: docs/architecture.png\n\
             📖 View the PNG diagram with your image viewer\n"
        );
        assert!(err.is_empty());
    }

    #[test]
    fn reports_missing_dependency_with_remediation() {
        let result = Err(anyhow::Error::from(Error::DependencyMissing {
            backend: "PNG",
            feature: "png",
        }));
        let (code, out, err) = report_to_strings(&result, OutputFormat::Png);
        assert_eq!(code, EXIT_DEPENDENCY_MISSING);
        assert!(out.contains("Error: 'diagram' library not installed"));
        assert!(out.contains("\n\nAlternatively, use the Mermaid diagram:\n"));
        assert!(out.contains("generate-architecture-diagram.sh"));
        assert!(err.is_empty());
    }

    #[test]
    fn other_errors_go_to_stderr() {
        let result = Err(anyhow::Error::from(Error::InvalidTopology(
            "duplicate node key `x`".to_string(),
        )));
        let (code, out, err) = report_to_strings(&result, OutputFormat::Png);
        assert_eq!(code, EXIT_FAILURE);
        assert!(out.is_empty());
        assert_eq!(err, "error: invalid topology: duplicate node key `x`\n");
    }

    #[test]
    fn run_writes_svg_with_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("docs").join("architecture");
        let dump = dir.path().join("layout.json");
        let args = Args::parse_from([
            OsString::from("infra-diagram"),
            OsString::from("-e"),
            OsString::from("svg"),
            OsString::from("-t"),
            OsString::from("Overridden"),
            OsString::from("-o"),
            stem.clone().into_os_string(),
            OsString::from("--dump-layout"),
            dump.clone().into_os_string(),
        ]);

        let path = run(&args).unwrap();
        assert_eq!(path, stem.with_extension("svg"));
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("Overridden"));
        assert!(svg.contains("Internet Gateway"));
        assert!(dump.exists());
    }
}

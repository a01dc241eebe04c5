#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    cli::run()
}

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use anyhow::{bail, Context, Result};
    use clap::{Parser, ValueEnum};
    use dimtree::config::ViewConfig;
    use dimtree::source::{load, FeishuSource, MockSource, TableSource};
    use dimtree::workspace::{LoadOutcome, Workspace};
    use serde_json::Value;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tracing::{debug, info};

    #[derive(Debug, Clone, Copy, ValueEnum)]
    enum OutputFormat {
        Html,
        Text,
        Json,
    }

    /// Group table records into a dimension tree
    #[derive(Parser, Debug)]
    #[command(name = "dimtree")]
    #[command(about = "Render Bitable records grouped by hierarchical dimensions")]
    struct Args {
        /// Records payload, or a table file with `fields` and `records`
        input: Option<PathBuf>,

        /// Fields payload; makes INPUT a plain records payload
        #[arg(long)]
        fields: Option<PathBuf>,

        /// Use the built-in demo table instead of INPUT
        #[arg(long, conflicts_with_all = ["input", "fields"])]
        mock: bool,

        /// Dimension field, by id or name; repeat in grouping order
        #[arg(short, long = "dim")]
        dims: Vec<String>,

        /// View configuration (dimensions, placeholder, style)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Label for records missing a dimension value
        #[arg(long)]
        placeholder: Option<String>,

        /// Apply the default format to each dimension without one
        #[arg(long)]
        default_formats: bool,

        #[arg(short, long, value_enum, default_value = "html")]
        format: OutputFormat,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Expand every group instead of only the top level
        #[arg(long)]
        expand_all: bool,

        /// Log filter used when RUST_LOG is unset
        #[arg(long, default_value = "warn")]
        log_level: String,
    }

    pub fn run() -> Result<()> {
        let args = Args::parse();

        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
            )
            .with_writer(std::io::stderr)
            .init();

        let mut config = match &args.config {
            Some(path) => ViewConfig::from_path(path)?,
            None => ViewConfig::default(),
        };
        if let Some(placeholder) = &args.placeholder {
            config.placeholder = placeholder.clone();
        }

        let mut workspace = Workspace::with_config(&config);
        let token = workspace.begin_load();
        let result = load(source(&args)?.as_mut());
        if workspace.finish_load(token, result) == LoadOutcome::Failed {
            bail!(
                "Failed to load table: {}",
                workspace.error().unwrap_or("unknown error")
            );
        }

        for dim in &args.dims {
            let id = resolve_field(&workspace, dim)?;
            if !workspace.selection().is_selected(&id) {
                workspace.toggle_field(&id);
            }
        }
        if args.default_formats {
            workspace.apply_default_formats();
        }
        info!(
            dimensions = workspace.selection().dimensions().len(),
            rows = workspace.rows().len(),
            "rendering"
        );

        if args.expand_all {
            workspace.expand_all();
        } else {
            let tree = workspace.tree();
            for node in tree.nodes() {
                workspace.toggle_node(&node.path);
            }
        }

        let rendered = match args.format {
            OutputFormat::Html => workspace.render_html(),
            OutputFormat::Text => workspace.render_text(),
            OutputFormat::Json => {
                let mut json = serde_json::to_string_pretty(&workspace.tree())?;
                json.push('\n');
                json
            }
        };

        match &args.output {
            Some(path) => fs::write(path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?,
            None => print!("{}", rendered),
        }
        Ok(())
    }

    fn source(args: &Args) -> Result<Box<dyn TableSource>> {
        if args.mock {
            return Ok(Box::new(MockSource));
        }
        let Some(input) = &args.input else {
            bail!("An input file is required unless --mock is given");
        };
        let records = read(input)?;

        if let Some(fields) = &args.fields {
            return Ok(Box::new(FeishuSource::new(read(fields)?, records)));
        }

        let table: Value = serde_json::from_str(&records)
            .with_context(|| format!("Invalid JSON in {}", input.display()))?;
        let (Some(fields), Some(records)) = (table.get("fields"), table.get("records")) else {
            bail!(
                "{} must contain `fields` and `records`, or pass --fields",
                input.display()
            );
        };
        debug!(input = %input.display(), "reading combined table file");
        Ok(Box::new(FeishuSource::new(fields.to_string(), records.to_string())))
    }

    fn read(path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
    }

    fn resolve_field(workspace: &Workspace, dim: &str) -> Result<String> {
        workspace
            .fields()
            .iter()
            .find(|f| f.id == dim)
            .or_else(|| workspace.fields().iter().find(|f| f.name == dim))
            .map(|f| f.id.clone())
            .with_context(|| format!("Unknown field: {}", dim))
    }
}

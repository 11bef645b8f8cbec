use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use log::info;
use psml_outline::pdf::{apply_bookmarks, NamedDestinationLayout};
use psml_outline::source::{self, SourceKind};
use psml_outline::{Bookmarks, OutlineConfig};

/// Builds PDF bookmark outlines from PSML documents.
///
/// Set `RUST_LOG=debug` to trace every bookmark as it is written.
#[derive(Parser)]
#[command(author, version, about = "Bookmark outlines for PSML-derived PDFs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ExtractArgs {
    /// PSML document to read bookmarks from.
    psml: PathBuf,

    /// Deepest bookmark level to extract.
    #[arg(long, env = "PSML_MAX_BOOKMARK_LEVEL", default_value_t = psml_outline::config::DEFAULT_MAX_LEVEL)]
    max_level: i32,

    /// Node-set query selecting headings when the document has no TOC.
    #[arg(long, default_value = psml_outline::config::DEFAULT_HEADING_QUERY)]
    heading_query: String,
}

impl ExtractArgs {
    fn config(&self) -> OutlineConfig {
        OutlineConfig::new()
            .with_max_level(self.max_level)
            .with_heading_query(self.heading_query.clone())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the outline extracted from a PSML document.
    #[command(name = "tree", aliases = ["show"])]
    Tree(ExtractArgs),

    /// Embed the outline into a rendered PDF.
    ///
    /// Anchors are resolved through the named destinations of the PDF;
    /// unresolved bookmarks open their page fitted to width.
    #[command(name = "apply")]
    Apply {
        #[command(flatten)]
        extract: ExtractArgs,

        /// Rendered PDF to add bookmarks to.
        pdf: PathBuf,

        /// Where to write the resulting PDF.
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Tree(args) => print_tree(&args),
        Commands::Apply {
            extract,
            pdf,
            output,
        } => apply(&extract, &pdf, &output),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn print_tree(args: &ExtractArgs) -> Result<(), Box<dyn Error>> {
    let text = std::fs::read_to_string(&args.psml)?;
    let document = roxmltree::Document::parse(&text)?;
    let kind = SourceKind::detect(&document);
    let bookmarks = source::load(&document, &args.config());

    println!(
        "{} bookmarks from {} ({} synthesized)",
        bookmarks.len(),
        if kind.is_explicit() { "table of contents" } else { "headings" },
        bookmarks.ghost_count()
    );
    print_bookmarks(&bookmarks);
    Ok(())
}

fn print_bookmarks(bookmarks: &Bookmarks) {
    for (depth, _, node) in bookmarks.walk() {
        let indent = "  ".repeat(depth - 1);
        let label = if node.is_ghost() { "(untitled)" } else { node.name() };
        if node.anchor().is_empty() {
            println!("{indent}{label}");
        } else {
            println!("{indent}{label} #{}", node.anchor());
        }
    }
}

fn apply(args: &ExtractArgs, pdf: &Path, output: &Path) -> Result<(), Box<dyn Error>> {
    let text = std::fs::read_to_string(&args.psml)?;
    let bookmarks = source::load_str(&text, &args.config())?;

    let pdf_bytes = std::fs::read(pdf)?;
    let layout = NamedDestinationLayout::from_bytes(&pdf_bytes)?;
    let bytes = apply_bookmarks(&pdf_bytes, &bookmarks, &layout)?;
    std::fs::write(output, &bytes)?;

    info!(
        "Wrote {} ({} bytes) with {} bookmarks",
        output.display(),
        bytes.len(),
        bookmarks.len()
    );
    Ok(())
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}

//! docblock: print the documentation comment for a declaration.
//!
//! A thin host around the `docblockr` engine. It reads a buffer from a file
//! or stdin, runs the generator at a line and prints the snippet, with its
//! `${n:...}` tab stops, to stdout.
//!
//! - `docblock generate src/app.js --line 12`
//! - `docblock generate --language php --inline < model.php`
//! - `docblock wrap < comment.txt`

mod logger;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use docblockr::lang::Language;
use docblockr::{Config, Docblockr, LanguageId, TextBuffer};
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "docblock",
    version,
    about = "Generate documentation comments for source declarations"
)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only report errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the docblock for the declaration at a line
    Generate(GenerateArgs),
    /// Print the tags recognized at a line as JSON
    Tags(Source),
    /// Reflow the body of an existing comment
    Wrap {
        /// Comment file; stdin when omitted
        file: Option<PathBuf>,
    },
    /// List the supported languages
    Languages,
}

#[derive(Args)]
struct Source {
    /// Source file; stdin when omitted
    file: Option<PathBuf>,

    /// Language name. Detected from the file extension when omitted.
    #[arg(short, long)]
    language: Option<String>,

    /// 1-based line the declaration starts on
    #[arg(short = 'n', long, default_value_t = 1)]
    line: usize,
}

#[derive(Args)]
struct GenerateArgs {
    #[command(flatten)]
    source: Source,

    /// Text typed after the comment opener, used as the description
    #[arg(short, long, default_value = "")]
    trailing: String,

    /// Single-line block for a variable
    #[arg(long, conflicts_with = "tree")]
    inline: bool,

    /// Find the declaration through the JavaScript syntax tree
    #[arg(long)]
    tree: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init_logger(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            Config::from_path(path).with_context(|| format!("failed to load config {}", path.display()))?
        }
        None => Config::default(),
    };
    let generator = Docblockr::new(config).context("invalid configuration")?;

    match cli.command {
        Command::Generate(args) => generate(&generator, &args),
        Command::Tags(source) => tags(&generator, &source),
        Command::Wrap { file } => {
            let body = read_input(file.as_deref())?;
            println!("{}", generator.wrap(&body));
            Ok(())
        }
        Command::Languages => {
            for id in LanguageId::ALL {
                println!("{id}");
            }
            Ok(())
        }
    }
}

fn generate(generator: &Docblockr, args: &GenerateArgs) -> Result<()> {
    let text = read_input(args.source.file.as_deref())?;
    let id = language(&args.source)?;
    let row = row(&args.source)?;
    debug!(language = %id, row, tree = args.tree, inline = args.inline, "generating");

    let snippet = if args.tree {
        if id != LanguageId::JavaScript {
            bail!("--tree supports javascript only, not {id}");
        }
        generator.generate_from_tree(&text, row, &args.trailing)
    } else if args.inline {
        generator.generate_inline(id, &TextBuffer::new(&text), row)
    } else {
        generator.generate(id, &TextBuffer::new(&text), row, &args.trailing)
    };
    println!("{snippet}");
    Ok(())
}

fn tags(generator: &Docblockr, source: &Source) -> Result<()> {
    let text = read_input(source.file.as_deref())?;
    let id = language(source)?;
    let row = row(source)?;

    let lang: &dyn Language = generator.registry().get(id);
    let definition = lang.get_definition(&TextBuffer::new(&text), row);
    debug!(language = %id, definition = definition.as_str(), "definition");
    let tags = generator.tags(id, &definition, "");
    println!("{}", serde_json::to_string_pretty(&tags).context("failed to encode tags")?);
    Ok(())
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("failed to read stdin")?;
            Ok(input)
        }
    }
}

/// `--language` when given, else the file extension.
fn language(source: &Source) -> Result<LanguageId> {
    if let Some(name) = &source.language {
        return match LanguageId::from_name(name) {
            Some(id) => Ok(id),
            None => bail!("unsupported language: {name}"),
        };
    }
    let ext = source
        .file
        .as_deref()
        .and_then(Path::extension)
        .and_then(|e| e.to_str());
    match ext.and_then(LanguageId::from_extension) {
        Some(id) => Ok(id),
        None => bail!("cannot detect the language, pass --language"),
    }
}

fn row(source: &Source) -> Result<usize> {
    match source.line {
        0 => bail!("line numbers start at 1"),
        line => Ok(line - 1),
    }
}

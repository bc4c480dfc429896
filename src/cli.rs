use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "zipmod")]
#[command(version)]
#[command(about = "Inspect ZIP archives as module search-path entries", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipmod lib.zip -l                 list importable entries in lib.zip\n  \
  zipmod lib.zip -f pkg.mod         resolve a dotted module name\n  \
  zipmod lib.zip -p pkg/mod.py      dump one entry's data to stdout\n  \
  zipmod lib.zip/sub -f mod         resolve inside a subdirectory prefix")]
pub struct Cli {
    /// ZIP archive path, optionally with a subdirectory inside it
    #[arg(value_name = "PATH")]
    pub path: String,

    /// List archive entries
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely (sizes, method, mtime)
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Resolve dotted module names
    #[arg(short = 'f', value_name = "NAME", num_args = 1..)]
    pub find: Vec<String>,

    /// Dump an entry's decompressed data to stdout
    #[arg(short = 'p', value_name = "ENTRY")]
    pub pipe: Option<String>,

    /// Prefer source over compiled entries when resolving
    #[arg(short = 's', long = "prefer-source")]
    pub prefer_source: bool,
}

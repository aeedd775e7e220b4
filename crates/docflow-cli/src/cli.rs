use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docflow")]
#[command(about = "Run document maintenance actions against a seeded in-memory wiki", long_about = None)]
pub struct Cli {
    #[arg(long, global = true, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "JSON map of document name to seed document")]
    pub seed: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Answer yes to every confirmation")]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Nominate a document for a deletion discussion")]
    Rfd {
        #[command(flatten)]
        common: Common,

        #[arg(short, long, help = "Deletion rationale")]
        reason: String,
    },

    #[command(about = "Request quick deletion under one or more criteria")]
    Qd {
        #[command(flatten)]
        common: Common,

        #[arg(
            short,
            long = "criterion",
            required = true,
            help = "Criterion code with optional parameters, e.g. a1 or \"a1|url=https://...\""
        )]
        criteria: Vec<String>,

        #[arg(short, long, help = "Custom rationale (criterion db)")]
        reason: Option<String>,

        #[arg(long, help = "Blank the page instead of prepending the tag")]
        redact: bool,

        #[arg(long, help = "Also request creation protection")]
        salt: bool,
    },

    #[command(about = "List the registered action kinds")]
    Kinds,
}

#[derive(Args)]
pub struct Common {
    #[arg(help = "Document to act on")]
    pub target: String,

    #[arg(long = "as", default_value = "Docflow", help = "Account performing the action")]
    pub user: String,

    #[arg(long, help = "Wrap the tag in <noinclude>")]
    pub noinclude: bool,

    #[arg(long, help = "Do not notify the document's creator")]
    pub no_notify: bool,

    #[arg(long, help = "Add saved documents to the watch list")]
    pub watch: bool,
}

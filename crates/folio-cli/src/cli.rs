use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "folio",
    about = "Folio: versioned, multi-language content storage",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file
    #[arg(short, long, global = true, default_value = "folio.toml")]
    pub config: PathBuf,

    /// Content root, overriding the configured one
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Acting user for draft locks
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the fields of one version and language
    Read(SlotArgs),
    /// Create content, replacing whatever is there
    Write(WriteArgs),
    /// Replace the fields of existing content
    Update(WriteArgs),
    /// Delete content
    Delete(SlotArgs),
    /// Refresh the modification time
    Touch(SlotArgs),
    /// List the models stored under the content root
    List,
    /// List the versions and languages stored for a model
    Status(StatusArgs),
    /// Promote a draft to the published version
    Publish(LanguageArgs),
    /// Throw away a draft
    Discard(LanguageArgs),
    /// Move content to another version, language, or model
    Move(MoveArgs),
}

#[derive(Args)]
pub struct SlotArgs {
    /// Model path, e.g. `blog/hello-world`
    pub model: String,
    /// Address the draft (`changes`) instead of the published version
    #[arg(short, long)]
    pub draft: bool,
    /// Language code; the default language when omitted
    #[arg(short, long)]
    pub lang: Option<String>,
}

#[derive(Args)]
pub struct WriteArgs {
    #[command(flatten)]
    pub slot: SlotArgs,
    /// `name=value` pairs; values that parse as JSON are stored as JSON
    #[arg(short, long = "field", value_name = "NAME=VALUE")]
    pub fields: Vec<String>,
    /// A whole JSON object of fields, applied before `--field`
    #[arg(long)]
    pub json: Option<String>,
    /// Fail instead of replacing existing content
    #[arg(long)]
    pub new: bool,
}

#[derive(Args)]
pub struct StatusArgs {
    pub model: String,
}

#[derive(Args)]
pub struct LanguageArgs {
    pub model: String,
    #[arg(short, long)]
    pub lang: Option<String>,
}

#[derive(Args)]
pub struct MoveArgs {
    #[command(flatten)]
    pub from: SlotArgs,
    /// Move into the draft instead of the published version
    #[arg(long)]
    pub to_draft: bool,
    /// Target language; the source language when omitted
    #[arg(long)]
    pub to_lang: Option<String>,
    /// Target model; the source model when omitted
    #[arg(long)]
    pub to_model: Option<String>,
}

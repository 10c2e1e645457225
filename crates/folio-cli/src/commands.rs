use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{bail, Context};
use chrono::{DateTime, SecondsFormat, Utc};
use colored::Colorize;
use folio_lock::{GuardedStorage, InMemoryLockProvider};
use folio_storage::{ContentStorage, PlainFileStorage, StorageConfig};
use folio_types::{FieldMap, FieldValue, Language, Timestamp, UserRef, VersionId};
use serde_json::json;
use walkdir::WalkDir;

use crate::cli::*;
use crate::config::FolioConfig;

type Guarded = GuardedStorage<PlainFileStorage, InMemoryLockProvider>;

/// Resolved global options shared by every subcommand.
struct Session {
    config: FolioConfig,
    user: UserRef,
    format: OutputFormat,
}

impl Session {
    fn storage(&self, model: &str) -> anyhow::Result<PlainFileStorage> {
        let model = self.config.model(model)?;
        Ok(PlainFileStorage::with_config(self.config.storage.clone(), model))
    }

    fn guarded(&self, model: &str) -> anyhow::Result<Guarded> {
        let locks = InMemoryLockProvider::with_config(self.config.lock.clone());
        Ok(GuardedStorage::new(self.storage(model)?, locks, self.user.clone()))
    }

    fn json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = FolioConfig::load(&cli.config)?.with_root(cli.root);
    let user = resolve_user(cli.user.as_deref(), config.user.as_deref())?;
    let session = Session {
        config,
        user,
        format: cli.format,
    };

    match cli.command {
        Command::Read(args) => cmd_read(&session, args),
        Command::Write(args) => cmd_write(&session, args),
        Command::Update(args) => cmd_update(&session, args),
        Command::Delete(args) => cmd_delete(&session, args),
        Command::Touch(args) => cmd_touch(&session, args),
        Command::List => cmd_list(&session),
        Command::Status(args) => cmd_status(&session, args),
        Command::Publish(args) => cmd_publish(&session, args),
        Command::Discard(args) => cmd_discard(&session, args),
        Command::Move(args) => cmd_move(&session, args),
    }
}

fn resolve_user(flag: Option<&str>, configured: Option<&str>) -> anyhow::Result<UserRef> {
    let name = flag
        .map(str::to_string)
        .or_else(|| configured.map(str::to_string))
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_else(|| "folio".into());
    UserRef::new(&name).with_context(|| format!("invalid user '{name}'"))
}

fn version(draft: bool) -> VersionId {
    if draft {
        VersionId::Changes
    } else {
        VersionId::Latest
    }
}

fn language(storage: &impl ContentStorage, code: Option<&str>) -> anyhow::Result<Language> {
    let registry = storage.model().languages();
    match code {
        Some(code) => Ok(registry.resolve(code)?.clone()),
        None => Ok(registry.default_language().clone()),
    }
}

/// Build a field map from an optional JSON object followed by `name=value`
/// pairs. Values that parse as JSON keep their type; anything else is a string.
fn parse_fields(json: Option<&str>, pairs: &[String]) -> anyhow::Result<FieldMap> {
    let mut fields = match json {
        Some(json) => serde_json::from_str::<FieldMap>(json)
            .context("--json must be a JSON object of fields")?,
        None => FieldMap::new(),
    };
    for pair in pairs {
        let Some((name, raw)) = pair.split_once('=') else {
            bail!("expected NAME=VALUE, got '{pair}'");
        };
        if name.is_empty() {
            bail!("field name missing in '{pair}'");
        }
        let value = serde_json::from_str::<FieldValue>(raw)
            .unwrap_or_else(|_| FieldValue::String(raw.to_string()));
        fields.insert(name, value);
    }
    Ok(fields)
}

fn format_time(timestamp: Timestamp) -> String {
    i64::try_from(timestamp.as_millis())
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|time| time.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| timestamp.to_string())
}

/// Model paths below the content root, found by their content files.
fn find_models(config: &StorageConfig) -> anyhow::Result<BTreeSet<String>> {
    let mut models = BTreeSet::new();
    if !config.root.exists() {
        return Ok(models);
    }
    let suffix = format!(".{}", config.extension);
    for entry in WalkDir::new(&config.root).min_depth(2) {
        let entry = entry.with_context(|| format!("scanning {}", config.root.display()))?;
        let name = entry.file_name().to_string_lossy();
        if !entry.file_type().is_file()
            || !name.starts_with(config.filename.as_str())
            || !name.ends_with(&suffix)
        {
            continue;
        }
        let Some(mut dir) = entry.path().parent() else {
            continue;
        };
        if dir.file_name().is_some_and(|n| n == config.changes_dir.as_str()) {
            dir = dir.parent().unwrap_or(dir);
        }
        if let Ok(relative) = dir.strip_prefix(&config.root) {
            if let Some(model) = model_path(relative) {
                models.insert(model);
            }
        }
    }
    Ok(models)
}

fn model_path(relative: &Path) -> Option<String> {
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    (!parts.is_empty()).then(|| parts.join("/"))
}

fn print_done(session: &Session, action: &str, model: &str, version: VersionId, language: &Language) {
    if session.json() {
        println!(
            "{}",
            json!({ "action": action, "model": model, "version": version, "language": language.code() })
        );
    } else {
        println!(
            "{} {} {} ({}, {})",
            "✓".green().bold(),
            action,
            model.bold(),
            version.to_string().yellow(),
            language.code().cyan()
        );
    }
}

fn cmd_read(session: &Session, args: SlotArgs) -> anyhow::Result<()> {
    let storage = session.storage(&args.model)?;
    let lang = language(&storage, args.lang.as_deref())?;
    let version = version(args.draft);
    let fields = storage
        .read(version, &lang)
        .with_context(|| format!("reading {} ({version}, {lang})", args.model))?;

    if session.json() {
        println!("{}", serde_json::to_string_pretty(&fields)?);
        return Ok(());
    }
    if fields.is_empty() {
        println!("{}", "(no fields)".dimmed());
    }
    for (name, value) in fields.iter() {
        match value {
            FieldValue::String(text) => println!("{}: {}", name.bold(), text),
            other => println!("{}: {}", name.bold(), other),
        }
    }
    Ok(())
}

fn cmd_write(session: &Session, args: WriteArgs) -> anyhow::Result<()> {
    let guarded = session.guarded(&args.slot.model)?;
    let lang = language(guarded.storage(), args.slot.lang.as_deref())?;
    let version = version(args.slot.draft);
    let fields = parse_fields(args.json.as_deref(), &args.fields)?;

    if args.new {
        guarded.create_new(version, &lang, fields)?;
    } else {
        guarded.create(version, &lang, fields)?;
    }
    print_done(session, "wrote", &args.slot.model, version, &lang);
    Ok(())
}

fn cmd_update(session: &Session, args: WriteArgs) -> anyhow::Result<()> {
    let guarded = session.guarded(&args.slot.model)?;
    let lang = language(guarded.storage(), args.slot.lang.as_deref())?;
    let version = version(args.slot.draft);
    let fields = parse_fields(args.json.as_deref(), &args.fields)?;

    guarded
        .update(version, &lang, fields)
        .with_context(|| format!("updating {} ({version}, {lang})", args.slot.model))?;
    print_done(session, "updated", &args.slot.model, version, &lang);
    Ok(())
}

fn cmd_delete(session: &Session, args: SlotArgs) -> anyhow::Result<()> {
    let guarded = session.guarded(&args.model)?;
    let lang = language(guarded.storage(), args.lang.as_deref())?;
    let version = version(args.draft);
    guarded.delete(version, &lang)?;
    print_done(session, "deleted", &args.model, version, &lang);
    Ok(())
}

fn cmd_touch(session: &Session, args: SlotArgs) -> anyhow::Result<()> {
    let guarded = session.guarded(&args.model)?;
    let lang = language(guarded.storage(), args.lang.as_deref())?;
    let version = version(args.draft);
    guarded
        .touch(version, &lang)
        .with_context(|| format!("touching {} ({version}, {lang})", args.model))?;
    print_done(session, "touched", &args.model, version, &lang);
    Ok(())
}

fn cmd_list(session: &Session) -> anyhow::Result<()> {
    let models = find_models(&session.config.storage)?;
    if session.json() {
        println!("{}", serde_json::to_string_pretty(&models)?);
        return Ok(());
    }
    if models.is_empty() {
        println!("{}", "no models".dimmed());
    }
    for model in &models {
        println!("{model}");
    }
    Ok(())
}

fn cmd_status(session: &Session, args: StatusArgs) -> anyhow::Result<()> {
    let storage = session.storage(&args.model)?;
    let mut rows = Vec::new();
    for (version, lang) in storage.entries()? {
        let modified = storage.modified(version, &lang)?;
        rows.push((version, lang, modified));
    }

    if session.json() {
        let entries: Vec<_> = rows
            .iter()
            .map(|(version, lang, modified)| {
                json!({
                    "version": version,
                    "language": lang.code(),
                    "modified": modified.map(|m| m.as_millis()),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json!({ "model": args.model, "entries": entries }))?);
        return Ok(());
    }

    println!("Model {}", args.model.bold());
    if rows.is_empty() {
        println!("  {}", "no content".dimmed());
    }
    for (version, lang, modified) in &rows {
        let label = if version.is_changes() {
            "draft".yellow()
        } else {
            "published".green()
        };
        let modified = modified.map(format_time).unwrap_or_default();
        println!("  {:<10} {:<10} {}", label, lang.code().cyan(), modified.dimmed());
    }
    Ok(())
}

fn cmd_publish(session: &Session, args: LanguageArgs) -> anyhow::Result<()> {
    let guarded = session.guarded(&args.model)?;
    let lang = language(guarded.storage(), args.lang.as_deref())?;
    guarded
        .publish(&lang)
        .with_context(|| format!("publishing {} ({lang})", args.model))?;
    print_done(session, "published", &args.model, VersionId::Latest, &lang);
    Ok(())
}

fn cmd_discard(session: &Session, args: LanguageArgs) -> anyhow::Result<()> {
    let guarded = session.guarded(&args.model)?;
    let lang = language(guarded.storage(), args.lang.as_deref())?;
    guarded.discard(&lang)?;
    print_done(session, "discarded draft of", &args.model, VersionId::Changes, &lang);
    Ok(())
}

fn cmd_move(session: &Session, args: MoveArgs) -> anyhow::Result<()> {
    let guarded = session.guarded(&args.from.model)?;
    let from_lang = language(guarded.storage(), args.from.lang.as_deref())?;
    let from_version = version(args.from.draft);
    let to_version = version(args.to_draft);

    let target = match args.to_model.as_deref() {
        Some(model) if model != args.from.model => Some(session.storage(model)?),
        _ => None,
    };
    let to_lang = match &target {
        Some(storage) => language(storage, args.to_lang.as_deref().or(Some(from_lang.code())))?,
        None => language(guarded.storage(), args.to_lang.as_deref().or(Some(from_lang.code())))?,
    };

    guarded
        .move_to(
            from_version,
            &from_lang,
            to_version,
            &to_lang,
            target.as_ref().map(|storage| storage as &dyn ContentStorage),
        )
        .with_context(|| format!("moving {} ({from_version}, {from_lang})", args.from.model))?;

    let to_model = args.to_model.as_deref().unwrap_or(&args.from.model);
    print_done(session, "moved to", to_model, to_version, &to_lang);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::Path;

    fn run(root: &Path, args: &[&str]) -> anyhow::Result<()> {
        let root = root.to_str().unwrap();
        let mut argv = vec!["folio", "--root", root, "--config", "/nonexistent/folio.toml"];
        argv.extend_from_slice(args);
        run_command(Cli::try_parse_from(argv).unwrap())
    }

    fn storage(root: &Path, model: &str) -> PlainFileStorage {
        let config = FolioConfig::default().with_root(Some(root.to_path_buf()));
        PlainFileStorage::with_config(config.storage.clone(), config.model(model).unwrap())
    }

    #[test]
    fn fields_from_pairs() {
        let fields = parse_fields(None, &["title=Foo".into(), "count=3".into(), "flag=true".into()]).unwrap();
        assert_eq!(fields.get_str("title"), Some("Foo"));
        assert_eq!(fields.get("count"), Some(&json!(3)));
        assert_eq!(fields.get("flag"), Some(&json!(true)));
    }

    #[test]
    fn fields_pairs_override_json() {
        let fields = parse_fields(Some(r#"{"title":"Old","text":"Bar"}"#), &["title=New".into()]).unwrap();
        assert_eq!(fields.get_str("title"), Some("New"));
        assert_eq!(fields.get_str("text"), Some("Bar"));
    }

    #[test]
    fn fields_value_may_contain_equals() {
        let fields = parse_fields(None, &["query=a=b".into()]).unwrap();
        assert_eq!(fields.get_str("query"), Some("a=b"));
    }

    #[test]
    fn fields_reject_malformed() {
        assert!(parse_fields(None, &["novalue".into()]).is_err());
        assert!(parse_fields(None, &["=x".into()]).is_err());
        assert!(parse_fields(Some("[1,2]"), &[]).is_err());
    }

    #[test]
    fn user_resolution_order() {
        assert_eq!(resolve_user(Some("flag"), Some("config")).unwrap().as_str(), "flag");
        assert_eq!(resolve_user(None, Some("config")).unwrap().as_str(), "config");
        assert!(resolve_user(Some("  "), None).is_err());
    }

    #[test]
    fn write_read_publish_cycle() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), &["write", "blog/hello", "--draft", "-f", "title=Foo", "-f", "text=Bar"]).unwrap();
        run(dir.path(), &["read", "blog/hello", "--draft"]).unwrap();
        assert!(run(dir.path(), &["read", "blog/hello"]).is_err());

        run(dir.path(), &["publish", "blog/hello"]).unwrap();

        let files = storage(dir.path(), "blog/hello");
        let lang = Language::single();
        let fields = files.read(VersionId::Latest, &lang).unwrap();
        assert_eq!(fields.get_str("title"), Some("Foo"));
        assert!(!files.exists(VersionId::Changes, &lang).unwrap());
    }

    #[test]
    fn write_new_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), &["write", "blog/hello", "--new", "-f", "title=Foo"]).unwrap();
        assert!(run(dir.path(), &["write", "blog/hello", "--new", "-f", "title=Bar"]).is_err());
        run(dir.path(), &["write", "blog/hello", "-f", "title=Bar"]).unwrap();
    }

    #[test]
    fn update_requires_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(dir.path(), &["update", "blog/hello", "-f", "title=Foo"]).is_err());
        run(dir.path(), &["write", "blog/hello", "-f", "title=Foo"]).unwrap();
        run(dir.path(), &["update", "blog/hello", "-f", "text=Bar"]).unwrap();

        let fields = storage(dir.path(), "blog/hello")
            .read(VersionId::Latest, &Language::single())
            .unwrap();
        assert!(fields.get("title").is_none());
        assert_eq!(fields.get_str("text"), Some("Bar"));
    }

    #[test]
    fn discard_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), &["write", "blog/hello", "--draft", "-f", "title=Foo"]).unwrap();
        run(dir.path(), &["discard", "blog/hello"]).unwrap();
        run(dir.path(), &["delete", "blog/hello"]).unwrap();
        run(dir.path(), &["--format", "json", "status", "blog/hello"]).unwrap();
        assert!(storage(dir.path(), "blog/hello").entries().unwrap().is_empty());
    }

    #[test]
    fn move_to_other_model() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), &["write", "blog/hello", "-f", "title=Foo"]).unwrap();
        run(dir.path(), &["move", "blog/hello", "--to-model", "blog/renamed"]).unwrap();

        let lang = Language::single();
        assert!(!storage(dir.path(), "blog/hello").exists(VersionId::Latest, &lang).unwrap());
        let moved = storage(dir.path(), "blog/renamed").read(VersionId::Latest, &lang).unwrap();
        assert_eq!(moved.get_str("title"), Some("Foo"));
    }

    #[test]
    fn list_finds_published_and_draft_models() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), &["write", "blog/hello", "-f", "title=Foo"]).unwrap();
        run(dir.path(), &["write", "pages/about", "--draft", "-f", "title=About"]).unwrap();
        run(dir.path(), &["list"]).unwrap();

        let config = FolioConfig::default().with_root(Some(dir.path().to_path_buf()));
        let models: Vec<_> = find_models(&config.storage).unwrap().into_iter().collect();
        assert_eq!(models, vec!["blog/hello", "pages/about"]);
    }

    #[test]
    fn list_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = FolioConfig::default().with_root(Some(dir.path().join("absent")));
        assert!(find_models(&config.storage).unwrap().is_empty());
    }

    #[test]
    fn time_is_rfc3339() {
        assert_eq!(format_time(Timestamp::from_millis(0)), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn touch_missing_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(dir.path(), &["touch", "blog/hello"]).is_err());
    }

    #[test]
    fn unknown_language_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(dir.path(), &["write", "blog/hello", "-l", "fr", "-f", "title=Foo"]).is_err());
    }
}

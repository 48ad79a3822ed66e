use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use tracing::debug;

use tp_diff::{apply, compare, decode, DiffSettings, Operation, PatchConfig};
use tp_types::Value;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Diff(args) => cmd_diff(args, cli.format),
        Command::Apply(args) => cmd_apply(args),
        Command::Show(args) => cmd_show(args, cli.format),
    }
}

fn cmd_diff(args: DiffArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = load_settings(&args.settings)?.to_config();
    let op = diff_files(&args.old, &args.new, &config)?;
    print_json(&op.encode(), args.pretty)?;

    if format == OutputFormat::Text {
        let changes = count_changes(&op);
        if changes == 0 {
            eprintln!("{} No changes.", "✓".green().bold());
        } else {
            eprintln!(
                "{} {} change(s), root op {}",
                "✓".green().bold(),
                changes.to_string().bold(),
                op.tag().to_string().yellow()
            );
        }
    }
    Ok(())
}

fn cmd_apply(args: ApplyArgs) -> anyhow::Result<()> {
    let config = load_settings(&args.settings)?.to_config();
    let patched = apply_file(&args.patch, &args.base, &config)?;
    print_json(&patched.to_json(), args.pretty)
}

fn cmd_show(args: ShowArgs, format: OutputFormat) -> anyhow::Result<()> {
    let op = read_patch(&args.patch)?;
    match format {
        OutputFormat::Text => println!("{op}"),
        OutputFormat::Json => print_json(&op.encode(), true)?,
    }
    Ok(())
}

/// Settings from `--config`, with the root-level flags laid over them.
fn load_settings(args: &SettingsArgs) -> anyhow::Result<DiffSettings> {
    let base = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => DiffSettings::default(),
    };
    let flags = DiffSettings {
        sorted: args.sorted.then_some(true),
        map: (args.map || args.key.is_some()).then_some(true),
        key: args.key.clone(),
        ..DiffSettings::default()
    };
    let settings = base.merge(flags);
    debug!(?settings, "resolved settings");
    Ok(settings)
}

fn read_document(path: &Path) -> anyhow::Result<Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("parsing JSON in {}", path.display()))?;
    Ok(Value::from(json))
}

fn read_patch(path: &Path) -> anyhow::Result<Operation> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let node: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("parsing JSON in {}", path.display()))?;
    decode(&node).with_context(|| format!("decoding patch {}", path.display()))
}

fn diff_files(old: &Path, new: &Path, config: &PatchConfig) -> anyhow::Result<Operation> {
    let old = read_document(old)?;
    let new = read_document(new)?;
    Ok(compare(&old, &new, config))
}

fn apply_file(patch: &Path, base: &Path, config: &PatchConfig) -> anyhow::Result<Value> {
    let op = read_patch(patch)?;
    let base = read_document(base)?;
    match apply(&op, &base, config)? {
        Some(value) => Ok(value),
        None => bail!("patch removes the whole document"),
    }
}

fn print_json(json: &serde_json::Value, pretty: bool) -> anyhow::Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(json)?
    } else {
        serde_json::to_string(json)?
    };
    println!("{text}");
    Ok(())
}

/// Number of leaf edits (deletes, inserts and replacements) in a patch.
fn count_changes(op: &Operation) -> usize {
    match op {
        Operation::NoChange => 0,
        Operation::Delete | Operation::Insert(_) | Operation::Replace(_) => 1,
        Operation::Merge(fields) => fields.values().map(count_changes).sum(),
        Operation::MapDelta(rows) => rows.iter().map(|r| count_changes(&r.op)).sum(),
        Operation::SequenceDelta(rows) => rows.iter().map(|r| count_changes(&r.op)).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write(dir: &tempfile::TempDir, name: &str, text: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = write(&dir, "diff.toml", "sorted = false\nkey = \"id\"\n\n[fields.rows]\nmap = true\n");
        let args = SettingsArgs {
            config: Some(config),
            sorted: true,
            ..SettingsArgs::default()
        };
        let settings = load_settings(&args).unwrap();
        assert_eq!(settings.sorted, Some(true));
        assert_eq!(settings.key.as_deref(), Some("id"));
        assert_eq!(settings.fields["rows"].map, Some(true));
    }

    #[test]
    fn key_flag_implies_map() {
        let args = SettingsArgs {
            key: Some("id".into()),
            ..SettingsArgs::default()
        };
        assert_eq!(load_settings(&args).unwrap().map, Some(true));
    }

    #[test]
    fn diff_then_apply_files() {
        let dir = tempfile::tempdir().unwrap();
        let old = write(&dir, "old.json", r#"{"a": 1, "b": [1, 2]}"#);
        let new = write(&dir, "new.json", r#"{"a": 1, "b": [1, 2, 3]}"#);

        let op = diff_files(&old, &new, &PatchConfig::new()).unwrap();
        assert_eq!(op.to_string(), "Mrg { b: Arr [ Row { 2, Ins 3 } ] }");
        assert_eq!(count_changes(&op), 1);

        let patch = write(&dir, "patch.json", &serde_json::to_string(&op.encode()).unwrap());
        let patched = apply_file(&patch, &old, &PatchConfig::new()).unwrap();
        assert_eq!(patched.to_json(), serde_json::json!({"a": 1, "b": [1, 2, 3]}));
    }

    #[test]
    fn removing_the_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let base = write(&dir, "base.json", "1");
        let patch = write(&dir, "patch.json", r#"{"op": "Del"}"#);
        assert!(apply_file(&patch, &base, &PatchConfig::new()).is_err());
    }

    #[test]
    fn bad_patch_reports_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let patch = write(&dir, "patch.json", r#"{"op": "Nope"}"#);
        let err = read_patch(&patch).unwrap_err();
        assert!(format!("{err:#}").contains("unknown diff op: Nope"));
    }
}

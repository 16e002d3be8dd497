//! Line-oriented front-end over [`Editor`].

use crate::{BasicField, Editor, EditorError, LocalStore, PropertyField, UnitKey, statics};
use anyhow::Context;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    List,
    Select(UnitKey),
    Show,
    Set(BasicField, String),
    Prop(usize, PropertyField, String),
    Add,
    Remove(usize),
    Suggest(String),
    Accept(usize, String),
    Commit,
    New(String, String),
    Delete,
    Open(Option<PathBuf>),
    Save,
    Help,
    Quit,
}

fn parse_index(s: Option<&str>) -> Result<usize, String> {
    let s = s.ok_or("missing index")?;
    s.parse::<usize>()
        .map_err(|_| format!("invalid index `{s}`"))
}

fn required<'a>(s: Option<&'a str>, what: &str) -> Result<&'a str, String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("missing {what}"))
}

fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim_start();
    let cmd = match verb {
        "list" | "ls" => Command::List,
        "select" => {
            let mut parts = rest.split_whitespace();
            let unit_type = required(parts.next(), "type")?;
            let id = required(parts.next(), "id")?;
            let id = id.parse::<i64>().map_err(|_| format!("invalid id `{id}`"))?;
            Command::Select(UnitKey::new(unit_type, id))
        }
        "show" => Command::Show,
        "set" => {
            let (field, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let field = field.parse::<BasicField>().map_err(|e| e.to_string())?;
            Command::Set(field, value.trim().to_string())
        }
        "prop" => {
            let mut parts = rest.splitn(3, char::is_whitespace);
            let index = parse_index(parts.next())?;
            let field = required(parts.next(), "field")?
                .parse::<PropertyField>()
                .map_err(|e| e.to_string())?;
            Command::Prop(index, field, parts.next().unwrap_or_default().to_string())
        }
        "add" => Command::Add,
        "rm" => Command::Remove(parse_index(Some(rest))?),
        "suggest" => Command::Suggest(rest.to_string()),
        "accept" => {
            let mut parts = rest.splitn(2, char::is_whitespace);
            let index = parse_index(parts.next())?;
            Command::Accept(index, required(parts.next(), "key")?.to_string())
        }
        "commit" => Command::Commit,
        "new" => {
            let mut parts = rest.splitn(2, char::is_whitespace);
            let unit_type = required(parts.next(), "type")?;
            let name = required(parts.next(), "name")?;
            Command::New(unit_type.to_string(), name.to_string())
        }
        "delete" => Command::Delete,
        "open" => Command::Open(Some(rest).filter(|r| !r.is_empty()).map(PathBuf::from)),
        "save" => Command::Save,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command `{other}` (try `help`)")),
    };
    Ok(Some(cmd))
}

fn render_catalog(editor: &Editor) -> String {
    let groups = editor.groups();
    if groups.is_empty() {
        return statics::EN_EMPTY_CATALOG.to_string();
    }
    let selected = editor.selection();
    let mut out = String::new();
    for (label, units) in &groups {
        out.push_str(&format!("[{label}] ({})\n", units.len()));
        for unit in units {
            let mark = if selected.as_ref() == Some(&unit.key()) { '*' } else { ' ' };
            out.push_str(&format!(
                " {mark} {:>5}  {}\n",
                unit.id,
                unit.display_name()
            ));
        }
    }
    out.trim_end().to_string()
}

fn render_draft(editor: &Editor) -> String {
    let Some(draft) = editor.draft() else {
        return statics::EN_NO_SELECTION.to_string();
    };
    let ro = |field| {
        if editor.is_read_only(field) {
            statics::EN_READ_ONLY_MARK
        } else {
            ""
        }
    };
    let mut out = format!(
        "type: {}{}\nid:   {}{}\nname: {}{}\n",
        draft.unit_type(),
        ro(BasicField::Type),
        draft.id(),
        ro(BasicField::Id),
        draft.name(),
        ro(BasicField::Name),
    );
    if let Some(ui_name) = draft.ui_name() {
        out.push_str(&format!("ui:   {ui_name}\n"));
    }
    for (i, p) in draft.properties().iter().enumerate() {
        out.push_str(&format!("{i:>3}  {} = {}", p.key(), p.value()));
        if let Some(comment) = p.comment() {
            out.push_str(&format!("  ; {comment}"));
        }
        if let Some(desc) = editor.describe(p.key()) {
            out.push_str(&format!("  ({desc})"));
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

/// Run one command; returns the text to print.
async fn execute(editor: &Editor, store: &LocalStore, cmd: Command) -> Result<String, EditorError> {
    Ok(match cmd {
        Command::List => render_catalog(editor),
        Command::Select(key) => {
            editor.select(&key).await?;
            render_draft(editor)
        }
        Command::Show => render_draft(editor),
        Command::Set(field, value) => {
            editor.set_basic_field(field, &value)?;
            if field == BasicField::Type {
                editor.sync_schema().await?;
            }
            render_draft(editor)
        }
        Command::Prop(index, field, value) => {
            editor.upsert_property(index, field, &value)?;
            render_draft(editor)
        }
        Command::Add => {
            let index = editor.add_property().await?;
            format!("added property {index}")
        }
        Command::Remove(index) => {
            let removed = editor.delete_property(index)?;
            format!("removed {} = {}", removed.key(), removed.value())
        }
        Command::Suggest(input) => {
            let hits = editor.suggest(&input);
            if hits.is_empty() {
                statics::EN_NO_SUGGESTIONS.to_string()
            } else {
                hits.iter()
                    .map(|h| format!("{:<24} {}", h.key, h.description))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        Command::Accept(index, key) => {
            editor.accept_suggestion(index, &key)?;
            render_draft(editor)
        }
        Command::Commit => {
            editor.commit().await?;
            format!("saved\n{}", render_draft(editor))
        }
        Command::New(unit_type, name) => {
            let key = editor.create_unit(&unit_type, &name).await?;
            format!("created {key}\n{}", render_draft(editor))
        }
        Command::Delete => {
            let key = editor.delete_selected().await?;
            format!("deleted {key}")
        }
        Command::Open(path) => {
            // a new path only sticks once it has been read
            let previous = path.map(|path| store.replace_path(Some(path)));
            if let Err(e) = editor.open_file().await {
                if let Some(previous) = previous {
                    store.replace_path(previous);
                }
                return Err(e);
            }
            format!("loaded {} units", editor.units().len())
        }
        Command::Save => {
            editor.save_file().await?;
            match store.path() {
                Some(path) => format!("saved {}", path.display()),
                None => "saved".to_string(),
            }
        }
        Command::Help => statics::EN_HELP.to_string(),
        Command::Quit => String::new(),
    })
}

/// Read commands from `input` until EOF or `quit`, writing results to `output`.
pub async fn run_shell<R, W>(
    editor: &Editor,
    store: &LocalStore,
    input: R,
    mut output: W,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    loop {
        output.write_all(statics::EN_PROMPT.as_bytes()).await?;
        output.flush().await?;
        let Some(line) = lines.next_line().await.context("reading command")? else {
            break;
        };
        let reply = match parse_command(&line) {
            Ok(None) => continue,
            Ok(Some(Command::Quit)) => break,
            Ok(Some(cmd)) => match execute(editor, store, cmd).await {
                Ok(text) => text,
                Err(e) => format!("error: {e}"),
            },
            Err(e) => format!("error: {e}"),
        };
        output.write_all(reply.as_bytes()).await?;
        output.write_all(b"\n").await?;
    }
    output.flush().await?;
    Ok(())
}

//! 対話モード
//!
//! ダウンロード → 動画選択 → プレビュー → 確定、および保存済みアノテーションの
//! 修正・削除・エクスポートをメニューから行う。状態は SessionContext に集約する。

use crate::app::{print_record_detail, record_line, report_delete, App};
use crate::error::{FrameTagError, Result};
use crate::ledger::RecordEdit;
use crate::session::{PreviewState, SessionContext};
use dialoguer::{Confirm, Input, Select};
use frame_tagger_common::Timestamp;

/// メニュー項目
#[derive(Clone, Copy)]
enum MenuAction {
    Download,
    SelectVideo,
    Preview,
    Confirm,
    Discard,
    Browse,
    Export,
    Guide,
    Reload,
    Quit,
}

impl MenuAction {
    const ALL: [MenuAction; 10] = [
        MenuAction::Download,
        MenuAction::SelectVideo,
        MenuAction::Preview,
        MenuAction::Confirm,
        MenuAction::Discard,
        MenuAction::Browse,
        MenuAction::Export,
        MenuAction::Guide,
        MenuAction::Reload,
        MenuAction::Quit,
    ];

    fn label(&self) -> &'static str {
        match self {
            MenuAction::Download => "⬇ 動画をダウンロード",
            MenuAction::SelectVideo => "🎬 ダウンロード済み動画を選択",
            MenuAction::Preview => "📸 フレームをプレビュー",
            MenuAction::Confirm => "✅ プレビューを保存",
            MenuAction::Discard => "🗑 プレビューを破棄",
            MenuAction::Browse => "📑 保存済みアノテーション",
            MenuAction::Export => "📤 未アップロード分をエクスポート",
            MenuAction::Guide => "🧾 アノテーションガイド",
            MenuAction::Reload => "🔄 台帳を再読み込み",
            MenuAction::Quit => "終了",
        }
    }
}

fn prompt_err(e: dialoguer::Error) -> FrameTagError {
    FrameTagError::CliExecution(e.to_string())
}

pub async fn run_session(app: &mut App) -> Result<()> {
    let mut session = SessionContext::new();
    println!("🎬 frame-tag - 対話モード\n");

    loop {
        print_status(app, &session);

        let labels: Vec<&str> = MenuAction::ALL.iter().map(|a| a.label()).collect();
        let choice = Select::new()
            .with_prompt("操作を選択")
            .items(&labels)
            .default(0)
            .interact()
            .map_err(prompt_err)?;

        let outcome = match MenuAction::ALL[choice] {
            MenuAction::Download => download(app, &mut session).await,
            MenuAction::SelectVideo => select_video(app, &mut session),
            MenuAction::Preview => preview(app, &mut session),
            MenuAction::Confirm => confirm(app, &mut session),
            MenuAction::Discard => session.discard().map(|_| println!("✔ プレビューを破棄しました")),
            MenuAction::Browse => browse(app),
            MenuAction::Export => export(app),
            MenuAction::Guide => app.guide().map(|text| println!("{}\n", text)),
            MenuAction::Reload => {
                app.ledger.reload();
                println!("✔ 台帳を再読み込みしました（{}件）", app.ledger.len());
                Ok(())
            }
            MenuAction::Quit => break,
        };

        // 対話中のエラーは表示して続行
        if let Err(e) = outcome {
            println!("⚠ {}\n", e);
        }
    }

    if session.staged().is_some() {
        session.discard()?;
    }
    Ok(())
}

fn print_status(app: &App, session: &SessionContext) {
    println!("---");
    match session.video() {
        Some(video) => println!("動画: {} ({:.0}秒)", video.title, video.duration_secs),
        None => println!("動画: 未選択"),
    }
    match session.preview() {
        PreviewState::Empty => println!("プレビュー: なし"),
        PreviewState::Staged(staged) => println!(
            "プレビュー: {} [{}] {}x{} → {}",
            staged.timestamp,
            staged.category_code,
            staged.frame.width,
            staged.frame.height,
            staged.path.display()
        ),
        PreviewState::Confirmed(record) => println!("プレビュー: 保存済み {}", record.filename),
    }
    println!(
        "台帳: {}件（未アップロード {}件）",
        app.ledger.len(),
        app.ledger.pending_count()
    );
    println!("---");
}

async fn download(app: &mut App, session: &mut SessionContext) -> Result<()> {
    let url: String = Input::new()
        .with_prompt("動画URL")
        .interact_text()
        .map_err(prompt_err)?;

    let video = app.download(url.trim()).await?;
    println!("✔ {} ({})", video.title, video.path.display());

    let current = app.open_video(&video.video_id)?;
    session.load_video(current);
    Ok(())
}

fn select_video(app: &App, session: &mut SessionContext) -> Result<()> {
    if app.catalog.is_empty() {
        println!("ダウンロード済みの動画がありません");
        return Ok(());
    }

    let ids: Vec<&str> = app.catalog.iter().map(|(id, _)| id).collect();
    let titles: Vec<String> = app.catalog.iter().map(|(_, e)| e.title.clone()).collect();
    let choice = Select::new()
        .with_prompt("動画を選択")
        .items(&titles)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let current = app.open_video(ids[choice])?;
    println!("✔ 読み込みました: {}", current.title);
    session.load_video(current);
    Ok(())
}

fn choose_category(app: &App, default_code: Option<&str>) -> Result<String> {
    let categories = &app.config.categories;
    let display: Vec<String> = categories.iter().map(|c| c.display_name()).collect();
    let default = default_code
        .and_then(|code| categories.codes().position(|c| c == code))
        .unwrap_or(0);

    let choice = Select::new()
        .with_prompt("カテゴリ")
        .items(&display)
        .default(default)
        .interact()
        .map_err(prompt_err)?;

    categories
        .code_from_display(&display[choice])
        .map(str::to_string)
        .ok_or_else(|| FrameTagError::UnknownCategory(display[choice].clone()))
}

fn input_timestamp(prompt: &str, initial: &str) -> Result<String> {
    Input::new()
        .with_prompt(prompt)
        .with_initial_text(initial)
        .validate_with(|s: &String| -> std::result::Result<(), String> {
            Timestamp::parse(s).map(|_| ()).map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(prompt_err)
}

fn preview(app: &App, session: &mut SessionContext) -> Result<()> {
    if session.video().is_none() {
        return Err(FrameTagError::InvalidState("先に動画を選択してください".into()));
    }

    let category = choose_category(app, None)?;
    let timestamp = input_timestamp("タイムスタンプ (HH:MM:SS)", "00:00:00")?;
    let note: String = Input::new()
        .with_prompt("説明")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let staged = session.stage(
        &app.frames,
        &app.config.categories,
        app.workspace.preview_path(),
        &timestamp,
        &category,
        &note,
    )?;
    println!(
        "📸 プレビュー: {} ({}x{})",
        staged.path.display(),
        staged.frame.width,
        staged.frame.height
    );
    Ok(())
}

fn confirm(app: &mut App, session: &mut SessionContext) -> Result<()> {
    let saved = session.confirm(&mut app.ledger).map(|r| r.filename.clone());
    match saved {
        Ok(filename) => {
            println!("✔ 保存しました: {}", filename);
        }
        Err(e) if e.needs_confirmation() => {
            println!("⚠ {}", e);
            let proceed = Confirm::new()
                .with_prompt("それでも保存しますか？")
                .default(false)
                .interact()
                .map_err(prompt_err)?;
            if !proceed {
                return Ok(());
            }
            session.allow_duplicate();
            let record = session.confirm(&mut app.ledger)?;
            println!("✔ 保存しました: {}", record.filename);
        }
        Err(e) => return Err(e),
    }
    session.reset()
}

fn browse(app: &mut App) -> Result<()> {
    let pending_only = Confirm::new()
        .with_prompt("未アップロードのみ表示しますか？")
        .default(false)
        .interact()
        .map_err(prompt_err)?;

    let entries: Vec<(usize, String)> = app
        .ledger
        .listing(pending_only)
        .into_iter()
        .map(|(id, r)| (id, record_line(id, r)))
        .collect();
    if entries.is_empty() {
        println!("表示するアノテーションがありません");
        return Ok(());
    }

    let mut items: Vec<&str> = entries.iter().map(|(_, line)| line.as_str()).collect();
    items.push("戻る");
    let choice = Select::new()
        .with_prompt("アノテーションを選択")
        .items(&items)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    if choice == entries.len() {
        return Ok(());
    }

    let id = entries[choice].0;
    let record = app.ledger.get(id)?;
    print_record_detail(id, record, &app.ledger.image_path(record));

    let action = Select::new()
        .with_prompt("操作")
        .items(&["✏ 修正", "🗑 削除", "戻る"][..])
        .default(2)
        .interact()
        .map_err(prompt_err)?;

    match action {
        0 => edit(app, id),
        1 => {
            let yes = Confirm::new()
                .with_prompt("削除しますか？")
                .default(false)
                .interact()
                .map_err(prompt_err)?;
            if yes {
                let outcome = app.ledger.delete(id)?;
                report_delete(&outcome);
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn edit(app: &mut App, id: usize) -> Result<()> {
    let current = app.ledger.get(id)?.clone();

    let category = choose_category(app, Some(&current.category_code))?;
    let timestamp = input_timestamp("タイムスタンプ (HH:MM:SS)", &current.timestamp)?;
    let note: String = Input::new()
        .with_prompt("説明")
        .with_initial_text(current.note.clone())
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let mut changes = RecordEdit {
        category_code: Some(category),
        note: Some(note),
        timestamp: Some(Timestamp::parse(&timestamp)?),
        force: false,
    };
    let edited = app.ledger.edit(id, changes.clone()).map(|r| r.filename.clone());
    let filename = match edited {
        Ok(filename) => filename,
        Err(e) if e.needs_confirmation() => {
            println!("⚠ {}", e);
            let proceed = Confirm::new()
                .with_prompt("それでも修正しますか？")
                .default(false)
                .interact()
                .map_err(prompt_err)?;
            if !proceed {
                return Ok(());
            }
            changes.force = true;
            app.ledger.edit(id, changes)?.filename.clone()
        }
        Err(e) => return Err(e),
    };
    println!("✔ 修正しました: {}", filename);
    Ok(())
}

fn export(app: &mut App) -> Result<()> {
    let include_note = Confirm::new()
        .with_prompt("説明を含めますか？")
        .default(app.config.include_note_in_export)
        .interact()
        .map_err(prompt_err)?;

    let outcome = app.ledger.export_unuploaded(include_note)?;
    match outcome.path {
        Some(path) => println!("✔ エクスポートしました: {}件 → {}", outcome.count, path.display()),
        None => println!("エクスポートするアノテーションがありません"),
    }
    Ok(())
}

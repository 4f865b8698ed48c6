use anyhow::Context;
use clap::Parser;
use dialoguer::Confirm;
use frame_tagger::app::{self, App};
use frame_tagger::cli::{Cli, Commands};
use frame_tagger::config::Config;
use frame_tagger::session::SessionContext;
use frame_tagger::{error, interactive, ledger, logging};
use frame_tagger_common::Timestamp;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;
    let mut config = Config::load().context("設定ファイルの読み込みに失敗")?;

    if let Commands::Config { set_base_dir, show } = &cli.command {
        if let Some(dir) = set_base_dir {
            config.set_base_dir(dir.clone())?;
            println!("✔ 作業ディレクトリを設定しました");
        }

        if *show {
            println!("設定: {}", Config::config_path()?.display());
            println!(
                "  作業ディレクトリ: {}",
                config.resolve_base_dir(cli.base_dir.clone())?.display()
            );
            println!("  ダウンローダ: {}", config.downloader);
            println!(
                "  Cookie: {}",
                config.cookies_from_browser.as_deref().unwrap_or("なし")
            );
            println!("  ffmpeg: {} / ffprobe: {}", config.ffmpeg, config.ffprobe);
            println!("  画質 (-q:v): {}", config.frame_quality);
            println!("  エクスポートに説明を含める: {}", config.include_note_in_export);
            println!("  カテゴリ: {}件", config.categories.len());
        }
        return Ok(());
    }

    let base_dir = config.resolve_base_dir(cli.base_dir.clone())?;
    let mut app = App::open(config, base_dir.clone())
        .with_context(|| format!("作業ディレクトリを開けません: {}", base_dir.display()))?;

    match cli.command {
        Commands::Download { url } => {
            println!("⬇ frame-tag - ダウンロード\n");
            let video = app.download(&url).await?;
            if video.skipped {
                println!("✅ 動画は既に存在します: {}", video.path.display());
            } else {
                println!(
                    "✅ ダウンロード完了: {}{}",
                    video.title,
                    video.total_size.map(|s| format!("（{}）", s)).unwrap_or_default()
                );
            }
        }

        Commands::Videos => {
            if app.catalog.is_empty() {
                println!("ダウンロード済みの動画がありません");
            }
            for (id, entry) in app.catalog.iter() {
                println!("{:<14} {}", id, entry.title);
                println!("{:<14} {}", "", entry.video_url);
            }
        }

        Commands::Preview { video, at } => {
            let current = app.open_video(&video)?;
            let mut session = SessionContext::new();
            session.load_video(current);

            let staged = session.stage(
                &app.frames,
                &app.config.categories,
                app.workspace.preview_path(),
                &at,
                first_category(&app)?,
                "",
            )?;
            println!(
                "📸 プレビュー: {} ({}x{}) @ {}",
                staged.path.display(),
                staged.frame.width,
                staged.frame.height,
                staged.timestamp
            );
        }

        Commands::Save { video, at, category, note, force } => {
            println!("📸 frame-tag - 保存\n");
            let current = app.open_video(&video)?;
            let mut session = SessionContext::new();
            session.load_video(current);

            session.stage(
                &app.frames,
                &app.config.categories,
                app.workspace.preview_path(),
                &at,
                &category,
                &note,
            )?;
            if force {
                session.allow_duplicate();
            }

            match session.confirm(&mut app.ledger).map(|r| r.filename.clone()) {
                Ok(filename) => println!("✅ 保存しました: {}", filename),
                Err(e) => {
                    session.discard()?;
                    if e.needs_confirmation() {
                        println!("⚠ {}", e);
                        println!("  保存する場合は --force を付けてください");
                        return Ok(());
                    }
                    return Err(e.into());
                }
            }
        }

        Commands::List { pending } => {
            let entries = app.ledger.listing(pending);
            if entries.is_empty() {
                println!("表示するアノテーションがありません");
            }
            for (id, record) in entries {
                println!("{}", app::record_line(id, record));
            }
        }

        Commands::Show { number } => {
            let id = app::record_id_from_display(number)?;
            let record = app.ledger.get(id)?;
            app::print_record_detail(id, record, &app.ledger.image_path(record));
        }

        Commands::Edit { number, category, note, at, force } => {
            let id = app::record_id_from_display(number)?;
            let timestamp = at
                .as_deref()
                .map(Timestamp::parse)
                .transpose()
                .map_err(error::FrameTagError::from)?;
            let changes = ledger::RecordEdit { category_code: category, note, timestamp, force };

            match app.ledger.edit(id, changes).map(|r| r.filename.clone()) {
                Ok(filename) => println!("✅ 修正しました: #{} {}", number, filename),
                Err(e) if e.needs_confirmation() => {
                    println!("⚠ {}", e);
                    println!("  修正する場合は --force を付けてください");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Delete { number, yes } => {
            let id = app::record_id_from_display(number)?;
            let line = app::record_line(id, app.ledger.get(id)?);

            let confirmed = yes
                || Confirm::new()
                    .with_prompt(format!("削除しますか？ {}", line))
                    .default(false)
                    .interact()
                    .map_err(|e| error::FrameTagError::CliExecution(e.to_string()))?;
            if confirmed {
                let outcome = app.ledger.delete(id)?;
                app::report_delete(&outcome);
            }
        }

        Commands::Export { no_note } => {
            println!("📤 frame-tag - エクスポート\n");
            let include_note = app.config.include_note_in_export && !no_note;
            let outcome = app.ledger.export_unuploaded(include_note)?;
            match outcome.path {
                Some(path) => println!("✅ エクスポート成功: {}件 → {}", outcome.count, path.display()),
                None => println!("エクスポートするアノテーションがありません"),
            }
        }

        Commands::Guide => {
            println!("{}", app.guide()?);
        }

        Commands::Categories => {
            for category in app.config.categories.iter() {
                println!("{}", category.display_name());
            }
        }

        Commands::Session => {
            interactive::run_session(&mut app).await?;
        }

        Commands::Config { .. } => unreachable!(),
    }

    Ok(())
}

/// プレビューだけならカテゴリは何でもよい
fn first_category(app: &App) -> error::Result<&str> {
    app.config
        .categories
        .codes()
        .next()
        .ok_or_else(|| error::FrameTagError::Config("カテゴリが1つも定義されていません".into()))
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "frame-tag")]
#[command(about = "動画フレーム切り出し・アノテーション台帳ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 作業ディレクトリ（videos/ frames/ meta/ を置く場所）
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 動画をダウンロードしてカタログに登録
    Download {
        /// 動画URL
        #[arg(required = true)]
        url: String,
    },

    /// ダウンロード済み動画の一覧
    Videos,

    /// フレームを切り出してプレビュー（preview.jpg）を作成
    Preview {
        /// 動画ID またはタイトル
        #[arg(short = 'V', long)]
        video: String,

        /// タイムスタンプ（HH:MM:SS）
        #[arg(short, long)]
        at: String,
    },

    /// フレームを切り出して台帳に保存
    Save {
        /// 動画ID またはタイトル
        #[arg(short = 'V', long)]
        video: String,

        /// タイムスタンプ（HH:MM:SS）
        #[arg(short, long)]
        at: String,

        /// カテゴリコード
        #[arg(short, long)]
        category: String,

        /// 説明
        #[arg(short, long, default_value = "")]
        note: String,

        /// 同じ動画・同じタイムスタンプがあっても保存
        #[arg(long)]
        force: bool,
    },

    /// 保存済みアノテーションの一覧（新しい順）
    List {
        /// 未アップロードのみ表示
        #[arg(long)]
        pending: bool,
    },

    /// アノテーションの詳細
    Show {
        /// 一覧の番号
        number: usize,
    },

    /// アノテーションを修正（アップロード状態は未に戻る）
    Edit {
        /// 一覧の番号
        number: usize,

        /// 新しいカテゴリコード
        #[arg(short, long)]
        category: Option<String>,

        /// 新しい説明
        #[arg(short, long)]
        note: Option<String>,

        /// 新しいタイムスタンプ（HH:MM:SS）
        #[arg(short, long)]
        at: Option<String>,

        /// 同じ動画・同じタイムスタンプの別レコードがあっても保存
        #[arg(long)]
        force: bool,
    },

    /// アノテーションと画像を削除
    Delete {
        /// 一覧の番号
        number: usize,

        /// 確認しない
        #[arg(short, long)]
        yes: bool,
    },

    /// 未アップロードのアノテーションをエクスポート
    Export {
        /// 説明（explanation）を含めない
        #[arg(long)]
        no_note: bool,
    },

    /// アノテーションガイドを表示
    Guide,

    /// カテゴリ一覧
    Categories,

    /// 対話モード
    Session,

    /// 設定を表示/編集
    Config {
        /// 作業ディレクトリを設定
        #[arg(long)]
        set_base_dir: Option<PathBuf>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    /// `-v` は詳細ログ、動画は `-V`
    #[test]
    fn test_save_short_options() {
        let cli = Cli::try_parse_from([
            "frame-tag", "-v", "save", "-V", "abc", "-a", "00:01:00", "-c", "PF", "--force",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Save { video, at, category, note, force } => {
                assert_eq!(video, "abc");
                assert_eq!(at, "00:01:00");
                assert_eq!(category, "PF");
                assert_eq!(note, "");
                assert!(force);
            }
            _ => panic!("save として解析されていない"),
        }
    }

    #[test]
    fn test_edit_force() {
        let cli = Cli::try_parse_from(["frame-tag", "edit", "2", "--at", "00:00:01", "--force"]).unwrap();

        match cli.command {
            Commands::Edit { number, category, at, force, .. } => {
                assert_eq!(number, 2);
                assert!(category.is_none());
                assert_eq!(at.as_deref(), Some("00:00:01"));
                assert!(force);
            }
            _ => panic!("edit として解析されていない"),
        }
    }

    #[test]
    fn test_preview_with_global_verbose_after_subcommand() {
        let cli = Cli::try_parse_from(["frame-tag", "preview", "--video", "abc", "--at", "0:0:5", "-v"]).unwrap();

        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Preview { ref video, .. } if video == "abc"));
    }
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use instaclone_server::db::{
    repositories::{CommentRepository, PostRepository},
    Database,
};
use instaclone_server::session::SessionManager;
use uuid::Uuid;

/// Instaclone database administration
///
/// Operates directly on the SQLite file: schema setup, demo data,
/// statistics, moderation and session housekeeping.
#[derive(Parser, Debug)]
#[command(name = "instaclone-admin")]
#[command(about = "Administer an Instaclone database", long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(short, long, global = true, env = "DATABASE_PATH", default_value = "./instaclone.db")]
    database: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the schema (safe to run repeatedly)
    Init,
    /// Load the demo accounts, posts and relations
    Seed,
    /// Print row counts
    Stats,
    /// Show or hide a post
    PostActive {
        id: Uuid,
        #[arg(action = clap::ArgAction::Set)]
        active: bool,
    },
    /// Show or hide a comment
    CommentActive {
        id: Uuid,
        #[arg(action = clap::ArgAction::Set)]
        active: bool,
    },
    /// Remove sessions whose refresh token has expired
    CleanupSessions,
}

/// Row counts reported by `stats`
#[derive(Debug, Default, PartialEq, Eq)]
struct DatabaseStats {
    users: i64,
    active_posts: i64,
    hidden_posts: i64,
    active_comments: i64,
    hidden_comments: i64,
    likes: i64,
    follows: i64,
    unread_notifications: i64,
    sessions: i64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let db = open_database(&args.database)?;

    match args.command {
        Command::Init => {
            db.initialize()?;
            println!("Schema ready in {}", args.database);
        }
        Command::Seed => {
            db.initialize()?;
            db.seed_demo_data()?;
            println!(
                "Demo data loaded (password: {})",
                instaclone_server::db::schema::DEMO_PASSWORD
            );
        }
        Command::Stats => display_stats(&collect_stats(&db)?),
        Command::PostActive { id, active } => {
            set_post_active(&db, &id, active)?;
            println!("Post {} is now {}", id, visibility(active));
        }
        Command::CommentActive { id, active } => {
            set_comment_active(&db, &id, active)?;
            println!("Comment {} is now {}", id, visibility(active));
        }
        Command::CleanupSessions => {
            let removed = cleanup_sessions(&db)?;
            println!("Removed {} expired sessions", removed);
        }
    }

    Ok(())
}

fn open_database(path: &str) -> Result<Database> {
    println!("Connecting to database: {}", path);
    Database::new(path).context("Failed to open database connection")
}

fn visibility(active: bool) -> &'static str {
    if active {
        "visible"
    } else {
        "hidden"
    }
}

fn collect_stats(db: &Database) -> Result<DatabaseStats> {
    let conn = db.connection()?;
    let count = |sql: &str| -> Result<i64> {
        conn.query_row(sql, [], |row| row.get(0))
            .with_context(|| format!("Failed to run {}", sql))
    };

    Ok(DatabaseStats {
        users: count("SELECT COUNT(*) FROM users")?,
        active_posts: count("SELECT COUNT(*) FROM posts WHERE is_active = 1")?,
        hidden_posts: count("SELECT COUNT(*) FROM posts WHERE is_active = 0")?,
        active_comments: count("SELECT COUNT(*) FROM comments WHERE is_active = 1")?,
        hidden_comments: count("SELECT COUNT(*) FROM comments WHERE is_active = 0")?,
        likes: count("SELECT COUNT(*) FROM post_likes")?,
        follows: count("SELECT COUNT(*) FROM follows")?,
        unread_notifications: count("SELECT COUNT(*) FROM notifications WHERE is_read = 0")?,
        sessions: count("SELECT COUNT(*) FROM sessions")?,
    })
}

fn display_stats(stats: &DatabaseStats) {
    println!("\n=== Database Statistics ===");
    println!("Users:                {}", stats.users);
    println!("Posts (active):       {}", stats.active_posts);
    println!("Posts (hidden):       {}", stats.hidden_posts);
    println!("Comments (active):    {}", stats.active_comments);
    println!("Comments (hidden):    {}", stats.hidden_comments);
    println!("Likes:                {}", stats.likes);
    println!("Follows:              {}", stats.follows);
    println!("Unread notifications: {}", stats.unread_notifications);
    println!("Sessions:             {}", stats.sessions);
}

fn set_post_active(db: &Database, id: &Uuid, active: bool) -> Result<()> {
    if !PostRepository::new(db.pool.clone()).set_active(id, active)? {
        anyhow::bail!("Post not found: {}", id);
    }
    Ok(())
}

fn set_comment_active(db: &Database, id: &Uuid, active: bool) -> Result<()> {
    if !CommentRepository::new(db.pool.clone()).set_active(id, active)? {
        anyhow::bail!("Comment not found: {}", id);
    }
    Ok(())
}

fn cleanup_sessions(db: &Database) -> Result<usize> {
    // lifetimes only matter when issuing tokens
    let sessions = SessionManager::new(
        db.clone(),
        chrono::Duration::minutes(60),
        chrono::Duration::days(7),
    );
    sessions.cleanup_expired_sessions()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const INACTIVE_POST: &str = "650e8400-e29b-41d4-a716-446655440006";
    const REMOVED_COMMENT: &str = "850e8400-e29b-41d4-a716-446655440003";

    fn seeded() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::new(dir.path().join("admin.db")).unwrap();
        db.initialize().unwrap();
        db.seed_demo_data().unwrap();
        (dir, db)
    }

    #[test]
    fn test_stats_after_seed() {
        let (_dir, db) = seeded();
        let stats = collect_stats(&db).unwrap();
        assert_eq!(stats.users, 4);
        assert_eq!(stats.active_posts, 6);
        assert_eq!(stats.hidden_posts, 1);
        assert_eq!(stats.hidden_comments, 1);
        assert_eq!(stats.sessions, 0);
    }

    #[test]
    fn test_moderation_toggles_visibility() {
        let (_dir, db) = seeded();
        let post = Uuid::parse_str(INACTIVE_POST).unwrap();
        set_post_active(&db, &post, true).unwrap();
        assert_eq!(collect_stats(&db).unwrap().hidden_posts, 0);

        let comment = Uuid::parse_str(REMOVED_COMMENT).unwrap();
        set_comment_active(&db, &comment, true).unwrap();
        assert_eq!(collect_stats(&db).unwrap().hidden_comments, 0);

        assert!(set_post_active(&db, &Uuid::new_v4(), false).is_err());
    }

    #[test]
    fn test_seed_is_repeatable() {
        let (_dir, db) = seeded();
        db.seed_demo_data().unwrap();
        assert_eq!(collect_stats(&db).unwrap().users, 4);
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let args = Args::try_parse_from([
            "instaclone-admin",
            "post-active",
            INACTIVE_POST,
            "false",
            "--database",
            "x.db",
        ])
        .unwrap();
        assert_eq!(args.database, "x.db");
        assert!(matches!(args.command, Command::PostActive { active: false, .. }));
    }
}

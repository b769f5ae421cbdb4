/// SQL schema for the Instaclone database
/// Creates all tables with proper constraints, foreign keys, and indexes.
///
/// Timestamps are fixed-width RFC 3339 strings (microsecond precision, `Z`
/// suffix) so that string order matches time order.
pub const SCHEMA: &str = r#"
-- Users table
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT UNIQUE NOT NULL,
    email TEXT UNIQUE NOT NULL,
    first_name TEXT NOT NULL DEFAULT '',
    last_name TEXT NOT NULL DEFAULT '',
    password_hash TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    date_joined TEXT NOT NULL
);

-- Profiles table (one per user)
CREATE TABLE IF NOT EXISTS profiles (
    user_id TEXT PRIMARY KEY,
    bio TEXT NOT NULL DEFAULT '' CHECK(length(bio) <= 500),
    profile_image TEXT DEFAULT 'profiles/default-profile.png',
    birth_date TEXT,
    location TEXT NOT NULL DEFAULT '' CHECK(length(location) <= 100),
    website TEXT NOT NULL DEFAULT '',
    is_private INTEGER NOT NULL DEFAULT 0,
    email_notifications INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

-- Posts table; rows are soft-deleted through is_active
CREATE TABLE IF NOT EXISTS posts (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    image TEXT,
    caption TEXT NOT NULL DEFAULT '' CHECK(length(caption) <= 2000),
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CHECK(image IS NOT NULL OR length(trim(caption)) > 0),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_posts_user_created ON posts(user_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_posts_active_created ON posts(is_active, created_at DESC);

-- Likes (one row per user and post)
CREATE TABLE IF NOT EXISTS post_likes (
    post_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (post_id, user_id),
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_post_likes_user ON post_likes(user_id);

-- Comments table; rows are moderated through is_active
CREATE TABLE IF NOT EXISTS comments (
    id TEXT PRIMARY KEY,
    post_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    content TEXT NOT NULL CHECK(length(content) <= 500 AND length(trim(content)) > 0),
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_comments_post_created ON comments(post_id, created_at);
CREATE INDEX IF NOT EXISTS idx_comments_user_created ON comments(user_id, created_at DESC);

-- Follows table (directed edges, unique and irreflexive)
CREATE TABLE IF NOT EXISTS follows (
    id TEXT PRIMARY KEY,
    follower_id TEXT NOT NULL,
    following_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (follower_id, following_id),
    CHECK (follower_id <> following_id),
    FOREIGN KEY (follower_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (following_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_follows_follower ON follows(follower_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_follows_following ON follows(following_id, created_at DESC);

-- Notifications; post_id/comment_id hold the target reference for the kind
CREATE TABLE IF NOT EXISTS notifications (
    id TEXT PRIMARY KEY,
    recipient_id TEXT NOT NULL,
    sender_id TEXT NOT NULL,
    kind TEXT NOT NULL CHECK(kind IN ('like', 'comment', 'follow', 'mention')),
    message TEXT NOT NULL CHECK(length(message) <= 255),
    post_id TEXT,
    comment_id TEXT,
    is_read INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    FOREIGN KEY (recipient_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (sender_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_notifications_recipient_created ON notifications(recipient_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_notifications_recipient_read ON notifications(recipient_id, is_read);

-- Sessions (access + refresh token pairs)
CREATE TABLE IF NOT EXISTS sessions (
    access_token TEXT PRIMARY KEY,
    refresh_token TEXT UNIQUE NOT NULL,
    user_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    access_expires_at TEXT NOT NULL,
    refresh_expires_at TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
CREATE INDEX IF NOT EXISTS idx_sessions_refresh_expires ON sessions(refresh_expires_at);
"#;

/// Password shared by every demo account
pub const DEMO_PASSWORD: &str = "instaclone-demo";

/// Demo data for development
/// - 4 users (alice, bob, charlie, diana) with profiles
/// - posts with captions and images, one soft-deleted
/// - follows, likes and comments between them
///
/// Password hashes are written as `!` and replaced with a real hash of
/// [`DEMO_PASSWORD`] by `Database::seed_demo_data`.
pub const DEMO_DATA: &str = r#"
-- ============================================================================
-- USERS & PROFILES
-- ============================================================================
INSERT OR IGNORE INTO users (id, username, email, first_name, last_name, password_hash, is_active, date_joined) VALUES
    ('550e8400-e29b-41d4-a716-446655440001', 'alice', 'alice@example.com', 'Alice', 'Liddell', '!', 1, '2024-01-01T00:00:00.000000Z'),
    ('550e8400-e29b-41d4-a716-446655440002', 'bob', 'bob@example.com', 'Bob', 'Builder', '!', 1, '2024-01-02T00:00:00.000000Z'),
    ('550e8400-e29b-41d4-a716-446655440003', 'charlie', 'charlie@example.com', 'Charlie', 'Chaplin', '!', 1, '2024-01-03T00:00:00.000000Z'),
    ('550e8400-e29b-41d4-a716-446655440004', 'diana', 'diana@example.com', 'Diana', 'Prince', '!', 1, '2024-01-04T00:00:00.000000Z');

INSERT OR IGNORE INTO profiles (user_id, bio, location, website, is_private, email_notifications, created_at, updated_at) VALUES
    ('550e8400-e29b-41d4-a716-446655440001', 'Chasing light with a 35mm lens', 'Oxford', 'https://alice.example.com', 0, 1, '2024-01-01T00:00:00.000000Z', '2024-01-01T00:00:00.000000Z'),
    ('550e8400-e29b-41d4-a716-446655440002', 'Weekend hikes and workshop builds', 'Bristol', '', 0, 1, '2024-01-02T00:00:00.000000Z', '2024-01-02T00:00:00.000000Z'),
    ('550e8400-e29b-41d4-a716-446655440003', 'Street photography', 'London', '', 0, 0, '2024-01-03T00:00:00.000000Z', '2024-01-03T00:00:00.000000Z'),
    ('550e8400-e29b-41d4-a716-446655440004', 'Coffee, cats and film grain', '', '', 1, 1, '2024-01-04T00:00:00.000000Z', '2024-01-04T00:00:00.000000Z');

-- ============================================================================
-- POSTS
-- ============================================================================
INSERT OR IGNORE INTO posts (id, user_id, image, caption, is_active, created_at, updated_at) VALUES
    ('650e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440001', 'posts/alice/sunrise.jpg', 'Sunrise over the river', 1, '2024-01-10T07:00:00.000000Z', '2024-01-10T07:00:00.000000Z'),
    ('650e8400-e29b-41d4-a716-446655440002', '550e8400-e29b-41d4-a716-446655440001', NULL, 'Which lens should I take on holiday?', 1, '2024-01-11T09:30:00.000000Z', '2024-01-11T09:30:00.000000Z'),
    ('650e8400-e29b-41d4-a716-446655440003', '550e8400-e29b-41d4-a716-446655440002', 'posts/bob/ridge.png', 'Ridge walk', 1, '2024-01-10T12:00:00.000000Z', '2024-01-10T12:00:00.000000Z'),
    ('650e8400-e29b-41d4-a716-446655440004', '550e8400-e29b-41d4-a716-446655440002', 'posts/bob/bench.webp', '', 1, '2024-01-12T18:00:00.000000Z', '2024-01-12T18:00:00.000000Z'),
    ('650e8400-e29b-41d4-a716-446655440005', '550e8400-e29b-41d4-a716-446655440003', 'posts/charlie/market.jpg', 'Saturday market', 1, '2024-01-13T10:15:00.000000Z', '2024-01-13T10:15:00.000000Z'),
    ('650e8400-e29b-41d4-a716-446655440006', '550e8400-e29b-41d4-a716-446655440003', NULL, 'Deleted draft', 0, '2024-01-13T11:00:00.000000Z', '2024-01-13T11:05:00.000000Z'),
    ('650e8400-e29b-41d4-a716-446655440007', '550e8400-e29b-41d4-a716-446655440004', 'posts/diana/cat.jpg', 'Supervisor on duty', 1, '2024-01-14T08:45:00.000000Z', '2024-01-14T08:45:00.000000Z');

-- ============================================================================
-- FOLLOWS
-- ============================================================================
INSERT OR IGNORE INTO follows (id, follower_id, following_id, created_at) VALUES
    ('750e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440002', '2024-01-05T00:00:00.000000Z'),
    ('750e8400-e29b-41d4-a716-446655440002', '550e8400-e29b-41d4-a716-446655440002', '550e8400-e29b-41d4-a716-446655440001', '2024-01-05T01:00:00.000000Z'),
    ('750e8400-e29b-41d4-a716-446655440003', '550e8400-e29b-41d4-a716-446655440003', '550e8400-e29b-41d4-a716-446655440001', '2024-01-06T00:00:00.000000Z'),
    ('750e8400-e29b-41d4-a716-446655440004', '550e8400-e29b-41d4-a716-446655440004', '550e8400-e29b-41d4-a716-446655440003', '2024-01-07T00:00:00.000000Z');

-- ============================================================================
-- LIKES
-- ============================================================================
INSERT OR IGNORE INTO post_likes (post_id, user_id, created_at) VALUES
    ('650e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440002', '2024-01-10T08:00:00.000000Z'),
    ('650e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440003', '2024-01-10T09:00:00.000000Z'),
    ('650e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440004', '2024-01-10T10:00:00.000000Z'),
    ('650e8400-e29b-41d4-a716-446655440003', '550e8400-e29b-41d4-a716-446655440001', '2024-01-10T13:00:00.000000Z'),
    ('650e8400-e29b-41d4-a716-446655440005', '550e8400-e29b-41d4-a716-446655440001', '2024-01-13T11:00:00.000000Z'),
    ('650e8400-e29b-41d4-a716-446655440005', '550e8400-e29b-41d4-a716-446655440004', '2024-01-13T12:00:00.000000Z');

-- ============================================================================
-- COMMENTS
-- ============================================================================
INSERT OR IGNORE INTO comments (id, post_id, user_id, content, is_active, created_at, updated_at) VALUES
    ('850e8400-e29b-41d4-a716-446655440001', '650e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440002', 'Those colours!', 1, '2024-01-10T08:05:00.000000Z', '2024-01-10T08:05:00.000000Z'),
    ('850e8400-e29b-41d4-a716-446655440002', '650e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440003', 'Worth the early alarm', 1, '2024-01-10T09:05:00.000000Z', '2024-01-10T09:05:00.000000Z'),
    ('850e8400-e29b-41d4-a716-446655440003', '650e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440004', 'removed by moderator', 0, '2024-01-10T10:05:00.000000Z', '2024-01-10T10:30:00.000000Z'),
    ('850e8400-e29b-41d4-a716-446655440004', '650e8400-e29b-41d4-a716-446655440002', '550e8400-e29b-41d4-a716-446655440002', 'The 28mm, always', 1, '2024-01-11T10:00:00.000000Z', '2024-01-11T10:00:00.000000Z');
"#;

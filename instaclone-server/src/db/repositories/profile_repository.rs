use anyhow::{Context, Result};
use rusqlite::{OptionalExtension, Row};
use uuid::Uuid;

use instaclone_types::Profile;

use crate::db::query;
use crate::db::DbPool;

const PROFILE_COLUMNS: &str = "user_id, bio, profile_image, birth_date, location, website, \
     is_private, email_notifications, created_at, updated_at";

fn profile_from_row(row: &Row) -> rusqlite::Result<Profile> {
    Ok(Profile {
        user_id: query::uuid_at(row, 0)?,
        bio: row.get(1)?,
        profile_image: row.get(2)?,
        birth_date: query::date_at(row, 3)?,
        location: row.get(4)?,
        website: row.get(5)?,
        is_private: row.get(6)?,
        email_notifications: row.get(7)?,
        created_at: query::datetime_at(row, 8)?,
        updated_at: query::datetime_at(row, 9)?,
    })
}

pub struct ProfileRepository {
    pool: DbPool,
}

impl ProfileRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn get(&self, user_id: &Uuid) -> Result<Option<Profile>> {
        let conn = self.pool.get()?;
        let profile = conn
            .query_row(
                &format!("SELECT {} FROM profiles WHERE user_id = ?", PROFILE_COLUMNS),
                [user_id.to_string()],
                profile_from_row,
            )
            .optional()
            .context("Failed to load profile")?;
        Ok(profile)
    }

    /// Write every editable column and bump `updated_at`
    pub fn update(&self, profile: &Profile) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE profiles
             SET bio = ?1, profile_image = ?2, birth_date = ?3, location = ?4, website = ?5,
                 is_private = ?6, email_notifications = ?7, updated_at = ?8
             WHERE user_id = ?9",
            rusqlite::params![
                profile.bio,
                profile.profile_image,
                profile.birth_date.map(|d| d.format("%Y-%m-%d").to_string()),
                profile.location,
                profile.website,
                profile.is_private,
                profile.email_notifications,
                query::now(),
                profile.user_id.to_string(),
            ],
        )
        .context("Failed to update profile")?;
        Ok(())
    }

    /// Whether the user accepts notifications; users without a profile do
    pub fn notifications_enabled(&self, user_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let enabled: Option<bool> = conn
            .query_row(
                "SELECT email_notifications FROM profiles WHERE user_id = ?",
                [user_id.to_string()],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to read notification preference")?;
        Ok(enabled.unwrap_or(true))
    }
}

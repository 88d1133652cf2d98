use crate::errors::EngineResult;
use crate::infrastructure::persistence::Database;
use crate::models::Holiday;
use sqlx::Row;

impl Database {
    /// Create a new holiday
    pub async fn create_holiday(&self, holiday: &Holiday) -> EngineResult<()> {
        sqlx::query(
            "INSERT INTO holidays (id, name, date, recurring, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&holiday.id)
        .bind(&holiday.name)
        .bind(&holiday.date)
        .bind(holiday.recurring)
        .bind(&holiday.created_at)
        .bind(&holiday.updated_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// All holidays, ordered by date; the calendar snapshot is built from
    /// this once per evaluation pass.
    pub async fn list_holidays(&self) -> EngineResult<Vec<Holiday>> {
        let rows = sqlx::query(
            "SELECT id, name, date, recurring, created_at, updated_at
             FROM holidays ORDER BY date ASC",
        )
        .fetch_all(self.pool())
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Holiday {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    date: row.try_get("date")?,
                    recurring: row.try_get::<i64, _>("recurring")? != 0,
                    created_at: row.try_get("created_at")?,
                    updated_at: row.try_get("updated_at")?,
                })
            })
            .collect()
    }

    /// Delete a holiday
    pub async fn delete_holiday(&self, id: &str) -> EngineResult<()> {
        sqlx::query("DELETE FROM holidays WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(())
    }
}

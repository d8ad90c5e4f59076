//! Task operations.

use super::Database;
use crate::context::UserContext;
use crate::models::{CreateTask, ListTasksFilter, Task, TaskStatus, UpdateTask};
use crate::services::metrics::DB_QUERY_DURATION;
use backoffice_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

const TASK_COLUMNS: &str = "task_id, title, description, partner_id, assigned_to, due_date, \
     status, created_by, created_utc, modified_by, modified_utc";

impl Database {
    /// Create a task in the `open` state.
    #[instrument(skip(self, input, ctx))]
    pub async fn create_task(
        &self,
        input: &CreateTask,
        ctx: &UserContext,
    ) -> Result<Task, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_task"])
            .start_timer();

        if let Some(partner_id) = input.partner_id {
            self.require_active_partner(partner_id).await?;
        }

        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (
                task_id, title, description, partner_id, assigned_to, due_date,
                status, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, 'open', $7)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.partner_id)
        .bind(input.assigned_to)
        .bind(input.due_date)
        .bind(ctx.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create task: {}", e)))?;

        timer.observe_duration();

        info!(task_id = %task.task_id, "Task created");

        Ok(task)
    }

    /// Get a task by ID.
    #[instrument(skip(self), fields(task_id = %task_id))]
    pub async fn get_task(&self, task_id: Uuid) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE task_id = $1"
        ))
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get task: {}", e)))?;

        Ok(task)
    }

    /// List tasks.
    #[instrument(skip(self, filter))]
    pub async fn list_tasks(&self, filter: &ListTasksFilter) -> Result<Vec<Task>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_tasks"])
            .start_timer();

        let limit = filter.page_size.clamp(1, 100) as i64;
        let status = filter.status.map(|s| s.as_str().to_string());

        let tasks = if let Some(cursor) = filter.page_token {
            sqlx::query_as::<_, Task>(&format!(
                r#"
                SELECT {TASK_COLUMNS}
                FROM tasks
                WHERE ($1::uuid IS NULL OR partner_id = $1)
                  AND ($2::uuid IS NULL OR assigned_to = $2)
                  AND ($3::varchar IS NULL OR status = $3)
                  AND task_id > $4
                ORDER BY task_id
                LIMIT $5
                "#
            ))
            .bind(filter.partner_id)
            .bind(filter.assigned_to)
            .bind(&status)
            .bind(cursor)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, Task>(&format!(
                r#"
                SELECT {TASK_COLUMNS}
                FROM tasks
                WHERE ($1::uuid IS NULL OR partner_id = $1)
                  AND ($2::uuid IS NULL OR assigned_to = $2)
                  AND ($3::varchar IS NULL OR status = $3)
                ORDER BY task_id
                LIMIT $4
                "#
            ))
            .bind(filter.partner_id)
            .bind(filter.assigned_to)
            .bind(&status)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list tasks: {}", e)))?;

        timer.observe_duration();

        Ok(tasks)
    }

    /// Update a task. Completed and cancelled tasks stay as they are.
    #[instrument(skip(self, input, ctx), fields(task_id = %task_id))]
    pub async fn update_task(
        &self,
        task_id: Uuid,
        input: &UpdateTask,
        ctx: &UserContext,
    ) -> Result<Option<Task>, AppError> {
        let task = match self.get_task(task_id).await? {
            Some(t) => t,
            None => return Ok(None),
        };

        let current = TaskStatus::from_string(&task.status);
        if matches!(current, TaskStatus::Done | TaskStatus::Cancelled) {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Task is already {}",
                current.as_str()
            )));
        }

        let status = input.status.map(|s| s.as_str().to_string());
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                assigned_to = COALESCE($4, assigned_to),
                due_date = COALESCE($5, due_date),
                status = COALESCE($6, status),
                modified_by = $7,
                modified_utc = NOW()
            WHERE task_id = $1
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(task_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.assigned_to)
        .bind(input.due_date)
        .bind(&status)
        .bind(ctx.user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update task: {}", e)))?;

        Ok(task)
    }

    /// Remove a task.
    #[instrument(skip(self), fields(task_id = %task_id))]
    pub async fn delete_task(&self, task_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE task_id = $1")
            .bind(task_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete task: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

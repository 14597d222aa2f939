use super::*;

impl PostgresLeadRepository {
    pub(super) async fn create_impl(&self, lead: NewLead) -> AppResult<LeadRecord> {
        let row = sqlx::query_as::<_, LeadRow>(&format!(
            r#"
            INSERT INTO leads (company_name, contact_name, email, phone, status, source, value, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {LEAD_COLUMNS}
            "#
        ))
        .bind(lead.company_name.as_str())
        .bind(lead.contact_name.as_str())
        .bind(lead.email.as_str())
        .bind(lead.phone.as_deref())
        .bind(lead.status.as_str())
        .bind(lead.source.as_str())
        .bind(lead.value)
        .bind(lead.owner_id.as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(owner_reference_or_internal)?;

        LeadRecord::try_from(row)
    }

    pub(super) async fn update_impl(
        &self,
        lead_id: LeadId,
        patch: LeadPatch,
    ) -> AppResult<Option<LeadRecord>> {
        // COALESCE keeps stored values for absent patch fields; updated_at is
        // always refreshed, even for an empty patch.
        let row = sqlx::query_as::<_, LeadRow>(&format!(
            r#"
            UPDATE leads l SET
                company_name = COALESCE($2, company_name),
                contact_name = COALESCE($3, contact_name),
                email        = COALESCE($4, email),
                phone        = COALESCE($5, phone),
                status       = COALESCE($6, status),
                source       = COALESCE($7, source),
                value        = COALESCE($8, value),
                owner_id     = COALESCE($9, owner_id),
                updated_at   = NOW()
            WHERE l.id = $1
            RETURNING {LEAD_COLUMNS}
            "#
        ))
        .bind(lead_id.as_i64())
        .bind(patch.company_name.as_deref())
        .bind(patch.contact_name.as_deref())
        .bind(patch.email.as_deref())
        .bind(patch.phone.as_deref())
        .bind(patch.status.map(|status| status.as_str()))
        .bind(patch.source.as_deref())
        .bind(patch.value)
        .bind(patch.owner_id.map(|owner| owner.as_i64()))
        .fetch_optional(&self.pool)
        .await
        .map_err(owner_reference_or_internal)?;

        row.map(LeadRecord::try_from).transpose()
    }

    pub(super) async fn delete_impl(&self, lead_id: LeadId) -> AppResult<()> {
        // One transaction: either the lead and every activity go, or nothing
        // does. Readers never observe orphaned activities.
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to start delete: {error}")))?;

        let activities = sqlx::query("DELETE FROM activities WHERE lead_id = $1")
            .bind(lead_id.as_i64())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to delete lead activities: {error}"))
            })?;

        sqlx::query("DELETE FROM leads WHERE id = $1")
            .bind(lead_id.as_i64())
            .execute(&mut *transaction)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete lead: {error}")))?;

        transaction
            .commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit delete: {error}")))?;

        tracing::debug!(
            lead_id = lead_id.as_i64(),
            cascaded = activities.rows_affected(),
            "lead deleted"
        );

        Ok(())
    }
}

fn owner_reference_or_internal(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error
        && database_error.code().as_deref() == Some("23503")
    {
        return AppError::Validation("ownerId must reference an existing user".to_owned());
    }

    AppError::Internal(format!("failed to write lead: {error}"))
}

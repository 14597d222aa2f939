use super::*;

impl PostgresLeadRepository {
    pub(super) async fn list_impl(
        &self,
        visibility: LeadVisibility,
    ) -> AppResult<Vec<LeadWithOwner>> {
        let owner_filter: Option<i64> = match visibility {
            LeadVisibility::All => None,
            LeadVisibility::OwnedBy(owner) => Some(owner.as_i64()),
        };

        let rows = sqlx::query_as::<_, LeadOwnerRow>(&format!(
            r#"
            SELECT {LEAD_COLUMNS}, {OWNER_COLUMNS}
            FROM leads l
            LEFT JOIN users u ON u.id = l.owner_id
            WHERE ($1::BIGINT IS NULL OR l.owner_id = $1)
            ORDER BY l.created_at DESC, l.id DESC
            "#
        ))
        .bind(owner_filter)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list leads: {error}")))?;

        rows.into_iter().map(LeadWithOwner::try_from).collect()
    }

    pub(super) async fn find_impl(&self, lead_id: LeadId) -> AppResult<Option<LeadRecord>> {
        let row = sqlx::query_as::<_, LeadRow>(&format!(
            "SELECT {LEAD_COLUMNS} FROM leads l WHERE l.id = $1 LIMIT 1"
        ))
        .bind(lead_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find lead: {error}")))?;

        row.map(LeadRecord::try_from).transpose()
    }

    pub(super) async fn find_with_owner_impl(
        &self,
        lead_id: LeadId,
    ) -> AppResult<Option<LeadWithOwner>> {
        let row = sqlx::query_as::<_, LeadOwnerRow>(&format!(
            r#"
            SELECT {LEAD_COLUMNS}, {OWNER_COLUMNS}
            FROM leads l
            LEFT JOIN users u ON u.id = l.owner_id
            WHERE l.id = $1
            LIMIT 1
            "#
        ))
        .bind(lead_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find lead with owner: {error}")))?;

        row.map(LeadWithOwner::try_from).transpose()
    }
}

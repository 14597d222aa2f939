//! Aggregation engine: dashboard statistics and analytics rollups.
//!
//! [`compute_stats`] and [`compute_analytics`] are pure functions over
//! snapshots that have already passed the caller's visibility filter; the
//! service wraps them with repository reads and the policy check. Day and
//! month buckets use UTC boundaries.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;

use leadflow_core::{AppResult, UserIdentity};
use leadflow_domain::LeadStatus;

use crate::access::{self, LeadVisibility, Operation};
use crate::activity_service::{ActivityRecord, ActivityRepository};
use crate::lead_service::{LeadRecord, LeadRepository};
use crate::user_service::{UserRecord, UserRepository};

/// Number of trailing calendar days covered by the recent-activity series.
pub const RECENT_ACTIVITY_DAYS: i64 = 7;

/// Number of trailing calendar months covered by the lead trend.
pub const LEAD_TREND_MONTHS: i32 = 6;

/// Activity count for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivityCount {
    /// UTC calendar day.
    pub date: NaiveDate,
    /// Activities created on that day.
    pub count: i64,
}

/// Dashboard statistics over the caller's visible leads and activities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Total visible leads.
    pub total_leads: i64,
    /// Leads still in the active pipeline (neither won nor lost).
    pub active_leads: i64,
    /// Leads currently won.
    pub converted_leads: i64,
    /// Sum of lead values; missing values count as zero.
    pub total_value: i64,
    /// Lead count per status present in the snapshot.
    pub leads_by_status: BTreeMap<String, i64>,
    /// Lead count per source present in the snapshot.
    pub leads_by_source: BTreeMap<String, i64>,
    /// Activity counts for the trailing seven days, chronological; days with
    /// no activity appear with count zero.
    pub recent_activity: Vec<DailyActivityCount>,
}

/// Lead counts for one calendar month of the trend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyLeadCount {
    /// Month label, e.g. `"Mar 2026"`.
    pub month: String,
    /// Leads created in that month.
    pub total: i64,
    /// Leads created in that month that are currently won. Attribution is by
    /// creation month, not by when the lead was won.
    pub won: i64,
}

/// Rollup for one lead owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerPerformance {
    /// Owner display name.
    pub name: String,
    /// Owned lead count.
    pub leads: i64,
    /// Owned leads currently won.
    pub won: i64,
    /// Total value of the owner's won leads.
    pub value: i64,
}

/// Share of one status in the total lead count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusShare {
    /// Capitalized status label.
    pub label: String,
    /// Leads in this status.
    pub count: i64,
    /// Percentage of all leads.
    pub percentage: f64,
}

/// Analytics report over the full lead set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    /// Won leads as a percentage of all leads; zero when there are none.
    pub conversion_rate: f64,
    /// Mean value of won leads; missing values count as zero.
    pub avg_deal_size: f64,
    /// Mean days between creation and last update of won leads. The update
    /// timestamp stands in for a close timestamp, so any later edit to a won
    /// lead shifts this metric.
    pub avg_time_to_close: f64,
    /// Created/won counts for the trailing six months, chronological.
    pub lead_trend: Vec<MonthlyLeadCount>,
    /// Rollup per user owning at least one lead.
    pub performance_by_user: Vec<OwnerPerformance>,
    /// Share of each status present in the lead set.
    pub status_distribution: Vec<StatusShare>,
}

/// Computes dashboard statistics over a visible snapshot.
#[must_use]
pub fn compute_stats(
    leads: &[LeadRecord],
    activities: &[ActivityRecord],
    now: DateTime<Utc>,
) -> DashboardStats {
    let total_leads = leads.len() as i64;
    let active_leads = leads.iter().filter(|lead| lead.status.is_open()).count() as i64;
    let converted_leads = leads
        .iter()
        .filter(|lead| lead.status == LeadStatus::Won)
        .count() as i64;
    let total_value = leads.iter().filter_map(|lead| lead.value).sum();

    let mut leads_by_status = BTreeMap::new();
    let mut leads_by_source = BTreeMap::new();
    for lead in leads {
        *leads_by_status
            .entry(lead.status.as_str().to_owned())
            .or_insert(0) += 1;
        *leads_by_source.entry(lead.source.clone()).or_insert(0) += 1;
    }

    let today = now.date_naive();
    let recent_activity = (0..RECENT_ACTIVITY_DAYS)
        .rev()
        .map(|back| {
            let date = today - Duration::days(back);
            let count = activities
                .iter()
                .filter(|activity| activity.created_at.date_naive() == date)
                .count() as i64;
            DailyActivityCount { date, count }
        })
        .collect();

    DashboardStats {
        total_leads,
        active_leads,
        converted_leads,
        total_value,
        leads_by_status,
        leads_by_source,
        recent_activity,
    }
}

/// Computes the analytics report over the full lead set.
#[must_use]
pub fn compute_analytics(
    leads: &[LeadRecord],
    users: &[UserRecord],
    now: DateTime<Utc>,
) -> AnalyticsReport {
    let total = leads.len();
    let won: Vec<&LeadRecord> = leads
        .iter()
        .filter(|lead| lead.status == LeadStatus::Won)
        .collect();

    let conversion_rate = if total == 0 {
        0.0
    } else {
        100.0 * won.len() as f64 / total as f64
    };

    let avg_deal_size = if won.is_empty() {
        0.0
    } else {
        won.iter().filter_map(|lead| lead.value).sum::<i64>() as f64 / won.len() as f64
    };

    let avg_time_to_close = if won.is_empty() {
        0.0
    } else {
        let total_days: f64 = won
            .iter()
            .map(|lead| (lead.updated_at - lead.created_at).num_seconds() as f64 / 86_400.0)
            .sum();
        total_days / won.len() as f64
    };

    let today = now.date_naive();
    let lead_trend = (0..LEAD_TREND_MONTHS)
        .rev()
        .map(|back| {
            let (year, month) = month_back(today, back);
            let in_month = |lead: &&LeadRecord| {
                let created = lead.created_at.date_naive();
                created.year() == year && created.month() == month
            };
            MonthlyLeadCount {
                month: month_label(year, month),
                total: leads.iter().filter(in_month).count() as i64,
                won: leads
                    .iter()
                    .filter(in_month)
                    .filter(|lead| lead.status == LeadStatus::Won)
                    .count() as i64,
            }
        })
        .collect();

    let performance_by_user = users
        .iter()
        .filter_map(|user| {
            let owned: Vec<&LeadRecord> =
                leads.iter().filter(|lead| lead.owner_id == user.id).collect();
            if owned.is_empty() {
                return None;
            }

            let won_owned: Vec<&&LeadRecord> = owned
                .iter()
                .filter(|lead| lead.status == LeadStatus::Won)
                .collect();
            Some(OwnerPerformance {
                name: user.full_name.clone(),
                leads: owned.len() as i64,
                won: won_owned.len() as i64,
                value: won_owned.iter().filter_map(|lead| lead.value).sum(),
            })
        })
        .collect();

    let status_distribution = LeadStatus::ALL
        .iter()
        .filter_map(|status| {
            let count = leads.iter().filter(|lead| lead.status == *status).count() as i64;
            if count == 0 {
                return None;
            }

            Some(StatusShare {
                label: status.label().to_owned(),
                count,
                percentage: 100.0 * count as f64 / total as f64,
            })
        })
        .collect();

    AnalyticsReport {
        conversion_rate,
        avg_deal_size,
        avg_time_to_close,
        lead_trend,
        performance_by_user,
        status_distribution,
    }
}

/// Returns the (year, month) pair `back` whole months before `date`'s month.
fn month_back(date: NaiveDate, back: i32) -> (i32, u32) {
    let total = date.year() * 12 + date.month0() as i32 - back;
    (total.div_euclid(12), total.rem_euclid(12) as u32 + 1)
}

fn month_label(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|date| date.format("%b %Y").to_string())
        .unwrap_or_else(|| format!("{year}-{month:02}"))
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Application service wrapping the pure aggregation functions with
/// repository reads and the policy check.
#[derive(Clone)]
pub struct AnalyticsService {
    leads: Arc<dyn LeadRepository>,
    activities: Arc<dyn ActivityRepository>,
    users: Arc<dyn UserRepository>,
}

impl AnalyticsService {
    /// Creates a new analytics service.
    #[must_use]
    pub fn new(
        leads: Arc<dyn LeadRepository>,
        activities: Arc<dyn ActivityRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            leads,
            activities,
            users,
        }
    }

    /// Computes dashboard statistics over the caller's visible snapshot.
    pub async fn stats(&self, identity: &UserIdentity) -> AppResult<DashboardStats> {
        let visibility = access::lead_visibility(identity);
        let leads: Vec<LeadRecord> = self
            .leads
            .list(visibility)
            .await?
            .into_iter()
            .map(|with_owner| with_owner.lead)
            .collect();
        let activities = self.activities.list_visible(visibility).await?;

        Ok(compute_stats(&leads, &activities, Utc::now()))
    }

    /// Computes the analytics report over the full lead set. Admin and
    /// manager only.
    pub async fn analytics(&self, identity: &UserIdentity) -> AppResult<AnalyticsReport> {
        access::require(identity, Operation::ReadAnalytics)?;

        let leads: Vec<LeadRecord> = self
            .leads
            .list(LeadVisibility::All)
            .await?
            .into_iter()
            .map(|with_owner| with_owner.lead)
            .collect();
        let users = self.users.list().await?;

        Ok(compute_analytics(&leads, &users, Utc::now()))
    }
}

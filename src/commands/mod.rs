mod calendar;
mod config_cmd;
mod plan;
mod sync_cmd;

pub use calendar::CalendarCommand;
pub use config_cmd::ConfigCommand;
pub use plan::PlanCommand;
pub use sync_cmd::SyncCommand;

use chrono::NaiveDate;
use clap::ValueEnum;
use fitplan_core::{PlanRepository, ShareId, SharedWorkoutPlan};
use uuid::Uuid;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format '{}'. Use YYYY-MM-DD.", s))
}

/// Plan id from a UUID, share id or share link.
///
/// A UUID is taken as-is so plans deleted after a sync can still be referenced.
pub(crate) async fn resolve_plan_id(
    plans: &PlanRepository,
    reference: &str,
) -> Result<Uuid, Box<dyn std::error::Error>> {
    if let Ok(id) = Uuid::parse_str(reference) {
        return Ok(id);
    }
    Ok(resolve_plan(plans, reference).await?.id)
}

/// Loads a plan by UUID, share id or share link.
pub(crate) async fn resolve_plan(
    plans: &PlanRepository,
    reference: &str,
) -> Result<SharedWorkoutPlan, Box<dyn std::error::Error>> {
    let plan = if let Ok(id) = Uuid::parse_str(reference) {
        plans.get(id).await?
    } else {
        let share_id = ShareId::parse(reference).map_err(|_| {
            format!(
                "Invalid plan reference '{}'. Use a plan ID or share link.",
                reference
            )
        })?;
        plans.find_by_share_id(&share_id).await?
    };

    plan.ok_or_else(|| format!("Plan not found: {}", reference).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitplan_core::MemoryStore;
    use std::sync::Arc;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-01-03").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()
        );
        assert!(parse_date("01/03/2024").unwrap_err().contains("YYYY-MM-DD"));
    }

    #[tokio::test]
    async fn test_resolve_plan_by_id_and_share_link() {
        let plans = PlanRepository::new(Arc::new(MemoryStore::new()));
        let plan = SharedWorkoutPlan::new("PPL", "coach");
        plans.put(&plan).await.unwrap();

        let by_id = resolve_plan(&plans, &plan.id.to_string()).await.unwrap();
        let by_link = resolve_plan(&plans, &plan.share_id.to_link()).await.unwrap();
        assert_eq!(by_id.id, plan.id);
        assert_eq!(by_link.id, plan.id);

        let err = resolve_plan(&plans, "not-a-plan").await.unwrap_err();
        assert!(err.to_string().contains("Invalid plan reference"));
    }

    #[tokio::test]
    async fn test_resolve_plan_id_accepts_unknown_uuid() {
        let plans = PlanRepository::new(Arc::new(MemoryStore::new()));
        let id = Uuid::new_v4();
        assert_eq!(resolve_plan_id(&plans, &id.to_string()).await.unwrap(), id);
        assert!(resolve_plan(&plans, &id.to_string()).await.is_err());
    }
}

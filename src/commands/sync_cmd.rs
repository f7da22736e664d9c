use clap::{Args, Subcommand};

use fitplan_core::{
    RemovalResult, Session, SyncOptions, SyncReceipt, SyncResult, MAX_REPEAT_WEEKS,
};

use super::{parse_date, resolve_plan, resolve_plan_id, OutputFormat};

#[derive(Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    pub command: SyncSubcommand,
}

#[derive(Subcommand)]
pub enum SyncSubcommand {
    /// Show which dates a plan would fill and where it collides
    Preview {
        /// Plan ID (UUID), share id or share link
        plan: String,

        /// First date of the plan (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// Number of weeks to lay the plan down (at most 520)
        #[arg(long, default_value_t = 1, value_parser = weeks_parser())]
        weeks: u32,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Write a plan into the calendar
    Apply {
        /// Plan ID (UUID), share id or share link
        plan: String,

        /// First date of the plan (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// Keep existing workouts on conflicting dates
        #[arg(long)]
        skip_conflicts: bool,

        /// Overwrite existing workouts on conflicting dates
        #[arg(long)]
        replace: bool,

        /// Flag every written workout as modified
        #[arg(long)]
        mark_modified: bool,

        /// Number of weeks to lay the plan down (at most 520)
        #[arg(long, default_value_t = 1, value_parser = weeks_parser())]
        weeks: u32,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show sync receipts
    Status {
        /// Plan ID (UUID), share id or share link; all plans if omitted
        plan: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Remove the workouts a plan's syncs wrote
    Remove {
        /// Plan ID (UUID), share id or share link
        plan: String,
    },
}

impl SyncCommand {
    pub async fn run(&self, session: &Session) -> Result<(), Box<dyn std::error::Error>> {
        let engine = session.sync_engine();
        let plans = session.plans();

        match &self.command {
            SyncSubcommand::Preview {
                plan,
                start,
                weeks,
                format,
            } => {
                let plan = resolve_plan(plans, plan).await?;
                let options = SyncOptions::new(parse_date(start)?).repeat_weeks(*weeks);
                let preview = engine.prepare_sync_with(&plan, &options).await?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&preview)?);
                    }
                    OutputFormat::Text => {
                        println!("Plan: {}", plan.title);
                        println!("Dates: {}", preview.dates.len());
                        for date in &preview.dates {
                            let marker = if preview.conflicts.iter().any(|c| c.date == *date) {
                                "  CONFLICT"
                            } else {
                                ""
                            };
                            println!("  {} {}{}", date, date.format("%a"), marker);
                        }
                        if preview.has_conflicts() {
                            println!();
                            print_conflicts(preview.conflicts.iter());
                        }
                    }
                }
                Ok(())
            }

            SyncSubcommand::Apply {
                plan,
                start,
                skip_conflicts,
                replace,
                mark_modified,
                weeks,
                format,
            } => {
                let plan = resolve_plan(plans, plan).await?;
                let mut options = SyncOptions::new(parse_date(start)?).repeat_weeks(*weeks);
                options.skip_conflicts = *skip_conflicts;
                options.replace_existing = *replace;
                options.modify_plan = *mark_modified;

                let result = engine.execute_sync(&plan, &options).await;

                if let OutputFormat::Json = format {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                }

                match result {
                    SyncResult::Synced { synced_dates } => {
                        if let OutputFormat::Text = format {
                            println!(
                                "Synced {} to {} date(s)",
                                plan.title,
                                synced_dates.len()
                            );
                            for date in &synced_dates {
                                println!("  {}", date);
                            }
                        }
                        Ok(())
                    }
                    SyncResult::Conflict { conflicts } => {
                        if let OutputFormat::Text = format {
                            print_conflicts(conflicts.iter());
                            println!(
                                "\nRe-run with --skip-conflicts to keep existing workouts or --replace to overwrite them."
                            );
                        }
                        Err(format!("Sync stopped: {} conflict(s)", conflicts.len()).into())
                    }
                    SyncResult::Failed { message } => {
                        Err(format!("Sync failed: {}", message).into())
                    }
                }
            }

            SyncSubcommand::Status { plan, format } => {
                let receipts = match plan {
                    Some(reference) => {
                        let plan_id = resolve_plan_id(plans, reference).await?;
                        match engine.get_sync_status(plan_id).await? {
                            Some(receipt) => vec![receipt],
                            None => {
                                println!("Plan {} has not been synced", plan_id);
                                return Ok(());
                            }
                        }
                    }
                    None => engine.list_sync_statuses().await?,
                };

                if receipts.is_empty() {
                    println!("No synced plans");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&receipts)?);
                    }
                    OutputFormat::Text => {
                        for receipt in &receipts {
                            print_receipt(session, receipt).await?;
                        }
                    }
                }
                Ok(())
            }

            SyncSubcommand::Remove { plan } => {
                let plan_id = resolve_plan_id(plans, plan).await?;
                match engine.remove_synced_workouts(plan_id).await {
                    RemovalResult::Removed { dates } => {
                        println!("Removed {} workout(s) synced from {}", dates.len(), plan_id);
                        Ok(())
                    }
                    RemovalResult::NothingToRemove => {
                        println!("Nothing to remove for {}", plan_id);
                        Ok(())
                    }
                    RemovalResult::Failed { message } => {
                        Err(format!("Removal failed: {}", message).into())
                    }
                }
            }
        }
    }
}

fn weeks_parser() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(1..=i64::from(MAX_REPEAT_WEEKS))
}

fn print_conflicts<'a>(conflicts: impl Iterator<Item = &'a fitplan_core::Conflict>) {
    println!("Conflicts:");
    for conflict in conflicts {
        println!(
            "  {} (day {}): {} -> {}",
            conflict.date, conflict.weekday, conflict.existing.title, conflict.incoming.title
        );
    }
}

async fn print_receipt(
    session: &Session,
    receipt: &SyncReceipt,
) -> Result<(), Box<dyn std::error::Error>> {
    let title = match session.plans().get(receipt.plan_id).await? {
        Some(plan) => plan.title,
        None => "(deleted plan)".to_string(),
    };
    println!("{} [{}]", title, receipt.plan_id);
    println!("  {}", receipt);
    println!();
    Ok(())
}

use clap::{Args, Subcommand};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use fitplan_core::{
    DailyWorkout, Difficulty, PlanUpdate, Session, SharedWorkoutPlan, Visibility, WeekdayIndex,
};

use super::{resolve_plan, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct PlanCommand {
    #[command(subcommand)]
    pub command: PlanSubcommand,
}

#[derive(Subcommand)]
pub enum PlanSubcommand {
    /// Create a plan from a YAML definition
    Import {
        /// Path to the plan file
        file: PathBuf,
    },

    /// List all plans
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show plan details
    Show {
        /// Plan ID (UUID), share id or share link
        plan: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Change who can see a plan and print its share link
    Share {
        /// Plan ID (UUID), share id or share link
        plan: String,

        /// Visibility (private, friends, public)
        #[arg(long)]
        visibility: String,
    },

    /// Delete a plan
    Delete {
        /// Plan ID (UUID), share id or share link
        plan: String,
    },
}

/// Plan definition as written in an import file.
#[derive(Debug, Deserialize)]
struct PlanFile {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    difficulty: Difficulty,
    #[serde(default)]
    visibility: Visibility,
    #[serde(default)]
    schedule: BTreeMap<WeekdayIndex, DailyWorkout>,
}

impl PlanFile {
    fn into_plan(self, default_author: &str) -> SharedWorkoutPlan {
        let author = self.author.unwrap_or_else(|| default_author.to_string());
        let mut plan = SharedWorkoutPlan::new(self.title, author)
            .with_difficulty(self.difficulty)
            .with_visibility(self.visibility);
        plan.description = self.description;
        for (weekday, workout) in self.schedule {
            plan.set_workout(weekday, workout);
        }
        plan
    }
}

impl PlanCommand {
    pub async fn run(
        &self,
        session: &Session,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let plans = session.plans();

        match &self.command {
            PlanSubcommand::Import { file } => {
                let contents = std::fs::read_to_string(file)
                    .map_err(|e| format!("Failed to read '{}': {}", file.display(), e))?;
                let definition: PlanFile = serde_yaml::from_str(&contents)
                    .map_err(|e| format!("Failed to parse '{}': {}", file.display(), e))?;

                let plan = definition.into_plan(&config.user.value);
                plans.put(&plan).await?;

                println!("Imported plan:");
                println!("{}", plan);
                println!("ID: {}", plan.id);
                Ok(())
            }

            PlanSubcommand::List { format } => {
                let all = plans.list().await?;

                if all.is_empty() {
                    println!("No plans found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&all)?);
                    }
                    OutputFormat::Text => {
                        println!(
                            "{:<36}  {:<24} {:<12} {:<8} DAYS",
                            "ID", "TITLE", "DIFFICULTY", "VISIBLE"
                        );
                        println!("{}", "-".repeat(90));
                        for plan in &all {
                            println!(
                                "{:<36}  {:<24} {:<12} {:<8} {}",
                                plan.id,
                                truncate(&plan.title, 24),
                                plan.difficulty,
                                plan.visibility,
                                plan.scheduled_days()
                            );
                        }
                        println!("\nTotal: {} plan(s)", all.len());
                    }
                }
                Ok(())
            }

            PlanSubcommand::Show { plan, format } => {
                let plan = resolve_plan(plans, plan).await?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&plan)?);
                    }
                    OutputFormat::Text => {
                        println!("{}", plan);
                        println!("ID: {}", plan.id);
                    }
                }
                Ok(())
            }

            PlanSubcommand::Share { plan, visibility } => {
                let visibility: Visibility = visibility.parse()?;
                let plan = resolve_plan(plans, plan).await?;
                let updated = plans
                    .merge(plan.id, PlanUpdate::visibility(visibility))
                    .await?;

                println!("{} is now {}", updated.title, updated.visibility);
                println!("Share link: {}", updated.share_id.to_link());
                Ok(())
            }

            PlanSubcommand::Delete { plan } => {
                let plan = resolve_plan(plans, plan).await?;
                if plans.delete(plan.id).await? {
                    println!("Deleted plan: {} ({})", plan.title, plan.id);
                    if session
                        .sync_engine()
                        .get_sync_status(plan.id)
                        .await?
                        .is_some()
                    {
                        println!(
                            "Synced workouts remain on the calendar; remove them with `fitplan sync remove {}`",
                            plan.id
                        );
                    }
                } else {
                    return Err(format!("Plan not found: {}", plan.id).into());
                }
                Ok(())
            }
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

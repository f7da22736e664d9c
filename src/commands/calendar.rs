use chrono::{Days, Local, NaiveDate};
use clap::{Args, Subcommand};
use serde::Serialize;

use fitplan_core::{DailyWorkout, Session};

use super::{parse_date, OutputFormat};

#[derive(Args)]
pub struct CalendarCommand {
    #[command(subcommand)]
    pub command: CalendarSubcommand,
}

#[derive(Subcommand)]
pub enum CalendarSubcommand {
    /// List calendar entries
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Start date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD), defaults to 7 days from start
        #[arg(long)]
        to: Option<String>,
    },

    /// Show the workout on one date
    Show {
        /// Date (YYYY-MM-DD)
        date: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Serialize)]
struct Entry<'a> {
    date: NaiveDate,
    #[serde(flatten)]
    workout: &'a DailyWorkout,
}

impl CalendarCommand {
    pub async fn run(&self, session: &Session) -> Result<(), Box<dyn std::error::Error>> {
        let calendar = session.calendar();

        match &self.command {
            CalendarSubcommand::List { format, from, to } => {
                let from_date = match from {
                    Some(d) => parse_date(d)?,
                    None => Local::now().date_naive(),
                };
                let to_date = match to {
                    Some(d) => parse_date(d)?,
                    None => from_date
                        .checked_add_days(Days::new(7))
                        .unwrap_or(NaiveDate::MAX),
                };

                let entries = calendar.range(from_date, to_date).await?;

                if entries.is_empty() {
                    println!("No workouts between {} and {}", from_date, to_date);
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        let entries: Vec<_> = entries
                            .iter()
                            .map(|(date, workout)| Entry {
                                date: *date,
                                workout,
                            })
                            .collect();
                        println!("{}", serde_json::to_string_pretty(&entries)?);
                    }
                    OutputFormat::Text => {
                        for (date, workout) in &entries {
                            println!("{} {} {}", date, date.format("%a"), workout);
                        }
                        println!("\nTotal: {} workout(s)", entries.len());
                    }
                }
                Ok(())
            }

            CalendarSubcommand::Show { date, format } => {
                let date = parse_date(date)?;
                let Some(workout) = calendar.get(date).await? else {
                    return Err(format!("No workout on {}", date).into());
                };

                match format {
                    OutputFormat::Json => {
                        let entry = Entry {
                            date,
                            workout: &workout,
                        };
                        println!("{}", serde_json::to_string_pretty(&entry)?);
                    }
                    OutputFormat::Text => {
                        println!("{} ({})", date, date.format("%A"));
                        println!("{}", "-".repeat(10));
                        println!("{}", workout);
                        for exercise in &workout.exercises {
                            println!("  - {}", exercise);
                            if let Some(ref notes) = exercise.notes {
                                println!("      {}", notes);
                            }
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

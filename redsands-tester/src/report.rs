//! Run reports: colored console output and a JSON form for tooling.

use colored::Colorize;
use redsands_game::{MissionSummary, RoverStatus};
use serde::Serialize;

/// Flattened end-of-run report.
#[derive(Debug, Clone, Serialize)]
pub struct MissionReport {
    pub label: String,
    pub ticks: u32,
    pub status: String,
    pub fuel: f64,
    pub health: f64,
    pub score: f64,
    pub steps: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
    pub output: Vec<String>,
}

impl MissionReport {
    pub fn from_summary(label: &str, summary: &MissionSummary) -> Self {
        Self {
            label: label.to_string(),
            ticks: summary.ticks,
            status: summary.final_state.status.to_string(),
            fuel: summary.final_state.fuel,
            health: summary.final_state.health,
            score: summary.final_state.score,
            steps: summary.final_state.steps,
            fault: summary.fault.as_ref().map(ToString::to_string),
            output: summary.output.clone(),
        }
    }

    pub fn print_console(&self, status: RoverStatus) {
        let status_text = match status {
            RoverStatus::Running => self.status.green(),
            RoverStatus::FuelDepleted => self.status.yellow(),
            RoverStatus::Fault | RoverStatus::HullBreach => self.status.red(),
        };
        println!("{} {}", "mission".bold(), self.label);
        println!(
            "  status {status_text}  ticks {}  steps {}",
            self.ticks, self.steps
        );
        println!(
            "  fuel {:.0}  health {:.0}  score {:.0}",
            self.fuel, self.health, self.score
        );
        if let Some(fault) = &self.fault {
            println!("  {} {fault}", "fault".red().bold());
        }
        if !self.output.is_empty() {
            println!("  {}", "script output".bold());
            for line in &self.output {
                println!("    {line}");
            }
        }
    }

    /// Serialized report for `--report json`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

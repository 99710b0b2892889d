use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tokio::task::JoinHandle;
use tracing::info;

use casefile_common::SourceTag;

use crate::queue::ReportSender;

const MIN_SLEEP_SECS: u64 = 5;
const MAX_SLEEP_SECS: u64 = 10;

/// An actor the simulator can cast in a scenario.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub team: String,
    pub role: String,
    pub age: i64,
    pub gender: String,
    pub group: String,
}

/// A scenario pattern: what happens, where, and who it targets.
#[derive(Debug, Clone)]
pub struct ActionPattern {
    pub category: String,
    /// Group the pattern applies to, or "ALL".
    pub target_group: String,
    pub location: String,
    pub action: String,
    pub source: String,
}

/// Handle to a running simulator task. `stop` sets the cooperative flag
/// and joins the task; the simulator is only considered stopped once the
/// task has actually exited.
pub struct SimulatorHandle {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl SimulatorHandle {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub async fn stop(self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.handle.await;
    }
}

/// Periodic producer of synthetic incident reports. Emits one report, then
/// sleeps 5-10 seconds, checking the stop flag once per cycle.
pub struct ScenarioGenerator {
    sender: ReportSender,
    actors: Vec<Actor>,
    patterns: Vec<ActionPattern>,
}

impl ScenarioGenerator {
    pub fn new(sender: ReportSender) -> Self {
        // Fallback cast so the simulator works before any data is loaded.
        Self {
            sender,
            actors: vec![Actor {
                id: "sec-000".to_string(),
                name: "Kim Cheolsu".to_string(),
                team: "Security".to_string(),
                role: "Manager".to_string(),
                age: 50,
                gender: "male".to_string(),
                group: "SECURITY".to_string(),
            }],
            patterns: vec![ActionPattern {
                category: "SEC".to_string(),
                target_group: "SECURITY".to_string(),
                location: "server room".to_string(),
                action: "ran a routine inspection".to_string(),
                source: "log".to_string(),
            }],
        }
    }

    pub fn with_actors(mut self, actors: Vec<Actor>) -> Self {
        if !actors.is_empty() {
            self.actors = actors;
        }
        self
    }

    pub fn with_patterns(mut self, patterns: Vec<ActionPattern>) -> Self {
        if !patterns.is_empty() {
            self.patterns = patterns;
        }
        self
    }

    /// Full profile string so the extractor can fill every ontology
    /// property from the text alone.
    fn profile(actor: &Actor) -> String {
        format!(
            "{} {} {} (id: {}, {}/{})",
            actor.team, actor.name, actor.role, actor.id, actor.age, actor.gender
        )
    }

    pub fn generate_one(&self) -> String {
        let mut rng = rand::rng();
        let actor = &self.actors[rng.random_range(0..self.actors.len())];

        let candidates: Vec<&ActionPattern> = self
            .patterns
            .iter()
            .filter(|p| p.target_group == "ALL" || p.target_group == actor.group)
            .collect();
        let pattern = if candidates.is_empty() {
            &self.patterns[rng.random_range(0..self.patterns.len())]
        } else {
            candidates[rng.random_range(0..candidates.len())]
        };

        // Relationship patterns always cast a counterpart; other patterns
        // sometimes do, which enriches the interaction graph.
        let wants_pair = pattern.category == "RELATION" || rng.random_bool(0.3);
        let counterpart = if wants_pair && self.actors.len() > 1 {
            loop {
                let other = &self.actors[rng.random_range(0..self.actors.len())];
                if other.id != actor.id {
                    break Some(other);
                }
            }
        } else {
            None
        };

        let with = counterpart
            .map(|c| format!(" together with '{}'", Self::profile(c)))
            .unwrap_or_default();

        format!(
            "[{}] [report-{}/{}] At '{}', identified person '{}'{} performed: {}.",
            Utc::now().format("%Y-%m-%d %H:%M:%S"),
            pattern.category,
            pattern.source,
            pattern.location,
            Self::profile(actor),
            with,
            pattern.action
        )
    }

    /// Start the emission loop. Returns the handle used to stop it.
    pub fn spawn(self) -> SimulatorHandle {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let handle = tokio::spawn(async move {
            info!("Scenario simulator started");
            while flag.load(Ordering::SeqCst) {
                let text = self.generate_one();
                self.sender.submit(SourceTag::AutoGen, text);
                let secs = rand::rng().random_range(MIN_SLEEP_SECS..=MAX_SLEEP_SECS);
                tokio::time::sleep(Duration::from_secs(secs)).await;
            }
            info!("Scenario simulator stopped");
        });
        SimulatorHandle { running, handle }
    }
}

#[cfg(test)]
mod tests {
    use casefile_common::SourceTag;

    use super::*;
    use crate::queue::report_queue;

    fn two_actor_generator(sender: ReportSender) -> ScenarioGenerator {
        ScenarioGenerator::new(sender)
            .with_actors(vec![
                Actor {
                    id: "it-1001".to_string(),
                    name: "Lee Minsu".to_string(),
                    team: "IT".to_string(),
                    role: "Developer".to_string(),
                    age: 31,
                    gender: "male".to_string(),
                    group: "IT".to_string(),
                },
                Actor {
                    id: "hr-1001".to_string(),
                    name: "Park Jimin".to_string(),
                    team: "HR".to_string(),
                    role: "Recruiter".to_string(),
                    age: 29,
                    gender: "female".to_string(),
                    group: "HR".to_string(),
                },
            ])
            .with_patterns(vec![ActionPattern {
                category: "RELATION".to_string(),
                target_group: "ALL".to_string(),
                location: "cafeteria".to_string(),
                action: "had lunch together".to_string(),
                source: "coworker report".to_string(),
            }])
    }

    #[test]
    fn generated_report_names_the_actor() {
        let (tx, _rx) = report_queue();
        let gen = two_actor_generator(tx);
        let text = gen.generate_one();
        assert!(text.contains("RELATION"));
        assert!(text.contains("cafeteria"));
        // RELATION patterns always cast a counterpart.
        assert!(text.contains("together with"));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_joins_before_returning_and_emission_ceases() {
        let (tx, mut rx) = report_queue();
        let handle = two_actor_generator(tx).spawn();

        // Paused time auto-advances through the sleep cycles.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(handle.is_running());

        handle.stop().await;

        // Drain whatever was emitted before the stop boundary.
        let mut count = 0;
        while let Some(item) = rx.try_recv() {
            assert_eq!(item.source, SourceTag::AutoGen);
            count += 1;
        }
        assert!(count >= 1);

        // Task has exited; nothing further arrives.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(rx.try_recv().is_none());
    }
}

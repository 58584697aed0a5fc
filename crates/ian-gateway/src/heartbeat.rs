use ian_dispatcher::Dispatcher;
use ian_scheduler::Job;
use tokio::sync::mpsc;
use tracing::info;

/// Drains the scheduler's fired-job channel and translates `heartbeat` jobs
/// into a `Dispatcher::heartbeat` call. Other job names are logged and
/// otherwise ignored — daily-briefing/weekly-digest content generation is
/// an external collaborator concern, not implemented here.
pub async fn run(mut fired: mpsc::Receiver<Job>, dispatcher: Dispatcher, invoke_model: bool) {
    while let Some(job) = fired.recv().await {
        match job.name.as_str() {
            "heartbeat" => dispatcher.heartbeat(invoke_model).await,
            other => info!(job = other, "scheduler fired an unhandled job"),
        }
    }
}
